//! Knowledge-base seeding.
//!
//! The external population collaborator: walks a [`SystemKnowledge`] tree
//! and merges nodes, relationships, and uniqueness constraints into the
//! graph. Merge-based and re-runnable. The inference pipeline never calls
//! anything in this module.

use crate::graph::Neo4jGraph;
use crate::knowledge::{CauseNode, Remedy, SystemKnowledge};
use tracing::info;
use vesta_common::VestaError;

/// Node/edge merge counts for one seeding run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedStats {
    pub nodes: usize,
    pub relationships: usize,
}

/// Seed one subsystem's knowledge into the graph. With `wipe`, the store is
/// emptied first; otherwise existing content is merged into.
pub async fn seed(
    graph: &Neo4jGraph,
    kb: &SystemKnowledge,
    wipe: bool,
) -> Result<SeedStats, VestaError> {
    if wipe {
        info!("Wiping graph store before seeding");
        graph.wipe().await?;
    }
    graph.ensure_constraints().await?;

    let mut stats = SeedStats::default();
    graph.merge_node("System", kb.system).await?;
    stats.nodes += 1;

    for (event, causes) in kb.events {
        graph.merge_node("Event", event).await?;
        graph
            .relate("System", kb.system, "HAS_EVENT", "Event", event)
            .await?;
        stats.nodes += 1;
        stats.relationships += 1;

        for (cause, node) in *causes {
            graph.merge_node("Cause", cause).await?;
            graph
                .relate("Event", event, "HAS_CAUSE", "Cause", cause)
                .await?;
            stats.nodes += 1;
            stats.relationships += 1;

            match node {
                CauseNode::Leaf(remedy) => {
                    seed_remedy(graph, "Cause", cause, remedy, &mut stats).await?;
                }
                CauseNode::Branch(subs) => {
                    for (sub, remedy) in *subs {
                        graph.merge_node("SubCause", sub).await?;
                        graph
                            .relate("Cause", cause, "HAS_SUBCAUSE", "SubCause", sub)
                            .await?;
                        stats.nodes += 1;
                        stats.relationships += 1;
                        seed_remedy(graph, "SubCause", sub, remedy, &mut stats).await?;
                    }
                }
            }
        }
    }

    info!(
        "Seeded '{}': {} node merges, {} relationship merges",
        kb.system, stats.nodes, stats.relationships
    );
    Ok(stats)
}

async fn seed_remedy(
    graph: &Neo4jGraph,
    from_label: &str,
    from_name: &str,
    remedy: &Remedy,
    stats: &mut SeedStats,
) -> Result<(), VestaError> {
    graph.merge_node("Repair", remedy.repair).await?;
    graph.merge_node("Validation", remedy.validation).await?;
    graph
        .relate(from_label, from_name, "CAN_BE_REPAIRED_BY", "Repair", remedy.repair)
        .await?;
    graph
        .relate(
            "Repair",
            remedy.repair,
            "NEED_TO_BE_VALIDATED_BY",
            "Validation",
            remedy.validation,
        )
        .await?;
    stats.nodes += 2;
    stats.relationships += 2;
    Ok(())
}
