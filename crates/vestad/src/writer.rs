//! Recommendation write-back.
//!
//! Thin adapter from a validated recommendation list to repeated graph merge
//! calls. Items with an empty `repair_action` are skipped silently, and one
//! item's persistence failure never blocks its siblings; the batch reports
//! counts instead of erroring.

use crate::graph::GraphStore;
use tracing::{debug, info, warn};
use vesta_common::{ProposedRepair, Recommendation};

/// Per-batch persistence outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Persist accepted recommendations as `PROPOSED_REPAIR` edges. Idempotent
/// per `(event, repair_action)`; re-running overwrites edge attributes.
pub async fn persist(
    graph: &dyn GraphStore,
    event: &str,
    recommendations: &[Recommendation],
) -> WriteSummary {
    let mut summary = WriteSummary::default();

    for rec in recommendations {
        if rec.repair_action.is_empty() {
            debug!("Skipping recommendation without repair_action");
            summary.skipped += 1;
            continue;
        }
        let attrs = ProposedRepair::from(rec);
        match graph.propose_repair(event, &rec.repair_action, &attrs).await {
            Ok(()) => summary.written += 1,
            Err(e) => {
                warn!(
                    "Failed to persist proposed repair '{}' for '{}': {}",
                    rec.repair_action, event, e
                );
                summary.failed += 1;
            }
        }
    }

    info!(
        "Write-back for '{}': {} written, {} skipped, {} failed",
        event, summary.written, summary.skipped, summary.failed
    );
    summary
}
