//! Graph store adapter over the Neo4j bolt driver.
//!
//! Read side: one traversal query covering both structural shapes of a
//! causal chain (cause → repair directly, and cause → subcause → repair).
//! Write side: merge-based `PROPOSED_REPAIR` persistence, idempotent per
//! `(event, repair)` pair, plus the merge primitives the seeding
//! collaborator uses. No business logic lives here.
//!
//! The driver handle is long-lived and shared; each call runs in its own
//! logical session. No transaction spans a traversal and a later write-back.

use async_trait::async_trait;
use neo4rs::{query, Graph};
use tracing::{debug, info};
use vesta_common::{PathRow, ProposedRepair, VestaError, NO_REPAIR};

/// Traversal for an unscoped event: union of the direct and the
/// subcause-refined chain shapes, one row per reachable combination.
const TRAVERSE_EVENT: &str = "
MATCH (e:Event {name: $event})-[:HAS_CAUSE]->(c:Cause)
OPTIONAL MATCH (c)-[:HAS_SUBCAUSE]->(sc:SubCause)
OPTIONAL MATCH (sc)-[:CAN_BE_REPAIRED_BY]->(r1:Repair)
OPTIONAL MATCH (c)-[:CAN_BE_REPAIRED_BY]->(r2:Repair)
WITH e, c, sc, coalesce(r1, r2) AS r
OPTIONAL MATCH (r)-[:NEED_TO_BE_VALIDATED_BY]->(v:Validation)
RETURN e.name AS event, c.name AS cause,
       sc.name AS sub_cause, r.name AS repair, v.name AS validation
ORDER BY cause, coalesce(sc.name, '无子原因')
";

/// Same traversal, scoped to a named top-level subsystem.
const TRAVERSE_SCOPED: &str = "
MATCH (s:System {name: $system})-[:HAS_EVENT]->(e:Event {name: $event})
MATCH (e)-[:HAS_CAUSE]->(c:Cause)
OPTIONAL MATCH (c)-[:HAS_SUBCAUSE]->(sc:SubCause)
OPTIONAL MATCH (sc)-[:CAN_BE_REPAIRED_BY]->(r1:Repair)
OPTIONAL MATCH (c)-[:CAN_BE_REPAIRED_BY]->(r2:Repair)
WITH e, c, sc, coalesce(r1, r2) AS r
OPTIONAL MATCH (r)-[:NEED_TO_BE_VALIDATED_BY]->(v:Validation)
RETURN e.name AS event, c.name AS cause,
       sc.name AS sub_cause, r.name AS repair, v.name AS validation
ORDER BY cause, coalesce(sc.name, '无子原因')
";

/// Merge the repair node and the proposed-repair edge, last write wins.
/// The update timestamp is assigned by the server.
const PROPOSE_REPAIR: &str = "
MATCH (e:Event {name: $event})
MERGE (r:Repair {name: $repair})
MERGE (e)-[rel:PROPOSED_REPAIR]->(r)
SET rel.score = $score, rel.confidence = $confidence,
    rel.brief_reason = $brief_reason, rel.updated = timestamp()
";

/// Read/write access to the causal graph.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// All causal-path rows reachable from `event`, optionally scoped to one
    /// subsystem. Rows whose repair resolves to the no-repair sentinel are
    /// filtered out before return.
    async fn traverse(&self, event: &str, system: Option<&str>)
        -> Result<Vec<PathRow>, VestaError>;

    /// Merge-create the repair node and the `PROPOSED_REPAIR` edge for one
    /// accepted recommendation, overwriting the edge attributes in place.
    async fn propose_repair(
        &self,
        event: &str,
        repair: &str,
        attrs: &ProposedRepair,
    ) -> Result<(), VestaError>;
}

/// The production store over a shared bolt driver handle.
pub struct Neo4jGraph {
    graph: Graph,
}

fn graph_err(e: neo4rs::Error) -> VestaError {
    VestaError::Graph(e.to_string())
}

impl Neo4jGraph {
    /// Connect to the bolt endpoint. Connection failure is fatal and is
    /// reported as a graph-store error, never retried here.
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self, VestaError> {
        let graph = Graph::new(uri, user, password).await.map_err(graph_err)?;
        info!("Connected to graph store at {}", uri);
        Ok(Self { graph })
    }

    /// Create uniqueness constraints for every node label in the schema.
    /// Merge-safe to re-run.
    pub async fn ensure_constraints(&self) -> Result<(), VestaError> {
        for label in ["System", "Event", "Cause", "SubCause", "Repair", "Validation"] {
            let cypher = format!(
                "CREATE CONSTRAINT IF NOT EXISTS FOR (n:{label}) REQUIRE n.name IS UNIQUE"
            );
            self.graph.run(query(&cypher)).await.map_err(graph_err)?;
        }
        Ok(())
    }

    /// Delete every node and relationship. Seeding-only.
    pub async fn wipe(&self) -> Result<(), VestaError> {
        self.graph
            .run(query("MATCH (n) DETACH DELETE n"))
            .await
            .map_err(graph_err)
    }

    /// Merge a node by display name. `label` comes from the fixed schema,
    /// never from caller input.
    pub async fn merge_node(&self, label: &str, name: &str) -> Result<(), VestaError> {
        let cypher = format!("MERGE (n:{label} {{name: $name}})");
        self.graph
            .run(query(&cypher).param("name", name))
            .await
            .map_err(graph_err)
    }

    /// Merge a directed relationship between two named nodes. Labels and the
    /// relationship type come from the fixed schema.
    pub async fn relate(
        &self,
        a_label: &str,
        a_name: &str,
        rel: &str,
        b_label: &str,
        b_name: &str,
    ) -> Result<(), VestaError> {
        let cypher = format!(
            "MATCH (a:{a_label} {{name: $a_name}}), (b:{b_label} {{name: $b_name}}) \
             MERGE (a)-[:{rel}]->(b)"
        );
        self.graph
            .run(query(&cypher).param("a_name", a_name).param("b_name", b_name))
            .await
            .map_err(graph_err)
    }
}

#[async_trait]
impl GraphStore for Neo4jGraph {
    async fn traverse(
        &self,
        event: &str,
        system: Option<&str>,
    ) -> Result<Vec<PathRow>, VestaError> {
        let q = match system {
            Some(system) => query(TRAVERSE_SCOPED)
                .param("event", event)
                .param("system", system),
            None => query(TRAVERSE_EVENT).param("event", event),
        };

        let mut stream = self.graph.execute(q).await.map_err(graph_err)?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await.map_err(graph_err)? {
            let repair: Option<String> = row.get::<String>("repair").ok();
            // Unreachable-but-named causes have no terminal repair; they are
            // filtered here, before any caller sees them.
            if repair.as_deref().map_or(true, |r| r == NO_REPAIR) {
                continue;
            }
            rows.push(PathRow {
                event: row.get::<String>("event").unwrap_or_default(),
                cause: row.get::<String>("cause").unwrap_or_default(),
                sub_cause: row.get::<String>("sub_cause").ok(),
                repair,
                validation: row.get::<String>("validation").ok(),
            });
        }
        debug!("Traversal for '{}' returned {} rows", event, rows.len());
        Ok(rows)
    }

    async fn propose_repair(
        &self,
        event: &str,
        repair: &str,
        attrs: &ProposedRepair,
    ) -> Result<(), VestaError> {
        self.graph
            .run(
                query(PROPOSE_REPAIR)
                    .param("event", event)
                    .param("repair", repair)
                    .param("score", attrs.score)
                    .param("confidence", attrs.confidence)
                    .param("brief_reason", attrs.brief_reason.as_str()),
            )
            .await
            .map_err(graph_err)
    }
}
