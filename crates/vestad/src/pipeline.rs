//! End-to-end diagnosis pipeline.
//!
//! traverse → normalize → prompt → reasoning call inside the retry loop →
//! validated recommendation set → optional write-back. A traversal that
//! yields zero valid paths is not a failure: the pipeline short-circuits,
//! never calls the reasoning service, and returns an empty set.

use crate::graph::GraphStore;
use crate::llm::ChatBackend;
use crate::normalize::normalize;
use crate::prompt;
use crate::retry::{ExhaustionPolicy, RetrySession, Transcript};
use crate::writer::{self, WriteSummary};
use serde_json::Value;
use tracing::info;
use vesta_common::{CausalPath, Config, RecommendationSet, VestaError};

/// Pipeline knobs, usually lifted from [`Config`].
#[derive(Debug, Clone)]
pub struct DiagnosisOptions {
    pub model: String,
    pub temperature: f32,
    pub max_retries: usize,
    pub write_back: bool,
}

impl DiagnosisOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.llm.model.clone(),
            temperature: config.llm.temperature,
            max_retries: config.diagnosis.max_retries,
            write_back: config.diagnosis.write_back,
        }
    }
}

/// Outcome of one diagnosis run.
#[derive(Debug, Clone)]
pub struct Diagnosis {
    /// Normalized candidate paths the reasoning was grounded on.
    pub paths: Vec<CausalPath>,
    /// The validated, possibly empty recommendation set.
    pub recommendations: RecommendationSet,
    /// Present when write-back ran for this diagnosis.
    pub write_back: Option<WriteSummary>,
}

/// Wires the graph store and the reasoning backend into one diagnosis flow.
/// Holds shared handles by reference; one engine serves many requests.
pub struct DiagnosisEngine<'a> {
    graph: &'a dyn GraphStore,
    backend: &'a dyn ChatBackend,
    options: DiagnosisOptions,
}

impl<'a> DiagnosisEngine<'a> {
    pub fn new(
        graph: &'a dyn GraphStore,
        backend: &'a dyn ChatBackend,
        options: DiagnosisOptions,
    ) -> Self {
        Self {
            graph,
            backend,
            options,
        }
    }

    /// Diagnose one reported anomaly, optionally scoped to a subsystem and
    /// enriched with a telemetry snapshot.
    pub async fn diagnose(
        &self,
        event: &str,
        system: Option<&str>,
        telemetry: Option<&Value>,
    ) -> Result<Diagnosis, VestaError> {
        let rows = self.graph.traverse(event, system).await?;
        let paths = normalize(rows);
        if paths.is_empty() {
            info!("No candidate paths for '{}', skipping reasoning call", event);
            return Ok(Diagnosis {
                paths,
                recommendations: RecommendationSet::empty(event),
                write_back: None,
            });
        }
        info!("Found {} candidate paths for '{}'", paths.len(), event);

        let task = prompt::build(event, &paths, telemetry);
        let session = RetrySession::new(
            self.backend,
            self.options.model.clone(),
            self.options.temperature,
            true,
            self.options.max_retries,
            prompt::CORRECTION,
            ExhaustionPolicy::Fail,
        );
        let transcript = Transcript::seeded(prompt::SYSTEM_PROMPT, &task);
        let accepted = session
            .run(transcript, |response| {
                serde_json::from_str::<RecommendationSet>(response).is_ok()
            })
            .await?;
        let recommendations: RecommendationSet = serde_json::from_str(&accepted.response)?;

        let write_back = if self.options.write_back && !recommendations.recommendations.is_empty()
        {
            Some(writer::persist(self.graph, event, &recommendations.recommendations).await)
        } else {
            None
        };

        Ok(Diagnosis {
            paths,
            recommendations,
            write_back,
        })
    }
}
