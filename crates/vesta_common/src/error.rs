//! Error taxonomy for the diagnosis engine.
//!
//! Every fatal variant names the collaborator that failed (graph store vs
//! reasoning service). Malformed model output is recoverable and drives the
//! validation retry loop; it only surfaces once retries are exhausted under
//! the terminal-failure policy.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VestaError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("graph store error: {0}")]
    Graph(String),

    #[error("reasoning service error: {0}")]
    Reasoning(String),

    #[error("malformed reasoning output: {0}")]
    MalformedOutput(String),

    #[error("reasoning output still invalid after {attempts} attempts")]
    RetryExhausted { attempts: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VestaError {
    /// True for conditions the retry loop may recover from.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, VestaError::MalformedOutput(_))
    }
}
