//! Vesta diagnosis engine.
//!
//! Pipeline: graph traversal → path normalization → deterministic prompt
//! synthesis → reasoning call inside a bounded validation retry loop →
//! validated recommendation set → optional idempotent write-back. The
//! subsystem router is an independent use of the same retry machinery.

pub mod graph;
pub mod knowledge;
pub mod llm;
pub mod normalize;
pub mod pipeline;
pub mod prompt;
pub mod retry;
pub mod router;
pub mod seed;
pub mod writer;

pub use graph::{GraphStore, Neo4jGraph};
pub use llm::{ChatBackend, ChatRequest, QwenClient};
pub use pipeline::DiagnosisEngine;
pub use retry::{ExhaustionPolicy, RetrySession, Transcript};
pub use router::SubsystemRouter;
