//! Shared types for the Vesta diagnosis engine.
//!
//! Everything both the engine and its callers need to agree on lives here:
//! the causal-path record, the recommendation schema, the chat wire types,
//! the configuration surface, and the error taxonomy.

pub mod chat;
pub mod config;
pub mod error;
pub mod types;

pub use chat::{ChatMessage, ChatRole};
pub use config::Config;
pub use error::VestaError;
pub use types::{
    CausalPath, PathRow, ProposedRepair, Recommendation, RecommendationSet, NO_REPAIR, NO_SUBCAUSE,
};
