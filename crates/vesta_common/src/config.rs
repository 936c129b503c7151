//! Configuration for the diagnosis engine.
//!
//! Loads settings from /etc/vesta/config.toml or uses defaults, then applies
//! environment overrides for endpoints and credentials. Credentials never
//! have usable defaults; [`Config::validate`] rejects a missing key or
//! endpoint before any request is attempted.

use crate::error::VestaError;
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/vesta/config.toml";

/// Reasoning-service configuration (OpenAI-compatible endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Compatible-mode endpoint, e.g. a DashScope or vLLM base URL
    #[serde(default)]
    pub base_url: String,

    /// API key; normally supplied via OPENAI_API_KEY
    #[serde(default)]
    pub api_key: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature for recommendation synthesis
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "qwen3-max".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_llm_timeout() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

/// Graph-store configuration (bolt endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_graph_uri")]
    pub uri: String,

    #[serde(default = "default_graph_user")]
    pub user: String,

    /// Normally supplied via NEO4J_PASSWORD
    #[serde(default)]
    pub password: String,
}

fn default_graph_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_graph_user() -> String {
    "neo4j".to_string()
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: default_graph_uri(),
            user: default_graph_user(),
            password: String::new(),
        }
    }
}

/// Pipeline behavior knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisConfig {
    /// Corrective re-calls allowed after the first invalid response
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Persist accepted recommendations back onto the graph
    #[serde(default = "default_write_back")]
    pub write_back: bool,
}

fn default_max_retries() -> usize {
    3
}

fn default_write_back() -> bool {
    true
}

impl Default for DiagnosisConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            write_back: default_write_back(),
        }
    }
}

/// Full engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub graph: GraphConfig,

    #[serde(default)]
    pub diagnosis: DiagnosisConfig,
}

impl Config {
    /// Load config from the default path (falling back to defaults), then
    /// apply environment overrides.
    pub fn load() -> Self {
        let mut config = Self::load_from_path(CONFIG_PATH).unwrap_or_else(|e| {
            warn!("Config not found, using defaults: {}", e);
            Config::default()
        });
        config.apply_env();
        config
    }

    /// Load config from a specific path (no environment overrides).
    pub fn load_from_path(path: &str) -> Result<Self, VestaError> {
        let content = fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| VestaError::Config(e.to_string()))?;
        info!("Loaded config from {}", path);
        Ok(config)
    }

    /// Environment overrides. The variable names are the ones the upstream
    /// deployment already exports for the Qwen compatible endpoint and the
    /// Neo4j instance.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Environment-shaped override application, factored out so precedence
    /// is testable without mutating the process environment.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("OPENAI_BASE_URL") {
            self.llm.base_url = v.trim().to_string();
        }
        if let Some(v) = lookup("OPENAI_API_KEY") {
            self.llm.api_key = v.trim().to_string();
        }
        if let Some(v) = lookup("QWEN_MODEL") {
            self.llm.model = v.trim().to_string();
        }
        if let Some(v) = lookup("NEO4J_URI") {
            self.graph.uri = v.trim().to_string();
        }
        if let Some(v) = lookup("NEO4J_USER") {
            self.graph.user = v.trim().to_string();
        }
        if let Some(v) = lookup("NEO4J_PASSWORD") {
            self.graph.password = v.trim().to_string();
        }
    }

    /// Reject a missing graph endpoint or credential. Enough for
    /// graph-only operations such as seeding.
    pub fn validate_graph(&self) -> Result<(), VestaError> {
        if self.graph.uri.is_empty() {
            return Err(VestaError::Config("graph.uri not set (NEO4J_URI)".into()));
        }
        if self.graph.password.is_empty() {
            return Err(VestaError::Config(
                "graph.password not set (NEO4J_PASSWORD)".into(),
            ));
        }
        Ok(())
    }

    /// Reject a missing reasoning endpoint or credential. Enough for
    /// routing, which never touches the graph store.
    pub fn validate_llm(&self) -> Result<(), VestaError> {
        if self.llm.base_url.is_empty() {
            return Err(VestaError::Config(
                "llm.base_url not set (OPENAI_BASE_URL)".into(),
            ));
        }
        if self.llm.api_key.is_empty() {
            return Err(VestaError::Config(
                "llm.api_key not set (OPENAI_API_KEY)".into(),
            ));
        }
        Ok(())
    }

    /// Reject missing credentials/endpoints before any request goes out.
    pub fn validate(&self) -> Result<(), VestaError> {
        self.validate_llm()?;
        self.validate_graph()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.model, "qwen3-max");
        assert_eq!(config.llm.temperature, 0.2);
        assert_eq!(config.graph.uri, "bolt://localhost:7687");
        assert_eq!(config.diagnosis.max_retries, 3);
        assert!(config.diagnosis.write_back);
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[llm]
base_url = "https://dashscope.aliyuncs.com/compatible-mode/v1"
model = "qwen3-max"

[graph]
uri = "bolt://graph:7687"

[diagnosis]
max_retries = 5
write_back = false
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.graph.uri, "bolt://graph:7687");
        assert_eq!(config.diagnosis.max_retries, 5);
        assert!(!config.diagnosis.write_back);
        // Defaults for missing fields
        assert_eq!(config.graph.user, "neo4j");
        assert_eq!(config.llm.timeout_secs, 120);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[llm]\nmodel = \"qwen3:8b\"").unwrap();
        let config = Config::load_from_path(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.llm.model, "qwen3:8b");
    }

    #[test]
    fn test_env_overrides_win_over_file_values() {
        let toml_str = r#"
[llm]
base_url = "https://file.example.com/v1"
api_key = "sk-file"

[graph]
password = "file-secret"
"#;
        let mut config: Config = toml::from_str(toml_str).unwrap();
        config.apply_overrides(|name| match name {
            "OPENAI_BASE_URL" => Some(" https://env.example.com/v1 ".to_string()),
            "NEO4J_PASSWORD" => Some("env-secret".to_string()),
            _ => None,
        });
        // Set variables override the file, with whitespace trimmed.
        assert_eq!(config.llm.base_url, "https://env.example.com/v1");
        assert_eq!(config.graph.password, "env-secret");
        // Unset variables leave file values alone.
        assert_eq!(config.llm.api_key, "sk-file");
        assert_eq!(config.graph.user, "neo4j");
    }

    #[test]
    fn test_validate_llm_ignores_graph_credentials() {
        let mut config = Config::default();
        config.llm.base_url = "https://example.com/v1".into();
        config.llm.api_key = "sk-test".into();
        // Routing-only deployments need no graph password.
        assert!(config.validate_llm().is_ok());
        assert!(matches!(config.validate(), Err(VestaError::Config(_))));
        assert!(matches!(config.validate_graph(), Err(VestaError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_missing_credentials() {
        let mut config = Config::default();
        assert!(matches!(config.validate(), Err(VestaError::Config(_))));

        config.llm.base_url = "https://example.com/v1".into();
        config.llm.api_key = "sk-test".into();
        assert!(matches!(config.validate(), Err(VestaError::Config(_))));

        config.graph.password = "secret".into();
        assert!(config.validate().is_ok());
    }
}
