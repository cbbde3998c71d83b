//! Resolver configuration, loadable from TOML.

use serde::Deserialize;

use crate::fallback::KeywordSets;
use crate::ollama::OllamaConfig;
use crate::policy::CONFIDENCE_THRESHOLD;

/// Top-level configuration for the intent resolver.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Minimum confidence for creating a task without clarification.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// Local Ollama model settings. Optional, defaults to enabled.
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// Fallback keyword tables. Any table left out keeps its built-in list.
    #[serde(default)]
    pub keywords: KeywordSets,
}

fn default_confidence_threshold() -> f64 {
    CONFIDENCE_THRESHOLD
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            ollama: OllamaConfig::default(),
            keywords: KeywordSets::default(),
        }
    }
}

impl ResolverConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}
