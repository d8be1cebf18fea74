//! Knowledge base configuration, persisted as `config.toml` at the root.

use crate::error::{KnowledgeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "config.toml";

/// How read paths treat a record that exists but cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadPolicy {
    /// Log a warning and report the record as absent
    #[default]
    Degrade,
    /// Return `KnowledgeError::MalformedRecord`
    Strict,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub read_policy: ReadPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Categories scanned by `refresh_index`
    #[serde(default = "default_search_categories")]
    pub categories: Vec<String>,
    /// Snapshot age after which facade queries rebuild it first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_staleness_secs: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            categories: default_search_categories(),
            max_staleness_secs: Some(300),
        }
    }
}

fn default_search_categories() -> Vec<String> {
    ["prompt-templates", "model-specific", "domain-knowledge", "best-practices"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Fields a document body must carry to be stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequiredFields {
    #[serde(default)]
    pub required_fields: Vec<String>,
}

impl RequiredFields {
    /// Return the first required field missing from `body`, if any.
    pub fn first_missing<'a>(
        &'a self,
        body: &serde_json::Map<String, serde_json::Value>,
    ) -> Option<&'a str> {
        self.required_fields
            .iter()
            .find(|field| !body.contains_key(field.as_str()))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub documents: RequiredFields,
    #[serde(default = "default_capability_fields")]
    pub capabilities: RequiredFields,
}

fn default_capability_fields() -> RequiredFields {
    RequiredFields {
        required_fields: vec!["model_id".to_string(), "capabilities".to_string()],
    }
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            search: SearchConfig::default(),
            documents: RequiredFields::default(),
            capabilities: default_capability_fields(),
        }
    }
}

impl KnowledgeConfig {
    /// Load `config.toml` from the knowledge base root.
    ///
    /// A missing file yields the defaults; an unparseable one is a
    /// `Configuration` error.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            KnowledgeError::Configuration(format!("Failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let Some(secs) = self.search.max_staleness_secs {
            if staleness_duration(secs).is_none() {
                return Err(KnowledgeError::Configuration(format!(
                    "search.max_staleness_secs is out of range: {secs}"
                )));
            }
        }
        Ok(())
    }

    /// Save to `config.toml` in the knowledge base root.
    pub fn save(&self, root: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| KnowledgeError::Serialization(e.to_string()))?;
        fs::write(root.join(CONFIG_FILE), content)?;
        Ok(())
    }

    pub fn max_staleness(&self) -> Option<chrono::Duration> {
        self.search.max_staleness_secs.and_then(staleness_duration)
    }
}

fn staleness_duration(secs: u64) -> Option<chrono::Duration> {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
}
