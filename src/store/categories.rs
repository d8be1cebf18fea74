//! Category definitions loaded from `categories.yaml`.

use crate::error::{KnowledgeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const CATEGORIES_FILE: &str = "categories.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub description: String,
    /// Tags suggested for entries in this category
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CategoryInfo {
    fn new(description: &str, tags: &[&str]) -> Self {
        Self {
            description: description.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// The configured set of categories, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategorySet {
    categories: BTreeMap<String, CategoryInfo>,
}

impl CategorySet {
    /// Categories written by `init` when no `categories.yaml` exists.
    pub fn defaults() -> Self {
        let mut categories = BTreeMap::new();
        categories.insert(
            "general".to_string(),
            CategoryInfo::new("General knowledge entries", &["general", "misc"]),
        );
        categories.insert(
            "domain".to_string(),
            CategoryInfo::new("Domain-specific knowledge", &["domain", "specialized"]),
        );
        categories.insert(
            "process".to_string(),
            CategoryInfo::new("Process-related knowledge", &["process", "workflow"]),
        );
        categories.insert(
            "technical".to_string(),
            CategoryInfo::new(
                "Technical documentation and references",
                &["technical", "documentation"],
            ),
        );
        categories.insert(
            "prompt-templates".to_string(),
            CategoryInfo::new("Reusable prompt templates", &["template", "prompt"]),
        );
        categories.insert(
            "model-specific".to_string(),
            CategoryInfo::new(
                "Model capabilities and configuration",
                &["capability", "model"],
            ),
        );
        categories.insert(
            "domain-knowledge".to_string(),
            CategoryInfo::new("Curated knowledge about problem domains", &["domain"]),
        );
        categories.insert(
            "best-practices".to_string(),
            CategoryInfo::new(
                "Usage guidance and optimization notes",
                &["practice", "optimization"],
            ),
        );
        Self { categories }
    }

    /// Load from `categories.yaml` in the knowledge base root.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CATEGORIES_FILE);
        if !path.exists() {
            return Err(KnowledgeError::Configuration(format!(
                "{} not found. Run 'crewkb init' first.",
                path.display()
            )));
        }

        let content = fs::read_to_string(&path)?;
        serde_yaml::from_str(&content).map_err(|e| {
            KnowledgeError::Configuration(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(root.join(CATEGORIES_FILE), content)?;
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.categories.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&CategoryInfo> {
        self.categories.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CategoryInfo)> {
        self.categories.iter()
    }

    pub fn insert(&mut self, name: impl Into<String>, info: CategoryInfo) {
        self.categories.insert(name.into(), info);
    }
}
