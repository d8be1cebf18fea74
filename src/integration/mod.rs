//! Domain queries over the entry store and search engine: model
//! capabilities, prompt templates and their compatibility.

pub mod document;

pub use document::{document_entry, is_truthy, Document};

use crate::config::KnowledgeConfig;
use crate::error::{KnowledgeError, Result};
use crate::fs::layout::KnowledgeDir;
use crate::search::{SearchEngine, SearchHit, SearchLog, DEFAULT_SEARCH_LIMIT};
use crate::store::{EntryStore, KnowledgeEntry};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, warn};

pub const MODEL_CATEGORY: &str = "model-specific";
pub const TEMPLATE_CATEGORY: &str = "prompt-templates";
pub const BEST_PRACTICES_CATEGORY: &str = "best-practices";
pub const DOMAIN_CATEGORY: &str = "domain-knowledge";

/// Model capability document enriched with related knowledge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub document: Document,
    pub best_practices: Vec<SearchHit>,
    pub recommended_templates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub document: Document,
    pub related_content: Vec<SearchHit>,
}

/// One knowledge base: configuration, entry store, search engine and
/// search log over a single root directory.
pub struct KnowledgeBase {
    config: KnowledgeConfig,
    store: EntryStore,
    engine: SearchEngine,
    log: SearchLog,
}

impl KnowledgeBase {
    /// Open an initialized knowledge base rooted at `root`.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let dir = KnowledgeDir::new(root);
        let config = KnowledgeConfig::load(dir.root())?;
        let store = EntryStore::open(dir.clone(), config.store.read_policy)?;
        let engine = SearchEngine::open(&dir.snapshots_dir(), config.search.categories.clone());
        let log = SearchLog::new(dir.search_results_dir());
        Ok(Self {
            config,
            store,
            engine,
            log,
        })
    }

    /// Initialize `root` with default files if needed, then open it.
    pub fn init<P: AsRef<Path>>(root: P) -> Result<Self> {
        KnowledgeDir::new(root.as_ref()).initialize()?;
        Self::open(root)
    }

    pub fn config(&self) -> &KnowledgeConfig {
        &self.config
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    pub fn log(&self) -> &SearchLog {
        &self.log
    }

    /// Rebuild the search snapshot unconditionally.
    pub fn refresh_index(&mut self) -> Result<std::path::PathBuf> {
        self.engine.refresh_index(&self.store)
    }

    /// Search after refreshing a stale snapshot. When `source` is given the
    /// query and its results are appended to the search log.
    pub fn search(
        &mut self,
        query: &str,
        categories: Option<&[String]>,
        limit: usize,
        source: Option<&str>,
    ) -> Result<Vec<SearchHit>> {
        self.engine
            .refresh_if_stale(&self.store, self.config.max_staleness())?;
        let hits = self.engine.search(query, categories, limit);
        if let Some(source) = source {
            self.log.record(query, source, &hits)?;
        }
        Ok(hits)
    }

    fn search_in(&mut self, query: &str, categories: &[&str]) -> Result<Vec<SearchHit>> {
        let categories: Vec<String> = categories.iter().map(|c| c.to_string()).collect();
        self.search(query, Some(categories.as_slice()), DEFAULT_SEARCH_LIMIT, None)
    }

    /// Store a structured document under a caller-chosen id, creating or
    /// versioning it.
    pub fn store_entry(
        &self,
        category: &str,
        id: &str,
        body: Map<String, Value>,
    ) -> Result<KnowledgeEntry> {
        if let Some(field) = self.config.documents.first_missing(&body) {
            return Err(KnowledgeError::Configuration(format!(
                "Missing required field: {field}"
            )));
        }
        let new = document_entry(category, body)?;
        self.store.replace(category, id, new)
    }

    pub fn get_entry(&self, category: &str, id: &str) -> Result<Option<Document>> {
        Ok(self.store.get(category, id)?.map(Document::from))
    }

    pub fn list_entries(&self, category: &str) -> Result<Vec<String>> {
        self.store.list(category)
    }

    pub fn get_model_capabilities(&self, model_id: &str) -> Result<Option<Document>> {
        self.get_entry(MODEL_CATEGORY, model_id)
    }

    /// Store a model capability document after checking the configured
    /// required capability fields.
    pub fn update_model_capabilities(
        &self,
        model_id: &str,
        body: Map<String, Value>,
    ) -> Result<KnowledgeEntry> {
        if let Some(field) = self.config.capabilities.first_missing(&body) {
            return Err(KnowledgeError::Configuration(format!(
                "Missing required capability: {field}"
            )));
        }
        self.store_entry(MODEL_CATEGORY, model_id, body)
    }

    /// Capability document plus best-practice hits and compatible templates.
    pub fn get_model_config(&mut self, model_id: &str) -> Result<Option<ModelConfig>> {
        let Some(document) = self.get_model_capabilities(model_id)? else {
            warn!(model_id = %model_id, "No capabilities found for model");
            return Ok(None);
        };

        let best_practices = self.search_in(model_id, &[BEST_PRACTICES_CATEGORY])?;
        let recommended_templates = self.templates_for(&document)?;

        Ok(Some(ModelConfig {
            document,
            best_practices,
            recommended_templates,
        }))
    }

    pub fn get_prompt_template(&mut self, template_id: &str) -> Result<Option<PromptTemplate>> {
        let Some(document) = self.get_entry(TEMPLATE_CATEGORY, template_id)? else {
            return Ok(None);
        };

        let related_content =
            self.search_in(template_id, &[TEMPLATE_CATEGORY, BEST_PRACTICES_CATEGORY])?;
        Ok(Some(PromptTemplate {
            document,
            related_content,
        }))
    }

    /// Whether every capability the template requires is declared truthy by
    /// the model. False when either document is missing.
    pub fn validate_model_compatibility(&self, template_id: &str, model_id: &str) -> Result<bool> {
        let Some(template) = self.get_entry(TEMPLATE_CATEGORY, template_id)? else {
            return Ok(false);
        };
        let Some(model) = self.get_model_capabilities(model_id)? else {
            return Ok(false);
        };
        Ok(satisfies(&template, &model))
    }

    /// Prompt templates whose required capabilities the model satisfies.
    pub fn compatible_templates(&self, model_id: &str) -> Result<Vec<String>> {
        match self.get_model_capabilities(model_id)? {
            Some(model) => self.templates_for(&model),
            None => Ok(Vec::new()),
        }
    }

    fn templates_for(&self, model: &Document) -> Result<Vec<String>> {
        let mut compatible = Vec::new();
        for template_id in self.store.list(TEMPLATE_CATEGORY)? {
            if let Some(template) = self.get_entry(TEMPLATE_CATEGORY, &template_id)? {
                if satisfies(&template, model) {
                    compatible.push(template_id);
                }
            }
        }
        debug!(model_id = %model.id, templates = compatible.len(), "Resolved compatible templates");
        Ok(compatible)
    }

    pub fn get_domain_knowledge(&mut self, domain: &str) -> Result<Vec<SearchHit>> {
        self.search_in(domain, &[DOMAIN_CATEGORY])
    }

    pub fn get_optimization_tips(&self, model_id: &str) -> Result<Vec<String>> {
        Ok(self
            .get_model_capabilities(model_id)?
            .map(|doc| doc.strings("optimization_tips"))
            .unwrap_or_default())
    }

    /// Merge `metrics` into the model's `performance_metrics` and store the
    /// new version. Returns false when the model is unknown.
    pub fn update_model_performance(
        &self,
        model_id: &str,
        metrics: Map<String, Value>,
    ) -> Result<bool> {
        let Some(model) = self.get_model_capabilities(model_id)? else {
            return Ok(false);
        };

        let mut body = model.body;
        let mut performance = body
            .get("performance_metrics")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        performance.extend(metrics);
        body.insert("performance_metrics".to_string(), Value::Object(performance));

        self.update_model_capabilities(model_id, body)?;
        Ok(true)
    }
}

fn satisfies(template: &Document, model: &Document) -> bool {
    let Some(required) = template.names("required_capabilities") else {
        warn!(template_id = %template.id, "Unreadable required_capabilities, treating as incompatible");
        return false;
    };
    let capabilities = model.object("capabilities");
    required
        .iter()
        .all(|name| capabilities.get(name).is_some_and(is_truthy))
}
