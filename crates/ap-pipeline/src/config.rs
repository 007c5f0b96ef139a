use ap_types::{config_error, ApResult};
use ap_updates::{parse_search_space_updates, SearchSpaceUpdates};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Configuration for building a pipeline from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,

    /// Search-space update file. `None`, or a path named `None`, disables updates.
    #[serde(default)]
    pub search_space_updates_file: Option<PathBuf>,

    /// Components to keep, per choice step.
    #[serde(default)]
    pub include: HashMap<String, Vec<String>>,

    /// Components to drop, per choice step.
    #[serde(default)]
    pub exclude: HashMap<String, Vec<String>>,
}

impl PipelineConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            search_space_updates_file: None,
            include: HashMap::new(),
            exclude: HashMap::new(),
        }
    }

    pub fn with_search_space_updates_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_space_updates_file = Some(path.into());
        self
    }

    pub fn with_include(mut self, step: &str, components: &[&str]) -> Self {
        self.include
            .insert(step.to_string(), components.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn with_exclude(mut self, step: &str, components: &[&str]) -> Self {
        self.exclude
            .insert(step.to_string(), components.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> ApResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        info!("Loaded pipeline config {} from {}", config.name, path.display());
        Ok(config)
    }

    pub fn validate(&self) -> ApResult<()> {
        if self.name.trim().is_empty() {
            return Err(config_error!("Pipeline name must not be empty"));
        }
        if let Some(step) = self.include.keys().find(|step| self.exclude.contains_key(*step)) {
            return Err(config_error!(
                "Step {} cannot have both include and exclude lists",
                step
            ));
        }
        Ok(())
    }

    /// Read the configured update file, if any.
    pub fn load_search_space_updates(&self) -> ApResult<Option<SearchSpaceUpdates>> {
        parse_search_space_updates(self.search_space_updates_file.as_deref())
    }
}
