//! Pipeline definitions, the in-memory store and the execution engine

use super::{ConnectorConfig, Counter, tee};
use crate::connectors::Registry;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio_util::sync::CancellationToken;

/// A named pairing of one source and one destination with their configs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    pub name: String,
    #[serde(rename = "sourceType")]
    pub source_name: String,
    #[serde(rename = "sourceConfig", default)]
    pub source_config: ConnectorConfig,
    #[serde(rename = "destType")]
    pub destination_name: String,
    #[serde(rename = "destConfig", default)]
    pub destination_config: ConnectorConfig,
}

impl PipelineDefinition {
    /// Create a definition with empty configurations
    pub fn new(
        name: impl Into<String>,
        source_name: impl Into<String>,
        destination_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source_name: source_name.into(),
            source_config: ConnectorConfig::new(),
            destination_name: destination_name.into(),
            destination_config: ConnectorConfig::new(),
        }
    }

    pub fn with_source_config(mut self, config: ConnectorConfig) -> Self {
        self.source_config = config;
        self
    }

    pub fn with_destination_config(mut self, config: ConnectorConfig) -> Self {
        self.destination_config = config;
        self
    }
}

/// Concurrency-safe map from pipeline name to definition
///
/// Readers share the lock; inserts take it exclusively for the map write only.
#[derive(Debug, Default)]
pub struct PipelineStore {
    pipelines: RwLock<HashMap<String, PipelineDefinition>>,
}

impl PipelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a definition, returning the one it replaced
    pub fn insert(&self, definition: PipelineDefinition) -> Option<PipelineDefinition> {
        // Entries are always whole definitions, so a poisoned map is still consistent
        let mut pipelines = self.pipelines.write().unwrap_or_else(PoisonError::into_inner);
        pipelines.insert(definition.name.clone(), definition)
    }

    pub fn get(&self, name: &str) -> Option<PipelineDefinition> {
        let pipelines = self.pipelines.read().unwrap_or_else(PoisonError::into_inner);
        pipelines.get(name).cloned()
    }

    /// All definitions sorted by name
    pub fn list(&self) -> Vec<PipelineDefinition> {
        let mut result: Vec<PipelineDefinition> = {
            let pipelines = self.pipelines.read().unwrap_or_else(PoisonError::into_inner);
            pipelines.values().cloned().collect()
        };
        result.sort_by(|a, b| a.name.cmp(&b.name));
        result
    }

    pub fn len(&self) -> usize {
        self.pipelines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of one pipeline run
///
/// An empty `error` means the run succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub pipeline_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub records: usize,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl RunResult {
    fn start(pipeline_name: &str) -> Self {
        let now = Utc::now();
        Self {
            pipeline_name: pipeline_name.to_string(),
            started_at: now,
            finished_at: now,
            records: 0,
            error: String::new(),
        }
    }

    fn finish(mut self, records: usize, outcome: Result<()>) -> Self {
        self.records = records;
        self.error = match outcome {
            Ok(()) => String::new(),
            Err(err) => err.to_string(),
        };
        self.finished_at = Utc::now();
        self
    }

    pub fn is_success(&self) -> bool {
        self.error.is_empty()
    }
}

/// Execution engine over an explicitly owned registry and store
///
/// # Example
/// ```no_run
/// use elflow::connectors::Registry;
/// use elflow::etl::{Engine, PipelineStore};
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() {
/// let engine = Engine::new(Arc::new(Registry::builtin()), Arc::new(PipelineStore::new()));
/// let result = engine.run(&CancellationToken::new(), "nightly-sync").await;
/// assert_eq!(result.error, "pipeline not found");
/// # }
/// ```
pub struct Engine {
    registry: Arc<Registry>,
    store: Arc<PipelineStore>,
}

impl Engine {
    pub fn new(registry: Arc<Registry>, store: Arc<PipelineStore>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &PipelineStore {
        &self.store
    }

    /// Validate and store a pipeline definition
    ///
    /// Checks run in order: name, connector names, pairing, source config,
    /// destination config. The store is only touched once all of them pass;
    /// an existing definition with the same name is replaced.
    ///
    /// # Errors
    /// - [`Error::InvalidName`] for an empty or blank name
    /// - [`Error::UnknownConnector`] for an unregistered connector name
    /// - [`Error::InvalidPairing`] for a disallowed source/destination pair
    /// - [`Error::MissingField`] for incomplete configuration
    pub fn create(&self, definition: PipelineDefinition) -> Result<()> {
        if let Err(err) = self.check(&definition) {
            log::warn!("Rejected pipeline '{}': {}", definition.name, err);
            return Err(err);
        }

        let name = definition.name.clone();
        match self.store.insert(definition) {
            Some(_) => log::info!("Replaced pipeline '{}'", name),
            None => log::info!("Created pipeline '{}'", name),
        }
        Ok(())
    }

    fn check(&self, definition: &PipelineDefinition) -> Result<()> {
        if definition.name.trim().is_empty() {
            return Err(Error::InvalidName);
        }
        let (source, destination) = self
            .registry
            .resolve(&definition.source_name, &definition.destination_name)?;
        source.validate(&definition.source_config)?;
        destination.validate(&definition.destination_config)?;
        Ok(())
    }

    /// All stored definitions sorted by name
    pub fn list(&self) -> Vec<PipelineDefinition> {
        self.store.list()
    }

    /// Run a stored pipeline to completion or cancellation
    ///
    /// Never fails: every error, including an unknown pipeline name, is
    /// recorded in the returned [`RunResult`]. `records` counts what reached
    /// the destination, not what the source produced.
    pub async fn run(&self, cancel: &CancellationToken, name: &str) -> RunResult {
        let result = RunResult::start(name);

        let Some(definition) = self.store.get(name) else {
            log::warn!("Run requested for unknown pipeline '{}'", name);
            return result.finish(0, Err(Error::PipelineNotFound));
        };

        let (source, destination) = match self
            .registry
            .resolve(&definition.source_name, &definition.destination_name)
        {
            Ok(pair) => pair,
            Err(err) => {
                log::warn!("Pipeline '{}' failed to resolve: {}", name, err);
                return result.finish(0, Err(err));
            }
        };

        log::info!(
            "Running pipeline '{}' ({} -> {})",
            name,
            definition.source_name,
            definition.destination_name
        );

        log::debug!("Extracting from {}...", definition.source_name);
        let records = match source.extract(cancel, &definition.source_config).await {
            Ok(records) => records,
            Err(err) => {
                log::warn!("Pipeline '{}' failed to extract: {}", name, err);
                return result.finish(0, Err(err));
            }
        };

        let counter = Counter::new();
        let teed = tee(records, counter.tap());

        log::debug!("Loading into {}...", definition.destination_name);
        let outcome = destination
            .load(cancel, &definition.destination_config, teed)
            .await;

        let result = result.finish(counter.get(), outcome);
        if result.is_success() {
            log::info!("Pipeline '{}' loaded {} record(s)", name, result.records);
        } else {
            log::warn!(
                "Pipeline '{}' stopped after {} record(s): {}",
                name,
                result.records,
                result.error
            );
        }
        result
    }
}
