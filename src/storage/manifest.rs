//! Pipelines manifest
//!
//! A YAML file listing pipeline definitions, used to seed a running engine
//! or to run a pipeline from the command line.
//!
//! Example format:
//! ```yaml
//! pipelines:
//!   - name: nightly-sync
//!     sourceType: mysql
//!     sourceConfig:
//!       host: db1
//!       port: "3306"
//!       user: etl
//!       password: s3cret
//!       database: shop
//!     destType: postgres
//!     destConfig:
//!       host: dw
//!       port: "5432"
//!       user: etl
//!       password: s3cret
//!       database: warehouse
//! ```

use crate::etl::PipelineDefinition;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pipelines manifest structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PipelinesManifest {
    /// Pipeline definitions, in file order
    #[serde(default)]
    pub pipelines: Vec<PipelineDefinition>,
}

impl PipelinesManifest {
    /// Create a new empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manifest with the given pipelines
    pub fn with_pipelines(pipelines: Vec<PipelineDefinition>) -> Self {
        Self { pipelines }
    }

    /// Find a pipeline by name
    pub fn get(&self, name: &str) -> Option<&PipelineDefinition> {
        self.pipelines.iter().find(|p| p.name == name)
    }

    /// Get the number of pipelines in the manifest
    pub fn count(&self) -> usize {
        self.pipelines.len()
    }

    /// Read manifest from YAML file
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipelines manifest: {}", path.display()))?;

        let manifest: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse pipelines manifest YAML: {}", path.display()))?;

        log::debug!(
            "Read {} pipeline(s) from {}",
            manifest.count(),
            path.display()
        );
        Ok(manifest)
    }

    /// Write manifest to YAML file
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create manifest directory: {}", parent.display())
                })?;
            }
        }

        let content = serde_yaml::to_string(self)
            .with_context(|| "Failed to serialize pipelines manifest")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write pipelines manifest: {}", path.display()))?;

        Ok(())
    }
}
