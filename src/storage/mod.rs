//! File system storage operations
//!
//! Pipelines live in memory while the process runs. This module only handles
//! importing and exporting them as YAML manifests.

mod manifest;

pub use manifest::PipelinesManifest;
