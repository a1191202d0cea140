//! elflow
//!
//! A minimal extract-load orchestration engine: a registry of pluggable
//! sources and destinations, an in-memory store of pipeline definitions, and
//! an engine that streams records from source to destination under a
//! cancellable context.

pub mod cli;
pub mod connectors;
pub mod error;
pub mod etl;
pub mod server;
pub mod storage;

// Re-exports for convenience
pub use connectors::{ConnectorKind, Descriptor, Registry};
pub use error::{Error, Result};
pub use etl::{Destination, Engine, PipelineDefinition, PipelineStore, RunResult, Source};
pub use storage::PipelinesManifest;
