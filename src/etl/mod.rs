//! Core extract-load abstractions
//!
//! This module provides the capability contract for connectors and the
//! engine that moves records from a [`Source`] to a [`Destination`]:
//! extraction produces a lazy, cancellable [`RecordStream`], a counting
//! [`tee`] sits in front of the load, and every run ends in a [`RunResult`].

mod extract;
mod load;
mod pipeline;
mod transform;

pub use extract::{Source, fake_record, produce_records};
pub use load::{Destination, drain_records};
pub use pipeline::{Engine, PipelineDefinition, PipelineStore, RunResult};
pub use transform::{Counter, tee};

use futures::stream::BoxStream;
use std::collections::BTreeMap;

/// Per-side connection settings: string keys to string values
pub type ConnectorConfig = BTreeMap<String, String>;

/// A single unit of data moved from a source to a destination
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Finite, lazily produced sequence of records
pub type RecordStream = BoxStream<'static, Record>;
