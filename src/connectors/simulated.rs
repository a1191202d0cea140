//! Simulated connectors
//!
//! Stand-ins for real database drivers. Sources emit a fixed number of
//! sample records at a fixed pace; destinations drain whatever they are
//! given. Both only check configuration structurally.

use super::{Descriptor, ensure_required_fields};
use crate::error::Result;
use crate::etl::{ConnectorConfig, Destination, RecordStream, Source, drain_records, produce_records};
use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Required keys for relational engines
pub const RELATIONAL_FIELDS: &[&str] = &["host", "port", "user", "password", "database"];

/// Required keys for the Iceberg table reader
pub const ICEBERG_FIELDS: &[&str] = &["catalog", "table", "warehouse"];

/// Delay after each record handed off by a simulated source
pub const DEFAULT_PACE: Duration = Duration::from_millis(5);

/// Source emitting `sample_records` fake records
#[derive(Debug, Clone)]
pub struct SimulatedSource {
    descriptor: Descriptor,
    required: &'static [&'static str],
    sample_records: usize,
    pace: Duration,
}

impl SimulatedSource {
    /// Create a simulated source paced at [`DEFAULT_PACE`]
    ///
    /// # Arguments
    /// * `descriptor` - Connector metadata; its kind is forced to source
    /// * `required` - Configuration keys that must be present and non-empty
    /// * `sample_records` - Number of records every extraction yields
    pub fn new(
        descriptor: Descriptor,
        required: &'static [&'static str],
        sample_records: usize,
    ) -> Self {
        Self {
            descriptor: Descriptor {
                kind: super::ConnectorKind::Source,
                ..descriptor
            },
            required,
            sample_records,
            pace: DEFAULT_PACE,
        }
    }

    /// Override the delay between records
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    pub fn sample_records(&self) -> usize {
        self.sample_records
    }
}

#[async_trait]
impl Source for SimulatedSource {
    fn info(&self) -> &Descriptor {
        &self.descriptor
    }

    fn validate(&self, config: &ConnectorConfig) -> Result<()> {
        ensure_required_fields(self.required, config)
    }

    async fn extract(
        &self,
        cancel: &CancellationToken,
        config: &ConnectorConfig,
    ) -> Result<RecordStream> {
        self.validate(config)?;
        log::debug!(
            "Extracting {} sample record(s) from {}",
            self.sample_records,
            self.descriptor.name
        );
        Ok(produce_records(
            cancel.clone(),
            self.sample_records,
            self.pace,
        ))
    }
}

/// Destination that drains every record it receives
#[derive(Debug, Clone)]
pub struct SimulatedDestination {
    descriptor: Descriptor,
    required: &'static [&'static str],
}

impl SimulatedDestination {
    /// Create a simulated destination; the descriptor's kind is forced to destination
    pub fn new(descriptor: Descriptor, required: &'static [&'static str]) -> Self {
        Self {
            descriptor: Descriptor {
                kind: super::ConnectorKind::Destination,
                ..descriptor
            },
            required,
        }
    }
}

#[async_trait]
impl Destination for SimulatedDestination {
    fn info(&self) -> &Descriptor {
        &self.descriptor
    }

    fn validate(&self, config: &ConnectorConfig) -> Result<()> {
        ensure_required_fields(self.required, config)
    }

    async fn load(
        &self,
        cancel: &CancellationToken,
        config: &ConnectorConfig,
        records: RecordStream,
    ) -> Result<()> {
        self.validate(config)?;
        let consumed = drain_records(cancel, records).await?;
        log::debug!("Loaded {} record(s) into {}", consumed, self.descriptor.name);
        Ok(())
    }
}

/// Built-in sources: three relational engines and the Iceberg reader
pub(super) fn builtin_sources() -> Vec<SimulatedSource> {
    vec![
        SimulatedSource::new(
            relational("mysql", "High-speed MySQL binlog reader", 8),
            RELATIONAL_FIELDS,
            50,
        ),
        SimulatedSource::new(
            relational("postgres", "Logical replication with parallel snapshot", 8),
            RELATIONAL_FIELDS,
            50,
        ),
        SimulatedSource::new(
            relational("sqlserver", "SQL Server CDC with snapshot fallback", 4),
            RELATIONAL_FIELDS,
            50,
        ),
        SimulatedSource::new(
            Descriptor::source("iceberg", "Snapshot reads over Apache Iceberg metadata")
                .with_max_parallelism(6),
            ICEBERG_FIELDS,
            30,
        ),
    ]
}

/// Built-in destinations: the relational engines only
pub(super) fn builtin_destinations() -> Vec<SimulatedDestination> {
    vec![
        SimulatedDestination::new(
            relational("mysql", "Batch inserts with parallel writers", 8),
            RELATIONAL_FIELDS,
        ),
        SimulatedDestination::new(
            relational("postgres", "COPY protocol with conflict handling", 8),
            RELATIONAL_FIELDS,
        ),
        SimulatedDestination::new(
            relational("sqlserver", "Bulk copy optimized for columnstore", 4),
            RELATIONAL_FIELDS,
        ),
    ]
}

// Kind is fixed later by the Simulated* constructors
fn relational(name: &str, description: &str, max_parallelism: usize) -> Descriptor {
    Descriptor::source(name, description)
        .with_schema_change(true)
        .with_max_parallelism(max_parallelism)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::ConnectorKind;
    use crate::error::Error;
    use futures::StreamExt;

    fn relational_config() -> ConnectorConfig {
        RELATIONAL_FIELDS
            .iter()
            .map(|k| (k.to_string(), format!("{}-value", k)))
            .collect()
    }

    #[test]
    fn test_constructors_force_kind() {
        let source = SimulatedSource::new(Descriptor::destination("x", "d"), &[], 1);
        assert_eq!(source.info().kind, ConnectorKind::Source);

        let destination = SimulatedDestination::new(Descriptor::source("x", "d"), &[]);
        assert_eq!(destination.info().kind, ConnectorKind::Destination);
    }

    #[tokio::test]
    async fn test_extract_revalidates_config() {
        let source = SimulatedSource::new(Descriptor::source("mysql", "d"), RELATIONAL_FIELDS, 3);
        let mut config = relational_config();
        config.remove("password");

        let err = source
            .extract(&CancellationToken::new(), &config)
            .await
            .err()
            .unwrap();
        assert_eq!(err, Error::MissingField("password".to_string()));
    }

    #[tokio::test]
    async fn test_extract_yields_sample_size() {
        let source = SimulatedSource::new(Descriptor::source("mysql", "d"), RELATIONAL_FIELDS, 3)
            .with_pace(Duration::ZERO);
        let records = source
            .extract(&CancellationToken::new(), &relational_config())
            .await
            .unwrap();
        assert_eq!(records.count().await, 3);
    }

    #[tokio::test]
    async fn test_load_revalidates_config() {
        let destination =
            SimulatedDestination::new(Descriptor::destination("postgres", "d"), RELATIONAL_FIELDS);
        let records = futures::stream::empty().boxed();
        let err = destination
            .load(&CancellationToken::new(), &ConnectorConfig::new(), records)
            .await
            .unwrap_err();
        assert_eq!(err, Error::MissingField("host".to_string()));
    }

    #[test]
    fn test_builtin_catalogue() {
        let sources = builtin_sources();
        let iceberg = sources.iter().find(|s| s.info().name == "iceberg").unwrap();
        assert!(!iceberg.info().supports_schema_change);
        assert_eq!(iceberg.sample_records(), 30);

        let destinations = builtin_destinations();
        assert_eq!(destinations.len(), 3);
        assert!(destinations.iter().all(|d| d.info().name != "iceberg"));
    }
}
