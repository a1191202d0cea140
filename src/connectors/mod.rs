//! Connector descriptors, pairing rules and the built-in catalogue
//!
//! A connector is a named capability: either a [`Source`](crate::etl::Source)
//! that extracts records or a [`Destination`](crate::etl::Destination) that
//! loads them. Every connector carries a static [`Descriptor`] which is what
//! the registry lists and what the pairing rule inspects.

mod registry;
mod simulated;

pub use registry::{Registry, RegistryBuilder};
pub use simulated::{
    DEFAULT_PACE, ICEBERG_FIELDS, RELATIONAL_FIELDS, SimulatedDestination, SimulatedSource,
};

use crate::error::{Error, Result};
use crate::etl::ConnectorConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Connectors that may only ever be used on the extract side
pub const SOURCE_ONLY: &[&str] = &["iceberg"];

/// Whether a connector extracts or loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorKind {
    Source,
    Destination,
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectorKind::Source => write!(f, "source"),
            ConnectorKind::Destination => write!(f, "destination"),
        }
    }
}

/// Static metadata describing a connector
///
/// The `(name, kind)` pair is unique within a [`Registry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ConnectorKind,
    pub description: String,
    /// Whether the connector can follow schema changes (DDL)
    #[serde(rename = "supportsDDL")]
    pub supports_schema_change: bool,
    /// Parallelism hint, always at least 1
    #[serde(rename = "maxParallel")]
    pub max_parallelism: usize,
}

impl Descriptor {
    /// Create a descriptor with no schema-change support and a parallelism of 1
    pub fn new(name: impl Into<String>, kind: ConnectorKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            supports_schema_change: false,
            max_parallelism: 1,
        }
    }

    /// Shorthand for a source descriptor
    pub fn source(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ConnectorKind::Source, description)
    }

    /// Shorthand for a destination descriptor
    pub fn destination(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ConnectorKind::Destination, description)
    }

    pub fn with_schema_change(mut self, supported: bool) -> Self {
        self.supports_schema_change = supported;
        self
    }

    /// Set the parallelism hint; values below 1 are raised to 1
    pub fn with_max_parallelism(mut self, max_parallelism: usize) -> Self {
        self.max_parallelism = max_parallelism.max(1);
        self
    }
}

/// Check that a source and a destination may be paired
///
/// The source must be of kind source and the destination of kind destination.
/// Connectors listed in [`SOURCE_ONLY`] are never accepted as destinations.
/// This runs before any configuration is looked at.
///
/// # Errors
/// Returns [`Error::InvalidPairing`] when either rule is broken
pub fn validate_pair(source: &Descriptor, destination: &Descriptor) -> Result<()> {
    if SOURCE_ONLY.contains(&destination.name.as_str()) {
        return Err(Error::InvalidPairing(format!(
            "{} cannot be a destination",
            destination.name
        )));
    }
    if source.kind != ConnectorKind::Source || destination.kind != ConnectorKind::Destination {
        return Err(Error::InvalidPairing("invalid connector pairing".to_string()));
    }
    Ok(())
}

/// Check that every required key is present and non-empty
///
/// Purely structural: nothing is connected to.
///
/// # Errors
/// Returns [`Error::MissingField`] naming the first absent or empty key
pub fn ensure_required_fields(required: &[&str], config: &ConnectorConfig) -> Result<()> {
    for key in required {
        match config.get(*key) {
            Some(value) if !value.is_empty() => {}
            _ => return Err(Error::MissingField((*key).to_string())),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> ConnectorConfig {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_validate_pair_accepts_source_to_destination() {
        let source = Descriptor::source("mysql", "reader");
        let destination = Descriptor::destination("postgres", "writer");
        assert!(validate_pair(&source, &destination).is_ok());
    }

    #[test]
    fn test_validate_pair_rejects_wrong_kinds() {
        let source = Descriptor::source("mysql", "reader");
        let destination = Descriptor::destination("postgres", "writer");

        for (left, right) in [
            (&destination, &destination),
            (&source, &source),
            (&destination, &source),
        ] {
            let err = validate_pair(left, right).unwrap_err();
            assert!(matches!(err, Error::InvalidPairing(_)));
        }
    }

    #[test]
    fn test_validate_pair_rejects_iceberg_destination() {
        let iceberg_source = Descriptor::source("iceberg", "snapshots");
        // Even a descriptor claiming to be a destination is refused
        let iceberg_destination = Descriptor::destination("iceberg", "snapshots");

        let err = validate_pair(&iceberg_source, &iceberg_destination).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidPairing("iceberg cannot be a destination".to_string())
        );

        let err = validate_pair(&iceberg_source, &iceberg_source).unwrap_err();
        assert!(matches!(err, Error::InvalidPairing(_)));
    }

    #[test]
    fn test_required_fields_missing_and_empty() {
        let required = ["host", "password"];

        let err = ensure_required_fields(&required, &config(&[("host", "db")])).unwrap_err();
        assert_eq!(err, Error::MissingField("password".to_string()));

        let err = ensure_required_fields(&required, &config(&[("host", ""), ("password", "x")]))
            .unwrap_err();
        assert_eq!(err, Error::MissingField("host".to_string()));

        assert!(
            ensure_required_fields(&required, &config(&[("host", "db"), ("password", "x")]))
                .is_ok()
        );
    }

    #[test]
    fn test_max_parallelism_is_at_least_one() {
        let descriptor = Descriptor::source("mysql", "reader").with_max_parallelism(0);
        assert_eq!(descriptor.max_parallelism, 1);
    }

    #[test]
    fn test_descriptor_json_shape() {
        let descriptor = Descriptor::destination("postgres", "COPY protocol")
            .with_schema_change(true)
            .with_max_parallelism(8);
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "postgres",
                "type": "destination",
                "description": "COPY protocol",
                "supportsDDL": true,
                "maxParallel": 8
            })
        );
    }
}
