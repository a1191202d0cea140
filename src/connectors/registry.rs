//! Connector registry
//!
//! Built once at start-up and read-only afterwards, so it is shared without
//! locking. Adding a connector is a matter of registering another
//! [`Source`] or [`Destination`] implementation with the builder.

use super::simulated::{builtin_destinations, builtin_sources};
use super::{ConnectorKind, Descriptor, validate_pair};
use crate::error::{Error, Result};
use crate::etl::{Destination, Source};
use std::collections::HashMap;
use std::sync::Arc;

/// Catalogue of available sources and destinations, indexed by name
///
/// # Example
/// ```
/// use elflow::connectors::Registry;
///
/// let registry = Registry::builtin();
/// let (source, destination) = registry.resolve("mysql", "postgres").unwrap();
/// assert_eq!(source.info().name, "mysql");
/// assert_eq!(destination.info().name, "postgres");
/// assert!(registry.resolve("iceberg", "iceberg").is_err());
/// ```
#[derive(Clone)]
pub struct Registry {
    sources: HashMap<String, Arc<dyn Source>>,
    destinations: HashMap<String, Arc<dyn Destination>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registry with the built-in simulated connectors
    pub fn builtin() -> Self {
        let sources = builtin_sources()
            .into_iter()
            .map(|s| (s.info().name.clone(), Arc::new(s) as Arc<dyn Source>))
            .collect();
        let destinations = builtin_destinations()
            .into_iter()
            .map(|d| (d.info().name.clone(), Arc::new(d) as Arc<dyn Destination>))
            .collect();
        Self {
            sources,
            destinations,
        }
    }

    /// One descriptor per registered connector, sorted by kind then name
    pub fn available(&self) -> Vec<Descriptor> {
        let mut result: Vec<Descriptor> = self
            .sources
            .values()
            .map(|s| s.info().clone())
            .chain(self.destinations.values().map(|d| d.info().clone()))
            .collect();
        result.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.name.cmp(&b.name)));
        result
    }

    /// # Errors
    /// Returns [`Error::UnknownConnector`] if no source has this name
    pub fn source_by_name(&self, name: &str) -> Result<Arc<dyn Source>> {
        self.sources
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownConnector {
                kind: ConnectorKind::Source,
                name: name.to_string(),
            })
    }

    /// # Errors
    /// Returns [`Error::UnknownConnector`] if no destination has this name
    pub fn destination_by_name(&self, name: &str) -> Result<Arc<dyn Destination>> {
        self.destinations
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownConnector {
                kind: ConnectorKind::Destination,
                name: name.to_string(),
            })
    }

    /// Resolve both names and check that they may be paired
    ///
    /// A destination name that is registered only as a source is reported as
    /// a pairing error rather than an unknown connector.
    ///
    /// # Errors
    /// - [`Error::UnknownConnector`] for an unregistered name
    /// - [`Error::InvalidPairing`] for a disallowed pair
    pub fn resolve(
        &self,
        source: &str,
        destination: &str,
    ) -> Result<(Arc<dyn Source>, Arc<dyn Destination>)> {
        let source = self.source_by_name(source)?;
        let destination = match self.destination_by_name(destination) {
            Ok(destination) => destination,
            Err(err) => {
                if let Some(source_only) = self.sources.get(destination) {
                    validate_pair(source.info(), source_only.info())?;
                }
                return Err(err);
            }
        };
        validate_pair(source.info(), destination.info())?;
        Ok((source, destination))
    }

    pub fn len(&self) -> usize {
        self.sources.len() + self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Collects connectors for a [`Registry`]
#[derive(Default)]
pub struct RegistryBuilder {
    sources: Vec<Arc<dyn Source>>,
    destinations: Vec<Arc<dyn Destination>>,
}

impl RegistryBuilder {
    pub fn source(mut self, source: impl Source + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    pub fn destination(mut self, destination: impl Destination + 'static) -> Self {
        self.destinations.push(Arc::new(destination));
        self
    }

    /// Build the registry
    ///
    /// # Errors
    /// Returns an error if two connectors of the same kind share a name, or a
    /// connector's descriptor kind does not match the side it was registered on
    pub fn build(self) -> eyre::Result<Registry> {
        let mut sources = HashMap::new();
        for source in self.sources {
            let info = source.info();
            if info.kind != ConnectorKind::Source {
                eyre::bail!("Connector '{}' registered as a source has kind {}", info.name, info.kind);
            }
            let name = info.name.clone();
            if sources.insert(name.clone(), source).is_some() {
                eyre::bail!("Duplicate source connector '{}'", name);
            }
        }

        let mut destinations = HashMap::new();
        for destination in self.destinations {
            let info = destination.info();
            if info.kind != ConnectorKind::Destination {
                eyre::bail!(
                    "Connector '{}' registered as a destination has kind {}",
                    info.name,
                    info.kind
                );
            }
            let name = info.name.clone();
            if destinations.insert(name.clone(), destination).is_some() {
                eyre::bail!("Duplicate destination connector '{}'", name);
            }
        }

        Ok(Registry {
            sources,
            destinations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::{RELATIONAL_FIELDS, SimulatedDestination, SimulatedSource};
    use std::collections::HashSet;

    #[test]
    fn test_available_has_unique_name_kind_pairs() {
        let registry = Registry::builtin();
        let available = registry.available();
        assert_eq!(available.len(), 7);
        assert_eq!(available.len(), registry.len());

        let unique: HashSet<(String, ConnectorKind)> =
            available.iter().map(|d| (d.name.clone(), d.kind)).collect();
        assert_eq!(unique.len(), available.len());
    }

    #[test]
    fn test_available_sorted_sources_first() {
        let names: Vec<(ConnectorKind, String)> = Registry::builtin()
            .available()
            .into_iter()
            .map(|d| (d.kind, d.name))
            .collect();
        assert_eq!(names[0], (ConnectorKind::Source, "iceberg".to_string()));
        assert_eq!(names[4], (ConnectorKind::Destination, "mysql".to_string()));
    }

    #[test]
    fn test_lookup_unknown_names() {
        let registry = Registry::builtin();
        assert!(registry.source_by_name("mysql").is_ok());
        assert!(matches!(
            registry.source_by_name("oracle"),
            Err(Error::UnknownConnector { kind: ConnectorKind::Source, .. })
        ));
        assert!(matches!(
            registry.destination_by_name("iceberg"),
            Err(Error::UnknownConnector { kind: ConnectorKind::Destination, .. })
        ));
    }

    #[test]
    fn test_resolve_source_only_as_destination_is_pairing_error() {
        let registry = Registry::builtin();
        for source in ["iceberg", "mysql"] {
            let err = registry.resolve(source, "iceberg").err().unwrap();
            assert!(matches!(err, Error::InvalidPairing(_)), "{source}: {err}");
        }
    }

    #[test]
    fn test_resolve_unknown_destination() {
        let err = Registry::builtin().resolve("mysql", "oracle").err().unwrap();
        assert_eq!(
            err,
            Error::UnknownConnector {
                kind: ConnectorKind::Destination,
                name: "oracle".to_string()
            }
        );
    }

    #[test]
    fn test_builder_rejects_duplicates() {
        let result = Registry::builder()
            .source(SimulatedSource::new(Descriptor::source("a", "1"), RELATIONAL_FIELDS, 1))
            .source(SimulatedSource::new(Descriptor::source("a", "2"), RELATIONAL_FIELDS, 1))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_allows_same_name_on_both_sides() {
        let registry = Registry::builder()
            .source(SimulatedSource::new(Descriptor::source("a", "1"), RELATIONAL_FIELDS, 1))
            .destination(SimulatedDestination::new(
                Descriptor::destination("a", "2"),
                RELATIONAL_FIELDS,
            ))
            .build()
            .unwrap();
        assert_eq!(registry.available().len(), 2);
        assert!(registry.resolve("a", "a").is_ok());
    }
}
