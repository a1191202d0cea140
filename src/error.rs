//! Error taxonomy for connector resolution, pipeline creation and runs
//!
//! Creation-time errors are returned to the caller directly. Run-time errors
//! never escape [`Engine::run`](crate::etl::Engine::run); their `Display`
//! text is what ends up in a run result's `error` field.

use crate::connectors::ConnectorKind;
use thiserror::Error;

/// Errors raised by the registry, the connectors and the engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A referenced source or destination name is not registered
    #[error("unknown {kind} connector {name}")]
    UnknownConnector { kind: ConnectorKind, name: String },

    /// Kind mismatch, or a source-only connector used as a destination
    #[error("{0}")]
    InvalidPairing(String),

    /// A required configuration key is absent or empty
    #[error("missing required config {0}")]
    MissingField(String),

    /// Pipeline name is empty after trimming
    #[error("pipeline name is required")]
    InvalidName,

    /// The run's context ended before the load completed
    #[error("run cancelled")]
    Cancelled,

    #[error("pipeline not found")]
    PipelineNotFound,
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(Error::PipelineNotFound.to_string(), "pipeline not found");
        assert_eq!(
            Error::MissingField("password".to_string()).to_string(),
            "missing required config password"
        );
        assert_eq!(
            Error::UnknownConnector {
                kind: ConnectorKind::Destination,
                name: "oracle".to_string(),
            }
            .to_string(),
            "unknown destination connector oracle"
        );
    }
}
