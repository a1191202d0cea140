//! Destination trait and the cancellable drain routine

use super::{ConnectorConfig, RecordStream};
use crate::connectors::Descriptor;
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

/// Destination capability: validates configuration and loads records
///
/// Loads are not transactional. Records consumed before a cancellation stay
/// delivered.
#[async_trait]
pub trait Destination: Send + Sync {
    /// Static descriptor, constant for the connector's lifetime
    fn info(&self) -> &Descriptor;

    /// Structural configuration check
    ///
    /// # Errors
    /// Returns [`Error::MissingField`] for an absent or empty required key
    fn validate(&self, config: &ConnectorConfig) -> Result<()>;

    /// Consume `records` until exhaustion or cancellation
    ///
    /// Implementations re-validate `config` before consuming anything.
    ///
    /// # Errors
    /// - Validation errors for incomplete configuration
    /// - [`Error::Cancelled`] if `cancel` fires before the stream is exhausted
    async fn load(
        &self,
        cancel: &CancellationToken,
        config: &ConnectorConfig,
        records: RecordStream,
    ) -> Result<()>;
}

/// Pull every record from `records`, returning how many were consumed
///
/// Each wait for the next record races the cancellation token, and
/// cancellation takes priority over a record that is ready at the same time.
///
/// # Errors
/// Returns [`Error::Cancelled`] when `cancel` fires first
pub async fn drain_records(cancel: &CancellationToken, mut records: RecordStream) -> Result<usize> {
    let mut consumed = 0;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            next = records.next() => match next {
                Some(_) => consumed += 1,
                None => return Ok(consumed),
            },
        }
    }
}
