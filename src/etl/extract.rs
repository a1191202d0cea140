//! Source trait and the paced record producer

use super::{ConnectorConfig, Record, RecordStream};
use crate::connectors::Descriptor;
use crate::error::Result;
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Source capability: validates configuration and extracts records
///
/// Implementors are stateless beyond their descriptor; every call receives
/// fresh configuration.
///
/// # Example
/// ```no_run
/// use async_trait::async_trait;
/// use elflow::connectors::Descriptor;
/// use elflow::etl::{ConnectorConfig, RecordStream, Source, produce_records};
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// struct Counting {
///     descriptor: Descriptor,
/// }
///
/// #[async_trait]
/// impl Source for Counting {
///     fn info(&self) -> &Descriptor {
///         &self.descriptor
///     }
///
///     fn validate(&self, _config: &ConnectorConfig) -> elflow::Result<()> {
///         Ok(())
///     }
///
///     async fn extract(
///         &self,
///         cancel: &CancellationToken,
///         _config: &ConnectorConfig,
///     ) -> elflow::Result<RecordStream> {
///         Ok(produce_records(cancel.clone(), 10, Duration::ZERO))
///     }
/// }
/// ```
#[async_trait]
pub trait Source: Send + Sync {
    /// Static descriptor, constant for the connector's lifetime
    fn info(&self) -> &Descriptor;

    /// Structural configuration check
    ///
    /// # Errors
    /// Returns [`Error::MissingField`](crate::Error::MissingField) for an
    /// absent or empty required key
    fn validate(&self, config: &ConnectorConfig) -> Result<()>;

    /// Start extraction and return the lazy record sequence
    ///
    /// Implementations re-validate `config` first. The returned stream ends
    /// early, without an error of its own, once `cancel` fires.
    ///
    /// # Errors
    /// Returns a validation error if `config` is incomplete
    async fn extract(
        &self,
        cancel: &CancellationToken,
        config: &ConnectorConfig,
    ) -> Result<RecordStream>;
}

/// Sample record with a 1-based `id` and a matching `payload`
pub fn fake_record(id: usize) -> Record {
    let mut record = Record::new();
    record.insert("id".to_string(), json!(id));
    record.insert("payload".to_string(), json!(format!("record-{}", id)));
    record
}

/// Spawn a producer task that yields `count` sample records
///
/// Records are handed over through a single-slot channel, so the producer is
/// never more than one record ahead of the consumer. After each handoff the
/// producer waits `pace` to stand in for I/O latency. Both waits race the
/// cancellation token and cancellation wins; the producer also stops as soon
/// as the consuming stream is dropped.
pub fn produce_records(cancel: CancellationToken, count: usize, pace: Duration) -> RecordStream {
    let (tx, rx) = mpsc::channel::<Record>(1);

    tokio::spawn(async move {
        let mut produced = 0;
        for id in 1..=count {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                sent = tx.send(fake_record(id)) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
            produced += 1;

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(pace) => {}
            }
        }
        log::debug!("Producer finished after {} of {} record(s)", produced, count);
    });

    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|record| (record, rx))
    })
    .boxed()
}
