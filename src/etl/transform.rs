//! Tee stage between extraction and load

use super::{Record, RecordStream};
use futures::StreamExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Forward every record unchanged, calling `tap` exactly once per record
///
/// The tap runs at the moment a record is handed downstream, so it observes
/// only records the consumer actually pulled. The next upstream record is
/// not requested until the consumer asks for it: order is preserved and
/// nothing is buffered.
pub fn tee<F>(records: RecordStream, mut tap: F) -> RecordStream
where
    F: FnMut(&Record) + Send + 'static,
{
    records.inspect(move |record| tap(record)).boxed()
}

/// Shared record counter used as the tap of a [`tee`]
#[derive(Debug, Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current count
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    /// A tap closure that increments this counter
    pub fn tap(&self) -> impl FnMut(&Record) + Send + 'static {
        let count = Arc::clone(&self.0);
        move |_: &Record| {
            count.fetch_add(1, Ordering::AcqRel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etl::fake_record;
    use futures::stream;

    fn records(n: usize) -> RecordStream {
        stream::iter((1..=n).map(fake_record)).boxed()
    }

    #[tokio::test]
    async fn test_tee_counts_and_preserves_order() {
        let counter = Counter::new();
        let teed = tee(records(5), counter.tap());

        let ids: Vec<i64> = teed
            .map(|r| r.get("id").and_then(|v| v.as_i64()).unwrap())
            .collect()
            .await;

        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(counter.get(), 5);
    }

    #[tokio::test]
    async fn test_tee_counts_only_pulled_records() {
        let counter = Counter::new();
        let mut teed = tee(records(10), counter.tap());

        assert!(teed.next().await.is_some());
        assert!(teed.next().await.is_some());
        assert_eq!(counter.get(), 2);

        // Dropping the stream stops the count where the consumer left off
        drop(teed);
        assert_eq!(counter.get(), 2);
    }

    #[tokio::test]
    async fn test_tee_empty_stream() {
        let counter = Counter::new();
        let teed = tee(records(0), counter.tap());
        assert_eq!(teed.count().await, 0);
        assert_eq!(counter.get(), 0);
    }
}
