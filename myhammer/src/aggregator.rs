use myhammer_core::NO_KEY;
use tokio::sync::mpsc::Receiver;
#[allow(unused)]
use tracing::{debug, trace};

/// Running maximum over every generated key reported by the writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Aggregate {
    max_key: i64,
    observed: u64,
}

impl Default for Aggregate {
    fn default() -> Self {
        Self {
            max_key: NO_KEY,
            observed: 0,
        }
    }
}

impl Aggregate {
    pub fn fold(&mut self, key: i64) {
        self.max_key = self.max_key.max(key);
        self.observed += 1;
    }

    pub fn max_key(&self) -> i64 {
        self.max_key
    }

    pub fn observed(&self) -> u64 {
        self.observed
    }
}

/// Fold keys until every sender has been dropped and the channel is drained.
pub(crate) async fn aggregate(mut results: Receiver<i64>) -> Aggregate {
    let mut aggregate = Aggregate::default();
    while let Some(key) = results.recv().await {
        trace!("key={key}");
        aggregate.fold(key);
    }

    debug!(
        "Result channel closed after {} keys, max key {}",
        aggregate.observed, aggregate.max_key
    );
    aggregate
}
