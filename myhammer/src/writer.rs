use crate::error::StoreError;
use crate::signal::CancelSignal;
use crate::store::{Store, StoreWriter};
use myhammer_core::{FailurePolicy, WorkerExit, WorkerId, WorkerStatistics};
use std::sync::Arc;
use tokio::sync::mpsc::Sender;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// A single worker hammering the store with inserts.
///
/// Owns its connection and its value counter. The loop only checks for cancellation between
/// writes, so an insert that has already started always completes.
pub(crate) struct Writer<S: Store> {
    id: WorkerId,
    store: Arc<S>,
    conn: Option<S::Writer>,
    policy: FailurePolicy,
    signal: CancelSignal,
    results: Sender<i64>,
    value: i64,
    writes: u64,
    failures: u64,
}

impl<S: Store> Writer<S> {
    pub fn new(
        id: WorkerId,
        store: Arc<S>,
        policy: FailurePolicy,
        signal: CancelSignal,
        results: Sender<i64>,
    ) -> Self {
        Self {
            id,
            store,
            conn: None,
            policy,
            signal,
            results,
            value: 0,
            writes: 0,
            failures: 0,
        }
    }

    pub async fn run(mut self) -> WorkerStatistics {
        info!("Starting request loop");

        #[cfg(feature = "metrics")]
        metrics::gauge!("myhammer.workers.active").increment(1.);

        let exit = loop {
            if self.signal.is_triggered() {
                info!("Cancelled: stopping worker {}", self.id);
                break WorkerExit::Cancelled;
            }

            match self.write_once().await {
                Ok(key) => {
                    debug!("worker={} value={} key={}", self.id, self.value, key);

                    // NOTE: Blocks while the aggregator is behind.
                    if self.results.send(key).await.is_err() {
                        error!("Result channel closed, stopping worker {}", self.id);
                        break WorkerExit::StoppedOnError;
                    }

                    self.writes += 1;
                    self.value += 1;

                    #[cfg(feature = "metrics")]
                    metrics::counter!("myhammer.writes.success").increment(1);
                }
                Err(err) => {
                    self.failures += 1;

                    #[cfg(feature = "metrics")]
                    metrics::counter!("myhammer.writes.error").increment(1);

                    match self.policy {
                        FailurePolicy::Resilient => {
                            warn!("Error in worker {}: {err}", self.id);
                            // A store failing without ever awaiting would otherwise starve
                            // the runtime.
                            tokio::task::yield_now().await;
                        }
                        FailurePolicy::FailFast => {
                            error!("Error in worker {}, stopping: {err}", self.id);
                            break WorkerExit::StoppedOnError;
                        }
                    }
                }
            }
        };

        #[cfg(feature = "metrics")]
        metrics::gauge!("myhammer.workers.active").decrement(1.);

        WorkerStatistics {
            worker: self.id,
            writes: self.writes,
            failures: self.failures,
            exit,
        }
    }

    async fn write_once(&mut self) -> Result<i64, StoreError> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => {
                trace!("Connecting worker {}", self.id);
                self.store.connect(self.id).await?
            }
        };
        let conn = self.conn.insert(conn);

        conn.insert_row(self.id, self.value).await
    }
}
