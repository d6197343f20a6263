//! Orchestration of a full run
//!
//! [`Hammer`] resets and prepares the schema, starts the writers one stagger apart, and waits for
//! every one of them to finish before closing the result channel and reading the final max.
use crate::aggregator::aggregate;
use crate::error::HammerError;
use crate::signal::{listen_for_interrupt, CancelSignal, ListenerGuard};
use crate::store::Store;
use crate::writer::Writer;
use myhammer_core::{
    FailurePolicy, HammerConfig, RunStatistics, WorkerExit, WorkerId, WorkerStatistics,
    RESULT_CHANNEL_CAPACITY,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::channel;
#[allow(unused_imports)]
use tracing::{debug, error, info, info_span, instrument, trace, warn, Instrument};

/// Validate a requested worker count.
///
/// Zero and negative counts are rejected with [`HammerError::InvalidConfiguration`].
pub fn worker_count(requested: i64) -> Result<usize, HammerError> {
    if requested <= 0 {
        return Err(HammerError::InvalidConfiguration(format!(
            "worker count must be positive, got {requested}"
        )));
    }

    usize::try_from(requested).map_err(|_| {
        HammerError::InvalidConfiguration(format!("worker count {requested} is too large"))
    })
}

/// Load run against a [`Store`]
///
/// # Example
/// ```no_run
/// use myhammer::prelude::*;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), HammerError> {
/// let stats = Hammer::new(MySqlStore::new(ConnectionConfig::default()))
///     .workers(3)
///     .stagger(Duration::from_millis(250))
///     .policy(FailurePolicy::FailFast)
///     .run()
///     .await?;
/// assert!(stats.max_key >= NO_KEY);
/// # Ok(())
/// # }
/// ```
pub struct Hammer<S> {
    store: Arc<S>,
    config: HammerConfig,
}

impl<S: Store + 'static> Hammer<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, HammerConfig::default())
    }

    pub fn with_config(store: S, config: HammerConfig) -> Self {
        Self {
            store: Arc::new(store),
            config,
        }
    }

    /// Number of concurrent writers (default `20`)
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Pause between two worker spawns (default `100ms`)
    pub fn stagger(mut self, stagger: Duration) -> Self {
        self.config.stagger = stagger;
        self
    }

    /// What a writer does after a failed insert (default [`FailurePolicy::Resilient`])
    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.config.policy = policy;
        self
    }

    pub fn config(&self) -> &HammerConfig {
        &self.config
    }

    /// Run until the first Ctrl+C/SIGTERM, then drain and report.
    ///
    /// The interrupt listener lives only as long as the run.
    pub async fn run(self) -> Result<RunStatistics, HammerError> {
        let signal = CancelSignal::new();
        let _listener =
            ListenerGuard::spawn(listen_for_interrupt(signal.clone()).in_current_span());
        self.run_with_signal(signal).await
    }

    /// Run until `signal` is triggered, then drain and report.
    #[instrument(name = "hammer", skip_all, fields(workers = self.config.workers))]
    pub async fn run_with_signal(self, signal: CancelSignal) -> Result<RunStatistics, HammerError> {
        if self.config.workers == 0 {
            return Err(HammerError::InvalidConfiguration(
                "worker count must be positive, got 0".to_string(),
            ));
        }

        info!("Running with config {}", self.config);

        self.store
            .reset_schema()
            .await
            .map_err(HammerError::SchemaSetup)?;
        self.store
            .ensure_schema()
            .await
            .map_err(HammerError::SchemaSetup)?;

        let start = Instant::now();
        let (tx, rx) = channel(RESULT_CHANNEL_CAPACITY);
        let aggregator = tokio::spawn(aggregate(rx).in_current_span());

        // Grows with the spawned writers; the requested count is unbounded.
        let mut handles = Vec::new();
        for idx in 0..self.config.workers {
            if idx > 0 {
                tokio::select! {
                    () = tokio::time::sleep(self.config.stagger) => {}
                    () = signal.triggered() => {}
                }
            }

            if signal.is_triggered() {
                info!(
                    "Cancelled while starting workers, {idx} of {} running",
                    self.config.workers
                );
                break;
            }

            let id = WorkerId(idx);
            let writer = Writer::new(
                id,
                self.store.clone(),
                self.config.policy,
                signal.clone(),
                tx.clone(),
            );
            let span = info_span!("worker", worker = idx);
            handles.push((id, tokio::spawn(writer.run().instrument(span))));
        }
        debug!("{} workers started", handles.len());

        // Completion barrier: every writer has reached a terminal state past this loop.
        let mut workers = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            let stats = match handle.await {
                Ok(stats) => stats,
                Err(err) => {
                    error!("Worker {id} did not finish cleanly: {err}");
                    WorkerStatistics {
                        worker: id,
                        writes: 0,
                        failures: 0,
                        exit: WorkerExit::Panicked,
                    }
                }
            };
            workers.push(stats);
        }

        // Writers dropped their senders on exit; this is the last one, so the aggregator now sees
        // the end of the stream once it has drained the buffer.
        drop(tx);
        let aggregate = aggregator.await?;

        let stats = RunStatistics {
            max_key: aggregate.max_key(),
            keys_observed: aggregate.observed(),
            elapsed: start.elapsed(),
            workers,
        };
        info!("Run complete: {stats}");

        Ok(stats)
    }
}
