//! In-memory [`Store`] for exercising the orchestration without a database.
//!
//! Keys are handed out from one shared counter, so they come out as `1, 2, 3, ...` in the order
//! inserts complete across all workers.
use myhammer::prelude::*;
use rand_distr::{Distribution, Normal};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Barrier;
use tracing::debug;

pub mod prelude {
    pub use crate::{MockStore, MockStoreState, Row};
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Row {
    pub worker: WorkerId,
    pub value: i64,
    pub key: i64,
}

/// Pause every worker on its `n`th write until all of them got there.
struct Gate {
    writes_per_worker: u64,
    barrier: Barrier,
    signal: CancelSignal,
}

#[derive(Default)]
pub struct MockStoreState {
    next_key: AtomicI64,
    resets: AtomicUsize,
    ensures: AtomicUsize,
    connects: AtomicUsize,
    inserts: AtomicUsize,
    schema_present: AtomicBool,
    fail_ensure: AtomicBool,
    failing_workers: Mutex<HashSet<WorkerId>>,
    panicking_workers: Mutex<HashSet<WorkerId>>,
    latency: Mutex<Option<Normal<f64>>>,
    gate: Mutex<Option<Arc<Gate>>>,
    rows: Mutex<Vec<Row>>,
    // Guard against two live writers for the same worker.
    writers: Mutex<HashMap<WorkerId, usize>>,
}

impl MockStoreState {
    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    pub fn ensures(&self) -> usize {
        self.ensures.load(Ordering::SeqCst)
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Every insert attempt, failed or not.
    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    /// Total number of store calls of any kind.
    pub fn calls(&self) -> usize {
        self.resets() + self.ensures() + self.connects() + self.inserts()
    }

    pub fn schema_present(&self) -> bool {
        self.schema_present.load(Ordering::SeqCst)
    }

    pub fn rows(&self) -> Vec<Row> {
        self.rows.lock().unwrap().clone()
    }

    pub fn rows_for(&self, worker: WorkerId) -> Vec<Row> {
        self.rows()
            .into_iter()
            .filter(|row| row.worker == worker)
            .collect()
    }

    /// Connections currently held by `worker`.
    pub fn live_writers(&self, worker: WorkerId) -> usize {
        self.writers
            .lock()
            .unwrap()
            .get(&worker)
            .copied()
            .unwrap_or(0)
    }

    pub fn max_key(&self) -> i64 {
        self.rows().iter().map(|row| row.key).max().unwrap_or(NO_KEY)
    }
}

#[derive(Clone, Default)]
pub struct MockStore {
    state: Arc<MockStoreState>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every insert from `worker` fails.
    pub fn fail_worker(self, worker: WorkerId) -> Self {
        self.state.failing_workers.lock().unwrap().insert(worker);
        self
    }

    /// The first insert from `worker` panics.
    pub fn panic_worker(self, worker: WorkerId) -> Self {
        self.state.panicking_workers.lock().unwrap().insert(worker);
        self
    }

    pub fn fail_ensure(self) -> Self {
        self.state.fail_ensure.store(true, Ordering::SeqCst);
        self
    }

    /// Sleep a normally distributed time around `mean` on every insert.
    pub fn latency(self, mean: Duration, std: Duration) -> Self {
        if let Ok(normal) = Normal::new(mean.as_secs_f64(), std.as_secs_f64()) {
            *self.state.latency.lock().unwrap() = Some(normal);
        }
        self
    }

    /// Hold each of `workers` inside its `writes_per_worker`th insert until all of them are
    /// there, then trigger `signal` before letting the inserts return.
    pub fn stop_after(self, writes_per_worker: u64, workers: usize, signal: CancelSignal) -> Self {
        *self.state.gate.lock().unwrap() = Some(Arc::new(Gate {
            writes_per_worker,
            barrier: Barrier::new(workers),
            signal,
        }));
        self
    }

    pub fn state(&self) -> Arc<MockStoreState> {
        self.state.clone()
    }
}

fn injected(what: &str) -> StoreError {
    StoreError::Statement {
        statement: what.to_string(),
        source: sqlx::Error::Protocol(format!("injected failure in `{what}`")),
    }
}

impl Store for MockStore {
    type Writer = MockWriter;

    async fn reset_schema(&self) -> Result<(), StoreError> {
        self.state.resets.fetch_add(1, Ordering::SeqCst);
        // Dropping a missing schema is not an error.
        self.state.schema_present.store(false, Ordering::SeqCst);
        self.state.rows.lock().unwrap().clear();
        self.state.next_key.store(0, Ordering::SeqCst);
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.state.ensures.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_ensure.load(Ordering::SeqCst) {
            return Err(injected("create table"));
        }
        self.state.schema_present.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn connect(&self, worker: WorkerId) -> Result<MockWriter, StoreError> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        {
            let mut writers = self.state.writers.lock().unwrap();
            let live = writers.entry(worker).or_default();
            assert_eq!(*live, 0, "worker {worker} already holds a connection");
            *live += 1;
        }
        Ok(MockWriter {
            worker,
            writes: 0,
            state: self.state.clone(),
        })
    }
}

pub struct MockWriter {
    worker: WorkerId,
    writes: u64,
    state: Arc<MockStoreState>,
}

impl MockWriter {
    fn delay(&self) -> Option<Duration> {
        let latency = self.state.latency.lock().unwrap();
        let normal = latency.as_ref()?;
        let secs: f64 = normal.sample(&mut rand::thread_rng()).max(0.);
        Some(Duration::from_secs_f64(secs))
    }

    fn gate(&self) -> Option<Arc<Gate>> {
        self.state.gate.lock().unwrap().clone()
    }
}

impl Drop for MockWriter {
    fn drop(&mut self) {
        if let Ok(mut writers) = self.state.writers.lock() {
            if let Some(live) = writers.get_mut(&self.worker) {
                *live -= 1;
            }
        }
    }
}

impl StoreWriter for MockWriter {
    async fn insert_row(&mut self, worker: WorkerId, value: i64) -> Result<i64, StoreError> {
        self.state.inserts.fetch_add(1, Ordering::SeqCst);
        assert_eq!(worker, self.worker, "writer used by another worker");

        if let Some(delay) = self.delay() {
            tokio::time::sleep(delay).await;
        }

        if self.state.panicking_workers.lock().unwrap().contains(&worker) {
            panic!("injected panic in worker {worker}");
        }

        if self.state.failing_workers.lock().unwrap().contains(&worker) {
            return Err(injected("insert"));
        }

        let key = self.state.next_key.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.rows.lock().unwrap().push(Row { worker, value, key });
        self.writes += 1;
        debug!("worker={worker} value={value} key={key}");

        if let Some(gate) = self.gate() {
            if self.writes == gate.writes_per_worker {
                if gate.barrier.wait().await.is_leader() {
                    gate.signal.trigger();
                }
            }
        }

        Ok(key)
    }
}
