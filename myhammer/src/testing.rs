use crate::error::StoreError;
use crate::signal::CancelSignal;
use crate::store::{Store, StoreWriter};
use myhammer_core::WorkerId;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub(crate) struct FakeState {
    next_key: AtomicI64,
    resets: AtomicUsize,
    ensures: AtomicUsize,
    connects: AtomicUsize,
    fail_connects: AtomicUsize,
    fail_inserts: AtomicUsize,
    fail_reset: AtomicBool,
    fail_ensure: AtomicBool,
    cancel_after: Mutex<Option<(i64, CancelSignal)>>,
    rows: Mutex<Vec<(WorkerId, i64, i64)>>,
}

impl FakeState {
    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    pub fn ensures(&self) -> usize {
        self.ensures.load(Ordering::SeqCst)
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn values(&self, worker: WorkerId) -> Vec<i64> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(w, _, _)| *w == worker)
            .map(|(_, value, _)| *value)
            .collect()
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

fn injected(what: &str) -> sqlx::Error {
    sqlx::Error::Protocol(format!("injected {what} failure"))
}

/// In-process store handing out sequential keys, with a few failure knobs.
#[derive(Default)]
pub(crate) struct FakeStore {
    state: Arc<FakeState>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_first_inserts(self, n: usize) -> Self {
        self.state.fail_inserts.store(n, Ordering::SeqCst);
        self
    }

    pub fn fail_first_connects(self, n: usize) -> Self {
        self.state.fail_connects.store(n, Ordering::SeqCst);
        self
    }

    pub fn fail_reset(self) -> Self {
        self.state.fail_reset.store(true, Ordering::SeqCst);
        self
    }

    pub fn fail_ensure(self) -> Self {
        self.state.fail_ensure.store(true, Ordering::SeqCst);
        self
    }

    /// Trigger `signal` as soon as the `n`th key has been handed out.
    pub fn cancel_after(self, n: i64, signal: CancelSignal) -> Self {
        *self.state.cancel_after.lock().unwrap() = Some((n, signal));
        self
    }

    pub fn state(&self) -> Arc<FakeState> {
        self.state.clone()
    }
}

impl Store for FakeStore {
    type Writer = FakeWriter;

    async fn reset_schema(&self) -> Result<(), StoreError> {
        self.state.resets.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_reset.load(Ordering::SeqCst) {
            return Err(StoreError::statement("drop", injected("reset")));
        }
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.state.ensures.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_ensure.load(Ordering::SeqCst) {
            return Err(StoreError::statement("create", injected("ensure")));
        }
        Ok(())
    }

    async fn connect(&self, _worker: WorkerId) -> Result<FakeWriter, StoreError> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        if FakeState::take_failure(&self.state.fail_connects) {
            return Err(StoreError::Connect(injected("connect")));
        }
        Ok(FakeWriter {
            state: self.state.clone(),
        })
    }
}

pub(crate) struct FakeWriter {
    state: Arc<FakeState>,
}

impl StoreWriter for FakeWriter {
    async fn insert_row(&mut self, worker: WorkerId, value: i64) -> Result<i64, StoreError> {
        if FakeState::take_failure(&self.state.fail_inserts) {
            return Err(StoreError::statement("insert", injected("insert")));
        }

        let key = self.state.next_key.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.rows.lock().unwrap().push((worker, value, key));

        if let Some((limit, signal)) = &*self.state.cancel_after.lock().unwrap() {
            if key >= *limit {
                signal.trigger();
            }
        }
        Ok(key)
    }
}
