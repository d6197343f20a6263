use crate::NO_KEY;
use std::fmt;
use std::time::Duration;

/// Index of a writer, `0..workers`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerId(pub usize);

impl WorkerId {
    /// Value written to the `worker` column.
    pub fn as_i64(self) -> i64 {
        self.0 as i64
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal state of a writer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerExit {
    Cancelled,
    StoppedOnError,
    Panicked,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerStatistics {
    pub worker: WorkerId,
    pub writes: u64,
    pub failures: u64,
    pub exit: WorkerExit,
}

/// Final report of a run
///
/// Only ever built once every writer has terminated and every key they produced has been folded
/// into `max_key`.
#[derive(Clone, Debug)]
pub struct RunStatistics {
    pub max_key: i64,
    pub keys_observed: u64,
    pub elapsed: Duration,
    pub workers: Vec<WorkerStatistics>,
}

impl RunStatistics {
    pub fn total_writes(&self) -> u64 {
        self.workers.iter().map(|w| w.writes).sum()
    }

    pub fn total_failures(&self) -> u64 {
        self.workers.iter().map(|w| w.failures).sum()
    }

    pub fn has_key(&self) -> bool {
        self.max_key != NO_KEY
    }

    pub fn worker(&self, id: WorkerId) -> Option<&WorkerStatistics> {
        self.workers.iter().find(|w| w.worker == id)
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.elapsed.as_secs_f64();
        let tps = if secs > 0. {
            self.total_writes() as f64 / secs
        } else {
            0.
        };
        write!(
            f,
            "MaxKey={}, Writes={}, Errors={}, Workers={}, Elapsed={}, TPS={:.2}",
            self.max_key,
            self.total_writes(),
            self.total_failures(),
            self.workers.len(),
            humantime::format_duration(Duration::from_millis(self.elapsed.as_millis() as u64)),
            tps,
        )
    }
}
