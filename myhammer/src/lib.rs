#![doc = include_str!("../README.md")]

mod aggregator;
pub mod error;
pub mod hammer;
pub mod mysql;
pub mod signal;
pub mod store;
mod writer;

#[cfg(test)]
mod testing;

pub use error::{HammerError, StoreError};
pub use hammer::Hammer;
pub use myhammer_core::{
    FailurePolicy, HammerConfig, RunStatistics, WorkerExit, WorkerId, WorkerStatistics,
    DEFAULT_STAGGER, DEFAULT_WORKERS, NO_KEY,
};
pub use signal::CancelSignal;

pub mod prelude {
    pub use crate::error::{HammerError, StoreError};
    pub use crate::hammer::{worker_count, Hammer};
    pub use crate::mysql::{ConnectionConfig, MySqlStore};
    pub use crate::signal::{listen_for_interrupt, CancelSignal};
    pub use crate::store::{Store, StoreWriter};

    pub use myhammer_core::{
        FailurePolicy, HammerConfig, RunStatistics, WorkerExit, WorkerId, WorkerStatistics,
        NO_KEY,
    };
}
