//! The database seam
//!
//! A [`Store`] owns the schema and hands out one [`StoreWriter`] per worker. Writers are never
//! shared; every worker inserts through its own connection for the whole run.
use crate::error::StoreError;
use myhammer_core::WorkerId;

#[trait_variant::make(Store: Send)]
pub trait LocalStore: Sync {
    type Writer: StoreWriter + 'static;

    /// Drop everything the run created. Must succeed when nothing exists yet.
    async fn reset_schema(&self) -> Result<(), StoreError>;

    /// Create the database and table if they are missing.
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Open the dedicated connection for `worker`.
    async fn connect(&self, worker: WorkerId) -> Result<Self::Writer, StoreError>;
}

#[trait_variant::make(StoreWriter: Send)]
pub trait LocalStoreWriter {
    /// Insert one `(worker, value)` row and return the key the store generated for it.
    async fn insert_row(&mut self, worker: WorkerId, value: i64) -> Result<i64, StoreError>;
}
