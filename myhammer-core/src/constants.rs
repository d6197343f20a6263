use std::time::Duration;

/// Sentinel reported as the max key when no write succeeded.
pub const NO_KEY: i64 = -1;

/// The default number of concurrent writers for `run`
pub const DEFAULT_WORKERS: usize = 20;

/// The default pause between two consecutive worker spawns
pub const DEFAULT_STAGGER: Duration = Duration::from_millis(100);

/// Capacity of the channel carrying generated keys to the aggregator.
pub const RESULT_CHANNEL_CAPACITY: usize = 256;
