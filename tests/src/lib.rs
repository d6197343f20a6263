//! Shared helpers for the cross-crate tests.
use myhammer::prelude::*;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

/// Install a global subscriber once per test binary and make panics in spawned workers loud.
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        let _ = FmtSubscriber::builder()
            .with_env_filter("myhammer=debug,mock_store=info")
            .try_init();
    });
}

/// Trigger `signal` after `delay`, the way an operator's Ctrl+C would.
pub fn interrupt_after(signal: CancelSignal, delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        info!("Simulated interrupt");
        signal.trigger();
    })
}

/// Connection settings for the live database tests, taken from `MYHAMMER_*` variables.
pub fn live_connection() -> ConnectionConfig {
    let mut config = ConnectionConfig::default();
    if let Ok(host) = std::env::var("MYHAMMER_HOST") {
        config.host = host;
    }
    if let Some(port) = std::env::var("MYHAMMER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
    {
        config.port = port;
    }
    if let Ok(user) = std::env::var("MYHAMMER_USER") {
        config.user = user;
    }
    if let Ok(password) = std::env::var("MYHAMMER_PASSWORD") {
        config.password = password;
    }
    config
}
