//! One-shot cooperative cancellation
//!
//! A [`CancelSignal`] starts armed and is triggered at most once. Writers poll it between writes;
//! nothing in flight is ever interrupted.
use std::sync::atomic::{AtomicBool, Ordering};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
#[allow(unused)]
use tracing::{debug, error, info, instrument, warn};

/// Exit status used when a second interrupt arrives before the writers have drained.
pub const FORCED_EXIT_CODE: i32 = 130;

#[derive(Clone, Debug, Default)]
pub struct CancelSignal {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    triggered: AtomicBool,
    notify: Notify,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the signal to the triggered state.
    ///
    /// Returns `true` only for the call that performed the transition; every later call is a
    /// no-op returning `false`.
    pub fn trigger(&self) -> bool {
        let first = self
            .inner
            .triggered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();

        if first {
            self.inner.notify.notify_waiters();
        }
        first
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::Acquire)
    }

    /// Resolves once the signal has been triggered.
    pub async fn triggered(&self) {
        loop {
            // NOTE: `Notified` is registered on creation, so a trigger landing between the check
            // and the await still wakes us.
            let notified = self.inner.notify.notified();
            if self.is_triggered() {
                return;
            }
            notified.await;
        }
    }
}

/// Trigger `signal` on the first Ctrl+C (or SIGTERM on unix).
///
/// A second interrupt exits the process immediately with [`FORCED_EXIT_CODE`] instead of
/// signalling again.
#[instrument(name = "interrupt", skip_all)]
pub async fn listen_for_interrupt(signal: CancelSignal) {
    if let Err(err) = wait_for_interrupt().await {
        error!("Unable to listen for interrupts, the run cannot be stopped gracefully: {err}");
        return;
    }

    info!("Interrupt received. Stopping workers.");
    signal.trigger();

    if wait_for_interrupt().await.is_ok() {
        warn!("Second interrupt received. Exiting without waiting for workers.");
        std::process::exit(FORCED_EXIT_CODE);
    }
}

/// Background task that is aborted when the guard is dropped.
#[derive(Debug)]
pub(crate) struct ListenerGuard {
    handle: JoinHandle<()>,
}

impl ListenerGuard {
    pub(crate) fn spawn<F>(listener: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(listener),
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn wait_for_interrupt() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res,
            _ = terminate.recv() => {
                debug!("Received SIGTERM");
                Ok(())
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}
