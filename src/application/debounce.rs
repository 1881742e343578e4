//! Debounce scheduler for free-text search input
//!
//! At most one timer is pending. Re-scheduling cancels the previous timer;
//! once a timer has fired its action runs to completion regardless of later
//! scheduling (superseding that work is the request controller's job).

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::trace;

#[derive(Debug)]
pub struct DebounceScheduler {
    quiet_period: Duration,
    pending: Option<CancellationToken>,
}

impl DebounceScheduler {
    pub const fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: None,
        }
    }

    pub const fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Runs `action` after the quiet period unless superseded first
    pub fn schedule<F, Fut>(&mut self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let token = CancellationToken::new();
        self.pending = Some(token.clone());
        let quiet_period = self.quiet_period;

        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(quiet_period) => {}
                () = token.cancelled() => {
                    trace!("Debounce timer superseded");
                    return;
                }
            }
            // mark as no longer pending before handing off
            token.cancel();
            action().await;
        });
    }

    /// Cancels the pending timer; returns whether one was pending
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some_and(|token| {
            let was_pending = !token.is_cancelled();
            token.cancel();
            was_pending
        })
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|token| !token.is_cancelled())
    }
}
