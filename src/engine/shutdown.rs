// src/engine/shutdown.rs

//! Two-step interrupt escalation.
//!
//! The first request cancels the shared token so the watch loop can stop
//! its child gracefully. The second request wakes [`ShutdownSignal::forced`]
//! so the binary can exit without waiting for the loop.

use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ShutdownState {
    NotRequested,
    GracefulRequested,
    Forced,
}

impl ShutdownState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => ShutdownState::NotRequested,
            1 => ShutdownState::GracefulRequested,
            _ => ShutdownState::Forced,
        }
    }
}

#[derive(Debug, Default)]
pub struct ShutdownSignal {
    state: AtomicU8,
    token: CancellationToken,
    forced: Notify,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token cancelled by the first request.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn state(&self) -> ShutdownState {
        ShutdownState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Advance the escalation by one step and return the new state.
    ///
    /// Further requests after `Forced` keep it `Forced`.
    pub fn request(&self) -> ShutdownState {
        let previous = self
            .state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |s| Some((s + 1).min(2)))
            .unwrap_or(2);

        let next = ShutdownState::from_u8((previous + 1).min(2));
        match next {
            ShutdownState::GracefulRequested => {
                debug!("graceful shutdown requested");
                self.token.cancel();
            }
            ShutdownState::Forced => {
                warn!("forced shutdown requested");
                self.token.cancel();
                self.forced.notify_waiters();
                // A waiter registering after this call still sees the permit.
                self.forced.notify_one();
            }
            ShutdownState::NotRequested => {}
        }
        next
    }

    /// Resolves once shutdown has been forced.
    pub async fn forced(&self) {
        loop {
            let notified = self.forced.notified();
            if self.state() == ShutdownState::Forced {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn escalates_in_order_and_saturates() {
        let signal = ShutdownSignal::new();
        assert_eq!(signal.state(), ShutdownState::NotRequested);
        assert!(!signal.token().is_cancelled());

        assert_eq!(signal.request(), ShutdownState::GracefulRequested);
        assert!(signal.token().is_cancelled());

        assert_eq!(signal.request(), ShutdownState::Forced);
        assert_eq!(signal.request(), ShutdownState::Forced);
        assert_eq!(signal.state(), ShutdownState::Forced);
    }

    #[tokio::test]
    async fn forced_wakes_after_second_request() {
        let signal = Arc::new(ShutdownSignal::new());

        let waiter = {
            let signal = Arc::clone(&signal);
            tokio::spawn(async move { signal.forced().await })
        };

        signal.request();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        signal.request();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("forced() did not resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn forced_returns_immediately_when_already_forced() {
        let signal = ShutdownSignal::new();
        signal.request();
        signal.request();
        tokio::time::timeout(Duration::from_millis(100), signal.forced())
            .await
            .expect("forced() should not block");
    }
}
