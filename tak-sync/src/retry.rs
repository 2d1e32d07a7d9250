//! Cancellable single-shot reconnect timer.

use std::pin::Pin;
use std::time::Duration;

use tokio::time::{self, Sleep};

/// At most one pending deadline. Built on `tokio::time`, so a paused test
/// clock drives it.
#[derive(Debug, Default)]
pub struct RetryTimer {
    sleep: Option<Pin<Box<Sleep>>>,
}

impl RetryTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer, replacing any pending deadline.
    pub fn schedule(&mut self, delay: Duration) {
        self.sleep = Some(Box::pin(time::sleep(delay)));
    }

    pub fn cancel(&mut self) {
        self.sleep = None;
    }

    pub fn is_pending(&self) -> bool {
        self.sleep.is_some()
    }

    /// Resolves when the pending deadline passes and disarms the timer.
    /// Never resolves while nothing is scheduled.
    pub async fn elapsed(&mut self) {
        match self.sleep.as_mut() {
            Some(sleep) => {
                sleep.as_mut().await;
                self.sleep = None;
            }
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let mut timer = RetryTimer::new();
        let start = Instant::now();
        timer.schedule(Duration::from_millis(500));
        assert!(timer.is_pending());

        timer.elapsed().await;
        assert_eq!(start.elapsed(), Duration::from_millis(500));
        assert!(!timer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let mut timer = RetryTimer::new();
        timer.schedule(Duration::from_millis(500));
        timer.cancel();

        let fired = time::timeout(Duration::from_secs(5), timer.elapsed()).await;
        assert!(fired.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_deadline() {
        let mut timer = RetryTimer::new();
        let start = Instant::now();
        timer.schedule(Duration::from_millis(500));
        timer.schedule(Duration::from_millis(2000));

        timer.elapsed().await;
        assert_eq!(start.elapsed(), Duration::from_millis(2000));
    }
}
