//! Trailing-edge debouncing of change notifications.
//!
//! The debouncer holds a single logical timer. Every `notify` replaces the
//! pending payload and pushes the deadline out by the configured delay, so a
//! burst of notifications collapses into one fire carrying the last payload.
//!
//! It never spawns tasks: the owner awaits `fired()` (or polls
//! `deadline()`/`poll_fire()` from its own `select!` loop), which keeps all
//! state on the owner's task and makes cancellation exact.

use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Default quiet period before a fire
pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug)]
struct PendingFire<T> {
    payload: T,
    deadline: Instant,
}

/// Collapses bursts of notifications into at most one fire per quiet period
#[derive(Debug)]
pub struct ChangeDebouncer<T> {
    delay: Duration,
    pending: Option<PendingFire<T>>,
    last_fire: Option<Instant>,
}

impl<T> ChangeDebouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            last_fire: None,
        }
    }

    /// Schedule a fire `delay` from now, replacing any pending payload
    pub fn notify(&mut self, payload: T) {
        self.notify_at(payload, Instant::now());
    }

    /// Schedule a fire `delay` from `now`, replacing any pending payload
    pub fn notify_at(&mut self, payload: T, now: Instant) {
        if self.pending.is_some() {
            trace!("Collapsing pending change into newer notification");
        }
        self.pending = Some(PendingFire {
            payload,
            deadline: now + self.delay,
        });
    }

    /// Drop the pending fire, if any. Returns whether something was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Take the payload if its deadline has passed
    pub fn poll_fire(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some(pending) if pending.deadline <= now => {
                self.last_fire = Some(now);
                self.pending.take().map(|p| p.payload)
            }
            _ => None,
        }
    }

    /// Wait for the next fire
    ///
    /// Stays pending forever while nothing is scheduled, so it can sit in a
    /// `select!` arm next to the source of notifications.
    pub async fn fired(&mut self) -> T {
        loop {
            match self.deadline() {
                Some(deadline) => {
                    tokio::time::sleep_until(deadline).await;
                    if let Some(payload) = self.poll_fire(Instant::now()) {
                        return payload;
                    }
                }
                None => std::future::pending::<()>().await,
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending payload will fire
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// When the last fire happened
    pub fn last_fire(&self) -> Option<Instant> {
        self.last_fire
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<T> Default for ChangeDebouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, timeout};

    #[tokio::test(start_paused = true)]
    async fn test_single_notify_fires_after_delay() {
        let mut debouncer = ChangeDebouncer::new(Duration::from_millis(500));
        let start = Instant::now();
        debouncer.notify("only");

        assert_eq!(debouncer.fired().await, "only");
        let elapsed = Instant::now() - start;
        assert!(elapsed >= Duration::from_millis(500) && elapsed <= Duration::from_millis(501));
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.last_fire(), Some(Instant::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_last_payload() {
        let mut debouncer = ChangeDebouncer::new(Duration::from_millis(500));

        let mut last_notify = Instant::now();
        for i in 0..50 {
            last_notify = Instant::now();
            debouncer.notify(i);
            sleep(Duration::from_millis(10)).await;
            // Nothing may fire mid-burst
            assert!(debouncer.poll_fire(Instant::now()).is_none());
        }

        assert_eq!(debouncer.fired().await, 49);
        let elapsed = Instant::now() - last_notify;
        assert!(elapsed >= Duration::from_millis(500) && elapsed <= Duration::from_millis(501));

        // Exactly one fire: nothing else is scheduled
        assert!(timeout(Duration::from_secs(5), debouncer.fired()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_fire() {
        let mut debouncer = ChangeDebouncer::new(Duration::from_millis(100));
        debouncer.notify(1);
        assert!(debouncer.cancel());

        assert!(timeout(Duration::from_secs(1), debouncer.fired()).await.is_err());
        assert!(debouncer.last_fire().is_none());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut debouncer: ChangeDebouncer<u32> = ChangeDebouncer::default();
        assert!(!debouncer.cancel());
        debouncer.notify_at(7, Instant::now());
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_poll_fire_respects_deadline() {
        let mut debouncer = ChangeDebouncer::new(Duration::from_millis(500));
        let now = Instant::now();
        debouncer.notify_at("a", now);

        assert_eq!(debouncer.deadline(), Some(now + Duration::from_millis(500)));
        assert_eq!(debouncer.poll_fire(now + Duration::from_millis(499)), None);
        assert_eq!(debouncer.poll_fire(now + Duration::from_millis(500)), Some("a"));
        assert_eq!(debouncer.poll_fire(now + Duration::from_secs(10)), None);
    }

    #[test]
    fn test_notify_pushes_deadline_out() {
        let mut debouncer = ChangeDebouncer::new(Duration::from_millis(500));
        let now = Instant::now();
        debouncer.notify_at("first", now);
        debouncer.notify_at("second", now + Duration::from_millis(300));

        assert_eq!(debouncer.poll_fire(now + Duration::from_millis(500)), None);
        assert_eq!(
            debouncer.poll_fire(now + Duration::from_millis(800)),
            Some("second")
        );
    }

    #[test]
    fn test_default_delay() {
        let debouncer: ChangeDebouncer<()> = ChangeDebouncer::default();
        assert_eq!(debouncer.delay(), Duration::from_millis(500));
    }
}
