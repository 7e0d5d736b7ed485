//! Feed staleness tracking.
//!
//! A pass beats the monitor only when its incident fetch succeeded. The poll
//! loop never stops on staleness; the flag is purely informational.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use tokio::{sync::watch, task::JoinHandle};
use tracing::{info, warn};

use crate::dashboard::data::Publisher;

pub(crate) struct FeedHealth {
    origin: Instant,
    /// Milliseconds since `origin` of the last successful incident fetch.
    last_success: AtomicU64,
    stale_after: Duration,
    stale: AtomicBool,
}

impl FeedHealth {
    /// The clock starts at construction, giving startup one full grace period.
    pub(crate) fn new(stale_after: Duration) -> Self {
        Self {
            origin: Instant::now(),
            last_success: AtomicU64::new(0),
            stale_after,
            stale: AtomicBool::new(false),
        }
    }

    pub(crate) fn beat(&self) {
        self.beat_at(Instant::now());
    }

    pub(crate) fn beat_at(&self, now: Instant) {
        self.last_success.store(self.offset(now), Ordering::Relaxed);
    }

    pub(crate) fn is_stale(&self) -> bool {
        self.is_stale_at(Instant::now())
    }

    pub(crate) fn is_stale_at(&self, now: Instant) -> bool {
        let silent_for = self
            .offset(now)
            .saturating_sub(self.last_success.load(Ordering::Relaxed));
        silent_for > self.stale_after.as_millis() as u64
    }

    pub(crate) fn stale_after(&self) -> Duration {
        self.stale_after
    }

    /// Record the current verdict, returning `Some(stale)` when it flipped.
    fn observe(&self, now: Instant) -> Option<bool> {
        let stale = self.is_stale_at(now);
        let previous = self.stale.swap(stale, Ordering::Relaxed);
        (previous != stale).then_some(stale)
    }

    fn offset(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.origin).as_millis() as u64
    }
}

/// Periodically re-evaluate staleness and publish transitions.
pub(crate) fn spawn_health_monitor(
    health: Arc<FeedHealth>,
    publisher: Arc<Publisher>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let period = (health.stale_after() / 4).max(Duration::from_millis(100));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }
            let Some(stale) = health.observe(Instant::now()) else {
                continue;
            };
            if stale {
                warn!(
                    stale_after = %humantime::format_duration(health.stale_after()),
                    "alert feed is stale; still polling"
                );
            } else {
                info!("alert feed recovered");
            }
            metrics::gauge!("dashboard_feed_stale").set(if stale { 1.0 } else { 0.0 });
            publisher.mark_stale(stale);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_monitor_gets_a_grace_period() {
        let health = FeedHealth::new(Duration::from_secs(30));
        let start = health.origin;
        assert!(!health.is_stale_at(start + Duration::from_secs(29)));
        assert!(health.is_stale_at(start + Duration::from_secs(31)));
    }

    #[test]
    fn beat_resets_the_clock() {
        let health = FeedHealth::new(Duration::from_secs(10));
        let start = health.origin;
        health.beat_at(start + Duration::from_secs(25));
        assert!(!health.is_stale_at(start + Duration::from_secs(30)));
        assert!(health.is_stale_at(start + Duration::from_secs(36)));
    }

    #[test]
    fn observe_reports_transitions_once() {
        let health = FeedHealth::new(Duration::from_secs(1));
        let start = health.origin;
        assert_eq!(health.observe(start), None);
        assert_eq!(health.observe(start + Duration::from_secs(2)), Some(true));
        assert_eq!(health.observe(start + Duration::from_secs(3)), None);
        health.beat_at(start + Duration::from_secs(3));
        assert_eq!(health.observe(start + Duration::from_secs(3)), Some(false));
    }
}
