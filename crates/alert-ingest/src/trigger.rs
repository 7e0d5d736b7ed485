use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::Notify;

/// Single-flight pass trigger.
///
/// `request` never blocks and never queues more than one pending pass: any
/// number of requests made while a pass is running collapse into exactly one
/// follow-up.
#[derive(Clone, Debug, Default)]
pub struct PassTrigger {
    notify: Arc<Notify>,
    requests: Arc<AtomicU64>,
}

impl PassTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.notify.notify_one();
    }

    /// Resolves once at least one request is pending, consuming it.
    pub async fn requested(&self) {
        self.notify.notified().await;
    }

    /// Total number of requests made, coalesced or not.
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn requests_coalesce_into_one_pending_pass() {
        let trigger = PassTrigger::new();
        trigger.request();
        trigger.request();
        trigger.request();

        tokio::time::timeout(Duration::from_millis(100), trigger.requested())
            .await
            .expect("first pending pass");
        assert!(
            tokio::time::timeout(Duration::from_millis(20), trigger.requested())
                .await
                .is_err(),
            "requests must not stack"
        );
        assert_eq!(trigger.request_count(), 3);
    }

    #[tokio::test]
    async fn waiting_pass_is_woken() {
        let trigger = PassTrigger::new();
        let waiter = {
            let trigger = trigger.clone();
            tokio::spawn(async move { trigger.requested().await })
        };
        tokio::task::yield_now().await;
        trigger.request();
        tokio::time::timeout(Duration::from_millis(200), waiter)
            .await
            .expect("waiter woken")
            .expect("task");
    }
}
