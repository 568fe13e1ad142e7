//! Periodic refresh timer
//!
//! At most one timer task is alive at a time. Arming always aborts the
//! previous task first.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

#[derive(Default)]
pub struct RefreshScheduler {
    handle: Option<JoinHandle<()>>,
    period: Option<Duration>,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start calling `tick` every `period`, replacing any running timer
    ///
    /// The first tick fires one full period after arming. Must be called
    /// from within a tokio runtime.
    pub fn arm<F>(&mut self, period: Duration, tick: F)
    where
        F: Fn() + Send + 'static,
    {
        self.cancel();

        // tokio intervals panic on a zero period
        let period = period.max(Duration::from_secs(1));
        log::debug!("Arming refresh timer every {}s", period.as_secs());
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                log::trace!("Refresh timer fired");
                tick();
            }
        });

        self.handle = Some(handle);
        self.period = Some(period);
    }

    /// Stop the running timer, if any
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            log::trace!("Cancelled refresh timer");
        }
        self.period = None;
    }

    pub fn is_armed(&self) -> bool {
        self.handle.is_some()
    }

    /// Period of the running timer
    pub fn period(&self) -> Option<Duration> {
        self.period
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::sleep;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inc = {
            let count = Arc::clone(&count);
            move || {
                count.fetch_add(1, Ordering::SeqCst);
            }
        };
        (count, inc)
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_every_period() {
        let (count, inc) = counter();
        let mut scheduler = RefreshScheduler::new();
        scheduler.arm(Duration::from_secs(60), inc);

        sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        sleep(Duration::from_secs(120)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(scheduler.period(), Some(Duration::from_secs(60)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_cancels_previous_timer() {
        let (old_count, old_tick) = counter();
        let (new_count, new_tick) = counter();
        let mut scheduler = RefreshScheduler::new();

        scheduler.arm(Duration::from_secs(60), old_tick);
        sleep(Duration::from_secs(30)).await;
        scheduler.arm(Duration::from_secs(100), new_tick);

        // New timer fires at 130s and 230s; old one would have fired at 60s..240s
        sleep(Duration::from_secs(250)).await;
        assert_eq!(old_count.load(Ordering::SeqCst), 0);
        assert_eq!(new_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_rearm_leaves_single_timer() {
        let (count, _) = counter();
        let mut scheduler = RefreshScheduler::new();

        for _ in 0..10 {
            let count = Arc::clone(&count);
            scheduler.arm(Duration::from_secs(60), move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        sleep(Duration::from_secs(61)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticks() {
        let (count, inc) = counter();
        let mut scheduler = RefreshScheduler::new();
        scheduler.arm(Duration::from_secs(10), inc);
        assert!(scheduler.is_armed());

        scheduler.cancel();
        assert!(!scheduler.is_armed());
        assert_eq!(scheduler.period(), None);

        sleep(Duration::from_secs(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        // Cancelling twice is harmless
        scheduler.cancel();
    }
}
