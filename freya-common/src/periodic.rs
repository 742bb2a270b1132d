//! Cancellable periodic task
//!
//! Runs an async tick at a fixed period until cancelled. The first tick
//! fires one period after spawning. Ticks never overlap: a slow tick delays
//! the next one. Cancelling drops an in-flight tick at its next await point.
//!
//! Dropping the handle cancels the task, so a task never outlives its owner.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Start/stop handle for a recurring async operation
pub struct PeriodicTask {
    name: &'static str,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    /// Spawn `tick` every `period` on the current Tokio runtime
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => {}
                }

                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = tick() => {}
                }
            }

            debug!(task = name, "Periodic task stopped");
        });

        debug!(task = name, period_ms = period.as_millis() as u64, "Periodic task started");

        Self {
            name,
            token,
            handle: Some(handle),
        }
    }

    /// Request cancellation; no tick starts after this returns
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Cancel and wait for the task to finish
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_task(period: Duration) -> (PeriodicTask, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let ticks = count.clone();
        let task = PeriodicTask::spawn("counter", period, move || {
            let ticks = ticks.clone();
            async move {
                ticks.fetch_add(1, Ordering::SeqCst);
            }
        });
        (task, count)
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_one_period() {
        let (_task, count) = counting_task(Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_at_fixed_period() {
        let (_task, count) = counting_task(Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_further_ticks() {
        let (task, count) = counting_task(Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        task.cancel();
        assert!(task.is_cancelled());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_task() {
        let (task, count) = counting_task(Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        drop(task);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_tick_delays_the_next_one() {
        let started = Arc::new(AtomicUsize::new(0));
        let running = Arc::new(AtomicUsize::new(0));
        let max_running = Arc::new(AtomicUsize::new(0));

        let (s, r, m) = (started.clone(), running.clone(), max_running.clone());
        let _task = PeriodicTask::spawn("slow", Duration::from_secs(1), move || {
            let (s, r, m) = (s.clone(), r.clone(), m.clone());
            async move {
                s.fetch_add(1, Ordering::SeqCst);
                let now_running = r.fetch_add(1, Ordering::SeqCst) + 1;
                m.fetch_max(now_running, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2500)).await;
                r.fetch_sub(1, Ordering::SeqCst);
            }
        });

        // Ticks start at 1.0 s, 3.5 s and 6.0 s: each waits for the previous one
        tokio::time::sleep(Duration::from_secs(7)).await;
        assert_eq!(started.load(Ordering::SeqCst), 3);
        assert_eq!(max_running.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_waits_for_completion() {
        let (task, count) = counting_task(Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(350)).await;
        task.stop().await;
        let after_stop = count.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), after_stop);
    }
}
