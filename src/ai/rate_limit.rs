// src/ai/rate_limit.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::{sync::Mutex, time::Instant};

use super::clock::Clock;

/// Enforces a minimum spacing between consecutive outbound AI calls of the
/// whole process. Callers wait instead of failing; concurrent callers queue
/// on the mutex and are released one interval apart.
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
            clock,
        }
    }

    /// Waits until the interval since the previous call has elapsed, then
    /// records the current instant as the last call.
    pub async fn acquire(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(previous) = *last {
            let elapsed = self.clock.now().saturating_duration_since(previous);
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                tracing::debug!(wait_ms = wait.as_millis() as u64, "AI rate limit: waiting");
                self.clock.sleep(wait).await;
            }
        }
        *last = Some(self.clock.now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::clock::{TokioClock, tests::ManualClock};

    #[tokio::test]
    async fn test_first_call_does_not_wait() {
        let clock = Arc::new(ManualClock::new());
        let limiter = RateLimiter::new(Duration::from_secs(1), clock.clone());
        limiter.acquire().await;
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_back_to_back_calls_wait_for_interval() {
        let clock = Arc::new(ManualClock::new());
        let limiter = RateLimiter::new(Duration::from_secs(1), clock.clone());

        limiter.acquire().await;
        clock.advance(Duration::from_millis(300));
        limiter.acquire().await;

        assert_eq!(clock.sleeps(), vec![Duration::from_millis(700)]);
    }

    #[tokio::test]
    async fn test_no_wait_after_interval_elapsed() {
        let clock = Arc::new(ManualClock::new());
        let limiter = RateLimiter::new(Duration::from_secs(1), clock.clone());

        limiter.acquire().await;
        clock.advance(Duration::from_millis(1500));
        limiter.acquire().await;

        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_serialize() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_secs(1), Arc::new(TokioClock)));
        let start = Instant::now();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    limiter.acquire().await;
                    Instant::now()
                })
            })
            .collect();

        let mut finished = Vec::new();
        for handle in handles {
            finished.push(handle.await.unwrap());
        }
        finished.sort();

        assert!(finished[0] - start < Duration::from_secs(1));
        assert!(finished[1] - finished[0] >= Duration::from_secs(1));
        assert!(finished[2] - finished[1] >= Duration::from_secs(1));
    }
}
