//! Sliding-window rate limiter
//!
//! Bounds outbound API calls to a fixed quota per rolling time window. The
//! window is a FIFO of recent call timestamps; a call that would exceed the
//! quota sleeps until the oldest timestamp ages out. Callers serialize through
//! an internal async mutex, so the quota holds regardless of how many tasks
//! share the limiter.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Rate limiter enforcing at most `max_calls` calls per trailing `period`
pub struct RateLimiter {
    max_calls: usize,
    period: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Creates a new rate limiter
    ///
    /// # Arguments
    ///
    /// * `max_calls` - Maximum number of calls allowed within the window
    /// * `period` - Length of the rolling window
    pub fn new(max_calls: u32, period: Duration) -> Self {
        Self {
            max_calls: max_calls as usize,
            period,
            calls: Mutex::new(VecDeque::new()),
        }
    }

    /// Blocks until issuing another call stays within the quota
    ///
    /// Returns immediately when the trailing window holds fewer than
    /// `max_calls` timestamps; otherwise sleeps until the oldest call expires.
    /// The lock is held across the sleep so concurrent callers queue up in
    /// FIFO order. Starvation is impossible: every recorded call eventually
    /// ages out of the window.
    pub async fn wait_if_needed(&self) {
        let mut calls = self.calls.lock().await;

        let now = Instant::now();
        Self::purge_expired(&mut calls, now, self.period);

        if calls.len() >= self.max_calls {
            if let Some(&oldest) = calls.front() {
                tokio::time::sleep_until(oldest + self.period).await;
                let now = Instant::now();
                Self::purge_expired(&mut calls, now, self.period);
            }
        }

        calls.push_back(Instant::now());
    }

    /// Drops timestamps older than `now - period`
    fn purge_expired(calls: &mut VecDeque<Instant>, now: Instant, period: Duration) {
        while calls
            .front()
            .is_some_and(|&t| now.duration_since(t) >= period)
        {
            calls.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_under_quota_returns_immediately() {
        let limiter = RateLimiter::new(5, Duration::from_secs(1));
        let start = Instant::now();

        for _ in 0..5 {
            limiter.wait_if_needed().await;
        }

        // All five calls fit the window, so no virtual time passed
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocks_at_quota() {
        let limiter = RateLimiter::new(2, Duration::from_secs(1));
        let start = Instant::now();

        limiter.wait_if_needed().await;
        limiter.wait_if_needed().await;
        // Third call must wait for the first to age out
        limiter.wait_if_needed().await;

        assert!(Instant::now() >= start + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_property() {
        // For any window of the configured length, at most max_calls
        // timestamps fall inside it.
        let max_calls = 3;
        let period = Duration::from_millis(100);
        let limiter = RateLimiter::new(max_calls, period);

        let mut stamps = Vec::new();
        for _ in 0..10 {
            limiter.wait_if_needed().await;
            stamps.push(Instant::now());
        }

        for (i, &window_start) in stamps.iter().enumerate() {
            let inside = stamps[i..]
                .iter()
                .filter(|&&t| t.duration_since(window_start) < period)
                .count();
            assert!(
                inside <= max_calls as usize,
                "window starting at call {} holds {} calls",
                i,
                inside
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_refreshes_after_window() {
        let limiter = RateLimiter::new(2, Duration::from_secs(1));

        limiter.wait_if_needed().await;
        limiter.wait_if_needed().await;

        tokio::time::sleep(Duration::from_secs(2)).await;

        // Window has fully expired; two more calls go through immediately
        let start = Instant::now();
        limiter.wait_if_needed().await;
        limiter.wait_if_needed().await;
        assert_eq!(Instant::now(), start);
    }
}
