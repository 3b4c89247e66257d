//! Sliding-window admission control for quota-constrained services
//!
//! `SlidingWindow` is the bookkeeping: admission timestamps that expire after
//! `1000 / decrement_rate` ms. `RateLimiter` wraps it for concurrent callers:
//! waiters queue FIFO and sleep until the oldest admission ages out, so there
//! is no polling interval.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::models::errors::{AppError, AppResult};

/// Ordered admission timestamps within one window
#[derive(Debug)]
pub struct SlidingWindow {
    window: Duration,
    entries: VecDeque<Instant>,
}

impl SlidingWindow {
    /// `decrement_rate` is admissions expiring per second; must be positive
    pub fn new(decrement_rate: f64) -> AppResult<Self> {
        if !decrement_rate.is_finite() || decrement_rate <= 0.0 {
            return Err(AppError::invalid_config(
                "decrement_rate",
                &decrement_rate.to_string(),
            ));
        }
        Ok(Self {
            window: Duration::from_secs_f64(1.0 / decrement_rate),
            entries: VecDeque::new(),
        })
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn record(&mut self, n: usize) {
        self.record_at(Instant::now(), n);
    }

    pub fn record_at(&mut self, now: Instant, n: usize) {
        // Keep the deque sorted even if a caller hands us an older instant
        let at = self.entries.back().map_or(now, |last| now.max(*last));
        self.entries.extend(std::iter::repeat(at).take(n));
    }

    pub fn count(&mut self) -> usize {
        self.count_at(Instant::now())
    }

    /// Drop entries whose age has reached the window, return what is left
    pub fn count_at(&mut self, now: Instant) -> usize {
        while let Some(oldest) = self.entries.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                self.entries.pop_front();
            } else {
                break;
            }
        }
        self.entries.len()
    }

    /// When the oldest live admission expires
    pub fn next_expiry(&self) -> Option<Instant> {
        self.entries.front().map(|oldest| *oldest + self.window)
    }
}

/// Shared, injectable limiter. One instance per process, cloned via `Arc`.
#[derive(Debug)]
pub struct RateLimiter {
    window: Mutex<SlidingWindow>,
    threshold: usize,
    // Fair mutex: waiters are admitted in arrival order
    queue: tokio::sync::Mutex<()>,
}

impl RateLimiter {
    pub fn new(decrement_rate: f64, threshold: usize) -> AppResult<Self> {
        if threshold == 0 {
            return Err(AppError::invalid_config("threshold", "0"));
        }
        Ok(Self {
            window: Mutex::new(SlidingWindow::new(decrement_rate)?),
            threshold,
            queue: tokio::sync::Mutex::new(()),
        })
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Live admissions in the window
    pub fn count(&self) -> usize {
        self.lock_window().count()
    }

    /// Record admissions that bypassed `acquire`
    pub fn record(&self, n: usize) {
        self.lock_window().record(n);
    }

    /// Wait for capacity, then record one admission
    pub async fn acquire(&self) {
        let _turn = self.queue.lock().await;
        loop {
            let wake_at = {
                let mut window = self.lock_window();
                let now = Instant::now();
                if window.count_at(now) < self.threshold {
                    window.record_at(now, 1);
                    return;
                }
                window.next_expiry()
            };
            match wake_at {
                Some(at) => {
                    debug!("⏳ Oracle quota full, waiting {:?}", at.saturating_duration_since(Instant::now()));
                    tokio::time::sleep_until(at).await;
                }
                // Unreachable while threshold > 0, but never spin
                None => tokio::task::yield_now().await,
            }
        }
    }

    fn lock_window(&self) -> std::sync::MutexGuard<'_, SlidingWindow> {
        // A panic while holding the guard cannot leave the deque inconsistent
        match self.window.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_rejects_non_positive_rate() {
        assert!(SlidingWindow::new(0.0).is_err());
        assert!(SlidingWindow::new(-1.0).is_err());
        assert!(SlidingWindow::new(f64::NAN).is_err());
        assert!(SlidingWindow::new(0.5).is_ok());
        assert!(RateLimiter::new(0.0, 30).is_err());
        assert!(RateLimiter::new(0.5, 0).is_err());
    }

    #[test]
    fn test_window_length() {
        let w = SlidingWindow::new(0.5).unwrap();
        assert_eq!(w.window(), Duration::from_secs(2));
        let w = SlidingWindow::new(4.0).unwrap();
        assert_eq!(w.window(), Duration::from_millis(250));
    }

    #[test]
    fn test_count_prunes_by_age() {
        let mut w = SlidingWindow::new(1.0).unwrap();
        let t0 = Instant::now();
        w.record_at(t0, 2);
        w.record_at(t0 + Duration::from_millis(400), 3);
        w.record_at(t0 + Duration::from_millis(900), 1);

        assert_eq!(w.count_at(t0 + Duration::from_millis(999)), 6);
        // Age exactly equal to the window is expired
        assert_eq!(w.count_at(t0 + Duration::from_millis(1000)), 4);
        assert_eq!(w.count_at(t0 + Duration::from_millis(1401)), 1);
        assert_eq!(w.count_at(t0 + Duration::from_millis(1900)), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_admits_under_threshold() {
        let limiter = RateLimiter::new(1.0, 3).unwrap();
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(limiter.count(), 3);
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_waits_for_oldest_expiry() {
        let limiter = RateLimiter::new(1.0, 2).unwrap();
        let start = Instant::now();
        limiter.acquire().await;
        tokio::time::advance(Duration::from_millis(300)).await;
        limiter.acquire().await;

        limiter.acquire().await;
        // Woken exactly when the first admission aged out
        assert_eq!(Instant::now() - start, Duration::from_secs(1));
        assert_eq!(limiter.count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_waiters_never_exceed_threshold() {
        let limiter = Arc::new(RateLimiter::new(2.0, 2).unwrap());
        let start = Instant::now();
        let handles: Vec<_> = (0..6)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    limiter.acquire().await;
                    let live = limiter.count();
                    (Instant::now() - start, live)
                })
            })
            .collect();

        let mut results = Vec::new();
        for h in handles {
            results.push(h.await.unwrap());
        }
        assert!(results.iter().all(|(_, live)| *live <= 2));
        let latest = results.iter().map(|(t, _)| *t).max().unwrap();
        // Six admissions at two per 500ms window
        assert_eq!(latest, Duration::from_millis(1000));
    }
}
