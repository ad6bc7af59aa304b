//! Rolling-window crawl rate limiter for polite crawling
//!
//! Gates how fast the rest of the system may issue fetches. Two independent
//! constraints are enforced:
//! - a minimum delay between consecutive acquisitions
//! - a maximum number of acquisitions within a trailing interval
//!
//! All acquisitions are serialized through one async mutex, so suspensions
//! never overlap and the configured pacing holds exactly.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::config::RateLimitSettings;

/// Acquisition history, only touched while the limiter's lock is held
#[derive(Debug, Default)]
struct RateWindowState {
    /// Acquisition instants still inside the trailing interval, oldest first
    events: VecDeque<Instant>,
    last_acquire: Option<Instant>,
}

impl RateWindowState {
    /// Drop events that have left the window `(now - interval, now]`
    fn prune(&mut self, now: Instant, interval: Duration) {
        while let Some(oldest) = self.events.front() {
            if now.saturating_duration_since(*oldest) >= interval {
                self.events.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Process-wide fetch pacing
#[derive(Debug)]
pub struct RateLimiter {
    max_per_interval: Option<usize>,
    interval: Duration,
    min_delay: Duration,
    state: Mutex<RateWindowState>,
}

impl RateLimiter {
    /// Create a limiter
    ///
    /// # Arguments
    /// * `max_per_interval` - Maximum acquisitions inside any trailing `interval`; `None` disables the window
    /// * `interval` - Length of the rolling window
    /// * `min_delay` - Minimum spacing between acquisitions; zero disables it
    #[must_use]
    pub fn new(max_per_interval: Option<u32>, interval: Duration, min_delay: Duration) -> Self {
        Self {
            max_per_interval: max_per_interval
                .filter(|max| *max > 0)
                .map(|max| max as usize),
            interval,
            min_delay,
            state: Mutex::new(RateWindowState::default()),
        }
    }

    /// Create a limiter from configuration
    #[must_use]
    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self::new(
            settings.max_per_interval,
            settings.interval,
            settings.min_delay,
        )
    }

    /// A limiter that never suspends
    #[must_use]
    pub fn unlimited() -> Self {
        Self::new(None, Duration::ZERO, Duration::ZERO)
    }

    /// Whether any constraint is configured
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.max_per_interval.is_some() || !self.min_delay.is_zero()
    }

    /// Wait until both constraints allow another fetch, then record it
    ///
    /// Constraints are re-evaluated after every suspension because time has
    /// moved; the acquisition is recorded only once all of them pass.
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;

        let now = loop {
            let now = Instant::now();

            if !self.min_delay.is_zero()
                && let Some(last) = state.last_acquire
            {
                let elapsed = now.saturating_duration_since(last);
                if elapsed < self.min_delay {
                    let wait = self.min_delay - elapsed;
                    debug!("[RateLimiter] Sleeping {:.3}s for min delay", wait.as_secs_f64());
                    tokio::time::sleep(wait).await;
                    continue;
                }
            }

            if let Some(max) = self.max_per_interval {
                state.prune(now, self.interval);
                if state.events.len() >= max
                    && let Some(oldest) = state.events.front().copied()
                {
                    let wait = (oldest + self.interval).saturating_duration_since(now);
                    debug!("[RateLimiter] Window full; sleeping {:.3}s", wait.as_secs_f64());
                    tokio::time::sleep(wait).await;
                    continue;
                }
            }

            break now;
        };

        if self.max_per_interval.is_some() {
            state.events.push_back(now);
        }
        state.last_acquire = Some(now);
    }

    /// Number of acquisitions currently inside the window
    pub async fn window_len(&self) -> usize {
        let mut state = self.state.lock().await;
        state.prune(Instant::now(), self.interval);
        state.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Every `max + 1` consecutive acquisitions must span at least `interval`
    fn assert_window_respected(stamps: &[Instant], max: usize, interval: Duration) {
        for pair in stamps.windows(max + 1) {
            let span = pair[max].duration_since(pair[0]);
            assert!(span >= interval, "{} acquisitions inside {span:?}", max + 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn burst_is_spread_over_windows() {
        let limiter = RateLimiter::new(Some(3), Duration::from_secs(1), Duration::ZERO);
        let start = Instant::now();
        let mut stamps = Vec::new();

        for _ in 0..7 {
            limiter.acquire().await;
            stamps.push(Instant::now());
        }

        // 3 immediately, 3 after one window, the 7th after two
        assert!(stamps[4].duration_since(start) >= Duration::from_secs(1));
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert_window_respected(&stamps, 3, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn min_delay_spaces_acquisitions() {
        let limiter = RateLimiter::new(None, Duration::from_secs(1), Duration::from_millis(250));
        let mut stamps = Vec::new();

        for _ in 0..4 {
            limiter.acquire().await;
            stamps.push(Instant::now());
        }

        for pair in stamps.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= Duration::from_millis(250));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_never_exceed_window() {
        let limiter = Arc::new(RateLimiter::new(
            Some(2),
            Duration::from_millis(500),
            Duration::ZERO,
        ));
        let stamps = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let limiter = Arc::clone(&limiter);
            let stamps = Arc::clone(&stamps);
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                stamps.lock().push(Instant::now());
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut stamps = stamps.lock().clone();
        stamps.sort();
        assert_eq!(stamps.len(), 6);
        assert_window_respected(&stamps, 2, Duration::from_millis(500));
    }

    #[tokio::test]
    async fn unlimited_never_waits() {
        let limiter = RateLimiter::unlimited();
        assert!(!limiter.is_enabled());
        let start = std::time::Instant::now();
        for _ in 0..100 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(limiter.window_len().await, 0);
    }
}
