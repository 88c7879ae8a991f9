use crate::discogs::models::RateLimit;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// Minimum spacing between two outbound Discogs requests
pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(1000);
/// Extra wait once the reported quota drops below `LOW_WATER_MARK`
pub const QUOTA_COOLDOWN: Duration = Duration::from_millis(5000);
pub const LOW_WATER_MARK: u32 = 5;

#[derive(Debug, Default)]
struct RateLimitState {
    last_request: Option<Instant>,
    rate_limit: Option<RateLimit>,
}

/// Serializes outbound Discogs calls and tracks the quota Discogs reports.
///
/// One gate is shared (via `Arc`) by every client in the process. `acquire`
/// holds the gate across its wait, so concurrent callers are serialized and
/// never fire within `min_interval` of each other. There is no fairness
/// ordering between waiters.
#[derive(Debug)]
pub struct RateGate {
    state: Mutex<RateLimitState>,
    min_interval: Duration,
    cooldown: Duration,
    low_water_mark: u32,
}

impl Default for RateGate {
    fn default() -> Self {
        Self::new(MIN_REQUEST_INTERVAL, QUOTA_COOLDOWN, LOW_WATER_MARK)
    }
}

impl RateGate {
    pub fn new(min_interval: Duration, cooldown: Duration, low_water_mark: u32) -> Self {
        Self {
            state: Mutex::new(RateLimitState::default()),
            min_interval,
            cooldown,
            low_water_mark,
        }
    }

    /// Wait until it is safe to send the next request
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;

        if let Some(last) = state.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!("Rate gate: waiting {:?} before next Discogs request", wait);
                sleep(wait).await;
            }
        }

        if let Some(rate_limit) = state.rate_limit {
            if rate_limit.remaining < self.low_water_mark {
                warn!(
                    "Discogs quota nearly exhausted ({}/{} remaining), cooling down for {:?}",
                    rate_limit.remaining, rate_limit.limit, self.cooldown
                );
                sleep(self.cooldown).await;
            }
        }

        state.last_request = Some(Instant::now());
    }

    /// Store the quota reported by a completed response.
    ///
    /// The spacing stamp only moves forward: a response that completes while
    /// another caller already dispatched keeps that caller's later stamp.
    pub async fn record_response(&self, rate_limit: RateLimit, timestamp: Instant) {
        let mut state = self.state.lock().await;
        debug!(
            "Discogs quota: {} used, {} remaining of {}",
            rate_limit.used, rate_limit.remaining, rate_limit.limit
        );
        state.rate_limit = Some(rate_limit);
        state.last_request = Some(match state.last_request {
            Some(last) if last > timestamp => last,
            _ => timestamp,
        });
    }

    /// Last quota observed, if any request has completed yet
    pub async fn rate_limit(&self) -> Option<RateLimit> {
        self.state.lock().await.rate_limit
    }
}
