use std::collections::HashMap;
use std::sync::Mutex;
use time::{OffsetDateTime, Duration};
use tracing::{warn, error};

use crate::error::ApiError;

/// Longest accepted window, one week.
pub const MAX_WINDOW_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug)]
struct RateLimit {
    attempts: u32,
    first_attempt: OffsetDateTime,
}

/// Fixed-window limiter keyed by caller. A `max_attempts` of zero disables it.
#[derive(Debug)]
pub struct RateLimiter {
    limits: Mutex<HashMap<String, RateLimit>>,
    max_attempts: u32,
    window: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(30, 1)
    }
}

impl RateLimiter {
    pub fn new(max_attempts: u32, window_minutes: i64) -> Self {
        Self {
            limits: Mutex::new(HashMap::new()),
            max_attempts,
            window: Duration::minutes(window_minutes.clamp(1, MAX_WINDOW_MINUTES)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 0
    }

    pub fn check_rate_limit(&self, key: &str, now: OffsetDateTime) -> Result<(), ApiError> {
        if !self.is_enabled() {
            return Ok(());
        }

        let result = {
            let mut limits = self.limits.lock().map_err(|e| {
                error!("Failed to acquire rate limit lock: {}", e);
                ApiError::Internal("rate limiter unavailable".into())
            })?;

            limits.retain(|_, limit| now - limit.first_attempt <= self.window * 2);

            match limits.get_mut(key) {
                Some(limit) if now - limit.first_attempt > self.window => {
                    *limit = RateLimit { attempts: 1, first_attempt: now };
                    Ok(())
                }
                Some(limit) if limit.attempts >= self.max_attempts => {
                    let seconds_to_wait = (limit.first_attempt + self.window - now).whole_seconds();
                    Err(ApiError::RateLimited(format!(
                        "Rate limit exceeded. Please try again in {} seconds.",
                        seconds_to_wait.max(1)
                    )))
                }
                Some(limit) => {
                    limit.attempts += 1;
                    Ok(())
                }
                None => {
                    limits.insert(key.to_string(), RateLimit { attempts: 1, first_attempt: now });
                    Ok(())
                }
            }
        };

        if let Err(ref e) = result {
            warn!("Rate limit triggered for key {}: {}", key, e);
        }

        result
    }
}
