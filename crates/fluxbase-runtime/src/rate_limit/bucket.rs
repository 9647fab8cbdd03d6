use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use fluxbase_core::rate_limit::{RateLimitConfig, RateLimitResult};
use tokio::sync::Mutex;

/// A single token bucket, refilled lazily on each check rather than on a
/// timer (spec §5: "limiter instances are cached by key... lookups with
/// equal keys return the same instance").
struct TokenBucket {
    tokens: f64,
    max_tokens: f64,
    refill_rate: f64,
    last_refill: std::time::Instant,
}

impl TokenBucket {
    fn new(config: &RateLimitConfig) -> Self {
        Self {
            tokens: config.requests as f64,
            max_tokens: config.requests as f64,
            refill_rate: config.refill_rate(),
            last_refill: std::time::Instant::now(),
        }
    }

    fn check(&mut self) -> RateLimitResult {
        let now = std::time::Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;

        let reset_at = Utc::now()
            + chrono::Duration::seconds(((self.max_tokens - self.tokens) / self.refill_rate) as i64);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            RateLimitResult::allowed(self.tokens.max(0.0) as u32, reset_at)
        } else {
            let retry_after = std::time::Duration::from_secs_f64((1.0 - self.tokens) / self.refill_rate);
            RateLimitResult::denied(0, reset_at, retry_after)
        }
    }
}

/// An in-process, per-key token-bucket rate limiter. Unlike the
/// database-backed limiter used for the HTTP surface, this one backs a
/// single engine instance's admission control and never needs to agree
/// with other replicas, so it keeps all state in memory.
pub struct KeyedLimiter {
    buckets: Mutex<HashMap<String, Arc<Mutex<TokenBucket>>>>,
}

impl KeyedLimiter {
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Look up (creating if absent) the bucket for `key` and consume one
    /// token. Repeated lookups with the same key always return the same
    /// underlying bucket.
    pub async fn check(&self, key: &str, config: &RateLimitConfig) -> RateLimitResult {
        let bucket = {
            let mut buckets = self.buckets.lock().await;
            buckets
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(TokenBucket::new(config))))
                .clone()
        };

        bucket.lock().await.check()
    }

    /// Drop the bucket for `key`, resetting it back to full on next use.
    pub async fn reset(&self, key: &str) {
        self.buckets.lock().await.remove(key);
    }
}

impl Default for KeyedLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_returns_allowed_then_denies_past_burst() {
        let limiter = KeyedLimiter::new();
        let config = RateLimitConfig::new(2, Duration::from_secs(60));

        assert!(limiter.check("client:a", &config).await.allowed);
        assert!(limiter.check("client:a", &config).await.allowed);
        assert!(!limiter.check("client:a", &config).await.allowed);
    }

    #[tokio::test]
    async fn distinct_keys_have_independent_buckets() {
        let limiter = KeyedLimiter::new();
        let config = RateLimitConfig::new(1, Duration::from_secs(60));

        assert!(limiter.check("client:a", &config).await.allowed);
        assert!(limiter.check("client:b", &config).await.allowed);
    }

    #[tokio::test]
    async fn reset_restores_a_full_bucket() {
        let limiter = KeyedLimiter::new();
        let config = RateLimitConfig::new(1, Duration::from_secs(60));

        assert!(limiter.check("client:a", &config).await.allowed);
        assert!(!limiter.check("client:a", &config).await.allowed);

        limiter.reset("client:a").await;
        assert!(limiter.check("client:a", &config).await.allowed);
    }
}
