//! Token-bucket rate limiter for mutating RPC methods.

use std::time::Instant;
use tokio::sync::Mutex;

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket: `burst` capacity, refilled at `rate_per_sec`.
pub struct RateLimiter {
    bucket: Mutex<Bucket>,
    burst: f64,
    rate_per_sec: f64,
}

impl RateLimiter {
    pub fn new(burst: u32, rate_per_sec: u32) -> Self {
        Self {
            bucket: Mutex::new(Bucket {
                tokens: burst as f64,
                last_refill: Instant::now(),
            }),
            burst: burst as f64,
            rate_per_sec: rate_per_sec as f64,
        }
    }

    /// Consume one token; false means the caller is over the limit.
    pub async fn check(&self) -> bool {
        let mut bucket = self.bucket.lock().await;
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.rate_per_sec).min(self.burst);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}
