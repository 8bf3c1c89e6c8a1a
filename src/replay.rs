// src/replay.rs
use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use chrono::Utc;

/// Widest accepted freshness window.
pub const MAX_SKEW: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MalformedTimestamp,
    Stale,
    Replayed,
}

impl Rejection {
    pub fn as_str(self) -> &'static str {
        match self {
            Rejection::MalformedTimestamp => "malformed timestamp",
            Rejection::Stale => "timestamp outside window",
            Rejection::Replayed => "nonce replayed",
        }
    }
}

#[derive(Debug)]
struct Seen {
    expiry: HashMap<String, Instant>,
    last_sweep: Instant,
}

/// Timestamp window of `max_skew` plus nonces remembered for `2 * max_skew`.
#[derive(Debug)]
pub struct ReplayGuard {
    max_skew: Duration,
    seen: Mutex<Seen>,
}

impl ReplayGuard {
    pub fn new(max_skew: Duration) -> Self {
        Self {
            max_skew: max_skew.min(MAX_SKEW),
            seen: Mutex::new(Seen {
                expiry: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    pub fn check(&self, nonce: &str, timestamp: &str) -> Result<(), Rejection> {
        self.check_at(nonce, timestamp, Utc::now().timestamp(), Instant::now())
    }

    fn check_at(
        &self,
        nonce: &str,
        timestamp: &str,
        now_unix: i64,
        now: Instant,
    ) -> Result<(), Rejection> {
        let ts: i64 = timestamp
            .parse()
            .map_err(|_| Rejection::MalformedTimestamp)?;
        let skew = i64::try_from(self.max_skew.as_secs()).unwrap_or(i64::MAX);
        if now_unix.saturating_sub(ts).saturating_abs() > skew {
            return Err(Rejection::Stale);
        }

        // A poisoned map still holds valid entries.
        let mut seen = self.seen.lock().unwrap_or_else(|p| p.into_inner());
        if now.saturating_duration_since(seen.last_sweep) >= self.max_skew {
            seen.expiry.retain(|_, exp| *exp > now);
            seen.last_sweep = now;
        }
        if matches!(seen.expiry.get(nonce), Some(exp) if *exp > now) {
            return Err(Rejection::Replayed);
        }
        let expires = self
            .max_skew
            .checked_mul(2)
            .and_then(|d| now.checked_add(d))
            .unwrap_or(now + self.max_skew);
        seen.expiry.insert(nonce.to_string(), expires);
        Ok(())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.seen.lock().map(|s| s.expiry.len()).unwrap_or(0)
    }
}
