use std::time::Duration;

use async_trait::async_trait;
use time::{macros::format_description, OffsetDateTime};

/// Source of "now" for the ledger. Injected so tests can pin or move the day.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;

    /// Storage key for the current calendar day (UTC), e.g. `2026-10-16`.
    fn date_key(&self) -> String {
        date_key(self.now())
    }

    /// Milliseconds since the unix epoch, used for meal ids.
    fn now_millis(&self) -> i64 {
        (self.now().unix_timestamp_nanos() / 1_000_000) as i64
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

pub fn date_key(at: OffsetDateTime) -> String {
    let utc = at.to_offset(time::UtcOffset::UTC);
    // The format is static and every component is always present.
    utc.date()
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| utc.date().to_string())
}

/// Waits between estimator attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}
