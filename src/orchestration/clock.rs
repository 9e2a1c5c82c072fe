//! Wall-clock seam for the scheduler.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use std::time::Duration;

/// Source of the current time and of waiting.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current time, UTC.
    fn now(&self) -> NaiveDateTime;

    async fn sleep(&self, duration: Duration);
}

/// Real clock backed by the system time and tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
