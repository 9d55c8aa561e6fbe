use chrono::{DateTime, Utc};

/// Wall-clock source for snapshot timestamps.
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
