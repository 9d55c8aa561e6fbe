//! Bounded activity log shown next to the game views
//!
//! Advisory notifications and action advisories land here. The oldest entry
//! is dropped once the log is full.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

pub const DEFAULT_ACTIVITY_LOG_CAPACITY: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    pub at: DateTime<Utc>,
    /// Notification type or action name
    pub kind: String,
    pub text: String,
}

#[derive(Debug)]
pub struct ActivityLog {
    entries: Mutex<VecDeque<ActivityEntry>>,
    capacity: usize,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an entry, returning the one dropped to make room.
    pub fn push(
        &self,
        at: DateTime<Utc>,
        kind: impl Into<String>,
        text: impl Into<String>,
    ) -> Option<ActivityEntry> {
        let entry = ActivityEntry {
            at,
            kind: kind.into(),
            text: text.into(),
        };
        tracing::info!(kind = %entry.kind, "{}", entry.text);

        let mut entries = self.lock();
        let dropped = if entries.len() >= self.capacity {
            entries.pop_front()
        } else {
            None
        };
        entries.push_back(entry);
        dropped
    }

    /// Entries oldest first.
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<ActivityEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVITY_LOG_CAPACITY)
    }
}
