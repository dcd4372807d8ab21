use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{CountdownState, UrgencyTier};

/// Every countdown state change produces an Event.
/// Hosts render from snapshots and react to expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    CountdownStarted {
        storage_key: Option<String>,
        duration_secs: u64,
        remaining_secs: u64,
        /// True when progress was restored from a persisted record.
        resumed: bool,
        at: DateTime<Utc>,
    },
    UrgencyChanged {
        from: UrgencyTier,
        to: UrgencyTier,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    CountdownExpired {
        storage_key: Option<String>,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    CountdownStopped {
        storage_key: Option<String>,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    CountdownSnapshot {
        state: CountdownState,
        storage_key: Option<String>,
        duration_secs: u64,
        remaining_secs: u64,
        formatted: String,
        urgency: UrgencyTier,
        notice: Option<String>,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// True for events after which the countdown will not tick again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Event::CountdownExpired { .. } | Event::CountdownStopped { .. }
        )
    }
}
