//! The persisted countdown record.
//!
//! Stored as `{"startTime": <epoch ms>, "initialSeconds": <seconds>}` so the
//! same entry is readable by any host speaking the session-storage contract.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCountdown {
    /// Wall-clock instant (epoch ms) the current period began, re-anchored
    /// on every tick.
    pub start_time: i64,
    pub initial_seconds: u64,
}

impl PersistedCountdown {
    /// Anchor a record so that `remaining` seconds are left at `now_ms`.
    pub fn anchored(now_ms: i64, initial_seconds: u64, remaining: u64) -> Self {
        let consumed = i64::try_from(initial_seconds.saturating_sub(remaining)).unwrap_or(i64::MAX);
        Self {
            start_time: now_ms.saturating_sub(consumed.saturating_mul(1000)),
            initial_seconds,
        }
    }

    /// Whole seconds left at `now_ms`, clamped to `[0, initial_seconds]`.
    pub fn remaining_at(&self, now_ms: i64) -> u64 {
        // Widened so no stored start time can overflow the subtraction.
        let elapsed = (i128::from(now_ms) - i128::from(self.start_time)).div_euclid(1000);
        let initial = i128::from(self.initial_seconds);
        (initial - elapsed).clamp(0, initial) as u64
    }

    /// Parse a stored value. Anything unparsable, or a duration no clock
    /// could represent, is `None`.
    pub fn decode(raw: &str) -> Option<Self> {
        let record: Self = serde_json::from_str(raw).ok()?;
        if i64::try_from(record.initial_seconds).is_err() {
            return None;
        }
        Some(record)
    }

    pub fn encode(&self) -> String {
        // Two integer fields cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}
