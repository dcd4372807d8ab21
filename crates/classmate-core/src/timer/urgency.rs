use serde::{Deserialize, Serialize};

/// Seconds at or below which the countdown is `Warning`.
pub const WARNING_THRESHOLD_SECS: u64 = 300;
/// Seconds at or below which the countdown is `Urgent`.
pub const URGENT_THRESHOLD_SECS: u64 = 60;

/// Display classification of remaining time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyTier {
    Normal,
    Warning,
    Urgent,
}

impl UrgencyTier {
    pub fn from_remaining(remaining_secs: u64) -> Self {
        if remaining_secs <= URGENT_THRESHOLD_SECS {
            UrgencyTier::Urgent
        } else if remaining_secs <= WARNING_THRESHOLD_SECS {
            UrgencyTier::Warning
        } else {
            UrgencyTier::Normal
        }
    }

    /// Default auxiliary text for the tier.
    pub fn notice(self) -> Option<&'static str> {
        match self {
            UrgencyTier::Normal => None,
            UrgencyTier::Warning => Some("5 min left"),
            UrgencyTier::Urgent => Some("Hurry!"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UrgencyTier::Normal => "normal",
            UrgencyTier::Warning => "warning",
            UrgencyTier::Urgent => "urgent",
        }
    }
}

impl std::fmt::Display for UrgencyTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `MM:SS`, zero-padded. Minutes are not capped at 59.
pub fn format_time(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
