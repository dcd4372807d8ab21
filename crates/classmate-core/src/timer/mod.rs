mod clock;
mod countdown;
pub mod driver;
mod record;
mod urgency;

pub use clock::{Clock, ManualClock, SystemClock};
pub use countdown::{CountdownOptions, CountdownState, CountdownTimer, ExpireCallback};
pub use driver::{spawn_countdown, CountdownHandle};
pub use record::PersistedCountdown;
pub use urgency::{
    format_time, UrgencyTier, URGENT_THRESHOLD_SECS, WARNING_THRESHOLD_SECS,
};
