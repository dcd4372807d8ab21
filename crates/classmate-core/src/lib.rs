//! # ClassMate Core Library
//!
//! Client-side core of the ClassMate adaptive-tutoring application. All
//! heavy lifting (quiz generation, retrieval, mastery inference) lives in a
//! remote backend; this crate keeps the local state a session needs and
//! talks to that backend. The CLI binary is a thin layer over it.
//!
//! ## Architecture
//!
//! - **Countdown**: a restartable session countdown that persists its
//!   deadline and resumes exactly after a restart. The caller ticks it once
//!   per second, or hands it to the tokio driver.
//! - **Storage**: an injected session key/value capability (in-memory or
//!   SQLite) and TOML configuration
//! - **Backend client**: one async call per backend capability
//!
//! ## Key Components
//!
//! - [`CountdownTimer`]: Countdown state machine
//! - [`SessionStorage`]: Storage seam the countdown persists through
//! - [`Config`]: Application configuration management
//! - [`BackendClient`]: HTTP client for the tutoring backend

pub mod api;
pub mod error;
pub mod events;
pub mod profile;
pub mod storage;
pub mod timer;
pub mod topics;

pub use api::BackendClient;
pub use error::{ApiError, ConfigError, CoreError, StorageError};
pub use events::Event;
pub use profile::{Difficulty, QuizResult, UserProfile};
pub use storage::{Config, MemoryStorage, SessionDb, SessionStorage};
pub use timer::{
    format_time, spawn_countdown, Clock, CountdownHandle, CountdownOptions, CountdownState,
    CountdownTimer, ManualClock, PersistedCountdown, SystemClock, UrgencyTier,
};
