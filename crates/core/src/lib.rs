//! sprintcast core data models.
//!
//! This crate defines the input snapshots, the reconstructed per-day
//! timeline records, configuration, and the calendar arithmetic that aligns
//! dates to a sprint cadence.

#![warn(missing_docs)]

pub mod calendar;

mod config;
mod error;
mod event;
mod stats;
mod team;
mod timeline;

// Re-exports
pub use calendar::{
    align_to_sprint_boundary, compare_dates, days_since_epoch, far_future, increment_date,
    is_sprint_boundary, next_sprint_boundary, parse_date,
};
pub use config::{
    Configuration, DEFAULT_DAYS_IN_SPRINT, DEFAULT_POINTS_PER_UNESTIMATED_ITEM,
    DEFAULT_UNESTIMATED_VELOCITY_FACTORS,
};
pub use error::{Result, TimelineError};
pub use event::{InputDate, InputEvent, UnestimatedWork};
pub use stats::{DateStats, StatsInfo, VelocityStats};
pub use team::TeamKey;
pub use timeline::{OutputEvent, TeamData, TeamDataMap};
