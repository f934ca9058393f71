//! Sprint progress tracking.
//!
//! Timeline reconstruction, per-team velocity, and completion date
//! projection.

#![warn(missing_docs)]

pub mod tracker;
pub mod velocity;
pub mod estimator;

pub use tracker::{create_timeline_events, TimelineBuilder};
pub use velocity::VelocityTracker;
pub use estimator::{
    project_date, project_points, project_team, project_timeline, CompletionEstimator,
    Projection, ProjectionParams, TeamProjection, TimelineProjection,
};
pub use sprintcast_core::next_sprint_boundary;
