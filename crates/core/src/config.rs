//! Projection configuration.

use crate::error::{Result, TimelineError};
use crate::stats::VelocityStats;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default sprint length in days.
pub const DEFAULT_DAYS_IN_SPRINT: u32 = 14;

/// Default points assigned to one unestimated item.
pub const DEFAULT_POINTS_PER_UNESTIMATED_ITEM: f64 = 8.0;

/// Default low/high multipliers applied to unestimated work.
pub const DEFAULT_UNESTIMATED_VELOCITY_FACTORS: [f64; 2] = [0.5, 2.0];

/// Everything needed to reconstruct a timeline and project it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Any date known to start a sprint
    pub any_sprint_boundary: NaiveDate,

    /// Sprint length
    #[serde(default = "default_days_in_sprint")]
    pub days_in_sprint: u32,

    /// Points per unestimated item
    #[serde(default = "default_points_per_unestimated_item")]
    pub points_per_unestimated_item: f64,

    /// Number of recent sprints used for velocity (None = all sprints)
    #[serde(default)]
    pub velocity_window: Option<usize>,

    /// Low/high blend factors for unestimated work
    #[serde(default = "default_unestimated_velocity_factors")]
    pub unestimated_velocity_factors: [f64; 2],

    /// Manual velocity used instead of the measured one
    #[serde(default)]
    pub velocity_overrides: Option<VelocityStats>,
}

fn default_days_in_sprint() -> u32 {
    DEFAULT_DAYS_IN_SPRINT
}

fn default_points_per_unestimated_item() -> f64 {
    DEFAULT_POINTS_PER_UNESTIMATED_ITEM
}

fn default_unestimated_velocity_factors() -> [f64; 2] {
    DEFAULT_UNESTIMATED_VELOCITY_FACTORS
}

impl Configuration {
    /// Create a configuration with defaults for everything but the sprint anchor.
    pub fn new(any_sprint_boundary: NaiveDate) -> Self {
        Self {
            any_sprint_boundary,
            days_in_sprint: DEFAULT_DAYS_IN_SPRINT,
            points_per_unestimated_item: DEFAULT_POINTS_PER_UNESTIMATED_ITEM,
            velocity_window: None,
            unestimated_velocity_factors: DEFAULT_UNESTIMATED_VELOCITY_FACTORS,
            velocity_overrides: None,
        }
    }

    /// Set the sprint length.
    pub fn with_days_in_sprint(mut self, days: u32) -> Self {
        self.days_in_sprint = days;
        self
    }

    /// Set the points per unestimated item.
    pub fn with_points_per_unestimated_item(mut self, points: f64) -> Self {
        self.points_per_unestimated_item = points;
        self
    }

    /// Only use the last `sprints` sprints for velocity.
    pub fn with_velocity_window(mut self, sprints: Option<usize>) -> Self {
        self.velocity_window = sprints;
        self
    }

    /// Set the unestimated work blend factors.
    pub fn with_unestimated_velocity_factors(mut self, factors: [f64; 2]) -> Self {
        self.unestimated_velocity_factors = factors;
        self
    }

    /// Project with a fixed velocity instead of the measured one.
    pub fn with_velocity_overrides(mut self, overrides: Option<VelocityStats>) -> Self {
        self.velocity_overrides = overrides;
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.days_in_sprint == 0 {
            return Err(TimelineError::InvalidSprintLength(0));
        }

        if !self.points_per_unestimated_item.is_finite() || self.points_per_unestimated_item < 0.0 {
            return Err(TimelineError::InvalidConfig(format!(
                "points_per_unestimated_item must be a non-negative number, got {}",
                self.points_per_unestimated_item
            )));
        }

        if self.velocity_window == Some(0) {
            return Err(TimelineError::InvalidConfig(
                "velocity_window must cover at least one sprint".to_string(),
            ));
        }

        let [low, high] = self.unestimated_velocity_factors;
        if !(low.is_finite() && high.is_finite()) || low > high {
            return Err(TimelineError::InvalidConfig(format!(
                "unestimated_velocity_factors must be ordered [low, high], got [{}, {}]",
                low, high
            )));
        }

        Ok(())
    }
}
