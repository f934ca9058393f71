//! Average/min/max scenario triples.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One value per forecasting scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsInfo<T> {
    /// Expected case
    pub average: T,
    /// Lower bound
    pub min: T,
    /// Upper bound
    pub max: T,
}

/// Points completed per sprint.
pub type VelocityStats = StatsInfo<f64>;

/// Projected completion dates.
///
/// `min` is the earliest date (reached with the highest velocity) and `max`
/// the latest (reached with the lowest velocity).
pub type DateStats = StatsInfo<NaiveDate>;

impl<T> StatsInfo<T> {
    /// Create a new triple.
    pub fn new(average: T, min: T, max: T) -> Self {
        Self { average, min, max }
    }

    /// Apply `f` to every scenario.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> StatsInfo<U> {
        StatsInfo {
            average: f(self.average),
            min: f(self.min),
            max: f(self.max),
        }
    }
}

impl VelocityStats {
    /// Whether every scenario is zero, i.e. no progress was ever measured.
    pub fn is_zero(&self) -> bool {
        self.average == 0.0 && self.min == 0.0 && self.max == 0.0
    }
}
