//! Input event model - one team's progress snapshot on one day.

use crate::calendar::parse_date;
use crate::team::TeamKey;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date of an input event, either already parsed or raw text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputDate {
    /// A calendar date
    Date(NaiveDate),
    /// Text parsed with [`parse_date`] during reconstruction
    Text(String),
}

impl InputDate {
    /// Resolve to a calendar date, `None` if the text is not a date.
    pub fn resolve(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(date) => Some(*date),
            Self::Text(text) => parse_date(text),
        }
    }
}

impl From<NaiveDate> for InputDate {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

impl From<&str> for InputDate {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for InputDate {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl std::fmt::Display for InputDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{}", date),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Work beyond the current sprint that has not been sized yet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnestimatedWork {
    /// Item count, converted with the points-per-item factor
    Items(f64),
    /// Already expressed in points
    Points(f64),
}

impl UnestimatedWork {
    /// Number of items, zero when the work was given in points.
    pub fn items(&self) -> f64 {
        match self {
            Self::Items(items) => *items,
            Self::Points(_) => 0.0,
        }
    }

    /// Points equivalent of this work.
    pub fn to_points(&self, points_per_item: f64) -> f64 {
        match self {
            Self::Items(items) => items * points_per_item,
            Self::Points(points) => *points,
        }
    }
}

impl Default for UnestimatedWork {
    fn default() -> Self {
        Self::Items(0.0)
    }
}

/// One team's snapshot on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    /// Snapshot date
    pub date: InputDate,

    /// Points completed across all sprints
    #[serde(default)]
    pub total_points_completed: f64,

    /// Points pending in the current sprint
    #[serde(default)]
    pub total_points_pending: f64,

    /// Points active in the current sprint
    #[serde(default)]
    pub total_points_active: f64,

    /// Estimated points beyond the current sprint
    #[serde(default)]
    pub total_points_estimated: f64,

    /// Unestimated work beyond the current sprint
    #[serde(default)]
    pub unestimated: UnestimatedWork,

    /// Owning team, `None` for single-team timelines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,

    /// Caller data passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opaque_data: Option<serde_json::Value>,
}

impl InputEvent {
    /// Create a snapshot with the cumulative completed points; other counts start at zero.
    pub fn new(date: impl Into<InputDate>, total_points_completed: f64) -> Self {
        Self {
            date: date.into(),
            total_points_completed,
            total_points_pending: 0.0,
            total_points_active: 0.0,
            total_points_estimated: 0.0,
            unestimated: UnestimatedWork::default(),
            team: None,
            opaque_data: None,
        }
    }

    /// Set the owning team.
    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    /// Set current-sprint pending and active points.
    pub fn with_sprint_points(mut self, pending: f64, active: f64) -> Self {
        self.total_points_pending = pending;
        self.total_points_active = active;
        self
    }

    /// Set estimated backlog points.
    pub fn with_estimated(mut self, points: f64) -> Self {
        self.total_points_estimated = points;
        self
    }

    /// Set the number of unestimated backlog items.
    pub fn with_unestimated_items(mut self, items: f64) -> Self {
        self.unestimated = UnestimatedWork::Items(items);
        self
    }

    /// Set unestimated backlog already expressed in points.
    pub fn with_unestimated_points(mut self, points: f64) -> Self {
        self.unestimated = UnestimatedWork::Points(points);
        self
    }

    /// Attach caller data.
    pub fn with_opaque_data(mut self, data: serde_json::Value) -> Self {
        self.opaque_data = Some(data);
        self
    }

    /// Key of the owning team.
    pub fn team_key(&self) -> TeamKey {
        TeamKey::new(self.team.as_deref())
    }
}
