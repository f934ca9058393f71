//! Output timeline model - one aggregated record per calendar day.

use crate::event::InputEvent;
use crate::stats::VelocityStats;
use crate::team::TeamKey;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Team snapshots of one day, keyed by team.
pub type TeamDataMap = BTreeMap<TeamKey, TeamData>;

/// A team's snapshot plus the velocity valid on that date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamData {
    /// Points completed across all sprints
    pub total_points_completed: f64,

    /// Points pending in the current sprint
    pub total_points_pending: f64,

    /// Points active in the current sprint
    pub total_points_active: f64,

    /// Estimated points beyond the current sprint
    pub total_points_estimated: f64,

    /// Unestimated item count (zero when the input gave points)
    pub num_unestimated_items: f64,

    /// Unestimated work expressed in points
    pub total_points_unestimated: f64,

    /// Velocity as of this date; `None` until the team has crossed a sprint boundary
    pub velocity: Option<VelocityStats>,

    /// Caller data from the input event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opaque_data: Option<serde_json::Value>,

    /// Sum of every point count above
    pub total_points: f64,
}

impl TeamData {
    /// Build team data from an input snapshot.
    pub fn from_input(
        event: &InputEvent,
        points_per_unestimated_item: f64,
        velocity: Option<VelocityStats>,
    ) -> Self {
        let total_points_unestimated = event.unestimated.to_points(points_per_unestimated_item);

        Self {
            total_points_completed: event.total_points_completed,
            total_points_pending: event.total_points_pending,
            total_points_active: event.total_points_active,
            total_points_estimated: event.total_points_estimated,
            num_unestimated_items: event.unestimated.items(),
            total_points_unestimated,
            velocity,
            opaque_data: event.opaque_data.clone(),
            total_points: event.total_points_completed
                + event.total_points_pending
                + event.total_points_active
                + event.total_points_estimated
                + total_points_unestimated,
        }
    }

    /// Estimated plus unestimated backlog.
    pub fn remaining_points(&self) -> f64 {
        self.total_points_estimated + self.total_points_unestimated
    }
}

/// One calendar day of the reconstructed timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputEvent {
    /// Calendar day
    pub date: NaiveDate,

    /// Whether a sprint starts on this day
    pub is_sprint_boundary: bool,

    /// Whether the day had no input and carries the previous day forward
    pub is_generated: bool,

    /// Per-team data; generated days share the previous day's map
    #[serde(serialize_with = "serialize_team_data")]
    pub team_data: Arc<TeamDataMap>,

    /// Sum of every team's total points
    pub total_points: f64,

    /// Sum of completed points
    pub total_points_completed: f64,

    /// Sum of pending points
    pub total_points_pending: f64,

    /// Sum of active points
    pub total_points_active: f64,

    /// Sum of estimated points
    pub total_points_estimated: f64,

    /// Sum of unestimated points
    pub total_points_unestimated: f64,

    /// Sum of unestimated items
    pub total_num_unestimated_items: f64,

    /// Team velocities blended by completed points; `None` when nothing was completed
    pub average_velocities: Option<VelocityStats>,
}

impl OutputEvent {
    /// Create a day record and compute its whole-timeline aggregates.
    pub fn new(
        date: NaiveDate,
        is_sprint_boundary: bool,
        is_generated: bool,
        team_data: Arc<TeamDataMap>,
    ) -> Self {
        let mut event = Self {
            date,
            is_sprint_boundary,
            is_generated,
            team_data: Arc::clone(&team_data),
            total_points: 0.0,
            total_points_completed: 0.0,
            total_points_pending: 0.0,
            total_points_active: 0.0,
            total_points_estimated: 0.0,
            total_points_unestimated: 0.0,
            total_num_unestimated_items: 0.0,
            average_velocities: None,
        };

        let mut weighted = VelocityStats::new(0.0, 0.0, 0.0);

        for data in team_data.values() {
            event.total_points += data.total_points;
            event.total_points_completed += data.total_points_completed;
            event.total_points_pending += data.total_points_pending;
            event.total_points_active += data.total_points_active;
            event.total_points_estimated += data.total_points_estimated;
            event.total_points_unestimated += data.total_points_unestimated;
            event.total_num_unestimated_items += data.num_unestimated_items;

            if let Some(velocity) = data.velocity {
                weighted.average += velocity.average * data.total_points_completed;
                weighted.min += velocity.min * data.total_points_completed;
                weighted.max += velocity.max * data.total_points_completed;
            }
        }

        if event.total_points_completed != 0.0 {
            let completed = event.total_points_completed;
            event.average_velocities = Some(weighted.map(|v| v / completed));
        }

        event
    }

    /// Data for one team on this day.
    pub fn team(&self, key: &TeamKey) -> Option<&TeamData> {
        self.team_data.get(key)
    }
}

#[derive(Serialize)]
struct TeamEntry<'a> {
    team: &'a TeamKey,
    #[serde(flatten)]
    data: &'a TeamData,
}

// Team keys are not valid JSON object keys, so the map goes out as a list.
fn serialize_team_data<S: Serializer>(
    team_data: &Arc<TeamDataMap>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(team_data.iter().map(|(team, data)| TeamEntry { team, data }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, 4).unwrap()
    }

    #[test]
    fn test_team_data_totals() {
        let input = InputEvent::new(date(), 10.0)
            .with_sprint_points(2.0, 3.0)
            .with_estimated(20.0)
            .with_unestimated_items(2.0);

        let data = TeamData::from_input(&input, 8.0, None);
        assert_eq!(data.total_points_unestimated, 16.0);
        assert_eq!(data.num_unestimated_items, 2.0);
        assert_eq!(data.total_points, 10.0 + 2.0 + 3.0 + 20.0 + 16.0);
        assert_eq!(data.remaining_points(), 36.0);
    }

    #[test]
    fn test_output_event_aggregates() {
        let mut map = TeamDataMap::new();
        map.insert(
            TeamKey::from("a"),
            TeamData::from_input(
                &InputEvent::new(date(), 30.0).with_estimated(10.0),
                8.0,
                Some(VelocityStats::new(10.0, 5.0, 15.0)),
            ),
        );
        map.insert(
            TeamKey::from("b"),
            TeamData::from_input(
                &InputEvent::new(date(), 10.0).with_unestimated_items(1.0),
                8.0,
                Some(VelocityStats::new(20.0, 20.0, 20.0)),
            ),
        );

        let event = OutputEvent::new(date(), true, false, Arc::new(map));
        assert_eq!(event.total_points_completed, 40.0);
        assert_eq!(event.total_points_estimated, 10.0);
        assert_eq!(event.total_points_unestimated, 8.0);
        assert_eq!(event.total_num_unestimated_items, 1.0);
        assert_eq!(event.total_points, 58.0);

        let blended = event.average_velocities.unwrap();
        assert_eq!(blended.average, (10.0 * 30.0 + 20.0 * 10.0) / 40.0);
        assert_eq!(blended.min, (5.0 * 30.0 + 20.0 * 10.0) / 40.0);
        assert_eq!(blended.max, (15.0 * 30.0 + 20.0 * 10.0) / 40.0);
    }

    #[test]
    fn test_no_blended_velocity_without_completed_points() {
        let mut map = TeamDataMap::new();
        map.insert(
            TeamKey::Default,
            TeamData::from_input(&InputEvent::new(date(), 0.0), 8.0, None),
        );

        let event = OutputEvent::new(date(), false, false, Arc::new(map));
        assert!(event.average_velocities.is_none());
        assert!(event.team(&TeamKey::Default).is_some());
    }

    #[test]
    fn test_serializes_teams_as_list() {
        let mut map = TeamDataMap::new();
        map.insert(
            TeamKey::from("web"),
            TeamData::from_input(&InputEvent::new(date(), 4.0), 8.0, None),
        );

        let event = OutputEvent::new(date(), false, true, Arc::new(map));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["date"], "2022-01-04");
        assert_eq!(json["team_data"][0]["team"], "web");
        assert_eq!(json["team_data"][0]["total_points_completed"], 4.0);
    }
}
