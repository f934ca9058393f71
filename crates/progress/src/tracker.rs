//! Timeline reconstruction.
//!
//! Turns a sorted, possibly sparse list of team snapshots into one record per
//! calendar day, measuring each team's velocity at every sprint boundary on
//! the way.

use crate::velocity::VelocityTracker;
use chrono::NaiveDate;
use sprintcast_core::{
    increment_date, is_sprint_boundary, Configuration, InputEvent, OutputEvent, Result, TeamData,
    TeamDataMap, TeamKey, TimelineError,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Builds the per-day timeline for one configuration.
#[derive(Debug, Clone)]
pub struct TimelineBuilder {
    days_in_sprint: u32,
    any_sprint_boundary: NaiveDate,
    points_per_unestimated_item: f64,
    velocity_window: Option<usize>,
}

impl TimelineBuilder {
    /// Create a builder.
    pub fn new(
        days_in_sprint: u32,
        any_sprint_boundary: NaiveDate,
        points_per_unestimated_item: f64,
        velocity_window: Option<usize>,
    ) -> Self {
        Self {
            days_in_sprint,
            any_sprint_boundary,
            points_per_unestimated_item,
            velocity_window,
        }
    }

    /// Create a builder from a configuration.
    pub fn from_config(config: &Configuration) -> Self {
        Self::new(
            config.days_in_sprint,
            config.any_sprint_boundary,
            config.points_per_unestimated_item,
            config.velocity_window,
        )
    }

    /// Reconstruct the timeline.
    ///
    /// `input` must be sorted ascending by date. The result holds one event
    /// per calendar day from the first to the last input date. Fails without
    /// partial results on an unparseable or out-of-order date.
    pub fn build(&self, input: &[InputEvent]) -> Result<Vec<OutputEvent>> {
        if self.days_in_sprint == 0 {
            return Err(TimelineError::InvalidSprintLength(0));
        }

        let dates = resolve_dates(input)?;
        let mut state = Reconstruction::new(self);
        let mut index = 0;
        let mut expected_date: Option<NaiveDate> = None;

        while index < input.len() {
            let this_date = dates[index];

            // Fill in missing days
            if let Some(mut expected) = expected_date {
                while expected < this_date {
                    state.commit(expected, &[]);
                    expected = increment_date(expected, 1.0);
                }
            }

            // Group every event of this day
            let start = index;
            while index < input.len() && dates[index] == this_date {
                index += 1;
            }

            state.commit(this_date, &input[start..index]);
            expected_date = Some(increment_date(this_date, 1.0));
        }

        debug!(
            "Reconstructed {} days from {} input events ({} teams)",
            state.results.len(),
            input.len(),
            state.trackers.len(),
        );

        Ok(state.results)
    }
}

/// Reconstruct the per-day timeline of `input_events`.
///
/// `use_previous_n_sprints` limits velocity to the most recent sprints; all
/// sprints are used when it is `None`.
pub fn create_timeline_events(
    input_events: &[InputEvent],
    days_in_sprint: u32,
    any_sprint_boundary: NaiveDate,
    points_per_unestimated_item: f64,
    use_previous_n_sprints: Option<usize>,
) -> Result<Vec<OutputEvent>> {
    TimelineBuilder::new(
        days_in_sprint,
        any_sprint_boundary,
        points_per_unestimated_item,
        use_previous_n_sprints,
    )
    .build(input_events)
}

fn resolve_dates(input: &[InputEvent]) -> Result<Vec<NaiveDate>> {
    let mut dates: Vec<NaiveDate> = Vec::with_capacity(input.len());

    for (index, event) in input.iter().enumerate() {
        let date = event.date.resolve().ok_or_else(|| TimelineError::InvalidDate {
            index,
            value: event.date.to_string(),
        })?;

        if let Some(&previous) = dates.last() {
            if date < previous {
                return Err(TimelineError::OutOfOrder {
                    index,
                    date,
                    previous,
                });
            }
        }

        dates.push(date);
    }

    Ok(dates)
}

/// Mutable state of a single reconstruction.
struct Reconstruction<'a> {
    builder: &'a TimelineBuilder,
    trackers: BTreeMap<TeamKey, VelocityTracker>,
    results: Vec<OutputEvent>,
}

impl<'a> Reconstruction<'a> {
    fn new(builder: &'a TimelineBuilder) -> Self {
        Self {
            builder,
            trackers: BTreeMap::new(),
            results: Vec::new(),
        }
    }

    /// Emit the event for `date`; `events` is empty for generated days.
    fn commit(&mut self, date: NaiveDate, events: &[InputEvent]) {
        let is_boundary = is_sprint_boundary(
            self.builder.any_sprint_boundary,
            self.builder.days_in_sprint,
            date,
        );

        // Velocities change before the day's team data is built
        if is_boundary {
            self.update_velocities(date, events);
        }

        let output = if events.is_empty() {
            trace!("No input for {}, carrying the previous day forward", date);

            let team_data = self
                .results
                .last()
                .map(|previous| Arc::clone(&previous.team_data))
                .unwrap_or_default();

            OutputEvent::new(date, is_boundary, true, team_data)
        } else {
            let mut team_data = TeamDataMap::new();

            for event in events {
                let key = event.team_key();
                let velocity = self.trackers.get(&key).map(VelocityTracker::stats);

                team_data.insert(
                    key,
                    TeamData::from_input(event, self.builder.points_per_unestimated_item, velocity),
                );
            }

            OutputEvent::new(date, is_boundary, false, Arc::new(team_data))
        };

        self.results.push(output);
    }

    fn update_velocities(&mut self, date: NaiveDate, events: &[InputEvent]) {
        // A team reported twice on one day keeps its last value
        let mut totals: BTreeMap<TeamKey, f64> = events
            .iter()
            .map(|event| (event.team_key(), event.total_points_completed))
            .collect();

        for (team, tracker) in self.trackers.iter_mut() {
            let stats = tracker.update(totals.remove(team));
            trace!("{} velocity on {}: {:?}", team, date, stats);
        }

        for (team, total) in totals {
            debug!("Tracking velocity for team {} from {}", team, date);
            self.trackers
                .insert(team, VelocityTracker::new(self.builder.velocity_window, total));
        }

        debug!("Sprint boundary {}: {} team velocities updated", date, self.trackers.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprintcast_core::{next_sprint_boundary, VelocityStats};

    fn boundary() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, 4).unwrap()
    }

    fn day(offset: i64) -> NaiveDate {
        increment_date(boundary(), offset as f64)
    }

    fn build(input: &[InputEvent]) -> Vec<OutputEvent> {
        create_timeline_events(input, 14, boundary(), 8.0, None).unwrap()
    }

    #[test]
    fn test_empty_input() {
        assert!(build(&[]).is_empty());
    }

    #[test]
    fn test_one_event_per_calendar_day() {
        let input = vec![
            InputEvent::new(day(-3), 0.0),
            InputEvent::new(day(2), 5.0),
            InputEvent::new(day(2), 1.0).with_team("other"),
            InputEvent::new(day(9), 8.0),
        ];

        let events = build(&input);
        assert_eq!(events.len(), 13);

        for (offset, event) in (-3..=9).zip(events.iter()) {
            assert_eq!(event.date, day(offset));
        }

        let real: Vec<_> = events.iter().filter(|e| !e.is_generated).map(|e| e.date).collect();
        assert_eq!(real, vec![day(-3), day(2), day(9)]);
        assert_eq!(events[5].team_data.len(), 2);
    }

    #[test]
    fn test_generated_days_share_previous_team_data() {
        let input = vec![
            InputEvent::new(day(1), 3.0).with_estimated(30.0),
            InputEvent::new(day(4), 6.0),
        ];

        let events = build(&input);
        assert_eq!(events.len(), 4);
        assert!(events[1].is_generated);
        assert!(events[2].is_generated);
        assert!(Arc::ptr_eq(&events[0].team_data, &events[1].team_data));
        assert!(Arc::ptr_eq(&events[0].team_data, &events[2].team_data));
        assert_eq!(events[2].total_points_estimated, 30.0);
        assert!(!events[3].is_generated);
        assert_eq!(events[3].total_points_completed, 6.0);
    }

    #[test]
    fn test_sprint_boundary_flags() {
        let input = vec![InputEvent::new(day(-1), 0.0), InputEvent::new(day(29), 0.0)];

        for event in build(&input) {
            let offset = (event.date - boundary()).num_days();
            assert_eq!(event.is_sprint_boundary, offset % 14 == 0, "day {}", offset);
        }
    }

    #[test]
    fn test_velocity_appears_at_first_boundary() {
        let input = vec![
            InputEvent::new(day(-2), 4.0),
            InputEvent::new(day(0), 6.0),
            InputEvent::new(day(3), 9.0),
        ];

        let events = build(&input);
        assert!(events[0].team(&TeamKey::Default).unwrap().velocity.is_none());

        // The first boundary seeds the tracker with the cumulative total
        let seeded = VelocityStats::new(6.0, 6.0, 6.0);
        assert_eq!(events[2].team(&TeamKey::Default).unwrap().velocity, Some(seeded));
        assert_eq!(events[5].team(&TeamKey::Default).unwrap().velocity, Some(seeded));
    }

    #[test]
    fn test_boundary_updates_before_team_data() {
        let input = vec![
            InputEvent::new(day(0), 10.0),
            InputEvent::new(day(14), 30.0),
            InputEvent::new(day(28), 30.0),
        ];

        let events = build(&input);
        let team = |offset: usize| events[offset].team(&TeamKey::Default).unwrap().velocity.unwrap();

        assert_eq!(team(0), VelocityStats::new(10.0, 10.0, 10.0));
        assert_eq!(team(14), VelocityStats::new(15.0, 10.0, 20.0));
        // Zero-progress sprint: counted for max only
        assert_eq!(team(28), VelocityStats::new(15.0, 10.0, 20.0));
    }

    #[test]
    fn test_missing_team_gets_gap_at_boundary() {
        let input = vec![
            InputEvent::new(day(0), 10.0).with_team("a"),
            InputEvent::new(day(0), 5.0).with_team("b"),
            InputEvent::new(day(14), 20.0).with_team("a"),
            InputEvent::new(day(28), 40.0).with_team("a"),
            InputEvent::new(day(28), 25.0).with_team("b"),
        ];

        let events = build(&input);
        let a = TeamKey::from("a");
        let b = TeamKey::from("b");

        assert!(events[14].team(&b).is_none());
        assert_eq!(events[14].team(&a).unwrap().velocity, Some(VelocityStats::new(10.0, 10.0, 10.0)));
        // b: seed 5, gap, then +20 against the last baseline
        assert_eq!(events[28].team(&b).unwrap().velocity, Some(VelocityStats::new(12.5, 5.0, 20.0)));
        assert_eq!(events[28].team(&a).unwrap().velocity, Some(VelocityStats::new(40.0 / 3.0, 10.0, 20.0)));
    }

    #[test]
    fn test_generated_boundary_day_advances_window() {
        let input = vec![
            InputEvent::new(day(0), 10.0),
            InputEvent::new(day(20), 20.0),
            InputEvent::new(day(28), 50.0),
        ];

        let events = create_timeline_events(&input, 14, boundary(), 8.0, Some(2)).unwrap();

        // Day 14 is generated, so it carries day 0's data forward unchanged
        assert!(events[14].is_generated);
        assert!(events[14].is_sprint_boundary);
        assert_eq!(
            events[14].team(&TeamKey::Default).unwrap().velocity,
            Some(VelocityStats::new(10.0, 10.0, 10.0))
        );

        // History is [10, gap, 40]; the window of two sees [gap, 40]
        assert_eq!(
            events[28].team(&TeamKey::Default).unwrap().velocity,
            Some(VelocityStats::new(40.0, 40.0, 40.0))
        );
    }

    #[test]
    fn test_opaque_data_passes_through() {
        let payload = serde_json::json!({"source": "jira", "ids": [1, 2]});
        let input = vec![InputEvent::new(day(0), 1.0).with_opaque_data(payload.clone())];

        let events = build(&input);
        assert_eq!(events[0].team(&TeamKey::Default).unwrap().opaque_data, Some(payload));
    }

    #[test]
    fn test_duplicate_team_on_one_day_keeps_last() {
        let input = vec![
            InputEvent::new(day(0), 1.0).with_team("a"),
            InputEvent::new(day(0), 7.0).with_team("a"),
        ];

        let events = build(&input);
        let a = events[0].team(&TeamKey::from("a")).unwrap();
        assert_eq!(a.total_points_completed, 7.0);
        assert_eq!(a.velocity, Some(VelocityStats::new(7.0, 7.0, 7.0)));
    }

    #[test]
    fn test_invalid_date_reports_index() {
        let input = vec![
            InputEvent::new("2022-01-04", 0.0),
            InputEvent::new("2022-01-05", 0.0),
            InputEvent::new("not-a-date", 0.0),
        ];

        let err = create_timeline_events(&input, 14, boundary(), 8.0, None).unwrap_err();
        assert_eq!(
            err,
            TimelineError::InvalidDate {
                index: 2,
                value: "not-a-date".to_string()
            }
        );
        assert!(err.to_string().contains("index '2'"));
    }

    #[test]
    fn test_out_of_order_input_is_rejected() {
        let input = vec![InputEvent::new(day(3), 0.0), InputEvent::new(day(1), 0.0)];

        let err = create_timeline_events(&input, 14, boundary(), 8.0, None).unwrap_err();
        assert_eq!(
            err,
            TimelineError::OutOfOrder {
                index: 1,
                date: day(1),
                previous: day(3)
            }
        );
    }

    #[test]
    fn test_zero_sprint_length_is_rejected() {
        let input = vec![InputEvent::new(day(0), 0.0)];
        let err = create_timeline_events(&input, 0, boundary(), 8.0, None).unwrap_err();
        assert_eq!(err, TimelineError::InvalidSprintLength(0));
    }

    #[test]
    fn test_text_dates_with_time_of_day_group_together() {
        let input = vec![
            InputEvent::new("2022-01-04T09:00:00Z", 1.0).with_team("a"),
            InputEvent::new("2022-01-04T17:30:00Z", 2.0).with_team("b"),
            InputEvent::new("2022-01-06", 3.0).with_team("a"),
        ];

        let events = build(&input);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].team_data.len(), 2);
        assert!(events[1].is_generated);
    }

    #[test]
    fn test_single_team_end_to_end() {
        let input = vec![
            InputEvent::new(day(0), 0.0).with_estimated(60.0),
            InputEvent::new(day(14), 20.0).with_estimated(40.0),
        ];

        let events = build(&input);
        assert_eq!(events.len(), 15);

        let last = events.last().unwrap();
        let velocity = last.team(&TeamKey::Default).unwrap().velocity.unwrap();
        assert_eq!(velocity.average, 20.0);
        assert_eq!(last.average_velocities.unwrap().average, 20.0);

        // Projecting from the day-14 boundary: 40 points at 20 per sprint
        let params = crate::ProjectionParams::new(last.date, 14);
        let projection = crate::project_timeline(last, &params);
        assert_eq!(projection.estimated.unwrap().average, day(42));

        // From the following boundary instead
        let next = next_sprint_boundary(boundary(), 14, last.date);
        assert_eq!(next, day(28));
        let projection = crate::project_timeline(last, &crate::ProjectionParams::new(next, 14));
        assert_eq!(projection.estimated.unwrap().average, day(56));
    }

    #[test]
    fn test_builder_from_config_matches_free_function() {
        let config = Configuration::new(boundary())
            .with_days_in_sprint(7)
            .with_points_per_unestimated_item(3.0)
            .with_velocity_window(Some(2));
        let input = vec![
            InputEvent::new(day(0), 2.0).with_unestimated_items(2.0),
            InputEvent::new(day(10), 9.0),
        ];

        let from_config = TimelineBuilder::from_config(&config).build(&input).unwrap();
        let direct = create_timeline_events(&input, 7, boundary(), 3.0, Some(2)).unwrap();
        assert_eq!(from_config, direct);
        assert_eq!(from_config[0].total_points_unestimated, 6.0);
        assert!(from_config[7].is_sprint_boundary);
    }
}
