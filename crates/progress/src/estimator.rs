//! Completion date estimation.
//!
//! Projections turn remaining points and a velocity triple into completion
//! dates. Every projected date lands on a sprint boundary; a zero velocity
//! yields [`far_future`] and a missing velocity yields no projection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sprintcast_core::{
    align_to_sprint_boundary, days_since_epoch, far_future, increment_date, next_sprint_boundary,
    Configuration, DateStats, OutputEvent, TeamData, TeamKey, VelocityStats,
    DEFAULT_UNESTIMATED_VELOCITY_FACTORS,
};
use sprintcast_core::calendar::from_days_since_epoch;
use tracing::{debug, trace};

/// Inputs shared by every projection of one timeline day.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionParams {
    /// First sprint boundary from which work is projected
    pub next_sprint_start: NaiveDate,
    /// Sprint length
    pub days_in_sprint: u32,
    /// Low/high multipliers for unestimated work
    pub unestimated_velocity_factors: [f64; 2],
    /// Velocity used instead of each team's measured velocity
    pub velocity_overrides: Option<VelocityStats>,
}

impl ProjectionParams {
    /// Create parameters with the default unestimated factors and no overrides.
    pub fn new(next_sprint_start: NaiveDate, days_in_sprint: u32) -> Self {
        Self {
            next_sprint_start,
            days_in_sprint,
            unestimated_velocity_factors: DEFAULT_UNESTIMATED_VELOCITY_FACTORS,
            velocity_overrides: None,
        }
    }

    /// Take sprint length, factors and overrides from a configuration.
    pub fn from_config(config: &Configuration, next_sprint_start: NaiveDate) -> Self {
        Self {
            next_sprint_start,
            days_in_sprint: config.days_in_sprint,
            unestimated_velocity_factors: config.unestimated_velocity_factors,
            velocity_overrides: config.velocity_overrides,
        }
    }

    /// Set the unestimated work factors.
    pub fn with_unestimated_velocity_factors(mut self, factors: [f64; 2]) -> Self {
        self.unestimated_velocity_factors = factors;
        self
    }

    /// Set the velocity overrides.
    pub fn with_velocity_overrides(mut self, overrides: Option<VelocityStats>) -> Self {
        self.velocity_overrides = overrides;
        self
    }
}

/// Projected dates for one team.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Completion of the estimated backlog
    pub estimated: Option<DateStats>,
    /// Completion of the estimated plus unestimated backlog
    pub remaining: Option<DateStats>,
}

/// Projection of one team inside a timeline projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamProjection {
    /// Team
    pub team: TeamKey,
    /// Dates for that team
    #[serde(flatten)]
    pub projection: Projection,
}

/// Projected dates for a whole timeline day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineProjection {
    /// Day that was projected
    pub date: NaiveDate,
    /// Boundary the projection starts from
    pub next_sprint_start: NaiveDate,
    /// Completion of every team's estimated backlog
    pub estimated: Option<DateStats>,
    /// Completion of every team's estimated plus unestimated backlog
    pub remaining: Option<DateStats>,
    /// Overrides in effect, if any
    pub velocity_overrides: Option<VelocityStats>,
    /// Per-team projections, in team order
    pub teams: Vec<TeamProjection>,
}

/// Date at which `remaining_points` are done at `velocity` points per sprint.
///
/// The result is aligned up to the sprint cadence of `next_sprint_start`.
pub fn project_date(
    next_sprint_start: NaiveDate,
    days_in_sprint: u32,
    remaining_points: f64,
    velocity: f64,
) -> NaiveDate {
    if velocity == 0.0 {
        trace!("Zero velocity, projecting {} points to the far future", remaining_points);
        return far_future();
    }

    let remaining_days = remaining_points * f64::from(days_in_sprint) / velocity;
    if !remaining_days.is_finite() {
        return far_future();
    }

    let completion_date = increment_date(next_sprint_start, remaining_days);
    align_to_sprint_boundary(next_sprint_start, days_in_sprint, completion_date)
}

/// Project `points` under every velocity scenario.
///
/// The highest velocity gives the earliest date (`min`) and the lowest
/// velocity the latest (`max`). Returns `None` when the velocity is missing
/// or zero in every scenario.
pub fn project_points(
    next_sprint_start: NaiveDate,
    days_in_sprint: u32,
    points: f64,
    velocity: Option<VelocityStats>,
) -> Option<DateStats> {
    let velocity = velocity.filter(|v| !v.is_zero())?;
    let project = |v: f64| project_date(next_sprint_start, days_in_sprint, points, v);

    Some(DateStats::new(
        project(velocity.average),
        project(velocity.max),
        project(velocity.min),
    ))
}

/// Project one team's estimated and remaining backlog.
pub fn project_team(team: &TeamData, params: &ProjectionParams) -> Projection {
    let velocity = params.velocity_overrides.or(team.velocity);
    let [low_factor, high_factor] = params.unestimated_velocity_factors;
    let project = |points: f64| {
        project_points(params.next_sprint_start, params.days_in_sprint, points, velocity)
    };

    let estimated = project(team.total_points_estimated);

    let low = project(team.total_points_estimated + team.total_points_unestimated * low_factor);
    let high = project(team.total_points_estimated + team.total_points_unestimated * high_factor);

    // The envelope runs from the best case of the small backlog to the worst
    // case of the large one; its average is the calendar midpoint.
    let remaining = low.zip(high).map(|(low, high)| {
        let midpoint = midpoint_date(low.min, high.max);
        DateStats::new(
            align_to_sprint_boundary(params.next_sprint_start, params.days_in_sprint, midpoint),
            low.min,
            high.max,
        )
    });

    Projection { estimated, remaining }
}

/// Project every team of a timeline day and combine the results.
///
/// Averages are weighted by each team's backlog size; `min` is the earliest
/// team minimum and `max` the latest team maximum.
pub fn project_timeline(event: &OutputEvent, params: &ProjectionParams) -> TimelineProjection {
    let mut estimated = DateAccumulator::default();
    let mut remaining = DateAccumulator::default();
    let mut teams = Vec::with_capacity(event.team_data.len());

    for (team, data) in event.team_data.iter() {
        let projection = project_team(data, params);

        if let Some(dates) = &projection.estimated {
            estimated.add(dates, data.total_points_estimated);
        }

        if let Some(dates) = &projection.remaining {
            remaining.add(dates, data.remaining_points());
        }

        teams.push(TeamProjection {
            team: team.clone(),
            projection,
        });
    }

    let result = TimelineProjection {
        date: event.date,
        next_sprint_start: params.next_sprint_start,
        estimated: estimated.finish(),
        remaining: remaining.finish(),
        velocity_overrides: params.velocity_overrides,
        teams,
    };

    debug!(
        "Projected {} from {}: estimated {:?}, remaining {:?}",
        result.date,
        result.next_sprint_start,
        result.estimated.map(|d| d.average),
        result.remaining.map(|d| d.average),
    );

    result
}

/// Points-weighted combination of per-team date triples.
#[derive(Debug, Default)]
struct DateAccumulator {
    weighted_days: f64,
    points: f64,
    min: Option<NaiveDate>,
    max: Option<NaiveDate>,
}

impl DateAccumulator {
    fn add(&mut self, dates: &DateStats, points: f64) {
        self.weighted_days += days_since_epoch(dates.average) as f64 * points;
        self.points += points;

        if self.min.map_or(true, |min| dates.min < min) {
            self.min = Some(dates.min);
        }
        if self.max.map_or(true, |max| dates.max > max) {
            self.max = Some(dates.max);
        }
    }

    fn finish(self) -> Option<DateStats> {
        let (min, max) = self.min.zip(self.max)?;

        // Without any backlog there is nothing to weight by
        let average = if self.points != 0.0 {
            from_days_since_epoch((self.weighted_days / self.points).floor() as i64)
        } else {
            midpoint_date(min, max)
        };

        Some(DateStats::new(average, min, max))
    }
}

fn midpoint_date(a: NaiveDate, b: NaiveDate) -> NaiveDate {
    from_days_since_epoch((days_since_epoch(a) + days_since_epoch(b)).div_euclid(2))
}

/// Projects timeline days using a fixed configuration.
#[derive(Debug, Clone)]
pub struct CompletionEstimator {
    config: Configuration,
}

impl CompletionEstimator {
    /// Create an estimator.
    pub fn new(config: Configuration) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Parameters for projecting from the first boundary after `date`.
    pub fn params_for(&self, date: NaiveDate) -> ProjectionParams {
        let next = next_sprint_boundary(
            self.config.any_sprint_boundary,
            self.config.days_in_sprint,
            date,
        );

        ProjectionParams::from_config(&self.config, next)
    }

    /// Estimate one team as of `date`.
    pub fn estimate_team(&self, team: &TeamData, date: NaiveDate) -> Projection {
        project_team(team, &self.params_for(date))
    }

    /// Estimate a timeline day from the next sprint boundary after it.
    pub fn estimate(&self, event: &OutputEvent) -> TimelineProjection {
        project_timeline(event, &self.params_for(event.date))
    }

    /// Estimate the most recent day of a timeline.
    pub fn estimate_latest(&self, events: &[OutputEvent]) -> Option<TimelineProjection> {
        events.last().map(|event| self.estimate(event))
    }
}
