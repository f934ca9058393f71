//! Per-team sprint velocity history.

use sprintcast_core::VelocityStats;

/// Rolling record of sprint-over-sprint completed-point deltas for one team.
///
/// Updated once per sprint boundary. A boundary where the team reported
/// nothing is kept as a gap so the window still advances.
#[derive(Debug, Clone)]
pub struct VelocityTracker {
    /// Deltas in boundary order; `None` marks a boundary without data
    deltas: Vec<Option<f64>>,
    /// Cumulative completed points at the last boundary with data
    previous_total: Option<f64>,
    /// Number of trailing boundaries considered (None = all)
    window: Option<usize>,
    /// Statistics over the current window
    stats: VelocityStats,
}

impl VelocityTracker {
    /// Create a tracker seeded with the team's first cumulative total.
    ///
    /// The first delta is the total itself.
    pub fn new(window: Option<usize>, total_points_completed: f64) -> Self {
        let mut tracker = Self {
            deltas: Vec::new(),
            previous_total: None,
            window,
            stats: VelocityStats::new(0.0, 0.0, 0.0),
        };

        tracker.update(Some(total_points_completed));
        tracker
    }

    /// Record one sprint boundary and return the refreshed statistics.
    pub fn update(&mut self, total_points_completed: Option<f64>) -> VelocityStats {
        match total_points_completed {
            Some(total) => {
                self.deltas.push(Some(total - self.previous_total.unwrap_or(0.0)));
                self.previous_total = Some(total);
            }
            None => self.deltas.push(None),
        }

        self.stats = self.calculate();
        self.stats
    }

    /// Statistics as of the last update.
    pub fn stats(&self) -> VelocityStats {
        self.stats
    }

    /// Every recorded delta, oldest first.
    pub fn history(&self) -> &[Option<f64>] {
        &self.deltas
    }

    /// Configured window.
    pub fn window(&self) -> Option<usize> {
        self.window
    }

    /// Deltas inside the trailing window.
    fn windowed(&self) -> &[Option<f64>] {
        let start = match self.window {
            Some(window) if self.deltas.len() > window => self.deltas.len() - window,
            _ => 0,
        };

        &self.deltas[start..]
    }

    // Zero deltas are left out of the sprint count and the minimum, not the maximum.
    fn calculate(&self) -> VelocityStats {
        let mut total = 0.0;
        let mut sprints = 0usize;
        let mut min: Option<f64> = None;
        let mut max: Option<f64> = None;

        for delta in self.windowed().iter().flatten().copied() {
            total += delta;

            if delta != 0.0 {
                sprints += 1;

                if min.map_or(true, |m| delta < m) {
                    min = Some(delta);
                }
            }

            if max.map_or(true, |m| delta > m) {
                max = Some(delta);
            }
        }

        let average = if sprints > 0 { total / sprints as f64 } else { 0.0 };
        let max = max.unwrap_or(0.0);

        VelocityStats::new(average, min.unwrap_or(max), max)
    }
}
