//! AHP worker scoring.
//!
//! For one task, every worker receives four normalised sub-scores —
//! idleness, project familiarity, proximity, and inverse demand — combined
//! into a single weighted fitness (higher = better fit). The schedule
//! builder then walks workers in descending fitness order.
//!
//! Sub-score conventions:
//! - a worker idle since schedule start scores `maxValueDelay`, otherwise
//!   the reciprocal of the hours they have been busy;
//! - a co-located worker scores `maxValueDriving`, otherwise the reciprocal
//!   of the driving time (so the builder can recover the driving hours as
//!   `1 / value_driving`);
//! - familiarity is the raw prior hours on the task's project;
//! - demand is inverted so specialists outrank generalists, with zero-demand
//!   workers scoring zero.
//!
//! A worker pinned by the task scores `+∞`, forcing selection ahead of any
//! unpinned candidate.

use crate::ga::ScheduledWorker;
use crate::models::{SchedulingContext, Task};

/// Scores every worker against `task`, updating the `value_*` sub-scores
/// and combined `fitness` in place.
pub fn score_workers(task: &Task, workers: &mut [ScheduledWorker], ctx: &SchedulingContext) {
    let config = &ctx.config;
    let Some(project) = ctx.project(&task.project) else {
        return;
    };

    for state in workers.iter_mut() {
        let busy_hours =
            (state.available_at - ctx.schedule_start).num_seconds() as f64 / 3600.0;
        let value_delay = if busy_hours <= 0.0 {
            config.max_value_delay
        } else {
            1.0 / busy_hours
        };

        let value_familiarity = ctx.familiarity.hours(&task.project, &state.worker_id);

        let driving_hours = crate::geo::driving_time_hours(
            state.latitude,
            state.longitude,
            project.latitude,
            project.longitude,
            config.earth_radius_km,
            config.driving_speed_kmh,
        );
        let value_driving = if driving_hours == 0.0 {
            config.max_value_driving
        } else {
            1.0 / driving_hours
        };

        let demand = ctx
            .worker(&state.worker_id)
            .map(|w| w.demand)
            .unwrap_or(0.0);
        let value_demand = if demand == 0.0 { 0.0 } else { 1.0 / demand };

        state.value_delay = value_delay;
        state.value_familiarity = value_familiarity;
        state.value_driving = value_driving;
        state.value_demand = value_demand;

        state.fitness = if task.pinned_workers.contains(&state.worker_id) {
            f64::INFINITY
        } else {
            value_delay * config.weight_delay
                + value_familiarity * config.weight_project_familiarity
                + value_driving * config.weight_distance
                + value_demand * config.weight_demand
        };
    }
}
