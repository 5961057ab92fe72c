//! Schedule (solution) model.
//!
//! A [`Schedule`] is the consumer-facing form of an evaluated individual:
//! one row per task with resolved names, instants, assignees, predecessor
//! ids, and pin information. Consumers format instants with
//! [`DATETIME_FORMAT`] at the interface boundary.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::SchedulingContext;
use crate::ga::Individual;

/// Instant format at the interface boundary, `YYYY-MM-DDThh:mm`.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Formats an instant for the interface boundary.
pub fn format_instant(t: NaiveDateTime) -> String {
    t.format(DATETIME_FORMAT).to_string()
}

/// One scheduled task, resolved against the catalogues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledAssignment {
    /// Task identifier.
    pub task_id: String,
    /// Owning project identifier.
    pub project_id: String,
    /// Task display name.
    pub task_name: String,
    /// Project display name.
    pub project_name: String,
    /// Scheduled start; `None` when the task could not be scheduled.
    pub start: Option<NaiveDateTime>,
    /// Scheduled stop; `None` when the task could not be scheduled.
    pub stop: Option<NaiveDateTime>,
    /// Assigned workers in assignment order.
    pub assignees: Vec<String>,
    /// Prerequisite task ids, sorted.
    pub predecessors: Vec<String>,
    /// Names of pinned workers, sorted; empty when unpinned.
    pub pinned_workers: Vec<String>,
    /// Pinned start datetime, if any.
    pub pinned_datetime: Option<NaiveDateTime>,
}

/// A complete schedule decoded from one individual.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    /// Rows in the individual's task order.
    pub rows: Vec<ScheduledAssignment>,
    /// Fitness of the originating individual (hours, or deadend-penalised).
    pub fitness: f64,
    /// Whether every task received its full crew.
    pub feasible: bool,
}

impl Schedule {
    /// Decodes an evaluated individual into consumer-facing rows.
    pub fn from_individual(individual: &Individual, ctx: &SchedulingContext) -> Self {
        let mut rows = Vec::with_capacity(individual.tasks.len());
        let mut feasible = true;

        for scheduled in &individual.tasks {
            let task = ctx.task(&scheduled.task_id);
            let project = task.and_then(|t| ctx.project(&t.project));

            let mut predecessors: Vec<String> = task
                .map(|t| t.prerequisites.keys().cloned().collect())
                .unwrap_or_default();
            predecessors.sort();

            let mut pinned_workers: Vec<String> = task
                .map(|t| {
                    t.pinned_workers
                        .iter()
                        .map(|id| display_name(ctx, id))
                        .collect()
                })
                .unwrap_or_default();
            pinned_workers.sort();

            let ideal = task.map(|t| t.ideal_worker_count).unwrap_or(0);
            if scheduled.assignees.len() != ideal {
                feasible = false;
            }

            rows.push(ScheduledAssignment {
                task_id: scheduled.task_id.clone(),
                project_id: task.map(|t| t.project.clone()).unwrap_or_default(),
                task_name: task.map(|t| t.name.clone()).unwrap_or_default(),
                project_name: project.map(|p| p.name.clone()).unwrap_or_default(),
                start: scheduled.start,
                stop: scheduled.stop,
                assignees: scheduled.assignees.clone(),
                predecessors,
                pinned_workers,
                pinned_datetime: task.and_then(|t| t.pinned_datetime),
            });
        }

        Self {
            rows,
            fitness: individual.fitness,
            feasible,
        }
    }

    /// Hours between schedule start and the latest stop; zero when nothing
    /// was scheduled.
    pub fn makespan_hours(&self, schedule_start: NaiveDateTime) -> f64 {
        self.rows
            .iter()
            .filter_map(|row| row.stop)
            .map(|stop| (stop - schedule_start).num_seconds() as f64 / 3600.0)
            .fold(0.0, f64::max)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the schedule has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn display_name(ctx: &SchedulingContext, worker_id: &str) -> String {
    match ctx.worker(worker_id) {
        Some(worker) if !worker.name.is_empty() => worker.name.clone(),
        _ => worker_id.to_string(),
    }
}
