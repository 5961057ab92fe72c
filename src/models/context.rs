//! Scheduling context.
//!
//! [`SchedulingContext`] bundles the immutable catalogues, the schedule
//! start instant, and the configuration into one read-only handle that the
//! schedule builder, the AHP scorer, and the evolution engine share. Nothing
//! in the crate keeps module-level state; every component reads this handle.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Project, ProjectFamiliarity, Site, Task, Worker};
use crate::config::SchedulerConfig;

/// Immutable inputs of one scheduling run.
///
/// Construction derives each worker's demand score from the task catalogue:
/// the number of tasks the worker is valid for divided by the total task
/// count. Loaders therefore never need to precompute demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingContext {
    /// Project catalogue keyed by project id.
    pub projects: HashMap<String, Project>,
    /// Task catalogue keyed by task id.
    pub tasks: HashMap<String, Task>,
    /// Worker catalogue keyed by worker id.
    pub workers: HashMap<String, Worker>,
    /// Prior experience records.
    pub familiarity: ProjectFamiliarity,
    /// Instant the schedule starts at, in site-local time.
    pub schedule_start: NaiveDateTime,
    /// Run configuration.
    pub config: SchedulerConfig,
}

impl SchedulingContext {
    /// Builds a context from loaded catalogues and derives worker demand.
    pub fn new(
        projects: Vec<Project>,
        tasks: Vec<Task>,
        workers: Vec<Worker>,
        familiarity: ProjectFamiliarity,
        schedule_start: NaiveDateTime,
    ) -> Self {
        let mut ctx = Self {
            projects: projects.into_iter().map(|p| (p.id.clone(), p)).collect(),
            tasks: tasks.into_iter().map(|t| (t.id.clone(), t)).collect(),
            workers: workers.into_iter().map(|w| (w.id.clone(), w)).collect(),
            familiarity,
            schedule_start,
            config: SchedulerConfig::default(),
        };
        ctx.derive_demand();
        ctx
    }

    /// Replaces the configuration and applies its end-time rounding
    /// granularity to every site calendar.
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        for project in self.projects.values_mut() {
            project.site.rounding_secs = config.time_rounding_seconds;
        }
        self.config = config;
        self
    }

    /// Looks up a task by id.
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Looks up a worker by id.
    pub fn worker(&self, id: &str) -> Option<&Worker> {
        self.workers.get(id)
    }

    /// Looks up a project by id.
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.get(id)
    }

    /// The site calendar governing a task, via its owning project.
    pub fn site_of(&self, task: &Task) -> Option<&Site> {
        self.projects.get(&task.project).map(|p| &p.site)
    }

    /// Task ids in a stable (sorted) order, the base for random permutations.
    pub fn task_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.tasks.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Worker ids in a stable (sorted) order.
    pub fn worker_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.workers.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn derive_demand(&mut self) {
        let total = self.tasks.len();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for task in self.tasks.values() {
            for worker_id in &task.valid_workers {
                *counts.entry(worker_id.as_str()).or_insert(0) += 1;
            }
        }
        for worker in self.workers.values_mut() {
            let eligible = counts.get(worker.id.as_str()).copied().unwrap_or(0);
            worker.demand = if total == 0 {
                0.0
            } else {
                eligible as f64 / total as f64
            };
        }
    }
}
