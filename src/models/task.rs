//! Task model.
//!
//! A task is a unit of field work belonging to one project. Tasks carry
//! their eligibility set (which workers may do them), prerequisite edges
//! with signed lag hours, and optional hard pins on a start datetime or on
//! specific workers.
//!
//! # Identity
//! Task identifiers are composed as `<project-id>.<local-id>` so that
//! prerequisite references stay unambiguous across projects.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A schedulable task.
///
/// The scheduler fills `ideal_worker_count` assignee positions; the min/max
/// counts are carried for planning systems that use them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, `<project-id>.<local-id>`.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Owning project identifier.
    pub project: String,
    /// Workers eligible for this task.
    pub valid_workers: HashSet<String>,
    /// Prerequisite task identifier → lag hours. Positive lag delays this
    /// task after the predecessor stops; negative lag is a lead.
    pub prerequisites: HashMap<String, f64>,
    /// Working duration in hours.
    pub duration: f64,
    /// Number of assignee positions the scheduler fills.
    pub ideal_worker_count: usize,
    /// Minimum viable crew size (advisory).
    pub min_worker_count: usize,
    /// Maximum useful crew size (advisory).
    pub max_worker_count: usize,
    /// Hard pin on the start datetime.
    pub pinned_datetime: Option<NaiveDateTime>,
    /// Hard pin on assignee identity; empty means unpinned.
    pub pinned_workers: HashSet<String>,
}

impl Task {
    /// Creates a task `<project>.<local_id>` with a one-worker crew.
    pub fn new(project: impl Into<String>, local_id: &str) -> Self {
        let project = project.into();
        Self {
            id: format!("{project}.{local_id}"),
            name: String::new(),
            project,
            valid_workers: HashSet::new(),
            prerequisites: HashMap::new(),
            duration: 0.0,
            ideal_worker_count: 1,
            min_worker_count: 1,
            max_worker_count: 1,
            pinned_datetime: None,
            pinned_workers: HashSet::new(),
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the working duration in hours.
    pub fn with_duration(mut self, hours: f64) -> Self {
        self.duration = hours;
        self
    }

    /// Adds an eligible worker.
    pub fn with_valid_worker(mut self, worker_id: impl Into<String>) -> Self {
        self.valid_workers.insert(worker_id.into());
        self
    }

    /// Adds eligible workers.
    pub fn with_valid_workers<I, S>(mut self, worker_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_workers.extend(worker_ids.into_iter().map(Into::into));
        self
    }

    /// Adds a prerequisite on a task of the same project, by local id.
    pub fn with_prerequisite(mut self, local_id: &str, lag_hours: f64) -> Self {
        self.prerequisites
            .insert(format!("{}.{local_id}", self.project), lag_hours);
        self
    }

    /// Sets the crew sizing.
    pub fn with_worker_counts(mut self, ideal: usize, min: usize, max: usize) -> Self {
        self.ideal_worker_count = ideal;
        self.min_worker_count = min;
        self.max_worker_count = max;
        self
    }

    /// Pins the start datetime.
    pub fn pinned_at(mut self, datetime: NaiveDateTime) -> Self {
        self.pinned_datetime = Some(datetime);
        self
    }

    /// Pins an assignee position to a specific worker.
    pub fn with_pinned_worker(mut self, worker_id: impl Into<String>) -> Self {
        self.pinned_workers.insert(worker_id.into());
        self
    }

    /// Whether assignee identity is pinned.
    pub fn has_pinned_workers(&self) -> bool {
        !self.pinned_workers.is_empty()
    }
}
