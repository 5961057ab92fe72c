//! Project familiarity records.
//!
//! A sparse `(project, worker) → hours` map of prior experience. Missing
//! entries mean zero hours.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Prior hours each worker has spent on each project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectFamiliarity {
    entries: HashMap<String, HashMap<String, f64>>,
}

impl ProjectFamiliarity {
    /// Creates an empty familiarity map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `hours` of experience for `worker_id` on `project_id`.
    pub fn set(&mut self, project_id: impl Into<String>, worker_id: impl Into<String>, hours: f64) {
        self.entries
            .entry(project_id.into())
            .or_default()
            .insert(worker_id.into(), hours);
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, project_id: impl Into<String>, worker_id: impl Into<String>, hours: f64) -> Self {
        self.set(project_id, worker_id, hours);
        self
    }

    /// Hours `worker_id` has on `project_id`; zero when unrecorded.
    pub fn hours(&self, project_id: &str, worker_id: &str) -> f64 {
        self.entries
            .get(project_id)
            .and_then(|workers| workers.get(worker_id))
            .copied()
            .unwrap_or(0.0)
    }
}
