//! Input validation for scheduling contexts.
//!
//! Checks structural integrity of the loaded catalogues before the search
//! runs. Detects:
//! - References to unknown projects, workers, or prerequisite tasks
//! - Cycles in the prerequisite graph
//! - Pinned datetimes before schedule start or on non-working days
//! - Two tasks pinned to the identical (datetime, worker-set) pair
//! - Tasks with no crew positions
//!
//! Loaders call [`validate_context`] once and report all errors together;
//! the core never re-checks these properties at runtime.

use std::collections::{HashMap, HashSet};

use crate::models::SchedulingContext;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A task references a project that doesn't exist.
    UnknownProject,
    /// A task references a worker that doesn't exist.
    UnknownWorker,
    /// A task references a prerequisite that doesn't exist.
    MissingPrerequisite,
    /// The prerequisite graph contains a cycle.
    CyclicPrerequisites,
    /// A task has no crew positions to fill.
    EmptyCrew,
    /// A pinned datetime lies before the schedule start.
    PinBeforeScheduleStart,
    /// A pinned datetime falls on a weekend or holiday.
    PinOnNonWorkingDay,
    /// Two tasks pin the identical (datetime, worker-set) pair.
    ConflictingPins,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a scheduling context.
///
/// All checks run; the error list carries every detected issue, not just
/// the first.
pub fn validate_context(ctx: &SchedulingContext) -> ValidationResult {
    let mut errors = Vec::new();

    for task in ctx.tasks.values() {
        if !ctx.projects.contains_key(&task.project) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownProject,
                format!("Task '{}' references unknown project '{}'", task.id, task.project),
            ));
        }

        if task.ideal_worker_count == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyCrew,
                format!("Task '{}' has no crew positions", task.id),
            ));
        }

        let referenced: HashSet<&String> =
            task.valid_workers.iter().chain(task.pinned_workers.iter()).collect();
        for worker_id in referenced {
            if !ctx.workers.contains_key(worker_id) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownWorker,
                    format!("Task '{}' references unknown worker '{}'", task.id, worker_id),
                ));
            }
        }

        for prerequisite in task.prerequisites.keys() {
            if !ctx.tasks.contains_key(prerequisite) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::MissingPrerequisite,
                    format!(
                        "Task '{}' references unknown prerequisite '{}'",
                        task.id, prerequisite
                    ),
                ));
            }
        }

        if let Some(pin) = task.pinned_datetime {
            if pin < ctx.schedule_start {
                errors.push(ValidationError::new(
                    ValidationErrorKind::PinBeforeScheduleStart,
                    format!("Task '{}' is pinned at {} before schedule start", task.id, pin),
                ));
            }
            if let Some(site) = ctx.site_of(task) {
                if !site.is_working_day(pin.date()) {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::PinOnNonWorkingDay,
                        format!("Task '{}' is pinned on non-working day {}", task.id, pin.date()),
                    ));
                }
            }
        }
    }

    check_pin_conflicts(ctx, &mut errors);
    check_cycles(ctx, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Flags two tasks pinned to the exact same (datetime, worker-set) pair.
fn check_pin_conflicts(ctx: &SchedulingContext, errors: &mut Vec<ValidationError>) {
    let mut seen: HashMap<(String, String), &str> = HashMap::new();

    let mut task_ids: Vec<&String> = ctx.tasks.keys().collect();
    task_ids.sort();

    for task_id in task_ids {
        let Some(task) = ctx.tasks.get(task_id) else {
            continue;
        };
        let Some(pin) = task.pinned_datetime else {
            continue;
        };
        if !task.has_pinned_workers() {
            continue;
        }
        let mut workers: Vec<&str> = task.pinned_workers.iter().map(String::as_str).collect();
        workers.sort_unstable();
        let key = (pin.to_string(), workers.join(","));

        if let Some(other) = seen.get(&key) {
            errors.push(ValidationError::new(
                ValidationErrorKind::ConflictingPins,
                format!(
                    "Tasks '{other}' and '{}' pin the same datetime and workers",
                    task.id
                ),
            ));
        } else {
            seen.insert(key, task.id.as_str());
        }
    }
}

/// Detects cycles in the prerequisite graph via Kahn's algorithm.
fn check_cycles(ctx: &SchedulingContext, errors: &mut Vec<ValidationError>) {
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut dependants: HashMap<&str, Vec<&str>> = HashMap::new();

    for task in ctx.tasks.values() {
        in_degree.entry(task.id.as_str()).or_insert(0);
        for prerequisite in task.prerequisites.keys() {
            if !ctx.tasks.contains_key(prerequisite) {
                continue; // already reported as MissingPrerequisite
            }
            *in_degree.entry(task.id.as_str()).or_insert(0) += 1;
            dependants
                .entry(prerequisite.as_str())
                .or_default()
                .push(task.id.as_str());
        }
    }

    let mut ready: Vec<&str> = in_degree
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(&id, _)| id)
        .collect();
    let mut processed = 0usize;

    while let Some(id) = ready.pop() {
        processed += 1;
        for &dependant in dependants.get(id).map(Vec::as_slice).unwrap_or(&[]) {
            if let Some(degree) = in_degree.get_mut(dependant) {
                *degree -= 1;
                if *degree == 0 {
                    ready.push(dependant);
                }
            }
        }
    }

    if processed < ctx.tasks.len() {
        let mut cyclic: Vec<&str> = in_degree
            .iter()
            .filter(|(_, &degree)| degree > 0)
            .map(|(&id, _)| id)
            .collect();
        cyclic.sort_unstable();
        errors.push(ValidationError::new(
            ValidationErrorKind::CyclicPrerequisites,
            format!("Prerequisite cycle involving: {}", cyclic.join(", ")),
        ));
    }
}
