//! Individual: a candidate schedule in the evolutionary search.
//!
//! # Encoding
//!
//! The genotype is a permutation of all task ids; the order is the priority
//! in which the greedy builder considers tasks. Everything else on the
//! individual — tentative start/stop instants, assignees, worker state —
//! is derived during evaluation and rebuilt from scratch each generation.
//!
//! Individuals are deduplicated by a 64-bit FNV-1a fingerprint of the
//! comma-joined task-id sequence.

use chrono::NaiveDateTime;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::SchedulingContext;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Per-individual mutable state of one task slot.
///
/// `start`/`stop`/`assignees` are outputs of evaluation; only `task_id`
/// (the gene) survives a reset.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    /// Catalogue task this slot schedules.
    pub task_id: String,
    /// Tentative start; `None` until a worker or predecessor sets it.
    pub start: Option<NaiveDateTime>,
    /// Tentative stop; `None` until the first worker is assigned.
    pub stop: Option<NaiveDateTime>,
    /// Assigned workers in assignment order.
    pub assignees: Vec<String>,
    /// Prerequisites whose crews are not yet complete.
    pub open_prerequisites: usize,
}

/// Per-individual mutable state of one worker.
///
/// Workers move with their assignments: `latitude`/`longitude` track the
/// location of the last assigned project, and `available_at` the instant
/// the worker is free again. The `value_*` fields hold the AHP sub-scores
/// of the most recent scoring round.
#[derive(Debug, Clone)]
pub struct ScheduledWorker {
    /// Catalogue worker this state belongs to.
    pub worker_id: String,
    /// Earliest instant this worker can take another assignment.
    pub available_at: NaiveDateTime,
    /// Current latitude in degrees.
    pub latitude: f64,
    /// Current longitude in degrees.
    pub longitude: f64,
    /// Combined AHP fitness of the last scoring round (higher = better fit).
    pub fitness: f64,
    /// Idleness sub-score.
    pub value_delay: f64,
    /// Proximity sub-score.
    pub value_driving: f64,
    /// Experience sub-score.
    pub value_familiarity: f64,
    /// Specialisation sub-score.
    pub value_demand: f64,
}

/// One candidate solution: task permutation, derived worker states, and the
/// scalar fitness (hours of makespan, deadend-penalised when infeasible).
///
/// Lower fitness is better.
#[derive(Debug, Clone)]
pub struct Individual {
    /// Task slots in permutation order.
    pub tasks: Vec<ScheduledTask>,
    /// Worker states, one per catalogue worker.
    pub workers: Vec<ScheduledWorker>,
    /// Evaluated fitness; `f64::INFINITY` before evaluation.
    pub fitness: f64,
}

impl Individual {
    /// Creates an individual from an explicit task-id permutation.
    pub fn from_permutation(ctx: &SchedulingContext, permutation: Vec<String>) -> Self {
        let tasks = permutation
            .into_iter()
            .map(|task_id| {
                let open = ctx.task(&task_id).map(|t| t.prerequisites.len()).unwrap_or(0);
                ScheduledTask {
                    task_id,
                    start: None,
                    stop: None,
                    assignees: Vec::new(),
                    open_prerequisites: open,
                }
            })
            .collect();

        let workers = ctx
            .worker_ids()
            .into_iter()
            .filter_map(|id| ctx.worker(&id).cloned())
            .map(|worker| ScheduledWorker {
                worker_id: worker.id,
                available_at: ctx.schedule_start,
                latitude: worker.latitude,
                longitude: worker.longitude,
                fitness: 0.0,
                value_delay: 0.0,
                value_driving: 0.0,
                value_familiarity: 0.0,
                value_demand: 0.0,
            })
            .collect();

        Self {
            tasks,
            workers,
            fitness: f64::INFINITY,
        }
    }

    /// Creates an individual with a uniformly random task permutation.
    pub fn random<R: Rng>(ctx: &SchedulingContext, rng: &mut R) -> Self {
        let mut permutation = ctx.task_ids();
        permutation.shuffle(rng);
        Self::from_permutation(ctx, permutation)
    }

    /// The task-id permutation (the genotype).
    pub fn permutation(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.task_id.clone()).collect()
    }

    /// Clears all derived state so the builder can re-simulate.
    ///
    /// Task slots lose start/stop/assignees and regain their prerequisite
    /// counters; workers return to their home coordinates with
    /// `available_at` at schedule start.
    pub fn reset(&mut self, ctx: &SchedulingContext) {
        for slot in &mut self.tasks {
            slot.start = None;
            slot.stop = None;
            slot.assignees.clear();
            slot.open_prerequisites = ctx
                .task(&slot.task_id)
                .map(|t| t.prerequisites.len())
                .unwrap_or(0);
        }
        for state in &mut self.workers {
            if let Some(worker) = ctx.worker(&state.worker_id) {
                state.latitude = worker.latitude;
                state.longitude = worker.longitude;
            }
            state.available_at = ctx.schedule_start;
            state.fitness = 0.0;
            state.value_delay = 0.0;
            state.value_driving = 0.0;
            state.value_familiarity = 0.0;
            state.value_demand = 0.0;
        }
        self.fitness = f64::INFINITY;
    }

    /// FNV-1a-64 fingerprint of the permutation, for deduplication.
    pub fn fingerprint(&self) -> u64 {
        let mut hash = FNV_OFFSET_BASIS;
        for (i, slot) in self.tasks.iter().enumerate() {
            if i > 0 {
                hash = fnv1a_step(hash, b",");
            }
            hash = fnv1a_step(hash, slot.task_id.as_bytes());
        }
        hash
    }
}

/// Fingerprint of a bare permutation, identical to
/// [`Individual::fingerprint`] for the same id sequence.
pub fn fingerprint_permutation<S: AsRef<str>>(permutation: &[S]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for (i, id) in permutation.iter().enumerate() {
        if i > 0 {
            hash = fnv1a_step(hash, b",");
        }
        hash = fnv1a_step(hash, id.as_ref().as_bytes());
    }
    hash
}

fn fnv1a_step(mut hash: u64, bytes: &[u8]) -> u64 {
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProjectFamiliarity, Project, Site, Task, Worker};
    use chrono::NaiveDateTime;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").unwrap()
    }

    fn sample_context() -> crate::models::SchedulingContext {
        let site = Site::working_hours(8, 16);
        let projects = vec![Project::new("P1", site)];
        let tasks = vec![
            Task::new("P1", "T1").with_valid_worker("W1").with_duration(2.0),
            Task::new("P1", "T2")
                .with_valid_worker("W1")
                .with_duration(2.0)
                .with_prerequisite("T1", 0.0),
            Task::new("P1", "T3").with_valid_worker("W1").with_duration(2.0),
        ];
        let workers = vec![Worker::new("W1").at_location(52.0, 13.0)];
        crate::models::SchedulingContext::new(
            projects,
            tasks,
            workers,
            ProjectFamiliarity::new(),
            dt("2020-12-21T08:00"),
        )
    }

    #[test]
    fn test_random_individual_is_permutation() {
        let ctx = sample_context();
        let mut rng = SmallRng::seed_from_u64(42);
        let individual = Individual::random(&ctx, &mut rng);

        let ids: HashSet<String> = individual.permutation().into_iter().collect();
        let expected: HashSet<String> = ctx.task_ids().into_iter().collect();
        assert_eq!(ids, expected);
        assert_eq!(individual.fitness, f64::INFINITY);
    }

    #[test]
    fn test_prerequisite_counters_seeded() {
        let ctx = sample_context();
        let individual = Individual::from_permutation(&ctx, ctx.task_ids());
        let t2 = individual
            .tasks
            .iter()
            .find(|t| t.task_id == "P1.T2")
            .unwrap();
        assert_eq!(t2.open_prerequisites, 1);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let ctx = sample_context();
        let mut individual = Individual::from_permutation(&ctx, ctx.task_ids());

        individual.tasks[0].start = Some(dt("2020-12-21T09:00"));
        individual.tasks[0].assignees.push("W1".into());
        individual.workers[0].available_at = dt("2020-12-22T08:00");
        individual.workers[0].latitude = 0.0;
        individual.fitness = 12.0;

        individual.reset(&ctx);

        assert!(individual.tasks[0].start.is_none());
        assert!(individual.tasks[0].assignees.is_empty());
        assert_eq!(individual.workers[0].available_at, ctx.schedule_start);
        assert_eq!(individual.workers[0].latitude, 52.0);
        assert_eq!(individual.fitness, f64::INFINITY);
    }

    #[test]
    fn test_fingerprint_is_order_sensitive() {
        let ctx = sample_context();
        let forward = Individual::from_permutation(&ctx, ctx.task_ids());
        let mut reversed_ids = ctx.task_ids();
        reversed_ids.reverse();
        let reversed = Individual::from_permutation(&ctx, reversed_ids);

        assert_ne!(forward.fingerprint(), reversed.fingerprint());
    }

    #[test]
    fn test_fingerprint_matches_bare_permutation() {
        let ctx = sample_context();
        let individual = Individual::from_permutation(&ctx, ctx.task_ids());
        assert_eq!(
            individual.fingerprint(),
            fingerprint_permutation(&ctx.task_ids())
        );
    }

    #[test]
    fn test_fingerprint_stable_across_clone() {
        let ctx = sample_context();
        let individual = Individual::from_permutation(&ctx, ctx.task_ids());
        assert_eq!(individual.fingerprint(), individual.clone().fingerprint());
    }

    #[test]
    fn test_fnv_reference_vector() {
        // FNV-1a("a") per the published reference implementation.
        assert_eq!(fingerprint_permutation(&["a"]), 0xaf63_dc4c_8601_ec8c);
    }
}
