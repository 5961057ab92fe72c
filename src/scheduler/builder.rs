//! Greedy schedule builder.
//!
//! The fitness function of the evolutionary search. Given an individual's
//! task permutation, the builder simulates the schedule: it walks the tasks
//! in permutation order, fills each task's crew with the best-scoring
//! eligible workers (AHP, see [`super::ahp`]), threads every start/stop
//! through the site working calendar, honours datetime and worker pins, and
//! releases dependants as crews complete.
//!
//! The outer loop repeats full passes until one assigns no new workers.
//! Each pass either grows some crew (monotone, bounded by the total crew
//! demand) or reaches a fixed point, so termination is guaranteed.
//!
//! Fitness is the makespan in hours; every task whose crew stayed
//! incomplete adds the `deadend` penalty so infeasible individuals always
//! rank behind feasible ones.

use chrono::Duration;

use super::ahp;
use crate::ga::Individual;
use crate::models::{SchedulingContext, Task};

/// Rounds hours up at the second decimal (36-second granularity), the
/// precision at which driving time is recovered from its AHP sub-score.
pub(crate) fn ceil_2dp(hours: f64) -> f64 {
    (hours * 100.0).ceil() / 100.0
}

/// Simulates schedules for individuals against one scheduling context.
pub struct ScheduleBuilder<'a> {
    ctx: &'a SchedulingContext,
}

impl<'a> ScheduleBuilder<'a> {
    /// Creates a builder over the shared context.
    pub fn new(ctx: &'a SchedulingContext) -> Self {
        Self { ctx }
    }

    /// Resets the individual's derived state, simulates the greedy schedule,
    /// and stores and returns the fitness.
    ///
    /// Evaluation is deterministic: the same permutation against the same
    /// context always yields the same schedule and fitness.
    pub fn evaluate(&self, individual: &mut Individual) -> f64 {
        individual.reset(self.ctx);

        let mut assigned_any = true;
        while assigned_any {
            assigned_any = false;

            for index in 0..individual.tasks.len() {
                let task_id = individual.tasks[index].task_id.clone();
                let Some(task) = self.ctx.task(&task_id) else {
                    continue;
                };
                if individual.tasks[index].assignees.len() >= task.ideal_worker_count {
                    continue;
                }
                if individual.tasks[index].open_prerequisites > 0 {
                    continue;
                }

                while individual.tasks[index].assignees.len() < task.ideal_worker_count {
                    ahp::score_workers(task, &mut individual.workers, self.ctx);
                    if !self.assign_best_worker(individual, index, task) {
                        // No eligible worker fits; retry on a later pass.
                        break;
                    }
                    assigned_any = true;
                }

                if individual.tasks[index].assignees.len() == task.ideal_worker_count {
                    self.propagate_completion(individual, index);
                }
            }
        }

        individual.fitness = self.fitness_of(individual);
        individual.fitness
    }

    /// Assigns the best-scoring eligible worker to one crew position.
    ///
    /// Returns `false` when no worker is eligible, leaving the position
    /// empty for this pass.
    fn assign_best_worker(&self, individual: &mut Individual, index: usize, task: &Task) -> bool {
        let Some(project) = self.ctx.project(&task.project) else {
            return false;
        };
        let site = &project.site;
        let snap = self.ctx.config.pinned_datetime_snap;

        let mut order: Vec<usize> = (0..individual.workers.len()).collect();
        order.sort_unstable_by(|&a, &b| {
            individual.workers[b]
                .fitness
                .partial_cmp(&individual.workers[a].fitness)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        for wi in order {
            let state = &individual.workers[wi];
            if task.has_pinned_workers() && !task.pinned_workers.contains(&state.worker_id) {
                continue;
            }
            if !task.valid_workers.contains(&state.worker_id) {
                continue;
            }

            // Availability pushed past any time-off block, then the drive.
            let available = self
                .ctx
                .worker(&state.worker_id)
                .map(|w| w.next_free(state.available_at))
                .unwrap_or(state.available_at);
            let driving_hours = if state.value_driving > 0.0 {
                ceil_2dp(1.0 / state.value_driving)
            } else {
                0.0
            };
            let candidate_start = site.add_hours(available, driving_hours);

            let start = match task.pinned_datetime {
                Some(pin) => {
                    // The candidate start must lie in the forward snap window
                    // anchored at the pin; the start is then forced onto it.
                    let window_edge = site.add_hours(candidate_start, snap);
                    if !(pin <= window_edge && window_edge < site.add_hours(pin, snap)) {
                        continue;
                    }
                    pin
                }
                None => {
                    let slot = &individual.tasks[index];
                    match (slot.start, slot.stop) {
                        // First worker, no predecessor pressure.
                        (None, _) => candidate_start,
                        // Predecessors set the start but no worker has
                        // committed yet; a late worker pushes it out.
                        (Some(start), None) if candidate_start > start => candidate_start,
                        (Some(start), _) => start,
                    }
                }
            };

            let finish = site.add_hours(start, task.duration);
            let slot = &mut individual.tasks[index];
            slot.start = Some(start);
            let stop = match slot.stop {
                Some(existing) if existing > finish => existing,
                _ => finish,
            };
            slot.stop = Some(stop);

            let worker_id = individual.workers[wi].worker_id.clone();
            individual.tasks[index].assignees.push(worker_id);

            let state = &mut individual.workers[wi];
            state.available_at = stop;
            state.latitude = project.latitude;
            state.longitude = project.longitude;
            return true;
        }

        false
    }

    /// Releases dependants of a task whose crew just completed: decrements
    /// their prerequisite counters and raises their start to the completed
    /// stop plus lag where that is later.
    fn propagate_completion(&self, individual: &mut Individual, index: usize) {
        let completed_id = individual.tasks[index].task_id.clone();
        let Some(stop) = individual.tasks[index].stop else {
            return;
        };
        let site = self
            .ctx
            .task(&completed_id)
            .and_then(|t| self.ctx.site_of(t));
        let Some(site) = site else {
            return;
        };

        for dj in 0..individual.tasks.len() {
            if individual.tasks[dj].open_prerequisites == 0 {
                continue;
            }
            let Some(dependant) = self.ctx.task(&individual.tasks[dj].task_id) else {
                continue;
            };
            let Some(&lag) = dependant.prerequisites.get(&completed_id) else {
                continue;
            };

            individual.tasks[dj].open_prerequisites -= 1;

            // Positive lag accrues in working time; a lead (negative lag)
            // backs off wall-clock from the predecessor's stop.
            let candidate = if lag >= 0.0 {
                site.add_hours(stop, lag)
            } else {
                stop + Duration::milliseconds((lag * 3_600_000.0) as i64)
            };
            match individual.tasks[dj].start {
                Some(existing) if candidate <= existing => {}
                _ => individual.tasks[dj].start = Some(candidate),
            }
        }
    }

    /// Makespan in hours, plus the deadend penalty per incomplete crew.
    fn fitness_of(&self, individual: &Individual) -> f64 {
        let mut unscheduled = 0usize;
        let mut makespan = 0.0f64;

        for slot in &individual.tasks {
            let ideal = self
                .ctx
                .task(&slot.task_id)
                .map(|t| t.ideal_worker_count)
                .unwrap_or(0);
            if slot.assignees.len() != ideal {
                unscheduled += 1;
            }
            if let Some(stop) = slot.stop {
                let hours = (stop - self.ctx.schedule_start).num_seconds() as f64 / 3600.0;
                makespan = makespan.max(hours);
            }
        }

        if unscheduled == 0 {
            makespan
        } else {
            unscheduled as f64 * self.ctx.config.deadend + makespan
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Project, ProjectFamiliarity, Site, Worker};
    use chrono::NaiveDateTime;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").unwrap()
    }

    // Monday 2020-12-21, 08:00-16:00 working window.
    fn context(tasks: Vec<Task>, workers: Vec<Worker>) -> SchedulingContext {
        let site = Site::working_hours(8, 16);
        let projects = vec![Project::new("P1", site).at_location(0.0, 0.0)];
        SchedulingContext::new(
            projects,
            tasks,
            workers,
            ProjectFamiliarity::new(),
            dt("2020-12-21T08:00"),
        )
    }

    fn slot<'a>(individual: &'a Individual, id: &str) -> &'a crate::ga::ScheduledTask {
        individual.tasks.iter().find(|t| t.task_id == id).unwrap()
    }

    #[test]
    fn test_ceil_2dp() {
        assert_eq!(ceil_2dp(0.001), 0.01);
        assert_eq!(ceil_2dp(0.01), 0.01);
        assert_eq!(ceil_2dp(5.5608), 5.57);
        assert_eq!(ceil_2dp(2.0), 2.0);
    }

    #[test]
    fn test_single_task_single_worker() {
        let tasks = vec![Task::new("P1", "T1").with_duration(2.0).with_valid_worker("W1")];
        let workers = vec![Worker::new("W1").at_location(0.0, 0.0)];
        let ctx = context(tasks, workers);

        let mut individual = Individual::from_permutation(&ctx, ctx.task_ids());
        let fitness = ScheduleBuilder::new(&ctx).evaluate(&mut individual);

        let t1 = slot(&individual, "P1.T1");
        // Co-located worker: 0.01 h drive, rounded up to the 10-minute grid.
        assert_eq!(t1.start, Some(dt("2020-12-21T08:10")));
        assert_eq!(t1.stop, Some(dt("2020-12-21T10:10")));
        assert_eq!(t1.assignees, vec!["W1".to_string()]);
        assert!((fitness - 2.1666).abs() < 1e-3, "fitness {fitness}");
    }

    #[test]
    fn test_worker_state_moves_with_assignment() {
        let tasks = vec![Task::new("P1", "T1").with_duration(2.0).with_valid_worker("W1")];
        let workers = vec![Worker::new("W1").at_location(1.0, 0.0)];
        let ctx = context(tasks, workers);

        let mut individual = Individual::from_permutation(&ctx, ctx.task_ids());
        ScheduleBuilder::new(&ctx).evaluate(&mut individual);

        let state = &individual.workers[0];
        assert_eq!(state.latitude, 0.0); // moved to the project site
        assert_eq!(state.available_at, slot(&individual, "P1.T1").stop.unwrap());
    }

    #[test]
    fn test_prerequisite_with_lag() {
        let tasks = vec![
            Task::new("P1", "T1").with_duration(4.0).with_valid_worker("W1"),
            Task::new("P1", "T2")
                .with_duration(4.0)
                .with_valid_worker("W1")
                .with_prerequisite("T1", 1.0),
        ];
        let workers = vec![Worker::new("W1").at_location(0.0, 0.0)];
        let ctx = context(tasks, workers);

        let mut individual = Individual::from_permutation(&ctx, ctx.task_ids());
        ScheduleBuilder::new(&ctx).evaluate(&mut individual);

        let t1 = slot(&individual, "P1.T1");
        let t2 = slot(&individual, "P1.T2");
        let site = &ctx.project("P1").unwrap().site;
        assert_eq!(t2.start, Some(site.add_hours(t1.stop.unwrap(), 1.0)));
        assert!(t2.start.unwrap() >= t1.stop.unwrap());
    }

    #[test]
    fn test_lead_time_does_not_precede_unset_start() {
        let tasks = vec![
            Task::new("P1", "T1").with_duration(4.0).with_valid_worker("W1"),
            Task::new("P1", "T2")
                .with_duration(2.0)
                .with_valid_worker("W2")
                .with_prerequisite("T1", -1.0),
        ];
        let workers = vec![
            Worker::new("W1").at_location(0.0, 0.0),
            Worker::new("W2").at_location(0.0, 0.0),
        ];
        let ctx = context(tasks, workers);

        let mut individual = Individual::from_permutation(&ctx, ctx.task_ids());
        ScheduleBuilder::new(&ctx).evaluate(&mut individual);

        let t1 = slot(&individual, "P1.T1");
        let t2 = slot(&individual, "P1.T2");
        // The lead places T2's earliest start one wall-clock hour before T1
        // stops; W2 is free all along, so the lead start holds.
        assert_eq!(
            t2.start,
            Some(t1.stop.unwrap() - chrono::Duration::hours(1))
        );
    }

    #[test]
    fn test_multi_worker_crew() {
        let tasks = vec![
            Task::new("P1", "T1")
                .with_duration(4.0)
                .with_worker_counts(2, 1, 3)
                .with_valid_workers(["W1", "W2"]),
        ];
        let workers = vec![
            Worker::new("W1").at_location(0.0, 0.0),
            Worker::new("W2").at_location(0.0, 0.0),
        ];
        let ctx = context(tasks, workers);

        let mut individual = Individual::from_permutation(&ctx, ctx.task_ids());
        let fitness = ScheduleBuilder::new(&ctx).evaluate(&mut individual);

        let t1 = slot(&individual, "P1.T1");
        assert_eq!(t1.assignees.len(), 2);
        assert!(fitness < ctx.config.deadend);
        // Both workers end up busy until the common stop.
        for state in &individual.workers {
            assert_eq!(state.available_at, t1.stop.unwrap());
        }
    }

    #[test]
    fn test_unfillable_task_is_deadend() {
        let tasks = vec![
            Task::new("P1", "T1").with_duration(2.0), // no valid workers
        ];
        let workers = vec![Worker::new("W1")];
        let ctx = context(tasks, workers);

        let mut individual = Individual::from_permutation(&ctx, ctx.task_ids());
        let fitness = ScheduleBuilder::new(&ctx).evaluate(&mut individual);

        assert_eq!(fitness, ctx.config.deadend);
        assert!(slot(&individual, "P1.T1").assignees.is_empty());
    }

    #[test]
    fn test_dependant_of_unfillable_task_stays_blocked() {
        let tasks = vec![
            Task::new("P1", "T1").with_duration(2.0), // unfillable
            Task::new("P1", "T2")
                .with_duration(2.0)
                .with_valid_worker("W1")
                .with_prerequisite("T1", 0.0),
        ];
        let workers = vec![Worker::new("W1").at_location(0.0, 0.0)];
        let ctx = context(tasks, workers);

        let mut individual = Individual::from_permutation(&ctx, ctx.task_ids());
        let fitness = ScheduleBuilder::new(&ctx).evaluate(&mut individual);

        let t2 = slot(&individual, "P1.T2");
        assert_eq!(t2.open_prerequisites, 1);
        assert!(t2.assignees.is_empty());
        assert_eq!(fitness, 2.0 * ctx.config.deadend);
    }

    #[test]
    fn test_pinned_datetime_within_snap_window() {
        let pin = dt("2020-12-21T10:00");
        let tasks = vec![
            Task::new("P1", "T1")
                .with_duration(2.0)
                .with_valid_worker("W1")
                .pinned_at(pin),
        ];
        let workers = vec![Worker::new("W1").at_location(0.0, 0.0)];
        let ctx = context(tasks, workers);

        let mut individual = Individual::from_permutation(&ctx, ctx.task_ids());
        let fitness = ScheduleBuilder::new(&ctx).evaluate(&mut individual);

        let t1 = slot(&individual, "P1.T1");
        assert_eq!(t1.start, Some(pin), "start must be forced onto the pin");
        assert!(fitness < ctx.config.deadend);
    }

    #[test]
    fn test_pinned_datetime_outside_snap_window_rejects() {
        // Pin far in the future: the candidate start cannot snap onto it.
        let pin = dt("2021-02-01T10:00");
        let tasks = vec![
            Task::new("P1", "T1")
                .with_duration(2.0)
                .with_valid_worker("W1")
                .pinned_at(pin),
        ];
        let workers = vec![Worker::new("W1").at_location(0.0, 0.0)];
        let ctx = context(tasks, workers);

        let mut individual = Individual::from_permutation(&ctx, ctx.task_ids());
        let fitness = ScheduleBuilder::new(&ctx).evaluate(&mut individual);

        assert!(slot(&individual, "P1.T1").assignees.is_empty());
        assert_eq!(fitness, ctx.config.deadend);
    }

    #[test]
    fn test_pinned_worker_overrides_ahp_order() {
        let tasks = vec![
            Task::new("P1", "T1")
                .with_duration(2.0)
                .with_valid_workers(["W-near", "W-far"])
                .with_pinned_worker("W-far"),
        ];
        // The near worker would win on every criterion.
        let workers = vec![
            Worker::new("W-near").at_location(0.0, 0.0),
            Worker::new("W-far").at_location(1.0, 0.0),
        ];
        let ctx = context(tasks, workers);

        let mut individual = Individual::from_permutation(&ctx, ctx.task_ids());
        ScheduleBuilder::new(&ctx).evaluate(&mut individual);

        assert_eq!(
            slot(&individual, "P1.T1").assignees,
            vec!["W-far".to_string()]
        );
    }

    #[test]
    fn test_time_off_defers_start() {
        let tasks = vec![Task::new("P1", "T1").with_duration(2.0).with_valid_worker("W1")];
        let workers = vec![Worker::new("W1")
            .at_location(0.0, 0.0)
            .with_time_off(dt("2020-12-21T00:00"), dt("2020-12-22T08:00"))];
        let ctx = context(tasks, workers);

        let mut individual = Individual::from_permutation(&ctx, ctx.task_ids());
        ScheduleBuilder::new(&ctx).evaluate(&mut individual);

        // Monday is blocked; the drive starts Tuesday 08:00.
        assert_eq!(
            slot(&individual, "P1.T1").start,
            Some(dt("2020-12-22T08:10"))
        );
    }

    #[test]
    fn test_reevaluation_is_idempotent() {
        let tasks = vec![
            Task::new("P1", "T1").with_duration(4.0).with_valid_worker("W1"),
            Task::new("P1", "T2")
                .with_duration(4.0)
                .with_valid_worker("W1")
                .with_prerequisite("T1", 1.0),
        ];
        let workers = vec![Worker::new("W1").at_location(0.0, 0.0)];
        let ctx = context(tasks, workers);
        let builder = ScheduleBuilder::new(&ctx);

        let mut individual = Individual::from_permutation(&ctx, ctx.task_ids());
        let first = builder.evaluate(&mut individual);
        let mut copy = individual.clone();
        let second = builder.evaluate(&mut copy);

        assert_eq!(first, second);
        assert_eq!(individual.tasks[0].start, copy.tasks[0].start);
        assert_eq!(individual.tasks[1].stop, copy.tasks[1].stop);
    }

    #[test]
    fn test_permutation_order_can_change_schedule() {
        // One worker, two independent tasks: whichever comes first in the
        // permutation is scheduled first.
        let tasks = vec![
            Task::new("P1", "A").with_duration(2.0).with_valid_worker("W1"),
            Task::new("P1", "B").with_duration(2.0).with_valid_worker("W1"),
        ];
        let workers = vec![Worker::new("W1").at_location(0.0, 0.0)];
        let ctx = context(tasks, workers);
        let builder = ScheduleBuilder::new(&ctx);

        let mut ab = Individual::from_permutation(
            &ctx,
            vec!["P1.A".to_string(), "P1.B".to_string()],
        );
        let mut ba = Individual::from_permutation(
            &ctx,
            vec!["P1.B".to_string(), "P1.A".to_string()],
        );
        builder.evaluate(&mut ab);
        builder.evaluate(&mut ba);

        assert!(slot(&ab, "P1.A").start < slot(&ab, "P1.B").start);
        assert!(slot(&ba, "P1.B").start < slot(&ba, "P1.A").start);
    }
}
