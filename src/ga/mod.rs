//! Evolutionary schedule search.
//!
//! A permutation-encoded genetic algorithm: each [`Individual`] carries a
//! permutation of all task ids, the greedy builder
//! ([`crate::scheduler::ScheduleBuilder`]) turns that permutation into a
//! concrete schedule, and the makespan (deadend-penalised when infeasible)
//! is the fitness. Lower fitness is better.
//!
//! # Quick Start
//!
//! ```no_run
//! use crew_scheduler::ga::EvolutionEngine;
//! use crew_scheduler::models::SchedulingContext;
//!
//! # fn context() -> SchedulingContext { unimplemented!() }
//! let ctx: SchedulingContext = context();
//! let result = EvolutionEngine::new(&ctx).run();
//! let schedule = result.best_schedule(&ctx);
//! println!("makespan: {:.1} h", schedule.makespan_hours(ctx.schedule_start));
//! ```
//!
//! # Submodules
//!
//! - [`operators`]: tournament selection, order crossover, swap and
//!   displacement mutation, stagnation knobs
//!
//! # References
//!
//! - Davis (1985), "Applying Adaptive Algorithms to Epistatic Domains" (OX1)
//! - Cheng et al. (1996), "A Tutorial Survey of JSSP using GA"

mod engine;
mod individual;
pub mod operators;

pub use engine::{EvolutionEngine, EvolutionResult, STAGNATION_GENERATIONS};
pub use individual::{fingerprint_permutation, Individual, ScheduledTask, ScheduledWorker};
