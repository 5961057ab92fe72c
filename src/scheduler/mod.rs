//! Greedy schedule simulation.
//!
//! The fitness side of the search: [`ScheduleBuilder`] simulates one
//! individual's schedule in permutation order, with [`ahp`] scoring each
//! candidate worker per task.
//!
//! # Algorithm
//!
//! Repeated passes over the task permutation; each pass fills crew
//! positions of every task whose prerequisites are complete, picking
//! workers by descending AHP fitness and threading all instants through the
//! site working calendar. The loop stops at the first pass that assigns no
//! new worker.
//!
//! # References
//!
//! - Saaty (1980), "The Analytic Hierarchy Process"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4

pub mod ahp;
mod builder;

pub use ahp::score_workers;
pub use builder::ScheduleBuilder;
