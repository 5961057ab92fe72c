//! Scheduling domain models.
//!
//! The immutable input catalogues ([`Project`], [`Worker`], [`Task`],
//! [`ProjectFamiliarity`]) together with the site working calendar
//! ([`Site`]), the shared read-only [`SchedulingContext`], and the
//! consumer-facing [`Schedule`] output.
//!
//! # Time Representation
//! All instants are naive local datetimes of the sites being scheduled;
//! the boundary format is `YYYY-MM-DDThh:mm`.

pub mod calendar;
mod context;
mod familiarity;
mod project;
mod schedule;
mod task;
mod worker;

pub use calendar::Site;
pub use context::SchedulingContext;
pub use familiarity::ProjectFamiliarity;
pub use project::Project;
pub use schedule::{format_instant, Schedule, ScheduledAssignment, DATETIME_FORMAT};
pub use task::Task;
pub use worker::{TimeOff, Worker};
