//! Field worker model.
//!
//! Workers are the mobile resources the scheduler assigns to tasks. Each
//! worker has a home location, a demand score derived from how many tasks
//! they are eligible for, and a list of blocked time-off ranges.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A blocked datetime range `[start, end)` during which a worker is
/// unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeOff {
    /// Block start (inclusive).
    pub start: NaiveDateTime,
    /// Block end (exclusive).
    pub end: NaiveDateTime,
}

impl TimeOff {
    /// Creates a new blocked range.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Whether an instant falls inside this block.
    #[inline]
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        t >= self.start && t < self.end
    }
}

/// A field worker.
///
/// `demand` is the fraction of all tasks this worker is valid for, in
/// `(0, 1]`; lower means more specialised. It is normally derived by
/// [`SchedulingContext::new`](crate::models::SchedulingContext::new) rather
/// than supplied by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    /// Unique worker identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Home latitude in degrees.
    pub latitude: f64,
    /// Home longitude in degrees.
    pub longitude: f64,
    /// Share of the task catalogue this worker is eligible for.
    pub demand: f64,
    /// Blocked ranges, kept sorted by start.
    pub time_off: Vec<TimeOff>,
}

impl Worker {
    /// Creates a worker with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            demand: 0.0,
            time_off: Vec::new(),
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the home coordinates in degrees.
    pub fn at_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }

    /// Adds a blocked time-off range, keeping the list ordered by start.
    pub fn with_time_off(mut self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.time_off.push(TimeOff::new(start, end));
        self.time_off.sort_by_key(|b| b.start);
        self
    }

    /// Earliest instant at or after `t` that is not inside a blocked range.
    ///
    /// Blocks are ordered, so a single forward pass handles back-to-back
    /// blocks as well.
    pub fn next_free(&self, t: NaiveDateTime) -> NaiveDateTime {
        let mut t = t;
        for block in &self.time_off {
            if block.contains(t) {
                t = block.end;
            }
        }
        t
    }
}
