//! Site working calendar.
//!
//! A [`Site`] describes when work can happen at a project location: a daily
//! working window on weekdays, minus holidays. [`Site::add_hours`] is the
//! single primitive the schedule builder needs — it answers "if this much
//! work starts here, when does it finish?" while skipping every non-working
//! interval in between.
//!
//! # Time Model
//! All instants are naive local times of the site. The scheduler never
//! crosses timezones within one run.

use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// Granularity work end times are rounded up to (10 minutes).
pub const DEFAULT_ROUNDING_SECS: u32 = 600;

/// Slack subtracted before computing whole working days, so that an exact
/// multiple of the daily window (e.g. 8 h of work in an 8 h day) does not
/// spill into an extra day.
const DAY_FIT_EPSILON: f64 = 1e-4;

/// Working-time calendar of a project site.
///
/// Working time is `[daily_start, daily_end)` on every date that is neither
/// a Saturday, a Sunday, nor a holiday. The lunch window is carried for
/// loaders that have it but is not yet excluded from working time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    /// Start of the daily working window.
    pub daily_start: NaiveTime,
    /// End of the daily working window.
    pub daily_end: NaiveTime,
    /// Dates with no working time at all.
    pub holidays: HashSet<NaiveDate>,
    /// Start of the planned lunch break.
    pub lunch_start: NaiveTime,
    /// End of the planned lunch break.
    pub lunch_end: NaiveTime,
    /// End times are rounded up to multiples of this many seconds.
    pub rounding_secs: u32,
}

impl Site {
    /// Creates a calendar with the given daily window and no holidays.
    pub fn new(daily_start: NaiveTime, daily_end: NaiveTime) -> Self {
        Self {
            daily_start,
            daily_end,
            holidays: HashSet::new(),
            lunch_start: NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default(),
            lunch_end: NaiveTime::from_hms_opt(13, 0, 0).unwrap_or_default(),
            rounding_secs: DEFAULT_ROUNDING_SECS,
        }
    }

    /// Convenience constructor from whole hours, e.g. `Site::working_hours(8, 16)`.
    pub fn working_hours(start_hour: u32, end_hour: u32) -> Self {
        Self::new(
            NaiveTime::from_hms_opt(start_hour, 0, 0).unwrap_or_default(),
            NaiveTime::from_hms_opt(end_hour, 0, 0).unwrap_or_default(),
        )
    }

    /// Adds a holiday date.
    pub fn with_holiday(mut self, date: NaiveDate) -> Self {
        self.holidays.insert(date);
        self
    }

    /// Sets the lunch window.
    pub fn with_lunch(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.lunch_start = start;
        self.lunch_end = end;
        self
    }

    /// Sets the end-time rounding granularity in seconds.
    pub fn with_rounding_secs(mut self, secs: u32) -> Self {
        self.rounding_secs = secs;
        self
    }

    /// Whether any work happens on `date`.
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }

    /// Length of the daily working window in hours.
    pub fn working_hours_per_day(&self) -> f64 {
        (self.daily_end - self.daily_start).num_seconds() as f64 / 3600.0
    }

    /// Returns the instant at which `hours` of site working time, started at
    /// `start_time`, is complete.
    ///
    /// The start is first normalised onto the working window: snapped forward
    /// to today's window start, or to the next day if today's window already
    /// ended, then advanced day-by-day past weekends and holidays. The result
    /// is rounded up to the next `rounding_secs` boundary and is therefore
    /// always strictly after `start_time` for positive `hours`.
    ///
    /// Negative `hours` are not supported; callers handle lead times before
    /// reaching the calendar.
    pub fn add_hours(&self, start_time: NaiveDateTime, hours: f64) -> NaiveDateTime {
        debug_assert!(hours >= 0.0, "calendar arithmetic needs non-negative hours");

        let mut start = start_time;
        let today_start = start.date().and_time(self.daily_start);
        let today_end = start.date().and_time(self.daily_end);
        if start < today_start {
            start = today_start;
        } else if start > today_end {
            start = today_start + Duration::days(1);
        }
        while !self.is_working_day(start.date()) {
            start += Duration::days(1);
        }
        let today_end = start.date().and_time(self.daily_end);

        let per_day = self.working_hours_per_day();

        // Whole working days the work occupies beyond today.
        let mut whole_days = ((hours - DAY_FIT_EPSILON) / per_day).floor() as i64;
        if whole_days < 0 {
            whole_days = 0;
        }
        let residual_secs = (hours - whole_days as f64 * per_day) * 3600.0;
        if start + Duration::seconds(residual_secs as i64) > today_end {
            whole_days += 1;
        }

        // Advance that many working days from the start date. Landing on a
        // Saturday jumps straight to Monday; a holiday landing day is not
        // counted and the walk continues.
        let mut end = start.date().and_time(self.daily_start);
        let mut counted = 0i64;
        while counted < whole_days {
            end += Duration::days(1);
            if end.weekday() == Weekday::Sat {
                end += Duration::days(2);
            }
            if self.holidays.contains(&end.date()) {
                continue;
            }
            counted += 1;
        }

        // Residual work placed from the landing day's window start.
        let worked_first_day = (today_end - start).num_seconds() as f64 / 3600.0;
        let remaining_secs =
            3600.0 * (hours - (whole_days - 1) as f64 * per_day - worked_first_day);
        end += Duration::seconds(remaining_secs as i64);

        self.round_up(end)
    }

    /// Rounds an instant up to the next `rounding_secs` boundary.
    fn round_up(&self, t: NaiveDateTime) -> NaiveDateTime {
        let step = i64::from(self.rounding_secs);
        if step <= 0 {
            return t;
        }
        let rem = i64::from(t.time().num_seconds_from_midnight()) % step;
        if rem == 0 {
            t
        } else {
            t + Duration::seconds(step - rem)
        }
    }
}
