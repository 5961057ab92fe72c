//! Project model.
//!
//! A project is a geographically-located body of work with its own working
//! calendar. Tasks belong to exactly one project and inherit its [`Site`]
//! calendar and location.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Site;

/// A project to which tasks belong.
///
/// The target window is advisory metadata from the planning system; the
/// scheduler does not enforce it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique project identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Site latitude in degrees.
    pub latitude: f64,
    /// Site longitude in degrees.
    pub longitude: f64,
    /// Desired project start date, if the planning system has one.
    pub target_start: Option<NaiveDate>,
    /// Desired project end date, if the planning system has one.
    pub target_end: Option<NaiveDate>,
    /// Working calendar of the project site.
    pub site: Site,
}

impl Project {
    /// Creates a project with the given identifier and site calendar.
    pub fn new(id: impl Into<String>, site: Site) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            target_start: None,
            target_end: None,
            site,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the site coordinates in degrees.
    pub fn at_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }

    /// Sets the advisory target window.
    pub fn with_target_window(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.target_start = Some(start);
        self.target_end = Some(end);
        self
    }
}
