//! Calendar fixtures

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::overlay::CalendarDay;

/// Wrapper for calendar overrides in YAML.
///
/// Days deserialize straight into the backend's [`CalendarDay`] shape, so a
/// fixture file doubles as a sample of the availability contract.
#[derive(Debug, Deserialize)]
pub struct CalendarFixture {
    /// Map of date -> day override.
    pub days: FxHashMap<NaiveDate, CalendarDay>,
}
