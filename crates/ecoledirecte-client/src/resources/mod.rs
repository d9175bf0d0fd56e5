//! Resource fetchers: one request/reshape pair per API resource.

pub mod attendance;
pub mod forms;
pub mod grades;
pub mod homework;
pub mod messaging;
pub mod timetable;
pub mod wallet;

use chrono::{Datelike, NaiveDate};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

pub use attendance::AttendanceReport;
pub use grades::{select_current_period, GradesReport};

/// School year label: `2024-2025` from August 2024 to July 2025.
pub fn school_year(today: NaiveDate) -> String {
    let year = today.year();
    if today.month() >= 8 {
        format!("{}-{}", year, year + 1)
    } else {
        format!("{}-{}", year - 1, year)
    }
}

/// Deserialize every entry of a JSON array, logging and skipping the
/// malformed ones.
pub(crate) fn parse_entries<T: DeserializeOwned>(resource: &str, entries: &Value) -> Vec<T> {
    let Some(entries) = entries.as_array() else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| match serde_json::from_value(entry.clone()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(category = "fetch", resource, error = %e, "Skipping malformed entry");
                None
            }
        })
        .collect()
}
