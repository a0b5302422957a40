// src/bulletin/filter.rs
use super::types::EarthquakeRecord;

pub const DEFAULT_MIN_ML: f64 = 1.5;

/// Keep records whose ML is at least `min_ml`, preserving order.
/// An unreported ML counts as 0.
pub fn filter_by_ml(records: Vec<EarthquakeRecord>, min_ml: f64) -> Vec<EarthquakeRecord> {
    records
        .into_iter()
        .filter(|r| r.magnitude_ml.value() >= min_ml)
        .collect()
}
