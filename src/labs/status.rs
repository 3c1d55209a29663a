//! Clinical status classification of a single lab value.

use crate::models::{LabStatus, ParameterKey};

use super::registry;

/// Fraction of the minimum below which a higher-is-better marker is abnormal.
const HIGHER_IS_BETTER_WARNING_FLOOR: f64 = 0.75;
/// Ratio to the maximum up to which an out-of-range value is borderline.
const RANGE_WARNING_CEILING: f64 = 1.3;

/// Classify a value against its parameter's normal range.
///
/// Out-of-range values below `min` go through the same `value / max` ratio
/// as values above `max`, so they always land in `Warning`.
pub fn classify(key: ParameterKey, value: Option<f64>) -> LabStatus {
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return LabStatus::None;
    };
    let def = registry::lookup(key);
    let range = def.normal_range;

    if def.higher_is_better {
        if value >= range.min {
            return LabStatus::Normal;
        }
        if value >= range.min * HIGHER_IS_BETTER_WARNING_FLOOR {
            return LabStatus::Warning;
        }
        return LabStatus::High;
    }

    if range.contains(value) {
        return LabStatus::Normal;
    }
    if value / range.max <= RANGE_WARNING_CEILING {
        LabStatus::Warning
    } else {
        LabStatus::High
    }
}
