//! Raw value bag -> canonical report record.
//!
//! Input comes from two untrusted places: the extraction model's JSON and
//! the manual-entry form. Only registry keys survive; anything else is
//! dropped before the record reaches the row store.

use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{LabValues, NewReport, ReportMonth, ReportSource};

use super::registry;

pub const REPORT_DATE_FIELD: &str = "report_date";
const REPORT_DATE_ALIAS: &str = "reportDate";

/// A raw record could not be turned into a report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Normalize using the current UTC month as the default report date.
pub fn normalize(
    raw: &Map<String, Value>,
    user_id: Uuid,
    source: ReportSource,
    filename: Option<&str>,
) -> Result<NewReport, ValidationError> {
    normalize_with_default(raw, user_id, source, filename, ReportMonth::current())
}

/// Normalize with an explicit fallback month for records without a date.
pub fn normalize_with_default(
    raw: &Map<String, Value>,
    user_id: Uuid,
    source: ReportSource,
    filename: Option<&str>,
    default_month: ReportMonth,
) -> Result<NewReport, ValidationError> {
    if user_id.is_nil() {
        return Err(ValidationError::new("user_id", "missing owner"));
    }

    let report_date = match date_value(raw) {
        None => default_month,
        Some(Value::String(s)) if s.trim().is_empty() => default_month,
        Some(Value::String(s)) => ReportMonth::parse(s)
            .map_err(|e| ValidationError::new(REPORT_DATE_FIELD, e.to_string()))?,
        Some(other) => {
            return Err(ValidationError::new(
                REPORT_DATE_FIELD,
                format!("expected a YYYY-MM string, got {}", json_kind(other)),
            ))
        }
    };

    let mut values = LabValues::new();
    for (name, value) in raw {
        let Some(key) = registry::parse_key(name) else {
            if name != REPORT_DATE_FIELD && name != REPORT_DATE_ALIAS {
                tracing::debug!(field = %name, "Dropping unknown field");
            }
            continue;
        };
        match value {
            Value::Null => {}
            Value::String(s) if s.trim().is_empty() => {}
            Value::Number(n) => match n.as_f64().filter(|v| v.is_finite()) {
                Some(v) => {
                    values.insert(key, v);
                }
                None => return Err(ValidationError::new(name, "number out of range")),
            },
            other => {
                return Err(ValidationError::new(
                    name,
                    format!("expected a number, got {}", json_kind(other)),
                ))
            }
        }
    }

    let filename = match source {
        ReportSource::Pdf => filename.map(str::to_string),
        ReportSource::Manual => None,
    };

    Ok(NewReport {
        user_id,
        report_date,
        source,
        filename,
        values,
    })
}

fn date_value(raw: &Map<String, Value>) -> Option<&Value> {
    [REPORT_DATE_FIELD, REPORT_DATE_ALIAS]
        .iter()
        .filter_map(|k| raw.get(*k))
        .find(|v| !v.is_null())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
