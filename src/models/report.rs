use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use super::enums::{ParameterKey, ReportSource};

/// Year-month stamp of a lab report (`YYYY-MM`).
///
/// Ordering is chronological, so it doubles as the report sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReportMonth {
    year: i32,
    month: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected YYYY-MM, got {0:?}")]
pub struct InvalidReportMonth(pub String);

impl ReportMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1000..=9999).contains(&year) && (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// The current month in UTC.
    pub fn current() -> Self {
        Self::from_date(Utc::now().date_naive())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Parse `YYYY-MM`, or a full `YYYY-MM-DD` date truncated to its month.
    pub fn parse(input: &str) -> Result<Self, InvalidReportMonth> {
        let trimmed = input.trim();
        let invalid = || InvalidReportMonth(input.to_string());

        let bytes = trimmed.as_bytes();
        let shape_ok = |len: usize| {
            bytes.len() == len
                && bytes[..4].iter().all(u8::is_ascii_digit)
                && bytes[4] == b'-'
                && bytes[5..7].iter().all(u8::is_ascii_digit)
        };

        match trimmed.len() {
            7 if shape_ok(7) => {
                let date = NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d")
                    .map_err(|_| invalid())?;
                Ok(Self::from_date(date))
            }
            10 if shape_ok(10) && bytes[7] == b'-' => {
                let date =
                    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| invalid())?;
                Ok(Self::from_date(date))
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for ReportMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for ReportMonth {
    type Err = InvalidReportMonth;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ReportMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ReportMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Sparse measurements: a missing key means "not measured", never zero.
pub type LabValues = BTreeMap<ParameterKey, f64>;

/// A normalized report that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReport {
    pub user_id: Uuid,
    pub report_date: ReportMonth,
    pub source: ReportSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub values: LabValues,
}

impl NewReport {
    /// Flatten back into the raw key/value shape the normalizer accepts.
    pub fn to_raw(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut raw = serde_json::Map::new();
        raw.insert(
            "report_date".into(),
            serde_json::Value::String(self.report_date.to_string()),
        );
        for (key, value) in &self.values {
            raw.insert(key.as_str().into(), serde_json::Value::from(*value));
        }
        raw
    }
}

/// A persisted lab report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub user_id: Uuid,
    pub report_date: ReportMonth,
    pub source: ReportSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub values: LabValues,
    pub created_at: NaiveDateTime,
}

impl Report {
    pub fn value(&self, key: ParameterKey) -> Option<f64> {
        self.values.get(&key).copied()
    }
}
