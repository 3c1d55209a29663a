//! Dashboard read model: latest value, status and trend per parameter.

use serde::Serialize;

use crate::labs::{classify, registry};
use crate::models::{LabStatus, ParameterDefinition, ParameterKey, ReportMonth, Trend};
use crate::reports::ReportBook;

#[derive(Debug, Clone, Serialize)]
pub struct ParameterCard {
    pub parameter: &'static ParameterDefinition,
    pub value: Option<f64>,
    pub status: LabStatus,
    pub status_label: &'static str,
    pub status_color: &'static str,
    pub trend: Option<Trend>,
    pub trend_arrow: Option<&'static str>,
    /// Whether the trend moves toward the healthy side. Absent when flat.
    pub improving: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub version: u64,
    pub report_count: usize,
    pub latest_report_date: Option<ReportMonth>,
    pub cards: Vec<ParameterCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesPoint {
    pub report_date: ReportMonth,
    pub value: f64,
    pub status: LabStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParameterSeries {
    pub parameter: &'static ParameterDefinition,
    pub points: Vec<SeriesPoint>,
}

/// Direction from `previous` to `latest`. None when either is missing.
pub fn trend(latest: Option<f64>, previous: Option<f64>) -> Option<Trend> {
    let (l, p) = (latest?, previous?);
    Some(if l > p {
        Trend::Up
    } else if l < p {
        Trend::Down
    } else {
        Trend::Flat
    })
}

fn improving(key: ParameterKey, trend: Option<Trend>) -> Option<bool> {
    let higher_is_better = registry::lookup(key).higher_is_better;
    match trend? {
        Trend::Up => Some(higher_is_better),
        Trend::Down => Some(!higher_is_better),
        Trend::Flat => None,
    }
}

pub fn summary(book: &ReportBook) -> DashboardSummary {
    let latest = book.latest();
    let previous = book.previous();

    let cards = registry::all()
        .iter()
        .map(|def| {
            let value = latest.and_then(|r| r.value(def.key));
            let status = classify(def.key, value);
            let trend = trend(value, previous.and_then(|r| r.value(def.key)));
            ParameterCard {
                parameter: def,
                value,
                status,
                status_label: status.label(),
                status_color: status.color(),
                trend,
                trend_arrow: trend.map(|t| t.arrow()),
                improving: improving(def.key, trend),
            }
        })
        .collect();

    DashboardSummary {
        version: book.version(),
        report_count: book.len(),
        latest_report_date: latest.map(|r| r.report_date),
        cards,
    }
}

pub fn series(book: &ReportBook, key: ParameterKey) -> ParameterSeries {
    ParameterSeries {
        parameter: registry::lookup(key),
        points: book
            .series(key)
            .into_iter()
            .map(|(report_date, value)| SeriesPoint {
                report_date,
                value,
                status: classify(key, Some(value)),
            })
            .collect(),
    }
}
