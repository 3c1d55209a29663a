//! A user's report collection and the operations that change it.

use rusqlite::Connection;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::labs::{self, ValidationError};
use crate::models::{ParameterKey, Report, ReportMonth, ReportSource};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// A change to a report book.
#[derive(Debug, Clone)]
pub enum ReportChange {
    Added(Report),
    Removed(Uuid),
}

/// One user's reports, kept ordered by report date then insertion time.
///
/// `apply` is the only way to change the collection. Every effective change
/// bumps `version`, so readers can tell whether a snapshot is stale.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportBook {
    version: u64,
    reports: Vec<Report>,
}

impl ReportBook {
    pub fn new(mut reports: Vec<Report>) -> Self {
        reports.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
        Self {
            version: 0,
            reports,
        }
    }

    /// Load every report owned by `user_id`.
    pub fn load(conn: &Connection, user_id: Uuid) -> Result<Self, DatabaseError> {
        Ok(Self::new(db::list_reports_for_user(conn, user_id)?))
    }

    /// Apply a change. Returns false when it had no effect.
    pub fn apply(&mut self, change: ReportChange) -> bool {
        let changed = match change {
            ReportChange::Added(report) => {
                if self.reports.iter().any(|r| r.id == report.id) {
                    false
                } else {
                    let key = sort_key(&report);
                    let at = self.reports.partition_point(|r| sort_key(r) <= key);
                    self.reports.insert(at, report);
                    true
                }
            }
            ReportChange::Removed(id) => {
                let before = self.reports.len();
                self.reports.retain(|r| r.id != id);
                self.reports.len() != before
            }
        };
        if changed {
            self.version += 1;
        }
        changed
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Most recent report.
    pub fn latest(&self) -> Option<&Report> {
        self.reports.last()
    }

    /// Report before the most recent one.
    pub fn previous(&self) -> Option<&Report> {
        self.reports.len().checked_sub(2).map(|i| &self.reports[i])
    }

    /// Every measurement of `key`, oldest first.
    pub fn series(&self, key: ParameterKey) -> Vec<(ReportMonth, f64)> {
        self.reports
            .iter()
            .filter_map(|r| r.value(key).map(|v| (r.report_date, v)))
            .collect()
    }
}

fn sort_key(report: &Report) -> (ReportMonth, chrono::NaiveDateTime) {
    (report.report_date, report.created_at)
}

/// Normalize a manual entry, persist it and record it in `book`.
pub fn save_manual(
    conn: &Connection,
    book: &mut ReportBook,
    user_id: Uuid,
    raw: &Map<String, Value>,
) -> Result<Report, ReportError> {
    let new_report = labs::normalize(raw, user_id, ReportSource::Manual, None)?;
    let report = db::insert_report(conn, &new_report)?;
    book.apply(ReportChange::Added(report.clone()));
    tracing::info!(
        report_id = %report.id,
        report_date = %report.report_date,
        values = report.values.len(),
        "Saved manual report"
    );
    Ok(report)
}

/// Hard-delete one of the caller's reports and drop it from `book`.
pub fn delete_report(
    conn: &Connection,
    book: &mut ReportBook,
    user_id: Uuid,
    report_id: Uuid,
) -> Result<(), ReportError> {
    db::delete_report_for_user(conn, user_id, report_id)?;
    book.apply(ReportChange::Removed(report_id));
    tracing::info!(report_id = %report_id, "Deleted report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::LabValues;
    use chrono::NaiveDateTime;
    use serde_json::json;

    fn report(month: &str, created: &str, values: &[(ParameterKey, f64)]) -> Report {
        Report {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            report_date: ReportMonth::parse(month).unwrap(),
            source: ReportSource::Manual,
            filename: None,
            values: values.iter().copied().collect::<LabValues>(),
            created_at: NaiveDateTime::parse_from_str(created, "%Y-%m-%d %H:%M:%S").unwrap(),
        }
    }

    #[test]
    fn new_book_is_sorted() {
        let book = ReportBook::new(vec![
            report("2024-05", "2024-06-01 10:00:00", &[]),
            report("2023-11", "2024-06-01 10:00:00", &[]),
        ]);
        let dates: Vec<_> = book.reports().iter().map(|r| r.report_date.to_string()).collect();
        assert_eq!(dates, vec!["2023-11", "2024-05"]);
        assert_eq!(book.version(), 0);
    }

    #[test]
    fn added_report_lands_in_date_order() {
        let mut book = ReportBook::new(vec![
            report("2024-01", "2024-02-01 10:00:00", &[]),
            report("2024-06", "2024-07-01 10:00:00", &[]),
        ]);
        let middle = report("2024-03", "2024-08-01 10:00:00", &[]);
        let id = middle.id;

        assert!(book.apply(ReportChange::Added(middle)));
        assert_eq!(book.version(), 1);
        assert_eq!(book.reports()[1].id, id);
    }

    #[test]
    fn same_month_orders_by_creation() {
        let mut book = ReportBook::default();
        let early = report("2024-02", "2024-02-01 10:00:00", &[]);
        let late = report("2024-02", "2024-02-02 10:00:00", &[]);
        let (early_id, late_id) = (early.id, late.id);
        book.apply(ReportChange::Added(late));
        book.apply(ReportChange::Added(early));
        assert_eq!(book.previous().unwrap().id, early_id);
        assert_eq!(book.latest().unwrap().id, late_id);
    }

    #[test]
    fn ineffective_changes_keep_version() {
        let first = report("2024-01", "2024-02-01 10:00:00", &[]);
        let mut book = ReportBook::new(vec![first.clone()]);

        assert!(!book.apply(ReportChange::Added(first.clone())));
        assert!(!book.apply(ReportChange::Removed(Uuid::new_v4())));
        assert_eq!(book.version(), 0);

        assert!(book.apply(ReportChange::Removed(first.id)));
        assert_eq!(book.version(), 1);
        assert!(book.is_empty());
    }

    #[test]
    fn latest_and_previous() {
        let book = ReportBook::new(vec![report("2024-01", "2024-02-01 10:00:00", &[])]);
        assert!(book.latest().is_some());
        assert!(book.previous().is_none());
        assert!(ReportBook::default().latest().is_none());
    }

    #[test]
    fn series_skips_reports_without_the_value() {
        let book = ReportBook::new(vec![
            report("2024-01", "2024-02-01 10:00:00", &[(ParameterKey::Ldl, 120.0)]),
            report("2024-02", "2024-03-01 10:00:00", &[(ParameterKey::Hdl, 50.0)]),
            report("2024-03", "2024-04-01 10:00:00", &[(ParameterKey::Ldl, 98.0)]),
        ]);
        let series = book.series(ParameterKey::Ldl);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].1, 120.0);
        assert_eq!(series[1].0.to_string(), "2024-03");
    }

    #[test]
    fn manual_entry_is_normalized_and_stored() {
        let conn = open_memory_database().unwrap();
        let user = db::insert_user(&conn, "a@example.com", "A", "h").unwrap();
        let raw = json!({ "report_date": "2024-04", "ldl": 95, "hdl": "", "notes": "fasting" });

        let mut book = ReportBook::load(&conn, user.id).unwrap();
        let saved = save_manual(&conn, &mut book, user.id, raw.as_object().unwrap()).unwrap();
        assert_eq!(saved.source, ReportSource::Manual);
        assert_eq!(saved.values.len(), 1);
        assert_eq!(book.version(), 1);
        assert_eq!(book.latest().unwrap().id, saved.id);

        let reloaded = ReportBook::load(&conn, user.id).unwrap();
        assert_eq!(reloaded.latest().unwrap().id, saved.id);
    }

    #[test]
    fn invalid_manual_entry_is_not_stored() {
        let conn = open_memory_database().unwrap();
        let user = db::insert_user(&conn, "a@example.com", "A", "h").unwrap();
        let raw = json!({ "ldl": "ninety" });

        let mut book = ReportBook::default();
        let err = save_manual(&conn, &mut book, user.id, raw.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, ReportError::Validation(ref v) if v.field == "ldl"));
        assert_eq!(book.version(), 0);
        assert!(ReportBook::load(&conn, user.id).unwrap().is_empty());
    }

    #[test]
    fn delete_is_owner_scoped() {
        let conn = open_memory_database().unwrap();
        let ana = db::insert_user(&conn, "ana@example.com", "Ana", "h1").unwrap();
        let ben = db::insert_user(&conn, "ben@example.com", "Ben", "h2").unwrap();
        let mut ana_book = ReportBook::default();
        let mut ben_book = ReportBook::default();
        let saved = save_manual(&conn, &mut ana_book, ana.id, json!({ "alt": 30 }).as_object().unwrap())
            .unwrap();

        assert!(matches!(
            delete_report(&conn, &mut ben_book, ben.id, saved.id),
            Err(ReportError::Database(DatabaseError::NotFound { .. }))
        ));
        assert_eq!(ben_book.version(), 0);
        delete_report(&conn, &mut ana_book, ana.id, saved.id).unwrap();
        assert!(ana_book.is_empty());
        assert_eq!(ana_book.version(), 2);
        assert!(ReportBook::load(&conn, ana.id).unwrap().is_empty());
    }
}
