use std::collections::HashMap;
use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{now_timestamp, parse_timestamp, parse_uuid, TIMESTAMP_FORMAT};
use crate::db::DatabaseError;
use crate::models::*;

/// Persist a normalized report with its values in one transaction.
pub fn insert_report(conn: &Connection, report: &NewReport) -> Result<Report, DatabaseError> {
    let stored = Report {
        id: Uuid::new_v4(),
        user_id: report.user_id,
        report_date: report.report_date,
        source: report.source,
        filename: report.filename.clone(),
        values: report.values.clone(),
        created_at: now_timestamp(),
    };

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO reports (id, user_id, report_date, source, filename, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            stored.id.to_string(),
            stored.user_id.to_string(),
            stored.report_date.to_string(),
            stored.source.as_str(),
            stored.filename,
            stored.created_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO report_values (report_id, param_key, value) VALUES (?1, ?2, ?3)",
        )?;
        for (key, value) in &stored.values {
            stmt.execute(params![stored.id.to_string(), key.as_str(), value])?;
        }
    }
    tx.commit()?;

    Ok(stored)
}

/// All reports owned by `user_id`, ascending by report date then insertion.
pub fn list_reports_for_user(
    conn: &Connection,
    user_id: Uuid,
) -> Result<Vec<Report>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, report_date, source, filename, created_at
         FROM reports WHERE user_id = ?1
         ORDER BY report_date ASC, created_at ASC, rowid ASC",
    )?;
    let rows = stmt.query_map(params![user_id.to_string()], |row| Ok(report_row_from_rusqlite(row)))?;

    let mut reports = Vec::new();
    for row in rows {
        reports.push(report_from_row(row??)?);
    }

    let mut values = values_for_user(conn, user_id)?;
    for report in &mut reports {
        if let Some(v) = values.remove(&report.id) {
            report.values = v;
        }
    }
    Ok(reports)
}

/// Hard-delete a report. Reports owned by someone else are `NotFound`.
pub fn delete_report_for_user(
    conn: &Connection,
    user_id: Uuid,
    report_id: Uuid,
) -> Result<(), DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM reports WHERE id = ?1 AND user_id = ?2",
        params![report_id.to_string(), user_id.to_string()],
    )?;
    if deleted == 0 {
        return Err(not_found(report_id));
    }
    Ok(())
}

fn not_found(report_id: Uuid) -> DatabaseError {
    DatabaseError::NotFound {
        entity_type: "report".into(),
        id: report_id.to_string(),
    }
}

fn values_for_user(
    conn: &Connection,
    user_id: Uuid,
) -> Result<HashMap<Uuid, LabValues>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT v.report_id, v.param_key, v.value
         FROM report_values v JOIN reports r ON r.id = v.report_id
         WHERE r.user_id = ?1",
    )?;
    let rows = stmt.query_map(params![user_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, f64>(2)?,
        ))
    })?;

    let mut values: HashMap<Uuid, LabValues> = HashMap::new();
    for row in rows {
        let (report_id, key, value) = row?;
        values
            .entry(parse_uuid(&report_id)?)
            .or_default()
            .insert(ParameterKey::from_str(&key)?, value);
    }
    Ok(values)
}

// Internal row type for Report mapping
struct ReportRow {
    id: String,
    user_id: String,
    report_date: String,
    source: String,
    filename: Option<String>,
    created_at: String,
}

fn report_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ReportRow, rusqlite::Error> {
    Ok(ReportRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        report_date: row.get(2)?,
        source: row.get(3)?,
        filename: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn report_from_row(row: ReportRow) -> Result<Report, DatabaseError> {
    Ok(Report {
        id: parse_uuid(&row.id)?,
        user_id: parse_uuid(&row.user_id)?,
        report_date: ReportMonth::parse(&row.report_date)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        source: ReportSource::from_str(&row.source)?,
        filename: row.filename,
        values: LabValues::new(),
        created_at: parse_timestamp(&row.created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::insert_user;
    use crate::db::sqlite::open_memory_database;

    fn user(conn: &Connection, email: &str) -> Uuid {
        insert_user(conn, email, "Test", &format!("hash-{email}")).unwrap().id
    }

    fn new_report(user_id: Uuid, month: &str, values: &[(ParameterKey, f64)]) -> NewReport {
        NewReport {
            user_id,
            report_date: ReportMonth::parse(month).unwrap(),
            source: ReportSource::Manual,
            filename: None,
            values: values.iter().copied().collect(),
        }
    }

    #[test]
    fn insert_assigns_id_and_round_trips() {
        let conn = open_memory_database().unwrap();
        let owner = user(&conn, "a@example.com");
        let input = NewReport {
            source: ReportSource::Pdf,
            filename: Some("march.pdf".into()),
            ..new_report(owner, "2024-03", &[(ParameterKey::Hba1c, 5.9), (ParameterKey::Ldl, 131.0)])
        };

        let stored = insert_report(&conn, &input).unwrap();
        assert!(!stored.id.is_nil());

        let listed = list_reports_for_user(&conn, owner).unwrap();
        assert_eq!(listed.len(), 1);
        let fetched = &listed[0];
        assert_eq!(fetched, &stored);
        assert_eq!(fetched.value(ParameterKey::Ldl), Some(131.0));
        assert_eq!(fetched.value(ParameterKey::Glucose), None);
    }

    #[test]
    fn list_is_ascending_by_report_date() {
        let conn = open_memory_database().unwrap();
        let owner = user(&conn, "a@example.com");
        insert_report(&conn, &new_report(owner, "2024-05", &[(ParameterKey::Tsh, 1.0)])).unwrap();
        insert_report(&conn, &new_report(owner, "2023-11", &[(ParameterKey::Tsh, 2.0)])).unwrap();
        insert_report(&conn, &new_report(owner, "2024-01", &[])).unwrap();

        let dates: Vec<String> = list_reports_for_user(&conn, owner)
            .unwrap()
            .iter()
            .map(|r| r.report_date.to_string())
            .collect();
        assert_eq!(dates, vec!["2023-11", "2024-01", "2024-05"]);
    }

    #[test]
    fn same_month_keeps_insertion_order() {
        let conn = open_memory_database().unwrap();
        let owner = user(&conn, "a@example.com");
        let first = insert_report(&conn, &new_report(owner, "2024-02", &[(ParameterKey::Alt, 20.0)])).unwrap();
        let second = insert_report(&conn, &new_report(owner, "2024-02", &[(ParameterKey::Alt, 30.0)])).unwrap();

        let ids: Vec<Uuid> = list_reports_for_user(&conn, owner).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[test]
    fn list_is_scoped_to_owner() {
        let conn = open_memory_database().unwrap();
        let ana = user(&conn, "ana@example.com");
        let ben = user(&conn, "ben@example.com");
        insert_report(&conn, &new_report(ana, "2024-01", &[(ParameterKey::Hdl, 55.0)])).unwrap();

        assert_eq!(list_reports_for_user(&conn, ana).unwrap().len(), 1);
        assert!(list_reports_for_user(&conn, ben).unwrap().is_empty());
    }

    #[test]
    fn delete_by_other_user_is_not_found() {
        let conn = open_memory_database().unwrap();
        let ana = user(&conn, "ana@example.com");
        let ben = user(&conn, "ben@example.com");
        let report = insert_report(&conn, &new_report(ana, "2024-01", &[(ParameterKey::Hdl, 55.0)])).unwrap();

        assert!(matches!(
            delete_report_for_user(&conn, ben, report.id),
            Err(DatabaseError::NotFound { .. })
        ));
        delete_report_for_user(&conn, ana, report.id).unwrap();
        assert!(list_reports_for_user(&conn, ana).unwrap().is_empty());

        let orphans: i64 = conn
            .query_row("SELECT COUNT(*) FROM report_values", [], |row| row.get(0))
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn report_for_unknown_user_is_rejected() {
        let conn = open_memory_database().unwrap();
        let err = insert_report(&conn, &new_report(Uuid::new_v4(), "2024-01", &[])).unwrap_err();
        assert!(matches!(err, DatabaseError::Sqlite(_)));
    }
}
