use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{now_timestamp, parse_timestamp, parse_uuid, TIMESTAMP_FORMAT};
use crate::db::DatabaseError;
use crate::models::User;

/// Insert a user together with the hash of their bearer token.
pub fn insert_user(
    conn: &Connection,
    email: &str,
    name: &str,
    token_hash: &str,
) -> Result<User, DatabaseError> {
    let user = User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        name: name.to_string(),
        created_at: now_timestamp(),
    };

    conn.execute(
        "INSERT INTO users (id, email, name, token_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.id.to_string(),
            user.email,
            user.name,
            token_hash,
            user.created_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(user)
}

pub fn find_user_by_token_hash(
    conn: &Connection,
    token_hash: &str,
) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, email, name, created_at FROM users WHERE token_hash = ?1",
            params![token_hash],
            user_row_from_rusqlite,
        )
        .optional()?;
    row.map(user_from_row).transpose()
}

pub fn get_user(conn: &Connection, id: Uuid) -> Result<User, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, email, name, created_at FROM users WHERE id = ?1",
            params![id.to_string()],
            user_row_from_rusqlite,
        )
        .optional()?
        .ok_or_else(|| DatabaseError::NotFound {
            entity_type: "user".into(),
            id: id.to_string(),
        })?;
    user_from_row(row)
}

struct UserRow {
    id: String,
    email: String,
    name: String,
    created_at: String,
}

fn user_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn user_from_row(row: UserRow) -> Result<User, DatabaseError> {
    Ok(User {
        id: parse_uuid(&row.id)?,
        email: row.email,
        name: row.name,
        created_at: parse_timestamp(&row.created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn insert_and_find_by_token() {
        let conn = open_memory_database().unwrap();
        let user = insert_user(&conn, "ana@example.com", "Ana", "hash-1").unwrap();

        let found = find_user_by_token_hash(&conn, "hash-1").unwrap().unwrap();
        assert_eq!(found, user);
        assert!(find_user_by_token_hash(&conn, "hash-2").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_unique_violation() {
        let conn = open_memory_database().unwrap();
        insert_user(&conn, "ana@example.com", "Ana", "hash-1").unwrap();
        let err = insert_user(&conn, "ANA@example.com", "Ana 2", "hash-2").unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[test]
    fn get_missing_user_is_not_found() {
        let conn = open_memory_database().unwrap();
        assert!(matches!(
            get_user(&conn, Uuid::new_v4()),
            Err(DatabaseError::NotFound { .. })
        ));
    }
}
