//! Bearer-token identity.
//!
//! Registration issues an opaque token shown once; only its SHA-256 hash is
//! stored. Every authenticated request resolves the token back to a user.

use rusqlite::Connection;
use thiserror::Error;

use crate::db::{self, DatabaseError};
use crate::models::User;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Email already registered")]
    EmailTaken,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Hex form of [`hash_token`], as stored in the users table.
pub fn token_digest(token: &str) -> String {
    hash_token(token).iter().map(|b| format!("{b:02x}")).collect()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Create a user and return it with its plaintext token.
pub fn register(conn: &Connection, email: &str, name: &str) -> Result<(User, String), IdentityError> {
    let email = email.trim();
    let name = name.trim();
    if email.is_empty() || !email.contains('@') || email.len() > 254 {
        return Err(IdentityError::Invalid {
            field: "email",
            reason: "expected an e-mail address".into(),
        });
    }
    if name.is_empty() || name.chars().count() > 100 {
        return Err(IdentityError::Invalid {
            field: "name",
            reason: "must be 1 to 100 characters".into(),
        });
    }

    let token = generate_token();
    let user = db::insert_user(conn, email, name, &token_digest(&token)).map_err(|e| {
        if e.is_unique_violation() {
            IdentityError::EmailTaken
        } else {
            IdentityError::Database(e)
        }
    })?;

    tracing::info!(user_id = %user.id, "Registered user");
    Ok((user, token))
}

/// Resolve a bearer token to its user.
pub fn authenticate(conn: &Connection, token: &str) -> Result<Option<User>, DatabaseError> {
    if token.is_empty() {
        return Ok(None);
    }
    db::find_user_by_token_hash(conn, &token_digest(token))
}
