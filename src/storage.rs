//! Raw document storage.
//!
//! Uploaded PDFs live here only while their extraction runs. Paths are
//! opaque `{user_id}/{unix_millis}_{nonce}_{filename}` strings handed back
//! by [`document_path`].

use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid document path: {0}")]
    InvalidPath(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Object store for raw uploaded documents.
pub trait DocumentStore: Send + Sync {
    fn upload(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError>;
    fn download(&self, path: &str) -> Result<Vec<u8>, StorageError>;
    /// Deleting a missing object succeeds.
    fn delete(&self, path: &str) -> Result<(), StorageError>;
}

/// Build the storage path for a freshly uploaded file.
///
/// The random nonce keeps same-named files uploaded within one
/// millisecond apart.
pub fn document_path(user_id: Uuid, filename: &str) -> String {
    let nonce = Uuid::new_v4().simple().to_string();
    format!(
        "{user_id}/{}_{}_{}",
        Utc::now().timestamp_millis(),
        &nonce[..8],
        sanitize_filename(filename)
    )
}

/// Reduce an untrusted filename to a safe single path segment.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .filter(|&c| c != '/' && c != '\\' && c != '\0')
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let sanitized = sanitized.replace("..", "");
    let sanitized: String = sanitized.chars().take(100).collect();

    if sanitized.is_empty() || sanitized == "." {
        "document".into()
    } else {
        sanitized
    }
}

/// Filesystem-backed store rooted at one directory.
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let valid = !path.is_empty()
            && !path.split('/').any(str::is_empty)
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    /// List documents left behind by an interrupted upload.
    ///
    /// A crash between extraction and cleanup leaves the raw document in
    /// place. Nothing here deletes them.
    pub fn orphans(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.root) {
            Ok(e) => e,
            Err(_) => return Vec::new(), // Store dir may not exist yet
        };

        let mut found = Vec::new();
        for entry in entries.flatten() {
            let user_dir = entry.path();
            if !user_dir.is_dir() {
                continue;
            }
            let owner = entry.file_name().to_string_lossy().into_owned();
            let Ok(files) = fs::read_dir(&user_dir) else {
                continue;
            };
            for file in files.flatten() {
                if file.path().is_file() {
                    found.push(format!("{owner}/{}", file.file_name().to_string_lossy()));
                }
            }
        }
        found.sort();
        found
    }
}

impl DocumentStore for FsDocumentStore {
    fn upload(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full, bytes)?;
        Ok(())
    }

    fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let full = self.resolve(path)?;
        match fs::read(&full) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, path: &str) -> Result<(), StorageError> {
        let full = self.resolve(path)?;
        match fs::remove_file(&full) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
