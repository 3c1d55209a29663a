//! Sequential processing of an uploaded batch of lab report PDFs.
//!
//! Each file is stored, extracted, normalized and inserted before the next
//! one starts. A failure only affects its own file; reports committed for
//! earlier files stay committed. The raw document is removed once the
//! file's outcome is known.

use rusqlite::Connection;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::MAX_UPLOAD_FILES;
use crate::db::{self, DatabaseError};
use crate::extraction::{ExtractionError, LabExtractor};
use crate::labs::{self, ValidationError};
use crate::models::{Report, ReportSource};
use crate::reports::{ReportBook, ReportChange};
use crate::storage::{document_path, DocumentStore, StorageError};

const PDF_MAGIC: &[u8] = b"%PDF-";

/// One file of an upload batch.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Success,
    Error,
}

/// Per-file result reported back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub name: String,
    pub status: UploadStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<Report>,
}

/// Why a single file failed.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Not a PDF")]
    NotPdf,

    #[error("Upload failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Invalid extracted data: {0}")]
    Validation(#[from] ValidationError),

    #[error("Saving report failed: {0}")]
    Database(#[from] DatabaseError),
}

/// Why a whole batch was refused before any file was touched.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BatchError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Maximum {max} files per upload batch")]
    TooManyFiles { max: usize },
}

/// Filename ends in `.pdf` and the bytes carry the PDF signature.
pub fn is_pdf(name: &str, bytes: &[u8]) -> bool {
    name.to_ascii_lowercase().ends_with(".pdf") && bytes.starts_with(PDF_MAGIC)
}

/// Process `files` in order for `owner`, recording new reports in `book`.
pub fn process_batch(
    conn: &Connection,
    store: &dyn DocumentStore,
    extractor: &dyn LabExtractor,
    owner: Option<Uuid>,
    files: Vec<UploadFile>,
    book: &mut ReportBook,
) -> Result<Vec<UploadOutcome>, BatchError> {
    let owner = owner.ok_or(BatchError::Unauthenticated)?;
    if files.len() > MAX_UPLOAD_FILES {
        return Err(BatchError::TooManyFiles {
            max: MAX_UPLOAD_FILES,
        });
    }

    let total = files.len();
    let mut outcomes = Vec::with_capacity(total);

    for (i, file) in files.into_iter().enumerate() {
        match process_file(conn, store, extractor, owner, &file) {
            Ok(report) => {
                tracing::info!(
                    report_id = %report.id,
                    report_date = %report.report_date,
                    current = i + 1,
                    total,
                    "Upload batch: file completed"
                );
                outcomes.push(UploadOutcome {
                    name: file.name,
                    status: UploadStatus::Success,
                    message: format!("Extracted · {}", report.report_date),
                    report: Some(report.clone()),
                });
                book.apply(ReportChange::Added(report));
            }
            Err(e) => {
                tracing::warn!(
                    file = %file.name,
                    error = %e,
                    current = i + 1,
                    total,
                    "Upload batch: file failed"
                );
                outcomes.push(UploadOutcome {
                    name: file.name,
                    status: UploadStatus::Error,
                    message: e.to_string(),
                    report: None,
                });
            }
        }
    }

    Ok(outcomes)
}

fn process_file(
    conn: &Connection,
    store: &dyn DocumentStore,
    extractor: &dyn LabExtractor,
    owner: Uuid,
    file: &UploadFile,
) -> Result<Report, UploadError> {
    if !is_pdf(&file.name, &file.bytes) {
        return Err(UploadError::NotPdf);
    }

    let path = document_path(owner, &file.name);
    store.upload(&path, &file.bytes)?;

    let extracted = store
        .download(&path)
        .map_err(UploadError::from)
        .and_then(|document| Ok(extractor.extract(&document, &file.name)?));
    let raw = match extracted {
        Ok(raw) => raw,
        Err(e) => {
            discard(store, &path);
            return Err(e);
        }
    };

    let saved = labs::normalize(&raw, owner, ReportSource::Pdf, Some(&file.name))
        .map_err(UploadError::from)
        .and_then(|report| Ok(db::insert_report(conn, &report)?));
    discard(store, &path);
    saved
}

fn discard(store: &dyn DocumentStore, path: &str) {
    if let Err(e) = store.delete(path) {
        tracing::warn!(path, error = %e, "Failed to remove uploaded document");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::extraction::MockExtractor;
    use crate::models::ParameterKey;
    use crate::storage::FsDocumentStore;

    const MARCH: &str = r#"```json
{"report_date": "2024-03", "hba1c": 5.9, "ldl": 131, "glucose": null}
```"#;

    fn pdf(name: &str) -> UploadFile {
        UploadFile {
            name: name.into(),
            bytes: b"%PDF-1.4 fake report".to_vec(),
        }
    }

    fn setup() -> (Connection, tempfile::TempDir, Uuid) {
        let conn = open_memory_database().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let user = db::insert_user(&conn, "a@example.com", "A", "h").unwrap();
        (conn, dir, user.id)
    }

    fn stored_files(dir: &tempfile::TempDir) -> usize {
        fn walk(path: &std::path::Path) -> usize {
            std::fs::read_dir(path)
                .map(|entries| {
                    entries
                        .flatten()
                        .map(|e| if e.path().is_dir() { walk(&e.path()) } else { 1 })
                        .sum()
                })
                .unwrap_or(0)
        }
        walk(dir.path())
    }

    #[test]
    fn pdf_detection_needs_name_and_signature() {
        assert!(is_pdf("report.PDF", b"%PDF-1.7"));
        assert!(!is_pdf("report.txt", b"%PDF-1.7"));
        assert!(!is_pdf("report.pdf", b"PK\x03\x04"));
    }

    #[test]
    fn successful_file_persists_report_and_removes_document() {
        let (conn, dir, owner) = setup();
        let store = FsDocumentStore::new(dir.path());
        let extractor = MockExtractor::new(MARCH);
        let mut book = ReportBook::default();

        let outcomes =
            process_batch(&conn, &store, &extractor, Some(owner), vec![pdf("march.pdf")], &mut book)
                .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, UploadStatus::Success);
        assert_eq!(outcomes[0].message, "Extracted · 2024-03");
        let report = outcomes[0].report.as_ref().unwrap();
        assert_eq!(report.filename.as_deref(), Some("march.pdf"));
        assert_eq!(report.value(ParameterKey::Ldl), Some(131.0));
        assert!(!report.values.contains_key(&ParameterKey::Glucose));

        assert_eq!(book.len(), 1);
        assert_eq!(book.version(), 1);
        assert_eq!(db::list_reports_for_user(&conn, owner).unwrap().len(), 1);
        assert_eq!(stored_files(&dir), 0);
    }

    #[test]
    fn failures_are_isolated_per_file() {
        let (conn, dir, owner) = setup();
        let store = FsDocumentStore::new(dir.path());
        let extractor = MockExtractor::new(MARCH).with_replies(vec![
            Ok(MARCH.to_string()),
            Ok("Sorry, I cannot read this document.".to_string()),
            Err(529),
        ]);
        let mut book = ReportBook::default();
        let files = vec![
            pdf("a.pdf"),
            pdf("b.pdf"),
            UploadFile {
                name: "notes.txt".into(),
                bytes: b"hello".to_vec(),
            },
            pdf("c.pdf"),
        ];

        let outcomes =
            process_batch(&conn, &store, &extractor, Some(owner), files, &mut book).unwrap();

        let statuses: Vec<_> = outcomes.iter().map(|o| o.status).collect();
        assert_eq!(
            statuses,
            vec![
                UploadStatus::Success,
                UploadStatus::Error,
                UploadStatus::Error,
                UploadStatus::Error
            ]
        );
        assert!(outcomes[1].message.starts_with("Extraction failed"));
        assert_eq!(outcomes[2].message, "Not a PDF");
        assert!(outcomes[3].message.contains("529"));

        assert_eq!(db::list_reports_for_user(&conn, owner).unwrap().len(), 1);
        assert_eq!(book.len(), 1);
        assert_eq!(stored_files(&dir), 0);
    }

    #[test]
    fn invalid_extracted_values_fail_the_file() {
        let (conn, dir, owner) = setup();
        let store = FsDocumentStore::new(dir.path());
        let extractor = MockExtractor::new(r#"{"ldl": "131 mg/dL"}"#);
        let mut book = ReportBook::default();

        let outcomes =
            process_batch(&conn, &store, &extractor, Some(owner), vec![pdf("a.pdf")], &mut book)
                .unwrap();
        assert_eq!(outcomes[0].status, UploadStatus::Error);
        assert!(outcomes[0].message.contains("ldl"));
        assert!(book.is_empty());
        assert_eq!(stored_files(&dir), 0);
    }

    #[test]
    fn missing_identity_refuses_batch() {
        let (conn, dir, _) = setup();
        let store = FsDocumentStore::new(dir.path());
        let extractor = MockExtractor::new(MARCH);
        let mut book = ReportBook::default();

        let err = process_batch(&conn, &store, &extractor, None, vec![pdf("a.pdf")], &mut book)
            .unwrap_err();
        assert_eq!(err, BatchError::Unauthenticated);
        assert_eq!(book.version(), 0);
    }

    #[test]
    fn oversized_batch_is_refused() {
        let (conn, dir, owner) = setup();
        let store = FsDocumentStore::new(dir.path());
        let extractor = MockExtractor::new(MARCH);
        let mut book = ReportBook::default();
        let files = (0..=MAX_UPLOAD_FILES).map(|i| pdf(&format!("{i}.pdf"))).collect();

        let err = process_batch(&conn, &store, &extractor, Some(owner), files, &mut book)
            .unwrap_err();
        assert_eq!(err, BatchError::TooManyFiles { max: MAX_UPLOAD_FILES });
        assert!(db::list_reports_for_user(&conn, owner).unwrap().is_empty());
    }

    struct BrokenStore;

    impl DocumentStore for BrokenStore {
        fn upload(&self, _path: &str, _bytes: &[u8]) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }
        fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
            Err(StorageError::NotFound(path.to_string()))
        }
        fn delete(&self, _path: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn storage_failure_skips_extraction() {
        let (conn, _dir, owner) = setup();
        let extractor = MockExtractor::new(MARCH);
        let mut book = ReportBook::default();

        let outcomes = process_batch(
            &conn,
            &BrokenStore,
            &extractor,
            Some(owner),
            vec![pdf("a.pdf")],
            &mut book,
        )
        .unwrap();
        assert_eq!(outcomes[0].status, UploadStatus::Error);
        assert!(outcomes[0].message.starts_with("Upload failed"));
        assert!(book.is_empty());
    }
}
