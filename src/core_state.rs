//! Application state shared by every request handler.
//!
//! Holds the database location, the document store, the factory for
//! extraction clients and one report book per user. Each request opens its
//! own SQLite connection.
//!
//! A user's book sits behind an async mutex. Holding its guard is the only
//! way to change that user's reports, so uploads, manual entries and
//! deletes for one user run one at a time in arrival order.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db;
use crate::extraction::{AnthropicExtractor, ExtractionError, ExtractorFactory, LabExtractor};
use crate::reports::ReportBook;
use crate::storage::{DocumentStore, FsDocumentStore};

/// Exclusive access to one user's report book.
pub type BookGuard = OwnedMutexGuard<ReportBook>;

pub struct CoreState {
    db_path: PathBuf,
    documents: Arc<dyn DocumentStore>,
    extractor_factory: ExtractorFactory,
    books: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<ReportBook>>>>,
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Data directory error: {0}")]
    DataDir(#[from] std::io::Error),
    #[error("State lock poisoned")]
    LockPoisoned,
}

impl CoreState {
    /// Production wiring: SQLite file, filesystem documents, Anthropic extractor.
    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        std::fs::create_dir_all(&config.data_dir)?;
        std::fs::create_dir_all(config.documents_dir())?;

        let documents = FsDocumentStore::new(config.documents_dir());
        for path in documents.orphans() {
            tracing::warn!(path, "Document left from an interrupted upload, kept for recovery");
        }

        let extraction = config.extraction.clone();
        let factory: ExtractorFactory = Arc::new(move || {
            AnthropicExtractor::new(&extraction)
                .map(|client| Box::new(client) as Box<dyn LabExtractor + Send>)
        });

        let state = Self::new(config.database_path(), Arc::new(documents), factory);
        // Run migrations once up front so a broken schema fails startup.
        state.open_db()?;
        Ok(state)
    }

    pub fn new(
        db_path: PathBuf,
        documents: Arc<dyn DocumentStore>,
        extractor_factory: ExtractorFactory,
    ) -> Self {
        Self {
            db_path,
            documents,
            extractor_factory,
            books: Mutex::new(HashMap::new()),
        }
    }

    /// Open a fresh connection to the database.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        Ok(db::open_database(&self.db_path)?)
    }

    pub fn documents(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(&self.documents)
    }

    /// Build an extraction client for one upload batch.
    pub fn extractor(&self) -> Result<Box<dyn LabExtractor + Send>, ExtractionError> {
        (self.extractor_factory)()
    }

    /// Wait for exclusive access to `user_id`'s report book.
    ///
    /// The book is loaded from the database on first use and kept for the
    /// life of the process.
    pub async fn book(&self, user_id: Uuid) -> Result<BookGuard, CoreError> {
        let handle = {
            let mut books = self.books.lock().map_err(|_| CoreError::LockPoisoned)?;
            match books.get(&user_id) {
                Some(handle) => Arc::clone(handle),
                None => {
                    let conn = self.open_db()?;
                    let book = ReportBook::load(&conn, user_id)?;
                    let handle = Arc::new(tokio::sync::Mutex::new(book));
                    books.insert(user_id, Arc::clone(&handle));
                    handle
                }
            }
        }; // MutexGuard dropped here, before any .await
        Ok(handle.lock_owned().await)
    }
}
