//! Lab value extraction from uploaded report documents.
//!
//! The extractor is a collaborator behind [`LabExtractor`]; the Anthropic
//! Messages API is the production implementation. Clients are blocking and
//! are built per upload batch inside `spawn_blocking`.

pub mod anthropic;
pub mod parser;
pub mod prompt;

use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

pub use anthropic::AnthropicExtractor;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Extraction service is not configured (missing API key)")]
    NotConfigured,

    #[error("Extraction service unreachable at {0}")]
    Connection(String),

    #[error("Extraction service returned error (status {status}): {body}")]
    Service { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed extraction response: {0}")]
    MalformedResponse(String),

    #[error("Document is empty")]
    EmptyDocument,
}

/// Raw key/value output of one extraction, before normalization.
pub type RawLabValues = Map<String, Value>;

/// Turns a report document into raw lab values.
pub trait LabExtractor {
    fn extract(&self, document: &[u8], filename: &str) -> Result<RawLabValues, ExtractionError>;
}

/// Builds a fresh extractor for one upload batch.
pub type ExtractorFactory =
    Arc<dyn Fn() -> Result<Box<dyn LabExtractor + Send>, ExtractionError> + Send + Sync>;

/// Extractor returning a canned model reply, run through the real parser.
pub struct MockExtractor {
    replies: std::sync::Mutex<std::collections::VecDeque<Result<String, u16>>>,
    fallback: String,
}

impl MockExtractor {
    pub fn new(response: &str) -> Self {
        Self {
            replies: std::sync::Mutex::new(Default::default()),
            fallback: response.to_string(),
        }
    }

    /// Queue replies consumed in order; `Err(status)` simulates a service failure.
    pub fn with_replies(mut self, replies: Vec<Result<String, u16>>) -> Self {
        self.replies = std::sync::Mutex::new(replies.into());
        self
    }

    /// Factory handing out extractors that all reply with `response`.
    pub fn factory(response: &str) -> ExtractorFactory {
        let response = response.to_string();
        Arc::new(move || Ok(Box::new(MockExtractor::new(&response)) as Box<dyn LabExtractor + Send>))
    }
}

impl LabExtractor for MockExtractor {
    fn extract(&self, document: &[u8], _filename: &str) -> Result<RawLabValues, ExtractionError> {
        if document.is_empty() {
            return Err(ExtractionError::EmptyDocument);
        }
        let next = self
            .replies
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front());
        match next {
            Some(Ok(text)) => parser::parse_extraction_response(&text),
            Some(Err(status)) => Err(ExtractionError::Service {
                status,
                body: "mock failure".into(),
            }),
            None => parser::parse_extraction_response(&self.fallback),
        }
    }
}
