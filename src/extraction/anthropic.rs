use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::parser::parse_extraction_response;
use super::prompt::{build_system_prompt, build_user_prompt};
use super::{ExtractionError, LabExtractor, RawLabValues};
use crate::config::ExtractionConfig;

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicExtractor {
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl AnthropicExtractor {
    pub fn new(config: &ExtractionConfig) -> Result<Self, ExtractionError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ExtractionError::NotConfigured)?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ExtractionError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            client,
            timeout_secs: config.timeout_secs,
        })
    }

    fn send(&self, body: &MessagesRequest<'_>) -> Result<MessagesResponse, ExtractionError> {
        let url = format!("{}/v1/messages", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ExtractionError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    ExtractionError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    ExtractionError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExtractionError::Service {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .map_err(|e| ExtractionError::MalformedResponse(e.to_string()))
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock<'a> {
    Document { source: DocumentSource },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct DocumentSource {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'static str,
    data: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: Option<String>,
}

impl MessagesResponse {
    fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| block.text.as_deref())
            .collect()
    }
}

impl LabExtractor for AnthropicExtractor {
    fn extract(&self, document: &[u8], filename: &str) -> Result<RawLabValues, ExtractionError> {
        if document.is_empty() {
            return Err(ExtractionError::EmptyDocument);
        }

        let system = build_system_prompt();
        let user_text = build_user_prompt(filename);
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: &system,
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentBlock::Document {
                        source: DocumentSource {
                            kind: "base64",
                            media_type: "application/pdf",
                            data: STANDARD.encode(document),
                        },
                    },
                    ContentBlock::Text { text: &user_text },
                ],
            }],
        };

        tracing::debug!(model = %self.model, filename, bytes = document.len(), "Requesting extraction");
        let reply = self.send(&body)?;
        parse_extraction_response(&reply.joined_text())
    }
}
