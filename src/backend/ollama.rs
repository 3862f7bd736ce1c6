//! Ollama streaming backend
//!
//! Implements `ModelBackend` against POST /api/generate with `stream: true`.
//! Response bytes arrive as newline-delimited JSON; each object carries a
//! token fragment and a `done` flag that terminates the stream.

use crate::backend::parser::StreamParser;
use crate::backend::{ModelBackend, TokenChunk, TokenStream};
use crate::errors::{QaError, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default generation model
pub const DEFAULT_MODEL: &str = "mistral:latest";

/// Connect timeout for the initial request
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Ollama streaming client
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_OLLAMA_URL, DEFAULT_MODEL)
    }

    pub fn with_config(base_url: &str, model: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(QaError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check whether the Ollama service is reachable
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/version", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    async fn generate_stream(&self, prompt: String) -> Result<TokenStream> {
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            model: self.model.clone(),
            prompt,
            stream: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| QaError::BackendUnreachable(format!("failed to send request: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(QaError::BackendUnreachable(format!("HTTP {status}: {body}")));
        }

        let byte_stream = response.bytes_stream();

        // Each network chunk may contain zero or more complete JSON objects;
        // flatten them into one token chunk per object.
        let token_stream = byte_stream
            .map(|result| {
                result.map_err(|e| QaError::Stream(format!("stream read failed: {e}")))
            })
            .scan(StreamParser::new(), |parser, bytes: Result<bytes::Bytes>| {
                let chunks: Vec<Result<TokenChunk>> = match bytes {
                    Ok(bytes) => match parser.push_bytes(&bytes) {
                        Ok(objects) => objects.iter().map(|json| parse_chunk(json)).collect(),
                        Err(e) => vec![Err(e)],
                    },
                    Err(e) => vec![Err(e)],
                };
                std::future::ready(Some(futures_util::stream::iter(chunks)))
            })
            .flatten();

        Ok(Box::pin(token_stream))
    }
}

fn parse_chunk(json: &str) -> Result<TokenChunk> {
    let parsed: GenerateChunk = serde_json::from_str(json)
        .map_err(|e| QaError::Stream(format!("malformed stream object: {e}")))?;

    Ok(TokenChunk {
        text: parsed.response,
        done: parsed.done,
    })
}

/// Ollama generate request
#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// One NDJSON object from the generate stream
#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}
