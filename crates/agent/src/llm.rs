use std::time::Duration;

use async_trait::async_trait;
use cellarhand_core::config::LlmConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Reply used when the completion API answers without any text.
pub const EMPTY_REPLY_FALLBACK: &str = "Database error.";

/// One fully-assembled completion call: system instruction with the embedded
/// inventory context, the trimmed conversation, and the sampling temperature.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub system_instruction: String,
    pub contents: Vec<TurnContent>,
    pub temperature: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TurnContent {
    pub role: &'static str,
    pub parts: Vec<TurnPart>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TurnPart {
    pub text: String,
}

impl TurnContent {
    pub fn new(role: &'static str, text: impl Into<String>) -> Self {
        Self { role, parts: vec![TurnPart { text: text.into() }] }
    }
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("no completion api key is configured")]
    MissingApiKey,
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("completion api returned status {status}: {body}")]
    Status { status: reqwest::StatusCode, body: String },
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

/// `generateContent` client for the hosted Gemini API.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
    max_retries: u32,
}

impl GeminiClient {
    pub fn new(config: &LlmConfig) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    async fn dispatch(
        &self,
        api_key: &str,
        body: &GenerateContentBody<'_>,
    ) -> Result<GenerateContentResponse, CompletionError> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status { status, body });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let api_key = self.api_key.as_ref().ok_or(CompletionError::MissingApiKey)?;
        let body = GenerateContentBody::from_request(request);

        let mut attempt = 0u32;
        let response = loop {
            match self.dispatch(api_key.expose_secret(), &body).await {
                Ok(response) => break response,
                Err(error) if attempt < self.max_retries && error.is_retryable() => {
                    attempt += 1;
                    debug!(
                        event_name = "llm.complete.retry",
                        attempt,
                        error = %error,
                        "completion attempt failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(250 * u64::from(attempt))).await;
                }
                Err(error) => return Err(error),
            }
        };

        Ok(reply_text(response).unwrap_or_else(|| EMPTY_REPLY_FALLBACK.to_string()))
    }
}

impl CompletionError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(error) => !error.is_builder(),
            Self::Status { status, .. } => status.is_server_error(),
            Self::MissingApiKey => false,
        }
    }
}

// Wire types for the `generateContent` REST shape.

#[derive(Debug, Serialize)]
struct GenerateContentBody<'a> {
    #[serde(rename = "systemInstruction")]
    system_instruction: WirePrompt<'a>,
    contents: &'a [TurnContent],
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct WirePrompt<'a> {
    parts: [WireText<'a>; 1],
}

#[derive(Debug, Serialize)]
struct WireText<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

impl<'a> GenerateContentBody<'a> {
    fn from_request(request: &'a CompletionRequest) -> Self {
        Self {
            system_instruction: WirePrompt {
                parts: [WireText { text: &request.system_instruction }],
            },
            contents: &request.contents,
            generation_config: GenerationConfig { temperature: request.temperature },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

fn reply_text(response: GenerateContentResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text = content
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect::<Vec<String>>()
        .join("");

    (!text.trim().is_empty()).then_some(text)
}
