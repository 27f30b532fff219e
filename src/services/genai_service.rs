use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::env;
use std::error::Error;
use std::fmt;

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug)]
pub enum TextGenError {
    EnvironmentError(String),
    HttpError(reqwest::Error),
    ResponseError(String),
}

impl fmt::Display for TextGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextGenError::EnvironmentError(msg) => write!(f, "Environment error: {}", msg),
            TextGenError::HttpError(err) => write!(f, "HTTP error: {}", err),
            TextGenError::ResponseError(msg) => write!(f, "Response error: {}", msg),
        }
    }
}

impl Error for TextGenError {}

impl From<reqwest::Error> for TextGenError {
    fn from(err: reqwest::Error) -> Self {
        TextGenError::HttpError(err)
    }
}

/// Opaque text generation: prompt in, free-text reply out. Handlers receive
/// this as an injected collaborator so tests can substitute a fake.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, TextGenError>;
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new() -> Result<Self, TextGenError> {
        let api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| TextGenError::EnvironmentError("GEMINI_API_KEY not set".to_string()))?;

        let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self {
            client: Client::new(),
            api_key,
            model,
            base_url: API_BASE_URL.to_string(),
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, TextGenError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TextGenError::ResponseError(format!(
                "Generation request failed with status {}: {}",
                status, error_text
            )));
        }

        let reply: GenerateContentResponse = response.json().await.map_err(|e| {
            TextGenError::ResponseError(format!("Failed to parse response: {}", e))
        })?;

        let candidate = reply
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| TextGenError::ResponseError("Reply has no candidates".to_string()))?;

        let text = candidate
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(TextGenError::ResponseError(
                "Reply candidate has no text parts".to_string(),
            ));
        }

        Ok(text)
    }
}
