//! Best-effort tutor feedback from a hosted model.
//!
//! Game state never depends on this module. Every failure is reduced to a
//! fixed message by [`critique_or_fallback`].

use crate::board::Cell;
use crate::config::AdvisorConfig;
use crate::ledger::Evidence;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const MISSING_KEY_HINT: &str = "Configure an API key to receive the tutor's feedback.";

#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("network error: {0}")]
    Network(String),
    #[error("API error: status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("parse error: {0}")]
    Parse(String),
    #[error("empty response from advisor")]
    EmptyResponse,
}

pub trait Advisor {
    fn critique(&self, request: &CritiqueRequest) -> Result<String, AdvisoryError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CritiqueRequest {
    pub task_label: String,
    pub action_label: String,
    pub evidence: Option<Evidence>,
}

impl CritiqueRequest {
    pub fn new(task_label: impl Into<String>, action_label: impl Into<String>) -> Self {
        Self {
            task_label: task_label.into(),
            action_label: action_label.into(),
            evidence: None,
        }
    }

    pub fn for_cell(cell: &Cell) -> Self {
        Self::new(cell.name, cell.action)
    }

    /// Attaches the evidence image; an empty payload is treated as none.
    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence = (!evidence.is_empty()).then_some(evidence);
        self
    }

    pub fn prompt(&self) -> String {
        let observation = if self.evidence.is_some() {
            "The student has uploaded a photo of their work. Judge whether it roughly \
             matches the expected brushwork, ink or color technique."
        } else {
            "The student has not uploaded a photo yet and is asking for guidance."
        };
        format!(
            "You are a wise, poetic and encouraging master of traditional Chinese painting.\n\
             The student is performing the task: \"{}\" - \"{}\".\n\
             {observation}\n\
             Reply with two short sentences:\n\
             1. A poetic observation drawn from nature or Zen philosophy.\n\
             2. One specific, encouraging tip based on the photo if provided, \
             otherwise on general technique.",
            self.task_label, self.action_label
        )
    }
}

/// Returns the advisor's text, or a fixed message when it cannot answer.
pub fn critique_or_fallback<A: Advisor + ?Sized>(
    advisor: &A,
    request: &CritiqueRequest,
    fallback: &str,
) -> String {
    match advisor.critique(request) {
        Ok(text) => text,
        Err(AdvisoryError::MissingApiKey) => {
            debug!("advisor skipped: no API key");
            MISSING_KEY_HINT.to_string()
        }
        Err(err) => {
            warn!(task = %request.task_label, error = %err, "advisor unavailable");
            fallback.to_string()
        }
    }
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize, Debug)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize, Debug)]
struct Part {
    text: Option<String>,
}

/// Gemini `generateContent` client.
pub struct GeminiAdvisor {
    config: AdvisorConfig,
    client: reqwest::blocking::Client,
}

impl GeminiAdvisor {
    pub fn new(config: AdvisorConfig) -> Result<Self, AdvisoryError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AdvisoryError::Network(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn body(request: &CritiqueRequest) -> Value {
        let mut parts = Vec::new();
        if let Some(evidence) = &request.evidence {
            parts.push(json!({
                "inlineData": {
                    "mimeType": evidence.mime().unwrap_or("image/jpeg"),
                    "data": STANDARD.encode(evidence.as_bytes()),
                }
            }));
        }
        parts.push(json!({ "text": request.prompt() }));
        json!({ "contents": [{ "parts": parts }] })
    }
}

impl Advisor for GeminiAdvisor {
    fn critique(&self, request: &CritiqueRequest) -> Result<String, AdvisoryError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(AdvisoryError::MissingApiKey)?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        debug!(%url, image = request.evidence.is_some(), "requesting critique");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&Self::body(request))
            .send()
            .map_err(|e| AdvisoryError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(AdvisoryError::Api { status, body });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| AdvisoryError::Parse(e.to_string()))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            Err(AdvisoryError::EmptyResponse)
        } else {
            Ok(text)
        }
    }
}
