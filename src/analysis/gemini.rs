// src/analysis/gemini.rs
//! Gemini generateContent client - one attempt per submission, no retry

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info, warn};

use super::error::AnalysisError;
use super::request::build_request;
use super::Analyzer;
use crate::config::GeminiConfig;
use crate::types::{AnalysisInput, AnalysisResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    message: String,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, `None` when the model produced no text
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        (!text.is_empty()).then_some(text)
    }
}

/// Missing text is parsed as an empty object, so it fails on the first required field
pub fn parse_result(text: Option<&str>) -> Result<AnalysisResult, AnalysisError> {
    let raw = text.map(str::trim).filter(|t| !t.is_empty()).unwrap_or("{}");
    serde_json::from_str::<AnalysisResult>(raw).map_err(|e| AnalysisError::Parse(e.to_string()))
}

pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(std::time::Duration::from_secs(seconds));
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        if config.api_key.is_none() {
            warn!("GEMINI_API_KEY is not set; every analysis will fail until it is configured");
        }

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl Analyzer for GeminiClient {
    async fn analyze(&self, input: &AnalysisInput) -> Result<AnalysisResult, AnalysisError> {
        let api_key = self.api_key.as_deref().ok_or(AnalysisError::MissingApiKey)?;
        let request = build_request(input);

        info!(
            "Calling Gemini model {} with {} file part(s)",
            self.model,
            input.files.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<GoogleErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            error!("Gemini API error {}: {}", status, message);
            return Err(AnalysisError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| AnalysisError::Parse(format!("unexpected response envelope: {}", e)))?;

        let result = parse_result(parsed.text().as_deref())?;
        info!("Gemini analysis completed, type: {}", result.result_type);
        Ok(result)
    }
}
