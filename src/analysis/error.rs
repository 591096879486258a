// src/analysis/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Gemini API key is not configured")]
    MissingApiKey,
    #[error("Gemini API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("request to Gemini failed: {0}")]
    Transport(String),
    #[error("failed to parse analysis result: {0}")]
    Parse(String),
}

impl AnalysisError {
    /// Status-like code used to pick actionable guidance for the user
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            // Same guidance as a rejected key
            Self::MissingApiKey => Some(401),
            Self::Transport(_) | Self::Parse(_) => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingApiKey => "ANALYSIS_NOT_CONFIGURED",
            Self::Api { .. } => "ANALYSIS_API_ERROR",
            Self::Transport(_) => "ANALYSIS_TRANSPORT_ERROR",
            Self::Parse(_) => "ANALYSIS_PARSE_ERROR",
        }
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::Api {
                status: status.as_u16(),
                message: e.to_string(),
            },
            None => Self::Transport(e.to_string()),
        }
    }
}
