// src/analysis/mod.rs
//! Analysis client: turns one `AnalysisInput` into one validated `AnalysisResult`

pub mod error;
pub mod gemini;
pub mod request;

pub use error::AnalysisError;
pub use gemini::{parse_result, GeminiClient};
pub use request::{build_request, response_schema, GenerateContentRequest};

use async_trait::async_trait;

use crate::types::{AnalysisInput, AnalysisResult};

/// Generative model seam; injected into the orchestrator so tests can substitute it
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, input: &AnalysisInput) -> Result<AnalysisResult, AnalysisError>;
}
