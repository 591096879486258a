// src/types/activity.rs
use serde::{Deserialize, Serialize};

use crate::types::analysis::AnalysisInput;

/// Placeholder result type written when a submission starts
pub const PROCESSING_RESULT_TYPE: &str = "processing";

/// Row written to `activity_logs` when the analyze button is pressed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewActivityRecord {
    pub text_flg: bool,
    pub url_flg: bool,
    pub file_flg: bool,
    pub file_count: i64,
    pub result_type: String,
}

impl NewActivityRecord {
    pub fn for_input(input: &AnalysisInput) -> Self {
        Self {
            text_flg: input.has_text(),
            url_flg: input.has_url(),
            file_flg: input.has_files(),
            file_count: input.files.len() as i64,
            result_type: PROCESSING_RESULT_TYPE.to_string(),
        }
    }
}

/// Partial update; only the fields that are set are sent to the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sns_shared: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl ActivityUpdate {
    pub fn finished(result_type: &str) -> Self {
        Self {
            result_type: Some(result_type.to_string()),
            ..Default::default()
        }
    }

    pub fn shared(platform: &str) -> Self {
        Self {
            sns_shared: Some(true),
            platform: Some(platform.to_string()),
            ..Default::default()
        }
    }
}
