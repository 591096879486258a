// src/web/types.rs

use rocket::form::FromForm;
use rocket::fs::TempFile;
use rocket::http::ContentType;
use rocket::response::content::RawHtml;
use rocket::response::{self, Responder};
use rocket::serde::{Deserialize, Serialize};
use rocket::{Request, Response};

use crate::orchestrator::{AppState, Orchestrator};
use crate::types::AnalysisResult;

/// Binary download with a Content-Disposition that survives non-ASCII type labels
pub struct DownloadResponse {
    pub data: Vec<u8>,
    pub content_type: ContentType,
    pub filename: Option<String>,
}

impl DownloadResponse {
    pub fn png(data: Vec<u8>, filename: String) -> Self {
        Self {
            data,
            content_type: ContentType::PNG,
            filename: Some(filename),
        }
    }

    pub fn pdf(data: Vec<u8>, filename: String) -> Self {
        Self {
            data,
            content_type: ContentType::PDF,
            filename: Some(filename),
        }
    }
}

/// `filename` carries an ASCII fallback, `filename*` the exact UTF-8 name
pub fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

impl<'r> Responder<'r, 'static> for DownloadResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let mut binding = Response::build();
        let mut response = binding
            .header(self.content_type)
            .sized_body(self.data.len(), std::io::Cursor::new(self.data));

        if let Some(filename) = self.filename {
            response = response.raw_header("Content-Disposition", content_disposition(&filename));
        }

        response.ok()
    }
}

/// A PDF when the document could be assembled, otherwise the print view
#[derive(rocket::Responder)]
pub enum PdfDownload {
    Document(DownloadResponse),
    Print(RawHtml<String>),
}

#[derive(FromForm)]
pub struct FileSelectionForm<'f> {
    pub files: Vec<TempFile<'f>>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct TextInputRequest {
    pub text: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct AttachmentInfo {
    pub file_name: String,
    pub mime_type: String,
}

/// Everything a client needs to draw the current screen
#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct SessionSnapshot {
    pub session_id: String,
    pub state: &'static str,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub files: Vec<AttachmentInfo>,
    pub can_submit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SessionSnapshot {
    pub fn of(session_id: &str, orchestrator: &Orchestrator) -> Self {
        let collector = orchestrator.collector();
        let state = orchestrator.state();

        let (result, error) = match state {
            AppState::Result(view) => (Some(view.result.clone()), None),
            AppState::Error { message } => (None, Some(message.clone())),
            AppState::Collecting | AppState::Loading => (None, None),
        };

        Self {
            session_id: session_id.to_string(),
            state: state.name(),
            text: collector.text().to_string(),
            url: collector.url().map(str::to_string),
            files: collector
                .files()
                .iter()
                .map(|f| AttachmentInfo {
                    file_name: f.file_name.clone(),
                    mime_type: f.mime_type.clone(),
                })
                .collect(),
            can_submit: orchestrator.can_submit(),
            result,
            error,
        }
    }
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct FileSelectionData {
    pub accepted: Vec<String>,
    pub rejected: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    pub session: SessionSnapshot,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ShareData {
    pub platform: String,
    pub intent_url: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct HealthData {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub analysis_configured: bool,
    pub activity_logging: bool,
}

// STANDARD RESPONSE ENVELOPES

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct TextResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DataResponse<T> {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ActionResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_actions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardErrorResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum ResponseType {
    Text,
    Data,
    Action,
    Error,
}

impl TextResponse {
    pub fn success(message: String, session_id: Option<String>) -> Self {
        Self {
            response_type: ResponseType::Text,
            success: true,
            message,
            session_id,
        }
    }
}

impl<T> DataResponse<T> {
    pub fn success(message: String, data: T, session_id: Option<String>) -> Self {
        Self {
            response_type: ResponseType::Data,
            success: true,
            message,
            data,
            session_id,
        }
    }
}

impl ActionResponse {
    pub fn success(message: String, action: String, session_id: Option<String>) -> Self {
        Self {
            response_type: ResponseType::Action,
            success: true,
            message,
            action,
            next_actions: None,
            session_id,
        }
    }

    pub fn with_next_actions(mut self, next_actions: Vec<String>) -> Self {
        self.next_actions = Some(next_actions);
        self
    }
}

impl StandardErrorResponse {
    pub fn new(
        error: String,
        error_code: String,
        suggestions: Vec<String>,
        session_id: Option<String>,
    ) -> Self {
        Self {
            response_type: ResponseType::Error,
            success: false,
            error,
            error_code,
            suggestions,
            session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_keeps_utf8_name() {
        let header = content_disposition("CommuDic_Card_探究者.png");
        assert!(header.starts_with("attachment; filename=\"CommuDic_Card____.png\""));
        assert!(header.contains("filename*=UTF-8''CommuDic_Card_%E6%8E%A2%E7%A9%B6%E8%80%85.png"));
    }

    #[test]
    fn test_ascii_name_keeps_spaces() {
        let header = content_disposition("CommuDic_Profile_Creative Analyst.pdf");
        assert!(header.contains("filename=\"CommuDic_Profile_Creative Analyst.pdf\""));
        assert!(header.contains("filename*=UTF-8''CommuDic_Profile_Creative%20Analyst.pdf"));
    }
}
