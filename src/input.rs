// src/input.rs
//! Input collector: free text plus allow-listed document attachments

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::types::{AnalysisInput, FileAttachment};

// Gemini's Developer API only accepts PDFs and plain text as document inputs.
// Office formats produce "Unsupported MIME type" 400s, so they are stopped here.
pub const SUPPORTED_MIME_TYPES: [&str; 2] = ["application/pdf", "text/plain"];

const REJECTION_HEADER: &str = "以下のファイル形式は現在のAPIではサポートされていません。PDF（.pdf）またはテキスト（.txt）に変換してからアップロードしてください。";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("no file at position {0}")]
    NoSuchFile(usize),
    #[error("nothing to submit: enter some text or attach a file")]
    NothingToSubmit,
    #[error("failed to encode {file_name}: {reason}")]
    Encoding { file_name: String, reason: String },
}

/// A file as handed over by the caller, before validation
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(file_name: impl Into<String>, content_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.map(str::to_string),
            bytes,
        }
    }
}

/// User-visible notice listing the files that were refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectionNotice {
    pub rejected: Vec<String>,
}

impl RejectionNotice {
    pub fn message(&self) -> String {
        format!("{}\n\n{}", REJECTION_HEADER, self.rejected.join("\n"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionOutcome {
    pub accepted: Vec<String>,
    pub rejection: Option<RejectionNotice>,
}

/// Checks the declared content type against the allow-list, ignoring parameters like charset
pub fn is_supported_mime_type(content_type: Option<&str>) -> bool {
    content_type
        .map(essence_of)
        .is_some_and(|essence| SUPPORTED_MIME_TYPES.contains(&essence.as_str()))
}

fn essence_of(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[derive(Debug, Clone, Default)]
pub struct InputCollector {
    text: String,
    url: Option<String>,
    files: Vec<FileAttachment>,
}

impl InputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// URL is passed to the model as prompt text only; it is never fetched
    pub fn set_url(&mut self, url: Option<String>) {
        self.url = url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
    }

    pub fn files(&self) -> &[FileAttachment] {
        &self.files
    }

    /// Validates a batch of selected files and appends the accepted ones in selection order.
    ///
    /// Encoding runs concurrently, one blocking task per file; nothing is appended until
    /// every accepted file has been encoded.
    pub async fn select_files(
        &mut self,
        selection: Vec<SelectedFile>,
    ) -> Result<SelectionOutcome, InputError> {
        let mut allowed = Vec::new();
        let mut rejected = Vec::new();

        for file in selection {
            if is_supported_mime_type(file.content_type.as_deref()) {
                allowed.push(file);
            } else {
                warn!(
                    "Rejected file {} with content type {:?}",
                    file.file_name, file.content_type
                );
                rejected.push(file.file_name);
            }
        }

        let rejection = (!rejected.is_empty()).then(|| RejectionNotice { rejected });

        if allowed.is_empty() {
            return Ok(SelectionOutcome {
                accepted: Vec::new(),
                rejection,
            });
        }

        let encoded = join_all(allowed.into_iter().map(encode_file)).await;
        let encoded = encoded.into_iter().collect::<Result<Vec<_>, _>>()?;

        let accepted = encoded.iter().map(|f| f.file_name.clone()).collect();
        info!("Accepted {} file(s)", encoded.len());
        self.files.extend(encoded);

        Ok(SelectionOutcome {
            accepted,
            rejection,
        })
    }

    pub fn remove_file(&mut self, index: usize) -> Result<FileAttachment, InputError> {
        if index >= self.files.len() {
            return Err(InputError::NoSuchFile(index));
        }
        let removed = self.files.remove(index);
        debug!("Removed file {} at position {}", removed.file_name, index);
        Ok(removed)
    }

    pub fn can_submit(&self) -> bool {
        !self.text.trim().is_empty() || !self.files.is_empty()
    }

    /// Builds the normalized request; blank text is omitted
    pub fn submit(&self) -> Result<AnalysisInput, InputError> {
        if !self.can_submit() {
            return Err(InputError::NothingToSubmit);
        }

        let trimmed = self.text.trim();
        Ok(AnalysisInput {
            text: (!trimmed.is_empty()).then(|| trimmed.to_string()),
            url: self.url.clone(),
            files: self.files.clone(),
        })
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.url = None;
        self.files.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.url.is_none() && self.files.is_empty()
    }
}

async fn encode_file(file: SelectedFile) -> Result<FileAttachment, InputError> {
    let SelectedFile {
        file_name,
        content_type,
        bytes,
    } = file;
    let mime_type = content_type
        .as_deref()
        .map(essence_of)
        .unwrap_or_else(|| SUPPORTED_MIME_TYPES[0].to_string());

    let base64 = tokio::task::spawn_blocking(move || STANDARD.encode(bytes))
        .await
        .map_err(|e| InputError::Encoding {
            file_name: file_name.clone(),
            reason: e.to_string(),
        })?;

    Ok(FileAttachment {
        base64,
        mime_type,
        file_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str) -> SelectedFile {
        SelectedFile::new(name, Some("application/pdf"), b"%PDF-1.7".to_vec())
    }

    #[test]
    fn test_allow_list() {
        assert!(is_supported_mime_type(Some("application/pdf")));
        assert!(is_supported_mime_type(Some("text/plain; charset=utf-8")));
        assert!(is_supported_mime_type(Some("Text/Plain")));
        assert!(!is_supported_mime_type(Some("image/png")));
        assert!(!is_supported_mime_type(Some(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        )));
        assert!(!is_supported_mime_type(Some("")));
        assert!(!is_supported_mime_type(None));
    }

    #[tokio::test]
    async fn test_selection_accepts_only_allow_listed_files() {
        let mut collector = InputCollector::new();
        let outcome = collector
            .select_files(vec![
                pdf("resume.pdf"),
                SelectedFile::new("slides.pptx", Some("application/vnd.ms-powerpoint"), vec![1]),
                SelectedFile::new("notes.txt", Some("text/plain"), b"hi".to_vec()),
                SelectedFile::new("photo 1.png", Some("image/png"), vec![2]),
            ])
            .await
            .unwrap();

        assert_eq!(outcome.accepted, vec!["resume.pdf", "notes.txt"]);
        let names: Vec<_> = collector.files().iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["resume.pdf", "notes.txt"]);

        let notice = outcome.rejection.unwrap();
        assert_eq!(notice.rejected, vec!["slides.pptx", "photo 1.png"]);
        let message = notice.message();
        assert!(message.contains("slides.pptx"));
        assert!(message.contains("photo 1.png"));
        assert!(message.starts_with("以下のファイル形式"));
    }

    #[tokio::test]
    async fn test_files_are_base64_encoded_in_order() {
        let mut collector = InputCollector::new();
        collector
            .select_files(vec![
                SelectedFile::new("a.txt", Some("text/plain"), b"hello".to_vec()),
                SelectedFile::new("b.txt", Some("text/plain; charset=utf-8"), b"world".to_vec()),
            ])
            .await
            .unwrap();
        collector.select_files(vec![pdf("c.pdf")]).await.unwrap();

        let files = collector.files();
        assert_eq!(files[0].base64, "aGVsbG8=");
        assert_eq!(files[1].base64, "d29ybGQ=");
        assert_eq!(files[1].mime_type, "text/plain");
        assert_eq!(files[2].file_name, "c.pdf");
    }

    #[tokio::test]
    async fn test_all_rejected_leaves_list_unchanged() {
        let mut collector = InputCollector::new();
        collector.select_files(vec![pdf("keep.pdf")]).await.unwrap();
        let outcome = collector
            .select_files(vec![SelectedFile::new("x.docx", None, vec![])])
            .await
            .unwrap();
        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.rejection.unwrap().rejected, vec!["x.docx"]);
        assert_eq!(collector.files().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_file_by_position() {
        let mut collector = InputCollector::new();
        collector
            .select_files(vec![pdf("1.pdf"), pdf("2.pdf"), pdf("3.pdf")])
            .await
            .unwrap();
        let removed = collector.remove_file(1).unwrap();
        assert_eq!(removed.file_name, "2.pdf");
        let names: Vec<_> = collector.files().iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["1.pdf", "3.pdf"]);
        assert_eq!(collector.remove_file(5), Err(InputError::NoSuchFile(5)));
    }

    #[tokio::test]
    async fn test_submit_gating() {
        let mut collector = InputCollector::new();
        assert!(!collector.can_submit());
        assert_eq!(collector.submit(), Err(InputError::NothingToSubmit));

        collector.set_text("   \n ");
        assert!(!collector.can_submit());

        collector.set_text("  I am a creative problem solver ");
        assert!(collector.can_submit());
        let input = collector.submit().unwrap();
        assert_eq!(input.text.as_deref(), Some("I am a creative problem solver"));
        assert!(input.files.is_empty());

        collector.set_text("");
        collector.select_files(vec![pdf("cv.pdf")]).await.unwrap();
        assert!(collector.can_submit());
        let input = collector.submit().unwrap();
        assert_eq!(input.text, None);
        assert_eq!(input.files.len(), 1);
    }

    #[test]
    fn test_clear_and_url() {
        let mut collector = InputCollector::new();
        collector.set_text("x");
        collector.set_url(Some("  ".to_string()));
        assert_eq!(collector.url(), None);
        collector.set_url(Some(" https://example.com ".to_string()));
        assert_eq!(collector.url(), Some("https://example.com"));
        collector.clear();
        assert!(collector.is_empty());
    }
}
