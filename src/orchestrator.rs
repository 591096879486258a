// src/orchestrator.rs
//! Submission flow: collect -> record(start) -> analyze -> record(finish) -> render

use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, info_span, warn, Instrument};

use crate::activity::ActivityRecorder;
use crate::analysis::{AnalysisError, Analyzer};
use crate::input::{InputCollector, InputError};
use crate::render::share::{x_intent_url, SHARE_PLATFORM_X};
use crate::types::{AnalysisInput, AnalysisResult};

pub const ANALYSIS_ERROR_PREFIX: &str = "複合解析中にエラーが発生しました。";

const AUTH_HINT: &str = "\nAPIキーが無効か、権限が不足している可能性があります。`GEMINI_API_KEY` を確認してください。";
const BAD_REQUEST_HINT: &str = "\n入力形式（URL・ファイル形式など）が現在のAPI仕様と合っていない可能性があります。PDF かテキストのみ、または文章入力のみでお試しください。";
const QUOTA_HINT: &str = "\nGemini API の無料枠または現在のクォータを使い切っています。AI Studio でレートリミットと課金設定を確認してください。";

/// Single human-readable message for a failed analysis
pub fn describe_failure(error: &AnalysisError, dev_mode: bool) -> String {
    let mut message = ANALYSIS_ERROR_PREFIX.to_string();

    match error.status() {
        Some(401) | Some(403) => message.push_str(AUTH_HINT),
        Some(400) => message.push_str(BAD_REQUEST_HINT),
        Some(429) => message.push_str(QUOTA_HINT),
        _ => {}
    }

    if dev_mode {
        message.push_str(&format!("\n\n[開発用メモ] {}", error));
    }
    message
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub result: AnalysisResult,
    pub log_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Collecting,
    Loading,
    Result(ResultView),
    Error { message: String },
}

impl AppState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Collecting => "collecting",
            Self::Loading => "loading",
            Self::Result(_) => "result",
            Self::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("an analysis is already in progress")]
    Busy,
    #[error("the current result must be reset before submitting again")]
    NotCollecting,
    #[error(transparent)]
    Input(#[from] InputError),
}

#[derive(Debug, Error)]
#[error("no result to share")]
pub struct NoResult;

/// Outcome of one submission: the result plus the activity row it was logged under
#[derive(Debug)]
pub struct SubmissionOutcome {
    pub outcome: Result<AnalysisResult, AnalysisError>,
    pub log_id: Option<String>,
}

/// The in-flight part of a submission, run without holding the session
pub struct Submission {
    input: AnalysisInput,
    analyzer: Arc<dyn Analyzer>,
    recorder: ActivityRecorder,
}

impl Submission {
    pub async fn run(self) -> SubmissionOutcome {
        let span = info_span!(
            "analysis_submission",
            text = self.input.has_text(),
            files = self.input.files.len()
        );

        async move {
            let log_id = self.recorder.record_start(&self.input).await;

            let outcome = self.analyzer.analyze(&self.input).await;
            match &outcome {
                Ok(result) => {
                    self.recorder
                        .record_finish(log_id.as_deref(), &result.result_type)
                        .await;
                }
                Err(e) => error!("Analysis failed ({}): {}", e.code(), e),
            }

            SubmissionOutcome { outcome, log_id }
        }
        .instrument(span)
        .await
    }
}

pub struct Orchestrator {
    analyzer: Arc<dyn Analyzer>,
    recorder: ActivityRecorder,
    collector: InputCollector,
    state: AppState,
    dev_mode: bool,
}

impl Orchestrator {
    pub fn new(analyzer: Arc<dyn Analyzer>, recorder: ActivityRecorder, dev_mode: bool) -> Self {
        Self {
            analyzer,
            recorder,
            collector: InputCollector::new(),
            state: AppState::Collecting,
            dev_mode,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn collector(&self) -> &InputCollector {
        &self.collector
    }

    /// Input is editable only while collecting
    pub fn collector_mut(&mut self) -> Option<&mut InputCollector> {
        matches!(self.state, AppState::Collecting).then_some(&mut self.collector)
    }

    pub fn can_submit(&self) -> bool {
        matches!(self.state, AppState::Collecting) && self.collector.can_submit()
    }

    pub fn result(&self) -> Option<&ResultView> {
        match &self.state {
            AppState::Result(view) => Some(view),
            _ => None,
        }
    }

    /// Collecting -> Loading; the returned submission must be handed back to `complete`
    pub fn begin_submission(&mut self) -> Result<Submission, SubmitError> {
        match self.state {
            AppState::Collecting => {}
            AppState::Loading => return Err(SubmitError::Busy),
            AppState::Result(_) | AppState::Error { .. } => {
                return Err(SubmitError::NotCollecting)
            }
        }

        let input = self.collector.submit()?;
        self.state = AppState::Loading;
        info!(
            "Submission started (text: {}, url: {}, files: {})",
            input.has_text(),
            input.has_url(),
            input.files.len()
        );

        Ok(Submission {
            input,
            analyzer: self.analyzer.clone(),
            recorder: self.recorder.clone(),
        })
    }

    /// Loading -> Result | Error
    pub fn complete(&mut self, submission: SubmissionOutcome) -> &AppState {
        if !matches!(self.state, AppState::Loading) {
            warn!("Submission completed outside of loading state; ignoring");
            return &self.state;
        }

        self.state = match submission.outcome {
            Ok(result) => AppState::Result(ResultView {
                result,
                log_id: submission.log_id,
            }),
            Err(e) => AppState::Error {
                message: describe_failure(&e, self.dev_mode),
            },
        };
        &self.state
    }

    /// Convenience for a single owner: begin, run and complete in one call
    pub async fn submit(&mut self) -> Result<&AppState, SubmitError> {
        let submission = self.begin_submission()?;
        let outcome = submission.run().await;
        Ok(self.complete(outcome))
    }

    /// Back to an empty collector; refused while an analysis is in flight
    pub fn reset(&mut self) -> Result<(), SubmitError> {
        if matches!(self.state, AppState::Loading) {
            return Err(SubmitError::Busy);
        }
        self.collector.clear();
        self.state = AppState::Collecting;
        Ok(())
    }

    /// Intent URL for X plus the share record; needs a result on screen
    pub async fn share_to_x(&self) -> Result<String, NoResult> {
        let view = self.result().ok_or(NoResult)?;
        let url = x_intent_url(&view.result);
        self.recorder
            .record_share(view.log_id.as_deref(), SHARE_PLATFORM_X)
            .await;
        Ok(url)
    }
}
