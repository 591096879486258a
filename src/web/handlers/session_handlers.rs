// src/web/handlers/session_handlers.rs
use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::serde::json::Json;
use rocket::State;
use tokio::io::AsyncReadExt;
use tracing::{error, info};

use super::{api_error, find_session, ApiError};
use crate::input::{InputError, SelectedFile};
use crate::orchestrator::SubmitError;
use crate::render::SHARE_PLATFORM_X;
use crate::web::services::{AppServices, SessionStore};
use crate::web::types::{
    ActionResponse, DataResponse, FileSelectionData, FileSelectionForm, SessionSnapshot,
    ShareData, TextInputRequest, TextResponse,
};

fn locked_input(session_id: &str) -> ApiError {
    api_error(
        "Input can only be changed before submitting",
        "INPUT_LOCKED",
        &["Reset the session to start a new analysis"],
        session_id,
    )
}

fn submit_error(e: SubmitError, session_id: &str) -> ApiError {
    match e {
        SubmitError::Busy => api_error(
            e.to_string(),
            "ANALYSIS_IN_PROGRESS",
            &["Wait for the current analysis to finish"],
            session_id,
        ),
        SubmitError::NotCollecting => api_error(
            e.to_string(),
            "RESET_REQUIRED",
            &["Reset the session before submitting again"],
            session_id,
        ),
        SubmitError::Input(input) => input_error(input, session_id),
    }
}

fn input_error(e: InputError, session_id: &str) -> ApiError {
    let (code, suggestions): (&str, &[&str]) = match e {
        InputError::NoSuchFile(_) => ("FILE_NOT_FOUND", &["Check the file index"]),
        InputError::NothingToSubmit => (
            "EMPTY_INPUT",
            &["Enter some text or attach a PDF / text file"],
        ),
        InputError::Encoding { .. } => ("FILE_ENCODING_ERROR", &["Try selecting the file again"]),
    };
    api_error(e.to_string(), code, suggestions, session_id)
}

async fn read_upload(index: usize, file: &TempFile<'_>) -> std::io::Result<SelectedFile> {
    let file_name = file
        .raw_name()
        .map(|name| name.dangerous_unsafe_unsanitized_raw().as_str().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("file-{}", index + 1));
    let content_type = file.content_type().map(|ct| ct.to_string());

    let mut bytes = Vec::with_capacity(file.len() as usize);
    let mut reader = Box::pin(file.open().await?);
    reader.read_to_end(&mut bytes).await?;

    Ok(SelectedFile::new(file_name, content_type.as_deref(), bytes))
}

pub async fn create_session_handler(
    store: &State<SessionStore>,
    services: &State<AppServices>,
) -> Json<DataResponse<SessionSnapshot>> {
    let (id, session) = store.create(services).await;
    let snapshot = SessionSnapshot::of(&id, &*session.lock().await);
    Json(DataResponse::success(
        "Session created".to_string(),
        snapshot,
        Some(id),
    ))
}

pub async fn get_session_handler(
    id: &str,
    store: &State<SessionStore>,
) -> Result<Json<DataResponse<SessionSnapshot>>, ApiError> {
    let session = find_session(store, id).await?;
    let snapshot = SessionSnapshot::of(id, &*session.lock().await);
    Ok(Json(DataResponse::success(
        format!("Session is {}", snapshot.state),
        snapshot,
        Some(id.to_string()),
    )))
}

pub async fn delete_session_handler(
    id: &str,
    store: &State<SessionStore>,
) -> Result<Json<ActionResponse>, ApiError> {
    if !store.remove(id).await {
        return Err(api_error(
            format!("Session not found: {}", id),
            "SESSION_NOT_FOUND",
            &["Create a new session with POST /api/sessions"],
            id,
        ));
    }

    Ok(Json(ActionResponse::success(
        "Session deleted".to_string(),
        "delete".to_string(),
        Some(id.to_string()),
    )))
}

pub async fn set_text_handler(
    id: &str,
    request: Json<TextInputRequest>,
    store: &State<SessionStore>,
) -> Result<Json<DataResponse<SessionSnapshot>>, ApiError> {
    let session = find_session(store, id).await?;
    let mut app = session.lock().await;
    let request = request.into_inner();

    let collector = app.collector_mut().ok_or_else(|| locked_input(id))?;
    collector.set_text(request.text);
    collector.set_url(request.url);

    Ok(Json(DataResponse::success(
        "Input updated".to_string(),
        SessionSnapshot::of(id, &app),
        Some(id.to_string()),
    )))
}

pub async fn select_files_handler(
    id: &str,
    upload: Form<FileSelectionForm<'_>>,
    store: &State<SessionStore>,
) -> Result<Json<DataResponse<FileSelectionData>>, ApiError> {
    let session = find_session(store, id).await?;

    let mut selection = Vec::with_capacity(upload.files.len());
    for (index, file) in upload.files.iter().enumerate() {
        match read_upload(index, file).await {
            Ok(selected) => selection.push(selected),
            Err(e) => {
                error!("Failed to read uploaded file: {}", e);
                return Err(api_error(
                    "Failed to read uploaded file",
                    "UPLOAD_READ_ERROR",
                    &["Try selecting the file again"],
                    id,
                ));
            }
        }
    }

    let mut app = session.lock().await;
    let collector = app.collector_mut().ok_or_else(|| locked_input(id))?;
    let outcome = collector
        .select_files(selection)
        .await
        .map_err(|e| input_error(e, id))?;

    let (rejected, notice) = match outcome.rejection {
        Some(rejection) => {
            let notice = rejection.message();
            (rejection.rejected, Some(notice))
        }
        None => (Vec::new(), None),
    };
    info!(
        "Session {}: {} file(s) accepted, {} rejected",
        id,
        outcome.accepted.len(),
        rejected.len()
    );

    Ok(Json(DataResponse::success(
        notice
            .clone()
            .unwrap_or_else(|| "Files attached".to_string()),
        FileSelectionData {
            accepted: outcome.accepted,
            rejected,
            notice,
            session: SessionSnapshot::of(id, &app),
        },
        Some(id.to_string()),
    )))
}

pub async fn remove_file_handler(
    id: &str,
    index: usize,
    store: &State<SessionStore>,
) -> Result<Json<DataResponse<SessionSnapshot>>, ApiError> {
    let session = find_session(store, id).await?;
    let mut app = session.lock().await;

    let removed = app
        .collector_mut()
        .ok_or_else(|| locked_input(id))?
        .remove_file(index)
        .map_err(|e| input_error(e, id))?;

    Ok(Json(DataResponse::success(
        format!("Removed {}", removed.file_name),
        SessionSnapshot::of(id, &app),
        Some(id.to_string()),
    )))
}

/// Runs the analysis without holding the session lock so the Loading state stays visible
pub async fn submit_handler(
    id: &str,
    store: &State<SessionStore>,
) -> Result<Json<DataResponse<SessionSnapshot>>, ApiError> {
    let session = find_session(store, id).await?;

    let submission = session
        .lock()
        .await
        .begin_submission()
        .map_err(|e| submit_error(e, id))?;

    let outcome = submission.run().await;

    let mut app = session.lock().await;
    let message = match app.complete(outcome).name() {
        "result" => "Analysis complete",
        _ => "Analysis failed",
    };

    Ok(Json(DataResponse::success(
        message.to_string(),
        SessionSnapshot::of(id, &app),
        Some(id.to_string()),
    )))
}

pub async fn reset_handler(
    id: &str,
    store: &State<SessionStore>,
) -> Result<Json<ActionResponse>, ApiError> {
    let session = find_session(store, id).await?;
    session
        .lock()
        .await
        .reset()
        .map_err(|e| submit_error(e, id))?;

    Ok(Json(
        ActionResponse::success(
            "Session reset".to_string(),
            "reset".to_string(),
            Some(id.to_string()),
        )
        .with_next_actions(vec!["text".to_string(), "files".to_string()]),
    ))
}

pub async fn share_text_handler(
    id: &str,
    store: &State<SessionStore>,
) -> Result<Json<TextResponse>, ApiError> {
    let session = find_session(store, id).await?;
    let app = session.lock().await;
    let view = app.result().ok_or_else(|| no_result(id))?;

    Ok(Json(TextResponse::success(
        crate::render::share_text(&view.result),
        Some(id.to_string()),
    )))
}

pub async fn share_x_handler(
    id: &str,
    store: &State<SessionStore>,
) -> Result<Json<DataResponse<ShareData>>, ApiError> {
    let session = find_session(store, id).await?;
    let app = session.lock().await;
    let intent_url = app.share_to_x().await.map_err(|_| no_result(id))?;

    Ok(Json(DataResponse::success(
        "Open the intent URL to post".to_string(),
        ShareData {
            platform: SHARE_PLATFORM_X.to_string(),
            intent_url,
        },
        Some(id.to_string()),
    )))
}

pub(crate) fn no_result(session_id: &str) -> ApiError {
    api_error(
        "No analysis result available",
        "NO_RESULT",
        &["Submit an analysis first"],
        session_id,
    )
}
