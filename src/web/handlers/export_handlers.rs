// src/web/handlers/export_handlers.rs
use rocket::response::content::RawHtml;
use rocket::State;
use tracing::{error, info};

use super::session_handlers::no_result;
use super::{api_error, find_session, ApiError};
use crate::render::{render_card_html, CardOptions, PdfExport};
use crate::types::AnalysisResult;
use crate::web::services::{AppServices, SessionStore};
use crate::web::types::{DownloadResponse, PdfDownload};

/// Clones the result out so exports never hold the session lock
async fn current_result(store: &SessionStore, id: &str) -> Result<AnalysisResult, ApiError> {
    let session = find_session(store, id).await?;
    let app = session.lock().await;
    app.result()
        .map(|view| view.result.clone())
        .ok_or_else(|| no_result(id))
}

pub async fn card_handler(
    id: &str,
    store: &State<SessionStore>,
) -> Result<RawHtml<String>, ApiError> {
    let result = current_result(store, id).await?;
    let options = CardOptions::interactive(format!("/api/sessions/{}", id));
    render_card_html(&result, &options)
        .map(RawHtml)
        .map_err(|e| {
            error!("Session {}: failed to render card: {}", id, e);
            api_error(
                "Failed to render the result card",
                "CARD_RENDER_FAILED",
                &["Try again"],
                id,
            )
        })
}

pub async fn card_png_handler(
    id: &str,
    store: &State<SessionStore>,
    services: &State<AppServices>,
) -> Result<DownloadResponse, ApiError> {
    let result = current_result(store, id).await?;

    match services.exporter.export_image(&result).await {
        Ok(file) => {
            info!("Session {}: serving {}", id, file.file_name);
            Ok(DownloadResponse::png(file.bytes, file.file_name))
        }
        Err(e) => Err(api_error(
            e.user_notice(),
            "IMAGE_EXPORT_FAILED",
            &["Take a screenshot of the card instead"],
            id,
        )),
    }
}

pub async fn card_pdf_handler(
    id: &str,
    store: &State<SessionStore>,
    services: &State<AppServices>,
) -> Result<PdfDownload, ApiError> {
    let result = current_result(store, id).await?;

    match services.exporter.export_pdf(&result).await {
        Ok(PdfExport::Document(file)) => {
            info!("Session {}: serving {}", id, file.file_name);
            Ok(PdfDownload::Document(DownloadResponse::pdf(
                file.bytes,
                file.file_name,
            )))
        }
        Ok(PdfExport::PrintFallback(html)) => Ok(PdfDownload::Print(RawHtml(html))),
        Err(e) => Err(api_error(
            e.user_notice(),
            "PDF_EXPORT_FAILED",
            &["Take a screenshot of the card instead"],
            id,
        )),
    }
}
