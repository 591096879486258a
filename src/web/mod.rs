// src/web/mod.rs

pub mod handlers;
pub mod services;
pub mod types;

pub use services::{AppServices, SessionStore};
pub use types::*;

use anyhow::Result;
use rocket::data::{Limits, ToByteUnit};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::figment::Figment;
use rocket::form::Form;
use rocket::http::{Header, Status};
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::{catchers, delete, get, options, post, put, routes, Build, Request, Response, Rocket, State};
use std::sync::Arc;
use tracing::info;

use crate::activity::build_recorder;
use crate::analysis::GeminiClient;
use crate::config::AppConfig;
use crate::render::CardExporter;
use handlers::ApiError;

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, DELETE, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new(
            "Access-Control-Expose-Headers",
            "Content-Disposition",
        ));
    }
}

#[get("/health")]
pub async fn health(services: &State<AppServices>) -> Json<DataResponse<HealthData>> {
    handlers::health_handler(services).await
}

#[post("/sessions")]
pub async fn create_session(
    store: &State<SessionStore>,
    services: &State<AppServices>,
) -> Json<DataResponse<SessionSnapshot>> {
    handlers::create_session_handler(store, services).await
}

#[get("/sessions/<id>")]
pub async fn get_session(
    id: &str,
    store: &State<SessionStore>,
) -> Result<Json<DataResponse<SessionSnapshot>>, ApiError> {
    handlers::get_session_handler(id, store).await
}

#[delete("/sessions/<id>")]
pub async fn delete_session(
    id: &str,
    store: &State<SessionStore>,
) -> Result<Json<ActionResponse>, ApiError> {
    handlers::delete_session_handler(id, store).await
}

#[put("/sessions/<id>/text", data = "<request>")]
pub async fn set_text(
    id: &str,
    request: Json<TextInputRequest>,
    store: &State<SessionStore>,
) -> Result<Json<DataResponse<SessionSnapshot>>, ApiError> {
    handlers::set_text_handler(id, request, store).await
}

#[post("/sessions/<id>/files", data = "<upload>")]
pub async fn select_files(
    id: &str,
    upload: Form<FileSelectionForm<'_>>,
    store: &State<SessionStore>,
) -> Result<Json<DataResponse<FileSelectionData>>, ApiError> {
    handlers::select_files_handler(id, upload, store).await
}

#[delete("/sessions/<id>/files/<index>")]
pub async fn remove_file(
    id: &str,
    index: usize,
    store: &State<SessionStore>,
) -> Result<Json<DataResponse<SessionSnapshot>>, ApiError> {
    handlers::remove_file_handler(id, index, store).await
}

#[post("/sessions/<id>/submit")]
pub async fn submit(
    id: &str,
    store: &State<SessionStore>,
) -> Result<Json<DataResponse<SessionSnapshot>>, ApiError> {
    handlers::submit_handler(id, store).await
}

#[post("/sessions/<id>/reset")]
pub async fn reset(
    id: &str,
    store: &State<SessionStore>,
) -> Result<Json<ActionResponse>, ApiError> {
    handlers::reset_handler(id, store).await
}

#[get("/sessions/<id>/card")]
pub async fn card(id: &str, store: &State<SessionStore>) -> Result<RawHtml<String>, ApiError> {
    handlers::card_handler(id, store).await
}

#[get("/sessions/<id>/card.png")]
pub async fn card_png(
    id: &str,
    store: &State<SessionStore>,
    services: &State<AppServices>,
) -> Result<DownloadResponse, ApiError> {
    handlers::card_png_handler(id, store, services).await
}

#[get("/sessions/<id>/card.pdf")]
pub async fn card_pdf(
    id: &str,
    store: &State<SessionStore>,
    services: &State<AppServices>,
) -> Result<PdfDownload, ApiError> {
    handlers::card_pdf_handler(id, store, services).await
}

#[get("/sessions/<id>/share-text")]
pub async fn share_text(
    id: &str,
    store: &State<SessionStore>,
) -> Result<Json<TextResponse>, ApiError> {
    handlers::share_text_handler(id, store).await
}

#[post("/sessions/<id>/share/x")]
pub async fn share_x(
    id: &str,
    store: &State<SessionStore>,
) -> Result<Json<DataResponse<ShareData>>, ApiError> {
    handlers::share_x_handler(id, store).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid request format".to_string(),
        "BAD_REQUEST".to_string(),
        vec![
            "Check your request JSON format".to_string(),
            "Verify all required fields are present".to_string(),
        ],
        None,
    ))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Resource not found".to_string(),
        "NOT_FOUND".to_string(),
        vec!["Check the endpoint path".to_string()],
        None,
    ))
}

#[rocket::catch(413)]
pub fn payload_too_large() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Uploaded files are too large".to_string(),
        "PAYLOAD_TOO_LARGE".to_string(),
        vec!["Attach smaller files or fewer files at once".to_string()],
        None,
    ))
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Request body could not be parsed".to_string(),
        "UNPROCESSABLE_ENTITY".to_string(),
        vec![
            "Send text as JSON: {\"text\": \"...\", \"url\": \"...\"}".to_string(),
            "Send files as multipart fields named `files`".to_string(),
        ],
        None,
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Internal server error".to_string(),
        "INTERNAL_ERROR".to_string(),
        vec![
            "Try again in a few moments".to_string(),
            "Contact support if the problem persists".to_string(),
        ],
        None,
    ))
}

/// Rocket figment with upload limits raised for document attachments
pub fn server_figment(port: u16) -> Figment {
    let limits = Limits::default()
        .limit("file", 20.mebibytes())
        .limit("data-form", 50.mebibytes());

    rocket::Config::figment()
        .merge(("address", "0.0.0.0"))
        .merge(("port", port))
        .merge(("limits", limits))
}

pub fn build_rocket(services: AppServices, figment: Figment) -> Rocket<Build> {
    rocket::custom(figment)
        .attach(Cors)
        .manage(SessionStore::with_idle_timeout(services.session_idle_timeout))
        .manage(services)
        .register(
            "/api",
            catchers![
                bad_request,
                not_found,
                payload_too_large,
                unprocessable,
                internal_error
            ],
        )
        .mount(
            "/api",
            routes![
                health,
                create_session,
                get_session,
                delete_session,
                set_text,
                select_files,
                remove_file,
                submit,
                reset,
                card,
                card_png,
                card_pdf,
                share_text,
                share_x,
                options,
            ],
        )
}

// Main server start function
pub async fn start_web_server(config: AppConfig) -> Result<()> {
    let analyzer = GeminiClient::new(&config.gemini)?;
    let recorder = build_recorder(&config.activity).await;
    let exporter = CardExporter::typst(config.export.clone());

    let analysis_configured = config.gemini.api_key.is_some();
    let services = AppServices {
        analyzer: Arc::new(analyzer),
        recorder,
        exporter: Arc::new(exporter),
        dev_mode: config.dev_mode,
        analysis_configured,
        session_idle_timeout: config.session_idle_timeout,
    };

    info!("Starting CommuDic API server");
    info!("Model: {}", config.gemini.model);
    info!("Server: http://0.0.0.0:{}", config.port);

    let _rocket = build_rocket(services, server_figment(config.port))
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Rocket server failed: {}", e))?;

    Ok(())
}
