// src/web/handlers/system_handlers.rs
use rocket::serde::json::Json;
use rocket::State;

use crate::web::services::AppServices;
use crate::web::types::{DataResponse, HealthData};

pub async fn health_handler(services: &State<AppServices>) -> Json<DataResponse<HealthData>> {
    Json(DataResponse::success(
        "CommuDic API is running".to_string(),
        HealthData {
            status: "ok".to_string(),
            timestamp: chrono::Utc::now(),
            analysis_configured: services.analysis_configured,
            activity_logging: services.recorder.is_enabled(),
        },
        None,
    ))
}
