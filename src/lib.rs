pub mod activity;
pub mod analysis;
pub mod config;
pub mod input;
pub mod orchestrator;
pub mod render;
pub mod types;
pub mod web;

pub use config::AppConfig;
pub use orchestrator::{AppState, Orchestrator};
pub use web::start_web_server;
