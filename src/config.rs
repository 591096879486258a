// src/config.rs
//! Configuration: config.yaml sections per environment, secrets from the process environment

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
// Free tier friendly
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ACTIVITY_TABLE: &str = "activity_logs";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_SESSION_IDLE_MINUTES: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityBackend {
    Supabase,
    Sqlite,
    None,
}

impl ActivityBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "supabase" => Some(Self::Supabase),
            "sqlite" => Some(Self::Sqlite),
            "none" | "off" | "disabled" => Some(Self::None),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityConfig {
    pub backend: ActivityBackend,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub table: String,
    pub database_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    pub typst_binary: String,
    /// Pixel density of the "Save for SNS" capture
    pub image_ppi: u32,
    /// Pixel density of the capture embedded in the PDF
    pub pdf_ppi: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            typst_binary: "typst".to_string(),
            image_ppi: 216,
            pdf_ppi: 144,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub activity: ActivityConfig,
    pub export: ExportConfig,
    pub port: u16,
    /// Appends the raw failure detail to user-facing analysis errors
    pub dev_mode: bool,
    /// Web sessions untouched for this long are dropped
    pub session_idle_timeout: Duration,
}

/// One environment section of config.yaml; everything optional
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigSection {
    port: Option<u16>,
    dev_mode: Option<bool>,
    session_idle_minutes: Option<u64>,
    gemini_base_url: Option<String>,
    gemini_model: Option<String>,
    gemini_timeout_seconds: Option<u64>,
    activity_backend: Option<ActivityBackend>,
    activity_table: Option<String>,
    database_path: Option<PathBuf>,
    typst_binary: Option<String>,
    image_ppi: Option<u32>,
    pdf_ppi: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    local: ConfigSection,
    #[serde(default)]
    production: ConfigSection,
}

impl AppConfig {
    /// Load config.yaml (if present) for the current environment, then apply env overrides
    pub fn load() -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        let path = std::env::var("COMMUDIC_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.yaml"));

        let section = if path.exists() {
            Self::load_section(&path, &environment)?
        } else {
            warn!("{} not found, using built-in defaults", path.display());
            ConfigSection::default()
        };

        Ok(Self::from_parts(section, |key| std::env::var(key).ok()))
    }

    fn get_environment() -> String {
        std::env::var("COMMUDIC_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    fn load_section(path: &Path, environment: &str) -> Result<ConfigSection> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse_section(&content, environment)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn parse_section(content: &str, environment: &str) -> Result<ConfigSection> {
        let file: ConfigFile = serde_yaml::from_str(content)?;
        Ok(match environment {
            "production" => file.production,
            _ => file.local,
        })
    }

    fn from_parts<F>(section: ConfigSection, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let gemini = GeminiConfig {
            api_key: non_empty("GEMINI_API_KEY").or_else(|| non_empty("API_KEY")),
            base_url: non_empty("GEMINI_BASE_URL")
                .or(section.gemini_base_url)
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            model: non_empty("GEMINI_MODEL")
                .or(section.gemini_model)
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            timeout_seconds: section.gemini_timeout_seconds,
        };

        let supabase_url = non_empty("SUPABASE_URL");
        let supabase_key = non_empty("SUPABASE_ANON_KEY").or_else(|| non_empty("SUPABASE_KEY"));

        let backend = non_empty("ACTIVITY_BACKEND")
            .and_then(|v| ActivityBackend::parse(&v))
            .or(section.activity_backend)
            .unwrap_or(if supabase_url.is_some() && supabase_key.is_some() {
                ActivityBackend::Supabase
            } else {
                ActivityBackend::None
            });

        let activity = ActivityConfig {
            backend,
            supabase_url,
            supabase_key,
            table: section
                .activity_table
                .unwrap_or_else(|| DEFAULT_ACTIVITY_TABLE.to_string()),
            database_path: section
                .database_path
                .unwrap_or_else(|| PathBuf::from("data/activity.db")),
        };

        let defaults = ExportConfig::default();
        let export = ExportConfig {
            typst_binary: non_empty("TYPST_BIN")
                .or(section.typst_binary)
                .unwrap_or(defaults.typst_binary),
            image_ppi: section.image_ppi.unwrap_or(defaults.image_ppi),
            pdf_ppi: section.pdf_ppi.unwrap_or(defaults.pdf_ppi),
        };

        let port = non_empty("ROCKET_PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .or(section.port)
            .unwrap_or(DEFAULT_PORT);

        let dev_mode = non_empty("COMMUDIC_DEV")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .or(section.dev_mode)
            .unwrap_or(false);

        let session_idle_timeout = Duration::from_secs(
            60 * section
                .session_idle_minutes
                .filter(|minutes| *minutes > 0)
                .unwrap_or(DEFAULT_SESSION_IDLE_MINUTES),
        );

        Self {
            gemini,
            activity,
            export,
            port,
            dev_mode,
            session_idle_timeout,
        }
    }
}
