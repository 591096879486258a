use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commudic::activity::build_recorder;
use commudic::analysis::GeminiClient;
use commudic::input::SelectedFile;
use commudic::orchestrator::{AppState, Orchestrator};
use commudic::render::{share_text, CardExporter, PdfExport};
use commudic::{start_web_server, AppConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "commudic")]
#[command(about = "CommuDic personality profiling service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run a single analysis from the command line
    Analyze {
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        url: Option<String>,
        /// PDF or plain text document; repeatable
        #[arg(long = "file")]
        files: Vec<PathBuf>,
        /// Write the card image here
        #[arg(long)]
        png: Option<PathBuf>,
        /// Write the A4 profile PDF here
        #[arg(long)]
        pdf: Option<PathBuf>,
    },
}

fn content_type_for(path: &Path) -> Option<&'static str> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("pdf") => Some("application/pdf"),
        Some("txt") => Some("text/plain"),
        _ => None,
    }
}

async fn read_selection(paths: &[PathBuf]) -> Result<Vec<SelectedFile>> {
    let mut selection = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();
        selection.push(SelectedFile::new(file_name, content_type_for(path), bytes));
    }
    Ok(selection)
}

async fn run_analysis(
    config: AppConfig,
    text: Option<String>,
    url: Option<String>,
    files: Vec<PathBuf>,
    png: Option<PathBuf>,
    pdf: Option<PathBuf>,
) -> Result<()> {
    let analyzer = Arc::new(GeminiClient::new(&config.gemini)?);
    let recorder = build_recorder(&config.activity).await;
    let mut app = Orchestrator::new(analyzer, recorder, config.dev_mode);

    let selection = read_selection(&files).await?;
    let collector = app
        .collector_mut()
        .context("Session is not accepting input")?;
    collector.set_text(text.unwrap_or_default());
    collector.set_url(url);
    let outcome = collector.select_files(selection).await?;
    if let Some(rejection) = outcome.rejection {
        eprintln!("{}", rejection.message());
    }

    let result = match app.submit().await? {
        AppState::Result(view) => view.result.clone(),
        AppState::Error { message } => anyhow::bail!("{}", message),
        other => anyhow::bail!("Unexpected state after analysis: {}", other.name()),
    };

    println!("{}", share_text(&result));

    let exporter = CardExporter::typst(config.export.clone());
    if let Some(path) = png {
        match exporter.export_image(&result).await {
            Ok(file) => {
                tokio::fs::write(&path, &file.bytes)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Saved {} as {}", file.file_name, path.display());
            }
            Err(e) => eprintln!("{}", e.user_notice()),
        }
    }

    if let Some(path) = pdf {
        match exporter.export_pdf(&result).await? {
            PdfExport::Document(file) => {
                tokio::fs::write(&path, &file.bytes)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Saved {} as {}", file.file_name, path.display());
            }
            PdfExport::PrintFallback(html) => {
                let fallback = path.with_extension("html");
                tokio::fs::write(&fallback, html)
                    .await
                    .with_context(|| format!("Failed to write {}", fallback.display()))?;
                warn!(
                    "PDF could not be assembled; open {} and print it instead",
                    fallback.display()
                );
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("commudic=info,rocket::server=off")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load()?;

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            start_web_server(config).await
        }
        Command::Analyze {
            text,
            url,
            files,
            png,
            pdf,
        } => run_analysis(config, text, url, files, png, pdf).await,
    }
}
