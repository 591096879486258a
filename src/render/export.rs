// src/render/export.rs
//! Card export: PNG capture and single-page A4 PDF, with a print-dialog fallback

use anyhow::{Context, Result};
use async_trait::async_trait;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;
use tracing::{error, info, warn};

use super::card::{render_card_html, CardOptions};
use super::radar::RadarChart;
use super::share::{image_file_name, pdf_file_name};
use crate::config::ExportConfig;
use crate::types::AnalysisResult;

pub const IMAGE_FAILURE_NOTICE: &str =
    "画像の生成に失敗しました。スクリーンショットをお試しください。";

pub const IMAGE_BACKGROUND: [u8; 3] = [0xfd, 0xfc, 0xfe];
pub const PDF_BACKGROUND: [u8; 3] = [0xff, 0xff, 0xff];

pub const A4_WIDTH_MM: f64 = 210.0;
pub const A4_HEIGHT_MM: f64 = 297.0;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to capture card: {0}")]
    Capture(String),
    #[error("failed to assemble document: {0}")]
    Document(String),
    #[error("failed to render print view: {0}")]
    PrintView(#[from] askama::Error),
}

impl ExportError {
    pub fn user_notice(&self) -> &'static str {
        IMAGE_FAILURE_NOTICE
    }
}

#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum PdfExport {
    Document(ExportedFile),
    /// Printable HTML that opens the native print dialog
    PrintFallback(String),
}

/// Renders the card region, without interactive controls, to PNG bytes
#[async_trait]
pub trait CardRasterizer: Send + Sync {
    async fn rasterize(&self, result: &AnalysisResult, ppi: u32) -> Result<Vec<u8>>;
}

/// Places a PNG at the top-left of one A4 page at full page width
#[async_trait]
pub trait PageComposer: Send + Sync {
    async fn compose_a4(&self, png: &[u8], image_height_mm: f64) -> Result<Vec<u8>>;
}

/// Flattens transparency onto `background` and re-encodes as PNG; returns the pixel size too
pub fn flatten_png(png: &[u8], background: [u8; 3]) -> Result<(Vec<u8>, u32, u32)> {
    let decoded = image::load_from_memory_with_format(png, ImageFormat::Png)
        .context("Failed to decode captured PNG")?
        .to_rgba8();
    let (width, height) = decoded.dimensions();

    let mut flattened = RgbaImage::new(width, height);
    for (x, y, pixel) in decoded.enumerate_pixels() {
        let alpha = u32::from(pixel[3]);
        let blend = |channel: usize| -> u8 {
            let fg = u32::from(pixel[channel]);
            let bg = u32::from(background[channel]);
            ((fg * alpha + bg * (255 - alpha) + 127) / 255) as u8
        };
        flattened.put_pixel(x, y, Rgba([blend(0), blend(1), blend(2), 255]));
    }

    let mut out = Cursor::new(Vec::new());
    flattened
        .write_to(&mut out, ImageFormat::Png)
        .context("Failed to encode PNG")?;
    Ok((out.into_inner(), width, height))
}

/// Page height taken by an image scaled to the full A4 width
pub fn scaled_height_mm(width_px: u32, height_px: u32) -> f64 {
    if width_px == 0 {
        return 0.0;
    }
    f64::from(height_px) * A4_WIDTH_MM / f64::from(width_px)
}

pub struct CardExporter {
    rasterizer: Arc<dyn CardRasterizer>,
    composer: Arc<dyn PageComposer>,
    config: ExportConfig,
}

impl CardExporter {
    pub fn new(
        rasterizer: Arc<dyn CardRasterizer>,
        composer: Arc<dyn PageComposer>,
        config: ExportConfig,
    ) -> Self {
        Self {
            rasterizer,
            composer,
            config,
        }
    }

    /// Typst-backed exporter for both capture and page composition
    pub fn typst(config: ExportConfig) -> Self {
        let renderer = Arc::new(TypstRenderer::new(&config.typst_binary));
        Self::new(renderer.clone(), renderer, config)
    }

    async fn capture(
        &self,
        result: &AnalysisResult,
        ppi: u32,
        background: [u8; 3],
    ) -> Result<(Vec<u8>, u32, u32), ExportError> {
        let raw = self
            .rasterizer
            .rasterize(result, ppi)
            .await
            .map_err(|e| ExportError::Capture(format!("{:#}", e)))?;

        tokio::task::spawn_blocking(move || flatten_png(&raw, background))
            .await
            .map_err(|e| ExportError::Capture(e.to_string()))?
            .map_err(|e| ExportError::Capture(format!("{:#}", e)))
    }

    pub async fn export_image(&self, result: &AnalysisResult) -> Result<ExportedFile, ExportError> {
        let (bytes, width, height) = self
            .capture(result, self.config.image_ppi, IMAGE_BACKGROUND)
            .await
            .inspect_err(|e| error!("Failed to save image: {}", e))?;

        info!("Card image captured ({}x{})", width, height);
        Ok(ExportedFile {
            file_name: image_file_name(result),
            bytes,
        })
    }

    /// Errors only when neither the document nor the print view can be produced
    pub async fn export_pdf(&self, result: &AnalysisResult) -> Result<PdfExport, ExportError> {
        match self.try_export_pdf(result).await {
            Ok(file) => Ok(PdfExport::Document(file)),
            Err(e) => {
                warn!("Failed to save PDF, falling back to print view: {}", e);
                let html = render_card_html(result, &CardOptions::printable())
                    .inspect_err(|e| error!("Failed to render print view: {}", e))?;
                Ok(PdfExport::PrintFallback(html))
            }
        }
    }

    async fn try_export_pdf(&self, result: &AnalysisResult) -> Result<ExportedFile, ExportError> {
        let (png, width, height) = self
            .capture(result, self.config.pdf_ppi, PDF_BACKGROUND)
            .await?;

        let image_height_mm = scaled_height_mm(width, height);
        if image_height_mm > A4_HEIGHT_MM {
            warn!(
                "Card is {:.0}mm tall and will be clipped to one A4 page",
                image_height_mm
            );
        }

        let bytes = self
            .composer
            .compose_a4(&png, image_height_mm)
            .await
            .map_err(|e| ExportError::Document(format!("{:#}", e)))?;

        Ok(ExportedFile {
            file_name: pdf_file_name(result),
            bytes,
        })
    }
}

// ===== Typst backend =====

/// Escapes a value as a Typst string literal
fn typst_str(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn typst_list(items: &[String]) -> String {
    if items.is_empty() {
        return "()".to_string();
    }
    let entries: Vec<String> = items.iter().map(|i| typst_str(i)).collect();
    format!("({},)", entries.join(", "))
}

/// Typst source of the card; the radar chart is read from `radar.svg` next to it
pub fn card_typst_source(result: &AnalysisResult) -> String {
    let business = &result.business_aptitude;
    let community = &result.person_community;

    format!(
        r##"#set page(width: 720pt, height: auto, margin: 40pt, fill: none)
#set text(font: ("Noto Sans CJK JP", "Noto Sans JP", "Hiragino Sans"), lang: "ja", size: 10pt, fill: rgb("#1e293b"))

#let tag(body) = text(size: 8pt, weight: "bold", fill: rgb("#94a3b8"), upper(body))
#let chips(items, fill: white, color: rgb("#475569")) = items.map(i => box(fill: fill, stroke: rgb("#dbeafe"), radius: 8pt, inset: (x: 6pt, y: 3pt), text(size: 8pt, weight: "bold", fill: color, i))).join(h(4pt))

#block(width: 100%, fill: white, radius: 40pt, inset: 32pt)[
  #tag("AI Profiling Synthesis")
  #v(4pt)
  #text(size: 22pt, weight: "black", "\u{{201c}}" + {catchphrase} + "\u{{201d}}")
  #v(2pt)
  #text(size: 9pt, weight: "bold", fill: rgb("#f43f5e"), "TYPE: " + {result_type})
  #v(16pt)
  #grid(columns: (1fr, 2fr), gutter: 24pt,
    [
      #tag("Core Balance")
      #image("radar.svg", width: 100%)
      #v(8pt)
      #tag("Profile Summary")
      #v(4pt)
      #text({summary})
    ],
    [
      #text(weight: "black", "Professional: 業務適性")
      #v(4pt)
      #tag("Work Style")
      #text({work_style})
      #v(4pt)
      #tag("Strengths")
      #chips({strengths})
      #v(4pt)
      #tag("Suitable Roles")
      #chips({roles}, fill: rgb("#3b82f6"), color: white)
      #v(12pt)
      #text(weight: "black", "Personal: 人・コミュニティ")
      #v(4pt)
      #tag("Social Style")
      #text({social_style})
      #v(4pt)
      #tag("Core Values")
      #list(..{values}.map(v => text(v)))
      #tag("Interaction Tip")
      #text({tips})
      #v(4pt)
      #tag("Optimal Environment")
      #text({place})
    ],
  )
]
"##,
        catchphrase = typst_str(&result.catchphrase),
        result_type = typst_str(&result.result_type),
        summary = typst_str(&result.summary),
        work_style = typst_str(&business.work_style),
        strengths = typst_list(&business.strengths),
        roles = typst_list(&business.suitable_roles),
        social_style = typst_str(&community.social_style),
        values = typst_list(&community.values),
        tips = typst_str(&community.interaction_tips),
        place = typst_str(&community.optimal_place),
    )
}

fn page_typst_source(image_height_mm: f64) -> String {
    format!(
        r#"#set page(paper: "a4", margin: 0pt)
#place(top + left, image("card.png", width: {width}mm, height: {height:.2}mm, fit: "stretch"))
"#,
        width = A4_WIDTH_MM,
        height = image_height_mm,
    )
}

pub struct TypstRenderer {
    typst_binary: String,
}

impl TypstRenderer {
    pub fn new(typst_binary: &str) -> Self {
        Self {
            typst_binary: typst_binary.to_string(),
        }
    }

    async fn compile(
        &self,
        workspace: &Path,
        source: &str,
        output: &str,
        ppi: Option<u32>,
    ) -> Result<Vec<u8>> {
        let mut cmd = Command::new(&self.typst_binary);
        cmd.current_dir(workspace)
            .arg("compile")
            .arg(source)
            .arg(output);
        if let Some(ppi) = ppi {
            cmd.arg("--ppi").arg(ppi.to_string());
        }

        let output_status = cmd
            .output()
            .await
            .context("Failed to execute typst command")?;

        if !output_status.status.success() {
            let stderr = String::from_utf8_lossy(&output_status.stderr);
            let stdout = String::from_utf8_lossy(&output_status.stdout);
            anyhow::bail!(
                "Typst compilation failed: stderr={}, stdout={}",
                stderr,
                stdout
            );
        }

        tokio::fs::read(workspace.join(output))
            .await
            .with_context(|| format!("Failed to read typst output {}", output))
    }
}

#[async_trait]
impl CardRasterizer for TypstRenderer {
    async fn rasterize(&self, result: &AnalysisResult, ppi: u32) -> Result<Vec<u8>> {
        let workspace = tempfile::tempdir().context("Failed to create export workspace")?;
        let radar = RadarChart::from_scores(&result.scores).to_svg(300);

        tokio::fs::write(workspace.path().join("radar.svg"), radar)
            .await
            .context("Failed to write radar.svg")?;
        tokio::fs::write(workspace.path().join("card.typ"), card_typst_source(result))
            .await
            .context("Failed to write card.typ")?;

        self.compile(workspace.path(), "card.typ", "card.png", Some(ppi))
            .await
    }
}

#[async_trait]
impl PageComposer for TypstRenderer {
    async fn compose_a4(&self, png: &[u8], image_height_mm: f64) -> Result<Vec<u8>> {
        let workspace = tempfile::tempdir().context("Failed to create export workspace")?;

        tokio::fs::write(workspace.path().join("card.png"), png)
            .await
            .context("Failed to write card.png")?;
        tokio::fs::write(
            workspace.path().join("page.typ"),
            page_typst_source(image_height_mm),
        )
        .await
        .context("Failed to write page.typ")?;

        self.compile(workspace.path(), "page.typ", "page.pdf", None)
            .await
    }
}
