// src/render/mod.rs
pub mod card;
pub mod export;
pub mod radar;
pub mod share;

pub use card::{render_card_html, CardOptions, NO_CAPTURE_CLASS};
pub use export::{
    CardExporter, CardRasterizer, ExportError, ExportedFile, PageComposer, PdfExport,
    TypstRenderer, IMAGE_FAILURE_NOTICE,
};
pub use radar::{RadarAxis, RadarChart};
pub use share::{image_file_name, pdf_file_name, share_text, x_intent_url, SHARE_PLATFORM_X};
