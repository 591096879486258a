// src/render/card.rs
//! HTML rendering of the result card

use askama::Template;

use super::radar::RadarChart;
use super::share::share_text;
use crate::types::AnalysisResult;

/// Class marking interactive regions that a capture must leave out
pub const NO_CAPTURE_CLASS: &str = "no-capture";

#[derive(Debug, Clone, Default)]
pub struct CardOptions {
    /// Base path of the session routes; `None` renders the card without controls
    pub actions_base: Option<String>,
    /// Opens the native print dialog once loaded (PDF fallback)
    pub print_on_load: bool,
}

impl CardOptions {
    pub fn interactive(actions_base: impl Into<String>) -> Self {
        Self {
            actions_base: Some(actions_base.into()),
            print_on_load: false,
        }
    }

    pub fn printable() -> Self {
        Self {
            actions_base: None,
            print_on_load: true,
        }
    }
}

#[derive(Template)]
#[template(path = "card.html")]
struct CardTemplate<'a> {
    result: &'a AnalysisResult,
    radar_svg: String,
    actions_base: Option<&'a str>,
    share: String,
    print_on_load: bool,
    no_capture: &'static str,
}

/// Full HTML page for one result; all model text is escaped by the template
pub fn render_card_html(
    result: &AnalysisResult,
    options: &CardOptions,
) -> Result<String, askama::Error> {
    CardTemplate {
        result,
        radar_svg: RadarChart::from_scores(&result.scores).to_svg(300),
        actions_base: options
            .actions_base
            .as_deref()
            .map(|base| base.trim_end_matches('/')),
        share: share_text(result),
        print_on_load: options.print_on_load,
        no_capture: NO_CAPTURE_CLASS,
    }
    .render()
}
