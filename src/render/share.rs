// src/render/share.rs
//! Share strings, the X intent URL and download file names

use crate::types::AnalysisResult;

pub const SHARE_PLATFORM_X: &str = "X";
const X_INTENT_BASE: &str = "https://twitter.com/intent/tweet?text=";

/// Fixed-format text offered for the clipboard
pub fn share_text(result: &AnalysisResult) -> String {
    format!(
        "CommuDicで生成した私の人物図鑑カード！\n\n\"{}\"\n分析タイプ: {}\n#CommuDic #AI人物図鑑",
        result.catchphrase, result.result_type
    )
}

pub fn x_intent_url(result: &AnalysisResult) -> String {
    let text = format!(
        "CommuDicで私の「人物図鑑」を生成しました！\n\n\"{}\"\n\n#CommuDic #AI人物分析",
        result.catchphrase
    );
    format!("{}{}", X_INTENT_BASE, urlencoding::encode(&text))
}

/// Keeps the type label readable in a Content-Disposition header; spaces survive
fn file_label(result_type: &str) -> String {
    let label: String = result_type
        .chars()
        .map(|c| {
            if c.is_control()
                || matches!(c, '"' | '\\' | '/' | ':' | '*' | '?' | '<' | '>' | '|')
            {
                '_'
            } else {
                c
            }
        })
        .collect();
    if label.trim().is_empty() {
        "profile".to_string()
    } else {
        label
    }
}

pub fn image_file_name(result: &AnalysisResult) -> String {
    format!("CommuDic_Card_{}.png", file_label(&result.result_type))
}

pub fn pdf_file_name(result: &AnalysisResult) -> String {
    format!("CommuDic_Profile_{}.pdf", file_label(&result.result_type))
}
