// src/analysis/request.rs
//! generateContent request body: ordered parts, system instruction and the response schema

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::types::AnalysisInput;

pub const TASK_DESCRIPTION: &str = r#"Analyze the combined data and synthesize a professional person encyclopedia card.
INTEGRATE ALL INPUTS into two distinct categories:
1. [Business Aptitude]: Professional skills, work style, strengths, and recommended business roles.
2. [Person/Community]: Personality, values, how they interact with others, and community fit.

Output in Japanese. Be insightful and encouraging.
Format as JSON according to the schema."#;

pub const SYSTEM_INSTRUCTION: &str = "You are an elite talent analyst. Create a sophisticated, encouraging person-profile focusing on professional aptitude and personal social charm.";

pub const RESPONSE_MIME_TYPE: &str = "application/json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub system_instruction: Content,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

// Externally tagged: {"inlineData": {...}} or {"text": "..."}
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    InlineData(InlineData),
    Text(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: Value,
}

/// Instruction text with the optional sections appended
pub fn build_prompt(input: &AnalysisInput) -> String {
    let mut prompt = TASK_DESCRIPTION.to_string();
    if let Some(text) = &input.text {
        prompt.push_str(&format!("\n\n[Text]:\n{}", text));
    }
    if let Some(url) = &input.url {
        prompt.push_str(&format!("\n\n[URL]:\n{}", url));
    }
    prompt
}

/// One inline part per attachment in order, then the instruction part
pub fn build_request(input: &AnalysisInput) -> GenerateContentRequest {
    let mut parts: Vec<Part> = input
        .files
        .iter()
        .map(|file| {
            Part::InlineData(InlineData {
                mime_type: file.mime_type.clone(),
                data: file.base64.clone(),
            })
        })
        .collect();
    parts.push(Part::Text(build_prompt(input)));

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
        system_instruction: Content {
            role: None,
            parts: vec![Part::Text(SYSTEM_INSTRUCTION.to_string())],
        },
        generation_config: GenerationConfig {
            response_mime_type: RESPONSE_MIME_TYPE.to_string(),
            response_schema: response_schema(),
        },
    }
}

/// Structured output contract; every field of `AnalysisResult` is required
pub fn response_schema() -> Value {
    let string_list = json!({ "type": "ARRAY", "items": { "type": "STRING" } });
    let score = json!({ "type": "INTEGER", "minimum": 0, "maximum": 5 });

    json!({
        "type": "OBJECT",
        "properties": {
            "catchphrase": { "type": "STRING" },
            "summary": { "type": "STRING" },
            "scores": {
                "type": "OBJECT",
                "properties": {
                    "sociability": score,
                    "logic": score,
                    "curiosity": score,
                    "cooperation": score,
                    "action": score,
                },
                "required": ["sociability", "logic", "curiosity", "cooperation", "action"],
            },
            "businessAptitude": {
                "type": "OBJECT",
                "properties": {
                    "workStyle": { "type": "STRING" },
                    "strengths": string_list,
                    "suitableRoles": string_list,
                },
                "required": ["workStyle", "strengths", "suitableRoles"],
            },
            "personCommunity": {
                "type": "OBJECT",
                "properties": {
                    "socialStyle": { "type": "STRING" },
                    "values": string_list,
                    "interactionTips": { "type": "STRING" },
                    "optimalPlace": { "type": "STRING" },
                },
                "required": ["socialStyle", "values", "interactionTips", "optimalPlace"],
            },
            "type": { "type": "STRING" },
        },
        "required": ["catchphrase", "summary", "scores", "businessAptitude", "personCommunity", "type"],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileAttachment;

    #[test]
    fn test_text_only_request() {
        let input = AnalysisInput {
            text: Some("X".to_string()),
            url: None,
            files: vec![],
        };
        let request = build_request(&input);
        let parts = &request.contents[0].parts;
        assert_eq!(parts.len(), 1);
        match &parts[0] {
            Part::Text(text) => {
                assert!(text.starts_with("Analyze the combined data"));
                assert!(text.ends_with("[Text]:\nX"));
                assert!(!text.contains("[URL]"));
            }
            other => panic!("expected text part, got {:?}", other),
        }
    }

    #[test]
    fn test_files_precede_instruction_in_order() {
        let input = AnalysisInput {
            text: None,
            url: Some("https://example.com/me".to_string()),
            files: vec![
                FileAttachment {
                    base64: "AAA=".to_string(),
                    mime_type: "application/pdf".to_string(),
                    file_name: "a.pdf".to_string(),
                },
                FileAttachment {
                    base64: "QkI=".to_string(),
                    mime_type: "text/plain".to_string(),
                    file_name: "b.txt".to_string(),
                },
            ],
        };
        let value = serde_json::to_value(build_request(&input)).unwrap();
        let parts = value["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0]["inlineData"]["mimeType"], "application/pdf");
        assert_eq!(parts[0]["inlineData"]["data"], "AAA=");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "text/plain");
        let prompt = parts[2]["text"].as_str().unwrap();
        assert!(prompt.contains("[URL]:\nhttps://example.com/me"));
        assert!(!prompt.contains("[Text]"));
    }

    #[test]
    fn test_request_declares_schema_and_system_instruction() {
        let value = serde_json::to_value(build_request(&AnalysisInput::default())).unwrap();
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        let required = value["generationConfig"]["responseSchema"]["required"]
            .as_array()
            .unwrap();
        assert_eq!(required.len(), 6);
        assert_eq!(
            value["systemInstruction"]["parts"][0]["text"],
            SYSTEM_INSTRUCTION
        );
        assert!(value["systemInstruction"].get("role").is_none());
    }
}
