// src/types/analysis.rs
//! Analysis input and result structures shared by the collector, the Gemini client and the renderer

use serde::{Deserialize, Deserializer, Serialize};

/// Upper bound of every personality axis
pub const MAX_SCORE: u8 = 5;

// ===== Input =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttachment {
    pub base64: String,
    pub mime_type: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub files: Vec<FileAttachment>,
}

impl AnalysisInput {
    pub fn has_text(&self) -> bool {
        self.text.is_some()
    }

    pub fn has_url(&self) -> bool {
        self.url.is_some()
    }

    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }
}

// ===== Result =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalityScores {
    #[serde(deserialize_with = "bounded_score")]
    pub sociability: u8,
    #[serde(deserialize_with = "bounded_score")]
    pub logic: u8,
    #[serde(deserialize_with = "bounded_score")]
    pub curiosity: u8,
    #[serde(deserialize_with = "bounded_score")]
    pub cooperation: u8,
    #[serde(deserialize_with = "bounded_score")]
    pub action: u8,
}

impl PersonalityScores {
    /// Axis values in chart order
    pub fn as_array(&self) -> [u8; 5] {
        [
            self.sociability,
            self.logic,
            self.curiosity,
            self.cooperation,
            self.action,
        ]
    }
}

/// The model is asked for integers but may answer 3.5 or 7; round, then clamp into 0..=5.
fn bounded_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() {
        return Err(serde::de::Error::custom("score must be a finite number"));
    }
    Ok(raw.round().clamp(0.0, f64::from(MAX_SCORE)) as u8)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessAptitude {
    pub work_style: String,
    pub strengths: Vec<String>,
    pub suitable_roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonCommunity {
    pub social_style: String,
    pub values: Vec<String>,
    pub interaction_tips: String,
    pub optimal_place: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub catchphrase: String,
    pub summary: String,
    pub scores: PersonalityScores,
    pub business_aptitude: BusinessAptitude,
    pub person_community: PersonCommunity,
    #[serde(rename = "type")]
    pub result_type: String,
}

#[cfg(test)]
pub(crate) fn sample_result() -> AnalysisResult {
    AnalysisResult {
        catchphrase: "静かな情熱で道を拓く探究者".to_string(),
        summary: "論理と好奇心を両輪に、新しい解決策を粘り強く探す人物です。".to_string(),
        scores: PersonalityScores {
            sociability: 3,
            logic: 5,
            curiosity: 4,
            cooperation: 3,
            action: 4,
        },
        business_aptitude: BusinessAptitude {
            work_style: "仮説検証型".to_string(),
            strengths: vec!["問題分解".to_string(), "粘り強さ".to_string()],
            suitable_roles: vec!["リサーチャー".to_string(), "プロダクトマネージャー".to_string()],
        },
        person_community: PersonCommunity {
            social_style: "少人数で深く".to_string(),
            values: vec!["誠実さ".to_string(), "成長".to_string()],
            interaction_tips: "結論から話すと伝わりやすい".to_string(),
            optimal_place: "裁量のある小さなチーム".to_string(),
        },
        result_type: "Creative Analyst".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_uses_model_field_names() {
        let value = serde_json::to_value(sample_result()).unwrap();
        for key in [
            "catchphrase",
            "summary",
            "scores",
            "businessAptitude",
            "personCommunity",
            "type",
        ] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
        assert!(value["businessAptitude"].get("suitableRoles").is_some());
        assert!(value["personCommunity"].get("optimalPlace").is_some());
    }

    #[test]
    fn test_scores_are_rounded_and_clamped() {
        let scores: PersonalityScores = serde_json::from_str(
            r#"{"sociability": 3.6, "logic": 9, "curiosity": -2, "cooperation": 0, "action": 5}"#,
        )
        .unwrap();
        assert_eq!(scores.as_array(), [4, 5, 0, 0, 5]);
    }

    #[test]
    fn test_missing_nested_field_is_rejected() {
        let mut value = serde_json::to_value(sample_result()).unwrap();
        value["personCommunity"]
            .as_object_mut()
            .unwrap()
            .remove("interactionTips");
        assert!(serde_json::from_value::<AnalysisResult>(value).is_err());
    }

    #[test]
    fn test_input_flags() {
        let input = AnalysisInput {
            text: Some("hello".to_string()),
            url: None,
            files: vec![],
        };
        assert!(input.has_text());
        assert!(!input.has_url());
        assert!(!input.has_files());
    }
}
