use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{BriefStatus, CoreError};

const SUPPORTED_LANGUAGES: [&str; 2] = ["en", "fr"];
const MAX_FIELD_LEN: usize = 2_000;

/// Founder-supplied fields that seed a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BriefInput {
    pub company_name: String,
    pub sector: String,
    pub tone: String,
    pub target_audience: String,
    /// `en` or `fr`.
    pub language: String,
    #[serde(default)]
    pub business_description: String,
    #[serde(default)]
    pub additional_info: String,
}

impl BriefInput {
    /// Check required fields and the language code.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<(), CoreError> {
        let required = [
            ("company_name", &self.company_name),
            ("sector", &self.sector),
            ("tone", &self.tone),
            ("target_audience", &self.target_audience),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CoreError::Validation(format!("{field} must be non-empty")));
            }
        }

        let long_fields = [
            ("company_name", &self.company_name),
            ("business_description", &self.business_description),
            ("additional_info", &self.additional_info),
        ];
        for (field, value) in long_fields {
            if value.len() > MAX_FIELD_LEN {
                return Err(CoreError::Validation(format!(
                    "{field} must be at most {MAX_FIELD_LEN} bytes"
                )));
            }
        }

        if !SUPPORTED_LANGUAGES.contains(&self.language.as_str()) {
            return Err(CoreError::Validation(format!(
                "language must be one of {SUPPORTED_LANGUAGES:?}, got '{}'",
                self.language
            )));
        }

        Ok(())
    }

    /// URL- and object-key-safe slug of the company name.
    #[must_use]
    pub fn company_slug(&self) -> String {
        let slug = self
            .company_name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-");

        if slug.is_empty() {
            "brand".to_string()
        } else {
            slug
        }
    }
}

/// The persisted brief document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brief {
    pub id: String,
    pub owner_id: String,
    #[serde(flatten)]
    pub input: BriefInput,
    pub status: BriefStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<BriefResults>,
}

impl Brief {
    /// A fresh brief in `processing`, with a random v4 id.
    #[must_use]
    pub fn new(owner_id: &str, input: BriefInput, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            input,
            status: BriefStatus::Processing,
            created_at: now,
            updated_at: now,
            results: None,
        }
    }

    #[must_use]
    pub fn ads(&self) -> &[RenderedCreative] {
        self.results
            .as_ref()
            .and_then(|r| r.ads.as_deref())
            .unwrap_or_default()
    }
}

/// Stage outputs. Each field is written when its stage completes; `None`
/// means the stage has not run or did not produce a result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<BrandStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_names: Option<Vec<NameSuggestion>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_identity: Option<BrandIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ads: Option<Vec<RenderedCreative>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandStrategy {
    pub positioning: String,
    pub value_proposition: String,
    pub tagline: String,
    pub brand_pillars: Vec<String>,
    pub messaging_framework: MessagingFramework,
    pub target_segments: Vec<TargetSegment>,
    pub campaign_angles: Vec<CampaignAngle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagingFramework {
    pub primary_message: String,
    pub supporting_messages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetSegment {
    pub name: String,
    pub role: String,
    pub demographics: String,
    pub psychographics: String,
    pub pain_points: Vec<String>,
    pub motivations: Vec<String>,
    pub preferred_channels: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignAngle {
    pub hook: String,
    pub resonance: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameSuggestion {
    pub name: String,
    #[serde(default)]
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandIdentity {
    pub logo_concept: String,
    pub color_palette: Vec<ColorSwatch>,
    pub logo_image_url: String,
    /// Empty when the logo could not be stored and `logo_image_url` is the
    /// provider's own reference.
    #[serde(default)]
    pub logo_object_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSwatch {
    pub name: String,
    pub hex: String,
    #[serde(default)]
    pub usage: String,
    #[serde(default)]
    pub psychology: String,
}

/// One ad unit as written by the ad-copy stage, before rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreativeSpec {
    /// Ordinal within the batch.
    pub id: u32,
    pub headline: String,
    pub body: String,
    #[serde(alias = "dalle_prompt")]
    pub image_prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedCreative {
    #[serde(flatten)]
    pub spec: CreativeSpec,
    pub image_url: String,
    /// Storage key used to re-sign `image_url`; empty when the upload fell
    /// back to the raw provider reference.
    #[serde(default)]
    pub object_key: String,
    pub prompt_used: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> BriefInput {
        BriefInput {
            company_name: "Acme Labs".to_string(),
            sector: "Technology".to_string(),
            tone: "confident".to_string(),
            target_audience: "CTOs".to_string(),
            language: "en".to_string(),
            business_description: "Developer tooling".to_string(),
            additional_info: String::new(),
        }
    }

    #[test]
    fn valid_input_passes() {
        assert!(valid_input().validate().is_ok());
    }

    #[test]
    fn blank_sector_is_rejected() {
        let mut input = valid_input();
        input.sector = "   ".to_string();
        let err = input.validate().unwrap_err();
        assert!(matches!(err, CoreError::Validation(ref m) if m.contains("sector")));
    }

    #[test]
    fn unsupported_language_is_rejected() {
        let mut input = valid_input();
        input.language = "de".to_string();
        assert!(input.validate().is_err());
    }

    #[test]
    fn company_slug_collapses_punctuation() {
        let mut input = valid_input();
        input.company_name = "  Café & Co. (Paris) ".to_string();
        assert_eq!(input.company_slug(), "caf-co-paris");
    }

    #[test]
    fn company_slug_never_empty() {
        let mut input = valid_input();
        input.company_name = "***".to_string();
        assert_eq!(input.company_slug(), "brand");
    }

    #[test]
    fn new_brief_starts_processing_without_results() {
        let brief = Brief::new("user-1", valid_input(), Utc::now());
        assert_eq!(brief.status, BriefStatus::Processing);
        assert!(brief.results.is_none());
        assert!(brief.ads().is_empty());
    }

    #[test]
    fn brief_document_flattens_input_fields() {
        let brief = Brief::new("user-1", valid_input(), Utc::now());
        let doc = serde_json::to_value(&brief).expect("serialize");
        assert_eq!(doc["company_name"], "Acme Labs");
        assert_eq!(doc["status"], "processing");
        assert!(doc.get("results").is_none());
    }

    #[test]
    fn creative_spec_accepts_legacy_prompt_key() {
        let spec: CreativeSpec = serde_json::from_value(serde_json::json!({
            "id": 2,
            "headline": "h",
            "body": "b",
            "dalle_prompt": "a photo"
        }))
        .expect("deserialize");
        assert_eq!(spec.image_prompt, "a photo");
    }
}
