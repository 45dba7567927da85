//! One function per model-backed stage. Each builds its prompt, routes it
//! through the fallback chain, and maps the model's JSON into domain types.

use std::collections::HashSet;

use bezz_ai::{JsonPrompt, ModelRouter, Routed};
use bezz_core::{
    BrandIdentity, BrandStrategy, BriefInput, CampaignAngle, ColorSwatch, CreativeSpec,
    MessagingFramework, NameSuggestion, TargetSegment,
};
use serde::{Deserialize, Serialize};

use crate::{prompts, PipelineError};

pub const NAME_COUNT: usize = 5;
pub const AD_COUNT: usize = 3;

/// Brief-GPT output; feeds the strategy stage verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriefSummary {
    pub brand_goal: String,
    #[serde(default)]
    pub audience: String,
    #[serde(default)]
    pub tone: String,
    #[serde(default)]
    pub vision: String,
}

#[derive(Debug, Deserialize)]
struct StrategistResponse {
    positioning_statement: String,
    #[serde(default)]
    value_proposition: String,
    #[serde(default)]
    tagline: String,
    #[serde(default)]
    brand_pillars: Vec<String>,
    #[serde(default)]
    messaging_framework: MessagingFramework,
    #[serde(default)]
    target_segments: Vec<TargetSegment>,
    #[serde(default)]
    campaign_angles: Vec<CampaignAngle>,
}

impl From<StrategistResponse> for BrandStrategy {
    fn from(r: StrategistResponse) -> Self {
        BrandStrategy {
            positioning: r.positioning_statement,
            value_proposition: r.value_proposition,
            tagline: r.tagline,
            brand_pillars: r.brand_pillars,
            messaging_framework: r.messaging_framework,
            target_segments: r.target_segments,
            campaign_angles: r.campaign_angles,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NamesResponse {
    brand_names: Vec<NameSuggestion>,
}

/// Identity stage output before the logo is rendered.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IdentityDraft {
    pub logo_concept: String,
    #[serde(default)]
    pub color_palette: Vec<ColorSwatch>,
    #[serde(default, alias = "dalle_prompt")]
    pub logo_prompt: String,
}

impl IdentityDraft {
    /// The image prompt for the logo, derived from the concept when the model
    /// left it out.
    #[must_use]
    pub fn logo_prompt_for(&self, company_name: &str) -> String {
        if self.logo_prompt.trim().is_empty() {
            format!(
                "Professional logo design for {company_name} on a white background, \
                 clean vector style, modern typography: {}",
                self.logo_concept
            )
        } else {
            self.logo_prompt.clone()
        }
    }
}

#[derive(Debug, Deserialize)]
struct AdCopyResponse {
    ads: Vec<CreativeSpec>,
}

/// Brief-GPT: founder input to a structured summary.
///
/// # Errors
///
/// The router's last error once every model has failed.
pub async fn summarize(
    router: &ModelRouter,
    models: &[String],
    input: &BriefInput,
) -> Result<Routed<BriefSummary>, PipelineError> {
    let user = prompts::summary_prompt(input);
    let prompt = JsonPrompt {
        system: prompts::SUMMARY_SYSTEM,
        user: &user,
        max_tokens: 800,
        temperature: 0.3,
    };
    Ok(router.complete_json::<BriefSummary>(models, &prompt).await?)
}

/// Strategist-GPT: summary to full brand strategy.
///
/// # Errors
///
/// The router's last error once every model has failed.
pub async fn derive_strategy(
    router: &ModelRouter,
    models: &[String],
    summary: &BriefSummary,
    language: &str,
) -> Result<Routed<BrandStrategy>, PipelineError> {
    let summary_json = serde_json::to_string_pretty(summary)?;
    let user = prompts::strategy_prompt(&summary_json, language);
    let prompt = JsonPrompt {
        system: prompts::STRATEGY_SYSTEM,
        user: &user,
        max_tokens: 2000,
        temperature: 0.4,
    };
    let routed = router
        .complete_json::<StrategistResponse>(models, &prompt)
        .await?;
    Ok(Routed {
        model: routed.model,
        value: routed.value.into(),
    })
}

/// # Errors
///
/// The router's last error once every model has failed.
pub async fn suggest_names(
    router: &ModelRouter,
    models: &[String],
    input: &BriefInput,
    strategy: &BrandStrategy,
) -> Result<Vec<NameSuggestion>, PipelineError> {
    let user = prompts::naming_prompt(input, strategy, NAME_COUNT);
    let prompt = JsonPrompt {
        system: prompts::NAMING_SYSTEM,
        user: &user,
        max_tokens: 1000,
        temperature: 0.8,
    };
    let routed = router.complete_json::<NamesResponse>(models, &prompt).await?;
    let mut names: Vec<NameSuggestion> = routed
        .value
        .brand_names
        .into_iter()
        .filter(|n| !n.name.trim().is_empty())
        .collect();
    names.truncate(NAME_COUNT);
    Ok(names)
}

/// # Errors
///
/// The router's last error once every model has failed.
pub async fn draft_identity(
    router: &ModelRouter,
    models: &[String],
    input: &BriefInput,
    strategy: &BrandStrategy,
) -> Result<IdentityDraft, PipelineError> {
    let user = prompts::identity_prompt(input, strategy);
    let prompt = JsonPrompt {
        system: prompts::IDENTITY_SYSTEM,
        user: &user,
        max_tokens: 1500,
        temperature: 0.7,
    };
    let routed = router.complete_json::<IdentityDraft>(models, &prompt).await?;
    Ok(routed.value)
}

/// Creative-Director-GPT: strategy and identity to ad specs, ordered as the
/// model returned them and numbered from 1 when the model's ids are unusable.
///
/// # Errors
///
/// The router's last error once every model has failed, or
/// [`PipelineError::Encode`] if the context cannot be serialized.
pub async fn write_ad_copy(
    router: &ModelRouter,
    models: &[String],
    strategy: &BrandStrategy,
    identity: Option<&BrandIdentity>,
    language: &str,
) -> Result<Vec<CreativeSpec>, PipelineError> {
    let strategy_json = serde_json::to_string_pretty(strategy)?;
    let identity_json = match identity {
        Some(identity) => serde_json::to_string_pretty(identity)?,
        None => "{}".to_string(),
    };
    let user = prompts::ad_copy_prompt(&strategy_json, &identity_json, AD_COUNT, language);
    let prompt = JsonPrompt {
        system: prompts::AD_COPY_SYSTEM,
        user: &user,
        max_tokens: 2000,
        temperature: 0.7,
    };
    let routed = router.complete_json::<AdCopyResponse>(models, &prompt).await?;
    let mut ads = routed.value.ads;
    ads.truncate(AD_COUNT);
    renumber_if_ambiguous(&mut ads);
    Ok(ads)
}

/// Ids key the stored images, so zero or repeated ids are replaced with
/// positions.
fn renumber_if_ambiguous(ads: &mut [CreativeSpec]) {
    let mut seen = HashSet::new();
    let usable = ads.iter().all(|ad| ad.id > 0 && seen.insert(ad.id));
    if usable {
        return;
    }
    for (position, ad) in (1_u32..).zip(ads.iter_mut()) {
        ad.id = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(id: u32) -> CreativeSpec {
        CreativeSpec {
            id,
            headline: format!("headline {id}"),
            body: String::new(),
            image_prompt: String::new(),
        }
    }

    #[test]
    fn distinct_ids_are_kept() {
        let mut ads = vec![spec(3), spec(1), spec(2)];
        renumber_if_ambiguous(&mut ads);
        assert_eq!(ads.iter().map(|a| a.id).collect::<Vec<_>>(), vec![3, 1, 2]);
    }

    #[test]
    fn duplicate_or_zero_ids_become_positions() {
        let mut ads = vec![spec(1), spec(1), spec(0)];
        renumber_if_ambiguous(&mut ads);
        assert_eq!(ads.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(ads[1].headline, "headline 1");
    }

    #[test]
    fn strategist_fields_map_onto_strategy() {
        let response: StrategistResponse = serde_json::from_value(serde_json::json!({
            "positioning_statement": "The calm CI for small teams",
            "tagline": "Ship calmly",
            "target_segments": [{"name": "Lead dev", "pain_points": ["flaky builds"]}]
        }))
        .expect("decode");
        let strategy = BrandStrategy::from(response);
        assert_eq!(strategy.positioning, "The calm CI for small teams");
        assert_eq!(strategy.target_segments[0].pain_points, vec!["flaky builds"]);
        assert!(strategy.target_segments[0].motivations.is_empty());
    }

    #[test]
    fn empty_object_is_not_a_strategy() {
        assert!(serde_json::from_str::<StrategistResponse>("{}").is_err());
        assert!(serde_json::from_str::<BriefSummary>("{}").is_err());
    }

    #[test]
    fn identity_draft_accepts_dalle_prompt_key() {
        let draft: IdentityDraft = serde_json::from_value(serde_json::json!({
            "logo_concept": "A folded paper plane",
            "dalle_prompt": "logo of a paper plane"
        }))
        .expect("decode");
        assert_eq!(draft.logo_prompt_for("Acme"), "logo of a paper plane");
    }

    #[test]
    fn missing_logo_prompt_falls_back_to_concept() {
        let draft = IdentityDraft {
            logo_concept: "A folded paper plane".to_string(),
            color_palette: Vec::new(),
            logo_prompt: String::new(),
        };
        let prompt = draft.logo_prompt_for("Acme");
        assert!(prompt.contains("Acme"));
        assert!(prompt.ends_with("A folded paper plane"));
    }
}
