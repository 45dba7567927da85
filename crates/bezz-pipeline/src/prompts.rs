//! Stage prompts. System prompts fix the persona; user prompts carry the
//! brief data and the JSON shape each stage must return.

use bezz_core::{BrandStrategy, BriefInput};

pub const SUMMARY_SYSTEM: &str = "You are Brief-GPT. You turn raw founder input into a compact, \
structured brand brief. Answer with a single JSON object and nothing else.";

pub const STRATEGY_SYSTEM: &str = "You are Strategist-GPT, a senior brand strategist. \
Answer with a single JSON object and nothing else.";

pub const NAMING_SYSTEM: &str = "You are Brand-Name-GPT. You propose memorable, pronounceable \
brand names. Answer with a single JSON object and nothing else.";

pub const IDENTITY_SYSTEM: &str = "You are Logo-Designer-GPT, a brand identity designer. \
Answer with a single JSON object and nothing else.";

pub const AD_COPY_SYSTEM: &str = "You are Creative-Director-GPT. You write ad copy and \
photorealistic image briefs. Answer with a single JSON object and nothing else.";

fn language_name(code: &str) -> &'static str {
    match code {
        "fr" => "French",
        _ => "English",
    }
}

fn or_none(value: &str) -> &str {
    if value.trim().is_empty() {
        "(none provided)"
    } else {
        value
    }
}

#[must_use]
pub fn summary_prompt(input: &BriefInput) -> String {
    format!(
        r#"Condense the founder's answers below into a brand brief.

- Company name: {company}
- What the business does: {description}
- Sector: {sector}
- Target audience: {audience}
- Tone: {tone}
- Additional info: {additional}

Write every value in {language}. Return exactly:
{{
  "brand_goal": "the brand's goal in one or two sentences",
  "audience": "a sharper description of the target audience",
  "tone": "the brand's tone and personality",
  "vision": "a vision statement grounded in what the business does"
}}"#,
        company = input.company_name,
        description = or_none(&input.business_description),
        sector = input.sector,
        audience = input.target_audience,
        tone = input.tone,
        additional = or_none(&input.additional_info),
        language = language_name(&input.language),
    )
}

#[must_use]
pub fn strategy_prompt(summary_json: &str, language: &str) -> String {
    format!(
        r#"Build a brand strategy from this brief:
{summary_json}

Write every value in {language}. Return exactly:
{{
  "positioning_statement": "at most 50 words",
  "value_proposition": "one clear sentence",
  "tagline": "under 10 words",
  "brand_pillars": ["pillar", "pillar", "pillar"],
  "messaging_framework": {{
    "primary_message": "the core message",
    "supporting_messages": ["message", "message", "message"]
  }},
  "target_segments": [
    {{
      "name": "persona name",
      "role": "job title or role",
      "demographics": "age, location, income",
      "psychographics": "values, interests, behaviours",
      "pain_points": ["pain", "pain", "pain"],
      "preferred_channels": ["channel", "channel"]
    }}
  ],
  "campaign_angles": [
    {{"hook": "campaign hook", "resonance": "why it lands with the audience"}}
  ]
}}
Give three target segments and three campaign angles."#,
        language = language_name(language),
    )
}

#[must_use]
pub fn naming_prompt(input: &BriefInput, strategy: &BrandStrategy, count: usize) -> String {
    format!(
        r#"Suggest {count} alternative brand names.

- Current name: {company}
- Sector: {sector}
- Positioning: {positioning}
- Value proposition: {value}
- Target audience: {audience}
- Brand pillars: {pillars}

Names must be easy to say, fit the sector and travel well across markets.
Write rationales in {language}. Return exactly:
{{
  "brand_names": [
    {{"name": "suggested name", "rationale": "why it fits the strategy"}}
  ]
}}"#,
        company = input.company_name,
        sector = input.sector,
        positioning = strategy.positioning,
        value = strategy.value_proposition,
        audience = input.target_audience,
        pillars = strategy.brand_pillars.join(", "),
        language = language_name(&input.language),
    )
}

#[must_use]
pub fn identity_prompt(input: &BriefInput, strategy: &BrandStrategy) -> String {
    format!(
        r##"Design a logo concept and colour palette.

- Company name: {company}
- Sector: {sector}
- Positioning: {positioning}
- Value proposition: {value}
- Brand pillars: {pillars}
- Target audience: {audience}
- Tagline: {tagline}

Prefer a wordmark with a symbol. Give the palette clear primary, secondary and
accent roles and use only those colours in the logo prompt.
Write descriptions in {language}. Return exactly:
{{
  "logo_concept": "symbolism, typography and how it ties to the strategy",
  "color_palette": [
    {{"name": "colour name", "hex": "#RRGGBB", "usage": "primary", "psychology": "why it fits"}}
  ],
  "dalle_prompt": "professional logo on a white background, clean vector style, palette hex values named explicitly"
}}"##,
        company = input.company_name,
        sector = input.sector,
        positioning = strategy.positioning,
        value = strategy.value_proposition,
        pillars = strategy.brand_pillars.join(", "),
        audience = input.target_audience,
        tagline = strategy.tagline,
        language = language_name(&input.language),
    )
}

#[must_use]
pub fn ad_copy_prompt(
    strategy_json: &str,
    identity_json: &str,
    count: usize,
    language: &str,
) -> String {
    format!(
        r#"Write {count} ad variations for this brand.

Brand strategy:
{strategy_json}

Brand identity (logo concept and colours):
{identity_json}

Each dalle_prompt must describe a real photograph: start with "Professional DSLR photo of",
name the lens and aperture, describe the lighting, ask for shallow depth of field and sharp
focus, and work the palette hex values into props or backgrounds. No illustration, cartoon
or painting styles.
Write headlines and body copy in {language}. Return exactly:
{{
  "ads": [
    {{
      "id": 1,
      "headline": "under 20 words",
      "body": "under 50 words",
      "dalle_prompt": "Professional DSLR photo of ..."
    }}
  ]
}}
Number the ads from 1 and give each one a different angle from the strategy."#,
        language = language_name(language),
    )
}
