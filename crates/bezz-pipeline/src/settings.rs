use std::time::Duration;

use bezz_core::AppConfig;

const DEFAULT_STALE_MINUTES: i64 = 60;

/// Knobs the orchestrator and render worker read at run time.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Ordered text-model fallback chain.
    pub text_models: Vec<String>,
    pub image_model_primary: String,
    pub image_model_fallback: String,
    /// Retries after the first render attempt.
    pub render_max_retries: u32,
    /// Attempt `n` sleeps `n * render_backoff_unit` first.
    pub render_backoff_unit: Duration,
    /// `None` runs every creative of a batch at once.
    pub render_max_concurrency: Option<usize>,
    pub stale_after: chrono::Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            text_models: ["gpt-5-mini", "o4-mini", "gpt-4", "gpt-3.5-turbo"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            image_model_primary: "gpt-image-1".to_string(),
            image_model_fallback: "dall-e-3".to_string(),
            render_max_retries: 2,
            render_backoff_unit: Duration::from_secs(2),
            render_max_concurrency: None,
            stale_after: stale_minutes(DEFAULT_STALE_MINUTES),
        }
    }
}

impl PipelineSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            text_models: config.text_models.clone(),
            image_model_primary: config.image_model_primary.clone(),
            image_model_fallback: config.image_model_fallback.clone(),
            render_max_retries: config.render_max_retries,
            render_backoff_unit: Duration::from_millis(config.render_backoff_unit_ms),
            render_max_concurrency: match config.render_max_concurrency {
                0 => None,
                n => Some(n),
            },
            stale_after: stale_minutes(config.stale_run_minutes),
        }
    }
}

fn stale_minutes(minutes: i64) -> chrono::Duration {
    chrono::Duration::try_minutes(minutes).unwrap_or(chrono::Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_allow_three_render_attempts() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.render_max_retries + 1, 3);
        assert_eq!(settings.render_max_concurrency, None);
        assert_eq!(settings.stale_after, chrono::Duration::minutes(60));
    }
}
