use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use bezz_ai::{AiError, ImageClient, ImagePayload};
use bezz_core::{Brief, CreativeSpec, PhotoStyles, RenderedCreative};
use bezz_storage::ObjectStore;

use crate::enhance::{enhance_prompt, is_realistic_prompt};
use crate::{PipelineError, PipelineSettings};

const PNG: &str = "image/png";

/// What a render needs to know about the brief it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    pub brief_id: String,
    pub subject_name: String,
    /// Object-key-safe form of `subject_name`.
    pub subject_slug: String,
    /// Sector used to pick a photography style.
    pub domain_hint: String,
}

impl RenderContext {
    #[must_use]
    pub fn for_brief(brief: &Brief) -> Self {
        Self {
            brief_id: brief.id.clone(),
            subject_name: brief.input.company_name.clone(),
            subject_slug: brief.input.company_slug(),
            domain_hint: brief.input.sector.clone(),
        }
    }

    #[must_use]
    pub fn ad_key(&self, spec_id: u32) -> String {
        format!("ads/{}/{}-ad-{spec_id}.png", self.brief_id, self.subject_slug)
    }

    #[must_use]
    pub fn logo_key(&self) -> String {
        format!("logos/{}/{}-logo.png", self.brief_id, self.subject_slug)
    }
}

/// Where an image ended up. `object_key` is empty when the URL is not one of
/// ours and therefore cannot be re-signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub url: String,
    pub object_key: String,
}

impl StoredImage {
    fn unsigned(url: String) -> Self {
        Self {
            url,
            object_key: String::new(),
        }
    }
}

/// Renders one creative: enhance, generate with primary then fallback model,
/// store, and retry the whole attempt with linear backoff.
pub struct ImageRenderWorker {
    images: Arc<dyn ImageClient>,
    objects: Arc<dyn ObjectStore>,
    styles: Arc<PhotoStyles>,
    primary: String,
    fallback: String,
    max_retries: u32,
    backoff_unit: Duration,
}

impl ImageRenderWorker {
    #[must_use]
    pub fn new(
        images: Arc<dyn ImageClient>,
        objects: Arc<dyn ObjectStore>,
        styles: Arc<PhotoStyles>,
        settings: &PipelineSettings,
    ) -> Self {
        Self {
            images,
            objects,
            styles,
            primary: settings.image_model_primary.clone(),
            fallback: settings.image_model_fallback.clone(),
            max_retries: settings.render_max_retries,
            backoff_unit: settings.render_backoff_unit,
        }
    }

    /// # Errors
    ///
    /// [`PipelineError::RenderFailed`] with the last generation error once
    /// every attempt is spent. Storage failures never fail a render.
    pub async fn render(
        &self,
        spec: &CreativeSpec,
        ctx: &RenderContext,
    ) -> Result<RenderedCreative, PipelineError> {
        let style = self.styles.style_for(&ctx.domain_hint);
        let prompt = enhance_prompt(&spec.image_prompt, style);
        if !is_realistic_prompt(&prompt) {
            tracing::debug!(
                brief_id = %ctx.brief_id,
                spec_id = spec.id,
                "image prompt lacks photographic detail"
            );
        }

        let key = ctx.ad_key(spec.id);
        let mut last_err = AiError::NoCandidates;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.backoff_unit.saturating_mul(attempt);
                tracing::info!(
                    brief_id = %ctx.brief_id,
                    spec_id = spec.id,
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "retrying creative render"
                );
                tokio::time::sleep(delay).await;
            }

            match self.generate(&prompt).await {
                Ok(payload) => {
                    let stored = self.store(payload, &key).await;
                    tracing::info!(
                        brief_id = %ctx.brief_id,
                        spec_id = spec.id,
                        attempt,
                        stored = !stored.object_key.is_empty(),
                        "creative rendered"
                    );
                    return Ok(RenderedCreative {
                        spec: spec.clone(),
                        image_url: stored.url,
                        object_key: stored.object_key,
                        prompt_used: prompt,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        brief_id = %ctx.brief_id,
                        spec_id = spec.id,
                        attempt,
                        error = %e,
                        "creative render attempt failed"
                    );
                    last_err = e;
                }
            }
        }

        Err(PipelineError::RenderFailed {
            spec_id: spec.id,
            attempts: self.max_retries.saturating_add(1),
            source: last_err,
        })
    }

    /// One pass, no prompt enhancement and no retry.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Ai`] when both image models fail.
    pub async fn render_logo(
        &self,
        prompt: &str,
        ctx: &RenderContext,
    ) -> Result<StoredImage, PipelineError> {
        let payload = self.generate(prompt).await?;
        let stored = self.store(payload, &ctx.logo_key()).await;
        tracing::info!(brief_id = %ctx.brief_id, "logo rendered");
        Ok(stored)
    }

    async fn generate(&self, prompt: &str) -> Result<ImagePayload, AiError> {
        match self.images.generate(&self.primary, prompt).await {
            Ok(payload) => Ok(payload),
            Err(e) => {
                tracing::warn!(
                    model = %self.primary,
                    fallback = %self.fallback,
                    error = %e,
                    "primary image model failed"
                );
                self.images.generate(&self.fallback, prompt).await
            }
        }
    }

    /// Upload under `key`. Falls back to the provider URL (or a data URL for
    /// inline bytes) when the upload cannot be made.
    async fn store(&self, payload: ImagePayload, key: &str) -> StoredImage {
        match payload {
            ImagePayload::Url(url) => {
                if self.objects.is_stored_reference(&url) {
                    return StoredImage::unsigned(url);
                }
                let bytes = match self.images.download(&url).await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::warn!(key, error = %e, "image download failed; keeping provider URL");
                        return StoredImage::unsigned(url);
                    }
                };
                match self.objects.put(key, bytes, PNG).await {
                    Ok(signed) => StoredImage {
                        url: signed,
                        object_key: key.to_string(),
                    },
                    Err(e) => {
                        tracing::warn!(key, error = %e, "image upload failed; keeping provider URL");
                        StoredImage::unsigned(url)
                    }
                }
            }
            ImagePayload::Bytes(bytes) => match self.objects.put(key, bytes.clone(), PNG).await {
                Ok(signed) => StoredImage {
                    url: signed,
                    object_key: key.to_string(),
                },
                Err(e) => {
                    tracing::warn!(key, error = %e, "image upload failed; inlining as data URL");
                    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
                    StoredImage::unsigned(format!("data:{PNG};base64,{encoded}"))
                }
            },
        }
    }
}
