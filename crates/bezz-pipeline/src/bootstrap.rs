//! Wiring the production clients from configuration.

use std::sync::Arc;

use bezz_ai::{ModelCapabilityRegistry, OpenAiClient};
use bezz_core::{AppConfig, PhotoStyles};
use bezz_db::BriefStore;
use bezz_storage::HttpObjectStore;

use crate::orchestrator::{PipelineDeps, PipelineOrchestrator};
use crate::{PipelineError, PipelineSettings};

/// Build an orchestrator backed by the OpenAI-compatible provider and HTTP
/// object storage named in `config`.
///
/// # Errors
///
/// Client construction failures and photo-style loading errors.
pub fn from_app_config(
    config: &AppConfig,
    store: Arc<dyn BriefStore>,
) -> Result<PipelineOrchestrator, PipelineError> {
    let openai = Arc::new(
        OpenAiClient::with_base_url(
            &config.openai_api_key,
            config.ai_request_timeout_secs,
            &config.openai_base_url,
        )?
        .with_image_size(&config.image_size),
    );
    let objects = Arc::new(
        HttpObjectStore::new(
            &config.storage_base_url,
            &config.storage_bucket,
            &config.storage_signing_secret,
            config.signed_url_ttl_secs,
        )?
        .with_token(config.storage_token.clone()),
    );
    let styles = PhotoStyles::from_optional_path(config.photo_styles_path.as_deref())?;

    let settings = PipelineSettings::from_app_config(config);
    tracing::info!(
        text_models = ?settings.text_models,
        image_model = %settings.image_model_primary,
        "pipeline configured"
    );

    Ok(PipelineOrchestrator::new(
        PipelineDeps {
            store,
            chat: openai.clone(),
            images: openai,
            objects,
            registry: Arc::new(ModelCapabilityRegistry::openai_defaults()),
            styles: Arc::new(styles),
        },
        settings,
    ))
}
