//! The brief state machine.
//!
//! A run walks `processing -> strategy_completed -> ads_completed ->
//! completed`, persisting each stage's output together with the status that
//! announces it. Stage failures park the brief in that stage's failure
//! status; naming and identity failures only degrade the result.

use std::sync::Arc;

use bezz_ai::{ChatClient, ImageClient, ModelCapabilityRegistry, ModelRouter};
use bezz_core::{
    BrandIdentity, BrandStrategy, Brief, BriefInput, BriefStatus, PhotoStyles, RenderedCreative,
};
use bezz_db::{BriefStore, DbError, FieldUpdate};
use bezz_storage::ObjectStore;
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use crate::active::{ActiveRuns, RunGuard};
use crate::batch::BatchImageCoordinator;
use crate::render::{ImageRenderWorker, RenderContext};
use crate::{stages, PipelineError, PipelineSettings};

/// Everything a pipeline talks to.
pub struct PipelineDeps {
    pub store: Arc<dyn BriefStore>,
    pub chat: Arc<dyn ChatClient>,
    pub images: Arc<dyn ImageClient>,
    pub objects: Arc<dyn ObjectStore>,
    pub registry: Arc<ModelCapabilityRegistry>,
    pub styles: Arc<PhotoStyles>,
}

#[derive(Clone)]
pub struct PipelineOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn BriefStore>,
    objects: Arc<dyn ObjectStore>,
    router: ModelRouter,
    worker: Arc<ImageRenderWorker>,
    batch: BatchImageCoordinator,
    settings: PipelineSettings,
    active: ActiveRuns,
}

impl PipelineOrchestrator {
    #[must_use]
    pub fn new(deps: PipelineDeps, settings: PipelineSettings) -> Self {
        let worker = Arc::new(ImageRenderWorker::new(
            deps.images,
            Arc::clone(&deps.objects),
            deps.styles,
            &settings,
        ));
        let batch = BatchImageCoordinator::new(Arc::clone(&worker), settings.render_max_concurrency);

        Self {
            inner: Arc::new(Inner {
                store: deps.store,
                objects: deps.objects,
                router: ModelRouter::new(deps.chat, deps.registry),
                worker,
                batch,
                settings,
                active: ActiveRuns::new(),
            }),
        }
    }

    /// Validate, persist, and start a new brief.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Status`] for invalid input, or a store error.
    pub async fn submit(
        &self,
        owner_id: &str,
        input: BriefInput,
    ) -> Result<(Brief, JoinHandle<()>), PipelineError> {
        input.validate()?;
        let brief = Brief::new(owner_id, input, Utc::now());
        self.inner.store.set(&brief).await?;
        tracing::info!(brief_id = %brief.id, owner_id, "brief submitted");

        let handle = self.start_pipeline(brief.clone())?;
        Ok((brief, handle))
    }

    /// Fire-and-forget run of an already persisted brief in `processing`.
    /// The returned handle may be dropped; the run continues.
    ///
    /// # Errors
    ///
    /// [`PipelineError::AlreadyRunning`] when this brief has a run in flight.
    pub fn start_pipeline(&self, brief: Brief) -> Result<JoinHandle<()>, PipelineError> {
        let guard = self
            .inner
            .active
            .try_acquire(&brief.id)
            .ok_or_else(|| PipelineError::AlreadyRunning(brief.id.clone()))?;
        Ok(self.spawn(brief, guard))
    }

    /// Reset a failed brief to `processing` and run the whole pipeline again
    /// from its stored input. `owner_id` of `None` skips the ownership check.
    ///
    /// # Errors
    ///
    /// [`PipelineError::NotRetryable`] unless the brief is in a failure
    /// status, [`PipelineError::AlreadyRunning`], [`PipelineError::NotFound`],
    /// or [`PipelineError::Forbidden`].
    pub async fn retry_pipeline(
        &self,
        id: &str,
        owner_id: Option<&str>,
    ) -> Result<JoinHandle<()>, PipelineError> {
        let brief = match owner_id {
            Some(owner_id) => self.get_owned(id, owner_id).await?,
            None => self.inner.load(id).await?,
        };
        if !brief.status.is_retryable() {
            return Err(PipelineError::NotRetryable {
                id: id.to_string(),
                status: brief.status,
            });
        }

        let guard = self
            .inner
            .active
            .try_acquire(id)
            .ok_or_else(|| PipelineError::AlreadyRunning(id.to_string()))?;

        // A run that finished between the first read and the claim may
        // have moved the brief on.
        let mut brief = self.inner.load(id).await?;
        let mut status = brief.status;
        if !status.is_retryable() {
            return Err(PipelineError::NotRetryable {
                id: id.to_string(),
                status,
            });
        }
        match self
            .inner
            .advance(id, &mut status, BriefStatus::Processing, Vec::new())
            .await
        {
            Ok(()) => {}
            Err(PipelineError::Db(DbError::StatusConflict { actual, .. })) => {
                return Err(PipelineError::NotRetryable {
                    id: id.to_string(),
                    status: actual,
                });
            }
            Err(e) => return Err(e),
        }
        tracing::info!(brief_id = id, "retry accepted");

        brief.status = status;
        Ok(self.spawn(brief, guard))
    }

    fn spawn(&self, brief: Brief, guard: RunGuard) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let _guard = guard;
            let id = brief.id.clone();
            match inner.execute(brief).await {
                Ok(status) => tracing::info!(brief_id = %id, %status, "pipeline finished"),
                Err(e) => tracing::error!(brief_id = %id, error = %e, "pipeline aborted"),
            }
        })
    }

    /// # Errors
    ///
    /// [`PipelineError::NotFound`] or [`PipelineError::Forbidden`].
    pub async fn get_owned(&self, id: &str, owner_id: &str) -> Result<Brief, PipelineError> {
        let brief = self.inner.load(id).await?;
        if brief.owner_id != owner_id {
            return Err(PipelineError::Forbidden(id.to_string()));
        }
        Ok(brief)
    }

    /// # Errors
    ///
    /// Store errors only.
    pub async fn list(&self, owner_id: &str, limit: Option<i64>) -> Result<Vec<Brief>, PipelineError> {
        Ok(self.inner.store.list_by_owner(owner_id, limit).await?)
    }

    /// # Errors
    ///
    /// [`PipelineError::AlreadyRunning`] while a run is in flight, plus the
    /// errors of [`PipelineOrchestrator::get_owned`].
    pub async fn delete_owned(&self, id: &str, owner_id: &str) -> Result<(), PipelineError> {
        self.get_owned(id, owner_id).await?;
        if self.inner.active.contains(id) {
            return Err(PipelineError::AlreadyRunning(id.to_string()));
        }
        if !self.inner.store.delete(id).await? {
            return Err(PipelineError::NotFound(id.to_string()));
        }
        tracing::info!(brief_id = id, "brief deleted");
        Ok(())
    }

    #[must_use]
    pub fn is_active(&self, id: &str) -> bool {
        self.inner.active.contains(id)
    }

    /// Re-sign every stored image of the brief and persist the fresh URLs.
    /// Images without an object key, and keys that fail to sign, keep their
    /// current URL.
    ///
    /// # Errors
    ///
    /// Ownership and store errors.
    pub async fn refresh_image_urls(
        &self,
        id: &str,
        owner_id: &str,
    ) -> Result<Vec<RenderedCreative>, PipelineError> {
        let brief = self.get_owned(id, owner_id).await?;
        let mut ads = brief.ads().to_vec();
        let mut updates = Vec::new();

        if !ads.is_empty() {
            for ad in &mut ads {
                if let Some(url) = self.inner.resign(id, &ad.object_key) {
                    ad.image_url = url;
                }
            }
            updates.push(FieldUpdate::new("results.ads", &ads)?);
        }

        let logo = brief
            .results
            .as_ref()
            .and_then(|r| r.brand_identity.as_ref());
        if let Some(url) = logo.and_then(|identity| self.inner.resign(id, &identity.logo_object_key)) {
            updates.push(FieldUpdate::new("results.brand_identity.logo_image_url", url)?);
        }

        if !updates.is_empty() {
            updates.push(FieldUpdate::new("updated_at", Utc::now())?);
            self.inner.store.update_fields(id, &updates).await?;
        }
        tracing::info!(brief_id = id, ads = ads.len(), "image URLs refreshed");
        Ok(ads)
    }

    /// Park runs abandoned by a previous process so they can be retried.
    /// Returns how many briefs were moved.
    ///
    /// # Errors
    ///
    /// Only when the stale listing itself fails; per-brief failures are logged.
    pub async fn sweep_stale(&self, now: DateTime<Utc>) -> Result<usize, PipelineError> {
        let Some(cutoff) = now.checked_sub_signed(self.inner.settings.stale_after) else {
            return Ok(0);
        };
        let stale = self.inner.store.list_stale(cutoff).await?;
        let mut parked = 0;

        for brief in stale {
            if self.inner.active.contains(&brief.id) {
                continue;
            }
            let Some(next) = brief.status.stale_resolution() else {
                continue;
            };
            let mut status = brief.status;
            match self.inner.advance(&brief.id, &mut status, next, Vec::new()).await {
                Ok(()) => parked += 1,
                Err(PipelineError::Db(DbError::StatusConflict { actual, .. })) => {
                    tracing::debug!(brief_id = %brief.id, %actual, "stale brief moved on; skipping");
                }
                Err(e) => {
                    tracing::warn!(brief_id = %brief.id, error = %e, "failed to park stale brief");
                }
            }
        }

        if parked > 0 {
            tracing::info!(parked, "stale briefs parked");
        }
        Ok(parked)
    }
}

impl Inner {
    async fn load(&self, id: &str) -> Result<Brief, PipelineError> {
        self.store.get(id).await.map_err(PipelineError::from_db)
    }

    fn resign(&self, id: &str, object_key: &str) -> Option<String> {
        if object_key.is_empty() {
            return None;
        }
        match self.objects.sign(object_key) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(brief_id = id, object_key, error = %e, "re-signing failed; keeping URL");
                None
            }
        }
    }

    /// Validate `status -> next`, then persist it along with `extra` in one
    /// update that only applies while the stored status is still `status`.
    /// `status` only moves once the write succeeded.
    async fn advance(
        &self,
        id: &str,
        status: &mut BriefStatus,
        next: BriefStatus,
        mut extra: Vec<FieldUpdate>,
    ) -> Result<(), PipelineError> {
        let next = status.transition(next)?;
        extra.extend(FieldUpdate::status(next, Utc::now()));
        self.store.update_fields_if(id, *status, &extra).await?;
        tracing::info!(brief_id = id, from = %status, to = %next, "status advanced");
        *status = next;
        Ok(())
    }

    async fn execute(&self, brief: Brief) -> Result<BriefStatus, PipelineError> {
        let id = brief.id.as_str();
        let models = &self.settings.text_models;
        let mut status = brief.status;
        tracing::info!(brief_id = id, company = %brief.input.company_name, "pipeline started");

        let strategy = match self.strategy_stage(&brief).await {
            Ok(strategy) => strategy,
            Err(e) => {
                tracing::warn!(brief_id = id, error = %e, "strategy stage failed");
                self.advance(id, &mut status, BriefStatus::Failed, Vec::new()).await?;
                return Ok(status);
            }
        };

        let names = match stages::suggest_names(&self.router, models, &brief.input, &strategy).await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(brief_id = id, error = %e, "naming stage failed; continuing without names");
                Vec::new()
            }
        };

        let identity = match self.identity_stage(&brief, &strategy).await {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::warn!(brief_id = id, error = %e, "identity stage failed; continuing without identity");
                None
            }
        };

        let mut updates = vec![
            FieldUpdate::new("results.strategy", &strategy)?,
            FieldUpdate::new("results.brand_names", &names)?,
        ];
        if let Some(identity) = &identity {
            updates.push(FieldUpdate::new("results.brand_identity", identity)?);
        }
        self.advance(id, &mut status, BriefStatus::StrategyCompleted, updates)
            .await?;

        let specs = match stages::write_ad_copy(
            &self.router,
            models,
            &strategy,
            identity.as_ref(),
            &brief.input.language,
        )
        .await
        {
            Ok(specs) if !specs.is_empty() => specs,
            Ok(_) => {
                tracing::warn!(brief_id = id, "ad copy stage returned no creatives");
                self.advance(id, &mut status, BriefStatus::AdsFailed, Vec::new()).await?;
                return Ok(status);
            }
            Err(e) => {
                tracing::warn!(brief_id = id, error = %e, "ad copy stage failed");
                self.advance(id, &mut status, BriefStatus::AdsFailed, Vec::new()).await?;
                return Ok(status);
            }
        };

        let ctx = RenderContext::for_brief(&brief);
        let ads = match self.batch.render_all(&specs, &ctx).await {
            Ok(ads) => ads,
            Err(e) => {
                tracing::warn!(brief_id = id, error = %e, "image batch failed");
                self.advance(id, &mut status, BriefStatus::ImagesFailed, Vec::new()).await?;
                return Ok(status);
            }
        };

        self.advance(
            id,
            &mut status,
            BriefStatus::AdsCompleted,
            vec![FieldUpdate::new("results.ads", &ads)?],
        )
        .await?;
        self.advance(id, &mut status, BriefStatus::Completed, Vec::new()).await?;
        Ok(status)
    }

    async fn strategy_stage(&self, brief: &Brief) -> Result<BrandStrategy, PipelineError> {
        let models = &self.settings.text_models;
        let summary = stages::summarize(&self.router, models, &brief.input).await?;
        tracing::info!(brief_id = %brief.id, model = %summary.model, "brief summarized");

        let strategy =
            stages::derive_strategy(&self.router, models, &summary.value, &brief.input.language)
                .await?;
        tracing::info!(brief_id = %brief.id, model = %strategy.model, "strategy derived");
        Ok(strategy.value)
    }

    /// Concept and palette from the model, then the logo image. A missing
    /// logo image fails the whole stage.
    async fn identity_stage(
        &self,
        brief: &Brief,
        strategy: &BrandStrategy,
    ) -> Result<BrandIdentity, PipelineError> {
        let draft = stages::draft_identity(
            &self.router,
            &self.settings.text_models,
            &brief.input,
            strategy,
        )
        .await?;

        let prompt = draft.logo_prompt_for(&brief.input.company_name);
        let logo = self
            .worker
            .render_logo(&prompt, &RenderContext::for_brief(brief))
            .await?;

        Ok(BrandIdentity {
            logo_concept: draft.logo_concept,
            color_palette: draft.color_palette,
            logo_image_url: logo.url,
            logo_object_key: logo.object_key,
        })
    }
}
