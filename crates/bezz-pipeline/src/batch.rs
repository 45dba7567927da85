use std::sync::Arc;

use bezz_core::{CreativeSpec, RenderedCreative};
use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::render::{ImageRenderWorker, RenderContext};
use crate::PipelineError;

/// Renders a batch of creatives concurrently and accepts the batch only if
/// every creative rendered.
#[derive(Clone)]
pub struct BatchImageCoordinator {
    worker: Arc<ImageRenderWorker>,
    max_concurrency: Option<usize>,
}

impl BatchImageCoordinator {
    #[must_use]
    pub fn new(worker: Arc<ImageRenderWorker>, max_concurrency: Option<usize>) -> Self {
        Self {
            worker,
            max_concurrency,
        }
    }

    /// One task per spec, all joined before deciding. Output order follows
    /// `specs`.
    ///
    /// # Errors
    ///
    /// [`PipelineError::BatchIncomplete`] when any creative failed; the
    /// creatives that did render are discarded.
    pub async fn render_all(
        &self,
        specs: &[CreativeSpec],
        ctx: &RenderContext,
    ) -> Result<Vec<RenderedCreative>, PipelineError> {
        let total = specs.len();
        let limit = self.max_concurrency.unwrap_or(total).max(1);
        let permits = Arc::new(Semaphore::new(limit));

        let tasks = specs
            .iter()
            .cloned()
            .map(|spec| {
                let worker = Arc::clone(&self.worker);
                let permits = Arc::clone(&permits);
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    // The semaphore is never closed, so a permit always arrives.
                    let _permit = permits.acquire_owned().await.ok();
                    worker.render(&spec, &ctx).await
                })
            })
            .collect::<Vec<_>>();

        let outcomes = join_all(tasks).await;

        let mut rendered = Vec::with_capacity(total);
        for (spec, outcome) in specs.iter().zip(outcomes) {
            match outcome {
                Ok(Ok(creative)) => rendered.push(creative),
                Ok(Err(e)) => {
                    tracing::warn!(brief_id = %ctx.brief_id, spec_id = spec.id, error = %e, "creative failed");
                }
                Err(e) => {
                    tracing::error!(brief_id = %ctx.brief_id, spec_id = spec.id, error = %e, "render task panicked");
                }
            }
        }

        if rendered.len() == total {
            tracing::info!(brief_id = %ctx.brief_id, total, "image batch complete");
            Ok(rendered)
        } else {
            Err(PipelineError::BatchIncomplete {
                succeeded: rendered.len(),
                total,
            })
        }
    }
}
