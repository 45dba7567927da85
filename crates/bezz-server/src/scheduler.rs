//! Background job scheduler.
//!
//! Runs the stale-run sweeper so briefs orphaned by a crashed or restarted
//! process end up in a retryable status.

use bezz_pipeline::PipelineOrchestrator;
use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Every ten minutes, on the minute.
const STALE_SWEEP_SCHEDULE: &str = "0 */10 * * * *";

/// Builds and starts the background job scheduler.
///
/// The returned handle must be kept alive for the lifetime of the process;
/// dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    orchestrator: PipelineOrchestrator,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_stale_sweep_job(&scheduler, orchestrator).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_stale_sweep_job(
    scheduler: &JobScheduler,
    orchestrator: PipelineOrchestrator,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(STALE_SWEEP_SCHEDULE, move |_uuid, _lock| {
        let orchestrator = orchestrator.clone();
        Box::pin(async move {
            match orchestrator.sweep_stale(Utc::now()).await {
                Ok(0) => tracing::debug!("scheduler: no stale briefs"),
                Ok(parked) => tracing::info!(parked, "scheduler: stale briefs parked"),
                Err(e) => tracing::error!(error = %e, "scheduler: stale sweep failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
