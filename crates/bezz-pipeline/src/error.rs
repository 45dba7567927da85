use bezz_ai::AiError;
use bezz_core::{BriefStatus, ConfigError, CoreError};
use bezz_db::DbError;
use bezz_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ai(#[from] AiError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Status(#[from] CoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("stage payload could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("brief not found: {0}")]
    NotFound(String),

    #[error("brief {0} belongs to another owner")]
    Forbidden(String),

    #[error("brief {id} is {status}; only failed runs can be retried")]
    NotRetryable { id: String, status: BriefStatus },

    #[error("brief {0} already has an active run")]
    AlreadyRunning(String),

    #[error("creative {spec_id} failed after {attempts} attempts: {source}")]
    RenderFailed {
        spec_id: u32,
        attempts: u32,
        #[source]
        source: AiError,
    },

    #[error("only {succeeded}/{total} images rendered")]
    BatchIncomplete { succeeded: usize, total: usize },
}

impl PipelineError {
    /// Lifts a store miss into [`PipelineError::NotFound`].
    pub(crate) fn from_db(err: DbError) -> Self {
        match err {
            DbError::NotFound(id) => PipelineError::NotFound(id),
            other => PipelineError::Db(other),
        }
    }
}
