//! Brief generation pipeline.
//!
//! Drives one brief through summary, strategy, naming, identity, ad copy and
//! image rendering, persisting after every stage and exposing progress only
//! through the brief's status.

pub mod active;
pub mod batch;
pub mod bootstrap;
pub mod enhance;
pub mod error;
pub mod orchestrator;
pub mod prompts;
pub mod render;
pub mod settings;
pub mod stages;

pub use active::{ActiveRuns, RunGuard};
pub use batch::BatchImageCoordinator;
pub use bootstrap::from_app_config;
pub use enhance::{enhance_prompt, is_realistic_prompt};
pub use error::PipelineError;
pub use orchestrator::{PipelineDeps, PipelineOrchestrator};
pub use render::{ImageRenderWorker, RenderContext, StoredImage};
pub use settings::PipelineSettings;
