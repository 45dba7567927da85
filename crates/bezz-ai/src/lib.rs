//! Model-provider plumbing for the brief pipeline: capability-aware request
//! sanitizing, best-effort JSON recovery, ordered model fallback, and an
//! OpenAI-compatible HTTP client for chat and image generation.

pub mod capabilities;
pub mod chat;
pub mod error;
pub mod extract;
pub mod image;
pub mod openai;
pub mod request;
pub mod router;

pub use capabilities::{ModelCapability, ModelCapabilityRegistry};
pub use chat::ChatClient;
pub use error::AiError;
pub use extract::{BracketScanExtractor, JsonExtractor};
pub use image::{decode_base64_image, ImageClient, ImagePayload};
pub use openai::OpenAiClient;
pub use request::{sanitize, ChatRequest};
pub use router::{JsonPrompt, ModelRouter, Routed};
