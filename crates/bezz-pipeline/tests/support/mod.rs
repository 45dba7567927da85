//! Scripted model and image clients shared by the pipeline tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bezz_ai::{AiError, ChatClient, ChatRequest, ImageClient, ImagePayload, ModelCapabilityRegistry};
use bezz_core::{Brief, BriefInput, BriefStatus, PhotoStyles};
use bezz_db::{BriefStore, DbError, FieldUpdate, MemoryBriefStore};
use bezz_pipeline::prompts::{
    AD_COPY_SYSTEM, IDENTITY_SYSTEM, NAMING_SYSTEM, STRATEGY_SYSTEM, SUMMARY_SYSTEM,
};
use bezz_pipeline::{PipelineDeps, PipelineOrchestrator, PipelineSettings};
use bezz_storage::MemoryObjectStore;
use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::Notify;

pub type ChatScript = dyn Fn(&str, &str) -> Result<String, AiError> + Send + Sync;
pub type ImageScript = dyn Fn(&str, &str) -> Result<ImagePayload, AiError> + Send + Sync;

pub fn api_error(status: u16) -> AiError {
    AiError::Api {
        status,
        message: "scripted failure".to_string(),
    }
}

/// Answers by `(model, system prompt)`. While `hang` is set every call
/// blocks forever, which pins a run in its current status.
pub struct ScriptedChat {
    script: Box<ChatScript>,
    hang: AtomicBool,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedChat {
    pub fn new(script: impl Fn(&str, &str) -> Result<String, AiError> + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            hang: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_hang(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }

    /// Models that were asked the given system prompt, in call order.
    pub fn models_for(&self, system: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, s)| s == system)
            .map(|(m, _)| m.clone())
            .collect()
    }
}

#[async_trait]
impl ChatClient for ScriptedChat {
    async fn complete(&self, request: &ChatRequest) -> Result<String, AiError> {
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.calls
            .lock()
            .unwrap()
            .push((request.model.clone(), request.system_prompt.clone()));
        (self.script)(&request.model, &request.system_prompt)
    }
}

pub struct ScriptedImages {
    script: Box<ImageScript>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedImages {
    pub fn new(
        script: impl Fn(&str, &str) -> Result<ImagePayload, AiError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn always_png() -> Self {
        Self::new(|_, _| Ok(ImagePayload::Bytes(vec![0x89, b'P', b'N', b'G'])))
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageClient for ScriptedImages {
    async fn generate(&self, model: &str, prompt: &str) -> Result<ImagePayload, AiError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.script)(model, prompt)
    }

    async fn download(&self, _url: &str) -> Result<Vec<u8>, AiError> {
        Ok(vec![1, 2, 3])
    }
}

/// A well-formed answer for every stage, keyed by system prompt.
pub fn canned_reply(system: &str) -> Result<String, AiError> {
    let body = match system {
        s if s == SUMMARY_SYSTEM => json!({
            "brand_goal": "Make CI calm for small teams",
            "audience": "Lead developers at startups",
            "tone": "confident",
            "vision": "Every merge is boring"
        }),
        s if s == STRATEGY_SYSTEM => json!({
            "positioning_statement": "The CI service that never surprises you",
            "value_proposition": "Predictable builds",
            "tagline": "Builds you can trust",
            "brand_pillars": ["speed", "calm", "clarity"]
        }),
        s if s == NAMING_SYSTEM => json!({
            "brand_names": [{"name": "Calmci", "rationale": "short"}]
        }),
        s if s == IDENTITY_SYSTEM => json!({
            "logo_concept": "A level line inside a circle",
            "color_palette": [
                {"name": "Slate", "hex": "#2F3E46", "usage": "primary", "psychology": "steady"}
            ],
            "dalle_prompt": "Minimal vector logo mark, level line in a circle, #2F3E46"
        }),
        s if s == AD_COPY_SYSTEM => json!({
            "ads": [
                {"id": 1, "headline": "Green on the first try", "body": "b1", "dalle_prompt": "a developer smiling at a green build"},
                {"id": 2, "headline": "Merge on Friday", "body": "b2", "dalle_prompt": "a team leaving the office at five"},
                {"id": 3, "headline": "No more flaky tests", "body": "b3", "dalle_prompt": "a laptop showing a dashboard"}
            ]
        }),
        _ => return Err(api_error(400)),
    };
    Ok(format!("Here you go:\n{body}\nLet me know if you need changes."))
}

pub fn acme_input() -> BriefInput {
    BriefInput {
        company_name: "Acme".to_string(),
        sector: "Technology".to_string(),
        tone: "confident".to_string(),
        target_audience: "Lead developers".to_string(),
        language: "en".to_string(),
        business_description: "Hosted CI for small teams".to_string(),
        additional_info: String::new(),
    }
}

pub fn settings(text_models: &[&str]) -> PipelineSettings {
    PipelineSettings {
        text_models: text_models.iter().map(|m| (*m).to_string()).collect(),
        image_model_primary: "gpt-image-1".to_string(),
        image_model_fallback: "dall-e-3".to_string(),
        render_max_retries: 2,
        render_backoff_unit: Duration::ZERO,
        render_max_concurrency: None,
        stale_after: chrono::Duration::minutes(60),
    }
}

pub struct Harness {
    pub orchestrator: PipelineOrchestrator,
    pub store: Arc<MemoryBriefStore>,
    pub objects: Arc<MemoryObjectStore>,
    pub chat: Arc<ScriptedChat>,
    pub images: Arc<ScriptedImages>,
}

/// One-shot pause point. Once armed, the next caller signals `reached`
/// and waits for `release`.
#[derive(Default)]
pub struct Gate {
    armed: AtomicBool,
    reached: Notify,
    release: Notify,
}

impl Gate {
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub async fn reached(&self) {
        self.reached.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.reached.notify_one();
            self.release.notified().await;
        }
    }
}

/// Wraps the in-memory store so a test can stall a read after it has
/// seen the document, letting other writers move the brief meanwhile.
pub struct GatedStore {
    inner: Arc<MemoryBriefStore>,
    pub get_gate: Gate,
    pub stale_gate: Gate,
}

impl GatedStore {
    pub fn new(inner: Arc<MemoryBriefStore>) -> Self {
        Self {
            inner,
            get_gate: Gate::default(),
            stale_gate: Gate::default(),
        }
    }
}

#[async_trait]
impl BriefStore for GatedStore {
    async fn get(&self, id: &str) -> Result<Brief, DbError> {
        let brief = self.inner.get(id).await;
        self.get_gate.pass().await;
        brief
    }

    async fn set(&self, brief: &Brief) -> Result<(), DbError> {
        self.inner.set(brief).await
    }

    async fn update_fields(&self, id: &str, updates: &[FieldUpdate]) -> Result<(), DbError> {
        self.inner.update_fields(id, updates).await
    }

    async fn update_fields_if(
        &self,
        id: &str,
        expected: BriefStatus,
        updates: &[FieldUpdate],
    ) -> Result<(), DbError> {
        self.inner.update_fields_if(id, expected, updates).await
    }

    async fn list_by_owner(
        &self,
        owner_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Brief>, DbError> {
        self.inner.list_by_owner(owner_id, limit).await
    }

    async fn delete(&self, id: &str) -> Result<bool, DbError> {
        self.inner.delete(id).await
    }

    async fn list_stale(&self, cutoff: DateTime<Utc>) -> Result<Vec<Brief>, DbError> {
        let stale = self.inner.list_stale(cutoff).await;
        self.stale_gate.pass().await;
        stale
    }

    async fn ping(&self) -> Result<(), DbError> {
        self.inner.ping().await
    }
}

pub fn harness(chat: ScriptedChat, images: ScriptedImages, settings: PipelineSettings) -> Harness {
    harness_with_store(chat, images, settings, |store| store as Arc<dyn BriefStore>)
}

/// Like [`harness`], but the orchestrator sees the memory store through
/// `wrap`. `Harness::store` stays the unwrapped memory store.
pub fn harness_with_store(
    chat: ScriptedChat,
    images: ScriptedImages,
    settings: PipelineSettings,
    wrap: impl FnOnce(Arc<MemoryBriefStore>) -> Arc<dyn BriefStore>,
) -> Harness {
    let store = Arc::new(MemoryBriefStore::new());
    let objects = Arc::new(MemoryObjectStore::new());
    let chat = Arc::new(chat);
    let images = Arc::new(images);

    let orchestrator = PipelineOrchestrator::new(
        PipelineDeps {
            store: wrap(store.clone()),
            chat: chat.clone(),
            images: images.clone(),
            objects: objects.clone(),
            registry: Arc::new(ModelCapabilityRegistry::openai_defaults()),
            styles: Arc::new(PhotoStyles::builtin().unwrap()),
        },
        settings,
    );

    Harness {
        orchestrator,
        store,
        objects,
        chat,
        images,
    }
}
