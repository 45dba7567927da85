use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::{
    sanitize, AiError, BracketScanExtractor, ChatClient, ChatRequest, JsonExtractor,
    ModelCapabilityRegistry,
};

/// Prompt and generation settings for one structured-output call.
#[derive(Debug, Clone, Copy)]
pub struct JsonPrompt<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// A decoded value and the model that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Routed<T> {
    pub model: String,
    pub value: T,
}

/// Tries candidate models in order and returns the first decodable answer.
#[derive(Clone)]
pub struct ModelRouter {
    chat: Arc<dyn ChatClient>,
    registry: Arc<ModelCapabilityRegistry>,
    extractor: Arc<dyn JsonExtractor>,
}

impl ModelRouter {
    #[must_use]
    pub fn new(chat: Arc<dyn ChatClient>, registry: Arc<ModelCapabilityRegistry>) -> Self {
        Self {
            chat,
            registry,
            extractor: Arc::new(BracketScanExtractor),
        }
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn JsonExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &ModelCapabilityRegistry {
        &self.registry
    }

    /// First-success fallback across `candidates`.
    ///
    /// Transport failures, empty answers, and undecodable answers are all
    /// recorded and skipped.
    ///
    /// # Errors
    ///
    /// The last recorded error once every candidate has failed, or
    /// [`AiError::NoCandidates`] when `candidates` is empty.
    pub async fn complete_json<T: DeserializeOwned>(
        &self,
        candidates: &[String],
        prompt: &JsonPrompt<'_>,
    ) -> Result<Routed<T>, AiError> {
        let mut last_err = AiError::NoCandidates;

        for model in candidates {
            let request = sanitize(
                &self.registry,
                ChatRequest {
                    model: model.clone(),
                    system_prompt: prompt.system.to_string(),
                    user_prompt: prompt.user.to_string(),
                    max_tokens: Some(prompt.max_tokens),
                    temperature: Some(prompt.temperature),
                    ..ChatRequest::default()
                },
            );

            if !self.registry.is_known(model) {
                tracing::warn!(model = %model, "unknown model; assuming legacy capabilities");
            }
            tracing::debug!(model = %model, "trying model");

            let content = match self.chat.complete(&request).await {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(model = %model, error = %e, "model call failed; falling back");
                    last_err = e;
                    continue;
                }
            };

            let json = self.extractor.extract(&content);
            match serde_json::from_str::<T>(json) {
                Ok(value) => {
                    tracing::info!(model = %model, "structured output decoded");
                    return Ok(Routed {
                        model: model.clone(),
                        value,
                    });
                }
                Err(e) => {
                    tracing::warn!(model = %model, error = %e, "model output did not decode; falling back");
                    last_err = AiError::Decode {
                        model: model.clone(),
                        source: e,
                    };
                }
            }
        }

        Err(last_err)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde::Deserialize;

    use super::*;

    /// Replies per model id; records every request it sees.
    struct ScriptedChat {
        replies: HashMap<String, Result<String, u16>>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedChat {
        fn new(replies: &[(&str, Result<&str, u16>)]) -> Self {
            Self {
                replies: replies
                    .iter()
                    .map(|(model, reply)| ((*model).to_string(), reply.map(str::to_string)))
                    .collect(),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen_models(&self) -> Vec<String> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.model.clone())
                .collect()
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedChat {
        async fn complete(&self, request: &ChatRequest) -> Result<String, AiError> {
            self.seen.lock().unwrap().push(request.clone());
            match self.replies.get(&request.model) {
                Some(Ok(content)) => Ok(content.clone()),
                Some(Err(status)) => Err(AiError::Api {
                    status: *status,
                    message: "scripted failure".to_string(),
                }),
                None => Err(AiError::EmptyResponse {
                    model: request.model.clone(),
                }),
            }
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Tagline {
        tagline: String,
    }

    fn prompt() -> JsonPrompt<'static> {
        JsonPrompt {
            system: "system",
            user: "user",
            max_tokens: 800,
            temperature: 0.3,
        }
    }

    fn models(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| (*id).to_string()).collect()
    }

    #[tokio::test]
    async fn falls_through_failure_and_malformed_output() {
        let chat = Arc::new(ScriptedChat::new(&[
            ("A", Err(503)),
            ("B", Ok("I am not JSON at all")),
            ("C", Ok("Sure! {\"tagline\": \"Build faster\"} Hope that helps.")),
        ]));
        let router = ModelRouter::new(chat.clone(), Arc::new(ModelCapabilityRegistry::new()));

        let routed: Routed<Tagline> = router
            .complete_json(&models(&["A", "B", "C"]), &prompt())
            .await
            .unwrap();

        assert_eq!(routed.model, "C");
        assert_eq!(routed.value.tagline, "Build faster");
        assert_eq!(chat.seen_models(), vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn stops_at_first_success() {
        let chat = Arc::new(ScriptedChat::new(&[
            ("A", Ok("{\"tagline\": \"first\"}")),
            ("B", Ok("{\"tagline\": \"second\"}")),
        ]));
        let router = ModelRouter::new(chat.clone(), Arc::new(ModelCapabilityRegistry::new()));

        let routed: Routed<Tagline> = router
            .complete_json(&models(&["A", "B"]), &prompt())
            .await
            .unwrap();

        assert_eq!(routed.model, "A");
        assert_eq!(chat.seen_models(), vec!["A"]);
    }

    #[tokio::test]
    async fn exhausted_candidates_report_last_error() {
        let chat = Arc::new(ScriptedChat::new(&[("A", Err(500)), ("B", Ok("[1, 2]"))]));
        let router = ModelRouter::new(chat, Arc::new(ModelCapabilityRegistry::new()));

        let err = router
            .complete_json::<Tagline>(&models(&["A", "B"]), &prompt())
            .await
            .unwrap_err();

        assert!(matches!(err, AiError::Decode { ref model, .. } if model == "B"));
    }

    #[tokio::test]
    async fn empty_candidate_list_is_an_error() {
        let chat = Arc::new(ScriptedChat::new(&[]));
        let router = ModelRouter::new(chat, Arc::new(ModelCapabilityRegistry::new()));

        let err = router
            .complete_json::<Tagline>(&[], &prompt())
            .await
            .unwrap_err();

        assert!(matches!(err, AiError::NoCandidates));
    }

    #[tokio::test]
    async fn requests_are_sanitized_per_model() {
        let chat = Arc::new(ScriptedChat::new(&[
            ("gpt-5-mini", Err(500)),
            ("gpt-4", Ok("{\"tagline\": \"ok\"}")),
        ]));
        let router = ModelRouter::new(
            chat.clone(),
            Arc::new(ModelCapabilityRegistry::openai_defaults()),
        );

        router
            .complete_json::<Tagline>(&models(&["gpt-5-mini", "gpt-4"]), &prompt())
            .await
            .unwrap();

        let seen = chat.seen.lock().unwrap();
        assert_eq!(seen[0].max_completion_tokens, Some(800));
        assert_eq!(seen[0].temperature, None);
        assert_eq!(seen[1].max_tokens, Some(800));
        assert_eq!(seen[1].temperature, Some(0.3));
    }
}
