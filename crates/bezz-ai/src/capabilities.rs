use std::collections::HashMap;

/// What a model accepts on the chat-completions endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelCapability {
    /// Accepts temperature, `top_p`, `n`, and the presence/frequency penalties.
    pub supports_sampling: bool,
    /// Takes `max_completion_tokens` instead of `max_tokens`.
    pub uses_completion_token_limit: bool,
    pub is_image_model: bool,
}

impl ModelCapability {
    /// Full parameter control; also the assumption for unknown ids.
    pub const LEGACY: Self = Self {
        supports_sampling: true,
        uses_completion_token_limit: false,
        is_image_model: false,
    };

    pub const REASONING: Self = Self {
        supports_sampling: false,
        uses_completion_token_limit: true,
        is_image_model: false,
    };

    pub const IMAGE: Self = Self {
        supports_sampling: false,
        uses_completion_token_limit: false,
        is_image_model: true,
    };
}

/// Model id to [`ModelCapability`]. Built once at startup and shared.
#[derive(Debug, Clone, Default)]
pub struct ModelCapabilityRegistry {
    models: HashMap<String, ModelCapability>,
}

impl ModelCapabilityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The OpenAI model families the pipeline is known to work with.
    #[must_use]
    pub fn openai_defaults() -> Self {
        let reasoning = ["gpt-5", "gpt-5-mini", "gpt-5-nano", "o4-mini", "o3-mini"];
        let legacy = ["gpt-4", "gpt-4-1106-preview", "gpt-4o", "gpt-3.5-turbo"];
        let image = ["gpt-image-1", "dall-e-3", "dall-e-2"];

        let mut registry = Self::new();
        for id in reasoning {
            registry.insert(id, ModelCapability::REASONING);
        }
        for id in legacy {
            registry.insert(id, ModelCapability::LEGACY);
        }
        for id in image {
            registry.insert(id, ModelCapability::IMAGE);
        }
        registry
    }

    pub fn insert(&mut self, model: &str, capability: ModelCapability) {
        self.models.insert(model.to_string(), capability);
    }

    #[must_use]
    pub fn with(mut self, model: &str, capability: ModelCapability) -> Self {
        self.insert(model, capability);
        self
    }

    #[must_use]
    pub fn is_known(&self, model: &str) -> bool {
        self.models.contains_key(model)
    }

    /// Capability for `model`; unknown ids are treated as [`ModelCapability::LEGACY`].
    #[must_use]
    pub fn lookup(&self, model: &str) -> ModelCapability {
        self.models
            .get(model)
            .copied()
            .unwrap_or(ModelCapability::LEGACY)
    }
}
