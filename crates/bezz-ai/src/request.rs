use crate::ModelCapabilityRegistry;

/// A single-turn chat completion request, before provider encoding.
///
/// Token limits of `Some(0)` mean "unset".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: Option<u32>,
    pub max_completion_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub n: Option<u32>,
    pub presence_penalty: Option<f32>,
    pub frequency_penalty: Option<f32>,
}

/// Rewrite `request` so it only carries parameters its model accepts.
///
/// Completion-token models get a non-zero `max_tokens` moved into
/// `max_completion_tokens`; legacy models never carry
/// `max_completion_tokens`; non-sampling models lose every sampling knob.
#[must_use]
pub fn sanitize(registry: &ModelCapabilityRegistry, mut request: ChatRequest) -> ChatRequest {
    let caps = registry.lookup(&request.model);

    request.max_tokens = request.max_tokens.filter(|t| *t > 0);
    request.max_completion_tokens = request.max_completion_tokens.filter(|t| *t > 0);

    if caps.uses_completion_token_limit {
        if let Some(limit) = request.max_tokens.take() {
            request.max_completion_tokens = Some(limit);
        }
    } else {
        request.max_completion_tokens = None;
    }

    if !caps.supports_sampling {
        request.temperature = None;
        request.top_p = None;
        request.n = None;
        request.presence_penalty = None;
        request.frequency_penalty = None;
    }

    request
}
