//! HTTP client for OpenAI-compatible chat-completions and image-generation
//! endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};

use crate::{decode_base64_image, AiError, ChatClient, ChatRequest, ImageClient, ImagePayload};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";
const DEFAULT_IMAGE_SIZE: &str = "1024x1024";

/// Client for an OpenAI-compatible API.
///
/// Use [`OpenAiClient::new`] for production or [`OpenAiClient::with_base_url`]
/// to point at a mock server in tests.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: Url,
    image_size: String,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct WireChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
}

impl<'a> From<&'a ChatRequest> for WireChatRequest<'a> {
    fn from(request: &'a ChatRequest) -> Self {
        let mut messages = Vec::with_capacity(2);
        if !request.system_prompt.is_empty() {
            messages.push(WireMessage {
                role: "system",
                content: &request.system_prompt,
            });
        }
        messages.push(WireMessage {
            role: "user",
            content: &request.user_prompt,
        });

        Self {
            model: &request.model,
            messages,
            max_tokens: request.max_tokens.filter(|t| *t > 0),
            max_completion_tokens: request.max_completion_tokens.filter(|t| *t > 0),
            temperature: request.temperature,
            top_p: request.top_p,
            n: request.n,
            presence_penalty: request.presence_penalty,
            frequency_penalty: request.frequency_penalty,
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct WireImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    n: u32,
}

#[derive(Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl OpenAiClient {
    /// Creates a client pointed at the public OpenAI API.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Http`] if the underlying `reqwest::Client` cannot be
    /// constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, AiError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Http`] if the `reqwest::Client` cannot be built, or
    /// [`AiError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("bezz/0.1 (brief-pipeline)")
            .build()?;

        // Exactly one trailing slash so `join` appends instead of replacing
        // the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url =
            Url::parse(&normalised).map_err(|e| AiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
            image_size: DEFAULT_IMAGE_SIZE.to_string(),
        })
    }

    #[must_use]
    pub fn with_image_size(mut self, size: &str) -> Self {
        self.image_size = size.to_string();
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url, AiError> {
        self.base_url
            .join(path)
            .map_err(|e| AiError::InvalidBaseUrl(format!("{}{path}: {e}", self.base_url)))
    }

    /// Maps a non-2xx response to [`AiError::Api`], preferring the provider's
    /// `error.message` over the raw body.
    async fn check_status(response: Response) -> Result<Response, AiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| body.chars().take(300).collect());

        Err(AiError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ChatClient for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, AiError> {
        let url = self.endpoint("chat/completions")?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&WireChatRequest::from(request))
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| AiError::Decode {
            model: request.model.clone(),
            source: e,
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(AiError::EmptyResponse {
                model: request.model.clone(),
            });
        }

        tracing::debug!(model = %request.model, content_len = content.len(), "chat completion received");
        Ok(content)
    }
}

#[async_trait]
impl ImageClient for OpenAiClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<ImagePayload, AiError> {
        let url = self.endpoint("images/generations")?;
        let payload = WireImageRequest {
            model,
            prompt,
            size: &self.image_size,
            n: 1,
        };
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let body = response.text().await?;
        let parsed: ImageResponse = serde_json::from_str(&body).map_err(|e| AiError::Decode {
            model: model.to_string(),
            source: e,
        })?;

        let datum = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| AiError::EmptyResponse {
                model: model.to_string(),
            })?;

        if let Some(url) = datum.url.filter(|u| !u.is_empty()) {
            return Ok(ImagePayload::Url(url));
        }
        if let Some(encoded) = datum.b64_json.filter(|b| !b.is_empty()) {
            return Ok(ImagePayload::Bytes(decode_base64_image(&encoded)?));
        }

        Err(AiError::ImagePayload(format!(
            "{model} returned neither a URL nor base64 data"
        )))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, AiError> {
        if url.is_empty() {
            return Err(AiError::ImagePayload("empty image URL".to_string()));
        }
        let response = self.client.get(url).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_keeps_version_prefix() {
        let client = OpenAiClient::with_base_url("k", 5, "https://api.example.com/v1").unwrap();
        let url = client.endpoint("chat/completions").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/chat/completions");
    }

    #[test]
    fn endpoint_tolerates_trailing_slashes() {
        let client = OpenAiClient::with_base_url("k", 5, "https://api.example.com/v1//").unwrap();
        let url = client.endpoint("images/generations").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/images/generations");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = OpenAiClient::with_base_url("k", 5, "not a url").unwrap_err();
        assert!(matches!(err, AiError::InvalidBaseUrl(_)));
    }

    #[test]
    fn wire_request_omits_unset_fields() {
        let request = ChatRequest {
            model: "gpt-5-mini".to_string(),
            system_prompt: "sys".to_string(),
            user_prompt: "hi".to_string(),
            max_completion_tokens: Some(800),
            ..ChatRequest::default()
        };
        let json = serde_json::to_value(WireChatRequest::from(&request)).unwrap();
        assert_eq!(json["max_completion_tokens"], 800);
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("temperature").is_none());
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
    }
}
