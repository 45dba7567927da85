use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Owner id every request runs as when auth is disabled.
pub const LOCAL_OWNER: &str = "local";

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// The authenticated owner, stored as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub String);

#[derive(Clone)]
struct ApiKey {
    owner: String,
    token: String,
}

/// Bearer-token auth settings; each token maps to one owner.
#[derive(Clone)]
pub struct AuthState {
    keys: Arc<Vec<ApiKey>>,
    pub enabled: bool,
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("keys", &self.keys.len())
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl AuthState {
    /// Builds auth config from `BEZZ_API_KEYS` (`owner:token,owner:token`).
    ///
    /// In development, empty/missing keys disable auth and every request runs
    /// as [`LOCAL_OWNER`]. In non-development envs they fail startup.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var("BEZZ_API_KEYS").unwrap_or_default();
        Self::parse(&raw, is_development)
    }

    /// # Errors
    ///
    /// Fails on an entry without both an owner and a token, or when no keys
    /// are configured outside development.
    pub fn parse(raw: &str, is_development: bool) -> anyhow::Result<Self> {
        let mut keys = Vec::new();
        for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let Some((owner, token)) = entry.split_once(':') else {
                anyhow::bail!("BEZZ_API_KEYS entries must look like owner:token");
            };
            let (owner, token) = (owner.trim(), token.trim());
            if owner.is_empty() || token.is_empty() {
                anyhow::bail!("BEZZ_API_KEYS entries need a non-empty owner and token");
            }
            keys.push(ApiKey {
                owner: owner.to_string(),
                token: token.to_string(),
            });
        }

        if keys.is_empty() {
            if is_development {
                tracing::warn!(
                    "BEZZ_API_KEYS not set; bearer auth disabled in development environment"
                );
                return Ok(Self {
                    keys: Arc::new(Vec::new()),
                    enabled: false,
                });
            }

            anyhow::bail!(
                "BEZZ_API_KEYS is required outside development; provide comma-separated owner:token pairs"
            );
        }

        Ok(Self {
            keys: Arc::new(keys),
            enabled: true,
        })
    }

    /// Constant-time over every configured token.
    fn owner_for(&self, token: &str) -> Option<&str> {
        let mut found = None;
        for key in self.keys.iter() {
            if bool::from(key.token.as_bytes().ct_eq(token.as_bytes())) {
                found = Some(key.owner.as_str());
            }
        }
        found
    }
}

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window limiter for simple API protection.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware resolving the bearer token to an [`Owner`].
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        req.extensions_mut().insert(Owner(LOCAL_OWNER.to_string()));
        return next.run(req).await;
    }

    let owner = extract_bearer_token(req.headers().get(AUTHORIZATION))
        .and_then(|token| auth.owner_for(token))
        .map(ToOwned::to_owned);

    match owner {
        Some(owner) => {
            req.extensions_mut().insert(Owner(owner));
            next.run(req).await
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(MiddlewareErrorBody {
                error: MiddlewareError {
                    code: "unauthorized",
                    message: "missing or invalid bearer token",
                },
            }),
        )
            .into_response(),
    }
}

/// Middleware enforcing a fixed request-per-window limit.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let mut window = rate_limit.state.lock().await;
    let elapsed = window.started_at.elapsed();

    if elapsed >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(MiddlewareErrorBody {
                error: MiddlewareError {
                    code: "rate_limited",
                    message: "rate limit exceeded",
                },
            }),
        )
            .into_response();
    }

    window.count += 1;
    drop(window);

    next.run(req).await
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}
