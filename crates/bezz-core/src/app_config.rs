use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub ai_request_timeout_secs: u64,
    /// Ordered text-model fallback chain. Never empty.
    pub text_models: Vec<String>,
    pub image_model_primary: String,
    pub image_model_fallback: String,
    pub image_size: String,
    pub render_max_retries: u32,
    pub render_backoff_unit_ms: u64,
    /// `0` means one task per creative with no extra bound.
    pub render_max_concurrency: usize,
    pub storage_base_url: String,
    pub storage_bucket: String,
    pub storage_token: Option<String>,
    pub storage_signing_secret: String,
    pub signed_url_ttl_secs: u64,
    pub stale_run_minutes: i64,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub photo_styles_path: Option<PathBuf>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("openai_api_key", &"[redacted]")
            .field("openai_base_url", &self.openai_base_url)
            .field("ai_request_timeout_secs", &self.ai_request_timeout_secs)
            .field("text_models", &self.text_models)
            .field("image_model_primary", &self.image_model_primary)
            .field("image_model_fallback", &self.image_model_fallback)
            .field("image_size", &self.image_size)
            .field("render_max_retries", &self.render_max_retries)
            .field("render_backoff_unit_ms", &self.render_backoff_unit_ms)
            .field("render_max_concurrency", &self.render_max_concurrency)
            .field("storage_base_url", &self.storage_base_url)
            .field("storage_bucket", &self.storage_bucket)
            .field(
                "storage_token",
                &self.storage_token.as_ref().map(|_| "[redacted]"),
            )
            .field("storage_signing_secret", &"[redacted]")
            .field("signed_url_ttl_secs", &self.signed_url_ttl_secs)
            .field("stale_run_minutes", &self.stale_run_minutes)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("photo_styles_path", &self.photo_styles_path)
            .finish()
    }
}

/// Settings for commands that only touch the database.
#[derive(Clone)]
pub struct DbConfig {
    pub database_url: String,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("database_url", &"[redacted]")
            .field("log_level", &self.log_level)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
