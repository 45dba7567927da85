use std::str::FromStr;

use crate::app_config::{AppConfig, DbConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Load only the database and logging settings, so read-only commands do
/// not need model or storage credentials.
///
/// # Errors
///
/// Returns `ConfigError` if `DATABASE_URL` is missing or a pool value is invalid.
pub fn load_db_config() -> Result<DbConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_db_config(|key| std::env::var(key))
}

fn build_db_config<F>(lookup: F) -> Result<DbConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let database_url = match lookup("DATABASE_URL") {
        Ok(value) if !value.trim().is_empty() => value,
        _ => return Err(ConfigError::MissingEnvVar("DATABASE_URL".to_string())),
    };

    Ok(DbConfig {
        database_url,
        log_level: lookup("BEZZ_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        db_max_connections: parse_var(&lookup, "BEZZ_DB_MAX_CONNECTIONS", "10")?,
        db_min_connections: parse_var(&lookup, "BEZZ_DB_MIN_CONNECTIONS", "1")?,
        db_acquire_timeout_secs: parse_var(&lookup, "BEZZ_DB_ACQUIRE_TIMEOUT_SECS", "10")?,
    })
}

fn parse_var<F, T>(lookup: &F, var: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(var)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can pass a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        match lookup(var) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::MissingEnvVar(var.to_string())),
        }
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|value| !value.trim().is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let db = build_db_config(&lookup)?;
    let openai_api_key = require("OPENAI_API_KEY")?;
    let storage_base_url = require("BEZZ_STORAGE_BASE_URL")?;
    let storage_bucket = require("BEZZ_STORAGE_BUCKET")?;
    let storage_signing_secret = require("BEZZ_STORAGE_SIGNING_SECRET")?;

    let env = parse_environment(&or_default("BEZZ_ENV", "development"))?;
    let bind_addr = parse_addr("BEZZ_BIND_ADDR", "0.0.0.0:8080")?;

    let openai_base_url = or_default("BEZZ_OPENAI_BASE_URL", "https://api.openai.com/v1");
    let ai_request_timeout_secs = parse_u64("BEZZ_AI_REQUEST_TIMEOUT_SECS", "120")?;

    let text_models = parse_model_list(&or_default(
        "BEZZ_TEXT_MODELS",
        "gpt-5-mini,o4-mini,gpt-4,gpt-3.5-turbo",
    ));
    if text_models.is_empty() {
        return Err(invalid(
            "BEZZ_TEXT_MODELS",
            "at least one text model is required".to_string(),
        ));
    }

    let image_model_primary = or_default("BEZZ_IMAGE_MODEL_PRIMARY", "gpt-image-1");
    let image_model_fallback = or_default("BEZZ_IMAGE_MODEL_FALLBACK", "dall-e-3");
    let image_size = or_default("BEZZ_IMAGE_SIZE", "1024x1024");

    let render_max_retries = parse_u32("BEZZ_RENDER_MAX_RETRIES", "2")?;
    let render_backoff_unit_ms = parse_u64("BEZZ_RENDER_BACKOFF_UNIT_MS", "2000")?;
    let render_max_concurrency = parse_usize("BEZZ_RENDER_MAX_CONCURRENCY", "0")?;

    let storage_token = optional("BEZZ_STORAGE_TOKEN");
    let signed_url_ttl_secs = parse_u64("BEZZ_SIGNED_URL_TTL_SECS", "86400")?;
    if signed_url_ttl_secs == 0 {
        return Err(invalid(
            "BEZZ_SIGNED_URL_TTL_SECS",
            "must be greater than zero".to_string(),
        ));
    }

    let stale_run_minutes = i64::from(parse_u32("BEZZ_STALE_RUN_MINUTES", "60")?);

    let photo_styles_path = optional("BEZZ_PHOTO_STYLES_PATH").map(PathBuf::from);

    Ok(AppConfig {
        database_url: db.database_url,
        env,
        bind_addr,
        log_level: db.log_level,
        openai_api_key,
        openai_base_url,
        ai_request_timeout_secs,
        text_models,
        image_model_primary,
        image_model_fallback,
        image_size,
        render_max_retries,
        render_backoff_unit_ms,
        render_max_concurrency,
        storage_base_url,
        storage_bucket,
        storage_token,
        storage_signing_secret,
        signed_url_ttl_secs,
        stale_run_minutes,
        db_max_connections: db.db_max_connections,
        db_min_connections: db.db_min_connections,
        db_acquire_timeout_secs: db.db_acquire_timeout_secs,
        photo_styles_path,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "BEZZ_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

/// Split a comma-separated model list, dropping blanks and repeats while
/// keeping the first occurrence's position.
fn parse_model_list(raw: &str) -> Vec<String> {
    let mut models: Vec<String> = Vec::new();
    for model in raw.split(',').map(str::trim).filter(|m| !m.is_empty()) {
        if !models.iter().any(|seen| seen == model) {
            models.push(model.to_string());
        }
    }
    models
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
