//! Configuration loader for the `leafmealone-diary` backend service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). Lookups go through a function argument so tests can
//! feed values without touching the process environment.
//!
//! Service credentials are optional here: a missing key only fails the
//! operation that needs it, at call time.
use std::env;

use anyhow::{anyhow, Result};

use crate::prompt::PersonaTemplate;

/// Parse an optional environment variable into `$ty`, with a default value.
macro_rules! parse_env {
    ($lookup:expr, $var_name:expr, $ty:ty, $default:expr) => {
        $lookup($var_name)
            .map(|v| v.parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($lookup:expr, $var_name:expr) => {
        $lookup($var_name).ok_or_else(|| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Read an optional string variable, treating blank values as unset.
macro_rules! optional_env {
    ($lookup:expr, $var_name:expr) => {
        $lookup($var_name).filter(|v: &String| !v.trim().is_empty())
    };
}

pub const DEFAULT_OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_OPENROUTER_MODEL: &str = "openai/gpt-3.5-turbo";
pub const DEFAULT_BLUESKY_SERVICE: &str = "https://bsky.social";

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// HTTP listen port.
    pub listen_port: u16,

    pub openrouter_api_key: Option<String>,
    pub openrouter_api_url: String,
    pub openrouter_model: String,

    pub bluesky_identifier: Option<String>,
    pub bluesky_password: Option<String>,
    pub bluesky_service: String,

    /// Voice used when composing diary prompts.
    pub persona: PersonaTemplate,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `LISTEN_PORT` – HTTP port (default: 8080)
/// - `OPENROUTER_API_KEY`, `OPENROUTER_API_URL`, `OPENROUTER_MODEL`
/// - `BLUESKY_IDENTIFIER`, `BLUESKY_PASSWORD`, `BLUESKY_SERVICE`
/// - `DIARY_PERSONA` – neutral-reporter | cynical-friend | engagement-aware
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    load_with(|name| env::var(name).ok())
}

/// Load configuration through an arbitrary variable lookup.
pub fn load_with<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    // ---
    let db_url = require_env!(lookup, "DATABASE_URL");
    let db_pool_max = parse_env!(lookup, "DB_POOL_MAX", u32, 5);
    let listen_port = parse_env!(lookup, "LISTEN_PORT", u16, 8080);

    let openrouter_api_key = optional_env!(lookup, "OPENROUTER_API_KEY");
    let openrouter_api_url = optional_env!(lookup, "OPENROUTER_API_URL")
        .unwrap_or_else(|| DEFAULT_OPENROUTER_URL.to_string());
    let openrouter_model = optional_env!(lookup, "OPENROUTER_MODEL")
        .unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.to_string());

    let bluesky_identifier = optional_env!(lookup, "BLUESKY_IDENTIFIER");
    let bluesky_password = optional_env!(lookup, "BLUESKY_PASSWORD");
    let bluesky_service = optional_env!(lookup, "BLUESKY_SERVICE")
        .unwrap_or_else(|| DEFAULT_BLUESKY_SERVICE.to_string());

    let persona = parse_env!(lookup, "DIARY_PERSONA", PersonaTemplate, PersonaTemplate::default());

    Ok(Config {
        db_url,
        db_pool_max,
        listen_port,
        openrouter_api_key,
        openrouter_api_url,
        openrouter_model,
        bluesky_identifier,
        bluesky_password,
        bluesky_service,
        persona,
    })
}

fn presence(value: &Option<String>) -> &'static str {
    if value.is_some() {
        "<set>"
    } else {
        "<missing>"
    }
}

impl Config {
    // ---
    /// Database URL with the password replaced by `****`.
    pub fn masked_db_url(&self) -> String {
        // ---
        if let Some(at_pos) = self.db_url.rfind('@') {
            if let Some(colon_pos) = self.db_url[..at_pos].rfind(':') {
                // `scheme://host` has its only colon before `//`
                if !self.db_url[colon_pos..at_pos].starts_with("://") {
                    return format!(
                        "{}:****{}",
                        &self.db_url[..colon_pos],
                        &self.db_url[at_pos..]
                    );
                }
            }
        }
        self.db_url.clone()
    }

    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the database password and only reports whether secrets are set.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL       : {}", self.masked_db_url());
        tracing::info!("  DB_POOL_MAX        : {}", self.db_pool_max);
        tracing::info!("  LISTEN_PORT        : {}", self.listen_port);
        tracing::info!("  OPENROUTER_API_KEY : {}", presence(&self.openrouter_api_key));
        tracing::info!("  OPENROUTER_API_URL : {}", self.openrouter_api_url);
        tracing::info!("  OPENROUTER_MODEL   : {}", self.openrouter_model);
        tracing::info!("  BLUESKY_IDENTIFIER : {}", presence(&self.bluesky_identifier));
        tracing::info!("  BLUESKY_PASSWORD   : {}", presence(&self.bluesky_password));
        tracing::info!("  BLUESKY_SERVICE    : {}", self.bluesky_service);
        tracing::info!("  DIARY_PERSONA      : {}", self.persona);
    }
}
