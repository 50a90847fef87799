//! Provider construction.
//!
//! One unified OpenAI-compatible implementation covers every backend we
//! speak to; providers differ only by base URL and API-key source.

pub mod openai_compatible;

pub use openai_compatible::OpenAiCompatibleProvider;

use seatwatch_core::config::LlmConfig;
use seatwatch_core::error::{Result, SeatwatchError};
use seatwatch_core::traits::Provider;

/// Known provider name → (default base URL, API-key env var).
fn known_provider(name: &str) -> Option<(&'static str, &'static str)> {
    match name {
        "openai" => Some(("https://api.openai.com/v1", "OPENAI_API_KEY")),
        "groq" => Some(("https://api.groq.com/openai/v1", "GROQ_API_KEY")),
        "deepseek" => Some(("https://api.deepseek.com", "DEEPSEEK_API_KEY")),
        _ => None,
    }
}

/// Create the configured provider.
///
/// Resolution order for the API key: `config.api_key` > provider env var.
/// Base URL: `config.endpoint` > provider default. An unknown provider
/// name with a configured endpoint is treated as a custom server.
pub fn create_provider(config: &LlmConfig) -> Result<Box<dyn Provider>> {
    let (default_url, env_key) = match known_provider(&config.provider) {
        Some(pair) => pair,
        None if !config.endpoint.is_empty() => ("", "SEATWATCH_API_KEY"),
        None => {
            return Err(SeatwatchError::Config(format!(
                "unknown provider '{}' and no endpoint configured",
                config.provider
            )));
        }
    };

    let api_key = if !config.api_key.is_empty() {
        config.api_key.clone()
    } else {
        std::env::var(env_key).unwrap_or_default()
    };

    let base_url = if !config.endpoint.is_empty() {
        config.endpoint.trim_end_matches('/').to_string()
    } else {
        default_url.to_string()
    };

    Ok(Box::new(OpenAiCompatibleProvider::new(
        &config.provider,
        api_key,
        base_url,
        config.request_timeout_secs,
    )?))
}
