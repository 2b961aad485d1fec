//! OpenAI-compatible client configuration.

use crate::config::LlmSettings;
use crate::error::{ConciergeError, Result};
use async_openai::{config::OpenAIConfig, Client};

/// Create a chat completions client from the LLM settings.
///
/// The HTTP client carries the same deadline as a single LLM call so a hung
/// connection cannot outlive it.
pub fn create_client(settings: &LlmSettings) -> Result<Client<OpenAIConfig>> {
    let api_key = settings.api_key().ok_or_else(|| {
        ConciergeError::Config(format!(
            "{} not set. Set it with: export {}='sk-...'",
            settings.api_key_env, settings.api_key_env
        ))
    })?;

    let http_client = reqwest::Client::builder()
        .timeout(settings.timeout())
        .build()?;

    let config = OpenAIConfig::new()
        .with_api_key(api_key)
        .with_api_base(&settings.api_base);

    Ok(Client::with_config(config).with_http_client(http_client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_config_error() {
        let settings = LlmSettings {
            api_key_env: "CONCIERGE_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        let err = create_client(&settings).unwrap_err();
        assert!(matches!(err, ConciergeError::Config(_)));
        assert!(err.to_string().contains("CONCIERGE_TEST_KEY_THAT_IS_NEVER_SET"));
    }
}
