//! LLM provider implementations.
//!
//! Contains concrete implementations of the [`LlmProvider`] trait defined in
//! `retrato-core`, a provider factory ([`create_provider`]) that constructs
//! the right provider from a [`ProviderConfig`], [`build_coordinator`] which
//! wires both slots into a [`FallbackCoordinator`], and a connection test
//! ([`test_provider_connection`]) used by `retrato check`.
//!
//! [`LlmProvider`]: retrato_core::llm::provider::LlmProvider

pub mod gemini;
pub mod openai_compat;

use std::time::Duration;

use secrecy::SecretString;

use retrato_core::llm::box_provider::BoxLlmProvider;
use retrato_core::llm::fallback::{FallbackCoordinator, ProviderRoute};
use retrato_core::llm::normalize::build_messages;
use retrato_types::config::{ProviderConfig, ProviderKind, RetratoConfig};
use retrato_types::llm::{CompletionRequest, LlmError, ProviderSlot};

use crate::secret::env_secret;

use self::gemini::GeminiProvider;
use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::{OpenAiCompatConfig, default_base_url};

/// Create a [`BoxLlmProvider`] from a [`ProviderConfig`].
///
/// # Errors
///
/// Returns [`LlmError::AuthenticationFailed`] when no API key is provided.
pub fn create_provider(
    config: &ProviderConfig,
    api_key: Option<SecretString>,
) -> Result<BoxLlmProvider, LlmError> {
    let key = api_key.ok_or(LlmError::AuthenticationFailed)?;

    match config.kind {
        ProviderKind::OpenAiCompatible => {
            let base_url = config
                .base_url
                .clone()
                .unwrap_or_else(|| default_base_url(&config.name).to_string());
            let provider = OpenAiCompatibleProvider::new(OpenAiCompatConfig {
                provider_name: config.name.clone(),
                base_url,
                api_key: key,
                model: config.model.clone(),
            });
            Ok(BoxLlmProvider::new(provider))
        }
        ProviderKind::Gemini => {
            let mut provider = GeminiProvider::new(config.name.clone(), key, config.model.clone())?;
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(BoxLlmProvider::new(provider))
        }
    }
}

/// Build the routing entry for one slot.
///
/// Returns `Ok(None)` when the slot is disabled in config or its API key
/// variable is unset; the coordinator then runs without it.
pub fn build_route(
    slot: ProviderSlot,
    config: &ProviderConfig,
) -> Result<Option<ProviderRoute>, LlmError> {
    if !config.enabled {
        tracing::info!(%slot, provider = %config.name, "Provider disabled in config");
        return Ok(None);
    }

    let Some(key) = env_secret(&config.api_key_env) else {
        tracing::warn!(
            %slot,
            provider = %config.name,
            env = %config.api_key_env,
            "API key not set, provider slot left empty"
        );
        return Ok(None);
    };

    let provider = create_provider(config, Some(key))?;
    tracing::info!(%slot, provider = %config.name, model = %config.model, "Provider configured");

    Ok(Some(
        ProviderRoute::new(
            provider,
            config.retry.clone(),
            Duration::from_secs(config.timeout_secs),
        )
        .with_max_tokens(config.max_tokens),
    ))
}

/// Wire both provider slots from configuration.
pub fn build_coordinator(config: &RetratoConfig) -> Result<FallbackCoordinator, LlmError> {
    let primary = build_route(ProviderSlot::Primary, &config.primary)?;
    let secondary = build_route(ProviderSlot::Secondary, &config.secondary)?;

    if primary.is_none() && secondary.is_none() {
        tracing::warn!("No LLM provider configured; every chat request will fail");
    }

    Ok(FallbackCoordinator::new(primary, secondary))
}

/// Test provider connectivity by sending a minimal completion request.
///
/// Bypasses retry and fallback so the result reflects this provider alone.
/// A provider that has not answered within `timeout` fails with
/// [`LlmError::Timeout`].
pub async fn test_provider_connection(
    provider: &BoxLlmProvider,
    timeout: Duration,
) -> Result<(), LlmError> {
    let request = CompletionRequest {
        model: String::new(), // Provider uses its configured default
        messages: build_messages(&[], "Hello", provider.vocabulary()),
        system: None,
        max_tokens: Some(10),
        temperature: Some(0.0),
    };
    tokio::time::timeout(timeout, provider.complete(&request))
        .await
        .map_err(|_| LlmError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        })??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrato_core::llm::provider::LlmProvider;
    use retrato_types::config::RetryPolicy;
    use retrato_types::llm::{CompletionResponse, RoleVocabulary};

    #[test]
    fn test_create_provider_openrouter() {
        let config = ProviderConfig::primary_default();
        let provider = create_provider(&config, Some(SecretString::from("sk-or-test"))).unwrap();
        assert_eq!(provider.name(), "openrouter");
        assert_eq!(provider.vocabulary().assistant, "assistant");
    }

    #[test]
    fn test_create_provider_gemini() {
        let config = ProviderConfig::secondary_default();
        let provider = create_provider(&config, Some(SecretString::from("gm-test"))).unwrap();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.vocabulary().assistant, "model");
    }

    #[test]
    fn test_create_provider_without_key_fails() {
        let config = ProviderConfig::secondary_default();
        assert!(matches!(
            create_provider(&config, None),
            Err(LlmError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_disabled_slot_builds_no_route() {
        let config = ProviderConfig {
            enabled: false,
            ..ProviderConfig::primary_default()
        };
        assert!(build_route(ProviderSlot::Primary, &config).unwrap().is_none());
    }

    #[test]
    fn test_missing_key_builds_no_route() {
        let config = ProviderConfig {
            api_key_env: "RETRATO_TEST_KEY_NEVER_SET".to_string(),
            ..ProviderConfig::secondary_default()
        };
        assert!(build_route(ProviderSlot::Secondary, &config).unwrap().is_none());
    }

    #[test]
    fn test_route_carries_slot_settings() {
        // SAFETY: test-only env mutation with a name no other test reads.
        unsafe { std::env::set_var("RETRATO_TEST_ROUTE_KEY", "sk-route") };
        let config = ProviderConfig {
            api_key_env: "RETRATO_TEST_ROUTE_KEY".to_string(),
            timeout_secs: 7,
            retry: RetryPolicy::default(),
            ..ProviderConfig::primary_default()
        };

        let route = build_route(ProviderSlot::Primary, &config).unwrap().unwrap();
        unsafe { std::env::remove_var("RETRATO_TEST_ROUTE_KEY") };

        assert_eq!(route.call_timeout, Duration::from_secs(7));
        assert_eq!(route.max_tokens, Some(1500));
        assert_eq!(route.retry.max_retries, 5);
        assert_eq!(route.provider.name(), "openrouter");
    }

    struct NeverAnswers;

    impl LlmProvider for NeverAnswers {
        fn name(&self) -> &str {
            "stalled"
        }

        fn vocabulary(&self) -> RoleVocabulary {
            RoleVocabulary::OPENAI
        }

        async fn complete(&self, _request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_check_times_out() {
        let provider = BoxLlmProvider::new(NeverAnswers);
        let result = test_provider_connection(&provider, Duration::from_secs(3)).await;
        assert!(matches!(result, Err(LlmError::Timeout { timeout_ms: 3000 })));
    }

    #[test]
    fn test_coordinator_with_no_keys_has_no_slots() {
        let mut config = RetratoConfig::default();
        config.primary.api_key_env = "RETRATO_TEST_NO_PRIMARY_KEY".to_string();
        config.secondary.api_key_env = "RETRATO_TEST_NO_SECONDARY_KEY".to_string();

        let coordinator = build_coordinator(&config).unwrap();
        assert!(coordinator.status().is_empty());
        assert!(!coordinator.primary_enabled());
    }
}
