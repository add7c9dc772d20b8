//! Primary/secondary provider routing.
//!
//! Every request tries the primary first while it is enabled. Any failure
//! from the primary, retries included, disables it for the rest of this
//! coordinator's life and the request is re-run on the secondary. There is
//! no health polling and no automatic switch-back.
//!
//! Both slots run through [`with_retry`] with their own policy, and every
//! single attempt is bounded by the slot's call timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use retrato_types::config::RetryPolicy;
use retrato_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, ProviderSlot, ProviderStatusInfo, Turn,
};

use super::box_provider::BoxLlmProvider;
use super::normalize::build_messages;
use super::retry::with_retry;

/// One configured provider slot.
pub struct ProviderRoute {
    pub provider: BoxLlmProvider,
    pub retry: RetryPolicy,
    pub call_timeout: Duration,
    pub max_tokens: Option<u32>,
}

impl ProviderRoute {
    pub fn new(provider: BoxLlmProvider, retry: RetryPolicy, call_timeout: Duration) -> Self {
        Self {
            provider,
            retry,
            call_timeout,
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Result of a successful completion through the coordinator.
#[derive(Debug)]
pub struct FallbackResult {
    pub response: CompletionResponse,
    pub provider_used: ProviderSlot,
    /// Name of the provider that handled the request.
    pub provider_name: String,
}

/// Routes completions to the primary provider, falling back to the secondary.
pub struct FallbackCoordinator {
    primary: Option<ProviderRoute>,
    secondary: Option<ProviderRoute>,
    primary_enabled: AtomicBool,
}

impl FallbackCoordinator {
    pub fn new(primary: Option<ProviderRoute>, secondary: Option<ProviderRoute>) -> Self {
        let primary_enabled = AtomicBool::new(primary.is_some());
        Self {
            primary,
            secondary,
            primary_enabled,
        }
    }

    /// Whether the next request will try the primary first.
    pub fn primary_enabled(&self) -> bool {
        self.primary_enabled.load(Ordering::Acquire)
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    /// Capability state of each configured slot (for `/health` and `retrato check`).
    pub fn status(&self) -> Vec<ProviderStatusInfo> {
        let mut status = Vec::with_capacity(2);
        if let Some(route) = &self.primary {
            status.push(ProviderStatusInfo {
                slot: ProviderSlot::Primary,
                name: route.provider.name().to_string(),
                enabled: self.primary_enabled(),
            });
        }
        if let Some(route) = &self.secondary {
            status.push(ProviderStatusInfo {
                slot: ProviderSlot::Secondary,
                name: route.provider.name().to_string(),
                enabled: true,
            });
        }
        status
    }

    /// Produce the next assistant turn for `history` + `message`.
    ///
    /// `history` is in canonical form; each slot normalizes it into its own
    /// role vocabulary. Returns [`LlmError::NoProviderAvailable`] when neither
    /// slot is usable. When the primary fails and no secondary is configured,
    /// the primary's error is returned instead.
    pub async fn complete(
        &self,
        system: &str,
        history: &[Turn],
        message: &str,
    ) -> Result<FallbackResult, LlmError> {
        let mut primary_error = None;

        if let Some(route) = &self.primary {
            if self.primary_enabled() {
                match Self::invoke(route, system, history, message).await {
                    Ok(response) => {
                        return Ok(FallbackResult {
                            response,
                            provider_used: ProviderSlot::Primary,
                            provider_name: route.provider.name().to_string(),
                        });
                    }
                    Err(err) => {
                        self.disable_primary(route.provider.name(), &err);
                        primary_error = Some(err);
                    }
                }
            }
        }

        let Some(route) = &self.secondary else {
            return Err(primary_error.unwrap_or(LlmError::NoProviderAvailable));
        };

        let response = Self::invoke(route, system, history, message)
            .await
            .inspect_err(|err| {
                tracing::error!(
                    provider = %route.provider.name(),
                    error = %err,
                    "Secondary provider failed"
                );
            })?;

        Ok(FallbackResult {
            response,
            provider_used: ProviderSlot::Secondary,
            provider_name: route.provider.name().to_string(),
        })
    }

    /// One-way transition; only the first failure logs.
    fn disable_primary(&self, name: &str, err: &LlmError) {
        if self
            .primary_enabled
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            tracing::warn!(
                provider = %name,
                error = %err,
                "Primary provider failed, disabled for the rest of the process"
            );
        }
    }

    async fn invoke(
        route: &ProviderRoute,
        system: &str,
        history: &[Turn],
        message: &str,
    ) -> Result<CompletionResponse, LlmError> {
        let request = CompletionRequest {
            model: String::new(),
            messages: build_messages(history, message, route.provider.vocabulary()),
            system: Some(system.to_string()),
            max_tokens: route.max_tokens,
            temperature: None,
        };
        let provider = &route.provider;
        let request = &request;
        let timeout = route.call_timeout;

        with_retry(&route.retry, provider.name(), move || async move {
            match tokio::time::timeout(timeout, provider.complete(request)).await {
                Ok(result) => result,
                Err(_) => Err(LlmError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                }),
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Reply, ScriptedProvider};
    use retrato_types::config::BackoffStrategy;
    use retrato_types::llm::RoleVocabulary;
    use std::sync::atomic::Ordering;

    fn route(provider: ScriptedProvider, max_retries: u32) -> ProviderRoute {
        ProviderRoute::new(
            BoxLlmProvider::new(provider),
            RetryPolicy {
                max_retries,
                backoff: BackoffStrategy::Linear { step_ms: 0 },
            },
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_primary_success_is_used() {
        let primary = ScriptedProvider::new("openrouter", vec![Reply::Text("oi".into())]);
        let secondary = ScriptedProvider::new("gemini", vec![Reply::Echo]);
        let secondary_calls = secondary.calls();
        let coordinator =
            FallbackCoordinator::new(Some(route(primary, 0)), Some(route(secondary, 0)));

        let result = coordinator.complete("sys", &[], "olá").await.unwrap();

        assert_eq!(result.provider_used, ProviderSlot::Primary);
        assert_eq!(result.response.content, "oi");
        assert_eq!(secondary_calls.load(Ordering::SeqCst), 0);
        assert!(coordinator.primary_enabled());
    }

    #[tokio::test]
    async fn test_primary_failure_disables_it_permanently() {
        // Fails once, would succeed afterwards.
        let primary = ScriptedProvider::new(
            "openrouter",
            vec![Reply::Fail, Reply::Text("recovered".into())],
        );
        let primary_calls = primary.calls();
        let secondary = ScriptedProvider::new("gemini", vec![Reply::Echo]);
        let coordinator =
            FallbackCoordinator::new(Some(route(primary, 0)), Some(route(secondary, 0)));

        let first = coordinator.complete("sys", &[], "um").await.unwrap();
        assert_eq!(first.provider_used, ProviderSlot::Secondary);
        assert_eq!(first.response.content, "gemini: um");
        assert!(!coordinator.primary_enabled());

        let second = coordinator.complete("sys", &[], "dois").await.unwrap();
        assert_eq!(second.provider_used, ProviderSlot::Secondary);
        assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_primary_rate_limit_exhaustion_falls_back() {
        let primary = ScriptedProvider::new("openrouter", vec![Reply::RateLimited]);
        let primary_calls = primary.calls();
        let secondary = ScriptedProvider::new("gemini", vec![Reply::Echo]);
        let coordinator =
            FallbackCoordinator::new(Some(route(primary, 2)), Some(route(secondary, 0)));

        let result = coordinator.complete("sys", &[], "oi").await.unwrap();

        assert_eq!(result.provider_used, ProviderSlot::Secondary);
        assert_eq!(primary_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_secondary_retries_rate_limits() {
        let secondary = ScriptedProvider::new(
            "gemini",
            vec![Reply::RateLimited, Reply::RateLimited, Reply::Echo],
        );
        let calls = secondary.calls();
        let coordinator = FallbackCoordinator::new(None, Some(route(secondary, 5)));

        let result = coordinator.complete("sys", &[], "oi").await.unwrap();

        assert_eq!(result.response.content, "gemini: oi");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_secondary_failure_propagates() {
        let primary = ScriptedProvider::new("openrouter", vec![Reply::Fail]);
        let secondary = ScriptedProvider::new("gemini", vec![Reply::Fail]);
        let coordinator =
            FallbackCoordinator::new(Some(route(primary, 0)), Some(route(secondary, 0)));

        let err = coordinator.complete("sys", &[], "oi").await.unwrap_err();
        assert!(matches!(err, LlmError::Provider { .. }));
        assert!(err.to_string().contains("gemini"));
    }

    #[tokio::test]
    async fn test_no_providers_configured() {
        let coordinator = FallbackCoordinator::new(None, None);
        let err = coordinator.complete("sys", &[], "oi").await.unwrap_err();
        assert!(matches!(err, LlmError::NoProviderAvailable));
        assert!(coordinator.status().is_empty());
    }

    #[tokio::test]
    async fn test_primary_only_failure_returns_primary_error() {
        let primary = ScriptedProvider::new("openrouter", vec![Reply::Fail]);
        let coordinator = FallbackCoordinator::new(Some(route(primary, 0)), None);

        let err = coordinator.complete("sys", &[], "oi").await.unwrap_err();
        assert!(err.to_string().contains("openrouter"));

        let err = coordinator.complete("sys", &[], "oi").await.unwrap_err();
        assert!(matches!(err, LlmError::NoProviderAvailable));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_primary_times_out_and_falls_back() {
        let primary = ScriptedProvider::new("openrouter", vec![Reply::Hang]);
        let secondary = ScriptedProvider::new("gemini", vec![Reply::Echo]);
        let coordinator =
            FallbackCoordinator::new(Some(route(primary, 3)), Some(route(secondary, 0)));

        let result = coordinator.complete("sys", &[], "oi").await.unwrap();

        assert_eq!(result.provider_used, ProviderSlot::Secondary);
        assert!(!coordinator.primary_enabled());
    }

    #[tokio::test]
    async fn test_each_slot_gets_its_own_vocabulary() {
        let primary = ScriptedProvider::new("openrouter", vec![Reply::Fail]);
        let primary_requests = primary.requests();
        let secondary = ScriptedProvider::new("gemini", vec![Reply::Echo])
            .with_vocabulary(RoleVocabulary::GEMINI);
        let secondary_requests = secondary.requests();
        let coordinator =
            FallbackCoordinator::new(Some(route(primary, 0)), Some(route(secondary, 0)));
        let history = vec![Turn::user("oi"), Turn::assistant("Qual seu nome?")];

        coordinator.complete("sys", &history, "Ana").await.unwrap();

        let sent_primary = &primary_requests.lock().unwrap()[0];
        assert_eq!(sent_primary[1].role, "assistant");
        let sent_secondary = &secondary_requests.lock().unwrap()[0];
        assert_eq!(sent_secondary[1].role, "model");
        assert_eq!(sent_secondary.len(), 3);
        assert_eq!(sent_secondary[2].content, "Ana");
    }

    #[tokio::test]
    async fn test_status_reflects_primary_disable() {
        let primary = ScriptedProvider::new("openrouter", vec![Reply::Fail]);
        let secondary = ScriptedProvider::new("gemini", vec![Reply::Echo]);
        let coordinator =
            FallbackCoordinator::new(Some(route(primary, 0)), Some(route(secondary, 0)));

        assert!(coordinator.status()[0].enabled);
        coordinator.complete("sys", &[], "oi").await.unwrap();

        let status = coordinator.status();
        assert_eq!(status.len(), 2);
        assert_eq!(status[0].slot, ProviderSlot::Primary);
        assert!(!status[0].enabled);
        assert_eq!(status[1].name, "gemini");
        assert!(status[1].enabled);
    }
}
