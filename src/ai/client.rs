// src/ai/client.rs

use std::sync::Arc;
use std::time::Duration;

use super::{
    AiError,
    clock::{Clock, TokioClock},
    gemini::GeminiProvider,
    provider::{AttemptFailure, DisabledProvider, GenerationOptions, GenerativeProvider},
    rate_limit::RateLimiter,
};
use crate::config::AiConfig;

/// Attempt budget, backoff and per-attempt timeout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_millis(1000),
            timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay after the given failed attempt (1-based): base, 2×base, 4×base...
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff_base.saturating_mul(factor)
    }
}

/// A successful call and how many attempts it took.
#[derive(Debug, Clone, PartialEq)]
pub struct AiResponse<T> {
    pub value: T,
    pub attempts: u32,
}

/// Every outbound call to the generative provider goes through here.
pub struct AiClient {
    provider: Arc<dyn GenerativeProvider>,
    limiter: RateLimiter,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl AiClient {
    pub fn new(
        provider: Arc<dyn GenerativeProvider>,
        policy: RetryPolicy,
        min_interval: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            limiter: RateLimiter::new(min_interval, clock.clone()),
            policy,
            clock,
        }
    }

    /// Builds the process-wide client from configuration. Without an API key
    /// every call fails fast with [`AiError::NotConfigured`].
    pub fn from_config(config: &AiConfig) -> Result<Self, reqwest::Error> {
        let provider: Arc<dyn GenerativeProvider> = match &config.api_key {
            Some(key) => {
                let http = reqwest::Client::builder()
                    .connect_timeout(Duration::from_secs(10))
                    .build()?;
                Arc::new(GeminiProvider::new(http, &config.base_url, &config.model, key))
            }
            None => {
                tracing::warn!("AI_API_KEY not set; AI features will use their fallbacks");
                Arc::new(DisabledProvider)
            }
        };

        let policy = RetryPolicy {
            max_attempts: config.max_attempts,
            backoff_base: config.backoff_base,
            timeout: config.timeout,
        };

        Ok(Self::new(provider, policy, config.min_interval, Arc::new(TokioClock)))
    }

    /// Raw text call.
    pub async fn call(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<AiResponse<String>, AiError> {
        self.call_validated(prompt, options, |text| Ok(text.to_string()))
            .await
    }

    /// Calls the provider until `validate` accepts the text or the attempt
    /// budget runs out. Timeouts, provider errors and rejected payloads all
    /// count as failed attempts.
    pub async fn call_validated<T, F>(
        &self,
        prompt: &str,
        options: &GenerationOptions,
        validate: F,
    ) -> Result<AiResponse<T>, AiError>
    where
        F: Fn(&str) -> Result<T, String> + Send + Sync,
        T: Send,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            self.limiter.acquire().await;

            let outcome =
                match tokio::time::timeout(self.policy.timeout, self.provider.generate(prompt, options))
                    .await
                {
                    Ok(Ok(text)) => validate(&text).map_err(AttemptFailure::Malformed),
                    Ok(Err(failure)) => Err(failure),
                    Err(_) => Err(AttemptFailure::Timeout),
                };

            let failure = match outcome {
                Ok(value) => {
                    tracing::debug!(attempt, "AI call succeeded");
                    return Ok(AiResponse {
                        value,
                        attempts: attempt,
                    });
                }
                Err(AttemptFailure::NotConfigured) => return Err(AiError::NotConfigured),
                Err(failure) => failure,
            };

            if attempt >= self.policy.max_attempts {
                tracing::warn!(attempt, "AI call failed, attempts exhausted: {}", failure);
                return Err(AiError::Exhausted {
                    attempts: attempt,
                    last: failure,
                });
            }

            let delay = self.policy.backoff(attempt);
            tracing::warn!(
                attempt,
                max_attempts = self.policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "AI call failed, retrying: {}",
                failure
            );
            self.clock.sleep(delay).await;
        }
    }
}
