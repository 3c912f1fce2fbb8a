//! ModelInvoker - calls the configured provider with deterministic settings.
//!
//! Builds the provider request from an assembled prompt, bounds each call
//! with a timeout, and retries transient failures per the [`RetryPolicy`].
//! The payload is returned uninterpreted.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use super::retry::{RetryPolicy, Sleeper, TokioSleeper};
use crate::domain::extraction::{response_schema, AssembledPrompt, ExtractionRequest, Provider};
use crate::ports::{
    AIError, AIProvider, CompletionRequest, FinishReason, MessageRole, RequestMetadata, TokenUsage,
};

/// Raw provider output plus call metadata.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub raw_output: String,
    pub provider: Provider,
    pub model: String,
    /// Latency of the successful call.
    pub latency: Duration,
    pub usage: Option<TokenUsage>,
    pub finish_reason: FinishReason,
    /// Calls made, including the successful one.
    pub attempts: u32,
    /// Whether the output was requested in schema-constrained mode.
    pub structured: bool,
}

/// A provider call that did not produce output.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error} (after {attempts} attempt(s))")]
pub struct InvocationError {
    pub error: AIError,
    pub attempts: u32,
}

/// Stateless provider caller.
#[derive(Clone)]
pub struct ModelInvoker {
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    timeout: Duration,
}

impl Default for ModelInvoker {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), Duration::from_secs(15))
    }
}

impl ModelInvoker {
    pub fn new(retry: RetryPolicy, timeout: Duration) -> Self {
        Self {
            retry,
            sleeper: Arc::new(TokioSleeper),
            timeout,
        }
    }

    /// Replaces the backoff sleeper.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Calls `client` with the assembled prompt.
    ///
    /// Temperature is taken from the request, which fixes it at 0.0.
    pub async fn invoke(
        &self,
        client: &dyn AIProvider,
        request: &ExtractionRequest,
        prompt: &AssembledPrompt,
        trace_id: &str,
    ) -> Result<Invocation, InvocationError> {
        let structured = request.provider().capabilities().supports_structured_output
            && client.provider_info().supports_structured_output;
        let completion = Self::completion_request(request, prompt, structured, trace_id);
        let timeout = self.timeout;

        let outcome = self
            .retry
            .execute(self.sleeper.as_ref(), |attempt| {
                let completion = completion.clone();
                async move {
                    tracing::debug!(attempt, "calling provider");
                    let started = Instant::now();
                    match tokio::time::timeout(timeout, client.complete(completion)).await {
                        Ok(Ok(response)) => Ok((response, started.elapsed())),
                        Ok(Err(err)) => Err(err),
                        Err(_) => Err(AIError::Timeout {
                            timeout_secs: timeout.as_secs() as u32,
                        }),
                    }
                }
            })
            .await
            .map_err(|failed| InvocationError {
                error: failed.value,
                attempts: failed.attempts,
            })?;

        let (response, latency) = outcome.value;
        tracing::info!(
            provider = %request.provider(),
            model = %response.model,
            latency_ms = latency.as_millis() as u64,
            attempts = outcome.attempts,
            structured,
            "provider call completed"
        );

        Ok(Invocation {
            raw_output: response.content,
            provider: request.provider(),
            model: response.model,
            latency,
            usage: response.usage,
            finish_reason: response.finish_reason,
            attempts: outcome.attempts,
            structured,
        })
    }

    fn completion_request(
        request: &ExtractionRequest,
        prompt: &AssembledPrompt,
        structured: bool,
        trace_id: &str,
    ) -> CompletionRequest {
        let completion = CompletionRequest::new(RequestMetadata::new(trace_id))
            .with_system_prompt(prompt.system.clone())
            .with_message(MessageRole::User, prompt.user.clone())
            .with_temperature(request.temperature())
            .with_max_tokens(request.max_tokens());
        if structured {
            completion.with_response_schema(response_schema())
        } else {
            completion
        }
    }
}
