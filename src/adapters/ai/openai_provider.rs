//! OpenAI Provider - Implementation of AIProvider for OpenAI's chat completions API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIConfig::new(api_key)
//!     .with_model("gpt-4o-mini")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let provider = OpenAIProvider::new(config)?;
//! ```
//!
//! # Structured output
//!
//! When the request carries a response schema, it is sent as a strict
//! `json_schema` response format so the model can only emit matching JSON.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, MessageRole,
    ProviderInfo, TokenUsage,
};

/// Configuration for the OpenAI provider.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use (e.g., "gpt-4o-mini", "gpt-4o").
    pub model: String,
    /// Base URL for the API (default: https://api.openai.com/v1).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl OpenAIConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: Secret<String>) -> Self {
        Self {
            api_key,
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI API provider implementation.
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIProvider {
    /// Creates a new OpenAI provider with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::InvalidRequest(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Converts our request to OpenAI's format.
    fn to_openai_request(&self, request: &CompletionRequest) -> OpenAIRequest {
        let mut messages = Vec::new();

        if let Some(ref prompt) = request.system_prompt {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: prompt.clone(),
            });
        }

        for msg in &request.messages {
            messages.push(OpenAIMessage {
                role: match msg.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                }
                .to_string(),
                content: msg.content.clone(),
            });
        }

        let response_format = request.response_schema.as_ref().map(|schema| ResponseFormat {
            kind: "json_schema",
            json_schema: JsonSchemaFormat {
                name: "expense_extraction",
                strict: true,
                schema: schema.clone(),
            },
        });

        OpenAIRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format,
        }
    }

    async fn send_request(&self, request: &CompletionRequest) -> Result<Response, AIError> {
        let openai_request = self.to_openai_request(request);

        self.client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    AIError::network(format!("Connection failed: {}", e))
                } else {
                    AIError::network(e.to_string())
                }
            })
    }

    /// Maps non-success statuses to [`AIError`].
    async fn handle_response_status(&self, response: Response) -> Result<Response, AIError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        Err(Self::status_error(status.as_u16(), &error_body, &self.config.model))
    }

    fn status_error(status: u16, error_body: &str, model: &str) -> AIError {
        match status {
            401 | 403 => AIError::AuthenticationFailed,
            404 => AIError::invalid_model(model),
            429 => AIError::rate_limited(Self::parse_retry_after(error_body)),
            400 => {
                if error_body.contains("model_not_found")
                    || error_body.contains("does not exist")
                {
                    AIError::invalid_model(model)
                } else if error_body.contains("maximum context length")
                    || error_body.contains("context_length_exceeded")
                {
                    AIError::context_too_long(0, 0)
                } else {
                    AIError::InvalidRequest(error_body.to_string())
                }
            }
            500..=599 => AIError::unavailable(format!("Server error {}: {}", status, error_body)),
            _ => AIError::network(format!("Unexpected status {}: {}", status, error_body)),
        }
    }

    /// Parses retry-after from error response.
    fn parse_retry_after(error_body: &str) -> u32 {
        // Rate-limit messages read "... try again in 20s" or "... in 20 seconds".
        if let Ok(parsed) = serde_json::from_str::<Value>(error_body) {
            if let Some(msg) = parsed
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
            {
                if let Some(idx) = msg.find("try again in ") {
                    let rest = &msg[idx + "try again in ".len()..];
                    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
                    if let Ok(secs) = digits.parse::<u32>() {
                        return secs;
                    }
                }
            }
        }
        30
    }

    async fn parse_response(&self, response: Response) -> Result<CompletionResponse, AIError> {
        let response = self.handle_response_status(response).await?;

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        Self::into_completion(openai_response)
    }

    fn into_completion(openai_response: OpenAIResponse) -> Result<CompletionResponse, AIError> {
        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AIError::parse("No choices in response"))?;

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Stop,
        };

        if let Some(refusal) = choice.message.refusal {
            return Err(AIError::content_filtered(refusal));
        }

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            usage: openai_response
                .usage
                .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens)),
            model: openai_response.model,
            finish_reason,
        })
    }
}

#[async_trait]
impl AIProvider for OpenAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let response = self.send_request(&request).await?;
        self.parse_response(response).await
    }

    fn provider_info(&self) -> ProviderInfo {
        let max_context = match self.config.model.as_str() {
            m if m.starts_with("gpt-4o") || m.starts_with("gpt-4-turbo") => 128_000,
            m if m.starts_with("gpt-4.1") => 1_000_000,
            m if m.starts_with("gpt-4") => 8192,
            m if m.starts_with("gpt-3.5") => 16_384,
            _ => 128_000,
        };

        // json_schema response_format is only honored by the 4o/4.1 families and later.
        let structured = !(self.config.model.starts_with("gpt-3.5") || max_context == 8192);

        ProviderInfo::new("openai", &self.config.model, max_context)
            .with_structured_output(structured)
    }
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: &'static str,
    strict: bool,
    schema: Value,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    model: String,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::RequestMetadata;
    use serde_json::json;

    fn provider(model: &str) -> OpenAIProvider {
        let config = OpenAIConfig::new(Secret::new("test-key".to_string())).with_model(model);
        OpenAIProvider::new(config).unwrap()
    }

    #[test]
    fn config_builder_works() {
        let config = OpenAIConfig::new(Secret::new("test-key".to_string()))
            .with_model("gpt-4o")
            .with_base_url("https://custom.api.com/v1/")
            .with_timeout(Duration::from_secs(30));

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.base_url, "https://custom.api.com/v1");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn request_carries_schema_as_strict_response_format() {
        let request = CompletionRequest::new(RequestMetadata::new("t"))
            .with_system_prompt("rules")
            .with_message(MessageRole::User, "20rs na padika")
            .with_temperature(0.0)
            .with_response_schema(json!({"type": "object"}));

        let body = serde_json::to_value(provider("gpt-4o-mini").to_openai_request(&request)).unwrap();

        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "20rs na padika");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
    }

    #[test]
    fn request_without_schema_omits_response_format() {
        let request = CompletionRequest::new(RequestMetadata::new("t"))
            .with_message(MessageRole::User, "hello");

        let body = serde_json::to_value(provider("gpt-4o-mini").to_openai_request(&request)).unwrap();
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn status_errors_are_classified() {
        assert_eq!(
            OpenAIProvider::status_error(401, "", "gpt-4o"),
            AIError::AuthenticationFailed
        );
        assert_eq!(
            OpenAIProvider::status_error(404, "", "gpt-9"),
            AIError::invalid_model("gpt-9")
        );
        assert_eq!(
            OpenAIProvider::status_error(400, r#"{"error":{"code":"model_not_found"}}"#, "gpt-9"),
            AIError::invalid_model("gpt-9")
        );
        assert!(OpenAIProvider::status_error(503, "busy", "gpt-4o").is_retryable());
        assert!(matches!(
            OpenAIProvider::status_error(429, "", "gpt-4o"),
            AIError::RateLimited { .. }
        ));
    }

    #[test]
    fn response_is_converted_with_usage() {
        let raw: OpenAIResponse = serde_json::from_value(json!({
            "model": "gpt-4o-mini-2024-07-18",
            "choices": [{
                "message": {"role": "assistant", "content": "{\"valid\":true}"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 120, "completion_tokens": 30, "total_tokens": 150}
        }))
        .unwrap();

        let completion = OpenAIProvider::into_completion(raw).unwrap();
        assert_eq!(completion.content, "{\"valid\":true}");
        assert_eq!(completion.usage, Some(TokenUsage::new(120, 30)));
        assert_eq!(completion.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn refusal_maps_to_content_filtered() {
        let raw: OpenAIResponse = serde_json::from_value(json!({
            "model": "gpt-4o-mini",
            "choices": [{"message": {"content": null, "refusal": "no"}, "finish_reason": "stop"}]
        }))
        .unwrap();

        assert!(matches!(
            OpenAIProvider::into_completion(raw),
            Err(AIError::ContentFiltered { .. })
        ));
    }

    #[test]
    fn empty_choices_is_a_parse_error() {
        let raw: OpenAIResponse =
            serde_json::from_value(json!({"model": "gpt-4o", "choices": []})).unwrap();
        assert!(matches!(
            OpenAIProvider::into_completion(raw),
            Err(AIError::Parse(_))
        ));
    }

    #[test]
    fn provider_info_reports_structured_support() {
        assert!(provider("gpt-4o-mini").provider_info().supports_structured_output);
        assert!(!provider("gpt-3.5-turbo").provider_info().supports_structured_output);
        assert_eq!(provider("gpt-4o").provider_info().max_context_tokens, 128_000);
    }

    #[test]
    fn parse_retry_after_from_message() {
        let error = r#"{"error":{"message":"Rate limit exceeded. Please try again in 20s."}}"#;
        assert_eq!(OpenAIProvider::parse_retry_after(error), 20);
    }

    #[test]
    fn parse_retry_after_default() {
        let error = r#"{"error":{"message":"Something went wrong"}}"#;
        assert_eq!(OpenAIProvider::parse_retry_after(error), 30);
    }
}
