//! OpenAI-compatible remote completion backend.
//!
//! Talks to a `/chat/completions` endpoint behind a proxy that fronts the
//! actual recursive completion service. The assembled context rides as
//! system messages (one per chunk), the query as the user message, and the
//! service's operational knobs (iterations, sub-model, compaction) as
//! vendor extension fields a plain OpenAI-compatible server ignores.
//!
//! Every failure is flattened into a [`BackendError`] whose message embeds
//! the HTTP status or transport error text; that message is the only
//! signal the error classifier consumes.

use async_trait::async_trait;
use hindsight_core::backend::{
    BackendFactory, CompletionBackend, CompletionOutcome, CompletionRequest, UsageSummary,
};
use hindsight_core::context::ContextPayload;
use hindsight_core::error::BackendError;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// A fresh-per-attempt client for the completion proxy.
pub struct RemoteBackend {
    client: reqwest::Client,
}

impl RemoteBackend {
    /// Build with a brand-new HTTP client (and connection pool).
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn body(request: &CompletionRequest) -> serde_json::Value {
        let mut messages = Vec::new();
        match &request.context {
            ContextPayload::Text(text) => {
                messages.push(serde_json::json!({"role": "system", "content": text}));
            }
            ContextPayload::Chunks(chunks) => {
                for chunk in chunks {
                    messages.push(serde_json::json!({"role": "system", "content": chunk}));
                }
            }
        }
        messages.push(serde_json::json!({"role": "user", "content": request.query}));

        let mut body = serde_json::json!({
            "model": request.primary.model,
            "messages": messages,
            "stream": false,
            "max_iterations": request.max_iterations,
            "max_depth": request.max_depth,
        });
        if let Some(secondary) = &request.secondary {
            body["sub_model"] = serde_json::json!(secondary.model);
        }
        if request.compaction {
            body["compaction"] = serde_json::json!(true);
            body["compaction_threshold"] = serde_json::json!(request.compaction_threshold);
        }
        body
    }
}

impl Default for RemoteBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionBackend for RemoteBackend {
    fn name(&self) -> &str {
        "remote"
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionOutcome, BackendError> {
        let url = format!(
            "{}/chat/completions",
            request.primary.base_url.trim_end_matches('/')
        );
        debug!(url = %url, model = %request.primary.model, "Sending completion request");

        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", request.primary.api_key))
            .header("Content-Type", "application/json")
            .timeout(request.timeout)
            .json(&Self::body(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::new(format!("Connection timeout: {e}"))
                } else {
                    BackendError::new(format!("Connection error: {e}"))
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::new(format!("HTTP {status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| BackendError::new(format!("Failed to parse response: {e}")))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::new("No choices in response"))?;

        let mut usage = UsageSummary::default();
        if let Some(u) = api_response.usage {
            let model = api_response
                .model
                .unwrap_or_else(|| request.primary.model.clone());
            usage.record(model, u.prompt_tokens, u.completion_tokens);
        }

        Ok(CompletionOutcome {
            response: choice.message.content.unwrap_or_default(),
            execution_time: started.elapsed(),
            usage,
        })
    }
}

/// Builds a fresh [`RemoteBackend`] for every attempt.
pub struct RemoteBackendFactory;

impl BackendFactory for RemoteBackendFactory {
    fn build(&self) -> Arc<dyn CompletionBackend> {
        Arc::new(RemoteBackend::new())
    }
}

// ── Wire types ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use hindsight_core::backend::ModelConfig;
    use hindsight_core::classify::{ErrorClass, ErrorClassifier, SubstringClassifier};

    fn request_with(context: ContextPayload) -> CompletionRequest {
        CompletionRequest::new(
            "the query",
            context,
            ModelConfig::new("kimi-k2.5", "https://api.moonshot.ai/v1", "sk-test"),
        )
        .with_secondary(Some(ModelConfig::new(
            "kimi-k2-turbo-preview",
            "https://api.moonshot.ai/v1",
            "sk-test",
        )))
        .with_compaction(true, 0.75)
    }

    #[test]
    fn text_payload_becomes_one_system_message() {
        let body = RemoteBackend::body(&request_with(ContextPayload::Text("ctx".into())));
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "ctx");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "the query");
    }

    #[test]
    fn chunked_payload_becomes_one_system_message_per_chunk() {
        let body = RemoteBackend::body(&request_with(ContextPayload::Chunks(vec![
            "a".into(),
            "b".into(),
        ])));
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["content"], "a");
        assert_eq!(messages[1]["content"], "b");
        assert_eq!(messages[2]["role"], "user");
    }

    #[test]
    fn body_carries_service_knobs() {
        let body = RemoteBackend::body(&request_with(ContextPayload::Text("ctx".into())));
        assert_eq!(body["model"], "kimi-k2.5");
        assert_eq!(body["sub_model"], "kimi-k2-turbo-preview");
        assert_eq!(body["max_depth"], 1);
        assert_eq!(body["max_iterations"], 20);
        assert_eq!(body["compaction"], true);
    }

    #[test]
    fn sub_model_omitted_when_absent() {
        let request = CompletionRequest::new(
            "q",
            ContextPayload::Text("ctx".into()),
            ModelConfig::new("kimi-k2.5", "https://api.moonshot.ai/v1", "sk"),
        );
        let body = RemoteBackend::body(&request);
        assert!(body.get("sub_model").is_none());
        assert!(body.get("compaction").is_none());
    }

    #[test]
    fn error_messages_classify_as_intended() {
        let classifier = SubstringClassifier::default();
        // The shapes RemoteBackend produces for HTTP and transport errors.
        assert_eq!(
            classifier.classify("HTTP 429: quota exceeded"),
            ErrorClass::RateLimited
        );
        assert_eq!(
            classifier.classify("HTTP 503: upstream overloaded"),
            ErrorClass::Transient
        );
        assert_eq!(
            classifier.classify("Connection timeout: operation timed out"),
            ErrorClass::Transient
        );
        assert_eq!(
            classifier.classify("HTTP 400: bad request"),
            ErrorClass::Fatal
        );
    }
}
