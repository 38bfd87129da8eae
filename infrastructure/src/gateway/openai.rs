//! OpenAI-compatible chat completion gateway.
//!
//! Posts to `{base_url}/chat/completions` with `stream: false` and returns
//! the first choice's message content. Works with any server speaking the
//! OpenAI chat schema (vLLM, serverless endpoints, local proxies).

use async_trait::async_trait;
use conformity_application::{CompletionGateway, GatewayError};
use conformity_domain::{Conversation, Message, Model};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, trace};

/// Sampling fields sent with every request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub frequency_penalty: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.6,
            top_p: 0.7,
            max_tokens: 1024,
            frequency_penalty: 0.0,
            top_k: Some(50),
        }
    }
}

/// Connection settings for [`OpenAiCompatibleGateway`]
#[derive(Debug, Clone)]
pub struct OpenAiGatewayConfig {
    /// Base URL up to and including the version segment, e.g. `https://host/v1`
    pub base_url: String,
    /// Sent as a bearer token when present
    pub api_key: Option<String>,
    pub headers: BTreeMap<String, String>,
    /// Zero disables the timeout
    pub timeout: Duration,
    pub sampling: SamplingParams,
}

impl Default for OpenAiGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ai.gitee.com/v1".to_string(),
            api_key: None,
            headers: BTreeMap::new(),
            timeout: Duration::from_secs(120),
            sampling: SamplingParams::default(),
        }
    }
}

/// Gateway to an OpenAI-compatible `/chat/completions` endpoint
pub struct OpenAiCompatibleGateway {
    client: reqwest::Client,
    endpoint: String,
    sampling: SamplingParams,
}

impl OpenAiCompatibleGateway {
    /// Build the HTTP client; fails on header names or values that are not valid HTTP
    pub fn new(config: OpenAiGatewayConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| GatewayError::Other(format!("Invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| GatewayError::Other(format!("Invalid header value for {}: {}", name, e)))?;
            headers.insert(name, value);
        }
        if let Some(key) = &config.api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| GatewayError::Other(format!("Invalid API key: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if !config.timeout.is_zero() {
            builder = builder.timeout(config.timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GatewayError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            sampling: config.sampling,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionGateway for OpenAiCompatibleGateway {
    async fn complete(
        &self,
        model: &Model,
        conversation: &Conversation,
    ) -> Result<String, GatewayError> {
        let request = ChatRequest {
            model: model.as_str(),
            messages: conversation.messages(),
            stream: false,
            sampling: &self.sampling,
        };
        trace!(model = %model, "POST {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(GatewayError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GatewayError::InvalidResponse("response has no message content".to_string()))?;

        debug!(model = %model, chars = content.len(), "Completion received");
        Ok(content)
    }
}

fn map_transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Connection(e.to_string())
    }
}

// -- OpenAI chat request/response types --

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    #[serde(flatten)]
    sampling: &'a SamplingParams,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}
