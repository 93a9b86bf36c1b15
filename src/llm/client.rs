// OpenAI chat-completions client.
//
// Sends a single non-streaming request to the chat completions endpoint
// and returns the first choice's message text. Keeper evaluation asks for
// `json_object` response format so the reply can be parsed strictly; the
// comparison flow takes free prose.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

// ---------------------------------------------------------------------------
// ChatModel seam
// ---------------------------------------------------------------------------

/// Parameters for one chat completion.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Request the `json_object` response format, constraining the model
    /// to emit a single JSON document.
    pub json_response: bool,
}

/// The text-generation collaborator as the orchestrators see it. A single
/// async method so tests can substitute a scripted fake.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> anyhow::Result<String>;
}

// ---------------------------------------------------------------------------
// OpenAiClient
// ---------------------------------------------------------------------------

/// Concrete chat-completions client.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiClient {
    /// Create a new client with the given API key and model identifier.
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model,
            endpoint: OPENAI_API_URL.to_string(),
        }
    }

    /// Build a client from the application config. The API key may be
    /// absent, in which case every completion fails with a configuration
    /// error rather than an opaque network failure.
    pub fn from_config(config: &Config) -> Self {
        let api_key = config
            .credentials
            .openai_api_key
            .clone()
            .unwrap_or_default();
        Self::new(api_key, config.llm.model.clone())
    }

    /// Whether an API key is configured.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Point the client at a different endpoint (local mock servers in
    /// tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, request: ChatRequest) -> anyhow::Result<String> {
        if self.api_key.is_empty() {
            anyhow::bail!("API key not configured");
        }

        let mut body = serde_json::json!({
            "model": self.model,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user }
            ]
        });
        if request.json_response {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        debug!(model = %self.model, json = request.json_response, "sending chat completion");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            warn!(%status, "chat completion request failed");
            anyhow::bail!("chat API returned status {status}");
        }

        parse_completion_text(&text)
            .ok_or_else(|| anyhow::anyhow!("chat API response had no message content"))
    }
}

// ---------------------------------------------------------------------------
// Response parsing helpers
// ---------------------------------------------------------------------------

/// Extract `choices[0].message.content` from a chat-completions response
/// body.
pub(crate) fn parse_completion_text(body: &str) -> Option<String> {
    let v: Value = serde_json::from_str(body).ok()?;
    v.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(|s| s.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
