//! Help-desk chat proxy.
//!
//! The mock provider answers locally. The upstream provider forwards the
//! message to a configured HTTP endpoint and pulls the reply text out of
//! whichever response shape it returns.

use crate::config::{ChatConfig, ChatProviderKind};
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("CHAT_PROVIDER_URL not configured")]
    MissingUpstreamUrl,

    #[error("Upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Upstream returned status {0}")]
    UpstreamStatus(u16),
}

/// Chat client for one configured provider
#[derive(Debug, Clone)]
pub struct ChatClient {
    config: ChatConfig,
    http: reqwest::Client,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {e}");
                reqwest::Client::new()
            });
        Self { config, http }
    }

    /// Local canned replies only
    pub fn mock() -> Self {
        Self::new(ChatConfig::default())
    }

    pub fn provider(&self) -> ChatProviderKind {
        self.config.provider
    }

    /// Answer `message` with the configured provider
    pub async fn reply(&self, message: &str) -> Result<String, ChatError> {
        match self.config.provider {
            ChatProviderKind::Mock => Ok(mock_reply(message)),
            ChatProviderKind::Upstream => self.forward(message).await,
        }
    }

    async fn forward(&self, message: &str) -> Result<String, ChatError> {
        let url = self
            .config
            .url
            .as_deref()
            .ok_or(ChatError::MissingUpstreamUrl)?;

        let mut payload = json!({ "input": message });
        if let Some(model) = &self.config.model {
            payload["model"] = json!(model);
            payload["messages"] = json!([{ "role": "user", "content": message }]);
        }

        let mut request = self.http.post(url).json(&payload);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Chat upstream rejected request");
            return Err(ChatError::UpstreamStatus(status.as_u16()));
        }

        let raw = response.text().await?;
        Ok(extract_reply(&raw))
    }
}

/// Canned reply of the mock provider
pub fn mock_reply(message: &str) -> String {
    format!("Demo assistant reply to: \"{message}\"")
}

/// First non-empty reply field of an upstream response, else the raw text
pub fn extract_reply(raw: &str) -> String {
    let Ok(body) = serde_json::from_str::<Value>(raw) else {
        return raw.to_string();
    };

    let candidates = [
        body.pointer("/choices/0/message/content"),
        body.get("reply"),
        body.get("output"),
        body.get("result"),
        body.get("data"),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .find(|text| !text.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| raw.to_string())
}
