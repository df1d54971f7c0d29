use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f64 = 0.3;

#[derive(Error, Debug)]
pub enum OpenAiError {
    #[error("Missing OPENAI_API_KEY")]
    MissingApiKey,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

pub type OpenAiResult<T> = Result<T, OpenAiError>;

/// Normalized chat-completions request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<Value>,
    pub temperature: f64,
}

impl ChatRequest {
    /// Validate a client payload and fill in defaults.
    ///
    /// `messages` must be an array; `model` defaults to gpt-4o-mini and
    /// `temperature` to 0.3 unless a number is supplied.
    pub fn from_payload(payload: &Value) -> OpenAiResult<Self> {
        let messages = payload
            .get("messages")
            .and_then(|v| v.as_array())
            .cloned()
            .ok_or_else(|| OpenAiError::InvalidRequest("messages array required".to_string()))?;

        let model = payload
            .get("model")
            .and_then(|v| v.as_str())
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MODEL)
            .to_string();

        let temperature = payload
            .get("temperature")
            .and_then(|v| v.as_f64())
            .unwrap_or(DEFAULT_TEMPERATURE);

        let response_format = payload.get("response_format").filter(|v| !v.is_null()).cloned();

        Ok(Self {
            model,
            messages,
            response_format,
            temperature,
        })
    }
}

/// Upstream status and body, relayed unchanged.
#[derive(Debug, Clone)]
pub struct ChatCompletion {
    pub status: u16,
    pub body: String,
}

#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: Option<String>, base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// POST to `/chat/completions`. Non-2xx statuses are not errors here; the
    /// caller relays them.
    pub async fn chat_completions(&self, request: &ChatRequest) -> OpenAiResult<ChatCompletion> {
        let api_key = self.api_key.as_deref().ok_or(OpenAiError::MissingApiKey)?;

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        if status >= 400 {
            tracing::warn!("OpenAI chat completion returned {}", status);
        }

        Ok(ChatCompletion { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_are_applied() {
        let request = ChatRequest::from_payload(&json!({
            "messages": [{"role": "user", "content": "hi"}]
        }))
        .unwrap();
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.temperature, 0.3);
        assert_eq!(request.response_format, None);

        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn explicit_values_win() {
        let request = ChatRequest::from_payload(&json!({
            "model": "gpt-4o",
            "messages": [],
            "temperature": 0,
            "response_format": {"type": "json_object"}
        }))
        .unwrap();
        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.temperature, 0.0);
        assert_eq!(request.response_format, Some(json!({"type": "json_object"})));
    }

    #[test]
    fn non_numeric_temperature_falls_back() {
        let request = ChatRequest::from_payload(&json!({"messages": [], "temperature": "hot"})).unwrap();
        assert_eq!(request.temperature, 0.3);
    }

    #[test]
    fn messages_must_be_an_array() {
        for payload in [json!({}), json!({"messages": "hello"}), json!({"messages": {"role": "user"}})] {
            let err = ChatRequest::from_payload(&payload).unwrap_err();
            assert_eq!(err.to_string(), "messages array required");
        }
    }

    #[tokio::test]
    async fn missing_key_short_circuits() {
        let client = OpenAiClient::new(None, DEFAULT_BASE_URL.to_string(), Duration::from_secs(1));
        assert!(!client.is_configured());
        let request = ChatRequest::from_payload(&json!({"messages": []})).unwrap();
        let err = client.chat_completions(&request).await.unwrap_err();
        assert!(matches!(err, OpenAiError::MissingApiKey));
    }
}
