//! Analysis oracle client.
//!
//! Thin chat-completions wrapper that always requests a JSON object reply.
//! Callers own their prompts and parse the returned content themselves.

use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use partnerscout_shared::{PartnerScoutError, Result};

/// Default timeout in seconds for oracle requests. Scoring batches can be
/// slow, so this is generous.
const ORACLE_TIMEOUT_SECS: u64 = 90;

/// User-Agent string for oracle requests.
const USER_AGENT: &str = concat!("PartnerScout/", env!("CARGO_PKG_VERSION"));

/// System prompt shared by every oracle call.
pub const ANALYST_SYSTEM_PROMPT: &str = "You are a professional business analyst specializing in \
     partnership and competitive analysis. Your primary task is to thoroughly evaluate potential \
     competition between companies and existing partners.";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the analysis oracle.
#[derive(Debug, Clone)]
pub struct Oracle {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    model: String,
}

impl Oracle {
    pub fn new(base_url: &str, api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| PartnerScoutError::config(format!("invalid oracle base URL: {e}")))?;

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(ORACLE_TIMEOUT_SECS))
            .build()
            .map_err(|e| PartnerScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// The configured default model.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one prompt with the default model.
    pub async fn chat_json(&self, user_prompt: &str) -> Result<String> {
        self.chat_json_with_model(&self.model, user_prompt).await
    }

    /// Send one prompt with an explicit model, returning the raw JSON content
    /// string. Empty or missing content is an error here; callers decide
    /// whether that is fatal.
    #[instrument(skip_all, fields(model = %model, prompt_len = user_prompt.len()))]
    pub async fn chat_json_with_model(&self, model: &str, user_prompt: &str) -> Result<String> {
        let endpoint = self
            .base_url
            .join("/v1/chat/completions")
            .map_err(|e| PartnerScoutError::config(format!("invalid oracle endpoint: {e}")))?;

        let request = ChatRequest {
            model,
            messages: vec![
                Message {
                    role: "system",
                    content: ANALYST_SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: user_prompt,
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = self
            .http
            .post(endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PartnerScoutError::Network(format!("{endpoint}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PartnerScoutError::Provider(format!(
                "oracle returned HTTP {status}"
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| PartnerScoutError::parse(format!("malformed oracle response: {e}")))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        let content = content.trim().to_string();
        if content.is_empty() {
            return Err(PartnerScoutError::Provider("oracle returned empty content".into()));
        }

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chat_reply(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
    }

    #[tokio::test]
    async fn chat_json_returns_content() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "response_format": {"type": "json_object"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(r#"{"ok": true}"#)))
            .mount(&server)
            .await;

        let oracle = Oracle::new(&server.uri(), "test-key", "gpt-4o-mini").unwrap();
        let content = oracle.chat_json("hello").await.unwrap();
        assert_eq!(content, r#"{"ok": true}"#);
    }

    #[tokio::test]
    async fn empty_content_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("   ")))
            .mount(&server)
            .await;

        let oracle = Oracle::new(&server.uri(), "test-key", "gpt-4o-mini").unwrap();
        assert!(oracle.chat_json("hello").await.is_err());
    }

    #[tokio::test]
    async fn http_error_surfaces_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let oracle = Oracle::new(&server.uri(), "test-key", "gpt-4o-mini").unwrap();
        let err = oracle.chat_json("hello").await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }
}
