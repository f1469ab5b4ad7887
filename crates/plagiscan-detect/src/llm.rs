use std::time::Duration;

use plagiscan_core::{LlmConfig, PlagiscanError, Result};
use serde::{Deserialize, Serialize};

use crate::prompt::{build_judge_prompt, build_system_prompt};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// A message in a chat conversation with the LLM.
///
/// # Examples
///
/// ```
/// use plagiscan_detect::llm::{ChatMessage, Role};
///
/// let msg = ChatMessage {
///     role: Role::User,
///     content: "Is this plagiarized?".into(),
/// };
/// assert!(matches!(msg.role, Role::User));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Text content of the message.
    pub content: String,
}

/// Role in the chat conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// Something that renders a judgment on a snippet given retrieved evidence.
///
/// Returns the collaborator's raw text; interpretation is left to
/// [`parse_verdict`](crate::prompt::parse_verdict).
#[allow(async_fn_in_trait)]
pub trait Judge {
    /// Judge `snippet` against `evidence`.
    async fn judge(&self, snippet: &str, evidence: &str) -> Result<String>;
}

impl<T: Judge + ?Sized> Judge for &T {
    async fn judge(&self, snippet: &str, evidence: &str) -> Result<String> {
        (**self).judge(snippet, evidence).await
    }
}

/// OpenAI-compatible chat completions client.
///
/// Works with any provider that exposes `/v1/chat/completions`.
///
/// # Examples
///
/// ```
/// use plagiscan_core::LlmConfig;
/// use plagiscan_detect::llm::LlmClient;
///
/// let config = LlmConfig {
///     api_key: Some("test-key".into()),
///     ..LlmConfig::default()
/// };
/// let client = LlmClient::new(&config).unwrap();
/// assert_eq!(client.model(), "gpt-3.5-turbo");
/// ```
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("model", &self.config.model)
            .field("base_url", &self.base_url())
            .finish_non_exhaustive()
    }
}

impl LlmClient {
    /// Create a new LLM client from configuration.
    ///
    /// A missing `api_key` falls back to `OPENAI_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns [`PlagiscanError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PlagiscanError::Config(format!("failed to create HTTP client: {e}")))?;
        let mut config = config.clone();
        if config.api_key.is_none() {
            config.api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        Ok(Self { client, config })
    }

    /// Return the model name from the configuration.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    /// Send a chat completion request and return the text response.
    ///
    /// # Errors
    ///
    /// Returns [`PlagiscanError::Transport`] if the request fails or the
    /// status is not a success, and [`PlagiscanError::MalformedResponse`] if
    /// the body has no `choices[0].message.content`.
    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url());

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        });

        let mut request = self.client.post(&url);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| PlagiscanError::Transport(format!("LLM request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(PlagiscanError::Transport(format!(
                "LLM API error {status}: {body_text}"
            )));
        }

        let response_body: serde_json::Value = response.json().await.map_err(|e| {
            PlagiscanError::MalformedResponse(format!("failed to parse LLM response: {e}"))
        })?;

        let content = response_body
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| {
                PlagiscanError::MalformedResponse(format!(
                    "unexpected response structure: {response_body}"
                ))
            })?;

        Ok(content.trim().to_string())
    }
}

/// [`Judge`] backed by an [`LlmClient`].
#[derive(Debug)]
pub struct LlmJudge {
    client: LlmClient,
}

impl LlmJudge {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

impl Judge for LlmJudge {
    async fn judge(&self, snippet: &str, evidence: &str) -> Result<String> {
        let messages = vec![
            ChatMessage {
                role: Role::System,
                content: build_system_prompt(),
            },
            ChatMessage {
                role: Role::User,
                content: build_judge_prompt(snippet, evidence),
            },
        ];
        let raw = self.client.chat(messages).await?;
        tracing::debug!(response = %raw, "raw judgment");
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> LlmConfig {
        LlmConfig {
            api_key: Some("sk-test".into()),
            base_url: Some(server.uri()),
            timeout_secs: 5,
            ..LlmConfig::default()
        }
    }

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })
    }

    #[test]
    fn model_returns_config_model() {
        let config = LlmConfig {
            model: "gpt-4o-mini".into(),
            ..LlmConfig::default()
        };
        let client = LlmClient::new(&config).unwrap();
        assert_eq!(client.model(), "gpt-4o-mini");
    }

    #[test]
    fn chat_message_serializes() {
        let msg = ChatMessage {
            role: Role::System,
            content: "hello".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "hello");
    }

    #[test]
    fn debug_hides_api_key() {
        let config = LlmConfig {
            api_key: Some("sk-secret".into()),
            ..LlmConfig::default()
        };
        let client = LlmClient::new(&config).unwrap();
        assert!(!format!("{client:?}").contains("sk-secret"));
    }

    #[tokio::test]
    async fn chat_sends_budget_and_reads_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 5,
                "temperature": 0.0,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(" Plagiarized \n")))
            .mount(&server)
            .await;

        let client = LlmClient::new(&config_for(&server)).unwrap();
        let messages = vec![ChatMessage {
            role: Role::User,
            content: "hi".into(),
        }];
        assert_eq!(client.chat(messages).await.unwrap(), "Plagiarized");
    }

    #[tokio::test]
    async fn judge_sends_system_and_user_prompts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "messages": [
                    { "role": "system", "content": build_system_prompt() },
                    { "role": "user", "content": build_judge_prompt("a = 1", "b = 2") },
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("NotPlagiarized")))
            .expect(1)
            .mount(&server)
            .await;

        let judge = LlmJudge::new(LlmClient::new(&config_for(&server)).unwrap());
        assert_eq!(judge.judge("a = 1", "b = 2").await.unwrap(), "NotPlagiarized");
    }

    #[tokio::test]
    async fn error_status_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = LlmClient::new(&config_for(&server)).unwrap();
        let err = client.chat(Vec::new()).await.unwrap_err();
        assert!(matches!(err, PlagiscanError::Transport(_)));
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn missing_choices_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "x" })))
            .mount(&server)
            .await;

        let client = LlmClient::new(&config_for(&server)).unwrap();
        let err = client.chat(Vec::new()).await.unwrap_err();
        assert!(matches!(err, PlagiscanError::MalformedResponse(_)));
    }
}
