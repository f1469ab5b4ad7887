//! Embedding collaborator: turns a chunk of code into a fixed-length vector.
//!
//! Two wire protocols are spoken: a minimal JSON service (`POST /embed`
//! with `{"code": ...}`) and OpenAI-compatible `POST /embeddings`.

use std::time::Duration;

use plagiscan_core::{EmbeddingConfig, PlagiscanError, Result};
use serde::{Deserialize, Serialize};

/// Text embedded once to learn the dimensionality of a fresh index.
pub const PROBE_SAMPLE: &str = "def sample(): pass";

/// Something that can embed text.
///
/// Implementations must return vectors of one consistent length. Errors are
/// expected to be [`PlagiscanError::Transport`] or
/// [`PlagiscanError::MalformedResponse`].
#[allow(async_fn_in_trait)]
pub trait Embedder {
    /// Embed one piece of text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

impl<T: Embedder + ?Sized> Embedder for &T {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        (**self).embed(text).await
    }
}

/// Embed [`PROBE_SAMPLE`] and return the length of the vector.
///
/// # Errors
///
/// Propagates the embedder's error.
pub async fn probe_dimension<E: Embedder + ?Sized>(embedder: &E) -> Result<usize> {
    let vector = embedder.embed(PROBE_SAMPLE).await?;
    tracing::debug!(dimension = vector.len(), "probed embedding dimension");
    Ok(vector.len())
}

/// Wire protocol spoken by [`EmbeddingClient`].
///
/// # Examples
///
/// ```
/// use plagiscan_index::embedding::Protocol;
///
/// assert_eq!("service".parse::<Protocol>().unwrap(), Protocol::Service);
/// assert_eq!("OpenAI".parse::<Protocol>().unwrap(), Protocol::OpenAi);
/// assert!("grpc".parse::<Protocol>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// `POST {base}/embed` with `{"code"}`, answering `{"embedding"}`.
    Service,
    /// `POST {base}/embeddings` with `{"model", "input"}`, answering `{"data"}`.
    OpenAi,
}

impl std::str::FromStr for Protocol {
    type Err = PlagiscanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "service" => Ok(Protocol::Service),
            "openai" => Ok(Protocol::OpenAi),
            other => Err(PlagiscanError::Config(format!(
                "unknown embedding provider '{other}' (expected 'service' or 'openai')"
            ))),
        }
    }
}

#[derive(Serialize)]
struct ServiceRequest<'a> {
    code: &'a str,
}

#[derive(Deserialize)]
struct ServiceResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Deserialize)]
struct OpenAiResponse {
    data: Vec<OpenAiItem>,
}

#[derive(Deserialize)]
struct OpenAiItem {
    embedding: Vec<f32>,
}

/// HTTP client for the embedding collaborator.
///
/// # Examples
///
/// ```
/// use plagiscan_core::EmbeddingConfig;
/// use plagiscan_index::embedding::{EmbeddingClient, Protocol};
///
/// let client = EmbeddingClient::from_config(&EmbeddingConfig::default()).unwrap();
/// assert_eq!(client.protocol(), Protocol::Service);
/// assert_eq!(client.endpoint(), "http://localhost:8000/embed");
/// ```
pub struct EmbeddingClient {
    client: reqwest::Client,
    protocol: Protocol,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for EmbeddingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingClient")
            .field("protocol", &self.protocol)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl EmbeddingClient {
    /// Create a client from an [`EmbeddingConfig`].
    ///
    /// The API key falls back to `OPENAI_API_KEY` for the `openai` protocol
    /// and `PLAGISCAN_EMBEDDING_API_KEY` for the `service` protocol. Neither
    /// protocol requires a key.
    ///
    /// # Errors
    ///
    /// Returns [`PlagiscanError::Config`] for an unknown provider or if the
    /// HTTP client cannot be built.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let protocol: Protocol = config.provider.parse()?;
        let env_key = match protocol {
            Protocol::Service => "PLAGISCAN_EMBEDDING_API_KEY",
            Protocol::OpenAi => "OPENAI_API_KEY",
        };
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(env_key).ok());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PlagiscanError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            protocol,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    /// Wire protocol in use.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Full URL requests are posted to.
    pub fn endpoint(&self) -> String {
        match self.protocol {
            Protocol::Service => format!("{}/embed", self.base_url),
            Protocol::OpenAi => format!("{}/embeddings", self.base_url),
        }
    }

    async fn post<B: Serialize + ?Sized>(&self, body: &B) -> Result<serde_json::Value> {
        let mut request = self.client.post(self.endpoint()).json(body);
        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| PlagiscanError::Transport(format!("embedding request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".into());
            return Err(PlagiscanError::Transport(format!(
                "embedding service returned {status}: {body}"
            )));
        }

        response.json().await.map_err(|e| {
            PlagiscanError::MalformedResponse(format!("embedding response is not JSON: {e}"))
        })
    }
}

impl Embedder for EmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vector = match self.protocol {
            Protocol::Service => {
                let value = self.post(&ServiceRequest { code: text }).await?;
                let parsed: ServiceResponse = serde_json::from_value(value).map_err(|e| {
                    PlagiscanError::MalformedResponse(format!("missing 'embedding' field: {e}"))
                })?;
                parsed.embedding
            }
            Protocol::OpenAi => {
                let value = self
                    .post(&OpenAiRequest {
                        model: &self.model,
                        input: [text],
                    })
                    .await?;
                let parsed: OpenAiResponse = serde_json::from_value(value).map_err(|e| {
                    PlagiscanError::MalformedResponse(format!("missing 'data' field: {e}"))
                })?;
                parsed
                    .data
                    .into_iter()
                    .next()
                    .map(|item| item.embedding)
                    .ok_or_else(|| {
                        PlagiscanError::MalformedResponse("empty 'data' array".into())
                    })?
            }
        };

        if vector.is_empty() {
            return Err(PlagiscanError::MalformedResponse(
                "embedding vector is empty".into(),
            ));
        }
        Ok(vector)
    }
}
