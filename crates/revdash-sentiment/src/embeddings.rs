//! Embedding generators used by semantic search.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::SentimentError;

/// Turns text into a fixed-length vector.
///
/// Calls may fail transiently; callers decide whether to skip or surface.
pub trait Embedder: Send + Sync {
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, SentimentError>>;
}

/// Build the embedder selected in configuration.
///
/// # Errors
///
/// Returns [`SentimentError::Embed`] if the provider's settings are incomplete
/// or the HTTP client cannot be built.
pub fn embedder_from_config(
    config: &revdash_core::AppConfig,
) -> Result<Arc<dyn Embedder>, SentimentError> {
    let timeout = Duration::from_secs(config.embed_timeout_secs);
    match config.embed_provider {
        revdash_core::EmbedProvider::Tei => {
            let url = config
                .tei_url
                .as_deref()
                .ok_or_else(|| SentimentError::Embed("TEI url not configured".to_string()))?;
            Ok(Arc::new(TeiClient::new(url, timeout)?))
        }
        revdash_core::EmbedProvider::OpenAi => {
            let key = config
                .openai_api_key
                .as_deref()
                .ok_or_else(|| SentimentError::Embed("OpenAI key not configured".to_string()))?;
            Ok(Arc::new(OpenAiEmbedder::new(
                key,
                &config.openai_base_url,
                &config.openai_model,
                timeout,
            )?))
        }
        revdash_core::EmbedProvider::None => Ok(Arc::new(NoopEmbedder)),
    }
}

/// TEI (Text Embeddings Inference) HTTP client.
pub struct TeiClient {
    client: reqwest::Client,
    url: String,
}

#[derive(Serialize)]
struct TeiEmbedRequest<'a> {
    inputs: &'a str,
}

impl TeiClient {
    /// Create a client for `{tei_url}/embed`.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the HTTP client cannot be built.
    pub fn new(tei_url: &str, timeout: Duration) -> Result<Self, SentimentError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: format!("{}/embed", tei_url.trim_end_matches('/')),
        })
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, SentimentError> {
        let response = self
            .client
            .post(&self.url)
            .json(&TeiEmbedRequest { inputs: text })
            .send()
            .await
            .map_err(|e| SentimentError::Embed(format!("TEI request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(SentimentError::Embed(format!(
                "TEI returned status {}",
                response.status()
            )));
        }

        let embeddings: Vec<Vec<f32>> = response
            .json()
            .await
            .map_err(|e| SentimentError::Embed(format!("TEI response parse error: {e}")))?;

        embeddings
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| SentimentError::Embed("TEI returned empty embedding".to_string()))
    }
}

impl Embedder for TeiClient {
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, SentimentError>> {
        Box::pin(self.embed_one(text))
    }
}

/// Client for OpenAI-compatible `/embeddings` endpoints.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct OpenAiEmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Deserialize)]
struct OpenAiEmbedding {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    /// # Errors
    ///
    /// Returns [`SentimentError::Embed`] for a blank key or model, or
    /// [`SentimentError::Http`] if the HTTP client cannot be built.
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, SentimentError> {
        if api_key.trim().is_empty() {
            return Err(SentimentError::Embed("missing OpenAI API key".to_string()));
        }
        if model.trim().is_empty() {
            return Err(SentimentError::Embed("missing OpenAI model name".to_string()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            api_key: api_key.trim().to_string(),
            model: model.to_string(),
        })
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, SentimentError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&OpenAiEmbedRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .await
            .map_err(|e| SentimentError::Embed(format!("OpenAI request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(SentimentError::Embed(format!(
                "OpenAI embeddings returned status {}",
                response.status()
            )));
        }

        let parsed: OpenAiEmbedResponse = response
            .json()
            .await
            .map_err(|e| SentimentError::Embed(format!("OpenAI response parse error: {e}")))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| SentimentError::Embed("OpenAI returned empty embedding".to_string()))
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, SentimentError>> {
        Box::pin(self.embed_one(text))
    }
}

/// Embedder used when semantic search is switched off; every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEmbedder;

impl Embedder for NoopEmbedder {
    fn embed<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, SentimentError>> {
        Box::pin(async {
            Err(SentimentError::Embed(
                "no embedding provider configured".to_string(),
            ))
        })
    }
}
