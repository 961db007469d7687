//! Google Generative Language embeddings client.
//!
//! Uses `models/{model}:batchEmbedContents`. Documents are embedded with the
//! `RETRIEVAL_DOCUMENT` task type and queries with `RETRIEVAL_QUERY`, which
//! the service tunes for asymmetric search.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use super::http::{RetryPolicy, build_client};
use super::{EmbeddingError, EmbeddingGenerator, EmbeddingResult, single_vector};

const TASK_DOCUMENT: &str = "RETRIEVAL_DOCUMENT";
const TASK_QUERY: &str = "RETRIEVAL_QUERY";

/// Service limit on requests per batch call.
const MAX_BATCH: usize = 100;

#[derive(Clone)]
pub struct GeminiEmbedder {
    client: Client,
    endpoint: String,
    /// Fully qualified, always `models/...`.
    model: String,
    dimensions: Option<usize>,
    retry: RetryPolicy,
    batch_size: usize,
}

impl GeminiEmbedder {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        dimensions: Option<usize>,
        timeout: Duration,
        max_retries: usize,
        batch_size: usize,
    ) -> EmbeddingResult<Self> {
        let model = qualify_model(&model)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(api_key.trim())
                .map_err(|_| EmbeddingError::Config("invalid API key".to_string()))?,
        );

        Ok(Self {
            client: build_client(headers, timeout)?,
            endpoint: format!(
                "{}/{model}:batchEmbedContents",
                base_url.trim_end_matches('/')
            ),
            model,
            dimensions,
            retry: RetryPolicy::new(max_retries),
            batch_size: batch_size.clamp(1, MAX_BATCH),
        })
    }

    fn request<'a>(&'a self, inputs: &[&'a str], task_type: &'static str) -> BatchEmbedRequest<'a> {
        BatchEmbedRequest {
            requests: inputs
                .iter()
                .copied()
                .map(|text| EmbedContentRequest {
                    model: &self.model,
                    content: Content {
                        parts: vec![Part { text }],
                    },
                    task_type,
                    output_dimensionality: self.dimensions,
                })
                .collect(),
        }
    }

    async fn embed_batch(
        &self,
        inputs: &[&str],
        task_type: &'static str,
    ) -> EmbeddingResult<Vec<Vec<f32>>> {
        let request = self.request(inputs, task_type);
        let response: BatchEmbedResponse = self
            .retry
            .post_json(&self.client, &self.endpoint, &request)
            .await?;
        response.into_vectors(inputs.len())
    }
}

#[async_trait]
impl EmbeddingGenerator for GeminiEmbedder {
    async fn generate_embeddings(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(self.embed_batch(batch, TASK_DOCUMENT).await?);
        }
        Ok(vectors)
    }

    async fn embed_query(&self, query: &str) -> EmbeddingResult<Vec<f32>> {
        let vectors = self.embed_batch(&[query], TASK_QUERY).await?;
        single_vector(vectors)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Accept both `gemini-embedding-001` and `models/gemini-embedding-001`.
fn qualify_model(model: &str) -> EmbeddingResult<String> {
    let model = model.trim();
    let bare = model.strip_prefix("models/").unwrap_or(model);
    if bare.is_empty() {
        return Err(EmbeddingError::Config("missing embedding model name".to_string()));
    }
    Ok(format!("models/{bare}"))
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<usize>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

impl BatchEmbedResponse {
    fn into_vectors(self, expected: usize) -> EmbeddingResult<Vec<Vec<f32>>> {
        if self.embeddings.len() != expected {
            return Err(EmbeddingError::CountMismatch {
                expected,
                actual: self.embeddings.len(),
            });
        }
        if self.embeddings.iter().any(|e| e.values.is_empty()) {
            return Err(EmbeddingError::InvalidResponse(
                "empty embedding vector".to_string(),
            ));
        }
        Ok(self.embeddings.into_iter().map(|e| e.values).collect())
    }
}
