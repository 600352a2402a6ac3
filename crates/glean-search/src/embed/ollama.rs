use super::Embedder;
use crate::error::EmbedError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Embeddings from a local Ollama server (`POST /api/embed`).
///
/// The HTTP call is blocking and runs on Tokio's blocking pool; the async
/// side races it against the cancellation token, so a superseded request
/// returns immediately and its late response is dropped.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    agent: ureq::Agent,
    endpoint: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            endpoint: endpoint_url(base_url),
            model: model.to_string(),
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn post_blocking(
        agent: &ureq::Agent,
        endpoint: &str,
        model: &str,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>> {
        let response: EmbedResponse = agent
            .post(endpoint)
            .send_json(EmbedRequest { model, input: texts })
            .with_context(|| format!("embedding request to {endpoint} failed"))?
            .into_json()
            .context("failed to decode embedding response")?;
        Ok(response.embeddings)
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed_batch(
        &self,
        texts: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<Vec<f32>>, EmbedError> {
        if cancel.is_cancelled() {
            return Err(EmbedError::Cancelled);
        }

        let agent = self.agent.clone();
        let endpoint = self.endpoint.clone();
        let model = self.model.clone();
        let batch = texts.to_vec();
        debug!(endpoint = %endpoint, batch = batch.len(), "requesting embeddings");

        let request = tokio::task::spawn_blocking(move || {
            Self::post_blocking(&agent, &endpoint, &model, &batch)
        });

        tokio::select! {
            biased;

            () = cancel.cancelled() => Err(EmbedError::Cancelled),

            joined = request => {
                let vectors = joined.context("embedding worker panicked")??;
                Ok(vectors)
            }
        }
    }
}

fn endpoint_url(base_url: &str) -> String {
    format!("{}/api/embed", base_url.trim_end_matches('/'))
}
