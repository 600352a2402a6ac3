use super::Embedder;
use crate::error::EmbedError;
use crate::text::tokenize;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Deterministic feature-hashing embedder.
///
/// Each lowercase word token is hashed with BLAKE3 into one of `dimensions`
/// signed buckets and the result is L2-normalized. Texts sharing words get
/// positive cosine similarity; identical texts embed identically. No model
/// files, no network.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    #[must_use]
    pub const fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed one text synchronously.
    #[must_use]
    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimensions];

        for token in tokenize(text) {
            let digest = blake3::hash(token.as_bytes());
            let bytes = digest.as_bytes();
            let mut head = [0_u8; 8];
            head.copy_from_slice(&bytes[..8]);
            let bucket = u64::from_le_bytes(head) % self.dimensions as u64;
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            #[allow(clippy::cast_possible_truncation)]
            {
                vector[bucket as usize] += sign;
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed_batch(
        &self,
        texts: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<Vec<f32>>, EmbedError> {
        if cancel.is_cancelled() {
            return Err(EmbedError::Cancelled);
        }
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }
}
