//! Embedding sub-pipeline (spec §4.5.7, ambient addition): an opaque
//! `EmbeddingModel` trait and a deterministic placeholder implementation.
//!
//! Informed by `ferrumyx-ingestion/src/embedding.rs`'s pluggable-backend
//! shape (config + dimension only; the actual dispatch over OpenAI/Gemini/
//! Ollama/etc. is not carried over — the model stays an opaque collaborator
//! per the spec's Non-goals).

use std::hash::{Hash, Hasher};

/// A pluggable text-to-vector encoder. A real implementation (ONNX, Candle,
/// a remote embedding API) is a drop-in replacement; the Orchestrator only
/// ever depends on this trait.
pub trait EmbeddingModel: Send + Sync {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
    fn dimension(&self) -> usize;
}

/// Deterministic seeded hash-projection placeholder. Sufficient to exercise
/// the idempotent-embedding invariant in tests without a real model runtime.
pub struct PlaceholderEmbeddingModel {
    dim: usize,
}

impl PlaceholderEmbeddingModel {
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl EmbeddingModel for PlaceholderEmbeddingModel {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut vector = Vec::with_capacity(self.dim);
        for i in 0..self.dim {
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            text.hash(&mut hasher);
            i.hash(&mut hasher);
            let bits = hasher.finish();
            // Project into [-1.0, 1.0).
            let value = (bits % 2_000_001) as f32 / 1_000_000.0 - 1.0;
            vector.push(value);
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_embeds_identically() {
        let model = PlaceholderEmbeddingModel::new(16);
        let a = model.embed("Attention Is All You Need").unwrap();
        let b = model.embed("Attention Is All You Need").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn different_text_embeds_differently() {
        let model = PlaceholderEmbeddingModel::new(16);
        let a = model.embed("Paper One").unwrap();
        let b = model.embed("Paper Two").unwrap();
        assert_ne!(a, b);
    }
}
