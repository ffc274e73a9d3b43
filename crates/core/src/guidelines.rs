//! Guideline retrieval, the abstraction over the vector-enabled store.
//!
//! The store owns both query embedding and similarity ranking; callers pass
//! text and get ranked chunks back. No vector math happens on this side of
//! the trait.

use crate::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One ranked chunk of guideline text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidelineChunk {
    /// Synthetic id of the form `{guideline_id}:chunk-{index}`.
    pub chunk_id: String,

    /// Logical guideline identifier (the source document).
    pub guideline_id: String,

    /// The chunk text.
    pub chunk_text: String,

    /// Dot-product similarity against the query, in [0, 1] for
    /// normalized embeddings.
    pub similarity: f64,
}

/// Semantic search over the pre-chunked guideline corpus.
#[async_trait]
pub trait GuidelineStore: Send + Sync {
    /// Return the `top_k` most similar chunks for the query text,
    /// highest similarity first.
    async fn search(
        &self,
        query: &str,
        top_k: usize,
    ) -> std::result::Result<Vec<GuidelineChunk>, StoreError>;
}
