//! Semantic guideline search tool.
//!
//! Wraps a [`GuidelineStore`] and renders matching chunks with their
//! identifiers and similarity scores, so the model can cite specific
//! chunks in its final output.

use std::sync::Arc;

use async_trait::async_trait;
use labfollowup_core::{GuidelineStore, Tool, ToolError, ToolResult};
use serde_json::{json, Value};
use tracing::warn;

/// Upper bound on results a single tool call can request.
const MAX_TOP_K: i64 = 10;

/// Characters of chunk text included per result.
const EXCERPT_CHARS: usize = 500;

const NO_RESULTS_MESSAGE: &str = "No relevant clinical guidelines found for this query.";

/// Tool that searches the clinical guideline corpus by semantic similarity.
pub struct GuidelineSearchTool {
    store: Arc<dyn GuidelineStore>,
    default_top_k: usize,
}

impl GuidelineSearchTool {
    pub fn new(store: Arc<dyn GuidelineStore>, default_top_k: usize) -> Self {
        Self {
            store,
            default_top_k,
        }
    }
}

#[async_trait]
impl Tool for GuidelineSearchTool {
    fn name(&self) -> &str {
        "search_clinical_guidelines"
    }

    fn description(&self) -> &str {
        "Search clinical practice guidelines by semantic similarity. Returns the most \
         relevant guideline passages with chunk IDs and similarity scores. Phrase the \
         query as a clinical question (e.g., 'elevated creatinine follow-up in CKD')."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Clinical question or topic to search for"
                },
                "top_k": {
                    "type": "integer",
                    "description": "Number of results to return (1-10)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("'query' is required".to_string()))?
            .trim();
        let top_k = arguments["top_k"]
            .as_i64()
            .unwrap_or(self.default_top_k as i64)
            .clamp(1, MAX_TOP_K) as usize;

        let chunks = match self.store.search(query, top_k).await {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!(error = %e, "Guideline search failed");
                return Ok(ToolResult::degraded(NO_RESULTS_MESSAGE.to_string()));
            }
        };

        if chunks.is_empty() {
            return Ok(ToolResult::text(NO_RESULTS_MESSAGE.to_string()));
        }

        let mut output = format!(
            "Clinical Guidelines Search Results (Top {}):\n\n",
            chunks.len()
        );
        for (i, chunk) in chunks.iter().enumerate() {
            let excerpt: String = chunk.chunk_text.chars().take(EXCERPT_CHARS).collect();
            output.push_str(&format!("[{}] Guideline: {}\n", i + 1, chunk.guideline_id));
            output.push_str(&format!("    Chunk ID: {}\n", chunk.chunk_id));
            output.push_str(&format!("    Similarity: {:.4}\n", chunk.similarity));
            output.push_str(&format!("    Excerpt: {excerpt}...\n\n"));
        }
        output.push_str(
            "\n**Important:** Include these chunk_id values in your output so \
             recommendations can be traced back to specific guidelines.\n",
        );

        Ok(ToolResult::text(output))
    }
}

// --- Tests ---

#[cfg(test)]
mod tests {
    use super::*;
    use labfollowup_core::error::StoreError;
    use labfollowup_core::guidelines::GuidelineChunk;
    use std::sync::Mutex;

    /// Store that records the arguments of the last search call.
    struct RecordingStore {
        chunks: Vec<GuidelineChunk>,
        last_call: Mutex<Option<(String, usize)>>,
    }

    impl RecordingStore {
        fn with_chunks(chunks: Vec<GuidelineChunk>) -> Self {
            Self {
                chunks,
                last_call: Mutex::new(None),
            }
        }

        fn empty() -> Self {
            Self::with_chunks(Vec::new())
        }
    }

    #[async_trait]
    impl GuidelineStore for RecordingStore {
        async fn search(
            &self,
            query: &str,
            top_k: usize,
        ) -> Result<Vec<GuidelineChunk>, StoreError> {
            *self.last_call.lock().unwrap() = Some((query.to_string(), top_k));
            Ok(self.chunks.clone())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl GuidelineStore for FailingStore {
        async fn search(
            &self,
            _query: &str,
            _top_k: usize,
        ) -> Result<Vec<GuidelineChunk>, StoreError> {
            Err(StoreError::QueryFailed("connection reset".to_string()))
        }
    }

    fn chunk(idx: usize, similarity: f64) -> GuidelineChunk {
        GuidelineChunk {
            chunk_id: format!("kdigo-ckd-2024:chunk-{idx}"),
            guideline_id: "kdigo-ckd-2024".to_string(),
            chunk_text: format!("Guideline passage number {idx} about creatinine follow-up."),
            similarity,
        }
    }

    #[tokio::test]
    async fn renders_results_with_ids_and_scores() {
        let store = Arc::new(RecordingStore::with_chunks(vec![
            chunk(0, 0.8234),
            chunk(1, 0.7512),
        ]));
        let tool = GuidelineSearchTool::new(store, 5);

        let result = tool
            .execute(json!({"query": "creatinine follow-up"}))
            .await
            .expect("execute should succeed");

        assert!(result.success);
        assert!(result
            .output
            .starts_with("Clinical Guidelines Search Results (Top 2):\n\n"));
        assert!(result.output.contains("[1] Guideline: kdigo-ckd-2024\n"));
        assert!(result
            .output
            .contains("    Chunk ID: kdigo-ckd-2024:chunk-0\n"));
        assert!(result.output.contains("    Similarity: 0.8234\n"));
        assert!(result.output.contains(
            "    Excerpt: Guideline passage number 0 about creatinine follow-up....\n"
        ));
        assert!(result.output.contains("**Important:** Include these chunk_id values"));
    }

    #[tokio::test]
    async fn long_chunks_are_excerpted() {
        let long_chunk = GuidelineChunk {
            chunk_id: "g:chunk-0".to_string(),
            guideline_id: "g".to_string(),
            chunk_text: "x".repeat(800),
            similarity: 0.9,
        };
        let store = Arc::new(RecordingStore::with_chunks(vec![long_chunk]));
        let tool = GuidelineSearchTool::new(store, 5);

        let result = tool.execute(json!({"query": "q"})).await.unwrap();

        let expected = format!("    Excerpt: {}...\n", "x".repeat(500));
        assert!(result.output.contains(&expected));
    }

    #[tokio::test]
    async fn empty_results_use_no_results_message() {
        let tool = GuidelineSearchTool::new(Arc::new(RecordingStore::empty()), 5);

        let result = tool.execute(json!({"query": "q"})).await.unwrap();

        assert!(result.success);
        assert_eq!(result.output, NO_RESULTS_MESSAGE);
    }

    #[tokio::test]
    async fn store_failure_degrades_with_same_message() {
        let tool = GuidelineSearchTool::new(Arc::new(FailingStore), 5);

        let result = tool.execute(json!({"query": "q"})).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.output, NO_RESULTS_MESSAGE);
    }

    #[tokio::test]
    async fn top_k_is_clamped_to_bounds() {
        let store = Arc::new(RecordingStore::empty());
        let tool = GuidelineSearchTool::new(store.clone(), 5);

        tool.execute(json!({"query": "q", "top_k": 0})).await.unwrap();
        assert_eq!(store.last_call.lock().unwrap().as_ref().unwrap().1, 1);

        tool.execute(json!({"query": "q", "top_k": 999})).await.unwrap();
        assert_eq!(store.last_call.lock().unwrap().as_ref().unwrap().1, 10);

        tool.execute(json!({"query": "q", "top_k": 3})).await.unwrap();
        assert_eq!(store.last_call.lock().unwrap().as_ref().unwrap().1, 3);
    }

    #[tokio::test]
    async fn missing_top_k_uses_default() {
        let store = Arc::new(RecordingStore::empty());
        let tool = GuidelineSearchTool::new(store.clone(), 5);

        tool.execute(json!({"query": "q"})).await.unwrap();

        assert_eq!(store.last_call.lock().unwrap().as_ref().unwrap().1, 5);
    }

    #[tokio::test]
    async fn query_is_trimmed() {
        let store = Arc::new(RecordingStore::empty());
        let tool = GuidelineSearchTool::new(store.clone(), 5);

        tool.execute(json!({"query": "  creatinine  "})).await.unwrap();

        assert_eq!(
            store.last_call.lock().unwrap().as_ref().unwrap().0,
            "creatinine"
        );
    }

    #[tokio::test]
    async fn missing_query_is_invalid() {
        let tool = GuidelineSearchTool::new(Arc::new(RecordingStore::empty()), 5);

        let err = tool.execute(json!({"top_k": 3})).await.unwrap_err();

        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
