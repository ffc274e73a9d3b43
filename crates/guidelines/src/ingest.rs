//! Offline guideline ingestion.
//!
//! Reads guideline documents from a directory, chunks them, upserts the
//! chunks, then runs one in-database pass that embeds every chunk still
//! missing an embedding. The pipeline never writes to the chunk table; this
//! module is the only writer.

use crate::chunker;
use crate::store::SqlGuidelineStore;
use labfollowup_core::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A loaded guideline document, ready for chunking.
#[derive(Debug, Clone)]
pub struct GuidelineDocument {
    /// File stem, used as the logical guideline identifier.
    pub guideline_id: String,

    /// First markdown h1 heading, or the guideline_id when there is none.
    pub title: String,

    pub content: String,

    /// Whether the source file exceeded the document size cap.
    pub truncated: bool,
}

/// Per-document ingestion outcome.
#[derive(Debug, Clone)]
pub struct DocumentReport {
    pub guideline_id: String,
    pub title: String,
    pub chunks: u64,
    pub truncated: bool,
}

/// Summary of one ingestion run.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub documents: Vec<DocumentReport>,

    /// Chunks written by this run.
    pub chunks_upserted: u64,

    /// Rows in the chunk table after the run.
    pub chunks_total: i64,

    /// Rows carrying an embedding after the run.
    pub chunks_embedded: i64,
}

/// Load every `.txt`, `.md`, and `.markdown` file in `dir`.
///
/// Unreadable files are logged and skipped; documents over the size cap are
/// truncated. Files are processed in name order so runs are deterministic.
pub fn load_documents(dir: &Path) -> std::io::Result<Vec<GuidelineDocument>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| is_guideline_file(path))
        .collect();
    paths.sort();

    let mut documents = Vec::new();
    for path in paths {
        let Some(guideline_id) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let raw = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable guideline file");
                continue;
            }
        };

        let (content, truncated) = chunker::truncate_document(raw);
        if truncated {
            warn!(
                path = %path.display(),
                max_chars = chunker::MAX_DOCUMENT_CHARS,
                "Guideline document truncated"
            );
        }

        let title = chunker::extract_title(&content).unwrap_or_else(|| guideline_id.to_string());

        documents.push(GuidelineDocument {
            guideline_id: guideline_id.to_string(),
            title,
            content,
            truncated,
        });
    }

    Ok(documents)
}

fn is_guideline_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("txt") | Some("md") | Some("markdown")
    )
}

/// Ingest every guideline document under `dir` into the store.
///
/// Chunk ids are `{guideline_id}:chunk-{index}`, stable across re-runs, so
/// re-ingesting a directory updates in place.
pub async fn ingest_directory(store: &SqlGuidelineStore, dir: &Path) -> Result<IngestReport> {
    let documents = load_documents(dir)?;

    let mut report = IngestReport::default();

    for document in &documents {
        let chunks = chunker::chunk_text(&document.content);
        let upserted = store.upsert_chunks(&document.guideline_id, &chunks).await?;

        info!(
            guideline_id = %document.guideline_id,
            title = %document.title,
            chunks = upserted,
            "Ingested guideline document"
        );

        report.chunks_upserted += upserted;
        report.documents.push(DocumentReport {
            guideline_id: document.guideline_id.clone(),
            title: document.title.clone(),
            chunks: upserted,
            truncated: document.truncated,
        });
    }

    if !documents.is_empty() {
        store.embed_missing().await?;
    }

    let (total, embedded) = store.chunk_counts().await?;
    report.chunks_total = total;
    report.chunks_embedded = embedded;

    Ok(report)
}
