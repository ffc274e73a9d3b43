//! # labfollowup-guidelines
//!
//! The guideline corpus side of the system: a PostgreSQL + pgvector store
//! queried through the core `GuidelineStore` trait, and the offline
//! ingestion path that chunks documents and populates the store. Query
//! embedding and similarity ranking are delegated to the database.

pub mod chunker;
pub mod ingest;
mod store;

pub use ingest::{DocumentReport, GuidelineDocument, IngestReport, ingest_directory, load_documents};
pub use store::SqlGuidelineStore;
