//! # labfollowup-providers
//!
//! Concrete LLM provider implementations behind the core `Provider` trait.
//! Currently a single OpenAI-compatible client, which covers OpenAI itself
//! and local OpenAI-compatible servers.

mod openai;

pub use openai::OpenAiProvider;
