//! LLM-backed ticket classification for Triage.
//!
//! Implements [`triage_core::classify::Classifier`] against any
//! OpenAI-compatible chat-completions endpoint. The classifier sends a
//! fixed prompt carrying the ticket text and candidate ontology summaries,
//! and parses a single structured verdict out of the reply, with one repair
//! pass for replies wrapped in markdown fences or prose.
//!
//! [`MockClassifier`] provides canned verdicts for tests further up the
//! stack; nothing outside this crate ever sees a provider response shape.

pub mod llm;
pub mod mock;
pub mod parse;
pub mod prompt;

pub use llm::{LlmClassifier, LlmConfig};
pub use mock::MockClassifier;
