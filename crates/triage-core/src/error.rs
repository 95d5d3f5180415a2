//! Error taxonomy for `triage-core`.
//!
//! Every failure surfaced to a caller carries one of these kinds; storage
//! backends convert their internal errors into this taxonomy at the
//! [`crate::store::OntologyStore`] boundary.

use thiserror::Error;

use crate::classify::ClassifyError;

#[derive(Debug, Error)]
pub enum Error {
  /// The referenced entity is absent or soft-deleted.
  #[error("not found: {0}")]
  NotFound(String),

  /// A row with this (name, version) pair already exists, possibly
  /// soft-deleted.
  #[error("ontology '{name}' v{version} already exists")]
  Conflict { name: String, version: String },

  /// The submitted ontology failed structural validation. Every violation
  /// found is listed, not just the first.
  #[error("validation failed: {}", violations.join("; "))]
  Validation { violations: Vec<String> },

  /// No active, non-deleted ontology exists to classify against.
  #[error("no active ontologies available")]
  NoCandidates,

  /// The external classification call failed.
  #[error("classification failed: {0}")]
  Classify(#[from] ClassifyError),

  /// A storage-layer failure (connection, decode, serialisation).
  #[error("store error: {0}")]
  Store(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
