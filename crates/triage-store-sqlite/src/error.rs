//! Error type for `triage-store-sqlite`.

use thiserror::Error;
use triage_core::ontology::OntologyId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] triage_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// A stored column could not be decoded into its domain type.
  #[error("decode error: {0}")]
  Decode(String),

  /// Attempted to update or delete an ontology that was not found (or, for
  /// updates, is tombstoned).
  #[error("ontology not found: {0}")]
  OntologyNotFound(OntologyId),

  /// A row with this (name, version) pair already exists, possibly
  /// tombstoned.
  #[error("ontology '{name}' v{version} already exists")]
  Conflict { name: String, version: String },
}

/// Conversion into the core taxonomy, required at the
/// [`triage_core::store::OntologyStore`] boundary so callers see
/// machine-readable kinds rather than backend detail.
impl From<Error> for triage_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(inner) => inner,
      Error::OntologyNotFound(id) => {
        triage_core::Error::NotFound(format!("ontology {id}"))
      }
      Error::Conflict { name, version } => {
        triage_core::Error::Conflict { name, version }
      }
      Error::Database(_) | Error::Json(_) | Error::Decode(_) => {
        triage_core::Error::Store(e.to_string())
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
