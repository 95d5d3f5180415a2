//! The classification boundary — ticket text in, structured verdict out.
//!
//! The [`Classifier`] trait is the narrow capability interface behind which
//! the concrete model provider lives. Nothing provider-specific leaks past
//! it: implementations receive candidate summaries (never full documents)
//! and return a [`Classification`], or a [`ClassifyError`].

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ontology::OntologyId;

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// The ticket text handed to the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
  pub ticket_id:   String,
  pub title:       String,
  pub description: String,
}

/// A candidate ontology summary — the metadata the model selects from.
/// The full document is deliberately excluded to bound prompt size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
  pub ontology_id: OntologyId,
  pub name:        String,
  pub version:     String,
  pub category:    String,
  pub description: String,
  pub tags:        Vec<String>,
  /// Advisory only: included in the prompt as guidance, never applied as a
  /// hard tie-break by the orchestrator.
  pub priority:    i32,
}

// ─── Outputs ─────────────────────────────────────────────────────────────────

/// The model's structured answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
  pub ontology_id:    OntologyId,
  /// In [0, 1].
  pub confidence:     f64,
  pub reasoning:      String,
  pub category:       String,
  pub keywords_found: Vec<String>,
}

/// A verdict plus provenance: which model answered and how long the external
/// call took.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
  pub verdict:    Verdict,
  pub model:      String,
  pub elapsed_ms: i64,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ClassifyError {
  /// The candidate set was empty; no external call was made.
  #[error("no candidate ontologies supplied")]
  NoCandidates,

  /// The model selected an identifier outside the supplied candidate set.
  /// A selection outside the domain is never trusted.
  #[error("model selected unknown ontology id {0}")]
  UnknownSelection(OntologyId),

  /// The response could not be parsed as a verdict, even after one repair
  /// pass.
  #[error("unparseable model response: {0}")]
  Malformed(String),

  /// Network or HTTP failure talking to the provider.
  #[error("transport error: {0}")]
  Transport(String),

  /// The external call exceeded its deadline.
  #[error("classification call timed out")]
  Timeout,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a classification provider.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait Classifier: Send + Sync {
  /// Map ticket text to the best-fit candidate. Implementations must fail
  /// with [`ClassifyError::NoCandidates`] on an empty candidate set without
  /// performing any external call, and with
  /// [`ClassifyError::UnknownSelection`] when the model answers with an id
  /// not present in `candidates`.
  fn classify<'a>(
    &'a self,
    ticket: &'a Ticket,
    candidates: &'a [Candidate],
  ) -> impl Future<Output = Result<Classification, ClassifyError>> + Send + 'a;

  /// The model identifier recorded in the assignment log.
  fn model_name(&self) -> &str;
}
