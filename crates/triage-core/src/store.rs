//! The `OntologyStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `triage-store-sqlite`). Higher layers (`triage-api`, `triage-server`)
//! depend on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  assignment::{Assignment, AssignmentRecord, NewAssignment},
  classify::Candidate,
  ontology::{NewOntology, Ontology, OntologyId, OntologyPatch, OntologySummary},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`OntologyStore::list_ontologies`].
#[derive(Debug, Clone, Default)]
pub struct OntologyQuery {
  pub category:        Option<String>,
  /// All returned rows must carry every one of these tags.
  pub tags:            Vec<String>,
  pub is_active:       Option<bool>,
  /// Tombstoned rows are excluded unless explicitly requested.
  pub include_deleted: bool,
  /// Page size; the store applies a default (100) when unset.
  pub limit:           Option<usize>,
  pub offset:          Option<usize>,
}

/// One page of summaries plus the total row count matching the filter.
#[derive(Debug, Clone)]
pub struct OntologyPage {
  pub items: Vec<OntologySummary>,
  pub total: u64,
}

/// Outcome of a soft delete. Deleting an already-tombstoned row is a no-op
/// success, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
  Deleted { at: DateTime<Utc> },
  AlreadyDeleted { at: DateTime<Utc> },
}

impl DeleteOutcome {
  pub fn deleted_at(&self) -> DateTime<Utc> {
    match self {
      Self::Deleted { at } | Self::AlreadyDeleted { at } => *at,
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the ontology store backend.
///
/// Ontology rows are mutable in metadata but never hard-deleted; removal is
/// a tombstone. Assignment rows are strictly append-only.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait OntologyStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  // ── Ontologies ────────────────────────────────────────────────────────

  /// Validate and persist a new ontology. Fails with a conflict when the
  /// (name, version) pair exists among any row, tombstoned ones included.
  fn create_ontology(
    &self,
    input: NewOntology,
  ) -> impl Future<Output = Result<Ontology, Self::Error>> + Send + '_;

  /// Retrieve by id. Tombstoned rows are returned only when
  /// `include_deleted` is set. Returns `None` if not found.
  fn get_ontology(
    &self,
    id: OntologyId,
    include_deleted: bool,
  ) -> impl Future<Output = Result<Option<Ontology>, Self::Error>> + Send + '_;

  /// Retrieve by name: a specific version if requested, otherwise the
  /// highest non-deleted version (numeric dot-segment order, lexicographic
  /// fallback). Returns `None` if no matching live row exists.
  fn get_ontology_by_name<'a>(
    &'a self,
    name: &'a str,
    version: Option<&'a str>,
  ) -> impl Future<Output = Result<Option<Ontology>, Self::Error>> + Send + 'a;

  /// List summaries matching `query`, ordered by priority descending then
  /// creation time descending, with the total count for the same filter.
  fn list_ontologies<'a>(
    &'a self,
    query: &'a OntologyQuery,
  ) -> impl Future<Output = Result<OntologyPage, Self::Error>> + Send + 'a;

  /// Partially update mutable fields by id; never touches name/version/id.
  /// Fails with not-found if the row is absent or tombstoned.
  fn update_ontology(
    &self,
    id: OntologyId,
    patch: OntologyPatch,
  ) -> impl Future<Output = Result<Ontology, Self::Error>> + Send + '_;

  /// Tombstone a row. Idempotent: repeating the call reports the original
  /// deletion time. Fails with not-found only when the id never existed.
  fn delete_ontology(
    &self,
    id: OntologyId,
  ) -> impl Future<Output = Result<DeleteOutcome, Self::Error>> + Send + '_;

  /// Distinct names of stored ontologies with the given active flag,
  /// sorted ascending.
  fn ontology_names(
    &self,
    is_active: bool,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  // ── Classification candidates ─────────────────────────────────────────

  /// All active, non-deleted ontology summaries eligible for
  /// classification, ordered by priority descending then creation time
  /// descending. When `project_id` is given, rows whose matching
  /// configuration carries a `project_ids` allow-list are filtered to those
  /// listing it; rows without one are globally eligible.
  fn candidates(
    &self,
    project_id: Option<i64>,
  ) -> impl Future<Output = Result<Vec<Candidate>, Self::Error>> + Send + '_;

  // ── Assignments — append-only ─────────────────────────────────────────

  /// Record a decision. `assigned_at` is set by the store.
  fn record_assignment(
    &self,
    input: NewAssignment,
  ) -> impl Future<Output = Result<Assignment, Self::Error>> + Send + '_;

  /// All assignments for a ticket, newest first, each joined with the
  /// selected ontology's identity. An empty result is not an error.
  fn ticket_history<'a>(
    &'a self,
    ticket_id: &'a str,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Vec<AssignmentRecord>, Self::Error>> + Send + 'a;
}
