//! JSON HTTP API for Triage.
//!
//! Exposes an axum [`Router`] backed by any
//! [`triage_core::store::OntologyStore`] and
//! [`triage_core::classify::Classifier`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", triage_api::api_router(store.clone(), classifier.clone()))
//! ```

pub mod assign;
pub mod assignments;
pub mod error;
pub mod ontologies;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use triage_core::{classify::Classifier, store::OntologyStore};

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S, C> {
  pub store:      Arc<S>,
  pub classifier: Arc<C>,
}

// Manual impl: `S`/`C` themselves need not be `Clone`.
impl<S, C> Clone for ApiState<S, C> {
  fn clone(&self) -> Self {
    Self {
      store:      self.store.clone(),
      classifier: self.classifier.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store` and `classifier`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, C>(store: Arc<S>, classifier: Arc<C>) -> Router<()>
where
  S: OntologyStore + 'static,
  C: Classifier + 'static,
{
  let state = ApiState { store, classifier };
  Router::new()
    // Ontologies
    .route(
      "/ontologies",
      get(ontologies::list::<S, C>).post(ontologies::create::<S, C>),
    )
    .route("/ontologies/names", get(ontologies::names::<S, C>))
    .route("/ontologies/validate", post(ontologies::validate))
    .route("/ontologies/by-name/{name}", get(ontologies::get_by_name::<S, C>))
    .route(
      "/ontologies/{id}",
      get(ontologies::get_one::<S, C>)
        .patch(ontologies::update::<S, C>)
        .delete(ontologies::delete::<S, C>),
    )
    // Assignments
    .route("/assignments", post(assignments::select::<S, C>))
    .route(
      "/assignments/override",
      post(assignments::override_assignment::<S, C>),
    )
    .route(
      "/tickets/{ticket_id}/assignments",
      get(assignments::history::<S, C>),
    )
    .with_state(state)
}
