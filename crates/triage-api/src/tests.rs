//! Orchestrator and router tests against an in-memory store and a scripted
//! classifier.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt as _;
use triage_classify::MockClassifier;
use triage_core::{
  assignment::MatchMethod,
  classify::{ClassifyError, Verdict},
  ontology::{NewOntology, OntologyPatch},
  store::OntologyStore,
};
use triage_store_sqlite::SqliteStore;

use crate::{
  api_router,
  assign::{self, OverrideRequest, SelectRequest},
  error::ApiError,
};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn sample_document() -> Value {
  json!({
    "entities": [{"name": "Server"}, {"name": "Network"}],
    "relationships": [
      {"source": "Server", "target": "Network", "type": "CONNECTED_TO"},
    ],
  })
}

fn infra_ontology() -> NewOntology {
  let mut input = NewOntology::new("infra", sample_document());
  input.category = "infrastructure".to_string();
  input.description = "Servers, networks, packet loss".to_string();
  input.tags = vec!["network".to_string(), "server".to_string()];
  input.priority = 80;
  input
}

fn verdict(ontology_id: i64) -> Verdict {
  Verdict {
    ontology_id,
    confidence: 0.92,
    reasoning: "ticket vocabulary matches infrastructure".to_string(),
    category: "infrastructure".to_string(),
    keywords_found: vec!["server".to_string(), "network".to_string()],
  }
}

fn select_request(ticket_id: &str) -> SelectRequest {
  SelectRequest {
    ticket_id:          ticket_id.to_string(),
    ticket_title:       "Production server connectivity issue".to_string(),
    ticket_description: "Server unreachable, network shows packet loss".to_string(),
    project_id:         None,
  }
}

// ─── Selection ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn select_assigns_stored_ontology_and_records_one_row() {
  let s = store().await;
  let created = s.create_ontology(infra_ontology()).await.unwrap();
  assert_eq!(created.ontology_id, 1);

  let classifier = MockClassifier::always(verdict(1));
  let response = assign::select_for_ticket(&s, &classifier, select_request("TKT-1"))
    .await
    .unwrap();

  assert_eq!(response.selected_ontology.ontology_id, 1);
  assert_eq!(response.selected_ontology.name, "infra");
  assert_eq!(response.selected_ontology.category, "infrastructure");
  assert!(response.classification.confidence > 0.0);
  assert!(
    response.classification.keywords_found.iter().any(|k| k == "server")
      || response.classification.keywords_found.iter().any(|k| k == "network")
  );

  let history = s.ticket_history("TKT-1", None).await.unwrap();
  assert_eq!(history.len(), 1);
  let row = &history[0].assignment;
  assert_eq!(row.assignment_id, response.assignment_id);
  assert_eq!(row.match_method, MatchMethod::LlmClassification);
  assert_eq!(row.llm_model.as_deref(), Some("mock-model"));
  assert_eq!(row.ticket_title, "Production server connectivity issue");
}

#[tokio::test]
async fn select_with_no_ontologies_fails_and_writes_nothing() {
  let s = store().await;
  let classifier = MockClassifier::always(verdict(1));

  let err = assign::select_for_ticket(&s, &classifier, select_request("TKT-2"))
    .await
    .unwrap_err();
  assert!(matches!(err, ApiError::NoCandidates));
  // The classifier was never consulted.
  assert!(classifier.recorded_calls().is_empty());
  assert!(s.ticket_history("TKT-2", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn select_with_only_inactive_ontologies_fails_no_candidates() {
  let s = store().await;
  let created = s.create_ontology(infra_ontology()).await.unwrap();
  s.update_ontology(
    created.ontology_id,
    OntologyPatch { is_active: Some(false), ..Default::default() },
  )
  .await
  .unwrap();

  let classifier = MockClassifier::always(verdict(created.ontology_id));
  let err = assign::select_for_ticket(&s, &classifier, select_request("TKT-3"))
    .await
    .unwrap_err();
  assert!(matches!(err, ApiError::NoCandidates));
  assert!(s.ticket_history("TKT-3", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn verdict_outside_candidate_set_is_rejected_with_nothing_written() {
  let s = store().await;
  s.create_ontology(infra_ontology()).await.unwrap();

  // A scripted classifier can answer whatever it wants; the orchestrator
  // must still refuse an id it never offered.
  let classifier = MockClassifier::always(verdict(999));
  let err = assign::select_for_ticket(&s, &classifier, select_request("TKT-4"))
    .await
    .unwrap_err();
  assert!(matches!(err, ApiError::Classification(_)));
  assert!(s.ticket_history("TKT-4", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn classifier_failure_is_terminal_with_nothing_written() {
  let s = store().await;
  s.create_ontology(infra_ontology()).await.unwrap();

  let classifier = MockClassifier::new("mock-model");
  classifier.push_error(|| ClassifyError::Timeout);

  let err = assign::select_for_ticket(&s, &classifier, select_request("TKT-5"))
    .await
    .unwrap_err();
  assert!(matches!(err, ApiError::Classification(_)));
  assert!(s.ticket_history("TKT-5", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn candidates_reach_the_classifier_in_priority_order() {
  let s = store().await;
  // Same category, different priorities: the higher-priority row leads the
  // candidate list the model sees.
  let mut low = infra_ontology();
  low.name = "infra-low".to_string();
  low.priority = 50;
  s.create_ontology(low).await.unwrap();
  let high = s.create_ontology(infra_ontology()).await.unwrap();
  assert_eq!(high.priority, 80);

  let classifier = MockClassifier::always(verdict(high.ontology_id));
  assign::select_for_ticket(&s, &classifier, select_request("TKT-6"))
    .await
    .unwrap();

  let calls = classifier.recorded_calls();
  assert_eq!(calls.len(), 1);
  let priorities: Vec<_> = calls[0].iter().map(|c| c.priority).collect();
  assert_eq!(priorities, [80, 50]);
}

#[tokio::test]
async fn project_scoping_narrows_the_candidate_set() {
  let s = store().await;
  let mut scoped = infra_ontology();
  scoped.name = "scoped".to_string();
  scoped.matching_config = Some(json!({"project_ids": [7]}));
  s.create_ontology(scoped).await.unwrap();
  let global = {
    let mut input = infra_ontology();
    input.name = "global".to_string();
    input.priority = 40;
    s.create_ontology(input).await.unwrap()
  };

  let classifier = MockClassifier::always(verdict(global.ontology_id));
  let mut request = select_request("TKT-7");
  request.project_id = Some(3);
  assign::select_for_ticket(&s, &classifier, request).await.unwrap();

  let calls = classifier.recorded_calls();
  let names: Vec<_> = calls[0].iter().map(|c| c.name.as_str()).collect();
  assert_eq!(names, ["global"]);
}

// ─── Override ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn override_appends_and_keeps_prior_row_intact() {
  let s = store().await;
  let first = s.create_ontology(infra_ontology()).await.unwrap();
  let second = {
    let mut input = infra_ontology();
    input.name = "apps".to_string();
    input.category = "application".to_string();
    s.create_ontology(input).await.unwrap()
  };

  let classifier = MockClassifier::always(verdict(first.ontology_id));
  let selected = assign::select_for_ticket(&s, &classifier, select_request("TKT-8"))
    .await
    .unwrap();

  let overridden = assign::override_for_ticket(
    &s,
    OverrideRequest {
      ticket_id:       "TKT-8".to_string(),
      ontology_id:     second.ontology_id,
      override_reason: "model picked the wrong domain".to_string(),
      override_by:     "alice".to_string(),
      project_id:      None,
    },
  )
  .await
  .unwrap();

  assert_eq!(overridden.ontology.ontology_id, second.ontology_id);
  assert_eq!(overridden.override_by, "alice");

  let history = s.ticket_history("TKT-8", None).await.unwrap();
  assert_eq!(history.len(), 2);

  // Newest first: the override leads, the LLM row is untouched beneath it.
  assert_eq!(history[0].assignment.assignment_id, overridden.assignment_id);
  assert!(history[0].assignment.is_override);
  assert_eq!(history[0].assignment.match_method, MatchMethod::ManualOverride);
  assert!(history[0].assignment.match_confidence.is_none());

  assert_eq!(history[1].assignment.assignment_id, selected.assignment_id);
  assert!(!history[1].assignment.is_override);
  assert_eq!(history[1].assignment.match_method, MatchMethod::LlmClassification);
  assert_eq!(history[1].assignment.match_confidence, Some(0.92));
}

#[tokio::test]
async fn override_against_soft_deleted_ontology_is_not_found() {
  let s = store().await;
  let created = s.create_ontology(infra_ontology()).await.unwrap();
  s.delete_ontology(created.ontology_id).await.unwrap();

  let err = assign::override_for_ticket(
    &s,
    OverrideRequest {
      ticket_id:       "TKT-9".to_string(),
      ontology_id:     created.ontology_id,
      override_reason: "r".to_string(),
      override_by:     "bob".to_string(),
      project_id:      None,
    },
  )
  .await
  .unwrap_err();

  assert!(matches!(err, ApiError::NotFound(_)));
  assert!(s.ticket_history("TKT-9", None).await.unwrap().is_empty());
}

// ─── Router round-trips ──────────────────────────────────────────────────────

async fn request_json(
  router: axum::Router,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let response = router.oneshot(builder.body(body).unwrap()).await.unwrap();
  let status = response.status();
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
    .await
    .unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

fn router_with(store: SqliteStore, classifier: MockClassifier) -> axum::Router {
  api_router(Arc::new(store), Arc::new(classifier))
}

#[tokio::test]
async fn store_and_retrieve_over_http() {
  let router = router_with(store().await, MockClassifier::new("m"));

  let (status, created) = request_json(
    router.clone(),
    "POST",
    "/ontologies",
    Some(json!({
      "name": "infra",
      "document": sample_document(),
      "category": "infrastructure",
      "priority": 80,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["ontology_id"], 1);
  assert_eq!(created["version"], "1.0.0");

  let (status, fetched) = request_json(router, "GET", "/ontologies/1", None).await;
  assert_eq!(status, StatusCode::OK);
  // Round-trip: the document comes back bit-identical.
  assert_eq!(fetched["document"], sample_document());
}

#[tokio::test]
async fn duplicate_store_returns_conflict_kind() {
  let router = router_with(store().await, MockClassifier::new("m"));
  let body = json!({"name": "infra", "document": sample_document()});

  let (status, _) =
    request_json(router.clone(), "POST", "/ontologies", Some(body.clone())).await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, error) = request_json(router, "POST", "/ontologies", Some(body)).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(error["success"], false);
  assert_eq!(error["error"]["kind"], "conflict");
}

#[tokio::test]
async fn invalid_document_returns_every_violation() {
  let router = router_with(store().await, MockClassifier::new("m"));

  let (status, error) = request_json(
    router,
    "POST",
    "/ontologies",
    Some(json!({"name": "broken", "document": {"entities": "nope"}, "priority": 0})),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(error["error"]["kind"], "validation");
  assert_eq!(error["error"]["violations"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn get_missing_returns_not_found_kind() {
  let router = router_with(store().await, MockClassifier::new("m"));
  let (status, error) = request_json(router, "GET", "/ontologies/42", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(error["error"]["kind"], "not_found");
}

#[tokio::test]
async fn validate_endpoint_reports_without_failing() {
  let router = router_with(store().await, MockClassifier::new("m"));
  let (status, report) = request_json(
    router,
    "POST",
    "/ontologies/validate",
    Some(json!({"entities": [{}]})),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["is_valid"], false);
  // missing relationships key + entity without a name
  assert_eq!(report["violations"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn get_by_id_finds_tombstoned_rows_unless_active_only() {
  let router = router_with(store().await, MockClassifier::new("m"));
  request_json(
    router.clone(),
    "POST",
    "/ontologies",
    Some(json!({"name": "infra", "document": sample_document()})),
  )
  .await;
  request_json(router.clone(), "DELETE", "/ontologies/1", None).await;

  let (status, body) = request_json(router.clone(), "GET", "/ontologies/1", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["tombstone"]["state"], "deleted");

  let (status, _) =
    request_json(router, "GET", "/ontologies/1?active_only=true", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_is_idempotent_over_http() {
  let router = router_with(store().await, MockClassifier::new("m"));
  request_json(
    router.clone(),
    "POST",
    "/ontologies",
    Some(json!({"name": "infra", "document": sample_document()})),
  )
  .await;

  let (status, first) = request_json(router.clone(), "DELETE", "/ontologies/1", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(first["already_deleted"], false);

  let (status, second) = request_json(router, "DELETE", "/ontologies/1", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(second["already_deleted"], true);
  assert_eq!(second["deleted_at"], first["deleted_at"]);
}

#[tokio::test]
async fn select_with_empty_store_returns_no_candidates_kind() {
  let router = router_with(store().await, MockClassifier::new("m"));
  let (status, error) = request_json(
    router,
    "POST",
    "/assignments",
    Some(json!({
      "ticket_id": "TKT-1",
      "ticket_title": "t",
      "ticket_description": "d",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(error["error"]["kind"], "no_candidates");
}

#[tokio::test]
async fn history_endpoint_returns_empty_list_for_unknown_ticket() {
  let router = router_with(store().await, MockClassifier::new("m"));
  let (status, body) =
    request_json(router, "GET", "/tickets/TKT-UNKNOWN/assignments", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!([]));
}

#[tokio::test]
async fn names_endpoint_lists_distinct_active_names() {
  let router = router_with(store().await, MockClassifier::new("m"));
  for (name, version) in [("infra", "1.0.0"), ("infra", "2.0.0"), ("apps", "1.0.0")] {
    let (status, _) = request_json(
      router.clone(),
      "POST",
      "/ontologies",
      Some(json!({"name": name, "version": version, "document": sample_document()})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
  }

  let (status, names) = request_json(router, "GET", "/ontologies/names", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(names, json!(["apps", "infra"]));
}
