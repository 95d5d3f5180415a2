//! A scriptable classifier for tests.
//!
//! Queue verdicts (or errors) up front; each `classify` call consumes the
//! next one and records the candidate set it was handed, so tests can assert
//! both outcomes and what the orchestrator actually passed in.

use std::sync::Mutex;

use triage_core::classify::{
  Candidate, Classification, Classifier, ClassifyError, Ticket, Verdict,
};

/// One scripted reply.
type Scripted = Result<Verdict, ScriptedError>;

/// `ClassifyError` is not `Clone`; keep a constructor instead.
type ScriptedError = fn() -> ClassifyError;

pub struct MockClassifier {
  model:   String,
  replies: Mutex<Vec<Scripted>>,
  calls:   Mutex<Vec<Vec<Candidate>>>,
}

impl MockClassifier {
  pub fn new(model: impl Into<String>) -> Self {
    Self {
      model:   model.into(),
      replies: Mutex::new(Vec::new()),
      calls:   Mutex::new(Vec::new()),
    }
  }

  /// A mock that always answers with the given verdict.
  pub fn always(verdict: Verdict) -> Self {
    let mock = Self::new("mock-model");
    mock.push_verdict(verdict);
    mock
  }

  /// Queue a verdict for the next unscripted call.
  pub fn push_verdict(&self, verdict: Verdict) {
    self.replies.lock().unwrap().push(Ok(verdict));
  }

  /// Queue an error for the next unscripted call.
  pub fn push_error(&self, error: ScriptedError) {
    self.replies.lock().unwrap().push(Err(error));
  }

  /// The candidate sets handed to each `classify` call, in order.
  pub fn recorded_calls(&self) -> Vec<Vec<Candidate>> {
    self.calls.lock().unwrap().clone()
  }
}

impl Classifier for MockClassifier {
  async fn classify(
    &self,
    _ticket: &Ticket,
    candidates: &[Candidate],
  ) -> Result<Classification, ClassifyError> {
    if candidates.is_empty() {
      return Err(ClassifyError::NoCandidates);
    }
    self.calls.lock().unwrap().push(candidates.to_vec());

    let mut replies = self.replies.lock().unwrap();
    // The last reply is sticky so `always` keeps answering.
    let scripted = if replies.len() > 1 {
      replies.remove(0)
    } else {
      replies
        .first()
        .cloned()
        .ok_or_else(|| ClassifyError::Malformed("mock has no scripted reply".to_string()))?
    };

    match scripted {
      Ok(verdict) => Ok(Classification {
        verdict,
        model:      self.model.clone(),
        elapsed_ms: 5,
      }),
      Err(make_error) => Err(make_error()),
    }
  }

  fn model_name(&self) -> &str { &self.model }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ticket() -> Ticket {
    Ticket {
      ticket_id:   "TKT-1".to_string(),
      title:       "t".to_string(),
      description: "d".to_string(),
    }
  }

  fn candidate(id: i64) -> Candidate {
    Candidate {
      ontology_id: id,
      name:        format!("ont-{id}"),
      version:     "1.0.0".to_string(),
      category:    "general".to_string(),
      description: String::new(),
      tags:        Vec::new(),
      priority:    50,
    }
  }

  fn verdict(id: i64) -> Verdict {
    Verdict {
      ontology_id:    id,
      confidence:     0.9,
      reasoning:      "scripted".to_string(),
      category:       "general".to_string(),
      keywords_found: Vec::new(),
    }
  }

  #[tokio::test]
  async fn always_repeats_its_verdict() {
    let mock = MockClassifier::always(verdict(1));
    for _ in 0..3 {
      let result = mock
        .classify(&ticket(), &[candidate(1)])
        .await
        .unwrap();
      assert_eq!(result.verdict.ontology_id, 1);
      assert_eq!(result.model, "mock-model");
    }
  }

  #[tokio::test]
  async fn queued_replies_are_consumed_in_order() {
    let mock = MockClassifier::new("m");
    mock.push_verdict(verdict(1));
    mock.push_error(|| ClassifyError::Timeout);

    let first = mock.classify(&ticket(), &[candidate(1)]).await.unwrap();
    assert_eq!(first.verdict.ontology_id, 1);

    let second = mock.classify(&ticket(), &[candidate(1)]).await.unwrap_err();
    assert!(matches!(second, ClassifyError::Timeout));
  }

  #[tokio::test]
  async fn records_the_candidates_it_was_handed() {
    let mock = MockClassifier::always(verdict(2));
    mock
      .classify(&ticket(), &[candidate(2), candidate(1)])
      .await
      .unwrap();

    let calls = mock.recorded_calls();
    assert_eq!(calls.len(), 1);
    let ids: Vec<_> = calls[0].iter().map(|c| c.ontology_id).collect();
    assert_eq!(ids, [2, 1]);
  }

  #[tokio::test]
  async fn empty_candidates_error_without_consuming_a_reply() {
    let mock = MockClassifier::always(verdict(1));
    let err = mock.classify(&ticket(), &[]).await.unwrap_err();
    assert!(matches!(err, ClassifyError::NoCandidates));
    assert!(mock.recorded_calls().is_empty());
  }
}
