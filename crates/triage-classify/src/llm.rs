//! [`LlmClassifier`] — classification over an OpenAI-compatible
//! chat-completions endpoint.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use triage_core::classify::{
  Candidate, Classification, Classifier, ClassifyError, Ticket,
};

use crate::{parse::parse_verdict, prompt};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Connection settings for the classification endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
  /// Full URL of the chat-completions endpoint.
  pub endpoint:     String,
  pub api_key:      String,
  pub model:        String,
  /// Low by default so repeated classifications of the same ticket stay
  /// consistent.
  #[serde(default = "default_temperature")]
  pub temperature:  f32,
  #[serde(default = "default_max_tokens")]
  pub max_tokens:   u32,
  /// Hard deadline on the external call; a timeout surfaces as a
  /// classification failure, never a hung request.
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_temperature() -> f32 { 0.2 }
fn default_max_tokens() -> u32 { 500 }
fn default_timeout_secs() -> u64 { 30 }

impl LlmConfig {
  pub fn new(
    endpoint: impl Into<String>,
    api_key: impl Into<String>,
    model: impl Into<String>,
  ) -> Self {
    Self {
      endpoint:     endpoint.into(),
      api_key:      api_key.into(),
      model:        model.into(),
      temperature:  default_temperature(),
      max_tokens:   default_max_tokens(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
  model:       &'a str,
  messages:    [ChatMessage<'a>; 2],
  temperature: f32,
  max_tokens:  u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
  role:    &'a str,
  content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
  choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
  message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
  content: String,
}

// ─── Classifier ──────────────────────────────────────────────────────────────

/// A classifier backed by an external chat-completions API.
pub struct LlmClassifier {
  config: LlmConfig,
  client: reqwest::Client,
}

impl LlmClassifier {
  pub fn new(config: LlmConfig) -> reqwest::Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { config, client })
  }

  async fn request_completion(
    &self,
    user_prompt: &str,
  ) -> Result<String, ClassifyError> {
    let request = ChatRequest {
      model:       &self.config.model,
      messages:    [
        ChatMessage { role: "system", content: prompt::SYSTEM_PROMPT },
        ChatMessage { role: "user", content: user_prompt },
      ],
      temperature: self.config.temperature,
      max_tokens:  self.config.max_tokens,
    };

    let response = self
      .client
      .post(&self.config.endpoint)
      .bearer_auth(&self.config.api_key)
      .json(&request)
      .send()
      .await
      .map_err(classify_transport_error)?
      .error_for_status()
      .map_err(classify_transport_error)?;

    let body: ChatResponse = response
      .json()
      .await
      .map_err(classify_transport_error)?;

    body
      .choices
      .into_iter()
      .next()
      .map(|choice| choice.message.content)
      .ok_or_else(|| {
        ClassifyError::Malformed("reply carried no choices".to_string())
      })
  }
}

fn classify_transport_error(e: reqwest::Error) -> ClassifyError {
  if e.is_timeout() {
    ClassifyError::Timeout
  } else {
    ClassifyError::Transport(e.to_string())
  }
}

impl Classifier for LlmClassifier {
  async fn classify(
    &self,
    ticket: &Ticket,
    candidates: &[Candidate],
  ) -> Result<Classification, ClassifyError> {
    // An empty candidate set cannot succeed; refuse before paying for the
    // external call.
    if candidates.is_empty() {
      return Err(ClassifyError::NoCandidates);
    }

    let user_prompt = prompt::build_user_prompt(ticket, candidates);
    tracing::debug!(
      ticket_id = %ticket.ticket_id,
      candidates = candidates.len(),
      "sending classification request"
    );

    let started = Instant::now();
    let content = match self.request_completion(&user_prompt).await {
      Ok(content) => content,
      // One internal retry for transient network failure.
      Err(ClassifyError::Transport(_) | ClassifyError::Timeout) => {
        tracing::warn!(
          ticket_id = %ticket.ticket_id,
          "classification call failed, retrying once"
        );
        self.request_completion(&user_prompt).await?
      }
      Err(e) => return Err(e),
    };
    let elapsed_ms = started.elapsed().as_millis() as i64;

    let verdict = parse_verdict(&content)?;

    // A selection outside the supplied domain is never trusted.
    if !candidates.iter().any(|c| c.ontology_id == verdict.ontology_id) {
      return Err(ClassifyError::UnknownSelection(verdict.ontology_id));
    }

    tracing::info!(
      ticket_id = %ticket.ticket_id,
      ontology_id = verdict.ontology_id,
      confidence = verdict.confidence,
      elapsed_ms,
      "model selected ontology"
    );

    Ok(Classification {
      verdict,
      model: self.config.model.clone(),
      elapsed_ms,
    })
  }

  fn model_name(&self) -> &str { &self.config.model }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn config_defaults() {
    let config = LlmConfig::new("https://example.invalid/v1/chat/completions", "k", "m");
    assert_eq!(config.temperature, 0.2);
    assert_eq!(config.max_tokens, 500);
    assert_eq!(config.timeout_secs, 30);
  }

  #[test]
  fn config_deserialises_with_defaults() {
    let config: LlmConfig = serde_json::from_str(
      r#"{"endpoint": "https://example.invalid", "api_key": "k", "model": "m"}"#,
    )
    .unwrap();
    assert_eq!(config.temperature, 0.2);
    assert_eq!(config.timeout_secs, 30);
  }

  #[tokio::test]
  async fn empty_candidates_fail_without_a_network_call() {
    // The endpoint is unroutable; reaching it would error differently.
    let classifier =
      LlmClassifier::new(LlmConfig::new("http://127.0.0.1:1/v1", "k", "m")).unwrap();
    let ticket = Ticket {
      ticket_id:   "TKT-1".to_string(),
      title:       "t".to_string(),
      description: "d".to_string(),
    };
    let err = classifier.classify(&ticket, &[]).await.unwrap_err();
    assert!(matches!(err, ClassifyError::NoCandidates));
  }
}
