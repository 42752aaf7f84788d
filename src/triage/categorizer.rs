//! Categorizer: remote classifier with a keyword fallback.
//!
//! Flow:
//! 1. Remote backend (only if one was configured and built) → normalized label
//! 2. Keyword heuristic → always produces a category
//!
//! `classify` never returns an error. A remote failure, an out-of-vocabulary
//! answer, or a missing backend all land on the heuristic.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::llm::{ChatMessage, CompletionRequest, LlmConfig, LlmProvider, create_provider};
use crate::triage::heuristic::heuristic_category;
use crate::triage::types::{Category, ClassificationRequest, Decision, RemoteOutcome};

/// Bodies longer than this many characters are cut before dispatch.
pub const MAX_BODY_CHARS: usize = 5000;

/// Appended to a body that was cut.
pub const TRUNCATION_MARKER: &str = "\n...(truncated)...";

/// Single-token answers only; keep it deterministic.
const CLASSIFY_TEMPERATURE: f32 = 0.0;
const CLASSIFY_MAX_TOKENS: u32 = 8;

/// A remote classifier: four named fields in, one raw string out.
#[async_trait]
pub trait ClassifierBackend: Send + Sync {
    async fn classify(&self, request: &ClassificationRequest) -> Result<String, LlmError>;
}

/// `ClassifierBackend` backed by a chat-completion model.
pub struct LlmClassifier {
    llm: Arc<dyn LlmProvider>,
}

impl LlmClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ClassifierBackend for LlmClassifier {
    async fn classify(&self, request: &ClassificationRequest) -> Result<String, LlmError> {
        let completion = CompletionRequest::new(vec![
            ChatMessage::system(build_classify_system_prompt()),
            ChatMessage::user(build_classify_user_prompt(request)),
        ])
        .with_temperature(CLASSIFY_TEMPERATURE)
        .with_max_tokens(CLASSIFY_MAX_TOKENS);

        let response = self.llm.complete(completion).await?;
        Ok(response.content)
    }
}

/// Picks one `Category` per message.
pub enum Categorizer {
    /// Ask the backend first, fall back to keywords.
    Remote { backend: Arc<dyn ClassifierBackend> },
    /// Keywords only.
    Heuristic,
}

impl Categorizer {
    pub fn heuristic() -> Self {
        Categorizer::Heuristic
    }

    pub fn remote(backend: Arc<dyn ClassifierBackend>) -> Self {
        Categorizer::Remote { backend }
    }

    /// Build from optional LLM settings. A missing key or a provider that
    /// fails to build both yield the heuristic variant.
    pub fn from_config(config: Option<&LlmConfig>) -> Self {
        let Some(config) = config else {
            debug!("No LLM credentials configured, using keyword categorizer");
            return Categorizer::Heuristic;
        };

        match create_provider(config) {
            Ok(llm) => Categorizer::Remote {
                backend: Arc::new(LlmClassifier::new(llm)),
            },
            Err(e) => {
                warn!(error = %e, "LLM classifier unavailable, using keyword categorizer");
                Categorizer::Heuristic
            }
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Categorizer::Remote { .. })
    }

    /// Categorize a message. Always succeeds.
    pub async fn classify(
        &self,
        from_addr: &str,
        to_addr: &str,
        subject: &str,
        body: &str,
    ) -> Category {
        self.classify_with_decision(from_addr, to_addr, subject, body)
            .await
            .0
    }

    /// Same as `classify`, also reporting which path decided.
    pub async fn classify_with_decision(
        &self,
        from_addr: &str,
        to_addr: &str,
        subject: &str,
        body: &str,
    ) -> (Category, Decision) {
        if let Categorizer::Remote { backend } = self {
            let request = ClassificationRequest {
                from_addr: from_addr.to_string(),
                to_addr: to_addr.to_string(),
                subject: subject.to_string(),
                body: truncate_body(body),
            };

            match remote_outcome(backend.as_ref(), &request).await {
                RemoteOutcome::Label(category) => return (category, Decision::Remote),
                RemoteOutcome::Unusable { reason } => {
                    debug!(reason = %reason, "Remote classification unusable, using heuristic");
                }
            }
        }

        (
            heuristic_category(from_addr, subject, body),
            Decision::Heuristic,
        )
    }
}

/// Ask the backend once and normalize its answer.
async fn remote_outcome(
    backend: &dyn ClassifierBackend,
    request: &ClassificationRequest,
) -> RemoteOutcome {
    match backend.classify(request).await {
        Ok(raw) => parse_label(&raw),
        Err(e) => RemoteOutcome::Unusable {
            reason: format!("backend error: {e}"),
        },
    }
}

/// Trim and lowercase, then require an exact label.
fn parse_label(raw: &str) -> RemoteOutcome {
    let normalized = raw.trim().to_lowercase();
    match normalized.parse::<Category>() {
        Ok(category) => RemoteOutcome::Label(category),
        Err(e) => RemoteOutcome::Unusable { reason: e },
    }
}

/// Cap the body at `MAX_BODY_CHARS` characters, marking the cut.
pub fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_BODY_CHARS) {
        None => body.to_string(),
        Some((cut, _)) => format!("{}{}", &body[..cut], TRUNCATION_MARKER),
    }
}

// ── Prompt construction ─────────────────────────────────────────────

fn build_classify_system_prompt() -> String {
    let labels: Vec<&str> = Category::ALL.iter().map(|c| c.label()).collect();
    format!(
        "You are an email classifier. \
         Return EXACTLY one label from: {}. \
         No extra words, punctuation, or explanation.",
        labels.join(", ")
    )
}

fn build_classify_user_prompt(request: &ClassificationRequest) -> String {
    format!(
        "Classify this email.\n\n\
         From: {}\n\
         To: {}\n\
         Subject: {}\n\
         Body:\n{}\n",
        request.from_addr, request.to_addr, request.subject, request.body
    )
}
