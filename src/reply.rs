//! Reply drafting: one prompt, two tones.

use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::error::LlmError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

/// Tone requested for a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyTone {
    ProfessionalDirect,
    ProfessionalWarm,
}

impl ReplyTone {
    /// Phrase substituted into the prompt.
    pub fn phrase(&self) -> &'static str {
        match self {
            ReplyTone::ProfessionalDirect => "professional and direct",
            ReplyTone::ProfessionalWarm => "professional but warm",
        }
    }
}

impl fmt::Display for ReplyTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.phrase())
    }
}

/// Settings for reply drafting.
#[derive(Debug, Clone)]
pub struct SuggesterConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for SuggesterConfig {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 512,
        }
    }
}

/// Drafts replies to an email with an LLM.
pub struct ReplySuggester {
    llm: Arc<dyn LlmProvider>,
    config: SuggesterConfig,
}

impl ReplySuggester {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self::with_config(llm, SuggesterConfig::default())
    }

    pub fn with_config(llm: Arc<dyn LlmProvider>, config: SuggesterConfig) -> Self {
        Self { llm, config }
    }

    /// One draft in the given tone, trimmed.
    pub async fn suggest(&self, email_text: &str, tone: ReplyTone) -> Result<String, LlmError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system("You are a helpful assistant that writes email replies."),
            ChatMessage::user(build_reply_prompt(email_text, tone)),
        ])
        .with_temperature(self.config.temperature)
        .with_max_tokens(self.config.max_tokens);

        let response = self.llm.complete(request).await?;
        let draft = response.content.trim();
        if draft.is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: self.llm.model_name().to_string(),
                reason: "empty reply draft".into(),
            });
        }

        info!(tone = %tone, chars = draft.chars().count(), "Drafted reply");
        Ok(draft.to_string())
    }

    /// A direct draft followed by a warmer one.
    pub async fn suggest_two(&self, email_text: &str) -> Result<(String, String), LlmError> {
        let direct = self.suggest(email_text, ReplyTone::ProfessionalDirect).await?;
        let warm = self.suggest(email_text, ReplyTone::ProfessionalWarm).await?;
        Ok((direct, warm))
    }
}

fn build_reply_prompt(email_text: &str, tone: ReplyTone) -> String {
    format!(
        "Write a {tone} reply to the email below.\n\
         Rules:\n\
         - Be concise (4-8 sentences)\n\
         - Sound natural and professional\n\
         - Do NOT invent facts; if something is missing, ask a short clarifying question\n\n\
         EMAIL:\n\
         {email_text}\n\n\
         REPLY:\n",
        tone = tone.phrase(),
    )
}
