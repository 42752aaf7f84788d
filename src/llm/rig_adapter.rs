//! Bridges rig's `CompletionModel` to our `LlmProvider` trait.

use async_trait::async_trait;
use rig::OneOrMany;
use rig::completion::{AssistantContent, CompletionError, CompletionModel, Message};

use crate::error::LlmError;
use crate::llm::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider, Role,
};

/// Wraps any rig completion model behind `LlmProvider`.
pub struct RigAdapter<M> {
    model: M,
    model_name: String,
}

impl<M: CompletionModel> RigAdapter<M> {
    pub fn new(model: M, model_name: &str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
        }
    }
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + Send + Sync + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let split = split_request(&request).ok_or_else(|| LlmError::RequestFailed {
            provider: self.model_name.clone(),
            reason: "request has no user or assistant message".to_string(),
        })?;

        let mut builder = self.model.completion_request(to_rig_message(split.prompt));
        if let Some(preamble) = split.preamble {
            builder = builder.preamble(preamble);
        }
        if !split.history.is_empty() {
            builder = builder.messages(split.history.into_iter().map(to_rig_message).collect());
        }
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(f64::from(temperature));
        }
        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(u64::from(max_tokens));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| map_completion_error(&self.model_name, e))?;

        let content = response_text(&response.choice);
        tracing::debug!(
            model = %self.model_name,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Completion finished"
        );

        Ok(CompletionResponse {
            content,
            input_tokens: saturating_u32(response.usage.input_tokens),
            output_tokens: saturating_u32(response.usage.output_tokens),
            finish_reason: FinishReason::Stop,
            response_id: None,
        })
    }
}

/// A request laid out the way rig wants it: system text as the preamble,
/// the last turn as the prompt, everything before it as history.
#[derive(Debug)]
struct SplitRequest<'a> {
    preamble: Option<String>,
    history: Vec<&'a ChatMessage>,
    prompt: &'a ChatMessage,
}

fn split_request(request: &CompletionRequest) -> Option<SplitRequest<'_>> {
    let mut turns: Vec<&ChatMessage> = request
        .messages
        .iter()
        .filter(|m| m.role != Role::System)
        .collect();
    let prompt = turns.pop()?;
    Some(SplitRequest {
        preamble: request.system_prompt(),
        history: turns,
        prompt,
    })
}

fn to_rig_message(message: &ChatMessage) -> Message {
    match message.role {
        Role::Assistant => Message::assistant(message.content.clone()),
        Role::User | Role::System => Message::user(message.content.clone()),
    }
}

/// Concatenated text parts of a response. Tool calls and reasoning are ignored.
fn response_text(choice: &OneOrMany<AssistantContent>) -> String {
    choice
        .iter()
        .filter_map(|content| match content {
            AssistantContent::Text(text) => Some(text.text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("")
}

fn map_completion_error(provider: &str, err: CompletionError) -> LlmError {
    match err {
        CompletionError::JsonError(e) => LlmError::Json(e),
        CompletionError::ResponseError(reason) => LlmError::InvalidResponse {
            provider: provider.to_string(),
            reason,
        },
        CompletionError::ProviderError(message) => classify_provider_message(provider, &message),
        other => LlmError::RequestFailed {
            provider: provider.to_string(),
            reason: other.to_string(),
        },
    }
}

/// rig reports non-success responses as the provider's error body, so auth
/// and rate-limit failures are recognized from the vendors' error codes.
fn classify_provider_message(provider: &str, message: &str) -> LlmError {
    let lower = message.to_ascii_lowercase();
    if ["authentication_error", "invalid_api_key", "incorrect api key", "unauthorized"]
        .iter()
        .any(|needle| lower.contains(needle))
    {
        LlmError::AuthFailed {
            provider: provider.to_string(),
        }
    } else if ["rate_limit", "too many requests"]
        .iter()
        .any(|needle| lower.contains(needle))
    {
        LlmError::RateLimited {
            provider: provider.to_string(),
            retry_after: None,
        }
    } else {
        LlmError::RequestFailed {
            provider: provider.to_string(),
            reason: message.to_string(),
        }
    }
}

fn saturating_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_moves_system_text_to_preamble() {
        let request = CompletionRequest::new(vec![
            ChatMessage::system("You sort email."),
            ChatMessage::user("first"),
            ChatMessage::assistant("ok"),
            ChatMessage::user("classify this"),
        ]);
        let split = split_request(&request).unwrap();
        assert_eq!(split.preamble.as_deref(), Some("You sort email."));
        assert_eq!(split.prompt, &ChatMessage::user("classify this"));
        assert_eq!(
            split.history,
            vec![&ChatMessage::user("first"), &ChatMessage::assistant("ok")]
        );
    }

    #[test]
    fn split_without_turns_is_none() {
        let request = CompletionRequest::new(vec![ChatMessage::system("only rules")]);
        assert!(split_request(&request).is_none());
    }

    #[test]
    fn response_text_reads_text_parts() {
        let choice = OneOrMany::one(AssistantContent::text(" work\n"));
        assert_eq!(response_text(&choice), " work\n");
    }

    #[test]
    fn provider_messages_map_to_error_kinds() {
        let auth = classify_provider_message(
            "openai",
            r#"{"error":{"message":"Incorrect API key provided","code":"invalid_api_key"}}"#,
        );
        assert!(matches!(auth, LlmError::AuthFailed { .. }));

        let limited = classify_provider_message(
            "anthropic",
            r#"{"type":"error","error":{"type":"rate_limit_error","message":"slow down"}}"#,
        );
        assert!(matches!(limited, LlmError::RateLimited { retry_after: None, .. }));

        match classify_provider_message("openai", "upstream exploded") {
            LlmError::RequestFailed { reason, .. } => assert_eq!(reason, "upstream exploded"),
            other => panic!("Expected RequestFailed, got {:?}", other),
        }
    }

    #[test]
    fn token_counts_saturate() {
        assert_eq!(saturating_u32(90), 90);
        assert_eq!(saturating_u32(u64::MAX), u32::MAX);
    }
}
