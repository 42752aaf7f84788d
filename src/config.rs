//! Configuration types, built from environment variables.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};

pub const DEFAULT_GMAIL_API_BASE: &str = "https://gmail.googleapis.com";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// How the Gmail client gets its bearer token.
#[derive(Debug, Clone)]
pub enum GmailAuth {
    /// A ready-made access token (`GMAIL_ACCESS_TOKEN`).
    AccessToken(SecretString),
    /// Exchange a stored refresh token once at startup.
    RefreshToken {
        client_id: String,
        client_secret: SecretString,
        refresh_token: SecretString,
    },
}

/// Gmail API settings.
#[derive(Debug, Clone)]
pub struct GmailConfig {
    pub auth: GmailAuth,
    pub api_base: String,
    pub token_url: String,
    pub timeout: Duration,
}

/// Everything the assistant needs to run.
#[derive(Debug, Clone)]
pub struct AssistConfig {
    pub gmail: GmailConfig,
    /// `None` when no model credential is set. The keyword categorizer is
    /// used and reply drafting is unavailable.
    pub llm: Option<LlmConfig>,
}

impl AssistConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key → value lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let timeout = match get("INBOX_ASSIST_HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "INBOX_ASSIST_HTTP_TIMEOUT_SECS".into(),
                message: format!("expected whole seconds, got '{raw}'"),
            })?),
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let auth = if let Some(token) = get("GMAIL_ACCESS_TOKEN") {
            GmailAuth::AccessToken(SecretString::from(token))
        } else {
            match (
                get("GMAIL_CLIENT_ID"),
                get("GMAIL_CLIENT_SECRET"),
                get("GMAIL_REFRESH_TOKEN"),
            ) {
                (Some(client_id), Some(secret), Some(refresh)) => GmailAuth::RefreshToken {
                    client_id,
                    client_secret: SecretString::from(secret),
                    refresh_token: SecretString::from(refresh),
                },
                _ => {
                    return Err(ConfigError::MissingRequired {
                        key: "GMAIL_ACCESS_TOKEN".into(),
                        hint: "Set it, or set GMAIL_CLIENT_ID, GMAIL_CLIENT_SECRET and \
                               GMAIL_REFRESH_TOKEN together."
                            .into(),
                    });
                }
            }
        };

        let gmail = GmailConfig {
            auth,
            api_base: get("GMAIL_API_BASE").unwrap_or_else(|| DEFAULT_GMAIL_API_BASE.to_string()),
            token_url: get("GMAIL_TOKEN_URL").unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            timeout,
        };

        let backend = match get("INBOX_ASSIST_LLM_BACKEND").as_deref() {
            None | Some("openai") => LlmBackend::OpenAi,
            Some("anthropic") => LlmBackend::Anthropic,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "INBOX_ASSIST_LLM_BACKEND".into(),
                    message: format!("expected 'openai' or 'anthropic', got '{other}'"),
                });
            }
        };

        let (key_var, model_var) = match backend {
            LlmBackend::OpenAi => ("OPENAI_API_KEY", "OPENAI_MODEL"),
            LlmBackend::Anthropic => ("ANTHROPIC_API_KEY", "ANTHROPIC_MODEL"),
        };

        let llm = get(key_var).map(|api_key| LlmConfig {
            backend,
            api_key: SecretString::from(api_key),
            model: get("INBOX_ASSIST_MODEL")
                .or_else(|| get(model_var))
                .unwrap_or_else(|| backend.default_model().to_string()),
        });

        Ok(Self { gmail, llm })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn access_token_without_llm_key() {
        let config = AssistConfig::from_lookup(lookup(&[("GMAIL_ACCESS_TOKEN", "ya29.x")])).unwrap();
        match &config.gmail.auth {
            GmailAuth::AccessToken(t) => assert_eq!(t.expose_secret(), "ya29.x"),
            other => panic!("Expected AccessToken, got {:?}", other),
        }
        assert_eq!(config.gmail.api_base, DEFAULT_GMAIL_API_BASE);
        assert_eq!(config.gmail.timeout, Duration::from_secs(30));
        assert!(config.llm.is_none());
    }

    #[test]
    fn refresh_token_triple() {
        let config = AssistConfig::from_lookup(lookup(&[
            ("GMAIL_CLIENT_ID", "cid"),
            ("GMAIL_CLIENT_SECRET", "secret"),
            ("GMAIL_REFRESH_TOKEN", "1//refresh"),
        ]))
        .unwrap();
        assert!(matches!(config.gmail.auth, GmailAuth::RefreshToken { .. }));
    }

    #[test]
    fn missing_gmail_credentials_is_an_error() {
        let err = AssistConfig::from_lookup(lookup(&[("GMAIL_CLIENT_ID", "cid")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { .. }));
    }

    #[test]
    fn blank_openai_key_counts_as_unset() {
        let config = AssistConfig::from_lookup(lookup(&[
            ("GMAIL_ACCESS_TOKEN", "t"),
            ("OPENAI_API_KEY", "   "),
        ]))
        .unwrap();
        assert!(config.llm.is_none());
    }

    #[test]
    fn openai_key_enables_llm_with_defaults() {
        let config = AssistConfig::from_lookup(lookup(&[
            ("GMAIL_ACCESS_TOKEN", "t"),
            ("OPENAI_API_KEY", "sk-1"),
        ]))
        .unwrap();
        let llm = config.llm.unwrap();
        assert_eq!(llm.backend, LlmBackend::OpenAi);
        assert_eq!(llm.model, "gpt-4o-mini");
    }

    #[test]
    fn anthropic_backend_reads_its_own_key() {
        let config = AssistConfig::from_lookup(lookup(&[
            ("GMAIL_ACCESS_TOKEN", "t"),
            ("INBOX_ASSIST_LLM_BACKEND", "anthropic"),
            ("OPENAI_API_KEY", "sk-ignored"),
            ("ANTHROPIC_API_KEY", "ant-1"),
            ("INBOX_ASSIST_MODEL", "claude-custom"),
        ]))
        .unwrap();
        let llm = config.llm.unwrap();
        assert_eq!(llm.backend, LlmBackend::Anthropic);
        assert_eq!(llm.api_key.expose_secret(), "ant-1");
        assert_eq!(llm.model, "claude-custom");
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let err = AssistConfig::from_lookup(lookup(&[
            ("GMAIL_ACCESS_TOKEN", "t"),
            ("INBOX_ASSIST_LLM_BACKEND", "llama"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err = AssistConfig::from_lookup(lookup(&[
            ("GMAIL_ACCESS_TOKEN", "t"),
            ("INBOX_ASSIST_HTTP_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
