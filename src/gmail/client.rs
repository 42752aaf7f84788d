//! Gmail REST client for the `Mailbox` operations.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::GmailConfig;
use crate::error::GmailError;
use crate::gmail::auth::obtain_access_token;
use crate::mail::payload::{GmailMessage, ListMessagesResponse, MessageRef, Profile, SentMessage};

/// Largest page `messages.list` will return.
const MAX_PAGE_SIZE: usize = 500;

/// Mailbox operations the reader and sender depend on.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Up to `max` message references matching a Gmail search query, newest first.
    async fn list_message_ids(&self, query: &str, max: usize) -> Result<Vec<MessageRef>, GmailError>;

    /// Full message including the payload tree.
    async fn get_message(&self, id: &str) -> Result<GmailMessage, GmailError>;

    /// Remove the `UNREAD` label.
    async fn mark_as_read(&self, id: &str) -> Result<(), GmailError>;

    /// Address of the authenticated account.
    async fn profile(&self) -> Result<Profile, GmailError>;

    /// Send an already base64url-encoded RFC 5322 message.
    async fn send_raw(&self, raw: &str, thread_id: Option<&str>) -> Result<SentMessage, GmailError>;
}

/// `Mailbox` over the Gmail v1 REST API.
pub struct GmailClient {
    client: reqwest::Client,
    base_url: String,
    token: SecretString,
}

impl GmailClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, token: SecretString) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Build the HTTP client and resolve a token from configuration.
    pub async fn connect(config: &GmailConfig) -> Result<Self, GmailError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GmailError::RequestFailed {
                operation: "connect".into(),
                reason: format!("Failed to create HTTP client: {e}"),
            })?;
        let token = obtain_access_token(&client, config).await?;
        Ok(Self::new(client, &config.api_base, token))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/gmail/v1/users/me/{}", self.base_url, path)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, GmailError> {
        let resp = request
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(|e| GmailError::RequestFailed {
                operation: operation.into(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GmailError::Api {
                operation: operation.into(),
                status: status.as_u16(),
                body,
            });
        }

        resp.json().await.map_err(|e| GmailError::InvalidResponse {
            operation: operation.into(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl Mailbox for GmailClient {
    async fn list_message_ids(&self, query: &str, max: usize) -> Result<Vec<MessageRef>, GmailError> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        while ids.len() < max {
            let page_size = (max - ids.len()).min(MAX_PAGE_SIZE).to_string();
            let mut params = vec![("q", query.to_string()), ("maxResults", page_size)];
            if let Some(token) = page_token.take() {
                params.push(("pageToken", token));
            }

            let page: ListMessagesResponse = self
                .execute("list", self.client.get(self.url("messages")).query(&params))
                .await?;

            debug!(count = page.messages.len(), query, "Listed message page");
            ids.extend(page.messages);

            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        ids.truncate(max);
        Ok(ids)
    }

    async fn get_message(&self, id: &str) -> Result<GmailMessage, GmailError> {
        let mut message: GmailMessage = self
            .execute(
                "get",
                self.client
                    .get(self.url(&format!("messages/{id}")))
                    .query(&[("format", "full")]),
            )
            .await?;
        if message.id.is_empty() {
            message.id = id.to_string();
        }
        Ok(message)
    }

    async fn mark_as_read(&self, id: &str) -> Result<(), GmailError> {
        let body = serde_json::json!({
            "removeLabelIds": ["UNREAD"],
            "addLabelIds": [],
        });
        let _: serde_json::Value = self
            .execute(
                "modify",
                self.client
                    .post(self.url(&format!("messages/{id}/modify")))
                    .json(&body),
            )
            .await?;
        Ok(())
    }

    async fn profile(&self) -> Result<Profile, GmailError> {
        self.execute("profile", self.client.get(self.url("profile")))
            .await
    }

    async fn send_raw(&self, raw: &str, thread_id: Option<&str>) -> Result<SentMessage, GmailError> {
        let mut body = serde_json::json!({ "raw": raw });
        if let Some(thread_id) = thread_id {
            body["threadId"] = serde_json::Value::String(thread_id.to_string());
        }
        self.execute(
            "send",
            self.client.post(self.url("messages/send")).json(&body),
        )
        .await
    }
}
