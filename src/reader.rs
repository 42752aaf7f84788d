//! Inbox reader: list, fetch, extract, categorize, optionally mark read.
//!
//! For each listed id, in order:
//! 1. `get_message()` (format=full). A failed fetch is logged and skipped
//! 2. `extract_plain_text()` on the payload tree
//! 3. `Categorizer::classify()` on From/To/Subject/body
//! 4. `mark_as_read()` when requested and the message carries `UNREAD`
//!
//! Messages are handled one at a time; indices count only messages that
//! were actually fetched.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{GmailError, Result};
use crate::gmail::Mailbox;
use crate::mail::{GmailMessage, extract_plain_text, get_header};
use crate::triage::{Category, Categorizer};

const INBOX_QUERY: &str = "in:inbox";
const RULE_WIDTH: usize = 60;

/// One fetched and categorized message.
#[derive(Debug, Clone)]
pub struct TriagedMessage {
    /// 1-based position in the listing.
    pub index: usize,
    pub id: String,
    pub thread_id: Option<String>,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub category: Category,
    pub body: String,
    pub snippet: String,
    /// RFC 5322 `Message-ID`, used to thread replies.
    pub message_id_header: Option<String>,
}

impl TriagedMessage {
    /// Text to draft a reply from: the body, else the snippet, else the
    /// sender and subject.
    pub fn reply_context(&self) -> String {
        if !self.body.trim().is_empty() {
            return self.body.clone();
        }
        if !self.snippet.trim().is_empty() {
            return self.snippet.clone();
        }
        format!("From: {}\nSubject: {}", self.from, self.subject)
    }
}

impl fmt::Display for TriagedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}]", self.index)?;
        writeln!(f, "From: {}", self.from)?;
        writeln!(f, "To: {}", self.to)?;
        writeln!(f, "Subject: {}", self.subject)?;
        writeln!(f, "Category: {}", self.category)?;
        writeln!(f, "Body:")?;
        let body = self.body.trim();
        if body.is_empty() {
            writeln!(f, "(no plain-text body found)")?;
        } else {
            writeln!(f, "{body}")?;
        }
        write!(f, "{}", "-".repeat(RULE_WIDTH))
    }
}

pub struct MailReader {
    mailbox: Arc<dyn Mailbox>,
    categorizer: Categorizer,
}

impl MailReader {
    pub fn new(mailbox: Arc<dyn Mailbox>, categorizer: Categorizer) -> Self {
        Self {
            mailbox,
            categorizer,
        }
    }

    /// The `n` most recent inbox messages.
    pub async fn fetch_last_n(&self, n: usize, mark_as_read: bool) -> Result<Vec<TriagedMessage>> {
        self.fetch(INBOX_QUERY, n, mark_as_read).await
    }

    /// The `n` most recent messages sent from or to `address`.
    pub async fn fetch_last_n_by_address(
        &self,
        address: &str,
        n: usize,
        mark_as_read: bool,
    ) -> Result<Vec<TriagedMessage>> {
        let address = address.trim();
        if address.is_empty() {
            return Err(GmailError::InvalidArgument("an email address is required".into()).into());
        }
        self.fetch(&address_query(address), n, mark_as_read).await
    }

    /// Fetch and categorize a single message by Gmail id. It gets index 1.
    pub async fn fetch_one(&self, id: &str) -> Result<TriagedMessage> {
        let message = self.mailbox.get_message(id).await?;
        Ok(self.triage(1, id.to_string(), &message).await)
    }

    async fn fetch(&self, query: &str, n: usize, mark_as_read: bool) -> Result<Vec<TriagedMessage>> {
        let refs = self.mailbox.list_message_ids(query, n).await?;
        info!(count = refs.len(), query, "Listed messages");

        let mut triaged = Vec::with_capacity(refs.len());
        for message_ref in refs {
            let message = match self.mailbox.get_message(&message_ref.id).await {
                Ok(m) => m,
                Err(e) => {
                    warn!(id = %message_ref.id, error = %e, "Could not fetch message, skipping");
                    continue;
                }
            };

            let entry = self.triage(triaged.len() + 1, message_ref.id, &message).await;

            if mark_as_read && message.is_unread() {
                match self.mailbox.mark_as_read(&entry.id).await {
                    Ok(()) => debug!(id = %entry.id, "Marked as read"),
                    Err(e) => warn!(id = %entry.id, error = %e, "Could not mark as read"),
                }
            }

            triaged.push(entry);
        }

        Ok(triaged)
    }

    async fn triage(&self, index: usize, id: String, message: &GmailMessage) -> TriagedMessage {
        let headers = message.headers();
        let header = |name: &str| get_header(headers, name).unwrap_or_default().to_string();

        let from = header("From");
        let to = header("To");
        let subject = header("Subject");
        let body = extract_plain_text(message.payload.as_ref());

        let (category, decision) = self
            .categorizer
            .classify_with_decision(&from, &to, &subject, &body)
            .await;
        debug!(id = %id, category = %category, decision = ?decision, "Categorized message");

        TriagedMessage {
            index,
            id,
            thread_id: message.thread_id.clone(),
            from,
            to,
            subject,
            category,
            body,
            snippet: message.snippet.clone().unwrap_or_default(),
            message_id_header: get_header(headers, "Message-ID").map(str::to_string),
        }
    }
}

/// Gmail search for messages from or to `address`.
pub fn address_query(address: &str) -> String {
    format!("(from:{address}) OR (to:{address})")
}
