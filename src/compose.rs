//! Outgoing message construction.
//!
//! Flow:
//! 1. Normalize recipients (trim, drop blanks) and parse them as mailboxes
//! 2. Load attachments, skipping files that cannot be read
//! 3. Build the RFC 5322 message with lettre
//! 4. Base64url-encode the bytes for `messages/send`

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE;
use lettre::Message;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use tracing::{debug, warn};

use crate::error::ComposeError;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";
const REPLY_PREFIX: &str = "Re: ";

/// A message the user wants to send.
#[derive(Debug, Clone, Default)]
pub struct OutgoingMail {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<PathBuf>,
}

impl OutgoingMail {
    pub fn new(to: Vec<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to,
            subject: subject.into(),
            body: body.into(),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachments.push(path.into());
        self
    }

    /// Trimmed, non-empty recipients.
    pub fn recipients(&self) -> Vec<&str> {
        self.to
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .collect()
    }
}

/// Threading headers for a reply.
#[derive(Debug, Clone, Default)]
pub struct ReplyHeaders {
    /// `Message-ID` of the message being answered, used for both
    /// `In-Reply-To` and `References`.
    pub message_id: Option<String>,
}

/// An attachment that was left out of the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedAttachment {
    pub path: PathBuf,
    pub reason: String,
}

/// Encoded message ready for the send endpoint.
#[derive(Debug, Clone)]
pub struct ComposedMessage {
    /// Base64url-encoded RFC 5322 bytes.
    pub raw: String,
    pub attached: Vec<PathBuf>,
    pub skipped: Vec<SkippedAttachment>,
}

/// Build and encode a message from `from` to the recipients of `mail`.
pub fn compose(
    from: &str,
    mail: &OutgoingMail,
    reply: &ReplyHeaders,
) -> Result<ComposedMessage, ComposeError> {
    let recipients = mail.recipients();
    if recipients.is_empty() {
        return Err(ComposeError::NoRecipients);
    }

    let mut builder = Message::builder().from(parse_mailbox("from", from)?);
    if !mail.subject.is_empty() {
        builder = builder.subject(mail.subject.as_str());
    }
    for recipient in recipients {
        builder = builder.to(parse_mailbox("to", recipient)?);
    }
    if let Some(message_id) = reply.message_id.as_deref()
        && !message_id.trim().is_empty()
    {
        builder = builder
            .in_reply_to(message_id.trim().to_string())
            .references(message_id.trim().to_string());
    }

    let mut attached = Vec::new();
    let mut skipped = Vec::new();
    let mut parts = Vec::new();
    for path in &mail.attachments {
        if path.as_os_str().to_string_lossy().trim().is_empty() {
            continue;
        }
        match load_attachment(path) {
            Ok(part) => {
                debug!(path = %path.display(), "Attached file");
                parts.push(part);
                attached.push(path.clone());
            }
            Err(reason) => {
                warn!(path = %path.display(), reason = %reason, "Skipping attachment");
                skipped.push(SkippedAttachment {
                    path: path.clone(),
                    reason,
                });
            }
        }
    }

    let text = SinglePart::plain(mail.body.clone());
    let built = if parts.is_empty() {
        builder.singlepart(text)
    } else {
        let multipart = parts
            .into_iter()
            .fold(MultiPart::mixed().singlepart(text), |mp, part| {
                mp.singlepart(part)
            });
        builder.multipart(multipart)
    };
    let message = built.map_err(|e| ComposeError::Build(e.to_string()))?;

    Ok(ComposedMessage {
        raw: URL_SAFE.encode(message.formatted()),
        attached,
        skipped,
    })
}

/// Subject for a reply. `Re: ` is added unless the subject already starts
/// with `re:` in any case. An empty subject stays empty.
pub fn reply_subject(original: &str) -> String {
    let trimmed = original.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let already = trimmed
        .get(..3)
        .is_some_and(|head| head.eq_ignore_ascii_case("re:"));
    if already {
        trimmed.to_string()
    } else {
        format!("{REPLY_PREFIX}{trimmed}")
    }
}

fn parse_mailbox(field: &str, value: &str) -> Result<Mailbox, ComposeError> {
    value
        .trim()
        .parse::<Mailbox>()
        .map_err(|e| ComposeError::InvalidAddress {
            field: field.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn load_attachment(path: &Path) -> Result<SinglePart, String> {
    if !path.is_file() {
        return Err("file not found".into());
    }
    let content = std::fs::read(path).map_err(|e| e.to_string())?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".into());
    let mime = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_CONTENT_TYPE);
    let content_type = ContentType::parse(mime)
        .or_else(|_| ContentType::parse(FALLBACK_CONTENT_TYPE))
        .map_err(|e| e.to_string())?;

    Ok(Attachment::new(filename).body(content, content_type))
}
