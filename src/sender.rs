//! Sending new mail and threaded replies through a `Mailbox`.

use std::sync::Arc;

use tracing::info;

use crate::compose::{OutgoingMail, ReplyHeaders, SkippedAttachment, compose, reply_subject};
use crate::error::{GmailError, Result};
use crate::gmail::Mailbox;
use crate::mail::get_header;

/// Result of a successful send.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub id: String,
    pub thread_id: Option<String>,
    /// Attachments that were left out because they could not be read.
    pub skipped: Vec<SkippedAttachment>,
}

pub struct MailSender {
    mailbox: Arc<dyn Mailbox>,
}

impl MailSender {
    pub fn new(mailbox: Arc<dyn Mailbox>) -> Self {
        Self { mailbox }
    }

    /// Compose and send a new message from the authenticated account.
    pub async fn send(&self, mail: &OutgoingMail) -> Result<SendOutcome> {
        let from = self.mailbox.profile().await?.email_address;
        let composed = compose(&from, mail, &ReplyHeaders::default())?;
        let sent = self.mailbox.send_raw(&composed.raw, None).await?;

        info!(id = %sent.id, recipients = mail.recipients().len(), "Sent message");
        Ok(SendOutcome {
            id: sent.id,
            thread_id: sent.thread_id,
            skipped: composed.skipped,
        })
    }

    /// Reply to the sender of `original_id` in the same thread.
    pub async fn reply(&self, original_id: &str, text: &str) -> Result<SendOutcome> {
        self.send_reply(original_id, None, text).await
    }

    /// Reply in the thread of `original_id`, addressed to `address`.
    pub async fn reply_to_address(
        &self,
        original_id: &str,
        address: &str,
        text: &str,
    ) -> Result<SendOutcome> {
        if address.trim().is_empty() {
            return Err(GmailError::InvalidArgument("reply address is empty".into()).into());
        }
        self.send_reply(original_id, Some(address), text).await
    }

    async fn send_reply(
        &self,
        original_id: &str,
        address: Option<&str>,
        text: &str,
    ) -> Result<SendOutcome> {
        let original = self.mailbox.get_message(original_id).await?;
        let headers = original.headers();

        let to = match address {
            Some(address) => address.to_string(),
            None => get_header(headers, "From").unwrap_or_default().to_string(),
        };
        let mail = OutgoingMail::new(
            vec![to],
            reply_subject(get_header(headers, "Subject").unwrap_or_default()),
            text,
        );
        let reply = ReplyHeaders {
            message_id: get_header(headers, "Message-ID").map(str::to_string),
        };

        let from = self.mailbox.profile().await?.email_address;
        let composed = compose(&from, &mail, &reply)?;
        let sent = self
            .mailbox
            .send_raw(&composed.raw, original.thread_id.as_deref())
            .await?;

        info!(id = %sent.id, original = %original_id, "Sent reply");
        Ok(SendOutcome {
            id: sent.id,
            thread_id: sent.thread_id,
            skipped: composed.skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE;

    use crate::error::{ComposeError, Error};
    use crate::mail::payload::{GmailMessage, MessagePayload, MessageRef, Profile, SentMessage};
    use crate::mail::Header;

    /// Mailbox holding one message and recording every send.
    struct RecordingMailbox {
        original: GmailMessage,
        sent: Mutex<Vec<(String, Option<String>)>>,
    }

    impl RecordingMailbox {
        fn new(headers: Vec<Header>) -> Self {
            Self {
                original: GmailMessage {
                    id: "orig".into(),
                    thread_id: Some("thread-1".into()),
                    snippet: None,
                    label_ids: vec![],
                    payload: Some(MessagePayload {
                        mime_type: "text/plain".into(),
                        headers,
                        ..Default::default()
                    }),
                },
                sent: Mutex::new(Vec::new()),
            }
        }

        fn last_sent(&self) -> (String, Option<String>) {
            let sent = self.sent.lock().unwrap();
            let (raw, thread) = sent.last().cloned().unwrap();
            let text = String::from_utf8(URL_SAFE.decode(raw).unwrap()).unwrap();
            (text, thread)
        }
    }

    #[async_trait]
    impl Mailbox for RecordingMailbox {
        async fn list_message_ids(&self, _q: &str, _max: usize) -> std::result::Result<Vec<MessageRef>, GmailError> {
            Ok(vec![])
        }

        async fn get_message(&self, id: &str) -> std::result::Result<GmailMessage, GmailError> {
            if id == self.original.id {
                Ok(self.original.clone())
            } else {
                Err(GmailError::Api {
                    operation: "get".into(),
                    status: 404,
                    body: "not found".into(),
                })
            }
        }

        async fn mark_as_read(&self, _id: &str) -> std::result::Result<(), GmailError> {
            Ok(())
        }

        async fn profile(&self) -> std::result::Result<Profile, GmailError> {
            Ok(Profile {
                email_address: "me@example.com".into(),
            })
        }

        async fn send_raw(&self, raw: &str, thread_id: Option<&str>) -> std::result::Result<SentMessage, GmailError> {
            self.sent
                .lock()
                .unwrap()
                .push((raw.to_string(), thread_id.map(str::to_string)));
            Ok(SentMessage {
                id: "sent-1".into(),
                thread_id: thread_id.map(str::to_string),
            })
        }
    }

    fn original_headers() -> Vec<Header> {
        vec![
            Header::new("From", "Alice <alice@example.com>"),
            Header::new("Subject", "Lunch on Friday"),
            Header::new("Message-ID", "<abc123@mail.example.com>"),
        ]
    }

    #[tokio::test]
    async fn reply_threads_to_original_sender() {
        let mailbox = Arc::new(RecordingMailbox::new(original_headers()));
        let sender = MailSender::new(mailbox.clone());

        let outcome = sender.reply("orig", "Friday works for me.").await.unwrap();
        assert_eq!(outcome.id, "sent-1");

        let (text, thread) = mailbox.last_sent();
        assert_eq!(thread.as_deref(), Some("thread-1"));
        assert!(text.contains("alice@example.com"));
        assert!(text.contains("Subject: Re: Lunch on Friday"));
        assert!(text.contains("In-Reply-To: <abc123@mail.example.com>"));
        assert!(text.contains("References: <abc123@mail.example.com>"));
        assert!(text.contains("From: me@example.com"));
    }

    #[tokio::test]
    async fn reply_keeps_existing_re_prefix() {
        let mailbox = Arc::new(RecordingMailbox::new(vec![
            Header::new("From", "bob@example.com"),
            Header::new("Subject", "RE: Budget"),
        ]));
        let sender = MailSender::new(mailbox.clone());

        sender.reply("orig", "Noted.").await.unwrap();
        let (text, _) = mailbox.last_sent();
        assert!(text.contains("Subject: RE: Budget"));
        assert!(!text.contains("In-Reply-To"));
    }

    #[tokio::test]
    async fn reply_to_message_without_subject_sends_none() {
        let mailbox = Arc::new(RecordingMailbox::new(vec![Header::new(
            "From",
            "bob@example.com",
        )]));
        let sender = MailSender::new(mailbox.clone());

        sender.reply("orig", "Got it.").await.unwrap();
        let (text, _) = mailbox.last_sent();
        assert!(!text.contains("Subject:"));
        assert!(text.contains("Got it."));
    }

    #[tokio::test]
    async fn reply_to_address_overrides_recipient() {
        let mailbox = Arc::new(RecordingMailbox::new(original_headers()));
        let sender = MailSender::new(mailbox.clone());

        sender
            .reply_to_address("orig", "carol@example.com", "Looping in Carol.")
            .await
            .unwrap();
        let (text, thread) = mailbox.last_sent();
        assert!(text.contains("To: carol@example.com"));
        assert!(!text.contains("To: Alice"));
        assert_eq!(thread.as_deref(), Some("thread-1"));
    }

    #[tokio::test]
    async fn reply_to_blank_address_is_rejected() {
        let mailbox = Arc::new(RecordingMailbox::new(original_headers()));
        let sender = MailSender::new(mailbox.clone());

        let err = sender.reply_to_address("orig", "  ", "x").await.unwrap_err();
        assert!(matches!(err, Error::Gmail(GmailError::InvalidArgument(_))));
        assert!(mailbox.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reply_without_from_header_has_no_recipient() {
        let mailbox = Arc::new(RecordingMailbox::new(vec![Header::new("Subject", "Hi")]));
        let sender = MailSender::new(mailbox);

        let err = sender.reply("orig", "x").await.unwrap_err();
        assert!(matches!(err, Error::Compose(ComposeError::NoRecipients)));
    }

    #[tokio::test]
    async fn reply_to_unknown_message_surfaces_gmail_error() {
        let mailbox = Arc::new(RecordingMailbox::new(original_headers()));
        let sender = MailSender::new(mailbox);

        let err = sender.reply("missing", "x").await.unwrap_err();
        assert!(matches!(err, Error::Gmail(GmailError::Api { status: 404, .. })));
    }

    #[tokio::test]
    async fn send_reports_skipped_attachments() {
        let mailbox = Arc::new(RecordingMailbox::new(vec![]));
        let sender = MailSender::new(mailbox.clone());

        let mail = OutgoingMail::new(vec!["dave@example.com".into()], "Docs", "Here you go")
            .with_attachment("/definitely/not/here.pdf");
        let outcome = sender.send(&mail).await.unwrap();

        assert_eq!(outcome.skipped.len(), 1);
        let (text, thread) = mailbox.last_sent();
        assert!(thread.is_none());
        assert!(text.contains("To: dave@example.com"));
    }
}
