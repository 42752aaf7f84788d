//! Message shapes and plain-text extraction.

pub mod extract;
pub mod payload;

pub use extract::{decode_body_data, extract_plain_text};
pub use payload::{GmailMessage, Header, MessagePartBody, MessagePayload, get_header};
