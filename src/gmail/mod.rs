//! Gmail API collaborator: token resolution and the REST mailbox.

pub mod auth;
pub mod client;

pub use auth::obtain_access_token;
pub use client::{GmailClient, Mailbox};
