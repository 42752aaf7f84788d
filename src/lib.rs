//! inbox-assist: Gmail triage with a model-or-keyword categorizer.

pub mod compose;
pub mod config;
pub mod error;
pub mod gmail;
pub mod llm;
pub mod mail;
pub mod reader;
pub mod reply;
pub mod sender;
pub mod triage;
