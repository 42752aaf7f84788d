//! Message categorization.
//!
//! Every message gets exactly one `Category`:
//! 1. `Categorizer::Remote` asks a classifier backend (LLM) for a label
//! 2. The keyword heuristic decides when there is no backend, or the
//!    backend fails or answers outside the label set
//!
//! Categorization is total. Callers never see an error.

pub mod categorizer;
pub mod heuristic;
pub mod types;

pub use categorizer::{Categorizer, ClassifierBackend, LlmClassifier};
pub use heuristic::heuristic_category;
pub use types::{Category, ClassificationRequest, Decision, RemoteOutcome};
