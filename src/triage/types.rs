//! Shared types for message categorization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Triage bucket for a message. Exactly one per message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Work,
    Personal,
    Spam,
    Urgent,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Work,
        Category::Personal,
        Category::Spam,
        Category::Urgent,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Work => "work",
            Category::Personal => "personal",
            Category::Spam => "spam",
            Category::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Exact label match. Callers normalize (trim, lowercase) first.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .ok_or_else(|| format!("unknown category: '{s}'"))
    }
}

/// The four fields sent to a remote classifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRequest {
    pub from_addr: String,
    pub to_addr: String,
    pub subject: String,
    pub body: String,
}

/// What the remote path produced: a usable label, or a reason to fall back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOutcome {
    Label(Category),
    Unusable { reason: String },
}

/// Which path decided a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Remote,
    Heuristic,
}
