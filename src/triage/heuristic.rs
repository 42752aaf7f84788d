//! Keyword heuristic used when no remote classifier is usable.
//!
//! Lists are checked in order (urgent, then spam, then work) and the first list with
//! any keyword present in the lowercased `from\nsubject\nbody` text decides.
//! Nothing matching means personal.
//!
//! `deadline` sits in both the urgent and work lists. Urgent is checked
//! first, so any text containing it resolves to urgent.

use tracing::debug;

use crate::triage::types::Category;

const URGENT_KEYWORDS: &[&str] = &[
    "urgent",
    "asap",
    "immediately",
    "deadline",
    "overdue",
    "action required",
];

const SPAM_KEYWORDS: &[&str] = &[
    "unsubscribe",
    "winner",
    "prize",
    "lottery",
    "free",
    "buy now",
    "limited offer",
    "click here",
];

const WORK_KEYWORDS: &[&str] = &[
    "meeting",
    "invoice",
    "project",
    "deadline",
    "contract",
    "interview",
    "hr",
    "client",
    "report",
];

/// A keyword list that maps to one category.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub category: Category,
    pub keywords: &'static [&'static str],
}

impl KeywordRule {
    /// First keyword of this rule found in `text`, if any.
    fn first_match(&self, text: &str) -> Option<&'static str> {
        self.keywords.iter().copied().find(|k| text.contains(k))
    }
}

/// Rules in evaluation order.
pub const KEYWORD_RULES: [KeywordRule; 3] = [
    KeywordRule {
        category: Category::Urgent,
        keywords: URGENT_KEYWORDS,
    },
    KeywordRule {
        category: Category::Spam,
        keywords: SPAM_KEYWORDS,
    },
    KeywordRule {
        category: Category::Work,
        keywords: WORK_KEYWORDS,
    },
];

/// Categorize by keyword membership. The recipient is not consulted.
pub fn heuristic_category(from_addr: &str, subject: &str, body: &str) -> Category {
    let text = format!("{from_addr}\n{subject}\n{body}").to_lowercase();

    for rule in &KEYWORD_RULES {
        if let Some(keyword) = rule.first_match(&text) {
            debug!(
                category = rule.category.label(),
                keyword, "Heuristic keyword matched"
            );
            return rule.category;
        }
    }

    Category::Personal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_empty_is_personal() {
        assert_eq!(heuristic_category("", "", ""), Category::Personal);
    }

    #[test]
    fn plain_chat_is_personal() {
        assert_eq!(
            heuristic_category("mom@family.net", "Sunday lunch", "See you at noon!"),
            Category::Personal
        );
    }

    #[test]
    fn deadline_alone_is_urgent() {
        assert_eq!(
            heuristic_category("", "", "the deadline"),
            Category::Urgent
        );
    }

    // `deadline` is listed under both urgent and work; urgent is checked first.
    // This pins that order so a reshuffle of the lists shows up here.
    #[test]
    fn deadline_tie_break_prefers_urgent_over_work() {
        assert_eq!(
            heuristic_category("boss@co.com", "Re: deadline", "please send the report"),
            Category::Urgent
        );
    }

    #[test]
    fn spam_checked_before_work() {
        assert_eq!(
            heuristic_category("", "", "free snacks at the meeting"),
            Category::Spam
        );
    }

    #[test]
    fn urgent_checked_before_spam() {
        assert_eq!(
            heuristic_category("", "Winner!", "claim your prize ASAP"),
            Category::Urgent
        );
    }

    #[test]
    fn work_keywords_match() {
        assert_eq!(
            heuristic_category("pm@corp.io", "Project sync", "Agenda attached"),
            Category::Work
        );
    }

    #[test]
    fn match_is_case_insensitive() {
        assert_eq!(
            heuristic_category("", "ACTION REQUIRED", ""),
            Category::Urgent
        );
        assert_eq!(heuristic_category("", "", "Click Here"), Category::Spam);
    }

    #[test]
    fn sender_address_participates() {
        assert_eq!(
            heuristic_category("lottery@prizes.example", "hello", "hi"),
            Category::Spam
        );
    }

    #[test]
    fn keywords_match_as_substrings() {
        // "hr" inside "three" counts, same as the plain membership test.
        assert_eq!(heuristic_category("", "", "three cats"), Category::Work);
    }

    #[test]
    fn multi_word_keyword_needs_exact_phrase() {
        assert_eq!(heuristic_category("", "", "buy it now"), Category::Personal);
        assert_eq!(heuristic_category("", "", "Buy now!"), Category::Spam);
    }
}
