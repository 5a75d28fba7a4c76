//! BANT qualification progress estimator.
//!
//! Scores how much of the fixed qualification checklist the assistant has
//! *asked about* so far. The checklist has five steps:
//!
//! | Step | Id | Asks for |
//! |------|----|----------|
//! | [`BantStep::Name`] | `name` | the visitor's name |
//! | [`BantStep::Email`] | `email` | a contact email |
//! | [`BantStep::Need`] | `need` | the problem they want solved |
//! | [`BantStep::Timeline`] | `timeline` | when they want it solved |
//! | [`BantStep::BudgetAuthority`] | `budgetAuthority` | budget and who decides |
//!
//! # Detection
//!
//! A step counts as asked when **any** assistant message:
//!
//! 1. contains a literal `?`, and
//! 2. matches at least one of the step's case-insensitive patterns.
//!
//! Keyword presence alone is noisy (the assistant mentions budgets and
//! timelines in plain commentary), so both conditions are required. User
//! messages are never scanned.
//!
//! The score is recomputed from the full transcript on every call: there
//! is no cached state and no ordering between steps.
//!
//! # Example
//!
//! ```rust
//! use leadqual_core::bant::bant_progress;
//! use leadqual_core::models::ChatMessage;
//!
//! let transcript = vec![
//!     ChatMessage::assistant("Hi there! What's your name?"),
//!     ChatMessage::user("Dana"),
//! ];
//! assert_eq!(bant_progress(&transcript), 20);
//! ```

use std::collections::BTreeSet;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use serde::Serialize;

use crate::models::{ChatMessage, HasRole, Role};

/// One item of the qualification checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BantStep {
    Name,
    Email,
    Need,
    Timeline,
    BudgetAuthority,
}

impl BantStep {
    /// All steps in canonical order.
    pub const ALL: [BantStep; 5] = [
        BantStep::Name,
        BantStep::Email,
        BantStep::Need,
        BantStep::Timeline,
        BantStep::BudgetAuthority,
    ];

    /// Stable identifier used in API payloads.
    pub fn id(self) -> &'static str {
        match self {
            BantStep::Name => "name",
            BantStep::Email => "email",
            BantStep::Need => "need",
            BantStep::Timeline => "timeline",
            BantStep::BudgetAuthority => "budgetAuthority",
        }
    }

    /// Human-readable label for progress displays.
    pub fn label(self) -> &'static str {
        match self {
            BantStep::Name => "Name",
            BantStep::Email => "Email",
            BantStep::Need => "Need",
            BantStep::Timeline => "Timeline",
            BantStep::BudgetAuthority => "Budget & Authority",
        }
    }

    /// Compiled detection patterns for this step, in match order.
    pub fn patterns(self) -> &'static [Regex] {
        let table = &*PATTERNS;
        match self {
            BantStep::Name => &table.name,
            BantStep::Email => &table.email,
            BantStep::Need => &table.need,
            BantStep::Timeline => &table.timeline,
            BantStep::BudgetAuthority => &table.budget_authority,
        }
    }

    /// Whether `text` asks about this step.
    pub fn is_asked_in(self, text: &str) -> bool {
        text.contains('?') && self.matches(text)
    }

    fn matches(self, text: &str) -> bool {
        self.patterns().iter().any(|re| re.is_match(text))
    }
}

struct PatternTable {
    name: Vec<Regex>,
    email: Vec<Regex>,
    need: Vec<Regex>,
    timeline: Vec<Regex>,
    budget_authority: Vec<Regex>,
}

// Patterns are question phrasings, not topic keywords: a remark such as
// "I'll email you a summary" must not count just because the same message
// also ends with an unrelated question.

const NAME_PATTERNS: &[&str] = &[
    r"what(?:'|’)?s\s+your\s+(?:first\s+|full\s+)?name",
    r"what\s+is\s+your\s+(?:first\s+|full\s+)?name",
    r"who\s+am\s+i\s+(?:speaking|talking|chatting)(?:\s+(?:with|to))?",
    r"(?:may|can|could)\s+i\s+(?:have|get|ask\s+for)\s+your\s+(?:first\s+|full\s+)?name",
    r"what\s+should\s+i\s+call\s+you",
    r"(?:tell\s+me|share)\s+(?:about\s+)?your\s+(?:first\s+|full\s+)?name",
    r"your\s+(?:first\s+|full\s+)?name\s*\?",
];

const EMAIL_PATTERNS: &[&str] = &[
    r"what(?:'|’)?s\s+(?:the\s+best\s+|your\s+(?:best\s+|work\s+)?)e-?mail",
    r"what\s+is\s+(?:the\s+best\s+|your\s+(?:best\s+|work\s+)?)e-?mail",
    r"what\s+e-?mail(?:\s+address)?\s+(?:should|can|could|do|would|is)",
    r"(?:share|give|provide|leave)\s+(?:me\s+|us\s+)?(?:your|an)\s+e-?mail",
    r"(?:may|can|could)\s+i\s+(?:have|get|grab|ask\s+for)\s+(?:your|an)\s+e-?mail",
    r"your\s+e-?mail(?:\s+address)?\s*\?",
    r"best\s+(?:way|address)\s+to\s+(?:reach|contact)\s+you",
    r"(?:how|where)\s+(?:can|could|should|may)\s+(?:i|we)\s+(?:reach|contact)\s+you",
];

const NEED_PATTERNS: &[&str] = &[
    r"what\s+(?:\w+\s+)?challenges?\s+(?:are|is)\s+(?:you|your\s+team)\s+(?:facing|dealing|experiencing|having|running\s+into)",
    r"what\s+(?:are\s+)?(?:your|the)\s+(?:biggest\s+|main\s+)?pain\s+points?",
    r"what\s+(?:problems?|issues?)\s+(?:are|do)\s+you",
    r"what\s+brings\s+you",
    r"what\s+are\s+you\s+(?:looking|hoping|trying)\s+to\s+(?:solve|fix|improve|achieve|accomplish)",
    r"what\s+(?:are\s+you\s+looking\s+for|do\s+you\s+need)",
    r"what\s+(?:are\s+your|is\s+your\s+(?:main|biggest))\s+(?:goals?|needs?|priority)",
];

const TIMELINE_PATTERNS: &[&str] = &[
    r"what(?:'|’)?s\s+(?:your|the)\s+(?:timeline|time\s*frame|deadline)",
    r"what\s+is\s+(?:your|the)\s+(?:timeline|time\s*frame|deadline)",
    r"(?:do|does)\s+(?:you|your\s+team)\s+have\s+a\s+(?:timeline|time\s*frame|deadline|target\s+date)",
    r"is\s+there\s+a\s+(?:timeline|time\s*frame|deadline)",
    r"how\s+soon",
    r"by\s+when",
    r"when\s+(?:are|do|would)\s+you\s+(?:looking|hoping|planning|need|want|like)",
    r"when\s+(?:is|are)\s+you(?:r)?\s+(?:team\s+)?(?:planning|aiming|targeting)",
];

const BUDGET_AUTHORITY_PATTERNS: &[&str] = &[
    r"(?:do|does)\s+(?:you|your\s+(?:team|company))\s+have\s+a\s+budget",
    r"what(?:'|’)?s\s+(?:your|the)\s+(?:budget|price\s+range)",
    r"what\s+(?:is\s+(?:your|the)\s+)?(?:budget|price\s+range)",
    r"(?:is|has)\s+(?:there\s+)?(?:a\s+)?budget\s+(?:been\s+)?(?:set|allocated|approved|in\s+place)",
    r"how\s+much\s+(?:are|do|would)\s+you\b.*\b(?:spend|invest)",
    r"(?:who(?:'|’)?s|who\s+(?:is|are)|are\s+you)\s+(?:the\s+)?(?:main\s+|final\s+|other\s+)?decision[-\s]?makers?",
    r"who\s+(?:else\s+)?(?:is|will\s+be|would\s+be)\s+involved",
    r"who\s+(?:makes|will\s+make|would\s+make)\s+the\s+(?:final\s+)?(?:decision|call)",
    r"who\s+(?:else\s+)?(?:needs\s+to|would\s+need\s+to|has\s+to|will|would|can)\s+(?:approve|sign[-\s]?off)",
    r"(?:does|will|would)\s+\w+(?:\s+else)?\s+need\s+(?:approval|sign[-\s]?off|to\s+(?:be\s+approved|sign\s+off))",
];

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){}", p)).expect("static BANT pattern must compile"))
        .collect()
}

static PATTERNS: LazyLock<PatternTable> = LazyLock::new(|| PatternTable {
    name: compile(NAME_PATTERNS),
    email: compile(EMAIL_PATTERNS),
    need: compile(NEED_PATTERNS),
    timeline: compile(TIMELINE_PATTERNS),
    budget_authority: compile(BUDGET_AUTHORITY_PATTERNS),
});

/// Result of scoring a transcript, as reported to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BantProgress {
    /// Percentage of steps asked, `0..=100`.
    pub progress: u8,
    /// The steps that were asked, in canonical order.
    pub asked: Vec<BantStep>,
}

impl BantProgress {
    pub fn from_steps(asked: BTreeSet<BantStep>) -> Self {
        Self {
            progress: percentage(asked.len()),
            asked: asked.into_iter().collect(),
        }
    }
}

fn percentage(asked: usize) -> u8 {
    let total = BantStep::ALL.len();
    ((asked.min(total) as f64 / total as f64) * 100.0).round() as u8
}

fn collect_steps(text: &str, asked: &mut BTreeSet<BantStep>) {
    if !text.contains('?') {
        return;
    }
    for step in BantStep::ALL {
        if !asked.contains(&step) && step.matches(text) {
            asked.insert(step);
        }
    }
}

/// Determine which checklist steps the assistant has asked about.
///
/// `content` extracts the rendered text of a message. If it fails for a
/// message, that message is skipped with a warning and the rest of the
/// transcript is still scored.
pub fn asked_steps<M, F>(messages: &[M], mut content: F) -> BTreeSet<BantStep>
where
    M: HasRole,
    F: FnMut(&M) -> Result<String>,
{
    let mut asked = BTreeSet::new();
    for (index, message) in messages.iter().enumerate() {
        if message.role() != Role::Assistant {
            continue;
        }
        match content(message) {
            Ok(text) => collect_steps(&text, &mut asked),
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping unreadable assistant message");
            }
        }
        if asked.len() == BantStep::ALL.len() {
            break;
        }
    }
    asked
}

/// Percentage (`0..=100`) of checklist steps the assistant has asked about.
///
/// The denominator is the fixed number of steps; the result is rounded to
/// the nearest whole percent.
pub fn bant_progress_from_assistant_questions<M, F>(messages: &[M], content: F) -> u8
where
    M: HasRole,
    F: FnMut(&M) -> Result<String>,
{
    percentage(asked_steps(messages, content).len())
}

/// Full progress report for a plain [`ChatMessage`] transcript.
pub fn bant_report(messages: &[ChatMessage]) -> BantProgress {
    BantProgress::from_steps(asked_steps(messages, |m| Ok(m.content.clone())))
}

/// Progress percentage for a plain [`ChatMessage`] transcript.
pub fn bant_progress(messages: &[ChatMessage]) -> u8 {
    bant_report(messages).progress
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    fn assistant(texts: &[&str]) -> Vec<ChatMessage> {
        texts.iter().map(|t| ChatMessage::assistant(*t)).collect()
    }

    #[test]
    fn test_empty_transcript_scores_zero() {
        let messages: Vec<ChatMessage> = Vec::new();
        let score = bant_progress_from_assistant_questions(&messages, |m| Ok(m.content.clone()));
        assert_eq!(score, 0);
    }

    #[test]
    fn test_user_only_transcript_scores_zero() {
        let messages = vec![
            ChatMessage::user("What's your name?"),
            ChatMessage::user("What's your email?"),
        ];
        assert_eq!(bant_progress(&messages), 0);
    }

    #[test]
    fn test_single_name_question() {
        let messages = assistant(&["What's your name?"]);
        assert_eq!(bant_progress(&messages), 20);
        assert_eq!(bant_report(&messages).asked, vec![BantStep::Name]);
    }

    #[test]
    fn test_question_mark_required() {
        let without = assistant(&["Tell me about your name"]);
        let with = assistant(&["Tell me about your name?"]);
        assert_eq!(bant_progress(&without), 0);
        assert_eq!(bant_progress(&with), 20);
    }

    #[test]
    fn test_user_email_question_not_counted() {
        let messages = vec![
            ChatMessage::assistant("Thanks for stopping by."),
            ChatMessage::user("What's your email?"),
        ];
        let report = bant_report(&messages);
        assert!(!report.asked.contains(&BantStep::Email));
        assert_eq!(report.progress, 0);
    }

    #[test]
    fn test_scenario_three_of_five() {
        let messages = assistant(&[
            "Hi there! What's your name?",
            "Great, thanks! What's the best email to reach you?",
            "What challenges are you facing with your current software?",
        ]);
        let report = bant_report(&messages);
        assert_eq!(
            report.asked,
            vec![BantStep::Name, BantStep::Email, BantStep::Need]
        );
        assert_eq!(report.progress, 60);
    }

    #[test]
    fn test_repeated_step_counts_once() {
        let messages = assistant(&[
            "What's your name?",
            "Sorry, who am I speaking with?",
            "Could I get your full name?",
        ]);
        assert_eq!(bant_progress(&messages), 20);
    }

    #[test]
    fn test_out_of_order_steps() {
        let messages = assistant(&[
            "Do you have a budget set aside for this?",
            "And what's your timeline for rolling it out?",
        ]);
        let report = bant_report(&messages);
        assert_eq!(
            report.asked,
            vec![BantStep::Timeline, BantStep::BudgetAuthority]
        );
        assert_eq!(report.progress, 40);
    }

    #[test]
    fn test_all_steps_asked() {
        let messages = assistant(&[
            "Who am I speaking with?",
            "What email should we send the proposal to?",
            "What brings you here today?",
            "How soon are you hoping to have this in place?",
            "Who else is involved in the decision?",
        ]);
        assert_eq!(bant_progress(&messages), 100);
    }

    #[test]
    fn test_commentary_without_question_ignored() {
        let messages = assistant(&[
            "Many teams set a budget and a timeline before they start.",
            "Great to meet you!",
        ]);
        assert_eq!(bant_progress(&messages), 0);
    }

    #[test]
    fn test_remark_plus_unrelated_question_ignored() {
        for text in [
            "I'll email you a summary after this chat. Anything else I can help with?",
            "Our plans fit any budget. Would you like to see a demo?",
            "Most teams go live before their deadline. Does that sound good?",
            "Your name is already on file. Is there anything else?",
            "We help with challenges teams are facing. Want a quick tour?",
            "Pricing needs approval from finance on your side, right? No, wait, that's our side.",
        ] {
            let report = bant_report(&assistant(&[text]));
            assert!(report.asked.is_empty(), "{:?} counted as {:?}", text, report.asked);
        }
    }

    #[test]
    fn test_question_phrasings_per_step() {
        let cases = [
            ("Could I get your full name?", BantStep::Name),
            ("Tell me about your name?", BantStep::Name),
            ("What's your email?", BantStep::Email),
            ("How can we reach you?", BantStep::Email),
            ("What are your biggest pain points right now?", BantStep::Need),
            ("Do you have a deadline in mind?", BantStep::Timeline),
            ("What's your budget for this?", BantStep::BudgetAuthority),
            ("Who else needs to approve the purchase?", BantStep::BudgetAuthority),
            ("Are you the decision maker here?", BantStep::BudgetAuthority),
        ];
        for (text, step) in cases {
            assert_eq!(bant_report(&assistant(&[text])).asked, vec![step], "{:?}", text);
        }
    }

    #[test]
    fn test_report_matches_progress_contract() {
        let messages = assistant(&[
            "Hi! What's your name?",
            "Thanks. What's your timeline?",
        ]);
        let report = bant_report(&messages);
        let score = bant_progress_from_assistant_questions(&messages, |m| Ok(m.content.clone()));
        assert_eq!(report.progress, score);
    }

    #[test]
    fn test_case_insensitive() {
        let messages = assistant(&["WHAT'S YOUR NAME?"]);
        assert_eq!(bant_progress(&messages), 20);
    }

    #[test]
    fn test_idempotent() {
        let messages = assistant(&[
            "What's your name?",
            "What's your timeline?",
        ]);
        let first = bant_progress(&messages);
        let second = bant_progress(&messages);
        assert_eq!(first, second);
        assert_eq!(first, 40);
    }

    #[test]
    fn test_failing_accessor_skips_message() {
        let messages = assistant(&["What's your name?", "What's your email?"]);
        let score = bant_progress_from_assistant_questions(&messages, |m| {
            if m.content.contains("email") {
                bail!("malformed message parts");
            }
            Ok(m.content.clone())
        });
        assert_eq!(score, 20);
    }

    #[test]
    fn test_accessor_not_called_for_user_messages() {
        let messages = vec![
            ChatMessage::user("hello"),
            ChatMessage::assistant("What's your name?"),
        ];
        let mut calls = 0;
        let score = bant_progress_from_assistant_questions(&messages, |m| {
            calls += 1;
            Ok(m.content.clone())
        });
        assert_eq!(score, 20);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_step_ids() {
        let ids: Vec<&str> = BantStep::ALL.iter().map(|s| s.id()).collect();
        assert_eq!(
            ids,
            vec!["name", "email", "need", "timeline", "budgetAuthority"]
        );
    }
}
