#![forbid(unsafe_code)]

use crate::model::{Submission, TraceLevel};

// Per-criterion thresholds, in trimmed Unicode scalars.
pub const MIN_CHOSEN_CHARS: usize = 3;
pub const MIN_JUSTIFICATION_CHARS: usize = 15;
pub const MIN_ALTERNATIVE_CHARS: usize = 8;
pub const MIN_SOURCES_CHARS: usize = 8;
pub const MIN_POST_EDIT_CHARS: usize = 12;

// A trace is weak up to this many satisfied criteria.
pub const WEAK_MAX_SATISFIED: usize = 2;

pub const LABEL_NO_SUBMISSION: &str = "no submission yet";
pub const LABEL_WEAK: &str = "weak trace";
pub const LABEL_MEDIUM: &str = "medium trace";
pub const LABEL_STRONG: &str = "strong trace";

const DETAIL_NO_SUBMISSION: &str = "write and save a translation, then fill the decision card";

const MARK_SATISFIED: &str = "[x]";
const MARK_UNSATISFIED: &str = "[ ]";

/// Qualitative completeness of the decision card. Derived, never persisted;
/// callers recompute on every view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceStatus {
    pub level: TraceLevel,
    pub label: &'static str,
    pub details: Vec<String>,
}

pub fn evaluate_trace(submission: Option<&Submission>) -> TraceStatus {
    let Some(submission) = submission else {
        return TraceStatus {
            level: TraceLevel::Bad,
            label: LABEL_NO_SUBMISSION,
            details: vec![DETAIL_NO_SUBMISSION.to_string()],
        };
    };

    let card = submission.card();
    let criteria: [(&str, bool); 5] = [
        (
            "chosen decision",
            trimmed_chars(&card.chosen) >= MIN_CHOSEN_CHARS,
        ),
        (
            "justification",
            trimmed_chars(&card.justification) >= MIN_JUSTIFICATION_CHARS,
        ),
        (
            "two rejected alternatives",
            trimmed_chars(&card.alt1) >= MIN_ALTERNATIVE_CHARS
                && trimmed_chars(&card.alt2) >= MIN_ALTERNATIVE_CHARS,
        ),
        (
            "verification sources",
            trimmed_chars(&card.sources) >= MIN_SOURCES_CHARS,
        ),
        (
            "post-editing notes",
            trimmed_chars(&card.post_edit) >= MIN_POST_EDIT_CHARS,
        ),
    ];

    let satisfied = criteria.iter().filter(|(_, met)| *met).count();
    let (level, label) = if satisfied <= WEAK_MAX_SATISFIED {
        (TraceLevel::Bad, LABEL_WEAK)
    } else if satisfied == criteria.len() {
        (TraceLevel::Ok, LABEL_STRONG)
    } else {
        (TraceLevel::Warn, LABEL_MEDIUM)
    };

    TraceStatus {
        level,
        label,
        details: criteria
            .iter()
            .map(|(name, met)| {
                let mark = if *met { MARK_SATISFIED } else { MARK_UNSATISFIED };
                format!("{mark} {name}")
            })
            .collect(),
    }
}

fn trimmed_chars(value: &str) -> usize {
    value.trim().chars().count()
}
