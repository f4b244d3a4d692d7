#![forbid(unsafe_code)]

use crate::model::{LearningReport, Submission, Task, TraceLevel};

use super::report::compose_report;
use super::trace::evaluate_trace;

/// Minimum trimmed translation length (Unicode scalars) to finalize.
pub const MIN_FINAL_TRANSLATION_CHARS: usize = 20;

pub const LABEL_READY: &str = "ready to submit";
// A single combined hint: the gate never enumerates which condition failed.
pub const LABEL_INCOMPLETE: &str =
    "complete the translation, the checklist, and the decision card";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GateStatus {
    pub ready: bool,
    pub label: &'static str,
}

/// All conditions must hold: translation long enough, trace strong, and the
/// three checklist entries confirmed.
pub fn evaluate_gate(submission: &Submission) -> GateStatus {
    let translation_ok =
        submission.final_translation.trim().chars().count() >= MIN_FINAL_TRANSLATION_CHARS;
    let trace_ok = evaluate_trace(Some(submission)).level == TraceLevel::Ok;
    let checklist_ok = submission.checklist.all_confirmed();

    let ready = translation_ok && trace_ok && checklist_ok;
    GateStatus {
        ready,
        label: if ready { LABEL_READY } else { LABEL_INCOMPLETE },
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FinalizeError {
    GateNotReady,
}

impl std::fmt::Display for FinalizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GateNotReady => write!(f, "submission is not ready: {LABEL_INCOMPLETE}"),
        }
    }
}

impl std::error::Error for FinalizeError {}

/// The one irreversible transition in a submission's lifecycle. Pure: returns
/// the updated copy, the caller persists it.
///
/// The archived report is written exactly once, from the submission as it
/// stands at this moment (so the summary shows the pre-submit state, and
/// later edits never change it). Re-finalizing keeps the existing snapshot
/// and only refreshes the submitted stamp.
pub fn finalize(
    task: &Task,
    submission: &Submission,
    now_ms: i64,
) -> Result<Submission, FinalizeError> {
    if !evaluate_gate(submission).ready {
        return Err(FinalizeError::GateNotReady);
    }

    let mut updated = submission.clone();
    if updated.learning_report.is_none() {
        let trace = evaluate_trace(Some(submission));
        updated.learning_report = Some(LearningReport {
            created_at_ms: now_ms,
            trace_level: trace.level,
            trace_label: trace.label.to_string(),
            summary: compose_report(task, submission),
        });
    }
    updated.submitted_at_ms = Some(now_ms);
    updated.updated_at_ms = now_ms;
    Ok(updated)
}
