#![forbid(unsafe_code)]

use crate::model::{Submission, Task, TraceLevel};

use super::trace::evaluate_trace;

/// Rubric weights and thresholds. The band and bonus cutoffs carry no stated
/// rationale in the pedagogy model; keeping them here lets them be tuned
/// without touching the algorithm shape.
pub mod weights {
    pub const PRODUCT_BASE: u32 = 42;
    pub const PRODUCT_MAX: u32 = 60;
    pub const LENGTH_RATIO_MIN: f64 = 0.7;
    pub const LENGTH_RATIO_MAX: f64 = 1.3;
    pub const LENGTH_RATIO_BONUS: u32 = 8;
    pub const CHOSEN_BONUS_OVER_CHARS: usize = 20;
    pub const CHOSEN_BONUS: u32 = 5;
    pub const POST_EDIT_BONUS_OVER_CHARS: usize = 30;
    pub const POST_EDIT_BONUS: u32 = 5;

    pub const PROCESS_MAX: u32 = 40;
    pub const TRACE_OK_POINTS: u32 = 20;
    pub const TRACE_WARN_POINTS: u32 = 12;
    pub const TRACE_BAD_POINTS: u32 = 5;
    pub const AI_DISCLOSED_BONUS: u32 = 10;
    pub const AI_NOTES_BONUS: u32 = 5;
    pub const AI_NOTES_OVER_CHARS: usize = 10;
    pub const CHECKLIST_ITEM_POINTS: u32 = 2;
}

/// The dual 60/40 score. Derived, never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RubricScore {
    pub product_score: u32,
    pub process_score: u32,
    pub total_score: u32,
    pub product_percentage: u32,
    pub process_percentage: u32,
}

pub fn score_rubric(task: &Task, submission: &Submission) -> RubricScore {
    let card = submission.card();

    let mut product = weights::PRODUCT_BASE;
    let source_chars = task.source_text.chars().count();
    let translation_chars = submission.final_translation.chars().count();
    // A zero-length source cannot happen through task creation, but must not
    // divide; treat the ratio as out of band.
    let ratio = if source_chars == 0 {
        0.0
    } else {
        translation_chars as f64 / source_chars as f64
    };
    if (weights::LENGTH_RATIO_MIN..=weights::LENGTH_RATIO_MAX).contains(&ratio) {
        product += weights::LENGTH_RATIO_BONUS;
    }
    if card.chosen.chars().count() > weights::CHOSEN_BONUS_OVER_CHARS {
        product += weights::CHOSEN_BONUS;
    }
    if card.post_edit.chars().count() > weights::POST_EDIT_BONUS_OVER_CHARS {
        product += weights::POST_EDIT_BONUS;
    }
    let product = product.min(weights::PRODUCT_MAX);

    let trace = evaluate_trace(Some(submission));
    let mut process = match trace.level {
        TraceLevel::Ok => weights::TRACE_OK_POINTS,
        TraceLevel::Warn => weights::TRACE_WARN_POINTS,
        TraceLevel::Bad => weights::TRACE_BAD_POINTS,
    };
    let ai = &submission.ai_disclosure;
    if ai.used && !ai.types.is_empty() {
        process += weights::AI_DISCLOSED_BONUS;
    }
    if ai.notes.chars().count() > weights::AI_NOTES_OVER_CHARS {
        process += weights::AI_NOTES_BONUS;
    }
    process += weights::CHECKLIST_ITEM_POINTS * submission.checklist.true_count() as u32;
    let process = process.min(weights::PROCESS_MAX);

    RubricScore {
        product_score: product,
        process_score: process,
        total_score: product + process,
        product_percentage: percentage(product, weights::PRODUCT_MAX),
        process_percentage: percentage(process, weights::PROCESS_MAX),
    }
}

fn percentage(score: u32, cap: u32) -> u32 {
    (f64::from(score) * 100.0 / f64::from(cap)).round() as u32
}
