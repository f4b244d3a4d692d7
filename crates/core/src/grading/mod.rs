#![forbid(unsafe_code)]

//! The grading engine: pure, synchronous functions over in-memory records.
//! Callers load the task/submission pair, call in, and persist any resulting
//! state change themselves; nothing here touches the store.

mod gate;
mod report;
mod rubric;
mod trace;


pub use gate::{
    FinalizeError, GateStatus, LABEL_INCOMPLETE, LABEL_READY, MIN_FINAL_TRANSLATION_CHARS,
    evaluate_gate, finalize,
};
pub use report::{PLACEHOLDER, compose_report, format_timestamp};
pub use rubric::{RubricScore, score_rubric, weights};
pub use trace::{
    LABEL_MEDIUM, LABEL_NO_SUBMISSION, LABEL_STRONG, LABEL_WEAK, TraceStatus, evaluate_trace,
};
