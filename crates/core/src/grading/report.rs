#![forbid(unsafe_code)]

use crate::model::{Submission, Task};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::rubric::{score_rubric, weights};
use super::trace::evaluate_trace;

/// Rendered wherever a field is missing; never an empty string.
pub const PLACEHOLDER: &str = "—";

const BANNER: &str = "============================================";

// Verdict tiers over the 0-100 total. These are report-level cutoffs and are
// independent of the trace's weak/medium/strong split.
const VERDICT_TOP_MIN: u32 = 80;
const VERDICT_MIDDLE_MIN: u32 = 60;
const VERDICT_TOP: &str = "excellent";
const VERDICT_MIDDLE: &str = "good";
const VERDICT_BOTTOM: &str = "needs improvement";

/// Composes the learning report. Fully deterministic: identical inputs yield
/// a byte-identical string, and only stored timestamps appear (never "now").
pub fn compose_report(task: &Task, submission: &Submission) -> String {
    let card = submission.card();
    let ai = &submission.ai_disclosure;
    let trace = evaluate_trace(Some(submission));
    let rubric = score_rubric(task, submission);

    let sources: Vec<&str> = card
        .sources
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let verdict = if rubric.total_score >= VERDICT_TOP_MIN {
        VERDICT_TOP
    } else if rubric.total_score >= VERDICT_MIDDLE_MIN {
        VERDICT_MIDDLE
    } else {
        VERDICT_BOTTOM
    };

    let mut lines: Vec<String> = Vec::new();
    lines.push(BANNER.to_string());
    lines.push("        LEARNING REPORT - HYBRID MODEL".to_string());
    lines.push(BANNER.to_string());
    lines.push(String::new());
    lines.push(format!(
        "* Task: {} | {}->{}",
        task.domain,
        task.src_lang.to_uppercase(),
        task.tgt_lang.to_uppercase()
    ));
    lines.push(format!(
        "* Audience/Tone: {} / {}",
        task.audience, task.tone
    ));
    lines.push(format!(
        "* Sensitive: {}",
        if task.sensitive { "yes" } else { "no" }
    ));
    lines.push(format!("* Created: {}", format_timestamp(task.created_at_ms)));
    lines.push(format!(
        "* Submitted: {}",
        submission
            .submitted_at_ms
            .map(format_timestamp)
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    ));
    lines.push(String::new());
    lines.push(BANNER.to_string());
    lines.push("        DUAL RUBRIC ASSESSMENT 60/40".to_string());
    lines.push(BANNER.to_string());
    lines.push(String::new());
    lines.push(format!(
        "Final product quality ({} points):",
        weights::PRODUCT_MAX
    ));
    lines.push(format!(
        "  - Score: {}/{} ({}%)",
        rubric.product_score,
        weights::PRODUCT_MAX,
        rubric.product_percentage
    ));
    lines.push("  - Accuracy and terminological consistency".to_string());
    lines.push("  - Stylistic and linguistic fluency".to_string());
    lines.push("  - Cultural and audience fit".to_string());
    lines.push(String::new());
    lines.push(format!(
        "Process and reasoning quality ({} points):",
        weights::PROCESS_MAX
    ));
    lines.push(format!(
        "  - Score: {}/{} ({}%)",
        rubric.process_score,
        weights::PROCESS_MAX,
        rubric.process_percentage
    ));
    lines.push(format!("  - Trace level: {}", trace.label));
    lines.push("  - Depth of justification and analysis".to_string());
    lines.push("  - Source verification".to_string());
    lines.push("  - Ethical disclosure".to_string());
    lines.push(String::new());
    lines.push(BANNER.to_string());
    lines.push(format!("  Total: {}/100", rubric.total_score));
    lines.push(format!("  Verdict: {verdict}"));
    lines.push(BANNER.to_string());
    lines.push(String::new());
    lines.push("1) Chosen decision:".to_string());
    lines.push(text_or_placeholder(&card.chosen));
    lines.push(String::new());
    lines.push("2) Justification:".to_string());
    lines.push(text_or_placeholder(&card.justification));
    lines.push(String::new());
    lines.push("3) Rejected alternatives:".to_string());
    lines.push(format!("- {}", text_or_placeholder(&card.alt1)));
    lines.push(format!("- {}", text_or_placeholder(&card.alt2)));
    lines.push(String::new());
    lines.push("4) Verification sources:".to_string());
    if sources.is_empty() {
        lines.push(format!("- {PLACEHOLDER}"));
    } else {
        for source in &sources {
            lines.push(format!("- {source}"));
        }
    }
    lines.push(String::new());
    lines.push("5) Post-editing notes:".to_string());
    lines.push(text_or_placeholder(&card.post_edit));
    lines.push(String::new());
    lines.push("6) AI usage disclosure:".to_string());
    lines.push(format!(
        "- AI used? {}",
        if ai.used { "yes" } else { "no" }
    ));
    lines.push(format!(
        "- Assistance types: {}",
        if ai.types.is_empty() {
            PLACEHOLDER.to_string()
        } else {
            ai.types.join(", ")
        }
    ));
    lines.push(format!("- Notes: {}", text_or_placeholder(&ai.notes)));
    lines.push(String::new());
    lines.push(BANNER.to_string());
    lines.push(
        "Note: this score is automatic; the instructor may adjust it against the full rubric."
            .to_string(),
    );
    lines.push(BANNER.to_string());

    lines.join("\n")
}

/// RFC 3339 rendering of a stored epoch-millisecond timestamp.
pub fn format_timestamp(ts_ms: i64) -> String {
    let nanos = (ts_ms as i128) * 1_000_000i128;
    let dt = OffsetDateTime::from_unix_timestamp_nanos(nanos).unwrap_or(OffsetDateTime::UNIX_EPOCH);
    dt.format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

fn text_or_placeholder(value: &str) -> String {
    if value.trim().is_empty() {
        PLACEHOLDER.to_string()
    } else {
        value.to_string()
    }
}
