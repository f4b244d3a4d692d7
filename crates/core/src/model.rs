#![forbid(unsafe_code)]

//! Domain records for the translation exercise: a [`Task`] describes the
//! assignment, a [`Submission`] holds the learner's evolving work product.
//!
//! Every optional nested record normalizes through a single default shape
//! (`Submission::new`, `Submission::card`) so downstream evaluation never has
//! to guard against missing fields.

/// Minimum length (Unicode scalars, after trimming) for a task's source text.
pub const MIN_SOURCE_TEXT_CHARS: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskError {
    SourceTextTooShort { min_chars: usize },
}

impl std::fmt::Display for TaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceTextTooShort { min_chars } => {
                write!(f, "source text must be at least {min_chars} characters")
            }
        }
    }
}

impl std::error::Error for TaskError {}

pub fn validate_source_text(source_text: &str) -> Result<(), TaskError> {
    if source_text.trim().chars().count() < MIN_SOURCE_TEXT_CHARS {
        return Err(TaskError::SourceTextTooShort {
            min_chars: MIN_SOURCE_TEXT_CHARS,
        });
    }
    Ok(())
}

/// A translation assignment. Immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub src_lang: String,
    pub tgt_lang: String,
    pub domain: String,
    pub audience: String,
    pub tone: String,
    pub sensitive: bool,
    pub source_text: String,
    pub created_at_ms: i64,
}

/// Input shape for task creation; the store issues the id and timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTask {
    pub src_lang: String,
    pub tgt_lang: String,
    pub domain: String,
    pub audience: String,
    pub tone: String,
    pub sensitive: bool,
    pub source_text: String,
}

/// The learner's structured justification artifact.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecisionCard {
    pub chosen: String,
    pub justification: String,
    pub alt1: String,
    pub alt2: String,
    pub sources: String,
    pub post_edit: String,
    pub updated_at_ms: i64,
}

/// Review checklist. The original form also shows a derived "decision card"
/// entry; that one is computed from the trace level and never stored here.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Checklist {
    pub names_numbers: bool,
    pub terminology: bool,
    pub tone_audience: bool,
}

impl Checklist {
    pub fn true_count(&self) -> usize {
        [self.names_numbers, self.terminology, self.tone_audience]
            .into_iter()
            .filter(|confirmed| *confirmed)
            .count()
    }

    pub fn all_confirmed(&self) -> bool {
        self.names_numbers && self.terminology && self.tone_audience
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AiDisclosure {
    pub used: bool,
    pub types: Vec<String>,
    pub notes: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceLevel {
    Bad,
    Warn,
    Ok,
}

impl TraceLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            TraceLevel::Bad => "bad",
            TraceLevel::Warn => "warn",
            TraceLevel::Ok => "ok",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "bad" => Some(TraceLevel::Bad),
            "warn" => Some(TraceLevel::Warn),
            "ok" => Some(TraceLevel::Ok),
            _ => None,
        }
    }
}

/// Frozen snapshot captured when a submission is finalized. Written once;
/// later edits to the submission never update it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LearningReport {
    pub created_at_ms: i64,
    pub trace_level: TraceLevel,
    pub trace_label: String,
    pub summary: String,
}

/// The learner's work product for exactly one task (at most one per task).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub id: String,
    pub task_id: String,
    pub draft_translation: String,
    pub final_translation: String,
    pub decision_card: Option<DecisionCard>,
    pub checklist: Checklist,
    pub ai_disclosure: AiDisclosure,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub submitted_at_ms: Option<i64>,
    pub learning_report: Option<LearningReport>,
}

impl Submission {
    /// The default empty shape created on first workspace visit.
    pub fn new(id: impl Into<String>, task_id: impl Into<String>, now_ms: i64) -> Self {
        Self {
            id: id.into(),
            task_id: task_id.into(),
            draft_translation: String::new(),
            final_translation: String::new(),
            decision_card: None,
            checklist: Checklist::default(),
            ai_disclosure: AiDisclosure::default(),
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            submitted_at_ms: None,
            learning_report: None,
        }
    }

    /// The decision card with a missing card hydrated to all-empty fields.
    pub fn card(&self) -> DecisionCard {
        self.decision_card.clone().unwrap_or_default()
    }

    /// The archived report, present only after the first successful finalize.
    /// Live status is recomputed per view; this snapshot never is.
    pub fn archived_report(&self) -> Option<&LearningReport> {
        self.learning_report.as_ref()
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted_at_ms.is_some()
    }
}
