#![forbid(unsafe_code)]

//! Local single-device entity store for tasks and submissions.
//!
//! One logical actor; a second process against the same file is unguarded and
//! last-write-wins.

use dc_core::grading::evaluate_trace;
use dc_core::model::{
    AiDisclosure, Checklist, DecisionCard, LearningReport, NewTask, Submission, Task, TaskError,
    TraceLevel, validate_source_text,
};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

#[cfg(test)]
mod tests;

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    InvalidTask(TaskError),
    UnknownId,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::InvalidTask(err) => write!(f, "invalid task: {err}"),
            Self::UnknownId => write!(f, "unknown id"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}

impl From<TaskError> for StoreError {
    fn from(value: TaskError) -> Self {
        Self::InvalidTask(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreStats {
    pub tasks: usize,
    pub submissions: usize,
    pub strong_traces: usize,
}

#[derive(Debug)]
pub struct SqliteStore {
    storage_dir: PathBuf,
    conn: Connection,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;
        let db_path = storage_dir.join("decisioncard.db");
        let conn = Connection::open(db_path)?;
        let store = Self { storage_dir, conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;

            CREATE TABLE IF NOT EXISTS meta (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS counters (
              name TEXT PRIMARY KEY,
              value INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tasks (
              id TEXT PRIMARY KEY,
              src_lang TEXT NOT NULL,
              tgt_lang TEXT NOT NULL,
              domain TEXT NOT NULL,
              audience TEXT NOT NULL,
              tone TEXT NOT NULL,
              sensitive INTEGER NOT NULL,
              source_text TEXT NOT NULL,
              created_at_ms INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS submissions (
              task_id TEXT PRIMARY KEY,
              id TEXT NOT NULL UNIQUE,
              draft_translation TEXT NOT NULL,
              final_translation TEXT NOT NULL,
              decision_card_json TEXT,
              checklist_json TEXT NOT NULL,
              ai_disclosure_json TEXT NOT NULL,
              created_at_ms INTEGER NOT NULL,
              updated_at_ms INTEGER NOT NULL,
              submitted_at_ms INTEGER,
              learning_report_json TEXT
            );

            CREATE TABLE IF NOT EXISTS focus (
              key TEXT PRIMARY KEY,
              task_id TEXT NOT NULL,
              updated_at_ms INTEGER NOT NULL
            );
            "#,
        )?;
        self.conn.execute(
            "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
            params!["schema_version", "v1"],
        )?;
        Ok(())
    }

    pub fn create_task(&mut self, new_task: NewTask) -> Result<Task, StoreError> {
        let source_text = new_task.source_text.trim().to_string();
        validate_source_text(&source_text)?;

        let now_ms = now_ms();
        let tx = self.conn.transaction()?;
        let seq = next_counter_tx(&tx, "task_seq")?;
        let task = Task {
            id: format!("TASK-{seq:03}"),
            src_lang: new_task.src_lang,
            tgt_lang: new_task.tgt_lang,
            domain: new_task.domain,
            audience: new_task.audience,
            tone: new_task.tone,
            sensitive: new_task.sensitive,
            source_text,
            created_at_ms: now_ms,
        };
        tx.execute(
            r#"
            INSERT INTO tasks(id,src_lang,tgt_lang,domain,audience,tone,sensitive,source_text,created_at_ms)
            VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)
            "#,
            params![
                task.id,
                task.src_lang,
                task.tgt_lang,
                task.domain,
                task.audience,
                task.tone,
                task.sensitive as i64,
                task.source_text,
                task.created_at_ms
            ],
        )?;
        tx.commit()?;
        Ok(task)
    }

    pub fn get_task(&self, id: &str) -> Result<Option<Task>, StoreError> {
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT id, src_lang, tgt_lang, domain, audience, tone, sensitive, source_text, created_at_ms
                FROM tasks
                WHERE id = ?1
                "#,
                params![id],
                task_from_row,
            )
            .optional()?)
    }

    /// Newest first, matching the dashboard ordering.
    pub fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, src_lang, tgt_lang, domain, audience, tone, sensitive, source_text, created_at_ms
            FROM tasks
            ORDER BY created_at_ms DESC, id DESC
            "#,
        )?;
        let rows = stmt.query_map([], task_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Returns the task's submission, lazily creating the default empty shape
    /// on first visit.
    pub fn ensure_submission(&mut self, task_id: &str) -> Result<Submission, StoreError> {
        let now_ms = now_ms();
        let tx = self.conn.transaction()?;

        let task_exists = tx
            .query_row("SELECT 1 FROM tasks WHERE id=?1", params![task_id], |_| {
                Ok(())
            })
            .optional()?
            .is_some();
        if !task_exists {
            return Err(StoreError::UnknownId);
        }

        if let Some(existing) = tx
            .query_row(
                &format!("{SELECT_SUBMISSION} WHERE task_id = ?1"),
                params![task_id],
                submission_from_row,
            )
            .optional()?
        {
            tx.commit()?;
            return Ok(existing);
        }

        let seq = next_counter_tx(&tx, "submission_seq")?;
        let submission = Submission::new(format!("SUB-{seq:03}"), task_id, now_ms);
        insert_or_replace_submission_tx(&tx, &submission)?;
        tx.commit()?;
        Ok(submission)
    }

    pub fn get_submission_by_task(&self, task_id: &str) -> Result<Option<Submission>, StoreError> {
        Ok(self
            .conn
            .query_row(
                &format!("{SELECT_SUBMISSION} WHERE task_id = ?1"),
                params![task_id],
                submission_from_row,
            )
            .optional()?)
    }

    pub fn get_submission(&self, id: &str) -> Result<Option<Submission>, StoreError> {
        Ok(self
            .conn
            .query_row(
                &format!("{SELECT_SUBMISSION} WHERE id = ?1"),
                params![id],
                submission_from_row,
            )
            .optional()?)
    }

    pub fn list_submissions(&self) -> Result<Vec<Submission>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_SUBMISSION} ORDER BY task_id ASC"))?;
        let rows = stmt.query_map([], submission_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Full-row write keyed by task id (one submission per task).
    pub fn upsert_submission(&mut self, submission: &Submission) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        insert_or_replace_submission_tx(&tx, submission)?;
        tx.commit()?;
        Ok(())
    }

    pub fn focus_set(&mut self, task_id: &str) -> Result<(), StoreError> {
        let now_ms = now_ms();
        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO focus(key, task_id, updated_at_ms)
            VALUES ('current', ?1, ?2)
            ON CONFLICT(key) DO UPDATE SET task_id=excluded.task_id, updated_at_ms=excluded.updated_at_ms
            "#,
            params![task_id, now_ms],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn focus_get(&self) -> Result<Option<String>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT task_id FROM focus WHERE key = 'current'",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()?)
    }

    pub fn focus_clear(&mut self) -> Result<bool, StoreError> {
        let tx = self.conn.transaction()?;
        let deleted = tx.execute("DELETE FROM focus WHERE key = 'current'", [])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    /// Dashboard counters. Strong traces are recomputed live, never cached.
    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let tasks = self
            .conn
            .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get::<_, i64>(0))?
            as usize;
        let submissions = self.list_submissions()?;
        let strong_traces = submissions
            .iter()
            .filter(|sub| evaluate_trace(Some(sub)).level == TraceLevel::Ok)
            .count();
        Ok(StoreStats {
            tasks,
            submissions: submissions.len(),
            strong_traces,
        })
    }

    /// Clears all learner data. Counters restart, so ids are reissued.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM submissions", [])?;
        tx.execute("DELETE FROM tasks", [])?;
        tx.execute("DELETE FROM focus", [])?;
        tx.execute("DELETE FROM counters", [])?;
        tx.commit()?;
        Ok(())
    }
}

const SELECT_SUBMISSION: &str = r#"
    SELECT task_id, id, draft_translation, final_translation, decision_card_json,
           checklist_json, ai_disclosure_json, created_at_ms, updated_at_ms,
           submitted_at_ms, learning_report_json
    FROM submissions
"#;

fn task_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        src_lang: row.get(1)?,
        tgt_lang: row.get(2)?,
        domain: row.get(3)?,
        audience: row.get(4)?,
        tone: row.get(5)?,
        sensitive: row.get::<_, i64>(6)? != 0,
        source_text: row.get(7)?,
        created_at_ms: row.get(8)?,
    })
}

fn submission_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Submission> {
    Ok(Submission {
        task_id: row.get(0)?,
        id: row.get(1)?,
        draft_translation: row.get(2)?,
        final_translation: row.get(3)?,
        decision_card: row
            .get::<_, Option<String>>(4)?
            .map(|raw| decision_card_from_json(&raw)),
        checklist: checklist_from_json(&row.get::<_, String>(5)?),
        ai_disclosure: ai_disclosure_from_json(&row.get::<_, String>(6)?),
        created_at_ms: row.get(7)?,
        updated_at_ms: row.get(8)?,
        submitted_at_ms: row.get(9)?,
        learning_report: row
            .get::<_, Option<String>>(10)?
            .map(|raw| learning_report_from_json(&raw)),
    })
}

fn insert_or_replace_submission_tx(
    tx: &Transaction<'_>,
    submission: &Submission,
) -> Result<(), StoreError> {
    tx.execute(
        r#"
        INSERT INTO submissions(
            task_id, id, draft_translation, final_translation, decision_card_json,
            checklist_json, ai_disclosure_json, created_at_ms, updated_at_ms,
            submitted_at_ms, learning_report_json
        )
        VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)
        ON CONFLICT(task_id) DO UPDATE SET
            id=excluded.id,
            draft_translation=excluded.draft_translation,
            final_translation=excluded.final_translation,
            decision_card_json=excluded.decision_card_json,
            checklist_json=excluded.checklist_json,
            ai_disclosure_json=excluded.ai_disclosure_json,
            created_at_ms=excluded.created_at_ms,
            updated_at_ms=excluded.updated_at_ms,
            submitted_at_ms=excluded.submitted_at_ms,
            learning_report_json=excluded.learning_report_json
        "#,
        params![
            submission.task_id,
            submission.id,
            submission.draft_translation,
            submission.final_translation,
            submission.decision_card.as_ref().map(decision_card_to_json),
            checklist_to_json(&submission.checklist),
            ai_disclosure_to_json(&submission.ai_disclosure),
            submission.created_at_ms,
            submission.updated_at_ms,
            submission.submitted_at_ms,
            submission
                .learning_report
                .as_ref()
                .map(learning_report_to_json),
        ],
    )?;
    Ok(())
}

// Nested records travel as JSON text columns. Decoding is lenient: malformed
// or missing fields fall back to the empty defaults rather than failing.

fn decision_card_to_json(card: &DecisionCard) -> String {
    json!({
        "chosen": card.chosen,
        "justification": card.justification,
        "alt1": card.alt1,
        "alt2": card.alt2,
        "sources": card.sources,
        "post_edit": card.post_edit,
        "updated_at_ms": card.updated_at_ms,
    })
    .to_string()
}

fn decision_card_from_json(raw: &str) -> DecisionCard {
    let value: Value = serde_json::from_str(raw).unwrap_or(Value::Null);
    DecisionCard {
        chosen: string_field(&value, "chosen"),
        justification: string_field(&value, "justification"),
        alt1: string_field(&value, "alt1"),
        alt2: string_field(&value, "alt2"),
        sources: string_field(&value, "sources"),
        post_edit: string_field(&value, "post_edit"),
        updated_at_ms: i64_field(&value, "updated_at_ms"),
    }
}

fn checklist_to_json(checklist: &Checklist) -> String {
    json!({
        "names_numbers": checklist.names_numbers,
        "terminology": checklist.terminology,
        "tone_audience": checklist.tone_audience,
    })
    .to_string()
}

fn checklist_from_json(raw: &str) -> Checklist {
    let value: Value = serde_json::from_str(raw).unwrap_or(Value::Null);
    Checklist {
        names_numbers: bool_field(&value, "names_numbers"),
        terminology: bool_field(&value, "terminology"),
        tone_audience: bool_field(&value, "tone_audience"),
    }
}

fn ai_disclosure_to_json(disclosure: &AiDisclosure) -> String {
    json!({
        "used": disclosure.used,
        "types": disclosure.types,
        "notes": disclosure.notes,
    })
    .to_string()
}

fn ai_disclosure_from_json(raw: &str) -> AiDisclosure {
    let value: Value = serde_json::from_str(raw).unwrap_or(Value::Null);
    let types = value
        .get("types")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    AiDisclosure {
        used: bool_field(&value, "used"),
        types,
        notes: string_field(&value, "notes"),
    }
}

fn learning_report_to_json(report: &LearningReport) -> String {
    json!({
        "created_at_ms": report.created_at_ms,
        "trace_level": report.trace_level.as_str(),
        "trace_label": report.trace_label,
        "summary": report.summary,
    })
    .to_string()
}

fn learning_report_from_json(raw: &str) -> LearningReport {
    let value: Value = serde_json::from_str(raw).unwrap_or(Value::Null);
    let trace_level = value
        .get("trace_level")
        .and_then(Value::as_str)
        .and_then(TraceLevel::parse)
        .unwrap_or(TraceLevel::Bad);
    LearningReport {
        created_at_ms: i64_field(&value, "created_at_ms"),
        trace_level,
        trace_label: string_field(&value, "trace_label"),
        summary: string_field(&value, "summary"),
    }
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn bool_field(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn i64_field(value: &Value, key: &str) -> i64 {
    value.get(key).and_then(Value::as_i64).unwrap_or(0)
}

fn now_ms() -> i64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    now.as_millis() as i64
}

fn next_counter_tx(tx: &Transaction<'_>, name: &str) -> Result<i64, StoreError> {
    let current: i64 = tx
        .query_row(
            "SELECT value FROM counters WHERE name=?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?
        .unwrap_or(0);
    let next = current + 1;
    tx.execute(
        r#"
        INSERT INTO counters(name, value) VALUES (?1, ?2)
        ON CONFLICT(name) DO UPDATE SET value=excluded.value
        "#,
        params![name, next],
    )?;
    Ok(next)
}
