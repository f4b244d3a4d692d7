#![forbid(unsafe_code)]

//! Thin presentation layer over the grading engine: resolves ids, loads
//! records, calls into `dc_core`, and persists the results. Structured
//! command output is JSON on stdout; the learning report is plain text.

mod session_log;

use dc_core::grading::{
    FinalizeError, GateStatus, RubricScore, TraceStatus, compose_report, evaluate_gate,
    evaluate_trace, finalize, format_timestamp, score_rubric,
};
use dc_core::model::{DecisionCard, NewTask, Submission, Task, TraceLevel};
use dc_storage::{SqliteStore, StoreError};
use serde::Deserialize;
use serde_json::{Value, json};
use session_log::SessionLog;
use std::path::PathBuf;
use time::OffsetDateTime;

const DEFAULT_STORAGE_DIR: &str = ".decisioncard";

fn usage() -> &'static str {
    "dc_cli — decision-card translation practice (local, single learner)\n\n\
USAGE:\n\
  dc_cli [--storage-dir DIR] <command> [args]\n\n\
COMMANDS:\n\
  task new --src L --tgt L --domain D --audience A --tone T [--sensitive] --text SOURCE\n\
  task list\n\
  open [TASK-ID]\n\
  draft save [TASK-ID] --text TRANSLATION\n\
  card set [TASK-ID] --json '{\"chosen\":..,\"justification\":..,\"alt1\":..,\"alt2\":..,\"sources\":..,\"postEdit\":..}'\n\
  check set [TASK-ID] [--names-numbers BOOL] [--terminology BOOL] [--tone-audience BOOL]\n\
  ai set [TASK-ID] [--used BOOL] [--types a,b] [--notes TEXT]\n\
  review [TASK-ID]\n\
  submit [TASK-ID]\n\
  report [TASK-ID | SUB-ID]\n\
  stats\n\
  reset --yes\n\n\
NOTES:\n\
  - Commands taking [TASK-ID] fall back to the most recently opened task.\n\
  - Storage defaults to ./.decisioncard (a local SQLite file).\n"
}

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print!("{}", usage());
        return 0;
    }
    if args.is_empty() {
        print!("{}", usage());
        return 2;
    }

    let storage_dir = match take_flag_value(&mut args, "--storage-dir") {
        Ok(value) => value
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR)),
        Err(err) => return emit_error(&err),
    };

    let mut log = SessionLog::new(&storage_dir);
    log.note_command(&args.join(" "));

    let mut store = match SqliteStore::open(&storage_dir) {
        Ok(store) => store,
        Err(err) => {
            let err = CliError::Store(err);
            log.note_error(&err.message());
            let code = emit_error(&err);
            log.note_exit("store open failed");
            return code;
        }
    };

    match dispatch(&mut store, &args) {
        Ok(Output::Json(value)) => {
            println!("{value:#}");
            log.note_exit("ok");
            0
        }
        Ok(Output::Text(text)) => {
            println!("{text}");
            log.note_exit("ok");
            0
        }
        Err(err) => {
            log.note_error(&err.message());
            let code = emit_error(&err);
            log.note_exit("error");
            code
        }
    }
}

enum Output {
    Json(Value),
    Text(String),
}

#[derive(Debug)]
enum CliError {
    Usage(String),
    Store(StoreError),
    UnknownTask(String),
    GateNotReady(FinalizeError),
}

impl CliError {
    fn code(&self) -> &'static str {
        match self {
            Self::Usage(_) => "INVALID_INPUT",
            Self::Store(StoreError::UnknownId) => "UNKNOWN_ID",
            Self::Store(StoreError::InvalidTask(_)) => "INVALID_INPUT",
            Self::Store(_) => "STORE_ERROR",
            Self::UnknownTask(_) => "UNKNOWN_ID",
            Self::GateNotReady(_) => "GATE_NOT_READY",
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Usage(message) => message.clone(),
            Self::Store(err) => err.to_string(),
            Self::UnknownTask(id) => format!("unknown task: {id}"),
            Self::GateNotReady(err) => err.to_string(),
        }
    }
}

impl From<StoreError> for CliError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

fn emit_error(err: &CliError) -> i32 {
    let payload = json!({"error": {"code": err.code(), "message": err.message()}});
    println!("{payload:#}");
    2
}

fn dispatch(store: &mut SqliteStore, args: &[String]) -> Result<Output, CliError> {
    let command = args.first().map(String::as_str).unwrap_or_default();
    let sub = args.get(1).map(String::as_str);
    match command {
        "task" => match sub {
            Some("new") => cmd_task_new(store, rest(args, 2)),
            Some("list") => {
                ensure_no_leftovers(&rest(args, 2))?;
                cmd_task_list(store)
            }
            _ => Err(CliError::Usage("task expects `new` or `list`".to_string())),
        },
        "draft" => match sub {
            Some("save") => cmd_draft_save(store, rest(args, 2)),
            _ => Err(CliError::Usage("draft expects `save`".to_string())),
        },
        "card" => match sub {
            Some("set") => cmd_card_set(store, rest(args, 2)),
            _ => Err(CliError::Usage("card expects `set`".to_string())),
        },
        "check" => match sub {
            Some("set") => cmd_check_set(store, rest(args, 2)),
            _ => Err(CliError::Usage("check expects `set`".to_string())),
        },
        "ai" => match sub {
            Some("set") => cmd_ai_set(store, rest(args, 2)),
            _ => Err(CliError::Usage("ai expects `set`".to_string())),
        },
        "open" => cmd_open(store, rest(args, 1)),
        "review" => cmd_review(store, rest(args, 1)),
        "submit" => cmd_submit(store, rest(args, 1)),
        "report" => cmd_report(store, rest(args, 1)),
        "stats" => {
            ensure_no_leftovers(&rest(args, 1))?;
            cmd_stats(store)
        }
        "reset" => cmd_reset(store, rest(args, 1)),
        other => Err(CliError::Usage(format!("unknown command: {other}"))),
    }
}

fn cmd_task_new(store: &mut SqliteStore, mut args: Vec<String>) -> Result<Output, CliError> {
    let src_lang = require(take_flag_value(&mut args, "--src")?, "--src")?;
    let tgt_lang = require(take_flag_value(&mut args, "--tgt")?, "--tgt")?;
    let domain = require(take_flag_value(&mut args, "--domain")?, "--domain")?;
    let audience = require(take_flag_value(&mut args, "--audience")?, "--audience")?;
    let tone = require(take_flag_value(&mut args, "--tone")?, "--tone")?;
    let source_text = require(take_flag_value(&mut args, "--text")?, "--text")?;
    let sensitive = take_flag_present(&mut args, "--sensitive");
    ensure_no_leftovers(&args)?;

    let task = store.create_task(NewTask {
        src_lang,
        tgt_lang,
        domain,
        audience,
        tone,
        sensitive,
        source_text,
    })?;
    store.focus_set(&task.id)?;
    Ok(Output::Json(json!({"task": task_json(&task)})))
}

fn cmd_task_list(store: &mut SqliteStore) -> Result<Output, CliError> {
    let tasks = store.list_tasks()?;
    let mut entries = Vec::new();
    for task in &tasks {
        let submission = store.get_submission_by_task(&task.id)?;
        let trace = evaluate_trace(submission.as_ref());
        entries.push(json!({
            "id": task.id,
            "domain": task.domain,
            "pair": format!("{}->{}", task.src_lang.to_uppercase(), task.tgt_lang.to_uppercase()),
            "audience": task.audience,
            "tone": task.tone,
            "sensitive": task.sensitive,
            "created_at": format_timestamp(task.created_at_ms),
            "trace": {"level": trace.level.as_str(), "label": trace.label},
            "submitted": submission.as_ref().is_some_and(Submission::is_submitted),
        }));
    }
    Ok(Output::Json(json!({"tasks": entries})))
}

fn cmd_stats(store: &mut SqliteStore) -> Result<Output, CliError> {
    let stats = store.stats()?;
    Ok(Output::Json(json!({
        "tasks": stats.tasks,
        "submissions": stats.submissions,
        "strong_traces": stats.strong_traces,
    })))
}

fn cmd_open(store: &mut SqliteStore, mut args: Vec<String>) -> Result<Output, CliError> {
    let task_id = resolve_task_id(store, take_positional(&mut args))?;
    ensure_no_leftovers(&args)?;

    let task = load_task(store, &task_id)?;
    let submission = store.ensure_submission(&task.id)?;
    store.focus_set(&task.id)?;

    let trace = evaluate_trace(Some(&submission));
    let translation = if submission.final_translation.is_empty() {
        submission.draft_translation.clone()
    } else {
        submission.final_translation.clone()
    };
    Ok(Output::Json(json!({
        "task": task_json(&task),
        "submission_id": submission.id,
        "translation": translation,
        "last_saved": format_timestamp(submission.updated_at_ms),
        "trace": trace_json(&trace),
    })))
}

fn cmd_draft_save(store: &mut SqliteStore, mut args: Vec<String>) -> Result<Output, CliError> {
    // Flags first, so their values are never mistaken for the task id.
    let text = require(take_flag_value(&mut args, "--text")?, "--text")?;
    let task_id = resolve_task_id(store, take_positional(&mut args))?;
    ensure_no_leftovers(&args)?;

    load_task(store, &task_id)?;
    let mut submission = store.ensure_submission(&task_id)?;
    submission.final_translation = text.trim().to_string();
    submission.updated_at_ms = now_ms_i64();
    store.upsert_submission(&submission)?;

    let trace = evaluate_trace(Some(&submission));
    Ok(Output::Json(json!({
        "task": task_id,
        "saved_at": format_timestamp(submission.updated_at_ms),
        "translation_chars": submission.final_translation.chars().count(),
        "trace": trace_json(&trace),
    })))
}

/// JSON input form for the decision card; field names match the exported
/// report vocabulary. Missing fields default to empty.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
struct CardInput {
    chosen: String,
    justification: String,
    alt1: String,
    alt2: String,
    sources: String,
    post_edit: String,
}

fn cmd_card_set(store: &mut SqliteStore, mut args: Vec<String>) -> Result<Output, CliError> {
    let raw = require(take_flag_value(&mut args, "--json")?, "--json")?;
    let task_id = resolve_task_id(store, take_positional(&mut args))?;
    ensure_no_leftovers(&args)?;

    let input: CardInput = serde_json::from_str(&raw)
        .map_err(|err| CliError::Usage(format!("--json is not a valid card: {err}")))?;

    load_task(store, &task_id)?;
    let mut submission = store.ensure_submission(&task_id)?;
    let now_ms = now_ms_i64();
    submission.decision_card = Some(DecisionCard {
        chosen: input.chosen.trim().to_string(),
        justification: input.justification.trim().to_string(),
        alt1: input.alt1.trim().to_string(),
        alt2: input.alt2.trim().to_string(),
        sources: input.sources.trim().to_string(),
        post_edit: input.post_edit.trim().to_string(),
        updated_at_ms: now_ms,
    });
    submission.updated_at_ms = now_ms;
    store.upsert_submission(&submission)?;

    let trace = evaluate_trace(Some(&submission));
    Ok(Output::Json(json!({
        "task": task_id,
        "trace": trace_json(&trace),
    })))
}

fn cmd_check_set(store: &mut SqliteStore, mut args: Vec<String>) -> Result<Output, CliError> {
    let names_numbers = take_flag_bool(&mut args, "--names-numbers")?;
    let terminology = take_flag_bool(&mut args, "--terminology")?;
    let tone_audience = take_flag_bool(&mut args, "--tone-audience")?;
    let task_id = resolve_task_id(store, take_positional(&mut args))?;
    ensure_no_leftovers(&args)?;
    if names_numbers.is_none() && terminology.is_none() && tone_audience.is_none() {
        return Err(CliError::Usage("no checklist entries to change".to_string()));
    }

    load_task(store, &task_id)?;
    let mut submission = store.ensure_submission(&task_id)?;
    if let Some(value) = names_numbers {
        submission.checklist.names_numbers = value;
    }
    if let Some(value) = terminology {
        submission.checklist.terminology = value;
    }
    if let Some(value) = tone_audience {
        submission.checklist.tone_audience = value;
    }
    submission.updated_at_ms = now_ms_i64();
    store.upsert_submission(&submission)?;

    let gate = evaluate_gate(&submission);
    Ok(Output::Json(json!({
        "task": task_id,
        "checklist": checklist_json(&submission),
        "gate": gate_json(&gate),
    })))
}

fn cmd_ai_set(store: &mut SqliteStore, mut args: Vec<String>) -> Result<Output, CliError> {
    let used = take_flag_bool(&mut args, "--used")?;
    let types = take_flag_value(&mut args, "--types")?;
    let notes = take_flag_value(&mut args, "--notes")?;
    let task_id = resolve_task_id(store, take_positional(&mut args))?;
    ensure_no_leftovers(&args)?;
    if used.is_none() && types.is_none() && notes.is_none() {
        return Err(CliError::Usage("no disclosure fields to change".to_string()));
    }

    load_task(store, &task_id)?;
    let mut submission = store.ensure_submission(&task_id)?;
    if let Some(value) = used {
        submission.ai_disclosure.used = value;
    }
    if let Some(raw) = types {
        submission.ai_disclosure.types = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(value) = notes {
        submission.ai_disclosure.notes = value.trim().to_string();
    }
    submission.updated_at_ms = now_ms_i64();
    store.upsert_submission(&submission)?;

    Ok(Output::Json(json!({
        "task": task_id,
        "ai_disclosure": {
            "used": submission.ai_disclosure.used,
            "types": submission.ai_disclosure.types,
            "notes": submission.ai_disclosure.notes,
        },
    })))
}

fn cmd_review(store: &mut SqliteStore, mut args: Vec<String>) -> Result<Output, CliError> {
    let task_id = resolve_task_id(store, take_positional(&mut args))?;
    ensure_no_leftovers(&args)?;

    let task = load_task(store, &task_id)?;
    let submission = store.ensure_submission(&task.id)?;

    let trace = evaluate_trace(Some(&submission));
    let rubric = score_rubric(&task, &submission);
    let gate = evaluate_gate(&submission);
    Ok(Output::Json(json!({
        "task": task_id,
        "source_chars": task.source_text.chars().count(),
        "translation_chars": submission.final_translation.chars().count(),
        "trace": trace_json(&trace),
        "rubric": rubric_json(&rubric),
        "gate": gate_json(&gate),
        "checklist": checklist_json(&submission),
    })))
}

fn cmd_submit(store: &mut SqliteStore, mut args: Vec<String>) -> Result<Output, CliError> {
    let task_id = resolve_task_id(store, take_positional(&mut args))?;
    ensure_no_leftovers(&args)?;

    let task = load_task(store, &task_id)?;
    let submission = store.ensure_submission(&task.id)?;
    let updated = finalize(&task, &submission, now_ms_i64()).map_err(CliError::GateNotReady)?;
    store.upsert_submission(&updated)?;

    let summary = updated
        .archived_report()
        .map(|report| report.summary.clone())
        .unwrap_or_default();
    Ok(Output::Text(summary))
}

fn cmd_report(store: &mut SqliteStore, mut args: Vec<String>) -> Result<Output, CliError> {
    let id = take_positional(&mut args);
    ensure_no_leftovers(&args)?;

    // Accept a submission id (the report screen's key) or fall back to the
    // task resolution every other command uses.
    let (task, submission) = match id {
        Some(id) if id.starts_with("SUB-") => {
            let Some(submission) = store.get_submission(&id)? else {
                return Err(CliError::Store(StoreError::UnknownId));
            };
            let task = load_task(store, &submission.task_id)?;
            (task, submission)
        }
        other => {
            let task_id = resolve_task_id(store, other)?;
            let task = load_task(store, &task_id)?;
            let Some(submission) = store.get_submission_by_task(&task.id)? else {
                return Err(CliError::Store(StoreError::UnknownId));
            };
            (task, submission)
        }
    };

    // Archived snapshot when present; live composition otherwise.
    let text = match submission.archived_report() {
        Some(report) => report.summary.clone(),
        None => compose_report(&task, &submission),
    };
    Ok(Output::Text(text))
}

fn cmd_reset(store: &mut SqliteStore, mut args: Vec<String>) -> Result<Output, CliError> {
    let confirmed = take_flag_present(&mut args, "--yes");
    ensure_no_leftovers(&args)?;
    if !confirmed {
        return Err(CliError::Usage(
            "pass --yes to clear all local data".to_string(),
        ));
    }
    store.reset()?;
    Ok(Output::Json(json!({"reset": true})))
}

fn load_task(store: &SqliteStore, task_id: &str) -> Result<Task, CliError> {
    store
        .get_task(task_id)?
        .ok_or_else(|| CliError::UnknownTask(task_id.to_string()))
}

fn resolve_task_id(store: &SqliteStore, explicit: Option<String>) -> Result<String, CliError> {
    if let Some(id) = explicit {
        return Ok(id);
    }
    match store.focus_get()? {
        Some(id) => Ok(id),
        None => Err(CliError::Usage(
            "no task id given and no task is open".to_string(),
        )),
    }
}

fn task_json(task: &Task) -> Value {
    json!({
        "id": task.id,
        "src_lang": task.src_lang,
        "tgt_lang": task.tgt_lang,
        "domain": task.domain,
        "audience": task.audience,
        "tone": task.tone,
        "sensitive": task.sensitive,
        "source_text": task.source_text,
        "created_at": format_timestamp(task.created_at_ms),
    })
}

fn trace_json(trace: &TraceStatus) -> Value {
    json!({
        "level": trace.level.as_str(),
        "label": trace.label,
        "details": trace.details,
    })
}

fn rubric_json(score: &RubricScore) -> Value {
    json!({
        "product_score": score.product_score,
        "process_score": score.process_score,
        "total_score": score.total_score,
        "product_percentage": score.product_percentage,
        "process_percentage": score.process_percentage,
    })
}

fn gate_json(gate: &GateStatus) -> Value {
    json!({"ready": gate.ready, "label": gate.label})
}

fn checklist_json(submission: &Submission) -> Value {
    json!({
        "names_numbers": submission.checklist.names_numbers,
        "terminology": submission.checklist.terminology,
        "tone_audience": submission.checklist.tone_audience,
        // Derived from the live trace, never stored.
        "decision_card": evaluate_trace(Some(submission)).level == TraceLevel::Ok,
    })
}

fn rest(args: &[String], skip: usize) -> Vec<String> {
    args.get(skip..).unwrap_or_default().to_vec()
}

fn take_flag_value(args: &mut Vec<String>, flag: &str) -> Result<Option<String>, CliError> {
    let Some(index) = args.iter().position(|arg| arg == flag) else {
        return Ok(None);
    };
    if index + 1 >= args.len() {
        return Err(CliError::Usage(format!("{flag} expects a value")));
    }
    let value = args.remove(index + 1);
    args.remove(index);
    Ok(Some(value))
}

fn take_flag_present(args: &mut Vec<String>, flag: &str) -> bool {
    if let Some(index) = args.iter().position(|arg| arg == flag) {
        args.remove(index);
        true
    } else {
        false
    }
}

fn take_flag_bool(args: &mut Vec<String>, flag: &str) -> Result<Option<bool>, CliError> {
    match take_flag_value(args, flag)? {
        None => Ok(None),
        Some(raw) => match raw.trim() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            other => Err(CliError::Usage(format!(
                "{flag} expects true or false, got `{other}`"
            ))),
        },
    }
}

fn take_positional(args: &mut Vec<String>) -> Option<String> {
    let index = args.iter().position(|arg| !arg.starts_with("--"))?;
    Some(args.remove(index))
}

fn ensure_no_leftovers(args: &[String]) -> Result<(), CliError> {
    if let Some(extra) = args.first() {
        return Err(CliError::Usage(format!("unexpected argument: {extra}")));
    }
    Ok(())
}

fn require(value: Option<String>, flag: &str) -> Result<String, CliError> {
    value.ok_or_else(|| CliError::Usage(format!("{flag} is required")))
}

pub(crate) fn now_ms_i64() -> i64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    let ms = nanos / 1_000_000i128;
    if ms <= 0 {
        0
    } else if ms >= i64::MAX as i128 {
        i64::MAX
    } else {
        ms as i64
    }
}
