mod support;

use support::{Cli, error_code};

const SOURCE_TEXT: &str = "The contracting parties shall settle all disputes amicably.";
const TRANSLATION: &str = "A careful and faithful translation of the clause text.";
const CARD_JSON: &str = r#"{"chosen":"Keep the source legal term as is","justification":"It preserves the binding register and avoids ambiguity","alt1":"A literal word-for-word rendering","alt2":"A generalized paraphrase of the clause","sources":"IATE term entry\nparallel contract corpus","postEdit":"Unified the recurring terms and reworked one clause for register"}"#;

fn create_task(cli: &Cli) -> String {
    let created = cli.ok_json(&[
        "task",
        "new",
        "--src",
        "ar",
        "--tgt",
        "en",
        "--domain",
        "legal",
        "--audience",
        "general readers",
        "--tone",
        "formal",
        "--text",
        SOURCE_TEXT,
    ]);
    created["task"]["id"]
        .as_str()
        .expect("task id")
        .to_string()
}

fn complete_submission(cli: &Cli, task_id: &str) {
    cli.ok_json(&["draft", "save", task_id, "--text", TRANSLATION]);
    cli.ok_json(&["card", "set", task_id, "--json", CARD_JSON]);
    cli.ok_json(&[
        "check",
        "set",
        task_id,
        "--names-numbers",
        "true",
        "--terminology",
        "true",
        "--tone-audience",
        "true",
    ]);
    cli.ok_json(&[
        "ai",
        "set",
        task_id,
        "--used",
        "true",
        "--types",
        "terminology lookup, draft suggestion",
        "--notes",
        "Verified every suggested term",
    ]);
}

#[test]
fn full_flow_from_task_to_archived_report() {
    let cli = Cli::new("full_flow_from_task_to_archived_report");

    let task_id = create_task(&cli);
    assert_eq!(task_id, "TASK-001");

    let opened = cli.ok_json(&["open", &task_id]);
    assert_eq!(opened["trace"]["level"], "bad");
    assert_eq!(opened["trace"]["label"], "weak trace");
    assert_eq!(opened["trace"]["details"].as_array().map(Vec::len), Some(5));

    cli.ok_json(&["draft", "save", &task_id, "--text", TRANSLATION]);
    let after_card = cli.ok_json(&["card", "set", &task_id, "--json", CARD_JSON]);
    assert_eq!(after_card["trace"]["level"], "ok");
    assert_eq!(after_card["trace"]["label"], "strong trace");

    let after_check = cli.ok_json(&[
        "check",
        "set",
        &task_id,
        "--names-numbers",
        "true",
        "--terminology",
        "true",
        "--tone-audience",
        "true",
    ]);
    assert_eq!(after_check["gate"]["ready"], true);
    assert_eq!(after_check["gate"]["label"], "ready to submit");
    assert_eq!(after_check["checklist"]["decision_card"], true);

    cli.ok_json(&[
        "ai",
        "set",
        &task_id,
        "--used",
        "true",
        "--types",
        "terminology lookup, draft suggestion",
        "--notes",
        "Verified every suggested term",
    ]);

    let review = cli.ok_json(&["review", &task_id]);
    assert_eq!(review["rubric"]["product_score"], 60);
    assert_eq!(review["rubric"]["process_score"], 40);
    assert_eq!(review["rubric"]["total_score"], 100);
    assert_eq!(review["gate"]["ready"], true);

    let submitted = cli.ok_text(&["submit", &task_id]);
    assert!(submitted.contains("LEARNING REPORT"));
    assert!(submitted.contains("* Task: legal | AR->EN"));
    assert!(submitted.contains("Total: 100/100"));
    assert!(submitted.contains("Verdict: excellent"));
    assert!(submitted.contains("- IATE term entry"));
    assert!(submitted.contains("- parallel contract corpus"));
    // The archive is composed before the submitted stamp lands.
    assert!(submitted.contains("* Submitted: —"));

    // The export artifact is the archived snapshot, byte for byte.
    let report = cli.ok_text(&["report", &task_id]);
    assert_eq!(report, submitted);

    let listed = cli.ok_json(&["task", "list"]);
    assert_eq!(listed["tasks"][0]["id"], "TASK-001");
    assert_eq!(listed["tasks"][0]["submitted"], true);
    assert_eq!(listed["tasks"][0]["trace"]["level"], "ok");

    let stats = cli.ok_json(&["stats"]);
    assert_eq!(stats["tasks"], 1);
    assert_eq!(stats["submissions"], 1);
    assert_eq!(stats["strong_traces"], 1);
}

#[test]
fn gate_blocks_a_short_translation() {
    let cli = Cli::new("gate_blocks_a_short_translation");
    let task_id = create_task(&cli);
    complete_submission(&cli, &task_id);
    cli.ok_json(&["draft", "save", &task_id, "--text", "Too short."]);

    let review = cli.ok_json(&["review", &task_id]);
    assert_eq!(review["gate"]["ready"], false);
    assert_eq!(
        review["gate"]["label"],
        "complete the translation, the checklist, and the decision card"
    );

    let err = cli.err_json(&["submit", &task_id]);
    assert_eq!(error_code(&err), "GATE_NOT_READY");

    // Nothing was archived by the refused submit.
    let listed = cli.ok_json(&["task", "list"]);
    assert_eq!(listed["tasks"][0]["submitted"], false);
}

#[test]
fn focus_falls_back_to_last_opened_task() {
    let cli = Cli::new("focus_falls_back_to_last_opened_task");
    let first = create_task(&cli);
    let second = create_task(&cli);
    assert_eq!(second, "TASK-002");

    // Creation focuses the new task.
    let review = cli.ok_json(&["review"]);
    assert_eq!(review["task"], second);

    cli.ok_json(&["open", &first]);
    let review = cli.ok_json(&["review"]);
    assert_eq!(review["task"], first);

    // Flag values are never mistaken for the task id.
    let checked = cli.ok_json(&["check", "set", "--names-numbers", "true"]);
    assert_eq!(checked["task"], first);
    assert_eq!(checked["checklist"]["names_numbers"], true);
}

#[test]
fn unknown_task_is_reported() {
    let cli = Cli::new("unknown_task_is_reported");
    let err = cli.err_json(&["open", "TASK-999"]);
    assert_eq!(error_code(&err), "UNKNOWN_ID");

    let err = cli.err_json(&["review"]);
    assert_eq!(error_code(&err), "INVALID_INPUT");
}

#[test]
fn resubmit_keeps_the_first_archive() {
    let cli = Cli::new("resubmit_keeps_the_first_archive");
    let task_id = create_task(&cli);
    complete_submission(&cli, &task_id);

    let first = cli.ok_text(&["submit", &task_id]);

    cli.ok_json(&[
        "draft",
        "save",
        &task_id,
        "--text",
        "A completely reworked translation, saved after the deadline.",
    ]);
    let second = cli.ok_text(&["submit", &task_id]);
    assert_eq!(second, first);

    let report = cli.ok_text(&["report", &task_id]);
    assert_eq!(report, first);
}

#[test]
fn card_input_rejects_unknown_fields() {
    let cli = Cli::new("card_input_rejects_unknown_fields");
    let task_id = create_task(&cli);
    let err = cli.err_json(&[
        "card",
        "set",
        &task_id,
        "--json",
        r#"{"chosen":"x","bogus":1}"#,
    ]);
    assert_eq!(error_code(&err), "INVALID_INPUT");
}

#[test]
fn short_source_text_is_rejected() {
    let cli = Cli::new("short_source_text_is_rejected");
    let err = cli.err_json(&[
        "task",
        "new",
        "--src",
        "ar",
        "--tgt",
        "en",
        "--domain",
        "legal",
        "--audience",
        "general readers",
        "--tone",
        "formal",
        "--text",
        "too short",
    ]);
    assert_eq!(error_code(&err), "INVALID_INPUT");
}

#[test]
fn reset_requires_confirmation() {
    let cli = Cli::new("reset_requires_confirmation");
    create_task(&cli);

    let err = cli.err_json(&["reset"]);
    assert_eq!(error_code(&err), "INVALID_INPUT");

    let cleared = cli.ok_json(&["reset", "--yes"]);
    assert_eq!(cleared["reset"], true);

    let stats = cli.ok_json(&["stats"]);
    assert_eq!(stats["tasks"], 0);
    assert_eq!(stats["submissions"], 0);

    // Counters restart after a reset.
    let reissued = create_task(&cli);
    assert_eq!(reissued, "TASK-001");
}
