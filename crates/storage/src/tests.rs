use super::*;

fn temp_store(test_name: &str) -> SqliteStore {
    let dir = std::env::temp_dir().join(format!(
        "dc_storage_{}_{}",
        test_name,
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    SqliteStore::open(&dir).expect("open store")
}

fn sample_new_task(domain: &str) -> NewTask {
    NewTask {
        src_lang: "ar".to_string(),
        tgt_lang: "en".to_string(),
        domain: domain.to_string(),
        audience: "general readers".to_string(),
        tone: "formal".to_string(),
        sensitive: false,
        source_text: "A source text to translate.".to_string(),
    }
}

fn strong_card() -> DecisionCard {
    DecisionCard {
        chosen: "keep the domain term".to_string(),
        justification: "keeps register and terminology".to_string(),
        alt1: "literal rendering".to_string(),
        alt2: "generalized wording".to_string(),
        sources: "specialist glossary".to_string(),
        post_edit: "unified recurring terms".to_string(),
        updated_at_ms: 1_700_000_200_000,
    }
}

#[test]
fn create_task_issues_sequential_ids() {
    let mut store = temp_store("create_task_issues_sequential_ids");

    let mut input = sample_new_task("legal");
    input.source_text = "  A source text to translate.  ".to_string();
    let first = store.create_task(input).expect("create first");
    assert_eq!(first.id, "TASK-001");
    assert_eq!(first.source_text, "A source text to translate.");
    assert!(first.created_at_ms > 0);

    let second = store.create_task(sample_new_task("medical")).expect("create second");
    assert_eq!(second.id, "TASK-002");

    let loaded = store.get_task("TASK-001").expect("get").expect("exists");
    assert_eq!(loaded, first);
    assert_eq!(store.get_task("TASK-999").expect("get"), None);
}

#[test]
fn create_task_rejects_short_source() {
    let mut store = temp_store("create_task_rejects_short_source");
    let mut input = sample_new_task("legal");
    input.source_text = "  too short  ".to_string();
    assert!(matches!(
        store.create_task(input),
        Err(StoreError::InvalidTask(TaskError::SourceTextTooShort { .. }))
    ));
    assert!(store.list_tasks().expect("list").is_empty());
}

#[test]
fn list_tasks_newest_first() {
    let mut store = temp_store("list_tasks_newest_first");
    store.create_task(sample_new_task("legal")).expect("create");
    store.create_task(sample_new_task("medical")).expect("create");

    let tasks = store.list_tasks().expect("list");
    let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["TASK-002", "TASK-001"]);
}

#[test]
fn ensure_submission_is_lazy_and_stable() {
    let mut store = temp_store("ensure_submission_is_lazy_and_stable");
    assert!(matches!(
        store.ensure_submission("TASK-001"),
        Err(StoreError::UnknownId)
    ));

    let task = store.create_task(sample_new_task("legal")).expect("create");
    assert_eq!(store.get_submission_by_task(&task.id).expect("get"), None);

    let first = store.ensure_submission(&task.id).expect("ensure");
    assert_eq!(first.id, "SUB-001");
    assert_eq!(first.task_id, task.id);
    assert_eq!(first.final_translation, "");

    // Idempotent: the same row comes back, no second submission appears.
    let again = store.ensure_submission(&task.id).expect("ensure again");
    assert_eq!(again, first);
    assert_eq!(store.list_submissions().expect("list").len(), 1);
}

#[test]
fn submission_round_trip_preserves_every_field() {
    let mut store = temp_store("submission_round_trip_preserves_every_field");
    let task = store.create_task(sample_new_task("legal")).expect("create");
    let mut submission = store.ensure_submission(&task.id).expect("ensure");

    submission.draft_translation = "draft wording".to_string();
    submission.final_translation = "final wording, long enough to submit".to_string();
    submission.decision_card = Some(DecisionCard {
        sources: "glossary\nparallel text".to_string(),
        ..strong_card()
    });
    submission.checklist = Checklist {
        names_numbers: true,
        terminology: false,
        tone_audience: true,
    };
    submission.ai_disclosure = AiDisclosure {
        used: true,
        types: vec!["terminology lookup".to_string(), "draft".to_string()],
        notes: "checked every suggestion".to_string(),
    };
    submission.updated_at_ms = 1_700_000_400_000;
    submission.submitted_at_ms = Some(1_700_000_500_000);
    submission.learning_report = Some(LearningReport {
        created_at_ms: 1_700_000_500_000,
        trace_level: TraceLevel::Ok,
        trace_label: "strong trace".to_string(),
        summary: "line one\nline two — سطر\n".to_string(),
    });

    store.upsert_submission(&submission).expect("upsert");

    let by_task = store
        .get_submission_by_task(&task.id)
        .expect("get")
        .expect("exists");
    assert_eq!(by_task, submission);

    let by_id = store
        .get_submission(&submission.id)
        .expect("get")
        .expect("exists");
    assert_eq!(by_id, submission);
}

#[test]
fn upsert_keeps_one_submission_per_task() {
    let mut store = temp_store("upsert_keeps_one_submission_per_task");
    let task = store.create_task(sample_new_task("legal")).expect("create");
    let mut submission = store.ensure_submission(&task.id).expect("ensure");

    submission.final_translation = "first save".to_string();
    store.upsert_submission(&submission).expect("upsert");
    submission.final_translation = "second save".to_string();
    store.upsert_submission(&submission).expect("upsert");

    let all = store.list_submissions().expect("list");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].final_translation, "second save");
}

#[test]
fn focus_round_trip() {
    let mut store = temp_store("focus_round_trip");
    assert_eq!(store.focus_get().expect("get"), None);

    store.focus_set("TASK-001").expect("set");
    assert_eq!(store.focus_get().expect("get"), Some("TASK-001".to_string()));

    store.focus_set("TASK-002").expect("set");
    assert_eq!(store.focus_get().expect("get"), Some("TASK-002".to_string()));

    assert!(store.focus_clear().expect("clear"));
    assert_eq!(store.focus_get().expect("get"), None);
    assert!(!store.focus_clear().expect("clear again"));
}

#[test]
fn stats_count_strong_traces_live() {
    let mut store = temp_store("stats_count_strong_traces_live");
    let first = store.create_task(sample_new_task("legal")).expect("create");
    let second = store.create_task(sample_new_task("medical")).expect("create");

    let mut strong = store.ensure_submission(&first.id).expect("ensure");
    strong.decision_card = Some(strong_card());
    store.upsert_submission(&strong).expect("upsert");
    store.ensure_submission(&second.id).expect("ensure");

    assert_eq!(
        store.stats().expect("stats"),
        StoreStats {
            tasks: 2,
            submissions: 2,
            strong_traces: 1,
        }
    );
}

#[test]
fn reset_clears_data_and_restarts_counters() {
    let mut store = temp_store("reset_clears_data_and_restarts_counters");
    let task = store.create_task(sample_new_task("legal")).expect("create");
    store.ensure_submission(&task.id).expect("ensure");
    store.focus_set(&task.id).expect("focus");

    store.reset().expect("reset");

    assert_eq!(
        store.stats().expect("stats"),
        StoreStats {
            tasks: 0,
            submissions: 0,
            strong_traces: 0,
        }
    );
    assert_eq!(store.focus_get().expect("focus"), None);

    let reissued = store.create_task(sample_new_task("legal")).expect("create");
    assert_eq!(reissued.id, "TASK-001");
}
