#![allow(dead_code)]

use serde_json::Value;
use std::path::PathBuf;
use std::process::{Command, Output};

pub(crate) struct Cli {
    storage_dir: PathBuf,
}

impl Cli {
    pub(crate) fn new(test_name: &str) -> Self {
        let storage_dir = std::env::temp_dir().join(format!(
            "dc_cli_{}_{}",
            test_name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&storage_dir);
        Self { storage_dir }
    }

    pub(crate) fn storage_dir(&self) -> &PathBuf {
        &self.storage_dir
    }

    pub(crate) fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_dc_cli"))
            .arg("--storage-dir")
            .arg(&self.storage_dir)
            .args(args)
            .output()
            .expect("run dc_cli")
    }

    pub(crate) fn ok_text(&self, args: &[&str]) -> String {
        let out = self.run(args);
        assert!(
            out.status.success(),
            "command {args:?} failed with {:?}:\n{}",
            out.status.code(),
            String::from_utf8_lossy(&out.stdout),
        );
        String::from_utf8(out.stdout).expect("utf8 stdout")
    }

    pub(crate) fn ok_json(&self, args: &[&str]) -> Value {
        let text = self.ok_text(args);
        serde_json::from_str(&text).expect("json stdout")
    }

    /// Runs a command expected to fail and returns the error payload.
    pub(crate) fn err_json(&self, args: &[&str]) -> Value {
        let out = self.run(args);
        assert_eq!(
            out.status.code(),
            Some(2),
            "command {args:?} should exit 2:\n{}",
            String::from_utf8_lossy(&out.stdout),
        );
        serde_json::from_str(&String::from_utf8_lossy(&out.stdout)).expect("json stdout")
    }
}

pub(crate) fn error_code(payload: &Value) -> &str {
    payload
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(Value::as_str)
        .unwrap_or_default()
}
