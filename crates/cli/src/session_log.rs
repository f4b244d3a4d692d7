#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

/// Best-effort record of the last CLI invocation, written next to the
/// database. Overwritten on every run; contains no learner text beyond the
/// command line itself.
pub(crate) struct SessionLog {
    path: PathBuf,
    start: String,
    pid: u32,
    args: Vec<String>,
    command: Option<String>,
    last_error: Option<String>,
    exit: Option<String>,
}

impl SessionLog {
    pub(crate) fn new(storage_dir: &Path) -> Self {
        let this = Self {
            path: storage_dir.join("decisioncard_last_session.txt"),
            start: crate::format_timestamp(crate::now_ms_i64()),
            pid: std::process::id(),
            args: std::env::args().collect(),
            command: None,
            last_error: None,
            exit: None,
        };
        this.flush();
        this
    }

    pub(crate) fn note_command(&mut self, command: &str) {
        self.command = Some(truncate(command.trim(), 240));
        self.flush();
    }

    pub(crate) fn note_error(&mut self, error: &str) {
        let error = error.trim();
        if error.is_empty() {
            return;
        }
        self.last_error = Some(truncate(error, 300));
        self.flush();
    }

    pub(crate) fn note_exit(&mut self, reason: &str) {
        self.exit = Some(truncate(reason.trim(), 120));
        self.flush();
    }

    fn flush(&self) {
        let Some(dir) = self.path.parent() else {
            return;
        };
        let _ = std::fs::create_dir_all(dir);

        let mut out = String::new();
        out.push_str(&format!("start={}\n", self.start));
        out.push_str(&format!("pid={}\n", self.pid));
        out.push_str(&format!("args={:?}\n", self.args));
        if let Some(command) = &self.command {
            out.push_str(&format!("command={command}\n"));
        }
        if let Some(error) = &self.last_error {
            out.push_str(&format!("last_error={error}\n"));
        }
        if let Some(exit) = &self.exit {
            out.push_str(&format!("exit={exit}\n"));
        }
        let _ = std::fs::write(&self.path, out);
    }
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let mut out: String = value.chars().take(max).collect();
        out.push('…');
        out
    }
}
