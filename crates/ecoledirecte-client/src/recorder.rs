//! Writes raw API responses to disk for troubleshooting.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Optional dump directory; a disabled recorder does nothing.
#[derive(Debug, Clone, Default)]
pub struct DebugRecorder {
    dir: Option<PathBuf>,
}

impl DebugRecorder {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Write `body` to `<dir>/<label>.json`, pretty-printed when it is JSON.
    ///
    /// Failures are logged and never reach the caller.
    pub fn record(&self, label: &str, body: &str) {
        let Some(dir) = &self.dir else {
            return;
        };

        let content = match serde_json::from_str::<serde_json::Value>(body) {
            Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| body.to_string()),
            Err(_) => body.to_string(),
        };

        let path = dir.join(format!("{}.json", sanitize_label(label)));
        let result = std::fs::create_dir_all(dir).and_then(|_| std::fs::write(&path, content));
        match result {
            Ok(()) => debug!(category = "debug", path = %path.display(), "Response recorded"),
            Err(e) => warn!(
                category = "debug",
                path = %path.display(),
                error = %e,
                "Failed to record response"
            ),
        }
    }
}

fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_recorder_writes_nothing() {
        let recorder = DebugRecorder::disabled();
        assert!(!recorder.is_enabled());
        recorder.record("login", "{}");
    }

    #[test]
    fn test_records_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = DebugRecorder::new(Some(dir.path().join("dumps")));
        recorder.record("homework_2024-05-13", r#"{"code":200,"data":{}}"#);

        let written =
            std::fs::read_to_string(dir.path().join("dumps/homework_2024-05-13.json")).unwrap();
        assert!(written.contains("\n"));
        assert!(written.contains("\"code\": 200"));
    }

    #[test]
    fn test_label_sanitized() {
        assert_eq!(sanitize_label("notes/42 get"), "notes_42_get");
    }
}
