//! Persisted QCM answer table.
//!
//! Logging in from a new device triggers a multiple-choice question about the
//! account. The table maps each question seen so far to its accepted answers.
//! An unseen question is stored with every candidate; a human then deletes the
//! wrong ones so that a single accepted answer remains.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use ecoledirecte_core::{Error, Result};

/// Location of the answer table.
#[derive(Debug, Clone)]
pub struct QcmStore {
    path: PathBuf,
}

impl QcmStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the table. A missing file is an empty table.
    pub fn open(&self) -> Result<QcmTable> {
        let answers = match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                Error::Store(format!("{} is not a QCM table: {}", self.path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(category = "qcm", path = %self.path.display(), "No QCM file yet");
                BTreeMap::new()
            }
            Err(e) => {
                return Err(Error::Store(format!(
                    "cannot read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        Ok(QcmTable {
            path: self.path.clone(),
            answers,
            dirty: false,
        })
    }
}

/// An open answer table. Changes reach the disk on [`QcmTable::commit`].
#[derive(Debug)]
pub struct QcmTable {
    path: PathBuf,
    answers: BTreeMap<String, Vec<String>>,
    dirty: bool,
}

impl QcmTable {
    /// Recorded answers for a question, if it was seen before.
    pub fn answers(&self, question: &str) -> Option<&[String]> {
        self.answers.get(question).map(Vec::as_slice)
    }

    /// The answer to submit: present only when exactly one is recorded.
    pub fn accepted_answer(&self, question: &str) -> Option<&str> {
        match self.answers(question) {
            Some([answer]) => Some(answer.as_str()),
            _ => None,
        }
    }

    pub fn contains(&self, question: &str) -> bool {
        self.answers.contains_key(question)
    }

    /// Store every candidate answer for a new question.
    pub fn record(&mut self, question: impl Into<String>, candidates: Vec<String>) {
        self.answers.insert(question.into(), candidates);
        self.dirty = true;
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the table if it changed.
    ///
    /// The content goes to a temporary file in the same directory which then
    /// replaces the table, so readers never see a partial file.
    pub fn commit(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let content = serde_json::to_string_pretty(&self.answers)?;
        let mut file = tempfile::NamedTempFile::new_in(&dir)
            .map_err(|e| Error::Store(format!("cannot create temp file: {}", e)))?;
        file.write_all(content.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| {
            Error::Store(format!("cannot replace {}: {}", self.path.display(), e))
        })?;

        self.dirty = false;
        info!(
            category = "qcm",
            path = %self.path.display(),
            questions = self.answers.len(),
            "QCM table saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let table = QcmStore::new(dir.path().join("qcm.json")).open().unwrap();
        assert!(table.is_empty());
        assert!(!table.is_dirty());
    }

    #[test]
    fn test_record_and_commit() {
        let dir = tempfile::tempdir().unwrap();
        let store = QcmStore::new(dir.path().join("qcm.json"));

        let mut table = store.open().unwrap();
        table.record(
            "Quel est votre mois de naissance ?",
            vec!["Janvier".into(), "Mars".into()],
        );
        assert!(table.is_dirty());
        table.commit().unwrap();
        assert!(!table.is_dirty());

        let reloaded = store.open().unwrap();
        assert_eq!(
            reloaded.answers("Quel est votre mois de naissance ?").unwrap(),
            &["Janvier".to_string(), "Mars".to_string()]
        );
        assert_eq!(
            reloaded.accepted_answer("Quel est votre mois de naissance ?"),
            None
        );

        // Only the table and no leftover temp file.
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_accepted_answer_requires_exactly_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qcm.json");
        std::fs::write(&path, r#"{"Q1": ["A"], "Q2": [], "Q3": ["A", "B"]}"#).unwrap();

        let table = QcmStore::new(&path).open().unwrap();
        assert_eq!(table.accepted_answer("Q1"), Some("A"));
        assert_eq!(table.accepted_answer("Q2"), None);
        assert_eq!(table.accepted_answer("Q3"), None);
        assert!(table.contains("Q2"));
        assert!(!table.contains("Q4"));
    }

    #[test]
    fn test_invalid_file_is_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qcm.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(QcmStore::new(&path).open(), Err(Error::Store(_))));
    }

    #[test]
    fn test_commit_without_changes_does_not_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qcm.json");
        let mut table = QcmStore::new(&path).open().unwrap();
        table.commit().unwrap();
        assert!(!path.exists());
    }
}
