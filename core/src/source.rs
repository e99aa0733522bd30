//! Reading raw documents from a corpus location.
//!
//! A source never fails as a whole: every item it visits comes back either as
//! a loaded [`Document`] or as a skip with the reason attached.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// A document as supplied by a source: its identifier and raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into() }
    }

    /// First `chars` characters with line breaks flattened, for result listings.
    pub fn snippet(&self, chars: usize) -> String {
        let head: String = self
            .text
            .chars()
            .take(chars)
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        format!("{head}...")
    }
}

#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("unsupported file type {0:?}")]
    Unsupported(String),
    #[error("editor lock file")]
    LockFile,
    #[error("no text content")]
    Empty,
    #[error("unreadable: {0}")]
    Unreadable(String),
}

#[derive(Debug)]
pub enum ItemOutcome {
    Loaded(Document),
    Skipped { path: PathBuf, reason: SkipReason },
}

/// Everything a source visited, in visiting order.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub items: Vec<ItemOutcome>,
}

impl BatchOutcome {
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.items.iter().filter_map(|item| match item {
            ItemOutcome::Loaded(doc) => Some(doc),
            ItemOutcome::Skipped { .. } => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&Path, &SkipReason)> {
        self.items.iter().filter_map(|item| match item {
            ItemOutcome::Skipped { path, reason } => Some((path.as_path(), reason)),
            ItemOutcome::Loaded(_) => None,
        })
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.items
            .into_iter()
            .filter_map(|item| match item {
                ItemOutcome::Loaded(doc) => Some(doc),
                ItemOutcome::Skipped { .. } => None,
            })
            .collect()
    }
}

/// Anything that can produce an ordered batch of documents.
pub trait DocumentSource {
    fn read(&self) -> BatchOutcome;
}

/// Plain-text files under a directory, visited recursively.
///
/// Within each directory the files are read in name order, then each
/// subdirectory is descended into, also in name order.
///
/// Word-processor and PDF files are reported as unsupported; extracting them
/// is left to other [`DocumentSource`] implementations.
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    fn read_file(path: &Path) -> Result<Document, SkipReason> {
        let name = path.file_name().and_then(|s| s.to_str()).unwrap_or_default().to_string();
        match path.extension().and_then(|s| s.to_str()).unwrap_or("") {
            "txt" => {}
            // Word keeps `~$name.docx` next to an open document
            "docx" if name.starts_with('~') => return Err(SkipReason::LockFile),
            other => return Err(SkipReason::Unsupported(other.to_string())),
        }
        let text = fs::read_to_string(path).map_err(|e| SkipReason::Unreadable(e.to_string()))?;
        if text.trim().is_empty() {
            return Err(SkipReason::Empty);
        }
        Ok(Document { id: name, text })
    }
}

impl DocumentSource for DirectorySource {
    fn read(&self) -> BatchOutcome {
        tracing::info!(root = %self.root.display(), "reading documents");
        let mut outcome = BatchOutcome::default();
        // a directory's own files come before its subdirectories
        let walker = WalkDir::new(&self.root).sort_by(|a, b| {
            a.file_type()
                .is_dir()
                .cmp(&b.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        });
        for entry in walker {
            let item = match entry {
                Ok(entry) if !entry.file_type().is_file() => continue,
                Ok(entry) => match Self::read_file(entry.path()) {
                    Ok(doc) => ItemOutcome::Loaded(doc),
                    Err(reason) => ItemOutcome::Skipped { path: entry.into_path(), reason },
                },
                Err(err) => ItemOutcome::Skipped {
                    path: err.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone()),
                    reason: SkipReason::Unreadable(err.to_string()),
                },
            };
            if let ItemOutcome::Skipped { path, reason } = &item {
                tracing::warn!(path = %path.display(), %reason, "skipping document");
            }
            outcome.items.push(item);
        }
        tracing::info!(loaded = outcome.documents().count(), skipped = outcome.skipped().count(), "finished reading documents");
        outcome
    }
}
