//! Per-file outcomes and the aggregated run report.

use serde::Serialize;
use std::path::PathBuf;

/// Result of one upload task. Produced once per candidate file, never revised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum UploadOutcome {
    Uploaded,
    /// The destination key already existed; nothing was sent
    SkippedExists,
    Failed(String),
}

impl UploadOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, UploadOutcome::Failed(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// Sequence number assigned at dispatch
    pub seq: u64,
    pub path: PathBuf,
    pub destination: String,
    pub outcome: UploadOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub bucket: String,
    /// Outcome of the label file uploaded before the walk, if one was configured
    pub label_file: Option<FileReport>,
    pub files: Vec<FileReport>,
}

impl RunReport {
    pub fn dispatched(&self) -> usize {
        self.files.len()
    }

    pub fn uploaded(&self) -> usize {
        self.count(|o| matches!(o, UploadOutcome::Uploaded))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, UploadOutcome::SkippedExists))
    }

    pub fn failed(&self) -> usize {
        self.count(UploadOutcome::is_failed)
    }

    fn count(&self, pred: impl Fn(&UploadOutcome) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.outcome)).count()
    }

    /// Destination keys of every file with the given outcome, sorted.
    pub fn destinations(&self, outcome: &UploadOutcome) -> Vec<String> {
        let mut keys: Vec<String> = self
            .files
            .iter()
            .filter(|f| &f.outcome == outcome)
            .map(|f| f.destination.clone())
            .collect();
        keys.sort();
        keys
    }
}
