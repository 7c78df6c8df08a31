//! # walker: bounded-concurrency directory upload
//!
//! [`ConcurrentWalker`] walks a directory tree depth-first on a single control
//! flow and spawns one upload task per eligible file.
//!
//! - **Gate**: a [`Semaphore`] with `parallel` permits. The walker acquires a permit
//!   *before* spawning, so dispatch blocks while `parallel` tasks are in flight.
//!   The owned permit moves into the task and is dropped when the task ends,
//!   whatever the outcome (including a panic inside the provider).
//! - **Counter**: [`TaskCounter`] is shared by every task of one run and hands out
//!   1-based sequence numbers for the progress log. It has no other meaning.
//! - **Completion**: all tasks, including those dispatched from nested directories,
//!   go into one [`JoinSet`]. [`ConcurrentWalker::walk`] drains it before returning.
//!
//! Directory listing failures are fatal. Dispatch stops at the failing directory,
//! every task already in flight runs to completion and is logged, and then the
//! error is returned.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::decision::Uploader;
use crate::error::UploadError;
use crate::filetype::FileTypeFilter;
use crate::report::{FileReport, UploadOutcome};

/// Run-scoped, monotonically increasing task sequence.
#[derive(Debug, Default)]
pub struct TaskCounter(AtomicU64);

impl TaskCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments and returns the new value (first call returns 1).
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

enum EntryKind {
    Dir,
    File,
}

struct DirEntry {
    name: String,
    path: PathBuf,
    kind: EntryKind,
}

pub struct ConcurrentWalker {
    uploader: Arc<Uploader>,
    filter: Arc<FileTypeFilter>,
    gate: Arc<Semaphore>,
    parallel: usize,
    counter: Arc<TaskCounter>,
    tasks: JoinSet<FileReport>,
}

impl ConcurrentWalker {
    pub fn new(uploader: Uploader, filter: FileTypeFilter, parallel: usize) -> Self {
        Self {
            uploader: Arc::new(uploader),
            filter: Arc::new(filter),
            // Out-of-range values are rejected by `walk`.
            gate: Arc::new(Semaphore::new(parallel.min(Semaphore::MAX_PERMITS))),
            parallel,
            counter: Arc::new(TaskCounter::new()),
            tasks: JoinSet::new(),
        }
    }

    /// Counter shared with the tasks of this walker.
    pub fn counter(&self) -> Arc<TaskCounter> {
        Arc::clone(&self.counter)
    }

    /// Walks `dir` recursively and returns one report per dispatched file, ordered
    /// by sequence number. Returns only after every dispatched task has finished.
    pub async fn walk(mut self, dir: &Path) -> Result<Vec<FileReport>, UploadError> {
        if self.parallel == 0 {
            return Err(UploadError::InvalidConfig(
                "parallel must be a positive integer".into(),
            ));
        }
        if self.parallel > Semaphore::MAX_PERMITS {
            return Err(UploadError::InvalidConfig(format!(
                "parallel must not exceed {}",
                Semaphore::MAX_PERMITS
            )));
        }
        info!(
            root = %dir.display(),
            parallel = self.parallel,
            "[UPLOAD] Walking directory tree"
        );

        let walked = self.walk_dir(dir.to_path_buf()).await;
        let in_flight = self.tasks.len();
        if let Err(e) = &walked {
            warn!(
                error = %e,
                in_flight,
                "[UPLOAD] Walk aborted, waiting for dispatched tasks before failing"
            );
        }

        let reports = self.wait_all().await;
        info!(
            dispatched = self.counter.current(),
            completed = reports.len(),
            "[UPLOAD] All dispatched tasks finished"
        );
        walked.map(|_| reports)
    }

    fn walk_dir(&mut self, dir: PathBuf) -> BoxFuture<'_, Result<(), UploadError>> {
        async move {
            let entries = read_dir_sorted(&dir).await.map_err(|source| {
                error!(dir = %dir.display(), error = %source, "[UPLOAD][ERROR] Failed to read directory");
                UploadError::ReadDir {
                    path: dir.clone(),
                    source,
                }
            })?;

            for entry in entries {
                match entry.kind {
                    EntryKind::Dir => self.walk_dir(entry.path).await?,
                    EntryKind::File if self.filter.matches(&entry.name) => {
                        self.dispatch(dir.clone(), entry.name).await?;
                    }
                    EntryKind::File => {
                        debug!(path = %entry.path.display(), "Not a target file type, ignoring");
                    }
                }
            }
            Ok(())
        }
        .boxed()
    }

    /// Waits for a gate slot, then spawns the upload task for `dir/file_name`.
    async fn dispatch(&mut self, dir: PathBuf, file_name: String) -> Result<(), UploadError> {
        let permit = Arc::clone(&self.gate)
            .acquire_owned()
            .await
            .map_err(|_| UploadError::GateClosed)?;

        let uploader = Arc::clone(&self.uploader);
        let counter = Arc::clone(&self.counter);
        self.tasks.spawn(async move {
            let _permit = permit;
            let seq = counter.next();
            info!(seq, dir = %dir.display(), file = %file_name, "exec");

            let target = uploader.target(&dir, &file_name);
            let result = AssertUnwindSafe(uploader.upload(&target))
                .catch_unwind()
                .await;
            let outcome = match result {
                Ok(Ok(false)) => UploadOutcome::Uploaded,
                Ok(Ok(true)) => {
                    info!(seq, path = %target.src_path.display(), "[SKIP] already exists");
                    UploadOutcome::SkippedExists
                }
                Ok(Err(e)) => {
                    error!(seq, path = %target.src_path.display(), error = %e, "[ERROR] upload failed");
                    UploadOutcome::Failed(e.to_string())
                }
                Err(panic) => {
                    let message = format!("upload task panicked: {}", panic_message(&*panic));
                    error!(seq, path = %target.src_path.display(), error = %message, "[ERROR] upload failed");
                    UploadOutcome::Failed(message)
                }
            };

            FileReport {
                seq,
                path: target.src_path,
                destination: target.destination,
                outcome,
            }
        });
        Ok(())
    }

    async fn wait_all(&mut self) -> Vec<FileReport> {
        let mut reports = Vec::with_capacity(self.tasks.len());
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => error!(error = %e, "[UPLOAD][ERROR] Upload task did not complete"),
            }
        }
        reports.sort_by_key(|r| r.seq);
        reports
    }
}

/// Lists `dir` sorted by file name. Symlinks to files count as files; symlinked
/// directories and anything else are ignored.
async fn read_dir_sorted(dir: &Path) -> std::io::Result<Vec<DirEntry>> {
    let mut read_dir = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(entry) = read_dir.next_entry().await? {
        let path = entry.path();
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                warn!(name = ?raw, dir = %dir.display(), "Skipping entry with non UTF-8 name");
                continue;
            }
        };

        let file_type = entry.file_type().await?;
        let kind = if file_type.is_dir() {
            EntryKind::Dir
        } else if file_type.is_file() {
            EntryKind::File
        } else if file_type.is_symlink() {
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => EntryKind::File,
                Ok(_) => {
                    warn!(path = %path.display(), "Skipping symlinked directory");
                    continue;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping dangling symlink");
                    continue;
                }
            }
        } else {
            continue;
        };

        entries.push(DirEntry { name, path, kind });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
