//! Error types for a run.
//!
//! Only run-aborting conditions are errors here. Per-file failures are converted
//! into [`UploadOutcome::Failed`](crate::report::UploadOutcome::Failed) at the task
//! boundary and never travel through this type, except as the aggregated
//! [`UploadError::FilesFailed`] under the strict failure policy.

use std::path::PathBuf;
use thiserror::Error;

use crate::contract::ProviderError;

/// Fatal error for an upload run.
#[derive(Error, Debug)]
pub enum UploadError {
    /// Configuration rejected before any provider call
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown provider '{name}' (available: {available:?})")]
    UnknownProvider { name: String, available: Vec<String> },

    #[error("Failed to initialise provider '{name}': {source}")]
    ProviderInit {
        name: String,
        #[source]
        source: ProviderError,
    },

    /// The bucket check failed; no upload was attempted
    #[error("Bucket '{bucket}' is not reachable: {source}")]
    BucketUnreachable {
        bucket: String,
        #[source]
        source: ProviderError,
    },

    #[error("Cannot resolve traversal root '{path}': {source}")]
    TraversalRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory listing failed during the walk
    #[error("Failed to read directory '{path}': {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to upload label file '{path}': {source}")]
    LabelFile {
        path: PathBuf,
        #[source]
        source: ProviderError,
    },

    #[error("Concurrency gate closed")]
    GateClosed,

    /// Raised after the walk completes when `fail_on_file_error` is set
    #[error("{failed} of {total} file uploads failed")]
    FilesFailed { failed: usize, total: usize },
}

/// Result type for run-level operations
pub type UploadResult<T> = Result<T, UploadError>;
