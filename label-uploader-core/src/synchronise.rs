//! High-level pipeline: bucket check → label file → directory walk → report.
//!
//! This module provides the top-level operation for one upload run. It:
//!   - Validates the [`UploadConfig`] before touching the provider
//!   - Verifies the bucket is reachable (fatal on failure, nothing is uploaded)
//!   - Uploads the optional label file synchronously (fatal on provider error)
//!   - Walks the traversal root with a [`ConcurrentWalker`] and waits for every task
//!   - Applies the per-file failure policy and returns a [`RunReport`]
//!
//! # Failure policy
//! Per-file failures are logged and recorded in the report. They only fail the run
//! when `fail_on_file_error` is set, and even then only after every task finished.
//!
//! # Navigation
//! - Main entrypoints: [`run_upload`], [`run_with_registry`]

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::config::UploadConfig;
use crate::contract::{ProviderError, StorageProvider};
use crate::decision::Uploader;
use crate::error::UploadError;
use crate::registry::ProviderRegistry;
use crate::report::{FileReport, RunReport, UploadOutcome};
use crate::walker::ConcurrentWalker;

/// Creates the configured provider from `registry` and runs [`run_upload`].
pub async fn run_with_registry(
    config: &UploadConfig,
    registry: &ProviderRegistry,
) -> Result<RunReport, UploadError> {
    config.validate()?;
    let provider = registry.create(&config.provider)?;
    run_upload(config, provider).await
}

pub async fn run_upload(
    config: &UploadConfig,
    provider: Arc<dyn StorageProvider>,
) -> Result<RunReport, UploadError> {
    let run_id = Uuid::new_v4();
    let span = info_span!("upload_run", %run_id, bucket = %config.bucket);
    run_upload_inner(config, provider).instrument(span).await
}

async fn run_upload_inner(
    config: &UploadConfig,
    provider: Arc<dyn StorageProvider>,
) -> Result<RunReport, UploadError> {
    config.validate()?;
    config.trace_loaded();

    if let Err(e) = provider.check_bucket(&config.bucket).await {
        error!(bucket = %config.bucket, error = %e, "[UPLOAD][ERROR] Bucket check failed");
        return Err(UploadError::BucketUnreachable {
            bucket: config.bucket.clone(),
            source: e,
        });
    }
    info!(bucket = %config.bucket, "[UPLOAD] Bucket is reachable");

    let root = tokio::fs::canonicalize(&config.input)
        .await
        .map_err(|source| {
            error!(input = %config.input.display(), error = %source, "[UPLOAD][ERROR] Cannot resolve input directory");
            UploadError::TraversalRoot {
                path: config.input.clone(),
                source,
            }
        })?;

    let uploader = Uploader::new(
        provider,
        config.bucket.clone(),
        config.normalized_prefix(),
        root.clone(),
    );

    let label_file = match &config.label_file {
        Some(path) => Some(upload_label_file(&uploader, path).await?),
        None => None,
    };

    let walker = ConcurrentWalker::new(uploader, config.file_type_filter(), config.parallel);
    let files = walker.walk(&root).await?;

    let report = RunReport {
        bucket: config.bucket.clone(),
        label_file,
        files,
    };
    info!(
        dispatched = report.dispatched(),
        uploaded = report.uploaded(),
        skipped = report.skipped(),
        failed = report.failed(),
        "[UPLOAD] Run complete"
    );

    if config.fail_on_file_error && report.failed() > 0 {
        error!(failed = report.failed(), "[UPLOAD][ERROR] Failing run because of per-file errors");
        return Err(UploadError::FilesFailed {
            failed: report.failed(),
            total: report.dispatched(),
        });
    }
    Ok(report)
}

/// Uploads the label file outside the walk. Any error here aborts the run.
async fn upload_label_file(uploader: &Uploader, path: &Path) -> Result<FileReport, UploadError> {
    let label_error = |source: ProviderError| {
        error!(path = %path.display(), error = %source, "[UPLOAD][ERROR] Label file upload failed");
        UploadError::LabelFile {
            path: path.to_path_buf(),
            source,
        }
    };

    let resolved = tokio::fs::canonicalize(path)
        .await
        .map_err(|e| label_error(Box::new(e)))?;
    let (resolved_dir, file_name) = match (resolved.parent(), resolved.file_name()) {
        (Some(dir), Some(name)) => (dir, name.to_string_lossy().into_owned()),
        _ => return Err(label_error("label file path has no file name".into())),
    };

    // Outside the root the label is the directory as given, not the resolved one,
    // so `labels.csv` maps to `prefix/labels.csv`.
    let label_dir = if resolved_dir.starts_with(uploader.root()) {
        resolved_dir.to_path_buf()
    } else {
        path.parent().map(Path::to_path_buf).unwrap_or_default()
    };

    let mut target = uploader.target(&label_dir, &file_name);
    target.src_path = resolved.clone();
    info!(path = %resolved.display(), destination = %target.destination, "[UPLOAD] Uploading label file");
    let skipped = uploader.upload(&target).await.map_err(label_error)?;
    let outcome = if skipped {
        info!(path = %resolved.display(), "[SKIP] already exists");
        UploadOutcome::SkippedExists
    } else {
        UploadOutcome::Uploaded
    };

    Ok(FileReport {
        seq: 0,
        path: target.src_path,
        destination: target.destination,
        outcome,
    })
}
