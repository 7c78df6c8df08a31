//! Skip-or-upload policy for a single file.
//!
//! This is the only place the pipeline decides between uploading and skipping:
//! existence is checked immediately before the upload call. Nothing guards against
//! another writer creating the same key between the two calls.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::contract::{ProviderError, StorageProvider};
use crate::label::{destination_key, label};

/// Local source file and the object key it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub src_path: PathBuf,
    pub destination: String,
}

/// Shared, read-only state every upload task needs.
#[derive(Clone)]
pub struct Uploader {
    provider: Arc<dyn StorageProvider>,
    bucket: String,
    prefix: String,
    root: PathBuf,
}

impl Uploader {
    /// `root` must already be canonical; labels are computed against it verbatim.
    pub fn new(
        provider: Arc<dyn StorageProvider>,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            provider,
            bucket: bucket.into(),
            prefix: prefix.into(),
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn provider(&self) -> &Arc<dyn StorageProvider> {
        &self.provider
    }

    /// Computes the label of `dir` and the destination key for `file_name` in it.
    pub fn target(&self, dir: &Path, file_name: &str) -> UploadTarget {
        let label = label(&self.root, dir);
        UploadTarget {
            src_path: dir.join(file_name),
            destination: destination_key(&self.prefix, &label, file_name),
        }
    }

    /// Uploads `target` unless its key already exists.
    ///
    /// Returns `Ok(true)` when the upload was skipped. An existence-check error is
    /// returned without attempting the upload.
    pub async fn upload(&self, target: &UploadTarget) -> Result<bool, ProviderError> {
        if self
            .provider
            .is_exists(&self.bucket, &target.destination)
            .await?
        {
            debug!(destination = %target.destination, "Object already exists, skipping");
            return Ok(true);
        }
        self.provider
            .upload_from_local_file(&target.src_path, &self.bucket, &target.destination)
            .await?;
        debug!(
            src = %target.src_path.display(),
            destination = %target.destination,
            "Uploaded"
        );
        Ok(false)
    }

    /// [`target`](Self::target) followed by [`upload`](Self::upload).
    pub async fn decide(&self, dir: &Path, file_name: &str) -> Result<bool, ProviderError> {
        let target = self.target(dir, file_name);
        self.upload(&target).await
    }
}

impl std::fmt::Debug for Uploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Uploader")
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}
