#![allow(unused)]

//! # contract: storage provider capability set
//!
//! This module defines the single trait ([`StorageProvider`]) the upload pipeline
//! consumes. Concrete backends (S3, GCS, a local directory, test doubles) live
//! outside the core and are selected by name through the
//! [`ProviderRegistry`](crate::registry::ProviderRegistry).
//!
//! ## Interface
//! - Every operation is keyed by bucket name and, where relevant, destination key.
//! - All methods are async and return boxed errors ([`ProviderError`]).
//! - Implementations must tolerate concurrent independent calls: the pipeline holds
//!   no lock around provider calls.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`, so consumers get a `MockStorageProvider`
//!   when building tests or with the `test-export-mocks` feature.

use async_trait::async_trait;
use std::path::Path;

use mockall::{automock, predicate::*};

/// Error type returned by provider operations.
pub type ProviderError = Box<dyn std::error::Error + Send + Sync>;

/// Capability set every storage backend must support.
///
/// The trait is `Send` + `Sync` so one instance can be shared by every upload task.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Verify the bucket is reachable. Called once per run before any upload.
    async fn check_bucket(&self, bucket: &str) -> Result<(), ProviderError>;

    /// Report whether an object already exists at `dst_path` in `bucket`.
    async fn is_exists(&self, bucket: &str, dst_path: &str) -> Result<bool, ProviderError>;

    /// Upload the local file at `src_path` to `dst_path` in `bucket`.
    ///
    /// Only called after [`is_exists`](StorageProvider::is_exists) returned `false`.
    async fn upload_from_local_file(
        &self,
        src_path: &Path,
        bucket: &str,
        dst_path: &str,
    ) -> Result<(), ProviderError>;
}
