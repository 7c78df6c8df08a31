//! # Storage backends
//!
//! Concrete [`StorageProvider`] implementations on top of the `object_store` crate.
//! One [`ObjectStoreProvider`] type covers every backend; the [`Backend`] decides
//! how the store for a bucket is built:
//!
//! - `s3`: `AmazonS3Builder::from_env()` (`AWS_ACCESS_KEY_ID`, `AWS_REGION`, ...)
//! - `gcs`: `GoogleCloudStorageBuilder::from_env()` (`GOOGLE_SERVICE_ACCOUNT`, ...)
//! - `local`: the bucket name is an existing local directory
//!
//! Stores are built lazily per bucket on first use and cached.

use async_trait::async_trait;
use label_uploader_core::contract::{ProviderError, StorageProvider};
use label_uploader_core::registry::ProviderRegistry;
use object_store::aws::AmazonS3Builder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::buffered::BufWriter;
use object_store::ObjectStore;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    S3,
    Gcs,
    Local,
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::S3 => "s3",
            Backend::Gcs => "gcs",
            Backend::Local => "local",
        }
    }
}

pub struct ObjectStoreProvider {
    backend: Backend,
    stores: Mutex<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl ObjectStoreProvider {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            stores: Mutex::new(HashMap::new()),
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    fn build_store(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>, ProviderError> {
        let store: Arc<dyn ObjectStore> = match self.backend {
            Backend::S3 => Arc::new(
                AmazonS3Builder::from_env()
                    .with_bucket_name(bucket)
                    .build()?,
            ),
            Backend::Gcs => Arc::new(
                GoogleCloudStorageBuilder::from_env()
                    .with_bucket_name(bucket)
                    .build()?,
            ),
            Backend::Local => {
                let dir = Path::new(bucket);
                if !dir.is_dir() {
                    return Err(format!("local bucket '{}' is not a directory", bucket).into());
                }
                Arc::new(LocalFileSystem::new_with_prefix(dir)?)
            }
        };
        info!(backend = self.backend.name(), bucket, "Built object store");
        Ok(store)
    }

    fn store(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>, ProviderError> {
        let mut stores = self
            .stores
            .lock()
            .map_err(|_| ProviderError::from("object store cache lock poisoned"))?;
        if let Some(store) = stores.get(bucket) {
            return Ok(Arc::clone(store));
        }
        let store = self.build_store(bucket)?;
        stores.insert(bucket.to_string(), Arc::clone(&store));
        Ok(store)
    }
}

#[async_trait]
impl StorageProvider for ObjectStoreProvider {
    async fn check_bucket(&self, bucket: &str) -> Result<(), ProviderError> {
        let store = self.store(bucket)?;
        store.list_with_delimiter(None).await?;
        debug!(backend = self.backend.name(), bucket, "Bucket listing succeeded");
        Ok(())
    }

    async fn is_exists(&self, bucket: &str, dst_path: &str) -> Result<bool, ProviderError> {
        let store = self.store(bucket)?;
        let location = ObjectPath::parse(dst_path)?;
        match store.head(&location).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn upload_from_local_file(
        &self,
        src_path: &Path,
        bucket: &str,
        dst_path: &str,
    ) -> Result<(), ProviderError> {
        let store = self.store(bucket)?;
        let location = ObjectPath::parse(dst_path)?;
        let mut file = tokio::fs::File::open(src_path).await?;

        // Small files go out as a single put, larger ones as a multipart upload.
        let mut writer = BufWriter::new(store, location);
        let size = match tokio::io::copy(&mut file, &mut writer).await {
            Ok(size) => size,
            Err(e) => {
                if let Err(abort_err) = writer.abort().await {
                    warn!(bucket, dst_path, error = %abort_err, "Failed to abort partial upload");
                }
                return Err(e.into());
            }
        };
        writer.shutdown().await?;
        debug!(
            backend = self.backend.name(),
            bucket,
            dst_path,
            size,
            "Object written"
        );
        Ok(())
    }
}

/// Registers the `s3`, `gcs` and `local` providers.
pub fn register_default_providers(registry: &mut ProviderRegistry) {
    for backend in [Backend::S3, Backend::Gcs, Backend::Local] {
        registry.register(backend.name(), move || {
            Ok(Arc::new(ObjectStoreProvider::new(backend)) as Arc<dyn StorageProvider>)
        });
    }
}
