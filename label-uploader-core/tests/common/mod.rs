#![allow(dead_code)]

use async_trait::async_trait;
use label_uploader_core::contract::{ProviderError, StorageProvider};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

type UploadHook = Box<dyn Fn(&str) + Send + Sync>;

/// In-memory bucket that records calls and tracks how many run at once.
#[derive(Default)]
pub struct RecordingProvider {
    objects: Mutex<HashSet<String>>,
    uploads: Mutex<Vec<(PathBuf, String)>>,
    exists_checks: Mutex<Vec<String>>,
    fail_keys: HashSet<String>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    bucket_error: Option<String>,
    on_upload: Option<UploadHook>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_objects<I: IntoIterator<Item = &'static str>>(self, keys: I) -> Self {
        self.objects
            .lock()
            .unwrap()
            .extend(keys.into_iter().map(String::from));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_on(mut self, key: &str) -> Self {
        self.fail_keys.insert(key.to_string());
        self
    }

    pub fn with_bucket_error(mut self, message: &str) -> Self {
        self.bucket_error = Some(message.to_string());
        self
    }

    /// Runs `hook` with the destination key before each upload is recorded.
    pub fn on_upload<F: Fn(&str) + Send + Sync + 'static>(mut self, hook: F) -> Self {
        self.on_upload = Some(Box::new(hook));
        self
    }

    pub fn uploaded_keys(&self) -> BTreeSet<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(_, key)| key.clone())
            .collect()
    }

    pub fn uploaded_sources(&self) -> Vec<PathBuf> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(src, _)| src.clone())
            .collect()
    }

    pub fn exists_checks(&self) -> Vec<String> {
        self.exists_checks.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StorageProvider for RecordingProvider {
    async fn check_bucket(&self, _bucket: &str) -> Result<(), ProviderError> {
        match &self.bucket_error {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }

    async fn is_exists(&self, _bucket: &str, dst_path: &str) -> Result<bool, ProviderError> {
        self.enter();
        self.exists_checks.lock().unwrap().push(dst_path.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let exists = self.objects.lock().unwrap().contains(dst_path);
        self.leave();
        Ok(exists)
    }

    async fn upload_from_local_file(
        &self,
        src_path: &Path,
        _bucket: &str,
        dst_path: &str,
    ) -> Result<(), ProviderError> {
        self.enter();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(hook) = &self.on_upload {
            hook(dst_path);
        }
        let result = if self.fail_keys.contains(dst_path) {
            Err(format!("simulated failure for {dst_path}").into())
        } else {
            self.objects.lock().unwrap().insert(dst_path.to_string());
            self.uploads
                .lock()
                .unwrap()
                .push((src_path.to_path_buf(), dst_path.to_string()));
            Ok(())
        };
        self.leave();
        result
    }
}

/// Creates `files` (relative paths) under `root`, with parent directories.
pub fn write_tree(root: &Path, files: &[&str]) {
    for file in files {
        let path = root.join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, file.as_bytes()).unwrap();
    }
}
