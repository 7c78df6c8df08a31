use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::error::UploadError;
use crate::filetype::{parse_type_list, FileTypeFilter, DEFAULT_TYPES};
use crate::label::normalize_prefix;

pub const DEFAULT_PARALLEL: usize = 2;

/// Run configuration, supplied by the CLI layer or a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadConfig {
    /// Traversal root
    pub input: PathBuf,
    #[serde(default = "default_types")]
    pub types: Vec<String>,
    #[serde(default)]
    pub include_all_types: bool,
    /// Uploaded once, before the walk
    #[serde(default)]
    pub label_file: Option<PathBuf>,
    pub provider: String,
    pub bucket: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_parallel")]
    pub parallel: usize,
    #[serde(default)]
    pub fail_on_file_error: bool,
}

fn default_types() -> Vec<String> {
    parse_type_list(DEFAULT_TYPES)
}

fn default_parallel() -> usize {
    DEFAULT_PARALLEL
}

impl UploadConfig {
    pub fn new(
        input: impl Into<PathBuf>,
        provider: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            input: input.into(),
            types: default_types(),
            include_all_types: false,
            label_file: None,
            provider: provider.into(),
            bucket: bucket.into(),
            prefix: String::new(),
            parallel: DEFAULT_PARALLEL,
            fail_on_file_error: false,
        }
    }

    /// Replaces the extension list from a comma-delimited string.
    pub fn with_types(mut self, list: &str) -> Self {
        self.types = parse_type_list(list);
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_parallel(mut self, parallel: usize) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn file_type_filter(&self) -> FileTypeFilter {
        FileTypeFilter::new(&self.types).with_include_all(self.include_all_types)
    }

    /// Prefix with leading slashes removed.
    pub fn normalized_prefix(&self) -> String {
        normalize_prefix(&self.prefix)
    }

    pub fn validate(&self) -> Result<(), UploadError> {
        if self.input.as_os_str().is_empty() {
            return Err(UploadError::InvalidConfig("input directory is required".into()));
        }
        if self.provider.trim().is_empty() {
            return Err(UploadError::InvalidConfig("provider is required".into()));
        }
        if self.bucket.trim().is_empty() {
            return Err(UploadError::InvalidConfig("bucket is required".into()));
        }
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
        if self.types.is_empty() && !self.include_all_types {
            return Err(UploadError::InvalidConfig(
                "no file types configured and include-all is disabled".into(),
            ));
        }
        Ok(())
    }

    pub fn trace_loaded(&self) {
        info!(
            input = %self.input.display(),
            provider = %self.provider,
            bucket = %self.bucket,
            prefix = %self.prefix,
            parallel = self.parallel,
            include_all_types = self.include_all_types,
            "Loaded UploadConfig"
        );
        debug!(?self, "UploadConfig loaded (full debug)");
    }
}
