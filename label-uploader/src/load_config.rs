//! `load_config` module: loads an optional YAML config file and merges it with
//! command-line flags into the core [`UploadConfig`].
//!
//! # Responsibilities
//! - Parse the user-supplied YAML file into a partial, all-optional struct
//! - Accept `types` either as a YAML list or as a comma-delimited string
//! - Apply command-line flags on top of file values (flags win)
//! - Validate the merged result before any provider is constructed
//!
//! Credentials are never read here; providers pick them up from the environment.
//!
//! # Errors
//! All errors use `anyhow::Error` and are surfaced at the CLI boundary.

use crate::cli::UploadArgs;
use anyhow::{Context, Result};
use label_uploader_core::config::{UploadConfig, DEFAULT_PARALLEL};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub input: Option<PathBuf>,
    pub types: Option<TypeList>,
    pub include_all_types: Option<bool>,
    pub label_file: Option<PathBuf>,
    pub provider: Option<String>,
    pub bucket: Option<String>,
    pub prefix: Option<String>,
    pub parallel: Option<usize>,
    pub fail_on_file_error: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TypeList {
    List(Vec<String>),
    Csv(String),
}

impl TypeList {
    pub fn to_comma_list(&self) -> String {
        match self {
            TypeList::List(items) => items.join(","),
            TypeList::Csv(list) => list.clone(),
        }
    }
}

/// Reads and parses a YAML config file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ConfigFile> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    match serde_yaml::from_str::<ConfigFile>(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Merges the optional config file with command-line flags.
pub fn resolve_config(args: &UploadArgs) -> Result<UploadConfig> {
    let file = match &args.config {
        Some(path) => load_config(path)?,
        None => ConfigFile::default(),
    };

    let input = args
        .input
        .clone()
        .or(file.input)
        .context("input directory is required (--input or `input:` in config)")?;
    let provider = args
        .provider
        .clone()
        .or(file.provider)
        .context("provider is required (--provider or `provider:` in config)")?;
    let bucket = args
        .bucket
        .clone()
        .or(file.bucket)
        .context("bucket is required (--bucket or `bucket:` in config)")?;

    let mut config = UploadConfig::new(input, provider, bucket);
    if let Some(types) = args
        .types
        .clone()
        .or_else(|| file.types.as_ref().map(TypeList::to_comma_list))
    {
        config = config.with_types(&types);
    }
    config.include_all_types = args.include_all_types || file.include_all_types.unwrap_or(false);
    config.label_file = args.label_file.clone().or(file.label_file);
    config.prefix = args.prefix.clone().or(file.prefix).unwrap_or_default();
    config.parallel = args.parallel.or(file.parallel).unwrap_or(DEFAULT_PARALLEL);
    config.fail_on_file_error = args.fail_on_error || file.fail_on_file_error.unwrap_or(false);

    config.validate()?;
    info!(
        provider = %config.provider,
        bucket = %config.bucket,
        parallel = config.parallel,
        "Configuration resolved"
    );
    Ok(config)
}
