//! Explicit provider registry.
//!
//! The composition root registers every backend it wants to offer before a run
//! starts; nothing registers itself as a side effect of being linked in.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::contract::{ProviderError, StorageProvider};
use crate::error::UploadError;

/// Constructor for a provider, usually reading credentials from the environment.
pub type ProviderConstructor =
    Box<dyn Fn() -> Result<Arc<dyn StorageProvider>, ProviderError> + Send + Sync>;

/// Maps provider names (e.g. `"s3"`, `"gcs"`) to their constructors.
#[derive(Default)]
pub struct ProviderRegistry {
    constructors: BTreeMap<String, ProviderConstructor>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `constructor` under `name`, replacing any earlier registration.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Result<Arc<dyn StorageProvider>, ProviderError> + Send + Sync + 'static,
    {
        let name = name.into();
        if self
            .constructors
            .insert(name.clone(), Box::new(constructor))
            .is_some()
        {
            debug!(provider = %name, "Replaced existing provider registration");
        } else {
            debug!(provider = %name, "Registered provider");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.constructors.keys().cloned().collect()
    }

    /// Constructs the provider registered under `name`.
    pub fn create(&self, name: &str) -> Result<Arc<dyn StorageProvider>, UploadError> {
        let constructor = self.constructors.get(name).ok_or_else(|| {
            error!(provider = %name, available = ?self.names(), "Unknown provider requested");
            UploadError::UnknownProvider {
                name: name.to_string(),
                available: self.names(),
            }
        })?;
        let provider = constructor().map_err(|e| {
            error!(provider = %name, error = %e, "Failed to construct provider");
            UploadError::ProviderInit {
                name: name.to_string(),
                source: e,
            }
        })?;
        info!(provider = %name, "Provider constructed");
        Ok(provider)
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}
