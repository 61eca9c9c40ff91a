//! Metabaker configuration
//!
//! Loaded from `metabaker.toml` in the project root and passed explicitly to
//! every task. Environment variables override the credential and RPC URL.

use crate::error::{MetabakerError, Result};
use crate::layout::ProjectLayout;
use crate::types::{EmptyPolicy, IndexBase};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "metabaker.toml";

/// Environment variable overriding `storage_key`
pub const STORAGE_KEY_ENV: &str = "METABAKER_STORAGE_KEY";

/// Environment variable overriding `rpc_url`
pub const RPC_URL_ENV: &str = "METABAKER_RPC_URL";

/// Metabaker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetabakerConfig {
    /// Content store API token
    pub storage_key: Option<String>,
    /// Image file extension, without the dot
    pub image_extension: String,
    /// Base metadata directory, relative to the project root
    pub base_metadata_path: PathBuf,
    /// Compiled contract artifacts directory, relative to the project root
    pub artifacts_path: PathBuf,
    /// Chain JSON-RPC endpoint
    pub rpc_url: String,
    /// Content store API endpoint
    pub storage_endpoint: String,
    /// HTTP gateway used to fetch `ipfs://` URIs
    pub ipfs_gateway: String,
    /// First token index
    pub index_base: IndexBase,
    /// Behaviour on empty image or metadata sets
    pub empty_policy: EmptyPolicy,
    /// Per-request HTTP timeout in seconds
    pub request_timeout_secs: u64,
}

impl MetabakerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With storage key
    #[inline]
    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = Some(key.into());
        self
    }

    /// With image extension
    #[inline]
    #[must_use]
    pub fn with_image_extension(mut self, extension: impl Into<String>) -> Self {
        self.image_extension = extension.into();
        self
    }

    /// With index base
    #[inline]
    #[must_use]
    pub fn with_index_base(mut self, base: IndexBase) -> Self {
        self.index_base = base;
        self
    }

    /// With empty-set policy
    #[inline]
    #[must_use]
    pub fn with_empty_policy(mut self, policy: EmptyPolicy) -> Self {
        self.empty_policy = policy;
        self
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// - `MetabakerError::Config` on invalid TOML or unknown values
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| MetabakerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration for a project
    ///
    /// Reads `explicit` if given, otherwise `<root>/metabaker.toml` when it
    /// exists, otherwise falls back to defaults.
    ///
    /// # Errors
    /// - `MetabakerError::Io` if an explicit file cannot be read
    /// - `MetabakerError::Config` on invalid contents
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = root.join(CONFIG_FILE_NAME);
                if !candidate.exists() {
                    tracing::debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, root.display());
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let text = std::fs::read_to_string(&path).map_err(|e| MetabakerError::io(&path, e))?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Apply environment overrides using the given lookup
    #[must_use]
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(STORAGE_KEY_ENV).filter(|k| !k.is_empty()) {
            self.storage_key = Some(key);
        }
        if let Some(url) = lookup(RPC_URL_ENV).filter(|u| !u.is_empty()) {
            self.rpc_url = url;
        }
        self
    }

    /// Storage credential, required before any upload
    ///
    /// # Errors
    /// - `MetabakerError::InvalidArgument` if no key is configured
    pub fn require_storage_key(&self) -> Result<&str> {
        self.storage_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                MetabakerError::invalid_argument(
                    "please set storage_key in metabaker.toml or METABAKER_STORAGE_KEY",
                )
            })
    }

    /// Directory layout for a project root
    #[must_use]
    pub fn layout(&self, root: &Path) -> ProjectLayout {
        ProjectLayout::new(root.join(&self.base_metadata_path), self.image_extension.clone())
    }

    /// Artifacts directory for a project root
    #[must_use]
    pub fn artifacts_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.artifacts_path)
    }

    fn validate(&self) -> Result<()> {
        let ext = self.image_extension.trim_start_matches('.');
        if ext.is_empty() || ext.contains(['/', '\\']) {
            return Err(MetabakerError::Config(format!(
                "invalid image_extension: {:?}",
                self.image_extension
            )));
        }
        Ok(())
    }
}

impl Default for MetabakerConfig {
    fn default() -> Self {
        Self {
            storage_key: None,
            image_extension: "png".to_string(),
            base_metadata_path: PathBuf::from("metadata"),
            artifacts_path: PathBuf::from("artifacts"),
            rpc_url: "http://127.0.0.1:8545".to_string(),
            storage_endpoint: "https://api.nft.storage".to_string(),
            ipfs_gateway: "https://nftstorage.link".to_string(),
            index_base: IndexBase::Zero,
            empty_policy: EmptyPolicy::Warn,
            request_timeout_secs: 60,
        }
    }
}
