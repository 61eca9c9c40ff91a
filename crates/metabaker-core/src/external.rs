//! Collaborator interfaces
//!
//! The pipeline talks to the chain, the content store and remote asset
//! hosts only through these traits. Network implementations live in
//! `metabaker-chain` and `metabaker-storage`.

use crate::error::Result;
use crate::types::{ContentId, PinStatus};
use serde_json::Value;

/// A deployed contract: artifact name plus on-chain address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContractRef {
    /// Compiled artifact name
    pub name: String,
    /// Deployed address
    pub address: String,
}

impl ContractRef {
    /// Create contract reference
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// Read-only access to an ERC-721 style contract
#[async_trait::async_trait]
pub trait ChainReader: Send + Sync {
    /// Fail unless `contract` names a known compiled artifact
    async fn verify_contract(&self, contract: &ContractRef) -> Result<()>;

    /// Current `totalSupply()`
    async fn total_supply(&self, contract: &ContractRef) -> Result<u64>;

    /// `tokenURI(index)`
    async fn token_uri(&self, contract: &ContractRef, index: u64) -> Result<String>;
}

/// One file of a directory upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// File name inside the uploaded directory
    pub name: String,
    /// File content
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Create upload file
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Content-addressed storage service
#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    /// Upload files as one directory and return its identifier
    async fn upload_directory(&self, files: Vec<UploadFile>) -> Result<ContentId>;

    /// Pin status of an uploaded directory
    async fn status(&self, cid: &ContentId) -> Result<PinStatus>;
}

/// Fetches previously published assets
#[async_trait::async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Fetch and parse a JSON document
    async fn fetch_json(&self, uri: &str) -> Result<Value>;

    /// Fetch raw bytes
    async fn fetch_bytes(&self, uri: &str) -> Result<Vec<u8>>;
}
