//! Testing utilities for Metabaker workspace
//!
//! In-memory collaborators and temporary project fixtures.

#![allow(missing_docs)]

use metabaker_core::{
    AssetFetcher, ChainReader, ContentId, ContentStore, ContractRef, MetabakerConfig,
    MetabakerError, PinStatus, ProjectLayout, Result, UploadFile,
};
use serde_json::Value;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tempfile::TempDir;

/// Chain with a fixed supply and per-index token URIs
#[derive(Debug, Default)]
pub struct StaticChain {
    pub supply: u64,
    pub token_uris: HashMap<u64, String>,
    pub fail_supply: bool,
    /// Known artifact names; empty accepts any contract
    pub artifacts: BTreeSet<String>,
    supply_reads: Mutex<usize>,
}

impl StaticChain {
    pub fn with_supply(supply: u64) -> Self {
        Self {
            supply,
            ..Self::default()
        }
    }

    pub fn with_token_uri(mut self, index: u64, uri: impl Into<String>) -> Self {
        self.token_uris.insert(index, uri.into());
        self
    }

    /// Only accept contracts with a registered artifact
    pub fn with_artifact(mut self, name: impl Into<String>) -> Self {
        self.artifacts.insert(name.into());
        self
    }

    pub fn failing() -> Self {
        Self {
            fail_supply: true,
            ..Self::default()
        }
    }

    pub fn supply_reads(&self) -> usize {
        *self.supply_reads.lock()
    }
}

#[async_trait::async_trait]
impl ChainReader for StaticChain {
    async fn verify_contract(&self, contract: &ContractRef) -> Result<()> {
        if self.artifacts.is_empty() || self.artifacts.contains(&contract.name) {
            Ok(())
        } else {
            Err(MetabakerError::invalid_argument(format!(
                "artifact for contract {} not found",
                contract.name
            )))
        }
    }

    async fn total_supply(&self, _contract: &ContractRef) -> Result<u64> {
        *self.supply_reads.lock() += 1;
        if self.fail_supply {
            return Err(MetabakerError::external("eth_call totalSupply: connection refused"));
        }
        Ok(self.supply)
    }

    async fn token_uri(&self, _contract: &ContractRef, index: u64) -> Result<String> {
        self.token_uris
            .get(&index)
            .cloned()
            .ok_or_else(|| MetabakerError::external(format!("tokenURI({index}) reverted")))
    }
}

/// Content store that keeps every uploaded directory in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub fail_uploads: bool,
    uploads: Mutex<Vec<Vec<UploadFile>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_uploads: true,
            ..Self::default()
        }
    }

    /// Uploaded directories in upload order
    pub fn uploads(&self) -> Vec<Vec<UploadFile>> {
        self.uploads.lock().clone()
    }

    /// Identifier the store assigns to the n-th upload
    pub fn cid_for(n: usize) -> String {
        format!("bafymemory{n}")
    }
}

#[async_trait::async_trait]
impl ContentStore for MemoryStore {
    async fn upload_directory(&self, files: Vec<UploadFile>) -> Result<ContentId> {
        if self.fail_uploads {
            return Err(MetabakerError::external("upload rejected: 401 Unauthorized"));
        }
        let mut uploads = self.uploads.lock();
        uploads.push(files);
        ContentId::new(Self::cid_for(uploads.len() - 1))
    }

    async fn status(&self, _cid: &ContentId) -> Result<PinStatus> {
        Ok(PinStatus::Pinned)
    }
}

/// Canned responses keyed by URI
#[derive(Debug, Clone)]
pub enum Canned {
    Json(Value),
    Bytes(Vec<u8>),
}

/// Fetcher serving canned responses
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    responses: HashMap<String, Canned>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(mut self, uri: impl Into<String>, value: Value) -> Self {
        self.responses.insert(uri.into(), Canned::Json(value));
        self
    }

    pub fn with_bytes(mut self, uri: impl Into<String>, bytes: &[u8]) -> Self {
        self.responses.insert(uri.into(), Canned::Bytes(bytes.to_vec()));
        self
    }
}

#[async_trait::async_trait]
impl AssetFetcher for MemoryFetcher {
    async fn fetch_json(&self, uri: &str) -> Result<Value> {
        match self.responses.get(uri) {
            Some(Canned::Json(value)) => Ok(value.clone()),
            Some(Canned::Bytes(_)) => Err(MetabakerError::external(format!("{uri} is not JSON"))),
            None => Err(MetabakerError::external(format!("GET {uri}: 404 Not Found"))),
        }
    }

    async fn fetch_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        match self.responses.get(uri) {
            Some(Canned::Bytes(bytes)) => Ok(bytes.clone()),
            Some(Canned::Json(value)) => Ok(value.to_string().into_bytes()),
            None => Err(MetabakerError::external(format!("GET {uri}: 404 Not Found"))),
        }
    }
}

/// Temporary project with a configured layout
pub struct TestProject {
    pub dir: TempDir,
    pub config: MetabakerConfig,
}

impl TestProject {
    pub fn new() -> Self {
        Self::with_config(MetabakerConfig::new().with_storage_key("test-key"))
    }

    pub fn with_config(config: MetabakerConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let project = Self { dir, config };
        project.layout().ensure_dirs().unwrap();
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn layout(&self) -> ProjectLayout {
        self.config.layout(self.root())
    }

    pub fn write_image(&self, index: u64, bytes: &[u8]) {
        std::fs::write(self.layout().image_path(index), bytes).unwrap();
    }

    pub fn write_metadata(&self, index: u64, value: &Value) {
        std::fs::write(self.layout().metadata_path(index), value.to_string()).unwrap();
    }

    pub fn write_template(&self, value: &Value) {
        std::fs::write(self.layout().template_path(), value.to_string()).unwrap();
    }

    pub fn read_json(&self, path: &Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an uploaded file as JSON
pub fn upload_json(file: &UploadFile) -> Value {
    serde_json::from_slice(&file.bytes).unwrap()
}
