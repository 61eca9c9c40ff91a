//! Publish pipeline
//!
//! Stages images, uploads them, materializes metadata pointing at the image
//! directory, uploads the metadata and reports both directory identifiers.
//! Fail-fast: the first error aborts the run and staged files are left in
//! place for inspection.

use crate::config::MetabakerConfig;
use crate::count::{resolve_count, ContractSupply};
use crate::error::{MetabakerError, Result};
use crate::external::{ChainReader, ContentStore, ContractRef, UploadFile};
use crate::layout::{FileRecordSource, ProjectLayout};
use crate::materialize::{materialize, MaterializeMode};
use crate::types::{ContentId, EmptyPolicy, PinStatus, TokenCount};
use std::fmt;
use std::path::Path;

/// Arguments of the publish task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishArgs {
    /// Contract artifact name
    pub contract: String,
    /// Deployed address, required when `count` is `contract`
    pub address: String,
    /// Decimal count or `contract`
    pub count: String,
    /// Render metadata from the template instead of patching authored files
    pub scaffold_metadata: bool,
}

/// Which staged set turned out empty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptySet {
    /// No staged images
    Images,
    /// No staged metadata
    Metadata,
}

impl fmt::Display for EmptySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Images => f.write_str("images"),
            Self::Metadata => f.write_str("metadata"),
        }
    }
}

/// Successful publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    /// Tokens published
    pub count: TokenCount,
    /// Image directory
    pub image_cid: ContentId,
    /// Metadata directory
    pub metadata_cid: ContentId,
    /// Image directory pin status
    pub image_pin: PinStatus,
    /// Metadata directory pin status
    pub metadata_pin: PinStatus,
}

impl PublishReport {
    /// Base URI to configure on the contract
    #[must_use]
    pub fn base_uri(&self) -> String {
        self.metadata_cid.base_uri()
    }
}

/// Result of a publish run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Both directories uploaded
    Published(PublishReport),
    /// Stopped early under [`EmptyPolicy::Warn`]
    Empty(EmptySet),
}

/// Apply the empty-set policy to a staged file list
///
/// Returns `Ok(false)` if the run should stop quietly.
///
/// # Errors
/// - `MetabakerError::MissingRecord` under [`EmptyPolicy::Fail`]
pub fn check_non_empty(files: &[UploadFile], set: EmptySet, policy: EmptyPolicy) -> Result<bool> {
    if !files.is_empty() {
        return Ok(true);
    }
    match policy {
        EmptyPolicy::Warn => {
            tracing::warn!("Empty {}", set);
            Ok(false)
        }
        EmptyPolicy::Fail => Err(MetabakerError::missing_record(format!("no staged {set}"))),
    }
}

/// Publish task runner
pub struct Publisher<'a> {
    config: &'a MetabakerConfig,
    layout: ProjectLayout,
    chain: &'a dyn ChainReader,
    store: &'a dyn ContentStore,
}

impl<'a> Publisher<'a> {
    /// Create publisher for a project root
    #[must_use]
    pub fn new(
        config: &'a MetabakerConfig,
        root: &Path,
        chain: &'a dyn ChainReader,
        store: &'a dyn ContentStore,
    ) -> Self {
        Self {
            config,
            layout: config.layout(root),
            chain,
            store,
        }
    }

    /// Project layout in use
    #[inline]
    #[must_use]
    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Run the publish pipeline
    ///
    /// # Errors
    /// - `MetabakerError::InvalidArgument` on a missing credential, an unknown
    ///   contract or a bad count
    /// - `MetabakerError::MissingRecord` on absent images or metadata
    /// - `MetabakerError::ExternalCallFailure` if the chain or store fails
    pub async fn run(&self, args: &PublishArgs) -> Result<PublishOutcome> {
        self.config.require_storage_key()?;

        let contract = ContractRef::new(&args.contract, &args.address);
        self.chain.verify_contract(&contract).await?;
        let supply = ContractSupply::new(self.chain, &contract);
        let count = resolve_count(&args.count, &args.address, &supply).await?;
        let indices = self.config.index_base.indices(count)?;
        let policy = self.config.empty_policy;

        self.layout.reset_staging()?;

        tracing::info!("Processing {} images...", count);
        self.layout.stage_images(indices)?;
        let images = self.layout.staged_images()?;
        if !check_non_empty(&images, EmptySet::Images, policy)? {
            return Ok(PublishOutcome::Empty(EmptySet::Images));
        }

        tracing::info!("Storing {} images...", count);
        let image_cid = self.store.upload_directory(images).await?;
        tracing::info!("Image CID: {}", image_cid);

        tracing::info!("Processing metadata...");
        let template;
        let source = FileRecordSource::new(&self.layout);
        let mode = if args.scaffold_metadata {
            template = self.layout.load_template()?;
            MaterializeMode::Scaffold(&template)
        } else {
            MaterializeMode::Patch(&source)
        };
        let records = materialize(
            count,
            self.config.index_base,
            mode,
            Some(&image_cid),
            self.layout.image_extension(),
        )?;
        self.layout.write_staged_records(&records)?;

        let metadata = self.layout.staged_metadata()?;
        if !check_non_empty(&metadata, EmptySet::Metadata, policy)? {
            return Ok(PublishOutcome::Empty(EmptySet::Metadata));
        }

        tracing::info!("Storing metadata...");
        let metadata_cid = self.store.upload_directory(metadata).await?;
        tracing::info!("Meta CID: {}", metadata_cid);

        self.layout.clean_staging()?;

        let image_pin = self.store.status(&image_cid).await?;
        let metadata_pin = self.store.status(&metadata_cid).await?;

        Ok(PublishOutcome::Published(PublishReport {
            count,
            image_cid,
            metadata_cid,
            image_pin,
            metadata_pin,
        }))
    }
}
