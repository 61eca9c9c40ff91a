//! Download pipeline
//!
//! Re-fetches the metadata and image of every minted token of a deployed
//! contract into the project's `metadata/` and `images/` directories.
//! A failing token is logged and recorded; the rest still download.

use crate::config::MetabakerConfig;
use crate::count::{resolve_count, ContractSupply};
use crate::error::{MetabakerError, Result};
use crate::external::{AssetFetcher, ChainReader, ContractRef};
use crate::layout::ProjectLayout;
use crate::materialize::image_basename;
use crate::types::{IndexBase, TokenCount, TokenMetadata};
use std::path::{Path, PathBuf};

/// Arguments of the download task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArgs {
    /// Contract artifact name
    pub contract: String,
    /// Deployed address
    pub address: String,
    /// Decimal count or `contract`
    pub count: String,
}

/// One downloaded token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedToken {
    /// Token index
    pub index: u64,
    /// Written metadata file
    pub metadata_path: PathBuf,
    /// Written image file
    pub image_path: PathBuf,
}

/// One failed token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedToken {
    /// Token index
    pub index: u64,
    /// Failure message
    pub error: String,
}

/// Result of a download run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    /// Tokens requested
    pub count: TokenCount,
    /// Tokens written to disk
    pub downloaded: Vec<DownloadedToken>,
    /// Tokens that failed
    pub failed: Vec<FailedToken>,
}

impl DownloadReport {
    /// Every token downloaded
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// File name of a URI: last path segment without query or fragment
#[must_use]
pub fn uri_file_name(uri: &str) -> Option<&str> {
    let path = uri.split(['?', '#']).next().unwrap_or(uri);
    let path = match path.split_once("://") {
        // Authority is the host of web URLs and the CID of ipfs:// URIs.
        Some((_, rest)) => rest.split_once('/').map_or("", |(_, p)| p),
        None => path,
    };
    match image_basename(path) {
        "" => None,
        name => Some(name),
    }
}

/// Download task runner
pub struct Downloader<'a> {
    layout: ProjectLayout,
    index_base: IndexBase,
    chain: &'a dyn ChainReader,
    fetcher: &'a dyn AssetFetcher,
}

impl<'a> Downloader<'a> {
    /// Create downloader for a project root
    #[must_use]
    pub fn new(
        config: &MetabakerConfig,
        root: &Path,
        chain: &'a dyn ChainReader,
        fetcher: &'a dyn AssetFetcher,
    ) -> Self {
        Self {
            layout: config.layout(root),
            index_base: config.index_base,
            chain,
            fetcher,
        }
    }

    /// Run the download pipeline
    ///
    /// # Errors
    /// - `MetabakerError::InvalidArgument` on an unknown contract, a bad count
    ///   or address
    /// - `MetabakerError::ExternalCallFailure` if the supply read fails
    /// - `MetabakerError::Io` if the project directories cannot be created
    pub async fn run(&self, args: &DownloadArgs) -> Result<DownloadReport> {
        let contract = ContractRef::new(&args.contract, &args.address);
        self.chain.verify_contract(&contract).await?;
        self.layout.ensure_dirs()?;

        let supply = ContractSupply::new(self.chain, &contract);
        let count = resolve_count(&args.count, &args.address, &supply).await?;

        tracing::info!("About to download {} tokens", count);
        let mut report = DownloadReport {
            count,
            downloaded: Vec::new(),
            failed: Vec::new(),
        };

        for index in self.index_base.indices(count)? {
            match self.download_token(&contract, index).await {
                Ok(token) => {
                    tracing::info!(
                        "Finished downloading token {} - {}",
                        index,
                        token.image_path.display()
                    );
                    report.downloaded.push(token);
                }
                Err(e) => {
                    tracing::error!("Error downloading token {}: {}", index, e);
                    report.failed.push(FailedToken {
                        index,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Finished downloading {} of {} tokens",
            report.downloaded.len(),
            count
        );
        Ok(report)
    }

    async fn download_token(&self, contract: &ContractRef, index: u64) -> Result<DownloadedToken> {
        let token_uri = self.chain.token_uri(contract, index).await?;
        tracing::debug!("Token {} uri {}", index, token_uri);

        let metadata_path = self.layout.metadata_path(index);
        let value = self.fetcher.fetch_json(&token_uri).await?;
        let metadata = TokenMetadata::from_value(value, &metadata_path)?;

        let image_uri = metadata.image().ok_or_else(|| MetabakerError::MalformedRecord {
            path: metadata_path.clone(),
            reason: "metadata has no string `image`".to_string(),
        })?;
        let file_name = uri_file_name(image_uri).ok_or_else(|| MetabakerError::MalformedRecord {
            path: metadata_path.clone(),
            reason: format!("cannot derive a file name from image {image_uri:?}"),
        })?;

        std::fs::write(&metadata_path, metadata.to_pretty_json())
            .map_err(|e| MetabakerError::io(&metadata_path, e))?;

        let bytes = self.fetcher.fetch_bytes(image_uri).await?;
        let image_path = self.layout.images_dir().join(file_name);
        std::fs::write(&image_path, bytes).map_err(|e| MetabakerError::io(&image_path, e))?;

        Ok(DownloadedToken {
            index,
            metadata_path,
            image_path,
        })
    }
}
