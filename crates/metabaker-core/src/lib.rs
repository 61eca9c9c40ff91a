//! Metabaker Core - NFT metadata baking
//!
//! The pipeline that:
//! - Resolves how many tokens a run covers (literal or `totalSupply()`)
//! - Materializes per-token metadata from a template or authored files
//! - Stages images and metadata and publishes them to a content store
//! - Re-downloads minted metadata and images from a deployed contract
//!
//! # Example
//!
//! ```rust,ignore
//! use metabaker_core::prelude::*;
//!
//! # async fn example(chain: &dyn ChainReader, store: &dyn ContentStore) -> Result<()> {
//! let config = MetabakerConfig::new().with_storage_key("key");
//! let publisher = Publisher::new(&config, Path::new("."), chain, store);
//!
//! let args = PublishArgs {
//!     contract: "MyNft".into(),
//!     address: "0xabc".into(),
//!     count: "contract".into(),
//!     scaffold_metadata: false,
//! };
//! if let PublishOutcome::Published(report) = publisher.run(&args).await? {
//!     println!("Set your nft base uri to: {}", report.base_uri());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod count;
pub mod download;
pub mod error;
pub mod external;
pub mod layout;
pub mod materialize;
pub mod publish;
pub mod types;

// Re-exports for convenience
pub use config::MetabakerConfig;
pub use count::{resolve_count, ContractSupply, SupplyReader, CONTRACT_SENTINEL};
pub use download::{DownloadArgs, DownloadReport, DownloadedToken, Downloader, FailedToken};
pub use error::{MetabakerError, Result};
pub use external::{AssetFetcher, ChainReader, ContentStore, ContractRef, UploadFile};
pub use layout::{FileRecordSource, ProjectLayout, TEMPLATE_NAME};
pub use materialize::{materialize, MaterializeMode, RecordSource};
pub use publish::{EmptySet, PublishArgs, PublishOutcome, PublishReport, Publisher};
pub use types::{
    ContentId, EmptyPolicy, IndexBase, MetadataTemplate, PinStatus, TokenCount, TokenMetadata,
    TokenRecord, TOKEN_NUMBER_PLACEHOLDER,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Metabaker Core
    pub use crate::{
        AssetFetcher, ChainReader, ContentStore, ContractRef, DownloadArgs, Downloader,
        MetabakerConfig, MetabakerError, PublishArgs, PublishOutcome, Publisher, Result,
    };
    pub use std::path::Path;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
