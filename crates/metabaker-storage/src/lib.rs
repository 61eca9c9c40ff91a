//! Metabaker Storage - content store and asset fetching over HTTP
//!
//! Implements [`metabaker_core::ContentStore`] for NFT.Storage compatible
//! APIs and [`metabaker_core::AssetFetcher`] with IPFS gateway rewriting.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod fetch;
pub mod nft_storage;

pub use fetch::{gateway_url, HttpFetcher};
pub use nft_storage::NftStorageClient;
