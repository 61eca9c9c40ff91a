//! Metabaker Chain - read-only contract access over JSON-RPC
//!
//! Implements [`metabaker_core::ChainReader`] with `eth_call` and a minimal
//! ABI codec for `totalSupply()` and `tokenURI(uint256)`.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod abi;
pub mod artifact;
pub mod rpc;

pub use artifact::{AbiEntry, ContractAbi};
pub use rpc::JsonRpcChainReader;
