//! Ethereum JSON-RPC chain reader
//!
//! Issues `eth_call` against the latest block. Every contract must resolve to
//! a compiled artifact whose ABI declares the called function.

use crate::abi::{self, TOKEN_URI_SELECTOR, TOTAL_SUPPLY_SELECTOR};
use crate::artifact::ContractAbi;
use dashmap::DashMap;
use metabaker_core::{ChainReader, ContractRef, MetabakerError, Result};
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// [`ChainReader`] over HTTP JSON-RPC
#[derive(Debug)]
pub struct JsonRpcChainReader {
    client: reqwest::Client,
    rpc_url: String,
    artifacts_dir: PathBuf,
    abis: DashMap<String, ContractAbi>,
}

impl JsonRpcChainReader {
    /// Create reader for an RPC endpoint, resolving contracts under `artifacts_dir`
    ///
    /// # Errors
    /// - `MetabakerError::Config` if the HTTP client cannot be built
    pub fn new(
        rpc_url: impl Into<String>,
        artifacts_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MetabakerError::Config(format!("http client: {e}")))?;
        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
            artifacts_dir: artifacts_dir.into(),
            abis: DashMap::new(),
        })
    }

    /// Load the contract's ABI once, then check it declares `function`
    fn check_abi(&self, contract: &ContractRef, function: Option<&str>) -> Result<()> {
        if !self.abis.contains_key(&contract.name) {
            let abi = ContractAbi::load(&self.artifacts_dir, &contract.name)?;
            self.abis.insert(contract.name.clone(), abi);
        }
        match (function, self.abis.get(&contract.name)) {
            (Some(function), Some(abi)) => abi.require_function(function),
            _ => Ok(()),
        }
    }

    async fn eth_call(&self, to: &str, data: String) -> Result<Vec<u8>> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [{ "to": to, "data": data }, "latest"],
        });

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| MetabakerError::external(format!("eth_call to {to}: {e}")))?;
        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| MetabakerError::external(format!("eth_call to {to}: {e}")))?;

        if let Some(error) = body.error {
            return Err(MetabakerError::external(format!(
                "eth_call to {to} failed ({}): {}",
                error.code, error.message
            )));
        }
        let result = body
            .result
            .ok_or_else(|| MetabakerError::external(format!("eth_call to {to}: empty response")))?;
        abi::decode_hex(&result)
    }
}

#[async_trait::async_trait]
impl ChainReader for JsonRpcChainReader {
    async fn verify_contract(&self, contract: &ContractRef) -> Result<()> {
        self.check_abi(contract, None)
    }

    async fn total_supply(&self, contract: &ContractRef) -> Result<u64> {
        self.check_abi(contract, Some("totalSupply"))?;
        let data = self
            .eth_call(&contract.address, abi::encode_call(TOTAL_SUPPLY_SELECTOR))
            .await?;
        abi::decode_u64(&data)
    }

    async fn token_uri(&self, contract: &ContractRef, index: u64) -> Result<String> {
        self.check_abi(contract, Some("tokenURI"))?;
        let data = self
            .eth_call(&contract.address, abi::encode_call_u256(TOKEN_URI_SELECTOR, index))
            .await?;
        abi::decode_string(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use warp::Filter;

    fn string_result(value: &str) -> String {
        let mut out = format!("0x{:064x}{:064x}{}", 32, value.len(), hex::encode(value));
        while (out.len() - 2) % 64 != 0 {
            out.push('0');
        }
        out
    }

    /// Serves `eth_call`, answering by selector
    fn spawn_node() -> String {
        let route = warp::post().and(warp::body::json()).map(|body: Value| {
            let data = body["params"][0]["data"].as_str().unwrap_or_default().to_string();
            let reply = if data.starts_with("0x18160ddd") {
                json!({ "jsonrpc": "2.0", "id": 1, "result": format!("0x{:064x}", 3) })
            } else if data.starts_with("0xc87b56dd") {
                let index = u64::from_str_radix(&data[data.len() - 16..], 16).unwrap();
                json!({ "jsonrpc": "2.0", "id": 1, "result": string_result(&format!("ipfs://meta/{index}")) })
            } else {
                json!({ "jsonrpc": "2.0", "id": 1, "error": { "code": -32000, "message": "execution reverted" } })
            };
            warp::reply::json(&reply)
        });
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        format!("http://{addr}")
    }

    fn contract() -> ContractRef {
        ContractRef::new("MyNft", "0x00000000000000000000000000000000000000aa")
    }

    fn artifacts(abi: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("MyNft.json"), abi).unwrap();
        dir
    }

    const FULL_ABI: &str = r#"{ "contractName": "MyNft", "abi": [
        { "type": "function", "name": "totalSupply" },
        { "type": "function", "name": "tokenURI" }
    ] }"#;

    #[tokio::test]
    async fn reads_total_supply_and_token_uri() {
        let dir = artifacts(FULL_ABI);
        let reader =
            JsonRpcChainReader::new(spawn_node(), dir.path(), Duration::from_secs(5)).unwrap();
        reader.verify_contract(&contract()).await.unwrap();
        assert_eq!(reader.total_supply(&contract()).await.unwrap(), 3);
        assert_eq!(reader.token_uri(&contract(), 2).await.unwrap(), "ipfs://meta/2");
    }

    #[tokio::test]
    async fn abi_check_blocks_undeclared_calls() {
        let dir = artifacts(
            r#"{ "contractName": "MyNft", "abi": [{ "type": "function", "name": "totalSupply" }] }"#,
        );
        let reader =
            JsonRpcChainReader::new(spawn_node(), dir.path(), Duration::from_secs(5)).unwrap();

        assert_eq!(reader.total_supply(&contract()).await.unwrap(), 3);
        let err = reader.token_uri(&contract(), 0).await.unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn unknown_contract_never_reaches_node() {
        let dir = artifacts(FULL_ABI);
        let reader =
            JsonRpcChainReader::new(spawn_node(), dir.path(), Duration::from_secs(5)).unwrap();
        let unknown = ContractRef::new("NoSuchContract", "0xabc");

        assert!(reader.verify_contract(&unknown).await.unwrap_err().is_invalid_argument());
        assert!(reader.total_supply(&unknown).await.unwrap_err().is_invalid_argument());
    }

    #[tokio::test]
    async fn abi_is_loaded_once_per_contract() {
        let dir = artifacts(FULL_ABI);
        let reader = std::sync::Arc::new(
            JsonRpcChainReader::new(spawn_node(), dir.path(), Duration::from_secs(5)).unwrap(),
        );

        let checks: Vec<_> = (0..8)
            .map(|_| {
                let reader = reader.clone();
                tokio::spawn(async move { reader.verify_contract(&contract()).await })
            })
            .collect();
        for check in checks {
            check.await.unwrap().unwrap();
        }

        std::fs::remove_file(dir.path().join("MyNft.json")).unwrap();
        assert_eq!(reader.total_supply(&contract()).await.unwrap(), 3);
        assert_eq!(reader.abis.len(), 1);
    }

    #[tokio::test]
    async fn missing_artifacts_dir_rejects_contract() {
        let dir = tempfile::tempdir().unwrap();
        let reader = JsonRpcChainReader::new(
            spawn_node(),
            dir.path().join("artifacts"),
            Duration::from_secs(5),
        )
        .unwrap();
        let err = reader.verify_contract(&contract()).await.unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn unreachable_node_is_external_failure() {
        let dir = artifacts(FULL_ABI);
        let reader =
            JsonRpcChainReader::new("http://127.0.0.1:9", dir.path(), Duration::from_secs(2))
                .unwrap();
        let err = reader.total_supply(&contract()).await.unwrap_err();
        assert!(err.is_external());
    }
}
