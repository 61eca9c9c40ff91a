//! Token count resolution
//!
//! Turns the `--count` task argument into a validated [`TokenCount`]. The
//! argument is either a base-10 integer or the literal `contract`, which asks
//! the deployed contract for its current `totalSupply()`.

use crate::error::{MetabakerError, Result};
use crate::external::{ChainReader, ContractRef};
use crate::types::TokenCount;

/// Count argument that selects the contract's `totalSupply()`
pub const CONTRACT_SENTINEL: &str = "contract";

/// Source of the contract's current supply
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SupplyReader: Send + Sync {
    /// Read `totalSupply()`
    async fn read_total_supply(&self) -> Result<u64>;
}

/// [`SupplyReader`] bound to one deployed contract
pub struct ContractSupply<'a> {
    chain: &'a dyn ChainReader,
    contract: &'a ContractRef,
}

impl<'a> ContractSupply<'a> {
    /// Bind a chain reader to a contract
    #[inline]
    #[must_use]
    pub fn new(chain: &'a dyn ChainReader, contract: &'a ContractRef) -> Self {
        Self { chain, contract }
    }
}

#[async_trait::async_trait]
impl SupplyReader for ContractSupply<'_> {
    async fn read_total_supply(&self) -> Result<u64> {
        self.chain.total_supply(self.contract).await
    }
}

/// Resolve the count argument
///
/// # Arguments
/// * `count_arg` - decimal integer or `contract`
/// * `contract_address` - deployed address, required for `contract`
/// * `reader` - supply source, only invoked for `contract`
///
/// # Errors
/// - `MetabakerError::InvalidArgument` on an empty address, a non-decimal
///   argument, or a zero count
/// - `MetabakerError::ExternalCallFailure` if the supply read fails
pub async fn resolve_count(
    count_arg: &str,
    contract_address: &str,
    reader: &dyn SupplyReader,
) -> Result<TokenCount> {
    let count = if count_arg == CONTRACT_SENTINEL {
        if contract_address.is_empty() {
            return Err(MetabakerError::invalid_argument(format!(
                "invalid address param: {contract_address:?}"
            )));
        }
        let supply = reader.read_total_supply().await?;
        tracing::info!("Count from contract {}: {}", contract_address, supply);
        supply
    } else {
        count_arg.parse::<u64>().map_err(|e| {
            MetabakerError::invalid_argument(format!("invalid count parameter {count_arg:?}: {e}"))
        })?
    };

    if count == 0 {
        return Err(MetabakerError::invalid_argument(format!(
            "count must be non-zero (got {count_arg:?})"
        )));
    }

    Ok(TokenCount::new(count))
}
