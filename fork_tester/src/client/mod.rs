//!
//! The chain client capability.
//!

#[cfg(test)]
pub(crate) mod fake;
pub mod http;

use web3::types::Address;
use web3::types::H256;
use web3::types::U256;

use crate::error::ChainError;

///
/// The base fee view of a block.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockFeeSnapshot {
    /// The block number.
    pub number: u64,
    /// The block base fee. Absent before the fee market is activated.
    pub base_fee: Option<U256>,
}

///
/// The inclusion record of a transaction.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// The transaction hash.
    pub hash: H256,
    /// Whether the execution succeeded.
    pub success: bool,
    /// The including block number.
    pub block_number: u64,
    /// The gas used by the transaction.
    pub gas_used: U256,
    /// The created contract address for deployments.
    pub contract_address: Option<Address>,
}

///
/// The fee fields of a transaction as known to the node.
///
/// The gas price follows the decoded transaction semantics: it is the fee cap
/// for dynamic-fee transactions and the plain gas price otherwise. Fee cap
/// and tip cap both equal the gas price for legacy-priced transactions.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinedTransaction {
    /// The transaction hash.
    pub hash: H256,
    /// Whether the transaction is still in the pool.
    pub pending: bool,
    /// The gas price.
    pub gas_price: U256,
    /// The maximum fee per gas.
    pub fee_cap: U256,
    /// The maximum priority fee per gas.
    pub tip_cap: U256,
}

///
/// The queries and submissions the tester needs from a chain endpoint.
///
/// Implementations must be shareable between the concurrently running phases.
///
pub trait ChainClient: Send + Sync {
    /// Returns the current block height.
    fn block_number(&self) -> Result<u64, ChainError>;

    /// Returns the base fee view of the block at the given height.
    fn block_fee(&self, number: u64) -> Result<BlockFeeSnapshot, ChainError>;

    /// Returns the nonce of the next transaction from the address, including pending ones.
    fn pending_nonce(&self, address: Address) -> Result<U256, ChainError>;

    /// Returns the gas price suggested by the node.
    fn suggest_gas_price(&self) -> Result<U256, ChainError>;

    /// Returns the priority fee suggested by the node.
    fn suggest_tip_cap(&self) -> Result<U256, ChainError>;

    /// Submits a signed transaction, returning its hash.
    fn send_raw_transaction(&self, raw: Vec<u8>) -> Result<H256, ChainError>;

    /// Returns the transaction by hash, if the node knows it.
    fn transaction(&self, hash: H256) -> Result<Option<MinedTransaction>, ChainError>;

    /// Returns the receipt by hash, if the transaction is included.
    fn receipt(&self, hash: H256) -> Result<Option<Receipt>, ChainError>;

    /// Returns the code at the address, at the given height or the latest one.
    fn code_at(&self, address: Address, block: Option<u64>) -> Result<Vec<u8>, ChainError>;

    /// Executes a read-only call against the latest block, returning the output.
    fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, ChainError>;
}
