//!
//! The JSON-RPC chain client over HTTP.
//!

use std::future::Future;

use anyhow::Context;
use web3::types::Address;
use web3::types::BlockId;
use web3::types::BlockNumber;
use web3::types::Bytes;
use web3::types::CallRequest;
use web3::types::TransactionId;
use web3::types::H256;
use web3::types::U256;
use web3::types::U64;
use web3::Transport;

use crate::client::BlockFeeSnapshot;
use crate::client::ChainClient;
use crate::client::MinedTransaction;
use crate::client::Receipt;
use crate::error::ChainError;

///
/// The JSON-RPC chain client over HTTP.
///
/// Every query is driven to completion on an internal runtime, so the client
/// can be called from plain threads.
///
pub struct HttpClient {
    /// The web3 handle.
    web3: web3::Web3<web3::transports::Http>,
    /// The runtime driving the requests.
    runtime: tokio::runtime::Runtime,
}

impl HttpClient {
    /// The number of runtime workers. One per phase.
    const RUNTIME_WORKER_THREADS: usize = 2;

    /// The dynamic-fee envelope type identifier.
    const DYNAMIC_FEE_TX_TYPE: u64 = 2;

    ///
    /// Connects to the endpoint.
    ///
    pub fn new(endpoint: &str) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(Self::RUNTIME_WORKER_THREADS)
            .thread_name("chain-client")
            .enable_all()
            .build()
            .context("Chain client runtime initialization")?;
        let transport = web3::transports::Http::new(endpoint)
            .with_context(|| format!("Invalid chain endpoint `{endpoint}`"))?;

        Ok(Self {
            web3: web3::Web3::new(transport),
            runtime,
        })
    }

    ///
    /// Blocks on a request future.
    ///
    fn execute<F, T>(&self, request: F) -> Result<T, ChainError>
    where
        F: Future<Output = web3::Result<T>>,
    {
        self.runtime.block_on(request).map_err(ChainError::from)
    }
}

impl ChainClient for HttpClient {
    fn block_number(&self) -> Result<u64, ChainError> {
        let number = self.execute(self.web3.eth().block_number())?;
        Ok(number.as_u64())
    }

    fn block_fee(&self, number: u64) -> Result<BlockFeeSnapshot, ChainError> {
        let block = self
            .execute(
                self.web3
                    .eth()
                    .block(BlockId::Number(BlockNumber::Number(number.into()))),
            )?
            .ok_or(ChainError::BlockNotFound(number))?;

        Ok(BlockFeeSnapshot {
            number,
            base_fee: block.base_fee_per_gas,
        })
    }

    fn pending_nonce(&self, address: Address) -> Result<U256, ChainError> {
        self.execute(
            self.web3
                .eth()
                .transaction_count(address, Some(BlockNumber::Pending)),
        )
    }

    fn suggest_gas_price(&self) -> Result<U256, ChainError> {
        self.execute(self.web3.eth().gas_price())
    }

    fn suggest_tip_cap(&self) -> Result<U256, ChainError> {
        let value = self.execute(
            self.web3
                .transport()
                .execute("eth_maxPriorityFeePerGas", vec![]),
        )?;
        serde_json::from_value(value).map_err(|error| {
            ChainError::Transport(format!("malformed eth_maxPriorityFeePerGas response: {error}"))
        })
    }

    fn send_raw_transaction(&self, raw: Vec<u8>) -> Result<H256, ChainError> {
        self.execute(self.web3.eth().send_raw_transaction(Bytes(raw)))
    }

    fn transaction(&self, hash: H256) -> Result<Option<MinedTransaction>, ChainError> {
        let transaction = match self.execute(self.web3.eth().transaction(TransactionId::Hash(hash)))? {
            Some(transaction) => transaction,
            None => return Ok(None),
        };

        let gas_price = transaction.gas_price.unwrap_or_default();
        let is_dynamic_fee =
            transaction.transaction_type == Some(U64::from(Self::DYNAMIC_FEE_TX_TYPE));
        let (gas_price, fee_cap, tip_cap) = if is_dynamic_fee {
            let fee_cap = transaction.max_fee_per_gas.unwrap_or(gas_price);
            let tip_cap = transaction.max_priority_fee_per_gas.unwrap_or(gas_price);
            (fee_cap, fee_cap, tip_cap)
        } else {
            (gas_price, gas_price, gas_price)
        };

        Ok(Some(MinedTransaction {
            hash,
            pending: transaction.block_number.is_none(),
            gas_price,
            fee_cap,
            tip_cap,
        }))
    }

    fn receipt(&self, hash: H256) -> Result<Option<Receipt>, ChainError> {
        let receipt = match self.execute(self.web3.eth().transaction_receipt(hash))? {
            Some(receipt) => receipt,
            None => return Ok(None),
        };
        let block_number = match receipt.block_number {
            Some(block_number) => block_number.as_u64(),
            None => return Ok(None),
        };

        Ok(Some(Receipt {
            hash,
            success: receipt.status == Some(U64::one()),
            block_number,
            gas_used: receipt.gas_used.unwrap_or_default(),
            contract_address: receipt.contract_address,
        }))
    }

    fn code_at(&self, address: Address, block: Option<u64>) -> Result<Vec<u8>, ChainError> {
        let block = block.map(|number| BlockNumber::Number(number.into()));
        let code = self.execute(self.web3.eth().code(address, block))?;
        Ok(code.0)
    }

    fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, ChainError> {
        let request = CallRequest {
            to: Some(to),
            data: Some(Bytes(data)),
            ..Default::default()
        };
        let output = self.execute(self.web3.eth().call(request, None))?;
        Ok(output.0)
    }
}
