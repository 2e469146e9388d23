//!
//! The shared test case context.
//!

use std::sync::Arc;

use web3::types::Address;
use web3::types::U256;

use crate::client::ChainClient;
use crate::client::Receipt;
use crate::error::CaseError;
use crate::poller::Poller;
use crate::transaction::builder::TransactionBuilder;

///
/// The handles every test case works with.
///
/// Cloning is cheap, and all clones share the chain client and the builder,
/// so the phases coordinate their nonces through it.
///
#[derive(Clone)]
pub struct Context {
    /// The chain client.
    pub client: Arc<dyn ChainClient>,
    /// The sender-side transaction builder.
    pub builder: Arc<TransactionBuilder>,
    /// The chain poller.
    pub poller: Poller,
    /// The receiver address.
    pub receiver: Address,
    /// The value moved by transfers.
    pub transfer_value: U256,
}

impl Context {
    ///
    /// A shortcut constructor.
    ///
    pub fn new(
        client: Arc<dyn ChainClient>,
        builder: Arc<TransactionBuilder>,
        poller: Poller,
        receiver: Address,
        transfer_value: U256,
    ) -> Self {
        Self {
            client,
            builder,
            poller,
            receiver,
            transfer_value,
        }
    }

    ///
    /// Submits a deployment and waits for its receipt, whatever its status.
    ///
    pub fn submit_deployment(
        &self,
        init_code: Vec<u8>,
        gas_limit: u64,
    ) -> Result<(Receipt, Address), CaseError> {
        let (signed, address) = self.builder.deploy(init_code, gas_limit)?;
        let receipt = self
            .poller
            .await_receipt(self.client.as_ref(), signed.hash)?;
        Ok((receipt, address))
    }

    ///
    /// Deploys a contract, requiring a successful receipt and code at the created address.
    ///
    pub fn deploy(&self, init_code: Vec<u8>, gas_limit: u64) -> Result<Address, CaseError> {
        let (receipt, address) = self.submit_deployment(init_code, gas_limit)?;
        if !receipt.success {
            return Err(CaseError::mismatch("deployment status", "success", "failure"));
        }
        if let Some(reported) = receipt.contract_address {
            if reported != address {
                return Err(CaseError::mismatch(
                    "contract address",
                    format!("{address:?}"),
                    format!("{reported:?}"),
                ));
            }
        }

        let code = self.client.code_at(address, Some(receipt.block_number))?;
        if code.is_empty() {
            return Err(CaseError::mismatch(
                "deployed code",
                "non-empty code",
                format!("no code at {address:?}"),
            ));
        }

        tracing::debug!(?address, block = receipt.block_number, "Contract deployed");
        Ok(address)
    }
}
