//!
//! The transaction builder.
//!

use std::sync::Arc;
use std::sync::Mutex;

use web3::types::Address;
use web3::types::U256;

use crate::account::Account;
use crate::client::ChainClient;
use crate::error::ChainError;

use super::envelope;
use super::AccessListItem;
use super::SignedTransaction;
use super::TransactionIntent;
use super::TransactionKind;

///
/// The transaction building or submission failure.
///
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// A fee suggestion or the nonce could not be fetched.
    #[error("failed to prepare the transaction: {0}")]
    Prepare(ChainError),
    /// The requested degenerate fee ordering cannot be built from the suggestions.
    #[error("degenerate fees cannot be built: {0}")]
    DegenerateFees(String),
    /// The signature could not be produced.
    #[error("failed to sign the transaction: {0}")]
    Signing(String),
    /// The node refused the transaction.
    #[error("transaction rejected: {0}")]
    Rejected(ChainError),
}

///
/// Builds, signs and submits transactions from the sender account.
///
/// Fee values are never checked against the protocol rules here: producing
/// out-of-policy transactions is how node-side rejections are probed.
///
pub struct TransactionBuilder {
    /// The chain client.
    client: Arc<dyn ChainClient>,
    /// The sender account.
    sender: Account,
    /// The chain identifier.
    chain_id: u64,
    /// Serializes nonce resolution and submission between phases.
    submission: Mutex<()>,
}

impl TransactionBuilder {
    /// The amount added to both suggestions to outbid pending transactions.
    pub const OVERPRICE: u64 = 10_000;

    ///
    /// A shortcut constructor.
    ///
    pub fn new(client: Arc<dyn ChainClient>, sender: Account, chain_id: u64) -> Self {
        Self {
            client,
            sender,
            chain_id,
            submission: Mutex::new(()),
        }
    }

    ///
    /// The sender address.
    ///
    pub fn sender(&self) -> Address {
        self.sender.address()
    }

    ///
    /// Signs the intent with the given nonce.
    ///
    pub fn sign(
        &self,
        mut intent: TransactionIntent,
        nonce: U256,
    ) -> Result<SignedTransaction, SendError> {
        intent.nonce = Some(nonce);

        let hash = envelope::signing_hash(&intent, nonce, self.chain_id);
        let replay_protection = match intent.kind {
            TransactionKind::Legacy { .. } => Some(self.chain_id),
            _ => None,
        };
        let signature = self
            .sender
            .sign(hash.as_bytes(), replay_protection)
            .map_err(|error| SendError::Signing(error.to_string()))?;

        let raw = envelope::signed_payload(&intent, nonce, self.chain_id, &signature);
        let hash = envelope::keccak256(raw.as_slice());
        Ok(SignedTransaction {
            intent,
            nonce,
            raw,
            hash,
        })
    }

    ///
    /// Signs and submits the intent.
    ///
    /// The nonce is taken from the pending nonce of the sender unless the intent
    /// sets one. Rejections are returned as is, without retrying.
    ///
    pub fn send(&self, intent: TransactionIntent) -> Result<SignedTransaction, SendError> {
        let _submission = self.submission.lock().expect("Sync");

        let nonce = match intent.nonce {
            Some(nonce) => nonce,
            None => self
                .client
                .pending_nonce(self.sender.address())
                .map_err(SendError::Prepare)?,
        };
        let signed = self.sign(intent, nonce)?;

        tracing::debug!(
            hash = ?signed.hash,
            nonce = %signed.nonce,
            kind = %signed.intent.kind,
            "Submitting transaction"
        );
        self.client
            .send_raw_transaction(signed.raw.clone())
            .map_err(SendError::Rejected)?;

        Ok(signed)
    }

    ///
    /// Submits a contract deployment, returning it with the address it creates.
    ///
    pub fn deploy(
        &self,
        init_code: Vec<u8>,
        gas_limit: u64,
    ) -> Result<(SignedTransaction, Address), SendError> {
        let gas_price = self.suggested_gas_price()?;
        let signed = self.send(TransactionIntent::deployment(gas_price, init_code, gas_limit))?;
        let address = super::create_address(self.sender.address(), signed.nonce);
        Ok((signed, address))
    }

    ///
    /// Legacy fees at the suggested gas price.
    ///
    pub fn legacy_fees(&self) -> Result<TransactionKind, SendError> {
        Ok(TransactionKind::Legacy {
            gas_price: self.suggested_gas_price()?,
        })
    }

    ///
    /// Access list fees at the suggested gas price.
    ///
    pub fn access_list_fees(
        &self,
        access_list: Vec<AccessListItem>,
    ) -> Result<TransactionKind, SendError> {
        Ok(TransactionKind::AccessList {
            gas_price: self.suggested_gas_price()?,
            access_list,
        })
    }

    ///
    /// Dynamic fees with the fee cap at the suggested gas price and the tip cap
    /// at the suggested priority fee, optionally both raised by [`Self::OVERPRICE`].
    ///
    pub fn default_dynamic_fees(&self, overprice: bool) -> Result<TransactionKind, SendError> {
        let mut fee_cap = self.suggested_gas_price()?;
        let mut tip_cap = self.suggested_tip_cap()?;
        if overprice {
            fee_cap = fee_cap.saturating_add(U256::from(Self::OVERPRICE));
            tip_cap = tip_cap.saturating_add(U256::from(Self::OVERPRICE));
        }

        tracing::debug!(%fee_cap, %tip_cap, overprice, "Default dynamic fees");
        Ok(TransactionKind::DynamicFee { fee_cap, tip_cap })
    }

    ///
    /// Dynamic fees with the fee cap at half of the suggested priority fee.
    ///
    pub fn small_fee_cap_fees(&self) -> Result<TransactionKind, SendError> {
        let tip_cap = self.suggested_tip_cap()?;
        let fee_cap = tip_cap / U256::from(2);
        if fee_cap >= tip_cap {
            return Err(SendError::DegenerateFees(format!(
                "fee cap {fee_cap} is not below tip cap {tip_cap}"
            )));
        }

        tracing::debug!(%fee_cap, %tip_cap, "Small fee cap dynamic fees");
        Ok(TransactionKind::DynamicFee { fee_cap, tip_cap })
    }

    ///
    /// Dynamic fees with the tip cap at half of the suggested gas price.
    ///
    pub fn small_tip_cap_fees(&self) -> Result<TransactionKind, SendError> {
        let fee_cap = self.suggested_gas_price()?;
        let tip_cap = fee_cap / U256::from(2);
        if tip_cap >= fee_cap {
            return Err(SendError::DegenerateFees(format!(
                "tip cap {tip_cap} is not below fee cap {fee_cap}"
            )));
        }

        tracing::debug!(%fee_cap, %tip_cap, "Small tip cap dynamic fees");
        Ok(TransactionKind::DynamicFee { fee_cap, tip_cap })
    }

    fn suggested_gas_price(&self) -> Result<U256, SendError> {
        let gas_price = self
            .client
            .suggest_gas_price()
            .map_err(SendError::Prepare)?;
        tracing::debug!(%gas_price, "Suggested gas price");
        Ok(gas_price)
    }

    fn suggested_tip_cap(&self) -> Result<U256, SendError> {
        let tip_cap = self.client.suggest_tip_cap().map_err(SendError::Prepare)?;
        tracing::debug!(%tip_cap, "Suggested tip cap");
        Ok(tip_cap)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use web3::types::U256;

    use super::SendError;
    use super::TransactionBuilder;
    use crate::client::fake::FakeChain;
    use crate::error::ChainError;
    use crate::transaction::TransactionIntent;
    use crate::transaction::TransactionKind;

    fn builder(chain: &Arc<FakeChain>) -> TransactionBuilder {
        TransactionBuilder::new(chain.clone(), FakeChain::sender_account(), FakeChain::CHAIN_ID)
    }

    #[test]
    fn resolves_pending_nonces() {
        let chain = Arc::new(FakeChain::new(0).with_height(5));
        let builder = builder(&chain);
        let receiver = FakeChain::receiver_account().address();

        let first = builder
            .send(TransactionIntent::transfer(
                builder.legacy_fees().expect("Fees"),
                receiver,
                U256::one(),
                21_000,
            ))
            .expect("Accepted");
        let second = builder
            .send(TransactionIntent::transfer(
                builder.legacy_fees().expect("Fees"),
                receiver,
                U256::one(),
                21_000,
            ))
            .expect("Accepted");

        assert_eq!(first.nonce, U256::zero());
        assert_eq!(second.nonce, U256::one());
        assert_ne!(first.hash, second.hash);
    }

    #[test]
    fn overprices_default_dynamic_fees() {
        let chain = Arc::new(FakeChain::new(0).with_suggestions(1_000, 1_000));
        let builder = builder(&chain);

        assert_eq!(
            builder.default_dynamic_fees(true),
            Ok(TransactionKind::DynamicFee {
                fee_cap: U256::from(11_000),
                tip_cap: U256::from(11_000),
            })
        );
        assert_eq!(
            builder.default_dynamic_fees(false),
            Ok(TransactionKind::DynamicFee {
                fee_cap: U256::from(1_000),
                tip_cap: U256::from(1_000),
            })
        );
    }

    #[test]
    fn builds_degenerate_fees() {
        let chain = Arc::new(FakeChain::new(0).with_suggestions(1_000, 600));
        let builder = builder(&chain);

        assert_eq!(
            builder.small_fee_cap_fees(),
            Ok(TransactionKind::DynamicFee {
                fee_cap: U256::from(300),
                tip_cap: U256::from(600),
            })
        );
        assert_eq!(
            builder.small_tip_cap_fees(),
            Ok(TransactionKind::DynamicFee {
                fee_cap: U256::from(1_000),
                tip_cap: U256::from(500),
            })
        );
    }

    #[test]
    fn zero_suggestions_cannot_be_halved() {
        let chain = Arc::new(FakeChain::new(0).with_suggestions(0, 0));
        let builder = builder(&chain);

        assert!(matches!(
            builder.small_fee_cap_fees(),
            Err(SendError::DegenerateFees(_))
        ));
        assert!(matches!(
            builder.small_tip_cap_fees(),
            Err(SendError::DegenerateFees(_))
        ));
    }

    #[test]
    fn surfaces_rejections() {
        let chain = Arc::new(FakeChain::new(10).with_height(2));
        let builder = builder(&chain);

        let result = builder.send(TransactionIntent::transfer(
            builder.default_dynamic_fees(false).expect("Fees"),
            FakeChain::receiver_account().address(),
            U256::one(),
            21_000,
        ));

        assert_eq!(
            result.map(|signed| signed.hash),
            Err(SendError::Rejected(ChainError::TxTypeNotSupported))
        );
    }

    #[test]
    fn deploys_to_created_address() {
        let chain = Arc::new(FakeChain::new(0).with_deployment(vec![0x00], vec![0xfe]));
        let builder = builder(&chain);

        let (signed, address) = builder.deploy(vec![0x00], 60_000).expect("Accepted");

        assert_eq!(
            address,
            crate::transaction::create_address(builder.sender(), signed.nonce)
        );
        assert_eq!(signed.intent.recipient, None);
    }
}
