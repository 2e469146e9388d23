//!
//! The transaction intents and their signed form.
//!

pub mod builder;
pub mod envelope;

use rlp::RlpStream;
use sha3::Digest;
use web3::types::Address;
use web3::types::H256;
use web3::types::U256;

///
/// A pre-declared storage access.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessListItem {
    /// The accessed account.
    pub address: Address,
    /// The accessed storage slots.
    pub storage_keys: Vec<H256>,
}

///
/// The transaction kind with its fee fields.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionKind {
    /// The replay-protected legacy transaction.
    Legacy {
        /// The gas price.
        gas_price: U256,
    },
    /// The fee-market transaction.
    DynamicFee {
        /// The maximum fee per gas.
        fee_cap: U256,
        /// The maximum priority fee per gas.
        tip_cap: U256,
    },
    /// The legacy-priced transaction with an access list.
    AccessList {
        /// The gas price.
        gas_price: U256,
        /// The pre-declared storage accesses.
        access_list: Vec<AccessListItem>,
    },
}

impl TransactionKind {
    ///
    /// The typed envelope identifier. `None` for legacy transactions.
    ///
    pub fn envelope_type(&self) -> Option<u8> {
        match self {
            Self::Legacy { .. } => None,
            Self::AccessList { .. } => Some(envelope::ACCESS_LIST_TX_TYPE),
            Self::DynamicFee { .. } => Some(envelope::DYNAMIC_FEE_TX_TYPE),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Legacy { gas_price } => write!(f, "legacy (gas price {gas_price})"),
            Self::DynamicFee { fee_cap, tip_cap } => {
                write!(f, "dynamic fee (fee cap {fee_cap}, tip cap {tip_cap})")
            }
            Self::AccessList {
                gas_price,
                access_list,
            } => write!(
                f,
                "access list (gas price {gas_price}, {} entries)",
                access_list.len()
            ),
        }
    }
}

///
/// The transaction to be signed and sent.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionIntent {
    /// The kind with its fee fields.
    pub kind: TransactionKind,
    /// The nonce. Resolved from the pending nonce of the sender if not set.
    pub nonce: Option<U256>,
    /// The recipient. `None` for contract deployments.
    pub recipient: Option<Address>,
    /// The transferred value.
    pub value: U256,
    /// The gas limit.
    pub gas_limit: U256,
    /// The call data or the deployment init code.
    pub data: Vec<u8>,
}

impl TransactionIntent {
    ///
    /// A value transfer without call data.
    ///
    pub fn transfer(kind: TransactionKind, recipient: Address, value: U256, gas_limit: u64) -> Self {
        Self {
            kind,
            nonce: None,
            recipient: Some(recipient),
            value,
            gas_limit: gas_limit.into(),
            data: vec![],
        }
    }

    ///
    /// A contract deployment without value.
    ///
    pub fn deployment(gas_price: U256, init_code: Vec<u8>, gas_limit: u64) -> Self {
        Self {
            kind: TransactionKind::Legacy { gas_price },
            nonce: None,
            recipient: None,
            value: U256::zero(),
            gas_limit: gas_limit.into(),
            data: init_code,
        }
    }
}

///
/// The signed transaction.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// The signed intent, with the nonce resolved.
    pub intent: TransactionIntent,
    /// The nonce the transaction was signed with.
    pub nonce: U256,
    /// The network encoding.
    pub raw: Vec<u8>,
    /// The transaction hash.
    pub hash: H256,
}

///
/// Returns the address of a contract created by `sender` with `nonce`.
///
pub fn create_address(sender: Address, nonce: U256) -> Address {
    let mut stream = RlpStream::new_list(2);
    stream.append(&sender.as_bytes().to_vec());
    envelope::append_u256(&mut stream, &nonce);
    let hash = sha3::Keccak256::digest(stream.out().as_ref());
    Address::from_slice(&hash[12..])
}
