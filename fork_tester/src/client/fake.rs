//!
//! The in-memory chain emulating the fee-market fork rules.
//!

use std::collections::HashMap;
use std::sync::Mutex;

use rlp::Rlp;
use web3::types::Address;
use web3::types::H256;
use web3::types::U256;

use crate::account::Account;
use crate::client::BlockFeeSnapshot;
use crate::client::ChainClient;
use crate::client::MinedTransaction;
use crate::client::Receipt;
use crate::error::ChainError;
use crate::transaction::create_address;
use crate::transaction::envelope;

///
/// The in-memory chain.
///
/// Every accepted transaction is mined into its own block. Typed envelopes are
/// refused before `fork_block`; blocks from `fork_block` on carry a zero base fee,
/// code starting with `0xEF` cannot be deployed and deployed contracts answer
/// calls with the base fee.
///
pub(crate) struct FakeChain {
    /// The fee-market activation height.
    fork_block: u64,
    /// Whether every height query advances the chain by one block.
    ticking: bool,
    /// Whether height queries fail.
    broken_height_queries: bool,
    /// Whether accepted transactions are included.
    mining: bool,
    /// Whether the fee ordering is validated before the envelope type.
    fee_ordering_first: bool,
    /// The gas charged per access-list storage key.
    storage_key_gas: usize,
    /// The suggested gas price.
    gas_price: U256,
    /// The suggested tip cap.
    tip_cap: U256,
    /// The runtime code produced by known init codes.
    deployments: HashMap<Vec<u8>, Vec<u8>>,
    /// The mutable chain state.
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    height: u64,
    nonce: u64,
    receipt_failures: usize,
    receipt_queries: usize,
    transactions: HashMap<H256, MinedTransaction>,
    receipts: HashMap<H256, Receipt>,
    code: HashMap<Address, Vec<u8>>,
}

struct Decoded {
    typed: bool,
    nonce: U256,
    gas_limit: U256,
    gas_price: U256,
    fee_cap: U256,
    tip_cap: U256,
    recipient: Option<Address>,
    data: Vec<u8>,
    addresses: usize,
    storage_keys: usize,
}

impl FakeChain {
    pub const CHAIN_ID: u64 = 1337;

    const SENDER_KEY: &'static str =
        "9b28f36fbd67381120752d6172ecdcf10e06ab2d9a1367aac00cdcd6ac7855d3";
    const RECEIVER_KEY: &'static str =
        "ddcd272732bfe889da92201da3527cb0faa4f3be06f5baa9e9269b700dfa2c2c";

    const DEFAULT_SUGGESTION: u64 = 1_000_000_000;
    const DEPLOYMENT_GAS: u64 = 53_000;
    const STORAGE_KEY_GAS: usize = 1_900;

    pub fn new(fork_block: u64) -> Self {
        Self {
            fork_block,
            ticking: false,
            broken_height_queries: false,
            mining: true,
            fee_ordering_first: false,
            storage_key_gas: Self::STORAGE_KEY_GAS,
            gas_price: U256::from(Self::DEFAULT_SUGGESTION),
            tip_cap: U256::from(Self::DEFAULT_SUGGESTION),
            deployments: HashMap::new(),
            state: Mutex::new(State::default()),
        }
    }

    pub fn sender_account() -> Account {
        Account::from_hex(Self::SENDER_KEY).expect("Valid key")
    }

    pub fn receiver_account() -> Account {
        Account::from_hex(Self::RECEIVER_KEY).expect("Valid key")
    }

    pub fn with_height(mut self, height: u64) -> Self {
        self.state.get_mut().expect("Sync").height = height;
        self
    }

    pub fn ticking(mut self) -> Self {
        self.ticking = true;
        self
    }

    pub fn with_broken_height_queries(mut self) -> Self {
        self.broken_height_queries = true;
        self
    }

    pub fn without_mining(mut self) -> Self {
        self.mining = false;
        self
    }

    pub fn with_fee_ordering_checked_first(mut self) -> Self {
        self.fee_ordering_first = true;
        self
    }

    pub fn with_storage_key_gas(mut self, gas: usize) -> Self {
        self.storage_key_gas = gas;
        self
    }

    pub fn with_receipt_failures(mut self, count: usize) -> Self {
        self.state.get_mut().expect("Sync").receipt_failures = count;
        self
    }

    pub fn with_suggestions(mut self, gas_price: u64, tip_cap: u64) -> Self {
        self.gas_price = U256::from(gas_price);
        self.tip_cap = U256::from(tip_cap);
        self
    }

    pub fn with_deployment(mut self, init_code: Vec<u8>, runtime_code: Vec<u8>) -> Self {
        self.deployments.insert(init_code, runtime_code);
        self
    }

    ///
    /// Includes a plain transfer that bypasses submission, returning its hash.
    ///
    pub fn mine_transfer(&self) -> H256 {
        let mut state = self.state.lock().expect("Sync");
        state.height += 1;
        let block_number = state.height;
        let hash = H256::from_low_u64_be(block_number);
        state.receipts.insert(
            hash,
            Receipt {
                hash,
                success: true,
                block_number,
                gas_used: U256::from(21_000),
                contract_address: None,
            },
        );
        hash
    }

    pub fn receipt_queries(&self) -> usize {
        self.state.lock().expect("Sync").receipt_queries
    }

    fn decode(raw: &[u8]) -> Result<Decoded, ChainError> {
        let malformed = |error: rlp::DecoderError| ChainError::Rejected(format!("rlp: {error}"));
        let integer = |rlp: &Rlp, index: usize| -> Result<U256, ChainError> {
            Ok(U256::from_big_endian(rlp.at(index).map_err(malformed)?.data().map_err(malformed)?))
        };
        let bytes = |rlp: &Rlp, index: usize| -> Result<Vec<u8>, ChainError> {
            Ok(rlp.at(index).map_err(malformed)?.data().map_err(malformed)?.to_vec())
        };

        let (envelope, body) = match raw.first() {
            Some(&byte) if byte < 0xc0 => (Some(byte), &raw[1..]),
            Some(_) => (None, raw),
            None => return Err(ChainError::Rejected("empty transaction".to_owned())),
        };
        let rlp = Rlp::new(body);

        // nonce, fee fields, gas limit, recipient, data, access list
        let (nonce, fees, gas, to, data, access_list) = match envelope {
            None => (0, [1, 1], 2, 3, 5, None),
            Some(envelope::ACCESS_LIST_TX_TYPE) => (1, [2, 2], 3, 4, 6, Some(7)),
            Some(envelope::DYNAMIC_FEE_TX_TYPE) => (1, [3, 2], 4, 5, 7, Some(8)),
            Some(other) => {
                return Err(ChainError::Rejected(format!("unknown envelope type {other}")))
            }
        };

        let recipient = bytes(&rlp, to)?;
        let (mut addresses, mut storage_keys) = (0, 0);
        if let Some(index) = access_list {
            for item in rlp.at(index).map_err(malformed)?.iter() {
                addresses += 1;
                storage_keys += item.at(1).map_err(malformed)?.item_count().map_err(malformed)?;
            }
        }

        let fee_cap = integer(&rlp, fees[0])?;
        let tip_cap = integer(&rlp, fees[1])?;
        Ok(Decoded {
            typed: envelope.is_some(),
            nonce: integer(&rlp, nonce)?,
            gas_limit: integer(&rlp, gas)?,
            gas_price: fee_cap,
            fee_cap,
            tip_cap,
            recipient: (!recipient.is_empty()).then(|| Address::from_slice(recipient.as_slice())),
            data: bytes(&rlp, data)?,
            addresses,
            storage_keys,
        })
    }
}

impl ChainClient for FakeChain {
    fn block_number(&self) -> Result<u64, ChainError> {
        if self.broken_height_queries {
            return Err(ChainError::Transport("connection refused".to_owned()));
        }

        let mut state = self.state.lock().expect("Sync");
        let height = state.height;
        if self.ticking {
            state.height += 1;
        }
        Ok(height)
    }

    fn block_fee(&self, number: u64) -> Result<BlockFeeSnapshot, ChainError> {
        let state = self.state.lock().expect("Sync");
        if number > state.height {
            return Err(ChainError::BlockNotFound(number));
        }

        Ok(BlockFeeSnapshot {
            number,
            base_fee: (number >= self.fork_block).then(U256::zero),
        })
    }

    fn pending_nonce(&self, _address: Address) -> Result<U256, ChainError> {
        Ok(U256::from(self.state.lock().expect("Sync").nonce))
    }

    fn suggest_gas_price(&self) -> Result<U256, ChainError> {
        Ok(self.gas_price)
    }

    fn suggest_tip_cap(&self) -> Result<U256, ChainError> {
        Ok(self.tip_cap)
    }

    fn send_raw_transaction(&self, raw: Vec<u8>) -> Result<H256, ChainError> {
        let decoded = Self::decode(raw.as_slice())?;

        let mut state = self.state.lock().expect("Sync");
        let block_number = state.height + 1;
        let forked = block_number >= self.fork_block;

        if self.fee_ordering_first && decoded.fee_cap < decoded.tip_cap {
            return Err(ChainError::TipAboveFeeCap);
        }
        if decoded.typed && !forked {
            return Err(ChainError::TxTypeNotSupported);
        }
        if decoded.fee_cap < decoded.tip_cap {
            return Err(ChainError::TipAboveFeeCap);
        }
        if decoded.nonce != U256::from(state.nonce) {
            return Err(ChainError::Rejected(format!(
                "invalid nonce: expected {}, got {}",
                state.nonce, decoded.nonce
            )));
        }
        state.nonce += 1;

        let hash = envelope::keccak256(raw.as_slice());
        state.transactions.insert(
            hash,
            MinedTransaction {
                hash,
                pending: !self.mining,
                gas_price: decoded.gas_price,
                fee_cap: decoded.fee_cap,
                tip_cap: decoded.tip_cap,
            },
        );
        if !self.mining {
            return Ok(hash);
        }

        let (success, gas_used, contract_address) = match decoded.recipient {
            Some(_) => {
                let gas_used = 21_000 + 2_400 * decoded.addresses
                    + self.storage_key_gas * decoded.storage_keys;
                (true, U256::from(gas_used), None)
            }
            None => {
                let runtime_code = self
                    .deployments
                    .get(&decoded.data)
                    .cloned()
                    .unwrap_or_default();
                if forked && runtime_code.first() == Some(&0xef) {
                    (false, decoded.gas_limit, None)
                } else {
                    let address = create_address(Self::sender_account().address(), decoded.nonce);
                    state.code.insert(address, runtime_code);
                    (true, U256::from(Self::DEPLOYMENT_GAS), Some(address))
                }
            }
        };

        state.height = block_number;
        state.receipts.insert(
            hash,
            Receipt {
                hash,
                success,
                block_number,
                gas_used,
                contract_address,
            },
        );
        Ok(hash)
    }

    fn transaction(&self, hash: H256) -> Result<Option<MinedTransaction>, ChainError> {
        Ok(self.state.lock().expect("Sync").transactions.get(&hash).cloned())
    }

    fn receipt(&self, hash: H256) -> Result<Option<Receipt>, ChainError> {
        let mut state = self.state.lock().expect("Sync");
        state.receipt_queries += 1;
        if state.receipt_failures > 0 {
            state.receipt_failures -= 1;
            return Err(ChainError::Transport("connection reset".to_owned()));
        }
        Ok(state.receipts.get(&hash).cloned())
    }

    fn code_at(&self, address: Address, _block: Option<u64>) -> Result<Vec<u8>, ChainError> {
        Ok(self
            .state
            .lock()
            .expect("Sync")
            .code
            .get(&address)
            .cloned()
            .unwrap_or_default())
    }

    fn call(&self, to: Address, _data: Vec<u8>) -> Result<Vec<u8>, ChainError> {
        let state = self.state.lock().expect("Sync");
        match state.code.get(&to) {
            None => Ok(vec![]),
            Some(_) if state.height < self.fork_block => {
                Err(ChainError::InvalidOpcode("BASEFEE".to_owned()))
            }
            Some(_) => Ok(vec![0u8; 32]),
        }
    }
}
