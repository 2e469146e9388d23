//!
//! The fee policy tables.
//!
//! Each phase maps every transaction probe to the outcome the chain must
//! produce on that side of the fork.
//!

pub mod validator;

use web3::types::H256;

use crate::error::ChainError;
use crate::phase::Phase;
use crate::transaction::AccessListItem;

///
/// The transaction sent to observe a fee rule.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// A legacy transfer at the suggested gas price.
    Legacy,
    /// A dynamic-fee transfer at the suggested prices.
    DefaultDynamic,
    /// A dynamic-fee transfer with the fee cap below the tip cap.
    SmallFeeCap,
    /// A dynamic-fee transfer with the tip cap below the fee cap.
    SmallTipCap,
    /// An access list transfer touching one storage slot of the receiver.
    AccessList,
}

impl Probe {
    /// The gas limit of plain transfers.
    pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

    /// The gas limit of access list transfers.
    pub const ACCESS_LIST_GAS_LIMIT: u64 = 30_000;

    ///
    /// The gas limit the probe is sent with.
    ///
    pub fn gas_limit(&self) -> u64 {
        match self {
            Self::AccessList => Self::ACCESS_LIST_GAS_LIMIT,
            _ => Self::TRANSFER_GAS_LIMIT,
        }
    }

    ///
    /// The access list of the probe, declaring the first storage slot of `receiver`.
    ///
    pub fn access_list(receiver: web3::types::Address) -> Vec<AccessListItem> {
        vec![AccessListItem {
            address: receiver,
            storage_keys: vec![H256::zero()],
        }]
    }
}

impl std::fmt::Display for Probe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::DefaultDynamic => write!(f, "default dynamic fee"),
            Self::SmallFeeCap => write!(f, "small fee cap"),
            Self::SmallTipCap => write!(f, "small tip cap"),
            Self::AccessList => write!(f, "access list"),
        }
    }
}

///
/// A node rejection that a policy may require.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The envelope type is not active.
    TxTypeNotSupported,
    /// The tip cap exceeds the fee cap.
    TipAboveFeeCap,
}

impl Rejection {
    ///
    /// Whether the client error is this rejection.
    ///
    pub fn matches(&self, error: &ChainError) -> bool {
        matches!(
            (self, error),
            (Self::TxTypeNotSupported, ChainError::TxTypeNotSupported)
                | (Self::TipAboveFeeCap, ChainError::TipAboveFeeCap)
        )
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TxTypeNotSupported => write!(f, "{}", ChainError::TxTypeNotSupported),
            Self::TipAboveFeeCap => write!(f, "{}", ChainError::TipAboveFeeCap),
        }
    }
}

///
/// The required base fee of the including block.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseFeeRule {
    /// The block has no base fee.
    Absent,
    /// The block base fee is present and zero.
    Zero,
    /// Not checked.
    Any,
}

///
/// The required relation of the mined fee fields.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeRule {
    /// Not checked.
    Any,
    /// Gas price, fee cap and tip cap are pairwise equal.
    Collapsed,
    /// Gas price equals the fee cap, and the tip cap is strictly below it.
    TipBelowCap,
}

///
/// The outcome a probe must produce.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    /// Accepted and included with a successful status.
    Included {
        /// The base fee rule.
        base_fee: BaseFeeRule,
        /// The mined fee fields rule.
        fees: FeeRule,
        /// The exact gas used by the transaction, if checked.
        gas_used: Option<u64>,
    },
    /// Refused at submission with any of the listed reasons.
    Rejected(&'static [Rejection]),
}

///
/// The fee rules of one side of the fork.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeePolicy {
    /// The phase the rules apply to.
    phase: Phase,
}

impl FeePolicy {
    /// The gas used by an access list transfer declaring one address and one key.
    pub const ACCESS_LIST_TRANSFER_GAS: u64 = 21_000 + 2_400 + 1_900;

    ///
    /// A shortcut constructor.
    ///
    pub fn for_phase(phase: Phase) -> Self {
        Self { phase }
    }

    ///
    /// The phase the rules apply to.
    ///
    pub fn phase(&self) -> Phase {
        self.phase
    }

    ///
    /// Whether default dynamic fees are raised to outbid pending transactions.
    ///
    /// Only included transactions can be stuck behind pending ones.
    ///
    pub fn overprices_defaults(&self) -> bool {
        self.phase == Phase::PostFork
    }

    ///
    /// The outcome the probe must produce.
    ///
    pub fn expectation(&self, probe: Probe) -> Expectation {
        match (self.phase, probe) {
            (Phase::PreFork, Probe::Legacy) => Expectation::Included {
                base_fee: BaseFeeRule::Absent,
                fees: FeeRule::Any,
                gas_used: None,
            },
            (Phase::PreFork, Probe::DefaultDynamic)
            | (Phase::PreFork, Probe::SmallFeeCap)
            | (Phase::PreFork, Probe::SmallTipCap)
            | (Phase::PreFork, Probe::AccessList) => {
                Expectation::Rejected(&[Rejection::TxTypeNotSupported])
            }

            (Phase::PostFork, Probe::Legacy) => Expectation::Included {
                base_fee: BaseFeeRule::Zero,
                fees: FeeRule::Any,
                gas_used: None,
            },
            (Phase::PostFork, Probe::DefaultDynamic) => Expectation::Included {
                base_fee: BaseFeeRule::Zero,
                fees: FeeRule::Collapsed,
                gas_used: None,
            },
            (Phase::PostFork, Probe::SmallTipCap) => Expectation::Included {
                base_fee: BaseFeeRule::Zero,
                fees: FeeRule::TipBelowCap,
                gas_used: None,
            },
            (Phase::PostFork, Probe::SmallFeeCap) => {
                Expectation::Rejected(&[Rejection::TipAboveFeeCap])
            }
            (Phase::PostFork, Probe::AccessList) => Expectation::Included {
                base_fee: BaseFeeRule::Any,
                fees: FeeRule::Any,
                gas_used: Some(Self::ACCESS_LIST_TRANSFER_GAS),
            },
        }
    }
}
