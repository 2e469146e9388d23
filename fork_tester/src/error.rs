//!
//! The fork tester errors.
//!

use crate::poller::PollError;
use crate::transaction::builder::SendError;

///
/// A failure reported by the chain client.
///
/// Node-side rejections that the fork rules produce are classified into
/// dedicated variants, so that the policy tables can compare them directly.
///
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// The transaction envelope type is not active yet.
    #[error("transaction type not supported")]
    TxTypeNotSupported,
    /// The priority fee exceeds the fee cap.
    #[error("max priority fee per gas higher than max fee per gas")]
    TipAboveFeeCap,
    /// The call executed an opcode that is not active yet.
    #[error("invalid opcode: {0}")]
    InvalidOpcode(String),
    /// Any other error returned by the node.
    #[error("rejected by the node: {0}")]
    Rejected(String),
    /// The requested block does not exist.
    #[error("block {0} not found")]
    BlockNotFound(u64),
    /// The request did not reach the node or the response was malformed.
    #[error("transport failure: {0}")]
    Transport(String),
}

impl ChainError {
    /// The node message prefix of the unsupported envelope type rejection.
    const TX_TYPE_NOT_SUPPORTED: &'static str = "transaction type not supported";
    /// The node message prefix of the tip above fee cap rejection.
    const TIP_ABOVE_FEE_CAP: &'static str = "max priority fee per gas higher than max fee per gas";
    /// The node message prefix of an inactive opcode execution.
    const INVALID_OPCODE: &'static str = "invalid opcode: ";

    ///
    /// Classifies an error message returned by the node.
    ///
    /// Nodes append details such as the sender address after a colon, so only
    /// the prefix is compared.
    ///
    pub fn from_node_message(message: &str) -> Self {
        let message = message.trim();

        if message.starts_with(Self::TX_TYPE_NOT_SUPPORTED) {
            Self::TxTypeNotSupported
        } else if message.starts_with(Self::TIP_ABOVE_FEE_CAP) {
            Self::TipAboveFeeCap
        } else if let Some(opcode) = message.strip_prefix(Self::INVALID_OPCODE) {
            let opcode = opcode
                .split(|character: char| character.is_whitespace() || character == ',')
                .next()
                .unwrap_or_default();
            Self::InvalidOpcode(opcode.to_owned())
        } else {
            Self::Rejected(message.to_owned())
        }
    }
}

impl From<web3::Error> for ChainError {
    fn from(error: web3::Error) -> Self {
        match error {
            web3::Error::Rpc(error) => Self::from_node_message(error.message.as_str()),
            error => Self::Transport(error.to_string()),
        }
    }
}

///
/// The reason a test case failed.
///
#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    /// A chain query needed by the check failed.
    #[error("chain query failed: {0}")]
    Chain(#[from] ChainError),
    /// The transaction could not be prepared or was rejected unexpectedly.
    #[error(transparent)]
    Send(#[from] SendError),
    /// The transaction was not included in time.
    #[error(transparent)]
    Poll(#[from] PollError),
    /// The observed behavior differs from the expected one.
    #[error("{check}: expected {expected}, got {actual}")]
    Mismatch {
        /// The name of the failed check.
        check: String,
        /// The expected value.
        expected: String,
        /// The observed value.
        actual: String,
    },
}

impl CaseError {
    ///
    /// A shortcut constructor.
    ///
    pub fn mismatch<E, A>(check: &str, expected: E, actual: A) -> Self
    where
        E: ToString,
        A: ToString,
    {
        Self::Mismatch {
            check: check.to_owned(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    ///
    /// Returns the expected and the observed values, if the error carries them.
    ///
    pub fn comparison(&self) -> Option<(&str, &str)> {
        match self {
            Self::Mismatch {
                expected, actual, ..
            } => Some((expected.as_str(), actual.as_str())),
            _ => None,
        }
    }

    ///
    /// Whether the error is a receipt timeout.
    ///
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Poll(PollError::Timeout { .. }))
    }
}
