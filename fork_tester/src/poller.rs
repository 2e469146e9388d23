//!
//! The chain poller.
//!

use std::time::Duration;
use std::time::Instant;

use web3::types::H256;

use crate::client::ChainClient;
use crate::client::Receipt;
use crate::error::ChainError;

///
/// The polling failure.
///
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollError {
    /// The height query failed.
    #[error("block height query failed: {0}")]
    Query(#[from] ChainError),
    /// The receipt was not found within the bound.
    #[error("receipt of transaction {hash:?} not found within {}s", .timeout.as_secs_f64())]
    Timeout {
        /// The transaction hash.
        hash: H256,
        /// The exceeded bound.
        timeout: Duration,
    },
}

///
/// The fixed-interval waits for chain state.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poller {
    /// The interval between height queries.
    height_interval: Duration,
    /// The interval between receipt queries.
    receipt_interval: Duration,
    /// The overall bound of a receipt wait.
    receipt_timeout: Duration,
}

impl Default for Poller {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_HEIGHT_INTERVAL,
            Self::DEFAULT_RECEIPT_INTERVAL,
            Self::DEFAULT_RECEIPT_TIMEOUT,
        )
    }
}

impl Poller {
    /// The default interval between height queries.
    pub const DEFAULT_HEIGHT_INTERVAL: Duration = Duration::from_secs(3);

    /// The default interval between receipt queries.
    pub const DEFAULT_RECEIPT_INTERVAL: Duration = Duration::from_secs(5);

    /// The default bound of a receipt wait.
    pub const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(60);

    ///
    /// A shortcut constructor.
    ///
    pub fn new(
        height_interval: Duration,
        receipt_interval: Duration,
        receipt_timeout: Duration,
    ) -> Self {
        Self {
            height_interval,
            receipt_interval,
            receipt_timeout,
        }
    }

    ///
    /// The overall bound of a receipt wait.
    ///
    pub fn receipt_timeout(&self) -> Duration {
        self.receipt_timeout
    }

    ///
    /// Blocks until the chain height reaches `target`, returning the observed height.
    ///
    /// There is no upper bound on the wait. A failed query is returned at once,
    /// since it means the endpoint is broken rather than lagging.
    ///
    pub fn await_height(&self, client: &dyn ChainClient, target: u64) -> Result<u64, PollError> {
        loop {
            let current = client.block_number()?;
            if current >= target {
                return Ok(current);
            }

            tracing::debug!(current, target, "Waiting for block height");
            std::thread::sleep(self.height_interval);
        }
    }

    ///
    /// Blocks until the transaction receipt is available or the timeout expires.
    ///
    /// Missing receipts and failed queries are retried until the bound, which is
    /// measured from the call start. The timeout is never reported before the
    /// bound has fully elapsed.
    ///
    pub fn await_receipt(&self, client: &dyn ChainClient, hash: H256) -> Result<Receipt, PollError> {
        tracing::debug!(?hash, "Waiting for transaction receipt");

        let started = Instant::now();
        loop {
            match client.receipt(hash) {
                Ok(Some(receipt)) => return Ok(receipt),
                Ok(None) => {}
                Err(error) => tracing::debug!(?hash, %error, "Receipt query failed, retrying"),
            }

            let elapsed = started.elapsed();
            if elapsed >= self.receipt_timeout {
                return Err(PollError::Timeout {
                    hash,
                    timeout: self.receipt_timeout,
                });
            }
            std::thread::sleep(self.receipt_interval.min(self.receipt_timeout - elapsed));
        }
    }
}
