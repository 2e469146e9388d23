//!
//! The run parameters.
//!

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use web3::types::U256;

use crate::account::Account;
use crate::poller::Poller;

///
/// The chain identity and the fork heights.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainParameters {
    /// The chain identifier used for signing.
    pub chain_id: u64,
    /// The height the pre-fork phase waits for.
    pub pre_fork_block: u64,
    /// The fee-market activation height.
    pub post_fork_block: u64,
}

impl ChainParameters {
    ///
    /// A shortcut constructor, checking the heights are ordered.
    ///
    pub fn new(chain_id: u64, pre_fork_block: u64, post_fork_block: u64) -> anyhow::Result<Self> {
        anyhow::ensure!(
            pre_fork_block < post_fork_block,
            "The pre-fork block {pre_fork_block} must be below the post-fork block {post_fork_block}"
        );

        Ok(Self {
            chain_id,
            pre_fork_block,
            post_fork_block,
        })
    }
}

///
/// The resolved run parameters.
///
#[derive(Debug, Clone)]
pub struct Parameters {
    /// The JSON-RPC endpoint.
    pub endpoint: String,
    /// The chain identity and the fork heights.
    pub chain: ChainParameters,
    /// The account sending every transaction.
    pub sender: Account,
    /// The account receiving transfers.
    pub receiver: Account,
    /// The value moved by transfers, in wei.
    pub transfer_value: U256,
    /// The polling intervals and bounds.
    pub poller: Poller,
}

///
/// The partial parameters, read from a YAML file or from the command line.
///
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// The JSON-RPC endpoint.
    pub endpoint: Option<String>,
    /// The chain identifier.
    pub chain_id: Option<u64>,
    /// The height the pre-fork phase waits for.
    pub pre_fork_block: Option<u64>,
    /// The fee-market activation height.
    pub post_fork_block: Option<u64>,
    /// The hex-encoded sender secret key.
    pub sender_key: Option<String>,
    /// The hex-encoded receiver secret key.
    pub receiver_key: Option<String>,
    /// The value moved by transfers, in wei.
    pub transfer_value: Option<u64>,
    /// The interval between height queries, in seconds.
    pub height_interval_secs: Option<u64>,
    /// The interval between receipt queries, in seconds.
    pub receipt_interval_secs: Option<u64>,
    /// The overall bound of a receipt wait, in seconds.
    pub receipt_timeout_secs: Option<u64>,
}

impl Settings {
    /// The default JSON-RPC endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "http://localhost:8545";

    /// The development chain identifier.
    pub const DEFAULT_CHAIN_ID: u64 = 1337;

    /// The development chain pre-fork height.
    pub const DEFAULT_PRE_FORK_BLOCK: u64 = 2;

    /// The development chain fee-market activation height.
    pub const DEFAULT_POST_FORK_BLOCK: u64 = 12;

    /// The prefunded development sender key.
    pub const DEFAULT_SENDER_KEY: &'static str =
        "9b28f36fbd67381120752d6172ecdcf10e06ab2d9a1367aac00cdcd6ac7855d3";

    /// The development receiver key.
    pub const DEFAULT_RECEIVER_KEY: &'static str =
        "ddcd272732bfe889da92201da3527cb0faa4f3be06f5baa9e9269b700dfa2c2c";

    /// One ether.
    pub const DEFAULT_TRANSFER_VALUE: u64 = 1_000_000_000_000_000_000;

    ///
    /// Reads the settings from a YAML file.
    ///
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read the configuration file `{}`", path.display()))?;
        Self::from_yaml(contents.as_str())
            .with_context(|| format!("Failed to parse the configuration file `{}`", path.display()))
    }

    ///
    /// Parses the settings from a YAML document.
    ///
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    ///
    /// Overlays `overrides` on top of the settings.
    ///
    pub fn merge(self, overrides: Self) -> Self {
        Self {
            endpoint: overrides.endpoint.or(self.endpoint),
            chain_id: overrides.chain_id.or(self.chain_id),
            pre_fork_block: overrides.pre_fork_block.or(self.pre_fork_block),
            post_fork_block: overrides.post_fork_block.or(self.post_fork_block),
            sender_key: overrides.sender_key.or(self.sender_key),
            receiver_key: overrides.receiver_key.or(self.receiver_key),
            transfer_value: overrides.transfer_value.or(self.transfer_value),
            height_interval_secs: overrides.height_interval_secs.or(self.height_interval_secs),
            receipt_interval_secs: overrides
                .receipt_interval_secs
                .or(self.receipt_interval_secs),
            receipt_timeout_secs: overrides.receipt_timeout_secs.or(self.receipt_timeout_secs),
        }
    }

    ///
    /// Fills in the defaults and validates the result.
    ///
    pub fn resolve(self) -> anyhow::Result<Parameters> {
        let chain = ChainParameters::new(
            self.chain_id.unwrap_or(Self::DEFAULT_CHAIN_ID),
            self.pre_fork_block.unwrap_or(Self::DEFAULT_PRE_FORK_BLOCK),
            self.post_fork_block.unwrap_or(Self::DEFAULT_POST_FORK_BLOCK),
        )?;

        let sender = Account::from_hex(
            self.sender_key
                .as_deref()
                .unwrap_or(Self::DEFAULT_SENDER_KEY),
        )
        .context("Invalid sender key")?;
        let receiver = Account::from_hex(
            self.receiver_key
                .as_deref()
                .unwrap_or(Self::DEFAULT_RECEIVER_KEY),
        )
        .context("Invalid receiver key")?;
        anyhow::ensure!(
            sender.address() != receiver.address(),
            "The sender and the receiver must be different accounts"
        );

        let interval = |secs: Option<u64>, default: Duration, name: &str| -> anyhow::Result<Duration> {
            let interval = secs.map(Duration::from_secs).unwrap_or(default);
            anyhow::ensure!(!interval.is_zero(), "The {name} must be positive");
            Ok(interval)
        };
        let poller = Poller::new(
            interval(
                self.height_interval_secs,
                Poller::DEFAULT_HEIGHT_INTERVAL,
                "height interval",
            )?,
            interval(
                self.receipt_interval_secs,
                Poller::DEFAULT_RECEIPT_INTERVAL,
                "receipt interval",
            )?,
            interval(
                self.receipt_timeout_secs,
                Poller::DEFAULT_RECEIPT_TIMEOUT,
                "receipt timeout",
            )?,
        );

        Ok(Parameters {
            endpoint: self
                .endpoint
                .unwrap_or_else(|| Self::DEFAULT_ENDPOINT.to_owned()),
            chain,
            sender,
            receiver,
            transfer_value: U256::from(
                self.transfer_value
                    .unwrap_or(Self::DEFAULT_TRANSFER_VALUE),
            ),
            poller,
        })
    }
}
