//!
//! The fork tester arguments.
//!

use std::path::PathBuf;

use structopt::StructOpt;

///
/// The fork tester arguments.
///
#[derive(Debug, StructOpt)]
#[structopt(
    name = "fork-tester",
    about = "Fee-market hard-fork transition conformance tester"
)]
pub struct Arguments {
    /// The logging level.
    #[structopt(short = "v", long = "verbose")]
    pub verbosity: bool,

    /// Suppresses the output completely.
    #[structopt(short = "q", long = "quiet")]
    pub quiet: bool,

    /// The YAML configuration file. Flags override its values.
    #[structopt(long = "config", parse(from_os_str))]
    pub config: Option<PathBuf>,

    /// The JSON-RPC endpoint.
    #[structopt(long = "endpoint")]
    pub endpoint: Option<String>,

    /// The chain identifier.
    #[structopt(long = "chain-id")]
    pub chain_id: Option<u64>,

    /// The height the pre-fork phase waits for.
    #[structopt(long = "pre-fork-block")]
    pub pre_fork_block: Option<u64>,

    /// The fee-market activation height.
    #[structopt(long = "post-fork-block")]
    pub post_fork_block: Option<u64>,

    /// The hex-encoded sender secret key.
    #[structopt(long = "sender-key")]
    pub sender_key: Option<String>,

    /// The hex-encoded receiver secret key.
    #[structopt(long = "receiver-key")]
    pub receiver_key: Option<String>,

    /// Runs only the specified phase.
    /// Available arguments: `PreFork`, `PostFork`.
    #[structopt(long = "phase")]
    pub phase: Option<fork_tester::Phase>,

    /// Runs only cases whose name contains any string from the specified ones.
    #[structopt(short = "p", long = "path")]
    pub paths: Vec<String>,

    /// Runs only cases from the specified suites.
    #[structopt(short = "g", long = "group")]
    pub groups: Vec<String>,

    /// The overall bound of a receipt wait, in seconds.
    #[structopt(long = "receipt-timeout")]
    pub receipt_timeout: Option<u64>,

    /// Waits for both phases and prints the full summary instead of exiting at the first phase failure.
    #[structopt(long = "keep-going")]
    pub keep_going: bool,
}

impl Arguments {
    ///
    /// A shortcut constructor.
    ///
    pub fn new() -> Self {
        Self::from_args()
    }

    ///
    /// The settings given on the command line.
    ///
    pub fn settings(&self) -> fork_tester::Settings {
        fork_tester::Settings {
            endpoint: self.endpoint.clone(),
            chain_id: self.chain_id,
            pre_fork_block: self.pre_fork_block,
            post_fork_block: self.post_fork_block,
            sender_key: self.sender_key.clone(),
            receiver_key: self.receiver_key.clone(),
            receipt_timeout_secs: self.receipt_timeout,
            ..Default::default()
        }
    }

    ///
    /// The phases to run.
    ///
    pub fn phases(&self) -> Vec<fork_tester::Phase> {
        match self.phase {
            Some(phase) => vec![phase],
            None => fork_tester::Phase::ALL.to_vec(),
        }
    }
}
