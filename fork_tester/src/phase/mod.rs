//!
//! The fork transition phases.
//!

pub mod runner;

use crate::error::CaseError;
use crate::error::ChainError;
use crate::poller::PollError;

///
/// The side of the fork a group of test cases runs on.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
pub enum Phase {
    /// Before the fee-market activation height.
    PreFork,
    /// From the fee-market activation height on.
    PostFork,
}

impl Phase {
    /// All phases in scheduling order.
    pub const ALL: [Self; 2] = [Self::PreFork, Self::PostFork];
}

impl std::str::FromStr for Phase {
    type Err = anyhow::Error;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        match string {
            "PreFork" => Ok(Self::PreFork),
            "PostFork" => Ok(Self::PostFork),
            string => anyhow::bail!(
                "Unknown phase `{}`. Supported phases: {}",
                string,
                Self::ALL
                    .into_iter()
                    .map(|element| element.to_string())
                    .collect::<Vec<String>>()
                    .join(", ")
            ),
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PreFork => write!(f, "PreFork"),
            Self::PostFork => write!(f, "PostFork"),
        }
    }
}

///
/// The phase lifecycle.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseState {
    /// Not started.
    Idle,
    /// Waiting for the gating height.
    AwaitingGate,
    /// Executing the test cases.
    Running,
    /// Every test case passed.
    Passed,
    /// The gate or a test case failed.
    Failed,
}

///
/// The failure that ended a phase.
///
#[derive(Debug, thiserror::Error)]
pub enum PhaseError {
    /// The pre-fork phase started after the fork had already been activated.
    #[error("chain height {current} has already reached the fork activation height {fork}")]
    WindowClosed {
        /// The observed height.
        current: u64,
        /// The fork activation height.
        fork: u64,
    },
    /// The initial height query failed.
    #[error("block height query failed: {0}")]
    Chain(ChainError),
    /// The wait for the gating height failed.
    #[error("height gate failed: {0}")]
    Gate(PollError),
    /// A test case failed.
    #[error("case `{name}` failed: {error}")]
    Case {
        /// The qualified case name.
        name: String,
        /// The case failure.
        error: CaseError,
    },
}
