//!
//! The phase runner.
//!

use std::sync::Arc;
use std::sync::Mutex;

use crate::client::ChainClient;
use crate::parameters::ChainParameters;
use crate::poller::Poller;
use crate::registry::Registry;
use crate::summary::Summary;

use super::Phase;
use super::PhaseError;
use super::PhaseState;

///
/// The outcome of a phase.
///
#[derive(Debug)]
pub struct PhaseReport {
    /// The phase.
    pub phase: Phase,
    /// The final state, `Passed` or `Failed`.
    pub state: PhaseState,
    /// The passed case names in execution order.
    pub passed: Vec<String>,
    /// The case names not run because of the failure.
    pub skipped: Vec<String>,
    /// The failure that ended the phase.
    pub error: Option<PhaseError>,
}

impl PhaseReport {
    ///
    /// Whether every case of the phase passed.
    ///
    pub fn is_successful(&self) -> bool {
        self.state == PhaseState::Passed
    }
}

///
/// Gates a phase on the chain height, then runs its cases in order until the first failure.
///
pub struct PhaseRunner {
    /// The phase cases.
    registry: Registry,
    /// The chain client.
    client: Arc<dyn ChainClient>,
    /// The height gate poller.
    poller: Poller,
    /// The fork heights.
    chain: ChainParameters,
    /// The summary the case outcomes are recorded in.
    summary: Arc<Mutex<Summary>>,
    /// The lifecycle state.
    state: PhaseState,
}

impl PhaseRunner {
    ///
    /// A shortcut constructor.
    ///
    pub fn new(
        registry: Registry,
        client: Arc<dyn ChainClient>,
        poller: Poller,
        chain: ChainParameters,
        summary: Arc<Mutex<Summary>>,
    ) -> Self {
        Self {
            registry,
            client,
            poller,
            chain,
            summary,
            state: PhaseState::Idle,
        }
    }

    ///
    /// The phase.
    ///
    pub fn phase(&self) -> Phase {
        self.registry.phase()
    }

    ///
    /// Runs the phase to completion.
    ///
    pub fn run(mut self) -> PhaseReport {
        let phase = self.phase();

        self.transition(PhaseState::AwaitingGate);
        if let Err(error) = self.gate() {
            Summary::invalid(self.summary.clone(), phase, "gate".to_owned(), &error);
            let skipped = self.registry.names();
            for name in skipped.iter() {
                Summary::skipped(self.summary.clone(), phase, name.to_owned());
            }
            return self.finish(vec![], skipped, Some(error));
        }

        self.transition(PhaseState::Running);
        let mut passed = Vec::with_capacity(self.registry.len());
        let mut cases = std::mem::replace(&mut self.registry, Registry::new(phase, vec![]))
            .into_cases()
            .into_iter();
        while let Some(case) = cases.next() {
            tracing::info!(%phase, case = case.name(), "Running test case");
            let (name, result) = case.run();
            match result {
                Ok(()) => {
                    Summary::passed(self.summary.clone(), phase, name.clone());
                    passed.push(name);
                }
                Err(error) => {
                    Summary::failed(self.summary.clone(), phase, name.clone(), &error);
                    let skipped = cases
                        .map(|case| case.name().to_owned())
                        .collect::<Vec<String>>();
                    for name in skipped.iter() {
                        Summary::skipped(self.summary.clone(), phase, name.to_owned());
                    }
                    return self.finish(passed, skipped, Some(PhaseError::Case { name, error }));
                }
            }
        }

        self.finish(passed, vec![], None)
    }

    fn gate(&self) -> Result<u64, PhaseError> {
        let client = self.client.as_ref();
        match self.phase() {
            Phase::PreFork => {
                let current = client.block_number().map_err(PhaseError::Chain)?;
                if current >= self.chain.post_fork_block {
                    return Err(PhaseError::WindowClosed {
                        current,
                        fork: self.chain.post_fork_block,
                    });
                }

                tracing::info!(
                    current,
                    target = self.chain.pre_fork_block,
                    "Waiting for the pre-fork block"
                );
                self.poller
                    .await_height(client, self.chain.pre_fork_block)
                    .map_err(PhaseError::Gate)
            }
            Phase::PostFork => {
                tracing::info!(
                    target = self.chain.post_fork_block,
                    "Waiting for the fork activation block"
                );
                self.poller
                    .await_height(client, self.chain.post_fork_block)
                    .map_err(PhaseError::Gate)
            }
        }
    }

    fn transition(&mut self, state: PhaseState) {
        tracing::debug!(phase = %self.phase(), from = ?self.state, to = ?state, "Phase state");
        self.state = state;
    }

    fn finish(
        mut self,
        passed: Vec<String>,
        skipped: Vec<String>,
        error: Option<PhaseError>,
    ) -> PhaseReport {
        match error {
            Some(ref error) => {
                self.transition(PhaseState::Failed);
                tracing::error!(phase = %self.phase(), %error, "Phase failed");
            }
            None => {
                self.transition(PhaseState::Passed);
                tracing::info!(phase = %self.phase(), passed = passed.len(), "Phase passed");
            }
        }

        PhaseReport {
            phase: self.phase(),
            state: self.state,
            passed,
            skipped,
            error,
        }
    }
}
