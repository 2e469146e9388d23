//!
//! The fork tester library.
//!

pub(crate) mod account;
pub(crate) mod client;
pub(crate) mod context;
pub(crate) mod error;
pub(crate) mod filters;
pub(crate) mod parameters;
pub(crate) mod phase;
pub(crate) mod poller;
pub(crate) mod policy;
pub(crate) mod registry;
pub(crate) mod scheduler;
pub(crate) mod suites;
pub(crate) mod summary;
pub(crate) mod transaction;

use std::sync::Arc;
use std::sync::Mutex;

pub use crate::account::Account;
pub use crate::client::http::HttpClient;
pub use crate::client::ChainClient;
pub use crate::context::Context;
pub use crate::error::CaseError;
pub use crate::error::ChainError;
pub use crate::filters::Filters;
pub use crate::parameters::ChainParameters;
pub use crate::parameters::Parameters;
pub use crate::parameters::Settings;
pub use crate::phase::runner::PhaseReport;
pub use crate::phase::runner::PhaseRunner;
pub use crate::phase::Phase;
pub use crate::phase::PhaseError;
pub use crate::phase::PhaseState;
pub use crate::poller::Poller;
pub use crate::registry::Registry;
pub use crate::scheduler::RunReport;
pub use crate::scheduler::Scheduler;
pub use crate::summary::Summary;
pub use crate::transaction::builder::TransactionBuilder;

///
/// The fork tester.
///
pub struct ForkTester {
    /// The summary.
    pub summary: Arc<Mutex<Summary>>,
    /// The filters.
    pub filters: Filters,
    /// The run parameters.
    pub parameters: Parameters,
}

impl ForkTester {
    ///
    /// A shortcut constructor.
    ///
    pub fn new(summary: Arc<Mutex<Summary>>, filters: Filters, parameters: Parameters) -> Self {
        Self {
            summary,
            filters,
            parameters,
        }
    }

    ///
    /// Runs the phases against the chain, in parallel.
    ///
    /// `on_phase_finished` is called as soon as each phase ends.
    ///
    pub fn run<F>(
        &self,
        client: Arc<dyn ChainClient>,
        phases: &[Phase],
        on_phase_finished: F,
    ) -> anyhow::Result<RunReport>
    where
        F: Fn(&PhaseReport) + Sync,
    {
        let parameters = &self.parameters;
        let builder = TransactionBuilder::new(
            client.clone(),
            parameters.sender.clone(),
            parameters.chain.chain_id,
        );
        let context = Context::new(
            client.clone(),
            Arc::new(builder),
            parameters.poller,
            parameters.receiver.address(),
            parameters.transfer_value,
        );

        let runners = phases
            .iter()
            .map(|phase| {
                let registry =
                    Registry::new(*phase, suites::all(*phase, &context, &self.filters));
                tracing::info!(%phase, cases = registry.len(), "Registered test cases");
                PhaseRunner::new(
                    registry,
                    client.clone(),
                    parameters.poller,
                    parameters.chain,
                    self.summary.clone(),
                )
            })
            .collect::<Vec<PhaseRunner>>();

        Ok(Scheduler::new()?.run(runners, on_phase_finished))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use web3::types::U256;

    use super::ForkTester;
    use crate::client::fake::FakeChain;
    use crate::filters::Filters;
    use crate::parameters::Settings;
    use crate::phase::Phase;
    use crate::poller::Poller;
    use crate::suites::base_fee_opcode::BaseFeeOpcodeSuite;
    use crate::suites::ef_prefix::EfPrefixSuite;
    use crate::summary::Summary;

    fn chain(fork_block: u64, height: u64) -> FakeChain {
        FakeChain::new(fork_block)
            .with_height(height)
            .with_deployment(
                BaseFeeOpcodeSuite::INIT_CODE.to_vec(),
                BaseFeeOpcodeSuite::RUNTIME_CODE.to_vec(),
            )
            .with_deployment(
                EfPrefixSuite::INIT_CODE.to_vec(),
                EfPrefixSuite::RUNTIME_CODE.to_vec(),
            )
    }

    fn tester(filters: Filters) -> ForkTester {
        let mut parameters = Settings::default().resolve().expect("Valid defaults");
        parameters.transfer_value = U256::one();
        parameters.poller = Poller::new(
            Duration::from_millis(25),
            Duration::from_millis(1),
            Duration::from_millis(100),
        );
        ForkTester::new(Summary::new(false, true).wrap(), filters, parameters)
    }

    #[test]
    fn conforming_chain_passes_both_phases() {
        let tester = tester(Filters::default());

        let report = tester
            .run(
                Arc::new(chain(12, 2).ticking()),
                &Phase::ALL,
                |_| {},
            )
            .expect("Run");

        for report in report.reports.iter() {
            assert!(report.is_successful(), "{:?}", report.error);
        }
        assert_eq!(report.reports[0].passed.len(), 8);
        assert_eq!(report.reports[1].passed.len(), 8);
        assert!(tester.summary.lock().expect("Sync").is_successful());
    }

    #[test]
    fn single_phase_run() {
        let tester = tester(Filters::new(vec![], vec!["fee_market".to_owned()]));

        let report = tester
            .run(Arc::new(chain(12, 12)), &[Phase::PostFork], |_| {})
            .expect("Run");

        assert_eq!(report.reports.len(), 1);
        assert!(report.is_successful());
        assert_eq!(
            report.reports[0].passed,
            vec![
                "fee_market::legacy",
                "fee_market::default_dynamic_fee",
                "fee_market::small_tip_cap",
                "fee_market::small_fee_cap",
                "fee_market::suggested_prices",
            ]
        );
    }

    #[test]
    fn chain_without_fork_fails_post_fork_phase() {
        let tester = tester(Filters::new(vec![], vec!["fee_market".to_owned()]));

        let report = tester
            .run(Arc::new(chain(1_000, 12)), &[Phase::PostFork], |_| {})
            .expect("Run");

        assert!(!report.is_successful());
        assert!(report.reports[0].passed.is_empty());
        assert_eq!(report.reports[0].skipped.len(), 4);
        assert!(matches!(
            report.reports[0].error,
            Some(crate::phase::PhaseError::Case { ref name, .. }) if name == "fee_market::legacy"
        ));
        assert!(!tester.summary.lock().expect("Sync").is_successful());
    }
}
