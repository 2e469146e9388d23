//!
//! The fee market suite.
//!

use crate::context::Context;
use crate::phase::Phase;
use crate::policy::validator::Validator;
use crate::policy::FeePolicy;
use crate::policy::Probe;
use crate::registry::TestCase;

use super::Suite;

///
/// Transaction types and base fee around the fee-market activation.
///
pub struct FeeMarketSuite;

impl Suite for FeeMarketSuite {
    const NAME: &'static str = "fee_market";

    fn cases(phase: Phase, context: &Context) -> Vec<TestCase> {
        let validator = Validator::new(context.clone(), FeePolicy::for_phase(phase));
        let check = |name: &str, probe: Probe| {
            let validator = validator.clone();
            Self::case(name, move || validator.check(probe))
        };

        let mut cases = match phase {
            Phase::PreFork => vec![
                check("legacy", Probe::Legacy),
                check("default_dynamic_fee", Probe::DefaultDynamic),
                check("small_fee_cap", Probe::SmallFeeCap),
                check("small_tip_cap", Probe::SmallTipCap),
            ],
            Phase::PostFork => vec![
                check("legacy", Probe::Legacy),
                check("default_dynamic_fee", Probe::DefaultDynamic),
                check("small_tip_cap", Probe::SmallTipCap),
                check("small_fee_cap", Probe::SmallFeeCap),
            ],
        };
        cases.push(Self::case("suggested_prices", move || {
            validator.check_suggested_prices()
        }));
        cases
    }
}
