//!
//! The test suites.
//!

pub mod access_list;
pub mod base_fee_opcode;
pub mod ef_prefix;
pub mod fee_market;

use crate::context::Context;
use crate::error::CaseError;
use crate::filters::Filters;
use crate::phase::Phase;
use crate::registry::TestCase;

use self::access_list::AccessListSuite;
use self::base_fee_opcode::BaseFeeOpcodeSuite;
use self::ef_prefix::EfPrefixSuite;
use self::fee_market::FeeMarketSuite;

///
/// A group of test cases covering one fork feature on both sides of the fork.
///
pub trait Suite {
    /// The suite name, used as the case name prefix and by the group filter.
    const NAME: &'static str;

    ///
    /// Returns the suite cases of the phase in execution order.
    ///
    fn cases(phase: Phase, context: &Context) -> Vec<TestCase>;

    ///
    /// Qualifies the case name with the suite name.
    ///
    fn case<F>(name: &str, validation: F) -> TestCase
    where
        F: FnOnce() -> Result<(), CaseError> + Send + 'static,
    {
        TestCase::new(format!("{}::{name}", Self::NAME), validation)
    }
}

///
/// Returns the cases of all suites for the phase, in execution order, with the
/// filtered-out ones dropped.
///
pub fn all(phase: Phase, context: &Context, filters: &Filters) -> Vec<TestCase> {
    let mut cases = Vec::new();
    cases.extend(suite::<FeeMarketSuite>(phase, context, filters));
    cases.extend(suite::<AccessListSuite>(phase, context, filters));
    cases.extend(suite::<BaseFeeOpcodeSuite>(phase, context, filters));
    cases.extend(suite::<EfPrefixSuite>(phase, context, filters));
    cases
}

fn suite<S>(phase: Phase, context: &Context, filters: &Filters) -> Vec<TestCase>
where
    S: Suite,
{
    if !filters.check_group(S::NAME) {
        return vec![];
    }

    S::cases(phase, context)
        .into_iter()
        .filter(|case| filters.check_case_path(case.name()))
        .collect()
}
