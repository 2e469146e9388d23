//!
//! The access list suite.
//!

use crate::context::Context;
use crate::phase::Phase;
use crate::policy::validator::Validator;
use crate::policy::FeePolicy;
use crate::policy::Probe;
use crate::registry::TestCase;

use super::Suite;

///
/// Access list transactions: refused before the fork, charged exactly after it.
///
pub struct AccessListSuite;

impl Suite for AccessListSuite {
    const NAME: &'static str = "access_list";

    fn cases(phase: Phase, context: &Context) -> Vec<TestCase> {
        let validator = Validator::new(context.clone(), FeePolicy::for_phase(phase));
        vec![Self::case("transfer", move || {
            validator.check(Probe::AccessList)
        })]
    }
}
