//!
//! The `0xEF` code prefix suite.
//!

use crate::context::Context;
use crate::error::CaseError;
use crate::phase::Phase;
use crate::registry::TestCase;

use super::Suite;

///
/// New code starting with `0xEF`: deployable before the fork, refused after it.
///
pub struct EfPrefixSuite;

impl EfPrefixSuite {
    /// `MSTORE8(0, 0xEF)`, then returns the single byte.
    pub const INIT_CODE: [u8; 10] = [0x60, 0xef, 0x60, 0x00, 0x53, 0x60, 0x01, 0x60, 0x00, 0xf3];

    /// The code the init code produces.
    pub const RUNTIME_CODE: [u8; 1] = [0xef];

    /// The deployment gas limit.
    pub const DEPLOYMENT_GAS_LIMIT: u64 = 60_000;

    fn check_deployed(context: &Context) -> Result<(), CaseError> {
        let (receipt, address) =
            context.submit_deployment(Self::INIT_CODE.to_vec(), Self::DEPLOYMENT_GAS_LIMIT)?;
        if !receipt.success {
            return Err(CaseError::mismatch("deployment status", "success", "failure"));
        }

        let code = context.client.code_at(address, Some(receipt.block_number))?;
        if code != Self::RUNTIME_CODE {
            return Err(CaseError::mismatch(
                "deployed code",
                format!("0x{}", hex::encode(Self::RUNTIME_CODE)),
                format!("0x{}", hex::encode(code)),
            ));
        }
        Ok(())
    }

    fn check_refused(context: &Context) -> Result<(), CaseError> {
        let (receipt, _address) =
            context.submit_deployment(Self::INIT_CODE.to_vec(), Self::DEPLOYMENT_GAS_LIMIT)?;
        if receipt.success {
            return Err(CaseError::mismatch("deployment status", "failure", "success"));
        }
        Ok(())
    }
}

impl Suite for EfPrefixSuite {
    const NAME: &'static str = "ef_prefix";

    fn cases(phase: Phase, context: &Context) -> Vec<TestCase> {
        let context = context.clone();
        let case = match phase {
            Phase::PreFork => Self::case("deploy", move || Self::check_deployed(&context)),
            Phase::PostFork => Self::case("deploy", move || Self::check_refused(&context)),
        };
        vec![case]
    }
}
