//!
//! The `BASEFEE` opcode suite.
//!

use web3::ethabi::ParamType;
use web3::ethabi::Token;
use web3::types::Address;

use crate::context::Context;
use crate::error::CaseError;
use crate::error::ChainError;
use crate::phase::Phase;
use crate::registry::TestCase;

use super::Suite;

///
/// The `BASEFEE` opcode: invalid before the fork, zero after it.
///
pub struct BaseFeeOpcodeSuite;

impl BaseFeeOpcodeSuite {
    /// Returns the runtime code below.
    pub const INIT_CODE: [u8; 18] = [
        0x68, 0x48, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xf3, // PUSH9 <runtime>
        0x60, 0x00, 0x52, // MSTORE at 0
        0x60, 0x09, 0x60, 0x17, 0xf3, // RETURN the last 9 bytes of the word
    ];

    /// `BASEFEE`, then returns it as a 32-byte word.
    pub const RUNTIME_CODE: [u8; 9] = [0x48, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xf3];

    /// The deployment gas limit.
    pub const DEPLOYMENT_GAS_LIMIT: u64 = 300_000;

    /// The opcode name reported by the node.
    const OPCODE: &'static str = "BASEFEE";

    fn deploy(context: &Context) -> Result<Address, CaseError> {
        let address = context.deploy(Self::INIT_CODE.to_vec(), Self::DEPLOYMENT_GAS_LIMIT)?;

        let code = context.client.code_at(address, None)?;
        if code != Self::RUNTIME_CODE {
            return Err(CaseError::mismatch(
                "deployed code",
                format!("0x{}", hex::encode(Self::RUNTIME_CODE)),
                format!("0x{}", hex::encode(code)),
            ));
        }
        Ok(address)
    }

    fn check_invalid(context: &Context) -> Result<(), CaseError> {
        let address = Self::deploy(context)?;

        let expected = ChainError::InvalidOpcode(Self::OPCODE.to_owned());
        match context.client.call(address, vec![]) {
            Err(error) if error == expected => Ok(()),
            Err(error) => Err(CaseError::mismatch("call error", expected, error)),
            Ok(output) => Err(CaseError::mismatch(
                "call error",
                expected,
                format!("output 0x{}", hex::encode(output)),
            )),
        }
    }

    fn check_zero(context: &Context) -> Result<(), CaseError> {
        let address = Self::deploy(context)?;

        let output = context.client.call(address, vec![])?;
        let base_fee = match web3::ethabi::decode(&[ParamType::Uint(256)], output.as_slice())
            .map(|mut tokens| tokens.pop())
        {
            Ok(Some(Token::Uint(base_fee))) => base_fee,
            _ => {
                return Err(CaseError::mismatch(
                    "call output",
                    "a 256-bit word",
                    format!("0x{}", hex::encode(output)),
                ))
            }
        };

        tracing::debug!(%base_fee, "BASEFEE returned");
        if !base_fee.is_zero() {
            return Err(CaseError::mismatch("BASEFEE result", 0, base_fee));
        }
        Ok(())
    }
}

impl Suite for BaseFeeOpcodeSuite {
    const NAME: &'static str = "base_fee_opcode";

    fn cases(phase: Phase, context: &Context) -> Vec<TestCase> {
        let context = context.clone();
        let case = match phase {
            Phase::PreFork => Self::case("call", move || Self::check_invalid(&context)),
            Phase::PostFork => Self::case("call", move || Self::check_zero(&context)),
        };
        vec![case]
    }
}
