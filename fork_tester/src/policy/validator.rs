//!
//! The fee policy validator.
//!

use web3::types::U256;

use crate::client::BlockFeeSnapshot;
use crate::client::MinedTransaction;
use crate::context::Context;
use crate::error::CaseError;
use crate::transaction::builder::SendError;
use crate::transaction::TransactionIntent;
use crate::transaction::TransactionKind;

use super::BaseFeeRule;
use super::Expectation;
use super::FeePolicy;
use super::FeeRule;
use super::Probe;
use super::Rejection;

///
/// Sends probes and compares what the chain does with the policy of a phase.
///
#[derive(Clone)]
pub struct Validator {
    /// The test case handles.
    context: Context,
    /// The fee rules.
    policy: FeePolicy,
}

impl Validator {
    ///
    /// A shortcut constructor.
    ///
    pub fn new(context: Context, policy: FeePolicy) -> Self {
        Self { context, policy }
    }

    ///
    /// Sends the probe and checks its outcome.
    ///
    pub fn check(&self, probe: Probe) -> Result<(), CaseError> {
        let intent = TransactionIntent::transfer(
            self.kind(probe)?,
            self.context.receiver,
            self.context.transfer_value,
            probe.gas_limit(),
        );

        match self.policy.expectation(probe) {
            Expectation::Rejected(rejections) => self.check_rejected(intent, rejections),
            Expectation::Included {
                base_fee,
                fees,
                gas_used,
            } => self.check_included(intent, base_fee, fees, gas_used),
        }
    }

    ///
    /// Checks that the suggested gas price equals the suggested tip cap.
    ///
    pub fn check_suggested_prices(&self) -> Result<(), CaseError> {
        let gas_price = self.context.client.suggest_gas_price()?;
        let tip_cap = self.context.client.suggest_tip_cap()?;
        tracing::debug!(phase = %self.policy.phase(), %gas_price, %tip_cap, "Suggested prices");

        if gas_price != tip_cap {
            return Err(CaseError::mismatch(
                "suggested tip cap equals suggested gas price",
                gas_price,
                tip_cap,
            ));
        }
        Ok(())
    }

    fn kind(&self, probe: Probe) -> Result<TransactionKind, SendError> {
        let builder = self.context.builder.as_ref();
        match probe {
            Probe::Legacy => builder.legacy_fees(),
            Probe::DefaultDynamic => {
                builder.default_dynamic_fees(self.policy.overprices_defaults())
            }
            Probe::SmallFeeCap => builder.small_fee_cap_fees(),
            Probe::SmallTipCap => builder.small_tip_cap_fees(),
            Probe::AccessList => builder.access_list_fees(Probe::access_list(self.context.receiver)),
        }
    }

    fn check_rejected(
        &self,
        intent: TransactionIntent,
        rejections: &[Rejection],
    ) -> Result<(), CaseError> {
        let expected = rejections
            .iter()
            .map(|rejection| format!("`{rejection}`"))
            .collect::<Vec<String>>()
            .join(" or ");

        match self.context.builder.send(intent) {
            Ok(signed) => Err(CaseError::mismatch(
                "submission",
                format!("rejection with {expected}"),
                format!("accepted as {:?}", signed.hash),
            )),
            Err(SendError::Rejected(error))
                if rejections.iter().any(|rejection| rejection.matches(&error)) =>
            {
                tracing::debug!(%error, "Transaction rejected as expected");
                Ok(())
            }
            Err(SendError::Rejected(error)) => Err(CaseError::mismatch(
                "rejection reason",
                expected,
                format!("`{error}`"),
            )),
            Err(error) => Err(error.into()),
        }
    }

    fn check_included(
        &self,
        intent: TransactionIntent,
        base_fee: BaseFeeRule,
        fees: FeeRule,
        gas_used: Option<u64>,
    ) -> Result<(), CaseError> {
        let client = self.context.client.as_ref();

        let signed = self.context.builder.send(intent)?;
        let receipt = self.context.poller.await_receipt(client, signed.hash)?;
        if !receipt.success {
            return Err(CaseError::mismatch("receipt status", "success", "failure"));
        }

        let transaction = client.transaction(signed.hash)?.ok_or_else(|| {
            CaseError::mismatch("transaction lookup", "known transaction", "unknown")
        })?;
        if transaction.pending {
            return Err(CaseError::mismatch("transaction status", "mined", "pending"));
        }
        Self::check_fees(fees, &transaction)?;

        let block = client.block_fee(receipt.block_number)?;
        Self::check_base_fee(base_fee, &block)?;

        if let Some(expected) = gas_used {
            if receipt.gas_used != U256::from(expected) {
                return Err(CaseError::mismatch("gas used", expected, receipt.gas_used));
            }
        }

        tracing::debug!(
            hash = ?signed.hash,
            block = receipt.block_number,
            base_fee = ?block.base_fee,
            "Transaction included as expected"
        );
        Ok(())
    }

    fn check_fees(rule: FeeRule, transaction: &MinedTransaction) -> Result<(), CaseError> {
        match rule {
            FeeRule::Any => Ok(()),
            FeeRule::Collapsed => {
                if transaction.gas_price != transaction.fee_cap {
                    return Err(CaseError::mismatch(
                        "gas price equals fee cap",
                        transaction.fee_cap,
                        transaction.gas_price,
                    ));
                }
                if transaction.tip_cap != transaction.fee_cap {
                    return Err(CaseError::mismatch(
                        "tip cap equals fee cap",
                        transaction.fee_cap,
                        transaction.tip_cap,
                    ));
                }
                Ok(())
            }
            FeeRule::TipBelowCap => {
                if transaction.gas_price != transaction.fee_cap {
                    return Err(CaseError::mismatch(
                        "gas price equals fee cap",
                        transaction.fee_cap,
                        transaction.gas_price,
                    ));
                }
                if transaction.tip_cap >= transaction.fee_cap {
                    return Err(CaseError::mismatch(
                        "tip cap below fee cap",
                        format!("less than {}", transaction.fee_cap),
                        transaction.tip_cap,
                    ));
                }
                Ok(())
            }
        }
    }

    fn check_base_fee(rule: BaseFeeRule, block: &BlockFeeSnapshot) -> Result<(), CaseError> {
        let actual = match block.base_fee {
            Some(base_fee) => base_fee.to_string(),
            None => "absent".to_owned(),
        };
        let holds = match rule {
            BaseFeeRule::Any => true,
            BaseFeeRule::Absent => block.base_fee.is_none(),
            BaseFeeRule::Zero => block.base_fee.is_some_and(|base_fee| base_fee.is_zero()),
        };
        if holds {
            return Ok(());
        }

        let expected = match rule {
            BaseFeeRule::Absent => "absent",
            _ => "0",
        };
        Err(CaseError::mismatch(
            &format!("base fee of block {}", block.number),
            expected,
            actual,
        ))
    }
}
