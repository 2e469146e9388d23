//!
//! The fork tester summary element outcome.
//!

use crate::error::CaseError;

///
/// The fork tester summary element outcome.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The `passed` outcome.
    Passed,
    /// The `failed` outcome. The chain behaved differently than required.
    Failed {
        /// The failure description.
        error: String,
        /// The expected value, for mismatches.
        expected: Option<String>,
        /// The observed value, for mismatches.
        actual: Option<String>,
        /// Whether the transaction was not included in time.
        timeout: bool,
    },
    /// The `invalid` outcome. The phase could not start.
    Invalid {
        /// The error description.
        error: String,
    },
    /// The `skipped` outcome. An earlier case of the phase failed.
    Skipped,
}

impl Outcome {
    ///
    /// A shortcut constructor.
    ///
    pub fn passed() -> Self {
        Self::Passed
    }

    ///
    /// A shortcut constructor.
    ///
    pub fn failed(error: &CaseError) -> Self {
        let (expected, actual) = match error.comparison() {
            Some((expected, actual)) => (Some(expected.to_owned()), Some(actual.to_owned())),
            None => (None, None),
        };
        Self::Failed {
            error: error.to_string(),
            expected,
            actual,
            timeout: error.is_timeout(),
        }
    }

    ///
    /// A shortcut constructor.
    ///
    pub fn invalid<S>(error: S) -> Self
    where
        S: ToString,
    {
        Self::Invalid {
            error: error.to_string(),
        }
    }

    ///
    /// A shortcut constructor.
    ///
    pub fn skipped() -> Self {
        Self::Skipped
    }
}
