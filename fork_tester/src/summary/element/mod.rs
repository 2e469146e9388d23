//!
//! The fork tester summary element.
//!

pub mod outcome;

use colored::Colorize;

use crate::phase::Phase;

use self::outcome::Outcome;

///
/// The fork tester summary element.
///
#[derive(Debug, Clone)]
pub struct Element {
    /// The phase the case ran in.
    pub phase: Phase,
    /// The qualified case name.
    pub name: String,
    /// The case outcome.
    pub outcome: Outcome,
}

impl Element {
    ///
    /// A shortcut constructor.
    ///
    pub fn new(phase: Phase, name: String, outcome: Outcome) -> Self {
        Self {
            phase,
            name,
            outcome,
        }
    }

    ///
    /// Prints the element.
    ///
    pub fn print(&self, verbosity: bool) -> Option<String> {
        match self.outcome {
            Outcome::Passed | Outcome::Skipped if !verbosity => return None,
            _ => {}
        }

        let outcome = match self.outcome {
            Outcome::Passed => "PASSED".green(),
            Outcome::Failed { .. } => "FAILED".bright_red(),
            Outcome::Invalid { .. } => "INVALID".red(),
            Outcome::Skipped => "SKIPPED".bright_black(),
        };

        let details = match self.outcome {
            Outcome::Failed {
                ref error,
                ref expected,
                ref actual,
                timeout,
            } => {
                let mut details = format!("\n {error}");
                if let (Some(expected), Some(actual)) = (expected, actual) {
                    details.push_str(format!("\n expected: {expected}\n actual: {actual}").as_str());
                }
                if timeout {
                    details.push_str(format!("\n {}", "(timeout)".bright_white()).as_str());
                }
                details
            }
            Outcome::Invalid { ref error } => error.to_owned(),
            _ => String::new(),
        };

        Some(format!(
            "{:>7} {} {} {}",
            outcome,
            format!("[{}]", self.phase).bright_white(),
            self.name,
            details
        ))
    }
}
