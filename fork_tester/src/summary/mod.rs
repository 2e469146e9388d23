//!
//! The fork tester summary.
//!

pub mod element;

use std::sync::Arc;
use std::sync::Mutex;

use colored::Colorize;

use crate::error::CaseError;
use crate::phase::Phase;

use self::element::outcome::Outcome;
use self::element::Element;

///
/// The fork tester summary.
///
#[derive(Debug)]
pub struct Summary {
    /// The summary elements.
    elements: Vec<Element>,
    /// The output verbosity.
    verbosity: bool,
    /// Whether the output is suppressed.
    quiet: bool,
    /// The passed cases counter.
    passed: usize,
    /// The failed cases counter.
    failed: usize,
    /// The invalid cases counter.
    invalid: usize,
    /// The skipped cases counter.
    skipped: usize,
}

impl Summary {
    ///
    /// A shortcut constructor.
    ///
    pub fn new(verbosity: bool, quiet: bool) -> Self {
        Self {
            elements: Vec::new(),
            verbosity,
            quiet,
            passed: 0,
            failed: 0,
            invalid: 0,
            skipped: 0,
        }
    }

    ///
    /// Whether the test run has been successful.
    ///
    pub fn is_successful(&self) -> bool {
        self.elements
            .iter()
            .all(|element| matches!(element.outcome, Outcome::Passed))
    }

    ///
    /// The recorded elements in recording order.
    ///
    pub fn elements(&self) -> &[Element] {
        self.elements.as_slice()
    }

    ///
    /// Wraps data into a thread-safe shared reference.
    ///
    pub fn wrap(self) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(self))
    }

    ///
    /// Extracts the data from the thread-safe shared reference.
    ///
    pub fn unwrap_arc(summary: Arc<Mutex<Self>>) -> Self {
        Arc::try_unwrap(summary)
            .expect("Last shared reference")
            .into_inner()
            .expect("Last shared reference")
    }

    ///
    /// Adds a passed outcome.
    ///
    pub fn passed(summary: Arc<Mutex<Self>>, phase: Phase, name: String) {
        let element = Element::new(phase, name, Outcome::passed());
        summary.lock().expect("Sync").push_element(element);
    }

    ///
    /// Adds a failed outcome.
    ///
    pub fn failed(summary: Arc<Mutex<Self>>, phase: Phase, name: String, error: &CaseError) {
        let element = Element::new(phase, name, Outcome::failed(error));
        summary.lock().expect("Sync").push_element(element);
    }

    ///
    /// Adds an invalid outcome.
    ///
    pub fn invalid<S>(summary: Arc<Mutex<Self>>, phase: Phase, name: String, error: S)
    where
        S: ToString,
    {
        let element = Element::new(phase, name, Outcome::invalid(error));
        summary.lock().expect("Sync").push_element(element);
    }

    ///
    /// Adds a skipped outcome.
    ///
    pub fn skipped(summary: Arc<Mutex<Self>>, phase: Phase, name: String) {
        let element = Element::new(phase, name, Outcome::skipped());
        summary.lock().expect("Sync").push_element(element);
    }

    ///
    /// Pushes an element to the summary, printing it.
    ///
    fn push_element(&mut self, element: Element) {
        if !self.quiet {
            if let Some(string) = element.print(self.verbosity) {
                println!("{string}");
            }
        }

        match element.outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Failed { .. } => self.failed += 1,
            Outcome::Invalid { .. } => self.invalid += 1,
            Outcome::Skipped => self.skipped += 1,
        }

        self.elements.push(element);
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.quiet {
            return Ok(());
        }

        writeln!(
            f,
            "╔═════════════════╡ FORK TRANSITION TESTING ╞══════════════════╗"
        )?;
        writeln!(
            f,
            "║                                                              ║"
        )?;
        writeln!(
            f,
            "║     {:7}                                   {:10}     ║",
            "PASSED".green(),
            self.passed.to_string().green(),
        )?;
        writeln!(
            f,
            "║     {:7}                                   {:10}     ║",
            "FAILED".bright_red(),
            self.failed.to_string().bright_red(),
        )?;
        writeln!(
            f,
            "║     {:7}                                   {:10}     ║",
            "INVALID".red(),
            self.invalid.to_string().red(),
        )?;
        writeln!(
            f,
            "║     {:7}                                   {:10}     ║",
            "SKIPPED".bright_black(),
            self.skipped.to_string().bright_black(),
        )?;
        writeln!(
            f,
            "║               {:10} CASES EXECUTED                      ║",
            self.passed + self.failed,
        )?;
        writeln!(
            f,
            "╚══════════════════════════════════════════════════════════════╝"
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Summary;
    use crate::error::CaseError;
    use crate::phase::Phase;

    #[test]
    fn counts_outcomes() {
        let summary = Summary::new(false, true).wrap();

        Summary::passed(summary.clone(), Phase::PreFork, "a::b".to_owned());
        assert!(summary.lock().expect("Sync").is_successful());

        Summary::failed(
            summary.clone(),
            Phase::PostFork,
            "a::c".to_owned(),
            &CaseError::mismatch("check", 1, 2),
        );
        Summary::skipped(summary.clone(), Phase::PostFork, "a::d".to_owned());

        let summary = Summary::unwrap_arc(summary);
        assert!(!summary.is_successful());
        assert_eq!(summary.elements().len(), 3);
        assert_eq!(summary.to_string(), "");
    }
}
