//!
//! The test case registry.
//!

use crate::error::CaseError;
use crate::phase::Phase;

///
/// The validation function of a test case.
///
pub type Validation = Box<dyn FnOnce() -> Result<(), CaseError> + Send>;

///
/// A named validation, consumed by running it.
///
pub struct TestCase {
    /// The qualified name, `suite::case`.
    name: String,
    /// The validation function.
    validation: Validation,
}

impl TestCase {
    ///
    /// A shortcut constructor.
    ///
    pub fn new<F>(name: String, validation: F) -> Self
    where
        F: FnOnce() -> Result<(), CaseError> + Send + 'static,
    {
        Self {
            name,
            validation: Box::new(validation),
        }
    }

    ///
    /// The qualified name.
    ///
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    ///
    /// Runs the validation, returning the name with the result.
    ///
    pub fn run(self) -> (String, Result<(), CaseError>) {
        let result = (self.validation)();
        (self.name, result)
    }
}

impl std::fmt::Debug for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

///
/// The ordered test cases of a phase, fixed at construction.
///
#[derive(Debug)]
pub struct Registry {
    /// The phase the cases belong to.
    phase: Phase,
    /// The cases in execution order.
    cases: Vec<TestCase>,
}

impl Registry {
    ///
    /// A shortcut constructor.
    ///
    pub fn new(phase: Phase, cases: Vec<TestCase>) -> Self {
        Self { phase, cases }
    }

    ///
    /// The phase the cases belong to.
    ///
    pub fn phase(&self) -> Phase {
        self.phase
    }

    ///
    /// The case names in execution order.
    ///
    pub fn names(&self) -> Vec<String> {
        self.cases
            .iter()
            .map(|case| case.name().to_owned())
            .collect()
    }

    ///
    /// The number of cases.
    ///
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    ///
    /// Whether every case was filtered out.
    ///
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    ///
    /// Consumes the registry, yielding the cases in execution order.
    ///
    pub fn into_cases(self) -> Vec<TestCase> {
        self.cases
    }
}
