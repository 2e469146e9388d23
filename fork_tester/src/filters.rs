//!
//! The fork tester filters.
//!

use std::collections::HashSet;

///
/// The fork tester filters.
///
#[derive(Debug, Default)]
pub struct Filters {
    /// The case path filters.
    path_filters: HashSet<String>,
    /// The suite filters.
    group_filters: HashSet<String>,
}

impl Filters {
    ///
    /// A shortcut constructor.
    ///
    pub fn new(path_filters: Vec<String>, group_filters: Vec<String>) -> Self {
        Self {
            path_filters: path_filters.into_iter().collect(),
            group_filters: group_filters.into_iter().collect(),
        }
    }

    ///
    /// Check if the qualified case name is compatible with the filters.
    ///
    pub fn check_case_path(&self, path: &str) -> bool {
        self.path_filters.is_empty() || self.path_filters.iter().any(|filter| path.contains(filter))
    }

    ///
    /// Check if the suite is compatible with the filters.
    ///
    pub fn check_group(&self, group: &str) -> bool {
        self.group_filters.is_empty() || self.group_filters.contains(group)
    }
}
