//! Feature flags that gate which declarative changes apply.

use std::collections::BTreeSet;

/// The set of feature flags supplied by the caller (e.g. `"EfScenario"`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSet {
    flags: BTreeSet<String>,
}

impl OptionSet {
    /// Creates an empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a flag.
    pub fn with(mut self, flag: impl Into<String>) -> Self {
        self.flags.insert(flag.into());
        self
    }

    /// Inserts a flag.
    pub fn insert(&mut self, flag: impl Into<String>) {
        self.flags.insert(flag.into());
    }

    /// Returns true if the flag is set.
    pub fn contains(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    /// Evaluates an option predicate against this set.
    ///
    /// Every plain entry must be present and every `!`-prefixed entry must be
    /// absent. An empty predicate always holds.
    pub fn satisfies(&self, predicate: &[String]) -> bool {
        predicate.iter().all(|option| {
            let option = option.trim();
            match option.strip_prefix('!') {
                Some(negated) => !self.contains(negated.trim()),
                None => option.is_empty() || self.contains(option),
            }
        })
    }

    /// Iterates the flags in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for OptionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            flags: iter.into_iter().map(Into::into).collect(),
        }
    }
}
