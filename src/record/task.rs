//! Task - a (dataset, source domains, target domains) combination

use serde::{Deserialize, Serialize};
use std::fmt;

/// An adaptation task. Domain order is significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Task {
    dataset: String,
    src_domains: Vec<String>,
    target_domains: Vec<String>,
}

impl Task {
    /// Create a task.
    #[must_use]
    pub fn new<S, T>(dataset: impl Into<String>, src_domains: S, target_domains: T) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            dataset: dataset.into(),
            src_domains: src_domains.into_iter().map(Into::into).collect(),
            target_domains: target_domains.into_iter().map(Into::into).collect(),
        }
    }

    /// Dataset name.
    #[must_use]
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Source domains, in order.
    #[must_use]
    pub fn src_domains(&self) -> &[String] {
        &self.src_domains
    }

    /// Target domains, in order.
    #[must_use]
    pub fn target_domains(&self) -> &[String] {
        &self.target_domains
    }

    /// Display name, e.g. `office31_amazon_dslr`.
    #[must_use]
    pub fn name(&self) -> String {
        std::iter::once(self.dataset.as_str())
            .chain(self.src_domains.iter().map(String::as_str))
            .chain(self.target_domains.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("_")
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
