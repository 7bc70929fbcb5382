//! Checkpoint Record - one validator score for one checkpoint

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::accuracy::{DomainType, TARGET_ACCURACY};
use super::task::Task;
use super::validator_args::unified_validator_name;

/// Borrowed `(task, adapter, epoch, trial_params)`.
pub type CheckpointKey<'a> = (&'a Task, &'a str, u64, &'a str);

/// Borrowed checkpoint key plus `(validator, validator_args)`.
pub type IdentityKey<'a> = (CheckpointKey<'a>, &'a str, &'a str);

/// One row of the record table.
///
/// The identity tuple `(dataset, src_domains, target_domains, adapter,
/// validator, validator_args, epoch, trial_params)` is unique per table.
/// Accuracies are properties of the checkpoint and repeat across the rows
/// produced by different validators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckpointRecord {
    task: Task,
    adapter: String,
    validator: String,
    validator_args: String,
    epoch: u64,
    trial_params: String,
    score: f64,
    accuracies: BTreeMap<String, f64>,
}

impl CheckpointRecord {
    /// Create a builder with the required identity fields.
    ///
    /// # Arguments
    ///
    /// * `dataset` - Dataset name
    /// * `adapter` - Adaptation algorithm identifier
    /// * `validator` - Proxy validator family name
    #[must_use]
    pub fn builder(
        dataset: impl Into<String>,
        adapter: impl Into<String>,
        validator: impl Into<String>,
    ) -> CheckpointRecordBuilder {
        CheckpointRecordBuilder::new(dataset, adapter, validator)
    }

    /// Task this checkpoint was trained for.
    #[must_use]
    pub const fn task(&self) -> &Task {
        &self.task
    }

    /// Dataset name.
    #[must_use]
    pub fn dataset(&self) -> &str {
        self.task.dataset()
    }

    /// Source domains, in order.
    #[must_use]
    pub fn src_domains(&self) -> &[String] {
        self.task.src_domains()
    }

    /// Target domains, in order.
    #[must_use]
    pub fn target_domains(&self) -> &[String] {
        self.task.target_domains()
    }

    /// Adaptation algorithm identifier.
    #[must_use]
    pub fn adapter(&self) -> &str {
        &self.adapter
    }

    /// Validator family name.
    #[must_use]
    pub fn validator(&self) -> &str {
        &self.validator
    }

    /// Canonical validator configuration.
    #[must_use]
    pub fn validator_args(&self) -> &str {
        &self.validator_args
    }

    /// `{validator}_{validator_args}`.
    #[must_use]
    pub fn unified_validator(&self) -> String {
        unified_validator_name(&self.validator, &self.validator_args)
    }

    /// Training epoch.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Serialized trial hyperparameters.
    #[must_use]
    pub fn trial_params(&self) -> &str {
        &self.trial_params
    }

    /// Raw validator score; NaN when scoring failed.
    #[must_use]
    pub const fn score(&self) -> f64 {
        self.score
    }

    /// Validator score if it is a finite number.
    #[must_use]
    pub fn defined_score(&self) -> Option<f64> {
        Some(self.score).filter(|s| s.is_finite())
    }

    /// All accuracy fields by name.
    #[must_use]
    pub const fn accuracies(&self) -> &BTreeMap<String, f64> {
        &self.accuracies
    }

    /// Accuracy field if present and finite.
    #[must_use]
    pub fn accuracy(&self, name: &str) -> Option<f64> {
        self.accuracies.get(name).copied().filter(|a| a.is_finite())
    }

    /// Ground-truth accuracy ([`TARGET_ACCURACY`]) if defined.
    #[must_use]
    pub fn target_accuracy(&self) -> Option<f64> {
        self.accuracy(TARGET_ACCURACY)
    }

    /// Accuracy compared by the threshold filter for `domain`.
    #[must_use]
    pub fn threshold_accuracy(&self, domain: DomainType) -> Option<f64> {
        self.accuracy(domain.threshold_field_name())
    }

    /// Score paired with target accuracy, when both are defined.
    #[must_use]
    pub fn scored_accuracy(&self) -> Option<(f64, f64)> {
        Some((self.defined_score()?, self.target_accuracy()?))
    }

    /// Identity tuple of the underlying checkpoint, independent of the validator.
    #[must_use]
    pub fn checkpoint_key(&self) -> CheckpointKey<'_> {
        (
            &self.task,
            self.adapter.as_str(),
            self.epoch,
            self.trial_params.as_str(),
        )
    }

    /// Full row identity tuple.
    #[must_use]
    pub fn identity_key(&self) -> IdentityKey<'_> {
        (
            self.checkpoint_key(),
            self.validator.as_str(),
            self.validator_args.as_str(),
        )
    }

    /// Display form of [`checkpoint_key`](Self::checkpoint_key), for messages.
    ///
    /// Not injective: distinct checkpoints can render the same string.
    #[must_use]
    pub fn checkpoint_id(&self) -> String {
        format!(
            "{}/{}/epoch={}/{}",
            self.task.name(),
            self.adapter,
            self.epoch,
            self.trial_params
        )
    }

    /// Display form of [`identity_key`](Self::identity_key), for messages.
    #[must_use]
    pub fn identity(&self) -> String {
        format!("{}/{}", self.checkpoint_id(), self.unified_validator())
    }
}

/// Builder for `CheckpointRecord`.
#[derive(Debug)]
pub struct CheckpointRecordBuilder {
    dataset: String,
    src_domains: Vec<String>,
    target_domains: Vec<String>,
    adapter: String,
    validator: String,
    validator_args: String,
    epoch: u64,
    trial_params: String,
    score: f64,
    accuracies: BTreeMap<String, f64>,
}

impl CheckpointRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(
        dataset: impl Into<String>,
        adapter: impl Into<String>,
        validator: impl Into<String>,
    ) -> Self {
        Self {
            dataset: dataset.into(),
            src_domains: Vec::new(),
            target_domains: Vec::new(),
            adapter: adapter.into(),
            validator: validator.into(),
            validator_args: String::new(),
            epoch: 0,
            trial_params: String::new(),
            score: f64::NAN,
            accuracies: BTreeMap::new(),
        }
    }

    /// Set the source domains.
    #[must_use]
    pub fn src_domains<I>(mut self, domains: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.src_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Set the target domains.
    #[must_use]
    pub fn target_domains<I>(mut self, domains: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.target_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Set the canonical validator configuration.
    #[must_use]
    pub fn validator_args(mut self, args: impl Into<String>) -> Self {
        self.validator_args = args.into();
        self
    }

    /// Set the epoch.
    #[must_use]
    pub fn epoch(mut self, epoch: u64) -> Self {
        self.epoch = epoch;
        self
    }

    /// Set the serialized trial hyperparameters.
    #[must_use]
    pub fn trial_params(mut self, params: impl Into<String>) -> Self {
        self.trial_params = params.into();
        self
    }

    /// Set the validator score.
    #[must_use]
    pub fn score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    /// Set one accuracy field.
    #[must_use]
    pub fn accuracy(mut self, name: impl Into<String>, value: f64) -> Self {
        self.accuracies.insert(name.into(), value);
        self
    }

    /// Build the `CheckpointRecord`.
    #[must_use]
    pub fn build(self) -> CheckpointRecord {
        CheckpointRecord {
            task: Task::new(self.dataset, self.src_domains, self.target_domains),
            adapter: self.adapter,
            validator: self.validator,
            validator_args: self.validator_args,
            epoch: self.epoch,
            trial_params: self.trial_params,
            score: self.score,
            accuracies: self.accuracies,
        }
    }
}
