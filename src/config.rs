//! Evaluation configuration and pipeline
//!
//! ```rust
//! use validator_sweep::aggregate::Granularity;
//! use validator_sweep::Evaluation;
//!
//! let evaluation = Evaluation::builder()
//!     .top_n(5)
//!     .granularity(Granularity::PerTaskPerAdapter)
//!     .exclude_validator("Accuracy_average_micro_split_train")
//!     .build()?;
//! assert_eq!(evaluation.aggregate_config().top_n(), 5);
//! # Ok::<(), validator_sweep::Error>(())
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::aggregate::{AggregateConfig, Granularity};
use crate::baseline::BaselineOracle;
use crate::normalize::normalize;
use crate::record::RecordTable;
use crate::report::SweepReport;
use crate::sweep::per_threshold;
use crate::{Error, Result};

const fn default_top_n() -> usize {
    1
}

const fn default_true() -> bool {
    true
}

/// Serializable evaluation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvalConfig {
    /// Number of top-scoring checkpoints averaged per group
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Group-by granularity
    #[serde(default)]
    pub granularity: Granularity,
    /// Report accuracies relative to the best achievable accuracy
    #[serde(default = "default_true")]
    pub normalize: bool,
    /// Run the record integrity checks before sweeping
    #[serde(default = "default_true")]
    pub strict: bool,
    /// Unified validator names to drop before sweeping
    #[serde(default)]
    pub exclude_validators: Vec<String>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            granularity: Granularity::default(),
            normalize: true,
            strict: true,
            exclude_validators: Vec::new(),
        }
    }
}

impl EvalConfig {
    /// Load a config from a JSON file; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the file cannot be read or parsed
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&text)
            .map_err(|e| Error::ConfigError(format!("{}: {e}", path.display())))
    }

    /// Parse a config from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] on malformed JSON or unknown fields
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::ConfigError(e.to_string()))
    }
}

/// Configured threshold-sweep evaluation.
#[derive(Debug, Clone)]
pub struct Evaluation {
    aggregate: AggregateConfig,
    normalize: bool,
    strict: bool,
    exclude_validators: Vec<String>,
}

impl Evaluation {
    /// Create a new evaluation builder
    #[must_use]
    pub fn builder() -> EvaluationBuilder {
        EvaluationBuilder::default()
    }

    /// Build an evaluation from a loaded config.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `top_n` is zero
    pub fn from_config(config: EvalConfig) -> Result<Self> {
        EvaluationBuilder { config }.build()
    }

    /// Grouping and top-N settings.
    #[must_use]
    pub const fn aggregate_config(&self) -> &AggregateConfig {
        &self.aggregate
    }

    /// Whether results are normalized.
    #[must_use]
    pub const fn normalizes(&self) -> bool {
        self.normalize
    }

    /// Sweep `table` along both axes and, if configured, normalize.
    ///
    /// # Errors
    ///
    /// Returns integrity-check errors (when strict), oracle lookup errors,
    /// and [`Error::SentinelMismatch`]
    pub fn run<O: BaselineOracle + ?Sized>(
        &self,
        table: &RecordTable,
        oracle: &O,
    ) -> Result<SweepReport> {
        let table = table.exclude_validators(&self.exclude_validators);
        if self.strict {
            table.check_unique_identity()?;
            table.check_accuracy_consistency()?;
        }

        let undefined = table
            .records()
            .iter()
            .filter(|r| r.scored_accuracy().is_none())
            .count();
        if undefined > 0 {
            warn!(
                rows = undefined,
                total = table.len(),
                "rows with undefined score or target accuracy are ignored by aggregation"
            );
        }

        let report = per_threshold(&table, oracle, &self.aggregate)?;
        if !self.normalize {
            return Ok(report);
        }

        let full = table.view();
        let report = SweepReport {
            per_src: normalize(report.per_src, &full, &self.aggregate)?,
            per_target: normalize(report.per_target, &full, &self.aggregate)?,
        };
        info!(
            src_rows = report.per_src.len(),
            target_rows = report.per_target.len(),
            "normalized sweep results"
        );
        Ok(report)
    }
}

/// Evaluation builder
#[derive(Debug, Clone, Default)]
pub struct EvaluationBuilder {
    config: EvalConfig,
}

impl EvaluationBuilder {
    /// Set number of top-scoring checkpoints averaged per group
    #[must_use]
    pub fn top_n(mut self, top_n: usize) -> Self {
        self.config.top_n = top_n;
        self
    }

    /// Set group-by granularity
    #[must_use]
    pub fn granularity(mut self, granularity: Granularity) -> Self {
        self.config.granularity = granularity;
        self
    }

    /// Enable or disable normalization
    #[must_use]
    pub fn normalize(mut self, normalize: bool) -> Self {
        self.config.normalize = normalize;
        self
    }

    /// Enable or disable the record integrity checks
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.config.strict = strict;
        self
    }

    /// Drop a validator, by unified name, before sweeping
    #[must_use]
    pub fn exclude_validator(mut self, unified_name: impl Into<String>) -> Self {
        self.config.exclude_validators.push(unified_name.into());
        self
    }

    /// Build the evaluation
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `top_n` is zero
    pub fn build(self) -> Result<Evaluation> {
        let EvalConfig {
            top_n,
            granularity,
            normalize,
            strict,
            exclude_validators,
        } = self.config;
        Ok(Evaluation {
            aggregate: AggregateConfig::new(granularity, top_n)?,
            normalize,
            strict,
            exclude_validators,
        })
    }
}
