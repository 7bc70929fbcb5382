//! Long-format result tables
//!
//! One row per (group key, threshold). Tables are handed to renderers as
//! Arrow record batches with the schema:
//!
//! ```text
//! validator | validator_args | dataset | src_domains | target_domains | [adapter]
//!   | {axis}_threshold | correlation? | predicted_best_acc? | [best_acc?]
//! ```

use arrow::array::{ArrayRef, Float64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::aggregate::{Granularity, GroupKey, GroupStats};
use crate::storage::schema::domains_array;
use crate::{Error, Result};

/// One group at one threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRow {
    /// Group key
    pub key: GroupKey,
    /// Threshold fraction, rounded to 2 decimals
    pub threshold: f64,
    /// Spearman correlation; `None` when undefined for this slice
    pub correlation: Option<f64>,
    /// Top-N accuracy (absolute, or relative after normalization); `None` when undefined
    pub predicted_best_acc: Option<f64>,
    /// Best achievable top-N accuracy, filled in by normalization
    pub best_acc: Option<f64>,
}

impl ThresholdRow {
    /// Tag aggregated statistics with a threshold.
    #[must_use]
    pub fn from_stats(stats: GroupStats, threshold: f64) -> Self {
        Self {
            key: stats.key,
            threshold,
            correlation: stats.correlation,
            predicted_best_acc: Some(stats.predicted_best_acc),
            best_acc: None,
        }
    }
}

/// Result table of one sweep axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTable {
    column: String,
    granularity: Granularity,
    normalized: bool,
    rows: Vec<ThresholdRow>,
}

impl ThresholdTable {
    /// Create a table.
    ///
    /// # Arguments
    ///
    /// * `column` - Threshold column name, e.g. `src_threshold`
    /// * `granularity` - Granularity the rows were grouped at
    /// * `rows` - Rows in grid order
    #[must_use]
    pub fn new(column: impl Into<String>, granularity: Granularity, rows: Vec<ThresholdRow>) -> Self {
        Self {
            column: column.into(),
            granularity,
            normalized: false,
            rows,
        }
    }

    /// Concatenate tables of the same axis, in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the tables disagree on column,
    /// granularity, or whether they are normalized
    pub fn concat(
        column: impl Into<String>,
        granularity: Granularity,
        tables: impl IntoIterator<Item = Self>,
    ) -> Result<Self> {
        let mut out = Self::new(column, granularity, Vec::new());
        for (i, table) in tables.into_iter().enumerate() {
            if table.column != out.column || table.granularity != out.granularity {
                return Err(Error::InvalidInput(format!(
                    "Cannot concatenate {} ({:?}) onto {} ({:?})",
                    table.column, table.granularity, out.column, out.granularity
                )));
            }
            if i == 0 {
                out.normalized = table.normalized;
            } else if table.normalized != out.normalized {
                return Err(Error::InvalidInput(format!(
                    "Cannot concatenate normalized and raw {} tables",
                    out.column
                )));
            }
            out.rows.extend(table.rows);
        }
        Ok(out)
    }

    /// Threshold column name.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Granularity of the group keys.
    #[must_use]
    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Whether `predicted_best_acc` holds relative accuracies.
    #[must_use]
    pub const fn is_normalized(&self) -> bool {
        self.normalized
    }

    /// Rows in grid order.
    #[must_use]
    pub fn rows(&self) -> &[ThresholdRow] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows tagged with `threshold` (compared at 2 decimals).
    #[must_use]
    pub fn at_threshold(&self, threshold: f64) -> Vec<&ThresholdRow> {
        let wanted = crate::stats::round_to(threshold, 2);
        self.rows
            .iter()
            .filter(|r| (r.threshold - wanted).abs() < 1e-9)
            .collect()
    }

    pub(crate) fn into_normalized(self, rows: Vec<ThresholdRow>) -> Self {
        Self {
            normalized: true,
            rows,
            ..self
        }
    }

    /// Encode as an Arrow record batch.
    ///
    /// # Errors
    ///
    /// Returns error if Arrow rejects the assembled columns
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let mut fields = vec![
            Field::new("validator", DataType::Utf8, false),
            Field::new("validator_args", DataType::Utf8, false),
            Field::new("dataset", DataType::Utf8, false),
            Field::new("src_domains", DataType::new_list(DataType::Utf8, true), false),
            Field::new("target_domains", DataType::new_list(DataType::Utf8, true), false),
        ];
        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(
                self.rows.iter().map(|r| r.key.validator.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(
                self.rows.iter().map(|r| r.key.validator_args.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(
                self.rows.iter().map(|r| r.key.task.dataset()),
            )),
            domains_array(self.rows.iter().map(|r| r.key.task.src_domains())),
            domains_array(self.rows.iter().map(|r| r.key.task.target_domains())),
        ];

        if self.granularity.per_adapter() {
            fields.push(Field::new("adapter", DataType::Utf8, true));
            columns.push(Arc::new(StringArray::from(
                self.rows
                    .iter()
                    .map(|r| r.key.adapter.as_deref())
                    .collect::<Vec<_>>(),
            )));
        }

        fields.push(Field::new(&self.column, DataType::Float64, false));
        columns.push(Arc::new(Float64Array::from_iter_values(
            self.rows.iter().map(|r| r.threshold),
        )));

        fields.push(Field::new("correlation", DataType::Float64, true));
        columns.push(Arc::new(Float64Array::from(
            self.rows.iter().map(|r| r.correlation).collect::<Vec<_>>(),
        )));

        fields.push(Field::new("predicted_best_acc", DataType::Float64, true));
        columns.push(Arc::new(Float64Array::from(
            self.rows
                .iter()
                .map(|r| r.predicted_best_acc)
                .collect::<Vec<_>>(),
        )));

        if self.normalized {
            fields.push(Field::new("best_acc", DataType::Float64, true));
            columns.push(Arc::new(Float64Array::from(
                self.rows.iter().map(|r| r.best_acc).collect::<Vec<_>>(),
            )));
        }

        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
    }
}

/// Both sweep axes of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Per source-threshold table
    pub per_src: ThresholdTable,
    /// Per target-threshold table
    pub per_target: ThresholdTable,
}
