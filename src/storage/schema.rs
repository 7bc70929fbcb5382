//! Arrow encoding of checkpoint records
//!
//! ```text
//! dataset: Utf8 | src_domains: List<Utf8> | target_domains: List<Utf8>
//! adapter: Utf8 | validator: Utf8 | validator_args: Utf8
//! epoch: Int64 | trial_params: Utf8 | score: Float64?
//! {src|target}_{train|val}_{macro|micro}: Float64?   (any subset)
//! ```
//!
//! Null scores decode as undefined (NaN); null accuracies are left out of
//! the record.

use arrow::array::{
    Array, ArrayRef, AsArray, Float64Array, Int64Array, ListArray, ListBuilder, StringArray,
    StringBuilder,
};
use arrow::datatypes::{DataType, Field, Float64Type, Int64Type, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::record::{AccuracyName, CheckpointRecord, RecordTable};
use crate::{Error, Result};

/// Record schema with the given accuracy columns, in order.
#[must_use]
pub fn record_schema<'a>(accuracy_columns: impl IntoIterator<Item = &'a str>) -> SchemaRef {
    let mut fields = vec![
        Field::new("dataset", DataType::Utf8, false),
        Field::new("src_domains", DataType::new_list(DataType::Utf8, true), false),
        Field::new("target_domains", DataType::new_list(DataType::Utf8, true), false),
        Field::new("adapter", DataType::Utf8, false),
        Field::new("validator", DataType::Utf8, false),
        Field::new("validator_args", DataType::Utf8, false),
        Field::new("epoch", DataType::Int64, false),
        Field::new("trial_params", DataType::Utf8, false),
        Field::new("score", DataType::Float64, true),
    ];
    fields.extend(
        accuracy_columns
            .into_iter()
            .map(|name| Field::new(name, DataType::Float64, true)),
    );
    Arc::new(Schema::new(fields))
}

/// Encode records as one batch; accuracy columns are the sorted union of
/// the fields present on any record.
///
/// # Errors
///
/// Returns [`Error::SchemaError`] if an epoch does not fit in `Int64`
pub fn records_to_batch(table: &RecordTable) -> Result<RecordBatch> {
    let records = table.records();
    let accuracy_columns: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.accuracies().keys().map(String::as_str))
        .collect();

    let epochs = records
        .iter()
        .map(|r| {
            i64::try_from(r.epoch()).map_err(|_| {
                Error::SchemaError(format!(
                    "epoch {} of {} exceeds Int64",
                    r.epoch(),
                    r.checkpoint_id()
                ))
            })
        })
        .collect::<Result<Vec<i64>>>()?;

    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(records.iter().map(CheckpointRecord::dataset))),
        domains_array(records.iter().map(CheckpointRecord::src_domains)),
        domains_array(records.iter().map(CheckpointRecord::target_domains)),
        Arc::new(StringArray::from_iter_values(records.iter().map(CheckpointRecord::adapter))),
        Arc::new(StringArray::from_iter_values(records.iter().map(CheckpointRecord::validator))),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(CheckpointRecord::validator_args),
        )),
        Arc::new(Int64Array::from(epochs)),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(CheckpointRecord::trial_params),
        )),
        Arc::new(Float64Array::from(
            records.iter().map(CheckpointRecord::defined_score).collect::<Vec<_>>(),
        )),
    ];
    for name in &accuracy_columns {
        columns.push(Arc::new(Float64Array::from(
            records
                .iter()
                .map(|r| r.accuracies().get(*name).copied())
                .collect::<Vec<_>>(),
        )));
    }

    Ok(RecordBatch::try_new(
        record_schema(accuracy_columns.iter().copied()),
        columns,
    )?)
}

/// Decode one record batch.
///
/// Columns are located by name; extra columns that are not accuracy fields
/// are ignored.
///
/// # Errors
///
/// Returns [`Error::SchemaError`] if a required column is missing, has the
/// wrong type, or holds a null identity value
pub fn batch_to_records(batch: &RecordBatch) -> Result<Vec<CheckpointRecord>> {
    let dataset = string_column(batch, "dataset")?;
    let src_domains = list_column(batch, "src_domains")?;
    let target_domains = list_column(batch, "target_domains")?;
    let adapter = string_column(batch, "adapter")?;
    let validator = string_column(batch, "validator")?;
    let validator_args = string_column(batch, "validator_args")?;
    let trial_params = string_column(batch, "trial_params")?;
    let epochs = typed_column(batch, "epoch", |a| a.as_primitive_opt::<Int64Type>())?;
    let scores = typed_column(batch, "score", |a| a.as_primitive_opt::<Float64Type>())?;

    let accuracy_columns = batch
        .schema()
        .fields()
        .iter()
        .filter(|f| AccuracyName::parse(f.name()).is_some())
        .map(|f| {
            typed_column(batch, f.name(), |a| a.as_primitive_opt::<Float64Type>())
                .map(|column| (f.name().clone(), column))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut records = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let raw_epoch = required(epochs, "epoch", row, Int64Array::value)?;
        let epoch = u64::try_from(raw_epoch).map_err(|_| {
            Error::SchemaError(format!("row {row}: negative epoch {raw_epoch}"))
        })?;

        let mut builder = CheckpointRecord::builder(
            required(dataset, "dataset", row, StringArray::value)?,
            required(adapter, "adapter", row, StringArray::value)?,
            required(validator, "validator", row, StringArray::value)?,
        )
        .src_domains(domains_at(src_domains, "src_domains", row)?)
        .target_domains(domains_at(target_domains, "target_domains", row)?)
        .validator_args(required(validator_args, "validator_args", row, StringArray::value)?)
        .trial_params(required(trial_params, "trial_params", row, StringArray::value)?)
        .epoch(epoch)
        .score(if scores.is_null(row) { f64::NAN } else { scores.value(row) });

        for (name, column) in &accuracy_columns {
            if column.is_valid(row) {
                builder = builder.accuracy(name.as_str(), column.value(row));
            }
        }
        records.push(builder.build());
    }
    Ok(records)
}

/// `List<Utf8>` column of domain lists.
pub(crate) fn domains_array<'a>(domains: impl Iterator<Item = &'a [String]>) -> ArrayRef {
    let mut builder = ListBuilder::new(StringBuilder::new());
    for list in domains {
        for domain in list {
            builder.values().append_value(domain);
        }
        builder.append(true);
    }
    Arc::new(builder.finish())
}

fn typed_column<'b, T: ?Sized>(
    batch: &'b RecordBatch,
    name: &str,
    cast: impl FnOnce(&'b dyn Array) -> Option<&'b T>,
) -> Result<&'b T> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| Error::SchemaError(format!("missing column `{name}`")))?;
    cast(column.as_ref()).ok_or_else(|| {
        Error::SchemaError(format!(
            "column `{name}` has unexpected type {}",
            column.data_type()
        ))
    })
}

fn string_column<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b StringArray> {
    typed_column(batch, name, |a| a.as_string_opt::<i32>())
}

fn list_column<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b ListArray> {
    typed_column(batch, name, |a| a.as_list_opt::<i32>())
}

fn required<'b, A: Array, T>(
    array: &'b A,
    name: &str,
    row: usize,
    value: impl Fn(&'b A, usize) -> T,
) -> Result<T> {
    if array.is_null(row) {
        return Err(Error::SchemaError(format!("row {row}: null `{name}`")));
    }
    Ok(value(array, row))
}

fn domains_at(list: &ListArray, name: &str, row: usize) -> Result<Vec<String>> {
    if list.is_null(row) {
        return Err(Error::SchemaError(format!("row {row}: null `{name}`")));
    }
    let values = list.value(row);
    let values = values.as_string_opt::<i32>().ok_or_else(|| {
        Error::SchemaError(format!("column `{name}` must be a list of Utf8"))
    })?;
    Ok(values.iter().flatten().map(str::to_string).collect())
}
