//! Storage backend (Arrow/Parquet)
//!
//! Checkpoint tables are loaded in bulk and kept as Arrow record batches;
//! [`StorageEngine::records`] decodes them into a [`RecordTable`] for the
//! sweep. Result tables go back out through [`write_parquet`].
//!
//! Write pattern is append-only: batches are added whole, never updated
//! row by row. Every batch must share the first batch's schema.

pub mod schema;

use crate::record::RecordTable;
use crate::{Error, Result};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use std::path::Path;
use tracing::{debug, info};

pub use schema::{batch_to_records, record_schema, records_to_batch};

/// Storage engine for Arrow/Parquet checkpoint tables
#[derive(Debug, Clone, Default)]
pub struct StorageEngine {
    batches: Vec<RecordBatch>,
}

impl StorageEngine {
    /// Create a new storage engine from existing batches
    ///
    /// Useful for testing and benchmarking
    #[must_use]
    pub fn new(batches: Vec<RecordBatch>) -> Self {
        Self { batches }
    }

    /// Encode an in-memory table as a single batch
    ///
    /// # Errors
    ///
    /// Returns error if the records cannot be encoded
    pub fn from_records(table: &RecordTable) -> Result<Self> {
        Ok(Self::new(vec![records_to_batch(table)?]))
    }

    /// Load table from Parquet file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load_parquet<P: AsRef<Path>>(path: P) -> Result<Self> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
        use std::fs::File;

        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::StorageError(format!("Failed to open Parquet file {}: {e}", path.display()))
        })?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| {
            Error::StorageError(format!("Failed to parse Parquet file: {e}"))
        })?;

        let reader = builder.build().map_err(|e| {
            Error::StorageError(format!("Failed to create Parquet reader: {e}"))
        })?;

        let mut storage = Self::default();
        for batch in reader {
            let batch = batch.map_err(|e| {
                Error::StorageError(format!("Failed to read record batch: {e}"))
            })?;
            storage.append_batch(batch)?;
        }

        info!(
            path = %path.display(),
            batches = storage.batches.len(),
            rows = storage.num_rows(),
            "loaded checkpoint table"
        );
        Ok(storage)
    }

    /// Get all record batches
    #[must_use]
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Total rows across batches
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    /// Append batches to storage
    ///
    /// # Example
    ///
    /// ```rust
    /// # use validator_sweep::record::{CheckpointRecord, RecordTable};
    /// # use validator_sweep::storage::{records_to_batch, StorageEngine};
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let table = RecordTable::new(vec![
    ///     CheckpointRecord::builder("mnist", "DANNConfig", "IM")
    ///         .src_domains(["mnist"])
    ///         .target_domains(["mnistm"])
    ///         .score(0.1)
    ///         .accuracy("target_train_macro", 0.6)
    ///         .build(),
    /// ]);
    ///
    /// let mut storage = StorageEngine::new(vec![]);
    /// storage.append_batch(records_to_batch(&table)?)?;
    /// assert_eq!(storage.records()?, table);
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns error if batch schema doesn't match existing batches
    pub fn append_batch(&mut self, batch: RecordBatch) -> Result<()> {
        if let Some(first) = self.batches.first() {
            let existing_schema = first.schema();
            if batch.schema() != existing_schema {
                return Err(Error::StorageError(format!(
                    "Schema mismatch: expected {:?}, got {:?}",
                    existing_schema,
                    batch.schema()
                )));
            }
        }

        self.batches.push(batch);
        Ok(())
    }

    /// Decode every batch into one record table, in batch order
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaError`] if a batch does not follow the record schema
    pub fn records(&self) -> Result<RecordTable> {
        let mut records = Vec::with_capacity(self.num_rows());
        for batch in &self.batches {
            records.extend(batch_to_records(batch)?);
        }
        debug!(rows = records.len(), "decoded checkpoint records");
        Ok(RecordTable::new(records))
    }

    /// Write all batches to a Parquet file
    ///
    /// # Errors
    ///
    /// Returns error if the storage is empty or the file cannot be written
    pub fn write_parquet<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_parquet(path, &self.batches)
    }
}

/// Write batches sharing one schema to a Parquet file
///
/// # Errors
///
/// Returns error if `batches` is empty, the schemas differ, or the file
/// cannot be written
pub fn write_parquet<P: AsRef<Path>>(path: P, batches: &[RecordBatch]) -> Result<()> {
    let path = path.as_ref();
    let first = batches
        .first()
        .ok_or_else(|| Error::StorageError("No record batches to write".to_string()))?;

    let file = std::fs::File::create(path).map_err(|e| {
        Error::StorageError(format!("Failed to create Parquet file {}: {e}", path.display()))
    })?;
    let mut writer = ArrowWriter::try_new(file, first.schema(), None)?;
    for batch in batches {
        writer.write(batch)?;
    }
    writer.close()?;

    info!(path = %path.display(), batches = batches.len(), "wrote parquet file");
    Ok(())
}
