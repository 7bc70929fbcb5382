//! Checkpoint records: the input table of the sweep
//!
//! One row per trial × epoch × validator configuration, carrying the
//! validator score and the true accuracies of that checkpoint.
//!
//! ## Schema Overview
//!
//! ```text
//! Task (dataset, src_domains, target_domains)
//!   └──< CheckpointRecord (N)
//!          ├── adapter, validator, validator_args, epoch, trial_params
//!          ├── score                      [proxy signal, may be NaN]
//!          └── accuracies {split_avg: f64} [ground truth]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use validator_sweep::record::{CheckpointRecord, RecordTable, TARGET_ACCURACY};
//!
//! let record = CheckpointRecord::builder("office31", "DANNConfig", "IM")
//!     .src_domains(["amazon"])
//!     .target_domains(["dslr"])
//!     .epoch(3)
//!     .score(0.42)
//!     .accuracy("src_val_macro", 0.81)
//!     .accuracy(TARGET_ACCURACY, 0.64)
//!     .build();
//!
//! let table = RecordTable::new(vec![record]);
//! assert_eq!(table.tasks().len(), 1);
//! ```

mod accuracy;
mod checkpoint_record;
mod table;
mod task;
mod validator_args;

pub use accuracy::{AccuracyName, Averaging, DomainType, Split, TARGET_ACCURACY};
pub use checkpoint_record::{CheckpointKey, CheckpointRecord, CheckpointRecordBuilder, IdentityKey};
pub use table::{RecordSlice, RecordTable};
pub use task::Task;
pub use validator_args::{canonical_validator_args, unified_validator_name};
