//! # validator-sweep: Threshold-Sweep Evaluation of Proxy Validators
//!
//! **Version**: 0.1.0
//!
//! Unsupervised domain adaptation cannot measure accuracy on the target
//! domain, so checkpoints are picked by a proxy *validator score*. This
//! crate measures how well a validator does that job: sweeping a minimum
//! accuracy threshold (a fraction of the source-only model's accuracy) over
//! a grid, and at each point reporting per group
//!
//! - the Spearman correlation between validator score and target accuracy
//! - the mean target accuracy of the top-N checkpoints by score,
//!   optionally relative to the best achievable top-N accuracy
//!
//! ## Pipeline
//!
//! ```text
//! RecordTable ──► per task slice ──► for t in grid: filter(baseline·t)
//!                                                    │
//!                          SweepReport ◄── normalize ◄── aggregate per group
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use validator_sweep::record::{CheckpointRecord, DomainType, RecordTable, Split, Task};
//! use validator_sweep::Evaluation;
//!
//! let table: RecordTable = (0..10u32)
//!     .map(|epoch| {
//!         let acc = f64::from(epoch) / 10.0;
//!         CheckpointRecord::builder("office31", "DANNConfig", "IM")
//!             .src_domains(["amazon"])
//!             .target_domains(["webcam"])
//!             .epoch(u64::from(epoch))
//!             .score(acc * 2.0)
//!             .accuracy("src_val_macro", 0.9)
//!             .accuracy("target_train_macro", acc)
//!             .build()
//!     })
//!     .collect();
//!
//! let oracle = |_: &Task, _: DomainType, _: Split| -> validator_sweep::Result<f64> { Ok(0.8) };
//! let report = Evaluation::builder().top_n(3).build()?.run(&table, &oracle)?;
//!
//! let unfiltered = report.per_src.at_threshold(-0.01);
//! assert!((unfiltered[0].correlation.unwrap() - 1.0).abs() < 1e-12);
//! # Ok::<(), validator_sweep::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod aggregate;
pub mod baseline;
pub mod config;
pub mod error;
pub mod filter;
pub mod normalize;
pub mod record;
pub mod report;
pub mod stats;
pub mod storage;
pub mod sweep;

pub use baseline::{BaselineOracle, BaselineTable};
pub use config::{EvalConfig, Evaluation, EvaluationBuilder};
pub use error::{Error, Result};
pub use report::{SweepReport, ThresholdRow, ThresholdTable};
