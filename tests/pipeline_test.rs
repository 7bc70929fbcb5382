//! Integration test for the Parquet-in, Parquet-out pipeline
//!
//! 1. Write a checkpoint table to Parquet (several row groups)
//! 2. Load it through the storage engine and decode records
//! 3. Run a configured evaluation
//! 4. Persist both result tables and read them back

use arrow::array::AsArray;
use arrow::datatypes::Float64Type;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::{Path, PathBuf};
use validator_sweep::record::{CheckpointRecord, DomainType, RecordTable, Split, TARGET_ACCURACY};
use validator_sweep::storage::{records_to_batch, write_parquet, StorageEngine};
use validator_sweep::{BaselineTable, EvalConfig, Evaluation};

const ADAPTERS: [&str; 2] = ["DANNConfig", "MCDConfig"];
const VALIDATORS: [&str; 3] = ["IM", "SND", "Entropy"];

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("validator_sweep_it_{}_{name}", std::process::id()))
}

/// 2 tasks x 2 adapters x 3 validators x 20 epochs
#[allow(clippy::cast_precision_loss)]
fn create_test_table() -> RecordTable {
    let mut records = Vec::new();
    for target in ["dslr", "webcam"] {
        for adapter in ADAPTERS {
            for (v, validator) in VALIDATORS.iter().enumerate() {
                for epoch in 0..20u64 {
                    let acc = 0.3 + epoch as f64 / 40.0;
                    // IM tracks accuracy, SND is reversed, Entropy is flat
                    let score = match v {
                        0 => acc,
                        1 => -acc,
                        _ => 0.5,
                    };
                    records.push(
                        CheckpointRecord::builder("office31", adapter, *validator)
                            .src_domains(["amazon"])
                            .target_domains([target])
                            .epoch(epoch)
                            .score(score)
                            .accuracy("src_val_macro", 0.5 + epoch as f64 / 50.0)
                            .accuracy(TARGET_ACCURACY, acc)
                            .build(),
                    );
                }
            }
        }
    }
    RecordTable::new(records)
}

fn create_test_parquet<P: AsRef<Path>>(
    path: P,
    table: &RecordTable,
) -> Result<(), Box<dyn std::error::Error>> {
    let batch = records_to_batch(table)?;
    let file = File::create(path)?;
    let props = WriterProperties::builder()
        .set_max_row_group_size(50)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn baselines(table: &RecordTable) -> BaselineTable {
    let mut baselines = BaselineTable::new();
    for task in table.tasks() {
        baselines.insert(&task, DomainType::Source, Split::Val, 0.8);
        baselines.insert(&task, DomainType::Target, Split::Train, 0.4);
    }
    baselines
}

#[test]
fn test_parquet_loading_preserves_records() {
    let path = temp_path("records.parquet");
    let table = create_test_table();
    create_test_parquet(&path, &table).unwrap();

    let storage = StorageEngine::load_parquet(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(storage.num_rows(), 240);
    assert_eq!(storage.records().unwrap(), table);
}

#[test]
fn test_full_pipeline_from_config_file() {
    let records_path = temp_path("pipeline_records.parquet");
    let config_path = temp_path("pipeline_config.json");
    let src_out = temp_path("per_src.parquet");
    let target_out = temp_path("per_target.parquet");

    let table = create_test_table();
    create_test_parquet(&records_path, &table).unwrap();
    std::fs::write(
        &config_path,
        r#"{"top_n": 3, "granularity": "per_task_per_adapter", "exclude_validators": ["Entropy"]}"#,
    )
    .unwrap();

    let config = EvalConfig::from_json_file(&config_path).unwrap();
    let loaded = StorageEngine::load_parquet(&records_path)
        .unwrap()
        .records()
        .unwrap();
    let report = Evaluation::from_config(config)
        .unwrap()
        .run(&loaded, &baselines(&loaded))
        .unwrap();

    // 2 tasks x 2 adapters x 2 validators at the sentinel
    let sentinel = report.per_src.at_threshold(-0.01);
    assert_eq!(sentinel.len(), 8);
    for row in &sentinel {
        let corr = row.correlation.unwrap();
        match row.key.validator.as_str() {
            "IM" => assert!((corr - 1.0).abs() < 1e-12),
            "SND" => assert!((corr + 1.0).abs() < 1e-12),
            other => panic!("excluded validator {other} in output"),
        }
    }

    write_parquet(&src_out, &[report.per_src.to_record_batch().unwrap()]).unwrap();
    write_parquet(&target_out, &[report.per_target.to_record_batch().unwrap()]).unwrap();

    let reread = StorageEngine::load_parquet(&src_out).unwrap();
    let batch = &reread.batches()[0];
    assert_eq!(reread.num_rows(), report.per_src.len());
    assert!(batch.schema().field_with_name("adapter").is_ok());
    assert!(batch.schema().field_with_name("src_threshold").is_ok());
    let best = batch
        .column_by_name("best_acc")
        .unwrap()
        .as_primitive::<Float64Type>();
    assert!(best.iter().flatten().all(|b| (b - (0.775 + 0.75 + 0.725) / 3.0).abs() < 1e-12));

    let target_reread = StorageEngine::load_parquet(&target_out).unwrap();
    assert!(target_reread.batches()[0]
        .schema()
        .field_with_name("target_threshold")
        .is_ok());

    for path in [records_path, config_path, src_out, target_out] {
        std::fs::remove_file(path).unwrap();
    }
}
