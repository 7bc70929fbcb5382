//! Tests for error types

use validator_sweep::Error;

#[test]
fn test_invalid_input_error() {
    let error = Error::InvalidInput("top_n must be greater than 0".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid input"));
    assert!(error_str.contains("top_n"));
}

#[test]
fn test_sentinel_mismatch_error() {
    let error = Error::SentinelMismatch {
        expected: 120,
        actual: 118,
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("returned 118 rows, expected 120"));
    assert!(error_str.contains("Please report this issue"));
}

#[test]
fn test_unknown_task_error() {
    let error = Error::UnknownTask {
        task: "office31_amazon_dslr".to_string(),
        domain: "target".to_string(),
        split: "train".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("office31_amazon_dslr"));
    assert!(error_str.contains("(target train)"));
}

#[test]
fn test_inconsistent_accuracy_error() {
    let error = Error::InconsistentAccuracy {
        checkpoint: "mnist/DANNConfig/epoch=3".to_string(),
        first: 0.25,
        second: 0.5,
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("mnist/DANNConfig/epoch=3"));
    assert!(error_str.contains("0.25 != 0.5"));
}

#[test]
fn test_storage_error() {
    let error = Error::StorageError("file not found".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Storage error"));
    assert!(error_str.contains("file not found"));
}

#[test]
fn test_schema_and_config_errors() {
    assert!(Error::SchemaError("missing column `epoch`".to_string())
        .to_string()
        .starts_with("Schema error"));
    assert!(Error::ConfigError("unknown field".to_string())
        .to_string()
        .starts_with("Config error"));
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error: Error = io_error.into();
    let error_str = format!("{error}");
    assert!(error_str.contains("IO error"));
}

#[test]
fn test_json_error_conversion() {
    let json_error = serde_json::from_str::<Vec<f64>>("[1.0,").unwrap_err();
    let error: Error = json_error.into();
    assert!(matches!(error, Error::Json(_)));
}

#[test]
fn test_error_debug() {
    let error = Error::DuplicateRecord("IM/layer_logits/mnist".to_string());
    let debug_str = format!("{error:?}");
    assert!(debug_str.contains("DuplicateRecord"));
}
