//! Canonical serialization of validator configurations

use std::collections::BTreeMap;
use std::fmt::Display;

/// Serialize a validator configuration as sorted `key_value` pairs joined by `_`.
///
/// Identical configurations always serialize identically, whatever order
/// the pairs are supplied in.
///
/// ```rust
/// use validator_sweep::record::canonical_validator_args;
///
/// let args = canonical_validator_args([("split", "src_val"), ("layer", "logits")]);
/// assert_eq!(args, "layer_logits_split_src_val");
/// ```
#[must_use]
pub fn canonical_validator_args<I, K, V>(args: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Display,
{
    let sorted: BTreeMap<String, String> = args
        .into_iter()
        .map(|(k, v)| (k.into(), v.to_string()))
        .collect();
    sorted
        .iter()
        .map(|(k, v)| format!("{k}_{v}"))
        .collect::<Vec<_>>()
        .join("_")
}

/// Name that identifies one validator instance, `{validator}_{validator_args}`.
#[must_use]
pub fn unified_validator_name(validator: &str, validator_args: &str) -> String {
    if validator_args.is_empty() {
        validator.to_string()
    } else {
        format!("{validator}_{validator_args}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_independent() {
        let a = canonical_validator_args([("T", "0.01"), ("layer", "preds"), ("split", "target_train")]);
        let b = canonical_validator_args([("split", "target_train"), ("T", "0.01"), ("layer", "preds")]);
        assert_eq!(a, b);
        assert_eq!(a, "T_0.01_layer_preds_split_target_train");
    }

    #[test]
    fn test_non_string_values() {
        let args = canonical_validator_args([("normalize", true.to_string()), ("p", 2.0.to_string())]);
        assert_eq!(args, "normalize_true_p_2");
    }

    #[test]
    fn test_empty_args() {
        let args = canonical_validator_args(Vec::<(String, String)>::new());
        assert_eq!(args, "");
        assert_eq!(unified_validator_name("DiversitySummed", &args), "DiversitySummed");
    }

    #[test]
    fn test_unified_name() {
        assert_eq!(
            unified_validator_name("Diversity", "split_src_train"),
            "Diversity_split_src_train"
        );
    }
}
