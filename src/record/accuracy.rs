//! Accuracy field naming: `{domain}_{split}_{averaging}`

use serde::{Deserialize, Serialize};
use std::fmt;

/// Accuracy field used as ground truth for correlation and top-N selection.
pub const TARGET_ACCURACY: &str = "target_train_macro";

/// Which side of the adaptation an accuracy or threshold refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainType {
    /// Source domain(s) the model was trained with labels on
    #[serde(rename = "src")]
    Source,
    /// Unlabeled target domain(s)
    Target,
}

impl DomainType {
    /// Short name used in field and column names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Source => "src",
            Self::Target => "target",
        }
    }

    /// Split whose accuracy anchors thresholds on this side.
    ///
    /// Source thresholds use validation accuracy, target thresholds use the
    /// (unlabeled at training time) train split.
    #[must_use]
    pub const fn threshold_split(self) -> Split {
        match self {
            Self::Source => Split::Val,
            Self::Target => Split::Train,
        }
    }

    /// Accuracy field compared by the threshold filter on this side.
    #[must_use]
    pub const fn threshold_field(self) -> AccuracyName {
        AccuracyName::new(self, self.threshold_split(), Averaging::Macro)
    }

    /// Column name of [`threshold_field`](Self::threshold_field).
    #[must_use]
    pub const fn threshold_field_name(self) -> &'static str {
        match self {
            Self::Source => "src_val_macro",
            Self::Target => TARGET_ACCURACY,
        }
    }
}

impl fmt::Display for DomainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data split an accuracy was measured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    /// Training split
    Train,
    /// Validation split
    Val,
}

impl Split {
    /// Short name used in field names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Val => "val",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Averaging of per-class accuracies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Averaging {
    /// Mean of per-class accuracies
    Macro,
    /// Accuracy over all samples
    Micro,
}

impl Averaging {
    /// Short name used in field names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Macro => "macro",
            Self::Micro => "micro",
        }
    }
}

/// Structured name of an accuracy field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccuracyName {
    domain: DomainType,
    split: Split,
    averaging: Averaging,
}

impl AccuracyName {
    /// Create an accuracy name.
    #[must_use]
    pub const fn new(domain: DomainType, split: Split, averaging: Averaging) -> Self {
        Self {
            domain,
            split,
            averaging,
        }
    }

    /// Parse `{domain}_{split}_{averaging}`; `None` for any other column name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let mut parts = name.split('_');
        let domain = match parts.next()? {
            "src" => DomainType::Source,
            "target" => DomainType::Target,
            _ => return None,
        };
        let split = match parts.next()? {
            "train" => Split::Train,
            "val" => Split::Val,
            _ => return None,
        };
        let averaging = match parts.next()? {
            "macro" => Averaging::Macro,
            "micro" => Averaging::Micro,
            _ => return None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(domain, split, averaging))
    }

    /// Domain side.
    #[must_use]
    pub const fn domain(&self) -> DomainType {
        self.domain
    }

    /// Split.
    #[must_use]
    pub const fn split(&self) -> Split {
        self.split
    }

    /// Averaging.
    #[must_use]
    pub const fn averaging(&self) -> Averaging {
        self.averaging
    }
}

impl fmt::Display for AccuracyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.domain.as_str(),
            self.split.as_str(),
            self.averaging.as_str()
        )
    }
}
