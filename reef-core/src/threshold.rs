//! Per-parameter threshold evaluation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::params::{ParameterKey, ParameterValues};

// ------------------------------------------------------------------ //
//  Types                                                              //
// ------------------------------------------------------------------ //

/// Acceptable range for one parameter. Either bound may be left open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Threshold {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min: Some(min), max: Some(max) }
    }

    /// No bound set; such a threshold never flags.
    pub fn is_open(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// `min <= max`, or true when either bound is open.
    ///
    /// Informational: [`evaluate`] checks each bound on its own.
    pub fn is_ordered(&self) -> bool {
        match (self.min, self.max) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        }
    }
}

/// Thresholds configured by one owner.
pub type ThresholdSet = BTreeMap<ParameterKey, Threshold>;

/// Which side of the range a reading fell on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    TooLow,
    TooHigh,
}

impl FlagKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FlagKind::TooLow  => "too low",
            FlagKind::TooHigh => "too high",
        }
    }
}

/// An out-of-range reading, carrying the offending value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Flag {
    TooLow(f64),
    TooHigh(f64),
}

impl Flag {
    pub fn kind(&self) -> FlagKind {
        match self {
            Flag::TooLow(_)  => FlagKind::TooLow,
            Flag::TooHigh(_) => FlagKind::TooHigh,
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            Flag::TooLow(v) | Flag::TooHigh(v) => *v,
        }
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.kind().as_str(), self.value())
    }
}

/// A flag attributed to the parameter that raised it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterFlag {
    pub key: ParameterKey,
    pub flag: Flag,
}

impl std::fmt::Display for ParameterFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.key.label(), self.flag)
    }
}

// ------------------------------------------------------------------ //
//  Evaluation                                                         //
// ------------------------------------------------------------------ //

/// Evaluate a single reading against its threshold.
///
/// Values exactly on a bound are in range.
pub fn evaluate(latest: f64, threshold: Option<&Threshold>) -> Option<Flag> {
    let threshold = threshold?;
    if let Some(min) = threshold.min {
        if latest < min {
            return Some(Flag::TooLow(latest));
        }
    }
    if let Some(max) = threshold.max {
        if latest > max {
            return Some(Flag::TooHigh(latest));
        }
    }
    None
}

/// Flags for every value in `values` that falls outside its threshold, in
/// parameter order.
pub fn evaluate_reading(
    values: &ParameterValues,
    thresholds: &ThresholdSet,
) -> Vec<ParameterFlag> {
    values
        .iter()
        .filter_map(|(key, value)| {
            evaluate(*value, thresholds.get(key)).map(|flag| ParameterFlag { key: *key, flag })
        })
        .collect()
}

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //
