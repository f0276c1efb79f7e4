//! Core data types and constants.
//!
//! This module contains the value types that flow between the binning
//! planner, the aggregation executor, the bin set merger and the selection
//! controller.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::error::{CrossfilterError, Result};

// ============================================================================
// Constants
// ============================================================================

/// Bin or category count above which a performance advisory is logged
pub const PERFORMANCE_ADVISORY_THRESHOLD: usize = 50_000;

/// Decimal digits kept in bin labels and predicate bounds
pub const LABEL_PRECISION: i32 = 4;

/// Bar color of the chart currently driving the datatile
pub const DATATILE_ACTIVE_COLOR: &str = "#8ab4f7";

/// Bar color of interactive charts that are not the active view
pub const DATATILE_INACTIVE_COLOR: &str = "#d3d9e2";

/// Largest magnitude an integer stride type can represent exactly
pub const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0; // 2^53

// ============================================================================
// Numeric helpers
// ============================================================================

/// Round `value` to `digits` decimal places (half away from zero)
pub fn round_decimals(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    let rounded = (value * factor).round() / factor;
    // Collapse -0.0 so it never renders as "-0"
    rounded + 0.0
}

/// Format a number the way keys and labels are displayed: whole numbers
/// without a fractional part, everything else in shortest round-trip form.
pub fn format_number(value: f64) -> String {
    let value = value + 0.0;
    if value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Hashable identity of a bin key
#[inline]
pub(crate) fn key_bits(key: f64) -> u64 {
    (key + 0.0).to_bits()
}

// ============================================================================
// Identifiers and enums
// ============================================================================

/// Identity of a chart within one dashboard
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartId(String);

impl ChartId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a unique id for an unnamed chart over column `x`
    pub fn generate(x: &str) -> Self {
        Self(format!("{}_bar_{}", x, uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChartId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ChartId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Declared kind of a dimension column
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DimensionKind {
    Boolean,
    Numeric,
}

/// Numeric type that strides and predicate bounds are cast to
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
pub enum StrideType {
    #[default]
    #[strum(serialize = "integer", to_string = "int")]
    Integer,
    #[strum(serialize = "f64", to_string = "float")]
    Float,
}

impl StrideType {
    /// Parse a configured stride type name
    ///
    /// Anything other than an integer or float type name is a configuration
    /// error, raised before any predicate is ever formatted.
    pub fn parse(name: &str) -> Result<Self> {
        name.trim().to_ascii_lowercase().parse().map_err(|_| {
            CrossfilterError::InvalidBinningRequest(format!(
                "stride type '{}' is not numeric (expected 'int' or 'float')",
                name
            ))
        })
    }

    /// Cast an already rounded value to this type
    pub fn cast(&self, value: f64) -> f64 {
        match self {
            StrideType::Integer => value.round() + 0.0,
            StrideType::Float => value + 0.0,
        }
    }
}

/// Aggregate function applied to each bin
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AggregateFn {
    #[default]
    Count,
    Mean,
}

/// Visual emphasis of an interactive chart, decided by the datatile state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Emphasis {
    /// The chart drives the currently loaded datatile
    Active,
    /// Another chart drives the datatile
    Inactive,
}

// ============================================================================
// Dimension
// ============================================================================

/// Observed statistics of one column
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub kind: DimensionKind,
    pub min: f64,
    pub max: f64,
}

impl Dimension {
    pub fn new(name: impl Into<String>, kind: DimensionKind, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            kind,
            min,
            max,
        }
    }

    /// Compute statistics from observed values, ignoring non-finite entries
    pub fn from_values(name: &str, kind: DimensionKind, values: &[f64]) -> Result<Self> {
        let mut finite = values.iter().copied().filter(|v| v.is_finite()).peekable();
        if finite.peek().is_none() {
            return Err(CrossfilterError::invalid_dimension(
                name,
                "no observed values",
            ));
        }
        let (min, max) = finite.fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
        Ok(Self::new(name, kind, min, max))
    }

    /// Reject dimensions a chart cannot be initialized from
    pub fn validate(&self) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(CrossfilterError::invalid_dimension(
                &self.name,
                "bounds are not finite",
            ));
        }
        if self.max < self.min {
            return Err(CrossfilterError::invalid_dimension(
                &self.name,
                format!("max {} is below min {}", self.max, self.min),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Binning spec
// ============================================================================

/// How a dimension is discretized, computed once per chart
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BinningSpec {
    /// Width of one bin; `None` means exact-value histogram
    pub stride: Option<f64>,
    pub stride_type: StrideType,
    /// Fixed-stride bins when true, one bin per distinct value otherwise
    pub custom_binning: bool,
    /// Number of bin slots, or distinct values once resolved by the executor
    pub bin_count: Option<usize>,
    pub min: f64,
    pub max: f64,
}

impl BinningSpec {
    /// Record the category count resolved by an exact-value histogram
    pub fn resolve_bin_count(&self, count: usize) -> Self {
        Self {
            bin_count: Some(count),
            ..self.clone()
        }
    }

    /// Step of the range widget attached to the chart
    ///
    /// Falls back to the range divided by the resolved count for exact-value
    /// histograms. Integer steps never go below one.
    pub fn slider_step(&self) -> Option<f64> {
        let step = match self.stride {
            Some(stride) => stride,
            None => {
                let count = self.bin_count.filter(|&c| c > 0)?;
                self.stride_type
                    .cast(((self.max - self.min) / count as f64).round())
            }
        };
        match self.stride_type {
            StrideType::Integer => Some(step.max(1.0)),
            StrideType::Float => Some(step),
        }
    }
}

// ============================================================================
// Bin sets and labels
// ============================================================================

/// Bin key (as string) to display label
pub type LabelMap = BTreeMap<String, String>;

/// Parallel key/value sequences describing one chart's bars
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BinSet {
    keys: Vec<f64>,
    values: Vec<f64>,
}

impl BinSet {
    /// Build a bin set, checking the parallel-sequence and unique-key invariants
    pub fn new(keys: Vec<f64>, values: Vec<f64>) -> Result<Self, String> {
        if keys.len() != values.len() {
            return Err(format!(
                "{} keys but {} values",
                keys.len(),
                values.len()
            ));
        }
        let mut seen = HashSet::with_capacity(keys.len());
        if let Some(dup) = keys.iter().find(|&&k| !seen.insert(key_bits(k))) {
            return Err(format!("duplicate bin key {}", format_number(*dup)));
        }
        Ok(Self { keys, values })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a bin set from keys already known to be unique
    pub(crate) fn from_parts(keys: Vec<f64>, values: Vec<f64>) -> Self {
        debug_assert_eq!(keys.len(), values.len());
        Self { keys, values }
    }

    pub fn keys(&self) -> &[f64] {
        &self.keys
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.keys.iter().copied().zip(self.values.iter().copied())
    }

    /// Value stored under `key`, if the key is present
    pub fn value_for(&self, key: f64) -> Option<f64> {
        let bits = key_bits(key);
        self.iter()
            .find(|(k, _)| key_bits(*k) == bits)
            .map(|(_, v)| v)
    }
}

// ============================================================================
// Selection
// ============================================================================

/// Selected `(low, high)` range of one chart, always inside the chart's bounds
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub low: f64,
    pub high: f64,
}

impl Selection {
    /// Create a selection, ordering the bounds
    pub fn new(low: f64, high: f64) -> Self {
        if high < low {
            Self {
                low: high,
                high: low,
            }
        } else {
            Self { low, high }
        }
    }

    /// The full range, meaning no filter from this dimension
    pub fn full(min: f64, max: f64) -> Self {
        Self::new(min, max)
    }

    /// Clamp both bounds into `[min, max]`
    pub fn clamped(self, min: f64, max: f64) -> Self {
        Self::new(self.low.clamp(min, max), self.high.clamp(min, max))
    }

    /// Whether this selection covers the whole `[min, max]` range
    pub fn is_full(&self, min: f64, max: f64) -> bool {
        let tolerance = 1e-9 * (max - min).abs().max(1.0);
        (self.low - min).abs() <= tolerance && (self.high - max).abs() <= tolerance
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}
