//! Binning: how a dimension is discretized and how fresh results are
//! reconciled with what a chart already shows.
//!
//! - [`planner`] - dimension statistics + requested granularity to a [`BinningSpec`]
//! - [`labels`] - human readable labels for fixed-stride bin indices
//! - [`merge`] - keeps a chart's domain stable across patch updates
//!
//! [`BinningSpec`]: crate::state::BinningSpec

pub mod labels;
pub mod merge;
pub mod planner;

pub use labels::{label_map, resolve_labels};
pub use merge::merge_patch;
pub use planner::{plan_binning, BinningPlan, BinningRequest};

/// Key of the bin a raw value falls into: its bin index under a fixed
/// stride, the value itself otherwise
#[inline]
pub fn bin_key(value: f64, stride: Option<f64>, min: f64) -> f64 {
    match stride {
        Some(stride) => ((value - min) / stride).round() + 0.0,
        None => value + 0.0,
    }
}

/// Representative data value of a bin key
#[inline]
pub fn bin_value(key: f64, stride: Option<f64>, min: f64) -> f64 {
    match stride {
        Some(stride) => key * stride + min,
        None => key,
    }
}

/// Log a performance advisory when a chart has too many bars
///
/// Returns true when the advisory fired. Never fails: the chart still renders.
pub fn check_bin_count(dimension: &str, count: usize, threshold: usize) -> bool {
    if count > threshold {
        tracing::warn!(
            "Number of x-values for bar chart over '{}' is {} (exceeds {}). \
             Performance may be laggy; set data_points to enforce custom binning \
             for smooth crossfiltering",
            dimension,
            count,
            threshold
        );
        true
    } else {
        false
    }
}
