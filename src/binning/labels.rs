//! Bin labels.
//!
//! Fixed-stride charts are aggregated by bin index; renderers show the real
//! value of each bin instead, taken from the map built here.

use super::planner::BinningPlan;
use crate::state::{format_number, round_decimals, BinningSpec, LabelMap, LABEL_PRECISION};

/// Map bin index `i` to `round(i * stride + min, 4)`
///
/// Only fixed-stride specs get a map; exact-value histograms already carry
/// real values as keys.
pub fn label_map(spec: &BinningSpec, keys: &[f64]) -> Option<LabelMap> {
    let stride = spec.stride.filter(|_| spec.custom_binning)?;
    Some(
        keys.iter()
            .map(|&index| {
                let value = round_decimals(index * stride + spec.min, LABEL_PRECISION);
                (format_number(index), format_number(value))
            })
            .collect(),
    )
}

/// Labels for a chart: caller or boolean labels first, derived labels otherwise
pub fn resolve_labels(plan: &BinningPlan, spec: &BinningSpec, keys: &[f64]) -> Option<LabelMap> {
    match &plan.labels {
        Some(labels) if !labels.is_empty() => Some(labels.clone()),
        _ => label_map(spec, keys),
    }
}
