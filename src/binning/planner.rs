//! Binning planner.
//!
//! Decides, once per chart, whether a dimension is shown through fixed-stride
//! bins or as an exact-value histogram, and how wide the bins are.

use serde::{Deserialize, Serialize};

use super::check_bin_count;
use crate::error::{CrossfilterError, Result};
use crate::executor::Aggregated;
use crate::state::{
    BinningSpec, Dimension, DimensionKind, LabelMap, StrideType, MAX_EXACT_INTEGER,
};

/// Granularity requested by a chart's configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BinningRequest {
    /// Explicit bin width
    pub stride: Option<f64>,
    pub stride_type: StrideType,
    /// Desired number of bins ("data points"), used when no stride is given
    pub bin_count: Option<usize>,
    /// Labels supplied by the caller, which win over derived ones
    pub label_map: Option<LabelMap>,
}

/// Planner output: the immutable spec plus labels known before execution
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BinningPlan {
    pub spec: BinningSpec,
    /// Caller-supplied labels, or the default labels of a boolean dimension
    pub labels: Option<LabelMap>,
}

/// Labels shown for boolean dimensions
pub fn boolean_labels() -> LabelMap {
    LabelMap::from([
        ("0".to_string(), "False".to_string()),
        ("1".to_string(), "True".to_string()),
    ])
}

/// Plan how `dimension` is binned
pub fn plan_binning(dimension: &Dimension, request: &BinningRequest) -> Result<BinningPlan> {
    dimension.validate()?;

    if dimension.kind == DimensionKind::Boolean {
        return Ok(BinningPlan {
            spec: BinningSpec {
                stride: Some(1.0),
                stride_type: StrideType::Integer,
                custom_binning: true,
                bin_count: Some(2),
                min: 0.0,
                max: 1.0,
            },
            labels: Some(
                request
                    .label_map
                    .clone()
                    .filter(|labels| !labels.is_empty())
                    .unwrap_or_else(boolean_labels),
            ),
        });
    }

    let (min, max) = (dimension.min, dimension.max);

    // An integer stride over a sub-unit range would round to zero
    let stride_type = if max < 1.0 && request.stride_type == StrideType::Integer {
        StrideType::Float
    } else {
        request.stride_type
    };

    if stride_type == StrideType::Integer
        && (min.abs() > MAX_EXACT_INTEGER || max.abs() > MAX_EXACT_INTEGER)
    {
        return Err(CrossfilterError::InvalidBinningRequest(format!(
            "bounds of '{}' cannot be represented by an integer stride type",
            dimension.name
        )));
    }

    let stride = match (request.stride, request.bin_count) {
        (Some(stride), _) => Some(stride),
        (None, Some(0)) => {
            return Err(CrossfilterError::InvalidBinningRequest(format!(
                "bin count for '{}' must be positive",
                dimension.name
            )))
        }
        (None, Some(count)) => {
            let width = (max - min) / count as f64;
            Some(match stride_type {
                StrideType::Integer => width.round(),
                StrideType::Float => width,
            })
        }
        (None, None) => None,
    };

    let spec = match stride {
        None => BinningSpec {
            stride: None,
            stride_type,
            custom_binning: false,
            bin_count: None,
            min,
            max,
        },
        Some(stride) => {
            if !stride.is_finite() || stride <= 0.0 {
                return Err(CrossfilterError::InvalidBinningRequest(format!(
                    "resolved stride {} for '{}' is not positive",
                    stride, dimension.name
                )));
            }
            let slots = ((max - min) / stride).round();
            let bin_count = (slots.is_finite() && slots < usize::MAX as f64)
                .then(|| (slots as usize).checked_add(1))
                .flatten()
                .ok_or_else(|| {
                    CrossfilterError::InvalidBinningRequest(format!(
                        "stride {} over '{}' yields too many bins",
                        stride, dimension.name
                    ))
                })?;
            BinningSpec {
                stride: Some(stride),
                stride_type,
                custom_binning: true,
                bin_count: Some(bin_count),
                min,
                max,
            }
        }
    };

    Ok(BinningPlan {
        spec,
        labels: request.label_map.clone(),
    })
}

/// Fold an executor result back into the binning spec
///
/// Exact-value histograms learn their category count only here. Oversized
/// bin or category counts log the performance advisory; the returned flag
/// tells whether it fired.
pub fn resolve_execution(
    dimension: &str,
    spec: &BinningSpec,
    aggregated: &Aggregated,
    advisory_threshold: usize,
) -> (BinningSpec, bool) {
    let resolved = match aggregated.resolved_bin_count {
        Some(count) => spec.resolve_bin_count(count),
        None if spec.bin_count.is_none() => spec.resolve_bin_count(aggregated.bins.len()),
        None => spec.clone(),
    };
    let advisory = resolved
        .bin_count
        .is_some_and(|count| check_bin_count(dimension, count, advisory_threshold));
    (resolved, advisory)
}
