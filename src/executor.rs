//! Aggregation executor contract.
//!
//! The executor is the external service that turns a binning spec into raw
//! `(key, aggregate)` pairs over the currently filtered rows. It may dispatch
//! to an out-of-process backend; callers guard concurrent requests for the
//! same chart with [`crate::chart::AggregationGate`].

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::binning;
use crate::error::CrossfilterError;
use crate::selection::predicate::PredicateTable;
use crate::state::{AggregateFn, BinSet, BinningSpec, ChartId, Dimension};

// ============================================================================
// Error Types
// ============================================================================

/// Errors reported by an aggregation backend
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The dataset has no column with this name
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// The compute backend failed (e.g. a distributed task error)
    #[error("Aggregation backend error: {0}")]
    Backend(String),

    /// The backend returned keys that are not unique or not parallel to values
    #[error("Executor contract violation: {0}")]
    ContractViolation(String),
}

// ============================================================================
// Requests and results
// ============================================================================

/// Result of an exact-value histogram
#[derive(Clone, Debug, PartialEq)]
pub struct ValueCounts {
    /// One `(value, count)` pair per distinct value, ascending
    pub bins: BinSet,
    /// Number of distinct values observed
    pub resolved_bin_count: usize,
}

/// Which executor call a chart needs
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum AggregationRequest {
    /// One bin per distinct value of `dimension`
    ValueCounts { dimension: String },
    /// Group `dimension` by bins (or raw values when `stride` is `None`) and
    /// aggregate `aggregate_dimension` (or count rows)
    Binned {
        dimension: String,
        aggregate_dimension: Option<String>,
        aggregate_fn: AggregateFn,
        stride: Option<f64>,
        min: f64,
        bin_count: Option<usize>,
    },
}

impl AggregationRequest {
    /// Decide the executor call for a chart over `x` with optional target `y`
    ///
    /// A secondary target always aggregates with the mean; a plain histogram
    /// counts rows, through fixed-stride bins when custom binning is on.
    pub fn for_chart(x: &str, y: Option<&str>, spec: &BinningSpec) -> Self {
        match y.filter(|y| *y != x) {
            Some(target) => AggregationRequest::Binned {
                dimension: x.to_string(),
                aggregate_dimension: Some(target.to_string()),
                aggregate_fn: AggregateFn::Mean,
                stride: spec.stride.filter(|_| spec.custom_binning),
                min: spec.min,
                bin_count: spec.bin_count,
            },
            None if spec.custom_binning => AggregationRequest::Binned {
                dimension: x.to_string(),
                aggregate_dimension: None,
                aggregate_fn: AggregateFn::Count,
                stride: spec.stride,
                min: spec.min,
                bin_count: spec.bin_count,
            },
            None => AggregationRequest::ValueCounts {
                dimension: x.to_string(),
            },
        }
    }

    pub fn dimension(&self) -> &str {
        match self {
            AggregationRequest::ValueCounts { dimension } => dimension,
            AggregationRequest::Binned { dimension, .. } => dimension,
        }
    }

    pub fn aggregate_dimension(&self) -> Option<&str> {
        match self {
            AggregationRequest::ValueCounts { .. } => None,
            AggregationRequest::Binned {
                aggregate_dimension,
                ..
            } => aggregate_dimension.as_deref(),
        }
    }

    pub fn aggregate_fn(&self) -> AggregateFn {
        match self {
            AggregationRequest::ValueCounts { .. } => AggregateFn::Count,
            AggregationRequest::Binned { aggregate_fn, .. } => *aggregate_fn,
        }
    }

    fn stride_and_min(&self) -> (Option<f64>, f64) {
        match self {
            AggregationRequest::ValueCounts { .. } => (None, 0.0),
            AggregationRequest::Binned { stride, min, .. } => (*stride, *min),
        }
    }

    /// Key a raw value of [`Self::dimension`] is aggregated under
    pub fn bin_key(&self, value: f64) -> f64 {
        let (stride, min) = self.stride_and_min();
        binning::bin_key(value, stride, min)
    }

    /// Data value a key stands for
    pub fn bin_value(&self, key: f64) -> f64 {
        let (stride, min) = self.stride_and_min();
        binning::bin_value(key, stride, min)
    }
}

/// Raw aggregation outcome before labels and merging are applied
#[derive(Clone, Debug, PartialEq)]
pub struct Aggregated {
    pub bins: BinSet,
    /// Category count resolved by an exact-value histogram
    pub resolved_bin_count: Option<usize>,
}

// ============================================================================
// Executor trait
// ============================================================================

/// Backend computing per-bin aggregates over the currently filtered rows
pub trait AggregationExecutor {
    /// One `(value, count)` pair per distinct value of `dimension`
    fn value_counts(&self, dimension: &str) -> Result<ValueCounts, ExecutorError>;

    /// Aggregate by bin index; keys must be unique and ascending
    fn binned_aggregate(
        &self,
        dimension: &str,
        aggregate_dimension: Option<&str>,
        aggregate_fn: AggregateFn,
        stride: Option<f64>,
        min: f64,
        bin_count: Option<usize>,
    ) -> Result<BinSet, ExecutorError>;

    /// Run whichever call `request` describes
    fn execute(&self, request: &AggregationRequest) -> Result<Aggregated, ExecutorError> {
        match request {
            AggregationRequest::ValueCounts { dimension } => {
                let counts = self.value_counts(dimension)?;
                Ok(Aggregated {
                    bins: counts.bins,
                    resolved_bin_count: Some(counts.resolved_bin_count),
                })
            }
            AggregationRequest::Binned {
                dimension,
                aggregate_dimension,
                aggregate_fn,
                stride,
                min,
                bin_count,
            } => {
                let bins = self.binned_aggregate(
                    dimension,
                    aggregate_dimension.as_deref(),
                    *aggregate_fn,
                    *stride,
                    *min,
                    *bin_count,
                )?;
                Ok(Aggregated {
                    bins,
                    resolved_bin_count: None,
                })
            }
        }
    }
}

// ============================================================================
// Filter executor
// ============================================================================

/// Dataset that can be filtered by a predicate table before aggregation
pub trait FilterExecutor {
    /// Observed statistics of a column
    fn dimension(&self, name: &str) -> Result<Dimension, CrossfilterError>;

    /// Executor over the rows passing every predicate except `exclude`'s
    fn filtered<'a>(
        &'a self,
        predicates: &PredicateTable,
        exclude: Option<&ChartId>,
    ) -> Result<Box<dyn AggregationExecutor + 'a>, ExecutorError>;
}

impl<T: FilterExecutor + ?Sized> FilterExecutor for Arc<T> {
    fn dimension(&self, name: &str) -> Result<Dimension, CrossfilterError> {
        (**self).dimension(name)
    }

    fn filtered<'a>(
        &'a self,
        predicates: &PredicateTable,
        exclude: Option<&ChartId>,
    ) -> Result<Box<dyn AggregationExecutor + 'a>, ExecutorError> {
        (**self).filtered(predicates, exclude)
    }
}
