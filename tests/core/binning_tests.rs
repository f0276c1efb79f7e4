//! Tests for the binning planner, label mapper and bin set merger
//!
//! Tests cover:
//! - Stride resolution from data points and explicit step sizes
//! - Boolean dimensions
//! - Planner errors
//! - Label maps for fixed-stride bins
//! - Patch merging

use barfilter::binning::planner::boolean_labels;
use barfilter::binning::{label_map, merge_patch, plan_binning, BinningRequest};
use barfilter::state::{BinSet, Dimension, DimensionKind, StrideType};
use barfilter::CrossfilterError;

fn numeric(min: f64, max: f64) -> Dimension {
    Dimension::new("v", DimensionKind::Numeric, min, max)
}

fn bins(keys: &[f64], values: &[f64]) -> BinSet {
    BinSet::new(keys.to_vec(), values.to_vec()).unwrap()
}

// ============================================
// Planner Tests
// ============================================

#[test]
fn test_data_points_resolve_integer_stride() {
    let request = BinningRequest {
        bin_count: Some(10),
        ..Default::default()
    };
    let plan = plan_binning(&numeric(0.0, 100.0), &request).unwrap();
    assert_eq!(plan.spec.stride, Some(10.0));
    assert_eq!(plan.spec.bin_count, Some(11));
    assert!(plan.spec.custom_binning);
}

#[test]
fn test_float_stride_keeps_fraction() {
    let request = BinningRequest {
        bin_count: Some(4),
        stride_type: StrideType::Float,
        ..Default::default()
    };
    let plan = plan_binning(&numeric(0.0, 10.0), &request).unwrap();
    assert_eq!(plan.spec.stride, Some(2.5));
    assert_eq!(plan.spec.bin_count, Some(5));
}

#[test]
fn test_no_granularity_is_exact_value_histogram() {
    let plan = plan_binning(&numeric(3.0, 9.0), &BinningRequest::default()).unwrap();
    assert!(!plan.spec.custom_binning);
    assert_eq!(plan.spec.stride, None);
    assert_eq!(plan.spec.bin_count, None);
    assert_eq!(plan.labels, None);
}

#[test]
fn test_planner_is_idempotent() {
    let request = BinningRequest {
        stride: Some(0.25),
        stride_type: StrideType::Float,
        ..Default::default()
    };
    let dim = numeric(-1.0, 1.0);
    assert_eq!(
        plan_binning(&dim, &request).unwrap(),
        plan_binning(&dim, &request).unwrap()
    );
}

#[test]
fn test_sub_unit_range_promotes_to_float() {
    let request = BinningRequest {
        stride: Some(0.1),
        ..Default::default()
    };
    let plan = plan_binning(&numeric(0.0, 0.5), &request).unwrap();
    assert_eq!(plan.spec.stride_type, StrideType::Float);
    assert_eq!(plan.spec.bin_count, Some(6));
}

#[test]
fn test_boolean_dimension() {
    let dim = Dimension::new("member", DimensionKind::Boolean, 0.0, 1.0);
    let plan = plan_binning(&dim, &BinningRequest::default()).unwrap();
    assert_eq!(plan.spec.min, 0.0);
    assert_eq!(plan.spec.max, 1.0);
    assert_eq!(plan.spec.bin_count, Some(2));
    assert_eq!(plan.labels.unwrap(), boolean_labels());
}

// ============================================
// Planner Error Tests
// ============================================

#[test]
fn test_inverted_bounds_rejected() {
    let err = plan_binning(&numeric(5.0, 1.0), &BinningRequest::default()).unwrap_err();
    assert!(matches!(err, CrossfilterError::InvalidDimension { .. }));
}

#[test]
fn test_zero_data_points_rejected() {
    let request = BinningRequest {
        bin_count: Some(0),
        ..Default::default()
    };
    let err = plan_binning(&numeric(0.0, 10.0), &request).unwrap_err();
    assert!(matches!(err, CrossfilterError::InvalidBinningRequest(_)));
}

#[test]
fn test_integer_stride_rounding_to_zero_rejected() {
    // range 3 over 10 data points rounds the integer stride to 0
    let request = BinningRequest {
        bin_count: Some(10),
        ..Default::default()
    };
    let err = plan_binning(&numeric(1.0, 4.0), &request).unwrap_err();
    assert!(matches!(err, CrossfilterError::InvalidBinningRequest(_)));
}

#[test]
fn test_negative_stride_rejected() {
    let request = BinningRequest {
        stride: Some(-1.0),
        ..Default::default()
    };
    assert!(plan_binning(&numeric(0.0, 10.0), &request).is_err());
}

#[test]
fn test_huge_integer_bounds_rejected() {
    let request = BinningRequest {
        stride: Some(1e15),
        ..Default::default()
    };
    let err = plan_binning(&numeric(0.0, 1e17), &request).unwrap_err();
    assert!(matches!(err, CrossfilterError::InvalidBinningRequest(_)));
}

// ============================================
// Label Tests
// ============================================

#[test]
fn test_labels_follow_plan() {
    let request = BinningRequest {
        stride: Some(0.5),
        stride_type: StrideType::Float,
        ..Default::default()
    };
    let plan = plan_binning(&numeric(0.0, 2.0), &request).unwrap();
    let labels = label_map(&plan.spec, &[0.0, 1.0, 2.0, 3.0, 4.0]).unwrap();
    assert_eq!(labels.len(), 5);
    assert_eq!(labels["3"], "1.5");
    assert_eq!(labels["4"], "2");
}

#[test]
fn test_negative_minimum_labels() {
    let request = BinningRequest {
        stride: Some(0.1),
        stride_type: StrideType::Float,
        ..Default::default()
    };
    let plan = plan_binning(&numeric(-0.3, 0.3), &request).unwrap();
    let labels = label_map(&plan.spec, &[0.0, 3.0, 6.0]).unwrap();
    assert_eq!(labels["0"], "-0.3");
    assert_eq!(labels["3"], "0");
    assert_eq!(labels["6"], "0.3");
}

#[test]
fn test_no_labels_without_custom_binning() {
    let plan = plan_binning(&numeric(0.0, 2.0), &BinningRequest::default()).unwrap();
    assert!(label_map(&plan.spec, &[0.0, 1.0]).is_none());
}

// ============================================
// Merge Tests
// ============================================

#[test]
fn test_patch_zero_fills_missing_bins() {
    let previous = bins(&[0.0, 1.0, 2.0, 3.0, 4.0], &[1.0, 2.0, 3.0, 4.0, 5.0]);
    let merged = merge_patch(&previous, bins(&[1.0, 3.0], &[7.0, 9.0]), true);
    assert_eq!(merged.keys(), previous.keys());
    assert_eq!(merged.values(), &[0.0, 7.0, 0.0, 9.0, 0.0]);
}

#[test]
fn test_full_update_replaces() {
    let previous = bins(&[0.0, 1.0, 2.0], &[1.0, 2.0, 3.0]);
    let merged = merge_patch(&previous, bins(&[1.0], &[7.0]), false);
    assert_eq!(merged.keys(), &[1.0]);
}

#[test]
fn test_empty_patch_keeps_domain() {
    let previous = bins(&[0.0, 1.0], &[4.0, 4.0]);
    let merged = merge_patch(&previous, BinSet::empty(), true);
    assert_eq!(merged.keys(), &[0.0, 1.0]);
    assert_eq!(merged.values(), &[0.0, 0.0]);
}
