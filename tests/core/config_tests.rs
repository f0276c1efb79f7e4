//! Tests for chart configuration
//!
//! Tests cover:
//! - JSON parsing and defaults
//! - Unknown keys and rendering options
//! - Stride type validation

use barfilter::config::{ChartConfig, RenderOptions};
use barfilter::state::{AggregateFn, StrideType};
use barfilter::CrossfilterError;

// ============================================
// Parsing Tests
// ============================================

#[test]
fn test_minimal_json() {
    let config = ChartConfig::from_json(r#"{"x":"age"}"#).unwrap();
    assert_eq!(config.x, "age");
    assert_eq!(config.step_size_type, StrideType::Integer);
    assert_eq!(config.aggregate_fn, AggregateFn::Count);
    assert!(config.add_interaction);
    assert_eq!(config.render, RenderOptions::default());
}

#[test]
fn test_full_json() {
    let json = r#"{
        "name": "scores",
        "x": "score",
        "y": "income",
        "data_points": 20,
        "step_size_type": "float",
        "aggregate_fn": "mean",
        "add_interaction": false,
        "x_label_map": {"0": "low"},
        "render": {"width": 800, "title": "Scores", "bar_width": 0.8}
    }"#;
    let config = ChartConfig::from_json(json).unwrap();
    assert_eq!(config.chart_id().as_str(), "scores");
    assert_eq!(config.y.as_deref(), Some("income"));
    assert_eq!(config.step_size_type, StrideType::Float);
    assert_eq!(config.aggregate_fn, AggregateFn::Mean);
    assert!(!config.add_interaction);
    assert_eq!(config.render.width, 800);
    assert_eq!(config.title(), "Scores");

    let request = config.binning_request();
    assert_eq!(request.bin_count, Some(20));
    assert_eq!(request.label_map.unwrap()["0"], "low");
}

#[test]
fn test_generated_ids_are_unique() {
    let config = ChartConfig::new("age");
    assert_ne!(config.chart_id(), config.chart_id());
}

// ============================================
// Error Tests
// ============================================

#[test]
fn test_unknown_top_level_key() {
    let err = ChartConfig::from_json(r#"{"x":"age","colour":"red"}"#).unwrap_err();
    assert!(matches!(err, CrossfilterError::InvalidConfig(_)));
}

#[test]
fn test_unknown_render_option() {
    let err = ChartConfig::from_json(r#"{"x":"age","render":{"line_dash":"dotted"}}"#).unwrap_err();
    assert!(matches!(err, CrossfilterError::UnknownOption(key) if key == "line_dash"));
}

#[test]
fn test_non_numeric_stride_type() {
    let err = ChartConfig::from_json(r#"{"x":"age","step_size_type":"str"}"#).unwrap_err();
    assert!(matches!(err, CrossfilterError::InvalidBinningRequest(_)));
}

#[test]
fn test_unknown_aggregate_fn() {
    let err = ChartConfig::from_json(r#"{"x":"age","aggregate_fn":"median"}"#).unwrap_err();
    assert!(matches!(err, CrossfilterError::InvalidConfig(_)));
}
