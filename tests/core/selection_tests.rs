//! Tests for predicates and the selection controller
//!
//! Tests cover:
//! - Predicate construction and parsing
//! - Active view handoff and rebuild counts
//! - Reset and full-range selections
//! - Command serialization

use barfilter::selection::predicate::{Predicate, PredicateMutation, PredicateTable};
use barfilter::selection::{
    compute_query_dict, ChartCommand, ChartSelection, Effect, SelectionController, ViewState,
};
use barfilter::state::{BinningSpec, ChartId, Emphasis, Selection, StrideType};
use barfilter::CrossfilterError;

fn spec(min: f64, max: f64, stride_type: StrideType) -> BinningSpec {
    BinningSpec {
        stride: Some(1.0),
        stride_type,
        custom_binning: true,
        bin_count: None,
        min,
        max,
    }
}

fn controller() -> SelectionController {
    let mut controller = SelectionController::new();
    controller.register(
        ChartId::from("age"),
        ChartSelection::new("age", &spec(0.0, 100.0, StrideType::Integer), true),
    );
    controller.register(
        ChartId::from("score"),
        ChartSelection::new("score", &spec(0.0, 1.0, StrideType::Float), true),
    );
    controller
}

fn count_rebuilds(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::RebuildCache))
        .count()
}

fn range(chart: &str, low: f64, high: f64) -> ChartCommand {
    ChartCommand::RangeChange {
        chart: ChartId::from(chart),
        low,
        high,
    }
}

// ============================================
// Predicate Tests
// ============================================

#[test]
fn test_query_dict_integer_bounds() {
    let mutation = compute_query_dict(
        "age",
        Selection::new(12.4, 47.9),
        0.0,
        100.0,
        StrideType::Integer,
    );
    match mutation {
        PredicateMutation::Set(p) => assert_eq!(p.to_string(), "12<=age<=48"),
        PredicateMutation::Remove => panic!("expected a predicate"),
    }
}

#[test]
fn test_query_dict_full_range_removes() {
    let mutation = compute_query_dict(
        "age",
        Selection::full(0.0, 100.0),
        0.0,
        100.0,
        StrideType::Integer,
    );
    assert_eq!(mutation, PredicateMutation::Remove);
}

#[test]
fn test_predicate_rejects_garbage() {
    for input in ["", "age", "1 < age < 2", "a<=age<=2"] {
        assert!(
            input.parse::<Predicate>().is_err(),
            "'{}' should not parse",
            input
        );
    }
}

#[test]
fn test_predicate_table_query_strings() {
    let mut table = PredicateTable::new();
    table.apply(
        &ChartId::from("age"),
        PredicateMutation::Set("20<=age<=30".parse().unwrap()),
    );
    let strings = table.to_query_strings();
    assert_eq!(strings["age"], "20<=age<=30");
    assert!(table.get(&ChartId::from("score")).is_none());
}

// ============================================
// Handoff Tests
// ============================================

#[test]
fn test_handoff_rebuilds_once() {
    let mut c = controller();
    let first = c.handle(range("age", 10.0, 20.0)).unwrap();
    assert_eq!(count_rebuilds(&first), 1);

    for high in [25.0, 30.0, 35.0] {
        let effects = c.handle(range("age", 10.0, high)).unwrap();
        assert_eq!(count_rebuilds(&effects), 0);
    }

    let handoff = c.handle(range("score", 0.2, 0.4)).unwrap();
    assert_eq!(count_rebuilds(&handoff), 1);
    assert_eq!(c.active_view(), Some(&ChartId::from("score")));
    assert_eq!(c.get(&ChartId::from("age")).unwrap().state, ViewState::Idle);
    assert_eq!(c.get(&ChartId::from("score")).unwrap().state, ViewState::Active);
}

#[test]
fn test_handoff_effect_order() {
    let mut c = controller();
    c.handle(range("age", 10.0, 20.0)).unwrap();
    let effects = c.handle(range("score", 0.2, 0.4)).unwrap();

    let age = ChartId::from("age");
    let score = ChartId::from("score");
    assert_eq!(
        effects[..4],
        [
            Effect::SetEmphasis {
                chart: age,
                emphasis: Emphasis::Inactive
            },
            Effect::SetActiveView {
                chart: score.clone()
            },
            Effect::SetEmphasis {
                chart: score.clone(),
                emphasis: Emphasis::Active
            },
            Effect::RebuildCache,
        ]
    );
    assert!(matches!(&effects[4], Effect::QueryCacheByRange { chart, .. } if *chart == score));
    assert!(matches!(&effects[5], Effect::UpdatePredicate { chart, .. } if *chart == score));
}

#[test]
fn test_predicate_only_for_own_chart() {
    let mut c = controller();
    c.handle(range("age", 10.0, 20.0)).unwrap();
    let effects = c.handle(range("score", 0.2, 0.4)).unwrap();
    for effect in effects {
        if let Effect::UpdatePredicate { chart, .. } = effect {
            assert_eq!(chart, ChartId::from("score"));
        }
    }
}

#[test]
fn test_reset_emits_remove() {
    let mut c = controller();
    c.handle(range("score", 0.2, 0.4)).unwrap();
    let effects = c
        .handle(ChartCommand::Reset {
            chart: ChartId::from("score"),
        })
        .unwrap();
    assert_eq!(count_rebuilds(&effects), 0);
    assert!(matches!(
        effects.last(),
        Some(Effect::UpdatePredicate {
            mutation: PredicateMutation::Remove,
            ..
        })
    ));
    assert_eq!(
        c.selection(&ChartId::from("score")),
        Some(Selection::new(0.0, 1.0))
    );
}

#[test]
fn test_unknown_chart() {
    let mut c = controller();
    assert!(matches!(
        c.handle(range("nope", 0.0, 1.0)),
        Err(CrossfilterError::UnknownChart(_))
    ));
}

// ============================================
// Serialization Tests
// ============================================

#[test]
fn test_effects_serialize_tagged() {
    let mut c = controller();
    let effects = c.handle(range("age", 10.0, 20.0)).unwrap();
    let json = serde_json::to_string(&effects).unwrap();
    assert!(json.contains(r#""type":"RebuildCache""#));
    assert!(json.contains(r#""type":"QueryCacheByRange""#));
}

#[test]
fn test_reset_command_round_trip() {
    let command = ChartCommand::Reset {
        chart: ChartId::from("age"),
    };
    let json = serde_json::to_string(&command).unwrap();
    assert_eq!(json, r#"{"type":"Reset","payload":{"chart":"age"}}"#);
    let back: ChartCommand = serde_json::from_str(&json).unwrap();
    assert_eq!(back, command);
}
