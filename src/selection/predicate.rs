//! Range predicates and the table shared across charts.
//!
//! Each chart with a partial selection contributes one `low<=dimension<=high`
//! predicate. The filter executor combines all entries with a logical AND.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::CrossfilterError;
use crate::state::{format_number, round_decimals, ChartId, Selection, StrideType, LABEL_PRECISION};

static PREDICATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?<low>[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)\s*<=\s*(?<dim>[^<=\s](?:[^<=]*[^<=\s])?)\s*<=\s*(?<high>[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)\s*$",
    )
    .expect("Invalid regex pattern")
});

/// Inclusive range filter on one dimension
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Predicate {
    pub dimension: String,
    pub low: f64,
    pub high: f64,
}

impl Predicate {
    /// Build the predicate for a selection
    ///
    /// Bounds are rounded to four decimals, then cast to the stride type, so
    /// integer charts filter on whole numbers.
    pub fn from_selection(dimension: &str, selection: Selection, stride_type: StrideType) -> Self {
        let cast = |v: f64| stride_type.cast(round_decimals(v, LABEL_PRECISION));
        Self {
            dimension: dimension.to_string(),
            low: cast(selection.low),
            high: cast(selection.high),
        }
    }

    #[inline]
    pub fn matches(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}<={}<={}",
            format_number(self.low),
            self.dimension,
            format_number(self.high)
        )
    }
}

/// Parses the `low<=dimension<=high` form written by `Display`
///
/// Dimension names may contain inner spaces. Names containing `<` or `=`, or
/// starting or ending with whitespace, do not parse back.
impl FromStr for Predicate {
    type Err = CrossfilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = PREDICATE_REGEX
            .captures(s)
            .ok_or_else(|| CrossfilterError::InvalidPredicate(s.to_string()))?;
        let bound = |name: &str| {
            caps[name]
                .parse::<f64>()
                .map_err(|_| CrossfilterError::InvalidPredicate(s.to_string()))
        };
        Ok(Self {
            low: bound("low")?,
            high: bound("high")?,
            dimension: caps["dim"].to_string(),
        })
    }
}

/// Change a chart makes to its own predicate entry
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum PredicateMutation {
    Set(Predicate),
    /// The selection covers the full range
    Remove,
}

/// Chart id to predicate, shared by all charts of a dashboard
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PredicateTable {
    entries: BTreeMap<ChartId, Predicate>,
}

impl PredicateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, chart: &ChartId) -> Option<&Predicate> {
        self.entries.get(chart)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply `writer`'s mutation to its own entry
    pub fn apply(&mut self, writer: &ChartId, mutation: PredicateMutation) {
        match mutation {
            PredicateMutation::Set(predicate) => {
                self.entries.insert(writer.clone(), predicate);
            }
            PredicateMutation::Remove => {
                self.entries.remove(writer);
            }
        }
    }

    /// Predicates to AND together, skipping `exclude` (usually the active view)
    pub fn active<'a>(
        &'a self,
        exclude: Option<&'a ChartId>,
    ) -> impl Iterator<Item = &'a Predicate> + 'a {
        self.entries
            .iter()
            .filter(move |(chart, _)| Some(*chart) != exclude)
            .map(|(_, predicate)| predicate)
    }

    /// Combined query string, e.g. `12<=age<=48 and 0<=flag<=0`
    pub fn combined_query(&self, exclude: Option<&ChartId>) -> String {
        self.active(exclude)
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(" and ")
    }

    /// Raw predicate strings keyed by chart, for external filter executors
    pub fn to_query_strings(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|(chart, predicate)| (chart.to_string(), predicate.to_string()))
            .collect()
    }
}
