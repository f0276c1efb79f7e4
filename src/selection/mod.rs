//! Range selection protocol.
//!
//! The [`SelectionController`] owns every chart's current selection and the
//! single active view. Range and reset commands are turned into a list of
//! [`Effect`]s for a dispatcher to execute, in order:
//!
//! 1. On the first event for a chart that is not the active view: emphasis
//!    handoff, the new active view, one datatile rebuild.
//! 2. A range-scoped datatile query for live feedback.
//! 3. The chart's own predicate update.

pub mod predicate;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CrossfilterError, Result};
use crate::state::{BinningSpec, ChartId, Emphasis, Selection, StrideType};
use predicate::{Predicate, PredicateMutation};

/// Commands emitted by the rendering collaborator's range widgets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ChartCommand {
    /// The selected range of a chart changed
    RangeChange { chart: ChartId, low: f64, high: f64 },

    /// The chart's reset button was pressed
    Reset { chart: ChartId },
}

impl ChartCommand {
    pub fn chart(&self) -> &ChartId {
        match self {
            ChartCommand::RangeChange { chart, .. } => chart,
            ChartCommand::Reset { chart } => chart,
        }
    }
}

/// Work requested by a command, executed by a dispatcher
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum Effect {
    /// Change a chart's bar color to reflect whether it drives the datatile
    SetEmphasis { chart: ChartId, emphasis: Emphasis },

    /// Make `chart` the dashboard's active view
    SetActiveView { chart: ChartId },

    /// Rebuild the datatile for the active view (expensive)
    RebuildCache,

    /// Read the datatile for `range` of the active view (cheap)
    QueryCacheByRange { chart: ChartId, range: Selection },

    /// Write `chart`'s own predicate entry
    UpdatePredicate {
        chart: ChartId,
        mutation: PredicateMutation,
    },
}

/// Whether a chart currently drives the datatile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ViewState {
    #[default]
    Idle,
    Active,
}

/// Emphasis a chart shows after its datatile state changes
///
/// Non-interactive charts have no range selector and keep their styling.
pub fn datatile_transition(interactive: bool, loaded: bool) -> Option<Emphasis> {
    if !interactive {
        return None;
    }
    Some(if loaded {
        Emphasis::Active
    } else {
        Emphasis::Inactive
    })
}

/// Predicate mutation for a chart's selection
pub fn compute_query_dict(
    dimension: &str,
    selection: Selection,
    min: f64,
    max: f64,
    stride_type: StrideType,
) -> PredicateMutation {
    if selection.is_full(min, max) {
        PredicateMutation::Remove
    } else {
        PredicateMutation::Set(Predicate::from_selection(dimension, selection, stride_type))
    }
}

/// Selection state of one registered chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSelection {
    pub dimension: String,
    pub min: f64,
    pub max: f64,
    pub stride_type: StrideType,
    pub interactive: bool,
    pub selection: Selection,
    pub state: ViewState,
}

impl ChartSelection {
    pub fn new(dimension: impl Into<String>, spec: &BinningSpec, interactive: bool) -> Self {
        Self {
            dimension: dimension.into(),
            min: spec.min,
            max: spec.max,
            stride_type: spec.stride_type,
            interactive,
            selection: Selection::full(spec.min, spec.max),
            state: ViewState::Idle,
        }
    }

    pub fn query_mutation(&self) -> PredicateMutation {
        compute_query_dict(
            &self.dimension,
            self.selection,
            self.min,
            self.max,
            self.stride_type,
        )
    }
}

#[derive(Debug, Default)]
pub struct SelectionController {
    charts: BTreeMap<ChartId, ChartSelection>,
    active_view: Option<ChartId>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, chart: ChartId, selection: ChartSelection) {
        self.charts.insert(chart, selection);
    }

    pub fn active_view(&self) -> Option<&ChartId> {
        self.active_view.as_ref()
    }

    pub fn get(&self, chart: &ChartId) -> Option<&ChartSelection> {
        self.charts.get(chart)
    }

    pub fn selection(&self, chart: &ChartId) -> Option<Selection> {
        self.charts.get(chart).map(|c| c.selection)
    }

    pub fn handle(&mut self, command: ChartCommand) -> Result<Vec<Effect>> {
        match command {
            ChartCommand::RangeChange { chart, low, high } => {
                self.on_range_change(&chart, Selection::new(low, high))
            }
            ChartCommand::Reset { chart } => self.on_reset(&chart),
        }
    }

    pub fn on_range_change(&mut self, chart: &ChartId, range: Selection) -> Result<Vec<Effect>> {
        let entry = self
            .charts
            .get_mut(chart)
            .ok_or_else(|| CrossfilterError::UnknownChart(chart.clone()))?;
        if !entry.interactive {
            return Err(CrossfilterError::NotInteractive(chart.clone()));
        }
        let range = range.clamped(entry.min, entry.max);
        entry.selection = range;

        let mut effects = Vec::new();
        if self.active_view.as_ref() != Some(chart) {
            effects.extend(self.hand_off(chart));
        }
        effects.push(Effect::QueryCacheByRange {
            chart: chart.clone(),
            range,
        });
        effects.push(Effect::UpdatePredicate {
            chart: chart.clone(),
            mutation: self.compute_query_dict(chart)?,
        });
        Ok(effects)
    }

    pub fn on_reset(&mut self, chart: &ChartId) -> Result<Vec<Effect>> {
        let entry = self
            .charts
            .get_mut(chart)
            .ok_or_else(|| CrossfilterError::UnknownChart(chart.clone()))?;
        let full = Selection::full(entry.min, entry.max);
        entry.selection = full;
        self.on_range_change(chart, full)
    }

    /// Predicate mutation for `chart`'s current selection
    pub fn compute_query_dict(&self, chart: &ChartId) -> Result<PredicateMutation> {
        self.charts
            .get(chart)
            .map(ChartSelection::query_mutation)
            .ok_or_else(|| CrossfilterError::UnknownChart(chart.clone()))
    }

    /// Forget a handoff to `chart` whose datatile was never built
    ///
    /// The next event on `chart` hands off again and re-emits `RebuildCache`.
    /// Returns false when `chart` is not the active view.
    pub fn release_active_view(&mut self, chart: &ChartId) -> bool {
        if self.active_view.as_ref() != Some(chart) {
            return false;
        }
        self.active_view = None;
        if let Some(entry) = self.charts.get_mut(chart) {
            entry.state = ViewState::Idle;
        }
        true
    }

    fn hand_off(&mut self, chart: &ChartId) -> Vec<Effect> {
        let mut effects = Vec::new();

        if let Some(previous) = self.active_view.take() {
            if let Some(entry) = self.charts.get_mut(&previous) {
                entry.state = ViewState::Idle;
                if let Some(emphasis) = datatile_transition(entry.interactive, false) {
                    effects.push(Effect::SetEmphasis {
                        chart: previous.clone(),
                        emphasis,
                    });
                }
            }
        }

        let interactive = match self.charts.get_mut(chart) {
            Some(entry) => {
                entry.state = ViewState::Active;
                entry.interactive
            }
            None => false,
        };
        self.active_view = Some(chart.clone());

        tracing::debug!("Active view handed off to {}", chart);
        effects.push(Effect::SetActiveView {
            chart: chart.clone(),
        });
        if let Some(emphasis) = datatile_transition(interactive, true) {
            effects.push(Effect::SetEmphasis {
                chart: chart.clone(),
                emphasis,
            });
        }
        effects.push(Effect::RebuildCache);
        effects
    }
}
