//! Crossfilter session.
//!
//! Ties the charts, the selection controller, the shared predicate table and
//! the two external collaborators together, and dispatches the effects of
//! every command in order.

use std::collections::BTreeMap;

use crate::chart::{BarChart, ChartView};
use crate::config::ChartConfig;
use crate::dashboard::{CacheGeneration, Dashboard, DashboardError};
use crate::error::{CrossfilterError, Result};
use crate::executor::FilterExecutor;
use crate::selection::predicate::PredicateTable;
use crate::selection::{datatile_transition, ChartCommand, ChartSelection, Effect, SelectionController};
use crate::settings::Settings;
use crate::state::{ChartId, Emphasis};

pub struct Crossfilter<S: FilterExecutor, D: Dashboard> {
    source: S,
    dashboard: D,
    settings: Settings,
    charts: BTreeMap<ChartId, BarChart>,
    /// Charts in the order they were added
    order: Vec<ChartId>,
    controller: SelectionController,
    predicates: PredicateTable,
    /// Last rebuild acknowledged by the dashboard for the current active view
    cache_generation: Option<CacheGeneration>,
}

impl<S: FilterExecutor, D: Dashboard> Crossfilter<S, D> {
    pub fn new(source: S, dashboard: D, settings: Settings) -> Self {
        Self {
            source,
            dashboard,
            settings,
            charts: BTreeMap::new(),
            order: Vec::new(),
            controller: SelectionController::new(),
            predicates: PredicateTable::new(),
            cache_generation: None,
        }
    }

    pub fn add_chart(&mut self, config: ChartConfig) -> Result<ChartId> {
        let chart = BarChart::new(config)
            .with_advisory_threshold(self.settings.performance_advisory_threshold);
        let id = chart.id().clone();
        if self.charts.contains_key(&id) {
            return Err(CrossfilterError::InvalidConfig(format!(
                "duplicate chart id '{}'",
                id
            )));
        }
        self.order.push(id.clone());
        self.charts.insert(id.clone(), chart);
        Ok(id)
    }

    /// Plan, compute and register every chart
    pub fn initialize(&mut self) -> Result<()> {
        let executor = self.source.filtered(&self.predicates, None)?;
        for id in &self.order {
            let Some(chart) = self.charts.get_mut(id) else {
                continue;
            };
            let dimension = self.source.dimension(&chart.config().x)?;
            chart.initialize(&dimension, executor.as_ref())?;

            let interactive = chart.is_interactive();
            chart.set_emphasis(datatile_transition(interactive, false));

            let spec = chart
                .spec()
                .ok_or_else(|| CrossfilterError::NotInitialized(id.clone()))?;
            self.controller.register(
                id.clone(),
                ChartSelection::new(chart.config().x.as_str(), spec, interactive),
            );
            self.dashboard
                .register_chart(id, &chart.aggregation_request()?)?;
        }
        tracing::info!("Initialized {} charts", self.order.len());
        Ok(())
    }

    /// Run a widget command and dispatch its effects in order
    ///
    /// When dispatch fails before the datatile of `origin` was built, the
    /// handoff is released so the next event on `origin` rebuilds again.
    pub fn handle(&mut self, command: ChartCommand) -> Result<Vec<Effect>> {
        let origin = command.chart().clone();
        let effects = self.controller.handle(command)?;
        for effect in &effects {
            if let Err(err) = self.dispatch(&origin, effect) {
                if self.cache_generation.is_none() {
                    self.release_handoff(&origin);
                }
                return Err(err);
            }
        }
        Ok(effects)
    }

    fn release_handoff(&mut self, origin: &ChartId) {
        if !self.controller.release_active_view(origin) {
            return;
        }
        tracing::warn!("Datatile for {} was not built, handoff will be retried", origin);
        if let Some(chart) = self.charts.get_mut(origin) {
            let emphasis = datatile_transition(chart.is_interactive(), false);
            chart.set_emphasis(emphasis);
        }
    }

    /// Execute one effect produced by an event on `origin`
    pub fn dispatch(&mut self, origin: &ChartId, effect: &Effect) -> Result<()> {
        tracing::debug!("Dispatching {:?}", effect);
        match effect {
            Effect::SetEmphasis { chart, emphasis } => {
                self.chart_mut(chart)?.set_emphasis(Some(*emphasis));
            }
            Effect::SetActiveView { chart } => {
                self.dashboard.set_active_view(chart);
                self.cache_generation = None;
                self.refresh_except(chart)?;
            }
            Effect::RebuildCache => {
                let generation = self.dashboard.rebuild_cache(&self.predicates)?;
                self.cache_generation = Some(generation);
            }
            Effect::QueryCacheByRange { chart, range } => {
                let expected = self
                    .cache_generation
                    .ok_or(CrossfilterError::Dashboard(DashboardError::NoCache))?;
                let answer = self.dashboard.query_cache_by_range(*range)?;
                if answer.generation != expected {
                    return Err(CrossfilterError::StaleCache {
                        expected,
                        got: answer.generation,
                    });
                }
                for (id, bins) in answer.bins {
                    if &id == chart {
                        continue;
                    }
                    if let Some(target) = self.charts.get_mut(&id) {
                        target.apply_patch(bins);
                    }
                }
            }
            Effect::UpdatePredicate { chart, mutation } => {
                if chart != origin {
                    return Err(CrossfilterError::CrossChartWrite {
                        writer: origin.clone(),
                        target: chart.clone(),
                    });
                }
                self.predicates.apply(chart, mutation.clone());
            }
        }
        Ok(())
    }

    /// Patch every chart but `active` with a fresh aggregation over the
    /// predicates of the other charts
    fn refresh_except(&mut self, active: &ChartId) -> Result<()> {
        let executor = self.source.filtered(&self.predicates, Some(active))?;
        for (_, chart) in self.charts.iter_mut().filter(|(id, _)| *id != active) {
            chart.recompute(executor.as_ref(), true, None)?;
        }
        Ok(())
    }

    fn chart_mut(&mut self, id: &ChartId) -> Result<&mut BarChart> {
        self.charts
            .get_mut(id)
            .ok_or_else(|| CrossfilterError::UnknownChart(id.clone()))
    }

    pub fn chart(&self, id: &ChartId) -> Option<&BarChart> {
        self.charts.get(id)
    }

    /// Charts in the order they were added
    pub fn charts(&self) -> impl Iterator<Item = &BarChart> {
        self.order.iter().filter_map(|id| self.charts.get(id))
    }

    pub fn views(&self) -> Vec<ChartView<'_>> {
        self.charts().map(BarChart::view).collect()
    }

    pub fn predicates(&self) -> &PredicateTable {
        &self.predicates
    }

    pub fn controller(&self) -> &SelectionController {
        &self.controller
    }

    pub fn dashboard(&self) -> &D {
        &self.dashboard
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn active_view(&self) -> Option<&ChartId> {
        self.controller.active_view()
    }

    /// Bar color the renderer should use for `id`
    ///
    /// Interactive charts follow their datatile emphasis; the others keep
    /// their configured color, if any.
    pub fn bar_color(&self, id: &ChartId) -> Option<&str> {
        let chart = self.charts.get(id)?;
        match chart.emphasis() {
            Some(emphasis) => Some(self.settings.color(emphasis)),
            None => chart.config().render.bar_color.as_deref(),
        }
    }

    /// Interactive charts currently drawn as the active view
    pub fn emphasized(&self) -> Vec<&ChartId> {
        self.charts()
            .filter(|c| c.emphasis() == Some(Emphasis::Active))
            .map(BarChart::id)
            .collect()
    }
}
