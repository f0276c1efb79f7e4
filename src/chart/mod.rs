//! Bar chart state.
//!
//! A [`BarChart`] owns one chart's data path: the binning plan computed at
//! initialization, the bins currently displayed, the label map, the datatile
//! emphasis and the aggregation gate.

pub mod gate;

pub use gate::{Admission, AggregationGate, AggregationTicket, Verdict};

use serde::Serialize;

use crate::binning::planner::resolve_execution;
use crate::binning::{merge_patch, plan_binning, resolve_labels, BinningPlan};
use crate::config::ChartConfig;
use crate::error::{CrossfilterError, Result};
use crate::executor::{Aggregated, AggregationExecutor, AggregationRequest, ExecutorError};
use crate::state::{
    AggregateFn, BinSet, BinningSpec, ChartId, Dimension, Emphasis, LabelMap, Selection,
    PERFORMANCE_ADVISORY_THRESHOLD,
};

/// What the rendering collaborator receives for one chart
#[derive(Clone, Debug, Serialize)]
pub struct ChartView<'a> {
    pub id: &'a ChartId,
    pub title: &'a str,
    pub bins: &'a BinSet,
    pub labels: Option<&'a LabelMap>,
    pub emphasis: Option<Emphasis>,
    /// Step of the range selector, for interactive charts
    pub step: Option<f64>,
}

pub struct BarChart {
    id: ChartId,
    config: ChartConfig,
    plan: Option<BinningPlan>,
    /// Plan spec with the executor-resolved bin count folded in
    spec: Option<BinningSpec>,
    bins: BinSet,
    labels: Option<LabelMap>,
    emphasis: Option<Emphasis>,
    gate: AggregationGate,
    advisory_threshold: usize,
    /// Whether the last full aggregation exceeded the advisory threshold
    advisory: bool,
}

impl BarChart {
    pub fn new(config: ChartConfig) -> Self {
        Self {
            id: config.chart_id(),
            config,
            plan: None,
            spec: None,
            bins: BinSet::empty(),
            labels: None,
            emphasis: None,
            gate: AggregationGate::default(),
            advisory_threshold: PERFORMANCE_ADVISORY_THRESHOLD,
            advisory: false,
        }
    }

    pub fn with_advisory_threshold(mut self, threshold: usize) -> Self {
        self.advisory_threshold = threshold;
        self
    }

    pub fn id(&self) -> &ChartId {
        &self.id
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn spec(&self) -> Option<&BinningSpec> {
        self.spec.as_ref()
    }

    pub fn bins(&self) -> &BinSet {
        &self.bins
    }

    pub fn labels(&self) -> Option<&LabelMap> {
        self.labels.as_ref()
    }

    pub fn emphasis(&self) -> Option<Emphasis> {
        self.emphasis
    }

    pub fn set_emphasis(&mut self, emphasis: Option<Emphasis>) {
        self.emphasis = emphasis;
    }

    pub fn is_interactive(&self) -> bool {
        self.config.add_interaction
    }

    /// True when the chart has more bars than the performance advisory allows
    pub fn has_performance_advisory(&self) -> bool {
        self.advisory
    }

    pub fn is_aggregating(&self) -> bool {
        self.gate.is_in_flight()
    }

    pub fn view(&self) -> ChartView<'_> {
        ChartView {
            id: &self.id,
            title: self.config.title(),
            bins: &self.bins,
            labels: self.labels.as_ref(),
            emphasis: self.emphasis,
            step: self
                .spec
                .as_ref()
                .filter(|_| self.config.add_interaction)
                .and_then(BinningSpec::slider_step),
        }
    }

    fn require_spec(&self) -> Result<&BinningSpec> {
        self.spec
            .as_ref()
            .ok_or_else(|| CrossfilterError::NotInitialized(self.id.clone()))
    }

    /// Plan binning for `dimension` and run the first full aggregation
    pub fn initialize(
        &mut self,
        dimension: &Dimension,
        executor: &dyn AggregationExecutor,
    ) -> Result<()> {
        let plan = plan_binning(dimension, &self.config.binning_request())?;
        if let Some(y) = self.config.y.as_deref().filter(|y| *y != self.config.x) {
            if self.config.aggregate_fn != AggregateFn::Mean {
                tracing::warn!(
                    "Chart {} aggregates '{}' with mean instead of {}",
                    self.id,
                    y,
                    self.config.aggregate_fn
                );
            }
        }
        self.spec = Some(plan.spec.clone());
        self.labels = plan.labels.clone();
        self.plan = Some(plan);
        self.bins = BinSet::empty();

        self.recompute(executor, false, None)?;

        tracing::info!(
            "Initialized chart {} over '{}' ({} bars, custom binning: {})",
            self.id,
            self.config.x,
            self.bins.len(),
            self.spec.as_ref().is_some_and(|s| s.custom_binning)
        );
        Ok(())
    }

    /// The executor call this chart needs
    pub fn aggregation_request(&self) -> Result<AggregationRequest> {
        let spec = self.require_spec()?;
        Ok(AggregationRequest::for_chart(
            &self.config.x,
            self.config.y.as_deref(),
            spec,
        ))
    }

    /// Ask the gate for permission to aggregate
    pub fn begin_aggregation(&mut self, trigger: Option<Selection>) -> Admission {
        self.gate.begin(trigger)
    }

    /// Issue the request deferred while an earlier one was in flight
    pub fn resume_deferred(&mut self) -> Option<AggregationTicket> {
        self.gate.take_pending()
    }

    /// Land the result of an issued aggregation
    ///
    /// The in-flight flag is cleared whatever the outcome. Results of
    /// superseded requests are dropped without touching the displayed bins.
    pub fn finish_aggregation(
        &mut self,
        ticket: &AggregationTicket,
        result: Result<Aggregated, ExecutorError>,
        patch: bool,
    ) -> Result<Verdict> {
        let verdict = self.gate.complete(ticket);
        let aggregated = result?;

        match verdict {
            Verdict::Apply => self.apply(aggregated, patch)?,
            Verdict::Discard => tracing::debug!(
                "Discarding superseded aggregation {} for chart {}",
                ticket.generation,
                self.id
            ),
        }
        Ok(verdict)
    }

    /// Aggregate synchronously through `executor`, draining deferred requests
    pub fn recompute(
        &mut self,
        executor: &dyn AggregationExecutor,
        patch: bool,
        trigger: Option<Selection>,
    ) -> Result<Verdict> {
        let request = self.aggregation_request()?;
        let mut ticket = match self.begin_aggregation(trigger) {
            Admission::Issued(ticket) => ticket,
            Admission::Deferred => return Ok(Verdict::Discard),
        };
        loop {
            let result = executor.execute(&request);
            let verdict = self.finish_aggregation(&ticket, result, patch)?;
            match self.resume_deferred() {
                Some(next) => ticket = next,
                None => return Ok(verdict),
            }
        }
    }

    /// Patch the displayed bins with a result computed elsewhere (datatile query)
    pub fn apply_patch(&mut self, bins: BinSet) {
        self.bins = merge_patch(&self.bins, bins, true);
    }

    fn apply(&mut self, aggregated: Aggregated, patch: bool) -> Result<()> {
        if !patch {
            let plan = self
                .plan
                .as_ref()
                .ok_or_else(|| CrossfilterError::NotInitialized(self.id.clone()))?;
            let (spec, advisory) = resolve_execution(
                &self.config.x,
                &plan.spec,
                &aggregated,
                self.advisory_threshold,
            );
            self.labels = resolve_labels(plan, &spec, aggregated.bins.keys());
            self.spec = Some(spec);
            self.advisory = advisory;
        }
        self.bins = merge_patch(&self.bins, aggregated.bins, patch);
        Ok(())
    }
}
