//! Dashboard collaborator contract.
//!
//! The dashboard owns the datatile: a pre-aggregated cache built for the
//! active view that answers range queries for every other chart without
//! touching the raw rows. Rebuilding it is expensive; querying it is cheap.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::executor::AggregationRequest;
use crate::selection::predicate::PredicateTable;
use crate::state::{BinSet, ChartId, Selection};

/// Errors reported by the dashboard collaborator
#[derive(Debug, Error)]
pub enum DashboardError {
    /// A rebuild was requested before any chart became active
    #[error("No active view to build the datatile for")]
    NoActiveView,

    /// A range query arrived before the datatile was built
    #[error("Datatile has not been built")]
    NoCache,

    /// The active view is not registered with the dashboard
    #[error("Chart {0} is not registered with the dashboard")]
    UnknownView(ChartId),

    /// The cache backend failed
    #[error("Dashboard backend error: {0}")]
    Backend(String),
}

/// Monotonic id of one datatile build
pub type CacheGeneration = u64;

/// Answer to a range-scoped cache query
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CacheQuery {
    /// Datatile build the answer was read from
    pub generation: CacheGeneration,
    /// Aggregates of every non-active chart under the queried range
    pub bins: BTreeMap<ChartId, BinSet>,
}

pub trait Dashboard {
    /// Make `chart` part of the datatile, aggregated as `request` describes
    fn register_chart(
        &mut self,
        chart: &ChartId,
        request: &AggregationRequest,
    ) -> Result<(), DashboardError>;

    fn active_view(&self) -> Option<ChartId>;

    fn set_active_view(&mut self, chart: &ChartId);

    /// Recompute the datatile for the active view over `predicates`
    ///
    /// Returns once the new cache is usable; the generation acknowledges it.
    fn rebuild_cache(&mut self, predicates: &PredicateTable) -> Result<CacheGeneration, DashboardError>;

    /// Read aggregates for `range` of the active view from the existing datatile
    fn query_cache_by_range(&self, range: Selection) -> Result<CacheQuery, DashboardError>;
}
