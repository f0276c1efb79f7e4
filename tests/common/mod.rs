//! Common test utilities shared across all test modules
//!
//! Deterministic frames, sessions and a recording dashboard used by the
//! core and integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use barfilter::config::ChartConfig;
use barfilter::dashboard::{CacheGeneration, CacheQuery, Dashboard, DashboardError};
use barfilter::executor::AggregationRequest;
use barfilter::memory::datatile::DatatileDashboard;
use barfilter::memory::{Column, Frame};
use barfilter::selection::predicate::PredicateTable;
use barfilter::settings::Settings;
use barfilter::state::{ChartId, Selection, StrideType};
use barfilter::Crossfilter;

pub const ROWS: usize = 500;

/// People table: integer ages 20..=69, scores in [0, 1), a membership flag
/// and an income that grows with age
pub fn people_frame() -> Frame {
    let age: Vec<f64> = (0..ROWS).map(|i| (20 + (i * 7) % 50) as f64).collect();
    let score: Vec<f64> = (0..ROWS).map(|i| ((i * 37) % 100) as f64 / 100.0).collect();
    let member: Vec<bool> = (0..ROWS).map(|i| i % 3 == 0).collect();
    let income: Vec<f64> = age
        .iter()
        .enumerate()
        .map(|(i, a)| 1_000.0 * a + (i % 10) as f64 * 50.0)
        .collect();

    Frame::new()
        .with_column("age", Column::Numeric(age))
        .and_then(|f| f.with_column("score", Column::Numeric(score)))
        .and_then(|f| f.with_column("member", Column::Boolean(member)))
        .and_then(|f| f.with_column("income", Column::Numeric(income)))
        .unwrap_or_else(|e| panic!("Failed to build people frame: {}", e))
}

pub fn age_chart() -> ChartConfig {
    ChartConfig::new("age").with_name("age").with_step_size(1.0)
}

pub fn score_chart() -> ChartConfig {
    ChartConfig::new("score")
        .with_name("score")
        .with_step_size(0.1)
        .with_stride_type(StrideType::Float)
}

pub fn member_chart() -> ChartConfig {
    ChartConfig::new("member").with_name("member")
}

pub fn income_chart() -> ChartConfig {
    ChartConfig::new("age")
        .with_name("income_by_age")
        .with_y("income")
        .with_data_points(5)
        .with_interaction(false)
}

/// Initialized session over [`people_frame`] with all four charts
pub fn people_session() -> Crossfilter<Arc<Frame>, DatatileDashboard> {
    let frame = Arc::new(people_frame());
    let mut session = Crossfilter::new(
        frame.clone(),
        DatatileDashboard::new(frame),
        Settings::default(),
    );
    for config in [age_chart(), score_chart(), member_chart(), income_chart()] {
        session.add_chart(config).unwrap();
    }
    session.initialize().unwrap();
    session
}

/// Dashboard that records calls and answers every query with empty bins
#[derive(Clone, Default)]
pub struct RecordingDashboard {
    pub rebuilds: Rc<Cell<usize>>,
    pub queries: Rc<Cell<usize>>,
    /// Answer queries from the generation before the last rebuild
    pub stale: bool,
    /// Number of upcoming rebuilds that fail with a backend error
    pub failing_rebuilds: usize,
    pub active: Option<ChartId>,
    pub generation: CacheGeneration,
}

impl Dashboard for RecordingDashboard {
    fn register_chart(
        &mut self,
        _chart: &ChartId,
        _request: &AggregationRequest,
    ) -> Result<(), DashboardError> {
        Ok(())
    }

    fn active_view(&self) -> Option<ChartId> {
        self.active.clone()
    }

    fn set_active_view(&mut self, chart: &ChartId) {
        self.active = Some(chart.clone());
    }

    fn rebuild_cache(&mut self, _predicates: &PredicateTable) -> Result<CacheGeneration, DashboardError> {
        if self.failing_rebuilds > 0 {
            self.failing_rebuilds -= 1;
            return Err(DashboardError::Backend("worker restarting".to_string()));
        }
        self.rebuilds.set(self.rebuilds.get() + 1);
        self.generation += 1;
        Ok(self.generation)
    }

    fn query_cache_by_range(&self, _range: Selection) -> Result<CacheQuery, DashboardError> {
        self.queries.set(self.queries.get() + 1);
        let generation = if self.stale {
            self.generation.saturating_sub(1)
        } else {
            self.generation
        };
        Ok(CacheQuery {
            generation,
            ..Default::default()
        })
    }
}
