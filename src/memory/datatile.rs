//! Datatile dashboard over a [`Frame`].
//!
//! A rebuild slices the filtered rows by the active view's bins and stores,
//! for every slice, the `(sum, count)` cells of each other chart. A range
//! query then only folds the slices whose bin value lies inside the range.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rayon::prelude::*;

use super::{cells_to_bins, group_rows, merge_groups, sorted_cells, Cell, Frame};
use crate::dashboard::{CacheGeneration, CacheQuery, Dashboard, DashboardError};
use crate::executor::{AggregationRequest, ExecutorError};
use crate::selection::predicate::PredicateTable;
use crate::state::{key_bits, BinSet, ChartId, Selection};

/// Aggregates of every other chart for one bin of the active view
#[derive(Debug)]
struct TileSlice {
    /// Data value of the active view's bin
    value: f64,
    cells: BTreeMap<ChartId, Vec<Cell>>,
}

#[derive(Debug)]
struct Datatile {
    generation: CacheGeneration,
    slices: Vec<TileSlice>,
}

pub struct DatatileDashboard {
    frame: Arc<Frame>,
    charts: BTreeMap<ChartId, AggregationRequest>,
    active: Option<ChartId>,
    tile: Option<Datatile>,
    generation: CacheGeneration,
}

impl DatatileDashboard {
    pub fn new(frame: Arc<Frame>) -> Self {
        Self {
            frame,
            charts: BTreeMap::new(),
            active: None,
            tile: None,
            generation: 0,
        }
    }

    /// Generation of the current datatile, if one is built
    pub fn generation(&self) -> Option<CacheGeneration> {
        self.tile.as_ref().map(|t| t.generation)
    }

    fn backend(err: impl std::fmt::Display) -> DashboardError {
        DashboardError::Backend(err.to_string())
    }
}

impl Dashboard for DatatileDashboard {
    fn register_chart(
        &mut self,
        chart: &ChartId,
        request: &AggregationRequest,
    ) -> Result<(), DashboardError> {
        self.frame
            .column(request.dimension())
            .map_err(Self::backend)?;
        if let Some(target) = request.aggregate_dimension() {
            self.frame.column(target).map_err(Self::backend)?;
        }
        self.charts.insert(chart.clone(), request.clone());
        Ok(())
    }

    fn active_view(&self) -> Option<ChartId> {
        self.active.clone()
    }

    fn set_active_view(&mut self, chart: &ChartId) {
        if self.active.as_ref() != Some(chart) {
            self.active = Some(chart.clone());
            self.tile = None;
        }
    }

    fn rebuild_cache(&mut self, predicates: &PredicateTable) -> Result<CacheGeneration, DashboardError> {
        let active = self.active.as_ref().ok_or(DashboardError::NoActiveView)?;
        let active_request = self
            .charts
            .get(active)
            .ok_or_else(|| DashboardError::UnknownView(active.clone()))?;

        let frame = &self.frame;
        let rows = frame.mask(predicates, Some(active)).map_err(Self::backend)?;
        let active_column = frame
            .column(active_request.dimension())
            .map_err(Self::backend)?;

        // Rows of each active bin
        let mut by_key: HashMap<u64, (f64, Vec<usize>)> = HashMap::new();
        for &row in &rows {
            let v = active_column.value(row);
            if !v.is_finite() {
                continue;
            }
            let key = active_request.bin_key(v);
            by_key
                .entry(key_bits(key))
                .or_insert_with(|| (key, Vec::new()))
                .1
                .push(row);
        }
        let mut groups: Vec<(f64, Vec<usize>)> = by_key.into_values().collect();
        groups.sort_by(|a, b| a.0.total_cmp(&b.0));

        let others = self
            .charts
            .iter()
            .filter(|(id, _)| *id != active)
            .map(|(id, request)| {
                let column = frame.column(request.dimension())?;
                let target = request
                    .aggregate_dimension()
                    .map(|name| frame.column(name))
                    .transpose()?;
                Ok::<_, ExecutorError>((id, request, column, target))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(Self::backend)?;

        let slices = groups
            .par_iter()
            .map(|(key, rows)| {
                let cells = others
                    .iter()
                    .map(|(id, request, column, target)| {
                        let cells = group_rows(
                            rows,
                            |row| {
                                let v = column.value(row);
                                v.is_finite().then(|| request.bin_key(v))
                            },
                            |row| match target {
                                Some(target) => Some(target.value(row)).filter(|v| v.is_finite()),
                                None => Some(1.0),
                            },
                        );
                        ((*id).clone(), cells)
                    })
                    .collect();
                TileSlice {
                    value: active_request.bin_value(*key),
                    cells,
                }
            })
            .collect::<Vec<_>>();

        self.generation += 1;
        tracing::info!(
            "Rebuilt datatile {} for {} ({} slices, {} of {} rows)",
            self.generation,
            active,
            slices.len(),
            rows.len(),
            frame.rows()
        );
        self.tile = Some(Datatile {
            generation: self.generation,
            slices,
        });
        Ok(self.generation)
    }

    fn query_cache_by_range(&self, range: Selection) -> Result<CacheQuery, DashboardError> {
        let active = self.active.as_ref().ok_or(DashboardError::NoActiveView)?;
        let tile = self.tile.as_ref().ok_or(DashboardError::NoCache)?;

        let mut bins = BTreeMap::new();
        for (id, request) in self.charts.iter().filter(|(id, _)| *id != active) {
            let groups = tile
                .slices
                .iter()
                .filter(|slice| range.contains(slice.value))
                .filter_map(|slice| slice.cells.get(id))
                .fold(HashMap::new(), |acc, cells| {
                    let slice: HashMap<u64, Cell> =
                        cells.iter().map(|c| (key_bits(c.key), *c)).collect();
                    merge_groups(acc, slice)
                });
            let set: BinSet = cells_to_bins(&sorted_cells(groups), request.aggregate_fn())
                .map_err(Self::backend)?;
            bins.insert(id.clone(), set);
        }

        Ok(CacheQuery {
            generation: tile.generation,
            bins,
        })
    }
}
