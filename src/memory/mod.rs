//! In-memory columnar backend.
//!
//! [`Frame`] is a small columnar table implementing both executor contracts:
//! it filters rows by a [`PredicateTable`] and aggregates the surviving rows
//! in parallel with rayon. [`datatile::DatatileDashboard`] builds the
//! pre-aggregated datatile on top of it.

pub mod datatile;

use std::collections::{BTreeMap, HashMap};

use rayon::prelude::*;

use crate::binning;
use crate::error::{CrossfilterError, Result};
use crate::executor::{AggregationExecutor, ExecutorError, FilterExecutor, ValueCounts};
use crate::selection::predicate::PredicateTable;
use crate::state::{key_bits, AggregateFn, BinSet, ChartId, Dimension, DimensionKind};

/// One column of a [`Frame`]
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    Numeric(Vec<f64>),
    Boolean(Vec<bool>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(values) => values.len(),
            Column::Boolean(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> DimensionKind {
        match self {
            Column::Numeric(_) => DimensionKind::Numeric,
            Column::Boolean(_) => DimensionKind::Boolean,
        }
    }

    /// Numeric value of row `row`; booleans read as 0 and 1
    #[inline]
    pub fn value(&self, row: usize) -> f64 {
        match self {
            Column::Numeric(values) => values[row],
            Column::Boolean(values) => {
                if values[row] {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// Running `(sum, count)` for one bin
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Cell {
    pub key: f64,
    pub sum: f64,
    pub count: usize,
}

impl Cell {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn merge(&mut self, other: &Cell) {
        self.sum += other.sum;
        self.count += other.count;
    }

    pub fn aggregate(&self, aggregate_fn: AggregateFn) -> f64 {
        match aggregate_fn {
            AggregateFn::Count => self.count as f64,
            AggregateFn::Mean => self.sum / self.count as f64,
        }
    }
}

/// Group `rows` by `key`, accumulating `value`, sorted by key
///
/// Rows whose key or value is `None` are skipped.
pub(crate) fn group_rows<K, V>(rows: &[usize], key: K, value: V) -> Vec<Cell>
where
    K: Fn(usize) -> Option<f64> + Sync,
    V: Fn(usize) -> Option<f64> + Sync,
{
    let groups = rows
        .par_iter()
        .fold(HashMap::new, |mut acc: HashMap<u64, Cell>, &row| {
            if let (Some(k), Some(v)) = (key(row), value(row)) {
                acc.entry(key_bits(k))
                    .or_insert_with(|| Cell {
                        key: k + 0.0,
                        ..Cell::default()
                    })
                    .add(v);
            }
            acc
        })
        .reduce(HashMap::new, merge_groups);

    sorted_cells(groups)
}

pub(crate) fn merge_groups(
    mut left: HashMap<u64, Cell>,
    right: HashMap<u64, Cell>,
) -> HashMap<u64, Cell> {
    for (bits, cell) in right {
        left.entry(bits)
            .and_modify(|c| c.merge(&cell))
            .or_insert(cell);
    }
    left
}

pub(crate) fn sorted_cells(groups: HashMap<u64, Cell>) -> Vec<Cell> {
    let mut cells: Vec<Cell> = groups.into_values().collect();
    cells.sort_by(|a, b| a.key.total_cmp(&b.key));
    cells
}

pub(crate) fn cells_to_bins(cells: &[Cell], aggregate_fn: AggregateFn) -> Result<BinSet, ExecutorError> {
    BinSet::new(
        cells.iter().map(|c| c.key).collect(),
        cells.iter().map(|c| c.aggregate(aggregate_fn)).collect(),
    )
    .map_err(ExecutorError::ContractViolation)
}

/// Columnar table of equally long columns
#[derive(Clone, Debug, Default)]
pub struct Frame {
    columns: BTreeMap<String, Column>,
    rows: usize,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column; every column must have the same number of rows
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Result<Self> {
        let name = name.into();
        if !self.columns.is_empty() && column.len() != self.rows {
            return Err(CrossfilterError::invalid_dimension(
                &name,
                format!("{} rows, frame has {}", column.len(), self.rows),
            ));
        }
        self.rows = column.len();
        self.columns.insert(name, column);
        Ok(self)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn column(&self, name: &str) -> Result<&Column, ExecutorError> {
        self.columns
            .get(name)
            .ok_or_else(|| ExecutorError::MissingColumn(name.to_string()))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Rows passing every predicate of `predicates` except `exclude`'s entry
    pub fn mask(
        &self,
        predicates: &PredicateTable,
        exclude: Option<&ChartId>,
    ) -> Result<Vec<usize>, ExecutorError> {
        let filters = predicates
            .active(exclude)
            .map(|p| self.column(&p.dimension).map(|column| (p, column)))
            .collect::<Result<Vec<_>, ExecutorError>>()?;

        Ok((0..self.rows)
            .into_par_iter()
            .filter(|&row| filters.iter().all(|(p, column)| p.matches(column.value(row))))
            .collect())
    }

    /// Executor restricted to `rows`
    pub fn view(&self, rows: Vec<usize>) -> FrameView<'_> {
        FrameView { frame: self, rows }
    }

    /// Executor over every row
    pub fn full_view(&self) -> FrameView<'_> {
        self.view((0..self.rows).collect())
    }
}

impl FilterExecutor for Frame {
    fn dimension(&self, name: &str) -> Result<Dimension> {
        let column = self.column(name)?;
        let values: Vec<f64> = (0..column.len()).map(|row| column.value(row)).collect();
        Dimension::from_values(name, column.kind(), &values)
    }

    fn filtered<'a>(
        &'a self,
        predicates: &PredicateTable,
        exclude: Option<&ChartId>,
    ) -> Result<Box<dyn AggregationExecutor + 'a>, ExecutorError> {
        let rows = self.mask(predicates, exclude)?;
        tracing::debug!(
            "Filtered {} of {} rows ({} predicates)",
            rows.len(),
            self.rows,
            predicates.len()
        );
        Ok(Box::new(self.view(rows)))
    }
}

/// Selected rows of a [`Frame`]
pub struct FrameView<'a> {
    frame: &'a Frame,
    rows: Vec<usize>,
}

impl FrameView<'_> {
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }
}

impl AggregationExecutor for FrameView<'_> {
    fn value_counts(&self, dimension: &str) -> Result<ValueCounts, ExecutorError> {
        let column = self.frame.column(dimension)?;
        let cells = group_rows(
            &self.rows,
            |row| Some(column.value(row)).filter(|v| v.is_finite()),
            |_| Some(1.0),
        );
        Ok(ValueCounts {
            resolved_bin_count: cells.len(),
            bins: cells_to_bins(&cells, AggregateFn::Count)?,
        })
    }

    fn binned_aggregate(
        &self,
        dimension: &str,
        aggregate_dimension: Option<&str>,
        aggregate_fn: AggregateFn,
        stride: Option<f64>,
        min: f64,
        _bin_count: Option<usize>,
    ) -> Result<BinSet, ExecutorError> {
        let column = self.frame.column(dimension)?;
        let target = aggregate_dimension
            .map(|name| self.frame.column(name))
            .transpose()?;

        let cells = group_rows(
            &self.rows,
            |row| {
                let v = column.value(row);
                v.is_finite().then(|| binning::bin_key(v, stride, min))
            },
            |row| match target {
                Some(target) => Some(target.value(row)).filter(|v| v.is_finite()),
                None => Some(1.0),
            },
        );
        cells_to_bins(&cells, aggregate_fn)
    }
}
