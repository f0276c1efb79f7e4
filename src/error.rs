//! Crate-level error type.
//!
//! Errors from the external collaborators ([`ExecutorError`],
//! [`DashboardError`]) convert into [`CrossfilterError`] so that command
//! handlers and the session can propagate them with `?`.

use thiserror::Error;

use crate::dashboard::DashboardError;
use crate::executor::ExecutorError;
use crate::state::ChartId;

/// Errors surfaced by planning, configuration and the selection protocol
#[derive(Debug, Error)]
pub enum CrossfilterError {
    /// Dimension has no observed values, or its bounds are inverted
    #[error("Invalid dimension '{name}': {reason}")]
    InvalidDimension { name: String, reason: String },

    /// Resolved stride or bin count is unusable, or the stride type is unknown
    #[error("Invalid binning request: {0}")]
    InvalidBinningRequest(String),

    /// Chart configuration could not be parsed
    #[error("Invalid chart configuration: {0}")]
    InvalidConfig(String),

    /// A rendering option that is not part of `RenderOptions`
    #[error("Unknown rendering option: {0}")]
    UnknownOption(String),

    /// Predicate string not of the form `low<=dimension<=high`
    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),

    /// No chart registered under this id
    #[error("Unknown chart: {0}")]
    UnknownChart(ChartId),

    /// Chart has no binning spec yet
    #[error("Chart {0} has not been initialized")]
    NotInitialized(ChartId),

    /// Range events require a chart created with interaction enabled
    #[error("Chart {0} does not accept range selections")]
    NotInteractive(ChartId),

    /// A chart tried to write another chart's predicate entry
    #[error("Chart {writer} may not write the predicate of chart {target}")]
    CrossChartWrite { writer: ChartId, target: ChartId },

    /// A range query was answered from a cache generation older than the last rebuild
    #[error("Cache query answered from generation {got}, expected {expected}")]
    StaleCache { expected: u64, got: u64 },

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error(transparent)]
    Dashboard(#[from] DashboardError),
}

impl CrossfilterError {
    pub(crate) fn invalid_dimension(name: &str, reason: impl Into<String>) -> Self {
        CrossfilterError::InvalidDimension {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = CrossfilterError> = std::result::Result<T, E>;
