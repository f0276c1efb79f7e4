//! barfilter - Binning and crossfilter selection for linked bar charts
//!
//! This library decides how a column is discretized into bars, keeps each
//! chart's domain stable while other charts filter it, and runs the range
//! selection protocol that drives a pre-aggregated datatile.
//!
//! ## Module Structure
//!
//! - [`state`] - Core data types and constants
//! - [`binning`] - Binning planner, label mapper and bin set merger
//! - [`executor`] - Aggregation executor contract
//! - [`dashboard`] - Datatile dashboard contract
//! - [`chart`] - Per-chart state and the aggregation gate
//! - [`selection`] - Range selection controller and predicate table
//! - [`memory`] - In-memory columnar executor and datatile dashboard
//! - [`session`] - Crossfilter session dispatching selection effects
//! - [`config`] - Chart configuration
//! - [`settings`] - User settings persistence
//! - [`error`] - Crate error type

pub mod binning;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod executor;
pub mod memory;
pub mod selection;
pub mod session;
pub mod settings;
pub mod state;

pub use error::{CrossfilterError, Result};
pub use session::Crossfilter;
