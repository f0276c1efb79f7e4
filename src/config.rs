//! Chart configuration.
//!
//! Every recognized option is an explicit field. Rendering options that are
//! not part of [`RenderOptions`] are rejected when the config is built
//! instead of being forwarded to a renderer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::binning::BinningRequest;
use crate::error::{CrossfilterError, Result};
use crate::state::{AggregateFn, ChartId, LabelMap, StrideType};

fn default_size() -> u32 {
    400
}

fn default_true() -> bool {
    true
}

/// Options handed to the rendering collaborator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderOptions {
    #[serde(default = "default_size")]
    pub width: u32,
    #[serde(default = "default_size")]
    pub height: u32,
    /// Chart title; the x column name when empty
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_true")]
    pub autoscaling: bool,
    /// Bar color override for non-interactive charts
    #[serde(default)]
    pub bar_color: Option<String>,
    /// Relative bar width in `(0, 1]`
    #[serde(default)]
    pub bar_width: Option<f64>,
    #[serde(default = "default_true")]
    pub tooltip: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_size(),
            height: default_size(),
            title: None,
            autoscaling: true,
            bar_color: None,
            bar_width: None,
            tooltip: true,
        }
    }
}

impl RenderOptions {
    /// Option names accepted by [`RenderOptions::from_options`]
    pub const RECOGNIZED: &'static [&'static str] = &[
        "width",
        "height",
        "title",
        "autoscaling",
        "bar_color",
        "bar_width",
        "tooltip",
    ];

    /// Build options from loose key/value pairs, rejecting unknown keys
    pub fn from_options<I, K>(options: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut map = Map::new();
        for (key, value) in options {
            let key = key.into();
            if !Self::RECOGNIZED.contains(&key.as_str()) {
                return Err(CrossfilterError::UnknownOption(key));
            }
            map.insert(key, value);
        }
        let options: Self = serde_json::from_value(Value::Object(map))
            .map_err(|e| CrossfilterError::InvalidConfig(e.to_string()))?;

        if let Some(width) = options.bar_width {
            if !(width > 0.0 && width <= 1.0) {
                return Err(CrossfilterError::InvalidConfig(format!(
                    "bar_width {} is outside (0, 1]",
                    width
                )));
            }
        }
        Ok(options)
    }
}

/// Configuration of one bar chart
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartConfig {
    /// Chart id; generated from `x` when absent
    pub name: Option<String>,
    /// Binned column
    pub x: String,
    /// Optional aggregation target (aggregated with the mean)
    pub y: Option<String>,
    /// Desired number of bins when no step size is given
    pub data_points: Option<usize>,
    pub step_size: Option<f64>,
    pub step_size_type: StrideType,
    pub aggregate_fn: AggregateFn,
    /// Whether the chart gets a range selector and takes part in crossfiltering
    pub add_interaction: bool,
    pub x_label_map: Option<LabelMap>,
    pub render: RenderOptions,
}

impl ChartConfig {
    pub fn new(x: impl Into<String>) -> Self {
        Self {
            name: None,
            x: x.into(),
            y: None,
            data_points: None,
            step_size: None,
            step_size_type: StrideType::Integer,
            aggregate_fn: AggregateFn::Count,
            add_interaction: true,
            x_label_map: None,
            render: RenderOptions::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_y(mut self, y: impl Into<String>) -> Self {
        self.y = Some(y.into());
        self
    }

    pub fn with_data_points(mut self, data_points: usize) -> Self {
        self.data_points = Some(data_points);
        self
    }

    pub fn with_step_size(mut self, step_size: f64) -> Self {
        self.step_size = Some(step_size);
        self
    }

    pub fn with_stride_type(mut self, stride_type: StrideType) -> Self {
        self.step_size_type = stride_type;
        self
    }

    pub fn with_aggregate_fn(mut self, aggregate_fn: AggregateFn) -> Self {
        self.aggregate_fn = aggregate_fn;
        self
    }

    pub fn with_interaction(mut self, add_interaction: bool) -> Self {
        self.add_interaction = add_interaction;
        self
    }

    pub fn with_label_map(mut self, labels: LabelMap) -> Self {
        self.x_label_map = Some(labels);
        self
    }

    pub fn with_render(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }

    /// Parse a chart configuration from JSON
    ///
    /// Unknown top-level keys and malformed values are `InvalidConfig`;
    /// unknown rendering options are `UnknownOption`; a stride type that is
    /// not numeric is `InvalidBinningRequest`.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawChartConfig =
            serde_json::from_str(json).map_err(|e| CrossfilterError::InvalidConfig(e.to_string()))?;
        Self::try_from(raw)
    }

    pub fn chart_id(&self) -> ChartId {
        match &self.name {
            Some(name) => ChartId::new(name.as_str()),
            None => ChartId::generate(&self.x),
        }
    }

    pub fn title(&self) -> &str {
        match self.render.title.as_deref() {
            Some(title) if !title.is_empty() => title,
            _ => &self.x,
        }
    }

    /// Granularity handed to the binning planner
    pub fn binning_request(&self) -> BinningRequest {
        BinningRequest {
            stride: self.step_size,
            stride_type: self.step_size_type,
            bin_count: self.data_points,
            label_map: self.x_label_map.clone(),
        }
    }
}

/// Wire form of [`ChartConfig`]
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawChartConfig {
    #[serde(default)]
    name: Option<String>,
    x: String,
    #[serde(default)]
    y: Option<String>,
    #[serde(default)]
    data_points: Option<usize>,
    #[serde(default)]
    step_size: Option<f64>,
    #[serde(default)]
    step_size_type: Option<String>,
    #[serde(default)]
    aggregate_fn: Option<String>,
    #[serde(default = "default_true")]
    add_interaction: bool,
    #[serde(default)]
    x_label_map: Option<LabelMap>,
    #[serde(default)]
    render: Map<String, Value>,
}

impl TryFrom<RawChartConfig> for ChartConfig {
    type Error = CrossfilterError;

    fn try_from(raw: RawChartConfig) -> Result<Self> {
        let step_size_type = match raw.step_size_type.as_deref() {
            Some(name) => StrideType::parse(name)?,
            None => StrideType::Integer,
        };
        let aggregate_fn = match raw.aggregate_fn.as_deref() {
            Some(name) => name.parse::<AggregateFn>().map_err(|_| {
                CrossfilterError::InvalidConfig(format!("unknown aggregate function '{}'", name))
            })?,
            None => AggregateFn::Count,
        };

        Ok(Self {
            name: raw.name,
            x: raw.x,
            y: raw.y,
            data_points: raw.data_points,
            step_size: raw.step_size,
            step_size_type,
            aggregate_fn,
            add_interaction: raw.add_interaction,
            x_label_map: raw.x_label_map,
            render: RenderOptions::from_options(raw.render)?,
        })
    }
}
