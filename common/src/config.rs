use std::{
    collections::HashSet,
    fs::read_to_string,
    io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::THROUGHPUT_FIELD;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid config: {0}")]
    Format(#[from] serde_yml::Error),
    #[error("Config has no benches")]
    NoBenches,
    #[error("Duplicate bench name {0}")]
    DuplicateName(String),
    #[error("Bench {0} has no {1} inputs")]
    NoInputs(String, &'static str),
    #[error("Bench {0} has no outputs")]
    NoOutputs(String),
    #[error("Bench {name} has an empty tick range {start}..{end}")]
    EmptyTicks { name: String, start: i64, end: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub style: ChartStyle,
    pub benches: Vec<BenchPlot>,
}

/// Everything needed to turn one benchmark's csv files into a chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchPlot {
    pub name: String,
    pub inputs: Inputs,
    pub x_axis: XAxis,
    #[serde(default = "default_y_field")]
    pub y_field: String,
    pub x_label: String,
    pub y_label: String,
    pub titles: PanelTitles,
    #[serde(default)]
    pub ticks: Ticks,
    /// Explicit x extent, otherwise derived from the data
    pub x_limits: Option<(f64, f64)>,
    #[serde(default)]
    pub log_scale: bool,
    /// Added to the global maximum before it becomes the top of the y axis
    #[serde(default)]
    pub padding: f64,
    #[serde(default = "default_figure_size")]
    pub figure_size: (u32, u32),
    /// Overrides the style's tick label size, for long categorical labels
    pub tick_label_size: Option<f64>,
    /// Turns the x tick labels upright so long categorical labels do not overlap
    #[serde(default)]
    pub rotate_tick_labels: bool,
    pub outputs: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inputs {
    pub shared: Vec<Source>,
    pub distributed: Vec<Source>,
}

/// One csv file and the hardware partition that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub path: PathBuf,
    pub partition: String,
}

impl Source {
    pub fn new(path: impl Into<PathBuf>, partition: &str) -> Self {
        Self {
            path: path.into(),
            partition: partition.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelTitles {
    pub shared: String,
    pub distributed: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum XAxis {
    /// Plot against a numeric column of the csv
    Field { field: String },
    /// Plot against `start + i`, `i` counting rows within each partition.
    /// Used when the tick labels are not numbers so the points stay evenly spaced.
    Index { start: i64 },
}

impl XAxis {
    pub fn is_categorical(&self) -> bool {
        matches!(self, XAxis::Index { .. })
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Ticks {
    /// One tick per distinct x value
    #[default]
    Auto,
    /// Integer positions `start..end` labelled with their value
    Range { start: i64, end: i64 },
    /// Position `start + i` labelled `labels[i]`
    Labels { start: i64, labels: Vec<String> },
    /// Labels joined from `fields` of the first `limit` shared memory rows
    Fields {
        start: i64,
        fields: Vec<String>,
        separator: String,
        limit: usize,
    },
}

/// Look of the rendered figure, passed to the renderer for every chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartStyle {
    pub font_family: String,
    pub title_size: f64,
    pub axis_label_size: f64,
    pub tick_label_size: f64,
    pub legend_size: f64,
    pub marker_size: u32,
    pub line_width: u32,
    pub grid: bool,
    pub palette: Vec<(u8, u8, u8)>,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".to_owned(),
            title_size: 20.0,
            axis_label_size: 15.0,
            tick_label_size: 12.0,
            legend_size: 12.0,
            marker_size: 5,
            line_width: 2,
            grid: true,
            palette: vec![
                (76, 114, 176),
                (221, 132, 82),
                (85, 168, 104),
                (196, 78, 82),
                (129, 114, 179),
                (147, 120, 96),
            ],
        }
    }
}

fn default_y_field() -> String {
    THROUGHPUT_FIELD.to_owned()
}

fn default_figure_size() -> (u32, u32) {
    (1500, 700)
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.benches.is_empty() {
            return Err(ConfigError::NoBenches);
        }
        let mut names = HashSet::new();
        for bench in &self.benches {
            if !names.insert(bench.name.as_str()) {
                return Err(ConfigError::DuplicateName(bench.name.clone()));
            }
            if bench.inputs.shared.is_empty() {
                return Err(ConfigError::NoInputs(bench.name.clone(), "shared"));
            }
            if bench.inputs.distributed.is_empty() {
                return Err(ConfigError::NoInputs(bench.name.clone(), "distributed"));
            }
            if bench.outputs.is_empty() {
                return Err(ConfigError::NoOutputs(bench.name.clone()));
            }
            if let Ticks::Range { start, end } = bench.ticks
                && start >= end
            {
                return Err(ConfigError::EmptyTicks {
                    name: bench.name.clone(),
                    start,
                    end,
                });
            }
        }
        Ok(())
    }
}
