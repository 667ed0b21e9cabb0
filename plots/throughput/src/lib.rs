//! Two-panel throughput comparison charts.
//!
//! The left panel shows the shared memory runs, the right panel the
//! distributed memory runs, with one line per hardware partition and a y
//! axis shared by both panels.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use common::{
    config::{BenchPlot, ChartStyle},
    range::AxisRange,
    table::Table,
};
use itertools::Itertools;
use plotters::{
    coord::{
        Shift,
        cartesian::Cartesian2d,
        ranged1d::{Ranged, ValueFormatter},
    },
    drawing::DrawingAreaErrorKind,
    prelude::*,
    style::FontTransform,
};
use svg2pdf::{ConversionOptions, PageOptions, usvg};
use thiserror::Error;
use tracing::{debug, info};

pub mod series;
pub mod ticks;

use series::{Series, build_series};
use ticks::{Tick, TickAxis, UniqueLabels, format_value, layout_ticks, tick_label, x_extent};

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Unsupported output format for {}, expected .png, .svg or .pdf", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("Invalid y range {min}..{max}: {reason}")]
    InvalidRange {
        min: f64,
        max: f64,
        reason: &'static str,
    },
    #[error("Row {row} of {input} has no usable {field}")]
    MissingField {
        input: String,
        row: usize,
        field: String,
    },
    #[error("Failed to render {}: {reason}", path.display())]
    Render { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Svg,
    /// Drawn as svg, then converted
    Pdf,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self, ChartError> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("png") => Ok(OutputFormat::Png),
            Some("svg") => Ok(OutputFormat::Svg),
            Some("pdf") => Ok(OutputFormat::Pdf),
            _ => Err(ChartError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: String,
    pub series: Vec<Series>,
}

/// Everything resolved from the tables and the bench options before drawing
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub panels: [Panel; 2],
    /// Partitions of both panels in order of first appearance, for colors
    pub partitions: Vec<String>,
    pub ticks: Vec<Tick>,
    pub x_extent: (f64, f64),
    pub y_range: AxisRange,
    pub log_scale: bool,
    pub x_label: String,
    pub y_label: String,
    pub tick_label_size: f64,
    pub rotate_tick_labels: bool,
    pub figure_size: (u32, u32),
}

impl Layout {
    pub fn new(
        shared: &Table,
        distributed: &Table,
        range: AxisRange,
        plot: &BenchPlot,
        style: &ChartStyle,
    ) -> Result<Self, ChartError> {
        let shared_series = build_series(shared, &plot.x_axis, &plot.y_field)?;
        let distributed_series = build_series(distributed, &plot.x_axis, &plot.y_field)?;
        let all_series = shared_series
            .iter()
            .chain(&distributed_series)
            .collect::<Vec<_>>();

        let partitions = all_series
            .iter()
            .map(|s| s.label.clone())
            .unique()
            .collect::<Vec<_>>();
        let ticks = layout_ticks(&plot.ticks, shared, &all_series)?;
        let x_extent = x_extent(plot.x_limits, &all_series, &ticks);
        let y_range = y_range(range, plot.log_scale)?;
        debug!(
            "{}: x {:?}, y {:?}, {} ticks",
            plot.name,
            x_extent,
            y_range,
            ticks.len()
        );

        Ok(Self {
            panels: [
                Panel {
                    title: plot.titles.shared.clone(),
                    series: shared_series,
                },
                Panel {
                    title: plot.titles.distributed.clone(),
                    series: distributed_series,
                },
            ],
            partitions,
            ticks,
            x_extent,
            y_range,
            log_scale: plot.log_scale,
            x_label: plot.x_label.clone(),
            y_label: plot.y_label.clone(),
            tick_label_size: plot.tick_label_size.unwrap_or(style.tick_label_size),
            rotate_tick_labels: plot.rotate_tick_labels,
            figure_size: plot.figure_size,
        })
    }

    fn color_index(&self, partition: &str) -> usize {
        self.partitions
            .iter()
            .position(|p| p == partition)
            .unwrap_or_default()
    }
}

fn y_range(range: AxisRange, log_scale: bool) -> Result<AxisRange, ChartError> {
    if !range.min.is_finite() || !range.max.is_finite() {
        return Err(ChartError::InvalidRange {
            min: range.min,
            max: range.max,
            reason: "bounds must be finite",
        });
    }
    if log_scale && range.min <= 0.0 {
        return Err(ChartError::InvalidRange {
            min: range.min,
            max: range.max,
            reason: "a log scale needs a positive minimum",
        });
    }
    if range.max > range.min {
        return Ok(range);
    }
    // Every value is identical and nothing was padded
    let max = if log_scale {
        range.min * 10.0
    } else {
        range.min + 1.0
    };
    Ok(AxisRange { min: range.min, max })
}

/// Builds the chart and writes it to every output of `plot`, relative to `out_dir`.
///
/// Every output is checked before anything is drawn, so a bad name or
/// directory leaves no files behind. Returns the written paths in
/// configuration order.
pub fn render(
    shared: &Table,
    distributed: &Table,
    range: AxisRange,
    plot: &BenchPlot,
    style: &ChartStyle,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, ChartError> {
    let layout = Layout::new(shared, distributed, range, plot, style)?;

    let targets = plot
        .outputs
        .iter()
        .map(|output| -> Result<(PathBuf, OutputFormat), ChartError> {
            let path = out_dir.join(output);
            let format = OutputFormat::from_path(&path)?;
            check_destination(&path)?;
            Ok((path, format))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut written = Vec::with_capacity(targets.len());
    for (path, format) in targets {
        let render_err = |reason: String| ChartError::Render {
            path: path.clone(),
            reason,
        };
        match format {
            OutputFormat::Png => {
                let root = BitMapBackend::new(&path, layout.figure_size).into_drawing_area();
                draw(&root, &layout, style).map_err(|e| render_err(e.to_string()))?;
            }
            OutputFormat::Svg => {
                let root = SVGBackend::new(&path, layout.figure_size).into_drawing_area();
                draw(&root, &layout, style).map_err(|e| render_err(e.to_string()))?;
            }
            OutputFormat::Pdf => {
                let mut svg = String::new();
                {
                    let root =
                        SVGBackend::with_string(&mut svg, layout.figure_size).into_drawing_area();
                    draw(&root, &layout, style).map_err(|e| render_err(e.to_string()))?;
                }
                let pdf = svg_to_pdf(&svg).map_err(render_err)?;
                fs::write(&path, pdf).map_err(|source| ChartError::Io {
                    path: path.clone(),
                    source,
                })?;
            }
        }
        info!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

fn svg_to_pdf(svg: &str) -> Result<Vec<u8>, String> {
    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_str(svg, &options).map_err(|e| e.to_string())?;
    svg2pdf::to_pdf(&tree, ConversionOptions::default(), PageOptions::default())
        .map_err(|e| e.to_string())
}

/// Fails unless the directory `path` would be written into exists
pub fn check_destination(path: &Path) -> Result<(), ChartError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let problem = if !parent.is_dir() {
        Some("destination directory does not exist")
    } else if path.is_dir() {
        Some("destination is a directory")
    } else {
        None
    };
    match problem {
        Some(reason) => Err(ChartError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, reason),
        }),
        None => Ok(()),
    }
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    layout: &Layout,
    style: &ChartStyle,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;
    let areas = root.split_evenly((1, 2));

    for (area, panel) in areas.iter().zip(&layout.panels) {
        let mut builder = ChartBuilder::on(area);
        builder
            .caption(
                &panel.title,
                (style.font_family.as_str(), style.title_size).into_font(),
            )
            .margin(15)
            .x_label_area_size(if layout.rotate_tick_labels { 110 } else { 60 })
            .y_label_area_size(80);

        let x = TickAxis::new(layout.x_extent, &layout.ticks);
        let AxisRange { min, max } = layout.y_range;
        if layout.log_scale {
            let y = UniqueLabels::new((min..max).log_scale());
            let chart = builder.build_cartesian_2d(x, y)?;
            draw_panel(chart, panel, layout, style)?;
        } else {
            let chart = builder.build_cartesian_2d(x, UniqueLabels::new(min..max))?;
            draw_panel(chart, panel, layout, style)?;
        }
    }

    root.present()
}

fn draw_panel<'a, DB, Y>(
    mut chart: ChartContext<'a, DB, Cartesian2d<TickAxis, Y>>,
    panel: &Panel,
    layout: &Layout,
    style: &ChartStyle,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>>
where
    DB: DrawingBackend + 'a,
    Y: Ranged<ValueType = f64> + ValueFormatter<f64>,
{
    let font = move |size: f64| (style.font_family.as_str(), size).into_font();
    let x_formatter = |x: &f64| tick_label(&layout.ticks, *x);
    let y_formatter = |y: &f64| format_value(*y);
    let x_tick_font = if layout.rotate_tick_labels {
        font(layout.tick_label_size).transform(FontTransform::Rotate90)
    } else {
        font(layout.tick_label_size)
    };

    {
        let mut mesh = chart.configure_mesh();
        mesh.x_desc(layout.x_label.as_str())
            .y_desc(layout.y_label.as_str())
            .axis_desc_style(font(style.axis_label_size))
            .x_labels(layout.ticks.len().max(1))
            .x_label_formatter(&x_formatter)
            .x_label_style(x_tick_font)
            .y_label_formatter(&y_formatter)
            .y_label_style(font(style.tick_label_size));
        if style.grid {
            mesh.bold_line_style(RGBColor(200, 200, 200))
                .light_line_style(RGBColor(235, 235, 235));
        } else {
            mesh.disable_mesh();
        }
        mesh.draw()?;
    }

    for series in &panel.series {
        let line = pick_color(style, layout.color_index(&series.label))
            .stroke_width(style.line_width);
        chart
            .draw_series(LineSeries::new(series.points.iter().copied(), line))?
            .label(series.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line));
        chart.draw_series(
            series
                .points
                .iter()
                .map(|&p| Cross::new(p, style.marker_size, line)),
        )?;
    }

    if !panel.series.is_empty() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .label_font(font(style.legend_size))
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }
    Ok(())
}

/// Palette entry for the `i`th partition, wrapping around
fn pick_color(style: &ChartStyle, i: usize) -> RGBColor {
    if style.palette.is_empty() {
        return BLACK;
    }
    let (r, g, b) = style.palette[i % style.palette.len()];
    RGBColor(r, g, b)
}
