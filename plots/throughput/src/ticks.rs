use std::ops::Range;

use common::{config::Ticks, table::Table};
use itertools::Itertools;
use plotters::coord::{
    ranged1d::{AsRangedCoord, KeyPointHint, NoDefaultFormatting, Ranged, ValueFormatter},
    types::RangedCoordf64,
};

use crate::{ChartError, series::Series};

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub position: f64,
    pub label: String,
}

impl Tick {
    fn numeric(position: f64) -> Self {
        Self {
            position,
            label: format_value(position),
        }
    }
}

/// Places the x ticks of both panels. `shared` provides the rows that
/// [`Ticks::Fields`] builds its labels from.
pub fn layout_ticks(
    ticks: &Ticks,
    shared: &Table,
    series: &[&Series],
) -> Result<Vec<Tick>, ChartError> {
    Ok(match ticks {
        Ticks::Auto => series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.0))
            .sorted_by(f64::total_cmp)
            .dedup()
            .map(Tick::numeric)
            .collect(),
        Ticks::Range { start, end } => (*start..*end).map(|x| Tick::numeric(x as f64)).collect(),
        Ticks::Labels { start, labels } => labels
            .iter()
            .enumerate()
            .map(|(i, label)| Tick {
                position: (*start + i as i64) as f64,
                label: label.clone(),
            })
            .collect(),
        Ticks::Fields {
            start,
            fields,
            separator,
            limit,
        } => shared
            .rows()
            .iter()
            .take(*limit)
            .enumerate()
            .map(|(i, row)| -> Result<Tick, ChartError> {
                let parts = fields
                    .iter()
                    .map(|field| {
                        row.get(field).ok_or_else(|| ChartError::MissingField {
                            input: shared.source().to_owned(),
                            row: i + 1,
                            field: field.clone(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Tick {
                    position: (*start + i as i64) as f64,
                    label: parts.join(separator.as_str()),
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
    })
}

/// The x span to draw: `limits` when given, otherwise everything plotted
/// plus half the smallest gap between neighbouring positions on each side.
pub fn x_extent(limits: Option<(f64, f64)>, series: &[&Series], ticks: &[Tick]) -> (f64, f64) {
    if let Some(limits) = limits {
        return limits;
    }

    let positions = series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.0))
        .chain(ticks.iter().map(|t| t.position))
        .sorted_by(f64::total_cmp)
        .dedup()
        .collect::<Vec<_>>();
    let (Some(first), Some(last)) = (positions.first(), positions.last()) else {
        return (0.0, 1.0);
    };
    let step = positions
        .iter()
        .tuple_windows()
        .map(|(a, b)| b - a)
        .min_by(f64::total_cmp)
        .unwrap_or(1.0);
    (first - step / 2.0, last + step / 2.0)
}

/// Linear x coordinate whose bold key points are exactly the laid out ticks
pub struct TickAxis {
    inner: RangedCoordf64,
    positions: Vec<f64>,
}

impl TickAxis {
    pub fn new((start, end): (f64, f64), ticks: &[Tick]) -> Self {
        Self {
            inner: (start..end).into(),
            positions: ticks
                .iter()
                .map(|t| t.position)
                .filter(|p| (start..=end).contains(p))
                .collect(),
        }
    }
}

impl Ranged for TickAxis {
    type FormatOption = NoDefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        self.inner.map(value, limit)
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        if hint.weight().allow_light_points() {
            Vec::new()
        } else {
            self.positions.clone()
        }
    }

    fn range(&self) -> Range<f64> {
        self.inner.range()
    }
}

impl ValueFormatter<f64> for TickAxis {
    fn format(value: &f64) -> String {
        format_value(*value)
    }
}

/// Y coordinate that drops key points whose label repeats an earlier one.
/// Log scales can place two points that both print as the same number.
pub struct UniqueLabels<R>(R);

impl<R: Ranged<ValueType = f64>> UniqueLabels<R> {
    pub fn new<A: AsRangedCoord<CoordDescType = R, Value = f64>>(range: A) -> Self
    where
        R: From<A>,
    {
        Self(range.into())
    }
}

impl<R: Ranged<ValueType = f64>> Ranged for UniqueLabels<R> {
    type FormatOption = NoDefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        self.0.map(value, limit)
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        self.0
            .key_points(hint)
            .into_iter()
            .unique_by(|v| format_value(*v))
            .collect()
    }

    fn range(&self) -> Range<f64> {
        self.0.range()
    }
}

impl<R: Ranged<ValueType = f64>> ValueFormatter<f64> for UniqueLabels<R> {
    fn format(value: &f64) -> String {
        format_value(*value)
    }
}

/// Label of the tick at `x`, or the plain number when `x` is not a tick
pub fn tick_label(ticks: &[Tick], x: f64) -> String {
    ticks
        .iter()
        .find(|t| (t.position - x).abs() < 1e-9)
        .map(|t| t.label.clone())
        .unwrap_or_else(|| format_value(x))
}

/// Compact axis number: whole numbers above 100, at most two decimals below
pub fn format_value(v: f64) -> String {
    if v.abs() >= 100.0 {
        return format!("{v:.0}");
    }
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_owned() } else { s.to_owned() }
}
