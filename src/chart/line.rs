//! Line Chart Layout
//!
//! Multi-series line and area geometry: a niced UTC time scale across the
//! width, a niced linear value scale down the height, per-series monotone
//! curves built from simplified point runs, and axis ticks with SI value
//! labels. Data updates animate over a fixed duration; viewport resizes and
//! series-count changes rebuild the geometry without a transition.

use chrono::{DateTime, Utc};

use crate::aggregate::{DataPoint, Legend};

use super::format::{format_si, precision_prefix, time_tick_label};
use super::path::{
    area_monotone_x, monotone_x, simplify, PathGeometry, PathInterpolator, Point,
};
use super::scale::{tick_step, LinearScale, TimeScale};

/// Duration of the animated transition on a data update, milliseconds
pub const DATA_TRANSITION_MS: u64 = 250;

/// Tolerance for point reduction before curve construction, pixels
pub const SIMPLIFY_TOLERANCE: f64 = 0.5;

const X_TICK_COUNT: usize = 5;
const Y_TICK_COUNT: usize = 10;
const NICE_COUNT: usize = 10;

/// Padding between the drawing area and the viewport edges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self { top: 10.0, right: 30.0, bottom: 20.0, left: 10.0 }
    }
}

/// An axis tick at a pixel offset with its rendered label
#[derive(Debug, Clone, PartialEq)]
pub struct AxisTick {
    pub offset: f64,
    pub label: String,
}

/// Geometry for one series: the stroked line and an optional area fill
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesGeometry {
    pub line: PathGeometry,
    pub area: Option<PathGeometry>,
    pub legend: Option<Legend>,
}

/// Complete geometry of one rendered frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineGeometry {
    pub series: Vec<SeriesGeometry>,
    pub x_ticks: Vec<AxisTick>,
    pub y_ticks: Vec<AxisTick>,
    /// Horizontal gridline length behind each y tick
    pub grid_length: f64,
    pub inner_width: f64,
    pub inner_height: f64,
}

/// An animated change from the previous frame's paths to the new ones
#[derive(Debug, Clone)]
pub struct PathTransition {
    pub duration_ms: u64,
    pub lines: Vec<PathInterpolator>,
}

/// One rendered frame plus how to get there from the previous one
#[derive(Debug, Clone)]
pub struct LineFrame {
    pub geometry: LineGeometry,
    pub transition: Option<PathTransition>,
}

/// Stateful layout engine for a line or area card
#[derive(Debug, Clone)]
pub struct LineChart {
    margins: Margins,
    area: bool,
    previous: Option<LineGeometry>,
}

impl LineChart {
    pub fn new(area: bool) -> Self {
        Self { margins: Margins::default(), area, previous: None }
    }

    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    /// New data arrived. Animates when the series count is unchanged;
    /// a shape change rebuilds from scratch.
    pub fn data_changed(
        &mut self,
        data: &[Vec<DataPoint>],
        legends: &[Legend],
        width: f64,
        height: f64,
    ) -> LineFrame {
        let geometry = self.layout(data, legends, width, height);
        let transition = match &self.previous {
            Some(prev) if prev.series.len() == geometry.series.len() => Some(PathTransition {
                duration_ms: DATA_TRANSITION_MS,
                lines: prev
                    .series
                    .iter()
                    .zip(&geometry.series)
                    .map(|(a, b)| PathInterpolator::new(a.line.clone(), b.line.clone()))
                    .collect(),
            }),
            _ => None,
        };
        self.previous = Some(geometry.clone());
        LineFrame { geometry, transition }
    }

    /// The viewport changed size. Recomputes immediately, no animation.
    pub fn resized(
        &mut self,
        data: &[Vec<DataPoint>],
        legends: &[Legend],
        width: f64,
        height: f64,
    ) -> LineFrame {
        let geometry = self.layout(data, legends, width, height);
        self.previous = Some(geometry.clone());
        LineFrame { geometry, transition: None }
    }

    fn layout(
        &self,
        data: &[Vec<DataPoint>],
        legends: &[Legend],
        width: f64,
        height: f64,
    ) -> LineGeometry {
        let inner_width = (width - self.margins.left - self.margins.right).max(0.0);
        let inner_height = (height - self.margins.top - self.margins.bottom).max(0.0);

        let extent = date_extent(data);
        let max_value = data
            .iter()
            .flatten()
            .map(|p| p.value)
            .fold(f64::NEG_INFINITY, f64::max);
        let (Some((min_date, max_date)), true) = (extent, max_value.is_finite()) else {
            return LineGeometry {
                inner_width,
                inner_height,
                ..LineGeometry::default()
            };
        };

        let mut x = TimeScale::new((min_date, max_date), (0.0, inner_width));
        x.nice(NICE_COUNT);
        let mut y = LinearScale::new((0.0, max_value), (inner_height, 0.0));
        y.nice(NICE_COUNT);

        let series = data
            .iter()
            .enumerate()
            .map(|(i, points)| {
                let run: Vec<Point> = points
                    .iter()
                    .map(|p| Point::new(x.scale(p.date), y.scale(p.value)))
                    .collect();
                let run = simplify(&run, SIMPLIFY_TOLERANCE);
                SeriesGeometry {
                    line: monotone_x(&run),
                    area: self.area.then(|| area_monotone_x(&run, y.scale(0.0))),
                    legend: legends.get(i).cloned(),
                }
            })
            .collect();

        let x_ticks = x
            .ticks(X_TICK_COUNT)
            .into_iter()
            .map(|t| AxisTick { offset: x.scale(t), label: time_tick_label(t) })
            .collect();

        let (d0, d1) = y.domain();
        let step = tick_step(d0, d1, Y_TICK_COUNT);
        let precision = precision_prefix(step, d0.abs().max(d1.abs()));
        let y_ticks = y
            .ticks(Y_TICK_COUNT)
            .into_iter()
            .map(|v| AxisTick { offset: y.scale(v), label: format_si(v, precision) })
            .collect();

        LineGeometry {
            series,
            x_ticks,
            y_ticks,
            grid_length: inner_width,
            inner_width,
            inner_height,
        }
    }
}

fn date_extent(data: &[Vec<DataPoint>]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let mut extent: Option<(DateTime<Utc>, DateTime<Utc>)> = None;
    for point in data.iter().flatten() {
        extent = Some(match extent {
            None => (point.date, point.date),
            Some((lo, hi)) => (lo.min(point.date), hi.max(point.date)),
        });
    }
    extent
}
