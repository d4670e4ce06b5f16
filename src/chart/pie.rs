//! Pie Chart Layout
//!
//! Donut geometry for the downloads card: slices sorted by value descending
//! with ties keeping insertion order, angles assigned either in that order or
//! by a caller-supplied comparator, and a colour ramp keyed by distinct value.
//! A zero total renders a neutral placeholder ring instead of wedges.

use std::cmp::Ordering;
use std::f64::consts::TAU;

use super::arc::ArcShape;
use super::color::{interpolate_rgb, quantize, Rgb};
use super::format::format_si;
use super::scale::OrdinalScale;

const RAMP_START: Rgb = Rgb::new(0x64, 0xdd, 0x17);
const RAMP_END: Rgb = Rgb::new(0xff, 0xff, 0xff);

const INNER_RADIUS_RATIO: f64 = 0.67;
const CORNER_RADIUS: f64 = 2.0;

pub type ValueFn<T> = Box<dyn Fn(&T) -> f64 + Send + Sync>;
pub type LabelFn<T> = Box<dyn Fn(&T) -> String + Send + Sync>;
pub type CompareFn<T> = Box<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Named extraction strategies for arbitrary slice data
pub struct PieConfig<T> {
    value: ValueFn<T>,
    label: LabelFn<T>,
    sort: Option<CompareFn<T>>,
}

impl<T> PieConfig<T> {
    pub fn new<V, L>(value: V, label: L) -> Self
    where
        V: Fn(&T) -> f64 + Send + Sync + 'static,
        L: Fn(&T) -> String + Send + Sync + 'static,
    {
        Self {
            value: Box::new(value),
            label: Box::new(label),
            sort: None,
        }
    }

    /// Comparator that orders slices around the circle; without one, angles
    /// follow the value-descending slice order
    pub fn sorted_by<C>(mut self, compare: C) -> Self
    where
        C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.sort = Some(Box::new(compare));
        self
    }
}

/// One wedge of the donut
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    pub value_label: String,
    pub color: Rgb,
    pub arc: ArcShape,
    /// Position in angular order around the circle
    pub angular_index: usize,
}

/// Neutral outline shown when every slice is zero
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingOutline {
    pub radius: f64,
    pub stroke_width: f64,
}

/// Complete geometry of the donut for one viewport
#[derive(Debug, Clone, PartialEq)]
pub struct PieGeometry {
    /// Slices in value-descending order
    pub slices: Vec<PieSlice>,
    pub total: f64,
    pub total_label: String,
    pub radius: f64,
    pub placeholder_ring: Option<RingOutline>,
}

/// Significant digits shrink with the magnitude, matching the `s` presentation
fn si_significant(value: f64) -> usize {
    if value > 100.0 {
        3
    } else if value > 10.0 {
        2
    } else {
        1
    }
}

fn slice_label(value: f64) -> String {
    format_si(value, si_significant(value))
}

pub fn layout<T>(items: &[T], config: &PieConfig<T>, width: f64, height: f64) -> PieGeometry {
    let radius = width.min(height) / 2.0;
    let inner_radius = radius * INNER_RADIUS_RATIO;
    let outer_radius = radius - 1.0;

    // value-descending working order; stable sort keeps insertion order on ties
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| {
        (config.value)(&items[b])
            .partial_cmp(&(config.value)(&items[a]))
            .unwrap_or(Ordering::Equal)
    });

    let values: Vec<f64> = order.iter().map(|&i| (config.value)(&items[i])).collect();
    let total: f64 = values.iter().sum();
    let total_label = slice_label(total);

    // angular order: the comparator when given, else the working order
    let mut angular: Vec<usize> = (0..order.len()).collect();
    if let Some(compare) = &config.sort {
        angular.sort_by(|&a, &b| compare(&items[order[a]], &items[order[b]]));
    }

    let k = if total > 0.0 { TAU / total } else { 0.0 };
    let mut angles = vec![(0.0, 0.0); order.len()];
    let mut a0 = 0.0;
    for &slot in &angular {
        let v = values[slot];
        let a1 = a0 + if v > 0.0 { v * k } else { 0.0 };
        angles[slot] = (a0, a1);
        a0 = a1;
    }
    let mut angular_index = vec![0usize; order.len()];
    for (position, &slot) in angular.iter().enumerate() {
        angular_index[slot] = position;
    }

    let colors = slice_colors(&values);

    let slices = order
        .iter()
        .enumerate()
        .map(|(slot, &i)| {
            let (start_angle, end_angle) = angles[slot];
            PieSlice {
                label: (config.label)(&items[i]),
                value: values[slot],
                value_label: slice_label(values[slot]),
                color: colors[slot],
                arc: ArcShape {
                    inner_radius,
                    outer_radius,
                    start_angle,
                    end_angle,
                    corner_radius: CORNER_RADIUS,
                },
                angular_index: angular_index[slot],
            }
        })
        .collect();

    let placeholder_ring = (total == 0.0).then(|| RingOutline {
        radius: 5.0 * radius / 6.0,
        stroke_width: radius / 3.0,
    });

    PieGeometry { slices, total, total_label, radius, placeholder_ring }
}

/// Ramp colours keyed by distinct value, in working order. Equal values share
/// a colour; a lone slice gets the ramp start.
fn slice_colors(values: &[f64]) -> Vec<Rgb> {
    if values.len() <= 1 {
        return vec![RAMP_START; values.len()];
    }
    let ramp = quantize(values.len(), interpolate_rgb(RAMP_START, RAMP_END));
    let scale = OrdinalScale::new(values.iter().map(|v| v.to_string()), ramp);
    values
        .iter()
        .map(|v| scale.lookup(&v.to_string()).unwrap_or(RAMP_START))
        .collect()
}
