//! Chord Chart Layout
//!
//! Radial layout for the label co-occurrence matrix: one arc per label group
//! around the circle, ribbons between co-occurring pairs, and value ticks
//! along each group arc. Group order follows the matrix; subgroup spans
//! within a group are laid out largest first.

use std::f64::consts::TAU;

use super::arc::{AngularSpan, ArcShape, RibbonShape};
use super::format::format_prefix_kilo;

/// Gap between adjacent group arcs, radians
pub const PAD_ANGLE: f64 = 0.025;

/// Tick spacing along a group arc, in matrix value units
pub const TICK_STEP: f64 = 1_000.0;

const OUTER_INSET: f64 = 20.0;
const ARC_THICKNESS: f64 = 5.0;
const LABELLED_EVERY: usize = 5;

/// A tick mark on a group arc; every fifth tick carries a label
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTick {
    pub value: f64,
    pub angle: f64,
    pub label: Option<String>,
}

/// One label group's arc
#[derive(Debug, Clone, PartialEq)]
pub struct ChordGroup {
    pub index: usize,
    pub start_angle: f64,
    pub end_angle: f64,
    pub value: f64,
    pub arc: ArcShape,
    pub ticks: Vec<GroupTick>,
}

/// A ribbon between two groups; `source` is the larger end
#[derive(Debug, Clone, PartialEq)]
pub struct ChordRibbon {
    pub source_index: usize,
    pub target_index: usize,
    pub source_value: f64,
    pub target_value: f64,
    pub shape: RibbonShape,
}

/// Complete geometry of the chord chart for one viewport
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChordGeometry {
    pub groups: Vec<ChordGroup>,
    pub ribbons: Vec<ChordRibbon>,
    pub inner_radius: f64,
    pub outer_radius: f64,
}

#[derive(Debug, Clone, Copy)]
struct Span {
    start: f64,
    end: f64,
    value: f64,
}

impl Span {
    fn angular(self) -> AngularSpan {
        AngularSpan { start_angle: self.start, end_angle: self.end }
    }
}

/// Lay out a square co-occurrence matrix. An all-zero matrix yields no
/// groups or ribbons.
pub fn layout(matrix: &[Vec<f64>], width: f64, height: f64) -> ChordGeometry {
    let outer_radius = width.min(height) * 0.5 - OUTER_INSET;
    let inner_radius = outer_radius - ARC_THICKNESS;
    let ribbon_radius = inner_radius.max(0.0);

    let n = matrix.len();
    let cell = |i: usize, j: usize| -> f64 {
        matrix.get(i).and_then(|row| row.get(j)).copied().unwrap_or(0.0)
    };
    let row_sums: Vec<f64> = (0..n).map(|i| (0..n).map(|j| cell(i, j)).sum()).collect();
    let total: f64 = row_sums.iter().sum();
    if n == 0 || total <= 0.0 {
        return ChordGeometry { inner_radius, outer_radius, ..ChordGeometry::default() };
    }

    let k = (TAU - PAD_ANGLE * n as f64).max(0.0) / total;
    let pad = if k != 0.0 { PAD_ANGLE } else { TAU / n as f64 };

    // spans[i][j]: the portion of group i's arc owed to column j
    let mut spans = vec![vec![Span { start: 0.0, end: 0.0, value: 0.0 }; n]; n];
    let mut groups = Vec::with_capacity(n);
    let mut x = 0.0;
    for i in 0..n {
        let x0 = x;
        let mut columns: Vec<usize> = (0..n).collect();
        columns.sort_by(|&a, &b| {
            cell(i, b).partial_cmp(&cell(i, a)).unwrap_or(std::cmp::Ordering::Equal)
        });
        for j in columns {
            let v = cell(i, j);
            let span = Span { start: x, end: x + v * k, value: v };
            spans[i][j] = span;
            x = span.end;
        }
        let value = row_sums[i];
        groups.push(ChordGroup {
            index: i,
            start_angle: x0,
            end_angle: x,
            value,
            arc: ArcShape {
                inner_radius,
                outer_radius,
                start_angle: x0,
                end_angle: x,
                corner_radius: 0.0,
            },
            ticks: group_ticks(x0, x, value, TICK_STEP),
        });
        x += pad;
    }

    let mut ribbons = Vec::new();
    for i in 0..n {
        for j in i..n {
            let source = spans[i][j];
            let target = spans[j][i];
            if source.value <= 0.0 && target.value <= 0.0 {
                continue;
            }
            let (source, target, si, ti) = if source.value < target.value {
                (target, source, j, i)
            } else {
                (source, target, i, j)
            };
            ribbons.push(ChordRibbon {
                source_index: si,
                target_index: ti,
                source_value: source.value,
                target_value: target.value,
                shape: RibbonShape {
                    radius: ribbon_radius,
                    source: source.angular(),
                    target: target.angular(),
                },
            });
        }
    }

    ChordGeometry { groups, ribbons, inner_radius, outer_radius }
}

fn group_ticks(start: f64, end: f64, value: f64, step: f64) -> Vec<GroupTick> {
    if value <= 0.0 || step <= 0.0 {
        return Vec::new();
    }
    let k = (end - start) / value;
    let count = (value / step).ceil() as usize;
    (0..count)
        .map(|i| {
            let v = i as f64 * step;
            GroupTick {
                value: v,
                angle: v * k + start,
                label: (i % LABELLED_EVERY == 0).then(|| format_prefix_kilo(v)),
            }
        })
        .collect()
}
