//! Calendar Heatmap Layout
//!
//! Week-by-weekday grid for the commit calendar: 53 columns of weeks running
//! Saturday to Friday, cell size derived from the viewport width, and a green
//! ramp over the distinct commit counts with a fixed neutral for empty days.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::aggregate::DataPoint;

use super::color::{interpolate_rgb, quantize, Rgb};
use super::format::format_si;
use super::scale::OrdinalScale;

pub const WEEK_COLUMNS: usize = 53;
pub const GRID_ROWS: usize = 7;

/// Fill for days with no commits
pub const ZERO_COLOR: Rgb = Rgb::new(0x60, 0x60, 0x60);

const RAMP_DARK: Rgb = Rgb::new(0x19, 0x3c, 0x0e);
const RAMP_BRIGHT: Rgb = Rgb::new(0x64, 0xdd, 0x22);

/// One day square of the grid
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarCell {
    pub date: DateTime<Utc>,
    pub value: f64,
    /// Week column, counted in Saturday boundaries since the earliest date
    pub column: usize,
    /// Weekday row; Saturday is row 0, Friday row 6
    pub row: usize,
    pub x: f64,
    pub y: f64,
    pub color: Rgb,
    pub value_label: String,
}

/// Complete geometry of the heatmap for one viewport
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalendarGeometry {
    pub cells: Vec<CalendarCell>,
    pub cell_size: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

/// Number of Saturday boundaries after `start`, up to and including `end`
fn saturdays_between(start: NaiveDate, end: NaiveDate) -> i64 {
    let saturday_floor = |d: NaiveDate| {
        d - Duration::days(((d.weekday().num_days_from_sunday() + 1) % 7) as i64)
    };
    (saturday_floor(end) - saturday_floor(start))
        .num_days()
        .div_euclid(7)
}

pub fn layout(data: &[DataPoint], width: f64, height: f64) -> CalendarGeometry {
    let cell_size = (width / WEEK_COLUMNS as f64).floor();
    let offset_x = 0.5;
    let offset_y = (height - GRID_ROWS as f64 * cell_size) / 2.0;

    let Some(min_date) = data.iter().map(|p| p.date).min() else {
        return CalendarGeometry { cell_size, offset_x, offset_y, ..CalendarGeometry::default() };
    };

    // distinct values, largest first, drive the ramp; zero days are painted
    // the neutral colour instead
    let mut sorted: Vec<f64> = data.iter().map(|p| p.value).collect();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    let mut distinct = sorted.clone();
    distinct.dedup();
    let ramp = quantize(distinct.len(), interpolate_rgb(RAMP_DARK, RAMP_BRIGHT));
    let scale = OrdinalScale::new(sorted.iter().map(|v| v.to_string()), ramp);

    let min_day = min_date.date_naive();
    let cells = data
        .iter()
        .map(|p| {
            let column = saturdays_between(min_day, p.date.date_naive()).max(0) as usize;
            let row = ((p.date.weekday().num_days_from_sunday() + 1) % 7) as usize;
            let color = if p.value == 0.0 {
                ZERO_COLOR
            } else {
                scale.lookup(&p.value.to_string()).unwrap_or(ZERO_COLOR)
            };
            CalendarCell {
                date: p.date,
                value: p.value,
                column,
                row,
                x: column as f64 * cell_size,
                y: row as f64 * cell_size,
                color,
                value_label: format_si(p.value, 1),
            }
        })
        .collect();

    CalendarGeometry { cells, cell_size, offset_x, offset_y }
}
