//! Scales and Ticks
//!
//! Continuous linear and UTC time scales with "nice" domain rounding and
//! human-friendly tick generation, plus the ordinal colour scale. Tick steps
//! snap to 1/2/5 decades for values and to calendar units (seconds through
//! years) for dates, so axis labels land on round numbers and calendar
//! boundaries regardless of the data's extent.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};

use super::color::Rgb;

const E10: f64 = 7.071_067_811_865_475_5; // sqrt(50)
const E5: f64 = 3.162_277_660_168_379_5; // sqrt(10)
const E2: f64 = 1.414_213_562_373_095_1; // sqrt(2)

/// Tick step for the span, encoded the d3 way: a positive whole step, or a
/// negative inverse when the step is a sub-unit fraction.
fn tick_increment(start: f64, stop: f64, count: usize) -> f64 {
    let step = (stop - start) / count.max(1) as f64;
    if step <= 0.0 || !step.is_finite() {
        return 0.0;
    }
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= E10 {
        10.0
    } else if error >= E5 {
        5.0
    } else if error >= E2 {
        2.0
    } else {
        1.0
    };
    if power >= 0.0 {
        factor * 10f64.powf(power)
    } else {
        -(10f64.powf(-power)) / factor
    }
}

/// Positive tick step for the span, snapped to a 1/2/5 decade
pub fn tick_step(start: f64, stop: f64, count: usize) -> f64 {
    let step0 = (stop - start).abs() / count.max(1) as f64;
    if step0 <= 0.0 || !step0.is_finite() {
        return 0.0;
    }
    let mut step1 = 10f64.powf(step0.log10().floor());
    let error = step0 / step1;
    if error >= E10 {
        step1 *= 10.0;
    } else if error >= E5 {
        step1 *= 5.0;
    } else if error >= E2 {
        step1 *= 2.0;
    }
    step1
}

/// Round values covering [start, stop], roughly `count` of them
pub fn ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if count == 0 || !start.is_finite() || !stop.is_finite() {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }
    let reverse = stop < start;
    let (lo, hi) = if reverse { (stop, start) } else { (start, stop) };
    let step = tick_increment(lo, hi, count);
    if step == 0.0 || !step.is_finite() {
        return Vec::new();
    }

    let mut out: Vec<f64> = if step > 0.0 {
        let mut r0 = (lo / step).round();
        let mut r1 = (hi / step).round();
        if r0 * step < lo {
            r0 += 1.0;
        }
        if r1 * step > hi {
            r1 -= 1.0;
        }
        let n = ((r1 - r0 + 1.0).max(0.0)) as usize;
        (0..n).map(|i| (r0 + i as f64) * step).collect()
    } else {
        let inv = -step;
        let mut r0 = (lo * inv).round();
        let mut r1 = (hi * inv).round();
        if r0 / inv < lo {
            r0 += 1.0;
        }
        if r1 / inv > hi {
            r1 -= 1.0;
        }
        let n = ((r1 - r0 + 1.0).max(0.0)) as usize;
        (0..n).map(|i| (r0 + i as f64) / inv).collect()
    };
    if reverse {
        out.reverse();
    }
    out
}

/// Linear value scale mapping a numeric domain onto a pixel range
#[derive(Debug, Clone)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn scale(&self, x: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        // A degenerate domain maps everything to the range midpoint
        let t = if span == 0.0 { 0.5 } else { (x - d0) / span };
        r0 + t * (r1 - r0)
    }

    /// Extend the domain outwards to tick-step boundaries
    pub fn nice(&mut self, count: usize) {
        let (mut start, mut stop) = self.domain;
        let swapped = stop < start;
        if swapped {
            std::mem::swap(&mut start, &mut stop);
        }
        if start == stop {
            return;
        }

        let mut prestep = f64::NAN;
        for _ in 0..10 {
            let step = tick_increment(start, stop, count);
            if step == prestep {
                break;
            }
            if step > 0.0 {
                start = (start / step).floor() * step;
                stop = (stop / step).ceil() * step;
            } else if step < 0.0 {
                start = (start * step).ceil() / step;
                stop = (stop * step).floor() / step;
            } else {
                break;
            }
            prestep = step;
        }

        self.domain = if swapped { (stop, start) } else { (start, stop) };
    }

    pub fn ticks(&self, count: usize) -> Vec<f64> {
        ticks(self.domain.0, self.domain.1, count)
    }
}

/// Calendar units a time axis can snap to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
    /// Weeks start on Sunday
    Week,
    Month,
    Year,
}

/// A calendar unit with a step multiple, e.g. every 3 hours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInterval {
    pub unit: TimeUnit,
    pub step: u32,
}

impl TimeInterval {
    pub fn new(unit: TimeUnit, step: u32) -> Self {
        Self { unit, step: step.max(1) }
    }

    /// Truncate to the base unit, ignoring the step multiple
    fn floor_base(unit: TimeUnit, t: DateTime<Utc>) -> DateTime<Utc> {
        let t = t - Duration::nanoseconds(t.nanosecond() as i64);
        match unit {
            TimeUnit::Second => t,
            TimeUnit::Minute => t - Duration::seconds(t.second() as i64),
            TimeUnit::Hour => {
                t - Duration::seconds(t.second() as i64) - Duration::minutes(t.minute() as i64)
            }
            TimeUnit::Day => Self::midnight(t),
            TimeUnit::Week => {
                Self::midnight(t) - Duration::days(t.weekday().num_days_from_sunday() as i64)
            }
            TimeUnit::Month => Self::midnight(t) - Duration::days(t.day0() as i64),
            TimeUnit::Year => Self::midnight(t) - Duration::days(t.ordinal0() as i64),
        }
    }

    fn midnight(t: DateTime<Utc>) -> DateTime<Utc> {
        t - Duration::seconds(t.second() as i64)
            - Duration::minutes(t.minute() as i64)
            - Duration::hours(t.hour() as i64)
    }

    /// Whether a base-unit boundary also lies on the step multiple
    fn on_step(&self, t: DateTime<Utc>) -> bool {
        let step = self.step;
        match self.unit {
            TimeUnit::Second => t.second() % step == 0,
            TimeUnit::Minute => t.minute() % step == 0,
            TimeUnit::Hour => t.hour() % step == 0,
            TimeUnit::Day => t.day0() % step == 0,
            TimeUnit::Week => t.weekday() == Weekday::Sun,
            TimeUnit::Month => t.month0() % step == 0,
            TimeUnit::Year => t.year().rem_euclid(step as i32) == 0,
        }
    }

    /// One base unit forward from a base boundary
    fn advance(&self, b: DateTime<Utc>) -> DateTime<Utc> {
        match self.unit {
            TimeUnit::Second => b + Duration::seconds(1),
            TimeUnit::Minute => b + Duration::minutes(1),
            TimeUnit::Hour => b + Duration::hours(1),
            TimeUnit::Day => b + Duration::days(1),
            TimeUnit::Week => b + Duration::days(7),
            TimeUnit::Month => Self::floor_base(TimeUnit::Month, b + Duration::days(32)),
            TimeUnit::Year => Self::floor_base(TimeUnit::Year, b + Duration::days(367)),
        }
    }

    /// One base unit backward from a base boundary
    fn retreat(&self, b: DateTime<Utc>) -> DateTime<Utc> {
        match self.unit {
            TimeUnit::Second => b - Duration::seconds(1),
            TimeUnit::Minute => b - Duration::minutes(1),
            TimeUnit::Hour => b - Duration::hours(1),
            TimeUnit::Day => b - Duration::days(1),
            TimeUnit::Week => b - Duration::days(7),
            TimeUnit::Month => Self::floor_base(TimeUnit::Month, b - Duration::days(1)),
            TimeUnit::Year => Self::floor_base(TimeUnit::Year, b - Duration::days(1)),
        }
    }

    /// Latest step boundary at or before `t`
    pub fn floor(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        let mut b = Self::floor_base(self.unit, t);
        while !self.on_step(b) {
            b = self.retreat(b);
        }
        b
    }

    /// Earliest step boundary at or after `t`
    pub fn ceil(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        let floored = self.floor(t);
        if floored == t {
            t
        } else {
            self.next_after(floored)
        }
    }

    /// Next step boundary strictly after the boundary `b`
    fn next_after(&self, b: DateTime<Utc>) -> DateTime<Utc> {
        let mut next = self.advance(b);
        while !self.on_step(next) {
            next = self.advance(next);
        }
        next
    }

    /// Step boundaries within [start, stop], both ends inclusive
    pub fn range(&self, start: DateTime<Utc>, stop: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        let mut out = Vec::new();
        let mut b = self.ceil(start);
        while b <= stop {
            out.push(b);
            b = self.next_after(b);
        }
        out
    }
}

const MS_PER_YEAR: f64 = 31_536_000_000.0;

/// Candidate tick intervals in ascending duration, milliseconds
const TICK_INTERVALS: [(TimeUnit, u32, f64); 18] = [
    (TimeUnit::Second, 1, 1_000.0),
    (TimeUnit::Second, 5, 5_000.0),
    (TimeUnit::Second, 15, 15_000.0),
    (TimeUnit::Second, 30, 30_000.0),
    (TimeUnit::Minute, 1, 60_000.0),
    (TimeUnit::Minute, 5, 300_000.0),
    (TimeUnit::Minute, 15, 900_000.0),
    (TimeUnit::Minute, 30, 1_800_000.0),
    (TimeUnit::Hour, 1, 3_600_000.0),
    (TimeUnit::Hour, 3, 10_800_000.0),
    (TimeUnit::Hour, 6, 21_600_000.0),
    (TimeUnit::Hour, 12, 43_200_000.0),
    (TimeUnit::Day, 1, 86_400_000.0),
    (TimeUnit::Day, 2, 172_800_000.0),
    (TimeUnit::Week, 1, 604_800_000.0),
    (TimeUnit::Month, 1, 2_592_000_000.0),
    (TimeUnit::Month, 3, 7_776_000_000.0),
    (TimeUnit::Year, 1, MS_PER_YEAR),
];

/// Pick the calendar interval whose duration best matches `span / count`
fn tick_interval(start: DateTime<Utc>, stop: DateTime<Utc>, count: usize) -> TimeInterval {
    let start_ms = start.timestamp_millis() as f64;
    let stop_ms = stop.timestamp_millis() as f64;
    let target = (stop_ms - start_ms).abs() / count.max(1) as f64;

    let i = TICK_INTERVALS.partition_point(|&(_, _, step)| step <= target);
    if i == TICK_INTERVALS.len() {
        // Multi-year spans: snap the year step to a 1/2/5 decade
        let step = tick_step(start_ms / MS_PER_YEAR, stop_ms / MS_PER_YEAR, count);
        return TimeInterval::new(TimeUnit::Year, step.max(1.0) as u32);
    }
    if i == 0 {
        return TimeInterval::new(TimeUnit::Second, 1);
    }

    let (unit_lo, step_lo, ms_lo) = TICK_INTERVALS[i - 1];
    let (unit_hi, step_hi, ms_hi) = TICK_INTERVALS[i];
    if target / ms_lo < ms_hi / target {
        TimeInterval::new(unit_lo, step_lo)
    } else {
        TimeInterval::new(unit_hi, step_hi)
    }
}

/// UTC time scale mapping a date domain onto a pixel range
#[derive(Debug, Clone)]
pub struct TimeScale {
    domain: (DateTime<Utc>, DateTime<Utc>),
    range: (f64, f64),
}

impl TimeScale {
    pub fn new(domain: (DateTime<Utc>, DateTime<Utc>), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn scale(&self, t: DateTime<Utc>) -> f64 {
        let d0 = self.domain.0.timestamp_millis() as f64;
        let d1 = self.domain.1.timestamp_millis() as f64;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        let pos = if span == 0.0 {
            0.5
        } else {
            (t.timestamp_millis() as f64 - d0) / span
        };
        r0 + pos * (r1 - r0)
    }

    /// Extend the domain outwards to calendar boundaries
    pub fn nice(&mut self, count: usize) {
        let (start, stop) = self.domain;
        if start == stop {
            return;
        }
        let interval = tick_interval(start, stop, count);
        self.domain = (interval.floor(start), interval.ceil(stop));
    }

    pub fn ticks(&self, count: usize) -> Vec<DateTime<Utc>> {
        let (start, stop) = self.domain;
        if start == stop {
            return vec![start];
        }
        tick_interval(start, stop, count).range(start, stop)
    }
}

/// Ordinal scale assigning colours to distinct keys in first-seen order
#[derive(Debug, Clone)]
pub struct OrdinalScale {
    order: Vec<String>,
    index: HashMap<String, usize>,
    range: Vec<Rgb>,
}

impl OrdinalScale {
    pub fn new<I>(domain: I, range: Vec<Rgb>) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut order = Vec::new();
        let mut index = HashMap::new();
        for key in domain {
            if !index.contains_key(&key) {
                index.insert(key.clone(), order.len());
                order.push(key);
            }
        }
        Self { order, index, range }
    }

    pub fn lookup(&self, key: &str) -> Option<Rgb> {
        if self.range.is_empty() {
            return None;
        }
        self.index.get(key).map(|&i| self.range[i % self.range.len()])
    }

    pub fn domain_len(&self) -> usize {
        self.order.len()
    }
}
