//! Tick Label Formatting
//!
//! SI-prefix number formatting for value axes and slice totals, plus the
//! multi-resolution time format used by date axes: each tick is rendered at
//! the finest calendar boundary it sits on.

use chrono::{DateTime, Datelike, Timelike, Utc};

/// Format `value` with `significant` digits and an SI prefix, e.g.
/// `42377 -> "42.4k"` at three significant digits.
pub fn format_si(value: f64, significant: usize) -> String {
    let significant = significant.max(1);
    if value == 0.0 {
        return format!("{:.*}", significant - 1, 0.0);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let x = value.abs();

    // Round to the requested significant digits first; the carry can push
    // the value across a prefix boundary (999.9 -> 1.00k)
    let exponent = x.log10().floor() as i32;
    let scale = 10f64.powi(exponent - (significant as i32 - 1));
    let rounded = (x / scale).round() * scale;
    let exponent = (rounded.log10() + 1e-12).floor() as i32;

    let prefix_exponent = (((exponent as f64) / 3.0).floor() as i32 * 3).clamp(-24, 24);
    let coefficient = rounded / 10f64.powi(prefix_exponent);
    let integer_digits = (exponent - prefix_exponent + 1).max(1) as usize;
    let decimals = significant.saturating_sub(integer_digits);

    format!("{sign}{coefficient:.decimals$}{}", si_prefix(prefix_exponent))
}

fn si_prefix(exponent: i32) -> &'static str {
    match exponent {
        -24 => "y",
        -21 => "z",
        -18 => "a",
        -15 => "f",
        -12 => "p",
        -9 => "n",
        -6 => "µ",
        -3 => "m",
        3 => "k",
        6 => "M",
        9 => "G",
        12 => "T",
        15 => "P",
        18 => "E",
        21 => "Z",
        24 => "Y",
        _ => "",
    }
}

/// Significant digits needed so that SI-prefixed labels one `step` apart stay
/// distinguishable across a domain reaching `value`
pub fn precision_prefix(step: f64, value: f64) -> usize {
    if step <= 0.0 || value == 0.0 {
        return 1;
    }
    let exponent = |x: f64| x.abs().log10().floor();
    let prefix_exp = ((exponent(value) / 3.0).floor().clamp(-8.0, 8.0)) * 3.0;
    ((prefix_exp - exponent(step)).max(0.0) as usize + 1).max(1)
}

/// Format `value` in fixed thousands with digit grouping, e.g.
/// `5000 -> "5k"`, `1500000 -> "1,500k"`. Used for group tick labels.
pub fn format_prefix_kilo(value: f64) -> String {
    let scaled = (value / 1000.0).round() as i64;
    format!("{}k", group_thousands(scaled))
}

fn group_thousands(value: i64) -> String {
    let digits = value.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Format a date-axis tick at the finest boundary it lies on: seconds within
/// a minute, `%I:%M` within an hour, `%I %p` within a day, `%a %d` within a
/// week, `%b %d` at week starts, `%B` within a year, `%Y` at year starts.
pub fn time_tick_label(tick: DateTime<Utc>) -> String {
    let format = if tick.second() != 0 || tick.nanosecond() != 0 {
        ":%S"
    } else if tick.minute() != 0 {
        "%I:%M"
    } else if tick.hour() != 0 {
        "%I %p"
    } else if tick.day() != 1 {
        // Mid-month days: Sundays start a week row
        if tick.weekday() == chrono::Weekday::Sun {
            "%b %d"
        } else {
            "%a %d"
        }
    } else if tick.month() != 1 {
        "%B"
    } else {
        "%Y"
    };
    tick.format(format).to_string()
}
