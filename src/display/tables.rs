//! Card tables for terminal output
//!
//! prettytable renditions of each card's derived dataset, plus compact
//! text summaries of the chart geometry laid out for the requested
//! viewport. Everything returns a string so output stays testable.

use std::f64::consts::TAU;

use prettytable::{format, Cell, Row, Table};

use crate::aggregate::{
    DataPoint, DownloadsOrder, DownloadsSummary, LabelMatrix, Legend, PopularitySeries,
    ReleaseDownloads,
};
use crate::chart::{calendar, chords, pie, LineChart, PieConfig};
use crate::github::RepoOverview;

/// Render a compact table with a header row
pub fn compact_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);

    let header_cells: Vec<Cell> = headers.iter().map(|header| Cell::new(header)).collect();
    table.add_row(Row::new(header_cells));

    for row in rows {
        let data_cells: Vec<Cell> = row.iter().map(|cell| Cell::new(cell)).collect();
        table.add_row(Row::new(data_cells));
    }

    indent(&table.to_string())
}

/// Render a headerless field/value table
pub fn field_table(rows: &[(&str, String)]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);
    for (field, value) in rows {
        table.add_row(Row::new(vec![Cell::new(field), Cell::new(value)]));
    }

    indent(&table.to_string())
}

/// Add a 2-space indent to every line of a rendered table
fn indent(rendered: &str) -> String {
    let mut result = String::new();
    for line in rendered.lines() {
        result.push_str("  ");
        result.push_str(line);
        result.push('\n');
    }
    result
}

/// Group a count into comma-separated thousands
pub fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Format a size in kilobytes as a human-readable binary unit
pub fn human_size(kb: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    let mut value = kb as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let text = format!("{value:.1}");
    let text = text.strip_suffix(".0").unwrap_or(&text);
    format!("{} {}", text, UNITS[unit])
}

/// Repository overview as a field/value table
pub fn overview_table(overview: &RepoOverview) -> String {
    let dash = || "-".to_string();
    let rows = vec![
        ("Repository", overview.name_with_owner.clone()),
        ("Description", overview.description.clone().unwrap_or_else(dash)),
        ("Homepage", overview.homepage_url.clone().unwrap_or_else(dash)),
        ("License", overview.license.clone().unwrap_or_else(dash)),
        ("Created", overview.created_at.format("%Y-%m-%d").to_string()),
        ("Last push", overview.pushed_at.format("%Y-%m-%d").to_string()),
        ("Size", human_size(overview.disk_usage_kb)),
        ("Commits", thousands(overview.commit_count)),
        ("Issues", thousands(overview.issue_count)),
        ("Pull requests", thousands(overview.pull_request_count)),
        ("Releases", thousands(overview.release_count)),
        ("Tags", thousands(overview.tag_count)),
        ("Stars", thousands(overview.star_count)),
        ("Forks", thousands(overview.fork_count)),
        ("Watchers", thousands(overview.watcher_count)),
    ];
    field_table(&rows)
}

/// Issue counts as a field/value table
pub fn issues_table(open: u64, closed: u64) -> String {
    let rows = vec![
        ("Open", thousands(open)),
        ("Closed", thousands(closed)),
        ("Total", thousands(open + closed)),
    ];
    field_table(&rows)
}

/// Per-release download counts, ordered the way the pie orders its slices
pub fn downloads_table(summary: &DownloadsSummary, order: DownloadsOrder) -> String {
    if summary.releases.is_empty() {
        return String::new();
    }

    let mut releases = summary.releases.clone();
    releases.sort_by(|a, b| order.compare(a, b));

    let mut rows: Vec<Vec<String>> = releases
        .iter()
        .map(|release| {
            vec![
                release.name.clone(),
                release.tag_name.clone(),
                release.published_at.format("%Y-%m-%d").to_string(),
                thousands(release.download_count),
            ]
        })
        .collect();
    rows.push(vec![
        "Total".to_string(),
        String::new(),
        String::new(),
        thousands(summary.total_downloads),
    ]);

    compact_table(&["Release", "Tag", "Published", "Downloads"], &rows)
}

/// Final star and fork counts with the date tracking started
pub fn popularity_table(series: &PopularitySeries) -> String {
    let last = |points: &[DataPoint]| points.last().map(|p| p.value as u64).unwrap_or(0);
    let mut rows = vec![
        ("Stars", thousands(last(&series.stars))),
        ("Forks", thousands(last(&series.forks))),
    ];
    if let Some(first) = series.stars.first() {
        rows.push(("Tracked since", first.date.format("%Y-%m-%d").to_string()));
    }
    field_table(&rows)
}

/// Ranked labels with their chord weights (row sums of the relation matrix)
pub fn labels_table(matrix: &LabelMatrix) -> String {
    let rows: Vec<Vec<String>> = matrix
        .names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let weight: f64 = matrix.matrix[i].iter().sum();
            let colour = matrix
                .legend
                .get(i)
                .map(|legend| legend.color.clone())
                .unwrap_or_default();
            vec![name.clone(), colour, format!("{weight:.0}")]
        })
        .collect();
    compact_table(&["Label", "Colour", "Weight"], &rows)
}

/// Commit window stats as a field/value table
pub fn calendar_table(days: &[DataPoint], total_commits: u64) -> String {
    let active = days.iter().filter(|day| day.value > 0.0).count();
    let mut rows = vec![
        ("Window", format!("{} days", days.len())),
        ("Commits", thousands(total_commits)),
        ("Active days", thousands(active as u64)),
    ];
    let busiest = days
        .iter()
        .filter(|day| day.value > 0.0)
        .max_by(|a, b| {
            a.value
                .partial_cmp(&b.value)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.date.cmp(&a.date))
        });
    if let Some(day) = busiest {
        rows.push((
            "Busiest day",
            format!("{} ({:.0} commits)", day.date.format("%Y-%m-%d"), day.value),
        ));
    }
    field_table(&rows)
}

/// Lay out a line or area chart for the viewport and summarise the result
pub fn line_chart_summary(
    data: &[Vec<DataPoint>],
    legends: &[Legend],
    area: bool,
    width: f64,
    height: f64,
) -> String {
    let mut chart = LineChart::new(area);
    let frame = chart.resized(data, legends, width, height);
    let geometry = frame.geometry;

    let rows: Vec<Vec<String>> = geometry
        .series
        .iter()
        .zip(data)
        .map(|(series, points)| {
            let name = series
                .legend
                .as_ref()
                .map(|legend| legend.name.clone())
                .unwrap_or_else(|| "series".to_string());
            let colour = series
                .legend
                .as_ref()
                .map(|legend| legend.color.clone())
                .unwrap_or_default();
            vec![
                name,
                points.len().to_string(),
                series.line.segments.len().to_string(),
                colour,
            ]
        })
        .collect();

    let mut out = compact_table(&["Series", "Points", "Segments", "Colour"], &rows);
    let x_labels: Vec<&str> = geometry.x_ticks.iter().map(|t| t.label.as_str()).collect();
    let y_labels: Vec<&str> = geometry.y_ticks.iter().map(|t| t.label.as_str()).collect();
    out.push_str(&format!("  x: {}\n", x_labels.join("  ")));
    out.push_str(&format!("  y: {}\n", y_labels.join("  ")));
    out
}

/// Lay out the downloads pie for the viewport and summarise its slices
pub fn pie_summary(
    summary: &DownloadsSummary,
    order: DownloadsOrder,
    width: f64,
    height: f64,
) -> String {
    let config = PieConfig::new(
        |release: &ReleaseDownloads| release.download_count as f64,
        |release: &ReleaseDownloads| release.name.clone(),
    )
    .sorted_by(move |a, b| order.compare(a, b));
    let geometry = pie::layout(&summary.releases, &config, width, height);

    if geometry.slices.is_empty() {
        return "  (no downloads)\n".to_string();
    }

    let rows: Vec<Vec<String>> = geometry
        .slices
        .iter()
        .map(|slice| {
            vec![
                slice.label.clone(),
                slice.value_label.clone(),
                format!("{:.1}%", slice.arc.sweep() / TAU * 100.0),
                slice.color.to_css(),
            ]
        })
        .collect();

    let mut out = compact_table(&["Release", "Downloads", "Share", "Colour"], &rows);
    out.push_str(&format!("  total: {}\n", geometry.total_label));
    out
}

/// Lay out the label chords for the viewport and summarise the groups
pub fn chords_summary(matrix: &LabelMatrix, width: f64, height: f64) -> String {
    let geometry = chords::layout(&matrix.matrix, width, height);

    if geometry.groups.is_empty() {
        return "  (no label relations)\n".to_string();
    }

    let rows: Vec<Vec<String>> = geometry
        .groups
        .iter()
        .map(|group| {
            let name = matrix
                .names
                .get(group.index)
                .cloned()
                .unwrap_or_else(|| group.index.to_string());
            let colour = matrix
                .legend
                .get(group.index)
                .map(|legend| legend.color.clone())
                .unwrap_or_default();
            let span = (group.end_angle - group.start_angle).to_degrees();
            vec![name, colour, format!("{:.0}", group.value), format!("{span:.1}°")]
        })
        .collect();

    let mut out = compact_table(&["Label", "Colour", "Weight", "Span"], &rows);
    out.push_str(&format!(
        "  {} ribbons inside radius {:.0}\n",
        geometry.ribbons.len(),
        geometry.inner_radius
    ));
    out
}

/// Lay out the commit heatmap for the viewport and list the busiest cells
pub fn calendar_summary(days: &[DataPoint], width: f64, height: f64) -> String {
    let geometry = calendar::layout(days, width, height);

    if geometry.cells.is_empty() {
        return "  (no commits)\n".to_string();
    }

    let mut active: Vec<_> = geometry.cells.iter().filter(|cell| cell.value > 0.0).collect();
    active.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.date.cmp(&b.date))
    });

    let rows: Vec<Vec<String>> = active
        .iter()
        .take(5)
        .map(|cell| {
            vec![
                cell.date.format("%Y-%m-%d").to_string(),
                cell.value_label.clone(),
                cell.color.to_css(),
            ]
        })
        .collect();

    let columns = geometry.cells.iter().map(|cell| cell.column).max().unwrap_or(0) + 1;
    let mut out = compact_table(&["Date", "Commits", "Colour"], &rows);
    out.push_str(&format!(
        "  {} week columns of {:.0}px cells\n",
        columns, geometry.cell_size
    ));
    out
}
