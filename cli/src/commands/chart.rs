use anyhow::Result;
use std::fmt::Write;
use std::process;

use nutriter_core::chart::{Axis, ChartData, ChartSeries, NO_DATA_MESSAGE, SeriesKey, parse_series_list};
use nutriter_core::service::NutriterService;

use super::helpers::parse_range;

const MARKERS: [char; 4] = ['*', 'o', '+', 'x'];
const COLUMN_WIDTH: usize = 2;
const MIN_HEIGHT: usize = 3;

pub(crate) fn cmd_chart(
    svc: &NutriterService,
    start: Option<String>,
    end: Option<String>,
    series: Option<&str>,
    height: usize,
    json: bool,
) -> Result<()> {
    let (start, end) = match parse_range(start, end)? {
        (None, None) => svc
            .default_range()
            .map_or((None, None), |(first, last)| (Some(first), Some(last))),
        bounds => bounds,
    };
    let keys = match series {
        Some(s) => parse_series_list(s)?,
        None => SeriesKey::ALL.to_vec(),
    };

    let data = svc.chart(start, end, &keys);

    if json {
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    if data.is_empty() {
        eprintln!("{NO_DATA_MESSAGE}");
        process::exit(2);
    }

    print!("{}", render_chart(&data, height));
    Ok(())
}

/// Text rendering of `data`: one panel per axis, one column per date.
pub(crate) fn render_chart(data: &ChartData, height: usize) -> String {
    let mut out = String::new();
    if data.is_empty() {
        let _ = writeln!(out, "{NO_DATA_MESSAGE}");
        return out;
    }
    let height = height.max(MIN_HEIGHT);
    for axis in data.axes() {
        render_panel(&mut out, data, axis, height);
    }
    out
}

fn render_panel(out: &mut String, data: &ChartData, axis: Axis, height: usize) {
    let (lo, hi) = data.axis_range(axis);
    let series: Vec<&ChartSeries> = data.series.iter().filter(|s| s.axis == axis).collect();
    let width = data.labels.len() * COLUMN_WIDTH;

    let mut grid = vec![vec![' '; width]; height];
    for (i, s) in series.iter().enumerate() {
        let marker = MARKERS[i % MARKERS.len()];
        for (col, value) in s.values.iter().enumerate() {
            let Some(v) = value else { continue };
            let row = scale_row(*v, lo, hi, height);
            grid[height - 1 - row][col * COLUMN_WIDTH] = marker;
        }
    }

    let top = format_tick(hi);
    let bottom = format_tick(lo);
    let gutter = top.len().max(bottom.len());

    let _ = writeln!(out, "{}", axis.title());
    for (r, cells) in grid.iter().enumerate() {
        let (tick, edge) = if r == 0 {
            (top.as_str(), '┤')
        } else if r == height - 1 {
            (bottom.as_str(), '┤')
        } else {
            ("", '│')
        };
        let line: String = cells.iter().collect();
        let _ = writeln!(out, "{tick:>gutter$} {edge}{}", line.trim_end());
    }
    let _ = writeln!(out, "{:>gutter$} └{}", "", "─".repeat(width));

    let first = &data.labels[0];
    let last = &data.labels[data.labels.len() - 1];
    if first == last {
        let _ = writeln!(out, "{:>gutter$}  {first}", "");
    } else {
        let _ = writeln!(out, "{:>gutter$}  {first} .. {last}", "");
    }

    for (i, s) in series.iter().enumerate() {
        let marker = MARKERS[i % MARKERS.len()];
        if s.point_count() == 0 {
            let _ = writeln!(out, "  {marker} {}: {}", s.label, NO_DATA_MESSAGE.to_lowercase());
        } else {
            let _ = writeln!(out, "  {marker} {}", s.label);
        }
    }
    let _ = writeln!(out);
}

/// Row index from the bottom for `v` on a `lo..hi` axis.
#[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
fn scale_row(v: f64, lo: f64, hi: f64, height: usize) -> usize {
    if hi <= lo {
        return 0;
    }
    let t = ((v - lo) / (hi - lo)).clamp(0.0, 1.0);
    (t * (height - 1) as f64).round() as usize
}

fn format_tick(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutriter_core::chart::project;
    use nutriter_core::models::HistoryEntry;

    fn history() -> Vec<HistoryEntry> {
        vec![
            HistoryEntry {
                calories: 1000,
                ..HistoryEntry::empty("2024-01-01")
            },
            HistoryEntry {
                calories: 2000,
                ..HistoryEntry::empty("2024-01-02")
            },
        ]
    }

    #[test]
    fn test_scale_row() {
        assert_eq!(scale_row(0.0, 0.0, 10.0, 5), 0);
        assert_eq!(scale_row(10.0, 0.0, 10.0, 5), 4);
        assert_eq!(scale_row(5.0, 0.0, 10.0, 5), 2);
        assert_eq!(scale_row(50.0, 0.0, 10.0, 5), 4);
        assert_eq!(scale_row(1.0, 1.0, 1.0, 5), 0);
    }

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(5000.0), "5000");
        assert_eq!(format_tick(0.5), "0.50");
    }

    #[test]
    fn test_render_empty_chart() {
        let data = project(&history(), None, None, &[]);
        let data = ChartData {
            labels: Vec::new(),
            ..data
        };
        assert_eq!(render_chart(&data, 5), "No data in range\n");
    }

    #[test]
    fn test_render_calories_panel() {
        let data = project(&history(), None, None, &[SeriesKey::Calories]);
        let text = render_chart(&data, 5);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Calories (kcal)");
        assert_eq!(lines[1], "5000 ┤");
        assert_eq!(lines[3], "     │  *");
        assert_eq!(lines[4], "     │*");
        assert_eq!(lines[5], "   0 ┤");
        assert_eq!(lines[6], "     └────");
        assert_eq!(lines[7], "      2024-01-01 .. 2024-01-02");
        assert_eq!(lines[8], "  * Calories");
    }

    #[test]
    fn test_render_series_without_points() {
        let data = project(&history(), None, None, &[SeriesKey::Weight]);
        let text = render_chart(&data, 4);
        assert!(text.starts_with("Weight\n"));
        assert!(text.contains("* Weight: no data in range"));
        assert!(!text.lines().skip(1).take(4).any(|l| l.contains('*')));
    }

    #[test]
    fn test_render_one_panel_per_axis() {
        let data = project(
            &history(),
            None,
            None,
            &[SeriesKey::Protein, SeriesKey::Fat, SeriesKey::ProteinRatio],
        );
        let text = render_chart(&data, 4);
        assert!(text.contains("Macros (g)\n"));
        assert!(text.contains("Ratio\n"));
        assert!(text.contains("  * Protein (g)"));
        assert!(text.contains("  o Fat (g)"));
        assert!(!text.contains("Calories (kcal)"));
    }
}
