//! # ASCII Tide Chart
//!
//! Terminal rendering of the minute-resolution tide series for development
//! and for checking a forecast by eye (`--stdout`). The chart covers 12 hours
//! either side of "now" with one column per 10 minutes.
//!
//! Markers:
//! - `X`: now
//! - `H` / `L`: the next high / low tide
//! - `•`: the tide curve

use crate::forecast::TideOutlook;

const ROWS: usize = 20;
const Y_AXIS_WIDTH: usize = 6; // Space for Y-axis labels
const HALF_WINDOW_MINUTES: i64 = 12 * 60;
const COLUMN_MINUTES: i64 = 10;

/// Build the chart as text lines (without printing).
pub fn chart_lines(outlook: &TideOutlook) -> Vec<String> {
    let series = &outlook.series;
    if series.len() < 2 {
        return vec!["(no data)".to_string()];
    }

    let step_secs = (series[1].time - series[0].time).num_seconds().max(1);
    let stride = (COLUMN_MINUTES * 60 / step_secs).max(1);
    let half_columns = HALF_WINDOW_MINUTES / COLUMN_MINUTES;
    let columns = (2 * half_columns + 1) as usize;

    // Series index shown in each column, if the series covers it
    let index_at = |column: usize| {
        let i = outlook.now_index as i64 + (column as i64 - half_columns) * stride;
        (0..series.len() as i64).contains(&i).then_some(i as usize)
    };

    let (min, max) = (0..columns)
        .filter_map(index_at)
        .map(|i| series[i].level)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    let range = (max - min).max(1e-6);
    let level_to_row = |level: f64| {
        let normalized = (level - min) / range;
        ((1.0 - normalized) * (ROWS as f64 - 1.0)).round() as usize
    };

    let mut grid = vec![vec![' '; columns + Y_AXIS_WIDTH]; ROWS];

    // Y-axis labels every half metre (or every metre on big ranges)
    let level_step = if range > 4.0 { 1.0 } else { 0.5 };
    let mut label_level = (min / level_step).ceil() * level_step;
    while label_level <= max {
        let row = level_to_row(label_level).min(ROWS - 1);
        let label = format!("{:>4.1}", label_level);
        for (i, ch) in label.chars().take(Y_AXIS_WIDTH - 2).enumerate() {
            grid[row][i] = ch;
        }
        grid[row][Y_AXIS_WIDTH - 1] = '│';
        label_level += level_step;
    }

    let state = &outlook.state;
    let mark_column = |time: chrono::DateTime<chrono::Utc>| {
        let minutes = (time - series[outlook.now_index].time).num_minutes();
        let column = half_columns + (minutes as f64 / COLUMN_MINUTES as f64).round() as i64;
        (0..columns as i64).contains(&column).then_some(column as usize)
    };
    let high_column = mark_column(state.high.time);
    let low_column = mark_column(state.low.time);

    for column in 0..columns {
        let Some(i) = index_at(column) else {
            continue;
        };
        let row = level_to_row(series[i].level).min(ROWS - 1);
        let ch = if column as i64 == half_columns {
            'X'
        } else if Some(column) == high_column {
            'H'
        } else if Some(column) == low_column {
            'L'
        } else {
            '•'
        };
        grid[row][column + Y_AXIS_WIDTH] = ch;
    }

    let mut lines: Vec<String> = grid
        .into_iter()
        .map(|row| row.into_iter().collect::<String>().trim_end().to_string())
        .collect();

    // Hour ticks and labels below the chart
    let padding = " ".repeat(Y_AXIS_WIDTH);
    let ticks: String = (0..columns)
        .map(|c| if c % 6 == 0 { '|' } else { ' ' })
        .collect();
    lines.push(format!("{padding}{ticks}"));

    let now_text = "Now";
    let left_width = (half_columns as usize).saturating_sub(now_text.len() / 2);
    let right_width = columns - left_width - now_text.len();
    lines.push(format!(
        "{padding}{:<left_width$}{now_text}{:>right_width$}",
        "-12h", "+12h"
    ));

    lines.push(format!(
        "{} tide, {:.2} m now. HIGH {:.2} m at {}, LOW {:.2} m at {}{}",
        state.trend.label(),
        state.level,
        state.high.level,
        state.high.time.format("%H:%M UTC"),
        state.low.level,
        state.low.time.format("%H:%M UTC"),
        if state.windowed {
            " (storm fallback)"
        } else {
            ""
        }
    ));

    lines
}

/// Render the tide outlook to the terminal.
pub fn draw_ascii(outlook: &TideOutlook) {
    for line in chart_lines(outlook) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::tidal_outlook;
    use crate::synthetic::TideModel;
    use crate::TideParams;
    use chrono::{Duration, TimeZone, Utc};

    fn outlook() -> TideOutlook {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 24, 0, 0, 0).unwrap();
        let hourly = TideModel::default().hourly_series(t0, 36);
        tidal_outlook(&hourly, t0 + Duration::hours(14), &TideParams::default()).unwrap()
    }

    #[test]
    fn chart_has_one_now_marker() {
        let lines = chart_lines(&outlook());
        let chart = &lines[..ROWS];
        let now_marks: usize = chart
            .iter()
            .map(|l| l.chars().filter(|&c| c == 'X').count())
            .sum();
        assert_eq!(now_marks, 1);
    }

    #[test]
    fn chart_marks_next_high_and_low() {
        let lines = chart_lines(&outlook());
        let chart = lines[..ROWS].join("\n");
        assert!(chart.contains('H'));
        assert!(chart.contains('L'));
    }

    #[test]
    fn chart_summary_line() {
        let o = outlook();
        let lines = chart_lines(&o);
        let summary = lines.last().unwrap();
        assert!(summary.starts_with(o.state.trend.label()));
        assert!(summary.contains("HIGH"));
        assert!(!summary.contains("storm"));
    }

    #[test]
    fn chart_width_matches_window() {
        let lines = chart_lines(&outlook());
        let ticks = &lines[ROWS];
        assert_eq!(ticks.chars().count(), Y_AXIS_WIDTH + 145);
    }
}
