//! Off-screen chart rendering with ratatui.
//!
//! The chart widget is drawn into a detached `Buffer` and read back as plain
//! text lines, so one-shot commands can print it without taking over the
//! terminal.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::{Axis, Chart, Dataset, GraphType, Widget};

use mathsolver_core::{RenderError, RenderableSeries};

const MIN_WIDTH: u16 = 20;
const MIN_HEIGHT: u16 = 6;

/// Render `series` into `width` x `height` cells. Non-finite samples are
/// dropped; a chart with no finite sample at all cannot be drawn.
pub fn render_chart(
    series: &[RenderableSeries],
    width: u16,
    height: u16,
) -> Result<Vec<String>, RenderError> {
    let points: Vec<Vec<(f64, f64)>> = series
        .iter()
        .map(|s| {
            s.points
                .iter()
                .copied()
                .filter(|(x, y)| x.is_finite() && y.is_finite())
                .collect()
        })
        .collect();

    let (x_bounds, y_bounds) = bounds(points.iter().flatten()).ok_or(RenderError::Empty)?;

    let datasets: Vec<Dataset> = series
        .iter()
        .zip(&points)
        .map(|(s, data)| {
            let (r, g, b) = s.style.color;
            Dataset::default()
                .name(s.label.clone())
                .marker(Marker::Braille)
                .graph_type(if s.style.fill {
                    GraphType::Bar
                } else {
                    GraphType::Line
                })
                .style(Style::default().fg(Color::Rgb(r, g, b)))
                .data(data)
        })
        .collect();

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .bounds(x_bounds)
                .labels(axis_labels(x_bounds)),
        )
        .y_axis(
            Axis::default()
                .bounds(y_bounds)
                .labels(axis_labels(y_bounds)),
        );

    let area = Rect::new(0, 0, width.max(MIN_WIDTH), height.max(MIN_HEIGHT));
    let mut buf = Buffer::empty(area);
    chart.render(area, &mut buf);

    Ok(buffer_lines(&buf))
}

/// Data extent of all points, padded so flat series still get a visible range.
fn bounds<'a>(points: impl Iterator<Item = &'a (f64, f64)>) -> Option<([f64; 2], [f64; 2])> {
    let mut x = [f64::INFINITY, f64::NEG_INFINITY];
    let mut y = [f64::INFINITY, f64::NEG_INFINITY];
    let mut any = false;
    for &(px, py) in points {
        any = true;
        x = [x[0].min(px), x[1].max(px)];
        y = [y[0].min(py), y[1].max(py)];
    }
    if !any {
        return None;
    }
    Some((pad(x), pad(y)))
}

fn pad([lo, hi]: [f64; 2]) -> [f64; 2] {
    if hi - lo < f64::EPSILON {
        [lo - 1.0, hi + 1.0]
    } else {
        [lo, hi]
    }
}

fn axis_labels([lo, hi]: [f64; 2]) -> Vec<String> {
    let mid = (lo + hi) / 2.0;
    [lo, mid, hi].iter().map(|v| format_tick(*v)).collect()
}

fn format_tick(v: f64) -> String {
    if v.fract().abs() < 1e-9 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

fn buffer_lines(buf: &Buffer) -> Vec<String> {
    let area = buf.area;
    (area.top()..area.bottom())
        .map(|y| {
            let line: String = (area.left()..area.right())
                .map(|x| buf.cell((x, y)).map_or(" ", |c| c.symbol()))
                .collect();
            line.trim_end().to_string()
        })
        .collect()
}
