//! Line-oriented terminal rendition of the client surfaces.

use std::io::{self, IsTerminal, Stderr, Stdout, Write};

use mathsolver_core::{HistoryEntry, RenderError, RenderableSeries};
use mathsolver_session::{
    ChartHandle, Level, Notification, RenderedProblem, ResultPanel, Surfaces,
};

use crate::chart::render_chart;

/// Expressions longer than this are cut in the history list.
pub const HISTORY_PREVIEW_CHARS: usize = 40;

/// Writes results to `out` and the loading indicator to `err`.
///
/// A drawn chart is held until the result panel is printed, so it appears
/// under the steps the way the graph sits under the result.
pub struct TerminalSurfaces<O: Write, E: Write> {
    out: O,
    err: E,
    chart_width: u16,
    chart_height: u16,
    show_loading: bool,
    reveal_solutions: bool,
    pending_chart: Option<(ChartHandle, Vec<String>)>,
    next_handle: u64,
}

impl TerminalSurfaces<Stdout, Stderr> {
    pub fn stdio(chart_width: u16, chart_height: u16) -> Self {
        let err = io::stderr();
        let show_loading = err.is_terminal();
        Self::new(io::stdout(), err, chart_width, chart_height).with_loading(show_loading)
    }
}

impl<O: Write, E: Write> TerminalSurfaces<O, E> {
    pub fn new(out: O, err: E, chart_width: u16, chart_height: u16) -> Self {
        Self {
            out,
            err,
            chart_width,
            chart_height,
            show_loading: false,
            reveal_solutions: false,
            pending_chart: None,
            next_handle: 0,
        }
    }

    pub fn with_loading(mut self, show: bool) -> Self {
        self.show_loading = show;
        self
    }

    pub fn reveal_solutions(mut self, reveal: bool) -> Self {
        self.reveal_solutions = reveal;
        self
    }

    /// Print a chart that was drawn outside a result panel (plots).
    pub fn flush_chart(&mut self) {
        if let Some((_, lines)) = &self.pending_chart {
            for line in lines {
                let _ = writeln!(self.out, "{line}");
            }
        }
        self.pending_chart = None;
    }

    pub fn print_history(&mut self, entries: &[HistoryEntry]) {
        if entries.is_empty() {
            let _ = writeln!(self.out, "No calculations yet.");
            return;
        }
        for entry in entries {
            let _ = writeln!(self.out, "{}", format_history_line(entry));
        }
    }

    pub fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
    }

    #[cfg(test)]
    pub fn into_parts(self) -> (O, E) {
        (self.out, self.err)
    }
}

impl<O: Write, E: Write> Surfaces for TerminalSurfaces<O, E> {
    fn set_loading(&mut self, visible: bool) {
        if !self.show_loading {
            return;
        }
        if visible {
            let _ = write!(self.err, "Calculating...\r");
        } else {
            let _ = write!(self.err, "              \r");
        }
        let _ = self.err.flush();
    }

    fn notify(&mut self, notification: Notification) {
        match notification.level {
            Level::Success => {
                let _ = writeln!(self.out, "✓ {}", notification.message);
            }
            Level::Error => {
                let _ = writeln!(self.err, "✗ {}", notification.message);
            }
        }
    }

    fn show_result(&mut self, panel: &ResultPanel) {
        let _ = writeln!(self.out, "{} result:", panel.operation.title());
        for block in &panel.result {
            let _ = writeln!(self.out, "  {}", block.text());
        }
        if panel.has_steps() {
            let _ = writeln!(self.out);
            let _ = writeln!(self.out, "Steps:");
            for step in &panel.steps {
                let _ = writeln!(self.out, "  Step {}: {}", step.number, step.label);
                let _ = writeln!(self.out, "    {}", step.expression.text());
                if !step.explanation.is_empty() {
                    let _ = writeln!(self.out, "    {}", step.explanation);
                }
            }
        }
        if panel.has_graph() {
            let _ = writeln!(self.out);
            let legend: Vec<&str> = panel.graph.iter().map(|s| s.label.as_str()).collect();
            let _ = writeln!(self.out, "Graph: {}", legend.join(", "));
            self.flush_chart();
        }
    }

    fn show_practice(&mut self, problems: &[RenderedProblem]) {
        for p in problems {
            let _ = writeln!(self.out, "Problem {}: {}", p.number, p.problem.text());
            if !p.hint.is_empty() {
                let _ = writeln!(self.out, "  hint: {}", p.hint);
            }
            if self.reveal_solutions {
                let _ = writeln!(self.out, "  solution: {}", p.solution.text());
            }
        }
    }

    fn draw_chart(&mut self, series: &[RenderableSeries]) -> Result<ChartHandle, RenderError> {
        let lines = render_chart(series, self.chart_width, self.chart_height)?;
        self.next_handle += 1;
        let handle = ChartHandle(self.next_handle);
        self.pending_chart = Some((handle, lines));
        Ok(handle)
    }

    fn release_chart(&mut self, handle: ChartHandle) {
        if matches!(&self.pending_chart, Some((h, _)) if *h == handle) {
            self.pending_chart = None;
        }
    }
}

/// `id  type  expression = result  (time)`, expression cut for the list view.
pub fn format_history_line(entry: &HistoryEntry) -> String {
    format!(
        "{}  {:<10} {} = {}  ({})",
        entry.id,
        entry.kind.title(),
        truncate(&entry.expression, HISTORY_PREVIEW_CHARS),
        entry.result,
        local_time(&entry.timestamp)
    )
}

fn local_time(timestamp: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(timestamp)
        .map(|t| {
            t.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|_| timestamp.to_string())
}

/// Cut to `max` characters, appending an ellipsis when anything was dropped.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathsolver_core::{GraphSeries, Operation, SeriesKey};
    use mathsolver_session::{Block, RenderedStep};

    fn surfaces() -> TerminalSurfaces<Vec<u8>, Vec<u8>> {
        TerminalSurfaces::new(Vec::new(), Vec::new(), 40, 10)
    }

    fn output(s: TerminalSurfaces<Vec<u8>, Vec<u8>>) -> (String, String) {
        let (out, err) = s.into_parts();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    fn parabola() -> RenderableSeries {
        RenderableSeries::from_series(
            SeriesKey::Original,
            GraphSeries {
                label: "f(x)".into(),
                x: vec![-2.0, -1.0, 0.0, 1.0, 2.0],
                y: vec![4.0, 1.0, 0.0, 1.0, 4.0],
            },
        )
    }

    fn panel(graph: Vec<RenderableSeries>) -> ResultPanel {
        ResultPanel {
            operation: Operation::Derivative,
            result: vec![Block::Math("2 x".into())],
            steps: vec![RenderedStep {
                number: 1,
                label: "Power Rule".into(),
                expression: Block::Plain("2 x".into()),
                explanation: "Bring the exponent down".into(),
            }],
            graph,
        }
    }

    #[test]
    fn test_result_with_steps() {
        let mut s = surfaces();
        s.show_result(&panel(Vec::new()));
        let (out, err) = output(s);
        assert!(out.starts_with("Derivative result:\n  2 x\n"));
        assert!(out.contains("Step 1: Power Rule"));
        assert!(out.contains("Bring the exponent down"));
        assert!(!out.contains("Graph:"));
        assert!(err.is_empty());
    }

    #[test]
    fn test_chart_printed_after_result() {
        let mut s = surfaces();
        let series = vec![parabola()];
        s.draw_chart(&series).unwrap();
        s.show_result(&panel(series));
        let (out, _) = output(s);
        let graph_at = out.find("Graph: f(x)").unwrap();
        assert!(out.find("Step 1").unwrap() < graph_at);
        assert!(out.lines().count() > 10);
    }

    #[test]
    fn test_released_chart_not_printed() {
        let mut s = surfaces();
        let h = s.draw_chart(&[parabola()]).unwrap();
        s.release_chart(h);
        s.flush_chart();
        let (out, _) = output(s);
        assert!(out.is_empty());
    }

    #[test]
    fn test_stale_release_keeps_newer_chart() {
        let mut s = surfaces();
        let first = s.draw_chart(&[parabola()]).unwrap();
        let second = s.draw_chart(&[parabola()]).unwrap();
        assert_ne!(first, second);
        s.release_chart(first);
        s.flush_chart();
        let (out, _) = output(s);
        assert!(!out.is_empty());
    }

    #[test]
    fn test_notifications_split_streams() {
        let mut s = surfaces();
        s.notify(Notification::success("Derivative calculated!"));
        s.notify(Notification::error("Invalid expression"));
        let (out, err) = output(s);
        assert_eq!(out, "✓ Derivative calculated!\n");
        assert_eq!(err, "✗ Invalid expression\n");
    }

    #[test]
    fn test_loading_silent_when_disabled() {
        let mut s = surfaces();
        s.set_loading(true);
        s.set_loading(false);
        let (_, err) = output(s);
        assert!(err.is_empty());

        let mut s = surfaces().with_loading(true);
        s.set_loading(true);
        let (_, err) = output(s);
        assert!(err.contains("Calculating..."));
    }

    #[test]
    fn test_practice_solutions_hidden_unless_revealed() {
        let problems = vec![RenderedProblem {
            number: 1,
            problem: Block::Math("x²".into()),
            solution: Block::Math("2 x".into()),
            hint: "Power rule".into(),
        }];

        let mut s = surfaces();
        s.show_practice(&problems);
        let (out, _) = output(s);
        assert!(out.contains("Problem 1: x²"));
        assert!(out.contains("hint: Power rule"));
        assert!(!out.contains("solution"));

        let mut s = surfaces().reveal_solutions(true);
        s.show_practice(&problems);
        let (out, _) = output(s);
        assert!(out.contains("solution: 2 x"));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 40), "short");
        let long = "é".repeat(45);
        let cut = truncate(&long, 40);
        assert_eq!(cut.chars().count(), 43);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_history_line() {
        let entry = HistoryEntry {
            id: 7,
            kind: Operation::Integral,
            expression: "x".repeat(50),
            result: "y".into(),
            timestamp: "not a time".into(),
        };
        let line = format_history_line(&entry);
        assert!(line.starts_with("7  Integral"));
        assert!(line.contains(&format!("{}... = y", "x".repeat(40))));
        assert!(line.ends_with("(not a time)"));
    }

    #[test]
    fn test_empty_history() {
        let mut s = surfaces();
        s.print_history(&[]);
        let (out, _) = output(s);
        assert_eq!(out, "No calculations yet.\n");
    }
}
