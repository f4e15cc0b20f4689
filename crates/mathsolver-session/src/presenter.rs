//! Response → rendered panel.
//!
//! Rendering never fails from the caller's point of view: a fragment the math
//! renderer rejects is shown as plain text, and a chart the surface cannot
//! draw leaves the graph hidden.

use tracing::warn;

use mathsolver_core::{
    build_datasets, CalculationResponse, Operation, PracticeProblem, RenderableSeries,
    SolveResult, Step,
};

use crate::state::ClientState;
use crate::surface::{MathRenderer, Surfaces};

/// One rendered fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Output of the math renderer, display mode.
    Math(String),
    /// Fallback text when rendering failed.
    Plain(String),
}

impl Block {
    pub fn text(&self) -> &str {
        match self {
            Self::Math(s) | Self::Plain(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedStep {
    /// 1-based position in the solution.
    pub number: usize,
    pub label: String,
    pub expression: Block,
    pub explanation: String,
}

/// The full rendered result of one calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPanel {
    pub operation: Operation,
    pub result: Vec<Block>,
    /// Empty means no step panel.
    pub steps: Vec<RenderedStep>,
    /// Empty means the graph surface stays hidden.
    pub graph: Vec<RenderableSeries>,
}

impl ResultPanel {
    pub fn has_steps(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn has_graph(&self) -> bool {
        !self.graph.is_empty()
    }

    /// Result text as shown, one line per block.
    pub fn result_text(&self) -> String {
        self.result
            .iter()
            .map(Block::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedProblem {
    pub number: usize,
    pub problem: Block,
    pub solution: Block,
    pub hint: String,
}

pub struct Presenter<'a> {
    renderer: &'a dyn MathRenderer,
}

impl<'a> Presenter<'a> {
    pub fn new(renderer: &'a dyn MathRenderer) -> Self {
        Self { renderer }
    }

    /// Render `response` for `operation` and show it.
    pub fn present(
        &self,
        state: &mut ClientState,
        surfaces: &mut dyn Surfaces,
        operation: Operation,
        response: &CalculationResponse,
    ) -> ResultPanel {
        let result = self.render_result(&response.result);
        let steps = response
            .steps
            .as_deref()
            .map(|steps| self.render_steps(steps))
            .unwrap_or_default();

        let series = match &response.graph {
            Some(payload) => build_datasets(Some(payload)),
            None => Vec::new(),
        };
        let graph = self.show_graph(state, surfaces, series);

        let panel = ResultPanel {
            operation,
            result,
            steps,
            graph,
        };
        surfaces.show_result(&panel);
        panel
    }

    /// Replace whatever chart is on the canvas with `series`. An empty list just
    /// clears it. Returns the series actually drawn.
    pub fn show_graph(
        &self,
        state: &mut ClientState,
        surfaces: &mut dyn Surfaces,
        series: Vec<RenderableSeries>,
    ) -> Vec<RenderableSeries> {
        if let Some(prev) = state.chart.take() {
            surfaces.release_chart(prev);
        }
        if series.is_empty() {
            return series;
        }
        match surfaces.draw_chart(&series) {
            Ok(handle) => {
                state.chart = Some(handle);
                series
            }
            Err(e) => {
                warn!("chart rendering failed, graph hidden: {e}");
                Vec::new()
            }
        }
    }

    pub fn render_result(&self, result: &SolveResult) -> Vec<Block> {
        match result {
            SolveResult::Single(notation) => vec![self.render_fragment(notation)],
            SolveResult::Multi(items) => items
                .iter()
                .enumerate()
                .map(|(i, notation)| match self.renderer.render(notation) {
                    Ok(text) => Block::Math(text),
                    Err(e) => {
                        warn!("solution {} not renderable: {e}", i + 1);
                        Block::Plain(format!("Solution {}: {notation}", i + 1))
                    }
                })
                .collect(),
        }
    }

    pub fn render_steps(&self, steps: &[Step]) -> Vec<RenderedStep> {
        steps
            .iter()
            .enumerate()
            .map(|(i, step)| RenderedStep {
                number: i + 1,
                label: step.step.clone(),
                expression: self.render_fragment(&step.expression),
                explanation: step.explanation.clone(),
            })
            .collect()
    }

    pub fn render_practice(&self, problems: &[PracticeProblem]) -> Vec<RenderedProblem> {
        problems
            .iter()
            .enumerate()
            .map(|(i, p)| RenderedProblem {
                number: i + 1,
                problem: self.render_fragment(&p.problem),
                solution: self.render_fragment(&p.solution),
                hint: p.hint.clone(),
            })
            .collect()
    }

    /// Render one fragment, falling back to the raw notation.
    pub fn render_fragment(&self, notation: &str) -> Block {
        match self.renderer.render(notation) {
            Ok(text) => Block::Math(text),
            Err(e) => {
                warn!("falling back to plain text for {notation:?}: {e}");
                Block::Plain(notation.to_string())
            }
        }
    }
}
