//! Fakes shared by the session tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use mathsolver_core::{
    CalculationRequest, CalculationResponse, GraphRequest, GraphSeries, PracticeProblem,
    PracticeRequest, RenderError, RenderableSeries, SolveService, SolverError, SolverResult,
};

use crate::presenter::{RenderedProblem, ResultPanel};
use crate::surface::{ChartHandle, MathRenderer, Notification, Surfaces};

/// Wraps fragments in angle brackets; rejects unbalanced braces.
pub struct BraceRenderer;

impl MathRenderer for BraceRenderer {
    fn render(&self, notation: &str) -> Result<String, RenderError> {
        let mut depth = 0i32;
        for (i, c) in notation.char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(RenderError::UnbalancedBraces(i));
                    }
                }
                _ => {}
            }
        }
        if depth != 0 {
            return Err(RenderError::UnbalancedBraces(notation.len()));
        }
        Ok(format!("<{notation}>"))
    }
}

#[derive(Default)]
pub struct RecordingSurfaces {
    pub loading: Vec<bool>,
    pub notifications: Vec<Notification>,
    pub shown: Vec<ResultPanel>,
    pub practice: Vec<Vec<RenderedProblem>>,
    pub charts_drawn: usize,
    pub live_charts: Vec<ChartHandle>,
    pub fail_charts: bool,
    pub(crate) next_handle: u64,
}

impl Surfaces for RecordingSurfaces {
    fn set_loading(&mut self, visible: bool) {
        self.loading.push(visible);
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    fn show_result(&mut self, panel: &ResultPanel) {
        self.shown.push(panel.clone());
    }

    fn show_practice(&mut self, problems: &[RenderedProblem]) {
        self.practice.push(problems.to_vec());
    }

    fn draw_chart(&mut self, _series: &[RenderableSeries]) -> Result<ChartHandle, RenderError> {
        if self.fail_charts {
            return Err(RenderError::Empty);
        }
        self.charts_drawn += 1;
        self.next_handle += 1;
        let handle = ChartHandle(self.next_handle);
        self.live_charts.push(handle);
        Ok(handle)
    }

    fn release_chart(&mut self, handle: ChartHandle) {
        self.live_charts.retain(|h| *h != handle);
    }
}

/// Scripted service: replies are popped in order, requests are recorded.
#[derive(Default)]
pub struct FakeService {
    pub replies: RefCell<VecDeque<SolverResult<CalculationResponse>>>,
    pub calls: RefCell<Vec<CalculationRequest>>,
    pub practice_reply: RefCell<Option<SolverResult<Vec<PracticeProblem>>>>,
    pub graph_reply: RefCell<Option<SolverResult<GraphSeries>>>,
    pub other_calls: RefCell<usize>,
}

impl FakeService {
    pub fn replying(reply: SolverResult<CalculationResponse>) -> Self {
        let svc = Self::default();
        svc.replies.borrow_mut().push_back(reply);
        svc
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl SolveService for FakeService {
    fn calculate(&self, request: &CalculationRequest) -> SolverResult<CalculationResponse> {
        self.calls.borrow_mut().push(request.clone());
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(SolverError::Transport("no scripted reply".into())))
    }

    fn practice(&self, _request: &PracticeRequest) -> SolverResult<Vec<PracticeProblem>> {
        *self.other_calls.borrow_mut() += 1;
        self.practice_reply
            .borrow_mut()
            .take()
            .unwrap_or_else(|| Err(SolverError::Transport("no scripted reply".into())))
    }

    fn graph(&self, _request: &GraphRequest) -> SolverResult<GraphSeries> {
        *self.other_calls.borrow_mut() += 1;
        self.graph_reply
            .borrow_mut()
            .take()
            .unwrap_or_else(|| Err(SolverError::Transport("no scripted reply".into())))
    }
}
