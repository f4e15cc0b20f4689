//! Calculation lifecycle: validate, submit, settle.
//!
//! Per tool: `Idle -> Submitting -> (Succeeded | Failed) -> Idle`. Overlapping
//! submits for the same tool are allowed; only the latest one is applied and
//! older replies are dropped when they arrive.

use tracing::{debug, warn};

use mathsolver_core::{
    build_request, CalculationRequest, CalculationResponse, FormState, GraphRequest,
    HistoryEntry, HistoryStore, Operation, PracticeRequest, RenderableSeries, SeriesKey,
    SolveService, SolverError, SolverResult,
};

use crate::presenter::{Presenter, RenderedProblem, ResultPanel};
use crate::state::{ClientState, Phase, Ticket};
use crate::surface::{MathRenderer, Notification, Surfaces};

pub const HISTORY_ENTRY_MISSING: &str = "History entry not found";
pub const LOADED_FROM_HISTORY: &str = "Loaded from history";
pub const PRACTICE_READY: &str = "Practice problems generated!";
pub const DEFAULT_PLOT_LABEL: &str = "f(x)";

/// How a submit ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Result shown. `entry` is `None` only if the history write failed.
    Succeeded {
        panel: ResultPanel,
        entry: Option<HistoryEntry>,
    },
    /// Service or transport failure; the message was shown to the user.
    Failed(String),
    /// Input rejected before any network call.
    Rejected(String),
    /// A newer submit for the same tool superseded this one.
    Discarded,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

pub struct Orchestrator<'a> {
    service: &'a dyn SolveService,
    history: &'a dyn HistoryStore,
    presenter: Presenter<'a>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        service: &'a dyn SolveService,
        history: &'a dyn HistoryStore,
        renderer: &'a dyn MathRenderer,
    ) -> Self {
        Self {
            service,
            history,
            presenter: Presenter::new(renderer),
        }
    }

    pub fn presenter(&self) -> &Presenter<'a> {
        &self.presenter
    }

    /// Build a request from `form` and submit it. Blank input is reported
    /// without touching the network or the loading indicator.
    pub fn submit_form(
        &self,
        state: &mut ClientState,
        surfaces: &mut dyn Surfaces,
        tool: Operation,
        form: &FormState,
    ) -> Outcome {
        match build_request(tool, form) {
            Ok(request) => self.submit(state, surfaces, request),
            Err(e) => {
                let message = e.to_string();
                surfaces.notify(Notification::error(message.clone()));
                Outcome::Rejected(message)
            }
        }
    }

    /// One full cycle: exactly one service call, no retry.
    pub fn submit(
        &self,
        state: &mut ClientState,
        surfaces: &mut dyn Surfaces,
        request: CalculationRequest,
    ) -> Outcome {
        let ticket = self.begin(state, surfaces, request);
        let reply = self.service.calculate(ticket.request());
        self.finish(state, surfaces, ticket, reply)
    }

    /// Enter `Submitting` and raise the loading indicator.
    pub fn begin(
        &self,
        state: &mut ClientState,
        surfaces: &mut dyn Surfaces,
        request: CalculationRequest,
    ) -> Ticket {
        let ticket = state.open_ticket(request);
        debug!(
            "{} #{}: idle -> submitting",
            ticket.operation(),
            ticket.generation()
        );
        raise_loading(state, surfaces);
        ticket
    }

    /// Apply the service reply for `ticket`, return to `Idle` and lower the
    /// loading indicator.
    pub fn finish(
        &self,
        state: &mut ClientState,
        surfaces: &mut dyn Surfaces,
        ticket: Ticket,
        reply: SolverResult<CalculationResponse>,
    ) -> Outcome {
        let outcome = if !state.is_latest(&ticket) {
            debug!(
                "{} #{}: superseded, reply dropped",
                ticket.operation(),
                ticket.generation()
            );
            state.settle(&ticket, Phase::Idle);
            Outcome::Discarded
        } else {
            match reply {
                Ok(response) => {
                    let outcome = self.apply_success(state, surfaces, &ticket, &response);
                    state.settle(&ticket, Phase::Succeeded);
                    outcome
                }
                Err(e) => {
                    let message = failure_message(e);
                    surfaces.notify(Notification::error(message.clone()));
                    state.settle(&ticket, Phase::Failed);
                    Outcome::Failed(message)
                }
            }
        };
        if !matches!(outcome, Outcome::Discarded) {
            debug!(
                "{} #{}: -> {:?} -> idle",
                ticket.operation(),
                ticket.generation(),
                state.last_settled(ticket.operation())
            );
        }
        lower_loading(state, surfaces);
        outcome
    }

    fn apply_success(
        &self,
        state: &mut ClientState,
        surfaces: &mut dyn Surfaces,
        ticket: &Ticket,
        response: &CalculationResponse,
    ) -> Outcome {
        let operation = ticket.operation();
        let panel = self
            .presenter
            .present(state, surfaces, operation, response);

        let entry = match self.history.append(
            operation,
            &ticket.request().expression,
            &response.result.to_history_text(),
        ) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("history not updated: {e}");
                None
            }
        };

        surfaces.notify(Notification::success(format!(
            "{} calculated!",
            operation.title()
        )));
        Outcome::Succeeded { panel, entry }
    }

    /// Look up a history entry and switch to its tool. The caller puts the
    /// expression into that tool's form.
    pub fn load_from_history(
        &self,
        state: &mut ClientState,
        surfaces: &mut dyn Surfaces,
        id: i64,
    ) -> Option<HistoryEntry> {
        let entry = match self.history.get(id) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                surfaces.notify(Notification::error(HISTORY_ENTRY_MISSING));
                return None;
            }
            Err(e) => {
                warn!("history lookup failed: {e}");
                surfaces.notify(Notification::error(HISTORY_ENTRY_MISSING));
                return None;
            }
        };
        state.switch_tool(entry.kind);
        surfaces.notify(Notification::success(LOADED_FROM_HISTORY));
        Some(entry)
    }

    /// Load an entry into a fresh form for its tool and run it again.
    pub fn rerun(&self, state: &mut ClientState, surfaces: &mut dyn Surfaces, id: i64) -> Outcome {
        match self.load_from_history(state, surfaces, id) {
            Some(entry) => {
                let form = FormState::expression(entry.expression);
                self.submit_form(state, surfaces, entry.kind, &form)
            }
            None => Outcome::Rejected(HISTORY_ENTRY_MISSING.into()),
        }
    }

    /// Fetch and show practice problems. `None` when the request failed.
    pub fn practice(
        &self,
        state: &mut ClientState,
        surfaces: &mut dyn Surfaces,
        request: &PracticeRequest,
    ) -> Option<Vec<RenderedProblem>> {
        state.begin_task();
        raise_loading(state, surfaces);

        let shown = match self.service.practice(request) {
            Ok(problems) => {
                let rendered = self.presenter.render_practice(&problems);
                surfaces.show_practice(&rendered);
                surfaces.notify(Notification::success(PRACTICE_READY));
                Some(rendered)
            }
            Err(e) => {
                surfaces.notify(Notification::error(failure_message(e)));
                None
            }
        };

        state.end_task();
        lower_loading(state, surfaces);
        shown
    }

    /// Sample an expression through the service and draw it on the canvas.
    pub fn plot(
        &self,
        state: &mut ClientState,
        surfaces: &mut dyn Surfaces,
        request: &GraphRequest,
    ) -> Option<Vec<RenderableSeries>> {
        state.begin_task();
        raise_loading(state, surfaces);

        let drawn = match self.service.graph(request) {
            Ok(mut series) => {
                if series.label.is_empty() {
                    series.label = DEFAULT_PLOT_LABEL.into();
                }
                let series = vec![RenderableSeries::from_series(SeriesKey::Function, series)];
                Some(self.presenter.show_graph(state, surfaces, series))
            }
            Err(e) => {
                surfaces.notify(Notification::error(failure_message(e)));
                None
            }
        };

        state.end_task();
        lower_loading(state, surfaces);
        drawn
    }
}

/// Raise the indicator only for the first request in flight.
fn raise_loading(state: &ClientState, surfaces: &mut dyn Surfaces) {
    if state.in_flight() == 1 {
        surfaces.set_loading(true);
    }
}

/// Lower the indicator once nothing is in flight.
fn lower_loading(state: &ClientState, surfaces: &mut dyn Surfaces) {
    if !state.is_loading() {
        surfaces.set_loading(false);
    }
}

fn failure_message(e: SolverError) -> String {
    if !e.is_user_facing() {
        warn!("unexpected failure: {e}");
    }
    e.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Level;
    use crate::test_support::{BraceRenderer, FakeService, RecordingSurfaces};
    use mathsolver_core::{GraphSeries, PracticeProblem, SolveResult, Step};
    use mathsolver_store::SqliteStore;

    fn derivative_request(expr: &str) -> CalculationRequest {
        build_request(Operation::Derivative, &FormState::expression(expr)).unwrap()
    }

    fn power_rule_response() -> CalculationResponse {
        CalculationResponse {
            result: SolveResult::Single("2x".into()),
            steps: Some(vec![Step {
                step: "Power Rule".into(),
                expression: "2x".into(),
                explanation: "Bring the exponent down".into(),
            }]),
            graph: None,
        }
    }

    #[test]
    fn test_derivative_scenario() {
        let service = FakeService::replying(Ok(power_rule_response()));
        let history = SqliteStore::in_memory().unwrap();
        let orch = Orchestrator::new(&service, &history, &BraceRenderer);
        let mut state = ClientState::new();
        let mut surfaces = RecordingSurfaces::default();

        let outcome = orch.submit(&mut state, &mut surfaces, derivative_request("x^2"));

        let Outcome::Succeeded { panel, entry } = outcome else {
            panic!("expected success");
        };
        assert_eq!(panel.result_text(), "<2x>");
        assert_eq!(panel.steps.len(), 1);
        assert_eq!(panel.steps[0].label, "Power Rule");

        let entry = entry.unwrap();
        assert_eq!(entry.kind, Operation::Derivative);
        assert_eq!(entry.expression, "x^2");
        assert_eq!(entry.result, "2x");
        assert_eq!(history.all().unwrap(), vec![entry]);

        assert_eq!(service.call_count(), 1);
        assert_eq!(surfaces.loading, vec![true, false]);
        assert_eq!(
            surfaces.notifications,
            vec![Notification::success("Derivative calculated!")]
        );
        assert_eq!(state.phase(Operation::Derivative), Phase::Idle);
        assert_eq!(
            state.last_settled(Operation::Derivative),
            Some(Phase::Succeeded)
        );
    }

    #[test]
    fn test_empty_expression_scenario() {
        let service = FakeService::default();
        let history = SqliteStore::in_memory().unwrap();
        let orch = Orchestrator::new(&service, &history, &BraceRenderer);
        let mut state = ClientState::new();
        let mut surfaces = RecordingSurfaces::default();

        let outcome = orch.submit_form(
            &mut state,
            &mut surfaces,
            Operation::Integral,
            &FormState::expression("   "),
        );

        assert_eq!(outcome, Outcome::Rejected("Please enter an expression".into()));
        assert_eq!(service.call_count(), 0);
        assert!(surfaces.loading.is_empty());
        assert_eq!(surfaces.notifications.len(), 1);
        assert_eq!(surfaces.notifications[0].level, Level::Error);
        assert!(history.all().unwrap().is_empty());
        assert_eq!(state.phase(Operation::Integral), Phase::Idle);
    }

    #[test]
    fn test_service_error_scenario() {
        let service =
            FakeService::replying(Err(SolverError::Transport("Invalid syntax".into())));
        let history = SqliteStore::in_memory().unwrap();
        let orch = Orchestrator::new(&service, &history, &BraceRenderer);
        let mut state = ClientState::new();
        let mut surfaces = RecordingSurfaces::default();

        let outcome = orch.submit(&mut state, &mut surfaces, derivative_request("x^^2"));

        assert_eq!(outcome, Outcome::Failed("Invalid syntax".into()));
        assert_eq!(
            surfaces.notifications,
            vec![Notification::error("Invalid syntax")]
        );
        assert_eq!(surfaces.loading, vec![true, false]);
        assert!(!state.is_loading());
        assert!(history.all().unwrap().is_empty());
        assert!(surfaces.shown.is_empty());
        assert_eq!(state.last_settled(Operation::Derivative), Some(Phase::Failed));
        assert_eq!(state.phase(Operation::Derivative), Phase::Idle);
    }

    #[test]
    fn test_loading_raised_then_lowered_for_every_response_shape() {
        let responses = vec![
            CalculationResponse::single("1"),
            CalculationResponse {
                result: SolveResult::Multi(vec!["-1".into(), "1".into()]),
                steps: None,
                graph: None,
            },
            CalculationResponse {
                result: SolveResult::Single("{".into()),
                steps: Some(vec![]),
                graph: Some(serde_json::json!({"function": {"label": "f", "x": [0.0], "y": [1.0]}})),
            },
        ];
        for resp in responses {
            let service = FakeService::replying(Ok(resp));
            let history = SqliteStore::in_memory().unwrap();
            let orch = Orchestrator::new(&service, &history, &BraceRenderer);
            let mut state = ClientState::new();
            let mut surfaces = RecordingSurfaces::default();

            assert!(orch
                .submit(&mut state, &mut surfaces, derivative_request("x"))
                .is_success());
            assert_eq!(surfaces.loading, vec![true, false]);
        }
    }

    #[test]
    fn test_multi_result_stored_as_single_composite_entry() {
        let service = FakeService::replying(Ok(CalculationResponse {
            result: SolveResult::Multi(vec!["-1".into(), "1".into()]),
            steps: None,
            graph: None,
        }));
        let history = SqliteStore::in_memory().unwrap();
        let orch = Orchestrator::new(&service, &history, &BraceRenderer);
        let mut state = ClientState::new();
        let mut surfaces = RecordingSurfaces::default();

        let request = build_request(Operation::Limit, &FormState::expression("1/x")).unwrap();
        orch.submit(&mut state, &mut surfaces, request);

        let all = history.all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].result, r#"["-1","1"]"#);
    }

    #[test]
    fn test_latest_submit_wins() {
        let service = FakeService::default();
        let history = SqliteStore::in_memory().unwrap();
        let orch = Orchestrator::new(&service, &history, &BraceRenderer);
        let mut state = ClientState::new();
        let mut surfaces = RecordingSurfaces::default();

        let first = orch.begin(&mut state, &mut surfaces, derivative_request("x^2"));
        let second = orch.begin(&mut state, &mut surfaces, derivative_request("x^3"));
        assert_eq!(state.phase(Operation::Derivative), Phase::Submitting);
        assert_eq!(state.in_flight(), 2);

        // the newer reply lands first
        let newer = orch.finish(
            &mut state,
            &mut surfaces,
            second,
            Ok(CalculationResponse::single("3x^2")),
        );
        assert!(newer.is_success());
        assert!(state.is_loading());

        let older = orch.finish(
            &mut state,
            &mut surfaces,
            first,
            Ok(CalculationResponse::single("2x")),
        );
        assert_eq!(older, Outcome::Discarded);

        let all = history.all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].expression, "x^3");
        assert_eq!(surfaces.shown.len(), 1);
        assert_eq!(surfaces.loading, vec![true, false]);
        assert!(!state.is_loading());
        assert_eq!(state.phase(Operation::Derivative), Phase::Idle);
    }

    #[test]
    fn test_stale_reply_discarded_even_when_older_finishes_first() {
        let service = FakeService::default();
        let history = SqliteStore::in_memory().unwrap();
        let orch = Orchestrator::new(&service, &history, &BraceRenderer);
        let mut state = ClientState::new();
        let mut surfaces = RecordingSurfaces::default();

        let first = orch.begin(&mut state, &mut surfaces, derivative_request("a"));
        let second = orch.begin(&mut state, &mut surfaces, derivative_request("b"));

        let older = orch.finish(
            &mut state,
            &mut surfaces,
            first,
            Err(SolverError::Transport("boom".into())),
        );
        assert_eq!(older, Outcome::Discarded);
        assert!(surfaces.notifications.is_empty());
        assert_eq!(state.phase(Operation::Derivative), Phase::Submitting);

        orch.finish(
            &mut state,
            &mut surfaces,
            second,
            Ok(CalculationResponse::single("0")),
        );
        assert_eq!(state.phase(Operation::Derivative), Phase::Idle);
        assert_eq!(history.all().unwrap()[0].expression, "b");
    }

    #[test]
    fn test_generations_are_per_tool() {
        let service = FakeService::default();
        let history = SqliteStore::in_memory().unwrap();
        let orch = Orchestrator::new(&service, &history, &BraceRenderer);
        let mut state = ClientState::new();
        let mut surfaces = RecordingSurfaces::default();

        let d = orch.begin(&mut state, &mut surfaces, derivative_request("x"));
        let limit = build_request(Operation::Limit, &FormState::expression("1/x")).unwrap();
        let l = orch.begin(&mut state, &mut surfaces, limit);

        assert!(orch
            .finish(&mut state, &mut surfaces, d, Ok(CalculationResponse::single("1")))
            .is_success());
        assert!(orch
            .finish(&mut state, &mut surfaces, l, Ok(CalculationResponse::single("oo")))
            .is_success());
        assert_eq!(history.all().unwrap().len(), 2);
    }

    #[test]
    fn test_one_call_per_submit_no_retry() {
        let service = FakeService::replying(Err(SolverError::Transport("down".into())));
        let history = SqliteStore::in_memory().unwrap();
        let orch = Orchestrator::new(&service, &history, &BraceRenderer);
        let mut state = ClientState::new();
        let mut surfaces = RecordingSurfaces::default();

        orch.submit(&mut state, &mut surfaces, derivative_request("x"));
        assert_eq!(service.call_count(), 1);
    }

    #[test]
    fn test_rerun_switches_tool_and_resubmits() {
        let service = FakeService::replying(Ok(CalculationResponse::single("x^2/2")));
        let history = SqliteStore::in_memory().unwrap();
        let old = history.append(Operation::Integral, "x", "x^2/2").unwrap();
        let orch = Orchestrator::new(&service, &history, &BraceRenderer);
        let mut state = ClientState::new();
        let mut surfaces = RecordingSurfaces::default();

        let outcome = orch.rerun(&mut state, &mut surfaces, old.id);

        assert!(outcome.is_success());
        assert_eq!(state.current_tool(), Operation::Integral);
        let calls = service.calls.borrow();
        assert_eq!(calls[0].operation, Operation::Integral);
        assert_eq!(calls[0].expression, "x");
        assert_eq!(calls[0].definite, Some(false));
        assert_eq!(history.all().unwrap().len(), 2);
        assert_eq!(surfaces.notifications[0], Notification::success(LOADED_FROM_HISTORY));
    }

    #[test]
    fn test_loading_stays_up_across_overlapping_requests() {
        let service = FakeService::default();
        let history = SqliteStore::in_memory().unwrap();
        let orch = Orchestrator::new(&service, &history, &BraceRenderer);
        let mut state = ClientState::new();
        let mut surfaces = RecordingSurfaces::default();

        let d = orch.begin(&mut state, &mut surfaces, derivative_request("x"));
        let limit = build_request(Operation::Limit, &FormState::expression("1/x")).unwrap();
        let l = orch.begin(&mut state, &mut surfaces, limit);
        assert_eq!(surfaces.loading, vec![true]);

        orch.finish(&mut state, &mut surfaces, d, Err(SolverError::Transport("x".into())));
        assert_eq!(surfaces.loading, vec![true]);

        orch.finish(&mut state, &mut surfaces, l, Ok(CalculationResponse::single("oo")));
        assert_eq!(surfaces.loading, vec![true, false]);
    }

    #[test]
    fn test_load_from_history_switches_tool_without_submitting() {
        let service = FakeService::default();
        let history = SqliteStore::in_memory().unwrap();
        let old = history.append(Operation::Limit, "sin(x)/x", "1").unwrap();
        let orch = Orchestrator::new(&service, &history, &BraceRenderer);
        let mut state = ClientState::new();
        let mut surfaces = RecordingSurfaces::default();

        let entry = orch.load_from_history(&mut state, &mut surfaces, old.id);
        assert_eq!(entry, Some(old));
        assert_eq!(state.current_tool(), Operation::Limit);
        assert_eq!(service.call_count(), 0);
        assert!(surfaces.loading.is_empty());

        assert!(orch.load_from_history(&mut state, &mut surfaces, -5).is_none());
        assert_eq!(
            surfaces.notifications.last(),
            Some(&Notification::error(HISTORY_ENTRY_MISSING))
        );
    }

    #[test]
    fn test_rerun_unknown_id() {
        let service = FakeService::default();
        let history = SqliteStore::in_memory().unwrap();
        let orch = Orchestrator::new(&service, &history, &BraceRenderer);
        let mut state = ClientState::new();
        let mut surfaces = RecordingSurfaces::default();

        let outcome = orch.rerun(&mut state, &mut surfaces, 42);
        assert_eq!(outcome, Outcome::Rejected(HISTORY_ENTRY_MISSING.into()));
        assert_eq!(service.call_count(), 0);
    }

    #[test]
    fn test_practice_success_and_failure() {
        let service = FakeService::default();
        *service.practice_reply.borrow_mut() = Some(Ok(vec![PracticeProblem {
            problem: "x^{2}".into(),
            solution: "2 x".into(),
            hint: "power rule".into(),
        }]));
        let history = SqliteStore::in_memory().unwrap();
        let orch = Orchestrator::new(&service, &history, &BraceRenderer);
        let mut state = ClientState::new();
        let mut surfaces = RecordingSurfaces::default();
        let request = PracticeRequest {
            topic: Default::default(),
            difficulty: Default::default(),
        };

        let shown = orch.practice(&mut state, &mut surfaces, &request).unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(surfaces.practice.len(), 1);
        assert_eq!(surfaces.loading, vec![true, false]);

        *service.practice_reply.borrow_mut() =
            Some(Err(SolverError::Transport("Failed to generate problems".into())));
        assert!(orch.practice(&mut state, &mut surfaces, &request).is_none());
        assert_eq!(
            surfaces.notifications.last(),
            Some(&Notification::error("Failed to generate problems"))
        );
        assert_eq!(surfaces.loading, vec![true, false, true, false]);
        assert!(history.all().unwrap().is_empty());
        assert_eq!(*service.other_calls.borrow(), 2);
        assert_eq!(service.call_count(), 0);
    }

    #[test]
    fn test_plot_draws_function_series_and_replaces_chart() {
        let service = FakeService::default();
        let history = SqliteStore::in_memory().unwrap();
        let orch = Orchestrator::new(&service, &history, &BraceRenderer);
        let mut state = ClientState::new();
        let mut surfaces = RecordingSurfaces::default();
        let request = GraphRequest {
            expression: "x^2".into(),
            variable: "x".into(),
            x_min: -1.0,
            x_max: 1.0,
        };

        for _ in 0..2 {
            *service.graph_reply.borrow_mut() = Some(Ok(GraphSeries {
                label: String::new(),
                x: vec![-1.0, 0.0, 1.0],
                y: vec![1.0, 0.0, 1.0],
            }));
            let drawn = orch.plot(&mut state, &mut surfaces, &request).unwrap();
            assert_eq!(drawn[0].key, SeriesKey::Function);
            assert_eq!(drawn[0].label, DEFAULT_PLOT_LABEL);
            assert_eq!(drawn[0].points.len(), 3);
        }
        assert_eq!(surfaces.charts_drawn, 2);
        assert_eq!(surfaces.live_charts.len(), 1);
        assert_eq!(*service.other_calls.borrow(), 2);
        assert_eq!(service.call_count(), 0);
        assert_eq!(surfaces.loading, vec![true, false, true, false]);
    }
}
