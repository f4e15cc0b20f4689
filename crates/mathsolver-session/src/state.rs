use std::fmt;

use mathsolver_core::{CalculationRequest, Operation};

use crate::surface::ChartHandle;

/// Lifecycle of one tool's calculation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Submitting => write!(f, "submitting"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Proof that a submit is in flight. Consumed by `Orchestrator::finish`, so
/// every submit settles exactly once.
#[derive(Debug)]
pub struct Ticket {
    pub(crate) request: CalculationRequest,
    pub(crate) generation: u64,
}

impl Ticket {
    pub fn operation(&self) -> Operation {
        self.request.operation
    }

    pub fn request(&self) -> &CalculationRequest {
        &self.request
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Everything that changes while the client runs, passed explicitly to the
/// orchestrator and presenter.
#[derive(Debug)]
pub struct ClientState {
    current_tool: Operation,
    phases: [Phase; 3],
    settled: [Option<Phase>; 3],
    generations: [u64; 3],
    in_flight: usize,
    pub(crate) chart: Option<ChartHandle>,
}

impl Default for ClientState {
    fn default() -> Self {
        Self {
            current_tool: Operation::Derivative,
            phases: [Phase::Idle; 3],
            settled: [None; 3],
            generations: [0; 3],
            in_flight: 0,
            chart: None,
        }
    }
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_tool(&self) -> Operation {
        self.current_tool
    }

    pub fn switch_tool(&mut self, tool: Operation) {
        self.current_tool = tool;
    }

    pub fn phase(&self, op: Operation) -> Phase {
        self.phases[op.index()]
    }

    /// How the most recent settled submit for `op` ended.
    pub fn last_settled(&self, op: Operation) -> Option<Phase> {
        self.settled[op.index()]
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn chart(&self) -> Option<ChartHandle> {
        self.chart
    }

    pub(crate) fn open_ticket(&mut self, request: CalculationRequest) -> Ticket {
        let slot = request.operation.index();
        self.generations[slot] += 1;
        self.phases[slot] = Phase::Submitting;
        self.in_flight += 1;
        Ticket {
            generation: self.generations[slot],
            request,
        }
    }

    pub(crate) fn is_latest(&self, ticket: &Ticket) -> bool {
        self.generations[ticket.operation().index()] == ticket.generation
    }

    /// Record the outcome and return to idle. Stale tickets leave the phase
    /// alone since a newer submit owns it.
    pub(crate) fn settle(&mut self, ticket: &Ticket, phase: Phase) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.is_latest(ticket) {
            let slot = ticket.operation().index();
            self.settled[slot] = Some(phase);
            self.phases[slot] = Phase::Idle;
        }
    }

    /// Loading indicator bookkeeping outside the calculation tools (practice, plot).
    pub(crate) fn begin_task(&mut self) {
        self.in_flight += 1;
    }

    pub(crate) fn end_task(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }
}
