use crate::error::SolverResult;
use crate::model::{
    CalculationRequest, CalculationResponse, GraphRequest, GraphSeries, PracticeProblem,
    PracticeRequest,
};

/// Remote solving service. One call per method invocation, no retries.
///
/// Every failure (network, non-2xx, error-shaped body) comes back as
/// [`crate::SolverError::Transport`] carrying the message to show the user.
pub trait SolveService {
    fn calculate(&self, request: &CalculationRequest) -> SolverResult<CalculationResponse>;
    fn practice(&self, request: &PracticeRequest) -> SolverResult<Vec<PracticeProblem>>;
    fn graph(&self, request: &GraphRequest) -> SolverResult<GraphSeries>;
}
