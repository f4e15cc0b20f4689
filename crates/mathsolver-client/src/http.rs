use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use mathsolver_core::{
    CalculationRequest, CalculationResponse, GraphRequest, GraphSeries, PracticeProblem,
    PracticeRequest, SolveService, SolverError, SolverResult,
};

use crate::reply::{interpret_calculate, interpret_graph, interpret_practice};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Blocking JSON client for the solving service.
pub struct HttpSolveService {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpSolveService {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("mathsolver/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON body and return `(status, body text)` for any HTTP status.
    /// Only connection-level failures become errors here.
    fn post(&self, path: &str, body: &impl Serialize) -> SolverResult<(u16, String)> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("POST {url}");
        let response = match self.agent.post(&url).send_json(body) {
            Ok(resp) => resp,
            Err(ureq::Error::Status(_, resp)) => resp,
            Err(e) => return Err(SolverError::Transport(e.to_string())),
        };
        let status = response.status();
        let text = response
            .into_string()
            .map_err(|e| SolverError::Transport(format!("reading response: {e}")))?;
        debug!("POST {url} -> {status}");
        Ok((status, text))
    }
}

impl SolveService for HttpSolveService {
    fn calculate(&self, request: &CalculationRequest) -> SolverResult<CalculationResponse> {
        let (status, body) = self.post("calculate", request)?;
        interpret_calculate(status, &body)
    }

    fn practice(&self, request: &PracticeRequest) -> SolverResult<Vec<PracticeProblem>> {
        let (status, body) = self.post("practice", request)?;
        interpret_practice(status, &body)
    }

    fn graph(&self, request: &GraphRequest) -> SolverResult<GraphSeries> {
        let (status, body) = self.post("graph", request)?;
        interpret_graph(status, &body)
    }
}
