//! Interpretation of service replies, independent of the transport.
//!
//! A reply is OK-shaped when the status is 2xx and the body carries the
//! expected field; anything else becomes a transport error with the
//! service's `error` message or a fixed fallback.

use serde::de::DeserializeOwned;
use serde_json::Value;

use mathsolver_core::{
    CalculationResponse, GraphSeries, PracticeProblem, SolverError, SolverResult,
};

pub const CALCULATION_FAILED: &str = "Calculation failed";
pub const PRACTICE_FAILED: &str = "Failed to generate problems";
pub const PLOT_FAILED: &str = "Failed to plot expression";

pub fn interpret_calculate(status: u16, body: &str) -> SolverResult<CalculationResponse> {
    interpret(status, body, &["result"], CALCULATION_FAILED)
}

pub fn interpret_practice(status: u16, body: &str) -> SolverResult<Vec<PracticeProblem>> {
    #[derive(serde::Deserialize)]
    struct Problems {
        problems: Vec<PracticeProblem>,
    }
    interpret::<Problems>(status, body, &["problems"], PRACTICE_FAILED).map(|p| p.problems)
}

pub fn interpret_graph(status: u16, body: &str) -> SolverResult<GraphSeries> {
    interpret(status, body, &["x", "y"], PLOT_FAILED)
}

fn interpret<T: DeserializeOwned>(
    status: u16,
    body: &str,
    required: &[&str],
    fallback: &str,
) -> SolverResult<T> {
    let value: Option<Value> = serde_json::from_str(body).ok();
    let ok_shaped = (200..300).contains(&status)
        && value
            .as_ref()
            .and_then(Value::as_object)
            .is_some_and(|obj| required.iter().all(|k| obj.contains_key(*k)));

    if ok_shaped {
        if let Some(v) = value {
            return serde_json::from_value(v)
                .map_err(|e| SolverError::Transport(format!("{fallback}: {e}")));
        }
    }

    Err(SolverError::Transport(error_message(value.as_ref(), fallback)))
}

fn error_message(body: Option<&Value>, fallback: &str) -> String {
    body.and_then(|v| v.get("error"))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string())
}
