//! Form state → request payload.

use crate::error::{SolverError, SolverResult};
use crate::model::{CalculationRequest, Direction, Operation};

pub const DEFAULT_VARIABLE: &str = "x";
pub const DEFAULT_LOWER: &str = "0";
pub const DEFAULT_UPPER: &str = "1";
pub const EMPTY_EXPRESSION: &str = "Please enter an expression";

/// Snapshot of one tool's input fields, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub expression: String,
    pub variable: String,
    pub definite: bool,
    pub lower: String,
    pub upper: String,
    pub point: String,
    pub direction: Direction,
}

impl FormState {
    pub fn expression(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            ..Self::default()
        }
    }
}

/// Normalize a form into a request for `tool`.
///
/// Fails only when the expression is blank.
pub fn build_request(tool: Operation, form: &FormState) -> SolverResult<CalculationRequest> {
    let expression = form.expression.trim();
    if expression.is_empty() {
        return Err(SolverError::Validation(EMPTY_EXPRESSION.into()));
    }

    let mut request = CalculationRequest {
        operation: tool,
        expression: expression.to_string(),
        variable: or_default(&form.variable, DEFAULT_VARIABLE),
        definite: None,
        lower: None,
        upper: None,
        point: None,
        direction: None,
    };

    match tool {
        Operation::Derivative => {}
        Operation::Integral => {
            request.definite = Some(form.definite);
            if form.definite {
                request.lower = Some(or_default(&form.lower, DEFAULT_LOWER));
                request.upper = Some(or_default(&form.upper, DEFAULT_UPPER));
            }
        }
        Operation::Limit => {
            request.point = Some(parse_point(&form.point));
            request.direction = Some(form.direction);
        }
    }

    Ok(request)
}

fn or_default(value: &str, default: &str) -> String {
    let v = value.trim();
    if v.is_empty() {
        default.to_string()
    } else {
        v.to_string()
    }
}

/// Blank means 0. Anything unparseable or non-finite becomes NaN for the service to reject.
fn parse_point(raw: &str) -> f64 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0.0;
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => f64::NAN,
    }
}
