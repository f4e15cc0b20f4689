use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Derivative,
    Integral,
    Limit,
}

impl Operation {
    pub const ALL: [Operation; 3] = [Self::Derivative, Self::Integral, Self::Limit];

    /// Capitalized name used in notifications ("Derivative calculated!").
    pub fn title(self) -> &'static str {
        match self {
            Self::Derivative => "Derivative",
            Self::Integral => "Integral",
            Self::Limit => "Limit",
        }
    }

    /// Stable slot for per-tool tables.
    pub fn index(self) -> usize {
        match self {
            Self::Derivative => 0,
            Self::Integral => 1,
            Self::Limit => 2,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Derivative => write!(f, "derivative"),
            Self::Integral => write!(f, "integral"),
            Self::Limit => write!(f, "limit"),
        }
    }
}

impl std::str::FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "derivative" | "d" | "diff" => Ok(Self::Derivative),
            "integral" | "i" | "int" => Ok(Self::Integral),
            "limit" | "l" | "lim" => Ok(Self::Limit),
            _ => Err(format!("invalid operation: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Side from which a limit is approached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "+-")]
    PlusMinus,
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlusMinus => write!(f, "+-"),
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
        }
    }
}

// ---------------------------------------------------------------------------
// Calculation request / response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub operation: Operation,
    pub expression: String,
    pub variable: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<String>,
    /// NaN when the user typed something non-numeric; serializes as `null`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
}

/// Formatted result: one expression, or several independent solutions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SolveResult {
    Single(String),
    Multi(Vec<String>),
}

impl SolveResult {
    /// Text stored in history. Multi results are kept as one JSON array string.
    pub fn to_history_text(&self) -> String {
        match self {
            Self::Single(s) => s.clone(),
            Self::Multi(items) => serde_json::to_string(items).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub step: String,
    pub expression: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResponse {
    pub result: SolveResult,
    #[serde(default)]
    pub steps: Option<Vec<Step>>,
    /// Raw graph payload. Interpreted leniently by [`crate::graph::build_datasets`].
    #[serde(default)]
    pub graph: Option<Value>,
}

impl CalculationResponse {
    pub fn single(result: impl Into<String>) -> Self {
        Self {
            result: SolveResult::Single(result.into()),
            steps: None,
            graph: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Graph series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSeries {
    #[serde(default)]
    pub label: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Body of the standalone plotting endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphRequest {
    pub expression: String,
    pub variable: String,
    #[serde(rename = "xMin")]
    pub x_min: f64,
    #[serde(rename = "xMax")]
    pub x_max: f64,
}

// ---------------------------------------------------------------------------
// Practice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PracticeTopic {
    #[default]
    Derivative,
    Integral,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PracticeRequest {
    pub topic: PracticeTopic,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeProblem {
    pub problem: String,
    pub solution: String,
    #[serde(default)]
    pub hint: String,
}
