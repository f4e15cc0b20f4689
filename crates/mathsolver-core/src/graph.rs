//! Graph payload → chart-ready series.

use serde_json::Value;
use tracing::debug;

use crate::model::GraphSeries;

/// The series names a graph payload may carry, in plotting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKey {
    Original,
    Derivative,
    Function,
}

impl SeriesKey {
    pub const ALL: [SeriesKey; 3] = [Self::Original, Self::Derivative, Self::Function];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Derivative => "derivative",
            Self::Function => "function",
        }
    }

    pub fn style(self) -> SeriesStyle {
        match self {
            Self::Original => SeriesStyle {
                color: (0x00, 0x66, 0xFF),
                fill: false,
            },
            Self::Derivative => SeriesStyle {
                color: (0xFF, 0x00, 0x80),
                fill: false,
            },
            Self::Function => SeriesStyle {
                color: (0x00, 0x66, 0xFF),
                fill: true,
            },
        }
    }
}

/// Cosmetic defaults attached to each known series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesStyle {
    pub color: (u8, u8, u8),
    pub fill: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderableSeries {
    pub key: SeriesKey,
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub style: SeriesStyle,
}

impl RenderableSeries {
    pub fn from_series(key: SeriesKey, series: GraphSeries) -> Self {
        let points = series.x.into_iter().zip(series.y).collect();
        Self {
            key,
            label: series.label,
            points,
            style: key.style(),
        }
    }
}

/// Build chart series from a raw graph payload.
///
/// Never fails: a missing or non-object payload gives no series, a malformed
/// series is skipped, unknown keys are ignored.
pub fn build_datasets(payload: Option<&Value>) -> Vec<RenderableSeries> {
    let Some(map) = payload.and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for key in SeriesKey::ALL {
        let Some(raw) = map.get(key.as_str()) else {
            continue;
        };
        if raw.is_null() {
            continue;
        }
        match serde_json::from_value::<GraphSeries>(raw.clone()) {
            Ok(series) => out.push(RenderableSeries::from_series(key, series)),
            Err(e) => debug!("skipping malformed '{}' series: {e}", key.as_str()),
        }
    }
    out
}
