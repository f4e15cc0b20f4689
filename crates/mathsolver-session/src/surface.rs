//! Boundary between the session logic and whatever draws it.

use mathsolver_core::{RenderError, RenderableSeries};

use crate::presenter::{RenderedProblem, ResultPanel};

/// Turns math notation into displayable text. Called once per fragment.
pub trait MathRenderer {
    fn render(&self, notation: &str) -> Result<String, RenderError>;
}

/// Shows notation exactly as received.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawRenderer;

impl MathRenderer for RawRenderer {
    fn render(&self, notation: &str) -> Result<String, RenderError> {
        Ok(notation.to_string())
    }
}

/// Opaque id of a live chart instance owned by a [`Surfaces`] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChartHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }
}

/// Output side of the client: loading overlay, toasts, result panel, chart canvas.
pub trait Surfaces {
    fn set_loading(&mut self, visible: bool);
    fn notify(&mut self, notification: Notification);

    /// Make the result panel visible and bring it into view.
    fn show_result(&mut self, panel: &ResultPanel);
    fn show_practice(&mut self, problems: &[RenderedProblem]);

    fn draw_chart(&mut self, series: &[RenderableSeries]) -> Result<ChartHandle, RenderError>;
    fn release_chart(&mut self, handle: ChartHandle);
}
