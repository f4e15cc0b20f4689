pub mod orchestrator;
pub mod presenter;
pub mod state;
pub mod surface;

#[cfg(test)]
mod test_support;

pub use orchestrator::{Orchestrator, Outcome};
pub use presenter::{Block, Presenter, RenderedProblem, RenderedStep, ResultPanel};
pub use state::{ClientState, Phase, Ticket};
pub use surface::{ChartHandle, Level, MathRenderer, Notification, RawRenderer, Surfaces};
