mod http;
mod reply;

pub use http::{HttpSolveService, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use reply::{
    interpret_calculate, interpret_graph, interpret_practice, CALCULATION_FAILED, PLOT_FAILED,
    PRACTICE_FAILED,
};
