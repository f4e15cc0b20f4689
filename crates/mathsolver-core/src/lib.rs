pub mod error;
pub mod graph;
pub mod history;
pub mod model;
pub mod request;
pub mod service;
pub mod store;

pub use error::{RenderError, SolverError, SolverResult};
pub use graph::{build_datasets, RenderableSeries, SeriesKey, SeriesStyle};
pub use history::{HistoryEntry, Theme};
pub use model::{
    CalculationRequest, CalculationResponse, Difficulty, Direction, GraphRequest, GraphSeries,
    Operation, PracticeProblem, PracticeRequest, PracticeTopic, SolveResult, Step,
};
pub use request::{build_request, FormState, DEFAULT_VARIABLE, EMPTY_EXPRESSION};
pub use service::SolveService;
pub use store::{HistoryStore, PreferenceStore, HISTORY_CAPACITY};
