use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Transport(String),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SolverError {
    /// Errors the user is told about. Everything else is absorbed where it happens.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Transport(_))
    }
}

/// Failure of the math-notation renderer on one fragment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("unbalanced braces at byte {0}")]
    UnbalancedBraces(usize),

    #[error("unknown command \\{0}")]
    UnknownCommand(String),

    #[error("missing argument at byte {0}")]
    MissingArgument(usize),

    #[error("empty fragment")]
    Empty,
}

pub type SolverResult<T> = Result<T, SolverError>;
