//! Error taxonomy for the analysis layer

use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Source unreadable or schema incomplete
    #[error("Load error: {0}")]
    Load(String),

    /// Operation referenced columns the table does not carry
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown question identifier
    #[error("Question not found: {0}")]
    NotFound(String),

    /// K-Means or projection could not be fitted
    #[error("Clustering error: {0}")]
    Clustering(String),

    /// Export or present called before create
    #[error("State error: {0}")]
    State(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    pub(crate) fn no_chart() -> Self {
        AnalysisError::State("no chart available - call create() first".to_string())
    }
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for AnalysisError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        AnalysisError::Render(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
