//! Error types for ritz-davidson.

use ritz_operator::OperatorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DavidsonError {
    #[error("Invalid value '{value}' for option '{option}'")]
    InvalidOption { option: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Operator error: {0}")]
    Operator(#[from] OperatorError),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Small eigenvalue problem is ill-conditioned: {0}")]
    IllConditioned(String),

    #[error("Eigenvalue {index} ({value}) is complex but has no conjugate partner")]
    UnpairedComplexEigenvalue {
        index: usize,
        value: num_complex::Complex64,
    },
}

pub type Result<T> = std::result::Result<T, DavidsonError>;
