//! Error type shared by the I/O-facing parts of the crate.
//!
//! Parsing and session actions never fail; only generation, storage, export
//! and configuration loading return `QuizError`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuizError {
    /// Request rejected before it reached the backend
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Backend answered with a non-success status
    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, QuizError>;

#[cfg(feature = "python")]
impl From<QuizError> for pyo3::PyErr {
    fn from(err: QuizError) -> Self {
        match err {
            QuizError::Validation(msg) => pyo3::exceptions::PyValueError::new_err(msg),
            QuizError::NotFound(msg) => pyo3::exceptions::PyKeyError::new_err(msg),
            other => pyo3::exceptions::PyRuntimeError::new_err(other.to_string()),
        }
    }
}
