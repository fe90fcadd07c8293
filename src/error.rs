//! Error types for survey-rotor

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Survey-rotor error types
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid compiled-in experiment configuration (fatal at startup)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Unknown survey, language, or experiment
    #[error("not found: {0}")]
    NotFound(String),

    /// Persistence failure (never retried here; surfaced to the caller)
    #[error("storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Not-found signal for a (survey, language) composite key.
    ///
    /// Carries only the key, never an internal path.
    #[must_use]
    pub fn survey_not_found(survey_name: &str, language: &str) -> Self {
        Self::NotFound(format!("survey {survey_name}/{language}"))
    }
}
