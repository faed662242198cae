// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
///
/// Also the failure type of a single firing: the scheduler logs it and
/// re-arms the job, it never propagates further.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(#[from] crate::port::AuthError),

    #[error("Probe failed: {0}")]
    Probe(#[from] crate::port::ProbeError),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short tag used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Authentication(_) => "authentication",
            AppError::Probe(_) => "probe",
            AppError::Scheduler(_) => "scheduler",
            AppError::Internal(_) => "internal",
        }
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
