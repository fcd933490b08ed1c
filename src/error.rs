// Unified error handling
//
// Everything that can end a run, wrapped for the top level.

use sc_capture::CaptureError;
use thiserror::Error;

use crate::cli::CliError;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Cli(#[from] CliError),

    #[error(transparent)]
    Capture(#[from] CaptureError),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Cli(e) => e.kind(),
            AppError::Capture(e) => e.kind(),
        }
    }

    /// Argument errors are followed by the usage text.
    pub fn wants_usage(&self) -> bool {
        matches!(self, AppError::Cli(_))
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
