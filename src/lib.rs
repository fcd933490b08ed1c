pub mod app;
pub mod cli;
pub mod error;
pub mod logging;
pub mod platform;

pub use cli::{CaptureArgs, CliError, Command};
pub use error::{AppError, AppResult};
