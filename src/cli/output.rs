//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::AppError;
use owo_colors::OwoColorize;

/// Map application errors to a string for stderr.
pub fn map_error(e: &AppError) -> String {
    format!("{} {}", "error:".red().bold(), e.red())
}
