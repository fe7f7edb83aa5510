//! `genkit run` presentation.

use owo_colors::OwoColorize;
use std::time::Duration;

/// A completed `run`: the requests in order and the total time spent on them
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub specs: Vec<String>,
    pub duration: Duration,
}

pub fn format_run_summary(summary: &RunSummary) -> String {
    let mut lines: Vec<String> = summary
        .specs
        .iter()
        .map(|spec| format!("{} {}", "✓".green(), spec))
        .collect();
    lines.push(format!(
        "{} request(s) in {} ms",
        summary.specs.len(),
        summary.duration.as_millis()
    ));
    lines.join("\n")
}
