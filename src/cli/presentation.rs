//! CLI presentation: text and json formatters per command.

mod list;
mod plan;
mod run;

pub use list::{format_list_json, format_list_text, AvailableRow, GeneratorRow};
pub use plan::format_plan_text;
pub use run::{format_run_summary, RunSummary};
