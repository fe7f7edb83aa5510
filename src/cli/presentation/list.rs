//! `genkit list` presentation.

use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;

/// One registered generator
#[derive(Debug, Clone, Serialize)]
pub struct GeneratorRow {
    pub alias: String,
    pub full_name: String,
    pub namespace: String,
    pub source: String,
    /// Task names, or the invocation error when the generator failed to load
    pub tasks: Result<Vec<String>, String>,
}

/// A generator found on disk but not registered
#[derive(Debug, Clone, Serialize)]
pub struct AvailableRow {
    pub name: String,
    pub path: PathBuf,
}

fn tasks_cell(tasks: &Result<Vec<String>, String>) -> String {
    match tasks {
        Ok(tasks) if tasks.is_empty() => "-".to_string(),
        Ok(tasks) => tasks.join(", "),
        Err(err) => format!("(failed: {})", err),
    }
}

pub fn format_list_text(rows: &[GeneratorRow], available: Option<&[AvailableRow]>) -> String {
    let mut output = if rows.is_empty() {
        "No generators registered.\n\nAdd one under [generators] in genkit.toml.".to_string()
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Alias", "Full name", "Namespace", "Source", "Tasks"]);
        for row in rows {
            table.add_row(vec![
                row.alias.clone(),
                row.full_name.clone(),
                row.namespace.clone(),
                row.source.clone(),
                tasks_cell(&row.tasks),
            ]);
        }
        format!("{}\n\nTotal: {} generator(s)", table, rows.len())
    };

    if let Some(available) = available {
        output.push_str("\n\n");
        if available.is_empty() {
            output.push_str("No other generators found on disk.");
        } else {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Available", "Path"]);
            for row in available {
                table.add_row(vec![row.name.clone(), row.path.display().to_string()]);
            }
            output.push_str(&table.to_string());
        }
    }
    output
}

pub fn format_list_json(rows: &[GeneratorRow], available: Option<&[AvailableRow]>) -> String {
    let generators: Vec<_> = rows
        .iter()
        .map(|row| {
            let (tasks, error) = match &row.tasks {
                Ok(tasks) => (tasks.clone(), None),
                Err(err) => (Vec::new(), Some(err.clone())),
            };
            json!({
                "alias": row.alias,
                "full_name": row.full_name,
                "namespace": row.namespace,
                "source": row.source,
                "tasks": tasks,
                "error": error,
            })
        })
        .collect();
    let mut out = json!({ "generators": generators, "total": rows.len() });
    if let Some(available) = available {
        out["available"] = json!(available);
    }
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}
