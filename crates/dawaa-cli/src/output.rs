//! Envelope rendering for the terminal.
//!
//! `json` emits the whole envelope as one document. `ndjson` emits one
//! tagged object per line (`meta`, `data`, then each `error`). `table`
//! renders the first array-of-objects found in the payload, or key/value
//! rows for scalar payloads, followed by a metadata footer.

use dawaa_core::Envelope;
use serde_json::{json, Map, Value};

use crate::cli::OutputFormat;
use crate::error::CliError;

const MAX_CELL_WIDTH: usize = 60;

pub fn render(
    envelope: &Envelope<Value>,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let rendered = if pretty {
                serde_json::to_string_pretty(envelope)?
            } else {
                serde_json::to_string(envelope)?
            };
            println!("{rendered}");
        }
        OutputFormat::Ndjson => {
            println!("{}", serde_json::to_string(&json!({ "meta": envelope.meta }))?);
            println!("{}", serde_json::to_string(&json!({ "data": envelope.data }))?);
            for error in &envelope.errors {
                println!("{}", serde_json::to_string(&json!({ "error": error }))?);
            }
        }
        OutputFormat::Table => {
            for line in table_lines(&envelope.data) {
                println!("{line}");
            }
            println!(
                "request {} · chain {} · {} ms",
                envelope.meta.request_id,
                envelope
                    .meta
                    .source_chain
                    .iter()
                    .map(|id| id.as_str())
                    .collect::<Vec<_>>()
                    .join(" → "),
                envelope.meta.latency_ms
            );
            for warning in &envelope.meta.warnings {
                println!("warning: {warning}");
            }
            for error in &envelope.errors {
                println!("error[{}]: {}", error.code, error.message);
            }
        }
    }

    Ok(())
}

fn table_lines(data: &Value) -> Vec<String> {
    if let Value::Object(object) = data {
        if let Some(rows) = first_object_array(object) {
            return array_table(rows);
        }
        return key_value_table(object);
    }

    vec![cell_text(data)]
}

/// First array-of-objects value in the payload, if any.
fn first_object_array(object: &Map<String, Value>) -> Option<&Vec<Value>> {
    object.values().find_map(|value| match value {
        Value::Array(items)
            if !items.is_empty() && items.iter().all(|item| item.is_object()) =>
        {
            Some(items)
        }
        _ => None,
    })
}

fn array_table(rows: &[Value]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        if let Value::Object(object) = row {
            for key in object.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
    }

    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| {
                    row.get(column)
                        .map(cell_text)
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    render_grid(&columns, &body)
}

fn key_value_table(object: &Map<String, Value>) -> Vec<String> {
    let columns = vec![String::from("field"), String::from("value")];
    let body: Vec<Vec<String>> = object
        .iter()
        .map(|(key, value)| vec![key.clone(), cell_text(value)])
        .collect();
    render_grid(&columns, &body)
}

fn render_grid(columns: &[String], body: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = columns.iter().map(String::len).collect();
    for row in body {
        for (index, cell) in row.iter().enumerate() {
            if cell.chars().count() > widths[index] {
                widths[index] = cell.chars().count();
            }
        }
    }

    let mut lines = Vec::with_capacity(body.len() + 2);
    lines.push(grid_row(columns, &widths));
    lines.push(
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in body {
        lines.push(grid_row(row, &widths));
    }
    lines
}

fn grid_row(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let padding = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

fn cell_text(value: &Value) -> String {
    let text = match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };

    if text.chars().count() > MAX_CELL_WIDTH {
        let truncated: String = text.chars().take(MAX_CELL_WIDTH - 1).collect();
        format!("{truncated}…")
    } else {
        text
    }
}
