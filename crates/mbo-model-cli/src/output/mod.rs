pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Yearly statement rows: a non-empty array of objects that all carry `year`.
pub(crate) fn is_yearly_rows(value: &Value) -> bool {
    match value {
        Value::Array(rows) => {
            !rows.is_empty()
                && rows
                    .iter()
                    .all(|r| r.as_object().is_some_and(|m| m.contains_key("year")))
        }
        _ => false,
    }
}

/// Row labels, column labels and cells of an IRR sensitivity grid, if `result` is one.
pub(crate) fn sensitivity_grid(
    result: &serde_json::Map<String, Value>,
) -> Option<(&[Value], &[Value], &[Value])> {
    let rows = result.get("exit_multiple_values")?.as_array()?;
    let cols = result.get("interest_rate_values")?.as_array()?;
    let matrix = result.get("matrix")?.as_array()?;
    Some((rows, cols, matrix))
}
