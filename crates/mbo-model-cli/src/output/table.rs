use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{is_yearly_rows, sensitivity_grid};

/// Format output as tables using the tabled crate.
///
/// Yearly statements are printed with one column per year, the way financial
/// statements are read.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_fields(None, map);
            }
        }
        Value::Array(_) if is_yearly_rows(value) => print_statement(None, value),
        Value::Array(arr) => print_array_table(None, arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => {
            let grid = sensitivity_grid(res_map);
            if let Some((rows, cols, matrix)) = grid {
                print_grid(rows, cols, matrix);
            }

            // Scalars first, then one table per nested section
            let scalars: Map<String, Value> = res_map
                .iter()
                .filter(|(key, val)| {
                    !(grid.is_some() && is_grid_key(key)) && !is_section(val)
                })
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            if !scalars.is_empty() {
                print_fields(None, &scalars);
            }

            for (key, val) in res_map {
                let title = Some(key.as_str());
                match val {
                    Value::Array(_) if is_yearly_rows(val) => print_statement(title, val),
                    Value::Array(arr) if is_section(val) => print_array_table(title, arr),
                    Value::Object(obj) => print_fields(title, obj),
                    _ => {}
                }
            }
        }
        Value::Array(_) if is_yearly_rows(result) => print_statement(None, result),
        Value::Array(arr) => print_array_table(None, arr),
        other => println!("{}", format_value(other)),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn is_section(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(arr) => arr.first().is_some_and(Value::is_object),
        _ => false,
    }
}

fn is_grid_key(key: &str) -> bool {
    matches!(key, "matrix" | "exit_multiple_values" | "interest_rate_values")
}

fn print_title(title: Option<&str>) {
    if let Some(t) = title {
        println!("\n{}", t.replace('_', " ").to_uppercase());
    }
}

fn print_fields(title: Option<&str>, map: &Map<String, Value>) {
    print_title(title);
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

/// One row per field, one column per year.
fn print_statement(title: Option<&str>, rows: &Value) {
    let Some(rows) = rows.as_array() else {
        return;
    };
    print_title(title);

    let mut header = vec!["".to_string()];
    header.extend(rows.iter().map(|r| format!("Year {}", format_value(&r["year"]))));

    let mut builder = Builder::default();
    builder.push_record(header);
    if let Some(Value::Object(first)) = rows.first() {
        for field in first.keys().filter(|k| k.as_str() != "year") {
            let mut record = vec![field.clone()];
            record.extend(rows.iter().map(|r| format_value(&r[field.as_str()])));
            builder.push_record(record);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(title: Option<&str>, arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }
    print_title(title);

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }
        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

/// IRR grid: exit multiples down the side, interest rates across the top.
fn print_grid(rows: &[Value], cols: &[Value], matrix: &[Value]) {
    let mut builder = Builder::default();
    let mut header = vec!["exit multiple \\ rate".to_string()];
    header.extend(cols.iter().map(format_value));
    builder.push_record(header);

    for (label, cells) in rows.iter().zip(matrix) {
        let mut record = vec![format_value(label)];
        if let Value::Array(cells) = cells {
            record.extend(cells.iter().map(format_value));
        }
        builder.push_record(record);
    }
    println!("{}", Table::from(builder));
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
