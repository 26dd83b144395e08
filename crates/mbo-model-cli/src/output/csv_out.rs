use serde_json::{Map, Value};
use std::io;

use super::{is_yearly_rows, sensitivity_grid};

type Writer<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// Full model runs are written in long form (`section,year,field,value`) so
/// every statement fits in one file; flat results keep two columns.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => write_result(&mut wtr, result),
            Some(Value::Array(rows)) => write_array_csv(&mut wtr, rows),
            _ => write_fields(&mut wtr, map),
        },
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_result(wtr: &mut Writer<'_>, result: &Map<String, Value>) {
    if let Some((rows, cols, matrix)) = sensitivity_grid(result) {
        write_grid(wtr, rows, cols, matrix);
    } else if let Some(Value::Array(results)) = result.get("results") {
        write_array_csv(wtr, results);
    } else if result.values().any(|v| v.is_object() || is_yearly_rows(v)) {
        write_long(wtr, result);
    } else {
        write_fields(wtr, result);
    }
}

fn write_fields(wtr: &mut Writer<'_>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
    }
}

fn write_long(wtr: &mut Writer<'_>, result: &Map<String, Value>) {
    let _ = wtr.write_record(["section", "year", "field", "value"]);
    for (section, val) in result {
        match val {
            Value::Array(rows) if is_yearly_rows(val) => {
                for row in rows.iter().filter_map(Value::as_object) {
                    let year = row.get("year").map(format_csv_value).unwrap_or_default();
                    for (field, v) in row.iter().filter(|(k, _)| k.as_str() != "year") {
                        let _ = wtr.write_record([
                            section.as_str(),
                            year.as_str(),
                            field.as_str(),
                            format_csv_value(v).as_str(),
                        ]);
                    }
                }
            }
            Value::Object(obj) => {
                for (field, v) in obj {
                    let value = format_csv_value(v);
                    let _ = wtr.write_record([section.as_str(), "", field.as_str(), value.as_str()]);
                }
            }
            other => {
                let value = format_csv_value(other);
                let _ = wtr.write_record(["", "", section.as_str(), value.as_str()]);
            }
        }
    }
}

fn write_grid(wtr: &mut Writer<'_>, rows: &[Value], cols: &[Value], matrix: &[Value]) {
    let mut header = vec!["exit_multiple".to_string()];
    header.extend(cols.iter().map(|c| format!("rate_{}", format_csv_value(c))));
    let _ = wtr.write_record(&header);

    for (label, cells) in rows.iter().zip(matrix) {
        let mut record = vec![format_csv_value(label)];
        if let Value::Array(cells) = cells {
            record.extend(cells.iter().map(format_csv_value));
        }
        let _ = wtr.write_record(&record);
    }
}

fn write_array_csv(wtr: &mut Writer<'_>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
