use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Looks for well-known result fields in order of priority, in the result
/// itself and then in its `summary`. Scenario comparisons print one IRR per
/// scenario; anything else falls back to the first field.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    for line in minimal_lines(result_obj) {
        println!("{}", line);
    }
}

fn minimal_lines(result: &Value) -> Vec<String> {
    let priority_keys = ["irr", "base_case_value", "cash_on_cash", "min_dscr", "ending_cash"];

    let Value::Object(map) = result else {
        return vec![format_minimal(result)];
    };

    if let Some(Value::Array(results)) = map.get("results") {
        return results
            .iter()
            .map(|r| format!("{}: {}", format_minimal(&r["scenario"]), format_minimal(&r["irr"])))
            .collect();
    }

    let scopes = [Some(map), map.get("summary").and_then(Value::as_object)];
    for scope in scopes.into_iter().flatten() {
        for key in &priority_keys {
            if let Some(val) = scope.get(*key) {
                if !val.is_null() {
                    return vec![format_minimal(val)];
                }
            }
        }
    }

    match map.iter().next() {
        Some((key, val)) => vec![format!("{}: {}", key, format_minimal(val))],
        None => Vec::new(),
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_model_run_prints_summary_irr() {
        let result = json!({ "pnl": [], "summary": { "irr": "0.2315", "ending_cash": "10" } });
        assert_eq!(minimal_lines(&result), vec!["0.2315"]);
    }

    #[test]
    fn test_top_level_irr_wins() {
        let result = json!({ "converged": true, "irr": "0.1" });
        assert_eq!(minimal_lines(&result), vec!["0.1"]);
    }

    #[test]
    fn test_scenarios_print_one_line_each() {
        let result = json!({ "results": [
            { "scenario": "base", "irr": "0.2" },
            { "scenario": "worst", "irr": "0.05" },
        ]});
        assert_eq!(minimal_lines(&result), vec!["base: 0.2", "worst: 0.05"]);
    }
}
