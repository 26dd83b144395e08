use clap::Args;
use serde_json::Value;

use mbo_model_core::input::Scenario;
use mbo_model_core::scenarios::{scenario, sensitivity};
use mbo_model_core::types::SensitivityVariable;

use super::model::load_snapshot;

/// Arguments for the scenario comparison
#[derive(Args)]
pub struct ScenariosArgs {
    /// Path to a JSON or YAML input snapshot (piped on stdin if omitted)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_scenarios(args: ScenariosArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let snapshot = load_snapshot(args.input.as_deref(), None)?;
    let result = scenario::compare_scenarios(&snapshot)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the IRR sensitivity grid
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to a JSON or YAML input snapshot (piped on stdin if omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Revenue scenario to run: base, best or worst (overrides the snapshot)
    #[arg(long)]
    pub scenario: Option<Scenario>,

    /// Exit multiple sweep as min:max:step (e.g. "4:8:1")
    #[arg(long, default_value = "4:8:1")]
    pub exit_multiple: String,

    /// Interest rate sweep as min:max:step (e.g. "0.03:0.07:0.01")
    #[arg(long, default_value = "0.03:0.07:0.01")]
    pub interest_rate: String,
}

fn parse_range(name: &str, spec: &str) -> Result<SensitivityVariable, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 3 {
        let flag = name.replace('_', "-");
        return Err(format!("--{flag} must be min:max:step, got '{spec}'").into());
    }
    Ok(SensitivityVariable {
        name: name.to_string(),
        min: parts[0].trim().parse()?,
        max: parts[1].trim().parse()?,
        step: parts[2].trim().parse()?,
    })
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let exit_multiple = parse_range("exit_multiple", &args.exit_multiple)?;
    let interest_rate = parse_range("interest_rate", &args.interest_rate)?;

    let snapshot = load_snapshot(args.input.as_deref(), args.scenario)?;
    let result = sensitivity::irr_sensitivity(&snapshot, &exit_multiple, &interest_rate)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_range() {
        let var = parse_range("interest_rate", "0.03:0.07:0.01").unwrap();
        assert_eq!(var.name, "interest_rate");
        assert_eq!(var.min, dec!(0.03));
        assert_eq!(var.max, dec!(0.07));
        assert_eq!(var.step, dec!(0.01));
    }

    #[test]
    fn test_parse_range_rejects_malformed_specs() {
        let err = parse_range("exit_multiple", "4:8").unwrap_err();
        assert!(err.to_string().contains("--exit-multiple"));
        assert!(parse_range("exit_multiple", "4:x:1").is_err());
    }
}
