use clap::Args;
use serde_json::Value;

use mbo_model_core::input::{ModelInput, Scenario};
use mbo_model_core::model;

use crate::input;

/// Arguments for a full model run
#[derive(Args)]
pub struct RunArgs {
    /// Path to a JSON or YAML input snapshot (piped on stdin if omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Revenue scenario to run: base, best or worst (overrides the snapshot)
    #[arg(long)]
    pub scenario: Option<Scenario>,
}

/// Load the input snapshot from `--input` or stdin and apply a scenario override.
pub fn load_snapshot(
    path: Option<&str>,
    scenario: Option<Scenario>,
) -> Result<ModelInput, Box<dyn std::error::Error>> {
    let snapshot: ModelInput = if let Some(path) = path {
        input::file::read_input(path)?
    } else if let Some(piped) = input::file::read_piped()? {
        piped
    } else {
        return Err("--input <file.json|file.yaml> or stdin required for the model".into());
    };

    Ok(match scenario {
        Some(s) => snapshot.with_scenario(s),
        None => snapshot,
    })
}

pub fn run_model(args: RunArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let snapshot = load_snapshot(args.input.as_deref(), args.scenario)?;
    let result = model::run_model(&snapshot)?;
    Ok(serde_json::to_value(result)?)
}
