use clap::Args;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use mbo_model_core::time_value::{self, IrrSolution};
use mbo_model_core::types::with_metadata;

/// Arguments for a stand-alone IRR
#[derive(Args)]
pub struct IrrArgs {
    /// Periodic cash flows, index 0 first (comma-separated, e.g. "-100,110")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
    pub cash_flows: Vec<Decimal>,
}

#[derive(Debug, Serialize, Deserialize)]
struct IrrOutput {
    irr: Decimal,
    /// False when the NPV never changed sign and the IRR fell back to zero
    converged: bool,
    cash_flows: Vec<Decimal>,
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let solution = time_value::irr_bisection(&args.cash_flows)?;
    if solution == IrrSolution::NoSignChange {
        warnings.push("No sign change in NPV; IRR reported as 0".to_string());
    }

    let output = IrrOutput {
        irr: solution.rate(),
        converged: matches!(solution, IrrSolution::Solved(_)),
        cash_flows: args.cash_flows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let result = with_metadata(
        "IRR by bisection on NPV",
        &serde_json::json!({ "periods": output.cash_flows.len() }),
        warnings,
        elapsed,
        output,
    );
    Ok(serde_json::to_value(result)?)
}
