use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ModelError;
use crate::input::{ModelInput, Scenario};
use crate::model::{min_dscr, run_model};
use crate::types::*;
use crate::ModelResult;

/// Headline results for a single revenue scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub scenario: Scenario,
    pub final_revenue: Money,
    pub final_ebitda: Money,
    pub min_dscr: Option<Decimal>,
    pub covenant_breaches: usize,
    pub irr: Rate,
    pub exit_value: Money,
}

/// Output of the scenario comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparison {
    /// In base, best, worst order; unconfigured scenarios are skipped
    pub results: Vec<ScenarioSummary>,
}

/// Run the engine once per configured revenue scenario.
///
/// Everything except the scenario selector is shared between runs. Warnings
/// of the individual runs are carried over, prefixed with the scenario name.
pub fn compare_scenarios(
    input: &ModelInput,
) -> ModelResult<ComputationOutput<ScenarioComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let scenarios: Vec<Scenario> = Scenario::ALL
        .into_iter()
        .filter(|s| input.revenue.scenarios.contains_key(s))
        .collect();
    if scenarios.is_empty() {
        return Err(ModelError::validation(
            "revenue",
            "At least one revenue scenario must be configured",
        ));
    }

    let mut results = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        log::debug!("running scenario '{scenario}'");
        let run = run_model(&input.with_scenario(scenario))?;
        warnings.extend(run.warnings.iter().map(|w| format!("[{scenario}] {w}")));

        let out = run.result;
        results.push(ScenarioSummary {
            scenario,
            final_revenue: out.revenue.last().map(|r| r.final_total).unwrap_or(Decimal::ZERO),
            final_ebitda: out.pnl.last().map(|p| p.ebitda).unwrap_or(Decimal::ZERO),
            min_dscr: min_dscr(&out.debt_schedule).map(|(_, dscr)| dscr),
            covenant_breaches: out.summary.covenant_breach_years.len(),
            irr: out.investment.irr,
            exit_value: out.investment.exit_value,
        });
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Revenue scenario comparison (independent engine runs)",
        &serde_json::json!({
            "scenarios": results.iter().map(|r| r.scenario).collect::<Vec<_>>(),
            "exit_multiple": input.valuation.exit_multiple.map(|m| m.to_string()),
        }),
        warnings,
        elapsed,
        ScenarioComparison { results },
    ))
}
