use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ModelError;
use crate::input::ModelInput;
use crate::model::run_model;
use crate::types::*;
use crate::ModelResult;

/// Upper bound on the points of one sweep axis
const MAX_SWEEP_POINTS: usize = 200;
/// Upper bound on engine runs in one grid
const MAX_GRID_CELLS: usize = 2_500;

/// IRR grid over exit multiple and interest rate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrSensitivityOutput {
    pub exit_multiple_values: Vec<Multiple>,
    pub interest_rate_values: Vec<Rate>,
    /// matrix[i][j] = IRR at exit_multiple_values[i], interest_rate_values[j]
    pub matrix: Vec<Vec<Rate>>,
    pub base_case_value: Rate,
    /// Position of the base case in the matrix (row, col)
    pub base_case_position: (usize, usize),
}

/// Generate the sweep values for a sensitivity variable from min to max with step.
fn generate_sweep_values(var: &SensitivityVariable) -> ModelResult<Vec<Decimal>> {
    if var.step <= Decimal::ZERO {
        return Err(ModelError::validation(
            format!("variable:{}", var.name),
            "Step must be positive",
        ));
    }
    if var.min > var.max {
        return Err(ModelError::validation(
            format!("variable:{}", var.name),
            "Min must be <= max",
        ));
    }

    let points = (var.max - var.min)
        .checked_div(var.step)
        .map(|n| n.floor())
        .and_then(|n| n.to_usize());
    match points {
        Some(n) if n < MAX_SWEEP_POINTS => {}
        _ => {
            return Err(ModelError::validation(
                format!("variable:{}", var.name),
                format!("Sweep exceeds {MAX_SWEEP_POINTS} points; widen the step"),
            ))
        }
    }

    let mut values = Vec::new();
    let mut current = var.min;
    while current <= var.max {
        values.push(current);
        current += var.step;
    }
    // max is always part of the sweep
    if values.last().is_some_and(|&last| last < var.max) {
        values.push(var.max);
    }

    Ok(values)
}

fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| (**v - target).abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Two-way IRR sensitivity.
///
/// Each cell reruns the full engine with the exit multiple and the interest
/// rate overridden. A cell whose run fails records a warning and an IRR of 0.
pub fn irr_sensitivity(
    input: &ModelInput,
    exit_multiple: &SensitivityVariable,
    interest_rate: &SensitivityVariable,
) -> ModelResult<ComputationOutput<IrrSensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let multiples = generate_sweep_values(exit_multiple)?;
    let rates = generate_sweep_values(interest_rate)?;
    let cells = multiples.len() * rates.len();
    if cells > MAX_GRID_CELLS {
        return Err(ModelError::validation(
            "sensitivity",
            format!("Grid of {cells} cells exceeds the limit of {MAX_GRID_CELLS}"),
        ));
    }

    let mut matrix = Vec::with_capacity(multiples.len());
    for &multiple in &multiples {
        let mut row = Vec::with_capacity(rates.len());
        for &rate in &rates {
            let mut case = input.clone();
            case.valuation.exit_multiple = Some(multiple);
            case.financing.interest_rate = rate;

            match run_model(&case) {
                Ok(run) => row.push(run.result.investment.irr),
                Err(e) => {
                    log::warn!("sensitivity cell ({multiple}, {rate}) failed: {e}");
                    warnings.push(format!("Evaluation failed at ({multiple}, {rate}): {e}"));
                    row.push(Decimal::ZERO);
                }
            }
        }
        matrix.push(row);
    }

    let mid_multiple = (exit_multiple.min + exit_multiple.max) / dec!(2);
    let mid_rate = (interest_rate.min + interest_rate.max) / dec!(2);
    let base_row = closest_index(&multiples, mid_multiple);
    let base_col = closest_index(&rates, mid_rate);
    let base_case_value = matrix[base_row][base_col];

    let output = IrrSensitivityOutput {
        exit_multiple_values: multiples,
        interest_rate_values: rates,
        matrix,
        base_case_value,
        base_case_position: (base_row, base_col),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "2-Way IRR Sensitivity (exit multiple x interest rate)",
        &serde_json::json!({
            "scenario": input.scenario,
            "variable_1": exit_multiple.name,
            "variable_2": interest_rate.name,
            "output_metric": "irr",
        }),
        warnings,
        elapsed,
        output,
    ))
}
