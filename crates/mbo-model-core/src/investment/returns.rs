use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::statements::cashflow::CashflowRow;
use crate::time_value::{self, IrrSolution};
use crate::types::*;
use crate::ModelResult;

/// Exit valuation assumptions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationAssumptions {
    /// Exit EV/EBIT multiple applied to final-year EBIT; unset means zero
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_multiple: Option<Multiple>,
}

/// Equity investment returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentResult {
    pub initial_equity: Money,
    /// Index 0 = -equity, indices 1..=5 = yearly net cash flow, exit added to the last
    pub equity_cashflows: Vec<Money>,
    pub final_year_ebit: Money,
    pub exit_multiple: Multiple,
    pub exit_value: Money,
    pub irr: Rate,
    /// False when no NPV sign change was found and `irr` fell back to zero
    pub irr_converged: bool,
    pub total_distributions: Money,
    pub cash_on_cash: Multiple,
}

/// Build the equity cash-flow vector and solve its IRR.
pub fn evaluate_investment(
    equity_contribution: Money,
    exit_multiple: Option<Multiple>,
    final_year_ebit: Money,
    cashflow: &[CashflowRow],
) -> ModelResult<InvestmentResult> {
    ensure_horizon("cashflow", cashflow)?;

    let exit_multiple = exit_multiple.unwrap_or(Decimal::ZERO);
    let exit_value = final_year_ebit * exit_multiple;

    let mut equity_cashflows = Vec::with_capacity(HORIZON_YEARS + 1);
    equity_cashflows.push(-equity_contribution);
    equity_cashflows.extend(cashflow.iter().map(|cf| cf.net_cashflow));
    if let Some(last) = equity_cashflows.last_mut() {
        *last += exit_value;
    }

    let solution = time_value::irr_bisection(&equity_cashflows)?;
    let total_distributions: Money = equity_cashflows[1..].iter().copied().sum();

    Ok(InvestmentResult {
        initial_equity: equity_contribution,
        equity_cashflows,
        final_year_ebit,
        exit_multiple,
        exit_value,
        irr: solution.rate(),
        irr_converged: matches!(solution, IrrSolution::Solved(_)),
        total_distributions,
        cash_on_cash: safe_divide(total_distributions, equity_contribution),
    })
}
