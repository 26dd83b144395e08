use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::planning::costs::CostTotals;
use crate::types::*;
use crate::ModelResult;

/// Profit and loss for a single planning year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PnlRow {
    pub year: u32,
    pub revenue: Money,
    pub personnel_costs: Money,
    pub overhead_and_variable_costs: Money,
    pub ebitda: Money,
    pub ebitda_margin: Rate,
    pub depreciation: Money,
    pub ebit: Money,
    pub ebit_margin: Rate,
    pub taxable_income: Money,
    pub taxes: Money,
    pub net_income: Money,
}

/// Build the yearly P&L.
///
/// `depreciation` is `None` on the first pass and treated as zero; a year
/// missing from a supplied sequence is also zero.
pub fn build_pnl(
    revenue_final_by_year: &[Money],
    cost_totals_by_year: &[CostTotals],
    depreciation: Option<&[Money]>,
    tax_rate: Rate,
) -> ModelResult<Vec<PnlRow>> {
    ensure_horizon("revenue_final_by_year", revenue_final_by_year)?;
    ensure_horizon("cost_totals_by_year", cost_totals_by_year)?;

    let rows = revenue_final_by_year
        .iter()
        .zip(cost_totals_by_year)
        .enumerate()
        .map(|(i, (&revenue, costs))| {
            let ebitda =
                revenue - costs.personnel_costs - costs.overhead_and_variable_costs;
            let depreciation = depreciation
                .and_then(|d| d.get(i).copied())
                .unwrap_or(Decimal::ZERO);
            let ebit = ebitda - depreciation;
            let taxable_income = ebit.max(Decimal::ZERO);
            let taxes = taxable_income * tax_rate;

            PnlRow {
                year: i as u32,
                revenue,
                personnel_costs: costs.personnel_costs,
                overhead_and_variable_costs: costs.overhead_and_variable_costs,
                ebitda,
                ebitda_margin: safe_divide(ebitda, revenue),
                depreciation,
                ebit,
                ebit_margin: safe_divide(ebit, revenue),
                taxable_income,
                taxes,
                net_income: ebit - taxes,
            }
        })
        .collect();

    Ok(rows)
}
