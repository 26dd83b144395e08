use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::financing::debt::{build_debt_schedule, DebtScheduleRow};
use crate::input::ModelInput;
use crate::investment::returns::{evaluate_investment, InvestmentResult};
use crate::planning::costs::{aggregate_costs, CostTotals};
use crate::planning::revenue::{project_revenue, RevenueComponents};
use crate::statements::balance_sheet::{build_balance_sheet, BalanceSheetRow};
use crate::statements::cashflow::{build_cashflow, depreciation_by_year, CashflowRow};
use crate::statements::pnl::{build_pnl, PnlRow};
use crate::types::*;
use crate::ModelResult;

/// Headline figures of a model run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub total_revenue: Money,
    pub final_ebitda: Money,
    pub cumulative_free_cash_flow: Money,
    /// Lowest DSCR among years with non-zero debt service
    pub min_dscr: Option<Decimal>,
    pub min_dscr_year: Option<u32>,
    pub covenant_breach_years: Vec<u32>,
    pub ending_debt: Money,
    pub ending_cash: Money,
    pub irr: Rate,
    pub cash_on_cash: Multiple,
}

/// Every statement produced by one engine run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelOutput {
    pub revenue: Vec<RevenueComponents>,
    pub costs: Vec<CostTotals>,
    /// Second-pass P&L, with depreciation from the cash flow statement
    pub pnl: Vec<PnlRow>,
    pub cashflow: Vec<CashflowRow>,
    /// Second-pass schedule, with coverage ratios
    pub debt_schedule: Vec<DebtScheduleRow>,
    pub balance_sheet: Vec<BalanceSheetRow>,
    pub investment: InvestmentResult,
    pub summary: ModelSummary,
}

/// Run the full five-year model for one input snapshot.
///
/// Debt service depends on cash flow and cash flow depends on debt service
/// and depreciation, so the statements are resolved in two fixed passes:
///
/// 1. debt schedule without cash flow data
/// 2. P&L with zero depreciation
/// 3. cash flow statement, which derives depreciation
/// 4. P&L with that depreciation
/// 5. debt schedule with coverage from the cash flow statement
/// 6. balance sheet
/// 7. equity returns
///
/// The pass order is fixed; there is no iteration to convergence.
pub fn run_model(input: &ModelInput) -> ModelResult<ComputationOutput<ModelOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let tax_rate = input.cashflow.tax_rate()?;
    ensure_horizon("costs.years", &input.costs.years)?;

    // ─── Operating drivers ───────────────────────────────────────────
    log::debug!("projecting revenue for scenario '{}'", input.scenario);
    let drivers = input.revenue.drivers(input.scenario)?;
    let revenue = project_revenue(drivers, &input.costs.consultant_fte())?;
    let revenue_final: Vec<Money> = revenue.iter().map(|r| r.final_total).collect();

    log::debug!("aggregating costs");
    let costs = aggregate_costs(&input.costs, &revenue_final)?;

    // ─── Pass 1 ──────────────────────────────────────────────────────
    log::debug!("pass 1: debt schedule without cash flow");
    let debt_pass1 = build_debt_schedule(&input.financing, None);

    log::debug!("pass 1: P&L with zero depreciation");
    let pnl_pass1 = build_pnl(&revenue_final, &costs, None, tax_rate)?;

    log::debug!("building cash flow statement");
    let cashflow = build_cashflow(
        &pnl_pass1,
        &debt_pass1,
        &input.cashflow,
        &input.transaction,
        &input.financing,
    )?;

    // ─── Pass 2 ──────────────────────────────────────────────────────
    log::debug!("pass 2: P&L with derived depreciation");
    let depreciation = depreciation_by_year(&cashflow);
    let pnl = build_pnl(&revenue_final, &costs, Some(&depreciation), tax_rate)?;

    log::debug!("pass 2: debt schedule with coverage ratios");
    let debt_schedule = build_debt_schedule(&input.financing, Some(&cashflow));

    log::debug!("building balance sheet");
    let balance_sheet = build_balance_sheet(&cashflow, &debt_schedule, Some(&pnl))?;

    // ─── Returns ─────────────────────────────────────────────────────
    if input.valuation.exit_multiple.is_none() {
        warnings.push("Exit multiple not set; exit value taken as zero".into());
    }
    let final_year_ebit = pnl.last().map(|p| p.ebit).unwrap_or(Decimal::ZERO);
    let investment = evaluate_investment(
        input.transaction.equity_contribution,
        input.valuation.exit_multiple,
        final_year_ebit,
        &cashflow,
    )?;
    if !investment.irr_converged {
        log::warn!("equity cash flows never change sign; IRR reported as 0");
        warnings.push("IRR: no sign change in equity cash flows; reported as 0".into());
    }

    // ─── Diagnostics ─────────────────────────────────────────────────
    for row in &debt_schedule {
        if row.covenant_breach == Some(true) {
            let dscr = row.dscr.unwrap_or(Decimal::ZERO);
            log::warn!(
                "covenant breach in year {}: DSCR {} below {}",
                row.year,
                dscr.round_dp(2),
                row.minimum_dscr
            );
            warnings.push(format!(
                "Year {}: DSCR {} below minimum {}",
                row.year,
                dscr.round_dp(2),
                row.minimum_dscr
            ));
        }
    }
    for row in &cashflow {
        if row.closing_cash < Decimal::ZERO {
            warnings.push(format!(
                "Year {}: closing cash is negative ({})",
                row.year,
                row.closing_cash.round_dp(2)
            ));
        }
    }

    let summary = summarize(&revenue, &pnl, &cashflow, &debt_schedule, &investment);

    let output = ModelOutput {
        revenue,
        costs,
        pnl,
        cashflow,
        debt_schedule,
        balance_sheet,
        investment,
        summary,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Two-pass integrated MBO model (P&L, cash flow, debt, balance sheet, IRR)",
        &serde_json::json!({
            "scenario": input.scenario,
            "horizon_years": HORIZON_YEARS,
            "initial_debt": input.financing.initial_debt.to_string(),
            "interest_rate": input.financing.interest_rate.to_string(),
            "amortization_type": input.financing.amortization_type,
            "tax_rate": tax_rate.to_string(),
            "tax_payment_lag_years": input.cashflow.tax_payment_lag_years,
            "purchase_price": input.transaction.purchase_price.to_string(),
            "equity_contribution": input.transaction.equity_contribution.to_string(),
            "exit_multiple": input.valuation.exit_multiple.map(|m| m.to_string()),
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn summarize(
    revenue: &[RevenueComponents],
    pnl: &[PnlRow],
    cashflow: &[CashflowRow],
    debt: &[DebtScheduleRow],
    investment: &InvestmentResult,
) -> ModelSummary {
    let (min_dscr_year, min_dscr) = min_dscr(debt).unzip();

    ModelSummary {
        total_revenue: revenue.iter().map(|r| r.final_total).sum(),
        final_ebitda: pnl.last().map(|p| p.ebitda).unwrap_or(Decimal::ZERO),
        cumulative_free_cash_flow: cashflow.iter().map(|c| c.free_cash_flow).sum(),
        min_dscr,
        min_dscr_year,
        covenant_breach_years: debt
            .iter()
            .filter(|d| d.covenant_breach == Some(true))
            .map(|d| d.year)
            .collect(),
        ending_debt: debt.last().map(|d| d.closing_principal).unwrap_or(Decimal::ZERO),
        ending_cash: cashflow.last().map(|c| c.closing_cash).unwrap_or(Decimal::ZERO),
        irr: investment.irr,
        cash_on_cash: investment.cash_on_cash,
    }
}

/// Lowest DSCR and its year, ignoring years without debt service.
pub(crate) fn min_dscr(debt: &[DebtScheduleRow]) -> Option<(u32, Decimal)> {
    debt.iter()
        .filter(|d| !d.debt_service.is_zero())
        .filter_map(|d| d.dscr.map(|dscr| (d.year, dscr)))
        .min_by_key(|&(_, dscr)| dscr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(year: u32, debt_service: Money, dscr: Option<Decimal>) -> DebtScheduleRow {
        DebtScheduleRow {
            year,
            opening_principal: Decimal::ZERO,
            drawdown: Decimal::ZERO,
            scheduled_repayment: Decimal::ZERO,
            special_repayment: Decimal::ZERO,
            total_repayment: Decimal::ZERO,
            closing_principal: Decimal::ZERO,
            interest_expense: debt_service,
            debt_service,
            cfads: None,
            dscr,
            covenant_breach: None,
            minimum_dscr: dec!(1.3),
        }
    }

    #[test]
    fn test_min_dscr_skips_years_without_debt_service() {
        let debt = vec![
            row(0, dec!(100), Some(dec!(1.8))),
            row(1, dec!(100), Some(dec!(1.1))),
            row(2, Decimal::ZERO, Some(Decimal::ZERO)),
            row(3, dec!(100), Some(dec!(1.5))),
        ];
        assert_eq!(min_dscr(&debt), Some((1, dec!(1.1))));
    }

    #[test]
    fn test_min_dscr_none_on_first_pass_rows() {
        let debt = vec![row(0, dec!(100), None), row(1, Decimal::ZERO, None)];
        assert_eq!(min_dscr(&debt), None);
    }
}
