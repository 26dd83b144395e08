use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::financing::debt::DebtScheduleRow;
use crate::statements::cashflow::CashflowRow;
use crate::statements::pnl::PnlRow;
use crate::types::*;
use crate::ModelResult;

/// Simplified balance sheet for a single planning year.
///
/// Equity is the plug: `equity == assets - liabilities` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheetRow {
    pub year: u32,
    pub cash: Money,
    /// Accumulated `net income - operating cash flow`
    pub working_capital: Money,
    pub total_assets: Money,
    pub financial_debt: Money,
    pub total_liabilities: Money,
    pub net_income: Money,
    pub retained_earnings: Money,
    pub equity: Money,
}

/// Derive the balance sheet from the cash flow statement and debt schedule.
///
/// Without a P&L, net income is taken as zero for every year.
pub fn build_balance_sheet(
    cashflow: &[CashflowRow],
    debt: &[DebtScheduleRow],
    pnl: Option<&[PnlRow]>,
) -> ModelResult<Vec<BalanceSheetRow>> {
    ensure_horizon("cashflow", cashflow)?;
    ensure_horizon("debt_schedule", debt)?;
    if let Some(pnl) = pnl {
        ensure_horizon("pnl", pnl)?;
    }

    let mut working_capital = Decimal::ZERO;
    let mut retained_earnings = Decimal::ZERO;
    let mut rows = Vec::with_capacity(HORIZON_YEARS);

    for (i, (cf, d)) in cashflow.iter().zip(debt).enumerate() {
        let net_income = pnl.map(|p| p[i].net_income).unwrap_or(Decimal::ZERO);

        // Non-cash proxy: the part of earnings not converted into operating cash
        working_capital += net_income - cf.operating_cf;
        retained_earnings += net_income;

        let total_assets = cf.closing_cash + working_capital;
        let total_liabilities = d.closing_principal;

        rows.push(BalanceSheetRow {
            year: i as u32,
            cash: cf.closing_cash,
            working_capital,
            total_assets,
            financial_debt: d.closing_principal,
            total_liabilities,
            net_income,
            retained_earnings,
            equity: total_assets - total_liabilities,
        });
    }

    Ok(rows)
}
