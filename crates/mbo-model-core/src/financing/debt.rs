use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::statements::cashflow::CashflowRow;
use crate::types::*;

/// Amortisation profile of the senior term loan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmortizationType {
    /// Equal instalments of `initial / period` once the grace period ends
    #[default]
    Linear,
    /// Whole outstanding balance repaid in year `period - 1`
    Bullet,
}

/// Financing assumptions for the acquisition loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancingAssumptions {
    /// Principal drawn at close (year 0)
    pub initial_debt: Money,
    /// Annual interest rate on opening principal
    pub interest_rate: Rate,
    #[serde(default)]
    pub amortization_type: AmortizationType,
    #[serde(default = "default_amortization_period")]
    pub amortization_period_years: u32,
    /// Years before linear repayment begins
    #[serde(default)]
    pub grace_period_years: u32,
    /// Year index of a one-off special repayment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_repayment_year: Option<u32>,
    #[serde(default)]
    pub special_repayment_amount: Money,
    /// Covenant threshold for the debt service coverage ratio
    #[serde(default = "default_minimum_dscr")]
    pub minimum_dscr: Decimal,
}

fn default_amortization_period() -> u32 {
    5
}

fn default_minimum_dscr() -> Decimal {
    dec!(1.3)
}

impl FinancingAssumptions {
    /// Linear 5-year loan with no grace period, no special repayment and a
    /// 1.3x minimum DSCR.
    pub fn new(initial_debt: Money, interest_rate: Rate) -> Self {
        FinancingAssumptions {
            initial_debt,
            interest_rate,
            amortization_type: AmortizationType::default(),
            amortization_period_years: default_amortization_period(),
            grace_period_years: 0,
            special_repayment_year: None,
            special_repayment_amount: Decimal::ZERO,
            minimum_dscr: default_minimum_dscr(),
        }
    }
}

/// One year of the debt schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtScheduleRow {
    pub year: u32,
    pub opening_principal: Money,
    pub drawdown: Money,
    pub scheduled_repayment: Money,
    pub special_repayment: Money,
    pub total_repayment: Money,
    pub closing_principal: Money,
    pub interest_expense: Money,
    pub debt_service: Money,
    /// Cash flow available for debt service; second pass only
    pub cfads: Option<Money>,
    /// CFADS / debt service; second pass only
    pub dscr: Option<Decimal>,
    /// DSCR below `minimum_dscr`; second pass only
    pub covenant_breach: Option<bool>,
    pub minimum_dscr: Decimal,
}

/// Build the yearly debt schedule.
///
/// Without `cashflow` (first pass) the coverage fields stay `None`. With the
/// cash flow sequence (second pass) CFADS, DSCR and the covenant flag are
/// computed from the matching cash flow year.
pub fn build_debt_schedule(
    financing: &FinancingAssumptions,
    cashflow: Option<&[CashflowRow]>,
) -> Vec<DebtScheduleRow> {
    let initial = financing.initial_debt;
    let period = financing.amortization_period_years as usize;
    let grace = financing.grace_period_years as usize;

    let mut rows = Vec::with_capacity(HORIZON_YEARS);
    let mut outstanding = initial;

    for i in 0..HORIZON_YEARS {
        let opening = outstanding;
        let interest_expense = opening * financing.interest_rate;

        let scheduled_repayment = match financing.amortization_type {
            AmortizationType::Bullet => {
                if i == period.saturating_sub(1) {
                    opening
                } else {
                    Decimal::ZERO
                }
            }
            AmortizationType::Linear => {
                if period > 0 && i >= grace && i < grace + period {
                    initial / Decimal::from(period as u64)
                } else {
                    Decimal::ZERO
                }
            }
        };

        let special_repayment = match financing.special_repayment_year {
            Some(year) if year as usize == i => financing.special_repayment_amount,
            _ => Decimal::ZERO,
        };

        // Never repay more than is outstanding
        let total_repayment = opening.min(scheduled_repayment + special_repayment);
        outstanding = (opening - total_repayment).max(Decimal::ZERO);
        let debt_service = interest_expense + total_repayment;

        let (cfads, dscr, covenant_breach) = match cashflow.and_then(|cf| cf.get(i)) {
            Some(cf) => {
                let cfads = cf.operating_cf - cf.capex;
                let dscr = safe_divide(cfads, debt_service);
                (Some(cfads), Some(dscr), Some(dscr < financing.minimum_dscr))
            }
            None => (None, None, None),
        };

        rows.push(DebtScheduleRow {
            year: i as u32,
            opening_principal: opening,
            drawdown: if i == 0 { initial } else { Decimal::ZERO },
            scheduled_repayment,
            special_repayment,
            total_repayment,
            closing_principal: outstanding,
            interest_expense,
            debt_service,
            cfads,
            dscr,
            covenant_breach,
            minimum_dscr: financing.minimum_dscr,
        });
    }

    rows
}
