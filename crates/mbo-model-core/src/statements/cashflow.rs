use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::financing::debt::{DebtScheduleRow, FinancingAssumptions};
use crate::statements::pnl::PnlRow;
use crate::types::*;
use crate::ModelResult;

// ---------------------------------------------------------------------------
// Assumptions
// ---------------------------------------------------------------------------

/// Cash flow assumptions.
///
/// Defaults: no tax lag, no capex, no working capital, zero opening cash and
/// a 20% depreciation rate on fixed assets. `tax_rate` has no default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashflowAssumptions {
    /// Cash tax rate, also applied to taxable income in the P&L
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<Rate>,
    /// 0 = taxes paid in the year they arise, 1 = paid the following year
    #[serde(default)]
    pub tax_payment_lag_years: u32,
    #[serde(default)]
    pub capex_pct_revenue: Rate,
    #[serde(default)]
    pub working_capital_pct_revenue: Rate,
    #[serde(default)]
    pub opening_cash_balance: Money,
    #[serde(default = "default_depreciation_rate")]
    pub depreciation_rate: Rate,
}

fn default_depreciation_rate() -> Rate {
    dec!(0.20)
}

impl Default for CashflowAssumptions {
    fn default() -> Self {
        CashflowAssumptions {
            tax_rate: None,
            tax_payment_lag_years: 0,
            capex_pct_revenue: Decimal::ZERO,
            working_capital_pct_revenue: Decimal::ZERO,
            opening_cash_balance: Decimal::ZERO,
            depreciation_rate: default_depreciation_rate(),
        }
    }
}

impl CashflowAssumptions {
    /// The configured tax rate; a missing rate is a validation error.
    pub fn tax_rate(&self) -> ModelResult<Rate> {
        self.tax_rate
            .ok_or_else(|| ModelError::validation("cashflow.tax_rate", "tax rate is required"))
    }
}

/// Transaction terms at close
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionTerms {
    pub purchase_price: Money,
    pub equity_contribution: Money,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Cash flow statement for a single planning year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowRow {
    pub year: u32,
    pub revenue: Money,
    pub ebitda: Money,
    pub capex: Money,
    pub depreciation: Money,
    pub fixed_assets: Money,
    pub ebit: Money,
    pub interest_expense: Money,
    pub ebt: Money,
    pub taxes_due: Money,
    pub taxes_paid: Money,
    pub working_capital_balance: Money,
    pub working_capital_change: Money,
    pub operating_cf: Money,
    pub equity_injection: Money,
    pub acquisition_outflow: Money,
    pub debt_drawdown: Money,
    pub investing_cf: Money,
    pub free_cash_flow: Money,
    pub debt_repayment: Money,
    pub financing_cf: Money,
    pub net_cashflow: Money,
    pub opening_cash: Money,
    pub closing_cash: Money,
}

/// The three flows booked at transaction close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosingFlows {
    pub equity_injection: Money,
    /// Negative purchase price
    pub acquisition_outflow: Money,
    pub debt_drawdown: Money,
}

impl ClosingFlows {
    pub fn new(terms: &TransactionTerms, year0_debt: &DebtScheduleRow) -> Self {
        ClosingFlows {
            equity_injection: terms.equity_contribution,
            acquisition_outflow: -terms.purchase_price,
            debt_drawdown: year0_debt.drawdown,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Check the year-0 identities: equity injection equals the equity
/// contribution, the acquisition outflow equals the negative purchase price
/// and the debt drawdown equals the financed initial debt.
pub fn validate_closing_flows(
    flows: &ClosingFlows,
    terms: &TransactionTerms,
    financing: &FinancingAssumptions,
) -> ModelResult<()> {
    let checks = [
        (
            "equity_injection",
            flows.equity_injection,
            terms.equity_contribution,
        ),
        (
            "acquisition_outflow",
            flows.acquisition_outflow,
            -terms.purchase_price,
        ),
        ("debt_drawdown", flows.debt_drawdown, financing.initial_debt),
    ];

    for (field, actual, expected) in checks {
        if (actual - expected).abs() > CASH_TOLERANCE {
            return Err(ModelError::validation(
                field,
                format!("year 0 {field} is {actual}, expected {expected}"),
            ));
        }
    }
    Ok(())
}

/// Enforce `opening + net == closing` within tolerance.
pub fn reconcile_cash(year: u32, opening: Money, net: Money, closing: Money) -> ModelResult<()> {
    let gap = opening + net - closing;
    if gap.abs() > CASH_TOLERANCE {
        return Err(ModelError::Reconciliation { year, gap });
    }
    Ok(())
}

/// Build the yearly cash flow statement from the P&L and the debt schedule.
///
/// This is the single source of depreciation for the second P&L pass: fixed
/// assets roll forward from capex, and depreciation is charged on the prior
/// balance plus the year's capex.
pub fn build_cashflow(
    pnl: &[PnlRow],
    debt: &[DebtScheduleRow],
    assumptions: &CashflowAssumptions,
    terms: &TransactionTerms,
    financing: &FinancingAssumptions,
) -> ModelResult<Vec<CashflowRow>> {
    ensure_horizon("pnl", pnl)?;
    ensure_horizon("debt_schedule", debt)?;
    let tax_rate = assumptions.tax_rate()?;

    let closing_flows = ClosingFlows::new(terms, &debt[0]);
    validate_closing_flows(&closing_flows, terms, financing)?;

    let mut rows: Vec<CashflowRow> = Vec::with_capacity(HORIZON_YEARS);
    let mut prior_fixed_assets = Decimal::ZERO;
    let mut prior_working_capital = Decimal::ZERO;
    let mut prior_taxes_due = Decimal::ZERO;
    let mut cash = assumptions.opening_cash_balance;

    for (i, (p, d)) in pnl.iter().zip(debt).enumerate() {
        let year = i as u32;
        let revenue = p.revenue;
        let ebitda = p.ebitda;

        // Fixed assets
        let capex = revenue * assumptions.capex_pct_revenue;
        let depreciation = (prior_fixed_assets + capex) * assumptions.depreciation_rate;
        let fixed_assets = (prior_fixed_assets + capex - depreciation).max(Decimal::ZERO);

        // Cash taxes
        let ebit = ebitda - depreciation;
        let interest_expense = d.interest_expense;
        let ebt = ebit - interest_expense;
        let taxes_due = ebt.max(Decimal::ZERO) * tax_rate;
        let taxes_paid = match assumptions.tax_payment_lag_years {
            0 => taxes_due,
            1 => prior_taxes_due,
            _ => Decimal::ZERO,
        };

        // Working capital
        let working_capital_balance = revenue * assumptions.working_capital_pct_revenue;
        let working_capital_change = working_capital_balance - prior_working_capital;

        let operating_cf = ebitda - taxes_paid - working_capital_change;

        let (equity_injection, acquisition_outflow, debt_drawdown) = if i == 0 {
            (
                closing_flows.equity_injection,
                closing_flows.acquisition_outflow,
                closing_flows.debt_drawdown,
            )
        } else {
            (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
        };

        let investing_cf = -capex + acquisition_outflow;
        let free_cash_flow = operating_cf + investing_cf;

        let debt_repayment = d.total_repayment;
        let financing_cf = debt_drawdown + equity_injection - interest_expense - debt_repayment;

        let net_cashflow = free_cash_flow + financing_cf;
        let opening_cash = cash;
        let closing_cash = opening_cash + net_cashflow;
        reconcile_cash(year, opening_cash, net_cashflow, closing_cash)?;

        rows.push(CashflowRow {
            year,
            revenue,
            ebitda,
            capex,
            depreciation,
            fixed_assets,
            ebit,
            interest_expense,
            ebt,
            taxes_due,
            taxes_paid,
            working_capital_balance,
            working_capital_change,
            operating_cf,
            equity_injection,
            acquisition_outflow,
            debt_drawdown,
            investing_cf,
            free_cash_flow,
            debt_repayment,
            financing_cf,
            net_cashflow,
            opening_cash,
            closing_cash,
        });

        prior_fixed_assets = fixed_assets;
        prior_working_capital = working_capital_balance;
        prior_taxes_due = taxes_due;
        cash = closing_cash;
    }

    Ok(rows)
}

/// Depreciation per year, as consumed by the second P&L pass.
pub fn depreciation_by_year(rows: &[CashflowRow]) -> Vec<Money> {
    rows.iter().map(|r| r.depreciation).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::financing::debt::build_debt_schedule;
    use rust_decimal_macros::dec;

    fn pnl_rows(revenue: Money, ebitda: Money) -> Vec<PnlRow> {
        (0..HORIZON_YEARS as u32)
            .map(|year| PnlRow {
                year,
                revenue,
                personnel_costs: Decimal::ZERO,
                overhead_and_variable_costs: revenue - ebitda,
                ebitda,
                ebitda_margin: safe_divide(ebitda, revenue),
                depreciation: Decimal::ZERO,
                ebit: ebitda,
                ebit_margin: safe_divide(ebitda, revenue),
                taxable_income: ebitda.max(Decimal::ZERO),
                taxes: Decimal::ZERO,
                net_income: ebitda,
            })
            .collect()
    }

    fn terms() -> TransactionTerms {
        TransactionTerms {
            purchase_price: dec!(1500),
            equity_contribution: dec!(500),
        }
    }

    fn financing() -> FinancingAssumptions {
        FinancingAssumptions::new(dec!(1000), dec!(0.10))
    }

    fn assumptions() -> CashflowAssumptions {
        CashflowAssumptions {
            tax_rate: Some(dec!(0.30)),
            depreciation_rate: Decimal::ZERO,
            ..Default::default()
        }
    }

    fn build(assumptions: &CashflowAssumptions) -> Vec<CashflowRow> {
        let debt = build_debt_schedule(&financing(), None);
        build_cashflow(
            &pnl_rows(dec!(2000), dec!(600)),
            &debt,
            assumptions,
            &terms(),
            &financing(),
        )
        .unwrap()
    }

    #[test]
    fn test_year0_closing_flows() {
        let rows = build(&assumptions());
        let y0 = &rows[0];

        assert_eq!(y0.equity_injection, dec!(500));
        assert_eq!(y0.acquisition_outflow, dec!(-1500));
        assert_eq!(y0.debt_drawdown, dec!(1000));
        assert_eq!(y0.investing_cf, dec!(-1500));
        // 1000 + 500 - interest 100 - repayment 200
        assert_eq!(y0.financing_cf, dec!(1200));
        assert_eq!(rows[1].financing_cf, dec!(-280));
    }

    #[test]
    fn test_taxes_paid_same_year_without_lag() {
        let rows = build(&assumptions());
        // EBT = 600 - 100 interest = 500, taxes 150
        assert_eq!(rows[0].ebt, dec!(500));
        assert_eq!(rows[0].taxes_due, dec!(150));
        assert_eq!(rows[0].taxes_paid, dec!(150));
        assert_eq!(rows[0].operating_cf, dec!(450));
    }

    #[test]
    fn test_tax_lag_of_one_year() {
        let mut a = assumptions();
        a.tax_payment_lag_years = 1;
        let rows = build(&a);

        assert_eq!(rows[0].taxes_paid, Decimal::ZERO);
        assert_eq!(rows[1].taxes_paid, rows[0].taxes_due);
        assert_eq!(rows[4].taxes_paid, rows[3].taxes_due);
    }

    #[test]
    fn test_unsupported_lag_pays_no_tax() {
        let mut a = assumptions();
        a.tax_payment_lag_years = 2;
        let rows = build(&a);
        assert!(rows.iter().all(|r| r.taxes_paid.is_zero()));
    }

    #[test]
    fn test_working_capital_build_is_a_cash_outflow() {
        let mut a = assumptions();
        a.working_capital_pct_revenue = dec!(0.10);
        let rows = build(&a);

        // Balance jumps from 0 to 200 in year 0, then stays flat
        assert_eq!(rows[0].working_capital_change, dec!(200));
        assert_eq!(rows[1].working_capital_change, Decimal::ZERO);
        assert_eq!(rows[0].operating_cf, dec!(250));
    }

    #[test]
    fn test_depreciation_rolls_fixed_assets_forward() {
        let mut a = assumptions();
        a.capex_pct_revenue = dec!(0.05);
        a.depreciation_rate = dec!(0.20);
        let rows = build(&a);

        // Year 0: capex 100, depreciation 20, fixed assets 80
        assert_eq!(rows[0].capex, dec!(100));
        assert_eq!(rows[0].depreciation, dec!(20));
        assert_eq!(rows[0].fixed_assets, dec!(80));
        // Year 1: (80 + 100) * 20% = 36
        assert_eq!(rows[1].depreciation, dec!(36));
        assert_eq!(rows[1].fixed_assets, dec!(144));
        assert_eq!(
            depreciation_by_year(&rows)[..2],
            [dec!(20), dec!(36)]
        );
    }

    #[test]
    fn test_cash_identity_holds_every_year() {
        let mut a = assumptions();
        a.opening_cash_balance = dec!(250);
        a.capex_pct_revenue = dec!(0.01);
        a.working_capital_pct_revenue = dec!(0.02);
        let rows = build(&a);

        assert_eq!(rows[0].opening_cash, dec!(250));
        for r in &rows {
            assert!((r.opening_cash + r.net_cashflow - r.closing_cash).abs() < CASH_TOLERANCE);
        }
        for pair in rows.windows(2) {
            assert_eq!(pair[0].closing_cash, pair[1].opening_cash);
        }
    }

    #[test]
    fn test_drawdown_mismatch_is_fatal() {
        let debt = build_debt_schedule(&FinancingAssumptions::new(dec!(900), dec!(0.10)), None);
        let err = build_cashflow(
            &pnl_rows(dec!(2000), dec!(600)),
            &debt,
            &assumptions(),
            &terms(),
            &financing(),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::Validation { ref field, .. } if field == "debt_drawdown"));
    }

    #[test]
    fn test_closing_flow_identities() {
        let debt = build_debt_schedule(&financing(), None);
        let mut flows = ClosingFlows::new(&terms(), &debt[0]);
        assert!(validate_closing_flows(&flows, &terms(), &financing()).is_ok());

        flows.equity_injection = dec!(400);
        let err = validate_closing_flows(&flows, &terms(), &financing()).unwrap_err();
        assert!(matches!(err, ModelError::Validation { ref field, .. } if field == "equity_injection"));

        let mut flows = ClosingFlows::new(&terms(), &debt[0]);
        flows.acquisition_outflow = dec!(1500);
        let err = validate_closing_flows(&flows, &terms(), &financing()).unwrap_err();
        assert!(matches!(err, ModelError::Validation { ref field, .. } if field == "acquisition_outflow"));
    }

    #[test]
    fn test_reconciliation_gap_reports_year() {
        assert!(reconcile_cash(2, dec!(100), dec!(50), dec!(150)).is_ok());
        assert!(reconcile_cash(2, dec!(100), dec!(50), dec!(150.0000005)).is_ok());

        match reconcile_cash(3, dec!(100), dec!(50), dec!(149)) {
            Err(ModelError::Reconciliation { year, gap }) => {
                assert_eq!(year, 3);
                assert_eq!(gap, dec!(1));
            }
            other => panic!("expected reconciliation error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_tax_rate_rejected() {
        let a = CashflowAssumptions::default();
        let debt = build_debt_schedule(&financing(), None);
        let err = build_cashflow(
            &pnl_rows(dec!(2000), dec!(600)),
            &debt,
            &a,
            &terms(),
            &financing(),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::Validation { ref field, .. } if field == "cashflow.tax_rate"));
    }
}
