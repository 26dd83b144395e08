use serde::{Deserialize, Serialize};
use std::fmt;

use crate::financing::debt::FinancingAssumptions;
use crate::investment::returns::ValuationAssumptions;
use crate::planning::costs::CostAssumptions;
use crate::planning::revenue::RevenueAssumptions;
use crate::statements::cashflow::{CashflowAssumptions, TransactionTerms};

/// Revenue scenario selector
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    #[default]
    Base,
    Best,
    Worst,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Base, Scenario::Best, Scenario::Worst];
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scenario::Base => "base",
            Scenario::Best => "best",
            Scenario::Worst => "worst",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base" => Ok(Scenario::Base),
            "best" => Ok(Scenario::Best),
            "worst" => Ok(Scenario::Worst),
            other => Err(format!("unknown scenario '{other}' (expected base, best or worst)")),
        }
    }
}

/// Immutable snapshot of every assumption the engine consumes.
///
/// Optional groups and fields fall back to the defaults documented on their
/// `Default` impls; `financing.initial_debt`, `financing.interest_rate`,
/// `transaction` and `cashflow.tax_rate` have no default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInput {
    #[serde(default)]
    pub scenario: Scenario,
    pub revenue: RevenueAssumptions,
    pub costs: CostAssumptions,
    pub financing: FinancingAssumptions,
    #[serde(default)]
    pub cashflow: CashflowAssumptions,
    pub transaction: TransactionTerms,
    #[serde(default)]
    pub valuation: ValuationAssumptions,
}

impl ModelInput {
    /// Copy of this snapshot with a different revenue scenario selected.
    pub fn with_scenario(&self, scenario: Scenario) -> Self {
        ModelInput {
            scenario,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::financing::debt::AmortizationType;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_minimal_snapshot_takes_documented_defaults() {
        let json = serde_json::json!({
            "revenue": {},
            "costs": { "years": [] },
            "financing": { "initial_debt": "1000000", "interest_rate": "0.05" },
            "transaction": { "purchase_price": "1500000", "equity_contribution": "500000" }
        });
        let input: ModelInput = serde_json::from_value(json).unwrap();

        assert_eq!(input.scenario, Scenario::Base);
        assert_eq!(input.financing.amortization_type, AmortizationType::Linear);
        assert_eq!(input.financing.amortization_period_years, 5);
        assert_eq!(input.financing.grace_period_years, 0);
        assert_eq!(input.financing.special_repayment_year, None);
        assert_eq!(input.financing.special_repayment_amount, Decimal::ZERO);
        assert_eq!(input.financing.minimum_dscr, dec!(1.3));
        assert_eq!(input.cashflow.tax_payment_lag_years, 0);
        assert_eq!(input.cashflow.capex_pct_revenue, Decimal::ZERO);
        assert_eq!(input.cashflow.working_capital_pct_revenue, Decimal::ZERO);
        assert_eq!(input.cashflow.opening_cash_balance, Decimal::ZERO);
        assert_eq!(input.cashflow.depreciation_rate, dec!(0.20));
        assert_eq!(input.cashflow.tax_rate, None);
        assert_eq!(input.valuation.exit_multiple, None);
    }

    #[test]
    fn test_scenario_parsing() {
        assert_eq!("Best".parse::<Scenario>().unwrap(), Scenario::Best);
        assert!("stress".parse::<Scenario>().is_err());
        assert_eq!(Scenario::Worst.to_string(), "worst");
    }
}
