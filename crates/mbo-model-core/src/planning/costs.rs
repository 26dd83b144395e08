use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

use crate::types::*;
use crate::ModelResult;

/// Headcount and loaded cost per year
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonnelDrivers {
    pub consultant_fte: Decimal,
    /// Fully loaded annual cost per consultant (EUR)
    pub consultant_loaded_cost: Money,
    pub backoffice_fte: Decimal,
    /// Fully loaded annual cost per backoffice FTE (EUR)
    pub backoffice_loaded_cost: Money,
    /// Total management cost (EUR)
    pub management_cost: Money,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedOverhead {
    pub advisory: Money,
    pub legal: Money,
    pub it_software: Money,
    pub office_rent: Money,
    pub services: Money,
    pub other_services: Money,
}

impl FixedOverhead {
    fn total(&self) -> Money {
        [
            self.advisory,
            self.legal,
            self.it_software,
            self.office_rent,
            self.services,
            self.other_services,
        ]
        .into_iter()
        .map(non_negative)
        .sum()
    }
}

/// How a variable cost line is driven
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostBasis {
    /// Value is a share of the year's final revenue
    PctOfRevenue,
    /// Value is an absolute EUR amount, inflation-indexed
    #[default]
    Fixed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VariableCost {
    pub basis: CostBasis,
    pub value: Decimal,
}

impl VariableCost {
    fn amount(&self, revenue: Money, inflation_factor: Decimal) -> Money {
        let value = non_negative(self.value);
        match self.basis {
            CostBasis::PctOfRevenue => revenue * value,
            CostBasis::Fixed => value * inflation_factor,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VariableCosts {
    pub training: VariableCost,
    pub travel: VariableCost,
    pub communication: VariableCost,
}

/// Cost drivers for one planning year
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CostYearDrivers {
    pub personnel: PersonnelDrivers,
    pub fixed_overhead: FixedOverhead,
    pub variable: VariableCosts,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Inflation {
    pub apply: bool,
    pub rate: Rate,
}

impl Inflation {
    /// Index applied to year `year`'s absolute cost amounts.
    pub fn factor(&self, year: usize) -> Decimal {
        if self.apply {
            (Decimal::ONE + self.rate).powi(year as i64)
        } else {
            Decimal::ONE
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostAssumptions {
    /// One entry per planning year
    pub years: Vec<CostYearDrivers>,
    #[serde(default)]
    pub inflation: Inflation,
}

impl CostAssumptions {
    /// Consultant headcount per year; revenue capacity is derived from it.
    pub fn consultant_fte(&self) -> Vec<Decimal> {
        self.years
            .iter()
            .map(|y| non_negative(y.personnel.consultant_fte))
            .collect()
    }
}

/// Per-year cost breakdown feeding the P&L
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostTotals {
    pub year: u32,
    pub consultant_costs: Money,
    pub backoffice_costs: Money,
    pub management_costs: Money,
    pub personnel_costs: Money,
    pub fixed_overhead: Money,
    pub variable_costs: Money,
    pub overhead_and_variable_costs: Money,
    pub total_operating_costs: Money,
}

/// Aggregate personnel, fixed overhead and variable costs per year.
pub fn aggregate_costs(
    assumptions: &CostAssumptions,
    revenue_final_by_year: &[Money],
) -> ModelResult<Vec<CostTotals>> {
    ensure_horizon("costs.years", &assumptions.years)?;
    ensure_horizon("revenue_final_by_year", revenue_final_by_year)?;

    let totals = assumptions
        .years
        .iter()
        .zip(revenue_final_by_year)
        .enumerate()
        .map(|(i, (drivers, &revenue))| {
            let f = assumptions.inflation.factor(i);
            let p = &drivers.personnel;

            let consultant_costs =
                non_negative(p.consultant_fte) * non_negative(p.consultant_loaded_cost) * f;
            let backoffice_costs =
                non_negative(p.backoffice_fte) * non_negative(p.backoffice_loaded_cost) * f;
            let management_costs = non_negative(p.management_cost) * f;
            let personnel_costs = consultant_costs + backoffice_costs + management_costs;

            let fixed_overhead = drivers.fixed_overhead.total() * f;
            let v = &drivers.variable;
            let variable_costs = v.training.amount(revenue, f)
                + v.travel.amount(revenue, f)
                + v.communication.amount(revenue, f);
            let overhead_and_variable_costs = fixed_overhead + variable_costs;

            CostTotals {
                year: i as u32,
                consultant_costs,
                backoffice_costs,
                management_costs,
                personnel_costs,
                fixed_overhead,
                variable_costs,
                overhead_and_variable_costs,
                total_operating_costs: personnel_costs + overhead_and_variable_costs,
            }
        })
        .collect();

    Ok(totals)
}

fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_year() -> CostYearDrivers {
        CostYearDrivers {
            personnel: PersonnelDrivers {
                consultant_fte: dec!(10),
                consultant_loaded_cost: dec!(100000),
                backoffice_fte: dec!(2),
                backoffice_loaded_cost: dec!(60000),
                management_cost: dec!(300000),
            },
            fixed_overhead: FixedOverhead {
                office_rent: dec!(100000),
                it_software: dec!(50000),
                ..Default::default()
            },
            variable: VariableCosts {
                training: VariableCost {
                    basis: CostBasis::PctOfRevenue,
                    value: dec!(0.01),
                },
                travel: VariableCost {
                    basis: CostBasis::Fixed,
                    value: dec!(20000),
                },
                communication: VariableCost::default(),
            },
        }
    }

    fn sample_assumptions() -> CostAssumptions {
        CostAssumptions {
            years: vec![sample_year(); HORIZON_YEARS],
            inflation: Inflation::default(),
        }
    }

    #[test]
    fn test_cost_totals_without_inflation() {
        let revenue = vec![dec!(2000000); HORIZON_YEARS];
        let out = aggregate_costs(&sample_assumptions(), &revenue).unwrap();
        let y0 = &out[0];

        assert_eq!(y0.consultant_costs, dec!(1000000));
        assert_eq!(y0.backoffice_costs, dec!(120000));
        assert_eq!(y0.personnel_costs, dec!(1420000));
        assert_eq!(y0.fixed_overhead, dec!(150000));
        // 1% of 2m revenue + 20k travel
        assert_eq!(y0.variable_costs, dec!(40000));
        assert_eq!(y0.overhead_and_variable_costs, dec!(190000));
        assert_eq!(y0.total_operating_costs, dec!(1610000));
    }

    #[test]
    fn test_inflation_indexes_absolute_costs_only() {
        let mut assumptions = sample_assumptions();
        assumptions.inflation = Inflation {
            apply: true,
            rate: dec!(0.10),
        };
        let revenue = vec![dec!(2000000); HORIZON_YEARS];
        let out = aggregate_costs(&assumptions, &revenue).unwrap();

        // Year 0 is never indexed
        assert_eq!(out[0].management_costs, dec!(300000));
        // Year 1: factor 1.1
        assert_eq!(out[1].management_costs, dec!(330000));
        assert_eq!(out[1].fixed_overhead, dec!(165000));
        // Revenue-linked training stays at 20k, travel inflates to 22k
        assert_eq!(out[1].variable_costs, dec!(42000));
    }

    #[test]
    fn test_negative_inputs_clamp_to_zero() {
        let mut assumptions = sample_assumptions();
        assumptions.years[0].personnel.management_cost = dec!(-5);
        assumptions.years[0].fixed_overhead.legal = dec!(-1000);
        let revenue = vec![dec!(2000000); HORIZON_YEARS];
        let out = aggregate_costs(&assumptions, &revenue).unwrap();
        assert_eq!(out[0].management_costs, Decimal::ZERO);
        assert_eq!(out[0].fixed_overhead, dec!(150000));
    }

    #[test]
    fn test_wrong_horizon_rejected() {
        let mut assumptions = sample_assumptions();
        assumptions.years.truncate(4);
        let revenue = vec![dec!(1); HORIZON_YEARS];
        assert!(aggregate_costs(&assumptions, &revenue).is_err());
        assert!(aggregate_costs(&sample_assumptions(), &revenue[..3]).is_err());
    }
}
