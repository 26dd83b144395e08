use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ModelError;
use crate::input::Scenario;
use crate::types::*;
use crate::ModelResult;

/// Revenue drivers for one scenario. Every vector holds one value per
/// planning year (index 0 = transaction close).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRevenueDrivers {
    /// Reference revenue the group guarantee is measured against
    pub reference_revenue: Money,
    /// Working days per consultant per year
    pub workdays_per_year: Vec<Decimal>,
    /// Billable utilization (0.70 = 70% of workdays billed)
    pub utilization_rate: Vec<Rate>,
    /// Day rate charged to the group (EUR)
    pub group_day_rate: Vec<Money>,
    /// Day rate charged to external clients (EUR)
    pub external_day_rate: Vec<Money>,
    /// Annual day-rate growth, compounded from year 0
    pub day_rate_growth: Vec<Rate>,
    /// Uplift applied to capacity days in the given year
    pub revenue_growth: Vec<Rate>,
    /// Share of capacity sold to the group
    pub group_capacity_share: Vec<Rate>,
    /// Share of capacity sold externally
    pub external_capacity_share: Vec<Rate>,
    /// Guaranteed share of reference revenue per year
    pub guarantee_pct: Vec<Rate>,
}

/// Revenue drivers keyed by scenario.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevenueAssumptions {
    pub scenarios: BTreeMap<Scenario, ScenarioRevenueDrivers>,
}

impl RevenueAssumptions {
    /// Drivers for `scenario`, or a validation error if none are configured.
    pub fn drivers(&self, scenario: Scenario) -> ModelResult<&ScenarioRevenueDrivers> {
        self.scenarios.get(&scenario).ok_or_else(|| {
            ModelError::validation(
                "revenue",
                format!("no revenue drivers configured for scenario '{scenario}'"),
            )
        })
    }
}

/// Per-year revenue breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueComponents {
    pub year: u32,
    pub consultant_fte: Decimal,
    pub capacity_days: Decimal,
    pub adjusted_capacity_days: Decimal,
    pub group_share: Rate,
    pub external_share: Rate,
    /// Capacity priced at the year's day rates, before the growth uplift
    pub capacity_revenue: Money,
    pub modeled_group_revenue: Money,
    pub modeled_external_revenue: Money,
    /// Group plus external revenue on growth-adjusted capacity
    pub growth_adjusted_revenue: Money,
    pub guaranteed_floor: Money,
    pub guaranteed_group_revenue: Money,
    pub final_total: Money,
    pub guaranteed_share: Rate,
}

/// Project revenue per year from capacity drivers and the group guarantee.
///
/// `consultant_fte` comes from the cost drivers, which own headcount.
pub fn project_revenue(
    drivers: &ScenarioRevenueDrivers,
    consultant_fte: &[Decimal],
) -> ModelResult<Vec<RevenueComponents>> {
    ensure_horizon("consultant_fte", consultant_fte)?;
    ensure_horizon("workdays_per_year", &drivers.workdays_per_year)?;
    ensure_horizon("utilization_rate", &drivers.utilization_rate)?;
    ensure_horizon("group_day_rate", &drivers.group_day_rate)?;
    ensure_horizon("external_day_rate", &drivers.external_day_rate)?;
    ensure_horizon("day_rate_growth", &drivers.day_rate_growth)?;
    ensure_horizon("revenue_growth", &drivers.revenue_growth)?;
    ensure_horizon("group_capacity_share", &drivers.group_capacity_share)?;
    ensure_horizon("external_capacity_share", &drivers.external_capacity_share)?;
    ensure_horizon("guarantee_pct", &drivers.guarantee_pct)?;

    let reference = non_negative(drivers.reference_revenue);
    let mut components = Vec::with_capacity(HORIZON_YEARS);

    for i in 0..HORIZON_YEARS {
        let fte = non_negative(consultant_fte[i]);

        let mut group_share = drivers.group_capacity_share[i];
        let mut external_share = drivers.external_capacity_share[i];
        let total_share = group_share + external_share;
        if total_share > Decimal::ZERO {
            group_share /= total_share;
            external_share /= total_share;
        }

        let rate_factor = (Decimal::ONE + drivers.day_rate_growth[i]).powi(i as i64);
        let group_rate = drivers.group_day_rate[i] * rate_factor;
        let external_rate = drivers.external_day_rate[i] * rate_factor;

        let capacity_days = fte * drivers.workdays_per_year[i] * drivers.utilization_rate[i];
        let adjusted_capacity_days = capacity_days * (Decimal::ONE + drivers.revenue_growth[i]);

        let capacity_revenue =
            capacity_days * (group_share * group_rate + external_share * external_rate);
        let modeled_group_revenue = adjusted_capacity_days * group_share * group_rate;
        let modeled_external_revenue = adjusted_capacity_days * external_share * external_rate;
        let growth_adjusted_revenue = modeled_group_revenue + modeled_external_revenue;

        // The guarantee only lifts group revenue; external revenue is never floored.
        let guaranteed_floor = reference * drivers.guarantee_pct[i];
        let guaranteed_group_revenue = modeled_group_revenue.max(guaranteed_floor);
        let final_total = guaranteed_group_revenue + modeled_external_revenue;

        components.push(RevenueComponents {
            year: i as u32,
            consultant_fte: fte,
            capacity_days,
            adjusted_capacity_days,
            group_share,
            external_share,
            capacity_revenue,
            modeled_group_revenue,
            modeled_external_revenue,
            growth_adjusted_revenue,
            guaranteed_floor,
            guaranteed_group_revenue,
            final_total,
            guaranteed_share: safe_divide(guaranteed_group_revenue, final_total),
        });
    }

    Ok(components)
}

fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn flat(value: Decimal) -> Vec<Decimal> {
        vec![value; HORIZON_YEARS]
    }

    fn sample_drivers() -> ScenarioRevenueDrivers {
        ScenarioRevenueDrivers {
            reference_revenue: dec!(10_000_000),
            workdays_per_year: flat(dec!(200)),
            utilization_rate: flat(dec!(0.5)),
            group_day_rate: flat(dec!(1000)),
            external_day_rate: flat(dec!(1500)),
            day_rate_growth: flat(Decimal::ZERO),
            revenue_growth: flat(Decimal::ZERO),
            group_capacity_share: flat(dec!(0.6)),
            external_capacity_share: flat(dec!(0.4)),
            guarantee_pct: flat(Decimal::ZERO),
        }
    }

    #[test]
    fn test_capacity_revenue_split() {
        let out = project_revenue(&sample_drivers(), &flat(dec!(10))).unwrap();
        let y0 = &out[0];

        // 10 FTE * 200 days * 50% = 1000 billable days
        assert_eq!(y0.capacity_days, dec!(1000));
        // Group: 600 days * 1000 = 600k, external: 400 days * 1500 = 600k
        assert_eq!(y0.modeled_group_revenue, dec!(600000));
        assert_eq!(y0.modeled_external_revenue, dec!(600000));
        assert_eq!(y0.final_total, dec!(1200000));
        assert_eq!(y0.capacity_revenue, y0.growth_adjusted_revenue);
    }

    #[test]
    fn test_guarantee_floor_lifts_group_revenue() {
        let mut drivers = sample_drivers();
        drivers.guarantee_pct = flat(dec!(0.10));
        let out = project_revenue(&drivers, &flat(dec!(10))).unwrap();
        let y0 = &out[0];

        // Floor = 10m * 10% = 1m > modeled group 600k
        assert_eq!(y0.guaranteed_floor, dec!(1000000));
        assert_eq!(y0.guaranteed_group_revenue, dec!(1000000));
        assert_eq!(y0.final_total, dec!(1600000));
        assert_eq!(y0.guaranteed_share, dec!(0.625));
    }

    #[test]
    fn test_shares_are_normalised() {
        let mut drivers = sample_drivers();
        drivers.group_capacity_share = flat(dec!(0.3));
        drivers.external_capacity_share = flat(dec!(0.2));
        let out = project_revenue(&drivers, &flat(dec!(10))).unwrap();
        assert_eq!(out[2].group_share, dec!(0.6));
        assert_eq!(out[2].external_share, dec!(0.4));
    }

    #[test]
    fn test_day_rate_growth_compounds() {
        let mut drivers = sample_drivers();
        drivers.day_rate_growth = flat(dec!(0.10));
        let out = project_revenue(&drivers, &flat(dec!(10))).unwrap();
        // Year 2: rates grow by 1.1^2 = 1.21
        assert_eq!(out[2].final_total, dec!(1200000) * dec!(1.21));
    }

    #[test]
    fn test_revenue_growth_uplifts_capacity() {
        let mut drivers = sample_drivers();
        drivers.revenue_growth = flat(dec!(0.05));
        let out = project_revenue(&drivers, &flat(dec!(10))).unwrap();
        assert_eq!(out[0].adjusted_capacity_days, dec!(1050));
        assert_eq!(out[0].capacity_revenue, dec!(1200000));
        assert_eq!(out[0].growth_adjusted_revenue, dec!(1260000));
    }

    #[test]
    fn test_zero_revenue_share_degrades_to_zero() {
        let out = project_revenue(&sample_drivers(), &flat(Decimal::ZERO)).unwrap();
        assert_eq!(out[0].final_total, Decimal::ZERO);
        assert_eq!(out[0].guaranteed_share, Decimal::ZERO);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let mut drivers = sample_drivers();
        drivers.utilization_rate.pop();
        let err = project_revenue(&drivers, &flat(dec!(10))).unwrap_err();
        assert!(matches!(err, ModelError::Validation { ref field, .. } if field == "utilization_rate"));
    }
}
