use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::ModelError;
use crate::types::{Money, Rate};
use crate::ModelResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.00000001);
const MAX_IRR_ITERATIONS: u32 = 100;
const BRACKET_LOW: Decimal = dec!(-0.9);
const BRACKET_HIGH: Decimal = dec!(1.0);
const BRACKET_LOW_FLOOR: Decimal = dec!(-0.001);
/// The high bound keeps doubling while it is below this cap.
const BRACKET_HIGH_CAP: Decimal = dec!(10);

/// Net Present Value of a series of periodic cash flows (index 0 undiscounted)
pub fn npv(rate: Rate, cash_flows: &[Money]) -> ModelResult<Money> {
    if rate <= dec!(-1) {
        return Err(ModelError::validation(
            "rate",
            "Discount rate must be greater than -100%",
        ));
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount
                .checked_mul(one_plus_r)
                .ok_or_else(|| out_of_range(rate, t))?;
        }
        if discount.is_zero() {
            return Err(ModelError::validation(
                "rate",
                format!("NPV discount factor underflows at period {t}"),
            ));
        }
        result = cf
            .checked_div(discount)
            .and_then(|pv| result.checked_add(pv))
            .ok_or_else(|| out_of_range(rate, t))?;
    }

    Ok(result)
}

fn out_of_range(rate: Rate, period: usize) -> ModelError {
    ModelError::validation(
        "rate",
        format!("NPV at rate {rate} exceeds the decimal range at period {period}"),
    )
}

/// Outcome of the IRR search
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IrrSolution {
    /// A sign change was bracketed and bisected
    Solved(Rate),
    /// No sign change in [-0.9, 16]; reported as an IRR of 0
    NoSignChange,
}

impl IrrSolution {
    pub fn rate(self) -> Rate {
        match self {
            IrrSolution::Solved(rate) => rate,
            IrrSolution::NoSignChange => Decimal::ZERO,
        }
    }
}

/// Internal Rate of Return by bisection on NPV.
///
/// The bracket starts at [-0.9, 1.0]. While both ends share a sign the high
/// bound doubles (up to 10). Without a sign change the result is
/// [`IrrSolution::NoSignChange`]; otherwise the bracket is halved up to 100
/// times or until |NPV(mid)| < 1e-8.
pub fn irr_bisection(cash_flows: &[Money]) -> ModelResult<IrrSolution> {
    let (mut low, mut npv_low) = low_bracket(cash_flows)?;
    let mut high = BRACKET_HIGH;
    let mut npv_high = npv(high, cash_flows)?;

    while same_sign(npv_low, npv_high) && high < BRACKET_HIGH_CAP {
        high *= dec!(2);
        npv_high = npv(high, cash_flows)?;
    }

    if same_sign(npv_low, npv_high) {
        return Ok(IrrSolution::NoSignChange);
    }

    for _ in 0..MAX_IRR_ITERATIONS {
        let mid = (low + high) / dec!(2);
        let npv_mid = npv(mid, cash_flows)?;

        if npv_mid.abs() < CONVERGENCE_THRESHOLD {
            return Ok(IrrSolution::Solved(mid));
        }

        if opposite_sign(npv_low, npv_mid) {
            high = mid;
        } else {
            low = mid;
            npv_low = npv_mid;
        }
    }

    Ok(IrrSolution::Solved((low + high) / dec!(2)))
}

/// Long series overflow Decimal near -90%; the low bound then moves halfway
/// towards zero until NPV can be evaluated.
fn low_bracket(cash_flows: &[Money]) -> ModelResult<(Rate, Money)> {
    let mut low = BRACKET_LOW;
    loop {
        match npv(low, cash_flows) {
            Ok(value) => return Ok((low, value)),
            Err(e) if low > BRACKET_LOW_FLOOR => return Err(e),
            Err(_) => low /= dec!(2),
        }
    }
}

// Sign tests instead of products: NPVs near the low bracket scale by 10^t
// and their product can overflow Decimal.
fn same_sign(a: Decimal, b: Decimal) -> bool {
    !a.is_zero() && !b.is_zero() && a.is_sign_negative() == b.is_sign_negative()
}

fn opposite_sign(a: Decimal, b: Decimal) -> bool {
    !a.is_zero() && !b.is_zero() && a.is_sign_negative() != b.is_sign_negative()
}

/// IRR with the zero fallback applied.
pub fn irr(cash_flows: &[Money]) -> ModelResult<Rate> {
    Ok(irr_bisection(cash_flows)?.rate())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // NPV at 10%: -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(1.0));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        let result = npv(dec!(0.0), &cfs).unwrap();
        assert_eq!(result, dec!(50));
    }

    #[test]
    fn test_npv_rejects_total_loss_rate() {
        assert!(npv(dec!(-1), &[dec!(1)]).is_err());
    }

    #[test]
    fn test_npv_out_of_range_is_an_error() {
        let mut cfs = vec![dec!(-100)];
        cfs.extend(std::iter::repeat(dec!(10)).take(35));
        // 0.1^t pushes 10 / discount past the decimal range
        let err = npv(dec!(-0.9), &cfs).unwrap_err();
        assert!(matches!(err, ModelError::Validation { .. }));
    }

    #[test]
    fn test_irr_long_series() {
        let mut cfs = vec![dec!(-100)];
        cfs.extend(std::iter::repeat(dec!(10)).take(35));
        assert_eq!(cfs.len(), 36);

        let result = irr(&cfs).unwrap();
        assert!(result > dec!(0.09) && result < dec!(0.10), "got {result}");
        assert!(npv(result, &cfs).unwrap().abs() < dec!(0.0001));
    }

    #[test]
    fn test_irr_single_period() {
        let result = irr(&[dec!(-100), dec!(110)]).unwrap();
        assert!((result - dec!(0.10)).abs() < dec!(0.000001), "got {result}");
    }

    #[test]
    fn test_irr_even_cashflows() {
        let result = irr(&[dec!(-1000), dec!(400), dec!(400), dec!(400)]).unwrap();
        // IRR ≈ 9.7%
        assert!((result - dec!(0.097)).abs() < dec!(0.01));
    }

    #[test]
    fn test_irr_above_initial_bracket() {
        // -100 then 300 after one year: 200% return needs the bracket to grow
        let result = irr(&[dec!(-100), dec!(300)]).unwrap();
        assert!((result - dec!(2)).abs() < dec!(0.000001), "got {result}");
    }

    #[test]
    fn test_irr_negative_return() {
        let result = irr(&[dec!(-100), dec!(50)]).unwrap();
        assert!((result - dec!(-0.5)).abs() < dec!(0.000001), "got {result}");
    }

    #[test]
    fn test_no_sign_change_falls_back_to_zero() {
        assert_eq!(
            irr_bisection(&[dec!(-100), dec!(-10), dec!(-10)]).unwrap(),
            IrrSolution::NoSignChange
        );
        assert_eq!(irr(&[dec!(-100), dec!(-10)]).unwrap(), Decimal::ZERO);
        assert_eq!(irr(&[dec!(100), dec!(10), dec!(10)]).unwrap(), Decimal::ZERO);
    }
}
