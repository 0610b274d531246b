//! Level-payment amortization helpers.

/// Present value of `periods` payments of `payment` at `periodic_rate`.
///
/// Returns 0 when there is nothing to repay with, no positive rate or no term;
/// a zero rate is treated as infeasible rather than as simple division.
pub fn max_principal(payment: f64, periodic_rate: f64, periods: u32) -> f64 {
    if payment <= 0.0 || periodic_rate <= 0.0 || periods == 0 {
        return 0.0;
    }
    let n = i32::try_from(periods).unwrap_or(i32::MAX);
    let discount = (1.0 + periodic_rate).powi(-n);
    payment * (1.0 - discount) / periodic_rate
}

/// Level monthly installment that amortizes `principal`, the inverse of [`max_principal`].
pub fn level_payment(principal: f64, periodic_rate: f64, periods: u32) -> f64 {
    if principal <= 0.0 || periodic_rate <= 0.0 || periods == 0 {
        return 0.0;
    }
    let n = i32::try_from(periods).unwrap_or(i32::MAX);
    let growth = (1.0 + periodic_rate).powi(n);
    principal * periodic_rate * growth / (growth - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_non_positive_inputs() {
        assert_eq!(max_principal(0.0, 0.01, 360), 0.0);
        assert_eq!(max_principal(-5.0, 0.01, 360), 0.0);
        assert_eq!(max_principal(1_000.0, 0.0, 360), 0.0);
        assert_eq!(max_principal(1_000.0, -0.01, 360), 0.0);
        assert_eq!(max_principal(1_000.0, 0.01, 0), 0.0);
    }

    #[test]
    fn single_period_discounts_once() {
        let pv = max_principal(101.0, 0.01, 1);
        assert!((pv - 100.0).abs() < 1e-9);
    }

    #[test]
    fn payment_and_principal_are_inverse() {
        let rate = 0.049 / 12.0;
        let principal = max_principal(650_000.0, rate, 360);
        let payment = level_payment(principal, rate, 360);
        assert!((payment - 650_000.0).abs() < 1e-6);
    }

    #[test]
    fn principal_never_exceeds_undiscounted_total() {
        let pv = max_principal(1_000.0, 0.003, 240);
        assert!(pv < 240_000.0);
        assert!(pv > 0.0);
    }
}
