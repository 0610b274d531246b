use thiserror::Error;
use tracing::{debug, warn};

use crate::loan::amortization::max_principal;
use crate::loan::{LoanInputs, LoanResult};
use crate::policy::{DsrCeiling, LoanType, PolicyError, PolicyTable};

/// 1억 expressed in 만원.
pub const UK_IN_MAN: f64 = 10_000.0;
/// 1만원 expressed in won.
pub const MAN_IN_WON: f64 = 10_000.0;

#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("policy table is invalid: {0}")]
    InvalidPolicy(#[from] PolicyError),
    #[error("input {field} must be a finite non-negative number, got {value}")]
    InvalidInput { field: &'static str, value: f64 },
    #[error("{stage} produced a non-finite value")]
    NonFinite { stage: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StressBreakdown {
    pub loan_type_weight: Option<f64>,
    pub add_on_pct: f64,
    pub stress_rate_pct: f64,
}

/// Computes LTV- and DSR-bound loan ceilings under one policy table.
#[derive(Debug, Clone, Copy)]
pub struct LoanEligibilityEngine<'a> {
    policy: &'a PolicyTable,
}

impl<'a> LoanEligibilityEngine<'a> {
    pub fn new(policy: &'a PolicyTable) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &'a PolicyTable {
        self.policy
    }

    /// Returns `(ltv_limit_fraction, ltv_loan_amount)` with the amount in 만원.
    pub fn compute_ltv_loan(&self, inputs: &LoanInputs) -> (f64, f64) {
        let fraction = self.policy.ltv_fraction(inputs.ownership, inputs.region);
        let house_price_man = inputs.house_price_uk * UK_IN_MAN;
        (fraction, house_price_man * fraction)
    }

    pub fn stress(&self, loan_type: LoanType, interest_rate_pct: f64) -> StressBreakdown {
        let add_on_pct = self.policy.stress.add_on_pct(loan_type);
        StressBreakdown {
            loan_type_weight: self.policy.stress.loan_type_weight(loan_type),
            add_on_pct,
            stress_rate_pct: interest_rate_pct + add_on_pct,
        }
    }

    /// Largest principal (만원) whose level payment at the stress rate fits the
    /// repayment room left by the DSR ceiling, clamped to `ltv_loan_amount`.
    pub fn compute_dsr_loan(&self, inputs: &LoanInputs, ltv_loan_amount: f64) -> f64 {
        let stress = self.stress(inputs.loan_type, inputs.interest_rate_pct);
        let stress_rate = stress.stress_rate_pct;

        let allowed_annual = match self.policy.dsr_ceiling {
            DsrCeiling::FixedRatio { ratio } => inputs.annual_income_man * ratio,
            DsrCeiling::StressRate => inputs.annual_income_man * stress_rate / 100.0,
        };
        let available_annual = (allowed_annual - inputs.existing_annual_debt_service_man).max(0.0);

        let monthly_payment_won = available_annual / 12.0 * MAN_IN_WON;
        let monthly_rate = stress_rate / 100.0 / 12.0;
        let total_months = inputs.loan_term_years.saturating_mul(12);

        let principal_man = max_principal(monthly_payment_won, monthly_rate, total_months) / MAN_IN_WON;
        debug!(
            stress_rate,
            allowed_annual, available_annual, principal_man, "dsr ceiling computed"
        );
        ltv_loan_amount.min(principal_man)
    }

    pub fn resolve_price_tier_cap(&self, inputs: &LoanInputs) -> (f64, String) {
        let (cap, label) = self.policy.price_cap.resolve(inputs.house_price_uk);
        (cap, label.to_string())
    }

    /// Never fails: faults become a zeroed result with `error` set.
    pub fn compute(&self, inputs: &LoanInputs) -> LoanResult {
        match self.try_compute(inputs) {
            Ok(result) => result,
            Err(error) => {
                warn!(policy = %self.policy.id, "loan computation failed: {error}");
                LoanResult::failed(sanitize(inputs.cash_on_hand_man), error.to_string())
            }
        }
    }

    pub fn try_compute(&self, inputs: &LoanInputs) -> Result<LoanResult, ComputeError> {
        self.policy.validate_loan_rules()?;
        check_input("house_price_uk", inputs.house_price_uk)?;
        check_input("annual_income_man", inputs.annual_income_man)?;
        check_input(
            "existing_annual_debt_service_man",
            inputs.existing_annual_debt_service_man,
        )?;
        check_input("interest_rate_pct", inputs.interest_rate_pct)?;
        check_input("cash_on_hand_man", inputs.cash_on_hand_man)?;

        let (ltv_limit_fraction, ltv_loan_amount) = self.compute_ltv_loan(inputs);
        let ltv_loan_amount = finite("ltv loan", ltv_loan_amount)?;

        let stress = self.stress(inputs.loan_type, inputs.interest_rate_pct);
        let dsr_loan_amount = finite("dsr loan", self.compute_dsr_loan(inputs, ltv_loan_amount))?;

        let (price_tier_cap, price_tier_label) = self.resolve_price_tier_cap(inputs);
        let possible_loan_amount = dsr_loan_amount.min(price_tier_cap);
        let is_capped = dsr_loan_amount > price_tier_cap;
        let total_purchasing_power = finite(
            "purchasing power",
            possible_loan_amount + inputs.cash_on_hand_man,
        )?;

        debug!(
            policy = %self.policy.id,
            ltv_loan_amount, dsr_loan_amount, possible_loan_amount, is_capped, "loan eligibility computed"
        );

        Ok(LoanResult {
            ltv_limit_fraction,
            ltv_loan_amount,
            stress_add_on_pct: stress.add_on_pct,
            stress_rate_pct: stress.stress_rate_pct,
            loan_type_weight: stress.loan_type_weight,
            dsr_loan_amount,
            price_tier_cap,
            price_tier_label,
            possible_loan_amount,
            is_capped,
            total_purchasing_power,
            error: None,
        })
    }
}

pub fn compute_loan_eligibility(inputs: &LoanInputs, policy: &PolicyTable) -> LoanResult {
    LoanEligibilityEngine::new(policy).compute(inputs)
}

fn check_input(field: &'static str, value: f64) -> Result<(), ComputeError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ComputeError::InvalidInput { field, value })
    }
}

fn finite(stage: &'static str, value: f64) -> Result<f64, ComputeError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ComputeError::NonFinite { stage })
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::schema::{FactorWeight, FitFactor, VerdictTier};
    use crate::policy::{OwnershipStatus, PolicyPreset, Region};

    fn scenario() -> LoanInputs {
        LoanInputs {
            house_price_uk: 8.5,
            annual_income_man: 3_000.0,
            existing_annual_debt_service_man: 420.0,
            loan_term_years: 30,
            interest_rate_pct: 2.5,
            loan_type: LoanType::MixedFiveYear,
            ownership: OwnershipStatus::FirstTime,
            region: Region::Nowon,
            cash_on_hand_man: 10_000.0,
        }
    }

    fn annuity_man(available_annual_man: f64, stress_rate_pct: f64, years: u32) -> f64 {
        let payment = available_annual_man / 12.0 * 10_000.0;
        let r = stress_rate_pct / 100.0 / 12.0;
        let n = (years * 12) as i32;
        payment * (1.0 - (1.0 + r).powi(-n)) / r / 10_000.0
    }

    #[test]
    fn scenario_under_fixed_dsr_ratio() {
        let policy = PolicyPreset::StressWeighted.table();
        let result = compute_loan_eligibility(&scenario(), &policy);

        assert!(result.error.is_none());
        assert_eq!(result.ltv_limit_fraction, 0.70);
        assert!((result.ltv_loan_amount - 59_500.0).abs() < 1e-6);
        assert_eq!(result.loan_type_weight, Some(0.80));
        assert!((result.stress_rate_pct - 4.9).abs() < 1e-9);

        let expected = annuity_man(3_000.0 * 0.40 - 420.0, 4.9, 30);
        assert!((result.dsr_loan_amount - expected).abs() < 1e-6);
        assert!(result.dsr_loan_amount > 12_000.0 && result.dsr_loan_amount < 12_500.0);
        assert_eq!(result.price_tier_cap, 60_000.0);
        assert_eq!(result.possible_loan_amount, result.dsr_loan_amount.min(60_000.0));
        assert!(!result.is_capped);
        assert!(
            (result.total_purchasing_power - (result.possible_loan_amount + 10_000.0)).abs()
                < 1e-9
        );
    }

    #[test]
    fn scenario_under_stress_rate_ceiling_has_no_room() {
        // 3,000 × 4.9% = 147 < 420 already committed.
        let policy = PolicyPreset::October2025.table();
        let result = compute_loan_eligibility(&scenario(), &policy);

        assert!((result.ltv_loan_amount - 59_500.0).abs() < 1e-6);
        assert_eq!(result.dsr_loan_amount, 0.0);
        assert_eq!(result.possible_loan_amount, 0.0);
        assert_eq!(result.price_tier_cap, 60_000.0);
        assert_eq!(result.total_purchasing_power, 10_000.0);
    }

    #[test]
    fn flat_stress_ignores_loan_type() {
        let policy = PolicyPreset::Baseline2025.table();
        let engine = LoanEligibilityEngine::new(&policy);
        let fixed = engine.stress(LoanType::Fixed, 2.5);
        let variable = engine.stress(LoanType::Variable, 2.5);
        assert_eq!(fixed, variable);
        assert!((fixed.stress_rate_pct - 4.0).abs() < 1e-12);
    }

    #[test]
    fn multi_house_gets_no_loan() {
        for preset in PolicyPreset::ALL {
            let policy = preset.table();
            let mut inputs = scenario();
            inputs.ownership = OwnershipStatus::MultiHouse;
            inputs.annual_income_man = 50_000.0;
            let result = compute_loan_eligibility(&inputs, &policy);
            assert_eq!(result.ltv_loan_amount, 0.0);
            assert_eq!(result.dsr_loan_amount, 0.0);
            assert_eq!(result.total_purchasing_power, inputs.cash_on_hand_man);
        }
    }

    #[test]
    fn caps_large_loans_by_price_tier() {
        let policy = PolicyPreset::October2025.table();
        let mut inputs = scenario();
        inputs.house_price_uk = 30.0;
        inputs.annual_income_man = 30_000.0;
        inputs.existing_annual_debt_service_man = 0.0;

        let result = compute_loan_eligibility(&inputs, &policy);
        assert_eq!(result.price_tier_cap, 20_000.0);
        assert!(result.price_tier_label.contains("25억원 초과"));
        assert!(result.dsr_loan_amount > 20_000.0);
        assert!(result.is_capped);
        assert_eq!(result.possible_loan_amount, 20_000.0);
    }

    #[test]
    fn zero_term_or_rate_is_infeasible() {
        let policy = PolicyPreset::StressWeighted.table();
        let mut inputs = scenario();
        inputs.loan_term_years = 0;
        assert_eq!(compute_loan_eligibility(&inputs, &policy).dsr_loan_amount, 0.0);

        let mut inputs = scenario();
        inputs.loan_type = LoanType::Fixed;
        inputs.interest_rate_pct = 0.0;
        let result = compute_loan_eligibility(&inputs, &policy);
        assert_eq!(result.stress_rate_pct, 0.0);
        assert_eq!(result.dsr_loan_amount, 0.0);
        assert!(result.error.is_none());
    }

    #[test]
    fn income_never_lowers_dsr_loan() {
        for preset in PolicyPreset::ALL {
            let policy = preset.table();
            let mut previous = 0.0;
            for step in 0..=60 {
                let mut inputs = scenario();
                inputs.house_price_uk = 20.0;
                inputs.annual_income_man = f64::from(step) * 500.0;
                let dsr = compute_loan_eligibility(&inputs, &policy).dsr_loan_amount;
                assert!(dsr + 1e-9 >= previous, "{preset}: {dsr} < {previous}");
                previous = dsr;
            }
        }
    }

    #[test]
    fn ceilings_are_ordered_across_input_grid() {
        for preset in PolicyPreset::ALL {
            let policy = preset.table();
            for ownership in OwnershipStatus::ALL {
                for region in [Region::Gangnam, Region::Dobong] {
                    for price in [0.0, 5.0, 15.0, 20.0, 40.0] {
                        for income in [0.0, 2_500.0, 8_000.0, 40_000.0] {
                            for loan_type in LoanType::ALL {
                                let inputs = LoanInputs {
                                    house_price_uk: price,
                                    annual_income_man: income,
                                    existing_annual_debt_service_man: 300.0,
                                    loan_term_years: 30,
                                    interest_rate_pct: 3.8,
                                    loan_type,
                                    ownership,
                                    region,
                                    cash_on_hand_man: 0.0,
                                };
                                let r = compute_loan_eligibility(&inputs, &policy);
                                assert!(r.possible_loan_amount <= r.dsr_loan_amount + 1e-9);
                                assert!(r.dsr_loan_amount <= r.ltv_loan_amount + 1e-9);
                                assert!((0.0..=1.0).contains(&r.ltv_limit_fraction));
                                assert!(r.dsr_loan_amount >= 0.0);
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn invalid_policy_yields_error_result() {
        let mut policy = PolicyPreset::October2025.table();
        policy.ltv.first_time = 1.5;
        let result = compute_loan_eligibility(&scenario(), &policy);
        assert!(result.is_error());
        assert!(result
            .error
            .as_deref()
            .is_some_and(|e| e.contains("ltv.first_time")));
        assert_eq!(result.possible_loan_amount, 0.0);
        assert_eq!(result.total_purchasing_power, 10_000.0);
    }

    #[test]
    fn broken_scoring_model_does_not_affect_loans() {
        let mut policy = PolicyPreset::October2025.table();
        policy
            .scoring
            .advisories
            .retain(|a| a.tier != VerdictTier::VeryUnsuitable);
        policy.scoring.weights.push(FactorWeight {
            factor: FitFactor::DestinationRegulation,
            weight: 0.5,
        });
        assert!(policy.validate().is_err());

        let mut inputs = scenario();
        inputs.annual_income_man = 30_000.0;
        inputs.existing_annual_debt_service_man = 0.0;
        let result = compute_loan_eligibility(&inputs, &policy);
        assert!(result.error.is_none());
        assert!((result.ltv_loan_amount - 59_500.0).abs() < 1e-6);
        assert!(result.possible_loan_amount > 0.0);
    }

    #[test]
    fn negative_rate_zeroes_the_whole_result() {
        let policy = PolicyPreset::October2025.table();
        let mut inputs = scenario();
        inputs.interest_rate_pct = -1.5;
        let result = compute_loan_eligibility(&inputs, &policy);
        assert!(result
            .error
            .as_deref()
            .is_some_and(|e| e.contains("interest_rate_pct")));
        assert_eq!(result.ltv_loan_amount, 0.0);
        assert_eq!(result.dsr_loan_amount, 0.0);
        assert_eq!(result.total_purchasing_power, inputs.cash_on_hand_man);
    }

    #[test]
    fn non_finite_input_yields_error_result() {
        let policy = PolicyPreset::October2025.table();
        let mut inputs = scenario();
        inputs.annual_income_man = f64::NAN;
        let result = compute_loan_eligibility(&inputs, &policy);
        assert!(result
            .error
            .as_deref()
            .is_some_and(|e| e.contains("annual_income_man")));
        assert_eq!(result.dsr_loan_amount, 0.0);
    }
}
