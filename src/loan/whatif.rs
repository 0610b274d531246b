use tracing::warn;

use crate::loan::engine::LoanEligibilityEngine;
use crate::loan::{InputChange, LoanField, LoanInputs, WhatIfResult};

pub fn field_value(inputs: &LoanInputs, field: LoanField) -> f64 {
    match field {
        LoanField::HousePrice => inputs.house_price_uk,
        LoanField::AnnualIncome => inputs.annual_income_man,
        LoanField::ExistingDebtService => inputs.existing_annual_debt_service_man,
        LoanField::LoanTerm => f64::from(inputs.loan_term_years),
        LoanField::InterestRate => inputs.interest_rate_pct,
        LoanField::CashOnHand => inputs.cash_on_hand_man,
    }
}

/// Sets `field` to `to`. Returns false and leaves `inputs` untouched for
/// negative or non-finite targets.
pub fn apply_change(inputs: &mut LoanInputs, field: LoanField, to: f64) -> bool {
    if !to.is_finite() || to < 0.0 {
        return false;
    }
    match field {
        LoanField::HousePrice => inputs.house_price_uk = to,
        LoanField::AnnualIncome => inputs.annual_income_man = to,
        LoanField::ExistingDebtService => inputs.existing_annual_debt_service_man = to,
        LoanField::LoanTerm => inputs.loan_term_years = to.round().min(f64::from(u32::MAX)) as u32,
        LoanField::InterestRate => inputs.interest_rate_pct = to,
        LoanField::CashOnHand => inputs.cash_on_hand_man = to,
    }
    true
}

pub fn simulate_whatif(
    engine: &LoanEligibilityEngine<'_>,
    current: &LoanInputs,
    target_changes: &[(LoanField, f64)],
) -> WhatIfResult {
    let before = engine.compute(current);

    let mut changed = current.clone();
    let mut changes_applied = Vec::new();
    for (field, to) in target_changes {
        let from = field_value(&changed, *field);
        if apply_change(&mut changed, *field, *to) {
            changes_applied.push(InputChange {
                field: *field,
                from,
                to: field_value(&changed, *field),
            });
        } else {
            warn!("ignoring what-if change {field} -> {to}");
        }
    }

    let after = engine.compute(&changed);
    let possible_loan_change = after.possible_loan_amount - before.possible_loan_amount;
    let purchasing_power_change = after.total_purchasing_power - before.total_purchasing_power;

    WhatIfResult {
        changes_applied,
        before,
        after,
        possible_loan_change,
        purchasing_power_change,
    }
}
