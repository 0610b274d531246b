pub mod amortization;
pub mod engine;
pub mod whatif;

use serde::{Deserialize, Serialize};

use crate::policy::{LoanType, OwnershipStatus, Region};

/// One borrower's submission. Prices are in 억, every other amount in 만원.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoanInputs {
    pub house_price_uk: f64,
    pub annual_income_man: f64,
    pub existing_annual_debt_service_man: f64,
    pub loan_term_years: u32,
    pub interest_rate_pct: f64,
    #[serde(default)]
    pub loan_type: LoanType,
    pub ownership: OwnershipStatus,
    pub region: Region,
    pub cash_on_hand_man: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoanResult {
    pub ltv_limit_fraction: f64,
    pub ltv_loan_amount: f64,
    pub stress_add_on_pct: f64,
    pub stress_rate_pct: f64,
    pub loan_type_weight: Option<f64>,
    pub dsr_loan_amount: f64,
    pub price_tier_cap: f64,
    pub price_tier_label: String,
    pub possible_loan_amount: f64,
    pub is_capped: bool,
    pub total_purchasing_power: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoanResult {
    /// Zeroed result carrying only the cash on hand, shown when computation failed.
    pub fn failed(cash_on_hand_man: f64, message: impl Into<String>) -> Self {
        Self {
            ltv_limit_fraction: 0.0,
            ltv_loan_amount: 0.0,
            stress_add_on_pct: 0.0,
            stress_rate_pct: 0.0,
            loan_type_weight: None,
            dsr_loan_amount: 0.0,
            price_tier_cap: 0.0,
            price_tier_label: String::new(),
            possible_loan_amount: 0.0,
            is_capped: false,
            total_purchasing_power: cash_on_hand_man.max(0.0),
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputChange {
    pub field: LoanField,
    pub from: f64,
    pub to: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum LoanField {
    HousePrice,
    AnnualIncome,
    ExistingDebtService,
    LoanTerm,
    InterestRate,
    CashOnHand,
}

impl std::fmt::Display for LoanField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::HousePrice => "house_price",
            Self::AnnualIncome => "annual_income",
            Self::ExistingDebtService => "existing_debt_service",
            Self::LoanTerm => "loan_term",
            Self::InterestRate => "interest_rate",
            Self::CashOnHand => "cash_on_hand",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for LoanField {
    type Err = crate::input::InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "house_price" | "price" => Ok(Self::HousePrice),
            "annual_income" | "income" => Ok(Self::AnnualIncome),
            "existing_debt_service" | "existing" => Ok(Self::ExistingDebtService),
            "loan_term" | "term" => Ok(Self::LoanTerm),
            "interest_rate" | "rate" => Ok(Self::InterestRate),
            "cash_on_hand" | "cash" => Ok(Self::CashOnHand),
            _ => Err(crate::input::InputError::Choice {
                field: "whatif field",
                message: format!("unknown field '{s}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatIfResult {
    pub changes_applied: Vec<InputChange>,
    pub before: LoanResult,
    pub after: LoanResult,
    pub possible_loan_change: f64,
    pub purchasing_power_change: f64,
}
