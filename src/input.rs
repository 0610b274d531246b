//! Parsing of raw form text into typed calculator inputs.
//!
//! In [`ParseMode::Lenient`] malformed or negative numbers fall back to zero, the way
//! an interactive form should behave. [`ParseMode::Strict`] reports them instead so
//! programmatic callers can tell "zero because invalid" from "zero because computed".

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::fit::{Disposition, QualitativeInputs, StayPeriod};
use crate::loan::LoanInputs;
use crate::policy::{LoanType, OwnershipStatus, Region};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    #[default]
    Lenient,
    Strict,
}

impl ParseMode {
    pub fn from_strict_flag(strict: bool) -> Self {
        if strict {
            Self::Strict
        } else {
            Self::Lenient
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("{field}: '{raw}' is not a number")]
    NotANumber { field: &'static str, raw: String },
    #[error("{field}: '{raw}' is not a whole number")]
    NotAWholeNumber { field: &'static str, raw: String },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("{field}: {message}")]
    Choice { field: &'static str, message: String },
}

/// Loan form fields exactly as typed by the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLoanForm {
    #[serde(default)]
    pub house_price_uk: String,
    #[serde(default)]
    pub annual_income_man: String,
    #[serde(default)]
    pub existing_annual_debt_service_man: String,
    #[serde(default)]
    pub loan_term_years: String,
    #[serde(default)]
    pub interest_rate_pct: String,
    #[serde(default)]
    pub cash_on_hand_man: String,
    #[serde(default)]
    pub loan_type: Option<String>,
    pub ownership: String,
    pub region: String,
}

/// Qualitative form selections as submitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFitForm {
    pub current_region: String,
    pub destination_region: String,
    pub disposition: String,
    pub job_or_school_in_destination: String,
    pub stay_period: String,
    pub has_subscription_account: String,
}

pub fn parse_amount(field: &'static str, raw: &str, mode: ParseMode) -> Result<f64, InputError> {
    let sanitized = raw.trim().replace([',', '_'], "");
    if sanitized.is_empty() {
        return Ok(0.0);
    }
    let value = match sanitized.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            return fallback(
                mode,
                InputError::NotANumber {
                    field,
                    raw: raw.to_string(),
                },
            )
        }
    };
    if value < 0.0 {
        return fallback(mode, InputError::Negative { field, value });
    }
    Ok(value)
}

pub fn parse_years(field: &'static str, raw: &str, mode: ParseMode) -> Result<u32, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    match trimmed.parse::<u32>() {
        Ok(years) => Ok(years),
        Err(_) => {
            let error = match trimmed.parse::<f64>() {
                Ok(value) if value < 0.0 => InputError::Negative { field, value },
                _ => InputError::NotAWholeNumber {
                    field,
                    raw: raw.to_string(),
                },
            };
            fallback(mode, error).map(|_| 0)
        }
    }
}

pub fn parse_flag(field: &'static str, raw: &str) -> Result<bool, InputError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "1" | "예" | "있음" => Ok(true),
        "n" | "no" | "false" | "0" | "아니오" | "없음" => Ok(false),
        _ => Err(InputError::Choice {
            field,
            message: format!("expected yes/no, got '{raw}'"),
        }),
    }
}

fn fallback(mode: ParseMode, error: InputError) -> Result<f64, InputError> {
    match mode {
        ParseMode::Strict => Err(error),
        ParseMode::Lenient => {
            warn!("{error}; using 0");
            Ok(0.0)
        }
    }
}

fn choice<T, E: std::fmt::Display>(
    field: &'static str,
    parsed: Result<T, E>,
) -> Result<T, InputError> {
    parsed.map_err(|e| InputError::Choice {
        field,
        message: e.to_string(),
    })
}

/// Numeric fields follow `mode`; categorical choices must always be valid.
/// A missing or blank loan type falls back to the most conservative one.
pub fn parse_loan_form(form: &RawLoanForm, mode: ParseMode) -> Result<LoanInputs, InputError> {
    let loan_type = match form.loan_type.as_deref().map(str::trim) {
        None | Some("") => LoanType::default(),
        Some(raw) => choice("loan_type", raw.parse::<LoanType>())?,
    };

    Ok(LoanInputs {
        house_price_uk: parse_amount("house_price_uk", &form.house_price_uk, mode)?,
        annual_income_man: parse_amount("annual_income_man", &form.annual_income_man, mode)?,
        existing_annual_debt_service_man: parse_amount(
            "existing_annual_debt_service_man",
            &form.existing_annual_debt_service_man,
            mode,
        )?,
        loan_term_years: parse_years("loan_term_years", &form.loan_term_years, mode)?,
        interest_rate_pct: parse_amount("interest_rate_pct", &form.interest_rate_pct, mode)?,
        loan_type,
        ownership: choice("ownership", form.ownership.parse::<OwnershipStatus>())?,
        region: choice("region", form.region.parse::<Region>())?,
        cash_on_hand_man: parse_amount("cash_on_hand_man", &form.cash_on_hand_man, mode)?,
    })
}

pub fn parse_fit_form(form: &RawFitForm) -> Result<QualitativeInputs, InputError> {
    Ok(QualitativeInputs {
        current_region: choice("current_region", form.current_region.parse::<Region>())?,
        destination_region: choice(
            "destination_region",
            form.destination_region.parse::<Region>(),
        )?,
        disposition: choice("disposition", form.disposition.parse::<Disposition>())?,
        job_or_school_in_destination: parse_flag(
            "job_or_school_in_destination",
            &form.job_or_school_in_destination,
        )?,
        stay_period: choice("stay_period", form.stay_period.parse::<StayPeriod>())?,
        has_subscription_account: parse_flag(
            "has_subscription_account",
            &form.has_subscription_account,
        )?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> RawLoanForm {
        RawLoanForm {
            house_price_uk: "8.5".to_string(),
            annual_income_man: "3,000".to_string(),
            existing_annual_debt_service_man: "420".to_string(),
            loan_term_years: "30".to_string(),
            interest_rate_pct: "2.5".to_string(),
            cash_on_hand_man: String::new(),
            loan_type: Some("mixed".to_string()),
            ownership: "생애 최초 구매".to_string(),
            region: "노원구".to_string(),
        }
    }

    #[test]
    fn parses_complete_form() {
        let inputs = parse_loan_form(&form(), ParseMode::Strict).expect("valid form");
        assert_eq!(inputs.house_price_uk, 8.5);
        assert_eq!(inputs.annual_income_man, 3_000.0);
        assert_eq!(inputs.loan_term_years, 30);
        assert_eq!(inputs.cash_on_hand_man, 0.0);
        assert_eq!(inputs.loan_type, LoanType::MixedFiveYear);
        assert_eq!(inputs.ownership, OwnershipStatus::FirstTime);
        assert_eq!(inputs.region, Region::Nowon);
    }

    #[test]
    fn lenient_mode_degrades_malformed_numbers_to_zero() {
        let mut raw = form();
        raw.house_price_uk = "팔억".to_string();
        raw.loan_term_years = "30.5".to_string();
        raw.interest_rate_pct = "-2".to_string();
        raw.annual_income_man = "NaN".to_string();
        let inputs = parse_loan_form(&raw, ParseMode::Lenient).expect("lenient never fails on numbers");
        assert_eq!(inputs.house_price_uk, 0.0);
        assert_eq!(inputs.loan_term_years, 0);
        assert_eq!(inputs.interest_rate_pct, 0.0);
        assert_eq!(inputs.annual_income_man, 0.0);
    }

    #[test]
    fn strict_mode_reports_the_offending_field() {
        let mut raw = form();
        raw.house_price_uk = "abc".to_string();
        let err = parse_loan_form(&raw, ParseMode::Strict).expect_err("invalid price");
        assert_eq!(
            err,
            InputError::NotANumber {
                field: "house_price_uk",
                raw: "abc".to_string()
            }
        );

        assert_eq!(
            parse_years("loan_term_years", "-3", ParseMode::Strict),
            Err(InputError::Negative {
                field: "loan_term_years",
                value: -3.0
            })
        );
        assert!(matches!(
            parse_amount("cash_on_hand_man", "-1", ParseMode::Strict),
            Err(InputError::Negative { .. })
        ));
    }

    #[test]
    fn blank_loan_type_defaults_to_variable() {
        let mut raw = form();
        raw.loan_type = None;
        assert_eq!(
            parse_loan_form(&raw, ParseMode::Lenient).unwrap().loan_type,
            LoanType::Variable
        );
        raw.loan_type = Some("  ".to_string());
        assert_eq!(
            parse_loan_form(&raw, ParseMode::Lenient).unwrap().loan_type,
            LoanType::Variable
        );
    }

    #[test]
    fn invalid_choices_fail_in_any_mode() {
        let mut raw = form();
        raw.region = "해운대구".to_string();
        assert!(matches!(
            parse_loan_form(&raw, ParseMode::Lenient),
            Err(InputError::Choice { field: "region", .. })
        ));
    }

    #[test]
    fn parses_fit_form_with_korean_answers() {
        let raw = RawFitForm {
            current_region: "마포구".to_string(),
            destination_region: "mapo".to_string(),
            disposition: "현재 전·월세 거주 중".to_string(),
            job_or_school_in_destination: "예".to_string(),
            stay_period: "10년 이상".to_string(),
            has_subscription_account: "없음".to_string(),
        };
        let inputs = parse_fit_form(&raw).expect("valid answers");
        assert_eq!(inputs.current_region, inputs.destination_region);
        assert_eq!(inputs.disposition, Disposition::AlreadyRenting);
        assert!(inputs.job_or_school_in_destination);
        assert_eq!(inputs.stay_period, StayPeriod::TenYearsOrMore);
        assert!(!inputs.has_subscription_account);
    }
}
