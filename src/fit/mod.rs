pub mod scorer;

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::policy::{FitFactor, Region, VerdictTier};

/// What the buyer plans to do with the home they live in now.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Disposition {
    Sell,
    LeaseOut,
    KeepOccupying,
    AlreadyRenting,
}

impl Disposition {
    pub const ALL: [Disposition; 4] = [
        Disposition::Sell,
        Disposition::LeaseOut,
        Disposition::KeepOccupying,
        Disposition::AlreadyRenting,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Sell => "매각",
            Self::LeaseOut => "전·월세",
            Self::KeepOccupying => "계속 거주",
            Self::AlreadyRenting => "현재 전·월세 거주 중",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum StayPeriod {
    UpToTwoYears,
    TwoToFourYears,
    FourToTenYears,
    TenYearsOrMore,
}

impl StayPeriod {
    pub const ALL: [StayPeriod; 4] = [
        StayPeriod::UpToTwoYears,
        StayPeriod::TwoToFourYears,
        StayPeriod::FourToTenYears,
        StayPeriod::TenYearsOrMore,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::UpToTwoYears => "2년 이하",
            Self::TwoToFourYears => "2~4년",
            Self::FourToTenYears => "4~10년",
            Self::TenYearsOrMore => "10년 이상",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown {kind}: {value}")]
pub struct ChoiceParseError {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for Disposition {
    type Err = ChoiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(found) = Disposition::ALL.iter().find(|d| d.label() == trimmed) {
            return Ok(*found);
        }
        match trimmed.to_ascii_lowercase().replace('_', "-").as_str() {
            "sell" | "sale" => Ok(Self::Sell),
            "lease-out" | "lease" | "rent-out" => Ok(Self::LeaseOut),
            "keep-occupying" | "keep" | "stay" => Ok(Self::KeepOccupying),
            "already-renting" | "renting" | "tenant" => Ok(Self::AlreadyRenting),
            _ => Err(ChoiceParseError {
                kind: "disposition",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for StayPeriod {
    type Err = ChoiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(found) = StayPeriod::ALL.iter().find(|p| p.label() == trimmed) {
            return Ok(*found);
        }
        match trimmed.to_ascii_lowercase().replace('_', "-").as_str() {
            "up-to-two-years" | "0-2" | "<=2" => Ok(Self::UpToTwoYears),
            "two-to-four-years" | "2-4" => Ok(Self::TwoToFourYears),
            "four-to-ten-years" | "4-10" => Ok(Self::FourToTenYears),
            "ten-years-or-more" | "10+" | ">=10" => Ok(Self::TenYearsOrMore),
            _ => Err(ChoiceParseError {
                kind: "stay period",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualitativeInputs {
    pub current_region: Region,
    pub destination_region: Region,
    pub disposition: Disposition,
    pub job_or_school_in_destination: bool,
    pub stay_period: StayPeriod,
    pub has_subscription_account: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FactorScore {
    pub factor: FitFactor,
    pub score: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualitativeResult {
    pub factor_scores: Vec<FactorScore>,
    pub fit_score: f64,
    pub verdict: VerdictTier,
    pub advisory: String,
}

impl QualitativeResult {
    pub fn score_of(&self, factor: FitFactor) -> Option<f64> {
        self.factor_scores
            .iter()
            .find(|s| s.factor == factor)
            .map(|s| s.score)
    }
}
