use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::policy::region::Region;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum LoanType {
    Fixed,
    #[default]
    Variable,
    MixedFiveYear,
    PeriodicFiveYear,
}

impl LoanType {
    pub const ALL: [LoanType; 4] = [
        LoanType::Fixed,
        LoanType::Variable,
        LoanType::MixedFiveYear,
        LoanType::PeriodicFiveYear,
    ];

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Variable => "variable",
            Self::MixedFiveYear => "mixed-five-year",
            Self::PeriodicFiveYear => "periodic-five-year",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Fixed => "완전 고정금리",
            Self::Variable => "변동형(5년 미만 변동주기)",
            Self::MixedFiveYear => "5년 혼합형(고정 5년 후 변동)",
            Self::PeriodicFiveYear => "5년 주기형(5년마다 재산정)",
        }
    }
}

impl Display for LoanType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Error)]
#[error("unknown loan type: {0}")]
pub struct LoanTypeParseError(pub String);

impl FromStr for LoanType {
    type Err = LoanTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(found) = LoanType::ALL.iter().find(|t| t.label() == trimmed) {
            return Ok(*found);
        }
        let normalized = trimmed.to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "fixed" => Ok(Self::Fixed),
            "variable" | "floating" => Ok(Self::Variable),
            "mixed-five-year" | "mixed" | "hybrid" => Ok(Self::MixedFiveYear),
            "periodic-five-year" | "periodic" => Ok(Self::PeriodicFiveYear),
            _ => Err(LoanTypeParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum OwnershipStatus {
    FirstTime,
    ConditionalOneHouse,
    MultiHouse,
}

impl OwnershipStatus {
    pub const ALL: [OwnershipStatus; 3] = [
        OwnershipStatus::FirstTime,
        OwnershipStatus::ConditionalOneHouse,
        OwnershipStatus::MultiHouse,
    ];

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::FirstTime => "first-time",
            Self::ConditionalOneHouse => "conditional-one-house",
            Self::MultiHouse => "multi-house",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FirstTime => "생애 최초 구매",
            Self::ConditionalOneHouse => "0(처분 조건부 1주택자)",
            Self::MultiHouse => "1주택 이상",
        }
    }
}

impl Display for OwnershipStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Error)]
#[error("unknown ownership status: {0}")]
pub struct OwnershipParseError(pub String);

impl FromStr for OwnershipStatus {
    type Err = OwnershipParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(found) = OwnershipStatus::ALL.iter().find(|o| o.label() == trimmed) {
            return Ok(*found);
        }
        let normalized = trimmed.to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "first-time" | "first" => Ok(Self::FirstTime),
            "conditional-one-house" | "conditional" | "one-house" => Ok(Self::ConditionalOneHouse),
            "multi-house" | "multi" => Ok(Self::MultiHouse),
            _ => Err(OwnershipParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ConditionalLtvRule {
    /// Non-regulated districts get the higher fraction.
    RegionTiered { non_regulated: f64, regulated: f64 },
    Flat { fraction: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LtvPolicy {
    pub first_time: f64,
    pub conditional_one_house: ConditionalLtvRule,
    pub multi_house: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoanTypeWeight {
    pub loan_type: LoanType,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum StressRule {
    Flat {
        add_on_pct: f64,
    },
    Weighted {
        spread_pct: f64,
        weights: Vec<LoanTypeWeight>,
    },
}

impl StressRule {
    /// Weight applied to the spread for `loan_type`. Flat rules carry no weight.
    /// Types missing from a weighted table get the full spread.
    pub fn loan_type_weight(&self, loan_type: LoanType) -> Option<f64> {
        match self {
            StressRule::Flat { .. } => None,
            StressRule::Weighted { weights, .. } => Some(
                weights
                    .iter()
                    .find(|w| w.loan_type == loan_type)
                    .map(|w| w.weight)
                    .unwrap_or(1.0),
            ),
        }
    }

    pub fn add_on_pct(&self, loan_type: LoanType) -> f64 {
        match self {
            StressRule::Flat { add_on_pct } => *add_on_pct,
            StressRule::Weighted { spread_pct, .. } => {
                spread_pct * self.loan_type_weight(loan_type).unwrap_or(1.0)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum DsrCeiling {
    /// Allowed annual repayment is `income × ratio`.
    FixedRatio { ratio: f64 },
    /// Allowed annual repayment is `income × stress_rate / 100`.
    StressRate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceTier {
    /// Inclusive upper bound in 억. `None` closes the ladder.
    pub max_price_uk: Option<f64>,
    pub cap_man: f64,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum PriceCapRule {
    Flat { cap_man: f64, label: String },
    Tiered { tiers: Vec<PriceTier> },
}

impl PriceCapRule {
    pub fn resolve(&self, house_price_uk: f64) -> (f64, &str) {
        match self {
            PriceCapRule::Flat { cap_man, label } => (*cap_man, label.as_str()),
            PriceCapRule::Tiered { tiers } => {
                let tier = tiers
                    .iter()
                    .find(|t| t.max_price_uk.map_or(true, |max| house_price_uk <= max))
                    .or_else(|| tiers.last());
                match tier {
                    Some(t) => (t.cap_man, t.label.as_str()),
                    None => (0.0, ""),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum FitFactor {
    LocationMatch,
    Disposition,
    JobSchool,
    StayPeriod,
    Subscription,
    DestinationRegulation,
}

impl FitFactor {
    pub fn label(&self) -> &'static str {
        match self {
            Self::LocationMatch => "거주지 일치",
            Self::Disposition => "현 거주지 처리",
            Self::JobSchool => "직장/학교 위치",
            Self::StayPeriod => "예상 거주 기간",
            Self::Subscription => "청약 통장",
            Self::DestinationRegulation => "규제지역 여부",
        }
    }
}

impl Display for FitFactor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let slug = match self {
            Self::LocationMatch => "location_match",
            Self::Disposition => "disposition",
            Self::JobSchool => "job_school",
            Self::StayPeriod => "stay_period",
            Self::Subscription => "subscription",
            Self::DestinationRegulation => "destination_regulation",
        };
        write!(f, "{slug}")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum VerdictTier {
    VeryUnsuitable,
    Unsuitable,
    Neutral,
    Suitable,
    VerySuitable,
}

impl VerdictTier {
    pub const ALL: [VerdictTier; 5] = [
        VerdictTier::VeryUnsuitable,
        VerdictTier::Unsuitable,
        VerdictTier::Neutral,
        VerdictTier::Suitable,
        VerdictTier::VerySuitable,
    ];

    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::VerySuitable
        } else if score >= 60.0 {
            Self::Suitable
        } else if score >= 40.0 {
            Self::Neutral
        } else if score >= 20.0 {
            Self::Unsuitable
        } else {
            Self::VeryUnsuitable
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::VeryUnsuitable => "매우 부적합",
            Self::Unsuitable => "부적합",
            Self::Neutral => "보통",
            Self::Suitable => "적합",
            Self::VerySuitable => "매우 적합",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FactorWeight {
    pub factor: FitFactor,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Advisory {
    pub tier: VerdictTier,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringModel {
    pub factors: Vec<FitFactor>,
    pub weights: Vec<FactorWeight>,
    pub advisories: Vec<Advisory>,
}

impl ScoringModel {
    pub fn weight_of(&self, factor: FitFactor) -> Option<f64> {
        self.weights
            .iter()
            .find(|w| w.factor == factor)
            .map(|w| w.weight)
    }

    pub fn advisory(&self, tier: VerdictTier) -> Option<&str> {
        self.advisories
            .iter()
            .find(|a| a.tier == tier)
            .map(|a| a.text.as_str())
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        let mut active = BTreeSet::new();
        for factor in &self.factors {
            if !active.insert(*factor) {
                return Err(PolicyError::DuplicateFactor(*factor));
            }
        }

        let mut weighted = BTreeSet::new();
        let mut sum = 0.0;
        for entry in &self.weights {
            if !weighted.insert(entry.factor) {
                return Err(PolicyError::DuplicateFactor(entry.factor));
            }
            check_non_negative(&format!("scoring.weights.{}", entry.factor), entry.weight)?;
            sum += entry.weight;
        }

        if active != weighted {
            return Err(PolicyError::FactorSetMismatch {
                missing: active.difference(&weighted).copied().collect(),
                unexpected: weighted.difference(&active).copied().collect(),
            });
        }
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(PolicyError::WeightSum { sum });
        }

        for tier in VerdictTier::ALL {
            if self.advisory(tier).is_none() {
                return Err(PolicyError::MissingAdvisory(tier));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OwnershipNote {
    pub ownership: OwnershipStatus,
    pub title: String,
    pub text: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("{field} must be within [0, 1], got {value}")]
    FractionOutOfRange { field: String, value: f64 },
    #[error("{field} must be a non-negative number, got {value}")]
    Negative { field: String, value: f64 },
    #[error("price cap ladder has no tiers")]
    EmptyPriceTiers,
    #[error("price cap tiers must have ascending bounds and end with an open tier")]
    MalformedPriceTiers,
    #[error("factor {0} appears more than once")]
    DuplicateFactor(FitFactor),
    #[error("weight keys do not match active factors (missing {missing:?}, unexpected {unexpected:?})")]
    FactorSetMismatch {
        missing: Vec<FitFactor>,
        unexpected: Vec<FitFactor>,
    },
    #[error("scoring weights must sum to 1.0, got {sum:.6}")]
    WeightSum { sum: f64 },
    #[error("no advisory text for verdict tier {0:?}")]
    MissingAdvisory(VerdictTier),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionStatus {
    pub region: Region,
    pub name: String,
    pub regulated: bool,
}

/// Regulatory parameters that drive both calculators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyTable {
    pub id: String,
    pub label: String,
    pub effective_from: NaiveDate,
    pub regulated_regions: Vec<Region>,
    pub ltv: LtvPolicy,
    pub stress: StressRule,
    pub dsr_ceiling: DsrCeiling,
    pub price_cap: PriceCapRule,
    pub scoring: ScoringModel,
    #[serde(default)]
    pub notes: Vec<OwnershipNote>,
}

impl PolicyTable {
    pub fn is_regulated(&self, region: Region) -> bool {
        self.regulated_regions.contains(&region)
    }

    pub fn ltv_fraction(&self, ownership: OwnershipStatus, region: Region) -> f64 {
        match ownership {
            OwnershipStatus::FirstTime => self.ltv.first_time,
            OwnershipStatus::ConditionalOneHouse => match &self.ltv.conditional_one_house {
                ConditionalLtvRule::RegionTiered {
                    non_regulated,
                    regulated,
                } => {
                    if self.is_regulated(region) {
                        *regulated
                    } else {
                        *non_regulated
                    }
                }
                ConditionalLtvRule::Flat { fraction } => *fraction,
            },
            OwnershipStatus::MultiHouse => self.ltv.multi_house,
        }
    }

    /// Every district in canonical order with its regulation flag.
    pub fn region_statuses(&self) -> Vec<RegionStatus> {
        Region::ALL
            .iter()
            .map(|region| RegionStatus {
                region: *region,
                name: region.korean_name().to_string(),
                regulated: self.is_regulated(*region),
            })
            .collect()
    }

    pub fn note_for(&self, ownership: OwnershipStatus) -> Option<&OwnershipNote> {
        self.notes.iter().find(|n| n.ownership == ownership)
    }

    /// SHA-256 over the canonical JSON form; equal tables share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let canonical = serde_json::to_string(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Full check: loan rules plus the scoring model.
    pub fn validate(&self) -> Result<(), PolicyError> {
        self.validate_loan_rules()?;
        self.scoring.validate()
    }

    /// LTV, stress, DSR ceiling and price cap only; the scoring model is not consulted.
    pub fn validate_loan_rules(&self) -> Result<(), PolicyError> {
        check_fraction("ltv.first_time", self.ltv.first_time)?;
        check_fraction("ltv.multi_house", self.ltv.multi_house)?;
        match &self.ltv.conditional_one_house {
            ConditionalLtvRule::RegionTiered {
                non_regulated,
                regulated,
            } => {
                check_fraction("ltv.conditional_one_house.non_regulated", *non_regulated)?;
                check_fraction("ltv.conditional_one_house.regulated", *regulated)?;
            }
            ConditionalLtvRule::Flat { fraction } => {
                check_fraction("ltv.conditional_one_house.fraction", *fraction)?;
            }
        }

        match &self.stress {
            StressRule::Flat { add_on_pct } => check_non_negative("stress.add_on_pct", *add_on_pct)?,
            StressRule::Weighted {
                spread_pct,
                weights,
            } => {
                check_non_negative("stress.spread_pct", *spread_pct)?;
                for w in weights {
                    check_fraction(&format!("stress.weights.{}", w.loan_type.as_slug()), w.weight)?;
                }
            }
        }

        if let DsrCeiling::FixedRatio { ratio } = &self.dsr_ceiling {
            check_fraction("dsr_ceiling.ratio", *ratio)?;
        }

        match &self.price_cap {
            PriceCapRule::Flat { cap_man, .. } => check_non_negative("price_cap.cap_man", *cap_man)?,
            PriceCapRule::Tiered { tiers } => validate_tiers(tiers)?,
        }
        Ok(())
    }
}

fn validate_tiers(tiers: &[PriceTier]) -> Result<(), PolicyError> {
    if tiers.is_empty() {
        return Err(PolicyError::EmptyPriceTiers);
    }
    let mut previous: Option<f64> = None;
    for (idx, tier) in tiers.iter().enumerate() {
        check_non_negative("price_cap.tiers.cap_man", tier.cap_man)?;
        let is_last = idx + 1 == tiers.len();
        match (tier.max_price_uk, is_last) {
            (None, true) => {}
            (Some(max), false) => {
                if previous.is_some_and(|p| max <= p) {
                    return Err(PolicyError::MalformedPriceTiers);
                }
                previous = Some(max);
            }
            _ => return Err(PolicyError::MalformedPriceTiers),
        }
    }
    Ok(())
}

fn check_fraction(field: &str, value: f64) -> Result<(), PolicyError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(PolicyError::FractionOutOfRange {
            field: field.to_string(),
            value,
        })
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<(), PolicyError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(PolicyError::Negative {
            field: field.to_string(),
            value,
        })
    }
}
