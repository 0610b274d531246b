use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::policy::region::Region;
use crate::policy::schema::{
    Advisory, ConditionalLtvRule, DsrCeiling, FactorWeight, FitFactor, LoanType, LoanTypeWeight,
    LtvPolicy, OwnershipNote, OwnershipStatus, PolicyTable, PriceCapRule, PriceTier,
    ScoringModel, StressRule, VerdictTier,
};

const FIRST_TIME_LTV: f64 = 0.70;
const STRESS_SPREAD_PCT: f64 = 3.0;
const FLAT_STRESS_ADD_ON_PCT: f64 = 1.5;
const DSR_LIMIT: f64 = 0.40;
const FLAT_CAP_MAN: f64 = 60_000.0;

/// Built-in policy tables, oldest first.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyPreset {
    Baseline2025,
    StressWeighted,
    #[default]
    October2025,
}

impl PolicyPreset {
    pub const ALL: [PolicyPreset; 3] = [
        PolicyPreset::Baseline2025,
        PolicyPreset::StressWeighted,
        PolicyPreset::October2025,
    ];

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Baseline2025 => "baseline-2025",
            Self::StressWeighted => "stress-weighted",
            Self::October2025 => "oct-2025",
        }
    }

    pub fn table(&self) -> PolicyTable {
        match self {
            Self::Baseline2025 => baseline_2025(),
            Self::StressWeighted => stress_weighted(),
            Self::October2025 => october_2025(),
        }
    }
}

impl Display for PolicyPreset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_slug())
    }
}

#[derive(Debug, Error)]
#[error("unknown policy preset: {0}")]
pub struct PresetParseError(pub String);

impl FromStr for PolicyPreset {
    type Err = PresetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "baseline-2025" | "baseline" => Ok(Self::Baseline2025),
            "stress-weighted" | "weighted" => Ok(Self::StressWeighted),
            "oct-2025" | "october-2025" | "2025-10-15" | "latest" => Ok(Self::October2025),
            _ => Err(PresetParseError(s.to_string())),
        }
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn speculative_districts() -> Vec<Region> {
    vec![
        Region::Yongsan,
        Region::Seocho,
        Region::Gangnam,
        Region::Songpa,
    ]
}

fn weighted_stress() -> StressRule {
    StressRule::Weighted {
        spread_pct: STRESS_SPREAD_PCT,
        weights: vec![
            LoanTypeWeight {
                loan_type: LoanType::Fixed,
                weight: 0.00,
            },
            LoanTypeWeight {
                loan_type: LoanType::Variable,
                weight: 1.00,
            },
            LoanTypeWeight {
                loan_type: LoanType::MixedFiveYear,
                weight: 0.80,
            },
            LoanTypeWeight {
                loan_type: LoanType::PeriodicFiveYear,
                weight: 0.40,
            },
        ],
    }
}

fn region_tiered_ltv() -> LtvPolicy {
    LtvPolicy {
        first_time: FIRST_TIME_LTV,
        conditional_one_house: ConditionalLtvRule::RegionTiered {
            non_regulated: 0.70,
            regulated: 0.50,
        },
        multi_house: 0.0,
    }
}

fn flat_cap() -> PriceCapRule {
    PriceCapRule::Flat {
        cap_man: FLAT_CAP_MAN,
        label: "수도권 주택구입목적 주담대 → 최대 6억원 한도".to_string(),
    }
}

fn scoring(weights: &[(FitFactor, f64)]) -> ScoringModel {
    ScoringModel {
        factors: weights.iter().map(|(factor, _)| *factor).collect(),
        weights: weights
            .iter()
            .map(|(factor, weight)| FactorWeight {
                factor: *factor,
                weight: *weight,
            })
            .collect(),
        advisories: advisories(),
    }
}

fn advisories() -> Vec<Advisory> {
    [
        (
            VerdictTier::VerySuitable,
            "매우 안정적인 조건의 실수요자로 판단됩니다. 대부분의 정책 기준에 부합하여 주택 구매를 적극 검토할 수 있습니다.",
        ),
        (
            VerdictTier::Suitable,
            "현재 조건에서 주택 구매가 비교적 안정적입니다. 실수요로 판단될 가능성이 높습니다. 다만, 과도한 대출 비율에는 유의해야 합니다.",
        ),
        (
            VerdictTier::Neutral,
            "일정 조건에서는 주택 구매가 가능하나, 주의가 필요합니다. 청약 통장 등의 제도를 활용할 것을 추천합니다.",
        ),
        (
            VerdictTier::Unsuitable,
            "주택 구매 요건이 충분하지 않습니다. 실수요 요건 충족이 미흡하기 때문에 신중한 접근이 필요합니다.",
        ),
        (
            VerdictTier::VeryUnsuitable,
            "현재 상황에서 주택 구매는 매우 위험합니다. 실수요 가능성이 매우 낮아 정책상 규제나 금융 리스크에 크게 노출될 수 있습니다.",
        ),
    ]
    .into_iter()
    .map(|(tier, text)| Advisory {
        tier,
        text: text.to_string(),
    })
    .collect()
}

fn notes(conditional_text: &str, suffix: &str) -> Vec<OwnershipNote> {
    vec![
        OwnershipNote {
            ownership: OwnershipStatus::FirstTime,
            title: "생애최초구입자".to_string(),
            text: format!(
                "수도권, 규제지역 내 생애최초 주택구입 목적 주담대 : LTV 70%, 6개월 이내 전입 의무.{suffix}"
            ),
        },
        OwnershipNote {
            ownership: OwnershipStatus::ConditionalOneHouse,
            title: "0(처분 조건부 1주택자)".to_string(),
            text: format!(
                "주택담보대출 실행일로부터 6개월 내 기존 주택 처분(명의 이전 완료) 및 증빙 필요. 위반 시 기한의 이익 상실(대출금 즉시 회수), 향후 3년간 주택 관련 대출 제한.{suffix} {conditional_text}"
            ),
        },
        OwnershipNote {
            ownership: OwnershipStatus::MultiHouse,
            title: "1주택 이상".to_string(),
            text: format!(
                "다주택자 방지 : 추가 주택 구입 목적 주택담보대출 금지(LTV 0%).{suffix} 6개월 내 처분 후 추가 주택을 구매 예정이라면 '0(처분 조건부 1주택자)'를 선택하세요."
            ),
        },
    ]
}

fn baseline_2025() -> PolicyTable {
    PolicyTable {
        id: PolicyPreset::Baseline2025.as_slug().to_string(),
        label: "기본 규제 (고정 스트레스 가산, DSR 40%)".to_string(),
        effective_from: date(2025, 1, 1),
        regulated_regions: speculative_districts(),
        ltv: region_tiered_ltv(),
        stress: StressRule::Flat {
            add_on_pct: FLAT_STRESS_ADD_ON_PCT,
        },
        dsr_ceiling: DsrCeiling::FixedRatio { ratio: DSR_LIMIT },
        price_cap: flat_cap(),
        scoring: scoring(&[
            (FitFactor::LocationMatch, 0.25),
            (FitFactor::Disposition, 0.25),
            (FitFactor::JobSchool, 0.20),
            (FitFactor::StayPeriod, 0.20),
            (FitFactor::Subscription, 0.05),
            (FitFactor::DestinationRegulation, 0.05),
        ]),
        notes: notes(
            "비규제지역 LTV 70%, 규제지역(강남·서초·송파·용산) LTV 50% 적용.",
            "",
        ),
    }
}

fn stress_weighted() -> PolicyTable {
    PolicyTable {
        id: PolicyPreset::StressWeighted.as_slug().to_string(),
        label: "스트레스 DSR (금리유형별 가산 비중)".to_string(),
        effective_from: date(2025, 7, 1),
        regulated_regions: speculative_districts(),
        ltv: region_tiered_ltv(),
        stress: weighted_stress(),
        dsr_ceiling: DsrCeiling::FixedRatio { ratio: DSR_LIMIT },
        price_cap: flat_cap(),
        scoring: scoring(&[
            (FitFactor::LocationMatch, 0.20),
            (FitFactor::Disposition, 0.27),
            (FitFactor::JobSchool, 0.20),
            (FitFactor::StayPeriod, 0.27),
            (FitFactor::Subscription, 0.06),
        ]),
        notes: notes(
            "비규제지역 LTV 70%, 규제지역(강남·서초·송파·용산) LTV 50% 적용.",
            "",
        ),
    }
}

fn october_2025() -> PolicyTable {
    PolicyTable {
        id: PolicyPreset::October2025.as_slug().to_string(),
        label: "10·15 대책 (서울 전역 규제지역, 가격 구간별 한도)".to_string(),
        effective_from: date(2025, 10, 15),
        regulated_regions: Region::ALL.to_vec(),
        ltv: LtvPolicy {
            first_time: FIRST_TIME_LTV,
            conditional_one_house: ConditionalLtvRule::Flat { fraction: 0.40 },
            multi_house: 0.0,
        },
        stress: weighted_stress(),
        dsr_ceiling: DsrCeiling::StressRate,
        price_cap: PriceCapRule::Tiered {
            tiers: vec![
                PriceTier {
                    max_price_uk: Some(15.0),
                    cap_man: 60_000.0,
                    label: "주택가격 15억원 이하 → 최대 6억원 한도 [25.10.15 시행]".to_string(),
                },
                PriceTier {
                    max_price_uk: Some(25.0),
                    cap_man: 40_000.0,
                    label: "주택가격 15억 초과 25억원 이하 → 최대 4억원 한도 [25.10.15 시행]"
                        .to_string(),
                },
                PriceTier {
                    max_price_uk: None,
                    cap_man: 20_000.0,
                    label: "주택가격 25억원 초과 → 최대 2억원 한도 [25.10.15 시행]".to_string(),
                },
            ],
        },
        scoring: scoring(&[
            (FitFactor::LocationMatch, 0.25),
            (FitFactor::Disposition, 0.25),
            (FitFactor::JobSchool, 0.20),
            (FitFactor::StayPeriod, 0.20),
            (FitFactor::Subscription, 0.10),
        ]),
        notes: notes(
            "※서울시 25개 자치구 규제지역으로 지정 LTV 40% 적용.",
            " [25.10.15 시행]",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_validates() {
        for preset in PolicyPreset::ALL {
            let table = preset.table();
            table
                .validate()
                .unwrap_or_else(|e| panic!("{preset} failed validation: {e}"));
            assert_eq!(table.id, preset.as_slug());
            assert_eq!(table.notes.len(), 3);
        }
    }

    #[test]
    fn presets_are_ordered_by_effective_date() {
        let dates = PolicyPreset::ALL
            .iter()
            .map(|p| p.table().effective_from)
            .collect::<Vec<_>>();
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn october_preset_regulates_all_of_seoul() {
        let table = PolicyPreset::October2025.table();
        assert!(Region::ALL.iter().all(|r| table.is_regulated(*r)));
        assert_eq!(
            table.ltv_fraction(OwnershipStatus::ConditionalOneHouse, Region::Dobong),
            0.40
        );
    }

    #[test]
    fn baseline_conditional_ltv_depends_on_region() {
        let table = PolicyPreset::Baseline2025.table();
        assert_eq!(
            table.ltv_fraction(OwnershipStatus::ConditionalOneHouse, Region::Nowon),
            0.70
        );
        assert_eq!(
            table.ltv_fraction(OwnershipStatus::ConditionalOneHouse, Region::Gangnam),
            0.50
        );
    }

    #[test]
    fn parses_preset_aliases() {
        assert_eq!("latest".parse::<PolicyPreset>().unwrap(), PolicyPreset::October2025);
        assert_eq!("Baseline_2025".parse::<PolicyPreset>().unwrap(), PolicyPreset::Baseline2025);
        assert!("2019".parse::<PolicyPreset>().is_err());
    }

    #[test]
    fn fingerprints_differ_between_presets() {
        let a = PolicyPreset::Baseline2025.table().fingerprint();
        let b = PolicyPreset::StressWeighted.table().fingerprint();
        assert_ne!(a, b);
        assert_eq!(a, PolicyPreset::Baseline2025.table().fingerprint());
    }
}
