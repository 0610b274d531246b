use tracing::debug;

use crate::fit::{Disposition, FactorScore, QualitativeInputs, QualitativeResult, StayPeriod};
use crate::policy::{FitFactor, PolicyError, PolicyTable, VerdictTier};

/// Weighted relocation-suitability score under one policy's scoring model.
#[derive(Debug, Clone, Copy)]
pub struct QualitativeFitScorer<'a> {
    policy: &'a PolicyTable,
}

impl<'a> QualitativeFitScorer<'a> {
    /// Refuses a scoring model whose weights do not cover the active factors exactly.
    pub fn new(policy: &'a PolicyTable) -> Result<Self, PolicyError> {
        policy.scoring.validate()?;
        Ok(Self { policy })
    }

    pub fn raw_score(&self, factor: FitFactor, inputs: &QualitativeInputs) -> f64 {
        match factor {
            FitFactor::LocationMatch => {
                if inputs.current_region == inputs.destination_region {
                    100.0
                } else {
                    50.0
                }
            }
            FitFactor::Disposition => match inputs.disposition {
                Disposition::Sell => 75.0,
                Disposition::LeaseOut => 50.0,
                Disposition::KeepOccupying => 25.0,
                Disposition::AlreadyRenting => 100.0,
            },
            FitFactor::JobSchool => binary(inputs.job_or_school_in_destination),
            FitFactor::StayPeriod => match inputs.stay_period {
                StayPeriod::UpToTwoYears => 25.0,
                StayPeriod::TwoToFourYears => 50.0,
                StayPeriod::FourToTenYears => 75.0,
                StayPeriod::TenYearsOrMore => 100.0,
            },
            FitFactor::Subscription => binary(inputs.has_subscription_account),
            FitFactor::DestinationRegulation => {
                binary(!self.policy.is_regulated(inputs.destination_region))
            }
        }
    }

    pub fn compute(&self, inputs: &QualitativeInputs) -> QualitativeResult {
        let scoring = &self.policy.scoring;
        let factor_scores = scoring
            .factors
            .iter()
            .map(|factor| FactorScore {
                factor: *factor,
                score: self.raw_score(*factor, inputs),
                weight: scoring.weight_of(*factor).unwrap_or(0.0),
            })
            .collect::<Vec<_>>();

        let fit_score = factor_scores
            .iter()
            .map(|s| s.score * s.weight)
            .sum::<f64>()
            .clamp(0.0, 100.0);
        let verdict = VerdictTier::from_score(fit_score);
        let advisory = scoring.advisory(verdict).unwrap_or_default().to_string();

        debug!(policy = %self.policy.id, fit_score, ?verdict, "fit score computed");

        QualitativeResult {
            factor_scores,
            fit_score,
            verdict,
            advisory,
        }
    }
}

pub fn compute_qualitative_fit(
    inputs: &QualitativeInputs,
    policy: &PolicyTable,
) -> Result<QualitativeResult, PolicyError> {
    Ok(QualitativeFitScorer::new(policy)?.compute(inputs))
}

fn binary(favourable: bool) -> f64 {
    if favourable {
        100.0
    } else {
        50.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::schema::FactorWeight;
    use crate::policy::{PolicyPreset, Region};

    fn best_case() -> QualitativeInputs {
        QualitativeInputs {
            current_region: Region::Nowon,
            destination_region: Region::Nowon,
            disposition: Disposition::AlreadyRenting,
            job_or_school_in_destination: true,
            stay_period: StayPeriod::TenYearsOrMore,
            has_subscription_account: true,
        }
    }

    fn worst_case() -> QualitativeInputs {
        QualitativeInputs {
            current_region: Region::Nowon,
            destination_region: Region::Gangnam,
            disposition: Disposition::KeepOccupying,
            job_or_school_in_destination: false,
            stay_period: StayPeriod::UpToTwoYears,
            has_subscription_account: false,
        }
    }

    #[test]
    fn all_factors_at_maximum_score_one_hundred() {
        for preset in PolicyPreset::ALL {
            let result = compute_qualitative_fit(&best_case(), &preset.table())
                .expect("preset scoring is valid");
            assert!((result.fit_score - 100.0).abs() < 1e-9, "{preset}");
            assert_eq!(result.verdict, VerdictTier::VerySuitable);
        }
    }

    #[test]
    fn minimum_floor_for_five_factor_preset() {
        let result = compute_qualitative_fit(&worst_case(), &PolicyPreset::October2025.table())
            .expect("preset scoring is valid");
        assert!((result.fit_score - 38.75).abs() < 1e-9);
        assert_eq!(result.verdict, VerdictTier::Unsuitable);
        assert!(result.advisory.starts_with("주택 구매 요건이 충분하지 않습니다"));
        assert_eq!(result.factor_scores.len(), 5);
    }

    #[test]
    fn regulation_factor_only_in_six_factor_preset() {
        let six = compute_qualitative_fit(&worst_case(), &PolicyPreset::Baseline2025.table())
            .expect("valid");
        assert_eq!(six.score_of(FitFactor::DestinationRegulation), Some(50.0));
        // 12.5 + 6.25 + 10 + 5 + 2.5 + 2.5
        assert!((six.fit_score - 38.75).abs() < 1e-9);

        let five = compute_qualitative_fit(&worst_case(), &PolicyPreset::StressWeighted.table())
            .expect("valid");
        assert_eq!(five.score_of(FitFactor::DestinationRegulation), None);
        // 10 + 6.75 + 10 + 6.75 + 3
        assert!((five.fit_score - 36.5).abs() < 1e-9);
    }

    #[test]
    fn mixed_answers_land_in_middle_tiers() {
        let inputs = QualitativeInputs {
            current_region: Region::Mapo,
            destination_region: Region::Seodaemun,
            disposition: Disposition::Sell,
            job_or_school_in_destination: true,
            stay_period: StayPeriod::FourToTenYears,
            has_subscription_account: false,
        };
        let result = compute_qualitative_fit(&inputs, &PolicyPreset::October2025.table())
            .expect("valid");
        // 12.5 + 18.75 + 20 + 15 + 5
        assert!((result.fit_score - 71.25).abs() < 1e-9);
        assert_eq!(result.verdict, VerdictTier::Suitable);
    }

    #[test]
    fn rejects_weights_that_do_not_match_factors() {
        let mut policy = PolicyPreset::October2025.table();
        policy.scoring.weights.retain(|w| w.factor != FitFactor::Subscription);
        policy.scoring.weights.push(FactorWeight {
            factor: FitFactor::DestinationRegulation,
            weight: 0.10,
        });
        let err = QualitativeFitScorer::new(&policy).expect_err("mismatched keys");
        assert_eq!(
            err,
            PolicyError::FactorSetMismatch {
                missing: vec![FitFactor::Subscription],
                unexpected: vec![FitFactor::DestinationRegulation],
            }
        );
    }

    #[test]
    fn rejects_weights_not_summing_to_one() {
        let mut policy = PolicyPreset::October2025.table();
        policy.scoring.weights[0].weight = 0.30;
        assert!(matches!(
            QualitativeFitScorer::new(&policy),
            Err(PolicyError::WeightSum { .. })
        ));
    }
}
