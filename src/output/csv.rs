use anyhow::Result;

use crate::fit::QualitativeResult;
use crate::loan::LoanResult;
use crate::policy::{PolicyDiff, RegionStatus};

pub fn loan_to_csv(result: &LoanResult) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "ltv_limit",
        "ltv_loan_man",
        "stress_rate_pct",
        "dsr_loan_man",
        "price_tier_cap_man",
        "possible_loan_man",
        "is_capped",
        "total_purchasing_power_man",
        "error",
    ])?;
    writer.write_record([
        format!("{:.2}", result.ltv_limit_fraction),
        format!("{:.0}", result.ltv_loan_amount),
        format!("{:.2}", result.stress_rate_pct),
        format!("{:.0}", result.dsr_loan_amount),
        format!("{:.0}", result.price_tier_cap),
        format!("{:.0}", result.possible_loan_amount),
        result.is_capped.to_string(),
        format!("{:.0}", result.total_purchasing_power),
        result.error.clone().unwrap_or_default(),
    ])?;
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn fit_to_csv(result: &QualitativeResult) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["factor", "score", "weight"])?;
    for s in &result.factor_scores {
        writer.write_record([
            s.factor.to_string(),
            format!("{:.0}", s.score),
            format!("{:.2}", s.weight),
        ])?;
    }
    writer.write_record([
        "fit_score".to_string(),
        format!("{:.2}", result.fit_score),
        format!("{:?}", result.verdict).to_lowercase(),
    ])?;
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn policy_diff_to_csv(diff: &PolicyDiff) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["rule", "change", "old", "new"])?;
    for change in &diff.changes {
        writer.write_record([
            change.rule.clone(),
            format!("{:?}", change.change_type).to_lowercase(),
            change.old_value.clone().unwrap_or_default(),
            change.new_value.clone().unwrap_or_default(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn regions_to_csv(statuses: &[RegionStatus]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["district", "slug", "regulated"])?;
    for status in statuses {
        writer.write_record([
            status.name.clone(),
            status.region.as_slug().to_string(),
            status.regulated.to_string(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}
