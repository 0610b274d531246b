use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::fit::QualitativeResult;
use crate::loan::{LoanInputs, LoanResult, WhatIfResult};
use crate::output::amount::{format_amount, format_amount_delta};
use crate::policy::{DsrCeiling, PolicyDiff, PolicyTable, PriceCapRule, StressRule, VerdictTier};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn pct(fraction: f64) -> String {
    format!("{:.0}%", fraction * 100.0)
}

pub fn dsr_ceiling_label(policy: &PolicyTable) -> String {
    match policy.dsr_ceiling {
        DsrCeiling::FixedRatio { ratio } => format!("DSR = {}", pct(ratio)),
        DsrCeiling::StressRate => "DSR = 스트레스 금리 연동".to_string(),
    }
}

pub fn render_loan_table(inputs: &LoanInputs, result: &LoanResult, policy: &PolicyTable) -> String {
    if let Some(error) = &result.error {
        return format!(
            "계산 오류 발생: {error}\n총 구매 가능 비용: {}",
            format_amount(result.total_purchasing_power)
        );
    }

    let mut table = new_table();
    table.set_header(vec!["항목", "금액"]);
    table.add_row(vec![
        format!("LTV = {} / {}", pct(result.ltv_limit_fraction), dsr_ceiling_label(policy)),
        String::new(),
    ]);
    table.add_row(vec![
        "LTV 기준 대출가능액".to_string(),
        format_amount(result.ltv_loan_amount),
    ]);
    table.add_row(vec![
        "DSR 기준 대출가능액".to_string(),
        format_amount(result.dsr_loan_amount),
    ]);
    table.add_row(vec![
        "가격 구간별 상한".to_string(),
        format_amount(result.price_tier_cap),
    ]);
    let possible = Cell::new(format_amount(result.possible_loan_amount));
    let possible = if result.is_capped {
        possible.fg(Color::Yellow)
    } else {
        possible.fg(Color::Green)
    };
    table.add_row(Row::from(vec![Cell::new("대출 가능 금액"), possible]));
    table.add_row(vec![
        "주택 구매 가능 현금".to_string(),
        format_amount(inputs.cash_on_hand_man),
    ]);
    table.add_row(Row::from(vec![
        Cell::new("총 구매 가능 비용"),
        Cell::new(format_amount(result.total_purchasing_power)).fg(Color::Green),
    ]));

    let mut out = table.to_string();
    out.push_str(&format!("\n\n[LTV · 규제] {}", inputs.ownership));
    if let Some(note) = policy.note_for(inputs.ownership) {
        out.push_str(&format!("\n{}", note.text));
    }
    out.push_str(&format!("\n현재 적용 상한: {}", result.price_tier_label));
    if result.is_capped {
        out.push_str("\nDSR/LTV 산출액이 가격구간 상한을 초과하여, 상한으로 제한되었습니다.");
    }

    out.push_str("\n\n[DSR · 스트레스 금리]");
    out.push_str(&format!("\n선택 유형: {}", inputs.loan_type));
    match (&policy.stress, result.loan_type_weight) {
        (StressRule::Weighted { spread_pct, .. }, Some(weight)) => {
            out.push_str(&format!(
                "\n가산치: {spread_pct:.1}%p × {} = {:.2}%p",
                pct(weight),
                result.stress_add_on_pct
            ));
        }
        _ => out.push_str(&format!("\n가산치: {:.2}%p (고정)", result.stress_add_on_pct)),
    }
    out.push_str(&format!(
        "\nDSR 계산 금리: 입력금리 + 가산치 = {:.2}%",
        result.stress_rate_pct
    ));
    out
}

pub fn render_fit_table(result: &QualitativeResult) -> String {
    let mut table = new_table();
    table.set_header(vec!["항목", "점수", "가중치", "반영 점수"]);
    for s in &result.factor_scores {
        table.add_row(vec![
            s.factor.label().to_string(),
            format!("{:.0}", s.score),
            pct(s.weight),
            format!("{:.2}", s.score * s.weight),
        ]);
    }

    let color = match result.verdict {
        VerdictTier::VerySuitable | VerdictTier::Suitable => Color::Green,
        VerdictTier::Neutral => Color::Yellow,
        VerdictTier::Unsuitable | VerdictTier::VeryUnsuitable => Color::Red,
    };
    table.add_row(Row::from(vec![
        Cell::new("리빙핏 스코어"),
        Cell::new(format!("{:.1} / 100", result.fit_score)),
        Cell::new(""),
        Cell::new(result.verdict.label()).fg(color),
    ]));

    format!("{table}\n{}", result.advisory)
}

pub fn render_whatif_table(result: &WhatIfResult) -> String {
    let mut table = new_table();
    table.set_header(vec!["항목", "Before", "After", "Change"]);
    let rows = [
        (
            "LTV 기준",
            result.before.ltv_loan_amount,
            result.after.ltv_loan_amount,
        ),
        (
            "DSR 기준",
            result.before.dsr_loan_amount,
            result.after.dsr_loan_amount,
        ),
        (
            "대출 가능",
            result.before.possible_loan_amount,
            result.after.possible_loan_amount,
        ),
        (
            "총 구매 가능",
            result.before.total_purchasing_power,
            result.after.total_purchasing_power,
        ),
    ];
    for (label, before, after) in rows {
        table.add_row(vec![
            label.to_string(),
            format_amount(before),
            format_amount(after),
            format_amount_delta(after - before),
        ]);
    }

    let changes = result
        .changes_applied
        .iter()
        .map(|c| format!("{} {} -> {}", c.field, c.from, c.to))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{table}\nChanges applied: {changes}")
}

pub fn render_presets_table(tables: &[PolicyTable], active: &str) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "Preset",
        "Effective",
        "Conditional LTV",
        "Stress",
        "DSR",
        "Cap",
        "Factors",
    ]);
    for policy in tables {
        let conditional = match &policy.ltv.conditional_one_house {
            crate::policy::ConditionalLtvRule::RegionTiered {
                non_regulated,
                regulated,
            } => format!("{} / {}", pct(*non_regulated), pct(*regulated)),
            crate::policy::ConditionalLtvRule::Flat { fraction } => pct(*fraction),
        };
        let stress = match &policy.stress {
            StressRule::Flat { add_on_pct } => format!("+{add_on_pct:.1}%p"),
            StressRule::Weighted { spread_pct, .. } => format!("{spread_pct:.1}%p × type"),
        };
        let cap = match &policy.price_cap {
            PriceCapRule::Flat { cap_man, .. } => format_amount(*cap_man),
            PriceCapRule::Tiered { tiers } => tiers
                .iter()
                .map(|t| format_amount(t.cap_man))
                .collect::<Vec<_>>()
                .join("/"),
        };
        let name = Cell::new(&policy.id);
        let name = if policy.id == active {
            name.fg(Color::Green)
        } else {
            name
        };
        table.add_row(Row::from(vec![
            name,
            Cell::new(policy.effective_from.to_string()),
            Cell::new(conditional),
            Cell::new(stress),
            Cell::new(dsr_ceiling_label(policy)),
            Cell::new(cap),
            Cell::new(policy.scoring.factors.len().to_string()),
        ]));
    }
    table.to_string()
}

pub fn render_policy_diff_table(diff: &PolicyDiff) -> String {
    let mut table = new_table();
    table.set_header(vec!["Rule", "Change", diff.from.as_str(), diff.to.as_str()]);
    for change in &diff.changes {
        table.add_row(vec![
            change.rule.clone(),
            format!("{:?}", change.change_type).to_uppercase(),
            change.old_value.clone().unwrap_or_else(|| "-".to_string()),
            change.new_value.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    table.to_string()
}

pub fn render_regions_table(policy: &PolicyTable) -> String {
    let mut table = new_table();
    table.set_header(vec!["District", "Slug", "Regulated"]);
    for status in policy.region_statuses() {
        let cell = if status.regulated {
            Cell::new("YES").fg(Color::Red)
        } else {
            Cell::new("NO").fg(Color::Green)
        };
        table.add_row(Row::from(vec![
            Cell::new(status.name),
            Cell::new(status.region.as_slug()),
            cell,
        ]));
    }
    table.to_string()
}
