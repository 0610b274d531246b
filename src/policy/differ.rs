use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::policy::schema::{ConditionalLtvRule, DsrCeiling, PolicyTable, PriceCapRule, StressRule};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDiff {
    pub from: String,
    pub to: String,
    pub changes: Vec<RuleChange>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleChange {
    pub rule: String,
    pub change_type: ChangeType,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Added,
    Removed,
    Changed,
}

pub fn diff_policies(old: &PolicyTable, new: &PolicyTable) -> Vec<RuleChange> {
    let old_rules = flatten_rules(old);
    let new_rules = flatten_rules(new);

    let mut names = BTreeSet::new();
    names.extend(old_rules.keys().cloned());
    names.extend(new_rules.keys().cloned());

    let mut changes = Vec::new();
    for name in names {
        match (old_rules.get(&name), new_rules.get(&name)) {
            (None, Some(value)) => changes.push(RuleChange {
                rule: name,
                change_type: ChangeType::Added,
                old_value: None,
                new_value: Some(value.clone()),
            }),
            (Some(value), None) => changes.push(RuleChange {
                rule: name,
                change_type: ChangeType::Removed,
                old_value: Some(value.clone()),
                new_value: None,
            }),
            (Some(before), Some(after)) if before != after => changes.push(RuleChange {
                rule: name,
                change_type: ChangeType::Changed,
                old_value: Some(before.clone()),
                new_value: Some(after.clone()),
            }),
            _ => {}
        }
    }
    changes
}

/// Returns `None` when both tables carry the same fingerprint or differ only in `id`.
pub fn build_policy_diff(old: &PolicyTable, new: &PolicyTable) -> Option<PolicyDiff> {
    if old.fingerprint() == new.fingerprint() {
        return None;
    }
    let changes = diff_policies(old, new);
    if changes.is_empty() {
        return None;
    }
    Some(PolicyDiff {
        from: old.id.clone(),
        to: new.id.clone(),
        changes,
    })
}

fn flatten_rules(table: &PolicyTable) -> BTreeMap<String, String> {
    let mut rules = BTreeMap::new();

    rules.insert("label".to_string(), table.label.clone());
    rules.insert("effective_from".to_string(), table.effective_from.to_string());

    let mut regulated = table
        .regulated_regions
        .iter()
        .map(|r| r.as_slug())
        .collect::<Vec<_>>();
    regulated.sort_unstable();
    rules.insert("regulated_regions".to_string(), regulated.join(","));

    rules.insert("ltv.first_time".to_string(), num(table.ltv.first_time));
    rules.insert("ltv.multi_house".to_string(), num(table.ltv.multi_house));
    let conditional = match &table.ltv.conditional_one_house {
        ConditionalLtvRule::RegionTiered {
            non_regulated,
            regulated,
        } => format!(
            "{} outside regulated / {} inside",
            num(*non_regulated),
            num(*regulated)
        ),
        ConditionalLtvRule::Flat { fraction } => format!("{} everywhere", num(*fraction)),
    };
    rules.insert("ltv.conditional_one_house".to_string(), conditional);

    match &table.stress {
        StressRule::Flat { add_on_pct } => {
            rules.insert("stress".to_string(), format!("flat +{}%p", num(*add_on_pct)));
        }
        StressRule::Weighted {
            spread_pct,
            weights,
        } => {
            rules.insert("stress".to_string(), format!("weighted {}%p", num(*spread_pct)));
            for w in weights {
                rules.insert(
                    format!("stress.weight.{}", w.loan_type.as_slug()),
                    num(w.weight),
                );
            }
        }
    }

    let dsr = match &table.dsr_ceiling {
        DsrCeiling::FixedRatio { ratio } => format!("income × {}", num(*ratio)),
        DsrCeiling::StressRate => "income × stress rate".to_string(),
    };
    rules.insert("dsr_ceiling".to_string(), dsr);

    match &table.price_cap {
        PriceCapRule::Flat { cap_man, label } => {
            rules.insert("price_cap".to_string(), format!("flat {}", num(*cap_man)));
            rules.insert("price_cap.label".to_string(), label.clone());
        }
        PriceCapRule::Tiered { tiers } => {
            rules.insert("price_cap".to_string(), format!("{} tiers", tiers.len()));
            for (idx, tier) in tiers.iter().enumerate() {
                let bound = tier
                    .max_price_uk
                    .map(|max| format!("<= {}", num(max)))
                    .unwrap_or_else(|| "open".to_string());
                rules.insert(
                    format!("price_cap.tier.{}", idx + 1),
                    format!("{bound}: {}", num(tier.cap_man)),
                );
                rules.insert(format!("price_cap.tier.{}.label", idx + 1), tier.label.clone());
            }
        }
    }

    let factors = table
        .scoring
        .factors
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>();
    rules.insert("scoring.factors".to_string(), factors.join(","));
    for w in &table.scoring.weights {
        rules.insert(format!("scoring.weight.{}", w.factor), num(w.weight));
    }
    for advisory in &table.scoring.advisories {
        rules.insert(
            format!("scoring.advisory.{:?}", advisory.tier).to_lowercase(),
            advisory.text.clone(),
        );
    }

    for note in &table.notes {
        rules.insert(
            format!("notes.{}", note.ownership.as_slug()),
            format!("{}: {}", note.title, note.text),
        );
    }

    rules
}

/// Shortest exact rendering, so small edits in custom tables still show up.
fn num(value: f64) -> String {
    format!("{value}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::presets::PolicyPreset;

    #[test]
    fn identical_tables_produce_no_diff() {
        let table = PolicyPreset::October2025.table();
        assert!(build_policy_diff(&table, &table.clone()).is_none());
        assert!(diff_policies(&table, &table).is_empty());
    }

    #[test]
    fn detects_stress_and_scoring_changes() {
        let old = PolicyPreset::Baseline2025.table();
        let new = PolicyPreset::StressWeighted.table();
        let diff = build_policy_diff(&old, &new).expect("tables differ");
        assert_eq!(diff.from, "baseline-2025");

        let stress = diff
            .changes
            .iter()
            .find(|c| c.rule == "stress")
            .expect("stress rule changed");
        assert_eq!(stress.change_type, ChangeType::Changed);
        assert_eq!(stress.old_value.as_deref(), Some("flat +1.5%p"));

        let removed = diff
            .changes
            .iter()
            .find(|c| c.rule == "scoring.weight.destination_regulation")
            .expect("regulation factor removed");
        assert_eq!(removed.change_type, ChangeType::Removed);

        let added = diff
            .changes
            .iter()
            .filter(|c| c.rule.starts_with("stress.weight."))
            .count();
        assert_eq!(added, 4);
    }

    #[test]
    fn october_tightens_conditional_ltv() {
        let diff = diff_policies(
            &PolicyPreset::StressWeighted.table(),
            &PolicyPreset::October2025.table(),
        );
        let ltv = diff
            .iter()
            .find(|c| c.rule == "ltv.conditional_one_house")
            .expect("conditional rule changed");
        assert_eq!(ltv.new_value.as_deref(), Some("0.4 everywhere"));
        assert!(diff.iter().any(|c| c.rule == "price_cap.tier.3"));
        assert!(diff.iter().any(|c| c.rule == "effective_from"));
    }

    #[test]
    fn wording_and_label_edits_are_reported() {
        let old = PolicyPreset::October2025.table();
        let mut new = old.clone();
        new.label = "custom".to_string();
        new.notes[0].text.push_str(" (revised)");

        let diff = build_policy_diff(&old, &new).expect("tables differ");
        let rules = diff.changes.iter().map(|c| c.rule.as_str()).collect::<Vec<_>>();
        assert!(rules.contains(&"label"));
        let note_rule = format!("notes.{}", old.notes[0].ownership.as_slug());
        assert!(rules.contains(&note_rule.as_str()));
    }

    #[test]
    fn id_only_change_is_not_a_diff() {
        let old = PolicyPreset::October2025.table();
        let mut new = old.clone();
        new.id = "my-copy".to_string();
        assert!(build_policy_diff(&old, &new).is_none());
    }

    #[test]
    fn small_numeric_edits_are_reported() {
        let old = PolicyPreset::StressWeighted.table();
        let mut new = old.clone();
        new.dsr_ceiling = DsrCeiling::FixedRatio { ratio: 0.404 };
        let diff = diff_policies(&old, &new);
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].rule, "dsr_ceiling");
        assert_eq!(diff[0].old_value.as_deref(), Some("income × 0.4"));
        assert_eq!(diff[0].new_value.as_deref(), Some("income × 0.404"));
    }
}
