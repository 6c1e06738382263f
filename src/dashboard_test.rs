use super::*;
use crate::api::types::{MitigationPlan, MitigationSet};

fn risk(risk_type: &str) -> RiskEntry {
    RiskEntry { risk_type: risk_type.into(), ..RiskEntry::default() }
}

fn risk_with(risk_type: &str, tech: usize, human: usize, policy: usize) -> RiskEntry {
    let names = |prefix: &str, n: usize| (0..n).map(|i| format!("{prefix}-{i}")).collect::<Vec<_>>();
    RiskEntry {
        risk_type: risk_type.into(),
        category: None,
        mitigations: MitigationPlan {
            mitigations: MitigationSet {
                tech: names("tech", tech),
                human: names("human", human),
                policy: names("policy", policy),
                ..MitigationSet::default()
            },
            ..MitigationPlan::default()
        },
    }
}

fn report(entries: Vec<RiskEntry>) -> DetailedReport {
    DetailedReport { identified_risks: entries, ..DetailedReport::default() }
}

// =============================================================
// Severity
// =============================================================

#[test]
fn severity_thresholds() {
    assert_eq!(Severity::from_risk_count(0), Severity::Low);
    assert_eq!(Severity::from_risk_count(1), Severity::Medium);
    assert_eq!(Severity::from_risk_count(2), Severity::Medium);
    assert_eq!(Severity::from_risk_count(3), Severity::High);
    assert_eq!(Severity::from_risk_count(4), Severity::High);
    assert_eq!(Severity::from_risk_count(5), Severity::Critical);
    assert_eq!(Severity::from_risk_count(50), Severity::Critical);
}

#[test]
fn severity_colors_are_distinct() {
    assert_eq!(Severity::Low.color(), "#4caf50");
    assert_eq!(Severity::Critical.color(), "#9c27b0");
    assert_ne!(Severity::Medium.color(), Severity::High.color());
}

// =============================================================
// Categories
// =============================================================

#[test]
fn infer_uses_keywords_case_insensitively() {
    assert_eq!(RiskCategory::infer("Shop THEFT"), RiskCategory::Physical);
    assert_eq!(RiskCategory::infer("Cyber attack on tills"), RiskCategory::Data);
    assert_eq!(RiskCategory::infer("Staff assault"), RiskCategory::Personnel);
    assert_eq!(RiskCategory::infer("Process failure"), RiskCategory::Operational);
    assert_eq!(RiskCategory::infer("Fire"), RiskCategory::Other);
}

#[test]
fn infer_first_rule_wins() {
    // Mentions both theft and data; physical is checked first.
    assert_eq!(RiskCategory::infer("Data theft"), RiskCategory::Physical);
}

#[test]
fn structured_category_overrides_label() {
    let entry = RiskEntry { category: Some("Personnel Security".into()), ..risk("Theft by employee") };
    assert_eq!(categorize(&entry), RiskCategory::Personnel);
}

#[test]
fn unknown_structured_category_falls_back_to_label() {
    let entry = RiskEntry { category: Some("weather".into()), ..risk("Intrusion after hours") };
    assert_eq!(categorize(&entry), RiskCategory::Physical);
}

#[test]
fn group_by_category_drops_empty_and_keeps_order() {
    let detailed = report(vec![risk("Fire"), risk("Theft"), risk("Shoplifting theft"), risk("Data breach")]);
    let slices = group_risks_by_category(&detailed);
    assert_eq!(
        slices,
        vec![
            Slice::new("Physical Security", 2),
            Slice::new("Data Security", 1),
            Slice::new("Other", 1),
        ]
    );
}

#[test]
fn group_by_category_empty_report() {
    assert!(group_risks_by_category(&DetailedReport::default()).is_empty());
}

// =============================================================
// Mitigation types
// =============================================================

#[test]
fn mitigation_types_summed_across_risks() {
    let detailed = report(vec![risk_with("Theft", 2, 1, 0), risk_with("Fire", 1, 0, 3)]);
    assert_eq!(
        count_mitigation_types(&detailed),
        vec![Slice::new("Technical", 3), Slice::new("Human", 1), Slice::new("Policy", 3)]
    );
}

#[test]
fn risk_type_counts_in_first_seen_order() {
    let detailed = report(vec![risk("Theft"), risk("Fire"), risk("Theft")]);
    assert_eq!(risk_type_counts(&detailed), vec![Slice::new("Theft", 2), Slice::new("Fire", 1)]);
}

// =============================================================
// Dashboard
// =============================================================

#[test]
fn dashboard_build_combines_reports() {
    let quick = QuickReport {
        identified_risks: vec!["Theft".into(), "Fire".into(), "Data breach".into()],
        unique_solutions: vec!["CCTV".into()],
        risk_summary: "Analysis identified 3 risks with 1 possible solutions.".into(),
    };
    let mut detailed = report(vec![risk_with("Theft", 1, 0, 0), risk("Fire"), risk("Data breach")]);
    detailed.answers.insert("Is there CCTV?".into(), "N".into());

    let dashboard = Dashboard::build(&quick, &detailed);

    assert_eq!(dashboard.severity, Severity::High);
    assert_eq!(dashboard.risk_count, 3);
    assert_eq!(dashboard.categories.len(), 3);
    assert_eq!(dashboard.mitigation_types, vec![Slice::new("Technical", 1)]);
    assert_eq!(dashboard.answers, vec![("Is there CCTV?".to_owned(), "N".to_owned())]);
}
