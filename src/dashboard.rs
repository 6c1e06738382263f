//! Report analytics for the dashboard view.
//!
//! DESIGN
//! ======
//! Pure functions over fetched reports. Nothing here mutates a report.
//!
//! Risk categories come from the backend's structured `category` field when
//! it is present and recognised. Older backends only send a free-form
//! `risk_type` label, so the category is inferred from keywords in it.

use std::collections::BTreeMap;
use std::fmt;

use crate::api::types::{DetailedReport, QuickReport, RiskEntry};

// =============================================================================
// SEVERITY
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Overall severity from the number of identified risks.
    #[must_use]
    pub fn from_risk_count(count: usize) -> Self {
        match count {
            0 => Self::Low,
            1..=2 => Self::Medium,
            3..=4 => Self::High,
            _ => Self::Critical,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    /// Badge color as a hex string.
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::Low => "#4caf50",
            Self::Medium => "#ff9800",
            Self::High => "#f44336",
            Self::Critical => "#9c27b0",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// CATEGORIES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskCategory {
    Physical,
    Data,
    Personnel,
    Operational,
    Other,
}

impl RiskCategory {
    pub const ALL: [Self; 5] = [Self::Physical, Self::Data, Self::Personnel, Self::Operational, Self::Other];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Physical => "Physical Security",
            Self::Data => "Data Security",
            Self::Personnel => "Personnel Security",
            Self::Operational => "Operational Security",
            Self::Other => "Other",
        }
    }

    /// Parse a structured category value sent by the backend.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_ascii_lowercase();
        let tag = tag.strip_suffix(" security").unwrap_or(&tag);
        match tag {
            "physical" => Some(Self::Physical),
            "data" => Some(Self::Data),
            "personnel" => Some(Self::Personnel),
            "operational" => Some(Self::Operational),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Keyword inference from a free-form risk label. First match wins.
    #[must_use]
    pub fn infer(risk_type: &str) -> Self {
        const RULES: [(RiskCategory, &[&str]); 4] = [
            (RiskCategory::Physical, &["physical", "theft", "intrusion"]),
            (RiskCategory::Data, &["data", "information", "cyber"]),
            (RiskCategory::Personnel, &["personnel", "staff", "employee"]),
            (RiskCategory::Operational, &["operation", "process"]),
        ];
        let label = risk_type.to_lowercase();
        RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| label.contains(k)))
            .map_or(Self::Other, |(category, _)| *category)
    }
}

/// Category for one risk: structured field first, label inference second.
#[must_use]
pub fn categorize(entry: &RiskEntry) -> RiskCategory {
    entry
        .category
        .as_deref()
        .and_then(RiskCategory::from_tag)
        .unwrap_or_else(|| RiskCategory::infer(&entry.risk_type))
}

/// One labelled value in a chart series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    pub label: String,
    pub count: usize,
}

impl Slice {
    fn new(label: impl Into<String>, count: usize) -> Self {
        Self { label: label.into(), count }
    }
}

/// Risk counts per category, in fixed category order, zero counts dropped.
#[must_use]
pub fn group_risks_by_category(report: &DetailedReport) -> Vec<Slice> {
    let mut counts: BTreeMap<RiskCategory, usize> = BTreeMap::new();
    for entry in &report.identified_risks {
        *counts.entry(categorize(entry)).or_default() += 1;
    }
    RiskCategory::ALL
        .iter()
        .filter_map(|category| {
            counts
                .get(category)
                .map(|&count| Slice::new(category.label(), count))
        })
        .collect()
}

/// Number of mitigations per mitigation type across all risks.
#[must_use]
pub fn count_mitigation_types(report: &DetailedReport) -> Vec<Slice> {
    let mut totals = [0_usize; 5];
    for entry in &report.identified_risks {
        let set = &entry.mitigations.mitigations;
        totals[0] += set.tech.len();
        totals[1] += set.human.len();
        totals[2] += set.tss.len();
        totals[3] += set.analytics.len();
        totals[4] += set.policy.len();
    }
    ["Technical", "Human", "TSS", "Analytics", "Policy"]
        .into_iter()
        .zip(totals)
        .filter(|(_, count)| *count > 0)
        .map(|(label, count)| Slice::new(label, count))
        .collect()
}

/// Occurrences of each distinct `risk_type`, in first-seen order.
#[must_use]
pub fn risk_type_counts(report: &DetailedReport) -> Vec<Slice> {
    let mut slices: Vec<Slice> = Vec::new();
    for entry in &report.identified_risks {
        match slices.iter_mut().find(|s| s.label == entry.risk_type) {
            Some(slice) => slice.count += 1,
            None => slices.push(Slice::new(entry.risk_type.clone(), 1)),
        }
    }
    slices
}

// =============================================================================
// DASHBOARD
// =============================================================================

/// Everything the dashboard view draws, derived from both reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    pub severity: Severity,
    pub risk_count: usize,
    pub risk_summary: String,
    pub identified_risks: Vec<String>,
    pub unique_solutions: Vec<String>,
    pub categories: Vec<Slice>,
    pub mitigation_types: Vec<Slice>,
    pub risk_types: Vec<Slice>,
    pub answers: Vec<(String, String)>,
}

impl Dashboard {
    #[must_use]
    pub fn build(quick: &QuickReport, detailed: &DetailedReport) -> Self {
        let risk_count = quick.identified_risks.len();
        Self {
            severity: Severity::from_risk_count(risk_count),
            risk_count,
            risk_summary: quick.risk_summary.clone(),
            identified_risks: quick.identified_risks.clone(),
            unique_solutions: quick.unique_solutions.clone(),
            categories: group_risks_by_category(detailed),
            mitigation_types: count_mitigation_types(detailed),
            risk_types: risk_type_counts(detailed),
            answers: detailed
                .answers
                .iter()
                .map(|(q, a)| (q.clone(), a.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod tests;
