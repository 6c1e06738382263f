//! Wire types for the assessment API.
//!
//! Report payloads are parsed into explicit structures at the boundary.
//! A `ready: true` poll that does not carry both reports is rejected as
//! [`ApiError::MalformedResponse`] instead of being handed to the views.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// State tag value that ends the conversation.
pub const TERMINAL_STATE: &str = "report";

/// Whether a backend state tag is the terminal report marker.
#[must_use]
pub fn is_terminal(state: &str) -> bool {
    state == TERMINAL_STATE
}

// =============================================================================
// SESSION EXCHANGE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub state: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageRequest<'a> {
    pub session_id: &'a str,
    pub message: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageResponse {
    pub state: String,
    pub message: String,
    /// Set by the backend when the answer failed its validation.
    #[serde(default)]
    pub error: bool,
}

// =============================================================================
// REPORTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuickReport {
    pub identified_risks: Vec<String>,
    pub unique_solutions: Vec<String>,
    pub risk_summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DetailedReport {
    pub identified_risks: Vec<RiskEntry>,
    /// Survey question to answer, when the backend includes it.
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RiskEntry {
    pub risk_type: String,
    /// Structured category, preferred over label inference when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub mitigations: MitigationPlan,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MitigationPlan {
    #[serde(default)]
    pub mitigations: MitigationSet,
    #[serde(default)]
    pub solution_details: BTreeMap<String, SolutionDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MitigationSet {
    #[serde(default)]
    pub tech: Vec<String>,
    #[serde(default)]
    pub human: Vec<String>,
    #[serde(default)]
    pub tss: Vec<String>,
    #[serde(default)]
    pub analytics: Vec<String>,
    #[serde(default)]
    pub policy: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SolutionDetails {
    pub use_case: String,
    pub links: String,
    pub partners: String,
    pub data_format: String,
    pub immediate_actions: Vec<String>,
    pub data_collation: Vec<String>,
    pub dashboard: Vec<String>,
    pub wearable: Vec<String>,
    pub mobile: Vec<String>,
    pub soc: Vec<String>,
    pub audio_visual: Vec<String>,
}

/// Result of one `get_report` poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportStatus {
    Pending,
    Ready { quick: QuickReport, detailed: DetailedReport },
}

#[derive(Deserialize)]
struct RawReportResponse {
    ready: bool,
    #[serde(default)]
    quick_report: Option<Value>,
    #[serde(default)]
    detailed_report: Option<Value>,
}

impl ReportStatus {
    /// Parse a `get_report` body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MalformedResponse`] if the body is not a report
    /// status, or if it claims `ready: true` without two well-formed reports.
    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        let raw: RawReportResponse = serde_json::from_value(value)?;
        if !raw.ready {
            return Ok(Self::Pending);
        }
        let quick = raw
            .quick_report
            .filter(|v| !v.is_null())
            .ok_or_else(|| ApiError::MalformedResponse("ready report without quick_report".into()))?;
        let detailed = raw
            .detailed_report
            .filter(|v| !v.is_null())
            .ok_or_else(|| ApiError::MalformedResponse("ready report without detailed_report".into()))?;
        let quick = serde_json::from_value::<QuickReport>(quick)
            .map_err(|e| ApiError::MalformedResponse(format!("quick_report: {e}")))?;
        let detailed = serde_json::from_value::<DetailedReport>(detailed)
            .map_err(|e| ApiError::MalformedResponse(format!("detailed_report: {e}")))?;
        Ok(Self::Ready { quick, detailed })
    }
}

/// Which report granularity to download or link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Quick,
    Detailed,
}

impl ReportKind {
    pub const ALL: [Self; 2] = [Self::Quick, Self::Detailed];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Detailed => "detailed",
        }
    }

    /// Local file name for a downloaded PDF of this kind.
    #[must_use]
    pub fn file_name(self) -> String {
        format!("security_assessment_{}.pdf", self.as_str())
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quick" => Ok(Self::Quick),
            "detailed" => Ok(Self::Detailed),
            other => Err(format!("unknown report kind '{other}' (expected 'quick' or 'detailed')")),
        }
    }
}

// =============================================================================
// PROFILE + SURVEY (alternate flow)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub name: String,
    pub store_address: String,
    pub post_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateUserResponse {
    pub success: bool,
    #[serde(default, deserialize_with = "user_id_from_number_or_string")]
    pub user_id: Option<String>,
}

fn user_id_from_number_or_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!("user_id must be a string or number, got {other}"))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct SurveyQuestion {
    #[serde(default)]
    pub question: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurveyAnswer<'a> {
    pub user_id: &'a str,
    pub question: &'a str,
    pub answer: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReportLink {
    pub report_url: String,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
