//! Assessment API — transport seam between the flows and the backend.
//!
//! DESIGN
//! ======
//! The session and survey flows only see the [`AssessmentApi`] and
//! [`SurveyApi`] traits. [`HttpApi`] is the production implementation;
//! tests substitute scripted mocks.

pub mod http;
pub mod types;

pub use http::HttpApi;
use types::{MessageResponse, ReportKind, ReportStatus, StartSessionResponse, UserProfile};

use crate::error::ApiError;

/// Session-driven conversational flow (`/start_session`, `/message`, ...).
#[async_trait::async_trait]
pub trait AssessmentApi: Send + Sync {
    /// Create a new server-side session.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or a malformed body.
    async fn start_session(&self) -> Result<StartSessionResponse, ApiError>;

    /// Send one answer for the given session.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or a malformed body.
    async fn send_message(&self, session_id: &str, message: &str) -> Result<MessageResponse, ApiError>;

    /// Poll report readiness for the given session.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, or
    /// [`ApiError::MalformedResponse`] if a ready report is incomplete.
    async fn get_report(&self, session_id: &str) -> Result<ReportStatus, ApiError>;

    /// Download the rendered PDF for one report kind.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or a non-success status.
    async fn download_report(&self, session_id: &str, kind: ReportKind) -> Result<Vec<u8>, ApiError>;
}

/// Profile-then-survey alternate flow (`/user`, `/survey*`, `/report/*`).
#[async_trait::async_trait]
pub trait SurveyApi: Send + Sync {
    /// Register the store profile and return the backend's user id, if any.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or a malformed body.
    async fn create_user(&self, profile: &UserProfile) -> Result<types::CreateUserResponse, ApiError>;

    /// Fetch the next survey question; `None` once the survey is complete.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or a malformed body.
    async fn survey_question(&self) -> Result<Option<String>, ApiError>;

    /// Record one answer against the question it replies to.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or a non-success status.
    async fn submit_survey_answer(&self, user_id: &str, question: &str, answer: &str) -> Result<(), ApiError>;

    /// Fetch the download URL for one report kind.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or a malformed body.
    async fn report_link(&self, kind: ReportKind, user_id: &str) -> Result<String, ApiError>;
}
