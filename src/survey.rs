//! Survey client — profile registration followed by a question loop.
//!
//! DESIGN
//! ======
//! The alternate flow has no server-side session. The store is registered
//! once via `/user`, and the returned id is carried in an explicit
//! [`Profile`] that every answer is posted against.
//!
//! Methods take `&mut self`, so the borrow checker already guarantees a
//! single submission at a time.
//!
//! ERROR HANDLING
//! ==============
//! Registration failures are returned as [`SurveyError`]. Once the survey is
//! running, failures are logged and appended to the transcript; nothing is
//! retried.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::SurveyApi;
use crate::api::types::{ReportKind, UserProfile};
use crate::error::{ApiError, ErrorCode};
use crate::session::{Message, Transcript};

const WELCOME: &str = "Welcome to the security survey. I will ask you some questions about your store security.";
const COMPLETE: &str = "Survey complete! You can download your reports here:";
const QUESTION_FAILED: &str = "Failed to load the next question. Please try again.";
const ANSWER_FAILED: &str = "Failed to submit your answer. Please try again.";
const LINKS_FAILED: &str = "Failed to fetch the report links. Please try again later.";

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SurveyError {
    #[error("profile is incomplete: {0} is required")]
    IncompleteProfile(&'static str),
    #[error("the backend rejected the profile")]
    Rejected,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ErrorCode for SurveyError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::IncompleteProfile(_) => "E_INCOMPLETE_PROFILE",
            Self::Rejected => "E_PROFILE_REJECTED",
            Self::Api(error) => error.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Api(error) => error.retryable(),
            Self::IncompleteProfile(_) | Self::Rejected => false,
        }
    }
}

// =============================================================================
// PROFILE
// =============================================================================

/// A registered store. Answers and report links are keyed by `user_id`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    pub user_id: String,
}

/// Register the store profile with the backend.
///
/// # Errors
///
/// Returns [`SurveyError::IncompleteProfile`] for a blank field (nothing is
/// sent), [`SurveyError::Rejected`] when the backend refuses the profile or
/// returns no id, and [`SurveyError::Api`] on transport failure.
pub async fn create_profile(api: &dyn SurveyApi, profile: &UserProfile) -> Result<Profile, SurveyError> {
    let fields = [
        ("name", &profile.name),
        ("store address", &profile.store_address),
        ("post code", &profile.post_code),
    ];
    if let Some((field, _)) = fields.into_iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(SurveyError::IncompleteProfile(field));
    }

    let response = api.create_user(profile).await?;
    match response.user_id.filter(|id| response.success && !id.is_empty()) {
        Some(user_id) => {
            info!(%user_id, "store profile registered");
            Ok(Profile { user_id })
        }
        None => Err(SurveyError::Rejected),
    }
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct SurveyClient {
    api: Arc<dyn SurveyApi>,
    profile: Profile,
    transcript: Transcript,
    /// Question the next answer is posted against. Set only when a question
    /// arrives; error messages never replace it.
    current_question: Option<String>,
    complete: bool,
}

impl SurveyClient {
    #[must_use]
    pub fn new(api: Arc<dyn SurveyApi>, profile: Profile) -> Self {
        let mut transcript = Transcript::new();
        transcript.push_bot(WELCOME);
        Self { api, profile, transcript, current_question: None, complete: false }
    }

    /// Load the next question, or finish the survey with report links.
    pub async fn next_question(&mut self) {
        if self.complete {
            return;
        }
        match self.api.survey_question().await {
            Ok(Some(question)) => {
                debug!(user_id = %self.profile.user_id, "question received");
                self.transcript.push_bot(question.as_str());
                self.current_question = Some(question);
            }
            Ok(None) => self.finish().await,
            Err(error) => {
                warn!(user_id = %self.profile.user_id, error = %error, code = error.error_code(), "failed to load question");
                self.transcript.push_bot(QUESTION_FAILED);
            }
        }
    }

    /// Post an answer to the current question, then load the next one.
    ///
    /// With no question loaded the answer is dropped and the question is
    /// re-requested instead. A failed post keeps the current question so the
    /// answer can be resent.
    pub async fn submit_answer(&mut self, text: &str) {
        if self.complete || text.trim().is_empty() {
            return;
        }
        let Some(question) = self.current_question.clone() else {
            debug!(user_id = %self.profile.user_id, "no question loaded; reloading");
            self.next_question().await;
            return;
        };
        self.transcript.push_user(text);

        let result = self
            .api
            .submit_survey_answer(&self.profile.user_id, &question, text)
            .await;
        if let Err(error) = result {
            warn!(user_id = %self.profile.user_id, error = %error, code = error.error_code(), "failed to submit answer");
            self.transcript.push_bot(ANSWER_FAILED);
            return;
        }
        self.current_question = None;
        self.next_question().await;
    }

    async fn finish(&mut self) {
        self.complete = true;
        info!(user_id = %self.profile.user_id, "survey complete");

        let mut links = Vec::with_capacity(ReportKind::ALL.len());
        for kind in ReportKind::ALL {
            match self.api.report_link(kind, &self.profile.user_id).await {
                Ok(url) => links.push(url),
                Err(error) => {
                    warn!(user_id = %self.profile.user_id, %kind, error = %error, code = error.error_code(), "failed to fetch report link");
                    self.transcript.push_bot(LINKS_FAILED);
                    return;
                }
            }
        }
        self.transcript.push_bot(format!("{COMPLETE}\n{}", links.join("\n")));
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&str> {
        self.current_question.as_deref()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        self.transcript.messages()
    }

    #[must_use]
    pub fn messages_since(&self, seen: usize) -> &[Message] {
        self.transcript.since(seen)
    }
}

#[cfg(test)]
#[path = "survey_test.rs"]
mod tests;
