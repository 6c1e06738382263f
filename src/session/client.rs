//! Session client — drives one assessment conversation to its report.
//!
//! DESIGN
//! ======
//! The backend owns the authoritative conversation state; this client keeps
//! the projection a view needs (session id, state tag, transcript, reports)
//! and enforces the ordering rules the backend relies on:
//!
//! - at most one `message` request is in flight (busy flag);
//! - the user's answer is appended before the request resolves;
//! - nothing is submitted once the state tag is terminal;
//! - the terminal transition triggers exactly one report fetch.
//!
//! ERROR HANDLING
//! ==============
//! Transport and parse failures never escape as `Err`. They are logged and
//! appended as bot messages, and the client stays in its current phase so
//! the user can try again.
//!
//! CONCURRENCY
//! ===========
//! State lives behind a `std::sync::Mutex` that is never held across an
//! `.await`. The busy flag is cleared by an RAII guard, so a dropped
//! future cannot wedge the client.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use super::transcript::{Message, Transcript};
use crate::api::AssessmentApi;
use crate::api::types::{DetailedReport, QuickReport, ReportKind, ReportStatus, is_terminal};
use crate::config::ReportPolling;
use crate::error::ErrorCode;

const CONNECT_FAILED: &str = "Failed to connect to the server. Please try again later.";
const SEND_FAILED: &str = "Failed to get a response. Please try again.";
const REPORT_FAILED: &str = "Failed to generate the report. Please try again.";

/// Inline notice shown when the backend rejects an answer.
pub const VALIDATION_NOTICE: &str = "Please answer with Y or N";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub state: String,
}

/// Client-observed projection of the conversation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Initial,
    AwaitingAnswer,
    ReportPending,
    ReportReady,
}

impl Phase {
    fn for_state(state: &str) -> Self {
        if is_terminal(state) { Self::ReportPending } else { Self::AwaitingAnswer }
    }
}

/// Both report tiers, immutable once fetched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reports {
    pub quick: QuickReport,
    pub detailed: DetailedReport,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyStarted,
    Busy,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// No session exists; nothing was sent.
    NoSession,
    /// Blank input; nothing was sent.
    Empty,
    /// The conversation reached its terminal state; nothing was sent.
    Closed,
    /// Another submission is in flight; nothing was appended or sent.
    Busy,
    /// The backend accepted the answer. `report` is set when this answer
    /// ended the conversation and the report fetch ran.
    Accepted { report: Option<ReportOutcome> },
    /// The backend flagged the answer as invalid.
    Rejected,
    /// The request failed; an error message was appended.
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportOutcome {
    /// No session, or the conversation is not finished.
    NotApplicable,
    Ready,
    /// The backend still reported `ready: false` after every poll.
    Pending,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownloadOutcome {
    NoSession,
    Saved(PathBuf),
    Failed,
}

/// Owned copy of everything a view renders.
#[derive(Clone, Debug)]
pub struct SessionSnapshot {
    pub session: Option<Session>,
    pub messages: Vec<Message>,
    pub phase: Phase,
    pub busy: bool,
    pub notice: Option<String>,
    pub reports: Option<Reports>,
}

impl SessionSnapshot {
    /// Whether the view should switch from chat to dashboard.
    #[must_use]
    pub fn report_available(&self) -> bool {
        self.reports.is_some()
    }

    /// Whether the input box should be enabled.
    #[must_use]
    pub fn accepts_input(&self) -> bool {
        self.session.is_some() && !self.busy && self.phase == Phase::AwaitingAnswer
    }
}

#[derive(Default)]
struct Inner {
    session: Option<Session>,
    transcript: Transcript,
    phase: Phase,
    busy: bool,
    fetching: bool,
    report_requested: bool,
    notice: Option<String>,
    reports: Option<Reports>,
}

/// Clears the busy flag when dropped.
struct BusyGuard<'a> {
    client: &'a SessionClient,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.client.lock().busy = false;
    }
}

/// Clears the fetching flag when dropped.
struct FetchGuard<'a> {
    client: &'a SessionClient,
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.client.lock().fetching = false;
    }
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct SessionClient {
    api: Arc<dyn AssessmentApi>,
    polling: ReportPolling,
    inner: Mutex<Inner>,
}

impl SessionClient {
    #[must_use]
    pub fn new(api: Arc<dyn AssessmentApi>, polling: ReportPolling) -> Self {
        Self { api, polling, inner: Mutex::new(Inner::default()) }
    }

    /// Attach to a session created elsewhere (e.g. a previous run).
    #[must_use]
    pub fn resume(api: Arc<dyn AssessmentApi>, polling: ReportPolling, session_id: String, state: String) -> Self {
        let phase = Phase::for_state(&state);
        let inner = Inner {
            report_requested: phase == Phase::ReportPending,
            session: Some(Session { id: session_id, state }),
            phase,
            ..Inner::default()
        };
        Self { api, polling, inner: Mutex::new(inner) }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    /// Create the server-side session and append its greeting.
    ///
    /// Exactly one bot message is appended whether or not the call succeeds.
    /// A failed start leaves no session; later submissions are no-ops.
    pub async fn start_session(&self) -> StartOutcome {
        let guard = {
            let mut inner = self.lock();
            if inner.session.is_some() {
                return StartOutcome::AlreadyStarted;
            }
            if inner.busy {
                return StartOutcome::Busy;
            }
            inner.busy = true;
            BusyGuard { client: self }
        };

        let response = self.api.start_session().await;

        let needs_report = {
            let mut inner = self.lock();
            match response {
                Ok(resp) => {
                    info!(session_id = %resp.session_id, state = %resp.state, "assessment session started");
                    let phase = Phase::for_state(&resp.state);
                    inner.session = Some(Session { id: resp.session_id, state: resp.state });
                    inner.phase = phase;
                    inner.transcript.push_bot(resp.message);
                    let needs_report = phase == Phase::ReportPending && !inner.report_requested;
                    inner.report_requested |= needs_report;
                    needs_report
                }
                Err(error) => {
                    warn!(error = %error, code = error.error_code(), "failed to start session");
                    inner.transcript.push_bot(CONNECT_FAILED);
                    return StartOutcome::Failed;
                }
            }
        };
        drop(guard);

        if needs_report {
            self.fetch_report().await;
        }
        StartOutcome::Started
    }

    /// Submit one answer for the current question.
    pub async fn submit_answer(&self, text: &str) -> SubmitOutcome {
        let (session_id, guard) = {
            let mut inner = self.lock();
            let Some(session) = inner.session.as_ref() else {
                return SubmitOutcome::NoSession;
            };
            if is_terminal(&session.state) {
                return SubmitOutcome::Closed;
            }
            if text.trim().is_empty() {
                return SubmitOutcome::Empty;
            }
            let session_id = session.id.clone();
            if inner.busy {
                debug!(session_id = %session_id, "submission ignored while a request is in flight");
                return SubmitOutcome::Busy;
            }
            inner.busy = true;
            inner.transcript.push_user(text);
            (session_id, BusyGuard { client: self })
        };

        let response = self.api.send_message(&session_id, text).await;

        let (rejected, needs_report) = {
            let mut inner = self.lock();
            match response {
                Ok(resp) => {
                    if let Some(session) = inner.session.as_mut() {
                        if session.state != resp.state {
                            debug!(session_id = %session_id, from = %session.state, to = %resp.state, "state changed");
                        }
                        session.state.clone_from(&resp.state);
                    }
                    if resp.error {
                        inner.notice = Some(VALIDATION_NOTICE.to_owned());
                    } else {
                        inner.notice = None;
                        inner.transcript.push_bot(resp.message);
                    }
                    let needs_report = is_terminal(&resp.state) && !inner.report_requested;
                    if is_terminal(&resp.state) {
                        inner.phase = Phase::ReportPending;
                        inner.report_requested = true;
                    }
                    (resp.error, needs_report)
                }
                Err(error) => {
                    warn!(session_id = %session_id, error = %error, code = error.error_code(), "failed to send answer");
                    inner.transcript.push_bot(SEND_FAILED);
                    return SubmitOutcome::Failed;
                }
            }
        };
        drop(guard);

        if needs_report {
            info!(session_id = %session_id, "survey complete; fetching report");
            let report = self.fetch_report().await;
            return SubmitOutcome::Accepted { report: Some(report) };
        }
        if rejected {
            SubmitOutcome::Rejected
        } else {
            SubmitOutcome::Accepted { report: None }
        }
    }

    /// Poll `get_report` until the reports are ready or the polling policy
    /// is exhausted.
    pub async fn fetch_report(&self) -> ReportOutcome {
        let (session_id, _guard) = {
            let mut inner = self.lock();
            match inner.phase {
                Phase::ReportReady => return ReportOutcome::Ready,
                Phase::ReportPending => {}
                Phase::Initial | Phase::AwaitingAnswer => return ReportOutcome::NotApplicable,
            }
            let Some(session_id) = inner.session.as_ref().map(|s| s.id.clone()) else {
                return ReportOutcome::NotApplicable;
            };
            if inner.fetching {
                return ReportOutcome::Pending;
            }
            inner.fetching = true;
            (session_id, FetchGuard { client: self })
        };

        let attempts = self.polling.attempts.max(1);
        for attempt in 0..attempts {
            let delay = self.polling.delay_before(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match self.api.get_report(&session_id).await {
                Ok(ReportStatus::Ready { quick, detailed }) => {
                    info!(
                        session_id = %session_id,
                        risks = quick.identified_risks.len(),
                        solutions = quick.unique_solutions.len(),
                        "report ready"
                    );
                    let mut inner = self.lock();
                    inner.reports = Some(Reports { quick, detailed });
                    inner.phase = Phase::ReportReady;
                    return ReportOutcome::Ready;
                }
                Ok(ReportStatus::Pending) => {
                    debug!(session_id = %session_id, attempt, "report not ready");
                }
                Err(error) => {
                    warn!(session_id = %session_id, error = %error, code = error.error_code(), "failed to fetch report");
                    self.lock().transcript.push_bot(REPORT_FAILED);
                    return ReportOutcome::Failed;
                }
            }
        }

        info!(session_id = %session_id, attempts, "report still pending");
        ReportOutcome::Pending
    }

    /// Download one report PDF into `dir` as `security_assessment_{kind}.pdf`.
    pub async fn download_report(&self, kind: ReportKind, dir: &Path) -> DownloadOutcome {
        let session_id = {
            let inner = self.lock();
            match inner.session.as_ref() {
                Some(session) => session.id.clone(),
                None => return DownloadOutcome::NoSession,
            }
        };

        let path = dir.join(kind.file_name());
        let result = match self.api.download_report(&session_id, kind).await {
            Ok(bytes) => save(&path, &bytes).await.map_err(|e| e.to_string()),
            Err(error) => {
                warn!(session_id = %session_id, %kind, code = error.error_code(), "report download failed");
                Err(error.to_string())
            }
        };

        let mut inner = self.lock();
        match result {
            Ok(()) => {
                info!(session_id = %session_id, %kind, path = %path.display(), "report saved");
                inner.transcript.push_bot(format!("Your {kind} report has been downloaded."));
                DownloadOutcome::Saved(path)
            }
            Err(error) => {
                warn!(session_id = %session_id, %kind, error = %error, "could not save report");
                inner.transcript.push_bot(format!("Failed to download the {kind} report."));
                DownloadOutcome::Failed
            }
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.lock();
        SessionSnapshot {
            session: inner.session.clone(),
            messages: inner.transcript.messages().to_vec(),
            phase: inner.phase,
            busy: inner.busy,
            notice: inner.notice.clone(),
            reports: inner.reports.clone(),
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.lock().busy
    }

    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.lock().session.clone()
    }

    #[must_use]
    pub fn notice(&self) -> Option<String> {
        self.lock().notice.clone()
    }

    #[must_use]
    pub fn reports(&self) -> Option<Reports> {
        self.lock().reports.clone()
    }

    #[must_use]
    pub fn transcript_len(&self) -> usize {
        self.lock().transcript.len()
    }

    /// Messages appended after the first `seen` ones.
    #[must_use]
    pub fn messages_since(&self, seen: usize) -> Vec<Message> {
        self.lock().transcript.since(seen).to_vec()
    }
}

async fn save(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
