//! Conversational assessment session.
//!
//! DESIGN
//! ======
//! `transcript` is the append-only message log; `client` drives the
//! question/answer exchange against an [`crate::api::AssessmentApi`] and
//! owns the resulting reports.

pub mod client;
pub mod transcript;

pub use client::{
    DownloadOutcome, Phase, ReportOutcome, Reports, Session, SessionClient, SessionSnapshot, StartOutcome,
    SubmitOutcome,
};
pub use transcript::{Message, Sender, Transcript};
