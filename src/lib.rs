//! Conversational security-risk assessment client.
//!
//! A store owner answers a backend-driven questionnaire one message at a
//! time; once the backend reaches its terminal state the client fetches a
//! quick and a detailed risk report and can download both as PDFs.
//!
//! - [`session`] drives the session-based conversation.
//! - [`survey`] drives the profile-then-survey alternate flow.
//! - [`api`] is the transport seam and its `reqwest` implementation.
//! - [`dashboard`] and [`view`] turn reports and transcripts into output.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod session;
pub mod survey;
pub mod view;
