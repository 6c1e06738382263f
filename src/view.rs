//! Pluggable renderers for the transcript and the dashboard.
//!
//! The session and survey flows are presentation-free; a [`SessionView`]
//! decides how messages, notices, and the dashboard reach the user.

use std::io::{self, Write};

use time::macros::format_description;

use crate::dashboard::{Dashboard, Slice};
use crate::session::{Message, Sender};

const BAR_WIDTH: usize = 30;

pub trait SessionView {
    /// Render one transcript entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying sink fails.
    fn render_message(&mut self, message: &Message) -> io::Result<()>;

    /// Render an inline notice that is not part of the transcript.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying sink fails.
    fn render_notice(&mut self, notice: &str) -> io::Result<()>;

    /// Render the report dashboard.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying sink fails.
    fn render_dashboard(&mut self, dashboard: &Dashboard) -> io::Result<()>;

    /// Render several transcript entries in order.
    ///
    /// # Errors
    ///
    /// Returns the first sink error.
    fn render_messages(&mut self, messages: &[Message]) -> io::Result<()> {
        for message in messages {
            self.render_message(message)?;
        }
        Ok(())
    }
}

/// Plain-text renderer for terminals and logs.
pub struct TerminalView<W: Write> {
    out: W,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn chart(&mut self, title: &str, slices: &[Slice]) -> io::Result<()> {
        writeln!(self.out, "{title}")?;
        if slices.is_empty() {
            return writeln!(self.out, "  (none)");
        }
        let total: usize = slices.iter().map(|s| s.count).sum();
        let max = slices.iter().map(|s| s.count).max().unwrap_or(1).max(1);
        let label_width = slices.iter().map(|s| s.label.chars().count()).max().unwrap_or(0);
        for slice in slices {
            let bar = "#".repeat((slice.count * BAR_WIDTH).div_ceil(max));
            let percent = slice.count * 100 / total.max(1);
            writeln!(
                self.out,
                "  {label:<label_width$}  {bar} {count} ({percent}%)",
                label = slice.label,
                count = slice.count,
            )?;
        }
        Ok(())
    }
}

impl<W: Write> SessionView for TerminalView<W> {
    fn render_message(&mut self, message: &Message) -> io::Result<()> {
        let stamp = message
            .timestamp
            .format(format_description!("[hour]:[minute]"))
            .unwrap_or_default();
        let who = match message.sender {
            Sender::Bot => "bot",
            Sender::User => "you",
        };
        let mut lines = plain_text(&message.text).into_iter();
        let first = lines.next().unwrap_or_default();
        writeln!(self.out, "[{stamp}] {who}: {first}")?;
        for line in lines {
            writeln!(self.out, "{:width$}{line}", "", width = stamp.len() + who.len() + 5)?;
        }
        Ok(())
    }

    fn render_notice(&mut self, notice: &str) -> io::Result<()> {
        writeln!(self.out, "  ! {notice}")
    }

    fn render_dashboard(&mut self, dashboard: &Dashboard) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "=== Security Risk Assessment ===")?;
        writeln!(
            self.out,
            "Risk level: {} ({}) across {} identified risks",
            dashboard.severity,
            dashboard.severity.color(),
            dashboard.risk_count
        )?;
        if !dashboard.risk_summary.is_empty() {
            writeln!(self.out, "{}", dashboard.risk_summary)?;
        }
        writeln!(self.out)?;

        writeln!(self.out, "Identified risks")?;
        if dashboard.identified_risks.is_empty() {
            writeln!(self.out, "  No risks identified. Great job!")?;
        }
        for risk in &dashboard.identified_risks {
            writeln!(self.out, "  - {risk}")?;
        }
        writeln!(self.out)?;

        self.chart("Risk categories", &dashboard.categories)?;
        writeln!(self.out)?;
        self.chart("Mitigation types", &dashboard.mitigation_types)?;

        if !dashboard.unique_solutions.is_empty() {
            writeln!(self.out)?;
            writeln!(self.out, "Available solutions")?;
            for solution in &dashboard.unique_solutions {
                writeln!(self.out, "  - {solution}")?;
            }
        }

        if !dashboard.answers.is_empty() {
            writeln!(self.out)?;
            writeln!(self.out, "Survey responses")?;
            for (question, answer) in &dashboard.answers {
                writeln!(self.out, "  {question} -> {answer}")?;
            }
        }
        self.out.flush()
    }
}

/// Strip `**bold**` markers and split into display lines.
#[must_use]
pub fn plain_text(text: &str) -> Vec<String> {
    text.replace("**", "").lines().map(str::to_owned).collect()
}

#[cfg(test)]
#[path = "view_test.rs"]
mod tests;
