//! Diagnostic output for the CLI.
//!
//! Everything here goes to stderr; stdout carries only result lines.

use console::style;
use myhttp_lib::{FailureStage, FetchFailure, RunSummary};
use std::time::Duration;

/// Dropped jobs grouped by the stage that rejected them.
#[derive(Debug, Default)]
pub(crate) struct FailureStats {
    pub(crate) invalid: Vec<String>,
    pub(crate) transport: Vec<String>,
    pub(crate) stream: Vec<String>,
    pub(crate) cancelled: usize,
}

impl FailureStats {
    pub(crate) fn add(&mut self, failure: &FetchFailure) {
        if failure.error.is_cancelled() {
            self.cancelled += 1;
            return;
        }
        let url = if failure.url.is_empty() {
            "<empty>".to_string()
        } else {
            failure.url.clone()
        };
        match failure.stage {
            FailureStage::Validation => self.invalid.push(url),
            FailureStage::Transport => self.transport.push(url),
            FailureStage::Stream => self.stream.push(url),
        }
    }

    pub(crate) fn has_errors(&self) -> bool {
        !self.invalid.is_empty()
            || !self.transport.is_empty()
            || !self.stream.is_empty()
            || self.cancelled > 0
    }

    pub(crate) fn format_summary(&self) -> String {
        if !self.has_errors() {
            return String::new();
        }

        let format_list = |urls: &[String], max_show: usize| -> String {
            if urls.len() <= max_show {
                urls.join(", ")
            } else {
                let shown = &urls[..max_show];
                let remaining = urls.len() - max_show;
                format!("{}, ... and {} more", shown.join(", "), remaining)
            }
        };

        let mut lines = vec![format!(
            "  {}",
            style("Some URLs produced no digest:").yellow()
        )];

        let groups = [
            (&self.invalid, "invalid URL"),
            (&self.transport, "fetch failure"),
            (&self.stream, "body read failure"),
        ];
        for (urls, label) in groups {
            if urls.is_empty() {
                continue;
            }
            lines.push(format!(
                "  {} {} {}{}: {}",
                style("•").dim(),
                urls.len(),
                label,
                if urls.len() == 1 { "" } else { "s" },
                format_list(urls, 5),
            ));
        }

        if self.cancelled > 0 {
            lines.push(format!(
                "  {} {} cancelled",
                style("•").dim(),
                self.cancelled
            ));
        }

        lines.join("\n")
    }
}

pub(crate) fn print_run_summary(summary: &RunSummary, duration: Duration) {
    eprintln!(
        "{} {} written, {} dropped of {} in {:.1}s",
        style("Summary:").bold(),
        style(summary.written).green(),
        style(summary.dropped).red(),
        summary.submitted,
        duration.as_secs_f64(),
    );
}

pub(crate) fn print_failure_summary(stats: &FailureStats) {
    if stats.has_errors() {
        eprintln!("{}", stats.format_summary());
    }
}
