//! Terminal output for a delivery run.
//!
//! One spinner tracks the current step; completed steps are printed above it
//! via `indicatif`'s suspend-free println so the bar never tears.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Strip control characters from external text (issue titles, service
/// responses) before it is interpolated into terminal output.
pub fn sanitize_for_log(input: &str) -> String {
    input.chars().filter(|c| !c.is_control()).collect()
}

pub struct StepLogger {
    spinner: ProgressBar,
    verbose: bool,
}

impl StepLogger {
    pub fn new(verbose: bool) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .expect("spinner template is a valid static string"),
        );
        spinner.enable_steady_tick(Duration::from_millis(120));
        Self { spinner, verbose }
    }

    /// Begin a new top-level step; the previous step line is retired.
    pub fn step(&self, message: &str) {
        self.spinner
            .println(format!("{} {}", style("→").cyan().bold(), message));
        self.spinner.set_message(message.to_string());
    }

    /// Verbose-only sub-step detail.
    pub fn detail(&self, message: &str) {
        if self.verbose {
            self.spinner
                .println(format!("    {}", style(message).dim()));
        }
    }

    pub fn success(&self, message: &str) {
        self.spinner
            .println(format!("{} {}", style("✓").green().bold(), message));
    }

    pub fn warn(&self, message: &str) {
        self.spinner
            .println(format!("{} {}", style("!").yellow().bold(), message));
    }

    pub fn failure(&self, message: &str) {
        self.spinner
            .println(format!("{} {}", style("✗").red().bold(), message));
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for StepLogger {
    fn drop(&mut self) {
        self.spinner.finish_and_clear();
    }
}
