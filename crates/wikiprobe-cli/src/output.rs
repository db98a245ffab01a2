//! Output formatting and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Mutex;
use std::time::Duration;
use wikiprobe::{CaseReport, CaseStatus, RunObserver, SuiteReport};

use crate::error::CliResult;

/// Output format for test results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

// ============================================================================
// Run summary
// ============================================================================

/// Every suite report of one run, with totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Suite reports in run order
    pub suites: Vec<SuiteReport>,
    /// Passed cases
    pub passed: usize,
    /// Passed with a warning
    pub warned: usize,
    /// Failed cases
    pub failed: usize,
    /// Skipped cases
    pub skipped: usize,
    /// Total wall time in milliseconds
    pub duration_ms: u64,
}

impl RunSummary {
    /// Tally `suites`
    #[must_use]
    pub fn new(suites: Vec<SuiteReport>) -> Self {
        let passed = suites.iter().map(SuiteReport::passed).sum();
        let warned = suites.iter().map(SuiteReport::warned).sum();
        let failed = suites.iter().map(SuiteReport::failed).sum();
        let skipped = suites.iter().map(SuiteReport::skipped).sum();
        let duration_ms = suites.iter().map(|s| s.duration_ms).sum();
        Self {
            suites,
            passed,
            warned,
            failed,
            skipped,
            duration_ms,
        }
    }

    /// Cases reported
    #[must_use]
    pub fn total(&self) -> usize {
        self.suites.iter().map(|s| s.cases.len()).sum()
    }

    /// No case failed
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Render in `format`
    pub fn render(&self, format: OutputFormat) -> CliResult<String> {
        match format {
            OutputFormat::Text => Ok(self.render_text()),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }

    /// Plain-text report, one line per case
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for suite in &self.suites {
            let _ = writeln!(out, "{} ({} ms)", suite.suite, suite.duration_ms);
            for case in &suite.cases {
                let _ = write!(out, "  [{}] {}", case.status, case.name);
                if let Some(message) = &case.message {
                    let _ = write!(out, ": {message}");
                }
                out.push('\n');
            }
        }
        let _ = writeln!(
            out,
            "{} cases: {} passed, {} warned, {} failed, {} skipped",
            self.total(),
            self.passed,
            self.warned,
            self.failed,
            self.skipped
        );
        out
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Progress reporter for test execution
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Mutex<Option<ProgressBar>>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: Mutex::new(None),
            use_color,
            quiet,
        }
    }

    /// Start a progress bar for `total` cases
    pub fn start_progress(&self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        if let Ok(mut slot) = self.progress_bar.lock() {
            *slot = Some(pb);
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(slot) = self.progress_bar.lock() {
            if let Some(ref pb) = *slot {
                f(pb);
            }
        }
    }

    /// Finish progress bar
    pub fn finish(&self) {
        self.with_bar(|pb| pb.finish_and_clear());
    }

    fn line(&self, message: &str) {
        // Print above the bar when one is running
        let mut printed = false;
        self.with_bar(|pb| {
            pb.println(message);
            printed = true;
        });
        if !printed {
            let _ = self.term.write_line(message);
        }
    }

    fn prefix(&self, status: CaseStatus) -> String {
        if !self.use_color {
            return status.to_string();
        }
        match status {
            CaseStatus::Passed => style("✓").green().bold().to_string(),
            CaseStatus::Warned => style("⚠").yellow().bold().to_string(),
            CaseStatus::Failed => style("✗").red().bold().to_string(),
            CaseStatus::Skipped => style("-").dim().to_string(),
        }
    }

    /// Print one finished case
    pub fn case_line(&self, suite: &str, report: &CaseReport) {
        if self.quiet && report.status != CaseStatus::Failed {
            return;
        }
        let mut text = format!(
            "{} {suite}::{} ({} ms)",
            self.prefix(report.status),
            report.name,
            report.duration_ms
        );
        if let Some(message) = &report.message {
            let _ = write!(text, " - {message}");
        }
        self.line(&text);
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        self.line("");
        self.line(&styled);
    }

    /// Print run summary
    pub fn summary(&self, summary: &RunSummary) {
        if self.quiet && summary.is_success() {
            return;
        }

        let _ = self.term.write_line("");
        let duration_secs = Duration::from_millis(summary.duration_ms).as_secs_f64();
        let total = summary.total();

        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();
            let other_style = Style::new().yellow();

            let status = if summary.is_success() {
                passed_style.apply_to("PASSED")
            } else {
                failed_style.apply_to("FAILED")
            };

            let _ = self.term.write_line(&format!(
                "{} {} cases in {:.2}s ({} passed, {} warned, {} failed, {} skipped)",
                status,
                total,
                duration_secs,
                passed_style.apply_to(summary.passed),
                other_style.apply_to(summary.warned),
                if summary.failed > 0 {
                    failed_style.apply_to(summary.failed).to_string()
                } else {
                    summary.failed.to_string()
                },
                other_style.apply_to(summary.skipped)
            ));
        } else {
            let status = if summary.is_success() { "PASSED" } else { "FAILED" };
            let _ = self.term.write_line(&format!(
                "{status} {total} cases in {duration_secs:.2}s ({} passed, {} warned, {} failed, {} skipped)",
                summary.passed, summary.warned, summary.failed, summary.skipped
            ));
        }
    }
}

impl RunObserver for ProgressReporter {
    fn case_started(&self, suite: &str, case: &str) {
        self.with_bar(|pb| pb.set_message(format!("{suite}::{case}")));
    }

    fn case_finished(&self, suite: &str, report: &CaseReport) {
        self.case_line(suite, report);
        self.with_bar(|pb| pb.inc(1));
    }
}
