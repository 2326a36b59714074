// UI module for consistent terminal output with progress bars and styling
//
// Spinners for catalog requests and one progress bar per package file.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use ccpkg::error::Error;
use ccpkg::fetcher::{FetchOutcome, FetchProgress, ProgressSink};
use ccpkg::orchestrator::{FileReport, RunObserver};
use ccpkg::resolver::{FileSelection, PlanEntry};
use console::{Term, style};
use indicatif::{HumanBytes, MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Spinner style similar to uv/pnpm
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Check if stderr is a TTY (for interactive output)
fn is_tty() -> bool {
    Term::stderr().is_term()
}

fn spinner_style(template: &str) -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(SPINNER_CHARS)
}

/// Create a styled spinner for async operations
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if !is_tty() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    pb.set_style(spinner_style("{spinner:.cyan} {msg}"));
    pb.set_message(message.to_string());
    if is_tty() {
        pb.enable_steady_tick(Duration::from_millis(80));
    }
    pb
}

/// Create a progress bar for a package download; the length is filled in once known
pub fn download_bar(name: &str, total_size: Option<u64>) -> ProgressBar {
    let pb = match total_size {
        Some(size) => ProgressBar::new(size),
        None => ProgressBar::no_length(),
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.cyan} {msg} [{bar:25.cyan/dim}] {bytes}/{total_bytes} ({bytes_per_sec})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .tick_chars(SPINNER_CHARS)
            .progress_chars("━━╺"),
    );
    pb.set_message(name.to_string());
    pb
}

/// Print a success message with checkmark
pub fn success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Print an info/action message with arrow
pub fn action(message: &str) {
    println!("{} {}", style("→").cyan(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    eprintln!("{} {}", style("⚠").yellow(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red(), message);
}

/// Print a header/section message
pub fn header(message: &str) {
    println!("{}", style(message).bold());
}

/// Print a plain line of command output
pub fn line(message: &str) {
    println!("{}", message);
}

/// Print a status message (for dry-run, etc.)
pub fn status(prefix: &str, message: &str) {
    println!("{} {}", style(prefix).cyan().bold(), message);
}

fn finish_with(pb: &ProgressBar, msg: String, to_stderr: bool) {
    if is_tty() {
        pb.set_style(spinner_style("{msg}"));
        pb.finish_with_message(msg);
    } else {
        pb.finish_and_clear();
        if to_stderr {
            eprintln!("{}", msg);
        } else {
            println!("{}", msg);
        }
    }
}

/// Finish a spinner with success
pub fn finish_spinner_success(pb: &ProgressBar, message: &str) {
    finish_with(pb, format!("{} {}", style("✓").green(), message), false);
}

/// Finish a spinner with error
pub fn finish_spinner_error(pb: &ProgressBar, message: &str) {
    finish_with(pb, format!("{} {}", style("✗").red(), message), true);
}

/// Forwards fetcher progress to a progress bar
struct BarSink {
    name: String,
    bar: ProgressBar,
}

impl ProgressSink for BarSink {
    fn on_progress(&self, progress: &FetchProgress) {
        if let Some(total) = progress.total
            && self.bar.length() != Some(total)
        {
            self.bar.set_length(total);
        }
        self.bar.set_position(progress.downloaded);
    }

    fn on_retry(&self, attempt: u32, max_attempts: u32, _reason: &str) {
        self.bar.set_message(format!(
            "{} {}",
            self.name,
            style(format!("retry {}/{}", attempt + 1, max_attempts)).yellow()
        ));
    }
}

/// Renders orchestrator events: a line per product and a bar per file
pub struct ConsoleObserver {
    multi: MultiProgress,
    bars: Mutex<HashMap<(String, String), ProgressBar>>,
}

impl ConsoleObserver {
    pub fn new() -> Self {
        let multi = MultiProgress::new();
        if !is_tty() {
            multi.set_draw_target(ProgressDrawTarget::hidden());
        }
        Self {
            multi,
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn line(&self, message: String) {
        if !is_tty() {
            println!("{}", message);
        } else if let Err(e) = self.multi.println(&message) {
            log::debug!("Progress output unavailable: {}", e);
            println!("{}", message);
        }
    }

    fn take_bar(&self, entry: &PlanEntry, name: &str) -> Option<ProgressBar> {
        self.bars
            .lock()
            .ok()
            .and_then(|mut bars| bars.remove(&(entry.to_string(), name.to_string())))
    }
}

impl Default for ConsoleObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl RunObserver for ConsoleObserver {
    fn entry_started(&self, entry: &PlanEntry) {
        self.line(format!("{} {}", style("→").cyan(), style(entry).bold()));
    }

    fn files_selected(&self, _entry: &PlanEntry, selection: &FileSelection) {
        self.line(format!(
            "  {}",
            style(format!(
                "{} core and {} non-core package(s)",
                selection.core_count, selection.noncore_count
            ))
            .dim()
        ));
    }

    fn file_started(
        &self,
        entry: &PlanEntry,
        name: &str,
        expected_size: Option<u64>,
    ) -> Box<dyn ProgressSink> {
        let bar = self.multi.add(download_bar(name, expected_size));
        if let Ok(mut bars) = self.bars.lock() {
            bars.insert((entry.to_string(), name.to_string()), bar.clone());
        }
        Box::new(BarSink {
            name: name.to_string(),
            bar,
        })
    }

    fn file_finished(&self, entry: &PlanEntry, report: &FileReport) {
        if let Some(bar) = self.take_bar(entry, &report.name) {
            bar.finish_and_clear();
            self.multi.remove(&bar);
        }
        match &report.result {
            Ok(FetchOutcome::AlreadyComplete { size }) => self.line(format!(
                "  {} {} {}",
                style("✓").green(),
                report.name,
                style(format!("{} already downloaded", HumanBytes(*size))).dim()
            )),
            Ok(outcome) => self.line(format!(
                "  {} {} {}",
                style("✓").green(),
                report.name,
                style(HumanBytes(outcome.size())).dim()
            )),
            Err(reason) => self.line(format!(
                "  {} {} {}",
                style("✗").red(),
                report.name,
                style(reason).dim()
            )),
        }
    }

    fn entry_failed(&self, entry: &PlanEntry, error: &Error) {
        self.line(format!(
            "  {} {} skipped: {}",
            style("✗").red(),
            entry,
            error
        ));
    }
}
