//! Progress indicators on stderr.
//!
//! indicatif hides them when stderr isn't a terminal, so piping the output stays clean.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Create a spinner for waits of unknown length
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner:.cyan} {msg:40}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Create a bar advancing once per finished item
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let bar = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.cyan} {msg:40} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ");
    bar.set_style(style);
    bar.set_message(message.to_string());
    bar
}

pub fn finish_success(progress: &ProgressBar, message: &str) {
    finish(progress, "{prefix:.green} {msg}", "✓", message);
}

pub fn finish_error(progress: &ProgressBar, message: &str) {
    finish(progress, "{prefix:.red} {msg}", "✗", message);
}

fn finish(progress: &ProgressBar, template: &str, prefix: &'static str, message: &str) {
    progress.set_style(
        ProgressStyle::default_spinner()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.set_prefix(prefix);
    progress.finish_with_message(message.to_string());
}
