//! Human-facing terminal output.
//!
//! Stdout carries the progress protocol only, so everything here goes to
//! stderr.

use console::style;
use gpt_backup_core::{ProgressEvent, ProgressSink};
use indicatif::{ProgressBar, ProgressStyle};

/// Print success message
pub fn success(msg: &str) {
    eprintln!("{} {}", style("✔").green(), msg);
}

/// Print error message
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✖").red(), msg);
}

/// Print info message (indented)
pub fn info(msg: &str) {
    eprintln!("  {}", msg);
}

/// Create a percentage bar
pub fn progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("⚡ {msg}  {bar:20.cyan/dim} {pos}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    pb.set_message(message.to_string());
    pb
}

/// Renders progress events on a bar instead of protocol lines.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        Self {
            bar: progress_bar("Listing conversations"),
        }
    }
}

impl ProgressSink for BarProgress {
    fn emit(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::TotalOffsets(_) | ProgressEvent::RequestedMessages(_) => {}
            ProgressEvent::TotalMessages(total) => {
                self.bar
                    .set_message(format!("Fetching conversations ({} listed)", total));
            }
            ProgressEvent::Progress { percent, offset } => {
                self.bar.set_position(u64::from(percent));
                if percent < 100 {
                    self.bar
                        .set_message(format!("Fetching conversations (offset {})", offset));
                }
            }
            ProgressEvent::Done => self.bar.finish_with_message("Done"),
        }
    }
}
