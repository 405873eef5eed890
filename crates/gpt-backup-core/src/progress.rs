//! Structured progress emission for wrapping tools.
//!
//! Progress is reported as `GPT-BACKUP::`-prefixed lines on stdout. Tools
//! driving the harvester parse these lines, so the rendered format is part
//! of the public interface.
//!
//! # Protocol
//! ```text
//! GPT-BACKUP::STARTING::TOTAL-OFFSETS::<last offset>
//! GPT-BACKUP::STARTING::REQUESTED-MESSAGES::<requested>
//! GPT-BACKUP::STARTING::TOTAL-MESSAGES::<total>
//! GPT-BACKUP::PROGRESS::<0-100>%::OFFSET::<offset>
//! GPT-BACKUP::DONE
//! ```

use std::fmt;
use std::io::Write;

const PREFIX: &str = "GPT-BACKUP";

/// One line of the progress protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Highest pagination offset this run covers.
    TotalOffsets(u64),
    /// Denominator used for percentages.
    RequestedMessages(u64),
    /// Raw conversation count reported by the listing endpoint.
    TotalMessages(u64),
    Progress { percent: u8, offset: u64 },
    Done,
}

impl ProgressEvent {
    /// Build a `Progress` event from the produced/requested ratio.
    pub fn progress(requested: u64, produced: usize, offset: u64) -> Self {
        Self::Progress {
            percent: percent(requested, produced),
            offset,
        }
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TotalOffsets(n) => write!(f, "{PREFIX}::STARTING::TOTAL-OFFSETS::{n}"),
            Self::RequestedMessages(n) => write!(f, "{PREFIX}::STARTING::REQUESTED-MESSAGES::{n}"),
            Self::TotalMessages(n) => write!(f, "{PREFIX}::STARTING::TOTAL-MESSAGES::{n}"),
            Self::Progress { percent, offset } => {
                write!(f, "{PREFIX}::PROGRESS::{percent}%::OFFSET::{offset}")
            }
            Self::Done => write!(f, "{PREFIX}::DONE"),
        }
    }
}

/// Rounded completion percentage, clamped to 100. A zero denominator
/// counts as complete.
pub fn percent(requested: u64, produced: usize) -> u8 {
    if requested == 0 {
        return 100;
    }
    let ratio = (produced as f64 / requested as f64) * 100.0;
    ratio.round().min(100.0) as u8
}

/// Receiver for progress events.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Prints each event as a protocol line and flushes immediately so a
/// parent process sees it without buffering delay.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutProgress;

impl ProgressSink for StdoutProgress {
    fn emit(&self, event: ProgressEvent) {
        println!("{}", event);
        let _ = std::io::stdout().flush();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::{ProgressEvent, ProgressSink};

    /// Keeps every event in order for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingProgress {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl RecordingProgress {
        pub fn events(&self) -> Vec<ProgressEvent> {
            self.events.lock().unwrap().clone()
        }

        pub fn lines(&self) -> Vec<String> {
            self.events().iter().map(|e| e.to_string()).collect()
        }
    }

    impl ProgressSink for RecordingProgress {
        fn emit(&self, event: ProgressEvent) {
            self.events.lock().unwrap().push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_format() {
        assert_eq!(
            ProgressEvent::TotalOffsets(40).to_string(),
            "GPT-BACKUP::STARTING::TOTAL-OFFSETS::40"
        );
        assert_eq!(
            ProgressEvent::RequestedMessages(45).to_string(),
            "GPT-BACKUP::STARTING::REQUESTED-MESSAGES::45"
        );
        assert_eq!(
            ProgressEvent::TotalMessages(45).to_string(),
            "GPT-BACKUP::STARTING::TOTAL-MESSAGES::45"
        );
        assert_eq!(
            ProgressEvent::progress(100, 20, 20).to_string(),
            "GPT-BACKUP::PROGRESS::20%::OFFSET::20"
        );
        assert_eq!(ProgressEvent::Done.to_string(), "GPT-BACKUP::DONE");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(100, 0), 0);
        assert_eq!(percent(3, 1), 33);
        assert_eq!(percent(8, 1), 13); // 12.5 rounds up
        assert_eq!(percent(50, 70), 100);
        assert_eq!(percent(0, 0), 100);
    }
}
