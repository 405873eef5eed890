//! Pagination offset planning.

use std::fmt;
use std::str::FromStr;

/// Items per listing page.
pub const PAGE_SIZE: u64 = 20;

/// Where collection stops. `-1` on the command line means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopOffset {
    #[default]
    Unbounded,
    /// Stop before requesting the page at this offset.
    At(u64),
}

impl StopOffset {
    pub fn from_raw(raw: i64) -> Option<Self> {
        match raw {
            -1 => Some(Self::Unbounded),
            n if n >= 0 => Some(Self::At(n as u64)),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> i64 {
        match self {
            Self::Unbounded => -1,
            Self::At(n) => *n as i64,
        }
    }
}

impl FromStr for StopOffset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: i64 = s
            .trim()
            .parse()
            .map_err(|_| format!("invalid stop offset: {s}"))?;
        Self::from_raw(raw).ok_or_else(|| format!("stop offset must be -1 or >= 0, got {raw}"))
    }
}

impl fmt::Display for StopOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_raw())
    }
}

/// Offsets of every page after the one already fetched at `start`.
///
/// Returns `start + 20, start + 40, ...` up to but excluding `total`; a page
/// starting exactly at `total` would be empty.
pub fn plan(start: u64, total: u64) -> Vec<u64> {
    (1..)
        .map(|page| start + page * PAGE_SIZE)
        .take_while(|&offset| offset < total)
        .collect()
}

/// Denominator for progress percentages. Not an exact item count.
pub fn request_count(total: u64, start: u64, stop: StopOffset) -> u64 {
    match stop {
        StopOffset::Unbounded => total,
        StopOffset::At(stop) => stop.saturating_sub(start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan() {
        assert_eq!(plan(0, 45), vec![20, 40]);
        assert_eq!(plan(0, 20), Vec::<u64>::new());
        assert_eq!(plan(5, 50), vec![25, 45]);
        assert_eq!(plan(0, 25), vec![20]);
        assert_eq!(plan(0, 0), Vec::<u64>::new());
        assert_eq!(plan(100, 50), Vec::<u64>::new());
    }

    #[test]
    fn test_request_count() {
        assert_eq!(request_count(100, 0, StopOffset::Unbounded), 100);
        assert_eq!(request_count(100, 10, StopOffset::At(60)), 50);
        assert_eq!(request_count(100, 60, StopOffset::At(10)), 0);
    }

    #[test]
    fn test_stop_offset_parsing() {
        assert_eq!("-1".parse::<StopOffset>().unwrap(), StopOffset::Unbounded);
        assert_eq!("40".parse::<StopOffset>().unwrap(), StopOffset::At(40));
        assert!("-2".parse::<StopOffset>().is_err());
        assert!("abc".parse::<StopOffset>().is_err());
        assert_eq!(StopOffset::At(40).to_string(), "40");
        assert_eq!(StopOffset::Unbounded.to_string(), "-1");
    }
}
