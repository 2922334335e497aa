//! Accounting periods.
//!
//! An expense belongs to one month/year period (`"YYYY-MM"`). Periods older
//! than a caller-supplied `open_from` boundary are closed: the coordinator
//! refuses any (re)allocation against them. The boundary is always an
//! explicit parameter, never ambient state, so the engine stays testable in
//! isolation.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// A month/year accounting period, ordered chronologically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeriodKey {
    pub year: i32,
    pub month: u8,
}

impl PeriodKey {
    pub fn new(year: i32, month: u8) -> Result<Self, EngineError> {
        if !(1..=12).contains(&month) {
            return Err(EngineError::InvalidAmount(format!(
                "invalid period month: {month}"
            )));
        }
        if !(2000..=9999).contains(&year) {
            return Err(EngineError::InvalidAmount(format!(
                "invalid period year: {year}"
            )));
        }
        Ok(Self { year, month })
    }

    /// `true` if this period is closed relative to `open_from`, the earliest
    /// period still open for edits.
    #[must_use]
    pub fn is_closed(self, open_from: PeriodKey) -> bool {
        self < open_from
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for PeriodKey {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidAmount(format!("invalid period: {s}"));

        let (year_str, month_str) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year_str.len() != 4 || month_str.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year_str.parse().map_err(|_| invalid())?;
        let month: u8 = month_str.parse().map_err(|_| invalid())?;
        PeriodKey::new(year, month)
    }
}

impl TryFrom<String> for PeriodKey {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PeriodKey> for String {
    fn from(value: PeriodKey) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_roundtrip() {
        let period: PeriodKey = "2026-08".parse().unwrap();
        assert_eq!(period, PeriodKey::new(2026, 8).unwrap());
        assert_eq!(period.to_string(), "2026-08");
    }

    #[test]
    fn parse_rejects_malformed_keys() {
        assert!("2026".parse::<PeriodKey>().is_err());
        assert!("2026-13".parse::<PeriodKey>().is_err());
        assert!("2026-0".parse::<PeriodKey>().is_err());
        assert!("26-08".parse::<PeriodKey>().is_err());
    }

    #[test]
    fn ordering_is_chronological() {
        let jul: PeriodKey = "2026-07".parse().unwrap();
        let aug: PeriodKey = "2026-08".parse().unwrap();
        assert!(jul < aug);
        assert!(jul.is_closed(aug));
        assert!(!aug.is_closed(aug));
        assert!(!aug.is_closed(jul));
    }
}
