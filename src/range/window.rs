//! Parsed query windows

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::error::{RangeError, RangeResult};
use super::{filter_by_range, Timestamped};
use crate::stac::parse_timestamp;

const LAST_MILLI_OF_DAY: i64 = 86_400_000 - 1;

/// Inclusive `[start, end]` window in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: start.timestamp_millis(),
            end: end.timestamp_millis(),
        }
    }

    /// Window that contains every timestamp
    pub fn unbounded() -> Self {
        Self {
            start: i64::MIN,
            end: i64::MAX,
        }
    }

    /// Parse optional query bounds
    ///
    /// A missing bound is open. A date-only start means midnight UTC; a
    /// date-only end means the last millisecond of that day.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> RangeResult<Self> {
        let start = match start {
            Some(s) => parse_bound(s, false)?,
            None => i64::MIN,
        };
        let end = match end {
            Some(s) => parse_bound(s, true)?,
            None => i64::MAX,
        };
        Ok(Self { start, end })
    }

    pub fn is_unbounded(&self) -> bool {
        self.start == i64::MIN && self.end == i64::MAX
    }

    pub fn contains(&self, millis: i64) -> bool {
        millis >= self.start && millis <= self.end
    }

    /// Sub-slice of a sorted sequence inside this window
    pub fn apply<'a, T: Timestamped>(&self, items: &'a [T]) -> &'a [T] {
        filter_by_range(items, self.start, self.end)
    }
}

fn parse_bound(raw: &str, is_end: bool) -> RangeResult<i64> {
    let s = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc().timestamp_millis())
            .ok_or_else(|| RangeError::InvalidBound(raw.to_string()))?;
        return Ok(if is_end {
            midnight + LAST_MILLI_OF_DAY
        } else {
            midnight
        });
    }

    parse_timestamp(s)
        .map(|dt| dt.timestamp_millis())
        .ok_or_else(|| RangeError::InvalidBound(raw.to_string()))
}
