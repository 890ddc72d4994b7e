//! Date-range presets and day-granularity matching.

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::DateRangePreset;

/// Source of "today". Presets are resolved against it at evaluation time.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Current UTC calendar day. Case dates are bucketed in UTC as well.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Pinned day, for tests and replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Inclusive calendar-day bounds; an absent side is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DayRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn single(day: NaiveDate) -> Self {
        Self::new(Some(day), Some(day))
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from.map_or(true, |from| day >= from) && self.to.map_or(true, |to| day <= to)
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

/// Bounds a preset stands for on `today`. `From` has no fixed bounds and
/// returns `None`; the caller keeps whatever the user entered.
///
/// `LastWeek` covers one month and `LastMonth` six months.
pub fn preset_bounds(preset: DateRangePreset, today: NaiveDate) -> Option<DayRange> {
    let range = match preset {
        DateRangePreset::All => DayRange::default(),
        DateRangePreset::Today => DayRange::single(today),
        DateRangePreset::Yesterday => DayRange::single(today.pred_opt().unwrap_or(today)),
        DateRangePreset::LastWeek => DayRange::new(Some(months_before(today, 1)), Some(today)),
        DateRangePreset::LastMonth => DayRange::new(Some(months_before(today, 6)), Some(today)),
        DateRangePreset::From => return None,
    };
    Some(range)
}

// Month arithmetic clamps to the last valid day (May 31 - 1 month = Apr 30).
fn months_before(today: NaiveDate, months: u32) -> NaiveDate {
    today
        .checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}

/// Parse a manual date input. Accepts `YYYY-MM-DD` or an RFC 3339 timestamp
/// (reduced to its UTC day). Anything else, including "", is no bound.
pub fn parse_day(text: &str) -> Option<NaiveDate> {
    if text.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).date_naive())
    })
}
