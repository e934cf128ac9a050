//! Rolling three-month visibility window.
//!
//! The window is always derived from an explicit evaluation date and is never
//! cached: both the read and the write path recompute it per call.

use crate::core::{UserRecord, month_of};
use chrono::{Datelike, NaiveDate};

/// Number of calendar months kept, counting the current one.
pub const RETENTION_MONTHS: usize = 3;

/// The set of `YYYY-MM` month-keys visible at one instant, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionWindow {
    months: [MonthRef; RETENTION_MONTHS],
}

/// A calendar month as (year, month 1..=12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthRef {
    pub year: i32,
    pub month: u32,
}

impl MonthRef {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Shifts by `delta` calendar months, rolling over year boundaries.
    pub fn shift(self, delta: i32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + delta;
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Last calendar day of the month.
    pub fn last_day(self) -> Option<NaiveDate> {
        self.shift(1).first_day().and_then(|next| next.pred_opt())
    }

    pub fn key(self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// Month-keys allowed when evaluated on `today`: its month and the two before it.
pub fn allowed_months(today: NaiveDate) -> RetentionWindow {
    let current = MonthRef::of(today);
    RetentionWindow {
        months: [current, current.shift(-1), current.shift(-2)],
    }
}

impl RetentionWindow {
    pub fn newest(&self) -> MonthRef {
        self.months[0]
    }

    pub fn oldest(&self) -> MonthRef {
        self.months[RETENTION_MONTHS - 1]
    }

    pub fn month_keys(&self) -> Vec<String> {
        self.months.iter().map(|m| m.key()).collect()
    }

    pub fn contains(&self, month: MonthRef) -> bool {
        self.months.contains(&month)
    }

    pub fn contains_month_key(&self, key: &str) -> bool {
        self.months.iter().any(|m| m.key() == key)
    }

    /// A date-key is allowed iff its first seven characters name a window month.
    /// Anything too short to carry a month is rejected, never an error.
    pub fn allows(&self, date_key: &str) -> bool {
        month_of(date_key).is_some_and(|month| self.contains_month_key(month))
    }

    /// Drops every entry outside the window; returns the number pruned.
    pub fn prune(&self, record: &mut UserRecord) -> usize {
        record.retain_dates(|date| self.allows(date))
    }
}
