//! Calendar arithmetic for a single reporting month.

use crate::error::LedgerError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use plantledger_schemas::expense::period_key;
use std::fmt;

/// Hours in the nominal shift used for `working_hours` equipment.
pub const SHIFT_HOURS: f64 = 8.0;

/// A calendar month. The month index is zero-based to match stored records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    first_day: NaiveDate,
    last_day: NaiveDate,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, LedgerError> {
        if month > 11 {
            return Err(LedgerError::InvalidMonth(month));
        }
        let days = days_in_month(year, month);
        let first_day =
            NaiveDate::from_ymd_opt(year, month + 1, 1).ok_or(LedgerError::InvalidYear(year))?;
        let last_day =
            NaiveDate::from_ymd_opt(year, month + 1, days).ok_or(LedgerError::InvalidYear(year))?;
        Ok(Self { first_day, last_day })
    }

    /// Parses a `YYYY-MM` storage key.
    pub fn parse_key(key: &str) -> Result<Self, LedgerError> {
        let invalid = || LedgerError::InvalidPeriodKey(key.to_string());
        let (year, month) = key.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if month == 0 || month > 12 {
            return Err(invalid());
        }
        Self::new(year, month - 1)
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    /// Zero-based month index.
    pub fn month(&self) -> u32 {
        self.first_day.month0()
    }

    pub fn key(&self) -> String {
        period_key(self.year(), self.month())
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last_day
    }

    /// Midnight UTC on the first day of the month.
    pub fn first_instant(&self) -> DateTime<Utc> {
        self.first_day.and_time(NaiveTime::MIN).and_utc()
    }

    /// 23:59:59.999 UTC on the last day of the month.
    pub fn last_instant(&self) -> DateTime<Utc> {
        self.last_day.and_time(NaiveTime::MIN).and_utc() + Duration::milliseconds(86_399_999)
    }

    /// Midnight UTC after the last day, the exclusive upper bound of the month.
    pub fn end_instant(&self) -> DateTime<Utc> {
        self.first_instant()
            .checked_add_signed(Duration::days(i64::from(self.days_in_month())))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether `ts` falls on any day of this month (both ends inclusive).
    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        let day = ts.date_naive();
        day >= self.first_day && day <= self.last_day
    }

    pub fn days_in_month(&self) -> u32 {
        self.last_day.day()
    }

    /// Days in the month that fall on Monday through Friday.
    pub fn workdays(&self) -> u32 {
        self.first_day
            .iter_days()
            .take(self.days_in_month() as usize)
            .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
            .count() as u32
    }

    pub fn next(&self) -> Result<Self, LedgerError> {
        match self.month() {
            11 => Self::new(self.year() + 1, 0),
            m => Self::new(self.year(), m + 1),
        }
    }

    pub fn previous(&self) -> Result<Self, LedgerError> {
        match self.month() {
            0 => Self::new(self.year() - 1, 11),
            m => Self::new(self.year(), m - 1),
        }
    }

    /// All twelve months of `year`, January first.
    pub fn months_of(year: i32) -> Result<Vec<Self>, LedgerError> {
        (0..12).map(|month| Self::new(year, month)).collect()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first_day.format("%B %Y"))
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 if is_leap_year(year) => 29,
        1 => 28,
        3 | 5 | 8 | 10 => 30,
        _ => 31,
    }
}
