//!
//! Date+time value shared by the date and the time picker.
//!
//! [Temporal] is an immutable value. All changes go through
//! pure functions that return a new value, the calendar math
//! never mutates in place.
//!
//! [SharedTemporal] is the cell the hosting form owns and hands
//! to both pickers. Each picker only changes the fields it is
//! responsible for via [SharedTemporal::update].
//!
//! ```rust
//! use pretty_der6y::temporal::{SharedTemporal, Temporal};
//!
//! let value = SharedTemporal::new(Temporal::from_ymd_hms(2024, 7, 10, 8, 0, 0).expect("date"));
//! let other = value.clone();
//!
//! other.update(|v| v.with_year(2025));
//! assert_eq!(value.get().year(), 2025);
//! assert_eq!(value.get().time_text(), "08:00:00");
//! ```
//!
use chrono::{Datelike, Days, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use regex::Regex;
use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use std::sync::LazyLock;

static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])$").expect("date pattern")
});

static TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([01]?[0-9]|2[0-3]):[0-5][0-9]:[0-5][0-9]$").expect("time pattern")
});

/// A point in time as local wall-clock date and time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Temporal(NaiveDateTime);

/// Earliest year. Dates outside of `MIN_YEAR..=MAX_YEAR` don't
/// fit `YYYY-MM-DD`.
pub const MIN_YEAR: i32 = 0;
/// Latest year.
pub const MAX_YEAR: i32 = 9999;

fn in_range(date: NaiveDate) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&date.year())
}

/// Number of days in the given month. Month is 1-based.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// First year of the decade page.
pub fn decade_start(year: i32) -> i32 {
    year - year.rem_euclid(10)
}

/// The 12 years shown on the decade page.
pub fn decade(year: i32) -> [i32; 12] {
    let start = decade_start(year);
    let mut years = [0; 12];
    for (i, y) in years.iter_mut().enumerate() {
        *y = start + i as i32;
    }
    years
}

impl Temporal {
    pub fn new(value: NaiveDateTime) -> Self {
        Self(value)
    }

    /// Current local time.
    pub fn now() -> Self {
        Self(Local::now().naive_local())
    }

    /// Create from components. Month is 1-based.
    /// None for invalid components and for years beyond `MIN_YEAR..=MAX_YEAR`.
    pub fn from_ymd_hms(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Option<Self> {
        let date = NaiveDate::from_ymd_opt(year, month, day).filter(|v| in_range(*v))?;
        let time = NaiveTime::from_hms_opt(hour, minute, second)?;
        Some(Self(NaiveDateTime::new(date, time)))
    }

    pub fn value(&self) -> NaiveDateTime {
        self.0
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    pub fn time(&self) -> NaiveTime {
        self.0.time()
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Month, 1-based.
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Month, 0-based.
    pub fn month0(&self) -> u32 {
        self.0.month0()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    pub fn second(&self) -> u32 {
        self.0.second()
    }

    /// Milliseconds since the epoch.
    ///
    /// The value is interpreted as local time. Ambiguous local times
    /// resolve to the earlier instant, local times that don't exist
    /// are taken as UTC.
    pub fn timestamp_millis(&self) -> i64 {
        Local
            .from_local_datetime(&self.0)
            .earliest()
            .map(|v| v.timestamp_millis())
            .unwrap_or_else(|| self.0.and_utc().timestamp_millis())
    }

    /// Shift by n months. The day is clamped to the length of
    /// the target month. Stays put at the end of the calendar.
    pub fn add_months(&self, n: i32) -> Self {
        let idx = (self.year() * 12 + self.month0() as i32).saturating_add(n);
        let year = idx.div_euclid(12);
        let month0 = idx.rem_euclid(12) as u32;
        self.with_year_month(year, month0 + 1)
    }

    /// Shift by n days. Stays put at the end of the calendar.
    pub fn add_days(&self, n: i64) -> Self {
        let shifted = if n >= 0 {
            self.0.checked_add_days(Days::new(n as u64))
        } else {
            self.0.checked_sub_days(Days::new(n.unsigned_abs()))
        };
        shifted
            .filter(|v| in_range(v.date()))
            .map(Self)
            .unwrap_or(*self)
    }

    /// Shift by n years. The day is clamped for Feb 29.
    pub fn add_years(&self, n: i32) -> Self {
        self.with_year(self.year().saturating_add(n))
    }

    /// Replace the year. The day is clamped for Feb 29.
    pub fn with_year(&self, year: i32) -> Self {
        self.with_year_month(year, self.month())
    }

    /// Replace the month. The month is 0-based, values beyond 11
    /// are clamped. The day is clamped to the length of the month.
    pub fn with_month0(&self, month0: u32) -> Self {
        self.with_year_month(self.year(), month0.min(11) + 1)
    }

    fn with_year_month(&self, year: i32, month: u32) -> Self {
        let day = self.day().min(days_in_month(year, month));
        match NaiveDate::from_ymd_opt(year, month, day).filter(|v| in_range(*v)) {
            Some(date) => Self(NaiveDateTime::new(date, self.time())),
            None => *self,
        }
    }

    /// Replace the day of the month. None if the day is not valid
    /// for the current month.
    pub fn with_day(&self, day: u32) -> Option<Self> {
        self.0.with_day(day).map(Self)
    }

    /// Replace the date, keep the time of day.
    /// A date beyond the calendar leaves the value unchanged.
    pub fn with_date(&self, date: NaiveDate) -> Self {
        if in_range(date) {
            Self(NaiveDateTime::new(date, self.time()))
        } else {
            *self
        }
    }

    /// Replace the time of day, keep the date.
    pub fn with_time(&self, time: NaiveTime) -> Self {
        Self(NaiveDateTime::new(self.date(), time))
    }

    pub fn with_hour(&self, hour: u32) -> Option<Self> {
        self.0.with_hour(hour).map(Self)
    }

    pub fn with_minute(&self, minute: u32) -> Option<Self> {
        self.0.with_minute(minute).map(Self)
    }

    pub fn with_second(&self, second: u32) -> Option<Self> {
        self.0.with_second(second).map(Self)
    }

    /// Date part as `YYYY-MM-DD`.
    pub fn date_text(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    /// Time part as `HH:MM:SS`.
    pub fn time_text(&self) -> String {
        self.0.format("%H:%M:%S").to_string()
    }

    /// Parse a `YYYY-MM-DD` text and apply it to this value.
    ///
    /// Returns None if the text doesn't match the pattern or
    /// is not a valid calendar date. The time of day is kept.
    pub fn parse_date_text(&self, text: &str) -> Option<Self> {
        if !DATE_PATTERN.is_match(text) {
            return None;
        }
        let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
        Some(self.with_date(date))
    }

    /// Parse a `HH:MM:SS` text and apply it to this value.
    ///
    /// The hour may have a single digit. Returns None if the
    /// text doesn't match. The date is kept, sub-seconds are
    /// dropped.
    pub fn parse_time_text(&self, text: &str) -> Option<Self> {
        if !TIME_PATTERN.is_match(text) {
            return None;
        }
        let mut it = text.split(':').map(|v| v.parse::<u32>());
        let (Some(Ok(h)), Some(Ok(m)), Some(Ok(s))) = (it.next(), it.next(), it.next()) else {
            return None;
        };
        let time = NaiveTime::from_hms_opt(h, m, s)?;
        Some(self.with_time(time))
    }
}

impl Display for Temporal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.date_text(), self.time_text())
    }
}

impl From<NaiveDateTime> for Temporal {
    fn from(value: NaiveDateTime) -> Self {
        Self(value)
    }
}

/// Shared cell for a [Temporal].
///
/// Clones share the same value. The owner is the form that
/// hosts the pickers, the pickers only get a clone.
#[derive(Debug, Default, Clone)]
pub struct SharedTemporal(Rc<RefCell<Temporal>>);

impl SharedTemporal {
    pub fn new(value: Temporal) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    /// Current value.
    pub fn get(&self) -> Temporal {
        *self.0.borrow()
    }

    /// Replace the value. Returns true if it changed.
    pub fn set(&self, value: Temporal) -> bool {
        let mut v = self.0.borrow_mut();
        let old = *v;
        *v = value;
        old != value
    }

    /// Change some fields of the value. Returns true if it changed.
    pub fn update(&self, f: impl FnOnce(Temporal) -> Temporal) -> bool {
        let old = self.get();
        self.set(f(old))
    }

    /// Change some fields of the value, if the change is valid.
    /// Returns true if it changed.
    pub fn try_update(&self, f: impl FnOnce(Temporal) -> Option<Temporal>) -> bool {
        match f(self.get()) {
            Some(v) => self.set(v),
            None => false,
        }
    }

    /// Both handles share the same value.
    pub fn ptr_eq(&self, other: &SharedTemporal) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

pub(crate) mod event {
    use rat_event::{ConsumedEvent, Outcome};

    /// Result of event-handling for the pickers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    pub enum PickerOutcome {
        /// The given event was not handled at all.
        Continue,
        /// The event was handled, no repaint necessary.
        Unchanged,
        /// The event was handled, repaint necessary.
        Changed,
        /// The shared value has changed.
        Value,
    }

    impl ConsumedEvent for PickerOutcome {
        fn is_consumed(&self) -> bool {
            *self != PickerOutcome::Continue
        }
    }

    impl From<bool> for PickerOutcome {
        fn from(value: bool) -> Self {
            if value {
                PickerOutcome::Changed
            } else {
                PickerOutcome::Unchanged
            }
        }
    }

    impl From<Outcome> for PickerOutcome {
        fn from(value: Outcome) -> Self {
            match value {
                Outcome::Continue => PickerOutcome::Continue,
                Outcome::Unchanged => PickerOutcome::Unchanged,
                Outcome::Changed => PickerOutcome::Changed,
            }
        }
    }

    impl From<PickerOutcome> for Outcome {
        fn from(value: PickerOutcome) -> Self {
            match value {
                PickerOutcome::Continue => Outcome::Continue,
                PickerOutcome::Unchanged => Outcome::Unchanged,
                PickerOutcome::Changed => Outcome::Changed,
                PickerOutcome::Value => Outcome::Changed,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(y: i32, m: u32, d: u32) -> Temporal {
        Temporal::from_ymd_hms(y, m, d, 8, 30, 15).expect("valid")
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn test_add_months() {
        assert_eq!(t(2024, 1, 31).add_months(1), t(2024, 2, 29));
        assert_eq!(t(2024, 1, 15).add_months(-1), t(2023, 12, 15));
        assert_eq!(t(2024, 12, 31).add_months(1), t(2025, 1, 31));
        assert_eq!(t(2024, 3, 31).add_months(-13), t(2023, 2, 28));
        assert_eq!(t(2024, 5, 5).add_months(0), t(2024, 5, 5));
    }

    #[test]
    fn test_add_days() {
        assert_eq!(t(2024, 2, 28).add_days(1), t(2024, 2, 29));
        assert_eq!(t(2024, 3, 1).add_days(-1), t(2024, 2, 29));
        assert_eq!(t(2024, 12, 28).add_days(7), t(2025, 1, 4));
    }

    #[test]
    fn test_with_fields() {
        assert_eq!(t(2024, 2, 29).with_year(2025), t(2025, 2, 28));
        assert_eq!(t(2024, 1, 31).with_month0(3), t(2024, 4, 30));
        assert_eq!(t(2024, 7, 10).with_month0(2), t(2024, 3, 10));
        assert_eq!(t(2024, 2, 1).with_day(29), Some(t(2024, 2, 29)));
        assert_eq!(t(2024, 2, 1).with_day(30), None);
        assert_eq!(t(2024, 2, 1).with_hour(24), None);

        let v = t(2024, 2, 1).with_minute(59).expect("minute");
        assert_eq!(v.time_text(), "08:59:15");
        assert_eq!(v.date_text(), "2024-02-01");
    }

    #[test]
    fn test_calendar_end() {
        let last = t(MAX_YEAR, 12, 31);
        assert_eq!(last.date_text(), "9999-12-31");
        assert_eq!(last.add_days(1), last);
        assert_eq!(last.add_months(1), last);
        assert_eq!(t(9995, 6, 1).add_years(10), t(9995, 6, 1));
        assert_eq!(last.with_year(10000), last);
        assert_eq!(last.add_months(i32::MAX), last);

        let first = t(MIN_YEAR, 1, 1);
        assert_eq!(first.date_text(), "0000-01-01");
        assert_eq!(first.add_days(-1), first);
        assert_eq!(first.add_years(i32::MIN), first);
        let before = NaiveDate::from_ymd_opt(-1, 12, 31).expect("date");
        assert_eq!(first.with_date(before), first);

        assert_eq!(Temporal::from_ymd_hms(10000, 1, 1, 0, 0, 0), None);
    }

    #[test]
    fn test_decade() {
        assert_eq!(decade_start(2024), 2020);
        assert_eq!(decade_start(2020), 2020);
        assert_eq!(decade(2025)[0], 2020);
        assert_eq!(decade(2025)[11], 2031);
        assert_eq!(decade(2024), decade(2025));
    }

    #[test]
    fn test_parse_date() {
        let v = t(2024, 7, 10);
        let p = v.parse_date_text("2023-02-28").expect("valid");
        assert_eq!(p.date_text(), "2023-02-28");
        assert_eq!(p.time(), v.time());

        for text in [
            "", "2023", "2023-2-28", "2023-02-30", "2023-13-01", "2023-00-10", "23-02-28",
            "2023-02-28 ", "2023/02/28", "2023-02-31",
        ] {
            assert_eq!(v.parse_date_text(text), None, "{:?}", text);
        }
    }

    #[test]
    fn test_parse_time() {
        let v = t(2024, 7, 10);
        let p = v.parse_time_text("7:05:09").expect("valid");
        assert_eq!(p.time_text(), "07:05:09");
        assert_eq!(p.date(), v.date());
        assert_eq!(v.parse_time_text("23:59:59").map(|v| v.hour()), Some(23));

        for text in ["", "24:00:00", "12:60:00", "12:00:60", "12:00", "1:2:3", "aa:bb:cc"] {
            assert_eq!(v.parse_time_text(text), None, "{:?}", text);
        }
    }

    #[test]
    fn test_shared() {
        let a = SharedTemporal::new(t(2024, 7, 10));
        let b = a.clone();
        assert!(a.ptr_eq(&b));

        assert!(b.update(|v| v.add_months(1)));
        assert_eq!(a.get(), t(2024, 8, 10));
        assert!(!a.set(t(2024, 8, 10)));
        assert!(!a.try_update(|v| v.with_day(32)));
        assert!(a.try_update(|v| v.with_day(31)));
        assert_eq!(b.get().day(), 31);
    }
}
