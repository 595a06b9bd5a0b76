//! Canonical `YYYY-MM-DD` dates and date ordering for reading histories.
//!
//! A [`CalendarDate`] is a plain (year, month, day) at local midnight. No
//! time zone conversion happens anywhere in this module: the components in
//! the string are taken at face value.

use std::cmp::Ordering;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

// ------------------------------------------------------------------ //
//  Types                                                              //
// ------------------------------------------------------------------ //

/// Why a string is not a valid canonical date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("date must be written as YYYY-MM-DD")]
    Format,
    #[error("month {0} is outside 1-12")]
    MonthOutOfRange(u32),
    #[error("day {day} does not exist in {year:04}-{month:02}")]
    DayOutOfRange { year: i32, month: u32, day: u32 },
}

/// A validated calendar date at local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// One-based month.
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// The date at 00:00:00.
    pub fn midnight(&self) -> NaiveDateTime {
        self.0.and_time(chrono::NaiveTime::MIN)
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl std::fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl std::str::FromStr for CalendarDate {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_canonical_date(s)
    }
}

impl Serialize for CalendarDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_canonical_date(&s).map_err(serde::de::Error::custom)
    }
}

// ------------------------------------------------------------------ //
//  Parsing                                                            //
// ------------------------------------------------------------------ //

pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Number of days in `month` (1-based) of `year`, or 0 for a month outside 1-12.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Parse a canonical `YYYY-MM-DD` string.
///
/// Anything other than exactly four ASCII digits, a hyphen, two digits, a
/// hyphen and two digits is a [`DateError::Format`]; a well-formed string
/// naming a day that does not exist is a range error.
pub fn parse_canonical_date(input: &str) -> Result<CalendarDate, DateError> {
    static CANONICAL: OnceLock<Regex> = OnceLock::new();
    let re = CANONICAL.get_or_init(|| {
        Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})$").expect("static date pattern")
    });

    let caps = re.captures(input).ok_or(DateError::Format)?;
    let field = |i: usize| caps.get(i).map(|m| m.as_str()).ok_or(DateError::Format);

    let year: i32 = field(1)?.parse().map_err(|_| DateError::Format)?;
    let month: u32 = field(2)?.parse().map_err(|_| DateError::Format)?;
    let day: u32 = field(3)?.parse().map_err(|_| DateError::Format)?;

    if !(1..=12).contains(&month) {
        return Err(DateError::MonthOutOfRange(month));
    }
    if day < 1 || day > days_in_month(year, month) {
        return Err(DateError::DayOutOfRange { year, month, day });
    }

    NaiveDate::from_ymd_opt(year, month, day)
        .map(CalendarDate)
        .ok_or(DateError::DayOutOfRange { year, month, day })
}

// ------------------------------------------------------------------ //
//  Ordering                                                           //
// ------------------------------------------------------------------ //

/// Anything that carries a date as text, possibly malformed.
pub trait Dated {
    fn date_text(&self) -> &str;
}

impl Dated for String {
    fn date_text(&self) -> &str {
        self
    }
}

impl Dated for &str {
    fn date_text(&self) -> &str {
        self
    }
}

/// Ascending date order. Entries whose date does not parse come first and
/// compare equal to each other.
pub fn compare_by_date<T: Dated + ?Sized>(a: &T, b: &T) -> Ordering {
    match (
        parse_canonical_date(a.date_text()),
        parse_canonical_date(b.date_text()),
    ) {
        (Err(_), Err(_)) => Ordering::Equal,
        (Err(_), Ok(_)) => Ordering::Less,
        (Ok(_), Err(_)) => Ordering::Greater,
        (Ok(x), Ok(y)) => x.cmp(&y),
    }
}

/// Stable ascending sort into a new vector; `entries` is left untouched.
pub fn sort_by_date<T: Dated + Clone>(entries: &[T]) -> Vec<T> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(compare_by_date);
    sorted
}

/// Newest first, unparseable dates last. Ties keep their input order.
pub fn sort_by_date_desc<T: Dated + Clone>(entries: &[T]) -> Vec<T> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| compare_by_date(b, a));
    sorted
}

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Entry {
        date: String,
        tag: u32,
    }

    impl Dated for Entry {
        fn date_text(&self) -> &str {
            &self.date
        }
    }

    fn entry(date: &str, tag: u32) -> Entry {
        Entry { date: date.into(), tag }
    }

    fn dates(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.date.as_str()).collect()
    }

    #[test]
    fn parses_canonical_date_at_midnight() {
        let d = parse_canonical_date("2025-06-03").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2025, 6, 3));
        assert_eq!(d.midnight().to_string(), "2025-06-03 00:00:00");
        assert_eq!(d.to_string(), "2025-06-03");
    }

    #[test]
    fn rejects_non_canonical_shapes() {
        for bad in [
            "",
            "2025-6-03",
            "2025-06-3",
            "25-06-03",
            "2025/06/03",
            " 2025-06-03",
            "2025-06-03 ",
            "2025-06-03T00:00",
            "invalid-date",
            "२०२५-०६-०३",
            "2025-0a-03",
            "+2025-06-03",
        ] {
            assert_eq!(parse_canonical_date(bad), Err(DateError::Format), "{bad:?}");
        }
    }

    #[test]
    fn rejects_dates_that_do_not_exist() {
        assert_eq!(
            parse_canonical_date("2025-13-01"),
            Err(DateError::MonthOutOfRange(13))
        );
        assert!(matches!(
            parse_canonical_date("2025-02-30"),
            Err(DateError::DayOutOfRange { day: 30, .. })
        ));
        assert!(parse_canonical_date("0000-00-00").is_err());
        assert!(parse_canonical_date("2025-04-31").is_err());
        assert!(parse_canonical_date("2025-01-00").is_err());
    }

    #[test]
    fn leap_years_follow_gregorian_rules() {
        assert!(parse_canonical_date("2024-02-29").is_ok());
        assert!(parse_canonical_date("2000-02-29").is_ok());
        assert!(parse_canonical_date("1900-02-29").is_err());
        assert!(parse_canonical_date("2023-02-29").is_err());
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2100, 2), 28);
        assert_eq!(days_in_month(2025, 0), 0);
    }

    #[test]
    fn very_long_input_is_just_invalid() {
        let long = "9".repeat(100_000);
        assert_eq!(parse_canonical_date(&long), Err(DateError::Format));
    }

    #[test]
    fn serde_uses_canonical_text() {
        let d = parse_canonical_date("2024-11-09").unwrap();
        assert_eq!(serde_json::to_string(&d).unwrap(), "\"2024-11-09\"");
        let back: CalendarDate = serde_json::from_str("\"2024-11-09\"").unwrap();
        assert_eq!(back, d);
        assert!(serde_json::from_str::<CalendarDate>("\"2024-11-31\"").is_err());
    }

    #[test]
    fn sorts_example_history_with_invalid_first() {
        let input = vec![
            entry("2025-06-01", 0),
            entry("2025-05-30", 1),
            entry("2025-06-03", 2),
            entry("2025-06-02", 3),
            entry("invalid-date", 4),
        ];
        let sorted = sort_by_date(&input);
        assert_eq!(
            dates(&sorted),
            vec!["invalid-date", "2025-05-30", "2025-06-01", "2025-06-02", "2025-06-03"]
        );
    }

    #[test]
    fn sort_does_not_mutate_and_is_a_permutation() {
        let input = vec![
            entry("2025-06-02", 0),
            entry("nope", 1),
            entry("2025-01-01", 2),
            entry("2025-06-02", 3),
        ];
        let snapshot = input.clone();
        let sorted = sort_by_date(&input);

        assert_eq!(input, snapshot);
        assert_eq!(sorted.len(), input.len());
        for e in &input {
            assert_eq!(
                sorted.iter().filter(|s| *s == e).count(),
                input.iter().filter(|s| *s == e).count()
            );
        }
    }

    #[test]
    fn sort_is_idempotent() {
        let input = vec![
            entry("2025-03-01", 0),
            entry("bad", 1),
            entry("2024-12-31", 2),
            entry("also bad", 3),
        ];
        let once = sort_by_date(&input);
        let twice = sort_by_date(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn equal_dates_and_invalid_entries_keep_input_order() {
        let input = vec![
            entry("2025-06-01", 0),
            entry("x", 1),
            entry("2025-06-01", 2),
            entry("y", 3),
        ];
        let tags: Vec<u32> = sort_by_date(&input).iter().map(|e| e.tag).collect();
        assert_eq!(tags, vec![1, 3, 0, 2]);
    }

    #[test]
    fn descending_sort_puts_invalid_last() {
        let input = vec![
            entry("bad", 0),
            entry("2025-05-30", 1),
            entry("2025-06-03", 2),
        ];
        assert_eq!(
            dates(&sort_by_date_desc(&input)),
            vec!["2025-06-03", "2025-05-30", "bad"]
        );
    }

    #[test]
    fn descending_sort_keeps_tied_entries_in_input_order() {
        let input = vec![
            entry("x", 0),
            entry("2025-06-01", 1),
            entry("y", 2),
            entry("2025-06-01", 3),
            entry("2025-06-02", 4),
        ];
        let tags: Vec<u32> = sort_by_date_desc(&input).iter().map(|e| e.tag).collect();
        assert_eq!(tags, vec![4, 1, 3, 0, 2]);
    }

    #[test]
    fn comparator_handles_plain_strings() {
        assert_eq!(compare_by_date(&"x", &"y"), Ordering::Equal);
        assert_eq!(compare_by_date(&"x", &"2025-01-01"), Ordering::Less);
        assert_eq!(compare_by_date(&"2025-01-02", &"2025-01-01"), Ordering::Greater);
    }
}
