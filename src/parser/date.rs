use std::fmt;
use std::sync::LazyLock;

use chrono::{Days, NaiveDate};
use regex::{Captures, Regex};

use crate::error::{DateError, DateField};

/// Year used when the text names a day and month but no year.
pub const NO_YEAR: i32 = 1000;

/// Sort key for rows without a usable date (`Number.MIN_SAFE_INTEGER`).
pub const MISSING_SORT_KEY: i64 = -9_007_199_254_740_991;

const MONTH_NAMES: [&str; 12] = [
    "january", "february", "march", "april", "may", "june",
    "july", "august", "september", "october", "november", "december",
];

static ISO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})$").unwrap());
static DMY_NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{2})-([0-9]{2})-([0-9]{4})$").unwrap());
static DAY_MONTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{1,2}),? ([A-Za-z]+)(?:,? ([0-9]{4}))?$").unwrap()
});
static MONTH_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]+),? ([0-9]{1,2})(?:,? ([0-9]{4}))?$").unwrap()
});
static YEAR_MONTH_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{4}),? ([A-Za-z]+),? ([0-9]{1,2})$").unwrap()
});
// https://rainverse.wiki/wiki/Momokomo?oldid=21531
static RELEASED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Released in ([0-9]{4})$").unwrap());

/// A Gregorian date with validated ranges.
///
/// Day is only checked against 1..=31, not against the month length, so
/// values like February 30 exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate {
    year: i32,
    month: u32,
    day: u32,
}

impl CalendarDate {
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self, DateError> {
        if year < 1000 {
            return Err(DateError::Range { field: DateField::Year, value: year.into() });
        }
        if !(1..=12).contains(&month) {
            return Err(DateError::Range { field: DateField::Month, value: month.into() });
        }
        if !(1..=31).contains(&day) {
            return Err(DateError::Range { field: DateField::Day, value: day.into() });
        }
        Ok(CalendarDate { year, month, day })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Milliseconds since the Unix epoch at UTC midnight. Days past the end
    /// of the month roll over into the next one.
    pub fn sort_key(&self) -> i64 {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .and_then(|first| first.checked_add_days(Days::new(u64::from(self.day - 1))))
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().timestamp_millis())
            .unwrap_or(MISSING_SORT_KEY)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Parse a free-text date. Shapes are tried in a fixed order and the first
/// match wins:
///
/// 1. `YYYY-MM-DD`
/// 2. `DD-MM-YYYY`
/// 3. `D[,] Month[[,] YYYY]`
/// 4. `Month D[[,] YYYY]`
/// 5. `YYYY[,] Month[,] D`
/// 6. `Released in YYYY` (January 1)
pub fn parse_date(text: &str) -> Result<CalendarDate, DateError> {
    let (year, month, day) = if let Some(caps) = ISO_RE.captures(text) {
        (number(&caps, 1), number(&caps, 2), number(&caps, 3))
    } else if let Some(caps) = DMY_NUMERIC_RE.captures(text) {
        (number(&caps, 3), number(&caps, 2), number(&caps, 1))
    } else if let Some(caps) = DAY_MONTH_RE.captures(text) {
        (optional_year(&caps, 3), month_number(&caps[2]), number(&caps, 1))
    } else if let Some(caps) = MONTH_DAY_RE.captures(text) {
        (optional_year(&caps, 3), month_number(&caps[1]), number(&caps, 2))
    } else if let Some(caps) = YEAR_MONTH_DAY_RE.captures(text) {
        (number(&caps, 1), month_number(&caps[2]), number(&caps, 3))
    } else if let Some(caps) = RELEASED_RE.captures(text) {
        (number(&caps, 1), 1, 1)
    } else {
        return Err(DateError::Format { text: text.to_string() });
    };

    CalendarDate::new(year as i32, month as u32, day as u32)
}

// Groups are at most four ASCII digits, so the parse cannot fail.
fn number(caps: &Captures, group: usize) -> i64 {
    caps[group].parse().unwrap_or(0)
}

fn optional_year(caps: &Captures, group: usize) -> i64 {
    caps.get(group)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(i64::from(NO_YEAR))
}

/// 1-based month index, or 0 for an unknown name.
fn month_number(name: &str) -> i64 {
    let lower = name.to_ascii_lowercase();
    MONTH_NAMES
        .iter()
        .position(|m| *m == lower)
        .map_or(0, |i| i as i64 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(text: &str) -> (i32, u32, u32) {
        let d = parse_date(text).unwrap();
        (d.year(), d.month(), d.day())
    }

    #[test]
    fn every_shape() {
        assert_eq!(ymd("2021-03-05"), (2021, 3, 5));
        assert_eq!(ymd("05-03-2021"), (2021, 3, 5));
        assert_eq!(ymd("5 March, 2021"), (2021, 3, 5));
        assert_eq!(ymd("March 5, 2021"), (2021, 3, 5));
        assert_eq!(ymd("2021, March, 5"), (2021, 3, 5));
        assert_eq!(ymd("Released in 1999"), (1999, 1, 1));
    }

    #[test]
    fn optional_commas() {
        assert_eq!(ymd("5, March 2021"), (2021, 3, 5));
        assert_eq!(ymd("March, 5 2021"), (2021, 3, 5));
        assert_eq!(ymd("2021 March 5"), (2021, 3, 5));
    }

    #[test]
    fn missing_year_uses_placeholder() {
        assert_eq!(ymd("5 March"), (1000, 3, 5));
        assert_eq!(ymd("July 14"), (1000, 7, 14));
    }

    #[test]
    fn month_names_ignore_case() {
        assert_eq!(ymd("12 DECEMBER 1998"), (1998, 12, 12));
        assert_eq!(ymd("august 1"), (1000, 8, 1));
    }

    #[test]
    fn month_out_of_range() {
        assert_eq!(
            parse_date("2021-13-05"),
            Err(DateError::Range { field: DateField::Month, value: 13 })
        );
    }

    #[test]
    fn unknown_month_name_is_a_range_error() {
        assert_eq!(
            parse_date("5 Marchember 2021"),
            Err(DateError::Range { field: DateField::Month, value: 0 })
        );
        // Abbreviations are not month names.
        assert!(matches!(
            parse_date("Mar 5, 2021"),
            Err(DateError::Range { field: DateField::Month, .. })
        ));
    }

    #[test]
    fn low_year_rejected() {
        assert_eq!(
            parse_date("0999-01-01"),
            Err(DateError::Range { field: DateField::Year, value: 999 })
        );
    }

    #[test]
    fn day_out_of_range() {
        assert_eq!(
            parse_date("32 May 2000"),
            Err(DateError::Range { field: DateField::Day, value: 32 })
        );
        assert_eq!(
            parse_date("2000-05-00"),
            Err(DateError::Range { field: DateField::Day, value: 0 })
        );
    }

    #[test]
    fn unrecognized_text() {
        assert_eq!(
            parse_date("not a date"),
            Err(DateError::Format { text: "not a date".into() })
        );
        assert!(matches!(parse_date("released in 1999"), Err(DateError::Format { .. })));
        assert!(matches!(parse_date(" 2021-03-05"), Err(DateError::Format { .. })));
        assert!(matches!(parse_date("2021-3-5"), Err(DateError::Format { .. })));
    }

    #[test]
    fn day_is_not_checked_against_month_length() {
        assert_eq!(ymd("30 February 2020"), (2020, 2, 30));
    }

    #[test]
    fn display_parses_back() {
        for text in ["5 March", "Released in 1999", "December 31, 2010", "30 February 2020"] {
            let date = parse_date(text).unwrap();
            assert_eq!(parse_date(&date.to_string()), Ok(date));
        }
    }

    #[test]
    fn orders_by_year_month_day() {
        let a = CalendarDate::new(2020, 12, 31).unwrap();
        let b = CalendarDate::new(2021, 1, 1).unwrap();
        let c = CalendarDate::new(2021, 1, 2).unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn sort_key_is_epoch_millis() {
        assert_eq!(CalendarDate::new(1970, 1, 2).unwrap().sort_key(), 86_400_000);
        assert_eq!(
            CalendarDate::new(2020, 2, 30).unwrap().sort_key(),
            CalendarDate::new(2020, 3, 1).unwrap().sort_key()
        );
        assert!(CalendarDate::new(1000, 1, 1).unwrap().sort_key() > MISSING_SORT_KEY);
    }
}
