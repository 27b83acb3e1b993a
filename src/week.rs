// week.rs - ISO-8601 week identifiers ("2025-W03")
//
// Weekly reports, aggregates and the Telegram digest are all bucketed by ISO week.
// A week belongs to the ISO year of its Thursday, so the last days of December can
// fall into week 1 of the following year and the first days of January into week
// 52/53 of the previous one.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeekError {
    #[error("Invalid ISO week format: {0} (expected YYYY-Www)")]
    InvalidFormat(String),

    #[error("Week {week} does not exist in ISO year {year}")]
    OutOfRange { year: i32, week: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsoWeek {
    year: i32,
    week: u32,
}

impl IsoWeek {
    /// Build a week from its parts, validating the week number for that year.
    pub fn new(year: i32, week: u32) -> Result<Self, WeekError> {
        if week == 0 || week > weeks_in_year(year) {
            return Err(WeekError::OutOfRange { year, week });
        }
        Ok(Self { year, week })
    }

    /// The ISO week containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    /// The ISO week containing today's UTC date.
    pub fn current() -> Self {
        Self::of(Utc::now().date_naive())
    }

    pub fn parse(s: &str) -> Result<Self, WeekError> {
        let bytes = s.as_bytes();
        let well_formed = bytes.len() == 8
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && bytes[4] == b'-'
            && bytes[5] == b'W'
            && bytes[6..].iter().all(u8::is_ascii_digit);

        if !well_formed {
            return Err(WeekError::InvalidFormat(s.to_string()));
        }

        let year: i32 = s[..4]
            .parse()
            .map_err(|_| WeekError::InvalidFormat(s.to_string()))?;
        let week: u32 = s[6..]
            .parse()
            .map_err(|_| WeekError::InvalidFormat(s.to_string()))?;

        Self::new(year, week)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    /// Monday of this week.
    pub fn start(&self) -> NaiveDate {
        // year/week are validated on construction
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon).unwrap_or(NaiveDate::MIN)
    }

    /// Sunday of this week.
    pub fn end(&self) -> NaiveDate {
        self.start() + Duration::days(6)
    }

    pub fn range(&self) -> (NaiveDate, NaiveDate) {
        (self.start(), self.end())
    }

    pub fn previous(&self) -> Self {
        Self::of(self.start() - Duration::weeks(1))
    }

    pub fn next(&self) -> Self {
        Self::of(self.start() + Duration::weeks(1))
    }

    /// This week followed by the `count - 1` weeks before it, newest first.
    pub fn trailing(&self, count: usize) -> Vec<IsoWeek> {
        let mut weeks = Vec::with_capacity(count);
        let mut cursor = *self;
        for _ in 0..count {
            weeks.push(cursor);
            cursor = cursor.previous();
        }
        weeks
    }

    pub fn is_current(&self) -> bool {
        *self == Self::current()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::of(date) == *self
    }

    /// Human label, e.g. "Week 3, 2025 (13-19 Jan)".
    pub fn display_label(&self) -> String {
        let (start, end) = self.range();
        let start_month = MONTHS[start.month0() as usize];
        let end_month = MONTHS[end.month0() as usize];

        let range = if start.month() == end.month() {
            format!("{}-{} {}", start.day(), end.day(), start_month)
        } else {
            format!("{} {} - {} {}", start.day(), start_month, end.day(), end_month)
        };

        format!("Week {}, {} ({})", self.week, self.year, range)
    }
}

/// 52 or 53: a year has week 53 exactly when Dec 28th falls in it.
pub fn weeks_in_year(year: i32) -> u32 {
    NaiveDate::from_ymd_opt(year, 12, 28)
        .map(|d| d.iso_week().week())
        .unwrap_or(52)
}

impl fmt::Display for IsoWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-W{:02}", self.year, self.week)
    }
}

impl FromStr for IsoWeek {
    type Err = WeekError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for IsoWeek {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IsoWeek {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        IsoWeek::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn formats_with_zero_padding() {
        let w = IsoWeek::of(date(2025, 1, 15));
        assert_eq!(w.to_string(), "2025-W03");
    }

    #[test]
    fn late_december_belongs_to_next_iso_year() {
        assert_eq!(IsoWeek::of(date(2024, 12, 30)).to_string(), "2025-W01");
        assert_eq!(IsoWeek::of(date(2021, 1, 3)).to_string(), "2020-W53");
    }

    #[test]
    fn week_range_is_monday_to_sunday() {
        let w: IsoWeek = "2025-W03".parse().unwrap();
        assert_eq!(w.start(), date(2025, 1, 13));
        assert_eq!(w.end(), date(2025, 1, 19));
        assert_eq!(w.start().weekday(), Weekday::Mon);
    }

    #[test]
    fn every_day_of_a_week_maps_back_to_it() {
        let w: IsoWeek = "2026-W01".parse().unwrap();
        let mut day = w.start();
        while day <= w.end() {
            assert_eq!(IsoWeek::of(day), w, "day {day}");
            day += Duration::days(1);
        }
    }

    #[test]
    fn navigation_crosses_year_boundaries() {
        let w: IsoWeek = "2025-W01".parse().unwrap();
        assert_eq!(w.previous().to_string(), "2024-W52");
        assert_eq!(w.previous().next(), w);

        let w53: IsoWeek = "2020-W53".parse().unwrap();
        assert_eq!(w53.next().to_string(), "2021-W01");
    }

    #[test]
    fn trailing_lists_newest_first() {
        let w: IsoWeek = "2025-W02".parse().unwrap();
        let weeks: Vec<String> = w.trailing(4).iter().map(ToString::to_string).collect();
        assert_eq!(weeks, vec!["2025-W02", "2025-W01", "2024-W52", "2024-W51"]);
    }

    #[test]
    fn rejects_malformed_ids() {
        for bad in ["2025-3", "2025-W3", "25-W03", "2025W03", "2025-w03", "abcd-W01", ""] {
            assert!(
                matches!(IsoWeek::parse(bad), Err(WeekError::InvalidFormat(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_weeks_missing_from_the_year() {
        assert!(matches!(IsoWeek::parse("2025-W00"), Err(WeekError::OutOfRange { .. })));
        assert!(matches!(IsoWeek::parse("2025-W53"), Err(WeekError::OutOfRange { .. })));
        assert!(IsoWeek::parse("2020-W53").is_ok());
        assert_eq!(weeks_in_year(2020), 53);
        assert_eq!(weeks_in_year(2025), 52);
    }

    #[test]
    fn display_label_handles_month_spans() {
        let w: IsoWeek = "2025-W03".parse().unwrap();
        assert_eq!(w.display_label(), "Week 3, 2025 (13-19 Jan)");

        let w: IsoWeek = "2025-W01".parse().unwrap();
        assert_eq!(w.display_label(), "Week 1, 2025 (30 Dec - 5 Jan)");
    }

    #[test]
    fn serde_uses_the_textual_form() {
        let w: IsoWeek = "2025-W10".parse().unwrap();
        let json = serde_json::to_string(&w).unwrap();
        assert_eq!(json, "\"2025-W10\"");
        let back: IsoWeek = serde_json::from_str(&json).unwrap();
        assert_eq!(back, w);
        assert!(serde_json::from_str::<IsoWeek>("\"2025-W99\"").is_err());
    }
}
