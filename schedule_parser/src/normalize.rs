//! Calendar and clock helpers shared by the date and time parsers.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Month number (1 = January) for an exact three letter English abbreviation.
pub fn month_from_abbreviation(word: &str) -> Option<u32> {
    MONTHS
        .iter()
        .position(|month| *month == word)
        .map(|index| index as u32 + 1)
}

pub fn month_abbreviation(month: u32) -> &'static str {
    MONTHS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("???")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    pub fn from_name(word: &str) -> Option<Day> {
        Self::ALL.into_iter().find(|day| day.name() == word)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
            Day::Sunday => "Sunday",
        }
    }

    /// Every day from `self` to `end` inclusive, walking forward from Monday.
    /// Ranges that would wrap past Sunday only yield `self`.
    pub fn through(self, end: Day) -> Vec<Day> {
        if end < self {
            return vec![self];
        }
        Self::ALL
            .into_iter()
            .filter(|day| *day >= self && *day <= end)
            .collect()
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    Am,
    Pm,
}

impl fmt::Display for Meridiem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Meridiem::Am => f.write_str("a.m."),
            Meridiem::Pm => f.write_str("p.m."),
        }
    }
}

/// A 12-hour clock reading as written on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTime {
    pub hour: u32,
    pub minutes: Option<u32>,
    pub meridiem: Meridiem,
}

impl ClockTime {
    /// `HHMM` on a 24-hour clock, e.g. 4:30 p.m. is `1630`.
    /// Twelve o'clock is never shifted, so 12 p.m. is `1200`.
    pub fn to_hhmm(&self) -> u32 {
        let mut value = self.hour * 100;
        if self.meridiem == Meridiem::Pm && self.hour != 12 {
            value += 1200;
        }
        value + self.minutes.unwrap_or_default()
    }
}

/// Months earlier than today's month belong to next year.
pub fn resolve_year(month: u32, today: NaiveDate) -> i32 {
    if month < today.month() {
        today.year() + 1
    } else {
        today.year()
    }
}

pub fn resolve_date(month: u32, day: u32, today: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(resolve_year(month, today), month, day)
}

/// Inclusive. Empty when `end` is before `start`.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|date| *date <= end)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[rstest]
    #[case(12, date(2021, 12, 20), 2021)]
    #[case(1, date(2021, 12, 20), 2022)]
    #[case(11, date(2021, 12, 20), 2022)]
    #[case(6, date(2022, 6, 1), 2022)]
    #[case(7, date(2022, 6, 1), 2022)]
    #[case(5, date(2022, 6, 1), 2023)]
    fn test_resolve_year(#[case] month: u32, #[case] today: NaiveDate, #[case] expected: i32) {
        assert_eq!(resolve_year(month, today), expected);
    }

    #[test]
    fn test_resolve_date_rejects_days_outside_the_month() {
        let today = date(2022, 1, 10);
        assert_eq!(resolve_date(2, 28, today), Some(date(2022, 2, 28)));
        assert_eq!(resolve_date(2, 30, today), None);
        assert_eq!(resolve_date(4, 0, today), None);
    }

    #[rstest]
    #[case(8, None, Meridiem::Am, 800)]
    #[case(4, None, Meridiem::Pm, 1600)]
    #[case(4, Some(30), Meridiem::Pm, 1630)]
    #[case(9, Some(5), Meridiem::Am, 905)]
    #[case(12, None, Meridiem::Pm, 1200)]
    #[case(12, Some(30), Meridiem::Pm, 1230)]
    #[case(12, None, Meridiem::Am, 1200)]
    fn test_clock_time_to_hhmm(
        #[case] hour: u32,
        #[case] minutes: Option<u32>,
        #[case] meridiem: Meridiem,
        #[case] expected: u32,
    ) {
        let time = ClockTime {
            hour,
            minutes,
            meridiem,
        };
        assert_eq!(time.to_hhmm(), expected);
    }

    #[test]
    fn test_day_ranges_walk_forward_only() {
        assert_eq!(
            Day::Monday.through(Day::Wednesday),
            vec![Day::Monday, Day::Tuesday, Day::Wednesday]
        );
        assert_eq!(Day::Sunday.through(Day::Sunday), vec![Day::Sunday]);
        assert_eq!(Day::Friday.through(Day::Monday), vec![Day::Friday]);
    }

    #[test]
    fn test_days_between_crosses_the_year() {
        let days = days_between(date(2021, 12, 30), date(2022, 1, 2));
        assert_eq!(
            days,
            vec![
                date(2021, 12, 30),
                date(2021, 12, 31),
                date(2022, 1, 1),
                date(2022, 1, 2)
            ]
        );
        assert!(days_between(date(2021, 12, 30), date(2021, 12, 27)).is_empty());
    }

    #[test]
    fn test_lookups_are_exact() {
        assert_eq!(month_from_abbreviation("Dec"), Some(12));
        assert_eq!(month_from_abbreviation("December"), None);
        assert_eq!(month_from_abbreviation("dec"), None);
        assert_eq!(month_abbreviation(1), "Jan");
        assert_eq!(Day::from_name("Wednesday"), Some(Day::Wednesday));
        assert_eq!(Day::from_name("Wedenesday"), None);
    }
}
