use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::normalize::Day;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParseErrorKind {
    CouldNotParseDate,
    HoursAlreadyExist,
    CouldNotParse,
    NoText,
    NameMissingLink,
    ParseLinkFailed,
    UnrecognisedElement,
    AgeInfoMissing,
    BadGeocode,
    NoOffers,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ParseErrorKind::CouldNotParseDate => "could-not-parse-date",
            ParseErrorKind::HoursAlreadyExist => "hours-already-exist",
            ParseErrorKind::CouldNotParse => "could-not-parse",
            ParseErrorKind::NoText => "no-text",
            ParseErrorKind::NameMissingLink => "name-missing-link",
            ParseErrorKind::ParseLinkFailed => "parse-link-failed",
            ParseErrorKind::UnrecognisedElement => "unrecognised-element",
            ParseErrorKind::AgeInfoMissing => "age-info-missing",
            ParseErrorKind::BadGeocode => "bad-geocode",
            ParseErrorKind::NoOffers => "no-offers",
        };
        f.write_str(tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    #[serde(rename = "type")]
    pub kind: ParseErrorKind,
    pub value: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Opening and closing time in `HHMM`, serialized as `[open, close]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHours(pub u32, pub u32);

impl OpeningHours {
    pub fn open(&self) -> u32 {
        self.0
    }

    pub fn close(&self) -> u32 {
        self.1
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub open: Vec<NaiveDate>,
    pub hours: BTreeMap<Day, OpeningHours>,
    pub date_specific_hours: BTreeMap<NaiveDate, OpeningHours>,
    pub errors: Vec<ParseError>,
}

/// Everything a committed parse wants written to a [`ScheduleRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleUpdate {
    OpenDates(Vec<NaiveDate>),
    WeeklyHours { days: Vec<Day>, hours: OpeningHours },
    /// A recognised "closed" declaration; nothing is written.
    ClosedDays(Vec<Day>),
    Many(Vec<ScheduleUpdate>),
}

impl ScheduleRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_error(&mut self, kind: ParseErrorKind, value: impl Into<String>) {
        self.errors.push(ParseError::new(kind, value));
    }

    /// The first hours written for a day win; later writes become `hours-already-exist` errors.
    pub fn apply(&mut self, update: ScheduleUpdate) {
        match update {
            ScheduleUpdate::OpenDates(dates) => self.open.extend(dates),
            ScheduleUpdate::WeeklyHours { days, hours } => {
                for day in days {
                    if self.hours.contains_key(&day) {
                        self.push_error(
                            ParseErrorKind::HoursAlreadyExist,
                            format!("Hours already exist for {day}"),
                        );
                        continue;
                    }
                    self.hours.insert(day, hours);
                }
            }
            ScheduleUpdate::ClosedDays(_) => {}
            ScheduleUpdate::Many(updates) => {
                for update in updates {
                    self.apply(update);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, month, day).unwrap()
    }

    #[test]
    fn test_duplicate_hours_keep_the_first_value() {
        let mut record = ScheduleRecord::new();
        record.apply(ScheduleUpdate::WeeklyHours {
            days: vec![Day::Monday, Day::Tuesday],
            hours: OpeningHours(800, 1600),
        });
        record.apply(ScheduleUpdate::WeeklyHours {
            days: vec![Day::Tuesday],
            hours: OpeningHours(900, 1700),
        });

        assert_eq!(record.hours[&Day::Tuesday], OpeningHours(800, 1600));
        assert_eq!(
            record.errors,
            vec![ParseError::new(
                ParseErrorKind::HoursAlreadyExist,
                "Hours already exist for Tuesday"
            )]
        );
    }

    #[test]
    fn test_open_dates_keep_duplicates_in_order() {
        let mut record = ScheduleRecord::new();
        record.apply(ScheduleUpdate::Many(vec![
            ScheduleUpdate::OpenDates(vec![date(12, 24), date(12, 25)]),
            ScheduleUpdate::ClosedDays(vec![Day::Sunday]),
            ScheduleUpdate::OpenDates(vec![date(12, 24)]),
        ]));

        assert_eq!(record.open, vec![date(12, 24), date(12, 25), date(12, 24)]);
        assert!(record.hours.is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let mut record = ScheduleRecord::new();
        record.apply(ScheduleUpdate::WeeklyHours {
            days: vec![Day::Friday],
            hours: OpeningHours(800, 1630),
        });
        record.apply(ScheduleUpdate::OpenDates(vec![date(1, 2)]));
        record
            .date_specific_hours
            .insert(date(12, 24), OpeningHours(800, 1300));
        record.push_error(ParseErrorKind::CouldNotParseDate, "TBD");

        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "open": ["2021-01-02"],
                "hours": { "friday": [800, 1630] },
                "date_specific_hours": { "2021-12-24": [800, 1300] },
                "errors": [{ "type": "could-not-parse-date", "value": "TBD" }]
            })
        );
    }
}
