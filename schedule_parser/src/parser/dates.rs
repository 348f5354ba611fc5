use chrono::NaiveDate;
use itertools::Itertools;
use lazy_static::lazy_static;
use multipeek::{multipeek, MultiPeek};
use regex::Regex;
use std::fmt;
use std::ops::Range;
use std::vec::IntoIter;
use tracing::{debug, warn};

use crate::dispatch::{FatalParseError, LineParser, Outcome};
use crate::normalize::{days_between, month_abbreviation, resolve_date};
use crate::parser::{GrammarError, UnexpectedToken};
use crate::record::{ParseError, ParseErrorKind, ScheduleRecord, ScheduleUpdate};
use crate::scanner::scan_spanned;
use crate::token::Token;

lazy_static! {
    static ref DATE_LABEL: Regex = Regex::new(r"Dates: *(.+)").expect("DATE_LABEL regex to compile");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateClause {
    Single(MonthDay),
    Range { start: MonthDay, end: MonthDay },
    List { month: u32, days: Vec<u32> },
}

impl DateClause {
    fn opening_month(&self) -> u32 {
        match self {
            DateClause::Single(date) => date.month,
            DateClause::Range { start, .. } => start.month,
            DateClause::List { month, .. } => *month,
        }
    }

    /// Folds a bare day that followed this clause into a comma separated list.
    fn absorb(&mut self, next: MonthDay) -> bool {
        match self {
            DateClause::Single(date) if date.month == next.month => {
                *self = DateClause::List {
                    month: date.month,
                    days: vec![date.day, next.day],
                };
                true
            }
            DateClause::List { month, days } if *month == next.month => {
                days.push(next.day);
                true
            }
            _ => false,
        }
    }
}

impl fmt::Display for DateClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateClause::Single(date) => write!(f, "{} {}", month_abbreviation(date.month), date.day),
            DateClause::Range { start, end } if start.month == end.month => write!(
                f,
                "{} {} – {}",
                month_abbreviation(start.month),
                start.day,
                end.day
            ),
            DateClause::Range { start, end } => write!(
                f,
                "{} {} – {} {}",
                month_abbreviation(start.month),
                start.day,
                month_abbreviation(end.month),
                end.day
            ),
            DateClause::List { month, days } => {
                write!(f, "{} {}", month_abbreviation(*month), days.iter().join(", "))
            }
        }
    }
}

struct ParsedClause {
    clause: DateClause,
    explicit_month: bool,
}

/// `[Month] Day [– [Month] Day]`, a month missing at the start is inherited.
struct ClauseParser {
    tokens: MultiPeek<IntoIter<Token>>,
    inherited_month: Option<u32>,
}

impl ClauseParser {
    fn new(tokens: &[Token], inherited_month: Option<u32>) -> Self {
        Self {
            tokens: multipeek(tokens.to_vec()),
            inherited_month,
        }
    }

    fn parse(mut self) -> Result<ParsedClause, GrammarError> {
        let (month, explicit_month) = self.month()?;
        let start = MonthDay {
            month,
            day: self.day()?,
        };

        let clause = if self.tokens.peek() == Some(&Token::Dash) {
            self.tokens.next();
            let end_month = self.optional_month().unwrap_or(month);
            let end = MonthDay {
                month: end_month,
                day: self.day()?,
            };
            DateClause::Range { start, end }
        } else {
            DateClause::Single(start)
        };

        self.end_of_clause()?;

        Ok(ParsedClause {
            clause,
            explicit_month,
        })
    }

    fn month(&mut self) -> Result<(u32, bool), GrammarError> {
        if let Some(month) = self.optional_month() {
            return Ok((month, true));
        }
        match self.inherited_month {
            Some(month) => Ok((month, false)),
            None => consume_expected_token!(
                self.tokens,
                Token::Month(month) => (month, true),
                "Month"
            ),
        }
    }

    fn optional_month(&mut self) -> Option<u32> {
        match self.tokens.peek() {
            Some(&Token::Month(month)) => {
                self.tokens.next();
                Some(month)
            }
            _ => None,
        }
    }

    fn day(&mut self) -> Result<u32, GrammarError> {
        consume_expected_token!(
            self.tokens,
            Token::Number { value, digits: 1..=2 } => value,
            "Day of the month"
        )
    }

    fn end_of_clause(&mut self) -> Result<(), GrammarError> {
        match self.tokens.next() {
            None => Ok(()),
            Some(found) => Err(GrammarError::UnexpectedToken(UnexpectedToken {
                found,
                expected: "End of clause",
            })),
        }
    }
}

/// A clause together with the part of the line it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SourcedClause {
    clause: DateClause,
    source: Range<usize>,
}

/// Splits at `,` and `;`. A clause without a month takes the opening month of the
/// clause before it, and runs of bare days collapse into one list clause.
///
/// This deliberately does not split greedily at the last separator, which would
/// read the trailing `3` of `Dec 30, 31; Jan 2, 3` as Dec 3. Here it is Jan 3.
///
/// On failure the error is the untouched text of the clause that could not be read.
fn parse_clauses(text: &str) -> Result<Vec<SourcedClause>, String> {
    let spanned = scan_spanned(text);
    let mut clauses: Vec<SourcedClause> = vec![];
    let mut inherited_month = None;

    for segment in spanned.split(|(token, _)| matches!(token, Token::Comma | Token::Semicolon)) {
        let source = match (segment.first(), segment.last()) {
            (Some((_, first)), Some((_, last))) => first.start..last.end,
            _ => 0..text.len(),
        };
        let tokens: Vec<Token> = segment.iter().map(|(token, _)| token.clone()).collect();

        let ParsedClause {
            clause,
            explicit_month,
        } = ClauseParser::new(&tokens, inherited_month)
            .parse()
            .map_err(|error| {
                debug!(?error, "date clause rejected");
                text[source.clone()].trim().to_owned()
            })?;
        inherited_month = Some(clause.opening_month());

        if let (false, Some(previous), DateClause::Single(date)) =
            (explicit_month, clauses.last_mut(), &clause)
        {
            if previous.clause.absorb(*date) {
                previous.source.end = source.end;
                continue;
            }
        }
        clauses.push(SourcedClause { clause, source });
    }

    Ok(clauses)
}

/// Reads `Dates: ...` lines into calendar dates, resolving years against `today`.
#[derive(Debug, Clone, Copy)]
pub struct DateParser {
    today: NaiveDate,
}

impl DateParser {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn parse(&self, text: &str) -> Outcome<ScheduleUpdate> {
        let Some(captures) = DATE_LABEL.captures(text) else {
            return Outcome::NotApplicable;
        };

        match self.parse_dates(&captures[1]) {
            Ok(dates) => Outcome::Matched(ScheduleUpdate::OpenDates(dates)),
            Err(value) => {
                Outcome::Malformed(ParseError::new(ParseErrorKind::CouldNotParseDate, value))
            }
        }
    }

    /// Applies the dates to `record`. `false` when the line is not a date line or
    /// could not be read, the latter also leaving a `could-not-parse-date` error.
    pub fn parse_into(&self, text: &str, record: &mut ScheduleRecord) -> bool {
        match self.parse(text) {
            Outcome::Matched(update) => {
                record.apply(update);
                true
            }
            Outcome::NotApplicable => false,
            Outcome::Malformed(error) => {
                record.errors.push(error);
                false
            }
        }
    }

    fn parse_dates(&self, text: &str) -> Result<Vec<NaiveDate>, String> {
        let clauses = parse_clauses(text)?;

        let mut dates = vec![];
        for SourcedClause { clause, source } in &clauses {
            let expanded = self.expand(clause).map_err(|error| {
                debug!(?error, %clause, "date clause rejected");
                text[source.clone()].trim().to_owned()
            })?;
            dates.extend(expanded);
        }
        Ok(dates)
    }

    fn expand(&self, clause: &DateClause) -> Result<Vec<NaiveDate>, GrammarError> {
        match clause {
            DateClause::Single(date) => Ok(vec![self.resolve(*date)?]),
            DateClause::Range { start, end } => {
                let first = self.resolve(*start)?;
                let last = self.resolve(*end)?;
                if last < first {
                    warn!(%clause, "date range ends before it starts, no dates added");
                }
                Ok(days_between(first, last))
            }
            DateClause::List { month, days } => days
                .iter()
                .map(|day| {
                    self.resolve(MonthDay {
                        month: *month,
                        day: *day,
                    })
                })
                .collect(),
        }
    }

    fn resolve(&self, date: MonthDay) -> Result<NaiveDate, GrammarError> {
        resolve_date(date.month, date.day, self.today).ok_or(GrammarError::InvalidDate {
            month: date.month,
            day: date.day,
        })
    }
}

impl<U: From<ScheduleUpdate>> LineParser<U> for DateParser {
    fn name(&self) -> &'static str {
        "dates"
    }

    fn parse_line(&self, line: &str) -> Result<Outcome<U>, FatalParseError> {
        Ok(self.parse(line).map(U::from))
    }
}
