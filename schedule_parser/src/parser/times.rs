use multipeek::{multipeek, MultiPeek};
use std::vec::IntoIter;
use tracing::{debug, warn};

use crate::dispatch::{FatalParseError, LineParser, Outcome};
use crate::normalize::{ClockTime, Day};
use crate::parser::GrammarError;
use crate::record::{OpeningHours, ScheduleRecord, ScheduleUpdate};
use crate::scanner::scan;
use crate::token::{render, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TimeRange {
    open: ClockTime,
    close: ClockTime,
}

impl TimeRange {
    fn hours(&self) -> OpeningHours {
        OpeningHours(self.open.to_hhmm(), self.close.to_hhmm())
    }
}

/// Index where a second clause starts: a weekday right after a meridiem, with
/// something still following the weekday.
fn clause_boundary(tokens: &[Token]) -> Option<usize> {
    (1..tokens.len().saturating_sub(1)).find(|&index| {
        matches!(tokens[index - 1], Token::Meridiem(_))
            && matches!(tokens[index], Token::Weekday(_))
    })
}

fn mentions_closed(tokens: &[Token]) -> bool {
    tokens.iter().any(|token| match token {
        Token::Word(word) => word.to_lowercase().contains("closed"),
        _ => false,
    })
}

struct WeekdayParser {
    tokens: MultiPeek<IntoIter<Token>>,
}

impl WeekdayParser {
    fn new(tokens: &[Token]) -> Self {
        Self {
            tokens: multipeek(tokens.to_vec()),
        }
    }

    /// Leading `Weekday [– Weekday]` groups joined by `,`, `&` or `and`.
    /// Returns the days and whatever follows them.
    fn parse(mut self) -> Result<(Vec<Day>, Vec<Token>), GrammarError> {
        let mut days = self.weekday_group()?;
        while self.another_group_follows() {
            self.tokens.next();
            days.extend(self.weekday_group()?);
        }
        Ok((days, self.tokens.collect()))
    }

    fn another_group_follows(&mut self) -> bool {
        let joined = match self.tokens.peek() {
            Some(Token::Comma) => true,
            Some(Token::Word(word)) => word == "&" || word == "and",
            _ => false,
        };
        joined && matches!(self.tokens.peek_nth(1), Some(Token::Weekday(_)))
    }

    fn weekday_group(&mut self) -> Result<Vec<Day>, GrammarError> {
        let start = consume_expected_token!(self.tokens, Token::Weekday(day) => day, "Weekday")?;

        let is_range = self.tokens.peek() == Some(&Token::Dash)
            && matches!(self.tokens.peek_nth(1), Some(Token::Weekday(_)));
        if !is_range {
            return Ok(vec![start]);
        }

        self.tokens.next();
        let end = consume_expected_token!(self.tokens, Token::Weekday(day) => day, "Weekday")?;
        if end < start {
            warn!(%start, %end, "weekday range wraps around the week, keeping only its first day");
        }
        Ok(start.through(end))
    }
}

/// `H[:MM] (a|p).m. – H[:MM] (a|p).m.` starting at the first token.
struct TimeRangeParser {
    tokens: MultiPeek<IntoIter<Token>>,
    consumed: usize,
}

impl TimeRangeParser {
    fn new(tokens: &[Token]) -> Self {
        Self {
            tokens: multipeek(tokens.to_vec()),
            consumed: 0,
        }
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.next();
        if token.is_some() {
            self.consumed += 1;
        }
        token
    }

    fn parse(mut self) -> Result<(TimeRange, usize), GrammarError> {
        let open = self.clock_time()?;
        consume_expected_token!(self, Token::Dash => (), "Dash")?;
        let close = self.clock_time()?;
        Ok((TimeRange { open, close }, self.consumed))
    }

    fn clock_time(&mut self) -> Result<ClockTime, GrammarError> {
        let hour = consume_expected_token!(
            self,
            Token::Number { value, digits: 1..=2 } => value,
            "Hour"
        )?;
        let minutes = if self.tokens.peek() == Some(&Token::Colon) {
            self.next();
            Some(consume_expected_token!(
                self,
                Token::Number { value, digits: 2 } => value,
                "Minutes"
            )?)
        } else {
            None
        };
        let meridiem = consume_expected_token!(
            self,
            Token::Meridiem(meridiem) => meridiem,
            "a.m. or p.m."
        )?;
        Ok(ClockTime {
            hour,
            minutes,
            meridiem,
        })
    }
}

/// Every non-overlapping time range in `tokens`, left to right.
fn time_ranges(tokens: &[Token]) -> Vec<TimeRange> {
    let mut ranges = vec![];
    let mut index = 0;
    while index < tokens.len() {
        match TimeRangeParser::new(&tokens[index..]).parse() {
            Ok((range, consumed)) => {
                ranges.push(range);
                index += consumed;
            }
            Err(_) => index += 1,
        }
    }
    ranges
}

/// Reads weekly opening hours such as `Monday – Friday 8 a.m. – 4 p.m.`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeParser;

impl TimeParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, text: &str) -> Result<Outcome<ScheduleUpdate>, FatalParseError> {
        self.parse_clause(&scan(text))
    }

    /// `Ok(false)` when the line is not an hours line.
    pub fn parse_into(
        &self,
        text: &str,
        record: &mut ScheduleRecord,
    ) -> Result<bool, FatalParseError> {
        match self.parse(text)? {
            Outcome::Matched(update) => {
                record.apply(update);
                Ok(true)
            }
            Outcome::NotApplicable => Ok(false),
            Outcome::Malformed(error) => {
                record.errors.push(error);
                Ok(false)
            }
        }
    }

    fn parse_clause(&self, tokens: &[Token]) -> Result<Outcome<ScheduleUpdate>, FatalParseError> {
        if let Some(boundary) = clause_boundary(tokens) {
            let (left, right) = tokens.split_at(boundary);
            let Outcome::Matched(first) = self.parse_clause(left)? else {
                return Ok(Outcome::NotApplicable);
            };
            let Outcome::Matched(second) = self.parse_clause(right)? else {
                return Ok(Outcome::NotApplicable);
            };
            return Ok(Outcome::Matched(ScheduleUpdate::Many(vec![first, second])));
        }

        let (days, rest) = match WeekdayParser::new(tokens).parse() {
            Ok(parsed) => parsed,
            Err(error) => {
                debug!(?error, "not an hours clause");
                return Ok(Outcome::NotApplicable);
            }
        };

        let ranges = time_ranges(&rest);
        match ranges.as_slice() {
            [] if mentions_closed(&rest) => Ok(Outcome::Matched(ScheduleUpdate::ClosedDays(days))),
            [] => Ok(Outcome::NotApplicable),
            [range] => Ok(Outcome::Matched(ScheduleUpdate::WeeklyHours {
                days,
                hours: range.hours(),
            })),
            _ => Err(FatalParseError::MultipleTimeRanges {
                line: render(tokens),
            }),
        }
    }
}

impl<U: From<ScheduleUpdate>> LineParser<U> for TimeParser {
    fn name(&self) -> &'static str {
        "times"
    }

    fn parse_line(&self, line: &str) -> Result<Outcome<U>, FatalParseError> {
        Ok(self.parse(line)?.map(U::from))
    }
}
