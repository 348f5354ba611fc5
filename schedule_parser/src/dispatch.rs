use thiserror::Error;
use tracing::debug;

use crate::record::{ParseError, ParseErrorKind};

/// Result of offering one line to one grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<U> {
    Matched(U),
    /// The line is not written in this grammar; try the next one.
    NotApplicable,
    /// The line has this grammar's shape but its content could not be read.
    Malformed(ParseError),
}

impl<U> Outcome<U> {
    pub fn map<V>(self, f: impl FnOnce(U) -> V) -> Outcome<V> {
        match self {
            Outcome::Matched(update) => Outcome::Matched(f(update)),
            Outcome::NotApplicable => Outcome::NotApplicable,
            Outcome::Malformed(error) => Outcome::Malformed(error),
        }
    }
}

/// Input shapes that mean a splitter left a line only partly decomposed.
/// These abort the whole run rather than a single line.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FatalParseError {
    #[error("found two time ranges in {line:?}, it should have been split into separate clauses")]
    MultipleTimeRanges { line: String },
}

pub trait LineParser<U> {
    fn name(&self) -> &'static str;

    fn parse_line(&self, line: &str) -> Result<Outcome<U>, FatalParseError>;
}

#[derive(Debug, PartialEq, Eq)]
pub struct Dispatch<U> {
    /// The update of the first grammar that matched.
    pub update: Option<U>,
    /// Malformed reports met on the way, followed by `could-not-parse` if nothing matched.
    pub errors: Vec<ParseError>,
}

/// Offers `line` to each parser in order until one matches.
pub fn dispatch<U>(
    parsers: &[&dyn LineParser<U>],
    line: &str,
) -> Result<Dispatch<U>, FatalParseError> {
    let mut errors = vec![];
    for parser in parsers {
        match parser.parse_line(line)? {
            Outcome::Matched(update) => {
                debug!(parser = parser.name(), line, "line matched");
                return Ok(Dispatch {
                    update: Some(update),
                    errors,
                });
            }
            Outcome::Malformed(error) => {
                debug!(parser = parser.name(), line, ?error, "line malformed");
                errors.push(error);
            }
            Outcome::NotApplicable => {}
        }
    }
    errors.push(ParseError::new(ParseErrorKind::CouldNotParse, line));
    Ok(Dispatch {
        update: None,
        errors,
    })
}
