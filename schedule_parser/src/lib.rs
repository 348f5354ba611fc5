pub mod dispatch;
pub mod normalize;
mod parser;
pub mod record;
pub mod scanner;
pub mod token;

pub use parser::{dates, times, GrammarError, UnexpectedToken};

pub use dispatch::{dispatch, Dispatch, FatalParseError, LineParser, Outcome};
pub use normalize::Day;
pub use parser::dates::DateParser;
pub use parser::times::TimeParser;
pub use record::{OpeningHours, ParseError, ParseErrorKind, ScheduleRecord, ScheduleUpdate};
