use crate::token::Token;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnexpectedToken {
    pub found: Token,
    pub expected: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    UnexpectedEndOfLine,
    UnexpectedToken(UnexpectedToken),
    /// Well formed, but names a day the calendar does not have.
    InvalidDate { month: u32, day: u32 },
}

macro_rules! consume_expected_token {
    ($tokens:expr, $expected:pat => $transform_token:expr, $required_element:expr) => {
        match $tokens.next() {
            Some($expected) => Ok($transform_token),
            Some(token) => {
                let unexpected_token = $crate::parser::UnexpectedToken {
                    found: token.clone(),
                    expected: $required_element,
                };
                Err($crate::parser::GrammarError::UnexpectedToken(
                    unexpected_token,
                ))
            }
            None => Err($crate::parser::GrammarError::UnexpectedEndOfLine),
        }
    };
}

pub mod dates;
pub mod times;
