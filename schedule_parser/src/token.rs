use crate::normalize::{month_abbreviation, Day, Meridiem};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Comma,
    Semicolon,
    Colon,
    /// `–` or `-`
    Dash,
    Month(u32),
    Weekday(Day),
    Number { value: u32, digits: usize },
    Meridiem(Meridiem),
    Word(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Comma => f.write_str(","),
            Token::Semicolon => f.write_str(";"),
            Token::Colon => f.write_str(":"),
            Token::Dash => f.write_str("–"),
            Token::Month(month) => f.write_str(month_abbreviation(*month)),
            Token::Weekday(day) => write!(f, "{day}"),
            Token::Number { value, digits } => write!(f, "{value:0width$}", width = *digits),
            Token::Meridiem(meridiem) => write!(f, "{meridiem}"),
            Token::Word(word) => f.write_str(word),
        }
    }
}

/// Renders tokens back to readable text for error reports.
pub fn render(tokens: &[Token]) -> String {
    let mut text = String::new();
    let mut previous: Option<&Token> = None;
    for token in tokens {
        let glued = matches!(token, Token::Comma | Token::Semicolon | Token::Colon)
            || matches!(previous, Some(Token::Colon));
        if previous.is_some() && !glued {
            text.push(' ');
        }
        text.push_str(&token.to_string());
        previous = Some(token);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::{render, Token};
    use crate::normalize::{Day, Meridiem};

    #[test]
    fn test_render_keeps_punctuation_attached() {
        let tokens = vec![
            Token::Weekday(Day::Monday),
            Token::Number {
                value: 8,
                digits: 1,
            },
            Token::Colon,
            Token::Number {
                value: 5,
                digits: 2,
            },
            Token::Meridiem(Meridiem::Am),
            Token::Comma,
            Token::Month(12),
            Token::Word("TBD".to_string()),
        ];
        assert_eq!(render(&tokens), "Monday 8:05 a.m., Dec TBD");
    }
}
