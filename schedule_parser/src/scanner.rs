use multipeek::{multipeek, MultiPeek};
use std::ops::Range;
use std::str::Chars;

use crate::normalize::{month_from_abbreviation, Day, Meridiem};
use crate::token::Token;

pub struct Scanner<'a> {
    source: MultiPeek<Chars<'a>>,
    current_lexeme: String,
    /// Byte offset of the next unread character.
    position: usize,
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_whitespace(c: char) -> bool {
    // the page pads lines with non-breaking and zero-width spaces
    c.is_whitespace() || c == '\u{200B}'
}

fn is_separator(c: char) -> bool {
    matches!(c, ',' | ';' | ':' | '–' | '-')
}

fn is_word_char(c: char) -> bool {
    !is_whitespace(c) && !is_separator(c)
}

impl<'a> Scanner<'a> {
    fn new(raw_text: &'a str) -> Self {
        let source = multipeek(raw_text.chars());
        Self {
            source,
            current_lexeme: Default::default(),
            position: 0,
        }
    }

    fn advance(&mut self) -> Option<char> {
        let next = self.source.next();
        if let Some(c) = next {
            self.current_lexeme.push(c);
            self.position += c.len_utf8();
        }
        next
    }

    fn peek_check(&mut self, check: &dyn Fn(char) -> bool) -> bool {
        match self.source.peek() {
            Some(&c) => check(c),
            None => false,
        }
    }

    fn advance_while(&mut self, condition: &dyn Fn(char) -> bool) {
        while self.peek_check(condition) {
            self.advance();
        }
    }

    fn advance_but_discard(&mut self, condition: &dyn Fn(char) -> bool) {
        while self.peek_check(condition) {
            if let Some(c) = self.source.next() {
                self.position += c.len_utf8();
            }
        }
    }

    /// `a.m`, `a.m.`, `p.m` or `p.m.` with the leading letter already consumed.
    fn meridiem_follows(&mut self) -> bool {
        self.source.peek_nth(0) == Some(&'.') && self.source.peek_nth(1) == Some(&'m')
    }

    fn meridiem(&mut self, first: char) -> Token {
        self.advance();
        self.advance();
        if self.peek_check(&|c| c == '.') {
            self.advance();
        }
        if first == 'a' {
            Token::Meridiem(Meridiem::Am)
        } else {
            Token::Meridiem(Meridiem::Pm)
        }
    }

    fn number(&mut self) -> Token {
        self.advance_while(&is_digit);
        let lexeme = self.current_lexeme.clone();
        match lexeme.parse::<u32>() {
            Ok(value) => Token::Number {
                value,
                digits: lexeme.len(),
            },
            Err(_) => Token::Word(lexeme),
        }
    }

    fn word(&mut self) -> Token {
        self.advance_while(&is_word_char);
        let lexeme = self.current_lexeme.as_str();
        if let Some(month) = month_from_abbreviation(lexeme) {
            return Token::Month(month);
        }
        if let Some(day) = Day::from_name(lexeme) {
            return Token::Weekday(day);
        }
        Token::Word(lexeme.to_owned())
    }

    fn scan_next(&mut self) -> Option<(Token, Range<usize>)> {
        self.current_lexeme.clear();

        self.advance_but_discard(&is_whitespace);
        let start = self.position;

        let next_char = self.advance()?;

        if matches!(next_char, 'a' | 'p') && self.meridiem_follows() {
            let token = self.meridiem(next_char);
            return Some((token, start..self.position));
        }

        let token = match next_char {
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            ':' => Token::Colon,
            '–' | '-' => Token::Dash,
            c if is_digit(c) => self.number(),
            _ => self.word(),
        };

        Some((token, start..self.position))
    }
}

pub fn scan(text: &str) -> Vec<Token> {
    scan_spanned(text)
        .into_iter()
        .map(|(token, _)| token)
        .collect()
}

/// Tokens paired with the byte range of `text` they were read from.
pub fn scan_spanned(text: &str) -> Vec<(Token, Range<usize>)> {
    let scanner = ScannerIter {
        scanner: Scanner::new(text),
    };
    scanner.into_iter().collect()
}

struct ScannerIter<'a> {
    scanner: Scanner<'a>,
}

impl<'a> Iterator for ScannerIter<'a> {
    type Item = (Token, Range<usize>);
    fn next(&mut self) -> Option<Self::Item> {
        self.scanner.scan_next()
    }
}

#[cfg(test)]
mod tests {
    use crate::normalize::{Day, Meridiem};
    use crate::scanner::{scan, scan_spanned};
    use crate::token::Token;

    fn number(value: u32, digits: usize) -> Token {
        Token::Number { value, digits }
    }

    #[test]
    fn test_tokenizing_a_time_line() {
        let result = scan("Monday – Friday 8:30 a.m. – 4 p.m.");

        assert_eq!(
            result,
            vec![
                Token::Weekday(Day::Monday),
                Token::Dash,
                Token::Weekday(Day::Friday),
                number(8, 1),
                Token::Colon,
                number(30, 2),
                Token::Meridiem(Meridiem::Am),
                Token::Dash,
                number(4, 1),
                Token::Meridiem(Meridiem::Pm),
            ]
        );
    }

    #[test]
    fn test_tokenizing_a_date_list() {
        let result = scan("Dec 24, 25; Jan 02-3");

        assert_eq!(
            result,
            vec![
                Token::Month(12),
                number(24, 2),
                Token::Comma,
                number(25, 2),
                Token::Semicolon,
                Token::Month(1),
                number(2, 2),
                Token::Dash,
                number(3, 1),
            ]
        );
    }

    #[test]
    fn test_meridiem_can_be_glued_to_the_hour() {
        let result = scan("9a.m-1p.m.");

        assert_eq!(
            result,
            vec![
                number(9, 1),
                Token::Meridiem(Meridiem::Am),
                Token::Dash,
                number(1, 1),
                Token::Meridiem(Meridiem::Pm),
            ]
        );
    }

    #[test]
    fn test_words_that_are_not_keywords() {
        let result = scan("Sunday: CLOSED and a week December");

        assert_eq!(
            result,
            vec![
                Token::Weekday(Day::Sunday),
                Token::Colon,
                Token::Word("CLOSED".to_string()),
                Token::Word("and".to_string()),
                Token::Word("a".to_string()),
                Token::Word("week".to_string()),
                Token::Word("December".to_string()),
            ]
        );
    }

    #[test]
    fn test_spans_point_back_into_the_source() {
        let text = "Dec\u{00A0}24th – 3";
        let spans: Vec<&str> = scan_spanned(text)
            .into_iter()
            .map(|(_, span)| &text[span])
            .collect();

        assert_eq!(spans, vec!["Dec", "24", "th", "–", "3"]);
    }

    #[test]
    fn test_zero_width_spaces_are_dropped() {
        assert!(scan("\u{200B}  \u{00A0}").is_empty());
    }
}
