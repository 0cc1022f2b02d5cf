//! The lexer's inner loop is a small explicit state machine: {default,
//! in-identifier, in-number-integer-part, in-number-fraction-part,
//! in-string, in-comment}. Each branch below corresponds to one of those
//! states; `default` is the top-level `match` in [`Lexer::next_token`].

use crate::token::{SpannedToken, Token};
use modc_errors::{Diagnostic, Result};
use modc_span::{Span, Symbol};
use std::iter::Peekable;
use std::str::Chars;

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: u32,
    col: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { chars: source.chars().peekable(), line: 1, col: 1 }
    }

    /// Lexes the whole input and returns a flat, EOF-terminated token
    /// sequence, or the first [`Diagnostic::Lex`] encountered. The lexer
    /// does not recover; it halts at the first error.
    pub fn tokenize(mut self) -> Result<Vec<SpannedToken>> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = matches!(tok.token, Token::Eof);
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek2(&mut self) -> Option<char> {
        let mut clone = self.chars.clone();
        clone.next();
        clone.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('(') if self.peek2() == Some('*') => {
                    let start = (self.line, self.col);
                    self.advance();
                    self.advance();
                    let mut closed = false;
                    while let Some(c) = self.peek() {
                        if c == '*' && self.peek2() == Some(')') {
                            self.advance();
                            self.advance();
                            closed = true;
                            break;
                        }
                        self.advance();
                    }
                    if !closed {
                        return Err(Diagnostic::lex(
                            "unterminated comment",
                            Span::at(start.0, start.1),
                        ));
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn next_token(&mut self) -> Result<SpannedToken> {
        self.skip_whitespace_and_comments()?;

        let (line, col) = (self.line, self.col);
        let span_at = |end_col: u32| Span::new(line, line, col, end_col);

        let Some(c) = self.peek() else {
            return Ok(SpannedToken { token: Token::Eof, span: span_at(col) });
        };

        // in-identifier
        if c.is_alphabetic() || c == '_' {
            let mut ident = String::new();
            while let Some(c) = self.peek() {
                if c.is_alphanumeric() || c == '_' {
                    ident.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            let token = Token::keyword(&ident).unwrap_or_else(|| Token::Ident(Symbol::intern(&ident)));
            return Ok(SpannedToken { token, span: span_at(self.col) });
        }

        // in-number-integer-part / in-number-fraction-part
        if c.is_ascii_digit() {
            let mut number = String::new();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    number.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            if self.peek() == Some('.') && self.peek2().is_some_and(|c| c.is_ascii_digit()) {
                number.push('.');
                self.advance();
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        number.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
                return Ok(SpannedToken { token: Token::RealLit(number), span: span_at(self.col) });
            }
            return Ok(SpannedToken { token: Token::IntLit(number), span: span_at(self.col) });
        }

        // in-string
        if c == '"' {
            self.advance();
            let mut s = String::new();
            let mut closed = false;
            while let Some(c) = self.peek() {
                self.advance();
                if c == '"' {
                    closed = true;
                    break;
                }
                s.push(c);
            }
            if !closed {
                return Err(Diagnostic::lex("unterminated string literal", span_at(self.col)));
            }
            return Ok(SpannedToken { token: Token::StringLit(s), span: span_at(self.col) });
        }

        macro_rules! single {
            ($tok:expr) => {{
                self.advance();
                Ok(SpannedToken { token: $tok, span: span_at(self.col) })
            }};
        }
        macro_rules! maybe_eq {
            ($on_eq:expr, $otherwise:expr) => {{
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(SpannedToken { token: $on_eq, span: span_at(self.col) })
                } else {
                    Ok(SpannedToken { token: $otherwise, span: span_at(self.col) })
                }
            }};
        }

        match c {
            ':' => maybe_eq!(Token::Assign, Token::Colon),
            '<' => maybe_eq!(Token::LtEq, Token::Lt),
            '>' => maybe_eq!(Token::GtEq, Token::Gt),
            '=' => single!(Token::Eq),
            '#' => single!(Token::Hash),
            '+' => single!(Token::Plus),
            '-' => single!(Token::Minus),
            '*' => single!(Token::Star),
            '/' => single!(Token::Slash),
            ';' => single!(Token::Semi),
            ',' => single!(Token::Comma),
            '(' => single!(Token::LParen),
            ')' => single!(Token::RParen),
            '[' => single!(Token::LBracket),
            ']' => single!(Token::RBracket),
            '.' => single!(Token::Dot),
            other => {
                self.advance();
                Err(Diagnostic::lex(format!("unexpected character '{other}'"), span_at(self.col)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        Lexer::new(source).tokenize().unwrap().into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn lexes_assign_and_colon() {
        assert_eq!(kinds(":="), vec![Token::Assign, Token::Eof]);
        assert_eq!(kinds(":"), vec![Token::Colon, Token::Eof]);
    }

    #[test]
    fn lexes_relational_combos() {
        assert_eq!(kinds("< <= > >="), vec![Token::Lt, Token::LtEq, Token::Gt, Token::GtEq, Token::Eof]);
    }

    #[test]
    fn lexes_integer_and_real_literals() {
        assert_eq!(kinds("42"), vec![Token::IntLit("42".into()), Token::Eof]);
        assert_eq!(kinds("3.5"), vec![Token::RealLit("3.5".into()), Token::Eof]);
        // A trailing dot with no digits after it is not part of a real
        // literal (it is the module terminator's dot).
        assert_eq!(kinds("42."), vec![Token::IntLit("42".into()), Token::Dot, Token::Eof]);
    }

    #[test]
    fn lexes_string_literal_without_escapes() {
        assert_eq!(kinds("\"Hello, World!\""), vec![Token::StringLit("Hello, World!".into()), Token::Eof]);
    }

    #[test]
    fn unterminated_string_is_a_lex_error() {
        assert!(Lexer::new("\"abc").tokenize().is_err());
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(kinds("begin BEGIN BeGiN"), vec![Token::Begin, Token::Begin, Token::Begin, Token::Eof]);
    }

    #[test]
    fn comments_are_skipped_and_do_not_nest() {
        assert_eq!(kinds("(* a comment *) x"), vec![Token::Ident(Symbol::intern("x")), Token::Eof]);
        // First `*)` closes the comment; the outer `*)` becomes stray tokens.
        assert!(Lexer::new("(* outer (* inner *) still_inside *)").tokenize().is_ok());
    }

    #[test]
    fn unterminated_comment_is_a_lex_error() {
        assert!(Lexer::new("(* never closes").tokenize().is_err());
    }

    #[test]
    fn unclassifiable_character_is_a_lex_error() {
        assert!(Lexer::new("@").tokenize().is_err());
    }
}
