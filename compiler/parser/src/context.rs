use modc_errors::{Diagnostic, Result};
use modc_lexer::{SpannedToken, Token};
use modc_span::Span;

/// Stores a program in tokenized form plus the one-token lookahead cursor
/// used by every `parse_*` method: a predictive recursive-descent parser
/// with a single token of lookahead.
pub struct ParserContext {
    /// Remaining tokens, reversed so `pop()` is the cheap end.
    tokens: Vec<SpannedToken>,
    pub(crate) token: SpannedToken,
    pub(crate) prev_token: SpannedToken,
}

impl ParserContext {
    pub fn new(mut tokens: Vec<SpannedToken>) -> Self {
        tokens.reverse();
        let token = SpannedToken::dummy();
        let mut ctx = Self { tokens, token: token.clone(), prev_token: token };
        ctx.bump();
        ctx
    }

    /// Advances the cursor by one token.
    pub(crate) fn bump(&mut self) {
        let next = self.tokens.pop().unwrap_or_else(|| SpannedToken {
            token: Token::Eof,
            span: self.token.span,
        });
        self.prev_token = std::mem::replace(&mut self.token, next);
    }

    pub(crate) fn check(&self, tok: &Token) -> bool {
        &self.token.token == tok
    }

    /// Consumes `token` if it is current, returning whether it matched.
    pub(crate) fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consumes the current token if it matches, else raises a `ParseError`
    /// describing what was expected.
    pub(crate) fn expect(&mut self, token: &Token) -> Result<Span> {
        if self.check(token) {
            let span = self.token.span;
            self.bump();
            Ok(span)
        } else {
            Err(self.unexpected(&format!("'{token}'")))
        }
    }

    /// Consumes and returns the current identifier, or fails with a
    /// `ParseError`.
    pub(crate) fn expect_ident(&mut self) -> Result<(modc_span::Symbol, Span)> {
        match self.token.token.clone() {
            Token::Ident(name) => {
                let span = self.token.span;
                self.bump();
                Ok((name, span))
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    pub(crate) fn unexpected(&self, expected: &str) -> Diagnostic {
        Diagnostic::parse(
            format!("expected {expected}, found '{}'", self.token.token),
            self.token.span,
        )
    }
}
