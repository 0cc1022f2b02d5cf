use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// A half-open source range, tracked as (line, column) pairs rather than byte
/// offsets since the lexer advances a `(line, column)` cursor directly
/// rather than slicing a flat buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub line_start: u32,
    pub line_stop: u32,
    pub col_start: u32,
    pub col_stop: u32,
}

impl Span {
    pub const fn new(line_start: u32, line_stop: u32, col_start: u32, col_stop: u32) -> Self {
        Self { line_start, line_stop, col_start, col_stop }
    }

    /// A single-point span, for a token that starts and ends at one cursor
    /// position (before the token's own width is added).
    pub const fn at(line: u32, col: u32) -> Self {
        Self::new(line, line, col, col)
    }

    /// Returns a span with no useful location, used for synthetic/default
    /// tokens that never reach a diagnostic.
    pub const fn dummy() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub const fn is_dummy(&self) -> bool {
        self.line_start == 0 && self.line_stop == 0 && self.col_start == 0 && self.col_stop == 0
    }
}

impl Add for Span {
    type Output = Span;

    /// Produces the smallest span covering both operands; used when combining
    /// the spans of sub-expressions into the span of their parent node.
    fn add(self, other: Span) -> Span {
        if self.is_dummy() {
            return other;
        }
        if other.is_dummy() {
            return self;
        }
        Span {
            line_start: self.line_start.min(other.line_start),
            line_stop: self.line_stop.max(other.line_stop),
            col_start: self.col_start.min(other.col_start),
            col_stop: self.col_stop.max(other.col_stop),
        }
    }
}

impl Add for &Span {
    type Output = Span;

    fn add(self, other: &Span) -> Span {
        *self + *other
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line_start == self.line_stop {
            write!(f, "{}:{}-{}", self.line_start, self.col_start, self.col_stop)
        } else {
            write!(f, "{}:{}-{}:{}", self.line_start, self.col_start, self.line_stop, self.col_stop)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dummy_is_absorbed_by_add() {
        let a = Span::at(3, 4);
        assert_eq!(a + Span::dummy(), a);
        assert_eq!(Span::dummy() + a, a);
    }

    #[test]
    fn add_covers_both_spans() {
        let a = Span::new(1, 1, 1, 5);
        let b = Span::new(1, 2, 8, 3);
        let c = a + b;
        assert_eq!(c, Span::new(1, 2, 1, 5));
    }

    #[test]
    fn display_collapses_single_line() {
        assert_eq!(Span::new(2, 2, 1, 4).to_string(), "2:1-4");
        assert_eq!(Span::new(2, 3, 1, 4).to_string(), "2:1-3:4");
    }
}
