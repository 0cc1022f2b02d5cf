//! Converts a source buffer into a flat, EOF-terminated token sequence.

mod lexer;
mod token;

pub use lexer::Lexer;
pub use token::{SpannedToken, Token};

/// Convenience wrapper used by the parser and the driver.
pub fn tokenize(source: &str) -> modc_errors::Result<Vec<SpannedToken>> {
    Lexer::new(source).tokenize()
}
