//! Recursive-descent parser: consumes a token sequence and produces a
//! `modc_ast::Program`, failing at the first malformed construct.

mod context;
mod declaration;
mod expression;
mod statement;
mod type_;

pub use context::ParserContext;

use modc_ast::Program;
use modc_errors::Result;
use modc_lexer::{tokenize, Token};

/// Parses a whole source buffer into a `Program`.
pub fn parse(source: &str) -> Result<Program> {
    let tokens = tokenize(source)?;
    let mut ctx = ParserContext::new(tokens);
    parse_program(&mut ctx)
}

fn parse_program(ctx: &mut ParserContext) -> Result<Program> {
    ctx.expect(&Token::Module)?;
    let (name, _) = ctx.expect_ident()?;
    ctx.expect(&Token::Semi)?;
    let declarations = ctx.parse_declarations()?;
    ctx.expect(&Token::Begin)?;
    let statements = ctx.parse_statement_sequence()?;
    ctx.expect(&Token::End)?;
    let (end_name, end_span) = ctx.expect_ident()?;
    if end_name != name {
        return Err(modc_errors::Diagnostic::parse(
            format!("module closed with '{end_name}', expected '{name}'"),
            end_span,
        ));
    }
    ctx.expect(&Token::Dot)?;
    Ok(Program::new(name, declarations, statements))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_module() {
        let program = parse("MODULE Empty; BEGIN END Empty.").unwrap();
        assert_eq!(program.name.as_str(), "Empty");
        assert!(program.declarations.is_empty());
        assert!(program.statements.is_empty());
    }

    #[test]
    fn mismatched_closing_name_is_a_parse_error() {
        let err = parse("MODULE A; BEGIN END B.").unwrap_err();
        assert!(err.render().starts_with("Error:"));
    }

    #[test]
    fn parses_declarations_and_a_for_loop() {
        let src = r#"
            MODULE Sums;
            VAR total: INTEGER;
            BEGIN
                total := 0;
                FOR i := 1 TO 10 DO
                    total := total + i
                END
            END Sums.
        "#;
        let program = parse(src).unwrap();
        assert_eq!(program.declarations.len(), 1);
        assert_eq!(program.statements.len(), 2);
    }
}
