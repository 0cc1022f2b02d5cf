use crate::context::ParserContext;
use modc_ast::{AssignStmt, AssignTarget, CompoundStmt, ForStmt, IfStmt, ProcCallStmt, ReturnStmt, Statement, WhileStmt};
use modc_errors::Result;
use modc_lexer::Token;

impl ParserContext {
    /// Parses a sequence of statements separated by `;`, stopping at the
    /// first token that cannot start a statement (`END`, `ELSE`, or `Eof`).
    pub(crate) fn parse_statement_sequence(&mut self) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        if self.starts_statement() {
            statements.push(self.parse_statement()?);
            while self.eat(&Token::Semi) {
                if !self.starts_statement() {
                    break;
                }
                statements.push(self.parse_statement()?);
            }
        }
        Ok(statements)
    }

    fn starts_statement(&self) -> bool {
        matches!(
            self.token.token,
            Token::Ident(_) | Token::If | Token::While | Token::For | Token::Return | Token::Begin
        )
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        match self.token.token {
            Token::Ident(_) => self.parse_assign_or_call(),
            Token::If => self.parse_if(),
            Token::While => self.parse_while(),
            Token::For => self.parse_for(),
            Token::Return => self.parse_return(),
            Token::Begin => self.parse_compound(),
            _ => Err(self.unexpected("a statement")),
        }
    }

    /// Three-way branch on what follows the identifier: `(` means a
    /// parenthesized call, `[` means an array-element assignment, and
    /// anything else is either a scalar assignment (`:=` follows) or a
    /// bare, zero-argument procedure-call statement (nothing follows but
    /// `;`/`END`/`ELSE`).
    fn parse_assign_or_call(&mut self) -> Result<Statement> {
        let (name, name_span) = self.expect_ident()?;
        if self.eat(&Token::LParen) {
            let mut args = Vec::new();
            if !self.check(&Token::RParen) {
                args.push(self.parse_expression()?);
                while self.eat(&Token::Comma) {
                    args.push(self.parse_expression()?);
                }
            }
            let end = self.expect(&Token::RParen)?;
            return Ok(Statement::ProcCall(ProcCallStmt { name, args, span: name_span + end }));
        }
        if self.eat(&Token::LBracket) {
            let mut indices = vec![self.parse_expression()?];
            while self.eat(&Token::Comma) {
                indices.push(self.parse_expression()?);
            }
            let bracket_end = self.expect(&Token::RBracket)?;
            let target = AssignTarget::ArrayElement { name, indices, span: name_span + bracket_end };
            self.expect(&Token::Assign)?;
            let value = self.parse_expression()?;
            let span = target.span() + value.span();
            return Ok(Statement::Assign(AssignStmt { target, value, span }));
        }
        if self.eat(&Token::Assign) {
            let target = AssignTarget::Name(name, name_span);
            let value = self.parse_expression()?;
            let span = target.span() + value.span();
            return Ok(Statement::Assign(AssignStmt { target, value, span }));
        }
        Ok(Statement::ProcCall(ProcCallStmt { name, args: Vec::new(), span: name_span }))
    }

    /// Parses a statement sequence and wraps it as a single `Compound`
    /// node, so `IfStmt`/`WhileStmt`/`ForStmt` (each of which holds one
    /// `body`/`then_branch`/`else_branch` statement) can still hold an
    /// arbitrary number of statements without the source needing an inner
    /// `BEGIN`.
    fn parse_sequence_as_one_statement(&mut self) -> Result<Statement> {
        let start = self.token.span;
        let statements = self.parse_statement_sequence()?;
        let span = statements.last().map(|s| start + s.span()).unwrap_or(start);
        Ok(Statement::Compound(CompoundStmt { statements, span }))
    }

    /// `IF cond THEN StatementSequence [ELSE StatementSequence] END`: one
    /// `END` closes the whole construct, the same way a procedure body's
    /// `BEGIN … END` does.
    fn parse_if(&mut self) -> Result<Statement> {
        let start = self.expect(&Token::If)?;
        let cond = self.parse_expression()?;
        self.expect(&Token::Then)?;
        let then_branch = Box::new(self.parse_sequence_as_one_statement()?);
        let else_branch = if self.eat(&Token::Else) {
            Some(Box::new(self.parse_sequence_as_one_statement()?))
        } else {
            None
        };
        let end = self.expect(&Token::End)?;
        Ok(Statement::If(IfStmt { cond, then_branch, else_branch, span: start + end }))
    }

    /// `WHILE cond DO StatementSequence END`.
    fn parse_while(&mut self) -> Result<Statement> {
        let start = self.expect(&Token::While)?;
        let cond = self.parse_expression()?;
        self.expect(&Token::Do)?;
        let body = Box::new(self.parse_sequence_as_one_statement()?);
        let end = self.expect(&Token::End)?;
        Ok(Statement::While(WhileStmt { cond, body, span: start + end }))
    }

    /// `FOR var := start TO end DO StatementSequence END`.
    fn parse_for(&mut self) -> Result<Statement> {
        let start = self.expect(&Token::For)?;
        let (var, _) = self.expect_ident()?;
        self.expect(&Token::Assign)?;
        let from = self.parse_expression()?;
        self.expect(&Token::To)?;
        let to = self.parse_expression()?;
        self.expect(&Token::Do)?;
        let body = Box::new(self.parse_sequence_as_one_statement()?);
        let end = self.expect(&Token::End)?;
        Ok(Statement::For(ForStmt { var, start: from, end: to, body, span: start + end }))
    }

    fn parse_return(&mut self) -> Result<Statement> {
        let start = self.expect(&Token::Return)?;
        if self.starts_expression() {
            let value = self.parse_expression()?;
            let span = start + value.span();
            return Ok(Statement::Return(ReturnStmt { value: Some(value), span }));
        }
        Ok(Statement::Return(ReturnStmt { value: None, span: start }))
    }

    fn starts_expression(&self) -> bool {
        matches!(
            self.token.token,
            Token::IntLit(_)
                | Token::RealLit(_)
                | Token::StringLit(_)
                | Token::Ident(_)
                | Token::LParen
                | Token::Plus
                | Token::Minus
        )
    }

    fn parse_compound(&mut self) -> Result<Statement> {
        let start = self.expect(&Token::Begin)?;
        let statements = self.parse_statement_sequence()?;
        let end = self.expect(&Token::End)?;
        Ok(Statement::Compound(CompoundStmt { statements, span: start + end }))
    }
}
