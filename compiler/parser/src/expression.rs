use crate::context::ParserContext;
use modc_ast::{
    ArrayAccessExpr, BinaryExpr, BinaryOp, CallExpr, DataType, Expression, LiteralExpr, LiteralValue, UnaryExpr,
    UnaryOp, VariableExpr,
};
use modc_errors::Result;
use modc_lexer::Token;

/// Operator-precedence cascade, lowest to highest binding: `OR` · `AND` ·
/// equality · relational · additive · multiplicative · unary · primary.
/// Each level is a pairwise function calling the next-higher one.
impl ParserContext {
    pub(crate) fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_or_expression()
    }

    fn parse_or_expression(&mut self) -> Result<Expression> {
        let mut left = self.parse_and_expression()?;
        while self.eat(&Token::Or) {
            let right = self.parse_and_expression()?;
            left = bin(left, BinaryOp::Or, right);
        }
        Ok(left)
    }

    fn parse_and_expression(&mut self) -> Result<Expression> {
        let mut left = self.parse_equality_expression()?;
        while self.eat(&Token::And) {
            let right = self.parse_equality_expression()?;
            left = bin(left, BinaryOp::And, right);
        }
        Ok(left)
    }

    fn parse_equality_expression(&mut self) -> Result<Expression> {
        let mut left = self.parse_relational_expression()?;
        loop {
            let op = if self.eat(&Token::Eq) {
                BinaryOp::Eq
            } else if self.eat(&Token::Hash) {
                BinaryOp::NotEq
            } else {
                break;
            };
            let right = self.parse_relational_expression()?;
            left = bin(left, op, right);
        }
        Ok(left)
    }

    fn parse_relational_expression(&mut self) -> Result<Expression> {
        let mut left = self.parse_additive_expression()?;
        loop {
            let op = if self.eat(&Token::Lt) {
                BinaryOp::Lt
            } else if self.eat(&Token::LtEq) {
                BinaryOp::LtEq
            } else if self.eat(&Token::Gt) {
                BinaryOp::Gt
            } else if self.eat(&Token::GtEq) {
                BinaryOp::GtEq
            } else {
                break;
            };
            let right = self.parse_additive_expression()?;
            left = bin(left, op, right);
        }
        Ok(left)
    }

    fn parse_additive_expression(&mut self) -> Result<Expression> {
        let mut left = self.parse_multiplicative_expression()?;
        loop {
            let op = if self.eat(&Token::Plus) {
                BinaryOp::Add
            } else if self.eat(&Token::Minus) {
                BinaryOp::Sub
            } else {
                break;
            };
            let right = self.parse_multiplicative_expression()?;
            left = bin(left, op, right);
        }
        Ok(left)
    }

    fn parse_multiplicative_expression(&mut self) -> Result<Expression> {
        let mut left = self.parse_unary_expression()?;
        loop {
            let op = if self.eat(&Token::Star) {
                BinaryOp::Mul
            } else if self.eat(&Token::Slash) {
                BinaryOp::Div
            } else if self.eat(&Token::Div) {
                BinaryOp::DivInt
            } else if self.eat(&Token::Mod) {
                BinaryOp::Mod
            } else {
                break;
            };
            let right = self.parse_unary_expression()?;
            left = bin(left, op, right);
        }
        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> Result<Expression> {
        if self.eat(&Token::Plus) {
            let start = self.prev_token.span;
            let operand = self.parse_unary_expression()?;
            let span = start + operand.span();
            return Ok(Expression::Unary(UnaryExpr { op: UnaryOp::Plus, operand: Box::new(operand), span }));
        }
        if self.eat(&Token::Minus) {
            let start = self.prev_token.span;
            let operand = self.parse_unary_expression()?;
            let span = start + operand.span();
            return Ok(Expression::Unary(UnaryExpr { op: UnaryOp::Minus, operand: Box::new(operand), span }));
        }
        self.parse_primary_expression()
    }

    fn parse_primary_expression(&mut self) -> Result<Expression> {
        let start_span = self.token.span;
        match self.token.token.clone() {
            Token::IntLit(digits) => {
                self.bump();
                let value = digits
                    .parse::<i64>()
                    .map_err(|_| self.unexpected("an integer literal that fits in 64 bits"))?;
                Ok(Expression::Literal(LiteralExpr {
                    value: LiteralValue::Integer(value),
                    ty: DataType::Integer,
                    span: start_span,
                }))
            }
            Token::RealLit(digits) => {
                self.bump();
                let value = digits.parse::<f64>().map_err(|_| self.unexpected("a real literal"))?;
                Ok(Expression::Literal(LiteralExpr {
                    value: LiteralValue::Real(value),
                    ty: DataType::Real,
                    span: start_span,
                }))
            }
            Token::StringLit(s) => {
                self.bump();
                Ok(Expression::Literal(LiteralExpr {
                    value: LiteralValue::Str(s),
                    ty: DataType::String,
                    span: start_span,
                }))
            }
            Token::Ident(name) => {
                self.bump();
                if self.eat(&Token::LBracket) {
                    let mut indices = vec![self.parse_expression()?];
                    while self.eat(&Token::Comma) {
                        indices.push(self.parse_expression()?);
                    }
                    let end = self.expect(&Token::RBracket)?;
                    return Ok(Expression::ArrayAccess(ArrayAccessExpr { name, indices, span: start_span + end }));
                }
                if self.eat(&Token::LParen) {
                    let mut args = Vec::new();
                    if !self.check(&Token::RParen) {
                        args.push(self.parse_expression()?);
                        while self.eat(&Token::Comma) {
                            args.push(self.parse_expression()?);
                        }
                    }
                    let end = self.expect(&Token::RParen)?;
                    return Ok(Expression::Call(CallExpr { name, args, span: start_span + end }));
                }
                Ok(Expression::Variable(VariableExpr { name, span: start_span }))
            }
            Token::LParen => {
                self.bump();
                let inner = self.parse_expression()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            _ => Err(self.unexpected("an expression")),
        }
    }
}

fn bin(left: Expression, op: BinaryOp, right: Expression) -> Expression {
    let span = left.span() + right.span();
    Expression::Binary(BinaryExpr { left: Box::new(left), op, right: Box::new(right), span })
}

#[cfg(test)]
mod tests {
    use super::*;
    use modc_lexer::tokenize;

    fn parse_expr(src: &str) -> Expression {
        let tokens = tokenize(src).unwrap();
        let mut ctx = ParserContext::new(tokens);
        ctx.parse_expression().unwrap()
    }

    #[test]
    fn precedence_multiplies_before_adds() {
        // 1 + 2 * 3 should parse as 1 + (2 * 3).
        let expr = parse_expr("1 + 2 * 3");
        match expr {
            Expression::Binary(BinaryExpr { op: BinaryOp::Add, right, .. }) => {
                assert!(matches!(*right, Expression::Binary(BinaryExpr { op: BinaryOp::Mul, .. })));
            }
            _ => panic!("expected an Add at the top"),
        }
    }

    #[test]
    fn or_binds_looser_than_and() {
        let expr = parse_expr("1 AND 2 OR 3");
        match expr {
            Expression::Binary(BinaryExpr { op: BinaryOp::Or, left, .. }) => {
                assert!(matches!(*left, Expression::Binary(BinaryExpr { op: BinaryOp::And, .. })));
            }
            _ => panic!("expected an Or at the top"),
        }
    }

    #[test]
    fn array_access_and_call_parse() {
        assert!(matches!(parse_expr("a[1, 2]"), Expression::ArrayAccess(_)));
        assert!(matches!(parse_expr("f(1, 2)"), Expression::Call(_)));
    }
}
