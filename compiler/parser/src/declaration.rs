use crate::context::ParserContext;
use modc_ast::{ConstDecl, Declaration, Parameter, ProcDecl, VarDecl};
use modc_errors::Result;
use modc_lexer::Token;

impl ParserContext {
    /// Parses every `CONST`/`VAR`/`PROCEDURE` section in a declaration block,
    /// in whatever order and repetition the source actually uses.
    pub(crate) fn parse_declarations(&mut self) -> Result<Vec<Declaration>> {
        let mut decls = Vec::new();
        loop {
            match self.token.token {
                Token::Const => decls.extend(self.parse_const_section()?),
                Token::Var => decls.extend(self.parse_var_section()?),
                Token::Procedure => decls.push(Declaration::Proc(self.parse_proc_decl()?)),
                _ => break,
            }
        }
        Ok(decls)
    }

    fn parse_const_section(&mut self) -> Result<Vec<Declaration>> {
        self.expect(&Token::Const)?;
        let mut decls = Vec::new();
        loop {
            let (name, name_span) = self.expect_ident()?;
            self.expect(&Token::Eq)?;
            let value = self.parse_expression()?;
            let span = name_span + self.token.span;
            self.expect(&Token::Semi)?;
            decls.push(Declaration::Const(ConstDecl { name, value, span }));
            if !matches!(self.token.token, Token::Ident(_)) {
                break;
            }
        }
        Ok(decls)
    }

    fn parse_var_section(&mut self) -> Result<Vec<Declaration>> {
        self.expect(&Token::Var)?;
        let mut decls = Vec::new();
        loop {
            let mut names = vec![self.expect_ident()?];
            while self.eat(&Token::Comma) {
                names.push(self.expect_ident()?);
            }
            self.expect(&Token::Colon)?;
            let (ty, dims) = self.parse_type()?;
            let end = self.expect(&Token::Semi)?;
            for (name, name_span) in names {
                decls.push(Declaration::Var(VarDecl { name, ty, dims: dims.clone(), span: name_span + end }));
            }
            if !matches!(self.token.token, Token::Ident(_)) {
                break;
            }
        }
        Ok(decls)
    }

    fn parse_proc_decl(&mut self) -> Result<ProcDecl> {
        let start = self.expect(&Token::Procedure)?;
        let (name, _) = self.expect_ident()?;
        let parameters = if self.eat(&Token::LParen) {
            let params = self.parse_parameter_list()?;
            self.expect(&Token::RParen)?;
            params
        } else {
            Vec::new()
        };
        let return_type = if self.eat(&Token::Colon) {
            let (ty, _) = self.parse_type()?;
            Some(ty)
        } else {
            None
        };
        self.expect(&Token::Semi)?;
        let locals = self.parse_declarations()?;
        self.expect(&Token::Begin)?;
        let body = self.parse_statement_sequence()?;
        self.expect(&Token::End)?;
        let (_, end_span) = self.expect_ident()?;
        let end = self.expect(&Token::Semi)?;
        Ok(ProcDecl { name, parameters, return_type, locals, body, span: start + end_span + end })
    }

    fn parse_parameter_list(&mut self) -> Result<Vec<Parameter>> {
        let mut params = Vec::new();
        if self.check(&Token::RParen) {
            return Ok(params);
        }
        params.extend(self.parse_parameter_group()?);
        while self.eat(&Token::Semi) {
            params.extend(self.parse_parameter_group()?);
        }
        Ok(params)
    }

    fn parse_parameter_group(&mut self) -> Result<Vec<Parameter>> {
        let by_reference = self.eat(&Token::Var);
        let mut names = vec![self.expect_ident()?];
        while self.eat(&Token::Comma) {
            names.push(self.expect_ident()?);
        }
        self.expect(&Token::Colon)?;
        let (ty, dims) = self.parse_type()?;
        Ok(names
            .into_iter()
            .map(|(name, span)| Parameter { name, ty, dims: dims.clone(), by_reference, span })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modc_lexer::tokenize;

    fn parse_decls(src: &str) -> Vec<Declaration> {
        let tokens = tokenize(src).unwrap();
        let mut ctx = ParserContext::new(tokens);
        ctx.parse_declarations().unwrap()
    }

    #[test]
    fn var_section_desugars_name_list_into_one_decl_per_name() {
        let decls = parse_decls("VAR a, b: INTEGER;");
        assert_eq!(decls.len(), 2);
        assert!(decls.iter().all(|d| matches!(d, Declaration::Var(_))));
    }

    #[test]
    fn array_var_records_dims() {
        let decls = parse_decls("VAR grid: ARRAY 3, 4 OF INTEGER;");
        match &decls[0] {
            Declaration::Var(v) => assert_eq!(v.dims, vec![3, 4]),
            _ => panic!("expected a Var declaration"),
        }
    }

    #[test]
    fn procedure_with_by_reference_parameter() {
        let decls = parse_decls("PROCEDURE Bump(VAR x: INTEGER); BEGIN x := x + 1 END Bump;");
        match &decls[0] {
            Declaration::Proc(p) => {
                assert_eq!(p.parameters.len(), 1);
                assert!(p.parameters[0].by_reference);
            }
            _ => panic!("expected a Proc declaration"),
        }
    }
}
