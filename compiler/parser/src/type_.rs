use crate::context::ParserContext;
use modc_ast::DataType;
use modc_errors::Result;
use modc_lexer::Token;

impl ParserContext {
    /// Parses a type reference: a scalar type keyword, or
    /// `ARRAY dim {, dim} OF <scalar type>`.
    pub(crate) fn parse_type(&mut self) -> Result<(DataType, Vec<u32>)> {
        if self.eat(&Token::Array) {
            let mut dims = vec![self.parse_dimension()?];
            while self.eat(&Token::Comma) {
                dims.push(self.parse_dimension()?);
            }
            self.expect(&Token::Of)?;
            let (elem, _) = self.parse_scalar_type()?;
            return Ok((elem, dims));
        }
        let (ty, _) = self.parse_scalar_type()?;
        Ok((ty, Vec::new()))
    }

    fn parse_dimension(&mut self) -> Result<u32> {
        match self.token.token.clone() {
            Token::IntLit(digits) => {
                self.bump();
                digits
                    .parse::<u32>()
                    .map_err(|_| self.unexpected("an array dimension that fits in u32"))
            }
            _ => Err(self.unexpected("an array dimension (integer literal)")),
        }
    }

    fn parse_scalar_type(&mut self) -> Result<(DataType, ())> {
        let ty = match self.token.token {
            Token::Integer => DataType::Integer,
            Token::Real => DataType::Real,
            Token::StringKw => DataType::String,
            _ => return Err(self.unexpected("a type (INTEGER, REAL, STRING, or ARRAY)")),
        };
        self.bump();
        Ok((ty, ()))
    }
}
