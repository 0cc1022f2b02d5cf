use crate::format::format_argument;
use crate::scope::{new_cell, Cell, ScopeStack};
use crate::value::Value;
use indexmap::IndexMap;
use modc_ast::{
    AssignTarget, BinaryOp, DataType, Declaration, Expression, ProcDecl, Program, Statement, UnaryOp,
};
use modc_errors::{Diagnostic, Result};
use modc_span::{Span, Symbol};

/// What a just-executed statement did, beyond mutating scope state: either
/// control falls through to the next statement, or a `RETURN` was hit and
/// its value (if any) needs to propagate up through every enclosing
/// `Compound`/`If`/`While`/`For` until it reaches the call that is waiting
/// for it.
enum Flow {
    Next,
    Returned(Option<Value>),
}

/// A tree-walking interpreter for one validated `Program`. Holds no
/// process-global state: every field is local to this instance, so running
/// the same program twice in one process (or two different programs back
/// to back) starts from a clean slate each time.
pub struct Evaluator<'p> {
    procedures: IndexMap<Symbol, &'p ProcDecl>,
    output: String,
}

impl<'p> Default for Evaluator<'p> {
    fn default() -> Self {
        Self { procedures: IndexMap::new(), output: String::new() }
    }
}

impl<'p> Evaluator<'p> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes `program`'s module body and returns the concatenated output
    /// stream produced by `Write`/`WriteLn`.
    pub fn run(&mut self, program: &'p Program) -> Result<String> {
        tracing::debug!(module = %program.name, "starting evaluation");
        self.register_procedures(&program.declarations);
        let mut scopes = ScopeStack::new();
        self.bind_locals(&program.declarations, &mut scopes)?;
        self.exec_sequence(&program.statements, &mut scopes)?;
        let output = std::mem::take(&mut self.output);
        tracing::debug!(bytes = output.len(), "evaluation complete");
        Ok(output)
    }

    /// Procedures live in one flat table keyed by name regardless of
    /// nesting depth, mirroring the analyzer's `ProcedureTable` but storing
    /// a reference to the declaration itself rather than just its
    /// signature, since the evaluator needs to walk the body.
    fn register_procedures(&mut self, decls: &'p [Declaration]) {
        for decl in decls {
            if let Declaration::Proc(proc) = decl {
                self.procedures.insert(proc.name, proc);
                self.register_procedures(&proc.locals);
            }
        }
    }

    fn bind_locals(&mut self, decls: &[Declaration], scopes: &mut ScopeStack) -> Result<()> {
        for decl in decls {
            match decl {
                Declaration::Const(c) => {
                    let value = self.eval_expression(&c.value, scopes)?;
                    scopes.declare(c.name, new_cell(value));
                }
                Declaration::Var(v) => {
                    scopes.declare(v.name, new_cell(Value::default_for(v.ty, &v.dims)));
                }
                Declaration::Proc(_) => {}
            }
        }
        Ok(())
    }

    fn exec_sequence(&mut self, statements: &[Statement], scopes: &mut ScopeStack) -> Result<Flow> {
        for stmt in statements {
            match self.exec_statement(stmt, scopes)? {
                Flow::Next => {}
                returned => return Ok(returned),
            }
        }
        Ok(Flow::Next)
    }

    fn exec_statement(&mut self, stmt: &Statement, scopes: &mut ScopeStack) -> Result<Flow> {
        match stmt {
            Statement::Assign(a) => {
                let value = self.eval_expression(&a.value, scopes)?;
                self.store(&a.target, value, scopes)?;
                Ok(Flow::Next)
            }
            Statement::ProcCall(c) => {
                self.call_procedure(c.name, &c.args, c.span, scopes)?;
                Ok(Flow::Next)
            }
            Statement::If(i) => {
                let cond = self.eval_expression(&i.cond, scopes)?;
                if cond.is_truthy() {
                    self.exec_statement(&i.then_branch, scopes)
                } else if let Some(else_branch) = &i.else_branch {
                    self.exec_statement(else_branch, scopes)
                } else {
                    Ok(Flow::Next)
                }
            }
            Statement::While(w) => {
                loop {
                    let cond = self.eval_expression(&w.cond, scopes)?;
                    if !cond.is_truthy() {
                        break;
                    }
                    match self.exec_statement(&w.body, scopes)? {
                        Flow::Next => {}
                        returned => return Ok(returned),
                    }
                }
                Ok(Flow::Next)
            }
            Statement::For(f) => {
                let start = self.require_integer(&f.start, scopes)?;
                let end = self.require_integer(&f.end, scopes)?;
                let cell = self.resolve(f.var, f.span, scopes)?;
                let mut i = start;
                while i <= end {
                    *cell.borrow_mut() = Value::Integer(i);
                    match self.exec_statement(&f.body, scopes)? {
                        Flow::Next => {}
                        returned => return Ok(returned),
                    }
                    i += 1;
                }
                Ok(Flow::Next)
            }
            Statement::Compound(c) => self.exec_sequence(&c.statements, scopes),
            Statement::Return(r) => {
                let value = match &r.value {
                    Some(e) => Some(self.eval_expression(e, scopes)?),
                    None => None,
                };
                Ok(Flow::Returned(value))
            }
        }
    }

    fn store(&mut self, target: &AssignTarget, value: Value, scopes: &mut ScopeStack) -> Result<()> {
        match target {
            AssignTarget::Name(name, span) => {
                let cell = self.resolve(*name, *span, scopes)?;
                let target_ty = cell.borrow().ty();
                *cell.borrow_mut() = value.widen_to(target_ty);
                Ok(())
            }
            AssignTarget::ArrayElement { name, indices, span } => {
                let index_values = self.eval_indices(indices, scopes)?;
                let cell = self.resolve(*name, *span, scopes)?;
                let mut borrowed = cell.borrow_mut();
                match &mut *borrowed {
                    Value::Array(array) => {
                        let offset = array
                            .flat_index(&index_values)
                            .map_err(|message| Diagnostic::runtime(message, *span))?;
                        let element_ty = array.element_ty;
                        array.data[offset] = value.widen_to(element_ty);
                        Ok(())
                    }
                    other => Err(Diagnostic::runtime(format!("'{name}' ({}) is not an array", other.ty()), *span)),
                }
            }
        }
    }

    fn eval_indices(&mut self, indices: &[Expression], scopes: &mut ScopeStack) -> Result<Vec<i64>> {
        indices.iter().map(|index| self.require_integer(index, scopes)).collect()
    }

    fn require_integer(&mut self, expr: &Expression, scopes: &mut ScopeStack) -> Result<i64> {
        let value = self.eval_expression(expr, scopes)?;
        value.as_integer().ok_or_else(|| Diagnostic::runtime(format!("expected INTEGER, found {}", value.ty()), expr.span()))
    }

    fn resolve(&self, name: Symbol, span: Span, scopes: &ScopeStack) -> Result<Cell> {
        scopes.resolve(name).ok_or_else(|| Diagnostic::runtime(format!("undeclared name '{name}'"), span))
    }

    fn eval_expression(&mut self, expr: &Expression, scopes: &mut ScopeStack) -> Result<Value> {
        match expr {
            Expression::Literal(e) => Ok(match &e.value {
                modc_ast::LiteralValue::Integer(i) => Value::Integer(*i),
                modc_ast::LiteralValue::Real(r) => Value::Real(*r),
                modc_ast::LiteralValue::Str(s) => Value::Str(s.clone()),
            }),
            Expression::Variable(e) => {
                let cell = self.resolve(e.name, e.span, scopes)?;
                let value = cell.borrow().clone();
                Ok(value)
            }
            Expression::ArrayAccess(e) => {
                let index_values = self.eval_indices(&e.indices, scopes)?;
                let cell = self.resolve(e.name, e.span, scopes)?;
                let borrowed = cell.borrow();
                match &*borrowed {
                    Value::Array(array) => {
                        let offset = array
                            .flat_index(&index_values)
                            .map_err(|message| Diagnostic::runtime(message, e.span))?;
                        Ok(array.data[offset].clone())
                    }
                    other => Err(Diagnostic::runtime(format!("'{}' ({}) is not an array", e.name, other.ty()), e.span)),
                }
            }
            Expression::Call(e) => {
                let result = self.call_procedure(e.name, &e.args, e.span, scopes)?;
                result.ok_or_else(|| Diagnostic::runtime(format!("'{}' does not return a value", e.name), e.span))
            }
            Expression::Binary(e) => {
                let left = self.eval_expression(&e.left, scopes)?;
                let right = self.eval_expression(&e.right, scopes)?;
                self.eval_binary(e.op, left, right, e.span)
            }
            Expression::Unary(e) => {
                let operand = self.eval_expression(&e.operand, scopes)?;
                match (e.op, &operand) {
                    (UnaryOp::Plus, Value::Integer(_) | Value::Real(_)) => Ok(operand),
                    (UnaryOp::Minus, Value::Integer(i)) => Ok(Value::Integer(-i)),
                    (UnaryOp::Minus, Value::Real(r)) => Ok(Value::Real(-r)),
                    _ => Err(Diagnostic::runtime(
                        format!("unary +/- requires a numeric operand, found {}", operand.ty()),
                        e.span,
                    )),
                }
            }
        }
    }

    fn eval_binary(&self, op: BinaryOp, left: Value, right: Value, span: Span) -> Result<Value> {
        match op {
            BinaryOp::Add if left.ty() == DataType::String || right.ty() == DataType::String => {
                Ok(Value::Str(format!("{}{}", format_argument(&left), format_argument(&right))))
            }
            BinaryOp::Add => self.numeric_binary(left, right, span, |a, b| a + b, |a, b| a + b),
            BinaryOp::Sub => self.numeric_binary(left, right, span, |a, b| a - b, |a, b| a - b),
            BinaryOp::Mul => self.numeric_binary(left, right, span, |a, b| a * b, |a, b| a * b),
            BinaryOp::Div => {
                let (l, r) = self.as_reals(&left, &right, span)?;
                if r == 0.0 {
                    return Err(Diagnostic::runtime("division by zero".to_string(), span));
                }
                Ok(Value::Real(l / r))
            }
            BinaryOp::DivInt => {
                let (l, r) = self.as_integers(&left, &right, span)?;
                if r == 0 {
                    return Err(Diagnostic::runtime("division by zero".to_string(), span));
                }
                Ok(Value::Integer(l / r))
            }
            BinaryOp::Mod => {
                let (l, r) = self.as_integers(&left, &right, span)?;
                if r == 0 {
                    return Err(Diagnostic::runtime("division by zero".to_string(), span));
                }
                Ok(Value::Integer(l % r))
            }
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                let ordering = self.compare(&left, &right, span)?;
                let result = match op {
                    BinaryOp::Eq => ordering == std::cmp::Ordering::Equal,
                    BinaryOp::NotEq => ordering != std::cmp::Ordering::Equal,
                    BinaryOp::Lt => ordering == std::cmp::Ordering::Less,
                    BinaryOp::LtEq => ordering != std::cmp::Ordering::Greater,
                    BinaryOp::Gt => ordering == std::cmp::Ordering::Greater,
                    BinaryOp::GtEq => ordering != std::cmp::Ordering::Less,
                    _ => unreachable!(),
                };
                Ok(Value::Integer(result as i64))
            }
            BinaryOp::And => {
                let (l, r) = self.as_integers(&left, &right, span)?;
                Ok(Value::Integer(((l != 0) && (r != 0)) as i64))
            }
            BinaryOp::Or => {
                let (l, r) = self.as_integers(&left, &right, span)?;
                Ok(Value::Integer(((l != 0) || (r != 0)) as i64))
            }
        }
    }

    fn numeric_binary(
        &self,
        left: Value,
        right: Value,
        span: Span,
        int_op: impl Fn(i64, i64) -> i64,
        real_op: impl Fn(f64, f64) -> f64,
    ) -> Result<Value> {
        match (&left, &right) {
            (Value::Integer(l), Value::Integer(r)) => Ok(Value::Integer(int_op(*l, *r))),
            _ => {
                let (l, r) = self.as_reals(&left, &right, span)?;
                Ok(Value::Real(real_op(l, r)))
            }
        }
    }

    fn as_integers(&self, left: &Value, right: &Value, span: Span) -> Result<(i64, i64)> {
        match (left.as_integer(), right.as_integer()) {
            (Some(l), Some(r)) => Ok((l, r)),
            _ => Err(Diagnostic::runtime(
                format!("expected two INTEGER operands, found {} and {}", left.ty(), right.ty()),
                span,
            )),
        }
    }

    fn as_reals(&self, left: &Value, right: &Value, span: Span) -> Result<(f64, f64)> {
        match (left.as_real(), right.as_real()) {
            (Some(l), Some(r)) => Ok((l, r)),
            _ => Err(Diagnostic::runtime(
                format!("expected two numeric operands, found {} and {}", left.ty(), right.ty()),
                span,
            )),
        }
    }

    fn compare(&self, left: &Value, right: &Value, span: Span) -> Result<std::cmp::Ordering> {
        match (left, right) {
            (Value::Str(l), Value::Str(r)) => Ok(l.cmp(r)),
            _ => {
                let (l, r) = self.as_reals(left, right, span)?;
                l.partial_cmp(&r).ok_or_else(|| Diagnostic::runtime("NaN is not orderable".to_string(), span))
            }
        }
    }

    /// Dispatches a call, whether in statement or expression position.
    /// `Write`/`WriteLn` are handled before the procedure table lookup
    /// since they are not entries a user declaration could ever replace.
    fn call_procedure(
        &mut self,
        name: Symbol,
        args: &[Expression],
        span: Span,
        scopes: &mut ScopeStack,
    ) -> Result<Option<Value>> {
        if name == Symbol::intern("Write") {
            for arg in args {
                let value = self.eval_expression(arg, scopes)?;
                self.output.push_str(&format_argument(&value));
            }
            return Ok(None);
        }
        if name == Symbol::intern("WriteLn") {
            for arg in args {
                let value = self.eval_expression(arg, scopes)?;
                self.output.push_str(&format_argument(&value));
            }
            self.output.push('\n');
            return Ok(None);
        }

        let proc = *self
            .procedures
            .get(&name)
            .ok_or_else(|| Diagnostic::runtime(format!("undeclared procedure '{name}'"), span))?;

        let mut bound = Vec::with_capacity(proc.parameters.len());
        for (param, arg_expr) in proc.parameters.iter().zip(args) {
            let cell = if param.by_reference {
                match arg_expr {
                    Expression::Variable(v) => self.resolve(v.name, v.span, scopes)?,
                    _ => {
                        return Err(Diagnostic::runtime(
                            "a VAR parameter must be passed a bare variable name".to_string(),
                            arg_expr.span(),
                        ))
                    }
                }
            } else {
                let value = self.eval_expression(arg_expr, scopes)?;
                new_cell(value.widen_to(param.ty))
            };
            bound.push((param.name, cell));
        }

        scopes.push();
        for (name, cell) in bound {
            scopes.declare(name, cell);
        }
        self.bind_locals(&proc.locals, scopes)?;
        let flow = self.exec_sequence(&proc.body, scopes)?;
        scopes.pop();

        Ok(match flow {
            Flow::Returned(value) => value,
            Flow::Next => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str) -> String {
        let program = modc_parser::parse(src).expect("fixture must parse");
        let handler = modc_errors::emitter::Handler::new();
        modc_passes::analyze(&program, &handler);
        assert!(!handler.had_errors(), "fixture must be semantically clean");
        let mut evaluator = Evaluator::new();
        evaluator.run(&program).expect("fixture must evaluate without error")
    }

    #[test]
    fn hello_world() {
        let src = r#"
            MODULE H;
            VAR m: STRING;
            BEGIN
                m := "Hello, World!";
                Write(m);
                WriteLn()
            END H.
        "#;
        assert_eq!(run(src), "Hello, World!\n");
    }

    #[test]
    fn div_and_real_division_widen_correctly() {
        let src = r#"
            MODULE A;
            VAR x, y: INTEGER;
            BEGIN
                x := 7;
                y := 2;
                Write(x DIV y);
                Write(" ");
                Write(x / y);
                WriteLn()
            END A.
        "#;
        assert_eq!(run(src), "3 3.5\n");
    }

    #[test]
    fn for_loop_sums_one_through_ten() {
        let src = r#"
            MODULE S;
            VAR s, i: INTEGER;
            BEGIN
                s := 0;
                FOR i := 1 TO 10 DO
                    s := s + i
                END;
                Write(s)
            END S.
        "#;
        assert_eq!(run(src), "55");
    }

    #[test]
    fn two_dimensional_array_access() {
        let src = r#"
            MODULE G;
            VAR a: ARRAY 10, 10 OF INTEGER;
            VAR i, j: INTEGER;
            BEGIN
                FOR i := 0 TO 9 DO
                    FOR j := 0 TO 9 DO
                        a[i, j] := i * 10 + j
                    END
                END;
                Write(a[3, 4])
            END G.
        "#;
        assert_eq!(run(src), "34");
    }

    #[test]
    fn by_value_parameter_does_not_alias_the_caller() {
        let src = r#"
            MODULE P;
            VAR k: INTEGER;

            PROCEDURE Bump(x: INTEGER);
            BEGIN
                x := x + 1
            END Bump;

            BEGIN
                k := 5;
                Bump(k);
                Write(k)
            END P.
        "#;
        assert_eq!(run(src), "5");
    }

    #[test]
    fn by_reference_parameter_does_alias_the_caller() {
        let src = r#"
            MODULE P;
            VAR k: INTEGER;

            PROCEDURE Bump(VAR x: INTEGER);
            BEGIN
                x := x + 1
            END Bump;

            BEGIN
                k := 5;
                Bump(k);
                Write(k)
            END P.
        "#;
        assert_eq!(run(src), "6");
    }

    #[test]
    fn explicit_return_is_the_function_result() {
        let src = r#"
            MODULE F;
            VAR r: INTEGER;

            PROCEDURE Square(x: INTEGER): INTEGER;
            BEGIN
                RETURN x * x
            END Square;

            BEGIN
                r := Square(6);
                Write(r)
            END F.
        "#;
        assert_eq!(run(src), "36");
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        let program = modc_parser::parse(
            r#"
            MODULE D;
            VAR x, y: INTEGER;
            BEGIN
                x := 1;
                y := 0;
                Write(x DIV y)
            END D.
        "#,
        )
        .unwrap();
        let handler = modc_errors::emitter::Handler::new();
        modc_passes::analyze(&program, &handler);
        assert!(!handler.had_errors());
        let mut evaluator = Evaluator::new();
        let err = evaluator.run(&program).unwrap_err();
        assert_eq!(err.kind(), modc_errors::DiagnosticKind::Runtime);
    }

    #[test]
    fn out_of_bounds_subscript_is_a_runtime_error() {
        let program = modc_parser::parse(
            r#"
            MODULE B;
            VAR a: ARRAY 3 OF INTEGER;
            BEGIN
                Write(a[5])
            END B.
        "#,
        )
        .unwrap();
        let handler = modc_errors::emitter::Handler::new();
        modc_passes::analyze(&program, &handler);
        assert!(!handler.had_errors());
        let mut evaluator = Evaluator::new();
        let err = evaluator.run(&program).unwrap_err();
        assert_eq!(err.kind(), modc_errors::DiagnosticKind::Runtime);
    }

    #[test]
    fn rerunning_the_same_program_twice_produces_identical_output() {
        let src = "MODULE M; VAR s, i: INTEGER; BEGIN s := 0; FOR i := 1 TO 3 DO s := s + i END; Write(s) END M.";
        assert_eq!(run(src), run(src));
    }
}
