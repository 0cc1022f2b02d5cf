use crate::procedures::{ParamSignature, ProcKind, ProcSignature, ProcedureTable};
use crate::scope::{Binding, ScopeChain};
use modc_ast::{
    AssignTarget, BinaryOp, DataType, Declaration, Expression, ProcDecl, Program, Statement,
};
use modc_errors::emitter::Handler;
use modc_span::{Span, Symbol};

/// Walks a whole program once, registering every declaration into a scope
/// chain and flat procedure table and type-checking every statement and
/// expression against them. Diagnostics are accumulated in `handler` rather
/// than raised with `?`, so a single run reports every semantic error
/// instead of stopping at the first one.
pub struct SemanticAnalyzer<'h> {
    handler: &'h Handler,
    chain: ScopeChain,
    procedures: ProcedureTable,
}

/// Runs semantic analysis on `program`, reporting every error found into
/// `handler`. The caller checks `handler.had_errors()` to decide whether to
/// proceed to the evaluator or IR emitter.
pub fn analyze(program: &Program, handler: &Handler) {
    let mut analyzer =
        SemanticAnalyzer { handler, chain: ScopeChain::new(), procedures: ProcedureTable::with_builtins() };
    analyzer.run(program);
}

impl<'h> SemanticAnalyzer<'h> {
    fn run(&mut self, program: &Program) {
        self.register_declarations(&program.declarations);
        for stmt in &program.statements {
            self.check_statement(stmt, None);
        }
    }

    fn register_declarations(&mut self, decls: &[Declaration]) {
        for decl in decls {
            match decl {
                Declaration::Const(c) => {
                    let ty = self.check_expression(&c.value);
                    self.declare_or_report(c.name, Binding::Const(ty), c.span);
                }
                Declaration::Var(v) => {
                    self.declare_or_report(
                        v.name,
                        Binding::Var { ty: v.ty, dims: v.dims.clone() },
                        v.span,
                    );
                }
                Declaration::Proc(p) => self.register_procedure(p),
            }
        }
    }

    fn register_procedure(&mut self, proc: &ProcDecl) {
        let signature = ProcSignature {
            params: proc
                .parameters
                .iter()
                .map(|p| ParamSignature { ty: p.ty, dims: p.dims.clone(), by_reference: p.by_reference })
                .collect(),
            return_type: proc.return_type,
        };
        if !self.procedures.declare(proc.name, signature) {
            self.handler.emit_err(modc_errors::Diagnostic::semantic(
                format!("procedure '{}' is already declared", proc.name),
                proc.span,
            ));
        }

        self.chain.push();
        for param in &proc.parameters {
            self.declare_or_report(
                param.name,
                Binding::Var { ty: param.ty, dims: param.dims.clone() },
                param.span,
            );
        }
        self.register_declarations(&proc.locals);
        for stmt in &proc.body {
            self.check_statement(stmt, proc.return_type);
        }
        if proc.is_function() && !body_always_returns(&proc.body) {
            self.handler.emit_err(modc_errors::Diagnostic::semantic(
                format!("function '{}' does not return a value on every path", proc.name),
                proc.span,
            ));
        }
        self.chain.pop();
    }

    fn declare_or_report(&mut self, name: Symbol, binding: Binding, span: Span) {
        if !self.chain.declare(name, binding) {
            self.handler
                .emit_err(modc_errors::Diagnostic::semantic(format!("'{name}' is already declared in this scope"), span));
        }
    }

    fn check_statement(&mut self, stmt: &Statement, return_type: Option<DataType>) {
        match stmt {
            Statement::Assign(a) => {
                let value_ty = self.check_expression(&a.value);
                let target_ty = self.check_assign_target(&a.target);
                if let Some(target_ty) = target_ty {
                    if !value_ty.widens_to(target_ty) {
                        self.handler.emit_err(modc_errors::Diagnostic::semantic(
                            format!("cannot assign a {value_ty} value to a {target_ty} target"),
                            a.span,
                        ));
                    }
                }
            }
            Statement::ProcCall(c) => {
                self.check_call(c.name, &c.args, c.span);
            }
            Statement::If(i) => {
                self.check_condition(&i.cond);
                self.check_statement(&i.then_branch, return_type);
                if let Some(else_branch) = &i.else_branch {
                    self.check_statement(else_branch, return_type);
                }
            }
            Statement::While(w) => {
                self.check_condition(&w.cond);
                self.check_statement(&w.body, return_type);
            }
            Statement::For(f) => {
                match self.chain.resolve(f.var) {
                    Some(Binding::Var { ty: DataType::Integer, dims }) if dims.is_empty() => {}
                    Some(_) => self.handler.emit_err(modc_errors::Diagnostic::semantic(
                        format!("loop variable '{}' must be a scalar INTEGER", f.var),
                        f.span,
                    )),
                    None => self.handler.emit_err(modc_errors::Diagnostic::semantic(
                        format!("undeclared name '{}'", f.var),
                        f.span,
                    )),
                }
                let start_ty = self.check_expression(&f.start);
                let end_ty = self.check_expression(&f.end);
                for (label, ty) in [("start", start_ty), ("end", end_ty)] {
                    if !ty.widens_to(DataType::Integer) {
                        self.handler.emit_err(modc_errors::Diagnostic::semantic(
                            format!("FOR loop {label} bound must be INTEGER, found {ty}"),
                            f.span,
                        ));
                    }
                }
                self.check_statement(&f.body, return_type);
            }
            Statement::Compound(c) => {
                for stmt in &c.statements {
                    self.check_statement(stmt, return_type);
                }
            }
            Statement::Return(r) => match (return_type, &r.value) {
                (Some(rt), Some(value)) => {
                    let ty = self.check_expression(value);
                    if !ty.widens_to(rt) {
                        self.handler.emit_err(modc_errors::Diagnostic::semantic(
                            format!("RETURN value has type {ty}, expected {rt}"),
                            r.span,
                        ));
                    }
                }
                (Some(_), None) => self.handler.emit_err(modc_errors::Diagnostic::semantic(
                    "function must RETURN a value".to_string(),
                    r.span,
                )),
                (None, Some(_)) => self.handler.emit_err(modc_errors::Diagnostic::semantic(
                    "a procedure cannot RETURN a value".to_string(),
                    r.span,
                )),
                (None, None) => {}
            },
        }
    }

    fn check_assign_target(&mut self, target: &AssignTarget) -> Option<DataType> {
        match target {
            AssignTarget::Name(name, span) => match self.chain.resolve(*name) {
                Some(Binding::Var { ty, dims }) if dims.is_empty() => Some(*ty),
                Some(Binding::Var { .. }) => {
                    self.handler.emit_err(modc_errors::Diagnostic::semantic(
                        format!("'{name}' is an array; assign to an indexed element instead"),
                        *span,
                    ));
                    None
                }
                Some(Binding::Const(_)) => {
                    self.handler
                        .emit_err(modc_errors::Diagnostic::semantic(format!("cannot assign to constant '{name}'"), *span));
                    None
                }
                None => {
                    self.handler
                        .emit_err(modc_errors::Diagnostic::semantic(format!("undeclared name '{name}'"), *span));
                    None
                }
            },
            AssignTarget::ArrayElement { name, indices, span } => self.check_array_access(*name, indices, *span),
        }
    }

    fn check_array_access(&mut self, name: Symbol, indices: &[Expression], span: Span) -> Option<DataType> {
        let resolved = self.chain.resolve(name).cloned();
        let (ty, dims) = match resolved {
            Some(Binding::Var { ty, dims }) if !dims.is_empty() => (ty, dims),
            Some(Binding::Var { .. }) => {
                self.handler
                    .emit_err(modc_errors::Diagnostic::semantic(format!("'{name}' is not an array"), span));
                return None;
            }
            Some(Binding::Const(_)) => {
                self.handler
                    .emit_err(modc_errors::Diagnostic::semantic(format!("'{name}' is not an array variable"), span));
                return None;
            }
            None => {
                self.handler.emit_err(modc_errors::Diagnostic::semantic(format!("undeclared name '{name}'"), span));
                return None;
            }
        };
        if indices.len() != dims.len() {
            self.handler.emit_err(modc_errors::Diagnostic::semantic(
                format!("'{name}' has {} dimension(s), but {} index/indices were given", dims.len(), indices.len()),
                span,
            ));
        }
        for index in indices {
            let index_ty = self.check_expression(index);
            if !index_ty.widens_to(DataType::Integer) {
                self.handler.emit_err(modc_errors::Diagnostic::semantic(
                    format!("array index must be INTEGER, found {index_ty}"),
                    index.span(),
                ));
            }
        }
        Some(ty)
    }

    fn check_condition(&mut self, cond: &Expression) {
        let ty = self.check_expression(cond);
        if !ty.widens_to(DataType::Integer) {
            self.handler.emit_err(modc_errors::Diagnostic::semantic(
                format!("condition must be INTEGER, found {ty}"),
                cond.span(),
            ));
        }
    }

    /// Checks a call (statement or expression position). `Write`/`WriteLn`
    /// are variadic and type-agnostic: every argument is still individually
    /// type-checked (for undeclared names etc.) but arity and per-parameter
    /// types are not.
    fn check_call(&mut self, name: Symbol, args: &[Expression], span: Span) -> Option<DataType> {
        let arg_types: Vec<DataType> = args.iter().map(|a| self.check_expression(a)).collect();
        match self.procedures.get(name) {
            Some(ProcKind::Builtin) => None,
            Some(ProcKind::User(sig)) => {
                let sig = sig.clone();
                if sig.params.len() != arg_types.len() {
                    self.handler.emit_err(modc_errors::Diagnostic::semantic(
                        format!("'{name}' expects {} argument(s), but {} were given", sig.params.len(), arg_types.len()),
                        span,
                    ));
                }
                for (param, arg_ty) in sig.params.iter().zip(arg_types.iter()) {
                    if !arg_ty.widens_to(param.ty) {
                        self.handler.emit_err(modc_errors::Diagnostic::semantic(
                            format!("argument to '{name}' has type {arg_ty}, expected {}", param.ty),
                            span,
                        ));
                    }
                }
                sig.return_type
            }
            None => {
                self.handler.emit_err(modc_errors::Diagnostic::semantic(format!("undeclared procedure '{name}'"), span));
                None
            }
        }
    }

    fn check_expression(&mut self, expr: &Expression) -> DataType {
        match expr {
            Expression::Literal(e) => e.ty,
            Expression::Variable(e) => match self.chain.resolve(e.name) {
                Some(Binding::Const(ty)) => *ty,
                Some(Binding::Var { ty, dims }) if dims.is_empty() => *ty,
                Some(Binding::Var { .. }) => {
                    self.handler.emit_err(modc_errors::Diagnostic::semantic(
                        format!("'{}' is an array; index it to use its elements", e.name),
                        e.span,
                    ));
                    DataType::Integer
                }
                None => {
                    self.handler
                        .emit_err(modc_errors::Diagnostic::semantic(format!("undeclared name '{}'", e.name), e.span));
                    DataType::Integer
                }
            },
            Expression::ArrayAccess(e) => {
                self.check_array_access(e.name, &e.indices, e.span).unwrap_or(DataType::Integer)
            }
            Expression::Call(e) => match self.check_call(e.name, &e.args, e.span) {
                Some(ty) => ty,
                None => {
                    if self.procedures.get(e.name).is_some() {
                        self.handler.emit_err(modc_errors::Diagnostic::semantic(
                            format!("'{}' does not return a value and cannot be used in an expression", e.name),
                            e.span,
                        ));
                    }
                    DataType::Integer
                }
            },
            Expression::Binary(e) => {
                let lty = self.check_expression(&e.left);
                let rty = self.check_expression(&e.right);
                self.check_binary(e.op, lty, rty, e.span)
            }
            Expression::Unary(e) => {
                let ty = self.check_expression(&e.operand);
                if !matches!(ty, DataType::Integer | DataType::Real) {
                    self.handler.emit_err(modc_errors::Diagnostic::semantic(
                        format!("unary +/- requires a numeric operand, found {ty}"),
                        e.span,
                    ));
                }
                ty
            }
        }
    }

    fn check_binary(&mut self, op: BinaryOp, lty: DataType, rty: DataType, span: Span) -> DataType {
        let is_numeric = |t: DataType| matches!(t, DataType::Integer | DataType::Real);
        match op {
            BinaryOp::Add if lty == DataType::String || rty == DataType::String => DataType::String,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => {
                if !is_numeric(lty) || !is_numeric(rty) {
                    self.report_operand_mismatch(op, lty, rty, span);
                    return DataType::Integer;
                }
                if lty == DataType::Integer && rty == DataType::Integer {
                    DataType::Integer
                } else {
                    DataType::Real
                }
            }
            BinaryOp::Div => {
                if !is_numeric(lty) || !is_numeric(rty) {
                    self.report_operand_mismatch(op, lty, rty, span);
                }
                DataType::Real
            }
            BinaryOp::DivInt | BinaryOp::Mod => {
                if lty != DataType::Integer || rty != DataType::Integer {
                    self.handler.emit_err(modc_errors::Diagnostic::semantic(
                        format!("'{}' requires two INTEGER operands", op.symbol()),
                        span,
                    ));
                }
                DataType::Integer
            }
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                if !lty.compatible_with(rty) {
                    self.report_operand_mismatch(op, lty, rty, span);
                }
                DataType::Integer
            }
            BinaryOp::And | BinaryOp::Or => {
                if lty != DataType::Integer || rty != DataType::Integer {
                    self.handler.emit_err(modc_errors::Diagnostic::semantic(
                        format!("'{}' requires two INTEGER operands", op.symbol()),
                        span,
                    ));
                }
                DataType::Integer
            }
        }
    }

    fn report_operand_mismatch(&self, op: BinaryOp, lty: DataType, rty: DataType, span: Span) {
        self.handler.emit_err(modc_errors::Diagnostic::semantic(
            format!("'{}' cannot be applied to {lty} and {rty}", op.symbol()),
            span,
        ));
    }
}

/// Structural "does every path return" check used to flag functions that can
/// fall off their end without producing a value. Conservative: loops are
/// never assumed to execute, so a `RETURN` only inside a `WHILE`/`FOR` body
/// does not count.
fn body_always_returns(body: &[Statement]) -> bool {
    match body.last() {
        Some(stmt) => statement_always_returns(stmt),
        None => false,
    }
}

fn statement_always_returns(stmt: &Statement) -> bool {
    match stmt {
        Statement::Return(_) => true,
        Statement::Compound(c) => body_always_returns(&c.statements),
        Statement::If(i) => match &i.else_branch {
            Some(else_branch) => statement_always_returns(&i.then_branch) && statement_always_returns(else_branch),
            None => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modc_errors::DiagnosticKind;

    fn analyze_src(src: &str) -> Vec<modc_errors::Diagnostic> {
        let program = modc_parser::parse(src).expect("fixture must parse");
        let handler = Handler::new();
        analyze(&program, &handler);
        handler.take_diagnostics()
    }

    #[test]
    fn clean_program_has_no_diagnostics() {
        let src = r#"
            MODULE Sums;
            VAR total, i: INTEGER;
            BEGIN
                total := 0;
                FOR i := 1 TO 10 DO
                    total := total + i
                END
            END Sums.
        "#;
        assert!(analyze_src(src).is_empty());
    }

    #[test]
    fn assigning_real_to_integer_is_an_error() {
        let src = r#"
            MODULE M;
            VAR x: INTEGER;
            BEGIN
                x := 3.5
            END M.
        "#;
        let diags = analyze_src(src);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind(), DiagnosticKind::Semantic);
    }

    #[test]
    fn undeclared_name_is_reported() {
        let src = "MODULE M; BEGIN y := 1 END M.";
        let diags = analyze_src(src);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn three_independent_errors_match_the_redeclare_mismatch_undefined_scenario() {
        let src = r#"
            MODULE M;
            VAR x: INTEGER;
            VAR x: REAL;
            BEGIN
                x := 3;
                y := 1;
                Undefined(y)
            END M.
        "#;
        assert_eq!(analyze_src(src).len(), 3);
    }

    #[test]
    fn array_index_arity_mismatch_is_reported() {
        let src = r#"
            MODULE M;
            VAR grid: ARRAY 3, 3 OF INTEGER;
            BEGIN
                grid[1] := 0
            END M.
        "#;
        assert_eq!(analyze_src(src).len(), 1);
    }

    #[test]
    fn function_missing_a_return_on_every_path_is_reported() {
        let src = r#"
            MODULE M;
            PROCEDURE F(): INTEGER;
            BEGIN
                IF 1 THEN
                    RETURN 1
                END
            END F;
            BEGIN END M.
        "#;
        assert_eq!(analyze_src(src).len(), 1);
    }

    #[test]
    fn write_and_writeln_accept_any_arity_and_types() {
        let src = r#"
            MODULE M;
            VAR m: STRING;
            BEGIN
                m := "Hello, World!";
                Write(m);
                WriteLn()
            END M.
        "#;
        assert!(analyze_src(src).is_empty());
    }

    #[test]
    fn string_concatenation_with_plus_is_allowed() {
        let src = r#"
            MODULE M;
            VAR greeting: STRING;
            BEGIN
                greeting := "Count: " + 5
            END M.
        "#;
        assert!(analyze_src(src).is_empty());
    }
}
