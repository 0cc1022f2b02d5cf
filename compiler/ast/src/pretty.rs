//! Renders a `Program` back into valid Modc source text. Used to exercise
//! the lex → parse → print → re-lex → re-parse round trip: every binary
//! and unary expression is printed fully parenthesized so the printed form
//! reparses to the exact same tree shape regardless of what the original
//! source's own parenthesization looked like.

use crate::declarations::{ConstDecl, Declaration, Parameter, ProcDecl, VarDecl};
use crate::expressions::{Expression, LiteralValue, UnaryOp};
use crate::program::Program;
use crate::statements::{AssignTarget, Statement};
use crate::types::DataType;
use std::fmt::Write as _;

pub fn print_tree(program: &Program) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "MODULE {};", program.name);
    for decl in &program.declarations {
        out.push_str(&print_declaration(decl));
    }
    out.push_str("BEGIN\n");
    out.push_str(&print_sequence(&program.statements));
    let _ = writeln!(out, "\nEND {}.", program.name);
    out
}

fn print_declaration(decl: &Declaration) -> String {
    match decl {
        Declaration::Const(c) => print_const(c),
        Declaration::Var(v) => print_var(v),
        Declaration::Proc(p) => print_proc(p),
    }
}

fn print_const(c: &ConstDecl) -> String {
    format!("CONST {} = {};\n", c.name, print_expr(&c.value))
}

fn print_type(ty: DataType, dims: &[u32]) -> String {
    if dims.is_empty() {
        ty.to_string()
    } else {
        let dims = dims.iter().map(u32::to_string).collect::<Vec<_>>().join(", ");
        format!("ARRAY {dims} OF {ty}")
    }
}

fn print_var(v: &VarDecl) -> String {
    format!("VAR {}: {};\n", v.name, print_type(v.ty, &v.dims))
}

fn print_param(p: &Parameter) -> String {
    let prefix = if p.by_reference { "VAR " } else { "" };
    format!("{prefix}{}: {}", p.name, print_type(p.ty, &p.dims))
}

fn print_proc(p: &ProcDecl) -> String {
    let params = p.parameters.iter().map(print_param).collect::<Vec<_>>().join("; ");
    let ret = p.return_type.map(|t| format!(": {t}")).unwrap_or_default();
    let mut out = String::new();
    let _ = writeln!(out, "PROCEDURE {}({params}){ret};", p.name);
    for local in &p.locals {
        out.push_str(&print_declaration(local));
    }
    out.push_str("BEGIN\n");
    out.push_str(&print_sequence(&p.body));
    let _ = writeln!(out, "\nEND {};", p.name);
    out
}

/// Joins a flat statement sequence the way `parse_statement_sequence`
/// expects it back: statements separated by `;`, no enclosing `BEGIN/END`.
fn print_sequence(statements: &[Statement]) -> String {
    statements.iter().map(print_statement).collect::<Vec<_>>().join(";\n")
}

/// Prints an `IF`/`WHILE`/`FOR` body. The parser always wraps such a body
/// in a synthetic `Statement::Compound` (see `parse_sequence_as_one_statement`)
/// even when the source wrote a single bare statement, so this must unwrap
/// that one layer and print the inner sequence flat — printing it as a
/// literal `BEGIN … END` block would reparse into an extra nested Compound
/// that was never there originally.
fn print_body(stmt: &Statement) -> String {
    match stmt {
        Statement::Compound(c) => print_sequence(&c.statements),
        other => print_statement(other),
    }
}

fn print_statement(stmt: &Statement) -> String {
    match stmt {
        Statement::Assign(a) => format!("{} := {}", print_target(&a.target), print_expr(&a.value)),
        Statement::ProcCall(c) => {
            let args = c.args.iter().map(print_expr).collect::<Vec<_>>().join(", ");
            format!("{}({args})", c.name)
        }
        Statement::If(i) => {
            let mut s = format!("IF {} THEN\n{}", print_expr(&i.cond), print_body(&i.then_branch));
            if let Some(else_branch) = &i.else_branch {
                let _ = write!(s, "\nELSE\n{}", print_body(else_branch));
            }
            s.push_str("\nEND");
            s
        }
        Statement::While(w) => format!("WHILE {} DO\n{}\nEND", print_expr(&w.cond), print_body(&w.body)),
        Statement::For(f) => format!(
            "FOR {} := {} TO {} DO\n{}\nEND",
            f.var,
            print_expr(&f.start),
            print_expr(&f.end),
            print_body(&f.body)
        ),
        Statement::Compound(c) => format!("BEGIN\n{}\nEND", print_sequence(&c.statements)),
        Statement::Return(r) => match &r.value {
            Some(v) => format!("RETURN {}", print_expr(v)),
            None => "RETURN".to_string(),
        },
    }
}

fn print_target(target: &AssignTarget) -> String {
    match target {
        AssignTarget::Name(name, _) => name.to_string(),
        AssignTarget::ArrayElement { name, indices, .. } => {
            let indices = indices.iter().map(print_expr).collect::<Vec<_>>().join(", ");
            format!("{name}[{indices}]")
        }
    }
}

/// Every binary/unary node is printed fully parenthesized; only this makes
/// the round trip exact, since the printed text no longer carries the
/// original token positions the precedence cascade used to disambiguate.
fn print_expr(expr: &Expression) -> String {
    match expr {
        Expression::Literal(l) => match &l.value {
            LiteralValue::Integer(v) => v.to_string(),
            LiteralValue::Real(v) => format!("{v:?}"),
            LiteralValue::Str(s) => format!("\"{s}\""),
        },
        Expression::Variable(v) => v.name.to_string(),
        Expression::ArrayAccess(a) => {
            let indices = a.indices.iter().map(print_expr).collect::<Vec<_>>().join(", ");
            format!("{}[{indices}]", a.name)
        }
        Expression::Call(c) => {
            let args = c.args.iter().map(print_expr).collect::<Vec<_>>().join(", ");
            format!("{}({args})", c.name)
        }
        Expression::Binary(b) => format!("({} {} {})", print_expr(&b.left), b.op.symbol(), print_expr(&b.right)),
        Expression::Unary(u) => {
            let sign = match u.op {
                UnaryOp::Plus => "+",
                UnaryOp::Minus => "-",
            };
            format!("({sign}{})", print_expr(&u.operand))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declarations::Declaration;

    #[test]
    fn prints_a_minimal_module() {
        let program = Program::new(modc_span::Symbol::intern("Empty"), Vec::new(), Vec::new());
        let printed = print_tree(&program);
        assert!(printed.starts_with("MODULE Empty;"));
        assert!(printed.trim_end().ends_with("END Empty."));
    }

    #[test]
    fn const_and_var_declarations_render() {
        let program = Program::new(
            modc_span::Symbol::intern("M"),
            vec![
                Declaration::Const(ConstDecl {
                    name: modc_span::Symbol::intern("Limit"),
                    value: Expression::Literal(crate::expressions::LiteralExpr {
                        value: LiteralValue::Integer(10),
                        ty: DataType::Integer,
                        span: modc_span::Span::dummy(),
                    }),
                    span: modc_span::Span::dummy(),
                }),
                Declaration::Var(VarDecl {
                    name: modc_span::Symbol::intern("total"),
                    ty: DataType::Integer,
                    dims: Vec::new(),
                    span: modc_span::Span::dummy(),
                }),
            ],
            Vec::new(),
        );
        let printed = print_tree(&program);
        assert!(printed.contains("CONST Limit = 10;"));
        assert!(printed.contains("VAR total: INTEGER;"));
    }
}
