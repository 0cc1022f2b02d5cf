use crate::locals::{LocalSlot, LocalTable};
use crate::types::IrType;
use crate::value::IrValue;
use indexmap::IndexMap;
use modc_ast::{
    AssignTarget, BinaryExpr, BinaryOp, CompoundStmt, DataType, Declaration, Expression, ForStmt, IfStmt, LiteralExpr,
    LiteralValue, Parameter, ProcDecl, Program, Statement, UnaryExpr, UnaryOp, VariableExpr, WhileStmt,
};
use modc_span::Symbol;
use std::fmt::Write as _;

/// Lowers a validated [`Program`] to the textual SSA-like IR described by
/// the IR Emitter section of the language design: `alloca`/`load`/`store`
/// for every stack slot, labeled basic blocks for control flow, and one
/// external variadic call per `Write`/`WriteLn` argument.
///
/// Global `CONST`/`VAR` declarations become true `@name` globals rather than
/// `main`'s stack slots, so every procedure (not just `main`) can reach
/// them directly; a nested procedure reaching into its *enclosing
/// procedure's* locals (legal per the scope-chain rules the analyzer
/// enforces) has no equivalent here, since that would need a static link or
/// closure conversion this emitter does not implement. None of the worked
/// scenarios exercise that case.
pub struct IrEmitter<'p> {
    procedures: IndexMap<Symbol, &'p ProcDecl>,
    strings: IndexMap<String, String>,
    global_consts: IndexMap<Symbol, IrValue>,
    globals: LocalTable,
    consts: IndexMap<Symbol, IrValue>,
    locals: LocalTable,
    next_value: u64,
    next_construct: u64,
}

pub fn emit_program(program: &Program) -> String {
    tracing::debug!(module = %program.name, "lowering module to IR");
    let mut emitter = IrEmitter {
        procedures: IndexMap::new(),
        strings: IndexMap::new(),
        global_consts: IndexMap::new(),
        globals: LocalTable::new(),
        consts: IndexMap::new(),
        locals: LocalTable::new(),
        next_value: 0,
        next_construct: 0,
    };
    emitter.intern_string("");
    emitter.intern_string("%d");
    emitter.intern_string("%f");
    emitter.intern_string("%s");
    emitter.intern_string("\n");
    emitter.collect_procedures(&program.declarations);
    emitter.collect_globals(&program.declarations);
    emitter.collect_strings_decls(&program.declarations);
    emitter.collect_strings_stmts(&program.statements);

    let mut out = String::new();
    let _ = writeln!(out, "; module {}", program.name);
    let _ = writeln!(out, "declare i32 @printf(i8*, ...)");
    let _ = writeln!(out);
    emitter.emit_global_section(&mut out);

    emitter.emit_procedures(&program.declarations, &mut out);
    emitter.emit_main(program, &mut out);
    emitter.emit_string_globals(&mut out);
    tracing::debug!(bytes = out.len(), "IR emission complete");
    out
}

impl<'p> IrEmitter<'p> {
    fn fresh_value(&mut self, ty: IrType) -> IrValue {
        self.next_value += 1;
        IrValue::register(format!("%t{}", self.next_value), ty)
    }

    fn fresh_suffix(&mut self) -> u64 {
        self.next_construct += 1;
        self.next_construct
    }

    fn intern_string(&mut self, text: &str) -> String {
        if let Some(name) = self.strings.get(text) {
            return name.clone();
        }
        let name = format!("@.str.{}", self.strings.len());
        self.strings.insert(text.to_string(), name.clone());
        name
    }

    fn collect_procedures(&mut self, decls: &'p [Declaration]) {
        for decl in decls {
            if let Declaration::Proc(proc) = decl {
                self.procedures.insert(proc.name, proc);
                self.collect_procedures(&proc.locals);
            }
        }
    }

    fn collect_globals(&mut self, decls: &[Declaration]) {
        for decl in decls {
            match decl {
                Declaration::Const(c) => {
                    let value = self.fold_const(&c.value);
                    self.global_consts.insert(c.name, value);
                }
                Declaration::Var(v) => {
                    let register = format!("@{}", v.name);
                    self.globals.declare(v.name, LocalSlot { register, ty: v.ty, dims: v.dims.clone() });
                }
                Declaration::Proc(_) => {}
            }
        }
    }

    fn collect_strings_decls(&mut self, decls: &[Declaration]) {
        for decl in decls {
            match decl {
                Declaration::Const(c) => self.collect_strings_expr(&c.value),
                Declaration::Proc(p) => {
                    self.collect_strings_decls(&p.locals);
                    self.collect_strings_stmts(&p.body);
                }
                Declaration::Var(_) => {}
            }
        }
    }

    fn collect_strings_stmts(&mut self, stmts: &[Statement]) {
        for stmt in stmts {
            match stmt {
                Statement::Assign(s) => {
                    if let AssignTarget::ArrayElement { indices, .. } = &s.target {
                        for idx in indices {
                            self.collect_strings_expr(idx);
                        }
                    }
                    self.collect_strings_expr(&s.value);
                }
                Statement::ProcCall(s) => s.args.iter().for_each(|a| self.collect_strings_expr(a)),
                Statement::If(s) => {
                    self.collect_strings_expr(&s.cond);
                    self.collect_strings_stmts(std::slice::from_ref(&s.then_branch));
                    if let Some(e) = &s.else_branch {
                        self.collect_strings_stmts(std::slice::from_ref(e));
                    }
                }
                Statement::While(s) => {
                    self.collect_strings_expr(&s.cond);
                    self.collect_strings_stmts(std::slice::from_ref(&s.body));
                }
                Statement::For(s) => {
                    self.collect_strings_expr(&s.start);
                    self.collect_strings_expr(&s.end);
                    self.collect_strings_stmts(std::slice::from_ref(&s.body));
                }
                Statement::Compound(s) => self.collect_strings_stmts(&s.statements),
                Statement::Return(s) => {
                    if let Some(e) = &s.value {
                        self.collect_strings_expr(e);
                    }
                }
            }
        }
    }

    fn collect_strings_expr(&mut self, expr: &Expression) {
        match expr {
            Expression::Literal(l) => {
                if let LiteralValue::Str(s) = &l.value {
                    self.intern_string(s);
                }
            }
            Expression::Variable(_) => {}
            Expression::ArrayAccess(a) => a.indices.iter().for_each(|i| self.collect_strings_expr(i)),
            Expression::Call(c) => c.args.iter().for_each(|a| self.collect_strings_expr(a)),
            Expression::Binary(b) => {
                self.collect_strings_expr(&b.left);
                self.collect_strings_expr(&b.right);
            }
            Expression::Unary(u) => self.collect_strings_expr(&u.operand),
        }
    }

    fn emit_global_section(&self, out: &mut String) {
        for decl in self.globals.keys() {
            let slot = self.globals.get(decl).expect("just collected");
            if slot.is_array() {
                let elem = IrType::from_data_type(slot.ty).name();
                let _ = writeln!(
                    out,
                    "{} = global [{} x {}] zeroinitializer",
                    slot.register,
                    slot.element_count(),
                    elem
                );
            } else {
                let _ = writeln!(out, "{} = global {} {}", slot.register, IrType::from_data_type(slot.ty).name(), default_immediate(slot.ty));
            }
        }
        let _ = writeln!(out);
    }

    fn emit_string_globals(&self, out: &mut String) {
        for (text, name) in &self.strings {
            let escaped = llvm_escape(text);
            let _ = writeln!(out, "{} = private unnamed_addr constant [{} x i8] c\"{}\"", name, text.len() + 1, escaped);
        }
    }

    /// Emits every procedure reachable from `decls`, including ones nested
    /// inside another procedure's `locals` — `collect_procedures` already
    /// walks that far to populate the call-resolution table, so emission
    /// has to reach the same depth or a nested proc's call sites resolve to
    /// a `define` that was never written.
    fn emit_procedures(&mut self, decls: &'p [Declaration], out: &mut String) {
        for decl in decls {
            if let Declaration::Proc(proc) = decl {
                self.emit_procedure(proc, out);
                self.emit_procedures(&proc.locals, out);
            }
        }
    }

    fn emit_procedure(&mut self, proc: &'p ProcDecl, out: &mut String) {
        self.locals = LocalTable::new();
        self.consts = IndexMap::new();
        self.next_value = 0;

        let ret_ty = proc.return_type.map(IrType::from_data_type);
        let ret_name = ret_ty.map(|t| t.name()).unwrap_or("void");

        let params_sig: Vec<String> = proc
            .parameters
            .iter()
            .map(|p| {
                let base = IrType::from_data_type(p.ty).name();
                if p.by_reference || !p.dims.is_empty() {
                    format!("{}* %{}", base, p.name)
                } else {
                    format!("{} %{}", base, p.name)
                }
            })
            .collect();

        let _ = writeln!(out, "define {} @{}({}) {{", ret_name, proc.name, params_sig.join(", "));
        let _ = writeln!(out, "entry:");

        for param in &proc.parameters {
            self.declare_parameter(param, out);
        }
        for decl in &proc.locals {
            self.declare_local(decl, out);
        }

        let terminated = self.lower_sequence(&proc.body, out);
        if !terminated {
            if ret_ty.is_some() {
                let _ = writeln!(out, "  unreachable");
            } else {
                let _ = writeln!(out, "  ret void");
            }
        }
        let _ = writeln!(out, "}}");
        let _ = writeln!(out);
    }

    fn declare_parameter(&mut self, param: &Parameter, out: &mut String) {
        let ir_ty = IrType::from_data_type(param.ty);
        if param.by_reference || !param.dims.is_empty() {
            // The incoming pointer argument *is* the slot.
            self.locals.declare(param.name, LocalSlot { register: format!("%{}", param.name), ty: param.ty, dims: param.dims.clone() });
            return;
        }
        let slot_reg = format!("%{}.addr", param.name);
        let _ = writeln!(out, "  {} = alloca {}", slot_reg, ir_ty.name());
        let _ = writeln!(out, "  store {} %{}, {}* {}", ir_ty.name(), param.name, ir_ty.name(), slot_reg);
        self.locals.declare(param.name, LocalSlot { register: slot_reg, ty: param.ty, dims: vec![] });
    }

    fn declare_local(&mut self, decl: &Declaration, out: &mut String) {
        match decl {
            Declaration::Const(c) => {
                let value = self.fold_const(&c.value);
                self.consts.insert(c.name, value);
            }
            Declaration::Var(v) => {
                let ir_ty = IrType::from_data_type(v.ty).name();
                let slot_reg = format!("%{}", v.name);
                if v.is_array() {
                    let count: u32 = v.dims.iter().product();
                    let _ = writeln!(out, "  {} = alloca [{} x {}]", slot_reg, count, ir_ty);
                } else {
                    let _ = writeln!(out, "  {} = alloca {}", slot_reg, ir_ty);
                    let _ = writeln!(out, "  store {} {}, {}* {}", ir_ty, default_immediate(v.ty), ir_ty, slot_reg);
                }
                self.locals.declare(v.name, LocalSlot { register: slot_reg, ty: v.ty, dims: v.dims.clone() });
            }
            Declaration::Proc(_) => {}
        }
    }

    fn emit_main(&mut self, program: &Program, out: &mut String) {
        self.locals = LocalTable::new();
        self.consts = IndexMap::new();
        self.next_value = 0;

        let _ = writeln!(out, "define i32 @main() {{");
        let _ = writeln!(out, "entry:");
        // Module-level `CONST`/`VAR` were already registered as `@name`
        // globals by `collect_globals`; `main` reads and writes them
        // directly rather than re-declaring stack slots that would shadow
        // the same names every other function sees.
        self.lower_sequence(&program.statements, out);
        let _ = writeln!(out, "  ret i32 0");
        let _ = writeln!(out, "}}");
        let _ = writeln!(out);
    }

    fn slot_for(&self, name: Symbol) -> &LocalSlot {
        self.locals.get(name).or_else(|| self.globals.get(name)).expect("resolved name must have a slot")
    }

    fn resolve_const(&self, name: Symbol) -> Option<&IrValue> {
        self.consts.get(&name).or_else(|| self.global_consts.get(&name))
    }

    /// Lowers a statement sequence into `out`. Returns `true` if the
    /// sequence's final statement already emitted a block terminator (a
    /// `ret`), so the caller must not append one of its own.
    fn lower_sequence(&mut self, stmts: &[Statement], out: &mut String) -> bool {
        for stmt in stmts {
            if self.lower_statement(stmt, out) {
                return true;
            }
        }
        false
    }

    fn lower_statement(&mut self, stmt: &Statement, out: &mut String) -> bool {
        match stmt {
            Statement::Assign(s) => {
                let value = self.lower_expression(&s.value, out);
                self.store(&s.target, value, out);
                false
            }
            Statement::ProcCall(s) => {
                self.lower_call(s.name, &s.args, out);
                false
            }
            Statement::If(s) => self.lower_if(s, out),
            Statement::While(s) => self.lower_while(s, out),
            Statement::For(s) => self.lower_for(s, out),
            Statement::Compound(CompoundStmt { statements, .. }) => self.lower_sequence(statements, out),
            Statement::Return(s) => {
                match &s.value {
                    Some(expr) => {
                        let value = self.lower_expression(expr, out);
                        let _ = writeln!(out, "  ret {} {}", value.ty.name(), value.text);
                    }
                    None => {
                        let _ = writeln!(out, "  ret void");
                    }
                }
                true
            }
        }
    }

    fn store(&mut self, target: &AssignTarget, value: IrValue, out: &mut String) {
        match target {
            AssignTarget::Name(name, _) => {
                let slot = self.slot_for(*name).clone();
                let ir_ty = IrType::from_data_type(slot.ty);
                let coerced = self.coerce(value, ir_ty, out);
                let _ = writeln!(out, "  store {} {}, {}* {}", ir_ty.name(), coerced.text, ir_ty.name(), slot.register);
            }
            AssignTarget::ArrayElement { name, indices, .. } => {
                let slot = self.slot_for(*name).clone();
                let ir_ty = IrType::from_data_type(slot.ty);
                let addr = self.element_address(&slot, indices, out);
                let coerced = self.coerce(value, ir_ty, out);
                let _ = writeln!(out, "  store {} {}, {}* {}", ir_ty.name(), coerced.text, ir_ty.name(), addr);
            }
        }
    }

    /// Widens an `i32` operand up to `double` when the destination type
    /// demands it; a no-op otherwise since every other assignment in a
    /// validated program is already type-exact.
    fn coerce(&mut self, value: IrValue, target: IrType, out: &mut String) -> IrValue {
        if value.ty == target {
            return value;
        }
        if value.ty == IrType::I32 && target == IrType::Double {
            let dest = self.fresh_value(IrType::Double);
            let _ = writeln!(out, "  {} = sitofp i32 {} to double", dest.text, value.text);
            return dest;
        }
        value
    }

    fn element_address(&mut self, slot: &LocalSlot, indices: &[Expression], out: &mut String) -> String {
        let ir_ty = IrType::from_data_type(slot.ty);
        let flat = self.flat_index(&slot.dims, indices, out);
        let dest = self.fresh_value(ir_ty);
        let count = slot.element_count();
        let _ = writeln!(
            out,
            "  {} = getelementptr [{} x {}], [{} x {}]* {}, i32 0, i32 {}",
            dest.text,
            count,
            ir_ty.name(),
            count,
            ir_ty.name(),
            slot.register,
            flat.text
        );
        dest.text
    }

    /// Row-major flattening: for dims `[d0, d1, .., dn]` and indices `[i0,
    /// i1, .., in]`, `flat = i0*(d1*..*dn) + i1*(d2*..*dn) + .. + in`.
    fn flat_index(&mut self, dims: &[u32], indices: &[Expression], out: &mut String) -> IrValue {
        let mut acc: Option<IrValue> = None;
        for (axis, index_expr) in indices.iter().enumerate() {
            let idx = self.lower_expression(index_expr, out);
            let idx = self.coerce(idx, IrType::I32, out);
            let stride: u32 = dims[axis + 1..].iter().product();
            let term = if stride == 1 {
                idx
            } else {
                let dest = self.fresh_value(IrType::I32);
                let _ = writeln!(out, "  {} = mul i32 {}, {}", dest.text, idx.text, stride);
                dest
            };
            acc = Some(match acc {
                None => term,
                Some(prev) => {
                    let dest = self.fresh_value(IrType::I32);
                    let _ = writeln!(out, "  {} = add i32 {}, {}", dest.text, prev.text, term.text);
                    dest
                }
            });
        }
        acc.expect("array access always has at least one index")
    }

    fn lower_if(&mut self, s: &IfStmt, out: &mut String) -> bool {
        let suffix = self.fresh_suffix();
        let cond = self.lower_condition(&s.cond, out);
        let then_label = format!("then{suffix}");
        let else_label = format!("else{suffix}");
        let endif_label = format!("endif{suffix}");
        let has_else = s.else_branch.is_some();
        let _ = writeln!(
            out,
            "  br i1 {}, label %{}, label %{}",
            cond.text,
            then_label,
            if has_else { &else_label } else { &endif_label }
        );

        let _ = writeln!(out, "{then_label}:");
        let then_terminated = self.lower_statement(&s.then_branch, out);
        if !then_terminated {
            let _ = writeln!(out, "  br label %{endif_label}");
        }

        let else_terminated = if let Some(else_branch) = &s.else_branch {
            let _ = writeln!(out, "{else_label}:");
            let terminated = self.lower_statement(else_branch, out);
            if !terminated {
                let _ = writeln!(out, "  br label %{endif_label}");
            }
            terminated
        } else {
            false
        };

        let _ = writeln!(out, "{endif_label}:");
        then_terminated && has_else && else_terminated
    }

    fn lower_while(&mut self, s: &WhileStmt, out: &mut String) -> bool {
        let suffix = self.fresh_suffix();
        let start_label = format!("while_start{suffix}");
        let body_label = format!("while_body{suffix}");
        let end_label = format!("while_end{suffix}");

        let _ = writeln!(out, "  br label %{start_label}");
        let _ = writeln!(out, "{start_label}:");
        let cond = self.lower_condition(&s.cond, out);
        let _ = writeln!(out, "  br i1 {}, label %{}, label %{}", cond.text, body_label, end_label);

        let _ = writeln!(out, "{body_label}:");
        let terminated = self.lower_statement(&s.body, out);
        if !terminated {
            let _ = writeln!(out, "  br label %{start_label}");
        }
        let _ = writeln!(out, "{end_label}:");
        false
    }

    fn lower_for(&mut self, s: &ForStmt, out: &mut String) -> bool {
        let suffix = self.fresh_suffix();
        let start_label = format!("for_start{suffix}");
        let body_label = format!("for_body{suffix}");
        let end_label = format!("for_end{suffix}");

        let slot = self.slot_for(s.var).clone();
        let from = self.lower_expression(&s.start, out);
        let from = self.coerce(from, IrType::I32, out);
        let _ = writeln!(out, "  store i32 {}, i32* {}", from.text, slot.register);

        let bound = self.lower_expression(&s.end, out);
        let bound = self.coerce(bound, IrType::I32, out);
        let bound_slot = format!("%forbound{suffix}");
        let _ = writeln!(out, "  {} = alloca i32", bound_slot);
        let _ = writeln!(out, "  store i32 {}, i32* {}", bound.text, bound_slot);

        let _ = writeln!(out, "  br label %{start_label}");
        let _ = writeln!(out, "{start_label}:");
        let current = self.fresh_value(IrType::I32);
        let _ = writeln!(out, "  {} = load i32, i32* {}", current.text, slot.register);
        let end_value = self.fresh_value(IrType::I32);
        let _ = writeln!(out, "  {} = load i32, i32* {}", end_value.text, bound_slot);
        let cmp = self.fresh_value(IrType::I32);
        let _ = writeln!(out, "  {} = icmp sle i32 {}, {}", cmp.text, current.text, end_value.text);
        let _ = writeln!(out, "  br i1 {}, label %{}, label %{}", cmp.text, body_label, end_label);

        let _ = writeln!(out, "{body_label}:");
        let terminated = self.lower_statement(&s.body, out);
        if !terminated {
            let current = self.fresh_value(IrType::I32);
            let _ = writeln!(out, "  {} = load i32, i32* {}", current.text, slot.register);
            let next = self.fresh_value(IrType::I32);
            let _ = writeln!(out, "  {} = add i32 {}, 1", next.text, current.text);
            let _ = writeln!(out, "  store i32 {}, i32* {}", next.text, slot.register);
            let _ = writeln!(out, "  br label %{start_label}");
        }
        let _ = writeln!(out, "{end_label}:");
        false
    }

    /// Lowers a boolean-valued condition to an `i1` usable directly by `br`.
    fn lower_condition(&mut self, expr: &Expression, out: &mut String) -> IrValue {
        let value = self.lower_expression(expr, out);
        let dest = self.fresh_value(IrType::I32);
        let _ = writeln!(out, "  {} = icmp ne i32 {}, 0", dest.text, value.text);
        IrValue { text: dest.text, ty: IrType::I32 }
    }

    fn lower_expression(&mut self, expr: &Expression, out: &mut String) -> IrValue {
        match expr {
            Expression::Literal(lit) => self.lower_literal(lit),
            Expression::Variable(v) => self.lower_variable(v, out),
            Expression::ArrayAccess(a) => self.lower_array_access(a, out),
            Expression::Call(c) => self.lower_call(c.name, &c.args, out).expect("function call used as a value"),
            Expression::Binary(b) => self.lower_binary(b, out),
            Expression::Unary(u) => self.lower_unary(u, out),
        }
    }

    fn lower_literal(&mut self, lit: &LiteralExpr) -> IrValue {
        match &lit.value {
            LiteralValue::Integer(i) => IrValue::int_const(*i),
            LiteralValue::Real(r) => IrValue::real_const(*r),
            LiteralValue::Str(s) => {
                let name = self.intern_string(s);
                IrValue { text: format!("getelementptr inbounds ([{} x i8], [{} x i8]* {}, i32 0, i32 0)", s.len() + 1, s.len() + 1, name), ty: IrType::I8Ptr }
            }
        }
    }

    fn lower_variable(&mut self, v: &VariableExpr, out: &mut String) -> IrValue {
        if let Some(constant) = self.resolve_const(v.name) {
            return constant.clone();
        }
        let slot = self.slot_for(v.name).clone();
        let ir_ty = IrType::from_data_type(slot.ty);
        let dest = self.fresh_value(ir_ty);
        let _ = writeln!(out, "  {} = load {}, {}* {}", dest.text, ir_ty.name(), ir_ty.name(), slot.register);
        dest
    }

    fn lower_array_access(&mut self, a: &modc_ast::ArrayAccessExpr, out: &mut String) -> IrValue {
        let slot = self.slot_for(a.name).clone();
        let ir_ty = IrType::from_data_type(slot.ty);
        let addr = self.element_address(&slot, &a.indices, out);
        let dest = self.fresh_value(ir_ty);
        let _ = writeln!(out, "  {} = load {}, {}* {}", dest.text, ir_ty.name(), ir_ty.name(), addr);
        dest
    }

    fn lower_binary(&mut self, b: &BinaryExpr, out: &mut String) -> IrValue {
        let left_ty = self.type_of(&b.left);
        let right_ty = self.type_of(&b.right);
        let left = self.lower_expression(&b.left, out);
        let right = self.lower_expression(&b.right, out);

        if b.op == BinaryOp::Add && (left_ty == DataType::String || right_ty == DataType::String) {
            // String concatenation is realized at runtime only by the
            // evaluator; the IR backend has no string-builtin runtime to
            // call, so this path is unreachable for programs the analyzer
            // accepted as far as the IR backend's supported subset goes.
            unreachable!("STRING `+` is only realized by the tree-walking evaluator backend");
        }

        match b.op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => self.arith(b.op, left, right, out),
            BinaryOp::Div => {
                let left = self.coerce(left, IrType::Double, out);
                let right = self.coerce(right, IrType::Double, out);
                let dest = self.fresh_value(IrType::Double);
                let _ = writeln!(out, "  {} = fdiv double {}, {}", dest.text, left.text, right.text);
                dest
            }
            BinaryOp::DivInt => {
                let dest = self.fresh_value(IrType::I32);
                let _ = writeln!(out, "  {} = sdiv i32 {}, {}", dest.text, left.text, right.text);
                dest
            }
            BinaryOp::Mod => {
                let dest = self.fresh_value(IrType::I32);
                let _ = writeln!(out, "  {} = srem i32 {}, {}", dest.text, left.text, right.text);
                dest
            }
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                self.compare(b.op, left, right, left_ty == DataType::Real || right_ty == DataType::Real, out)
            }
            BinaryOp::And => {
                let dest = self.fresh_value(IrType::I32);
                let _ = writeln!(out, "  {} = and i32 {}, {}", dest.text, left.text, right.text);
                dest
            }
            BinaryOp::Or => {
                let dest = self.fresh_value(IrType::I32);
                let _ = writeln!(out, "  {} = or i32 {}, {}", dest.text, left.text, right.text);
                dest
            }
        }
    }

    fn arith(&mut self, op: BinaryOp, left: IrValue, right: IrValue, out: &mut String) -> IrValue {
        let real = left.ty == IrType::Double || right.ty == IrType::Double;
        if real {
            let left = self.coerce(left, IrType::Double, out);
            let right = self.coerce(right, IrType::Double, out);
            let dest = self.fresh_value(IrType::Double);
            let op_name = match op {
                BinaryOp::Add => "fadd",
                BinaryOp::Sub => "fsub",
                BinaryOp::Mul => "fmul",
                _ => unreachable!(),
            };
            let _ = writeln!(out, "  {} = {} double {}, {}", dest.text, op_name, left.text, right.text);
            dest
        } else {
            let dest = self.fresh_value(IrType::I32);
            let op_name = match op {
                BinaryOp::Add => "add",
                BinaryOp::Sub => "sub",
                BinaryOp::Mul => "mul",
                _ => unreachable!(),
            };
            let _ = writeln!(out, "  {} = {} i32 {}, {}", dest.text, op_name, left.text, right.text);
            dest
        }
    }

    fn compare(&mut self, op: BinaryOp, left: IrValue, right: IrValue, real: bool, out: &mut String) -> IrValue {
        let cmp = self.fresh_value(IrType::I32);
        let dest = self.fresh_value(IrType::I32);
        if real {
            let left = self.coerce(left, IrType::Double, out);
            let right = self.coerce(right, IrType::Double, out);
            let pred = match op {
                BinaryOp::Eq => "oeq",
                BinaryOp::NotEq => "one",
                BinaryOp::Lt => "olt",
                BinaryOp::LtEq => "ole",
                BinaryOp::Gt => "ogt",
                BinaryOp::GtEq => "oge",
                _ => unreachable!(),
            };
            let _ = writeln!(out, "  {} = fcmp {} double {}, {}", cmp.text, pred, left.text, right.text);
        } else {
            let pred = match op {
                BinaryOp::Eq => "eq",
                BinaryOp::NotEq => "ne",
                BinaryOp::Lt => "slt",
                BinaryOp::LtEq => "sle",
                BinaryOp::Gt => "sgt",
                BinaryOp::GtEq => "sge",
                _ => unreachable!(),
            };
            let _ = writeln!(out, "  {} = icmp {} i32 {}, {}", cmp.text, pred, left.text, right.text);
        }
        let _ = writeln!(out, "  {} = zext i1 {} to i32", dest.text, cmp.text);
        dest
    }

    fn lower_unary(&mut self, u: &UnaryExpr, out: &mut String) -> IrValue {
        let operand = self.lower_expression(&u.operand, out);
        match u.op {
            UnaryOp::Plus => operand,
            UnaryOp::Minus => {
                if operand.ty == IrType::Double {
                    let dest = self.fresh_value(IrType::Double);
                    let _ = writeln!(out, "  {} = fneg double {}", dest.text, operand.text);
                    dest
                } else {
                    let dest = self.fresh_value(IrType::I32);
                    let _ = writeln!(out, "  {} = sub i32 0, {}", dest.text, operand.text);
                    dest
                }
            }
        }
    }

    fn lower_call(&mut self, name: Symbol, args: &[Expression], out: &mut String) -> Option<IrValue> {
        if name == Symbol::intern("Write") || name == Symbol::intern("WriteLn") {
            self.lower_print(name, args, out);
            return None;
        }

        let proc = *self.procedures.get(&name).expect("analyzer already validated this call");
        let ret_ty = proc.return_type.map(IrType::from_data_type);

        let mut arg_texts = Vec::with_capacity(args.len());
        for (arg, param) in args.iter().zip(&proc.parameters) {
            if param.by_reference || !param.dims.is_empty() {
                let reg = self.address_of(arg, out);
                arg_texts.push(format!("{}* {}", IrType::from_data_type(param.ty).name(), reg));
            } else {
                let value = self.lower_expression(arg, out);
                let value = self.coerce(value, IrType::from_data_type(param.ty), out);
                arg_texts.push(format!("{} {}", value.ty.name(), value.text));
            }
        }

        match ret_ty {
            Some(ty) => {
                let dest = self.fresh_value(ty);
                let _ = writeln!(out, "  {} = call {} @{}({})", dest.text, ty.name(), name, arg_texts.join(", "));
                Some(dest)
            }
            None => {
                let _ = writeln!(out, "  call void @{}({})", name, arg_texts.join(", "));
                None
            }
        }
    }

    /// A `VAR` argument must be a bare variable name (enforced by the
    /// analyzer); this returns the pointer to its slot directly rather than
    /// loading its value.
    fn address_of(&mut self, expr: &Expression, out: &mut String) -> String {
        match expr {
            Expression::Variable(v) => self.slot_for(v.name).register.clone(),
            Expression::ArrayAccess(a) => {
                let slot = self.slot_for(a.name).clone();
                self.element_address(&slot, &a.indices, out)
            }
            _ => unreachable!("a VAR argument must be a bare variable or array element"),
        }
    }

    fn lower_print(&mut self, name: Symbol, args: &[Expression], out: &mut String) {
        for arg in args {
            let ty = self.type_of(arg);
            let value = self.lower_expression(arg, out);
            let fmt = match ty {
                DataType::Integer => self.intern_string("%d"),
                DataType::Real => self.intern_string("%f"),
                DataType::String => self.intern_string("%s"),
                DataType::Array => unreachable!("Write/WriteLn never receive a bare array argument"),
            };
            let len = match ty {
                DataType::Integer => 3,
                DataType::Real => 3,
                DataType::String => 3,
                DataType::Array => unreachable!(),
            };
            let fmt_ptr = format!("getelementptr inbounds ([{len} x i8], [{len} x i8]* {fmt}, i32 0, i32 0)");
            let coerced = if ty == DataType::Real { self.coerce(value, IrType::Double, out) } else { value };
            let _ = writeln!(out, "  call i32 (i8*, ...) @printf(i8* {}, {} {})", fmt_ptr, coerced.ty.name(), coerced.text);
        }
        if name == Symbol::intern("WriteLn") {
            let nl = self.intern_string("\n");
            let nl_ptr = format!("getelementptr inbounds ([2 x i8], [2 x i8]* {nl}, i32 0, i32 0)");
            let _ = writeln!(out, "  call i32 (i8*, ...) @printf(i8* {})", nl_ptr);
        }
    }

    /// Re-derives an expression's static type, mirroring the analyzer's own
    /// rules exactly (it already proved the program well-typed, so this
    /// never needs to report a diagnostic, only pick an `IrType`).
    fn type_of(&self, expr: &Expression) -> DataType {
        match expr {
            Expression::Literal(l) => l.ty,
            Expression::Variable(v) => {
                if let Some(c) = self.resolve_const(v.name) {
                    return match c.ty {
                        IrType::I32 => DataType::Integer,
                        IrType::Double => DataType::Real,
                        IrType::I8Ptr => DataType::String,
                    };
                }
                self.slot_for(v.name).ty
            }
            Expression::ArrayAccess(a) => self.slot_for(a.name).ty,
            Expression::Call(c) => {
                let proc = *self.procedures.get(&c.name).expect("analyzer already validated this call");
                proc.return_type.expect("function call used as a value has a return type")
            }
            Expression::Binary(b) => {
                let lty = self.type_of(&b.left);
                let rty = self.type_of(&b.right);
                match b.op {
                    BinaryOp::Add if lty == DataType::String || rty == DataType::String => DataType::String,
                    BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => {
                        if lty == DataType::Real || rty == DataType::Real {
                            DataType::Real
                        } else {
                            DataType::Integer
                        }
                    }
                    BinaryOp::Div => DataType::Real,
                    BinaryOp::DivInt | BinaryOp::Mod => DataType::Integer,
                    BinaryOp::Eq
                    | BinaryOp::NotEq
                    | BinaryOp::Lt
                    | BinaryOp::LtEq
                    | BinaryOp::Gt
                    | BinaryOp::GtEq
                    | BinaryOp::And
                    | BinaryOp::Or => DataType::Integer,
                }
            }
            Expression::Unary(u) => self.type_of(&u.operand),
        }
    }

    /// Folds a compile-time constant expression (the grammar only ever puts
    /// literals and arithmetic over literals on the right of `CONST name = …`).
    fn fold_const(&mut self, expr: &Expression) -> IrValue {
        match expr {
            Expression::Literal(l) => match &l.value {
                LiteralValue::Integer(i) => IrValue::int_const(*i),
                LiteralValue::Real(r) => IrValue::real_const(*r),
                LiteralValue::Str(s) => {
                    let name = self.intern_string(s);
                    IrValue {
                        text: format!(
                            "getelementptr inbounds ([{} x i8], [{} x i8]* {}, i32 0, i32 0)",
                            s.len() + 1,
                            s.len() + 1,
                            name
                        ),
                        ty: IrType::I8Ptr,
                    }
                }
            },
            Expression::Unary(u) => {
                let inner = self.fold_const(&u.operand);
                match (u.op, inner.ty) {
                    (UnaryOp::Plus, _) => inner,
                    (UnaryOp::Minus, IrType::I32) => IrValue::int_const(-inner.text.parse::<i64>().unwrap_or(0)),
                    (UnaryOp::Minus, IrType::Double) => IrValue::real_const(-inner.text.parse::<f64>().unwrap_or(0.0)),
                    (UnaryOp::Minus, IrType::I8Ptr) => inner,
                }
            }
            Expression::Binary(b) => {
                let left = self.fold_const(&b.left);
                let right = self.fold_const(&b.right);
                let real = left.ty == IrType::Double || right.ty == IrType::Double;
                let lf: f64 = left.text.parse().unwrap_or(0.0);
                let rf: f64 = right.text.parse().unwrap_or(0.0);
                match b.op {
                    BinaryOp::Add if real => IrValue::real_const(lf + rf),
                    BinaryOp::Add => IrValue::int_const(lf as i64 + rf as i64),
                    BinaryOp::Sub if real => IrValue::real_const(lf - rf),
                    BinaryOp::Sub => IrValue::int_const(lf as i64 - rf as i64),
                    BinaryOp::Mul if real => IrValue::real_const(lf * rf),
                    BinaryOp::Mul => IrValue::int_const(lf as i64 * rf as i64),
                    BinaryOp::Div => IrValue::real_const(lf / rf),
                    BinaryOp::DivInt => IrValue::int_const(lf as i64 / rf as i64),
                    BinaryOp::Mod => IrValue::int_const(lf as i64 % rf as i64),
                    _ => unreachable!("constant expressions are restricted to arithmetic"),
                }
            }
            Expression::Variable(_) | Expression::ArrayAccess(_) | Expression::Call(_) => {
                unreachable!("CONST values are compile-time constant, never a name or call")
            }
        }
    }
}

fn default_immediate(ty: DataType) -> &'static str {
    match ty {
        DataType::Integer => "0",
        DataType::Real => "0.0",
        DataType::String => "null",
        DataType::Array => unreachable!(),
    }
}

fn llvm_escape(text: &str) -> String {
    let mut out = String::new();
    for byte in text.bytes() {
        match byte {
            b'"' | b'\\' => {
                let _ = write!(out, "\\{byte:02X}");
            }
            0x20..=0x7e => out.push(byte as char),
            _ => {
                let _ = write!(out, "\\{byte:02X}");
            }
        }
    }
    out.push_str("\\00");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use modc_parser::parse;
    use modc_errors::emitter::Handler;

    fn lower(src: &str) -> String {
        let program = parse(src).expect("parses");
        let handler = Handler::new();
        modc_passes::analyze(&program, &handler);
        assert!(!handler.had_errors());
        emit_program(&program)
    }

    #[test]
    fn emits_a_main_function_with_a_trailing_zero_return() {
        let ir = lower("MODULE M; BEGIN END M.");
        assert!(ir.contains("define i32 @main()"));
        assert!(ir.contains("ret i32 0"));
    }

    #[test]
    fn declares_printf_once() {
        let ir = lower("MODULE M; BEGIN Write(1); WriteLn() END M.");
        assert_eq!(ir.matches("declare i32 @printf").count(), 1);
    }

    #[test]
    fn a_global_var_becomes_an_llvm_global_not_a_main_local() {
        let ir = lower("MODULE M; VAR x: INTEGER; BEGIN x := 1 END M.");
        assert!(ir.contains("@x = global i32 0"));
    }

    #[test]
    fn user_procedure_gets_its_own_function_definition() {
        let ir = lower(
            "MODULE M; PROCEDURE Double(x: INTEGER): INTEGER; BEGIN RETURN x * 2 END Double; \
             VAR y: INTEGER; BEGIN y := Double(21); Write(y) END M.",
        );
        assert!(ir.contains("define i32 @Double(i32 %x)"));
        assert!(ir.contains("call i32 @Double"));
    }

    #[test]
    fn nested_procedure_gets_a_matching_definition_not_just_a_call() {
        let ir = lower(
            "MODULE M; \
             PROCEDURE Outer(x: INTEGER): INTEGER; \
                 PROCEDURE Inner(y: INTEGER): INTEGER; \
                 BEGIN RETURN y * 2 END Inner; \
             BEGIN RETURN Inner(x) END Outer; \
             VAR r: INTEGER; BEGIN r := Outer(5); Write(r) END M.",
        );
        assert!(ir.contains("define i32 @Outer(i32 %x)"));
        assert!(ir.contains("define i32 @Inner(i32 %y)"));
        assert!(ir.contains("call i32 @Inner"));
    }

    #[test]
    fn if_without_else_only_emits_one_conditional_branch() {
        let ir = lower("MODULE M; VAR x: INTEGER; BEGIN IF x > 0 THEN x := 1 END END M.");
        assert!(ir.contains("br i1"));
        assert!(ir.contains("then1:"));
        assert!(ir.contains("endif1:"));
    }

    #[test]
    fn for_loop_emits_start_body_end_labels() {
        let ir = lower("MODULE M; VAR i, s: INTEGER; BEGIN FOR i := 1 TO 10 DO s := s + i END END M.");
        assert!(ir.contains("for_start1:"));
        assert!(ir.contains("for_body1:"));
        assert!(ir.contains("for_end1:"));
    }

    #[test]
    fn string_literals_are_interned_once_as_trailing_globals() {
        let ir = lower("MODULE M; BEGIN WriteLn(\"hi\"); WriteLn(\"hi\") END M.");
        assert_eq!(ir.matches("c\"hi\\00\"").count(), 1);
    }
}
