//! The fused analyzer/codegen pass (spec.md §4.3, §4.4): one walk over the
//! AST that type-checks each node and, as soon as it knows the node is
//! well-typed, emits its QBE text directly — there is no separate typed IR
//! sitting between the two.
//!
//! Grounded on `examples/original_source/src/analyze.c`, which is itself one
//! recursive function (`analyze_node`, taking an `emit_lvalue` flag) that
//! threads a `type_t` result back up to the caller while `fprintf`-ing QBE
//! text straight into `ctx->out_file` as it goes (e.g. `analyze.c:249`,
//! `:395`, `:450`); this module keeps that shape and re-expresses it as
//! `Result<(Operand, Type), CompileError>` instead of an out-parameter plus
//! a side-effecting file handle.

use std::io::Write;

use cqc_par::{Ast, BinOp, NodeId, NodeKind, Param, TypeKeyword, UnaryOp};
use cqc_sem::{ScopeStack, Type, TypeKind};
use cqc_util::{CompileError, Span, Symbol, TypeError, UnsupportedError};

use crate::qbe::{LabelCounter, Operand, QbeType, TempCounter, Writer};

/// Parses, type-checks, and emits `ast` as QBE text to `out`.
pub fn compile_to_qbe(ast: &Ast, out: &mut dyn Write) -> Result<(), CompileError> {
    let mut analyzer = Analyzer::new(ast);
    let root = ast.get(ast.root()).clone();
    let items = match root.kind {
        NodeKind::File { items } => items,
        _ => unreachable!("Ast::root is always a File node"),
    };
    for item in items {
        let item_node = ast.get(item).clone();
        match item_node.kind {
            NodeKind::Function { sig, body } => analyzer.analyze_function(sig, body)?,
            _ => unreachable!("a top-level item is always a Function node"),
        }
    }
    analyzer.writer.finish(out)?;
    Ok(())
}

/// The value type a QBE instruction computes in. Sub-word types (`sb`/`ub`)
/// only ever appear as load/store widths, never as a temporary's type
/// (spec.md §4.4).
fn value_type(ty: &Type) -> QbeType {
    if ty.is_pointer() {
        return QbeType::L;
    }
    match ty.kind {
        TypeKind::Long | TypeKind::Function => QbeType::L,
        TypeKind::Float => QbeType::S,
        TypeKind::Void => QbeType::Void,
        TypeKind::Int | TypeKind::Char => QbeType::W,
    }
}

fn load_opcode(ty: &Type) -> &'static str {
    if ty.is_pointer() {
        return "loadl";
    }
    match ty.kind {
        TypeKind::Char if ty.is_signed => "loadsb",
        TypeKind::Char => "loadub",
        TypeKind::Int => "loadw",
        TypeKind::Long | TypeKind::Function => "loadl",
        TypeKind::Float => "loads",
        TypeKind::Void => "loadw",
    }
}

fn store_opcode(ty: &Type) -> &'static str {
    if ty.is_pointer() {
        return "storel";
    }
    match ty.kind {
        TypeKind::Char => "storeb",
        TypeKind::Int => "storew",
        TypeKind::Long | TypeKind::Function => "storel",
        TypeKind::Float => "stores",
        TypeKind::Void => "storew",
    }
}

/// Integer promotion: a `char` operand widens to `int` before taking part
/// in arithmetic, independent of the other operand (spec.md §4.3).
fn promote_for_arith(ty: &Type) -> Type {
    if ty.kind == TypeKind::Char && !ty.is_pointer() {
        Type::primitive(TypeKind::Int, ty.is_signed, 0)
    } else {
        ty.clone()
    }
}

#[derive(Clone)]
struct LoopLabels {
    cond: String,
    end: String,
}

/// The per-compile state threaded through the AST walk: the symbol table,
/// the fresh-name counters, and the output buffer. `ast` is the arena every
/// `NodeId` indexes into; it is never mutated by this pass.
struct Analyzer<'a> {
    ast: &'a Ast,
    scopes: ScopeStack,
    temps: TempCounter,
    labels: LabelCounter,
    writer: Writer,
    data_counter: u32,
    loop_labels: Vec<LoopLabels>,
    current_return_type: Option<Type>,
    current_end_label: Option<String>,
    /// True once the current basic block has seen a `ret`/`jmp`/`jnz`. QBE
    /// requires every block to end in exactly one terminator, so a further
    /// statement in the same block first needs a fresh label
    /// (`ensure_open_block`).
    terminated: bool,
}

impl<'a> Analyzer<'a> {
    fn new(ast: &'a Ast) -> Self {
        Self {
            ast,
            scopes: ScopeStack::new(),
            temps: TempCounter::default(),
            labels: LabelCounter::default(),
            writer: Writer::new(),
            data_counter: 0,
            loop_labels: Vec::new(),
            current_return_type: None,
            current_end_label: None,
            terminated: false,
        }
    }

    fn resolve_type(&self, id: NodeId) -> Type {
        match &self.ast.get(id).kind {
            NodeKind::TypeExpr(te) => {
                let kind = match te.keyword {
                    TypeKeyword::Int => TypeKind::Int,
                    TypeKeyword::Long => TypeKind::Long,
                    TypeKeyword::Char => TypeKind::Char,
                    TypeKeyword::Void => TypeKind::Void,
                    TypeKeyword::Float => TypeKind::Float,
                };
                Type::primitive(kind, !te.is_unsigned, te.pointer_depth)
            }
            _ => unreachable!("a type node is always TypeExpr"),
        }
    }

    /// Assignability (spec.md §4.3): pointers must match exactly; function
    /// types compare structurally; any numeric pair is otherwise
    /// convertible regardless of width or sign.
    fn assignable(&self, from: &Type, to: &Type) -> bool {
        if from.is_pointer() || to.is_pointer() {
            return from.kind == to.kind && from.pointer_depth == to.pointer_depth;
        }
        if from.kind == TypeKind::Function || to.kind == TypeKind::Function {
            return from.structurally_eq(to);
        }
        from.is_numeric() && to.is_numeric()
    }

    fn unify_widths(&self, a: &Type, b: &Type) -> Type {
        let a = promote_for_arith(a);
        let b = promote_for_arith(b);
        if a.kind == TypeKind::Long || b.kind == TypeKind::Long {
            let is_signed = match (a.kind == TypeKind::Long, b.kind == TypeKind::Long) {
                (true, true) => a.is_signed && b.is_signed,
                (true, false) => a.is_signed,
                (false, true) => b.is_signed,
                (false, false) => true,
            };
            Type::primitive(TypeKind::Long, is_signed, 0)
        } else {
            Type::primitive(TypeKind::Int, a.is_signed && b.is_signed, 0)
        }
    }

    /// Widens an `int`-width operand to `long` via `extsw`/`extuw`; a no-op
    /// for operands already `long`.
    fn widen_to_long(&mut self, operand: Operand, ty: &Type) -> Operand {
        if ty.kind == TypeKind::Long {
            return operand;
        }
        let dst = self.temps.fresh();
        let op = if ty.is_signed { "extsw" } else { "extuw" };
        self.writer.assign(&dst, QbeType::L, op, &[operand.to_string()]);
        dst
    }

    fn convert_value(&mut self, operand: Operand, from: &Type, to: &Type) -> Operand {
        if to.kind == TypeKind::Long && from.kind != TypeKind::Long && !from.is_pointer() {
            return self.widen_to_long(operand, from);
        }
        operand
    }

    /// Scales an array/pointer index to a byte offset: widen to `long`,
    /// then multiply by the pointee's size (spec.md §4.3 "pointer
    /// arithmetic"). The multiply is emitted unconditionally, even by 1,
    /// since there are no optimization passes to later fold it away
    /// (spec.md §8 scenario 3).
    fn scale_index(&mut self, operand: Operand, ty: &Type, elem_size: u32) -> Operand {
        let widened = self.widen_to_long(operand, ty);
        let dst = self.temps.fresh();
        self.writer
            .assign(&dst, QbeType::L, "mul", &[widened.to_string(), elem_size.to_string()]);
        dst
    }

    fn ensure_open_block(&mut self) {
        if self.terminated {
            let label = self.labels.fresh("unreachable");
            self.writer.label(&label);
            self.terminated = false;
        }
    }

    // ---- top-level items ----------------------------------------------

    fn analyze_function(&mut self, sig_id: NodeId, body_id: Option<NodeId>) -> Result<(), CompileError> {
        let sig_node = self.ast.get(sig_id).clone();
        let (name, ret_ty_id, params, variadic) = match sig_node.kind {
            NodeKind::FunctionSignature { name, ret_ty, params, variadic } => (name, ret_ty, params, variadic),
            _ => unreachable!("a Function node's sig always points at a FunctionSignature"),
        };

        let return_type = self.resolve_type(ret_ty_id);
        let param_types: Vec<Type> = params.iter().map(|p| self.resolve_type(p.ty)).collect();
        let func_ty = Type::function(return_type.clone(), param_types.clone(), variadic);
        self.scopes.insert(name, func_ty, body_id.is_none(), sig_node.span)?;

        let body_id = match body_id {
            Some(b) => b,
            None => return Ok(()),
        };

        self.scopes.push_scope();
        let result = self.emit_function_body(name, &return_type, &params, &param_types, variadic, body_id);
        self.scopes.pop_scope();
        result
    }

    /// Emits one function's QBE text: the signature line, a parameter
    /// prologue that copies each incoming value into its own stack slot,
    /// the body's statements (walked directly, *not* through
    /// `analyze_stmt`'s `Block` arm, since the body shares the parameter
    /// scope rather than opening a further one — spec.md §4.3), and the
    /// shared `@end`/`ret` epilogue every `return` jumps to.
    fn emit_function_body(
        &mut self,
        name: Symbol,
        return_type: &Type,
        params: &[Param],
        param_types: &[Type],
        variadic: bool,
        body_id: NodeId,
    ) -> Result<(), CompileError> {
        for (param, ty) in params.iter().zip(param_types) {
            self.scopes.insert(param.name, ty.clone(), false, param.span)?;
        }

        self.temps = TempCounter::default();
        self.terminated = false;
        self.current_return_type = Some(return_type.clone());
        let end_label = self.labels.fresh("end");
        self.current_end_label = Some(end_label.clone());

        let ret_qty = value_type(return_type);
        let params_str = params
            .iter()
            .zip(param_types)
            .map(|(p, ty)| format!("{} {}", value_type(ty), Operand::Param(p.name)))
            .collect::<Vec<_>>()
            .join(", ");
        let variadic_suffix = match (variadic, params.is_empty()) {
            (false, _) => String::new(),
            (true, true) => "...".to_string(),
            (true, false) => ", ...".to_string(),
        };
        if ret_qty.is_void() {
            self.writer.raw_line(format!("export function ${name}({params_str}{variadic_suffix}) {{"));
        } else {
            self.writer
                .raw_line(format!("export function {ret_qty} ${name}({params_str}{variadic_suffix}) {{"));
        }
        self.writer.label("start");

        for (param, ty) in params.iter().zip(param_types) {
            let slot = Operand::Local { scope: 1, name: param.name };
            self.writer.assign(&slot, QbeType::L, "alloc4", &[ty.size_bytes().max(1).to_string()]);
            self.writer.stmt(format!("{} {}, {}", store_opcode(ty), Operand::Param(param.name), slot));
        }

        let body_node = self.ast.get(body_id).clone();
        let stmts = match body_node.kind {
            NodeKind::Block { stmts } => stmts,
            _ => unreachable!("a function's body is always a Block"),
        };
        for stmt_id in &stmts {
            self.analyze_stmt(*stmt_id)?;
        }

        self.ensure_open_block();
        if !self.terminated {
            self.writer.stmt(format!("jmp @{end_label}"));
        }
        self.writer.label(&end_label);
        if ret_qty.is_void() {
            self.writer.stmt("ret");
        } else {
            self.writer.stmt(format!("ret {}", Operand::Result));
        }
        self.writer.raw_line("}");
        self.writer.blank_line();

        self.current_return_type = None;
        self.current_end_label = None;
        Ok(())
    }

    // ---- statements -----------------------------------------------------

    fn analyze_block_stmts(&mut self, stmts: &[NodeId]) -> Result<(), CompileError> {
        for stmt_id in stmts {
            self.analyze_stmt(*stmt_id)?;
        }
        Ok(())
    }

    fn analyze_stmt(&mut self, id: NodeId) -> Result<(), CompileError> {
        self.ensure_open_block();
        let node = self.ast.get(id).clone();
        let span = node.span;

        match node.kind {
            NodeKind::Empty => Ok(()),

            NodeKind::Block { stmts } => {
                self.scopes.push_scope();
                let result = self.analyze_block_stmts(&stmts);
                self.scopes.pop_scope();
                result
            }

            NodeKind::VarDecl { name, ty, is_array, array_len: _, init } => {
                // The declared length, if any, was parsed but is never
                // evaluated: arrays decay to a bare pointer-typed slot with
                // no backing buffer (spec.md §9).
                let base_ty = self.resolve_type(ty);
                let var_ty = if is_array { base_ty.pointer_to() } else { base_ty };
                let depth = self.scopes.depth();
                self.scopes.insert(name, var_ty.clone(), false, span)?;
                let slot = Operand::Local { scope: depth, name };
                self.writer
                    .assign(&slot, QbeType::L, "alloc4", &[var_ty.size_bytes().max(1).to_string()]);
                if let Some(init_id) = init {
                    let (val, init_ty) = self.analyze_expr(init_id, false)?;
                    if !self.assignable(&init_ty, &var_ty) {
                        return Err(TypeError::AssignMismatch { span }.into());
                    }
                    let converted = self.convert_value(val, &init_ty, &var_ty);
                    self.writer.stmt(format!("{} {}, {}", store_opcode(&var_ty), converted, slot));
                }
                Ok(())
            }

            NodeKind::Return { value } => self.analyze_return(value, span),

            NodeKind::Break => self.analyze_loop_jump(true, span),
            NodeKind::Continue => self.analyze_loop_jump(false, span),

            NodeKind::If { cond, then_branch, else_branch } => self.analyze_if(cond, then_branch, else_branch, span),

            NodeKind::While { cond, body } => self.analyze_while(cond, body, span),

            NodeKind::Binary { op: BinOp::Assign, lhs, rhs } => self.analyze_assign(lhs, rhs, span),
            NodeKind::Binary { op: BinOp::PlusEq, lhs, rhs } => self.analyze_plus_eq(lhs, rhs, span),
            NodeKind::Binary { .. } => {
                unreachable!("a bare binary expression never appears in statement position")
            }

            NodeKind::Unary { op: UnaryOp::Discard, operand, .. } => {
                self.analyze_expr(operand, false)?;
                Ok(())
            }
            NodeKind::Unary { .. } => {
                unreachable!("a bare unary expression never appears in statement position")
            }

            other => unreachable!("{other:?} is not a valid statement node"),
        }
    }

    fn analyze_return(&mut self, value: Option<NodeId>, span: Span) -> Result<(), CompileError> {
        let ret_ty = self
            .current_return_type
            .clone()
            .expect("return only appears inside a function body");

        match value {
            Some(expr_id) => {
                if ret_ty.is_void() {
                    return Err(TypeError::ReturnMismatch { span }.into());
                }
                let (val, vty) = self.analyze_expr(expr_id, false)?;
                if !self.assignable(&vty, &ret_ty) {
                    return Err(TypeError::ReturnMismatch { span }.into());
                }
                let converted = self.convert_value(val, &vty, &ret_ty);
                self.writer
                    .assign(&Operand::Result, value_type(&ret_ty).arithmetic_type(), "copy", &[converted.to_string()]);
            }
            None => {
                if !ret_ty.is_void() {
                    return Err(TypeError::ReturnMismatch { span }.into());
                }
            }
        }

        let end = self.current_end_label.clone().expect("function sets current_end_label");
        self.writer.stmt(format!("jmp @{end}"));
        self.terminated = true;
        Ok(())
    }

    fn analyze_loop_jump(&mut self, is_break: bool, span: Span) -> Result<(), CompileError> {
        let labels = self
            .loop_labels
            .last()
            .cloned()
            .ok_or_else(|| UnsupportedError { span, what: "break/continue outside a loop".to_string() })?;
        let target = if is_break { labels.end } else { labels.cond };
        self.writer.stmt(format!("jmp @{target}"));
        self.terminated = true;
        Ok(())
    }

    fn analyze_if(
        &mut self,
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
        span: Span,
    ) -> Result<(), CompileError> {
        let (cval, cty) = self.analyze_expr(cond, false)?;
        if !cty.is_numeric() && !cty.is_pointer() {
            return Err(TypeError::NonPrimitiveOperand { span, op: "if" }.into());
        }

        let then_label = self.labels.fresh("then");
        let else_label = self.labels.fresh("else");
        let end_label = self.labels.fresh("ifend");
        let false_target = if else_branch.is_some() { &else_label } else { &end_label };
        self.writer.stmt(format!("jnz {cval}, @{then_label}, @{false_target}"));

        self.writer.label(&then_label);
        self.terminated = false;
        self.analyze_stmt(then_branch)?;
        self.ensure_open_block();
        if !self.terminated {
            self.writer.stmt(format!("jmp @{end_label}"));
        }

        if let Some(else_id) = else_branch {
            self.writer.label(&else_label);
            self.terminated = false;
            self.analyze_stmt(else_id)?;
            self.ensure_open_block();
            if !self.terminated {
                self.writer.stmt(format!("jmp @{end_label}"));
            }
        }

        self.writer.label(&end_label);
        self.terminated = false;
        Ok(())
    }

    fn analyze_while(&mut self, cond: NodeId, body: NodeId, span: Span) -> Result<(), CompileError> {
        let cond_label = self.labels.fresh("cond");
        let body_label = self.labels.fresh("body");
        let end_label = self.labels.fresh("loopend");

        self.writer.stmt(format!("jmp @{cond_label}"));
        self.writer.label(&cond_label);
        self.terminated = false;
        let (cval, cty) = self.analyze_expr(cond, false)?;
        if !cty.is_numeric() && !cty.is_pointer() {
            return Err(TypeError::NonPrimitiveOperand { span, op: "while" }.into());
        }
        self.writer.stmt(format!("jnz {cval}, @{body_label}, @{end_label}"));

        self.writer.label(&body_label);
        self.terminated = false;
        self.loop_labels.push(LoopLabels { cond: cond_label.clone(), end: end_label.clone() });
        let body_result = self.analyze_stmt(body);
        self.loop_labels.pop();
        body_result?;

        self.ensure_open_block();
        if !self.terminated {
            self.writer.stmt(format!("jmp @{cond_label}"));
        }
        self.writer.label(&end_label);
        self.terminated = false;
        Ok(())
    }

    fn analyze_assign(&mut self, lhs: NodeId, rhs: NodeId, span: Span) -> Result<(), CompileError> {
        let (addr, lty) = self.analyze_expr(lhs, true)?;
        let (rval, rty) = self.analyze_expr(rhs, false)?;
        if !self.assignable(&rty, &lty) {
            return Err(TypeError::AssignMismatch { span }.into());
        }
        let converted = self.convert_value(rval, &rty, &lty);
        self.writer.stmt(format!("{} {}, {}", store_opcode(&lty), converted, addr));
        Ok(())
    }

    fn analyze_plus_eq(&mut self, lhs: NodeId, rhs: NodeId, span: Span) -> Result<(), CompileError> {
        let (addr, lty) = self.analyze_expr(lhs, true)?;
        let (rval, rty) = self.analyze_expr(rhs, false)?;

        if lty.is_pointer() {
            if !rty.is_numeric() {
                return Err(TypeError::NonPrimitiveOperand { span, op: "+=" }.into());
            }
            let scaled = self.scale_index(rval, &rty, lty.deref().size_bytes().max(1));
            let cur = self.temps.fresh();
            self.writer
                .assign(&cur, value_type(&lty).arithmetic_type(), load_opcode(&lty), &[addr.to_string()]);
            let sum = self.temps.fresh();
            self.writer.assign(&sum, QbeType::L, "add", &[cur.to_string(), scaled.to_string()]);
            self.writer.stmt(format!("{} {}, {}", store_opcode(&lty), sum, addr));
            return Ok(());
        }

        if !lty.is_numeric() || !rty.is_numeric() {
            return Err(TypeError::NonPrimitiveOperand { span, op: "+=" }.into());
        }
        if lty.kind == TypeKind::Float || rty.kind == TypeKind::Float {
            return Err(UnsupportedError { span, what: "floating-point arithmetic".to_string() }.into());
        }
        let cur = self.temps.fresh();
        self.writer
            .assign(&cur, value_type(&lty).arithmetic_type(), load_opcode(&lty), &[addr.to_string()]);
        let converted_r = self.convert_value(rval, &rty, &lty);
        let sum = self.temps.fresh();
        self.writer.assign(
            &sum,
            value_type(&lty).arithmetic_type(),
            "add",
            &[cur.to_string(), converted_r.to_string()],
        );
        self.writer.stmt(format!("{} {}, {}", store_opcode(&lty), sum, addr));
        Ok(())
    }

    // ---- expressions ------------------------------------------------------

    /// Evaluates `id`. When `emit_lvalue` is true the result is an address
    /// operand suitable for a subsequent load/store; otherwise it is the
    /// node's loaded value (spec.md §4.4).
    fn analyze_expr(&mut self, id: NodeId, emit_lvalue: bool) -> Result<(Operand, Type), CompileError> {
        let node = self.ast.get(id).clone();
        let span = node.span;

        match node.kind {
            NodeKind::IntLiteral(n) => {
                if emit_lvalue {
                    return Err(TypeError::LvalueRequired { span }.into());
                }
                Ok((Operand::Const(n), Type::int()))
            }
            NodeKind::CharLiteral(b) => {
                if emit_lvalue {
                    return Err(TypeError::LvalueRequired { span }.into());
                }
                Ok((Operand::Const(b as i64), Type::char()))
            }
            NodeKind::StringLiteral(sym) => {
                if emit_lvalue {
                    return Err(TypeError::LvalueRequired { span }.into());
                }
                let mut bytes = sym.as_str().as_bytes().to_vec();
                bytes.push(0);
                let id = self.data_counter;
                self.data_counter += 1;
                self.writer.push_data(id, bytes);
                Ok((Operand::Data(id), Type::char().pointer_to()))
            }

            NodeKind::Identifier(sym) => self.analyze_identifier(sym, span, emit_lvalue),

            NodeKind::Binary { op, lhs, rhs } => {
                if emit_lvalue {
                    return Err(TypeError::LvalueRequired { span }.into());
                }
                self.analyze_binary(op, lhs, rhs, span)
            }

            NodeKind::Unary { op: UnaryOp::AddrOf, operand, .. } => {
                if emit_lvalue {
                    return Err(TypeError::LvalueRequired { span }.into());
                }
                let (addr, ty) = self.analyze_expr(operand, true)?;
                Ok((addr, ty.pointer_to()))
            }
            NodeKind::Unary { op: UnaryOp::Deref, operand, .. } => self.analyze_deref(operand, span, emit_lvalue),
            NodeKind::Unary { op: UnaryOp::Neg, operand, .. } => {
                if emit_lvalue {
                    return Err(TypeError::LvalueRequired { span }.into());
                }
                let (val, ty) = self.analyze_expr(operand, false)?;
                if !ty.is_numeric() {
                    return Err(TypeError::NonPrimitiveOperand { span, op: "-" }.into());
                }
                if ty.kind == TypeKind::Float {
                    return Err(UnsupportedError { span, what: "floating-point arithmetic".to_string() }.into());
                }
                let dst = self.temps.fresh();
                self.writer.assign(&dst, value_type(&ty).arithmetic_type(), "neg", &[val.to_string()]);
                Ok((dst, ty))
            }
            NodeKind::Unary { op: UnaryOp::PostInc, operand, .. } => {
                if emit_lvalue {
                    return Err(TypeError::LvalueRequired { span }.into());
                }
                self.analyze_post_inc(operand, span)
            }
            NodeKind::Unary { op: UnaryOp::Cast, operand, cast_ty } => {
                if emit_lvalue {
                    return Err(TypeError::LvalueRequired { span }.into());
                }
                let target = self.resolve_type(cast_ty.expect("a Cast node always carries cast_ty"));
                let (val, from) = self.analyze_expr(operand, false)?;
                self.analyze_cast(target, val, &from, span)
            }
            NodeKind::Unary { op: UnaryOp::Discard, .. } => {
                unreachable!("a discard expression never appears in expression position")
            }

            NodeKind::Call { callee, args } => self.analyze_call(callee, args, span, emit_lvalue),
            NodeKind::Index { base, index } => self.analyze_index(base, index, span, emit_lvalue),

            other => unreachable!("{other:?} is not a valid expression node"),
        }
    }

    fn analyze_identifier(&mut self, sym: Symbol, span: Span, emit_lvalue: bool) -> Result<(Operand, Type), CompileError> {
        let entry = self.scopes.lookup_or_err(sym, span)?.clone();
        if entry.ty.func.is_some() {
            return Ok((Operand::FuncRef(sym), entry.ty));
        }

        let operand = Operand::Local { scope: entry.scope_depth, name: sym };
        if emit_lvalue {
            Ok((operand, entry.ty))
        } else {
            let dst = self.temps.fresh();
            self.writer
                .assign(&dst, value_type(&entry.ty).arithmetic_type(), load_opcode(&entry.ty), &[operand.to_string()]);
            Ok((dst, entry.ty))
        }
    }

    fn analyze_deref(&mut self, operand: NodeId, span: Span, emit_lvalue: bool) -> Result<(Operand, Type), CompileError> {
        let (val, ty) = self.analyze_expr(operand, false)?;
        if !ty.is_pointer() {
            return Err(TypeError::DerefNonPointer { span }.into());
        }
        let elem_ty = ty.deref();
        if emit_lvalue {
            Ok((val, elem_ty))
        } else {
            let dst = self.temps.fresh();
            self.writer
                .assign(&dst, value_type(&elem_ty).arithmetic_type(), load_opcode(&elem_ty), &[val.to_string()]);
            Ok((dst, elem_ty))
        }
    }

    fn analyze_post_inc(&mut self, operand: NodeId, span: Span) -> Result<(Operand, Type), CompileError> {
        let (addr, ty) = self.analyze_expr(operand, true)?;
        if !ty.is_numeric() && !ty.is_pointer() {
            return Err(TypeError::NonPrimitiveOperand { span, op: "++" }.into());
        }
        let cur = self.temps.fresh();
        self.writer
            .assign(&cur, value_type(&ty).arithmetic_type(), load_opcode(&ty), &[addr.to_string()]);

        let new = if ty.is_pointer() {
            let step = ty.deref().size_bytes().max(1);
            let dst = self.temps.fresh();
            self.writer.assign(&dst, QbeType::L, "add", &[cur.to_string(), step.to_string()]);
            dst
        } else {
            let dst = self.temps.fresh();
            self.writer
                .assign(&dst, value_type(&ty).arithmetic_type(), "add", &[cur.to_string(), "1".to_string()]);
            dst
        };
        self.writer.stmt(format!("{} {}, {}", store_opcode(&ty), new, addr));
        Ok((cur, ty))
    }

    fn analyze_cast(&mut self, target: Type, val: Operand, from: &Type, span: Span) -> Result<(Operand, Type), CompileError> {
        if target.kind == TypeKind::Function {
            return Err(UnsupportedError { span, what: "cast to a function type".to_string() }.into());
        }
        if target.kind == TypeKind::Float || from.kind == TypeKind::Float {
            return Err(UnsupportedError { span, what: "floating-point arithmetic".to_string() }.into());
        }

        let from_width = value_type(from).arithmetic_type();
        let to_width = value_type(&target).arithmetic_type();
        let widened = match (from_width, to_width) {
            (QbeType::W, QbeType::L) => {
                let dst = self.temps.fresh();
                let op = if from.is_signed { "extsw" } else { "extuw" };
                self.writer.assign(&dst, QbeType::L, op, &[val.to_string()]);
                dst
            }
            (QbeType::L, QbeType::W) => {
                let dst = self.temps.fresh();
                self.writer.assign(&dst, QbeType::W, "copy", &[val.to_string()]);
                dst
            }
            _ => val,
        };

        let result = if !target.is_pointer() && target.kind == TypeKind::Char {
            let dst = self.temps.fresh();
            let op = if target.is_signed { "extsb" } else { "extub" };
            self.writer.assign(&dst, QbeType::W, op, &[widened.to_string()]);
            dst
        } else {
            widened
        };
        Ok((result, target))
    }

    fn analyze_binary(&mut self, op: BinOp, lhs: NodeId, rhs: NodeId, span: Span) -> Result<(Operand, Type), CompileError> {
        let (lval, lty) = self.analyze_expr(lhs, false)?;
        let (rval, rty) = self.analyze_expr(rhs, false)?;

        if op.is_comparison() {
            return self.analyze_comparison(op, lval, lty, rval, rty, span);
        }

        match op {
            BinOp::Add | BinOp::Sub => self.analyze_add_sub(op, lval, lty, rval, rty, span),
            BinOp::Mul | BinOp::Div => self.analyze_mul_div(op, lval, lty, rval, rty, span),
            _ => unreachable!("assignment operators are statement-only"),
        }
    }

    fn analyze_add_sub(
        &mut self,
        op: BinOp,
        lval: Operand,
        lty: Type,
        rval: Operand,
        rty: Type,
        span: Span,
    ) -> Result<(Operand, Type), CompileError> {
        if lty.is_pointer() && rty.is_pointer() {
            return Err(TypeError::PointerArithmetic { span }.into());
        }
        if lty.is_pointer() {
            if !rty.is_numeric() {
                return Err(TypeError::NonPrimitiveOperand { span, op: op.text() }.into());
            }
            let scaled = self.scale_index(rval, &rty, lty.deref().size_bytes().max(1));
            let dst = self.temps.fresh();
            let opcode = if op == BinOp::Add { "add" } else { "sub" };
            self.writer.assign(&dst, QbeType::L, opcode, &[lval.to_string(), scaled.to_string()]);
            return Ok((dst, lty));
        }
        if rty.is_pointer() {
            if op == BinOp::Sub {
                return Err(TypeError::PointerArithmetic { span }.into());
            }
            if !lty.is_numeric() {
                return Err(TypeError::NonPrimitiveOperand { span, op: op.text() }.into());
            }
            let scaled = self.scale_index(lval, &lty, rty.deref().size_bytes().max(1));
            let dst = self.temps.fresh();
            self.writer.assign(&dst, QbeType::L, "add", &[rval.to_string(), scaled.to_string()]);
            return Ok((dst, rty));
        }

        if !lty.is_numeric() || !rty.is_numeric() {
            return Err(TypeError::NonPrimitiveOperand { span, op: op.text() }.into());
        }
        if lty.kind == TypeKind::Float || rty.kind == TypeKind::Float {
            return Err(UnsupportedError { span, what: "floating-point arithmetic".to_string() }.into());
        }
        let result_ty = self.unify_widths(&lty, &rty);
        let l2 = self.convert_value(lval, &lty, &result_ty);
        let r2 = self.convert_value(rval, &rty, &result_ty);
        let dst = self.temps.fresh();
        let opcode = if op == BinOp::Add { "add" } else { "sub" };
        self.writer
            .assign(&dst, value_type(&result_ty).arithmetic_type(), opcode, &[l2.to_string(), r2.to_string()]);
        Ok((dst, result_ty))
    }

    fn analyze_mul_div(
        &mut self,
        op: BinOp,
        lval: Operand,
        lty: Type,
        rval: Operand,
        rty: Type,
        span: Span,
    ) -> Result<(Operand, Type), CompileError> {
        if lty.is_pointer() || rty.is_pointer() {
            return Err(TypeError::PointerArithmetic { span }.into());
        }
        if !lty.is_numeric() || !rty.is_numeric() {
            return Err(TypeError::NonPrimitiveOperand { span, op: op.text() }.into());
        }
        if lty.kind == TypeKind::Float || rty.kind == TypeKind::Float {
            return Err(UnsupportedError { span, what: "floating-point arithmetic".to_string() }.into());
        }
        let result_ty = self.unify_widths(&lty, &rty);
        let l2 = self.convert_value(lval, &lty, &result_ty);
        let r2 = self.convert_value(rval, &rty, &result_ty);
        let dst = self.temps.fresh();
        let opcode = match op {
            BinOp::Mul => "mul",
            BinOp::Div if result_ty.is_signed => "div",
            BinOp::Div => "udiv",
            _ => unreachable!(),
        };
        self.writer
            .assign(&dst, value_type(&result_ty).arithmetic_type(), opcode, &[l2.to_string(), r2.to_string()]);
        Ok((dst, result_ty))
    }

    fn analyze_comparison(
        &mut self,
        op: BinOp,
        lval: Operand,
        lty: Type,
        rval: Operand,
        rty: Type,
        span: Span,
    ) -> Result<(Operand, Type), CompileError> {
        if (!lty.is_numeric() && !lty.is_pointer()) || (!rty.is_numeric() && !rty.is_pointer()) {
            return Err(TypeError::NonPrimitiveOperand { span, op: op.text() }.into());
        }
        if lty.kind == TypeKind::Float || rty.kind == TypeKind::Float {
            return Err(UnsupportedError { span, what: "floating-point arithmetic".to_string() }.into());
        }

        let unsigned = !lty.is_signed || !rty.is_signed;
        let (l2, r2) = if lty.is_pointer() || rty.is_pointer() {
            (lval, rval)
        } else {
            let wide = self.unify_widths(&lty, &rty);
            (self.convert_value(lval, &lty, &wide), self.convert_value(rval, &rty, &wide))
        };

        let (opcode, l3, r3) = match op {
            BinOp::Eq => ("ceq", l2, r2),
            BinOp::Ne => ("cne", l2, r2),
            BinOp::Gt => (if unsigned { "cugt" } else { "csgt" }, l2, r2),
            BinOp::Le => (if unsigned { "cule" } else { "csle" }, l2, r2),
            // `a < b` is `b > a`: the spec's vocabulary only names the
            // greater-than family, so `Lt` swaps operands into it.
            BinOp::Lt => (if unsigned { "cugt" } else { "csgt" }, r2, l2),
            _ => unreachable!("not a comparison operator"),
        };
        let dst = self.temps.fresh();
        self.writer.assign(&dst, QbeType::W, opcode, &[l3.to_string(), r3.to_string()]);
        Ok((dst, Type::int()))
    }

    fn analyze_call(&mut self, callee: NodeId, args: Vec<NodeId>, span: Span, emit_lvalue: bool) -> Result<(Operand, Type), CompileError> {
        if emit_lvalue {
            return Err(TypeError::LvalueRequired { span }.into());
        }

        let callee_name = match &self.ast.get(callee).kind {
            NodeKind::Identifier(sym) => sym.as_str().to_string(),
            _ => "<call target>".to_string(),
        };
        let (callee_op, callee_ty) = self.analyze_expr(callee, false)?;
        let func = callee_ty.func.clone().ok_or(TypeError::NotCallable { span })?;

        if !func.variadic && args.len() != func.params.len() {
            return Err(TypeError::ArityMismatch {
                span,
                callee: callee_name,
                expected: func.params.len(),
                found: args.len(),
            }
            .into());
        }
        if func.variadic && args.len() < func.params.len() {
            return Err(TypeError::ArityMismatch {
                span,
                callee: callee_name,
                expected: func.params.len(),
                found: args.len(),
            }
            .into());
        }

        let mut parts = Vec::with_capacity(args.len() + 1);
        for (index, &arg_id) in args.iter().take(func.params.len()).enumerate() {
            let (val, ty) = self.analyze_expr(arg_id, false)?;
            if !self.assignable(&ty, &func.params[index]) {
                return Err(TypeError::ArgumentMismatch { span, callee: callee_name.clone(), index }.into());
            }
            let converted = self.convert_value(val, &ty, &func.params[index]);
            parts.push(format!("{} {}", value_type(&func.params[index]), converted));
        }
        if func.variadic {
            parts.push("...".to_string());
            for &arg_id in &args[func.params.len()..] {
                let (val, ty) = self.analyze_expr(arg_id, false)?;
                parts.push(format!("{} {}", value_type(&ty), val));
            }
        }

        let ret_ty = func.return_type.clone();
        if ret_ty.is_void() {
            self.writer.stmt(format!("call {}({})", callee_op, parts.join(", ")));
            Ok((Operand::Const(0), Type::void()))
        } else {
            let dst = self.temps.fresh();
            self.writer
                .stmt(format!("{} ={} call {}({})", dst, value_type(&ret_ty).arithmetic_type(), callee_op, parts.join(", ")));
            Ok((dst, ret_ty))
        }
    }

    fn analyze_index(&mut self, base: NodeId, index: NodeId, span: Span, emit_lvalue: bool) -> Result<(Operand, Type), CompileError> {
        let (base_val, base_ty) = self.analyze_expr(base, false)?;
        if !base_ty.is_pointer() {
            return Err(TypeError::DerefNonPointer { span }.into());
        }
        let (idx_val, idx_ty) = self.analyze_expr(index, false)?;
        if !idx_ty.is_numeric() {
            return Err(TypeError::NonPrimitiveOperand { span, op: "[]" }.into());
        }
        let elem_ty = base_ty.deref();
        let scaled = self.scale_index(idx_val, &idx_ty, elem_ty.size_bytes().max(1));
        let addr = self.temps.fresh();
        self.writer.assign(&addr, QbeType::L, "add", &[base_val.to_string(), scaled.to_string()]);

        if emit_lvalue {
            Ok((addr, elem_ty))
        } else {
            let dst = self.temps.fresh();
            self.writer
                .assign(&dst, value_type(&elem_ty).arithmetic_type(), load_opcode(&elem_ty), &[addr.to_string()]);
            Ok((dst, elem_ty))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cqc_util::FileId;

    fn compile(src: &str) -> Result<String, CompileError> {
        let tokens = cqc_lex::tokenize(src, FileId::DUMMY).expect("lex failed");
        let ast = cqc_par::parse_translation_unit(&tokens).expect("parse failed");
        let mut out = Vec::new();
        compile_to_qbe(&ast, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn forward_decl_promotion_emits_one_definition() {
        let ir = compile("int f(int a); int f(int a) { return a; }").unwrap();
        assert_eq!(ir.matches("function").count(), 1);
    }

    #[test]
    fn mismatched_forward_decl_is_rejected() {
        let err = compile("int f(int a); int f(long a) { return a; }").unwrap_err();
        assert!(matches!(err, CompileError::Symbol(_)));
    }

    #[test]
    fn recursive_factorial_emits_a_call() {
        let src = "int fact(int n) { if (n <= 1) { return 1; } return n * fact(n - 1); }";
        let ir = compile(src).unwrap();
        assert!(ir.contains("call $fact"));
        assert!(ir.contains("csle"));
    }

    #[test]
    fn while_loop_emits_three_labels() {
        let src = "int main(void) { int i; i = 0; while (i < 3) { i = i + 1; } return i; }";
        let ir = compile(src).unwrap();
        assert!(ir.contains("@cond_"));
        assert!(ir.contains("@body_"));
        assert!(ir.contains("@loopend_"));
        assert!(ir.contains("csgt"));
    }

    #[test]
    fn undeclared_identifier_is_a_symbol_error() {
        let err = compile("int main(void) { return missing; }").unwrap_err();
        assert!(matches!(err, CompileError::Symbol(_)));
    }

    #[test]
    fn arity_mismatch_is_rejected() {
        let src = "int f(int a) { return a; } int main(void) { return f(1, 2); }";
        let err = compile(src).unwrap_err();
        assert!(matches!(err, CompileError::Type(TypeError::ArityMismatch { .. })));
    }

    #[test]
    fn calling_a_non_function_is_rejected() {
        let src = "int main(void) { int x; x = 0; return x(); }";
        let err = compile(src).unwrap_err();
        assert!(matches!(err, CompileError::Type(TypeError::NotCallable { .. })));
    }

    #[test]
    fn pointer_plus_pointer_is_rejected() {
        let src = "int main(void) { int *p; int *q; return p + q; }";
        let err = compile(src).unwrap_err();
        assert!(matches!(err, CompileError::Type(TypeError::PointerArithmetic { .. })));
    }

    #[test]
    fn redeclaration_in_the_same_scope_is_rejected() {
        let src = "int main(void) { int x; int x; return 0; }";
        let err = compile(src).unwrap_err();
        assert!(matches!(err, CompileError::Symbol(_)));
    }

    #[test]
    fn string_literal_becomes_a_data_blob() {
        let src = r#"int puts(char *s); int main(void) { return puts("hi"); }"#;
        let ir = compile(src).unwrap();
        assert!(ir.contains("data $_data_0"));
        assert!(ir.contains("104")); // 'h'
    }

    #[test]
    fn variadic_call_inserts_ellipsis_marker() {
        let src = "int printf(char *fmt, ...); int main(void) { return printf(\"x\", 1); }";
        let ir = compile(src).unwrap();
        assert!(ir.contains("..."));
    }

    #[test]
    fn dead_code_after_return_gets_a_synthetic_label() {
        let src = "int f(void) { return 1; return 2; }";
        let ir = compile(src).unwrap();
        assert!(ir.contains("@unreachable_"));
    }

    #[test]
    fn post_increment_on_pointer_scales_by_pointee_size() {
        let src = "int main(void) { long *p; p++; return 0; }";
        let ir = compile(src).unwrap();
        assert!(ir.contains(", 8"));
    }
}
