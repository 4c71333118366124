//! Control flow lowering. Jumps are emitted with pending operands and resolved by label once the function body is
//! complete, counting real records only.

use crate::prelude::*;
use crate::shared::types::Type;
use crate::frontend::{ast::{self, Expression, Position}, build};
use crate::bytecode::OpCode;
use crate::bytecode::compiler::{
    desugar,
    error::{CompileError, CompileErrorKind, CompileResult, OptionToCompileError},
    ir::{IrKind, Operand, Label},
    util::{Slot, PendingJump, JumpOperand},
};
use super::{Generator, operators::check_assignable};
use tracing::trace;

impl Generator {

    /// Returns a new anonymous label.
    pub(super) fn new_label(self: &mut Self) -> Label {
        self.next_label += 1;
        Label::Anonymous(self.next_label)
    }

    /// Marks the position of a label.
    pub(super) fn place_label(self: &mut Self, label: Label) {
        self.marker(IrKind::Label(label));
    }

    /// Emits a jump to a label. `GOTO` ignores the condition.
    pub(super) fn emit_jump(self: &mut Self, op: OpCode, condition: Operand, label: Label) {
        let (index, operand) = if op == OpCode::GOTO {
            (emit!(self, GOTO, Operand::Pending), JumpOperand::A)
        } else {
            (self.emit(op, condition, Operand::Pending, Operand::Null), JumpOperand::B)
        };
        self.jumps.push(PendingJump { index, operand, label, position: self.position });
    }

    fn require_function(self: &Self, what: &str, position: Position) -> CompileResult {
        if self.allocator.in_function() {
            Ok(())
        } else {
            Err(CompileError::new(&position, CompileErrorKind::Unsupported(format!("{what} outside of function"))))
        }
    }

    pub(super) fn lower_conditional(self: &mut Self, item: &ast::Conditional) -> CompileResult<Slot> {
        self.require_function("conditional", item.position)?;
        if item.value && item.otherwise.is_none() {
            return Err(CompileError::new(item, CompileErrorKind::Unsupported("conditional expression without else branch".to_string())));
        }
        let predicate = self.lower(&item.predicate)?;
        let otherwise_label = self.new_label();
        comment!(self, "if not {}", predicate.operand);
        self.emit_jump(OpCode::IFNOT, predicate.operand, otherwise_label.clone());
        let then = self.lower(&item.then)?;
        let result = if item.value {
            if then.ty == Type::Void {
                return Err(CompileError::new(item, CompileErrorKind::Unsupported("conditional expression without value".to_string())));
            }
            let result = self.temp(&then.ty)?;
            self.store(&then.ty, then.operand, result.operand);
            Some(result)
        } else {
            None
        };
        match &item.otherwise {
            Some(otherwise) => {
                let end = self.new_label();
                self.emit_jump(OpCode::GOTO, Operand::Null, end.clone());
                self.place_label(otherwise_label);
                let otherwise = self.lower(otherwise)?;
                if let Some(result) = &result {
                    check_assignable(&result.ty, &otherwise.ty, item)?;
                    self.store(&result.ty, otherwise.operand, result.operand);
                }
                self.place_label(end);
            },
            None => self.place_label(otherwise_label),
        }
        Ok(result.unwrap_or_else(Slot::void))
    }

    /// Lowers a loop in its own scope. Loops that are not `continuable` pass `continue` on to the enclosing loop.
    pub(super) fn lower_loop(self: &mut Self, item: &ast::Loop, continuable: bool) -> CompileResult<Slot> {
        self.require_function("loop", item.position)?;
        let scope = self.scope_id("loop");
        self.allocator.push(&scope);
        let result = self.lower_loop_parts(item, continuable);
        self.allocator.pop();
        result
    }

    fn lower_loop_parts(self: &mut Self, item: &ast::Loop, continuable: bool) -> CompileResult<Slot> {
        if let Some(init) = &item.init {
            self.lower(init)?;
        }
        let (begin, next, end) = (self.new_label(), self.new_label(), self.new_label());
        if let (true, Some(predicate)) = (item.check_before, &item.predicate) {
            let predicate = self.lower(predicate)?;
            comment!(self, "loop entry check");
            self.emit_jump(OpCode::IFNOT, predicate.operand, end.clone());
        }
        self.place_label(begin.clone());
        self.loops.push(end.clone(), if continuable { Some(next.clone()) } else { None });
        let body = self.lower(&item.body);
        self.loops.pop();
        body?;
        self.place_label(next);
        if let Some(update) = &item.update {
            self.lower(update)?;
        }
        match &item.predicate {
            Some(predicate) => {
                let predicate = self.lower(predicate)?;
                comment!(self, "loop check");
                self.emit_jump(OpCode::IF, predicate.operand, begin);
            },
            None => self.emit_jump(OpCode::GOTO, Operand::Null, begin),
        }
        self.place_label(end);
        Ok(Slot::void())
    }

    /// Stores the test value in a temporary, then lowers the desugared switch body as a loop running exactly once.
    pub(super) fn lower_switch(self: &mut Self, item: &ast::Switch) -> CompileResult<Slot> {
        self.require_function("switch", item.position)?;
        let id = self.next_switch;
        self.next_switch += 1;
        let scope = self.scope_id("switch");
        self.allocator.push(&scope);
        let result = self.lower_switch_body(item, id);
        self.allocator.pop();
        result
    }

    fn lower_switch_body(self: &mut Self, item: &ast::Switch, id: usize) -> CompileResult<Slot> {
        let test = self.lower(&item.test)?;
        let name = format!("switch#{id}");
        let entry = self.allocator.allocate_reference(&name, test.ty.clone(), None, item.position)?;
        let stored = self.allocator.entry(entry).address;
        comment!(self, "switch on {}", test.operand);
        self.store(&test.ty, test.operand, stored);
        let body = desugar::switch(&name, item, id)?;
        let once = ast::Loop {
            position    : item.position,
            init        : None,
            predicate   : Some(Box::new(build::boolean(false))),
            update      : None,
            body        : Box::new(Expression::Block(body)),
            check_before: false,
        };
        self.lower_loop(&once, false)
    }

    pub(super) fn lower_label(self: &mut Self, item: &ast::Label) -> CompileResult<Slot> {
        self.require_function("label", item.position)?;
        let label = Label::Named(item.name.clone());
        if item.name.contains('#') {
            self.marker(IrKind::Case(label));
        } else {
            self.place_label(label);
        }
        Ok(Slot::void())
    }

    pub(super) fn lower_goto(self: &mut Self, item: &ast::Goto) -> CompileResult<Slot> {
        self.require_function("goto", item.position)?;
        comment!(self, "goto {}", item.label);
        self.emit_jump(OpCode::GOTO, Operand::Null, Label::Named(item.label.clone()));
        Ok(Slot::void())
    }

    pub(super) fn lower_break(self: &mut Self, position: Position) -> CompileResult<Slot> {
        let label = self.loops.break_label().cloned()
            .ok_or_else(|| CompileError::new(&position, CompileErrorKind::Unsupported("break outside of loop or switch".to_string())))?;
        comment!(self, "break");
        self.emit_jump(OpCode::GOTO, Operand::Null, label);
        Ok(Slot::void())
    }

    pub(super) fn lower_continue(self: &mut Self, position: Position) -> CompileResult<Slot> {
        let label = self.loops.continue_label().cloned()
            .ok_or_else(|| CompileError::new(&position, CompileErrorKind::Unsupported("continue outside of loop".to_string())))?;
        comment!(self, "continue");
        self.emit_jump(OpCode::GOTO, Operand::Null, label);
        Ok(Slot::void())
    }

    /// Patches every pending jump of the current function with the distance in real records to its label.
    pub(super) fn resolve_jumps(self: &mut Self) -> CompileResult {
        let start = self.function_start.ice_msg("jump resolution outside of function")?;
        let mut real_index = Vec::with_capacity(self.ir.len() - start);
        let mut labels = Map::new();
        let mut count = 0i32;
        for record in &self.ir[start..] {
            real_index.push(count);
            match &record.kind {
                IrKind::Real { .. } => count += 1,
                IrKind::Label(label) | IrKind::Case(label) => { labels.entry(label.clone()).or_insert(count); },
                _ => { },
            }
        }
        for jump in std::mem::take(&mut self.jumps) {
            let target = *labels.get(&jump.label).ok_or_else(|| CompileError::new(&jump.position, CompileErrorKind::UnresolvedLabel(jump.label.to_string())))?;
            let distance = target - real_index.get(jump.index - start).ice()?;
            trace!("jump at {} to {} resolved to {distance:+}", jump.index, jump.label);
            match &mut self.ir[jump.index].kind {
                IrKind::Real { a, b, .. } => match jump.operand {
                    JumpOperand::A => *a = Operand::Relative(distance),
                    JumpOperand::B => *b = Operand::Relative(distance),
                },
                _ => return Err(CompileError::new(&jump.position, CompileErrorKind::Internal("jump is not a real record".to_string()))),
            }
        }
        Ok(())
    }
}
