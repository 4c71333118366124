//! Operator lowering through the handlers returned by operator dispatch.

use crate::shared::{types::Type, value::Value, operator::{self, Operator, Handler}};
use crate::frontend::ast::{self, Expression, Positioned};
use crate::bytecode::OpCode;
use crate::bytecode::compiler::{
    error::{CompileError, CompileErrorKind, CompileResult},
    ir::Operand,
    util::{Place, Slot},
};
use super::Generator;

/// Fails unless a value of type `right` can be stored in a location of type `left`.
pub(super) fn check_assignable(left: &Type, right: &Type, item: &dyn Positioned) -> CompileResult {
    match operator::resolve(Operator::Assign, left, Some(right)) {
        Some(Handler::Assign { .. }) => Ok(()),
        _ => Err(unknown_operator(Operator::Assign, left, Some(right), item)),
    }
}

fn unknown_operator(op: Operator, left: &Type, right: Option<&Type>, item: &dyn Positioned) -> CompileError {
    let operation = match right {
        Some(right) => format!("{left} {op} {right}"),
        None => format!("{op}{left}"),
    };
    CompileError::new(item, CompileErrorKind::UnknownOperator(operation))
}

fn unexpected(handler: &Handler, item: &dyn Positioned) -> CompileError {
    CompileError::new(item, CompileErrorKind::Internal(format!("unexpected handler {handler:?}")))
}

impl Generator {

    pub(super) fn lower_binary(self: &mut Self, item: &ast::BinaryOp) -> CompileResult<Slot> {
        match item.op {
            Operator::And | Operator::Or => return self.lower_logical(item),
            op if op.is_assignment() => return self.lower_assignment(item),
            _ => { },
        }
        let left = self.lower(&item.left)?;
        let right = self.lower(&item.right)?;
        self.apply_binary(item.op, &left, &right, item)
    }

    /// Emits the code of a binary operator over evaluated operands.
    fn apply_binary(self: &mut Self, op: Operator, left: &Slot, right: &Slot, item: &dyn Positioned) -> CompileResult<Slot> {
        let handler = operator::resolve(op, &left.ty, Some(&right.ty)).ok_or_else(|| unknown_operator(op, &left.ty, Some(&right.ty), item))?;
        if let Some(folded) = self.fold_binary(op, left, right, &handler) {
            return Ok(folded);
        }
        comment!(self, "{} {op} {}", left.operand, right.operand);
        match handler {
            Handler::Binary { opcode, ty } => {
                let result = self.temp(&ty)?;
                self.emit(opcode, left.operand, right.operand, result.operand);
                Ok(result)
            },
            Handler::Call { function, ty } => {
                let callee = self.function_slot(function, item)?;
                let result = self.emit_call(function, &callee, vec![ left.clone(), right.clone() ], item)?;
                Ok(Slot { ty, ..result })
            },
            Handler::ScaleInverse => {
                let one = self.constant(Value::Float(1.0), Type::Float);
                let inverse = self.temp(&Type::Float)?;
                emit!(self, DIV_FLOAT, one.operand, right.operand, inverse.operand);
                let result = self.temp(&Type::Vector)?;
                emit!(self, MUL_VEC_FLOAT, left.operand, inverse.operand, result.operand);
                Ok(result)
            },
            Handler::Comma(_) => Ok(right.clone()),
            other => Err(unexpected(&other, item)),
        }
    }

    /// Evaluates arithmetic over two constants at compile time.
    fn fold_binary(self: &mut Self, op: Operator, left: &Slot, right: &Slot, handler: &Handler) -> Option<Slot> {
        if !self.allocator.options().fold_constants {
            return None;
        }
        let (l, r) = (left.value.as_ref()?, right.value.as_ref()?);
        let value = match op {
            Operator::Add => l.add(r),
            Operator::Sub => l.sub(r),
            Operator::Mul => l.mul(r),
            Operator::Div => l.div(r),
            Operator::Rem => l.rem(r),
            _ => None,
        }?;
        Some(self.constant(value, handler.result_type()))
    }

    /// Short circuiting `&&` and `||`. The result starts out as the value the left operand alone can decide and is
    /// flipped only if both operands were evaluated.
    fn lower_logical(self: &mut Self, item: &ast::BinaryOp) -> CompileResult<Slot> {
        let and = item.op == Operator::And;
        let (decided, undecided, jump) = if and { (0.0, 1.0, OpCode::IFNOT) } else { (1.0, 0.0, OpCode::IF) };
        let left = self.lower(&item.left)?;
        let result = self.temp(&Type::Bool)?;
        let decided = self.constant(Value::Float(decided), Type::Bool);
        self.store(&Type::Bool, decided.operand, result.operand);
        let end = self.new_label();
        comment!(self, "short circuit {}", item.op);
        self.emit_jump(jump, left.operand, end.clone());
        let right = self.lower(&item.right)?;
        self.emit_jump(jump, right.operand, end.clone());
        let undecided = self.constant(Value::Float(undecided), Type::Bool);
        self.store(&Type::Bool, undecided.operand, result.operand);
        self.place_label(end);
        Ok(result)
    }

    /// Plain and compound assignment.
    fn lower_assignment(self: &mut Self, item: &ast::BinaryOp) -> CompileResult<Slot> {
        if !matches!(*item.left, Expression::Reference(_) | Expression::Member(_) | Expression::Index(_)) {
            return Err(CompileError::new(item, CompileErrorKind::NotAssignable("expression".to_string())));
        }
        let place = self.place(&item.left)?;
        let value = self.lower(&item.right)?;
        let handler = operator::resolve(item.op, place.ty(), Some(&value.ty)).ok_or_else(|| unknown_operator(item.op, place.ty(), Some(&value.ty), item))?;
        let value = match handler {
            Handler::Assign { compound: Some(op), .. } => {
                if let (Expression::Reference(reference), Place::Direct(slot)) = (&*item.left, &place) {
                    if slot.value.is_none() {
                        self.allocator.check_assigned(&reference.name, slot.operand, slot.ty.size(), item.position);
                    }
                }
                let current = self.read(&place, item)?;
                self.apply_binary(op, &current, &value, item)?
            },
            Handler::Assign { compound: None, .. } => value,
            other => return Err(unexpected(&other, item)),
        };
        comment!(self, "assign {}", value.operand);
        self.write(&place, &value, item)
    }

    pub(super) fn lower_unary(self: &mut Self, item: &ast::UnaryOp) -> CompileResult<Slot> {
        if matches!(item.op, Operator::PreInc | Operator::PreDec | Operator::PostInc | Operator::PostDec) {
            return self.lower_step(item);
        }
        let operand = self.lower(&item.expr)?;
        let handler = operator::resolve(item.op, &operand.ty, None).ok_or_else(|| unknown_operator(item.op, &operand.ty, None, item))?;
        if item.op == Operator::Neg && self.allocator.options().fold_constants {
            if let Some(value) = operand.value.as_ref().and_then(|value| value.neg()) {
                return Ok(self.constant(value, handler.result_type()));
            }
        }
        comment!(self, "{}{}", item.op, operand.operand);
        match handler {
            Handler::Negate(ty) => {
                let (zero, opcode) = if ty == Type::Vector {
                    (Value::Vector([ 0.0; 3 ]), OpCode::SUB_VEC)
                } else {
                    (Value::Float(0.0), OpCode::SUB_FLOAT)
                };
                let zero = self.constant(zero, ty.clone());
                let result = self.temp(&ty)?;
                self.emit(opcode, zero.operand, operand.operand, result.operand);
                Ok(result)
            },
            Handler::Complement(ty) => {
                let minus_one = self.constant(Value::Float(-1.0), Type::Float);
                let result = self.temp(&ty)?;
                emit!(self, SUB_FLOAT, minus_one.operand, operand.operand, result.operand);
                Ok(result)
            },
            Handler::IsZero => {
                let zero = self.constant(Value::Float(0.0), Type::Float);
                let result = self.temp(&Type::Bool)?;
                emit!(self, EQ_FLOAT, zero.operand, operand.operand, result.operand);
                Ok(result)
            },
            Handler::Identity(_) => Ok(operand),
            Handler::Unary { opcode, ty } => {
                let result = self.temp(&ty)?;
                self.emit(opcode, operand.operand, Operand::Null, result.operand);
                Ok(result)
            },
            other => Err(unexpected(&other, item)),
        }
    }

    /// Pre/post increment and decrement. Post variants yield a copy of the previous value.
    fn lower_step(self: &mut Self, item: &ast::UnaryOp) -> CompileResult<Slot> {
        if !matches!(*item.expr, Expression::Reference(_) | Expression::Member(_) | Expression::Index(_)) {
            return Err(CompileError::new(item, CompileErrorKind::NotAssignable("expression".to_string())));
        }
        let place = self.place(&item.expr)?;
        let handler = operator::resolve(item.op, place.ty(), None).ok_or_else(|| unknown_operator(item.op, place.ty(), None, item))?;
        let (ty, delta, post) = match handler {
            Handler::Step { ty, delta, post } => (ty, delta, post),
            other => return Err(unexpected(&other, item)),
        };
        let current = self.read(&place, item)?;
        let previous = if post {
            let previous = self.temp(&ty)?;
            self.store(&ty, current.operand, previous.operand);
            Some(previous)
        } else {
            None
        };
        let delta = self.constant(Value::Float(delta), Type::Float);
        let next = self.temp(&ty)?;
        comment!(self, "{}{}", item.op, current.operand);
        emit!(self, ADD_FLOAT, current.operand, delta.operand, next.operand);
        let stored = self.write(&place, &next, item)?;
        Ok(previous.unwrap_or(stored))
    }
}
