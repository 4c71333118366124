use crate::shared::{types::Type, value::Value};
use crate::frontend::ast::Position;
use crate::bytecode::compiler::ir::{Operand, Label};

/// Location and type of an evaluated expression.
#[derive(Clone, Debug, PartialEq)]
pub struct Slot {
    pub operand : Operand,
    pub ty      : Type,
    /// Compile time value, set for literals, constants and folded operations.
    pub value   : Option<Value>,
}

impl Slot {
    /// Slot of an expression that yields nothing.
    pub fn void() -> Self {
        Self { operand: Operand::Null, ty: Type::Void, value: None }
    }
    /// Slot of a runtime value.
    pub fn new(operand: Operand, ty: Type) -> Self {
        Self { operand, ty, value: None }
    }
    /// Returns a slot addressing `offset` words into this one.
    pub fn offset(self: &Self, offset: usize, ty: Type) -> Self {
        Self { operand: self.operand.offset(offset), ty, value: None }
    }
}

/// An assignable location.
#[derive(Clone, Debug)]
pub(crate) enum Place {
    /// A global or local word range.
    Direct(Slot),
    /// A field of an entity, written through an ADDRESS/STOREP pair.
    Field { entity: Slot, field: Slot, ty: Type },
    /// An element of a desugared array, accessed through its generated accessors.
    Array { name: String, index: Slot, ty: Type },
}

impl Place {
    /// Type of the value stored at this place.
    pub fn ty(self: &Self) -> &Type {
        match self {
            Place::Direct(slot) => &slot.ty,
            Place::Field { ty, .. } | Place::Array { ty, .. } => ty,
        }
    }
}

/// Operand of a jump instruction holding the jump distance.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum JumpOperand {
    A,
    B,
}

/// A jump awaiting resolution of its target label.
#[derive(Clone, Debug)]
pub(crate) struct PendingJump {
    /// Index of the jump record in the IR sequence.
    pub index   : usize,
    pub operand : JumpOperand,
    pub label   : Label,
    /// Position of the node that emitted the jump.
    pub position: Position,
}

/// Loop break/continue targets.
#[derive(Clone, Debug)]
pub(crate) struct LoopControl {
    pub break_label     : Label,
    /// Switch bodies do not accept `continue`, it applies to the enclosing loop instead.
    pub continue_label  : Option<Label>,
}

/// Tracks break/continue targets of the loops enclosing the current expression.
#[derive(Debug, Default)]
pub(crate) struct LoopControlStack {
    stack: Vec<LoopControl>,
}

impl LoopControlStack {
    /// Creates a new loop control stack.
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }
    /// Push another loop structure onto the loop control stack.
    pub fn push(self: &mut Self, break_label: Label, continue_label: Option<Label>) {
        self.stack.push(LoopControl { break_label, continue_label });
    }
    /// Pop the top loop structure off the loop control stack.
    pub fn pop(self: &mut Self) {
        self.stack.pop();
    }
    /// Target of a `break` in the current position.
    pub fn break_label(self: &Self) -> Option<&Label> {
        self.stack.last().map(|control| &control.break_label)
    }
    /// Target of a `continue` in the current position.
    pub fn continue_label(self: &Self) -> Option<&Label> {
        self.stack.iter().rev().find_map(|control| control.continue_label.as_ref())
    }
    /// Removes all entries, e.g. when a function body was rejected.
    pub fn clear(self: &mut Self) {
        self.stack.clear();
    }
}
