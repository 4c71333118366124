//! Progs bytecode: instruction set, program image, generation and execution.

#[path="macros/macros.rs"]
#[macro_use]
mod macros;
pub mod opcodes;
pub mod builtins;
pub mod program;
pub mod listing;
#[cfg(feature="compiler")]
pub mod compiler;
#[cfg(feature="runtime")]
pub mod runtime;

use crate::prelude::*;
use crate::config::Operand;
use crate::shared::types::DefType;

pub use opcodes::OpCode;
pub use builtins::Builtin;
pub use program::{Program, ProgramError, ProgramErrorKind, ProgramResult};

/// A single fixed width instruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Statement {
    pub op  : OpCode,
    pub a   : Operand,
    pub b   : Operand,
    pub c   : Operand,
}

impl Statement {
    /// Creates a new statement.
    pub fn new(op: OpCode, a: Operand, b: Operand, c: Operand) -> Self {
        Self { op, a, b, c }
    }
}

impl Display for Statement {
    fn fmt(self: &Self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<13} {} {} {}", self.op.mnemonic(), self.a, self.b, self.c)
    }
}

/// Converts a statement operand to a global word address. Operands address the full unsigned 16 bit range.
pub fn operand_address(operand: Operand) -> usize {
    operand as u16 as usize
}

/// A named, typed word of the global data region or of the entity record.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Definition {
    pub ty      : DefType,
    pub offset  : u16,
    /// Offset of the name in the string pool.
    pub name    : i32,
}

/// A function record. Builtins store the negated builtin id as their first statement.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct Function {
    pub first_statement : i32,
    pub first_local     : i32,
    pub num_locals      : i32,
    pub profile         : i32,
    /// Offset of the name in the string pool.
    pub name            : i32,
    /// Offset of the source file name in the string pool.
    pub file            : i32,
    pub num_params      : i32,
    /// Size in words of each parameter.
    pub param_sizes     : [u8; 8],
}

impl Function {
    /// Returns the builtin id if this function is implemented by the host.
    pub fn builtin_id(self: &Self) -> Option<i32> {
        if self.first_statement < 0 {
            Some(-self.first_statement)
        } else {
            None
        }
    }
}
