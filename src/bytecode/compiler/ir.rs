//! Linear intermediate representation. Real records become statements, markers are removed during assembly.

use crate::prelude::*;
use crate::bytecode::OpCode;

/// An instruction operand before assembly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    /// Unused operand, encoded as 0.
    Null,
    /// Global word address.
    Global(usize),
    /// Word offset within the shared local region. Mapped to a global address during assembly.
    Local(usize),
    /// Resolved relative jump distance in real instructions.
    Relative(i32),
    /// Jump distance awaiting label resolution.
    Pending,
}

impl Operand {
    /// Returns the operand `offset` words further into the same address space.
    pub fn offset(self: &Self, offset: usize) -> Operand {
        match *self {
            Operand::Global(address) => Operand::Global(address + offset),
            Operand::Local(address) => Operand::Local(address + offset),
            other => other,
        }
    }
    /// Whether the operand is a local address.
    pub fn is_local(self: &Self) -> bool {
        matches!(self, Operand::Local(_))
    }
}

impl Display for Operand {
    fn fmt(self: &Self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Null => write!(f, "-"),
            Operand::Global(address) => write!(f, "${address}"),
            Operand::Local(address) => write!(f, "%{address}"),
            Operand::Relative(distance) => write!(f, "{distance:+}"),
            Operand::Pending => write!(f, "?"),
        }
    }
}

/// Jump target within a function.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Label {
    /// Label named in the expression tree (or synthesized for switch cases).
    Named(String),
    /// Label generated for control flow lowering.
    Anonymous(usize),
}

impl Display for Label {
    fn fmt(self: &Self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Named(name) => write!(f, "{name}"),
            Label::Anonymous(id) => write!(f, "@{id}"),
        }
    }
}

/// Kind of an IR record.
#[derive(Clone, Debug, PartialEq)]
pub enum IrKind {
    /// An executable instruction.
    Real { op: OpCode, a: Operand, b: Operand, c: Operand },
    /// Start of the function with the given index.
    Function { name: String, index: usize },
    /// Jump target.
    Label(Label),
    /// Switch case jump target.
    Case(Label),
    /// The value of an expression lives at an existing address, no instruction required.
    Reference(Operand),
}

/// An IR record.
#[derive(Clone, Debug, PartialEq)]
pub struct Ir {
    pub kind    : IrKind,
    pub comment : String,
}

impl Ir {
    /// Creates a real record.
    pub fn real(op: OpCode, a: Operand, b: Operand, c: Operand, comment: String) -> Self {
        Self { kind: IrKind::Real { op, a, b, c }, comment }
    }
    /// Creates a marker record.
    pub fn marker(kind: IrKind) -> Self {
        Self { kind, comment: String::new() }
    }
    /// Whether the record becomes a statement.
    pub fn is_real(self: &Self) -> bool {
        matches!(self.kind, IrKind::Real { .. })
    }
}

impl Display for Ir {
    fn fmt(self: &Self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IrKind::Real { op, a, b, c } => {
                write!(f, "    {:<13} {a}, {b}, {c}", op.mnemonic())?;
                if !self.comment.is_empty() {
                    write!(f, " ; {}", self.comment)?;
                }
                Ok(())
            },
            IrKind::Function { name, index } => write!(f, ".func {name} = ${index}"),
            IrKind::Label(label) => write!(f, "  {label}:"),
            IrKind::Case(label) => write!(f, "  case {label}:"),
            IrKind::Reference(operand) => write!(f, "    ; ref {operand}"),
        }
    }
}

/// Renders an IR sequence, grouping each function into a `.func name = $index { ... }` block.
pub fn render(ir: &[ Ir ]) -> String {
    let mut result = String::new();
    let mut open = false;
    for record in ir {
        if let IrKind::Function { .. } = record.kind {
            if open {
                result.push_str("}\n");
            }
            result.push_str(&format!("{record} {{\n"));
            open = true;
        } else {
            result.push_str(&format!("{record}\n"));
        }
    }
    if open {
        result.push_str("}\n");
    }
    result
}
