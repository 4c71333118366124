use crate::prelude::*;
use crate::frontend::ast::{Positioned, Position};

/// Represents the various possible assembly error-kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum AssembleErrorKind {
    /// The global data region exceeds the addressable range or does not hold a referenced address.
    GlobalsOverflow(usize),
    /// A statement operand does not fit the 16 bit operand encoding.
    OperandOutOfRange(i64),
    /// Two sections of the program image overlap.
    SectionOverlap(&'static str),
    /// A jump was not resolved before assembly.
    PendingJump(usize),
}

/// Represents the various possible compiler error-kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum CompileErrorKind {
    /// No handler for the operator and operand types.
    UnknownOperator(String),
    UnresolvedSymbol(String),
    UnresolvedLabel(String),
    NotCallable(String),
    NotAssignable(String),
    Unsupported(String),
    /// The compiler options are inconsistent.
    InvalidOption(String),
    Assembly(AssembleErrorKind),
    Internal(String),
}

/// An error reported by the compiler.
#[derive(Clone, Debug)]
pub struct CompileError {
    kind: CompileErrorKind,
    position: Position,
}

impl CompileError {
    pub(crate) fn new(item: &dyn Positioned, kind: CompileErrorKind) -> CompileError {
        Self { kind, position: item.position() }
    }
    pub(crate) fn option(message: String) -> CompileError {
        Self { kind: CompileErrorKind::InvalidOption(message), position: Position(0) }
    }
    pub(crate) fn assembly(kind: AssembleErrorKind) -> CompileError {
        Self { kind: CompileErrorKind::Assembly(kind), position: Position(0) }
    }
    /// Compute 1-based line/column number in string.
    pub fn loc(self: &Self, input: &str) -> (u32, u32) {
        self.position.loc(input)
    }
    /// The kind of the error.
    pub fn kind(self: &Self) -> &CompileErrorKind {
        &self.kind
    }
    /// Position of the node that caused the error.
    pub fn position(self: &Self) -> Position {
        self.position
    }
}

impl Display for CompileError {
    fn fmt(self: &Self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            CompileErrorKind::UnknownOperator(operation) => write!(f, "No operator {operation}"),
            CompileErrorKind::UnresolvedSymbol(name) => write!(f, "Unresolved symbol '{name}'"),
            CompileErrorKind::UnresolvedLabel(name) => write!(f, "Unresolved label '{name}'"),
            CompileErrorKind::NotCallable(name) => write!(f, "'{name}' is not callable"),
            CompileErrorKind::NotAssignable(what) => write!(f, "Cannot assign to {what}"),
            CompileErrorKind::Unsupported(what) => write!(f, "Unsupported: {what}"),
            CompileErrorKind::InvalidOption(what) => write!(f, "Invalid option: {what}"),
            CompileErrorKind::Assembly(AssembleErrorKind::GlobalsOverflow(size)) => write!(f, "Global data region of {size} words is too large"),
            CompileErrorKind::Assembly(AssembleErrorKind::OperandOutOfRange(operand)) => write!(f, "Operand {operand} out of range"),
            CompileErrorKind::Assembly(AssembleErrorKind::SectionOverlap(section)) => write!(f, "Section '{section}' overlaps its predecessor"),
            CompileErrorKind::Assembly(AssembleErrorKind::PendingJump(index)) => write!(f, "Unresolved jump at instruction {index}"),
            CompileErrorKind::Internal(msg) => write!(f, "Internal compiler error: {msg}"),
        }
    }
}

pub type CompileResult<T = ()> = Result<T, CompileError>;

/// Trait to convert an Option to a Result compatible with CompileResult
pub(crate) trait OptionToCompileError<T> {
    fn ice_msg(self: Self, message: &str) -> CompileResult<T>;
    fn ice(self: Self) -> CompileResult<T>;
}

impl<T> OptionToCompileError<T> for Option<T> {
    fn ice_msg(self: Self, message: &str) -> CompileResult<T> {
        if let Some(result) = self {
            Ok(result)
        } else {
            Err(CompileError {
                kind: CompileErrorKind::Internal(message.to_string()),
                position: Position(0),
            })
        }
    }
    fn ice(self: Self) -> CompileResult<T> {
        self.ice_msg("Expectation failed.")
    }
}

/// Kinds of compiler warnings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A name was declared again in the same scope. The latest declaration is used.
    Redeclaration,
    /// A function body was defined again. The latest definition is used.
    Redefinition,
    /// A call passed more arguments than the VM supports. Excess arguments are dropped.
    ArityTruncated,
    /// A local was read before any assignment to it. It holds whatever its slot held before.
    UsedBeforeAssigned,
}

/// A warning reported during compilation. Compilation continues with a defined fallback.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub kind    : DiagnosticKind,
    pub message : String,
    pub position: Position,
}

impl Display for Diagnostic {
    fn fmt(self: &Self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "warning {}: {}", self.position, self.message)
    }
}
