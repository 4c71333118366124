use crate::prelude::*;

/// Represents the various possible runtime error-kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum RuntimeErrorKind {
    /// VM is not in a state that allows execution.
    NotReady,
    /// Entity index is not a live entity.
    EntityOutOfBounds(i32),
    /// Field offset plus access size exceeds the entity record.
    FieldOutOfBounds(i32),
    /// Attempted to write a field of the world entity.
    WorldWrite,
    /// Global word address outside of the global data region.
    GlobalOutOfBounds(usize),
    /// Builtin id has no host implementation.
    UndefinedBuiltin(i32),
    /// Function index or name does not exist.
    UndefinedFunction(String),
    /// Jump target outside of the statement table.
    BadJump(i64),
    /// Instruction or operation not supported by this VM.
    Unsupported(String),
    /// The `assert` builtin failed.
    AssertionFailed(String),
    /// The `error` builtin was called or a builtin received an unusable argument.
    BuiltinArgument(String),
    /// Call depth exceeded.
    StackOverflow,
}

/// An error reported by the runtime.
#[derive(Clone, Debug)]
pub struct RuntimeError {
    kind: RuntimeErrorKind,
    offset: usize,
}

impl RuntimeError {
    pub(crate) fn new(offset: usize, kind: RuntimeErrorKind) -> RuntimeError {
        Self { kind, offset }
    }
    /// The kind of the error.
    pub fn kind(self: &Self) -> &RuntimeErrorKind {
        &self.kind
    }
    /// Statement index of the error.
    pub fn offset(self: &Self) -> usize {
        self.offset
    }
}

impl Display for RuntimeError {
    fn fmt(self: &Self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            RuntimeErrorKind::NotReady => write!(f, "VM state is not ready."),
            RuntimeErrorKind::EntityOutOfBounds(entity) => write!(f, "Entity {entity} out of bounds at statement {}.", self.offset),
            RuntimeErrorKind::FieldOutOfBounds(field) => write!(f, "Field {field} out of bounds at statement {}.", self.offset),
            RuntimeErrorKind::WorldWrite => write!(f, "Attempted to write to the world entity at statement {}.", self.offset),
            RuntimeErrorKind::GlobalOutOfBounds(address) => write!(f, "Global address {address} out of bounds at statement {}.", self.offset),
            RuntimeErrorKind::UndefinedBuiltin(id) => write!(f, "Undefined builtin #{id} at statement {}.", self.offset),
            RuntimeErrorKind::UndefinedFunction(name) => write!(f, "Undefined function '{name}'."),
            RuntimeErrorKind::BadJump(target) => write!(f, "Jump to {target} at statement {} is outside the program.", self.offset),
            RuntimeErrorKind::Unsupported(what) => write!(f, "Unsupported operation {what} at statement {}.", self.offset),
            RuntimeErrorKind::AssertionFailed(message) => write!(f, "Assertion failed: {message}"),
            RuntimeErrorKind::BuiltinArgument(message) => write!(f, "{message}"),
            RuntimeErrorKind::StackOverflow => write!(f, "Call stack overflow at statement {}.", self.offset),
        }
    }
}

pub type RuntimeResult<T = ()> = Result<T, RuntimeError>;
