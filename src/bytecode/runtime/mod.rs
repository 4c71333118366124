//! Bytecode execution.

pub mod vm;
pub mod entities;
pub mod strings;
pub mod error;

pub use self::vm::{VM, VMState};
