
pub use crate::shared::error::Error;
pub use crate::config::CompilerOptions;
pub use crate::bytecode::{Program, ProgramError, ProgramErrorKind, Statement, Definition, Function, OpCode, Builtin};
pub use crate::bytecode::listing::disassemble;

pub mod ast {
    //! Typed expression tree handed over by a parser.
    pub use crate::frontend::ast::*;
    pub use crate::shared::{types::{Type, FunctionType, Member as StructMember, DefType}, value::Value, operator::Operator};
    pub mod build {
        //! Expression tree constructors.
        pub use crate::frontend::build::*;
    }
}

#[cfg(feature="compiler")]
pub mod compiler {
    //! IR generation and assembly.
    pub use crate::bytecode::compiler::{compile, generate, Compiled, Generated};
    pub use crate::bytecode::compiler::error::{CompileError, CompileErrorKind, AssembleErrorKind, Diagnostic, DiagnosticKind};
    pub use crate::bytecode::compiler::allocator::{Allocator, Entry, EntryId, Binding};
    pub use crate::bytecode::compiler::ir::{Ir, IrKind, Operand, Label, render};
    pub use crate::bytecode::compiler::assembler::assemble;
    pub use crate::bytecode::listing::{parse_listing, ListingError, ListingErrorKind};
}

#[cfg(feature="runtime")]
pub mod runtime {
    //! Bytecode execution.
    pub use crate::bytecode::runtime::{vm::{VM, VMState, MAX_CALL_DEPTH}, error::{RuntimeError, RuntimeErrorKind}};
    pub use crate::bytecode::runtime::{entities::Entities, strings::Strings};
}
