//! Progs, a compiler back-end and virtual machine for Quake-style progs bytecode.
//!
//! The compiler lowers a typed expression tree (see `ast`) to a linear IR, assigns global, local and constant
//! storage and assembles a binary program image. The runtime executes such images.

pub mod config;
pub mod shared;
pub mod frontend;
#[macro_use]
pub mod bytecode;

mod interface;
pub use interface::*;

pub(crate) mod prelude {
    pub use std::fmt::{self, Display, Debug};
    pub use std::hash::{Hash, Hasher};
    pub use std::collections::{HashMap as Map, HashSet as Set};
}

/// Compiles the given expression tree roots to a program image.
#[cfg(feature="compiler")]
pub fn compile(roots: &[ frontend::ast::Expression ], options: CompilerOptions) -> Result<Program, Error> {
    Ok(bytecode::compiler::compile(roots, options)?.program)
}

/// One stop shop to create a VM for the given program and run the named function to completion.
///
/// Inspect the returned `VM` for results, e.g. via `return_float` or `output`.
#[cfg(feature="runtime")]
pub fn run(program: &Program, function: &str) -> Result<runtime::VM, Error> {
    let mut vm = runtime::VM::new(program);
    vm.run(function)?;
    Ok(vm)
}
