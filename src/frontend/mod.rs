//! Compiler frontend interface. An external parser produces the typed expression tree defined here.

pub mod ast;
pub mod build;
