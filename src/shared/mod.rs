//! Code shared by compiler and runtime: values, types, operator dispatch and the crate level error.

pub mod value;
pub mod types;
pub mod operator;
pub mod error;
