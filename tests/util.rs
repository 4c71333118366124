#![allow(dead_code)]

pub use progs::{compile, run, CompilerOptions, Program, OpCode, Error};
pub use progs::ast::{Expression, Type, Value, Operator, build::*};
pub use progs::runtime::{VM, VMState, RuntimeErrorKind};
pub use progs::compiler::{CompileErrorKind, Diagnostic, DiagnosticKind};

use tracing_subscriber::EnvFilter;

/// Enables log output for the current test, filtered by `RUST_LOG`.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Signature of a function without parameters and return value.
pub fn procedure() -> Type {
    Type::function(Type::Void, vec![])
}

/// Builtin declarations followed by the given roots.
pub fn with_builtins(roots: Vec<Expression>) -> Vec<Expression> {
    let mut result = builtin_declarations();
    result.extend(roots);
    result
}

/// Builtin declarations followed by a `main` function with the given body.
pub fn program(body: Vec<Expression>) -> Vec<Expression> {
    with_builtins(vec![ function("main", procedure(), &[], body) ])
}

/// Compiles the given roots with default options, panicking on error.
pub fn build(roots: &[ Expression ]) -> Program {
    init_logging();
    compile(roots, CompilerOptions::default()).unwrap_or_else(|error| panic!("compilation failed: {error}"))
}

/// Compiles the given roots and runs `main` to completion.
pub fn execute(roots: &[ Expression ]) -> VM {
    let program = build(roots);
    let vm = run(&program, "main").unwrap_or_else(|error| panic!("execution failed: {error}"));
    assert_eq!(vm.state(), VMState::Terminated);
    vm
}

/// Prints a float followed by a separator. Use with `output` to collect the printed values.
pub fn emit(value: Expression) -> Expression {
    call("print", vec![ call("ftos", vec![ value ]), string(" ") ])
}

/// Prints a string followed by a separator.
pub fn emit_str(value: Expression) -> Expression {
    call("print", vec![ value, string(" ") ])
}

/// Runs a `main` function with the given body and returns the values it printed.
pub fn output(body: Vec<Expression>) -> Vec<String> {
    printed(&execute(&program(body)))
}

/// Values printed by the program run in the given VM.
pub fn printed(vm: &VM) -> Vec<String> {
    vm.output().split_whitespace().map(|value| value.to_string()).collect()
}

/// Compare printed values with expected values.
pub fn assert_all(result: &[ String ], expected: &[ &str ]) {
    for index in 0..expected.len().min(result.len()) {
        assert!(result[index] == expected[index], "Result <{}> did not match expected <{}> at index {}", result[index], expected[index], index);
    }
    assert!(result.len() == expected.len(), "Result length {} did not match expected length {} ({:?})", result.len(), expected.len(), result);
}

/// Compiles the given roots, expecting a compile error.
pub fn compile_error(roots: &[ Expression ]) -> CompileErrorKind {
    init_logging();
    match compile(roots, CompilerOptions::default()) {
        Err(Error::CompileError(error)) => error.kind().clone(),
        Err(other) => panic!("expected compile error, got {other}"),
        Ok(_) => panic!("expected compile error"),
    }
}

pub fn add(left: Expression, right: Expression) -> Expression {
    binary(Operator::Add, left, right)
}

pub fn lt(left: Expression, right: Expression) -> Expression {
    binary(Operator::Lt, left, right)
}

pub fn eq(left: Expression, right: Expression) -> Expression {
    binary(Operator::Eq, left, right)
}

pub fn post_inc(expr: Expression) -> Expression {
    unary(Operator::PostInc, expr)
}
