use crate::util::*;
use progs::compiler::{generate, Generated, Operand};

fn generated(roots: &[ Expression ], options: CompilerOptions) -> Generated {
    init_logging();
    generate(roots, options).unwrap_or_else(|error| panic!("generation failed: {error}"))
}

fn sibling_blocks() -> Vec<Expression> {
    vec![ function("main", procedure(), &[], vec![
        block(vec![ decl_init("a", Type::Float, float(1.0)) ]),
        block(vec![ decl_init("b", Type::Float, float(2.0)) ]),
    ]) ]
}

#[test]
fn scope_folding() {
    let folded = generated(&sibling_blocks(), CompilerOptions::default());
    assert_eq!(folded.allocator.local_size(), 1);
    assert!(folded.allocator.entries().iter().any(|entry| entry.full_name() == "a|b"));
    let separate = generated(&sibling_blocks(), CompilerOptions { scope_folding: false, ..CompilerOptions::default() });
    assert_eq!(separate.allocator.local_size(), 2);
}

#[test]
fn overlapping_locals() {
    let roots = vec![
        function("first", procedure(), &[], vec![ decl_init("a", Type::Float, float(1.0)) ]),
        function("second", procedure(), &[], vec![ decl_init("b", Type::Float, float(2.0)) ]),
    ];
    let overlapping = generated(&roots, CompilerOptions::default());
    assert_eq!(overlapping.allocator.local_size(), 1);
    let separate = generated(&roots, CompilerOptions { overlap_locals: false, ..CompilerOptions::default() });
    assert_eq!(separate.allocator.local_size(), 2);
}

#[test]
fn constant_merging() {
    let roots = vec![ function("main", procedure(), &[], vec![
        decl_init("x", Type::Float, float(5.0)),
        decl_init("y", Type::Float, float(5.0)),
    ]) ];
    let count = |generated: &Generated| generated.allocator.entries().iter()
        .filter(|entry| entry.constant && entry.value == Some(Value::Float(5.0)))
        .count();
    assert_eq!(count(&generated(&roots, CompilerOptions::default())), 1);
    assert_eq!(count(&generated(&roots, CompilerOptions { merge_constants: false, ..CompilerOptions::default() })), 2);
}

#[test]
fn constant_folding() {
    let roots = program(vec![ emit(add(float(2.0), binary(Operator::Mul, float(3.0), float(4.0)))) ]);
    let has_arithmetic = |options| {
        let program = progs::compiler::compile(&roots, options).unwrap().program;
        program.statements.iter().any(|statement| matches!(statement.op, OpCode::ADD_FLOAT | OpCode::MUL_FLOAT))
    };
    assert!(!has_arithmetic(CompilerOptions::default()));
    assert!(has_arithmetic(CompilerOptions { fold_constants: false, ..CompilerOptions::default() }));
    assert_eq!(output(vec![ emit(add(float(2.0), binary(Operator::Mul, float(3.0), float(4.0)))) ]), vec![ "14" ]);
}

#[test]
fn globals_start_at_user_storage() {
    let roots = vec![ decl("first", Type::Float), decl("second", Type::Vector) ];
    let generated = generated(&roots, CompilerOptions { user_storage_start: 120, ..CompilerOptions::default() });
    let address = |name: &str| generated.allocator.entries().iter().find(|entry| entry.name == name).map(|entry| entry.address);
    assert_eq!(address("first"), Some(Operand::Global(120)));
    assert_eq!(address("second"), Some(Operand::Global(121)));
    assert_eq!(address("second_z"), Some(Operand::Global(123)));
    assert_eq!(generated.allocator.global_size(), 124);
}

#[test]
fn folding_matches_runtime() {
    let roots = program(vec![
        emit(binary(Operator::Div, int(7), int(2))),
        emit(binary(Operator::Sub, int(2), int(5))),
        emit(binary(Operator::Mul, int(3), float(0.5))),
        emit(unary(Operator::Neg, int(4))),
        emit(add(boolean(true), int(1))),
    ]);
    let run = |options| {
        let program = progs::compiler::compile(&roots, options).unwrap().program;
        let mut vm = VM::new(&program);
        vm.run("main").unwrap();
        vm.output().to_string()
    };
    let folded = run(CompilerOptions::default());
    assert_eq!(folded, "3.5 -3 1.5 -4 2 ");
    assert_eq!(folded, run(CompilerOptions { fold_constants: false, ..CompilerOptions::default() }));
}
