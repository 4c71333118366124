use crate::util::*;

fn sub(left: Expression, right: Expression) -> Expression {
    binary(Operator::Sub, left, right)
}

#[test]
fn recursion() {
    let roots = with_builtins(vec![
        function("fib", Type::function(Type::Float, vec![ Type::Float ]), &[ "n" ], vec![
            if_else(lt(var("n"), float(2.0)),
                ret(Some(var("n"))),
                Some(ret(Some(add(call("fib", vec![ sub(var("n"), float(1.0)) ]), call("fib", vec![ sub(var("n"), float(2.0)) ]))))),
            ),
        ]),
        function("main", procedure(), &[], vec![
            emit(call("fib", vec![ float(1.0) ])),
            emit(call("fib", vec![ float(2.0) ])),
            emit(call("fib", vec![ float(5.0) ])),
            emit(call("fib", vec![ float(7.0) ])),
        ]),
    ]);
    assert_all(&printed(&execute(&roots)), &[ "1", "1", "5", "13" ]);
}

#[test]
fn locals_survive_calls() {
    let roots = with_builtins(vec![
        function("clobber", Type::function(Type::Float, vec![ Type::Float ]), &[ "a" ], vec![
            decl_init("b", Type::Float, float(100.0)),
            ret(Some(add(var("a"), var("b")))),
        ]),
        function("main", procedure(), &[], vec![
            decl_init("x", Type::Float, float(1.0)),
            decl_init("y", Type::Float, call("clobber", vec![ float(2.0) ])),
            emit(var("x")),
            emit(var("y")),
        ]),
    ]);
    assert_all(&printed(&execute(&roots)), &[ "1", "102" ]);
}

#[test]
fn vector_parameters() {
    let vector_fn = Type::function(Type::Vector, vec![ Type::Vector, Type::Float ]);
    let roots = with_builtins(vec![
        function("scale", vector_fn, &[ "v", "s" ], vec![
            ret(Some(binary(Operator::Mul, var("v"), var("s")))),
        ]),
        function("main", procedure(), &[], vec![
            decl_init("v", Type::Vector, call("scale", vec![ vector(1.0, 2.0, 3.0), float(2.0) ])),
            emit(member(var("v"), "x")),
            emit(member(var("v"), "y")),
            emit(var("v_z")),
        ]),
    ]);
    assert_all(&printed(&execute(&roots)), &[ "2", "4", "6" ]);
}

#[test]
fn eight_parameters() {
    let params = [ "a", "b", "c", "d", "e", "f", "g", "h" ];
    let sum = params.iter().skip(1).fold(var("a"), |sum, name| add(sum, var(name)));
    let roots = with_builtins(vec![
        function("sum", Type::function(Type::Float, vec![ Type::Float; 8 ]), &params, vec![ ret(Some(sum)) ]),
        function("main", procedure(), &[], vec![
            emit(call("sum", (1..=8).map(|value| float(value as f32)).collect())),
        ]),
    ]);
    assert_all(&printed(&execute(&roots)), &[ "36" ]);
}

#[test]
fn prototype_then_definition() {
    let signature = Type::function(Type::Float, vec![]);
    let roots = with_builtins(vec![
        prototype("later", signature.clone(), &[]),
        function("main", procedure(), &[], vec![ emit(call("later", vec![])) ]),
        function("later", signature, &[], vec![ ret(Some(float(42.0))) ]),
    ]);
    assert_all(&printed(&execute(&roots)), &[ "42" ]);
}

#[test]
fn undefined_prototype_faults() {
    let roots = with_builtins(vec![
        prototype("missing", procedure(), &[]),
        function("main", procedure(), &[], vec![ call("missing", vec![]) ]),
    ]);
    let program = build(&roots);
    assert_eq!(program.functions[program.function_index("missing").unwrap()].first_statement, 0);
    let mut vm = VM::new(&program);
    assert!(vm.run("main").is_err());
    assert_eq!(vm.state(), VMState::RuntimeError);
}

#[test]
fn runaway_recursion() {
    let roots = with_builtins(vec![
        function("main", procedure(), &[], vec![ call("main", vec![]) ]),
    ]);
    let mut vm = VM::new(&build(&roots));
    let error = vm.run("main").unwrap_err();
    assert_eq!(error.kind(), &RuntimeErrorKind::StackOverflow);
}

#[test]
fn unknown_entry_function() {
    let mut vm = VM::new(&build(&program(vec![])));
    let error = vm.run("nope").unwrap_err();
    assert_eq!(error.kind(), &RuntimeErrorKind::UndefinedFunction("nope".to_string()));
}
