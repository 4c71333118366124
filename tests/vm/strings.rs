use crate::util::*;

#[test]
fn string_globals() {
    let vm = execute(&with_builtins(vec![
        decl_init("greeting", Type::String, string("hello")),
        decl("name", Type::String),
        function("main", procedure(), &[], vec![
            assign(var("name"), string("world")),
            call("print", vec![ var("greeting"), string(", "), var("name") ]),
        ]),
    ]));
    assert_eq!(vm.output(), "hello, world");
    let address = vm.global_address("greeting").unwrap();
    assert_eq!(vm.global_string(address).unwrap(), "hello");
}

#[test]
fn compares_contents() {
    let result = output(vec![
        decl_init("a", Type::String, call("strcat", vec![ string("ab"), string("c") ])),
        decl_init("b", Type::String, string("abc")),
        emit(eq(var("a"), var("b"))),
        emit(binary(Operator::Ne, var("a"), var("b"))),
        emit(eq(var("a"), string("abd"))),
        emit(unary(Operator::Not, string(""))),
        emit(unary(Operator::Not, var("b"))),
    ]);
    assert_all(&result, &[ "1", "0", "0", "1", "0" ]);
}

#[test]
fn temporary_strings_are_released() {
    let vm = execute(&with_builtins(vec![
        function("label", Type::function(Type::String, vec![ Type::Float ]), &[ "n" ], vec![
            ret(Some(call("strcat", vec![ string("#"), call("ftos", vec![ var("n") ]) ]))),
        ]),
        function("main", procedure(), &[], vec![
            emit_str(call("label", vec![ float(1.0) ])),
            emit_str(call("label", vec![ float(2.0) ])),
        ]),
    ]));
    assert_all(&printed(&vm), &[ "#1", "#2" ]);
    assert!(vm.strings.temp_len() <= 2);
}

#[test]
fn zone_strings() {
    let vm = execute(&with_builtins(vec![
        decl("kept", Type::String),
        decl("freed", Type::String),
        function("main", procedure(), &[], vec![
            assign(var("kept"), call("strzone", vec![ call("strcat", vec![ string("per"), string("sist") ]) ])),
            assign(var("freed"), call("strzone", vec![ string("gone") ])),
            call("strunzone", vec![ var("freed") ]),
            call("strunzone", vec![ string("constant") ]),
            emit_str(var("kept")),
        ]),
    ]));
    assert_all(&printed(&vm), &[ "persist" ]);
    let kept = vm.global_int(vm.global_address("kept").unwrap()).unwrap();
    let freed = vm.global_int(vm.global_address("freed").unwrap()).unwrap();
    assert!(kept as usize >= vm.strings.constant_size());
    assert_eq!(vm.strings.get(kept), "persist");
    assert!(vm.strings.get(freed).starts_with("<invalid string"));
}

#[test]
fn invalid_index() {
    let vm = execute(&program(vec![]));
    assert_eq!(vm.strings.get(-100), "<invalid string (-100)>");
    assert_eq!(vm.strings.get(1 << 20), format!("<invalid string ({})>", 1 << 20));
}

#[test]
fn caller_temps_survive_calls() {
    let vm = execute(&with_builtins(vec![
        function("two", Type::function(Type::String, vec![]), &[], vec![
            call("ftos", vec![ float(9.0) ]),
            ret(Some(call("ftos", vec![ float(2.0) ]))),
        ]),
        function("same", Type::function(Type::String, vec![ Type::String ]), &[ "text" ], vec![
            call("ftos", vec![ float(8.0) ]),
            ret(Some(var("text"))),
        ]),
        function("main", procedure(), &[], vec![
            decl_init("a", Type::String, call("ftos", vec![ float(1.0) ])),
            decl_init("b", Type::String, call("two", vec![])),
            decl_init("c", Type::String, call("same", vec![ var("a") ])),
            call("print", vec![ var("a"), string(","), var("b"), string(","), var("c") ]),
        ]),
    ]));
    assert_eq!(vm.output(), "1,2,1");
    assert_eq!(vm.strings.temp_len(), 2);
}
