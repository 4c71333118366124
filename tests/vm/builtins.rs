use crate::util::*;

#[test]
fn vector_builtins() {
    let vm = execute(&program(vec![
        emit_str(call("vtos", vec![ vector(1.0, 2.0, 3.0) ])),
        emit(call("vlen", vec![ vector(3.0, 0.0, 4.0) ])),
        emit_str(call("vtos", vec![ call("normalize", vec![ vector(0.0, 3.0, 4.0) ]) ])),
        emit_str(call("vtos", vec![ call("normalize", vec![ vector(0.0, 0.0, 0.0) ]) ])),
    ]));
    assert_eq!(vm.output(), "'1 2 3' 5 '0 0.6 0.8' '0 0 0' ");
}

#[test]
fn math_builtins() {
    let result = output(vec![
        emit(call("sqrt", vec![ float(16.0) ])),
        emit(call("floor", vec![ float(2.7) ])),
        emit(call("floor", vec![ float(-2.5) ])),
        emit(call("pow", vec![ float(2.0), float(10.0) ])),
        emit(call("ftoi", vec![ float(-3.9) ])),
    ]);
    assert_all(&result, &[ "4", "2", "-3", "1024", "-3" ]);
}

#[test]
fn string_builtins() {
    let result = output(vec![
        emit(call("stof", vec![ string(" 12.5 ") ])),
        emit(call("stof", vec![ string("abc") ])),
        emit(call("strcmp", vec![ string("a"), string("b") ])),
        emit(call("strcmp", vec![ string("b"), string("a") ])),
        emit(call("strcmp", vec![ string("same"), string("same") ])),
        emit(call("strcmp", vec![ string("abcx"), string("abcy"), float(3.0) ])),
        emit(call("strcmp", vec![ string("a"), string("d") ])),
        emit(call("strcmp", vec![ string("abc"), string("ab") ])),
        emit(call("strcmp", vec![ string(""), string("A") ])),
        emit(call("strcmp", vec![ string("x"), string("y"), float(0.0) ])),
        emit_str(call("strcat", vec![ string("a"), string("b"), string("c") ])),
        emit_str(call("etos", vec![ call("spawn", vec![]) ])),
    ]);
    assert_all(&result, &[ "12.5", "0", "-1", "1", "0", "0", "-3", "99", "-65", "0", "abc", "entity", "1" ]);
}

#[test]
fn assertion_failure() {
    let program = build(&program(vec![
        call("assert", vec![ float(1.0), string("holds") ]),
        call("assert", vec![ eq(float(1.0), float(2.0)), string("one is two") ]),
        emit(float(1.0)),
    ]));
    let mut vm = VM::new(&program);
    let error = vm.run("main").unwrap_err();
    assert_eq!(error.kind(), &RuntimeErrorKind::AssertionFailed("one is two".to_string()));
    assert_eq!(vm.output(), "");
}

#[test]
fn error_builtin() {
    let program = build(&program(vec![
        call("error", vec![ string("bad "), call("ftos", vec![ float(7.0) ]) ]),
    ]));
    let mut vm = VM::new(&program);
    let error = vm.run("main").unwrap_err();
    assert_eq!(error.kind(), &RuntimeErrorKind::BuiltinArgument("bad 7".to_string()));
    assert_eq!(vm.state(), VMState::RuntimeError);
}
