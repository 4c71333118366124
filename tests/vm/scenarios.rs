use crate::util::*;

#[test]
fn local_arithmetic() {
    let vm = execute(&with_builtins(vec![
        function("main", Type::function(Type::Float, vec![]), &[], vec![
            decl_init("x", Type::Float, float(1.0)),
            decl_init("y", Type::Float, float(2.0)),
            ret(Some(add(var("x"), var("y")))),
        ]),
    ]));
    assert_eq!(vm.return_float().unwrap(), 3.0);
}

#[test]
fn for_loop_sum() {
    let vm = execute(&with_builtins(vec![
        decl("total", Type::Float),
        function("main", procedure(), &[], vec![
            for_loop(
                Some(decl_init("i", Type::Float, float(0.0))),
                Some(lt(var("i"), float(5.0))),
                Some(post_inc(var("i"))),
                binary(Operator::AddAssign, var("total"), var("i")),
            ),
        ]),
    ]));
    let total = vm.global_address("total").unwrap();
    assert_eq!(vm.global_float(total).unwrap(), 10.0);
}

#[test]
fn switch_selects_case() {
    let result = output(vec![
        switch(float(2.0), vec![
            case(Value::Float(1.0)),
            emit(float(1.0)),
            brk(),
            case(Value::Float(2.0)),
            emit(float(2.0)),
            brk(),
            default_case(),
            emit(float(3.0)),
        ]),
        emit(float(9.0)),
    ]);
    assert_all(&result, &[ "2", "9" ]);
}

#[test]
fn builtin_temp_string() {
    let vm = execute(&with_builtins(vec![
        function("show", Type::function(Type::String, vec![]), &[], vec![
            call("ftos", vec![ float(1.0) ]),
            call("ftos", vec![ float(2.0) ]),
            ret(Some(call("ftos", vec![ float(3.5) ]))),
        ]),
        function("main", procedure(), &[], vec![
            decl_init("text", Type::String, call("show", vec![])),
            call("print", vec![ var("text") ]),
        ]),
    ]));
    assert_eq!(vm.output(), "3.5");
    // the three temporaries of `show` were released when it returned, only its result survives
    assert_eq!(vm.strings.temp_len(), 1);
}

#[test]
fn builtin_entry_function() {
    let program = build(&with_builtins(vec![
        function("main", Type::function(Type::String, vec![]), &[], vec![
            ret(Some(call("ftos", vec![ float(3.5) ]))),
        ]),
    ]));
    let vm = run(&program, "main").unwrap();
    assert!(vm.return_int().unwrap() < 0);
    assert_eq!(vm.return_string().unwrap(), "3.5");
}
