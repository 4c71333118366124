use crate::util::*;

fn with_array(main: Vec<Expression>) -> Vec<Expression> {
    with_builtins(vec![
        decl("values", Type::Array(Box::new(Type::Float), 4)),
        function("main", procedure(), &[], main),
    ])
}

#[test]
fn indexed_access() {
    let result = printed(&execute(&with_array(vec![
        decl_init("i", Type::Float, float(0.0)),
        for_loop(None, Some(lt(var("i"), var("values_size"))), Some(post_inc(var("i"))), block(vec![
            assign(index(var("values"), var("i")), binary(Operator::Mul, var("i"), var("i"))),
        ])),
        emit(index(var("values"), float(2.0))),
        emit(index(var("values"), var("i"))),
        emit(index(var("values"), binary(Operator::Sub, var("i"), float(1.0)))),
        assign(index(var("values"), float(0.0)), float(42.0)),
        emit(var("values_0")),
        emit(var("values_size")),
    ])));
    assert_all(&result, &[ "4", "0", "9", "42", "4" ]);
}

#[test]
fn out_of_range_writes_are_dropped() {
    let vm = execute(&with_array(vec![
        decl_init("i", Type::Float, float(9.0)),
        assign(index(var("values"), var("i")), float(5.0)),
        emit(index(var("values"), var("i"))),
    ]));
    assert_all(&printed(&vm), &[ "0" ]);
    for element in 0..4 {
        let address = vm.global_address(&format!("values_{element}")).unwrap();
        assert_eq!(vm.global_float(address).unwrap(), 0.0);
    }
}

#[test]
fn constant_index_out_of_range() {
    let error = compile_error(&with_array(vec![
        emit(index(var("values"), float(4.0))),
    ]));
    assert!(matches!(error, CompileErrorKind::Unsupported(_)));
}

#[test]
fn array_without_index() {
    let error = compile_error(&with_array(vec![
        emit(var("values")),
    ]));
    assert!(matches!(error, CompileErrorKind::Unsupported(_)));
}
