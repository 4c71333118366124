use crate::util::*;

#[test]
fn branching() {
    let result = output(vec![
        decl_init("x", Type::Float, float(1.0)),
        decl_init("y", Type::Float, float(2.0)),
        while_loop(binary(Operator::Le, var("x"), float(3.0)), block(vec![
            if_else(lt(var("x"), var("y")),
                emit(var("x")),
                Some(if_else(binary(Operator::Gt, var("x"), var("y")),
                    emit(var("y")),
                    Some(emit(add(var("x"), var("y")))),
                )),
            ),
            assign(var("x"), add(var("x"), float(1.0))),
        ])),
    ]);
    assert_all(&result, &[ "1", "4", "2" ]);
}

#[test]
fn ternary() {
    let result = output(vec![
        decl_init("x", Type::Float, float(5.0)),
        emit(progs::ast::build::ternary(lt(var("x"), float(10.0)), float(1.0), float(2.0))),
        emit(progs::ast::build::ternary(lt(var("x"), float(0.0)), float(1.0), float(2.0))),
    ]);
    assert_all(&result, &[ "1", "2" ]);
}

#[test]
fn do_while_runs_once() {
    let result = output(vec![
        decl_init("x", Type::Float, float(7.0)),
        do_while(block(vec![ emit(var("x")), post_inc(var("x")) ]), lt(var("x"), float(0.0))),
    ]);
    assert_all(&result, &[ "7" ]);
}

#[test]
fn break_and_continue() {
    let result = output(vec![
        for_loop(Some(decl_init("i", Type::Float, float(0.0))), Some(lt(var("i"), float(10.0))), Some(post_inc(var("i"))), block(vec![
            if_else(eq(var("i"), float(1.0)), cont(), None),
            if_else(eq(var("i"), float(4.0)), brk(), None),
            emit(var("i")),
        ])),
    ]);
    assert_all(&result, &[ "0", "2", "3" ]);
}

#[test]
fn infinite_loop_with_break() {
    let result = output(vec![
        decl_init("i", Type::Float, float(0.0)),
        for_loop(None, None, None, block(vec![
            if_else(eq(var("i"), float(3.0)), brk(), None),
            emit(var("i")),
            post_inc(var("i")),
        ])),
    ]);
    assert_all(&result, &[ "0", "1", "2" ]);
}

#[test]
fn switch_fallthrough() {
    let result = output(vec![
        switch(float(2.0), vec![
            case(Value::Float(1.0)),
            emit(float(1.0)),
            case(Value::Float(2.0)),
            emit(float(2.0)),
            default_case(),
            emit(float(3.0)),
        ]),
    ]);
    assert_all(&result, &[ "2", "3" ]);
}

#[test]
fn switch_without_match() {
    let result = output(vec![
        switch(float(5.0), vec![
            case(Value::Float(1.0)),
            emit(float(1.0)),
            brk(),
            case(Value::Float(2.0)),
            emit(float(2.0)),
        ]),
        emit(float(9.0)),
    ]);
    assert_all(&result, &[ "9" ]);
}

#[test]
fn continue_inside_switch() {
    let result = output(vec![
        for_loop(Some(decl_init("i", Type::Float, float(0.0))), Some(lt(var("i"), float(4.0))), Some(post_inc(var("i"))), block(vec![
            switch(var("i"), vec![
                case(Value::Float(1.0)),
                cont(),
                default_case(),
                brk(),
            ]),
            emit(var("i")),
        ])),
    ]);
    assert_all(&result, &[ "0", "2", "3" ]);
}

#[test]
fn nested_loops() {
    let result = output(vec![
        for_loop(Some(decl_init("i", Type::Float, float(0.0))), Some(lt(var("i"), float(2.0))), Some(post_inc(var("i"))), block(vec![
            for_loop(Some(decl_init("j", Type::Float, float(0.0))), Some(lt(var("j"), float(3.0))), Some(post_inc(var("j"))), block(vec![
                if_else(eq(var("j"), float(1.0)), cont(), None),
                emit(add(binary(Operator::Mul, var("i"), float(10.0)), var("j"))),
            ])),
        ])),
    ]);
    assert_all(&result, &[ "0", "2", "10", "12" ]);
}

#[test]
fn goto_label() {
    let result = output(vec![
        goto("skip"),
        emit(float(1.0)),
        label("skip"),
        emit(float(2.0)),
    ]);
    assert_all(&result, &[ "2" ]);
}

#[test]
fn short_circuit() {
    let roots = with_builtins(vec![
        function("side", Type::function(Type::Float, vec![]), &[], vec![
            call("print", vec![ string("side ") ]),
            ret(Some(float(1.0))),
        ]),
        function("main", procedure(), &[], vec![
            emit(binary(Operator::Or, float(1.0), call("side", vec![]))),
            emit(binary(Operator::And, float(0.0), call("side", vec![]))),
            emit(binary(Operator::And, float(1.0), call("side", vec![]))),
        ]),
    ]);
    assert_all(&printed(&execute(&roots)), &[ "1", "0", "side", "1" ]);
}

#[test]
fn jumps_land_on_their_targets() {
    let program = build(&program(vec![
        decl_init("i", Type::Float, float(0.0)),
        while_loop(lt(var("i"), float(3.0)), post_inc(var("i"))),
    ]));
    let mut vm = VM::new(&program);
    vm.record_trace(true);
    vm.run("main").unwrap();
    let trace = vm.trace().to_vec();
    let check = program.statements.iter().position(|statement| statement.op == OpCode::IF).unwrap();
    // the loop condition is evaluated at the bottom after every iteration
    assert_eq!(trace.iter().filter(|&&index| index == check).count(), 3);
    for pair in trace.windows(2) {
        let statement = program.statements[pair[0]];
        let expected = match statement.op {
            OpCode::GOTO => Some(pair[0] as i64 + statement.a as i64),
            OpCode::IF | OpCode::IFNOT if pair[1] != pair[0] + 1 => Some(pair[0] as i64 + statement.b as i64),
            _ => None,
        };
        if let Some(expected) = expected {
            assert_eq!(pair[1] as i64, expected, "jump at {} landed on {}", pair[0], pair[1]);
        }
    }
    assert_eq!(program.statements[*trace.last().unwrap()].op, OpCode::DONE);
}
