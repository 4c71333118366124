use crate::util::*;

fn with_fields(main: Vec<Expression>) -> Vec<Expression> {
    with_builtins(vec![
        decl("world", Type::Entity),
        decl("health", Type::field(Type::Float)),
        decl("origin", Type::field(Type::Vector)),
        decl("netname", Type::field(Type::String)),
        function("main", procedure(), &[], main),
    ])
}

#[test]
fn fields() {
    let vm = execute(&with_fields(vec![
        decl_init("e", Type::Entity, call("spawn", vec![])),
        assign(member(var("e"), "health"), float(100.0)),
        binary(Operator::SubAssign, member(var("e"), "health"), float(25.0)),
        assign(member(var("e"), "origin"), vector(1.0, 2.0, 3.0)),
        assign(member(member(var("e"), "origin"), "z"), float(9.0)),
        assign(member(var("e"), "netname"), string("player")),
        emit(member(var("e"), "health")),
        emit(member(member(var("e"), "origin"), "y")),
        emit(member(member(var("e"), "origin"), "z")),
        emit_str(member(var("e"), "netname")),
    ]));
    assert_all(&printed(&vm), &[ "75", "2", "9", "player" ]);
    assert_eq!(vm.entities.len(), 2);
    assert_eq!(vm.entities.field_count(), 5);
}

#[test]
fn entities_are_independent() {
    let result = printed(&execute(&with_fields(vec![
        decl_init("a", Type::Entity, call("spawn", vec![])),
        decl_init("b", Type::Entity, call("spawn", vec![])),
        assign(member(var("a"), "health"), float(1.0)),
        assign(member(var("b"), "health"), float(2.0)),
        emit(member(var("a"), "health")),
        emit(member(var("b"), "health")),
        emit(eq(var("a"), var("b"))),
        emit(eq(var("a"), var("a"))),
    ])));
    assert_all(&result, &[ "1", "2", "0", "1" ]);
}

#[test]
fn compound_field_assignment_keeps_its_entity() {
    let result = printed(&execute(&with_builtins(vec![
        decl("health", Type::field(Type::Float)),
        decl("current", Type::Entity),
        decl("other", Type::Entity),
        function("switch", Type::function(Type::Float, vec![]), &[], vec![
            assign(var("current"), var("other")),
            ret(Some(float(5.0))),
        ]),
        function("main", procedure(), &[], vec![
            decl_init("first", Type::Entity, call("spawn", vec![])),
            assign(var("other"), call("spawn", vec![])),
            assign(var("current"), var("first")),
            assign(member(var("first"), "health"), float(1.0)),
            assign(member(var("other"), "health"), float(10.0)),
            binary(Operator::AddAssign, member(var("current"), "health"), call("switch", vec![])),
            emit(member(var("first"), "health")),
            emit(member(var("other"), "health")),
            emit(eq(var("current"), var("other"))),
        ]),
    ])));
    assert_all(&result, &[ "6", "10", "1" ]);
}

#[test]
fn world_is_read_only() {
    let program = build(&with_fields(vec![
        emit(member(var("world"), "health")),
        assign(member(var("world"), "health"), float(1.0)),
    ]));
    let mut vm = VM::new(&program);
    let error = vm.run("main").unwrap_err();
    assert_eq!(error.kind(), &RuntimeErrorKind::WorldWrite);
    assert_eq!(vm.output(), "0 ");
}

#[test]
fn killed_entity_faults() {
    let program = build(&with_fields(vec![
        decl_init("e", Type::Entity, call("spawn", vec![])),
        call("kill", vec![ var("e") ]),
        emit(member(var("e"), "health")),
    ]));
    let mut vm = VM::new(&program);
    let error = vm.run("main").unwrap_err();
    assert_eq!(error.kind(), &RuntimeErrorKind::EntityOutOfBounds(1));
    assert_eq!(vm.state(), VMState::RuntimeError);
}

#[test]
fn entity_store_bounds() {
    let mut vm = VM::new(&build(&with_fields(vec![])));
    let entity = vm.entities.spawn();
    assert_eq!(entity, 1);
    assert!(vm.entities.read(entity, 4, 1).is_ok());
    assert!(vm.entities.read(entity, 3, 3).is_err());
    assert!(vm.entities.read(entity, -1, 1).is_err());
    assert!(vm.entities.read(7, 0, 1).is_err());
    assert!(vm.entities.write_address(-3, &[ 0 ]).is_err());
    assert!(vm.entities.kill(0).is_err());
}
