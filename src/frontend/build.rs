//! Helpers for constructing expression trees, e.g. from a parser or in tests. All nodes are created at position 0.

use crate::shared::{types::Type, value::Value, operator::Operator};
use crate::frontend::ast::*;
use crate::bytecode::Builtin;

fn boxed(expression: Expression) -> Box<Expression> {
    Box::new(expression)
}

/// A literal with the type implied by its value.
pub fn constant(value: Value) -> Expression {
    let ty = match &value {
        Value::Float(_) => Type::Float,
        Value::Int(_) | Value::Pointer(_) => Type::Int,
        Value::Bool(_) => Type::Bool,
        Value::Str(_) => Type::String,
        Value::Vector(_) => Type::Vector,
    };
    Expression::Constant(Constant { position: Position(0), value, ty })
}

pub fn float(value: f32) -> Expression {
    constant(Value::Float(value))
}

pub fn int(value: i32) -> Expression {
    constant(Value::Int(value))
}

pub fn boolean(value: bool) -> Expression {
    constant(Value::Bool(value))
}

pub fn string(value: &str) -> Expression {
    constant(Value::Str(value.to_string()))
}

pub fn vector(x: f32, y: f32, z: f32) -> Expression {
    constant(Value::Vector([ x, y, z ]))
}

pub fn var(name: &str) -> Expression {
    Expression::Reference(Reference { position: Position(0), name: name.to_string() })
}

/// Declaration without initializer.
pub fn decl(name: &str, ty: Type) -> Expression {
    Expression::Declaration(Declaration { position: Position(0), name: name.to_string(), ty, init: None })
}

/// Declaration with initializer.
pub fn decl_init(name: &str, ty: Type, init: Expression) -> Expression {
    Expression::Declaration(Declaration { position: Position(0), name: name.to_string(), ty, init: Some(boxed(init)) })
}

pub fn binary(op: Operator, left: Expression, right: Expression) -> Expression {
    Expression::Binary(BinaryOp { position: Position(0), op, left: boxed(left), right: boxed(right) })
}

pub fn assign(left: Expression, right: Expression) -> Expression {
    binary(Operator::Assign, left, right)
}

pub fn unary(op: Operator, expr: Expression) -> Expression {
    Expression::Unary(UnaryOp { position: Position(0), op, expr: boxed(expr) })
}

/// If-statement with optional else branch.
pub fn if_else(predicate: Expression, then: Expression, otherwise: Option<Expression>) -> Expression {
    Expression::Conditional(Conditional { position: Position(0), predicate: boxed(predicate), then: boxed(then), otherwise: otherwise.map(boxed), value: false })
}

/// Ternary expression.
pub fn ternary(predicate: Expression, then: Expression, otherwise: Expression) -> Expression {
    Expression::Conditional(Conditional { position: Position(0), predicate: boxed(predicate), then: boxed(then), otherwise: Some(boxed(otherwise)), value: true })
}

pub fn for_loop(init: Option<Expression>, predicate: Option<Expression>, update: Option<Expression>, body: Expression) -> Expression {
    Expression::Loop(Loop {
        position    : Position(0),
        init        : init.map(boxed),
        predicate   : predicate.map(boxed),
        update      : update.map(boxed),
        body        : boxed(body),
        check_before: true,
    })
}

pub fn while_loop(predicate: Expression, body: Expression) -> Expression {
    for_loop(None, Some(predicate), None, body)
}

pub fn do_while(body: Expression, predicate: Expression) -> Expression {
    Expression::Loop(Loop {
        position    : Position(0),
        init        : None,
        predicate   : Some(boxed(predicate)),
        update      : None,
        body        : boxed(body),
        check_before: false,
    })
}

pub fn switch(test: Expression, body: Vec<Expression>) -> Expression {
    Expression::Switch(Switch { position: Position(0), test: boxed(test), body: Block { position: Position(0), expressions: body } })
}

pub fn case(value: Value) -> Expression {
    Expression::Case(Case { position: Position(0), value: Some(value) })
}

pub fn default_case() -> Expression {
    Expression::Case(Case { position: Position(0), value: None })
}

pub fn goto(label: &str) -> Expression {
    Expression::Goto(Goto { position: Position(0), label: label.to_string() })
}

pub fn label(name: &str) -> Expression {
    Expression::Label(Label { position: Position(0), name: name.to_string() })
}

pub fn block(expressions: Vec<Expression>) -> Expression {
    Expression::Block(Block { position: Position(0), expressions })
}

/// Function definition. Parameter types are taken from `ty`.
pub fn function(name: &str, ty: Type, params: &[ &str ], body: Vec<Expression>) -> Expression {
    Expression::Function(Function {
        position    : Position(0),
        name        : name.to_string(),
        ty,
        params      : params.iter().map(|p| p.to_string()).collect(),
        body        : Some(Block { position: Position(0), expressions: body }),
        builtin     : None,
    })
}

/// Function prototype, to be defined later.
pub fn prototype(name: &str, ty: Type, params: &[ &str ]) -> Expression {
    Expression::Function(Function {
        position    : Position(0),
        name        : name.to_string(),
        ty,
        params      : params.iter().map(|p| p.to_string()).collect(),
        body        : None,
        builtin     : None,
    })
}

/// Native function declaration.
pub fn native(name: &str, ty: Type, id: i32) -> Expression {
    Expression::Function(Function {
        position    : Position(0),
        name        : name.to_string(),
        params      : (0..ty.as_function().map_or(0, |f| f.params.len())).map(|p| format!("p{p}")).collect(),
        ty,
        body        : None,
        builtin     : Some(id),
    })
}

/// Native declarations for the complete builtin table.
pub fn builtin_declarations() -> Vec<Expression> {
    Builtin::ALL.iter().map(|builtin| native(builtin.name(), builtin.signature(), builtin.id())).collect()
}

/// Call of a named function.
pub fn call(name: &str, args: Vec<Expression>) -> Expression {
    Expression::Call(Call { position: Position(0), callee: boxed(var(name)), args })
}

pub fn member(base: Expression, member: &str) -> Expression {
    Expression::Member(Member { position: Position(0), base: boxed(base), member: member.to_string() })
}

pub fn index(base: Expression, index: Expression) -> Expression {
    Expression::Index(Index { position: Position(0), base: boxed(base), index: boxed(index) })
}

pub fn ret(value: Option<Expression>) -> Expression {
    Expression::Return(Return { position: Position(0), value: value.map(boxed) })
}

pub fn brk() -> Expression {
    Expression::Break(Position(0))
}

pub fn cont() -> Expression {
    Expression::Continue(Position(0))
}
