//! Rewrites switches and arrays into expression trees the generator lowers directly.

use crate::shared::{types::Type, value::Value, operator::Operator};
use crate::frontend::{ast::{self, Expression, Position}, build};
use crate::bytecode::compiler::error::{CompileError, CompileErrorKind, CompileResult};

/// Name of the label marking a switch case.
pub(crate) fn case_label(switch: usize, case: usize) -> String {
    format!("case#{switch}#{case}")
}

/// Name of the label marking a switch default case.
pub(crate) fn default_label(switch: usize) -> String {
    format!("default#{switch}")
}

/// Rewrites a switch body into a dispatch chain followed by the body with its case markers replaced by labels.
///
/// The dispatch compares the value stored in `test` against each case value and jumps to the matching label, to the
/// default label if no case matches or past the body when there is no default. The result is meant to be lowered as
/// the body of a loop running exactly once so that `break` leaves the switch.
pub(crate) fn switch(test: &str, item: &ast::Switch, id: usize) -> CompileResult<ast::Block> {
    let mut dispatch = Vec::new();
    let mut body = Vec::with_capacity(item.body.expressions.len());
    let mut default = None;
    for (index, expression) in item.body.expressions.iter().enumerate() {
        match expression {
            Expression::Case(ast::Case { value: Some(value), position }) => {
                let label = case_label(id, index);
                dispatch.push(at(*position, build::if_else(
                    build::binary(Operator::Eq, build::var(test), build::constant(value.clone())),
                    build::goto(&label),
                    None
                )));
                body.push(at(*position, build::label(&label)));
            },
            Expression::Case(ast::Case { value: None, position }) => {
                if default.is_some() {
                    return Err(CompileError::new(position, CompileErrorKind::Unsupported("multiple default cases".to_string())));
                }
                let label = default_label(id);
                body.push(at(*position, build::label(&label)));
                default = Some(label);
            },
            other => body.push(other.clone()),
        }
    }
    dispatch.push(match default {
        Some(label) => build::goto(&label),
        None => build::brk(),
    });
    dispatch.extend(body);
    Ok(ast::Block { position: item.position, expressions: dispatch })
}

/// Global holding element `index` of an array.
pub(crate) fn array_element(name: &str, index: usize) -> String {
    format!("{name}_{index}")
}

/// Function reading an array element, either a specific one or the one selected by an index argument.
pub(crate) fn array_getter(name: &str, index: Option<usize>) -> String {
    match index {
        Some(index) => format!("__{name}_get_{index}"),
        None => format!("__{name}_get"),
    }
}

/// Function writing an array element, either a specific one or the one selected by an index argument.
pub(crate) fn array_setter(name: &str, index: Option<usize>) -> String {
    match index {
        Some(index) => format!("__{name}_set_{index}"),
        None => format!("__{name}_set"),
    }
}

/// Generates the accessor functions of an array of `len` elements of type `ty`.
///
/// Each element gets a getter and a setter. The index dispatchers compare their index argument against every element
/// index and forward to the matching element accessor. Out of range indices read the null word and write nothing.
pub(crate) fn array_accessors(name: &str, ty: &Type, len: usize) -> Vec<Expression> {
    let mut result = Vec::with_capacity(2 * len + 2);
    let mut get_chain = Vec::with_capacity(len);
    let mut set_chain = Vec::with_capacity(len);
    for index in 0..len {
        let element = array_element(name, index);
        result.push(build::function(&array_getter(name, Some(index)), Type::function(ty.clone(), vec![]), &[], vec![
            build::ret(Some(build::var(&element))),
        ]));
        result.push(build::function(&array_setter(name, Some(index)), Type::function(Type::Void, vec![ ty.clone() ]), &[ "value" ], vec![
            build::assign(build::var(&element), build::var("value")),
        ]));
        let matches = || build::binary(Operator::Eq, build::var("index"), build::constant(Value::Float(index as f32)));
        get_chain.push(build::if_else(matches(), build::ret(Some(build::call(&array_getter(name, Some(index)), vec![]))), None));
        set_chain.push(build::if_else(matches(), build::block(vec![
            build::call(&array_setter(name, Some(index)), vec![ build::var("value") ]),
            build::ret(None),
        ]), None));
    }
    result.push(build::function(&array_getter(name, None), Type::function(ty.clone(), vec![ Type::Float ]), &[ "index" ], get_chain));
    result.push(build::function(&array_setter(name, None), Type::function(Type::Void, vec![ Type::Float, ty.clone() ]), &[ "index", "value" ], set_chain));
    result
}

/// Moves a generated node to the position of the node it replaces.
fn at(position: Position, mut expression: Expression) -> Expression {
    match &mut expression {
        Expression::Conditional(e) => e.position = position,
        Expression::Label(e) => e.position = position,
        Expression::Goto(e) => e.position = position,
        _ => { },
    }
    expression
}
