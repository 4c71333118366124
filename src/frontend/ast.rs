//! Typed expression tree handed to the bytecode generator.

use crate::prelude::*;
use crate::shared::{types::Type, value::Value, operator::Operator};

/// Byte offset of a node within its source.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Hash)]
pub struct Position(pub u32);

impl Position {
    /// Compute 1-based line/column number in string. Columns count characters. Returns `(0, 0)` if the position
    /// falls inside a multi-byte character.
    pub fn loc(self: &Self, input: &str) -> (u32, u32) {
        let offset = (self.0 as usize).min(input.len());
        let parsed = match input.get(..offset) {
            Some(parsed) => parsed,
            None => return (0, 0),
        };
        let line = parsed.matches('\n').count() as u32 + 1;
        let current = parsed.rfind('\n').map_or(parsed, |newline| &parsed[newline + 1..]);
        (line, current.chars().count() as u32 + 1)
    }
}

impl Display for Position {
    fn fmt(self: &Self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Implemented by nodes carrying a source position.
pub trait Positioned {
    fn position(self: &Self) -> Position;
}

impl Positioned for Position {
    fn position(self: &Self) -> Position {
        *self
    }
}

/// Implements the Positioned trait for the given structs.
macro_rules! impl_positioned {
    ($($name:ident),+) => {
        $(
            impl Positioned for $name {
                fn position(self: &Self) -> Position {
                    self.position
                }
            }
        )+
    };
}

impl_positioned!(Constant, Reference, Declaration, BinaryOp, UnaryOp, Conditional, Loop, Switch, Case, Goto, Label, Block, Function, Call, Member, Index, Return);

/// A literal value.
#[derive(Clone, Debug, PartialEq)]
pub struct Constant {
    pub position    : Position,
    pub value       : Value,
    pub ty          : Type,
}

/// A reference to a named variable, constant, field or function.
#[derive(Clone, Debug, PartialEq)]
pub struct Reference {
    pub position    : Position,
    pub name        : String,
}

/// Declares a variable. At global scope a constant initializer pre-seeds the global data region, entity field types
/// declare an entity field and array types declare an array.
#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    pub position    : Position,
    pub name        : String,
    pub ty          : Type,
    pub init        : Option<Box<Expression>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BinaryOp {
    pub position    : Position,
    pub op          : Operator,
    pub left        : Box<Expression>,
    pub right       : Box<Expression>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnaryOp {
    pub position    : Position,
    pub op          : Operator,
    pub expr        : Box<Expression>,
}

/// If-statement or, when `value` is set, a ternary expression yielding the result of the taken branch.
#[derive(Clone, Debug, PartialEq)]
pub struct Conditional {
    pub position    : Position,
    pub predicate   : Box<Expression>,
    pub then        : Box<Expression>,
    pub otherwise   : Option<Box<Expression>>,
    pub value       : bool,
}

/// Any loop. `for`, `while` and `do ... while` differ only in which parts are set and whether the predicate is checked
/// before the first iteration.
#[derive(Clone, Debug, PartialEq)]
pub struct Loop {
    pub position    : Position,
    pub init        : Option<Box<Expression>>,
    pub predicate   : Option<Box<Expression>>,
    pub update      : Option<Box<Expression>>,
    pub body        : Box<Expression>,
    pub check_before: bool,
}

/// A switch. Its body contains `Case` markers.
#[derive(Clone, Debug, PartialEq)]
pub struct Switch {
    pub position    : Position,
    pub test        : Box<Expression>,
    pub body        : Block,
}

/// A case marker within a switch body. `None` marks the default case.
#[derive(Clone, Debug, PartialEq)]
pub struct Case {
    pub position    : Position,
    pub value       : Option<Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Goto {
    pub position    : Position,
    pub label       : String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub position    : Position,
    pub name        : String,
}

/// A sequence of expressions forming a lexical scope.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub position    : Position,
    pub expressions : Vec<Expression>,
}

/// A function definition or prototype. Builtins carry their id instead of a body.
#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub position    : Position,
    pub name        : String,
    pub ty          : Type,
    pub params      : Vec<String>,
    pub body        : Option<Block>,
    pub builtin     : Option<i32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    pub position    : Position,
    pub callee      : Box<Expression>,
    pub args        : Vec<Expression>,
}

/// Member access: vector component, struct member or entity field.
#[derive(Clone, Debug, PartialEq)]
pub struct Member {
    pub position    : Position,
    pub base        : Box<Expression>,
    pub member      : String,
}

/// Array element access.
#[derive(Clone, Debug, PartialEq)]
pub struct Index {
    pub position    : Position,
    pub base        : Box<Expression>,
    pub index       : Box<Expression>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Return {
    pub position    : Position,
    pub value       : Option<Box<Expression>>,
}

/// A node of the expression tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    Constant(Constant),
    Reference(Reference),
    Declaration(Declaration),
    Binary(BinaryOp),
    Unary(UnaryOp),
    Conditional(Conditional),
    Loop(Loop),
    Switch(Switch),
    Case(Case),
    Goto(Goto),
    Label(Label),
    Block(Block),
    Function(Function),
    Call(Call),
    Member(Member),
    Index(Index),
    Return(Return),
    Break(Position),
    Continue(Position),
    Nop,
}

impl Positioned for Expression {
    fn position(self: &Self) -> Position {
        match self {
            Expression::Constant(e) => e.position,
            Expression::Reference(e) => e.position,
            Expression::Declaration(e) => e.position,
            Expression::Binary(e) => e.position,
            Expression::Unary(e) => e.position,
            Expression::Conditional(e) => e.position,
            Expression::Loop(e) => e.position,
            Expression::Switch(e) => e.position,
            Expression::Case(e) => e.position,
            Expression::Goto(e) => e.position,
            Expression::Label(e) => e.position,
            Expression::Block(e) => e.position,
            Expression::Function(e) => e.position,
            Expression::Call(e) => e.position,
            Expression::Member(e) => e.position,
            Expression::Index(e) => e.position,
            Expression::Return(e) => e.position,
            Expression::Break(position) | Expression::Continue(position) => *position,
            Expression::Nop => Position(0),
        }
    }
}

impl Expression {
    /// Returns the child nodes of this node.
    pub fn children(self: &Self) -> Vec<&Expression> {
        let mut result = Vec::new();
        match self {
            Expression::Declaration(e) => result.extend(e.init.as_deref()),
            Expression::Binary(e) => result.extend([ &*e.left, &*e.right ]),
            Expression::Unary(e) => result.push(&*e.expr),
            Expression::Conditional(e) => {
                result.extend([ &*e.predicate, &*e.then ]);
                result.extend(e.otherwise.as_deref());
            },
            Expression::Loop(e) => {
                result.extend(e.init.as_deref());
                result.extend(e.predicate.as_deref());
                result.extend(e.update.as_deref());
                result.push(&*e.body);
            },
            Expression::Switch(e) => {
                result.push(&*e.test);
                result.extend(e.body.expressions.iter());
            },
            Expression::Block(e) => result.extend(e.expressions.iter()),
            Expression::Function(e) => result.extend(e.body.iter().flat_map(|b| b.expressions.iter())),
            Expression::Call(e) => {
                result.push(&*e.callee);
                result.extend(e.args.iter());
            },
            Expression::Member(e) => result.push(&*e.base),
            Expression::Index(e) => result.extend([ &*e.base, &*e.index ]),
            Expression::Return(e) => result.extend(e.value.as_deref()),
            _ => { },
        }
        result
    }
    /// Whether the node is a literal.
    pub fn is_constant(self: &Self) -> bool {
        matches!(self, Expression::Constant(_))
    }
}
