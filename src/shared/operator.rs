//! Operator dispatch. Maps an operator and its operand types to the handler generating code for it.

use crate::prelude::*;
use crate::shared::types::Type;
use crate::bytecode::OpCode;

/// Operators of the expression tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    // binary
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Comma,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    BitAndAssign,
    BitOrAssign,
    // unary
    Neg,
    Plus,
    Not,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl Operator {
    /// Returns the arithmetic operator a compound assignment applies before storing.
    pub fn compound(self: &Self) -> Option<Operator> {
        match self {
            Operator::AddAssign => Some(Operator::Add),
            Operator::SubAssign => Some(Operator::Sub),
            Operator::MulAssign => Some(Operator::Mul),
            Operator::DivAssign => Some(Operator::Div),
            Operator::BitAndAssign => Some(Operator::BitAnd),
            Operator::BitOrAssign => Some(Operator::BitOr),
            _ => None,
        }
    }
    /// Whether the operator assigns to its left operand.
    pub fn is_assignment(self: &Self) -> bool {
        *self == Operator::Assign || self.compound().is_some()
    }
    /// Source symbol of the operator.
    pub fn symbol(self: &Self) -> &'static str {
        match self {
            Operator::Add | Operator::Plus => "+",
            Operator::Sub | Operator::Neg => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Rem => "%",
            Operator::BitAnd => "&",
            Operator::BitOr => "|",
            Operator::BitXor => "^",
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Comma => ",",
            Operator::Assign => "=",
            Operator::AddAssign => "+=",
            Operator::SubAssign => "-=",
            Operator::MulAssign => "*=",
            Operator::DivAssign => "/=",
            Operator::BitAndAssign => "&=",
            Operator::BitOrAssign => "|=",
            Operator::Not => "!",
            Operator::BitNot => "~",
            Operator::PreInc | Operator::PostInc => "++",
            Operator::PreDec | Operator::PostDec => "--",
        }
    }
}

impl Display for Operator {
    fn fmt(self: &Self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Code generation strategy for an operator applied to specific operand types.
#[derive(Clone, Debug, PartialEq)]
pub enum Handler {
    /// Evaluate both operands, then emit a single instruction writing a fresh result.
    Binary { opcode: OpCode, ty: Type },
    /// Evaluate the operand, then emit a single instruction writing a fresh result.
    Unary { opcode: OpCode, ty: Type },
    /// Store the right operand into the left one, optionally combining both first.
    Assign { ty: Type, compound: Option<Operator> },
    /// Call the named function with both operands.
    Call { function: &'static str, ty: Type },
    /// `0 - x`
    Negate(Type),
    /// `-1 - x`
    Complement(Type),
    /// `0 == x`
    IsZero,
    /// `v * (1 / f)`
    ScaleInverse,
    /// Yields the operand unchanged.
    Identity(Type),
    /// `x = x + delta`, yielding the previous value when `post` is set.
    Step { ty: Type, delta: f32, post: bool },
    /// Short circuiting `&&`.
    LogicalAnd,
    /// Short circuiting `||`.
    LogicalOr,
    /// Evaluate both operands, yield the right one.
    Comma(Type),
}

impl Handler {
    /// Type of the value produced by the handler.
    pub fn result_type(self: &Self) -> Type {
        match self {
            Handler::Binary { ty, .. } | Handler::Unary { ty, .. } | Handler::Assign { ty, .. } | Handler::Call { ty, .. } => ty.clone(),
            Handler::Negate(ty) | Handler::Complement(ty) | Handler::Identity(ty) | Handler::Step { ty, .. } | Handler::Comma(ty) => ty.clone(),
            Handler::IsZero | Handler::LogicalAnd | Handler::LogicalOr => Type::Bool,
            Handler::ScaleInverse => Type::Vector,
        }
    }
}

/// Resolves the handler for an operator and its operand types. Unary operators pass `None` as right type.
///
/// Resolution tries an exact match on the left operand's type first, then retries with numeric operands
/// promoted to float and finally falls back to the handlers every type supports (`&&`, `||` and `,`).
pub fn resolve(op: Operator, left: &Type, right: Option<&Type>) -> Option<Handler> {
    exact(op, left, right)
        .or_else(|| {
            let promoted_left = left.promoted();
            let promoted_right = right.map(|r| r.promoted());
            if &promoted_left != left || promoted_right.as_ref() != right {
                exact(op, &promoted_left, promoted_right.as_ref())
            } else {
                None
            }
        })
        .or_else(|| universal(op, right))
}

/// Handlers supported by any operand type.
fn universal(op: Operator, right: Option<&Type>) -> Option<Handler> {
    match (op, right) {
        (Operator::And, Some(_)) => Some(Handler::LogicalAnd),
        (Operator::Or, Some(_)) => Some(Handler::LogicalOr),
        (Operator::Comma, Some(right)) => Some(Handler::Comma(right.clone())),
        _ => None,
    }
}

/// Handlers registered for the exact operand types.
fn exact(op: Operator, left: &Type, right: Option<&Type>) -> Option<Handler> {
    use Operator as O;
    let binary = |opcode: OpCode, ty: Type| Some(Handler::Binary { opcode, ty });
    let unary = |opcode: OpCode, ty: Type| Some(Handler::Unary { opcode, ty });
    match (left, right) {
        // numbers, same type
        (l, Some(r)) if l.is_numeric() && l == r => match op {
            O::Add => binary(OpCode::ADD_FLOAT, l.clone()),
            O::Sub => binary(OpCode::SUB_FLOAT, l.clone()),
            O::Mul => binary(OpCode::MUL_FLOAT, l.clone()),
            O::Div => binary(OpCode::DIV_FLOAT, l.clone()),
            O::Rem => Some(Handler::Call { function: "__builtin_mod", ty: l.clone() }),
            O::BitXor => Some(Handler::Call { function: "__builtin_xor", ty: l.clone() }),
            O::BitAnd => binary(OpCode::BITAND, l.clone()),
            O::BitOr => binary(OpCode::BITOR, l.clone()),
            O::Eq => binary(OpCode::EQ_FLOAT, Type::Bool),
            O::Ne => binary(OpCode::NE_FLOAT, Type::Bool),
            O::Lt => binary(OpCode::LT, Type::Bool),
            O::Le => binary(OpCode::LE, Type::Bool),
            O::Gt => binary(OpCode::GT, Type::Bool),
            O::Ge => binary(OpCode::GE, Type::Bool),
            O::Assign => Some(Handler::Assign { ty: l.clone(), compound: None }),
            O::AddAssign | O::SubAssign | O::MulAssign | O::DivAssign | O::BitAndAssign | O::BitOrAssign => {
                Some(Handler::Assign { ty: l.clone(), compound: op.compound() })
            },
            _ => None,
        },
        // numbers, unary
        (l, None) if l.is_numeric() => match op {
            O::Neg => Some(Handler::Negate(l.clone())),
            O::Plus => Some(Handler::Identity(l.clone())),
            O::Not => Some(Handler::IsZero),
            O::BitNot => Some(Handler::Complement(l.clone())),
            O::PreInc => Some(Handler::Step { ty: l.clone(), delta: 1.0, post: false }),
            O::PreDec => Some(Handler::Step { ty: l.clone(), delta: -1.0, post: false }),
            O::PostInc => Some(Handler::Step { ty: l.clone(), delta: 1.0, post: true }),
            O::PostDec => Some(Handler::Step { ty: l.clone(), delta: -1.0, post: true }),
            _ => None,
        },
        // vectors
        (Type::Vector, Some(Type::Vector)) => match op {
            O::Add => binary(OpCode::ADD_VEC, Type::Vector),
            O::Sub => binary(OpCode::SUB_VEC, Type::Vector),
            O::Mul => binary(OpCode::MUL_VEC, Type::Float),
            O::Eq => binary(OpCode::EQ_VEC, Type::Bool),
            O::Ne => binary(OpCode::NE_VEC, Type::Bool),
            O::Assign => Some(Handler::Assign { ty: Type::Vector, compound: None }),
            O::AddAssign | O::SubAssign => Some(Handler::Assign { ty: Type::Vector, compound: op.compound() }),
            _ => None,
        },
        (Type::Vector, Some(Type::Float)) => match op {
            O::Mul => binary(OpCode::MUL_VEC_FLOAT, Type::Vector),
            O::Div => Some(Handler::ScaleInverse),
            O::MulAssign | O::DivAssign => Some(Handler::Assign { ty: Type::Vector, compound: op.compound() }),
            _ => None,
        },
        (Type::Float, Some(Type::Vector)) => match op {
            O::Mul => binary(OpCode::MUL_FLOAT_VEC, Type::Vector),
            _ => None,
        },
        (Type::Vector, None) => match op {
            O::Neg => Some(Handler::Negate(Type::Vector)),
            O::Plus => Some(Handler::Identity(Type::Vector)),
            O::Not => unary(OpCode::NOT_VEC, Type::Bool),
            _ => None,
        },
        // reference-like types
        (Type::String, Some(Type::String)) => match op {
            O::Eq => binary(OpCode::EQ_STR, Type::Bool),
            O::Ne => binary(OpCode::NE_STR, Type::Bool),
            O::Assign => Some(Handler::Assign { ty: Type::String, compound: None }),
            _ => None,
        },
        (Type::Entity, Some(Type::Entity)) => match op {
            O::Eq => binary(OpCode::EQ_ENT, Type::Bool),
            O::Ne => binary(OpCode::NE_ENT, Type::Bool),
            O::Assign => Some(Handler::Assign { ty: Type::Entity, compound: None }),
            _ => None,
        },
        (Type::Field(l), Some(Type::Field(r))) if l == r => match op {
            O::Eq => binary(OpCode::EQ_FUNC, Type::Bool),
            O::Ne => binary(OpCode::NE_FUNC, Type::Bool),
            O::Assign => Some(Handler::Assign { ty: left.clone(), compound: None }),
            _ => None,
        },
        (Type::Function(l), Some(Type::Function(r))) if l == r => match op {
            O::Eq => binary(OpCode::EQ_FUNC, Type::Bool),
            O::Ne => binary(OpCode::NE_FUNC, Type::Bool),
            O::Assign => Some(Handler::Assign { ty: left.clone(), compound: None }),
            _ => None,
        },
        (Type::String, None) if op == O::Not => unary(OpCode::NOT_STR, Type::Bool),
        (Type::Entity, None) if op == O::Not => unary(OpCode::NOT_ENT, Type::Bool),
        (Type::Function(_), None) if op == O::Not => unary(OpCode::NOT_FUNC, Type::Bool),
        _ => None,
    }
}
