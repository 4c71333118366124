//! Types of the expression tree and their storage properties.

use crate::prelude::*;

/// Definition type codes used in global and field definition records.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum DefType {
    Void        = 0,
    String      = 1,
    Float       = 2,
    Vector      = 3,
    Entity      = 4,
    Field       = 5,
    Function    = 6,
    Pointer     = 7,
}

impl DefType {
    /// Converts a raw definition type code.
    pub fn from_u16(code: u16) -> Option<Self> {
        Some(match code {
            0 => DefType::Void,
            1 => DefType::String,
            2 => DefType::Float,
            3 => DefType::Vector,
            4 => DefType::Entity,
            5 => DefType::Field,
            6 => DefType::Function,
            7 => DefType::Pointer,
            _ => return None,
        })
    }
}

/// Signature of a function type.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionType {
    pub ret     : Type,
    pub params  : Vec<Type>,
    pub vararg  : Option<Type>,
}

/// A named struct member.
#[derive(Clone, Debug, PartialEq)]
pub struct Member {
    pub name: String,
    pub ty  : Type,
}

/// A type of the expression tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    Void,
    Bool,
    Int,
    Float,
    Vector,
    String,
    Entity,
    Field(Box<Type>),
    Function(Box<FunctionType>),
    Array(Box<Type>, usize),
    Struct(Vec<Member>),
}

impl Type {
    /// Creates a function type.
    pub fn function(ret: Type, params: Vec<Type>) -> Type {
        Type::Function(Box::new(FunctionType { ret, params, vararg: None }))
    }
    /// Creates a variadic function type.
    pub fn variadic(ret: Type, params: Vec<Type>, vararg: Type) -> Type {
        Type::Function(Box::new(FunctionType { ret, params, vararg: Some(vararg) }))
    }
    /// Creates an entity field type.
    pub fn field(ty: Type) -> Type {
        Type::Field(Box::new(ty))
    }
    /// Size of the type in global words.
    pub fn size(self: &Self) -> usize {
        match self {
            Type::Void => 0,
            Type::Vector => 3,
            Type::Array(inner, len) => inner.size() * len,
            Type::Struct(members) => members.iter().map(|m| m.ty.size()).sum(),
            _ => 1,
        }
    }
    /// Whether the type is one of the numeric types that are promoted to float.
    pub fn is_numeric(self: &Self) -> bool {
        matches!(self, Type::Bool | Type::Int | Type::Float)
    }
    /// Returns the float type for numeric types, the type itself otherwise.
    pub fn promoted(self: &Self) -> Type {
        if self.is_numeric() { Type::Float } else { self.clone() }
    }
    /// Returns the function signature if this is a function type.
    pub fn as_function(self: &Self) -> Option<&FunctionType> {
        match self {
            Type::Function(function) => Some(function),
            _ => None,
        }
    }
    /// Definition type code of this type.
    pub fn def_type(self: &Self) -> DefType {
        match self {
            Type::Void => DefType::Void,
            Type::String => DefType::String,
            Type::Vector => DefType::Vector,
            Type::Entity => DefType::Entity,
            Type::Field(_) => DefType::Field,
            Type::Function(_) => DefType::Function,
            Type::Array(..) | Type::Struct(_) => DefType::Pointer,
            Type::Bool | Type::Int | Type::Float => DefType::Float,
        }
    }
    /// Returns offset and type of a member addressed by name. Vectors expose `x`, `y` and `z`.
    pub fn member(self: &Self, name: &str) -> Option<(usize, Type)> {
        match self {
            Type::Vector => match name {
                "x" => Some((0, Type::Float)),
                "y" => Some((1, Type::Float)),
                "z" => Some((2, Type::Float)),
                _ => None,
            },
            Type::Struct(members) => {
                let mut offset = 0;
                for member in members {
                    if member.name == name {
                        return Some((offset, member.ty.clone()));
                    }
                    offset += member.ty.size();
                }
                None
            },
            _ => None,
        }
    }
}

impl Display for Type {
    fn fmt(self: &Self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Vector => write!(f, "vector"),
            Type::String => write!(f, "string"),
            Type::Entity => write!(f, "entity"),
            Type::Field(inner) => write!(f, ".{inner}"),
            Type::Function(function) => {
                write!(f, "{}(", function.ret)?;
                for (index, param) in function.params.iter().enumerate() {
                    write!(f, "{}{param}", if index > 0 { ", " } else { "" })?;
                }
                if let Some(vararg) = &function.vararg {
                    write!(f, "{}...{vararg}", if function.params.is_empty() { "" } else { ", " })?;
                }
                write!(f, ")")
            },
            Type::Array(inner, len) => write!(f, "{inner}[{len}]"),
            Type::Struct(members) => {
                write!(f, "struct {{")?;
                for member in members {
                    write!(f, " {} {};", member.ty, member.name)?;
                }
                write!(f, " }}")
            },
        }
    }
}
