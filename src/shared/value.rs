//! Compile time constant values.

use crate::prelude::*;

/// A constant value. Used for literals in the expression tree and as the payload of allocated constants.
#[derive(Clone, Debug)]
pub enum Value {
    Float(f32),
    Int(i32),
    Bool(bool),
    Str(String),
    Vector([f32; 3]),
    /// Raw word, e.g. a function index, field offset or string pool offset.
    Pointer(i32),
}

impl Value {
    /// Returns the value as a float if it is of a numeric tag.
    pub fn as_float(self: &Self) -> Option<f32> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f32),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
    /// Size of the value in global words.
    pub fn size(self: &Self) -> usize {
        match self {
            Value::Vector(_) => 3,
            _ => 1,
        }
    }
    /// Returns the words this value occupies in the global data region. Numbers are stored as floats.
    pub fn to_words(self: &Self) -> Vec<u32> {
        match self {
            Value::Vector(v) => v.iter().map(|c| c.to_bits()).collect(),
            Value::Pointer(p) => vec![ *p as u32 ],
            Value::Str(_) => vec![ 0 ],
            other => vec![ other.as_float().unwrap_or(0.0).to_bits() ],
        }
    }
    /// Short name used for anonymous constants, e.g. `1.5f` or `3i`.
    pub fn constant_name(self: &Self) -> String {
        match self {
            Value::Float(f) => format!("{f}f"),
            Value::Int(i) => format!("{i}i"),
            Value::Bool(b) => format!("{b}"),
            Value::Str(s) => format!("str({s})"),
            Value::Vector([ x, y, z ]) => format!("'{x} {y} {z}'"),
            Value::Pointer(p) => format!("${p}"),
        }
    }

    /// Adds two values. Numbers of any tag are computed as floats, the same way the VM computes them.
    pub fn add(self: &Self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Value::Vector(a), Value::Vector(b)) => Some(Value::Vector([ a[0] + b[0], a[1] + b[1], a[2] + b[2] ])),
            (a, b) => Some(Value::Float(a.as_float()? + b.as_float()?)),
        }
    }
    /// Subtracts two values.
    pub fn sub(self: &Self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Value::Vector(a), Value::Vector(b)) => Some(Value::Vector([ a[0] - b[0], a[1] - b[1], a[2] - b[2] ])),
            (a, b) => Some(Value::Float(a.as_float()? - b.as_float()?)),
        }
    }
    /// Multiplies two values. The product of two vectors is their dot product.
    pub fn mul(self: &Self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Value::Vector(a), Value::Vector(b)) => Some(Value::Float(a[0] * b[0] + a[1] * b[1] + a[2] * b[2])),
            (Value::Vector(v), s) | (s, Value::Vector(v)) => {
                let s = s.as_float()?;
                Some(Value::Vector([ v[0] * s, v[1] * s, v[2] * s ]))
            }
            (a, b) => Some(Value::Float(a.as_float()? * b.as_float()?)),
        }
    }
    /// Divides two values. Division by zero yields `None`.
    pub fn div(self: &Self, other: &Value) -> Option<Value> {
        let divisor = other.as_float()?;
        if divisor == 0.0 {
            return None;
        }
        match (self, other) {
            (Value::Vector(v), _) => Some(Value::Vector([ v[0] / divisor, v[1] / divisor, v[2] / divisor ])),
            (a, _) => Some(Value::Float(a.as_float()? / divisor)),
        }
    }
    /// Remainder of two values. Division by zero yields `None`.
    pub fn rem(self: &Self, other: &Value) -> Option<Value> {
        match (self, other) {
            (_, b) if b.as_float()? == 0.0 => None,
            (a, b) => Some(Value::Float(a.as_float()? % b.as_float()?)),
        }
    }
    /// Negates a value.
    pub fn neg(self: &Self) -> Option<Value> {
        match self {
            Value::Vector(v) => Some(Value::Vector([ -v[0], -v[1], -v[2] ])),
            a => Some(Value::Float(-a.as_float()?)),
        }
    }
}

impl PartialEq for Value {
    fn eq(self: &Self, other: &Value) -> bool {
        match (self, other) {
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Vector(a), Value::Vector(b)) => a.iter().zip(b.iter()).all(|(x, y)| x.to_bits() == y.to_bits()),
            (Value::Pointer(a), Value::Pointer(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value { }

impl Hash for Value {
    fn hash<H: Hasher>(self: &Self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Float(f) => f.to_bits().hash(state),
            Value::Int(i) => i.hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Str(s) => s.hash(state),
            Value::Vector(v) => v.iter().for_each(|c| c.to_bits().hash(state)),
            Value::Pointer(p) => p.hash(state),
        }
    }
}

impl Display for Value {
    fn fmt(self: &Self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v:?}"),
            Value::Vector([ x, y, z ]) => write!(f, "'{x} {y} {z}'"),
            Value::Pointer(v) => write!(f, "${v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_fold_as_floats() {
        assert_eq!(Value::Int(7).div(&Value::Int(2)), Some(Value::Float(3.5)));
        assert_eq!(Value::Int(7).rem(&Value::Int(2)), Some(Value::Float(1.0)));
        assert_eq!(Value::Int(2).sub(&Value::Int(5)), Some(Value::Float(-3.0)));
        assert_eq!(Value::Int(3).neg(), Some(Value::Float(-3.0)));
        assert_eq!(Value::Bool(true).add(&Value::Int(1)), Some(Value::Float(2.0)));
        assert_eq!(Value::Float(1.0).div(&Value::Int(0)), None);
        assert_eq!(Value::Vector([ 1.0, 2.0, 3.0 ]).mul(&Value::Int(2)), Some(Value::Vector([ 2.0, 4.0, 6.0 ])));
    }
}
