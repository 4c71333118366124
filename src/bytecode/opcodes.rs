//! Opcode definitions. Implemented on VM and Statement by the `impl_opcodes!` macro.

use crate::config::Operand;
use crate::shared::types::Type;
use crate::bytecode::macros::impl_opcodes;
#[cfg(feature="runtime")]
use crate::bytecode::runtime::{vm::Advance, error::{RuntimeResult, RuntimeErrorKind}};

impl_opcodes!{

    /// Returns from the current function. Same as RETURN, used to mark the end of a function body.
    fn DONE(&mut self, a, b, c) -> Advance ["done" a] {
        self.set_return(a)?;
        Ok(Advance::Return)
    }

    fn MUL_FLOAT(&mut self, a, b, c) [c "=" a "*" b] {
        let result = self.float(a)? * self.float(b)?;
        self.set_float(c, result)?;
    }
    /// Dot product of two vectors.
    fn MUL_VEC(&mut self, a, b, c) [c "=" a "*" b] {
        let (x, y) = (self.vector(a)?, self.vector(b)?);
        self.set_float(c, x[0] * y[0] + x[1] * y[1] + x[2] * y[2])?;
    }
    fn MUL_FLOAT_VEC(&mut self, a, b, c) [c "=" a "*" b] {
        let (s, v) = (self.float(a)?, self.vector(b)?);
        self.set_vector(c, [ s * v[0], s * v[1], s * v[2] ])?;
    }
    fn MUL_VEC_FLOAT(&mut self, a, b, c) [c "=" a "*" b] {
        let (v, s) = (self.vector(a)?, self.float(b)?);
        self.set_vector(c, [ v[0] * s, v[1] * s, v[2] * s ])?;
    }
    fn DIV_FLOAT(&mut self, a, b, c) [c "=" a "/" b] {
        let result = self.float(a)? / self.float(b)?;
        self.set_float(c, result)?;
    }
    fn ADD_FLOAT(&mut self, a, b, c) [c "=" a "+" b] {
        let result = self.float(a)? + self.float(b)?;
        self.set_float(c, result)?;
    }
    fn ADD_VEC(&mut self, a, b, c) [c "=" a "+" b] {
        let (x, y) = (self.vector(a)?, self.vector(b)?);
        self.set_vector(c, [ x[0] + y[0], x[1] + y[1], x[2] + y[2] ])?;
    }
    fn SUB_FLOAT(&mut self, a, b, c) [c "=" a "-" b] {
        let result = self.float(a)? - self.float(b)?;
        self.set_float(c, result)?;
    }
    fn SUB_VEC(&mut self, a, b, c) [c "=" a "-" b] {
        let (x, y) = (self.vector(a)?, self.vector(b)?);
        self.set_vector(c, [ x[0] - y[0], x[1] - y[1], x[2] - y[2] ])?;
    }

    fn EQ_FLOAT(&mut self, a, b, c) [c "=" a "==" b] {
        let result = self.float(a)? == self.float(b)?;
        self.set_bool(c, result)?;
    }
    fn EQ_VEC(&mut self, a, b, c) [c "=" a "==" b] {
        let result = self.vector(a)? == self.vector(b)?;
        self.set_bool(c, result)?;
    }
    /// Compares the decoded strings, not their indices.
    fn EQ_STR(&mut self, a, b, c) [c "=" a "==" b] {
        let result = self.string(a)? == self.string(b)?;
        self.set_bool(c, result)?;
    }
    fn EQ_ENT(&mut self, a, b, c) [c "=" a "==" b] {
        let result = self.int(a)? == self.int(b)?;
        self.set_bool(c, result)?;
    }
    fn EQ_FUNC(&mut self, a, b, c) [c "=" a "==" b] {
        let result = self.int(a)? == self.int(b)?;
        self.set_bool(c, result)?;
    }
    fn NE_FLOAT(&mut self, a, b, c) [c "=" a "!=" b] {
        let result = self.float(a)? != self.float(b)?;
        self.set_bool(c, result)?;
    }
    fn NE_VEC(&mut self, a, b, c) [c "=" a "!=" b] {
        let result = self.vector(a)? != self.vector(b)?;
        self.set_bool(c, result)?;
    }
    fn NE_STR(&mut self, a, b, c) [c "=" a "!=" b] {
        let result = self.string(a)? != self.string(b)?;
        self.set_bool(c, result)?;
    }
    fn NE_ENT(&mut self, a, b, c) [c "=" a "!=" b] {
        let result = self.int(a)? != self.int(b)?;
        self.set_bool(c, result)?;
    }
    fn NE_FUNC(&mut self, a, b, c) [c "=" a "!=" b] {
        let result = self.int(a)? != self.int(b)?;
        self.set_bool(c, result)?;
    }

    fn LE(&mut self, a, b, c) [c "=" a "<=" b] {
        let result = self.float(a)? <= self.float(b)?;
        self.set_bool(c, result)?;
    }
    fn GE(&mut self, a, b, c) [c "=" a ">=" b] {
        let result = self.float(a)? >= self.float(b)?;
        self.set_bool(c, result)?;
    }
    fn LT(&mut self, a, b, c) [c "=" a "<" b] {
        let result = self.float(a)? < self.float(b)?;
        self.set_bool(c, result)?;
    }
    fn GT(&mut self, a, b, c) [c "=" a ">" b] {
        let result = self.float(a)? > self.float(b)?;
        self.set_bool(c, result)?;
    }

    /// Loads a field of the entity in `a` at the field offset in `b`.
    fn LOAD_FLOAT(&mut self, a, b, c) [c "=" a "->" b] {
        self.load_field(a, b, c, 1)?;
    }
    fn LOAD_VEC(&mut self, a, b, c) [c "=" a "->" b] {
        self.load_field(a, b, c, 3)?;
    }
    fn LOAD_STR(&mut self, a, b, c) [c "=" a "->" b] {
        self.load_field(a, b, c, 1)?;
    }
    fn LOAD_ENT(&mut self, a, b, c) [c "=" a "->" b] {
        self.load_field(a, b, c, 1)?;
    }
    fn LOAD_FIELD(&mut self, a, b, c) [c "=" a "->" b] {
        self.load_field(a, b, c, 1)?;
    }
    fn LOAD_FUNC(&mut self, a, b, c) [c "=" a "->" b] {
        self.load_field(a, b, c, 1)?;
    }

    /// Computes the entity store address of a field for a subsequent STOREP.
    fn ADDRESS(&mut self, a, b, c) [c "=" "&" a "->" b] {
        let address = self.entities.address(self.int(a)?, self.int(b)?).map_err(|kind| self.error(kind))?;
        self.set_int(c, address)?;
    }

    fn STORE_FLOAT(&mut self, a, b, c) [b "=" a] {
        self.copy_words(a, b, 1)?;
    }
    fn STORE_VEC(&mut self, a, b, c) [b "=" a] {
        self.copy_words(a, b, 3)?;
    }
    fn STORE_STR(&mut self, a, b, c) [b "=" a] {
        self.copy_words(a, b, 1)?;
    }
    fn STORE_ENT(&mut self, a, b, c) [b "=" a] {
        self.copy_words(a, b, 1)?;
    }
    fn STORE_FIELD(&mut self, a, b, c) [b "=" a] {
        self.copy_words(a, b, 1)?;
    }
    fn STORE_FUNC(&mut self, a, b, c) [b "=" a] {
        self.copy_words(a, b, 1)?;
    }

    /// Stores `a` through the entity store address in `b`.
    fn STOREP_FLOAT(&mut self, a, b, c) ["*" b "=" a] {
        self.store_field(a, b, 1)?;
    }
    fn STOREP_VEC(&mut self, a, b, c) ["*" b "=" a] {
        self.store_field(a, b, 3)?;
    }
    fn STOREP_STR(&mut self, a, b, c) ["*" b "=" a] {
        self.store_field(a, b, 1)?;
    }
    fn STOREP_ENT(&mut self, a, b, c) ["*" b "=" a] {
        self.store_field(a, b, 1)?;
    }
    fn STOREP_FIELD(&mut self, a, b, c) ["*" b "=" a] {
        self.store_field(a, b, 1)?;
    }
    fn STOREP_FUNC(&mut self, a, b, c) ["*" b "=" a] {
        self.store_field(a, b, 1)?;
    }

    /// Copies 3 words from `a` into the return slot and returns from the current function.
    fn RETURN(&mut self, a, b, c) -> Advance ["return" a] {
        self.set_return(a)?;
        Ok(Advance::Return)
    }

    fn NOT_FLOAT(&mut self, a, b, c) [c "=" "!" a] {
        let result = self.float(a)? == 0.0;
        self.set_bool(c, result)?;
    }
    fn NOT_VEC(&mut self, a, b, c) [c "=" "!" a] {
        let result = self.vector(a)? == [ 0.0; 3 ];
        self.set_bool(c, result)?;
    }
    /// Null string index or empty string.
    fn NOT_STR(&mut self, a, b, c) [c "=" "!" a] {
        let result = self.int(a)? == 0 || self.string(a)?.is_empty();
        self.set_bool(c, result)?;
    }
    fn NOT_ENT(&mut self, a, b, c) [c "=" "!" a] {
        let result = self.int(a)? == 0;
        self.set_bool(c, result)?;
    }
    fn NOT_FUNC(&mut self, a, b, c) [c "=" "!" a] {
        let result = self.int(a)? == 0;
        self.set_bool(c, result)?;
    }

    /// Jumps by `b` statements if `a` is true.
    fn IF(&mut self, a, b, c) -> Advance ["if" a "then jmp rel" rel_b] {
        Ok(if self.float(a)? != 0.0 { Advance::Jump(b as i32) } else { Advance::Next })
    }
    /// Jumps by `b` statements if `a` is false.
    fn IFNOT(&mut self, a, b, c) -> Advance ["if not" a "then jmp rel" rel_b] {
        Ok(if self.float(a)? == 0.0 { Advance::Jump(b as i32) } else { Advance::Next })
    }

    /// Calls the function whose index is stored in `a`.
    fn CALL0(&mut self, a, b, c) -> Advance [a "()"] {
        self.call_function(a, 0)
    }
    fn CALL1(&mut self, a, b, c) -> Advance [a "(.)"] {
        self.call_function(a, 1)
    }
    fn CALL2(&mut self, a, b, c) -> Advance [a "(..)"] {
        self.call_function(a, 2)
    }
    fn CALL3(&mut self, a, b, c) -> Advance [a "(...)"] {
        self.call_function(a, 3)
    }
    fn CALL4(&mut self, a, b, c) -> Advance [a "(....)"] {
        self.call_function(a, 4)
    }
    fn CALL5(&mut self, a, b, c) -> Advance [a "(.....)"] {
        self.call_function(a, 5)
    }
    fn CALL6(&mut self, a, b, c) -> Advance [a "(......)"] {
        self.call_function(a, 6)
    }
    fn CALL7(&mut self, a, b, c) -> Advance [a "(.......)"] {
        self.call_function(a, 7)
    }
    fn CALL8(&mut self, a, b, c) -> Advance [a "(........)"] {
        self.call_function(a, 8)
    }

    /// Animation state shortcut. Requires engine globals this VM does not define.
    fn STATE(&mut self, a, b, c) -> Advance ["state" a b] {
        Err(self.error(RuntimeErrorKind::Unsupported("STATE".to_string())))
    }

    /// Jumps by `a` statements.
    fn GOTO(&mut self, a, b, c) -> Advance ["jmp rel" rel_a] {
        Ok(Advance::Jump(a as i32))
    }

    fn AND(&mut self, a, b, c) [c "=" a "&&" b] {
        let result = self.float(a)? != 0.0 && self.float(b)? != 0.0;
        self.set_bool(c, result)?;
    }
    fn OR(&mut self, a, b, c) [c "=" a "||" b] {
        let result = self.float(a)? != 0.0 || self.float(b)? != 0.0;
        self.set_bool(c, result)?;
    }
    fn BITAND(&mut self, a, b, c) [c "=" a "&" b] {
        let result = (self.float(a)? as i32) & (self.float(b)? as i32);
        self.set_float(c, result as f32)?;
    }
    fn BITOR(&mut self, a, b, c) [c "=" a "|" b] {
        let result = (self.float(a)? as i32) | (self.float(b)? as i32);
        self.set_float(c, result as f32)?;
    }
}

impl OpCode {
    /// Returns the call instruction for the given number of arguments.
    pub fn call(num_args: usize) -> OpCode {
        match num_args {
            0 => OpCode::CALL0,
            1 => OpCode::CALL1,
            2 => OpCode::CALL2,
            3 => OpCode::CALL3,
            4 => OpCode::CALL4,
            5 => OpCode::CALL5,
            6 => OpCode::CALL6,
            7 => OpCode::CALL7,
            _ => OpCode::CALL8,
        }
    }
    /// Direct store for values of the given type.
    pub fn store(ty: &Type) -> OpCode {
        match ty {
            Type::Vector => OpCode::STORE_VEC,
            Type::String => OpCode::STORE_STR,
            Type::Entity => OpCode::STORE_ENT,
            Type::Field(_) => OpCode::STORE_FIELD,
            Type::Function(_) => OpCode::STORE_FUNC,
            _ => OpCode::STORE_FLOAT,
        }
    }
    /// Store through an entity field address for values of the given type.
    pub fn store_pointer(ty: &Type) -> OpCode {
        match ty {
            Type::Vector => OpCode::STOREP_VEC,
            Type::String => OpCode::STOREP_STR,
            Type::Entity => OpCode::STOREP_ENT,
            Type::Field(_) => OpCode::STOREP_FIELD,
            Type::Function(_) => OpCode::STOREP_FUNC,
            _ => OpCode::STOREP_FLOAT,
        }
    }
    /// Entity field load for values of the given type.
    pub fn load(ty: &Type) -> OpCode {
        match ty {
            Type::Vector => OpCode::LOAD_VEC,
            Type::String => OpCode::LOAD_STR,
            Type::Entity => OpCode::LOAD_ENT,
            Type::Field(_) => OpCode::LOAD_FIELD,
            Type::Function(_) => OpCode::LOAD_FUNC,
            _ => OpCode::LOAD_FLOAT,
        }
    }
}
