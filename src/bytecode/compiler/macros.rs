// Sets the comment attached to the next emitted IR record.
macro_rules! comment {
    ($self:ident, $format:literal $(, $value:expr)*) => {
        $self.comment = format!($format $(, $value)*);
    }
}

// Emits a real IR record with the given opcode and operands.
macro_rules! emit {
    ($self:ident, $op:ident, $a:expr) => {
        $self.emit(crate::bytecode::OpCode::$op, $a, crate::bytecode::compiler::ir::Operand::Null, crate::bytecode::compiler::ir::Operand::Null)
    };
    ($self:ident, $op:ident, $a:expr, $b:expr) => {
        $self.emit(crate::bytecode::OpCode::$op, $a, $b, crate::bytecode::compiler::ir::Operand::Null)
    };
    ($self:ident, $op:ident, $a:expr, $b:expr, $c:expr) => {
        $self.emit(crate::bytecode::OpCode::$op, $a, $b, $c)
    };
}
