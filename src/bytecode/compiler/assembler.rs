//! Packs IR into statements and lays out the program image.

use crate::prelude::*;
use crate::config::{self, PROGS_VERSION, MAX_GLOBALS, MAX_PARAMS};
use crate::bytecode::{Program, Statement, Definition, Function, OpCode};
use crate::bytecode::compiler::{
    allocator::Allocator,
    error::{AssembleErrorKind, CompileError, CompileResult},
    ir::{Ir, IrKind, Operand},
};
use tracing::{debug, warn};

/// Program image writer.
#[derive(Debug)]
pub struct Assembler<'a> {
    allocator   : &'a mut Allocator,
    program     : Program,
    /// Global address of local offset 0.
    local_base  : usize,
    /// Size of the global data region including locals.
    total       : usize,
    /// Statement index of each generated function by function index.
    starts      : Map<usize, i32>,
}

/// Assembles the IR into a program image. Names of functions and definitions are added to the allocator's
/// string pool.
pub fn assemble(allocator: &mut Allocator, ir: &[ Ir ]) -> CompileResult<Program> {
    let mut assembler = Assembler::new(allocator)?;
    assembler.write_statements(ir)?;
    assembler.write_functions();
    assembler.write_globals();
    assembler.write_definitions()?;
    assembler.into_program()
}

impl<'a> Assembler<'a> {
    /// Creates a new assembler, placing the shared local region directly after the globals.
    pub fn new(allocator: &'a mut Allocator) -> CompileResult<Self> {
        super::check_options(allocator.options())?;
        let local_base = allocator.global_size();
        let total = local_base + allocator.local_size();
        if total > MAX_GLOBALS {
            return Err(CompileError::assembly(AssembleErrorKind::GlobalsOverflow(total)));
        }
        Ok(Assembler {
            allocator,
            program     : Program { version: PROGS_VERSION, ..Program::default() },
            local_base,
            total,
            starts      : Map::new(),
        })
    }

    /// Maps an IR operand to a statement operand.
    fn operand(self: &Self, operand: Operand, statement: usize) -> CompileResult<config::Operand> {
        let address = match operand {
            Operand::Null => 0,
            Operand::Global(address) => address,
            Operand::Local(offset) => self.local_base + offset,
            Operand::Relative(distance) => {
                return config::Operand::try_from(distance).map_err(|_| CompileError::assembly(AssembleErrorKind::OperandOutOfRange(distance as i64)));
            },
            Operand::Pending => return Err(CompileError::assembly(AssembleErrorKind::PendingJump(statement))),
        };
        if address >= self.total {
            return Err(CompileError::assembly(AssembleErrorKind::GlobalsOverflow(address)));
        }
        Ok(address as u16 as config::Operand)
    }

    /// Drops marker records and writes the real ones. Statement 0 is a `DONE` so that index 0 never starts a function.
    pub fn write_statements(self: &mut Self, ir: &[ Ir ]) -> CompileResult {
        self.program.statements.push(Statement::new(OpCode::DONE, 0, 0, 0));
        for record in ir {
            match &record.kind {
                IrKind::Function { index, .. } => {
                    self.starts.insert(*index, self.program.statements.len() as i32);
                },
                IrKind::Real { op, a, b, c } => {
                    let index = self.program.statements.len();
                    let statement = Statement::new(*op, self.operand(*a, index)?, self.operand(*b, index)?, self.operand(*c, index)?);
                    self.program.statements.push(statement);
                },
                _ => { },
            }
        }
        Ok(())
    }

    /// Writes the function table. Function 0 is the null function, builtins store their negated id.
    pub fn write_functions(self: &mut Self) {
        self.program.functions.push(Function::default());
        let functions = self.allocator.functions().to_vec();
        for (position, function) in functions.iter().enumerate() {
            let index = position + 1;
            let first_statement = match (function.builtin, self.starts.get(&index)) {
                (Some(id), _) => -id,
                (None, Some(&start)) => start,
                (None, None) => {
                    warn!("function {} declared but never defined", function.name);
                    0
                },
            };
            let mut record = Function {
                first_statement,
                name: self.allocator.allocate_string(&function.name),
                ..Function::default()
            };
            if first_statement > 0 {
                record.first_local = self.local_base as i32;
                record.num_locals = (self.total - self.local_base) as i32;
            }
            if let Some(signature) = function.ty.as_function() {
                record.num_params = signature.params.len().min(MAX_PARAMS) as i32;
                for (slot, param) in signature.params.iter().take(MAX_PARAMS).enumerate() {
                    record.param_sizes[slot] = param.size() as u8;
                }
            }
            self.program.functions.push(record);
        }
    }

    /// Writes the initial global data. Constants and pre-seeded globals carry their values, everything else is zero.
    pub fn write_globals(self: &mut Self) {
        let mut globals = vec![ 0u32; self.total ];
        for entry in self.allocator.entries() {
            if let (Operand::Global(address), Some(value)) = (entry.address, &entry.value) {
                for (offset, word) in value.to_words().into_iter().enumerate() {
                    if let Some(target) = globals.get_mut(address + offset) {
                        *target = word;
                    }
                }
            }
        }
        self.program.globals = globals;
    }

    /// Writes a global definition for every entry and a field definition for every entity field.
    pub fn write_definitions(self: &mut Self) -> CompileResult {
        let entries: Vec<_> = self.allocator.entries().iter().map(|entry| (entry.name.clone(), entry.address, entry.ty.def_type())).collect();
        for (name, address, ty) in entries {
            let offset = self.operand(address, 0)? as u16;
            let name = self.allocator.allocate_string(&name);
            self.program.global_defs.push(Definition { ty, offset, name });
        }
        let fields = self.allocator.fields().to_vec();
        for field in fields {
            let name = self.allocator.allocate_string(&field.name);
            self.program.field_defs.push(Definition { ty: field.ty.def_type(), offset: field.offset as u16, name });
        }
        self.program.entity_fields = self.allocator.field_count() as i32;
        Ok(())
    }

    /// Finalizes the string pool and checksum, verifies the section layout and returns the program.
    pub fn into_program(self: Self) -> CompileResult<Program> {
        let mut program = self.program;
        program.strings = self.allocator.string_pool().to_vec();
        program.crc = program.checksum();
        let sections = program.sections();
        const NAMES: [ &str; 6 ] = [ "statements", "global definitions", "field definitions", "functions", "strings", "globals" ];
        let mut order: Vec<usize> = (0..sections.len()).collect();
        order.sort_by_key(|&index| sections[index].0);
        for pair in order.windows(2) {
            let (previous, next) = (pair[0], pair[1]);
            let end = sections[previous].0 + sections[previous].1 * section_size(previous);
            if end > sections[next].0 {
                return Err(CompileError::assembly(AssembleErrorKind::SectionOverlap(NAMES[next])));
            }
        }
        debug!(
            "assembled {} statements, {} functions, {} globals ({} locals at {}), {} global defs, {} field defs, {} string bytes",
            program.statements.len(), program.functions.len(), program.globals.len(), self.total - self.local_base, self.local_base,
            program.global_defs.len(), program.field_defs.len(), program.strings.len()
        );
        Ok(program)
    }
}

/// Record size of a header section.
fn section_size(section: usize) -> usize {
    match section {
        0 => config::STATEMENT_SIZE,
        1 | 2 => config::DEFINITION_SIZE,
        3 => config::FUNCTION_SIZE,
        4 => 1,
        _ => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerOptions;
    use crate::shared::{types::Type, operator::Operator};
    use crate::frontend::{ast::Expression, build::*};
    use crate::bytecode::Builtin;
    use crate::bytecode::compiler::{generator::Generator, error::CompileErrorKind};

    fn assembled(options: CompilerOptions, roots: Vec<Expression>) -> CompileResult<Program> {
        let mut generator = Generator::new(options);
        for root in &roots {
            generator.generate(root)?;
        }
        let (mut allocator, ir) = generator.finish();
        assemble(&mut allocator, &ir)
    }

    fn assembly_error(result: CompileResult<Program>) -> AssembleErrorKind {
        match result.unwrap_err().kind() {
            CompileErrorKind::Assembly(kind) => kind.clone(),
            other => panic!("expected assembly error, got {other:?}"),
        }
    }

    #[test]
    fn function_table() {
        let program = assembled(CompilerOptions::default(), vec![
            native("sqrt", Builtin::sqrt.signature(), Builtin::sqrt.id()),
            function("main", Type::function(Type::Void, vec![]), &[], vec![
                decl_init("x", Type::Float, float(2.0)),
                assign(var("x"), binary(Operator::Add, var("x"), float(3.0))),
            ]),
        ]).unwrap();
        assert_eq!(program.statements[0].op, OpCode::DONE);
        assert_eq!(program.functions.len(), 3);
        assert_eq!(program.functions[0], Function::default());
        assert_eq!(program.functions[1].first_statement, -Builtin::sqrt.id());
        assert_eq!(program.string(program.functions[1].name), "sqrt");
        assert_eq!(program.functions[1].num_params, 1);
        assert_eq!(program.functions[2].first_statement, 1);
        assert_eq!(program.function_index("main"), Some(2));
        assert_eq!(program.statements.last().unwrap().op, OpCode::DONE);
        assert_eq!(program.crc, program.checksum());
        assert_eq!(program.version, PROGS_VERSION);
    }

    #[test]
    fn locals_follow_globals() {
        let program = assembled(CompilerOptions::default(), vec![
            function("main", Type::function(Type::Void, vec![]), &[], vec![
                decl_init("x", Type::Float, float(2.0)),
            ]),
        ]).unwrap();
        let main = &program.functions[1];
        assert_eq!(main.num_locals, 1);
        assert_eq!(main.first_local as usize + main.num_locals as usize, program.globals.len());
        let store = program.statements[1];
        assert_eq!(store.op, OpCode::STORE_FLOAT);
        assert_eq!(store.b as i32, main.first_local);
        assert_eq!(program.global_def("x").map(|def| def.offset as i32), Some(main.first_local));
    }

    #[test]
    fn initial_globals_and_fields() {
        let program = assembled(CompilerOptions::default(), vec![
            decl_init("speed", Type::Float, float(4.5)),
            decl_init("greeting", Type::String, string("hi")),
            decl("health", Type::field(Type::Float)),
            decl("origin", Type::field(Type::Vector)),
        ]).unwrap();
        let speed = program.global_def("speed").unwrap().offset as usize;
        assert_eq!(program.globals[speed], 4.5f32.to_bits());
        let greeting = program.global_def("greeting").unwrap().offset as usize;
        assert_eq!(program.string(program.globals[greeting] as i32), "hi");
        assert_eq!(program.entity_fields, 4);
        assert_eq!(program.field_def("health").map(|def| def.offset), Some(0));
        assert_eq!(program.field_def("origin_y").map(|def| def.offset), Some(2));
        assert_eq!(Program::from_bytes(&program.to_bytes()).unwrap(), program);
    }

    #[test]
    fn globals_overflow() {
        let options = CompilerOptions { user_storage_start: MAX_GLOBALS - 1, ..CompilerOptions::default() };
        assert!(matches!(assembly_error(assembled(options, vec![])), AssembleErrorKind::GlobalsOverflow(_)));
    }

    #[test]
    fn unresolved_and_oversized_jumps() {
        let marker = Ir::marker(IrKind::Function { name: "main".to_string(), index: 1 });
        let mut allocator = Allocator::new(CompilerOptions::default());
        let pending = vec![ marker.clone(), Ir::real(OpCode::GOTO, Operand::Pending, Operand::Null, Operand::Null, String::new()) ];
        assert_eq!(assembly_error(assemble(&mut allocator, &pending)), AssembleErrorKind::PendingJump(1));
        let far = vec![ marker, Ir::real(OpCode::GOTO, Operand::Relative(40000), Operand::Null, Operand::Null, String::new()) ];
        assert_eq!(assembly_error(assemble(&mut allocator, &far)), AssembleErrorKind::OperandOutOfRange(40000));
    }
}
