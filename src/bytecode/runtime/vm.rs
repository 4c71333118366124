//! A virtual machine for running progs bytecode.

use crate::prelude::*;
use crate::config::{Operand, OFS_RETURN, param_offset};
use crate::bytecode::{Program, Function, operand_address, Builtin};
use crate::bytecode::runtime::{entities::Entities, strings::Strings, error::{RuntimeError, RuntimeErrorKind, RuntimeResult}};
use tracing::{trace, debug};

/// Maximum call depth before execution faults.
pub const MAX_CALL_DEPTH: usize = 1024;

/// Current state of the vm, checked after each instruction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum VMState {
    /// The program is ready to run.
    Ready,
    /// A function is executing. Only observable while stepping.
    Running,
    /// The entry function has returned. The VM must be reset or a new function started.
    Terminated,
    /// The program encountered a runtime error and must be reset before it can be run again.
    RuntimeError,
}

/// How to move the statement index after executing an instruction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Advance {
    /// Continue with the following statement.
    Next,
    /// Move by a signed number of statements relative to the current one.
    Jump(i32),
    /// Continue at the given absolute statement of a called function.
    Call(usize),
    /// Return from the current function.
    Return,
}

/// A call frame.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Index of the executing function.
    pub function    : usize,
    /// Statement to continue at once the function returns. `None` for the entry frame.
    pub return_to   : Option<usize>,
    /// Local region contents of the caller, restored on return.
    locals          : Vec<u32>,
    /// Number of temporary strings that existed when the frame was entered.
    temp_mark       : usize,
}

/// A virtual machine for running progs bytecode.
#[derive(Debug)]
pub struct VM {
    pub(crate) program  : Program,
    pub(crate) globals  : Vec<u32>,
    pub(crate) frames   : Vec<Frame>,
    pub(crate) pc       : usize,
    pub(crate) state    : VMState,
    pub entities        : Entities,
    pub strings         : Strings,
    output              : String,
    trace               : Option<Vec<usize>>,
}

/// Public VM methods.
impl VM {
    /// Create a new VM instance with the given Program.
    pub fn new(program: &Program) -> Self {
        VM {
            globals     : program.globals.clone(),
            entities    : Entities::new(program.entity_fields.max(0) as usize),
            strings     : Strings::new(program.strings.clone()),
            program     : program.clone(),
            frames      : Vec::new(),
            pc          : 0,
            state       : VMState::Ready,
            output      : String::new(),
            trace       : None,
        }
    }

    /// Resets the VM, restoring initial global data, entities and strings.
    pub fn reset(self: &mut Self) {
        self.globals = self.program.globals.clone();
        self.entities = Entities::new(self.program.entity_fields.max(0) as usize);
        self.strings = Strings::new(self.program.strings.clone());
        self.frames.clear();
        self.pc = 0;
        self.state = VMState::Ready;
        self.output.clear();
        if let Some(trace) = &mut self.trace {
            trace.clear();
        }
    }

    /// Calls the named function and executes until it returns.
    pub fn run(self: &mut Self, function: &str) -> RuntimeResult<VMState> {
        self.start(function)?;
        while self.state == VMState::Running {
            self.exec_step()?;
        }
        Ok(self.state)
    }

    /// Prepares a call to the named function without executing any statements.
    pub fn start(self: &mut Self, function: &str) -> RuntimeResult {
        if self.state == VMState::RuntimeError || self.state == VMState::Running {
            return Err(RuntimeError::new(self.pc, RuntimeErrorKind::NotReady));
        }
        let index = self.program.function_index(function)
            .ok_or_else(|| RuntimeError::new(self.pc, RuntimeErrorKind::UndefinedFunction(function.to_string())))?;
        let record = self.program.functions[index];
        debug!("running {function}");
        if let Some(id) = record.builtin_id() {
            self.call_builtin(id, record.num_params.max(0) as usize)?;
            self.state = VMState::Terminated;
        } else {
            self.enter(index, None)?;
            self.pc = record.first_statement as usize;
            self.state = VMState::Running;
        }
        Ok(())
    }

    /// Executes a single statement.
    #[cfg(feature="debugging")]
    pub fn step(self: &mut Self) -> RuntimeResult<VMState> {
        if self.state != VMState::Running {
            return Err(RuntimeError::new(self.pc, RuntimeErrorKind::NotReady));
        }
        self.exec_step()?;
        Ok(self.state)
    }

    /// Current state of the VM.
    pub fn state(self: &Self) -> VMState {
        self.state
    }

    /// Index of the next statement to execute.
    pub fn pc(self: &Self) -> usize {
        self.pc
    }

    /// Current call depth.
    pub fn depth(self: &Self) -> usize {
        self.frames.len()
    }

    /// The program loaded into this VM.
    pub fn program(self: &Self) -> &Program {
        &self.program
    }

    /// Text printed by the program so far.
    pub fn output(self: &Self) -> &str {
        &self.output
    }

    /// Enables or disables recording the index of every executed statement.
    pub fn record_trace(self: &mut Self, enable: bool) {
        self.trace = if enable { Some(Vec::new()) } else { None };
    }

    /// Indices of all statements executed since tracing was enabled.
    pub fn trace(self: &Self) -> &[ usize ] {
        self.trace.as_deref().unwrap_or(&[])
    }

    /// Returns the float stored at a global address.
    pub fn global_float(self: &Self, address: usize) -> RuntimeResult<f32> {
        Ok(f32::from_bits(self.word(address)?))
    }

    /// Returns the integer stored at a global address.
    pub fn global_int(self: &Self, address: usize) -> RuntimeResult<i32> {
        Ok(self.word(address)? as i32)
    }

    /// Returns the vector stored at a global address.
    pub fn global_vector(self: &Self, address: usize) -> RuntimeResult<[ f32; 3 ]> {
        Ok([ self.global_float(address)?, self.global_float(address + 1)?, self.global_float(address + 2)? ])
    }

    /// Returns the string referenced by a global address.
    pub fn global_string(self: &Self, address: usize) -> RuntimeResult<String> {
        Ok(self.strings.get(self.global_int(address)?).into_owned())
    }

    /// Stores a float at a global address, e.g. to pass arguments to an entry function.
    pub fn set_global_float(self: &mut Self, address: usize, value: f32) -> RuntimeResult {
        self.set_word(address, value.to_bits())
    }

    /// Stores an integer at a global address.
    pub fn set_global_int(self: &mut Self, address: usize, value: i32) -> RuntimeResult {
        self.set_word(address, value as u32)
    }

    /// Returns the global address of a named global definition.
    pub fn global_address(self: &Self, name: &str) -> Option<usize> {
        self.program.global_def(name).map(|def| def.offset as usize)
    }

    /// Float view of the return slot.
    pub fn return_float(self: &Self) -> RuntimeResult<f32> {
        self.global_float(OFS_RETURN)
    }

    /// Vector view of the return slot.
    pub fn return_vector(self: &Self) -> RuntimeResult<[ f32; 3 ]> {
        self.global_vector(OFS_RETURN)
    }

    /// Integer view of the return slot, e.g. an entity or string index.
    pub fn return_int(self: &Self) -> RuntimeResult<i32> {
        self.global_int(OFS_RETURN)
    }

    /// The string referenced by the return slot.
    pub fn return_string(self: &Self) -> RuntimeResult<String> {
        self.global_string(OFS_RETURN)
    }
}

/// Internal VM methods used by instructions and builtins.
impl VM {

    /// Executes the statement at the current index and advances.
    pub(crate) fn exec_step(self: &mut Self) -> RuntimeResult {
        let statement = match self.program.statements.get(self.pc) {
            Some(statement) => *statement,
            None => return self.fail(RuntimeErrorKind::BadJump(self.pc as i64)),
        };
        #[cfg(feature="debugging")]
        trace!("{:5} {}", self.pc, statement.describe());
        if let Some(trace) = &mut self.trace {
            trace.push(self.pc);
        }
        match self.exec_statement(statement) {
            Ok(advance) => self.advance(advance),
            Err(error) => {
                self.state = VMState::RuntimeError;
                Err(error)
            }
        }
    }

    /// Moves the statement index according to the given advance.
    fn advance(self: &mut Self, advance: Advance) -> RuntimeResult {
        match advance {
            Advance::Next => self.pc += 1,
            Advance::Jump(distance) => {
                let target = self.pc as i64 + distance as i64;
                if target < 0 || target >= self.program.statements.len() as i64 {
                    return self.fail(RuntimeErrorKind::BadJump(target));
                }
                self.pc = target as usize;
            },
            Advance::Call(target) => self.pc = target,
            Advance::Return => self.leave()?,
        }
        Ok(())
    }

    /// Puts the VM into error state and returns the error.
    fn fail<T>(self: &mut Self, kind: RuntimeErrorKind) -> RuntimeResult<T> {
        self.state = VMState::RuntimeError;
        Err(self.error(kind))
    }

    /// Creates a runtime error at the current statement.
    pub(crate) fn error(self: &Self, kind: RuntimeErrorKind) -> RuntimeError {
        RuntimeError::new(self.pc, kind)
    }

    /// Pushes a frame for the given function and copies the parameter slots into its locals.
    fn enter(self: &mut Self, index: usize, return_to: Option<usize>) -> RuntimeResult {
        if self.frames.len() >= MAX_CALL_DEPTH {
            return Err(self.error(RuntimeErrorKind::StackOverflow));
        }
        let function = self.program.functions[index];
        let locals = self.local_range(&function)?;
        trace!("enter {} (depth {})", self.program.string(function.name), self.frames.len() + 1);
        self.frames.push(Frame { function: index, return_to, locals: self.globals[locals.clone()].to_vec(), temp_mark: self.strings.temp_len() });
        let mut target = locals.start;
        for param in 0..(function.num_params.max(0) as usize).min(function.param_sizes.len()) {
            let source = param_offset(param as i32) as usize;
            for word in 0..function.param_sizes[param] as usize {
                let value = self.word(source + word)?;
                self.set_word(target, value)?;
                target += 1;
            }
        }
        Ok(())
    }

    /// Pops the current frame, restoring the caller's locals.
    fn leave(self: &mut Self) -> RuntimeResult {
        let frame = match self.frames.pop() {
            Some(frame) => frame,
            None => return self.fail(RuntimeErrorKind::NotReady),
        };
        let function = self.program.functions[frame.function];
        let locals = self.local_range(&function)?;
        self.globals[locals].copy_from_slice(&frame.locals);
        trace!("leave {} (depth {})", self.program.string(function.name), self.frames.len());
        match frame.return_to {
            Some(return_to) => {
                self.pc = return_to;
                let result = self.word(OFS_RETURN)? as i32;
                if let Some(kept) = self.strings.release_temp(frame.temp_mark, result) {
                    self.set_word(OFS_RETURN, kept as u32)?;
                }
            },
            None => self.state = VMState::Terminated,
        }
        Ok(())
    }

    /// Range of global words holding the locals of a function.
    fn local_range(self: &Self, function: &Function) -> RuntimeResult<std::ops::Range<usize>> {
        let start = function.first_local.max(0) as usize;
        let end = start + function.num_locals.max(0) as usize;
        if end > self.globals.len() {
            Err(self.error(RuntimeErrorKind::GlobalOutOfBounds(end)))
        } else {
            Ok(start..end)
        }
    }

    /// Calls the function whose index is stored in the given operand.
    pub(crate) fn call_function(self: &mut Self, operand: Operand, num_args: usize) -> RuntimeResult<Advance> {
        let index = self.int(operand)?;
        let function = match self.program.functions.get(index.max(0) as usize) {
            Some(function) if index > 0 && function.first_statement != 0 => *function,
            _ => return Err(self.error(RuntimeErrorKind::UndefinedFunction(format!("#{index}")))),
        };
        if let Some(id) = function.builtin_id() {
            self.call_builtin(id, num_args)?;
            Ok(Advance::Next)
        } else {
            self.enter(index as usize, Some(self.pc + 1))?;
            Ok(Advance::Call(function.first_statement as usize))
        }
    }

    /// Invokes a host implemented builtin.
    fn call_builtin(self: &mut Self, id: i32, num_args: usize) -> RuntimeResult {
        let builtin = Builtin::from_id(id).ok_or_else(|| self.error(RuntimeErrorKind::UndefinedBuiltin(id)))?;
        trace!("builtin {} ({num_args} args)", builtin.name());
        builtin.exec(self, num_args)
    }

    /// Copies a return value into the return slot. Always 3 words unless the value ends the global region.
    pub(crate) fn set_return(self: &mut Self, operand: Operand) -> RuntimeResult {
        let available = self.globals.len().saturating_sub(operand_address(operand));
        self.copy_words(operand, OFS_RETURN as Operand, available.clamp(1, 3))
    }

    /// Reads a raw global word.
    pub(crate) fn word(self: &Self, address: usize) -> RuntimeResult<u32> {
        self.globals.get(address).copied().ok_or_else(|| self.error(RuntimeErrorKind::GlobalOutOfBounds(address)))
    }

    /// Writes a raw global word.
    pub(crate) fn set_word(self: &mut Self, address: usize, value: u32) -> RuntimeResult {
        match self.globals.get_mut(address) {
            Some(word) => {
                *word = value;
                Ok(())
            },
            None => Err(self.error(RuntimeErrorKind::GlobalOutOfBounds(address))),
        }
    }

    pub(crate) fn float(self: &Self, operand: Operand) -> RuntimeResult<f32> {
        Ok(f32::from_bits(self.word(operand_address(operand))?))
    }

    pub(crate) fn int(self: &Self, operand: Operand) -> RuntimeResult<i32> {
        Ok(self.word(operand_address(operand))? as i32)
    }

    pub(crate) fn vector(self: &Self, operand: Operand) -> RuntimeResult<[ f32; 3 ]> {
        self.global_vector(operand_address(operand))
    }

    /// Decodes the string referenced by the given operand.
    pub(crate) fn string(self: &Self, operand: Operand) -> RuntimeResult<String> {
        Ok(self.strings.get(self.int(operand)?).into_owned())
    }

    pub(crate) fn set_float(self: &mut Self, operand: Operand, value: f32) -> RuntimeResult {
        self.set_word(operand_address(operand), value.to_bits())
    }

    pub(crate) fn set_int(self: &mut Self, operand: Operand, value: i32) -> RuntimeResult {
        self.set_word(operand_address(operand), value as u32)
    }

    /// Stores a comparison result as float 1 or 0.
    pub(crate) fn set_bool(self: &mut Self, operand: Operand, value: bool) -> RuntimeResult {
        self.set_float(operand, if value { 1.0 } else { 0.0 })
    }

    pub(crate) fn set_vector(self: &mut Self, operand: Operand, value: [ f32; 3 ]) -> RuntimeResult {
        let address = operand_address(operand);
        for (offset, component) in value.iter().enumerate() {
            self.set_word(address + offset, component.to_bits())?;
        }
        Ok(())
    }

    /// Copies `size` words between two global addresses.
    pub(crate) fn copy_words(self: &mut Self, from: Operand, to: Operand, size: usize) -> RuntimeResult {
        let (from, to) = (operand_address(from), operand_address(to));
        for offset in 0..size {
            let value = self.word(from + offset)?;
            self.set_word(to + offset, value)?;
        }
        Ok(())
    }

    /// Loads `size` words of the entity field addressed by `entity` and `field` into `target`.
    pub(crate) fn load_field(self: &mut Self, entity: Operand, field: Operand, target: Operand, size: usize) -> RuntimeResult {
        let (entity, field) = (self.int(entity)?, self.int(field)?);
        let words = match self.entities.read(entity, field, size) {
            Ok(words) => words.to_vec(),
            Err(kind) => return Err(self.error(kind)),
        };
        let address = operand_address(target);
        for (offset, word) in words.into_iter().enumerate() {
            self.set_word(address + offset, word)?;
        }
        Ok(())
    }

    /// Stores `size` words from `source` through the entity field address held by `pointer`.
    pub(crate) fn store_field(self: &mut Self, source: Operand, pointer: Operand, size: usize) -> RuntimeResult {
        let address = self.int(pointer)?;
        let from = operand_address(source);
        let words = (0..size).map(|offset| self.word(from + offset)).collect::<RuntimeResult<Vec<u32>>>()?;
        self.entities.write_address(address, &words).map_err(|kind| self.error(kind))
    }

    /// Reads the float argument at the given parameter position.
    pub(crate) fn param_float(self: &Self, index: usize) -> RuntimeResult<f32> {
        self.global_float(param_offset(index as i32) as usize)
    }

    /// Reads the integer argument at the given parameter position.
    pub(crate) fn param_int(self: &Self, index: usize) -> RuntimeResult<i32> {
        self.global_int(param_offset(index as i32) as usize)
    }

    /// Reads the vector argument at the given parameter position.
    pub(crate) fn param_vector(self: &Self, index: usize) -> RuntimeResult<[ f32; 3 ]> {
        self.global_vector(param_offset(index as i32) as usize)
    }

    /// Reads the string argument at the given parameter position.
    pub(crate) fn param_string(self: &Self, index: usize) -> RuntimeResult<String> {
        self.global_string(param_offset(index as i32) as usize)
    }

    /// Reads the string arguments from parameter position `from` up to `num_args`.
    pub(crate) fn param_strings(self: &Self, from: usize, num_args: usize) -> RuntimeResult<Vec<String>> {
        (from..num_args).map(|index| self.param_string(index)).collect()
    }

    /// Writes a float result into the return slot.
    pub(crate) fn return_with_float(self: &mut Self, value: f32) -> RuntimeResult {
        self.set_word(OFS_RETURN, value.to_bits())
    }

    /// Writes an integer result (entity or string index) into the return slot.
    pub(crate) fn return_with_int(self: &mut Self, value: i32) -> RuntimeResult {
        self.set_word(OFS_RETURN, value as u32)
    }

    /// Writes a vector result into the return slot.
    pub(crate) fn return_with_vector(self: &mut Self, value: [ f32; 3 ]) -> RuntimeResult {
        for (offset, component) in value.iter().enumerate() {
            self.set_word(OFS_RETURN + offset, component.to_bits())?;
        }
        Ok(())
    }

    /// Stores a temporary string and writes its index into the return slot.
    pub(crate) fn return_with_string(self: &mut Self, value: String) -> RuntimeResult {
        let index = self.strings.temp(value);
        self.return_with_int(index)
    }

    /// Appends printed text to the output buffer.
    pub(crate) fn print(self: &mut Self, text: &str) {
        tracing::info!(target: "progs::print", "{text}");
        self.output.push_str(text);
    }
}
