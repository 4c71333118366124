//! Lowers expression trees to IR. One lowering rule per expression kind, threading the allocator.

mod operators;
mod control;

use crate::prelude::*;
use crate::config::{CompilerOptions, MAX_PARAMS, OFS_RETURN, param_offset};
use crate::shared::{types::{Type, FunctionType}, value::Value};
use crate::frontend::ast::{self, Expression, Position, Positioned};
use crate::bytecode::OpCode;
use crate::bytecode::compiler::{
    allocator::Allocator,
    desugar,
    error::{CompileError, CompileErrorKind, CompileResult, DiagnosticKind, OptionToCompileError},
    ir::{Ir, IrKind, Operand},
    util::{Slot, Place, PendingJump, LoopControlStack},
};
use tracing::debug;

/// A global array, accessed through its generated accessor functions.
#[derive(Clone, Debug)]
struct ArrayInfo {
    ty  : Type,
    len : usize,
}

/// IR generator.
pub struct Generator {
    /// Address allocation for everything the generated code refers to.
    allocator       : Allocator,
    /// Generated IR.
    ir              : Vec<Ir>,
    /// Comment for the next emitted record.
    comment         : String,
    /// Jumps of the current function awaiting label resolution.
    jumps           : Vec<PendingJump>,
    /// Break/continue targets of the enclosing loops.
    loops           : LoopControlStack,
    /// Declared arrays by name.
    arrays          : Map<String, ArrayInfo>,
    /// Index of the first IR record of the current function body.
    function_start  : Option<usize>,
    /// Position of the node being lowered.
    position        : Position,
    next_label      : usize,
    next_temp       : usize,
    next_scope      : usize,
    next_switch     : usize,
}

impl Generator {
    /// Creates a new generator.
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            allocator       : Allocator::new(options),
            ir              : Vec::new(),
            comment         : String::new(),
            jumps           : Vec::new(),
            loops           : LoopControlStack::new(),
            arrays          : Map::new(),
            function_start  : None,
            position        : Position(0),
            next_label      : 0,
            next_temp       : 0,
            next_scope      : 0,
            next_switch     : 0,
        }
    }

    /// The allocator used by this generator.
    pub fn allocator(self: &Self) -> &Allocator {
        &self.allocator
    }

    /// The IR generated so far.
    pub fn ir(self: &Self) -> &[ Ir ] {
        &self.ir
    }

    /// Consumes the generator, returning allocator and IR.
    pub fn finish(self: Self) -> (Allocator, Vec<Ir>) {
        (self.allocator, self.ir)
    }

    /// Lowers a top level expression, usually a declaration or function.
    pub fn generate(self: &mut Self, item: &Expression) -> CompileResult {
        self.lower(item).map(|_| ())
    }

    /// Lowers the given expression and returns the slot holding its value.
    fn lower(self: &mut Self, item: &Expression) -> CompileResult<Slot> {
        use Expression as E;
        self.position = item.position();
        match item {
            E::Constant(constant)       => Ok(self.constant(constant.value.clone(), constant.ty.clone())),
            E::Reference(reference)     => self.lower_reference(reference),
            E::Declaration(declaration) => self.lower_declaration(declaration),
            E::Binary(binary_op)        => self.lower_binary(binary_op),
            E::Unary(unary_op)          => self.lower_unary(unary_op),
            E::Conditional(conditional) => self.lower_conditional(conditional),
            E::Loop(loop_)              => self.lower_loop(loop_, true),
            E::Switch(switch)           => self.lower_switch(switch),
            E::Case(case)               => Err(CompileError::new(case, CompileErrorKind::Unsupported("case outside of switch".to_string()))),
            E::Goto(goto)               => self.lower_goto(goto),
            E::Label(label)             => self.lower_label(label),
            E::Block(block)             => self.lower_block(block),
            E::Function(function)       => self.lower_function(function),
            E::Call(call)               => self.lower_call(call),
            E::Member(member)           => self.lower_member(member),
            E::Index(index)             => self.lower_index(index),
            E::Return(ret)              => self.lower_return(ret),
            E::Break(position)          => self.lower_break(*position),
            E::Continue(position)       => self.lower_continue(*position),
            E::Nop                      => Ok(Slot::void()),
        }
    }

    /// Emits a real record and returns its IR index.
    fn emit(self: &mut Self, op: OpCode, a: Operand, b: Operand, c: Operand) -> usize {
        let comment = std::mem::take(&mut self.comment);
        self.ir.push(Ir::real(op, a, b, c, comment));
        self.ir.len() - 1
    }

    /// Emits a marker record.
    fn marker(self: &mut Self, kind: IrKind) {
        self.ir.push(Ir::marker(kind));
    }

    /// Emits a direct store of a value of the given type.
    fn store(self: &mut Self, ty: &Type, from: Operand, to: Operand) {
        self.emit(OpCode::store(ty), from, to, Operand::Null);
    }

    /// Allocates (or merges) a constant and yields a reference to it.
    fn constant(self: &mut Self, value: Value, ty: Type) -> Slot {
        let id = self.allocator.allocate_constant(None, value.clone(), ty.clone());
        let operand = self.allocator.entry(id).address;
        self.marker(IrKind::Reference(operand));
        Slot { operand, ty, value: Some(value) }
    }

    /// Allocates an anonymous temporary in the current scope.
    fn temp(self: &mut Self, ty: &Type) -> CompileResult<Slot> {
        let name = format!("tmp#{}", self.next_temp);
        self.next_temp += 1;
        let id = self.allocator.allocate_reference(&name, ty.clone(), None, self.position)?;
        Ok(Slot::new(self.allocator.entry(id).address, ty.clone()))
    }

    /// Returns a unique scope id.
    fn scope_id(self: &mut Self, kind: &str) -> String {
        self.next_scope += 1;
        format!("{kind}#{}", self.next_scope)
    }

    /// Looks up a name. Constants carry their value.
    fn resolve_name(self: &Self, name: &str) -> Option<Slot> {
        let binding = self.allocator.lookup(name)?;
        let entry = self.allocator.entry(binding.entry);
        Some(Slot {
            operand : entry.address,
            ty      : binding.ty.clone(),
            value   : if entry.constant { entry.value.clone() } else { None },
        })
    }

    /// Looks up a function by name.
    fn function_slot(self: &Self, name: &str, item: &dyn Positioned) -> CompileResult<Slot> {
        match self.resolve_name(name) {
            Some(slot) if slot.ty.as_function().is_some() => Ok(slot),
            _ => Err(CompileError::new(item, CompileErrorKind::UnresolvedSymbol(name.to_string()))),
        }
    }

    fn lower_reference(self: &mut Self, item: &ast::Reference) -> CompileResult<Slot> {
        let slot = self.reference(item)?;
        if slot.value.is_none() {
            self.allocator.check_assigned(&item.name, slot.operand, slot.ty.size(), item.position);
        }
        Ok(slot)
    }

    /// Resolves a named reference without reading it.
    fn reference(self: &mut Self, item: &ast::Reference) -> CompileResult<Slot> {
        if self.arrays.contains_key(&item.name) {
            return Err(CompileError::new(item, CompileErrorKind::Unsupported(format!("array '{}' used without index", item.name))));
        }
        let slot = self.resolve_name(&item.name).ok_or_else(|| CompileError::new(item, CompileErrorKind::UnresolvedSymbol(item.name.clone())))?;
        self.marker(IrKind::Reference(slot.operand));
        Ok(slot)
    }

    fn lower_declaration(self: &mut Self, item: &ast::Declaration) -> CompileResult<Slot> {
        let in_function = self.allocator.in_function();
        match &item.ty {
            Type::Field(inner) => {
                if in_function || item.init.is_some() {
                    return Err(CompileError::new(item, CompileErrorKind::Unsupported(format!("field '{}' must be declared at global scope without initializer", item.name))));
                }
                self.allocator.allocate_field(&item.name, (**inner).clone());
                Ok(Slot::void())
            },
            Type::Array(inner, len) => self.declare_array(item, inner, *len),
            Type::Void => Err(CompileError::new(item, CompileErrorKind::Unsupported(format!("variable '{}' of type void", item.name)))),
            _ if in_function => {
                let init = match &item.init {
                    Some(init) => Some(self.lower(init)?),
                    None => None,
                };
                let id = self.allocator.allocate_reference(&item.name, item.ty.clone(), None, item.position)?;
                let slot = Slot::new(self.allocator.entry(id).address, item.ty.clone());
                if let Some(init) = init {
                    operators::check_assignable(&slot.ty, &init.ty, item)?;
                    comment!(self, "{} = {}", item.name, init.operand);
                    self.store(&slot.ty, init.operand, slot.operand);
                    self.allocator.mark_assigned(slot.operand, slot.ty.size());
                }
                Ok(slot)
            },
            _ => {
                let value = match &item.init {
                    Some(init) => {
                        let start = self.ir.len();
                        let init = self.lower(init)?;
                        if self.ir[start..].iter().any(|record| record.is_real()) || init.value.is_none() {
                            return Err(CompileError::new(item, CompileErrorKind::Unsupported(format!("initializer of global '{}' is not constant", item.name))));
                        }
                        operators::check_assignable(&item.ty, &init.ty, item)?;
                        self.ir.truncate(start);
                        init.value
                    },
                    None => None,
                };
                let id = self.allocator.allocate_reference(&item.name, item.ty.clone(), value, item.position)?;
                Ok(Slot::new(self.allocator.entry(id).address, item.ty.clone()))
            },
        }
    }

    /// Declares a global array: its size constant, one global per element and the accessor functions.
    fn declare_array(self: &mut Self, item: &ast::Declaration, ty: &Type, len: usize) -> CompileResult<Slot> {
        if self.allocator.in_function() {
            return Err(CompileError::new(item, CompileErrorKind::Unsupported(format!("array '{}' must be declared at global scope", item.name))));
        }
        if item.init.is_some() {
            return Err(CompileError::new(item, CompileErrorKind::Unsupported(format!("initializer of array '{}'", item.name))));
        }
        debug!("desugaring array {}[{len}]", item.name);
        self.allocator.allocate_constant(Some(&format!("{}_size", item.name)), Value::Float(len as f32), Type::Float);
        for index in 0..len {
            self.allocator.allocate_reference(&desugar::array_element(&item.name, index), ty.clone(), None, item.position)?;
        }
        self.arrays.insert(item.name.clone(), ArrayInfo { ty: ty.clone(), len });
        for accessor in desugar::array_accessors(&item.name, ty, len) {
            self.lower(&accessor)?;
        }
        Ok(Slot::void())
    }

    fn lower_block(self: &mut Self, item: &ast::Block) -> CompileResult<Slot> {
        let scope = self.scope_id("block");
        self.allocator.push(&scope);
        let result = self.lower_all(&item.expressions);
        self.allocator.pop();
        result.map(|_| Slot::void())
    }

    fn lower_all(self: &mut Self, expressions: &[ Expression ]) -> CompileResult {
        for expression in expressions {
            self.lower(expression)?;
        }
        Ok(())
    }

    fn lower_function(self: &mut Self, item: &ast::Function) -> CompileResult<Slot> {
        if self.allocator.in_function() {
            return Err(CompileError::new(item, CompileErrorKind::Unsupported(format!("nested function '{}'", item.name))));
        }
        let signature = item.ty.as_function().ok_or_else(|| CompileError::new(item, CompileErrorKind::NotCallable(item.name.clone())))?.clone();
        if signature.params.len() > MAX_PARAMS || item.params.len() > signature.params.len() {
            return Err(CompileError::new(item, CompileErrorKind::Unsupported(format!("parameter list of '{}'", item.name))));
        }
        let index = self.allocator.allocate_function(&item.name, item.ty.clone(), item.builtin);
        let body = match (&item.body, item.builtin) {
            (Some(body), None) => body,
            _ => return Ok(Slot::void()),
        };
        if self.allocator.define_function(index) {
            self.allocator.warn(DiagnosticKind::Redefinition, format!("function '{}' redefined, using latest definition", item.name), item.position);
        }
        debug!("generating function {} (#{index})", item.name);
        self.marker(IrKind::Function { name: item.name.clone(), index });
        self.function_start = Some(self.ir.len());
        self.allocator.push_function(&item.name);
        let result = self.lower_function_body(item, &signature, body);
        self.allocator.pop();
        self.function_start = None;
        self.loops.clear();
        self.jumps.clear();
        result.map(|_| Slot::void())
    }

    /// Binds the parameters, lowers the body, terminates it and resolves its jumps.
    fn lower_function_body(self: &mut Self, item: &ast::Function, signature: &FunctionType, body: &ast::Block) -> CompileResult {
        for (position, (name, ty)) in item.params.iter().zip(signature.params.iter()).enumerate() {
            let id = self.allocator.allocate_reference(name, ty.clone(), None, item.position)?;
            let local = self.allocator.entry(id).address;
            comment!(self, "parameter {name}");
            self.store(ty, Operand::Global(param_offset(position as i32) as usize), local);
            self.allocator.mark_assigned(local, ty.size());
        }
        self.lower_all(&body.expressions)?;
        comment!(self, "end of {}", item.name);
        emit!(self, DONE, Operand::Null);
        self.resolve_jumps()
    }

    fn lower_call(self: &mut Self, item: &ast::Call) -> CompileResult<Slot> {
        let callee = self.lower(&item.callee)?;
        let mut args = Vec::with_capacity(item.args.len());
        for arg in &item.args {
            args.push(self.lower(arg)?);
        }
        let name = match &*item.callee {
            Expression::Reference(reference) => reference.name.clone(),
            _ => format!("{}", callee.operand),
        };
        self.emit_call(&name, &callee, args, item)
    }

    /// Stores the arguments into the parameter slots, emits the call and copies the return value into a temporary.
    fn emit_call(self: &mut Self, name: &str, callee: &Slot, mut args: Vec<Slot>, item: &dyn Positioned) -> CompileResult<Slot> {
        let signature = callee.ty.as_function().ok_or_else(|| CompileError::new(item, CompileErrorKind::NotCallable(name.to_string())))?.clone();
        let max_params = self.allocator.options().max_params.min(MAX_PARAMS);
        if args.len() > max_params {
            self.allocator.warn(DiagnosticKind::ArityTruncated, format!("call to '{name}' passes {} arguments, truncated to {max_params}", args.len()), item.position());
            args.truncate(max_params);
        }
        for (index, arg) in args.iter().enumerate() {
            comment!(self, "{name}() argument {index}");
            self.store(&arg.ty, arg.operand, Operand::Global(param_offset(index as i32) as usize));
        }
        comment!(self, "call {name}()");
        self.emit(OpCode::call(args.len()), callee.operand, Operand::Null, Operand::Null);
        if signature.ret == Type::Void {
            Ok(Slot::void())
        } else {
            let result = self.temp(&signature.ret)?;
            self.store(&signature.ret, Operand::Global(OFS_RETURN), result.operand);
            Ok(result)
        }
    }

    fn lower_return(self: &mut Self, item: &ast::Return) -> CompileResult<Slot> {
        if !self.allocator.in_function() {
            return Err(CompileError::new(item, CompileErrorKind::Unsupported("return outside of function".to_string())));
        }
        let value = match &item.value {
            Some(value) => self.lower(value)?.operand,
            None => Operand::Null,
        };
        emit!(self, RETURN, value);
        Ok(Slot::void())
    }

    fn lower_member(self: &mut Self, item: &ast::Member) -> CompileResult<Slot> {
        let place = self.place_member(item)?;
        if let (Place::Direct(slot), Expression::Reference(base)) = (&place, &*item.base) {
            if slot.value.is_none() {
                self.allocator.check_assigned(&format!("{}.{}", base.name, item.member), slot.operand, slot.ty.size(), item.position);
            }
        }
        self.read(&place, item)
    }

    fn lower_index(self: &mut Self, item: &ast::Index) -> CompileResult<Slot> {
        let place = self.place_index(item)?;
        self.read(&place, item)
    }

    /// Resolves an expression to a place that can be read or written. The base of member and index expressions is
    /// evaluated exactly once.
    fn place(self: &mut Self, item: &Expression) -> CompileResult<Place> {
        match item {
            Expression::Member(member) => self.place_member(member),
            Expression::Index(index) => self.place_index(index),
            Expression::Reference(reference) => Ok(Place::Direct(self.reference(reference)?)),
            other => Ok(Place::Direct(self.lower(other)?)),
        }
    }

    fn place_member(self: &mut Self, item: &ast::Member) -> CompileResult<Place> {
        let base = match self.place(&item.base)? {
            array @ Place::Array { .. } => Place::Direct(self.read(&array, item)?),
            other => other,
        };
        let unresolved = |ty: &Type| CompileError::new(item, CompileErrorKind::UnresolvedSymbol(format!("{ty}.{}", item.member)));
        match base {
            Place::Direct(slot) if slot.ty == Type::Entity => {
                // named entities are captured once, reassigning the variable does not move the place
                let slot = match &*item.base {
                    Expression::Reference(reference) if slot.value.is_none() => {
                        self.allocator.check_assigned(&reference.name, slot.operand, 1, item.position);
                        let copy = self.temp(&Type::Entity)?;
                        self.store(&Type::Entity, slot.operand, copy.operand);
                        copy
                    },
                    _ => slot,
                };
                let field = match self.resolve_name(&item.member) {
                    Some(field @ Slot { ty: Type::Field(_), .. }) => field,
                    _ => return Err(unresolved(&slot.ty)),
                };
                let ty = match &field.ty {
                    Type::Field(inner) => (**inner).clone(),
                    _ => return Err(unresolved(&slot.ty)),
                };
                Ok(Place::Field { entity: slot, field, ty })
            },
            Place::Direct(slot) => {
                let (offset, ty) = slot.ty.member(&item.member).ok_or_else(|| unresolved(&slot.ty))?;
                let value = match &slot.value {
                    Some(Value::Vector(components)) => Some(Value::Float(components[offset])),
                    _ => None,
                };
                let member = Slot { operand: slot.operand.offset(offset), ty, value };
                self.marker(IrKind::Reference(member.operand));
                Ok(Place::Direct(member))
            },
            Place::Field { entity, field, ty } => {
                let (offset, member_ty) = ty.member(&item.member).ok_or_else(|| unresolved(&ty))?;
                let base_offset = match field.value {
                    Some(Value::Pointer(offset)) => offset,
                    _ => return Err(CompileError::new(item, CompileErrorKind::Unsupported(format!("member '{}' of a computed field", item.member)))),
                };
                let field_ty = Type::field(member_ty.clone());
                let id = self.allocator.allocate_constant(None, Value::Pointer(base_offset + offset as i32), field_ty.clone());
                let field = Slot { operand: self.allocator.entry(id).address, ty: field_ty, value: Some(Value::Pointer(base_offset + offset as i32)) };
                Ok(Place::Field { entity, field, ty: member_ty })
            },
            Place::Array { .. } => Err(CompileError::new(item, CompileErrorKind::Internal("unexpected array place".to_string()))),
        }
    }

    fn place_index(self: &mut Self, item: &ast::Index) -> CompileResult<Place> {
        let name = match &*item.base {
            Expression::Reference(reference) if self.arrays.contains_key(&reference.name) => reference.name.clone(),
            _ => return Err(CompileError::new(item, CompileErrorKind::Unsupported("indexing anything but a global array".to_string()))),
        };
        let ty = self.arrays.get(&name).ice()?.ty.clone();
        let index = self.lower(&item.index)?;
        Ok(Place::Array { name, index, ty })
    }

    /// Returns the element index if the array index is a compile time constant.
    fn constant_index(self: &Self, name: &str, index: &Slot, item: &dyn Positioned) -> CompileResult<Option<usize>> {
        let len = self.arrays.get(name).ice()?.len;
        match index.value.as_ref().and_then(|value| value.as_float()) {
            Some(element) if element >= 0.0 && element.fract() == 0.0 && (element as usize) < len => Ok(Some(element as usize)),
            Some(element) => Err(CompileError::new(item, CompileErrorKind::Unsupported(format!("index {element} out of bounds of array '{name}'")))),
            None => Ok(None),
        }
    }

    /// Reads the value stored at a place.
    fn read(self: &mut Self, place: &Place, item: &dyn Positioned) -> CompileResult<Slot> {
        match place {
            Place::Direct(slot) => Ok(slot.clone()),
            Place::Field { entity, field, ty } => {
                let result = self.temp(ty)?;
                self.emit(OpCode::load(ty), entity.operand, field.operand, result.operand);
                Ok(result)
            },
            Place::Array { name, index, .. } => {
                match self.constant_index(name, index, item)? {
                    Some(element) => {
                        let getter = desugar::array_getter(name, Some(element));
                        let callee = self.function_slot(&getter, item)?;
                        self.emit_call(&getter, &callee, vec![], item)
                    },
                    None => {
                        let getter = desugar::array_getter(name, None);
                        let callee = self.function_slot(&getter, item)?;
                        self.emit_call(&getter, &callee, vec![ index.clone() ], item)
                    },
                }
            },
        }
    }

    /// Writes a value to a place. Entity fields are written through a computed address.
    fn write(self: &mut Self, place: &Place, value: &Slot, item: &dyn Positioned) -> CompileResult<Slot> {
        match place {
            Place::Direct(slot) => {
                if slot.value.is_some() {
                    return Err(CompileError::new(item, CompileErrorKind::NotAssignable(format!("constant {}", slot.operand))));
                }
                self.store(&slot.ty, value.operand, slot.operand);
                self.allocator.mark_assigned(slot.operand, slot.ty.size());
                Ok(slot.clone())
            },
            Place::Field { entity, field, ty } => {
                let pointer = self.temp(&Type::Int)?;
                emit!(self, ADDRESS, entity.operand, field.operand, pointer.operand);
                self.emit(OpCode::store_pointer(ty), value.operand, pointer.operand, Operand::Null);
                Ok(Slot::new(value.operand, ty.clone()))
            },
            Place::Array { name, index, ty } => {
                match self.constant_index(name, index, item)? {
                    Some(element) => {
                        let setter = desugar::array_setter(name, Some(element));
                        let callee = self.function_slot(&setter, item)?;
                        self.emit_call(&setter, &callee, vec![ value.clone() ], item)?;
                    },
                    None => {
                        let setter = desugar::array_setter(name, None);
                        let callee = self.function_slot(&setter, item)?;
                        self.emit_call(&setter, &callee, vec![ index.clone(), value.clone() ], item)?;
                    },
                }
                Ok(Slot::new(value.operand, ty.clone()))
            },
        }
    }
}
