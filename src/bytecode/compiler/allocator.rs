//! Address allocation. Manages the namespaces for references, constants, functions and strings and the scope stack.

use crate::prelude::*;
use crate::config::CompilerOptions;
use crate::shared::{types::{Type, DefType}, value::Value};
use crate::frontend::ast::Position;
use crate::bytecode::compiler::{ir::Operand, error::{Diagnostic, DiagnosticKind, CompileResult, CompileError, CompileErrorKind}};
use tracing::{warn, trace};

/// Index of an allocated entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntryId(pub usize);

/// An allocated slot.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    /// Name the entry was created under.
    pub name    : String,
    /// Additional names bound to this entry, e.g. merged constants or folded locals.
    pub tags    : Vec<String>,
    pub address : Operand,
    pub value   : Option<Value>,
    pub ty      : Type,
    /// Whether the entry holds a compile time constant.
    pub constant: bool,
    /// Whether the entry aliases part of another entry (vector components).
    pub alias   : bool,
}

impl Entry {
    /// All names of this entry, joined by `|`.
    pub fn full_name(self: &Self) -> String {
        let mut result = self.name.clone();
        for tag in &self.tags {
            result.push('|');
            result.push_str(tag);
        }
        result
    }
}

/// A name bound in a scope.
#[derive(Clone, Debug, PartialEq)]
pub struct Binding {
    pub entry   : EntryId,
    /// Type of the value under this name. May differ from the entry type for reused slots.
    pub ty      : Type,
}

/// A function slot.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionEntry {
    pub name    : String,
    pub ty      : Type,
    pub builtin : Option<i32>,
    /// Whether a body has been generated for this function.
    pub defined : bool,
    /// Constant holding the function index.
    pub constant: EntryId,
}

/// An entity field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldEntry {
    pub name    : String,
    pub offset  : usize,
    pub ty      : Type,
}

/// A lexical scope.
#[derive(Debug)]
struct Scope {
    id          : String,
    function    : bool,
    bindings    : Map<String, Binding>,
    owned       : Vec<EntryId>,
}

impl Scope {
    fn new(id: &str, function: bool) -> Self {
        Scope { id: id.to_string(), function, bindings: Map::new(), owned: Vec::new() }
    }
}

/// Assigns addresses to everything the generator needs to store.
///
/// Globals and constants share one counter starting at `user_storage_start`. Locals use a separate counter and are
/// relocated behind the globals during assembly. Strings are addressed by byte offset into the string pool.
#[derive(Debug)]
pub struct Allocator {
    options         : CompilerOptions,
    entries         : Vec<Entry>,
    scopes          : Vec<Scope>,
    /// Popped, value-less locals available for reuse. Most recently freed first.
    free            : Vec<EntryId>,
    constants       : Map<(Value, DefType), EntryId>,
    functions       : Vec<FunctionEntry>,
    function_names  : Map<String, usize>,
    fields          : Vec<FieldEntry>,
    field_size      : usize,
    string_pool     : Vec<u8>,
    string_offsets  : Map<String, i32>,
    next_global     : usize,
    next_local      : usize,
    max_locals      : usize,
    /// Local words that were declared but not written yet.
    unassigned      : Set<usize>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl Allocator {
    /// Creates an allocator with the builtin scope (`false` and `true`) and the global scope.
    pub fn new(options: CompilerOptions) -> Self {
        let mut allocator = Allocator {
            next_global     : options.user_storage_start,
            options,
            entries         : Vec::new(),
            scopes          : Vec::new(),
            free            : Vec::new(),
            constants       : Map::new(),
            functions       : Vec::new(),
            function_names  : Map::new(),
            fields          : Vec::new(),
            field_size      : 0,
            string_pool     : vec![ 0 ],
            string_offsets  : Map::new(),
            next_local      : 0,
            max_locals      : 0,
            unassigned      : Set::new(),
            diagnostics     : Vec::new(),
        };
        allocator.push("<builtin>");
        allocator.allocate_constant(Some("false"), Value::Float(0.0), Type::Bool);
        allocator.allocate_constant(Some("true"), Value::Float(1.0), Type::Bool);
        allocator.push("<global>");
        allocator
    }

    /// Options the allocator was created with.
    pub fn options(self: &Self) -> &CompilerOptions {
        &self.options
    }

    /// Pushes a block scope.
    pub fn push(self: &mut Self, id: &str) {
        trace!("push scope {id}");
        self.scopes.push(Scope::new(id, false));
    }

    /// Pushes a function scope. Local addressing restarts unless locals must not overlap.
    pub fn push_function(self: &mut Self, id: &str) {
        trace!("push function scope {id}");
        if self.options.overlap_locals {
            self.next_local = 0;
        }
        self.free.clear();
        self.unassigned.clear();
        self.scopes.push(Scope::new(id, true));
    }

    /// Pops the innermost scope. Its value-less locals become available to later sibling scopes.
    pub fn pop(self: &mut Self) {
        let scope = match self.scopes.pop() {
            Some(scope) => scope,
            None => return,
        };
        trace!("pop scope {}", scope.id);
        if scope.function {
            self.free.clear();
        } else if self.options.scope_folding {
            let freed: Vec<EntryId> = scope.owned.iter()
                .copied()
                .filter(|&id| {
                    let entry = &self.entries[id.0];
                    entry.value.is_none() && entry.address.is_local() && !entry.alias
                })
                .collect();
            self.free.splice(0..0, freed);
        }
    }

    /// Whether the innermost function scope is active.
    pub fn in_function(self: &Self) -> bool {
        self.scopes.iter().any(|scope| scope.function)
    }

    /// Id of the innermost scope.
    pub fn scope_id(self: &Self) -> &str {
        self.scopes.last().map_or("", |scope| scope.id.as_str())
    }

    /// Allocates a named variable in the current scope. Within functions the variable is a local and may reuse a
    /// slot freed by a sibling scope. Vectors additionally bind `name_x`, `name_y` and `name_z`.
    pub fn allocate_reference(self: &mut Self, name: &str, ty: Type, value: Option<Value>, position: Position) -> CompileResult<EntryId> {
        let local = self.in_function();
        if local && value.is_some() {
            return Err(CompileError::new(&position, CompileErrorKind::Internal(format!("local '{name}' cannot be pre-seeded"))));
        }
        self.check_redeclaration(name, position);
        let value = match value {
            Some(Value::Str(string)) => Some(Value::Pointer(self.allocate_string(&string))),
            other => other,
        };
        let size = ty.size();
        let id = match self.reusable(size) {
            Some(id) if local && value.is_none() => {
                self.entries[id.0].tags.push(name.to_string());
                trace!("reusing {} for {name}", self.entries[id.0].address);
                id
            },
            _ => {
                let address = if local {
                    let address = Operand::Local(self.next_local);
                    self.next_local += size;
                    self.max_locals = self.max_locals.max(self.next_local);
                    address
                } else {
                    let address = Operand::Global(self.next_global);
                    self.next_global += size;
                    address
                };
                self.push_entry(Entry { name: name.to_string(), tags: Vec::new(), address, value, ty: ty.clone(), constant: false, alias: false })
            }
        };
        if let Operand::Local(start) = self.entries[id.0].address {
            self.unassigned.extend(start..start + size);
        }
        self.bind(name, id, ty.clone(), true);
        if ty == Type::Vector {
            let address = self.entries[id.0].address;
            for (offset, component) in [ "x", "y", "z" ].iter().enumerate() {
                let alias_name = format!("{name}_{component}");
                let alias = self.push_entry(Entry { name: alias_name.clone(), tags: Vec::new(), address: address.offset(offset), value: None, ty: Type::Float, constant: false, alias: true });
                self.bind(&alias_name, alias, Type::Float, false);
            }
        }
        Ok(id)
    }

    /// Allocates a constant. String values are stored in the string pool and represented by a pointer constant.
    /// With constant merging enabled, an existing constant of equal value is returned and tagged with the name.
    pub fn allocate_constant(self: &mut Self, name: Option<&str>, value: Value, ty: Type) -> EntryId {
        if let Value::Str(string) = &value {
            let offset = self.allocate_string(string);
            let name = name.map(|n| n.to_string()).unwrap_or_else(|| value.constant_name());
            return self.allocate_constant(Some(&name), Value::Pointer(offset), Type::String);
        }
        let key = (value.clone(), ty.def_type());
        let existing = if self.options.merge_constants { self.constants.get(&key).copied() } else { None };
        let id = match existing {
            Some(id) => {
                if let Some(name) = name {
                    let entry = &mut self.entries[id.0];
                    if entry.name != name && !entry.tags.iter().any(|t| t == name) {
                        entry.tags.push(name.to_string());
                    }
                }
                id
            },
            None => {
                let address = Operand::Global(self.next_global);
                self.next_global += value.size();
                let entry_name = name.map(|n| n.to_string()).unwrap_or_else(|| value.constant_name());
                let id = self.push_entry(Entry { name: entry_name, tags: Vec::new(), address, value: Some(value), ty: ty.clone(), constant: true, alias: false });
                self.constants.entry(key).or_insert(id);
                id
            }
        };
        if let Some(name) = name {
            self.bind(name, id, ty, false);
        }
        id
    }

    /// Allocates a function slot and binds a constant holding its index. Declaring an existing function again
    /// returns its index.
    pub fn allocate_function(self: &mut Self, name: &str, ty: Type, builtin: Option<i32>) -> usize {
        if let Some(&index) = self.function_names.get(name) {
            let function = &mut self.functions[index - 1];
            function.ty = ty;
            if builtin.is_some() {
                function.builtin = builtin;
            }
            return index;
        }
        let index = self.functions.len() + 1;
        let constant = self.allocate_constant(Some(name), Value::Pointer(index as i32), ty.clone());
        self.functions.push(FunctionEntry { name: name.to_string(), ty, builtin, defined: false, constant });
        self.function_names.insert(name.to_string(), index);
        index
    }

    /// Allocates an entity field and binds a global field constant holding its offset.
    pub fn allocate_field(self: &mut Self, name: &str, ty: Type) -> EntryId {
        let offset = self.field_size;
        self.field_size += ty.size().max(1);
        self.fields.push(FieldEntry { name: name.to_string(), offset, ty: ty.clone() });
        if ty == Type::Vector {
            for (index, component) in [ "x", "y", "z" ].iter().enumerate() {
                self.fields.push(FieldEntry { name: format!("{name}_{component}"), offset: offset + index, ty: Type::Float });
            }
        }
        self.allocate_constant(Some(name), Value::Pointer(offset as i32), Type::field(ty))
    }

    /// Stores a string in the string pool and returns its offset. The empty string is offset 0, equal strings share
    /// one offset.
    pub fn allocate_string(self: &mut Self, string: &str) -> i32 {
        if string.is_empty() {
            return 0;
        }
        if let Some(&offset) = self.string_offsets.get(string) {
            return offset;
        }
        let offset = self.string_pool.len() as i32;
        self.string_pool.extend_from_slice(string.as_bytes());
        self.string_pool.push(0);
        self.string_offsets.insert(string.to_string(), offset);
        offset
    }

    /// Looks up a name, innermost scope first.
    pub fn lookup(self: &Self, name: &str) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(|scope| scope.bindings.get(name))
    }

    /// Returns an entry.
    pub fn entry(self: &Self, id: EntryId) -> &Entry {
        &self.entries[id.0]
    }

    /// All entries in allocation order.
    pub fn entries(self: &Self) -> &[ Entry ] {
        &self.entries
    }

    /// Returns the index of a named function.
    pub fn function_index(self: &Self, name: &str) -> Option<usize> {
        self.function_names.get(name).copied()
    }

    /// Returns the function with the given index (1-based).
    pub fn function(self: &Self, index: usize) -> Option<&FunctionEntry> {
        index.checked_sub(1).and_then(|i| self.functions.get(i))
    }

    /// Marks a function as having a generated body.
    pub fn define_function(self: &mut Self, index: usize) -> bool {
        match index.checked_sub(1).and_then(|i| self.functions.get_mut(i)) {
            Some(function) => std::mem::replace(&mut function.defined, true),
            None => false,
        }
    }

    /// All functions ordered by index.
    pub fn functions(self: &Self) -> &[ FunctionEntry ] {
        &self.functions
    }

    /// All entity fields.
    pub fn fields(self: &Self) -> &[ FieldEntry ] {
        &self.fields
    }

    /// Number of words in each entity record.
    pub fn field_count(self: &Self) -> usize {
        self.field_size
    }

    /// The string pool.
    pub fn string_pool(self: &Self) -> &[ u8 ] {
        &self.string_pool
    }

    /// Number of global words allocated, including the reserved words below `user_storage_start`.
    pub fn global_size(self: &Self) -> usize {
        self.next_global
    }

    /// Size of the shared local region.
    pub fn local_size(self: &Self) -> usize {
        self.max_locals
    }

    /// Records a write of `size` words to the given operand.
    pub fn mark_assigned(self: &mut Self, operand: Operand, size: usize) {
        if let Operand::Local(start) = operand {
            for word in start..start + size {
                self.unassigned.remove(&word);
            }
        }
    }

    /// Records a read of the named local. Warns once if any of its words was not written before.
    pub fn check_assigned(self: &mut Self, name: &str, operand: Operand, size: usize, position: Position) {
        if let Operand::Local(start) = operand {
            if (start..start + size).any(|word| self.unassigned.contains(&word)) {
                self.mark_assigned(operand, size);
                self.warn(DiagnosticKind::UsedBeforeAssigned, format!("'{name}' used before assignment"), position);
            }
        }
    }

    /// Records a warning.
    pub fn warn(self: &mut Self, kind: DiagnosticKind, message: String, position: Position) {
        warn!("{message}");
        self.diagnostics.push(Diagnostic { kind, message, position });
    }

    fn push_entry(self: &mut Self, entry: Entry) -> EntryId {
        self.entries.push(entry);
        EntryId(self.entries.len() - 1)
    }

    fn bind(self: &mut Self, name: &str, entry: EntryId, ty: Type, owned: bool) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.bindings.insert(name.to_string(), Binding { entry, ty });
            if owned {
                scope.owned.push(entry);
            }
        }
    }

    fn check_redeclaration(self: &mut Self, name: &str, position: Position) {
        let exists = self.scopes.last().map_or(false, |scope| scope.bindings.contains_key(name));
        if exists {
            let scope = self.scope_id().to_string();
            self.warn(DiagnosticKind::Redeclaration, format!("'{name}' redeclared in scope {scope}, using latest declaration"), position);
        }
    }

    /// Removes and returns the first freed local of the given size when folding applies.
    fn reusable(self: &mut Self, size: usize) -> Option<EntryId> {
        if !self.options.scope_folding || !self.in_function() {
            return None;
        }
        let position = self.free.iter().position(|&id| self.entries[id.0].ty.size() == size)?;
        Some(self.free.remove(position))
    }
}
