//! Progs program image and its binary representation.

use crate::prelude::*;
use crate::config::{PROGS_VERSION, HEADER_SIZE, STATEMENT_SIZE, DEFINITION_SIZE, FUNCTION_SIZE};
use crate::shared::types::DefType;
use crate::bytecode::{Statement, Definition, Function, OpCode};

/// Represents the various possible program image error-kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum ProgramErrorKind {
    /// The image ends before the header or a section is complete.
    Truncated,
    /// Unsupported format version.
    BadVersion(i32),
    /// A section lies outside of the image or overlaps the header.
    BadSection(&'static str),
    /// A statement uses an unknown opcode.
    BadOpcode(u16),
    /// A definition uses an unknown type code.
    BadDefinition(u16),
}

/// An error reported while reading a program image.
#[derive(Clone, Debug)]
pub struct ProgramError {
    kind: ProgramErrorKind,
    offset: usize,
}

impl ProgramError {
    pub(crate) fn new(offset: usize, kind: ProgramErrorKind) -> ProgramError {
        Self { kind, offset }
    }
    /// The kind of the error.
    pub fn kind(self: &Self) -> &ProgramErrorKind {
        &self.kind
    }
    /// Byte offset within the image.
    pub fn offset(self: &Self) -> usize {
        self.offset
    }
}

impl Display for ProgramError {
    fn fmt(self: &Self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ProgramErrorKind::Truncated => write!(f, "Program image truncated at byte {}", self.offset),
            ProgramErrorKind::BadVersion(version) => write!(f, "Unsupported program version {version}"),
            ProgramErrorKind::BadSection(section) => write!(f, "Section '{section}' at byte {} is out of bounds", self.offset),
            ProgramErrorKind::BadOpcode(opcode) => write!(f, "Unknown opcode {opcode} at byte {}", self.offset),
            ProgramErrorKind::BadDefinition(ty) => write!(f, "Unknown definition type {ty} at byte {}", self.offset),
        }
    }
}

pub type ProgramResult<T = ()> = Result<T, ProgramError>;

/// A compiled progs program. Created by the compiler or read from a binary image.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Program {
    pub version         : i32,
    pub crc             : i32,
    pub statements      : Vec<Statement>,
    pub global_defs     : Vec<Definition>,
    pub field_defs      : Vec<Definition>,
    pub functions       : Vec<Function>,
    /// String pool. Starts with the empty string at offset 0.
    pub strings         : Vec<u8>,
    /// Initial contents of the global data region.
    pub globals         : Vec<u32>,
    /// Number of words in each entity record.
    pub entity_fields   : i32,
}

/// Consume bytes from the front of a slice and return them.
fn read<'a>(slice: &mut &'a[ u8 ], num_bytes: usize) -> Option<&'a[ u8 ]> {
    if slice.len() < num_bytes {
        None
    } else {
        let result = &slice[0..num_bytes];
        *slice = &slice[num_bytes..];
        Some(result)
    }
}

fn read_i32(slice: &mut &[ u8 ]) -> Option<i32> {
    Some(i32::from_le_bytes(read(slice, 4)?.try_into().ok()?))
}

fn read_i16(slice: &mut &[ u8 ]) -> Option<i16> {
    Some(i16::from_le_bytes(read(slice, 2)?.try_into().ok()?))
}

/// CRC-16/CCITT as used for progs header checksums.
pub fn crc16(data: &[ u8 ]) -> u16 {
    let mut crc: u16 = 0xffff;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 { (crc << 1) ^ 0x1021 } else { crc << 1 };
        }
    }
    crc
}

impl Program {
    /// Returns the string at the given offset of the string pool.
    pub fn string(self: &Self, offset: i32) -> &str {
        if offset < 0 || offset as usize >= self.strings.len() {
            return "";
        }
        let start = offset as usize;
        let end = self.strings[start..].iter().position(|&b| b == 0).map_or(self.strings.len(), |p| start + p);
        std::str::from_utf8(&self.strings[start..end]).unwrap_or("")
    }
    /// Returns the index of the named function.
    pub fn function_index(self: &Self, name: &str) -> Option<usize> {
        self.functions.iter().skip(1).position(|f| self.string(f.name) == name).map(|p| p + 1)
    }
    /// Returns the global definition with the given name.
    pub fn global_def(self: &Self, name: &str) -> Option<&Definition> {
        self.global_defs.iter().find(|d| self.string(d.name) == name)
    }
    /// Returns the field definition with the given name.
    pub fn field_def(self: &Self, name: &str) -> Option<&Definition> {
        self.field_defs.iter().find(|d| self.string(d.name) == name)
    }
    /// Checksum over the statement section.
    pub fn checksum(self: &Self) -> i32 {
        let mut bytes = Vec::with_capacity(self.statements.len() * STATEMENT_SIZE);
        Self::write_statements(&mut bytes, &self.statements);
        crc16(&bytes) as i32
    }

    /// Returns the header section table: `(byte offset, record count)` for statements, global definitions, field
    /// definitions, functions, strings and globals.
    pub fn sections(self: &Self) -> [ (usize, usize); 6 ] {
        let statements_offset = HEADER_SIZE;
        let global_defs_offset = statements_offset + self.statements.len() * STATEMENT_SIZE;
        let field_defs_offset = global_defs_offset + self.global_defs.len() * DEFINITION_SIZE;
        let functions_offset = field_defs_offset + self.field_defs.len() * DEFINITION_SIZE;
        let globals_offset = functions_offset + self.functions.len() * FUNCTION_SIZE;
        let strings_offset = globals_offset + self.globals.len() * 4;
        [
            (statements_offset, self.statements.len()),
            (global_defs_offset, self.global_defs.len()),
            (field_defs_offset, self.field_defs.len()),
            (functions_offset, self.functions.len()),
            (strings_offset, self.strings.len()),
            (globals_offset, self.globals.len()),
        ]
    }

    /// Serializes the program to a byte vector, e.g. to be saved to a file.
    pub fn to_bytes(self: &Self) -> Vec<u8> {
        let sections = self.sections();
        let mut result = Vec::with_capacity(sections[4].0 + self.strings.len());
        // header
        result.extend_from_slice(&self.version.to_le_bytes());
        result.extend_from_slice(&self.crc.to_le_bytes());
        for (offset, count) in sections {
            result.extend_from_slice(&(offset as i32).to_le_bytes());
            result.extend_from_slice(&(count as i32).to_le_bytes());
        }
        result.extend_from_slice(&self.entity_fields.to_le_bytes());
        // sections
        Self::write_statements(&mut result, &self.statements);
        for definition in self.global_defs.iter().chain(self.field_defs.iter()) {
            result.extend_from_slice(&(definition.ty as u16).to_le_bytes());
            result.extend_from_slice(&definition.offset.to_le_bytes());
            result.extend_from_slice(&definition.name.to_le_bytes());
        }
        for function in &self.functions {
            for value in [ function.first_statement, function.first_local, function.num_locals, function.profile, function.name, function.file, function.num_params ] {
                result.extend_from_slice(&value.to_le_bytes());
            }
            result.extend_from_slice(&function.param_sizes);
        }
        for word in &self.globals {
            result.extend_from_slice(&word.to_le_bytes());
        }
        result.extend_from_slice(&self.strings);
        result
    }

    /// Deserializes a program from a byte slice.
    pub fn from_bytes(image: &[ u8 ]) -> ProgramResult<Program> {
        let mut header = image;
        let truncated = |offset| ProgramError::new(offset, ProgramErrorKind::Truncated);
        let version = read_i32(&mut header).ok_or(truncated(0))?;
        if version != PROGS_VERSION {
            return Err(ProgramError::new(0, ProgramErrorKind::BadVersion(version)));
        }
        let crc = read_i32(&mut header).ok_or(truncated(4))?;
        let mut sections = [ (0usize, 0usize); 6 ];
        for (index, section) in sections.iter_mut().enumerate() {
            let offset = read_i32(&mut header).ok_or(truncated(8 + index * 8))?;
            let count = read_i32(&mut header).ok_or(truncated(12 + index * 8))?;
            *section = (offset.max(0) as usize, count.max(0) as usize);
            if offset < 0 || count < 0 {
                return Err(ProgramError::new(8 + index * 8, ProgramErrorKind::BadSection(SECTION_NAMES[index])));
            }
        }
        let entity_fields = read_i32(&mut header).ok_or(truncated(56))?;
        let [ statements, global_defs, field_defs, functions, strings, globals ] = sections;
        // statements
        let mut data = section(image, 0, statements, STATEMENT_SIZE)?;
        let mut parsed_statements = Vec::with_capacity(statements.1);
        for index in 0..statements.1 {
            let position = statements.0 + index * STATEMENT_SIZE;
            let raw = read_i16(&mut data).ok_or(truncated(position))? as u16;
            let op = OpCode::from_u16(raw).ok_or(ProgramError::new(position, ProgramErrorKind::BadOpcode(raw)))?;
            let a = read_i16(&mut data).ok_or(truncated(position))?;
            let b = read_i16(&mut data).ok_or(truncated(position))?;
            let c = read_i16(&mut data).ok_or(truncated(position))?;
            parsed_statements.push(Statement::new(op, a, b, c));
        }
        // definitions
        let read_defs = |index: usize, (offset, count): (usize, usize)| -> ProgramResult<Vec<Definition>> {
            let mut data = section(image, index, (offset, count), DEFINITION_SIZE)?;
            let mut result = Vec::with_capacity(count);
            for def in 0..count {
                let position = offset + def * DEFINITION_SIZE;
                let raw = read_i16(&mut data).ok_or(truncated(position))? as u16;
                let ty = DefType::from_u16(raw).ok_or(ProgramError::new(position, ProgramErrorKind::BadDefinition(raw)))?;
                let def_offset = read_i16(&mut data).ok_or(truncated(position))? as u16;
                let name = read_i32(&mut data).ok_or(truncated(position))?;
                result.push(Definition { ty, offset: def_offset, name });
            }
            Ok(result)
        };
        let parsed_global_defs = read_defs(1, global_defs)?;
        let parsed_field_defs = read_defs(2, field_defs)?;
        // functions
        let mut data = section(image, 3, functions, FUNCTION_SIZE)?;
        let mut parsed_functions = Vec::with_capacity(functions.1);
        for index in 0..functions.1 {
            let position = functions.0 + index * FUNCTION_SIZE;
            let mut values = [ 0i32; 7 ];
            for value in values.iter_mut() {
                *value = read_i32(&mut data).ok_or(truncated(position))?;
            }
            let mut param_sizes = [ 0u8; 8 ];
            param_sizes.copy_from_slice(read(&mut data, 8).ok_or(truncated(position))?);
            let [ first_statement, first_local, num_locals, profile, name, file, num_params ] = values;
            parsed_functions.push(Function { first_statement, first_local, num_locals, profile, name, file, num_params, param_sizes });
        }
        // strings and globals
        let parsed_strings = section(image, 4, strings, 1)?.to_vec();
        let parsed_globals = section(image, 5, globals, 4)?
            .chunks_exact(4)
            .map(|word| u32::from_le_bytes([ word[0], word[1], word[2], word[3] ]))
            .collect();
        Ok(Program {
            version,
            crc,
            statements  : parsed_statements,
            global_defs : parsed_global_defs,
            field_defs  : parsed_field_defs,
            functions   : parsed_functions,
            strings     : parsed_strings,
            globals     : parsed_globals,
            entity_fields,
        })
    }

    fn write_statements(result: &mut Vec<u8>, statements: &[ Statement ]) {
        for statement in statements {
            result.extend_from_slice(&(statement.op as u16).to_le_bytes());
            result.extend_from_slice(&statement.a.to_le_bytes());
            result.extend_from_slice(&statement.b.to_le_bytes());
            result.extend_from_slice(&statement.c.to_le_bytes());
        }
    }
}

/// Returns the bytes of a section, validating its bounds.
fn section<'a>(image: &'a [ u8 ], index: usize, (offset, count): (usize, usize), size: usize) -> ProgramResult<&'a [ u8 ]> {
    let end = offset.checked_add(count.saturating_mul(size)).unwrap_or(usize::MAX);
    if count == 0 {
        Ok(&image[0..0])
    } else if offset < HEADER_SIZE || end > image.len() {
        Err(ProgramError::new(offset, ProgramErrorKind::BadSection(SECTION_NAMES[index])))
    } else {
        Ok(&image[offset..end])
    }
}

const SECTION_NAMES: [ &str; 6 ] = [ "statements", "global definitions", "field definitions", "functions", "strings", "globals" ];
