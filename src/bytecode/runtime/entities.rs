//! Entity store. Every entity owns a record of `field_count` words.

use crate::bytecode::runtime::error::RuntimeErrorKind;

/// Entity records of a running program. Entity 0 is the world and exists for the lifetime of the store.
#[derive(Debug, Clone)]
pub struct Entities {
    field_count : usize,
    records     : Vec<Option<Vec<u32>>>,
}

impl Entities {
    /// Creates a new entity store containing only the world entity.
    pub fn new(field_count: usize) -> Self {
        Self {
            field_count,
            records: vec![ Some(vec![ 0; field_count ]) ],
        }
    }
    /// Number of words in each entity record.
    pub fn field_count(self: &Self) -> usize {
        self.field_count
    }
    /// Number of entities spawned so far, including killed ones and the world.
    pub fn len(self: &Self) -> usize {
        self.records.len()
    }
    /// Whether the given entity exists and has not been killed.
    pub fn is_alive(self: &Self, entity: i32) -> bool {
        entity >= 0 && matches!(self.records.get(entity as usize), Some(Some(_)))
    }
    /// Spawns a new entity with all fields zeroed and returns its index.
    pub fn spawn(self: &mut Self) -> i32 {
        self.records.push(Some(vec![ 0; self.field_count ]));
        (self.records.len() - 1) as i32
    }
    /// Kills an entity. Its index is never reused.
    pub fn kill(self: &mut Self, entity: i32) -> Result<(), RuntimeErrorKind> {
        if entity == 0 {
            return Err(RuntimeErrorKind::WorldWrite);
        }
        self.record(entity)?;
        self.records[entity as usize] = None;
        Ok(())
    }
    /// Reads `size` words of the given entity starting at `field`.
    pub fn read(self: &Self, entity: i32, field: i32, size: usize) -> Result<&[u32], RuntimeErrorKind> {
        let record = self.record(entity)?;
        let range = self.field_range(field, size)?;
        Ok(&record[range])
    }
    /// Writes words to the given entity starting at `field`. The world entity is read-only.
    pub fn write(self: &mut Self, entity: i32, field: i32, words: &[u32]) -> Result<(), RuntimeErrorKind> {
        self.record(entity)?;
        let range = self.field_range(field, words.len())?;
        if entity == 0 {
            return Err(RuntimeErrorKind::WorldWrite);
        }
        match &mut self.records[entity as usize] {
            Some(record) => record[range].copy_from_slice(words),
            None => return Err(RuntimeErrorKind::EntityOutOfBounds(entity)),
        }
        Ok(())
    }
    /// Computes the flat address of an entity field, validating both entity and field.
    pub fn address(self: &Self, entity: i32, field: i32) -> Result<i32, RuntimeErrorKind> {
        self.record(entity)?;
        self.field_range(field, 1)?;
        Ok(entity * self.field_count as i32 + field)
    }
    /// Writes words through a flat address previously computed by `address`.
    pub fn write_address(self: &mut Self, address: i32, words: &[u32]) -> Result<(), RuntimeErrorKind> {
        if self.field_count == 0 || address < 0 {
            return Err(RuntimeErrorKind::FieldOutOfBounds(address));
        }
        let field_count = self.field_count as i32;
        self.write(address / field_count, address % field_count, words)
    }
    /// Returns the record of a live entity.
    fn record(self: &Self, entity: i32) -> Result<&Vec<u32>, RuntimeErrorKind> {
        if entity < 0 {
            return Err(RuntimeErrorKind::EntityOutOfBounds(entity));
        }
        match self.records.get(entity as usize) {
            Some(Some(record)) => Ok(record),
            _ => Err(RuntimeErrorKind::EntityOutOfBounds(entity)),
        }
    }
    /// Validates a field access of `size` words.
    fn field_range(self: &Self, field: i32, size: usize) -> Result<std::ops::Range<usize>, RuntimeErrorKind> {
        if field < 0 || field as usize + size > self.field_count {
            Err(RuntimeErrorKind::FieldOutOfBounds(field))
        } else {
            Ok(field as usize .. field as usize + size)
        }
    }
}
