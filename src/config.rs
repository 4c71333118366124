//! Global configuration and layout constants.

/// Type of a statement operand as stored in the program image.
pub type Operand = i16;

/// Type used to index words of the global data region.
pub type GlobalAddress = usize;

/// Program format version written to and expected in the image header.
pub const PROGS_VERSION: i32 = 6;

/// Size of the image header in bytes.
pub const HEADER_SIZE: usize = 60;

/// Size of a statement record in bytes.
pub const STATEMENT_SIZE: usize = 8;

/// Size of a global or field definition record in bytes.
pub const DEFINITION_SIZE: usize = 8;

/// Size of a function record in bytes.
pub const FUNCTION_SIZE: usize = 36;

/// Largest number of words the global data region may hold. Statement operands can't address beyond it.
pub const MAX_GLOBALS: usize = 0xFFFF;

/// Address of the always-zero null word.
pub const OFS_NULL: GlobalAddress = 0;

/// Address of the 3 word return slot.
pub const OFS_RETURN: GlobalAddress = 1;

/// Maximum number of arguments a call instruction can pass.
pub const MAX_PARAMS: usize = 8;

/// Returns the address of the given parameter slot. Slot `-1` is the return slot.
pub const fn param_offset(n: i32) -> i32 {
    4 + 3 * n
}

/// Number of global words reserved for the null word, the return slot and the parameter slots.
pub const RESERVED_GLOBALS: usize = param_offset(MAX_PARAMS as i32) as usize;

/// Options controlling allocation and code generation.
#[derive(Clone, Debug)]
pub struct CompilerOptions {
    /// First global word handed out by the allocator. Must not be below `RESERVED_GLOBALS`.
    pub user_storage_start: usize,
    /// Reuse value-less locals of exited scopes in later sibling scopes.
    pub scope_folding: bool,
    /// Share one entry between identical constant values.
    pub merge_constants: bool,
    /// Start every function's locals at the beginning of the shared local region. When unset, each function gets its own slots.
    pub overlap_locals: bool,
    /// Evaluate operators over constant operands at compile time.
    pub fold_constants: bool,
    /// Maximum number of call arguments. Excess arguments are dropped with a warning.
    pub max_params: usize,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            user_storage_start  : 100,
            scope_folding       : true,
            merge_constants     : true,
            overlap_locals      : true,
            fold_constants      : true,
            max_params          : MAX_PARAMS,
        }
    }
}
