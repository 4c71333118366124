//! Progs compiler back-end. Lowers expression trees to IR and assembles the IR into a program image.

#[macro_use]
mod macros;
pub mod allocator;
pub mod ir;
pub mod error;
mod util;
mod desugar;
pub mod generator;
pub mod assembler;

use crate::config::{CompilerOptions, RESERVED_GLOBALS};
use crate::frontend::ast::Expression;
use crate::bytecode::Program;
use allocator::Allocator;
use error::{CompileError, CompileResult, Diagnostic};
use generator::Generator;
use ir::Ir;
use tracing::{info, trace, warn};

/// Result of IR generation.
#[derive(Debug)]
pub struct Generated {
    /// Generated IR of all roots, in order.
    pub ir          : Vec<Ir>,
    /// Allocator holding every entry, function, field and string the IR refers to.
    pub allocator   : Allocator,
}

/// Result of a compilation.
#[derive(Debug)]
pub struct Compiled {
    pub program     : Program,
    /// IR the program was assembled from. Kept for listings.
    pub ir          : Vec<Ir>,
    /// Warnings reported during compilation.
    pub diagnostics : Vec<Diagnostic>,
}

/// Verifies that user storage does not overlap the reserved global words.
pub(crate) fn check_options(options: &CompilerOptions) -> CompileResult {
    if options.user_storage_start < RESERVED_GLOBALS {
        Err(CompileError::option(format!("user_storage_start {} overlaps the {RESERVED_GLOBALS} reserved global words", options.user_storage_start)))
    } else {
        Ok(())
    }
}

/// Lowers the given roots to IR. Roots are usually global declarations and functions.
pub fn generate(roots: &[ Expression ], options: CompilerOptions) -> CompileResult<Generated> {
    check_options(&options)?;
    let mut generator = Generator::new(options);
    for root in roots {
        generator.generate(root)?;
    }
    let (allocator, ir) = generator.finish();
    Ok(Generated { ir, allocator })
}

/// Compiles the given roots to a program image.
pub fn compile(roots: &[ Expression ], options: CompilerOptions) -> CompileResult<Compiled> {
    let Generated { ir, mut allocator } = generate(roots, options)?;
    trace!("generated IR:\n{}", ir::render(&ir));
    let program = assembler::assemble(&mut allocator, &ir)?;
    let diagnostics = std::mem::take(&mut allocator.diagnostics);
    if !diagnostics.is_empty() {
        warn!("compilation finished with {} warnings", diagnostics.len());
    }
    info!("compiled {} roots to {} statements", roots.len(), program.statements.len());
    Ok(Compiled { program, ir, diagnostics })
}
