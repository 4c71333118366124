use crate::prelude::*;
use crate::bytecode::ProgramError;
#[cfg(feature="compiler")]
use crate::bytecode::{compiler::error::CompileError, listing::ListingError};
#[cfg(feature="runtime")]
use crate::bytecode::runtime::error::RuntimeError;

/// An error generated during program compilation, loading or execution.
#[derive(Clone, Debug)]
pub enum Error {
    #[cfg(feature="compiler")]
    CompileError(CompileError),
    #[cfg(feature="compiler")]
    ListingError(ListingError),
    ProgramError(ProgramError),
    #[cfg(feature="runtime")]
    RuntimeError(RuntimeError),
}

impl Display for Error {
    fn fmt(self: &Self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature="compiler")]
            Self::CompileError(e) => write!(f, "{}", e),
            #[cfg(feature="compiler")]
            Self::ListingError(e) => write!(f, "{}", e),
            Self::ProgramError(e) => write!(f, "{}", e),
            #[cfg(feature="runtime")]
            Self::RuntimeError(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error { }

#[cfg(feature="compiler")]
impl From<CompileError> for Error {
    fn from(error: CompileError) -> Error {
        Error::CompileError(error)
    }
}

#[cfg(feature="compiler")]
impl From<ListingError> for Error {
    fn from(error: ListingError) -> Error {
        Error::ListingError(error)
    }
}

impl From<ProgramError> for Error {
    fn from(error: ProgramError) -> Error {
        Error::ProgramError(error)
    }
}

#[cfg(feature="runtime")]
impl From<RuntimeError> for Error {
    fn from(error: RuntimeError) -> Error {
        Error::RuntimeError(error)
    }
}
