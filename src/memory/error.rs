// Tue Jan 13 2026 - Alex

use crate::memory::Address;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Access violation at address {0}")]
    AccessViolation(Address),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Breakpoint injection failed: {0}")]
    InjectionError(String),
    #[error("Function call failed: {0}")]
    CallError(String),
    #[error("Out of memory: could not allocate {0} bytes")]
    OutOfMemory(u64),
    #[error("Invalid memory range: {0}")]
    InvalidRange(String),
    #[error("Binary parse error: {0}")]
    BinaryParseError(String),
    #[error("Not supported: {0}")]
    NotSupported(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Malformed key: {0}")]
    Malformed(String),
    #[error("Symbol not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Transport(#[from] MemoryError),
}

impl LookupError {
    /// Malformed keys and missing symbols are soft failures; only transport
    /// errors are worth surfacing to the caller.
    pub fn into_hard(self) -> Option<MemoryError> {
        match self {
            Self::Malformed(_) | Self::NotFound(_) => None,
            Self::Transport(MemoryError::NotFound(_)) => None,
            Self::Transport(e) => Some(e),
        }
    }
}
