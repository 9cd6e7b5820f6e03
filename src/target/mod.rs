// Tue Jan 13 2026 - Alex

pub mod allocator;
pub mod elf;
pub mod local;
pub mod maps;
pub mod simulated;

pub use allocator::HeapAllocator;
pub use local::LocalProcess;
pub use simulated::{Instruction, SimulatedProcess, SimulatedProcessBuilder};

use crate::memory::{Address, MemoryError, MemoryRange};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Local,
    Remote,
}

/// Range descriptor as reported by a transport, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRange {
    pub base: u64,
    pub size: u64,
    pub protection: String,
    #[serde(default)]
    pub file: Option<RawFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFile {
    pub path: String,
    pub offset: u64,
}

/// Opaque token for one physical breakpoint, issued by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BreakpointHandle {
    pub id: u64,
    pub address: Address,
    /// Byte displaced by a software trap, when the transport patches code.
    pub saved: Option<u8>,
}

impl fmt::Display for BreakpointHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.id, self.address)
    }
}

/// A marshalled function argument, ready for the target's calling
/// convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CallArg {
    Int(u64),
    Float(f64),
    Pointer(Address),
}

impl CallArg {
    /// Integer register representation; floats are passed by bit pattern.
    pub fn as_register(&self) -> u64 {
        match *self {
            Self::Int(v) => v,
            Self::Float(v) => v.to_bits(),
            Self::Pointer(addr) => addr.as_u64(),
        }
    }
}

/// Raw access to one target process. Implementations own the suspend/resume
/// discipline around mutating calls.
pub trait Transport: Send + Sync {
    fn kind(&self) -> TargetKind;

    fn resolve_symbol(&self, module: Option<&str>, name: &str) -> Result<Address, MemoryError>;

    fn read_bytes(&self, addr: Address, len: usize) -> Result<Vec<u8>, MemoryError>;

    fn write_bytes(&self, addr: Address, data: &[u8]) -> Result<(), MemoryError>;

    fn enumerate_ranges(&self) -> Result<Vec<RawRange>, MemoryError>;

    fn inject_breakpoint(&self, addr: Address) -> Result<BreakpointHandle, MemoryError>;

    fn remove_breakpoint(&self, handle: BreakpointHandle) -> Result<(), MemoryError>;

    fn call_function(&self, addr: Address, args: &[CallArg]) -> Result<u64, MemoryError>;

    fn allocate(&self, size: u64) -> Result<Address, MemoryError>;

    /// `Ok(false)` when the address is unknown or was already released.
    fn deallocate(&self, addr: Address) -> Result<bool, MemoryError>;

    /// Reads a file out of the target's own filesystem.
    fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>, MemoryError>;

    fn entrypoint(&self) -> Result<Address, MemoryError> {
        Err(MemoryError::NotSupported("entrypoint lookup".to_string()))
    }

    /// Lowest mapped base among ranges backed by `module`.
    fn module_base(&self, module: &str) -> Result<Address, MemoryError> {
        let ranges = self.enumerate_ranges()?;
        lowest_base(&ranges, |name| name == module)
            .or_else(|| lowest_base(&ranges, |name| module_matches(name, module)))
            .map(Address::new)
            .ok_or_else(|| MemoryError::NotFound(format!("module '{}'", module)))
    }
}

/// `libc` matches `libc.so.6` and `libc-2.31.so`, but not `libcrypto.so`.
pub(crate) fn module_matches(file_name: &str, module: &str) -> bool {
    file_name == module
        || file_name
            .strip_prefix(module)
            .map_or(false, |rest| rest.starts_with('.') || rest.starts_with('-'))
}

fn lowest_base(ranges: &[RawRange], pred: impl Fn(&str) -> bool) -> Option<u64> {
    ranges
        .iter()
        .filter_map(|r| r.file.as_ref().map(|f| (r.base, f.path.as_str())))
        .filter(|&(_, path)| pred(path.rsplit('/').next().unwrap_or(path)))
        .map(|(base, _)| base)
        .min()
}

/// Validates a transport's raw descriptors, skipping any that break the
/// range invariants.
pub fn ranges_from_raw(raw: &[RawRange]) -> Vec<MemoryRange> {
    raw.iter()
        .filter_map(|r| match MemoryRange::from_raw(r) {
            Ok(range) => Some(range),
            Err(e) => {
                log::warn!("Dropping bad range descriptor {:?}: {}", r, e);
                None
            }
        })
        .collect()
}
