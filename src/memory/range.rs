// Tue Jan 13 2026 - Alex

use crate::memory::{Address, MemoryError, Protection};
use crate::target::RawRange;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileMapping {
    pub path: String,
    pub offset: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoryRange {
    base: Address,
    size: u64,
    protection: Protection,
    file: Option<FileMapping>,
}

impl MemoryRange {
    pub fn new(base: Address, size: u64, protection: Protection) -> Result<Self, MemoryError> {
        if size == 0 {
            return Err(MemoryError::InvalidRange(format!("empty range at {}", base)));
        }
        if base.checked_add(size).is_none() {
            return Err(MemoryError::InvalidRange(format!(
                "range at {} of size 0x{:x} overflows the address space",
                base, size
            )));
        }
        Ok(Self {
            base,
            size,
            protection,
            file: None,
        })
    }

    pub fn with_file(mut self, path: impl Into<String>, offset: u64) -> Self {
        self.file = Some(FileMapping {
            path: path.into(),
            offset,
        });
        self
    }

    pub fn from_raw(raw: &RawRange) -> Result<Self, MemoryError> {
        let protection = raw
            .protection
            .parse::<Protection>()
            .map_err(MemoryError::InvalidRange)?;
        let range = Self::new(Address::new(raw.base), raw.size, protection)?;
        Ok(match &raw.file {
            Some(file) => range.with_file(file.path.clone(), file.offset),
            None => range,
        })
    }

    pub fn base(&self) -> Address {
        self.base
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn end(&self) -> Address {
        self.base + self.size
    }

    pub fn protection(&self) -> Protection {
        self.protection
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_ref().map(|f| f.path.as_str())
    }

    pub fn file_offset(&self) -> Option<u64> {
        self.file.as_ref().map(|f| f.offset)
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file().map(|p| p.rsplit('/').next().unwrap_or(p))
    }

    pub fn contains(&self, addr: Address) -> bool {
        addr.is_within_range(self.base, self.end())
    }

    pub fn readable(&self) -> bool {
        self.protection.can_read()
    }

    pub fn writable(&self) -> bool {
        self.protection.can_write()
    }

    pub fn executable(&self) -> bool {
        self.protection.can_execute()
    }
}

impl fmt::Display for MemoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}-{:#018x} {}", self.base.as_u64(), self.end().as_u64(), self.protection)?;
        if let Some(file) = &self.file {
            write!(f, " {} +0x{:x}", file.path, file.offset)?;
        }
        Ok(())
    }
}
