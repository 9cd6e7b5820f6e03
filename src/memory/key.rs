// Wed Jan 15 2026 - Alex

use crate::memory::Address;
use std::fmt;
use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryKey {
    Address(Address),
    Symbol(String),
    Slice {
        start: Option<u64>,
        end: Option<u64>,
        step: Option<i64>,
    },
    Bytes(Vec<u8>),
}

impl MemoryKey {
    pub fn slice(start: Option<u64>, end: Option<u64>, step: Option<i64>) -> Self {
        Self::Slice { start, end, step }
    }
}

impl fmt::Display for MemoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |b: &Option<u64>| b.map(|v| format!("0x{:x}", v)).unwrap_or_default();
        match self {
            Self::Address(addr) => write!(f, "{}", addr),
            Self::Symbol(s) => write!(f, "'{}'", s),
            Self::Slice { start, end, step } => {
                write!(f, "[{}:{}", bound(start), bound(end))?;
                if let Some(step) = step {
                    write!(f, ":{}", step)?;
                }
                write!(f, "]")
            }
            Self::Bytes(b) => write!(f, "b{:?}", String::from_utf8_lossy(b)),
        }
    }
}

impl From<u64> for MemoryKey {
    fn from(v: u64) -> Self {
        Self::Address(Address::new(v))
    }
}

impl From<Address> for MemoryKey {
    fn from(v: Address) -> Self {
        Self::Address(v)
    }
}

impl From<&str> for MemoryKey {
    fn from(v: &str) -> Self {
        Self::Symbol(v.to_string())
    }
}

impl From<String> for MemoryKey {
    fn from(v: String) -> Self {
        Self::Symbol(v)
    }
}

impl From<Range<u64>> for MemoryKey {
    fn from(r: Range<u64>) -> Self {
        Self::slice(Some(r.start), Some(r.end), None)
    }
}

impl From<Range<Address>> for MemoryKey {
    fn from(r: Range<Address>) -> Self {
        Self::slice(Some(r.start.as_u64()), Some(r.end.as_u64()), None)
    }
}

impl From<RangeFrom<u64>> for MemoryKey {
    fn from(r: RangeFrom<u64>) -> Self {
        Self::slice(Some(r.start), None, None)
    }
}

impl From<RangeFrom<Address>> for MemoryKey {
    fn from(r: RangeFrom<Address>) -> Self {
        Self::slice(Some(r.start.as_u64()), None, None)
    }
}

impl From<RangeTo<u64>> for MemoryKey {
    fn from(r: RangeTo<u64>) -> Self {
        Self::slice(None, Some(r.end), None)
    }
}

impl From<RangeTo<Address>> for MemoryKey {
    fn from(r: RangeTo<Address>) -> Self {
        Self::slice(None, Some(r.end.as_u64()), None)
    }
}

impl From<RangeFull> for MemoryKey {
    fn from(_: RangeFull) -> Self {
        Self::slice(None, None, None)
    }
}

impl From<&[u8]> for MemoryKey {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for MemoryKey {
    fn from(v: &[u8; N]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_shapes() {
        assert_eq!(MemoryKey::from(0x10u64), MemoryKey::Address(Address::new(0x10)));
        assert_eq!(
            MemoryKey::from(0x10u64..0x20),
            MemoryKey::slice(Some(0x10), Some(0x20), None)
        );
        assert_eq!(MemoryKey::from(0x10u64..), MemoryKey::slice(Some(0x10), None, None));
        assert_eq!(MemoryKey::from(..0x20u64), MemoryKey::slice(None, Some(0x20), None));
        assert_eq!(MemoryKey::from(b"blerg"), MemoryKey::Bytes(b"blerg".to_vec()));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(MemoryKey::slice(Some(0x10), None, Some(2)).to_string(), "[0x10::2]");
        assert_eq!(MemoryKey::from("libc:strlen").to_string(), "'libc:strlen'");
    }
}
