// Wed Jan 15 2026 - Alex

use crate::memory::codec::Width;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypedInt {
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    Pointer(u64),
}

impl TypedInt {
    pub fn width(&self) -> Width {
        match self {
            Self::I8(_) | Self::U8(_) => Width::W8,
            Self::I16(_) | Self::U16(_) => Width::W16,
            Self::I32(_) | Self::U32(_) => Width::W32,
            Self::I64(_) | Self::U64(_) | Self::Pointer(_) => Width::W64,
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, Self::I8(_) | Self::I16(_) | Self::I32(_) | Self::I64(_))
    }

    pub fn to_register(&self) -> u64 {
        match *self {
            Self::I8(v) => v as i64 as u64,
            Self::U8(v) => v as u64,
            Self::I16(v) => v as i64 as u64,
            Self::U16(v) => v as u64,
            Self::I32(v) => v as i64 as u64,
            Self::U32(v) => v as u64,
            Self::I64(v) => v as u64,
            Self::U64(v) | Self::Pointer(v) => v,
        }
    }
}

impl fmt::Display for TypedInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I8(v) => write!(f, "int8({})", v),
            Self::U8(v) => write!(f, "uint8({})", v),
            Self::I16(v) => write!(f, "int16({})", v),
            Self::U16(v) => write!(f, "uint16({})", v),
            Self::I32(v) => write!(f, "int32({})", v),
            Self::U32(v) => write!(f, "uint32({})", v),
            Self::I64(v) => write!(f, "int64({})", v),
            Self::U64(v) => write!(f, "uint64({})", v),
            Self::Pointer(v) => write!(f, "pointer(0x{:x})", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i128),
    Float(f64),
    Typed(TypedInt),
    Str(String),
    Bytes(Vec<u8>),
    Unsupported(String),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Typed(_) => "typed int",
            Self::Str(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::Unsupported(_) => "unsupported",
        }
    }
}

macro_rules! value_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(v as i128)
            }
        })*
    };
}

value_from_int!(i8, u8, i16, u16, i32, u32, i64, u64, isize, usize);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<TypedInt> for Value {
    fn from(v: TypedInt) -> Self {
        Value::Typed(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Value {
    fn from(v: &[u8; N]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringEncoding {
    #[default]
    Utf8,
    Utf16,
}

impl StringEncoding {
    pub fn encode_terminated(self, s: &str) -> Vec<u8> {
        match self {
            Self::Utf8 => {
                let mut out = Vec::with_capacity(s.len() + 1);
                out.extend_from_slice(s.as_bytes());
                out.push(0);
                out
            }
            Self::Utf16 => s
                .encode_utf16()
                .chain(std::iter::once(0))
                .flat_map(|unit| unit.to_le_bytes())
                .collect(),
        }
    }

    pub fn decode_terminated(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => {
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                String::from_utf8_lossy(&bytes[..end]).into_owned()
            }
            Self::Utf16 => {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|c| u16::from_le_bytes([c[0], c[1]]))
                    .take_while(|&u| u != 0)
                    .collect();
                String::from_utf16_lossy(&units)
            }
        }
    }

    pub fn find_terminator(self, bytes: &[u8]) -> Option<usize> {
        match self {
            Self::Utf8 => bytes.iter().position(|&b| b == 0),
            Self::Utf16 => bytes.chunks_exact(2).position(|c| c == [0, 0]).map(|i| i * 2),
        }
    }
}

impl std::str::FromStr for StringEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "utf-16" | "utf16" | "utf-16le" => Ok(Self::Utf16),
            other => Err(format!("unsupported encoding '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_int_registers() {
        assert_eq!(TypedInt::I32(-12).to_register(), u64::MAX - 11);
        assert_eq!(TypedInt::U32(u32::MAX).to_register(), u32::MAX as u64);
        assert_eq!(TypedInt::I8(-1).width(), Width::W8);
        assert!(TypedInt::I16(0).is_signed());
        assert!(!TypedInt::Pointer(0).is_signed());
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from(5u8), Value::Int(5));
        assert_eq!(Value::from("Hello"), Value::Str("Hello".to_string()));
        assert_eq!(Value::from(b"\x12\x34"), Value::Bytes(vec![0x12, 0x34]));
        assert_eq!(Value::from(1.23).kind(), "float");
    }

    #[test]
    fn test_string_encodings() {
        let utf16 = StringEncoding::Utf16.encode_terminated("New");
        assert_eq!(utf16, vec![b'N', 0, b'e', 0, b'w', 0, 0, 0]);
        assert_eq!(StringEncoding::Utf16.decode_terminated(&utf16), "New");
        assert_eq!(StringEncoding::Utf8.decode_terminated(&utf16), "N");
        assert_eq!(StringEncoding::Utf16.find_terminator(&utf16), Some(6));
        assert_eq!(StringEncoding::Utf8.find_terminator(b"ab"), None);
        assert_eq!("UTF-16".parse::<StringEncoding>(), Ok(StringEncoding::Utf16));
        assert!("latin-1".parse::<StringEncoding>().is_err());
    }
}
