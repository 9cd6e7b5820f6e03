// Wed Jan 15 2026 - Alex

use crate::memory::codec::{self, Width};
use crate::memory::{Address, Allocation, MemoryEngine, MemoryError, StringEncoding, Transition, Value};
use crate::target::CallArg;
use std::cell::Cell;
use std::fmt;

macro_rules! int_accessors {
    ($($get:ident, $set:ident, $t:ty, $width:expr, $signed:expr;)*) => {
        $(
            pub fn $get(&self) -> Result<$t, MemoryError> {
                Ok(self.read_int($width, $signed)? as $t)
            }

            pub fn $set(&self, value: $t) -> Result<(), MemoryError> {
                self.write_int(value as i128, $width)
            }
        )*
    };
}

pub struct MemoryCell<'e> {
    engine: &'e MemoryEngine,
    address: Address,
    size: Cell<u64>,
    fixed: bool,
}

impl<'e> MemoryCell<'e> {
    pub(crate) fn new(engine: &'e MemoryEngine, address: Address) -> Self {
        Self {
            engine,
            address,
            size: Cell::new(1),
            fixed: false,
        }
    }

    pub(crate) fn sized(engine: &'e MemoryEngine, address: Address, size: u64) -> Self {
        Self {
            engine,
            address,
            size: Cell::new(size.max(1)),
            fixed: true,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn engine(&self) -> &'e MemoryEngine {
        self.engine
    }

    pub fn size(&self) -> u64 {
        self.size.get()
    }

    pub fn is_fixed_size(&self) -> bool {
        self.fixed
    }

    fn touch(&self, width: usize) {
        if !self.fixed {
            self.size.set(width.max(1) as u64);
        }
    }

    fn read(&self, len: usize) -> Result<Vec<u8>, MemoryError> {
        self.engine.transport().read_bytes(self.address, len)
    }

    fn write(&self, data: &[u8]) -> Result<(), MemoryError> {
        self.engine.transport().write_bytes(self.address, data)
    }

    fn read_int(&self, width: Width, signed: bool) -> Result<i128, MemoryError> {
        let bytes = self.read(width.bytes())?;
        self.touch(width.bytes());
        Ok(codec::decode(&bytes, width, signed))
    }

    fn write_int(&self, value: i128, width: Width) -> Result<(), MemoryError> {
        self.write(&codec::encode(value, width))?;
        self.touch(width.bytes());
        Ok(())
    }

    int_accessors! {
        int8, set_int8, i8, Width::W8, true;
        uint8, set_uint8, u8, Width::W8, false;
        int16, set_int16, i16, Width::W16, true;
        uint16, set_uint16, u16, Width::W16, false;
        int32, set_int32, i32, Width::W32, true;
        uint32, set_uint32, u32, Width::W32, false;
        int64, set_int64, i64, Width::W64, true;
        uint64, set_uint64, u64, Width::W64, false;
    }

    pub fn pointer(&self) -> Result<Address, MemoryError> {
        self.uint64().map(Address::new)
    }

    pub fn set_pointer(&self, value: impl Into<Address>) -> Result<(), MemoryError> {
        self.set_uint64(value.into().as_u64())
    }

    pub fn float(&self) -> Result<f32, MemoryError> {
        let bytes = self.read(4)?;
        self.touch(4);
        Ok(codec::decode_f32(&bytes))
    }

    pub fn set_float(&self, value: f32) -> Result<(), MemoryError> {
        self.write(&codec::encode_f32(value))?;
        self.touch(4);
        Ok(())
    }

    pub fn double(&self) -> Result<f64, MemoryError> {
        let bytes = self.read(8)?;
        self.touch(8);
        Ok(codec::decode_f64(&bytes))
    }

    pub fn set_double(&self, value: f64) -> Result<(), MemoryError> {
        self.write(&codec::encode_f64(value))?;
        self.touch(8);
        Ok(())
    }

    pub fn bytes(&self) -> Result<Vec<u8>, MemoryError> {
        self.read(self.size() as usize)
    }

    pub fn set_bytes(&self, value: impl Into<Value>) -> Result<bool, MemoryError> {
        let data = match value.into() {
            Value::Str(s) => s.into_bytes(),
            Value::Bytes(b) => b,
            other => {
                log::warn!("Cannot write a {} value as bytes at {}; memory left unchanged", other.kind(), self.address);
                return Ok(false);
            }
        };
        self.warn_on_overflow(data.len());
        self.write(&data)?;
        Ok(true)
    }

    pub fn string_utf8(&self) -> Result<String, MemoryError> {
        self.string(StringEncoding::Utf8)
    }

    pub fn set_string_utf8(&self, value: &str) -> Result<(), MemoryError> {
        self.set_string(StringEncoding::Utf8, value)
    }

    pub fn string_utf16(&self) -> Result<String, MemoryError> {
        self.string(StringEncoding::Utf16)
    }

    pub fn set_string_utf16(&self, value: &str) -> Result<(), MemoryError> {
        self.set_string(StringEncoding::Utf16, value)
    }

    pub fn string(&self, encoding: StringEncoding) -> Result<String, MemoryError> {
        if self.fixed {
            return Ok(encoding.decode_terminated(&self.bytes()?));
        }

        let config = self.engine.config();
        let chunk = config.string_chunk as u64;
        let limit = config.string_limit;
        let mut buf = Vec::new();
        let mut cur = self.address;

        while buf.len() < limit {
            let len = ((chunk - cur.as_u64() % chunk) as usize).min(limit - buf.len());
            match self.engine.transport().read_bytes(cur, len) {
                Ok(bytes) => buf.extend_from_slice(&bytes),
                Err(e) if buf.is_empty() => return Err(e),
                Err(_) => break,
            }
            if encoding.find_terminator(&buf).is_some() {
                break;
            }
            match cur.checked_add(len as u64) {
                Some(next) => cur = next,
                None => break,
            }
        }

        Ok(encoding.decode_terminated(&buf))
    }

    pub fn set_string(&self, encoding: StringEncoding, value: &str) -> Result<(), MemoryError> {
        let data = encoding.encode_terminated(value);
        self.warn_on_overflow(data.len());
        self.write(&data)
    }

    fn warn_on_overflow(&self, len: usize) {
        if self.fixed && self.engine.config().warn_on_overflow && len as u64 > self.size() {
            log::warn!(
                "Writing {} bytes into {} byte region at {}; adjacent memory may be corrupted",
                len,
                self.size(),
                self.address
            );
        }
    }

    pub fn breakpoint(&self) -> bool {
        self.engine.breakpoints().is_active(self.address)
    }

    pub fn set_breakpoint(&self, enabled: bool) -> Result<Transition, MemoryError> {
        self.engine
            .breakpoints()
            .set(self.engine.transport(), self.address, enabled)
    }

    /// Calls the function at this address. Returns `Ok(None)` without
    /// touching the target when an argument cannot be marshalled.
    pub fn call(&self, args: &[Value]) -> Result<Option<u64>, MemoryError> {
        if let Some((i, arg)) = args.iter().enumerate().find(|(_, a)| !Self::marshallable(a)) {
            log::warn!("Argument {} ({:?}) cannot be passed to {}; call skipped", i, arg, self.address);
            return Ok(None);
        }

        let mut temporaries = Vec::new();
        let result = args
            .iter()
            .map(|arg| self.marshal(arg, &mut temporaries))
            .collect::<Result<Vec<_>, _>>()
            .and_then(|marshalled| self.engine.transport().call_function(self.address, &marshalled));

        for alloc in &temporaries {
            alloc.free();
        }
        result.map(Some)
    }

    fn marshal(&self, arg: &Value, temporaries: &mut Vec<Allocation<'e>>) -> Result<CallArg, MemoryError> {
        match arg {
            Value::Int(v) => Ok(CallArg::Int(*v as u64)),
            Value::Typed(t) => Ok(CallArg::Int(t.to_register())),
            Value::Float(f) => Ok(CallArg::Float(*f)),
            Value::Str(s) => {
                let alloc = self.engine.alloc_text(s, StringEncoding::Utf8)?;
                let ptr = CallArg::Pointer(alloc.address());
                temporaries.push(alloc);
                Ok(ptr)
            }
            other => Err(MemoryError::CallError(format!("cannot marshal a {} argument", other.kind()))),
        }
    }

    fn marshallable(arg: &Value) -> bool {
        match arg {
            Value::Int(v) => *v >= i64::MIN as i128 && *v <= u64::MAX as i128,
            Value::Typed(_) | Value::Float(_) | Value::Str(_) => true,
            Value::Bytes(_) | Value::Unsupported(_) => false,
        }
    }
}

impl fmt::Display for MemoryCell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<MemoryCell {} size={}", self.address, self.size())?;
        if self.breakpoint() {
            write!(f, " breakpoint")?;
        }
        write!(f, ">")
    }
}

impl fmt::Debug for MemoryCell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCell")
            .field("address", &self.address)
            .field("size", &self.size())
            .field("fixed", &self.fixed)
            .finish()
    }
}
