// Wed Jan 15 2026 - Alex

use crate::memory::{Address, LookupError, MemoryError, MemoryKey};
use crate::target::Transport;
use crate::utils::auto_int;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub address: Address,
    pub size: Option<u64>,
}

impl Resolved {
    fn at(address: Address) -> Self {
        Self { address, size: None }
    }
}

pub struct AddressResolver {
    transport: Arc<dyn Transport>,
}

impl AddressResolver {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn resolve(&self, key: &MemoryKey) -> Result<Resolved, LookupError> {
        match key {
            MemoryKey::Address(addr) => Ok(Resolved::at(*addr)),
            MemoryKey::Symbol(text) => self.resolve_symbolic(text),
            MemoryKey::Slice { start, end, step } => Self::resolve_slice(*start, *end, *step),
            MemoryKey::Bytes(_) => Err(LookupError::Malformed(format!(
                "byte sequences cannot be used as memory keys: {}",
                key
            ))),
        }
    }

    fn resolve_symbolic(&self, text: &str) -> Result<Resolved, LookupError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LookupError::Malformed("empty symbol".to_string()));
        }

        let Some((module, name)) = text.split_once(':') else {
            if let Some(addr) = auto_int(text) {
                return Self::absolute(addr, text).map(Resolved::at);
            }
            return self.symbol(None, text).map(Resolved::at);
        };

        let (module, name) = (module.trim(), name.trim());
        if name.is_empty() {
            return Err(LookupError::Malformed(format!("missing symbol or offset in '{}'", text)));
        }

        let module = if module.is_empty() { None } else { Some(module) };

        match (module, auto_int(name)) {
            (Some(module), Some(offset)) => {
                let offset = u64::try_from(offset)
                    .map_err(|_| LookupError::Malformed(format!("negative offset in '{}'", text)))?;
                let base = self.module_base(module)?;
                base.checked_add(offset)
                    .map(Resolved::at)
                    .ok_or_else(|| LookupError::Malformed(format!("offset overflows in '{}'", text)))
            }
            (None, Some(addr)) => Self::absolute(addr, text).map(Resolved::at),
            (module, None) => self.symbol(module, name).map(Resolved::at),
        }
    }

    fn resolve_slice(start: Option<u64>, end: Option<u64>, step: Option<i64>) -> Result<Resolved, LookupError> {
        let key = MemoryKey::slice(start, end, step);
        if !matches!(step, None | Some(1)) {
            return Err(LookupError::Malformed(format!("stepped slices are not supported: {}", key)));
        }
        match (start, end) {
            (Some(start), Some(end)) if end > start => Ok(Resolved {
                address: Address::new(start),
                size: Some(end - start),
            }),
            (Some(_), Some(_)) => Err(LookupError::Malformed(format!("empty slice: {}", key))),
            _ => Err(LookupError::Malformed(format!("open-ended slices are not supported: {}", key))),
        }
    }

    fn absolute(value: i128, text: &str) -> Result<Address, LookupError> {
        u64::try_from(value)
            .map(Address::new)
            .map_err(|_| LookupError::Malformed(format!("'{}' is not a valid address", text)))
    }

    fn module_base(&self, module: &str) -> Result<Address, LookupError> {
        self.transport.module_base(module).map_err(|e| match e {
            MemoryError::NotFound(what) => LookupError::NotFound(what),
            other => LookupError::Transport(other),
        })
    }

    fn symbol(&self, module: Option<&str>, name: &str) -> Result<Address, LookupError> {
        log::debug!("resolving symbol {}:{}", module.unwrap_or("*"), name);
        self.transport.resolve_symbol(module, name).map_err(|e| match e {
            MemoryError::NotFound(what) => LookupError::NotFound(what),
            other => LookupError::Transport(other),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Protection;
    use crate::target::SimulatedProcess;

    fn resolver() -> AddressResolver {
        let sim = SimulatedProcess::builder()
            .map(0x5555_0000_0000, 0x1000, Protection::READ | Protection::EXECUTE, Some(("/tmp/bins/basic_one", 0)))
            .map(0x5555_0020_1000, 0x1000, Protection::READ | Protection::WRITE, Some(("/tmp/bins/basic_one", 0x1000)))
            .map(0x7f00_0000_0000, 0x1000, Protection::READ | Protection::EXECUTE, Some(("/usr/lib/libc.so.6", 0)))
            .symbol("libc.so.6", "strlen", 0x7f00_0000_0100)
            .build();
        AddressResolver::new(Arc::new(sim))
    }

    #[test]
    fn test_module_offsets() {
        let r = resolver();
        let resolved = r.resolve(&MemoryKey::from("basic_one:0x201010")).unwrap();
        assert_eq!(resolved.address, Address::new(0x5555_0020_1010));
        assert_eq!(resolved.size, None);

        let resolved = r.resolve(&MemoryKey::from("libc:0x10")).unwrap();
        assert_eq!(resolved.address, Address::new(0x7f00_0000_0010));
    }

    #[test]
    fn test_symbols() {
        let r = resolver();
        assert_eq!(r.resolve(&MemoryKey::from(":strlen")).unwrap().address, Address::new(0x7f00_0000_0100));
        assert_eq!(r.resolve(&MemoryKey::from("libc.so.6:strlen")).unwrap().address, Address::new(0x7f00_0000_0100));
        assert!(matches!(r.resolve(&MemoryKey::from(":nope")), Err(LookupError::NotFound(_))));
        assert!(matches!(r.resolve(&MemoryKey::from("libz:0x10")), Err(LookupError::NotFound(_))));
    }

    #[test]
    fn test_absolute_and_slices() {
        let r = resolver();
        assert_eq!(r.resolve(&MemoryKey::from(0x1234u64)).unwrap().address, Address::new(0x1234));
        assert_eq!(r.resolve(&MemoryKey::from("0x1234")).unwrap().address, Address::new(0x1234));

        let slice = r.resolve(&MemoryKey::from(0x1000u64..0x1011)).unwrap();
        assert_eq!(slice.size, Some(0x11));
    }

    #[test]
    fn test_malformed_keys() {
        let r = resolver();
        for key in [
            MemoryKey::from(0x1000u64..),
            MemoryKey::from(..0x1000u64),
            MemoryKey::slice(Some(0x1000), Some(0x1005), Some(2)),
            MemoryKey::slice(Some(0x1005), Some(0x1000), None),
            MemoryKey::from(b"blerg"),
            MemoryKey::from("basic_one:"),
            MemoryKey::from("  "),
        ] {
            assert!(matches!(r.resolve(&key), Err(LookupError::Malformed(_))), "{}", key);
        }
    }
}
