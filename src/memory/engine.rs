// Wed Jan 15 2026 - Alex

use crate::config::EngineConfig;
use crate::memory::loader::{self, FileStream};
use crate::memory::{
    Address, AddressResolver, Allocation, BreakpointRegistry, MemoryCell, MemoryError, MemoryKey, MemoryRange,
    Resolved, StringEncoding, Value,
};
use crate::target::{ranges_from_raw, BreakpointHandle, Transport};
use indexmap::IndexMap;
use itertools::Itertools;
use std::fmt;
use std::sync::Arc;

pub struct MemoryEngine {
    transport: Arc<dyn Transport>,
    resolver: AddressResolver,
    breakpoints: BreakpointRegistry,
    config: EngineConfig,
}

impl MemoryEngine {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            resolver: AddressResolver::new(transport.clone()),
            transport,
            breakpoints: BreakpointRegistry::new(),
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(transport: Arc<dyn Transport>, config: EngineConfig) -> Result<Self, MemoryError> {
        config.validate()?;
        Ok(Self {
            resolver: AddressResolver::new(transport.clone()),
            transport,
            breakpoints: BreakpointRegistry::new(),
            config,
        })
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn breakpoints(&self) -> &BreakpointRegistry {
        &self.breakpoints
    }

    pub fn resolve(&self, key: impl Into<MemoryKey>) -> Result<Option<Resolved>, MemoryError> {
        let key = key.into();
        match self.resolver.resolve(&key) {
            Ok(resolved) => Ok(Some(resolved)),
            Err(e) => {
                log::debug!("lookup of {} failed: {}", key, e);
                e.into_hard().map_or(Ok(None), Err)
            }
        }
    }

    pub fn get(&self, key: impl Into<MemoryKey>) -> Result<Option<MemoryCell<'_>>, MemoryError> {
        Ok(self.resolve(key)?.map(|resolved| match resolved.size {
            Some(size) => MemoryCell::sized(self, resolved.address, size),
            None => MemoryCell::new(self, resolved.address),
        }))
    }

    pub fn cell_at(&self, addr: impl Into<Address>) -> MemoryCell<'_> {
        MemoryCell::new(self, addr.into())
    }

    /// Current memory map, re-read from the target on every call.
    pub fn maps(&self) -> Result<Vec<MemoryRange>, MemoryError> {
        Ok(ranges_from_raw(&self.transport.enumerate_ranges()?))
    }

    pub fn alloc(&self, size: u64) -> Result<Allocation<'_>, MemoryError> {
        let addr = self.transport.allocate(size)?;
        log::debug!("allocated {} bytes at {}", size, addr);
        Ok(Allocation::new(MemoryCell::sized(self, addr, size)))
    }

    pub fn alloc_string(
        &self,
        value: impl Into<Value>,
        encoding: StringEncoding,
    ) -> Result<Option<Allocation<'_>>, MemoryError> {
        match value.into() {
            Value::Str(text) => self.alloc_text(&text, encoding).map(Some),
            other => {
                log::warn!("Cannot allocate a string from a {} value", other.kind());
                Ok(None)
            }
        }
    }

    pub(crate) fn alloc_text(&self, text: &str, encoding: StringEncoding) -> Result<Allocation<'_>, MemoryError> {
        let data = encoding.encode_terminated(text);
        let alloc = self.alloc(data.len() as u64)?;
        if let Err(e) = self.transport.write_bytes(alloc.address(), &data) {
            alloc.free();
            return Err(e);
        }
        Ok(alloc)
    }

    pub fn active_breakpoints(&self) -> IndexMap<Address, BreakpointHandle> {
        self.breakpoints.snapshot()
    }

    pub fn entrypoint(&self) -> Result<Address, MemoryError> {
        self.transport.entrypoint()
    }

    pub fn load_file(&self, path: &str) -> Result<Option<FileStream>, MemoryError> {
        loader::load_file(self.transport(), path, self.config.local_files_first)
    }
}

impl Drop for MemoryEngine {
    fn drop(&mut self) {
        if !self.config.release_breakpoints_on_drop || self.breakpoints.is_empty() {
            return;
        }
        let released = self.breakpoints.release_all(self.transport.as_ref());
        log::debug!("released {} breakpoints", released);
    }
}

impl fmt::Display for MemoryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ranges = match self.maps() {
            Ok(ranges) => ranges,
            Err(e) => return write!(f, "<MemoryEngine {:?} unavailable: {}>", self.transport.kind(), e),
        };
        let files = ranges.iter().filter_map(|r| r.file()).unique().count();

        writeln!(
            f,
            "<MemoryEngine {:?} ranges={} files={} breakpoints={}>",
            self.transport.kind(),
            ranges.len(),
            files,
            self.breakpoints.len()
        )?;
        for range in &ranges {
            writeln!(f, "  {}", range)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Protection;
    use crate::target::SimulatedProcess;

    fn engine(sim: &SimulatedProcess) -> MemoryEngine {
        MemoryEngine::new(Arc::new(sim.clone()))
    }

    #[test]
    fn test_with_config_validates() {
        let sim = SimulatedProcess::builder().build();
        let bad = EngineConfig::new().with_string_chunk(7);
        assert!(matches!(
            MemoryEngine::with_config(Arc::new(sim), bad),
            Err(MemoryError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_drop_releases_breakpoints() {
        let sim = SimulatedProcess::builder()
            .map(0x1000, 0x100, Protection::READ | Protection::EXECUTE, None)
            .build();

        {
            let engine = engine(&sim);
            engine.cell_at(0x1000u64).set_breakpoint(true).unwrap();
            assert_eq!(sim.installed_breakpoints(), 1);
        }
        assert_eq!(sim.installed_breakpoints(), 0);

        {
            let config = EngineConfig::new().with_release_on_drop(false);
            let engine = MemoryEngine::with_config(Arc::new(sim.clone()), config).unwrap();
            engine.cell_at(0x1000u64).set_breakpoint(true).unwrap();
        }
        assert_eq!(sim.installed_breakpoints(), 1);
    }

    #[test]
    fn test_unmapped_read_is_hard_error() {
        let sim = SimulatedProcess::builder().build();
        let engine = engine(&sim);
        let cell = engine.get(0x4000u64).unwrap().unwrap();
        assert!(matches!(cell.int32(), Err(MemoryError::AccessViolation(_))));
    }

    #[test]
    fn test_alloc_without_heap() {
        let sim = SimulatedProcess::builder().build();
        let engine = engine(&sim);
        assert!(matches!(engine.alloc(16), Err(MemoryError::NotSupported(_))));
    }
}
