// Wed Jan 15 2026 - Alex

//! In-memory stand-in for a live process.
//!
//! Useful for exercising the engine without a debuggee: segments, symbols,
//! native functions, a heap and a scripted thread that stalls on active
//! breakpoints exactly like a trapped thread would.

use crate::memory::{Address, MemoryError, Protection};
use crate::target::{
    module_matches, BreakpointHandle, CallArg, HeapAllocator, RawFile, RawRange, TargetKind, Transport,
};
use ahash::AHashMap;
use parking_lot::{Condvar, Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

pub type NativeFunction = Arc<dyn Fn(&SimulatedProcess, &[CallArg]) -> Result<u64, MemoryError> + Send + Sync>;

struct Segment {
    base: u64,
    data: Vec<u8>,
    protection: Protection,
    file: Option<RawFile>,
}

impl Segment {
    fn new(base: u64, size: u64, protection: Protection, file: Option<(&str, u64)>) -> Self {
        Self {
            base,
            data: vec![0; size as usize],
            protection,
            file: file.map(|(path, offset)| RawFile {
                path: path.to_string(),
                offset,
            }),
        }
    }

    fn end(&self) -> u64 {
        self.base + self.data.len() as u64
    }

    fn contains(&self, addr: u64) -> bool {
        addr >= self.base && addr < self.end()
    }
}

/// One step of a scripted thread: execution reaches `address`, then
/// optionally stores bytes somewhere.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub address: Address,
    pub store: Option<(Address, Vec<u8>)>,
}

impl Instruction {
    pub fn at(address: impl Into<Address>) -> Self {
        Self {
            address: address.into(),
            store: None,
        }
    }

    pub fn storing(mut self, target: impl Into<Address>, bytes: impl Into<Vec<u8>>) -> Self {
        self.store = Some((target.into(), bytes.into()));
        self
    }
}

struct State {
    kind: TargetKind,
    segments: RwLock<Vec<Segment>>,
    symbols: AHashMap<String, AHashMap<String, u64>>,
    functions: AHashMap<u64, NativeFunction>,
    files: AHashMap<String, Vec<u8>>,
    heap: Option<Mutex<HeapAllocator>>,
    entrypoint: Option<u64>,
    traps: Mutex<AHashMap<u64, Address>>,
    trap_cleared: Condvar,
    next_trap: AtomicU64,
    stopped_at: Mutex<Option<Address>>,
}

#[derive(Clone)]
pub struct SimulatedProcess {
    state: Arc<State>,
}

impl SimulatedProcess {
    pub fn builder() -> SimulatedProcessBuilder {
        SimulatedProcessBuilder::default()
    }

    pub fn installed_breakpoints(&self) -> usize {
        self.state.traps.lock().len()
    }

    pub fn has_trap_at(&self, addr: Address) -> bool {
        self.state.traps.lock().values().any(|&a| a == addr)
    }

    /// Address the scripted thread is currently parked on, if any.
    pub fn stopped_at(&self) -> Option<Address> {
        *self.state.stopped_at.lock()
    }

    /// Runs `program` on its own thread. Before each instruction the thread
    /// blocks for as long as a breakpoint sits on that instruction's address.
    pub fn spawn(&self, program: Vec<Instruction>) -> thread::JoinHandle<()> {
        let sim = self.clone();
        thread::spawn(move || {
            for insn in program {
                {
                    let mut traps = sim.state.traps.lock();
                    while traps.values().any(|&a| a == insn.address) {
                        *sim.state.stopped_at.lock() = Some(insn.address);
                        sim.state.trap_cleared.wait(&mut traps);
                    }
                    *sim.state.stopped_at.lock() = None;
                }

                if let Some((target, bytes)) = &insn.store {
                    if let Err(e) = sim.write_bytes(*target, bytes) {
                        log::warn!("simulated store at {} failed: {}", target, e);
                    }
                }
            }
            log::debug!("simulated thread finished");
        })
    }

    /// Maps a zeroed segment into the running process, like an `mmap`.
    pub fn map_segment(&self, base: u64, size: u64, protection: Protection, file: Option<(&str, u64)>) {
        let mut segments = self.state.segments.write();
        segments.push(Segment::new(base, size, protection, file));
        segments.sort_by_key(|s| s.base);
    }

    /// Drops the segment starting at `base`. False when nothing starts there.
    pub fn unmap(&self, base: u64) -> bool {
        let mut segments = self.state.segments.write();
        let before = segments.len();
        segments.retain(|s| s.base != base);
        segments.len() != before
    }

    fn heap(&self) -> Result<&Mutex<HeapAllocator>, MemoryError> {
        self.state
            .heap
            .as_ref()
            .ok_or_else(|| MemoryError::NotSupported("target has no heap".to_string()))
    }
}

impl Transport for SimulatedProcess {
    fn kind(&self) -> TargetKind {
        self.state.kind
    }

    fn resolve_symbol(&self, module: Option<&str>, name: &str) -> Result<Address, MemoryError> {
        let mut modules: Vec<_> = self
            .state
            .symbols
            .iter()
            .filter(|(m, _)| module.map_or(true, |wanted| module_matches(m, wanted)))
            .collect();
        modules.sort_by(|a, b| a.0.cmp(b.0));

        modules
            .into_iter()
            .find_map(|(_, table)| table.get(name).copied())
            .map(Address::new)
            .ok_or_else(|| MemoryError::NotFound(format!("{}:{}", module.unwrap_or(""), name)))
    }

    fn read_bytes(&self, addr: Address, len: usize) -> Result<Vec<u8>, MemoryError> {
        let segments = self.state.segments.read();
        let mut out = Vec::new();
        let mut cur = addr.as_u64();

        while out.len() < len {
            let seg = segments
                .iter()
                .find(|s| s.contains(cur) && s.protection.can_read())
                .ok_or(MemoryError::AccessViolation(Address::new(cur)))?;
            let offset = (cur - seg.base) as usize;
            let take = (len - out.len()).min(seg.data.len() - offset);
            out.extend_from_slice(&seg.data[offset..offset + take]);
            cur += take as u64;
        }

        Ok(out)
    }

    /// Writes ignore page protection, the way a debugger poke does.
    fn write_bytes(&self, addr: Address, data: &[u8]) -> Result<(), MemoryError> {
        let mut segments = self.state.segments.write();

        let mut cur = addr.as_u64();
        let mut remaining = data.len() as u64;
        while remaining > 0 {
            let seg = segments
                .iter()
                .find(|s| s.contains(cur))
                .ok_or(MemoryError::AccessViolation(Address::new(cur)))?;
            let take = remaining.min(seg.end() - cur);
            cur += take;
            remaining -= take;
        }

        let mut cur = addr.as_u64();
        let mut written = 0usize;
        while written < data.len() {
            let seg = segments
                .iter_mut()
                .find(|s| s.contains(cur))
                .ok_or(MemoryError::AccessViolation(Address::new(cur)))?;
            let offset = (cur - seg.base) as usize;
            let take = (data.len() - written).min(seg.data.len() - offset);
            seg.data[offset..offset + take].copy_from_slice(&data[written..written + take]);
            written += take;
            cur += take as u64;
        }

        Ok(())
    }

    fn enumerate_ranges(&self) -> Result<Vec<RawRange>, MemoryError> {
        let segments = self.state.segments.read();
        Ok(segments
            .iter()
            .map(|s| RawRange {
                base: s.base,
                size: s.data.len() as u64,
                protection: s.protection.triple(),
                file: s.file.clone(),
            })
            .collect())
    }

    fn inject_breakpoint(&self, addr: Address) -> Result<BreakpointHandle, MemoryError> {
        let mapped = self.state.segments.read().iter().any(|s| s.contains(addr.as_u64()));
        if !mapped {
            return Err(MemoryError::InjectionError(format!("{} is not mapped", addr)));
        }

        let id = self.state.next_trap.fetch_add(1, Ordering::SeqCst);
        self.state.traps.lock().insert(id, addr);
        Ok(BreakpointHandle {
            id,
            address: addr,
            saved: None,
        })
    }

    fn remove_breakpoint(&self, handle: BreakpointHandle) -> Result<(), MemoryError> {
        let removed = self.state.traps.lock().remove(&handle.id);
        if removed.is_none() {
            return Err(MemoryError::InjectionError(format!("unknown breakpoint {}", handle)));
        }
        self.state.trap_cleared.notify_all();
        Ok(())
    }

    fn call_function(&self, addr: Address, args: &[CallArg]) -> Result<u64, MemoryError> {
        let function = self
            .state
            .functions
            .get(&addr.as_u64())
            .cloned()
            .ok_or_else(|| MemoryError::CallError(format!("no function at {}", addr)))?;
        function(self, args)
    }

    fn allocate(&self, size: u64) -> Result<Address, MemoryError> {
        self.heap()?.lock().allocate(size)
    }

    fn deallocate(&self, addr: Address) -> Result<bool, MemoryError> {
        Ok(self.heap()?.lock().deallocate(addr))
    }

    fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>, MemoryError> {
        Ok(self.state.files.get(path).cloned())
    }

    fn entrypoint(&self) -> Result<Address, MemoryError> {
        self.state
            .entrypoint
            .map(Address::new)
            .ok_or_else(|| MemoryError::NotFound("entrypoint".to_string()))
    }
}

#[derive(Default)]
pub struct SimulatedProcessBuilder {
    remote: bool,
    segments: Vec<Segment>,
    stores: Vec<(u64, Vec<u8>)>,
    symbols: AHashMap<String, AHashMap<String, u64>>,
    functions: AHashMap<u64, NativeFunction>,
    files: AHashMap<String, Vec<u8>>,
    heap: Option<(u64, u64)>,
    entrypoint: Option<u64>,
}

impl SimulatedProcessBuilder {
    pub fn remote(mut self) -> Self {
        self.remote = true;
        self
    }

    pub fn map(mut self, base: u64, size: u64, protection: Protection, file: Option<(&str, u64)>) -> Self {
        self.segments.push(Segment::new(base, size, protection, file));
        self
    }

    pub fn store(mut self, addr: u64, bytes: impl Into<Vec<u8>>) -> Self {
        self.stores.push((addr, bytes.into()));
        self
    }

    pub fn symbol(mut self, module: &str, name: &str, addr: u64) -> Self {
        self.symbols
            .entry(module.to_string())
            .or_default()
            .insert(name.to_string(), addr);
        self
    }

    pub fn function<F>(mut self, addr: u64, f: F) -> Self
    where
        F: Fn(&SimulatedProcess, &[CallArg]) -> Result<u64, MemoryError> + Send + Sync + 'static,
    {
        self.functions.insert(addr, Arc::new(f));
        self
    }

    pub fn file(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.to_string(), contents.into());
        self
    }

    /// Maps an anonymous `rw-` region at `base` and serves allocations
    /// from it.
    pub fn heap(mut self, base: u64, size: u64) -> Self {
        self.heap = Some((base, size));
        self.map(base, size, Protection::READ | Protection::WRITE, None)
    }

    pub fn entrypoint(mut self, addr: u64) -> Self {
        self.entrypoint = Some(addr);
        self
    }

    pub fn build(self) -> SimulatedProcess {
        let mut segments = self.segments;
        segments.sort_by_key(|s| s.base);

        let process = SimulatedProcess {
            state: Arc::new(State {
                kind: if self.remote { TargetKind::Remote } else { TargetKind::Local },
                segments: RwLock::new(segments),
                symbols: self.symbols,
                functions: self.functions,
                files: self.files,
                heap: self
                    .heap
                    .map(|(base, size)| Mutex::new(HeapAllocator::new(Address::new(base), size, 16))),
                entrypoint: self.entrypoint,
                traps: Mutex::new(AHashMap::new()),
                trap_cleared: Condvar::new(),
                next_trap: AtomicU64::new(1),
                stopped_at: Mutex::new(None),
            }),
        };

        for (addr, bytes) in self.stores {
            if let Err(e) = process.write_bytes(Address::new(addr), &bytes) {
                log::warn!("initial store at 0x{:x} dropped: {}", addr, e);
            }
        }

        process
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn rw() -> Protection {
        Protection::READ | Protection::WRITE
    }

    #[test]
    fn test_read_write_across_segments() {
        let sim = SimulatedProcess::builder()
            .map(0x1000, 0x10, rw(), None)
            .map(0x1010, 0x10, rw(), None)
            .store(0x100c, b"abcdefgh".to_vec())
            .build();

        assert_eq!(sim.read_bytes(Address::new(0x100c), 8).unwrap(), b"abcdefgh");
        assert!(matches!(
            sim.read_bytes(Address::new(0x101c), 8),
            Err(MemoryError::AccessViolation(a)) if a == Address::new(0x1020)
        ));
        assert!(sim.write_bytes(Address::new(0x101c), b"12345678").is_err());
        assert_eq!(sim.read_bytes(Address::new(0x101c), 4).unwrap(), vec![0; 4]);
    }

    #[test]
    fn test_oversized_read_fails_without_allocating() {
        let sim = SimulatedProcess::builder().map(0x1000, 0x10, rw(), None).build();
        assert!(matches!(
            sim.read_bytes(Address::new(0x1000), usize::MAX),
            Err(MemoryError::AccessViolation(a)) if a == Address::new(0x1010)
        ));
    }

    #[test]
    fn test_map_and_unmap_after_build() {
        let sim = SimulatedProcess::builder().map(0x1000, 0x10, rw(), None).build();
        assert!(sim.read_bytes(Address::new(0x3000), 1).is_err());

        sim.map_segment(0x3000, 0x10, rw(), Some(("/tmp/plugin.so", 0)));
        assert_eq!(sim.read_bytes(Address::new(0x3000), 4).unwrap(), vec![0; 4]);
        assert_eq!(sim.enumerate_ranges().unwrap().len(), 2);

        assert!(sim.unmap(0x1000));
        assert!(!sim.unmap(0x1000));
        assert!(sim.read_bytes(Address::new(0x1000), 1).is_err());
        assert_eq!(sim.enumerate_ranges().unwrap()[0].base, 0x3000);
    }

    #[test]
    fn test_unreadable_segment() {
        let sim = SimulatedProcess::builder()
            .map(0x1000, 0x10, Protection::empty(), None)
            .build();
        assert!(sim.read_bytes(Address::new(0x1000), 1).is_err());
        assert!(sim.write_bytes(Address::new(0x1000), &[1]).is_ok());
    }

    #[test]
    fn test_symbols_and_functions() {
        let sim = SimulatedProcess::builder()
            .map(0x1000, 0x100, rw(), Some(("/usr/lib/libc.so.6", 0)))
            .symbol("libc.so.6", "abs", 0x1010)
            .function(0x1010, |_, args| {
                Ok(args.first().map_or(0, |a| (a.as_register() as i64).unsigned_abs()))
            })
            .build();

        let abs = sim.resolve_symbol(Some("libc"), "abs").unwrap();
        assert_eq!(sim.call_function(abs, &[CallArg::Int(-7i64 as u64)]).unwrap(), 7);
        assert!(sim.resolve_symbol(Some("libm"), "abs").is_err());
        assert!(sim.call_function(Address::new(0x1020), &[]).is_err());
    }

    #[test]
    fn test_thread_parks_on_breakpoint() {
        let sim = SimulatedProcess::builder()
            .map(0x1000, 0x100, rw(), None)
            .build();
        let handle = sim.inject_breakpoint(Address::new(0x1040)).unwrap();

        let thread = sim.spawn(vec![
            Instruction::at(0x1000u64),
            Instruction::at(0x1040u64).storing(0x1080u64, vec![0xaa]),
        ]);

        thread::sleep(Duration::from_millis(100));
        assert_eq!(sim.stopped_at(), Some(Address::new(0x1040)));
        assert_eq!(sim.read_bytes(Address::new(0x1080), 1).unwrap(), vec![0]);

        sim.remove_breakpoint(handle).unwrap();
        thread.join().unwrap();
        assert_eq!(sim.read_bytes(Address::new(0x1080), 1).unwrap(), vec![0xaa]);
        assert!(sim.remove_breakpoint(handle).is_err());
    }
}
