// Tue Jan 13 2026 - Alex

use crate::memory::{Address, MemoryError};
use crate::target::elf::ElfImage;
use crate::target::maps::parse_maps;
use crate::target::{module_matches, BreakpointHandle, CallArg, RawRange, TargetKind, Transport};
use ahash::AHashMap;
use libc::{c_void, iovec, pid_t};
use parking_lot::Mutex;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const TRAP_OPCODE: u8 = 0xCC;
const READ_CHUNK: usize = 0x10000;

/// A process on this machine, accessed through `/proc` and
/// `process_vm_readv`. Software breakpoints only make sense when the caller
/// already traces the process; otherwise the trap kills it.
pub struct LocalProcess {
    pid: pid_t,
    images: Mutex<AHashMap<String, Arc<ElfImage>>>,
    next_trap: AtomicU64,
}

impl LocalProcess {
    pub fn attach(pid: pid_t) -> Result<Self, MemoryError> {
        if !Path::new(&format!("/proc/{}", pid)).exists() {
            return Err(MemoryError::NotFound(format!("process {}", pid)));
        }
        Ok(Self {
            pid,
            images: Mutex::new(AHashMap::new()),
            next_trap: AtomicU64::new(1),
        })
    }

    pub fn current() -> Result<Self, MemoryError> {
        Self::attach(std::process::id() as pid_t)
    }

    pub fn pid(&self) -> pid_t {
        self.pid
    }

    fn proc_path(&self, leaf: &str) -> PathBuf {
        PathBuf::from(format!("/proc/{}/{}", self.pid, leaf))
    }

    /// Path of `path` as seen from inside the target's mount namespace.
    fn rooted(&self, path: &str) -> PathBuf {
        PathBuf::from(format!("/proc/{}/root{}", self.pid, path))
    }

    fn image(&self, path: &str) -> Result<Arc<ElfImage>, MemoryError> {
        if let Some(image) = self.images.lock().get(path) {
            return Ok(image.clone());
        }

        let data = fs::read(self.rooted(path)).or_else(|_| fs::read(path))?;
        let image = Arc::new(ElfImage::parse(&data)?);
        log::debug!("parsed {} ({} symbols)", path, image.symbol_count());
        self.images.lock().insert(path.to_string(), image.clone());
        Ok(image)
    }

    /// Distinct backing files with the address their offset-0 mapping
    /// landed at, in address order.
    fn mapped_files(&self) -> Result<Vec<(String, Address)>, MemoryError> {
        let mut files: Vec<(String, Address)> = Vec::new();
        for range in self.enumerate_ranges()? {
            let Some(file) = range.file else { continue };
            if let Some(existing) = files.iter_mut().find(|(p, _)| *p == file.path) {
                if file.offset == 0 && range.base < existing.1.as_u64() {
                    existing.1 = Address::new(range.base);
                }
                continue;
            }
            files.push((file.path, Address::new(range.base - file.offset.min(range.base))));
        }
        Ok(files)
    }

    fn trap_write(&self, addr: Address, byte: u8) -> Result<(), MemoryError> {
        self.write_bytes(addr, &[byte])
            .map_err(|e| MemoryError::InjectionError(format!("{} at {}", e, addr)))
    }
}

impl Transport for LocalProcess {
    fn kind(&self) -> TargetKind {
        TargetKind::Local
    }

    fn resolve_symbol(&self, module: Option<&str>, name: &str) -> Result<Address, MemoryError> {
        for (path, base) in self.mapped_files()? {
            let file_name = path.rsplit('/').next().unwrap_or(&path);
            if let Some(module) = module {
                if !module_matches(file_name, module) {
                    continue;
                }
            }

            let image = match self.image(&path) {
                Ok(image) => image,
                Err(e) => {
                    log::debug!("skipping {}: {}", path, e);
                    continue;
                }
            };
            if let Some(addr) = image.symbol(name, base) {
                return Ok(addr);
            }
        }

        Err(MemoryError::NotFound(format!("{}:{}", module.unwrap_or(""), name)))
    }

    fn read_bytes(&self, addr: Address, len: usize) -> Result<Vec<u8>, MemoryError> {
        let mut buffer = Vec::new();

        // The buffer grows only as far as the target actually has memory.
        while buffer.len() < len {
            let cur = addr
                .checked_add(buffer.len() as u64)
                .ok_or(MemoryError::AccessViolation(addr))?;
            let want = (len - buffer.len()).min(READ_CHUNK);
            let start = buffer.len();
            buffer.resize(start + want, 0);

            let local = iovec {
                iov_base: buffer[start..].as_mut_ptr() as *mut c_void,
                iov_len: want,
            };
            let remote = iovec {
                iov_base: cur.as_u64() as *mut c_void,
                iov_len: want,
            };

            let read = unsafe { libc::process_vm_readv(self.pid, &local, 1, &remote, 1, 0) };
            if read < 0 {
                return Err(MemoryError::AccessViolation(cur));
            }
            if (read as usize) < want {
                return Err(MemoryError::AccessViolation(cur + read as u64));
            }
        }

        Ok(buffer)
    }

    fn write_bytes(&self, addr: Address, data: &[u8]) -> Result<(), MemoryError> {
        let mem = OpenOptions::new().read(true).write(true).open(self.proc_path("mem"))?;
        mem.write_all_at(data, addr.as_u64())
            .map_err(|_| MemoryError::AccessViolation(addr))
    }

    fn enumerate_ranges(&self) -> Result<Vec<RawRange>, MemoryError> {
        let contents = fs::read_to_string(self.proc_path("maps"))?;
        Ok(parse_maps(&contents))
    }

    fn inject_breakpoint(&self, addr: Address) -> Result<BreakpointHandle, MemoryError> {
        let original = self
            .read_bytes(addr, 1)
            .map_err(|e| MemoryError::InjectionError(format!("{} at {}", e, addr)))?[0];
        self.trap_write(addr, TRAP_OPCODE)?;
        Ok(BreakpointHandle {
            id: self.next_trap.fetch_add(1, Ordering::SeqCst),
            address: addr,
            saved: Some(original),
        })
    }

    fn remove_breakpoint(&self, handle: BreakpointHandle) -> Result<(), MemoryError> {
        let saved = handle
            .saved
            .ok_or_else(|| MemoryError::InjectionError(format!("breakpoint {} has no saved byte", handle)))?;
        self.trap_write(handle.address, saved)
    }

    fn call_function(&self, addr: Address, _args: &[CallArg]) -> Result<u64, MemoryError> {
        Err(MemoryError::NotSupported(format!(
            "calling {} in a local process needs an in-process agent",
            addr
        )))
    }

    fn allocate(&self, size: u64) -> Result<Address, MemoryError> {
        Err(MemoryError::NotSupported(format!(
            "allocating {} bytes in a local process needs an in-process agent",
            size
        )))
    }

    fn deallocate(&self, _addr: Address) -> Result<bool, MemoryError> {
        Ok(false)
    }

    fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>, MemoryError> {
        match fs::read(self.rooted(path)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn entrypoint(&self) -> Result<Address, MemoryError> {
        let exe = fs::read_link(self.proc_path("exe"))?;
        let exe = exe.to_string_lossy().into_owned();
        let base = self
            .mapped_files()?
            .into_iter()
            .find(|(path, _)| *path == exe)
            .map(|(_, base)| base)
            .ok_or_else(|| MemoryError::NotFound(format!("mapping for {}", exe)))?;
        Ok(self.image(&exe)?.entrypoint(base))
    }
}
