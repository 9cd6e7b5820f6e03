// Wed Jan 15 2026 - Alex

use crate::memory::MemoryError;
use crate::target::{TargetKind, Transport};
use bytes::Bytes;
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::path::Path;

enum Source {
    Mapped(Mmap),
    Fetched(Bytes),
}

pub struct FileStream {
    source: Source,
    pos: usize,
}

impl FileStream {
    fn mapped(mmap: Mmap) -> Self {
        Self {
            source: Source::Mapped(mmap),
            pos: 0,
        }
    }

    fn fetched(data: impl Into<Bytes>) -> Self {
        Self {
            source: Source::Fetched(data.into()),
            pos: 0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match &self.source {
            Source::Mapped(mmap) => mmap.as_ref(),
            Source::Fetched(bytes) => bytes.as_ref(),
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_local(&self) -> bool {
        matches!(self.source, Source::Mapped(_))
    }
}

impl Read for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = &self.as_bytes()[self.pos.min(self.len())..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}

fn open_local(path: &Path) -> Result<Option<FileStream>, MemoryError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    // Zero-length files cannot be mapped.
    if file.metadata()?.len() == 0 {
        return Ok(Some(FileStream::fetched(Bytes::new())));
    }

    let mmap = unsafe { Mmap::map(&file) }?;
    Ok(Some(FileStream::mapped(mmap)))
}

/// Opens `path` for a target. Local targets look on the host first when
/// `local_first` is set; everything else, and any local miss, is read out
/// of the target's own filesystem. `None` when neither side has the file.
pub fn load_file(transport: &dyn Transport, path: &str, local_first: bool) -> Result<Option<FileStream>, MemoryError> {
    if local_first && transport.kind() == TargetKind::Local {
        if let Some(stream) = open_local(Path::new(path))? {
            log::debug!("{} opened from the host filesystem", path);
            return Ok(Some(stream));
        }
    }

    match transport.read_file(path)? {
        Some(data) => {
            log::debug!("{} fetched from the target ({} bytes)", path, data.len());
            Ok(Some(FileStream::fetched(data)))
        }
        None => Ok(None),
    }
}
