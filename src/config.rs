// Tue Jan 13 2026 - Alex

use crate::memory::MemoryError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on bytes scanned when reading a NUL-terminated string.
    pub string_limit: usize,
    /// Granularity of string reads; reads never straddle a multiple of it.
    pub string_chunk: usize,
    pub warn_on_overflow: bool,
    pub release_breakpoints_on_drop: bool,
    /// Try the host filesystem before asking the target for a file.
    pub local_files_first: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            string_limit: 4096,
            string_chunk: 256,
            warn_on_overflow: true,
            release_breakpoints_on_drop: true,
            local_files_first: true,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_string_limit(mut self, limit: usize) -> Self {
        self.string_limit = limit;
        self
    }

    pub fn with_string_chunk(mut self, chunk: usize) -> Self {
        self.string_chunk = chunk;
        self
    }

    pub fn with_release_on_drop(mut self, release: bool) -> Self {
        self.release_breakpoints_on_drop = release;
        self
    }

    pub fn with_local_files_first(mut self, local_first: bool) -> Self {
        self.local_files_first = local_first;
        self
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MemoryError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| MemoryError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), MemoryError> {
        let contents = serde_json::to_string_pretty(self).map_err(|e| MemoryError::InvalidConfig(e.to_string()))?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), MemoryError> {
        if self.string_chunk < 2 || self.string_chunk % 2 != 0 {
            return Err(MemoryError::InvalidConfig(
                "string_chunk must be an even number of bytes".to_string(),
            ));
        }
        if self.string_limit < self.string_chunk {
            return Err(MemoryError::InvalidConfig(
                "string_limit must be at least string_chunk".to_string(),
            ));
        }
        Ok(())
    }
}
