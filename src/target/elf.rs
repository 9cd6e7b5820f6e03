// Wed Jan 15 2026 - Alex

use crate::memory::{Address, MemoryError};
use ahash::AHashMap;
use goblin::elf::header::ET_DYN;
use goblin::elf::program_header::PT_LOAD;
use goblin::elf::Elf;

const PAGE_SIZE: u64 = 0x1000;

/// The parts of an ELF image needed to rebase symbols into a live process.
#[derive(Debug, Clone)]
pub struct ElfImage {
    entry: u64,
    first_load_vaddr: u64,
    position_independent: bool,
    symbols: AHashMap<String, u64>,
}

impl ElfImage {
    pub fn parse(data: &[u8]) -> Result<Self, MemoryError> {
        let elf = Elf::parse(data).map_err(|e| MemoryError::BinaryParseError(format!("Failed to parse ELF: {}", e)))?;

        let first_load_vaddr = elf
            .program_headers
            .iter()
            .filter(|ph| ph.p_type == PT_LOAD)
            .map(|ph| ph.p_vaddr)
            .min()
            .unwrap_or(0);

        let mut symbols = AHashMap::new();
        let tables = [(&elf.syms, &elf.strtab), (&elf.dynsyms, &elf.dynstrtab)];
        for (syms, strtab) in tables {
            for sym in syms.iter() {
                if sym.st_value == 0 || sym.st_shndx == 0 {
                    continue;
                }
                if let Some(name) = strtab.get_at(sym.st_name) {
                    if name.is_empty() {
                        continue;
                    }
                    // Versioned names (`memcpy@@GLIBC_2.14`) are looked up bare.
                    let bare = name.split('@').next().unwrap_or(name);
                    symbols.entry(bare.to_string()).or_insert(sym.st_value);
                }
            }
        }

        Ok(Self {
            entry: elf.entry,
            first_load_vaddr,
            position_independent: elf.header.e_type == ET_DYN,
            symbols,
        })
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_position_independent(&self) -> bool {
        self.position_independent
    }

    /// Difference between where the image was mapped and where it asked to
    /// be. `mapped_base` is the start of the mapping at file offset 0.
    pub fn load_bias(&self, mapped_base: Address) -> u64 {
        if self.position_independent {
            mapped_base.as_u64().wrapping_sub(self.first_load_vaddr & !(PAGE_SIZE - 1))
        } else {
            0
        }
    }

    pub fn symbol(&self, name: &str, mapped_base: Address) -> Option<Address> {
        self.symbols
            .get(name)
            .map(|&value| Address::new(value.wrapping_add(self.load_bias(mapped_base))))
    }

    pub fn entrypoint(&self, mapped_base: Address) -> Address {
        Address::new(self.entry.wrapping_add(self.load_bias(mapped_base)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_elf() {
        assert!(matches!(
            ElfImage::parse(b"definitely not an elf"),
            Err(MemoryError::BinaryParseError(_))
        ));
    }

    #[test]
    fn test_parse_own_executable() {
        let Ok(exe) = std::env::current_exe() else { return };
        let Ok(data) = std::fs::read(exe) else { return };
        if !data.starts_with(b"\x7fELF") {
            return;
        }

        let image = ElfImage::parse(&data).unwrap();
        let base = Address::new(0x5555_5555_4000);
        let entry = image.entrypoint(base);
        if image.is_position_independent() {
            assert!(entry.as_u64() >= base.as_u64());
        } else {
            assert_eq!(image.load_bias(base), 0);
        }
    }
}
