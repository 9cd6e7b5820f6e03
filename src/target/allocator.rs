// Tue Jan 13 2026 - Alex

use crate::memory::{Address, MemoryError};
use std::collections::BTreeMap;

/// First-fit allocator over one contiguous heap region.
pub struct HeapAllocator {
    free_blocks: BTreeMap<u64, u64>,
    allocated_blocks: BTreeMap<u64, u64>,
    alignment: u64,
}

impl HeapAllocator {
    pub fn new(base: Address, size: u64, alignment: u64) -> Self {
        let mut free_blocks = BTreeMap::new();
        if size > 0 {
            free_blocks.insert(base.as_u64(), size);
        }
        Self {
            free_blocks,
            allocated_blocks: BTreeMap::new(),
            alignment: alignment.max(1).next_power_of_two(),
        }
    }

    pub fn allocate(&mut self, size: u64) -> Result<Address, MemoryError> {
        let align = self.alignment;
        let wanted = size.max(1).checked_add(align - 1).ok_or(MemoryError::OutOfMemory(size))? & !(align - 1);

        let found = self.free_blocks.iter().find_map(|(&start, &block_size)| {
            let aligned = (start + align - 1) & !(align - 1);
            let padding = aligned - start;
            (padding + wanted <= block_size).then_some((start, block_size, aligned, padding))
        });

        let Some((start, block_size, aligned, padding)) = found else {
            return Err(MemoryError::OutOfMemory(size));
        };

        self.free_blocks.remove(&start);
        if padding > 0 {
            self.free_blocks.insert(start, padding);
        }
        if padding + wanted < block_size {
            self.free_blocks.insert(aligned + wanted, block_size - padding - wanted);
        }
        self.allocated_blocks.insert(aligned, wanted);
        Ok(Address::new(aligned))
    }

    /// Returns `false` for addresses that are not currently allocated.
    pub fn deallocate(&mut self, addr: Address) -> bool {
        let Some(size) = self.allocated_blocks.remove(&addr.as_u64()) else {
            return false;
        };
        self.free_blocks.insert(addr.as_u64(), size);
        self.merge_free_blocks();
        true
    }

    fn merge_free_blocks(&mut self) {
        let mut merged = BTreeMap::new();
        let mut current: Option<(u64, u64)> = None;
        for (&start, &size) in &self.free_blocks {
            current = match current {
                Some((cur_start, cur_size)) if cur_start + cur_size == start => Some((cur_start, cur_size + size)),
                Some((cur_start, cur_size)) => {
                    merged.insert(cur_start, cur_size);
                    Some((start, size))
                }
                None => Some((start, size)),
            };
        }
        if let Some((start, size)) = current {
            merged.insert(start, size);
        }
        self.free_blocks = merged;
    }

    pub fn allocated_size(&self, addr: Address) -> Option<u64> {
        self.allocated_blocks.get(&addr.as_u64()).copied()
    }

    pub fn free_bytes(&self) -> u64 {
        self.free_blocks.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_and_free() {
        let mut heap = HeapAllocator::new(Address::new(0x10000), 0x100, 16);
        let a = heap.allocate(22).unwrap();
        let b = heap.allocate(1).unwrap();
        assert_eq!(a, Address::new(0x10000));
        assert_eq!(b, Address::new(0x10020));
        assert_eq!(heap.allocated_size(a), Some(32));

        assert!(heap.deallocate(a));
        assert!(!heap.deallocate(a));
        assert!(heap.deallocate(b));
        assert_eq!(heap.free_bytes(), 0x100);
    }

    #[test]
    fn test_out_of_memory() {
        let mut heap = HeapAllocator::new(Address::new(0x10000), 0x40, 16);
        assert!(heap.allocate(0x40).is_ok());
        assert!(matches!(heap.allocate(1), Err(MemoryError::OutOfMemory(1))));
    }

    #[test]
    fn test_free_blocks_coalesce() {
        let mut heap = HeapAllocator::new(Address::new(0x10000), 0x60, 16);
        let a = heap.allocate(0x20).unwrap();
        let b = heap.allocate(0x20).unwrap();
        let c = heap.allocate(0x20).unwrap();
        heap.deallocate(a);
        heap.deallocate(c);
        heap.deallocate(b);
        assert_eq!(heap.allocate(0x60).unwrap(), a);
    }
}
