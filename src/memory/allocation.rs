// Wed Jan 15 2026 - Alex

use crate::memory::MemoryCell;
use std::cell::Cell;
use std::fmt;
use std::ops::Deref;

pub struct Allocation<'e> {
    cell: MemoryCell<'e>,
    freed: Cell<bool>,
}

impl<'e> Allocation<'e> {
    pub(crate) fn new(cell: MemoryCell<'e>) -> Self {
        Self {
            cell,
            freed: Cell::new(false),
        }
    }

    pub fn is_freed(&self) -> bool {
        self.freed.get()
    }

    pub fn free(&self) -> bool {
        if self.freed.get() {
            log::debug!("{} already freed", self.cell.address());
            return false;
        }

        match self.cell.engine().transport().deallocate(self.cell.address()) {
            Ok(true) => {
                self.freed.set(true);
                true
            }
            Ok(false) => {
                log::warn!("Target does not know an allocation at {}", self.cell.address());
                false
            }
            Err(e) => {
                log::warn!("Failed to free {}: {}", self.cell.address(), e);
                false
            }
        }
    }
}

impl<'e> Deref for Allocation<'e> {
    type Target = MemoryCell<'e>;

    fn deref(&self) -> &Self::Target {
        &self.cell
    }
}

impl fmt::Display for Allocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Allocation {} size={}{}>",
            self.cell.address(),
            self.cell.size(),
            if self.is_freed() { " freed" } else { "" }
        )
    }
}

impl fmt::Debug for Allocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Allocation")
            .field("cell", &self.cell)
            .field("freed", &self.is_freed())
            .finish()
    }
}
