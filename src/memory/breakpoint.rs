// Wed Jan 15 2026 - Alex

use crate::memory::{Address, MemoryError};
use crate::target::{BreakpointHandle, Transport};
use indexmap::IndexMap;
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Installed,
    Removed,
    Unchanged,
}

#[derive(Default)]
pub struct BreakpointRegistry {
    active: Mutex<IndexMap<Address, BreakpointHandle>>,
}

impl BreakpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, addr: Address) -> bool {
        self.active.lock().contains_key(&addr)
    }

    pub fn len(&self) -> usize {
        self.active.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.lock().is_empty()
    }

    pub fn snapshot(&self) -> IndexMap<Address, BreakpointHandle> {
        self.active.lock().clone()
    }

    pub fn set(&self, transport: &dyn Transport, addr: Address, enabled: bool) -> Result<Transition, MemoryError> {
        let mut active = self.active.lock();

        match (enabled, active.contains_key(&addr)) {
            (true, true) | (false, false) => Ok(Transition::Unchanged),
            (true, false) => {
                let handle = transport.inject_breakpoint(addr)?;
                log::debug!("breakpoint {} installed", handle);
                active.insert(addr, handle);
                Ok(Transition::Installed)
            }
            (false, true) => {
                let handle = active[&addr];
                transport.remove_breakpoint(handle)?;
                log::debug!("breakpoint {} removed", handle);
                active.shift_remove(&addr);
                Ok(Transition::Removed)
            }
        }
    }

    pub fn release_all(&self, transport: &dyn Transport) -> usize {
        let mut active = self.active.lock();
        let mut released = 0;

        active.retain(|addr, handle| match transport.remove_breakpoint(*handle) {
            Ok(()) => {
                released += 1;
                false
            }
            Err(e) => {
                log::warn!("Failed to release breakpoint at {}: {}", addr, e);
                true
            }
        });

        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Protection;
    use crate::target::SimulatedProcess;
    use std::collections::HashSet;

    fn target() -> SimulatedProcess {
        SimulatedProcess::builder()
            .map(0x1000, 0x1000, Protection::READ | Protection::EXECUTE, Some(("/bin/basic_two", 0)))
            .build()
    }

    #[test]
    fn test_redundant_transitions() {
        let sim = target();
        let registry = BreakpointRegistry::new();
        let addr = Address::new(0x164a);

        let before = registry.snapshot();
        assert_eq!(registry.set(&sim, addr, false).unwrap(), Transition::Unchanged);
        assert_eq!(before, registry.snapshot());

        assert_eq!(registry.set(&sim, addr, true).unwrap(), Transition::Installed);
        assert_ne!(before, registry.snapshot());

        let before = registry.snapshot();
        assert_eq!(registry.set(&sim, addr, true).unwrap(), Transition::Unchanged);
        assert_eq!(before, registry.snapshot());
        assert_eq!(sim.installed_breakpoints(), 1);

        assert_eq!(registry.set(&sim, addr, false).unwrap(), Transition::Removed);
        assert!(!registry.is_active(addr));
        assert_eq!(sim.installed_breakpoints(), 0);
    }

    #[test]
    fn test_addresses_are_independent() {
        let sim = target();
        let registry = BreakpointRegistry::new();
        let entry = Address::new(0x1000);
        let func = Address::new(0x164a);

        registry.set(&sim, entry, true).unwrap();
        registry.set(&sim, func, true).unwrap();
        registry.set(&sim, entry, false).unwrap();

        assert!(!registry.is_active(entry));
        assert!(registry.is_active(func));

        let handles: HashSet<_> = registry.snapshot().values().copied().collect();
        assert_eq!(handles.len(), registry.len());
    }

    #[test]
    fn test_failed_injection_leaves_table_untouched() {
        let sim = target();
        let registry = BreakpointRegistry::new();

        assert!(registry.set(&sim, Address::new(0xdead_0000), true).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_release_all() {
        let sim = target();
        let registry = BreakpointRegistry::new();
        registry.set(&sim, Address::new(0x1000), true).unwrap();
        registry.set(&sim, Address::new(0x1010), true).unwrap();

        assert_eq!(registry.release_all(&sim), 2);
        assert!(registry.is_empty());
        assert_eq!(sim.installed_breakpoints(), 0);
    }
}
