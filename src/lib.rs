// Tue Jan 15 2026 - Alex

pub mod config;
pub mod memory;
pub mod target;
pub mod ui;
pub mod utils;

pub use config::EngineConfig;
pub use memory::{Address, MemoryCell, MemoryEngine, MemoryError, MemoryKey, MemoryRange};
pub use target::{LocalProcess, SimulatedProcess, Transport};
