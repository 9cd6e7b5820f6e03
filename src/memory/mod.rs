// Tue Jan 13 2026 - Alex

pub mod address;
pub mod allocation;
pub mod breakpoint;
pub mod cell;
pub mod codec;
pub mod engine;
pub mod error;
pub mod key;
pub mod loader;
pub mod protection;
pub mod range;
pub mod resolver;
pub mod value;

pub use address::Address;
pub use allocation::Allocation;
pub use breakpoint::{BreakpointRegistry, Transition};
pub use cell::MemoryCell;
pub use codec::Width;
pub use engine::MemoryEngine;
pub use error::{LookupError, MemoryError};
pub use key::MemoryKey;
pub use loader::{load_file, FileStream};
pub use protection::Protection;
pub use range::{FileMapping, MemoryRange};
pub use resolver::{AddressResolver, Resolved};
pub use value::{StringEncoding, TypedInt, Value};
