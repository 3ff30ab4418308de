//! # symview-core
//!
//! Symbol type-chain resolution and live value decoding for embedded C
//! targets.
//!
//! Given the debug info of an object file, a symbol table and a way to read
//! target memory, this crate answers two questions about a variable:
//!
//! - What does it look like? ([`DebugSession::members_of_struct`])
//! - What is its value right now? ([`DebugSession::value_of_symbol`])
//!
//! ## Layers
//!
//! - [`loader`]: object file to owned debug-info graph (via `gimli`)
//! - [`dwarf`]: entry index, type-chain resolver, member enumerator
//! - [`render`]: bytes to text according to a member descriptor
//! - [`session`]: the context that ties the layers to one target
//!
//! The connection to the target is not part of this crate: anything that
//! implements [`MemoryReader`] can serve memory, and anything that
//! implements [`SymbolProvider`] can serve addresses.

pub mod config;
pub mod dwarf;
pub mod error;
pub mod loader;
pub mod memory;
pub mod prelude;
pub mod render;
pub mod session;
pub mod symbols;
pub mod types;

pub use config::SessionConfig;
pub use dwarf::{EntryIndex, MemberDescriptor, MemberEnumerator};
pub use error::{SymviewError, SymviewResult};
pub use memory::{MemoryImage, MemoryReader};
pub use session::DebugSession;
pub use symbols::{SymbolProvider, SymbolTable};
pub use types::{Address, MemoryView, TargetProfile};
