//! Common module for library exports

pub use crate::config::SessionConfig;
pub use crate::dwarf::{ChainLink, CompilationUnit, DebugEntry, EntryIndex, MemberDescriptor, MemberEnumerator};
pub use crate::error::{SymviewError, SymviewResult};
pub use crate::loader::load_debug_info;
pub use crate::memory::{MemoryImage, MemoryReader};
pub use crate::render::ValueRenderer;
pub use crate::session::DebugSession;
pub use crate::symbols::{RawSymbol, SymbolKind, SymbolProvider, SymbolTable};
pub use crate::types::{Address, MemoryView, TargetProfile};
