//! # Debug Info
//!
//! The debug-info graph and everything that walks it:
//!
//! - [`entry`]: entries, attributes and compilation units
//! - [`index`]: flat lookup by name/address and by global reference
//! - [`resolver`]: type-chain resolution and declaration addresses
//! - [`members`]: structure member layout

pub mod entry;
pub mod index;
pub mod members;
pub mod resolver;

pub use entry::{AttrValue, CompilationUnit, DebugEntry};
pub use index::{ChainLink, EntryIndex};
pub use members::{array_length, format_member_table, MemberDescriptor, MemberEnumerator, DEFAULT_MEMBER_DEPTH};
pub use resolver::{declaration_address, TypeChain, DEFAULT_TYPE_CHAIN_DEPTH};
