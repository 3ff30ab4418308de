//! # Error Types
//!
//! General error handling for symbol inspection.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.
//!
//! Only conditions the caller has to see are errors. Malformed debug info
//! (a location expression with the wrong opcode, an offset expression that
//! is too short) and unsupported layouts (a word size we cannot decode) are
//! recovered where they are found and reported through `tracing::warn!`.

use thiserror::Error;

use crate::types::Address;

/// Main error type for symbol inspection
///
/// ## Error Categories
///
/// 1. **Not-found errors**: SymbolNotFound, EntryNotFound, TypeNotFound, MemberNotFound
/// 2. **Memory errors**: MemoryRead, ShortRead
/// 3. **Loader errors**: Dwarf, Object, Io
/// 4. **Caller errors**: InvalidArgument
#[derive(Error, Debug)]
pub enum SymviewError
{
    /// The symbol table has no symbol with this name
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// No debug entry has both this name and this declaration address
    ///
    /// This happens when the symbol table and the debug info disagree, for
    /// example when the ELF was rebuilt but the debug info was not reloaded.
    #[error("No debug entry named {name} at {address}")]
    EntryNotFound
    {
        /// Symbol name that was looked up
        name: String,
        /// Address the entry was expected to be declared at
        address: Address,
    },

    /// A type reference points at an entry the index does not contain
    ///
    /// The value is the global reference id (unit base offset plus the
    /// unit-relative type offset). This indicates a malformed binary or a
    /// type that lives deeper than the index flattens.
    #[error("Referenced type 0x{0:x} is missing from the debug info")]
    TypeNotFound(u64),

    /// A dotted path named a member the structure does not have
    #[error("{path} has no member named {member}")]
    MemberNotFound
    {
        /// Path resolved so far
        path: String,
        /// Member name that could not be found
        member: String,
    },

    /// The memory reader could not supply the requested range
    #[error("Failed to read {length} bytes at {address}")]
    MemoryRead
    {
        /// Start of the requested range
        address: Address,
        /// Number of bytes requested
        length: usize,
    },

    /// The memory reader returned a different number of bytes than requested
    ///
    /// Readers must return exactly the requested length or fail. A short
    /// buffer is never decoded.
    #[error("Short read at {address}: expected {expected} bytes, got {actual}")]
    ShortRead
    {
        /// Start of the requested range
        address: Address,
        /// Number of bytes requested
        expected: usize,
        /// Number of bytes the reader produced
        actual: usize,
    },

    /// Invalid argument passed by the caller
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// DWARF parsing error raised while loading an object file
    #[error("DWARF error: {0}")]
    Dwarf(#[from] gimli::Error),

    /// Object file parsing error raised while loading an object file
    #[error("Object file error: {0}")]
    Object(#[from] object::read::Error),

    /// I/O error (for reading object files and memory dumps)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SymviewError
{
    /// Whether this error means "absent" rather than "broken"
    ///
    /// Not-found conditions are ordinary query outcomes for an inspection
    /// tool; front ends usually print them differently from real failures.
    #[must_use]
    pub fn is_not_found(&self) -> bool
    {
        matches!(
            self,
            SymviewError::SymbolNotFound(_)
                | SymviewError::EntryNotFound { .. }
                | SymviewError::TypeNotFound(_)
                | SymviewError::MemberNotFound { .. }
        )
    }
}

/// Convenience type alias for `Result<T, SymviewError>`
///
/// ```rust
/// use symview_core::error::SymviewResult;
/// fn foo() -> SymviewResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type SymviewResult<T> = std::result::Result<T, SymviewError>;
