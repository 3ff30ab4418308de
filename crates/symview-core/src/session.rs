//! # Debug Session
//!
//! The single owned context every query goes through: the entry index of
//! the loaded object file, the symbol table, the memory reader for the
//! target and the session settings. Nothing is global; two sessions over
//! two object files can live side by side.
//!
//! ## Queries
//!
//! - [`DebugSession::value_of_symbol`]: live value of a variable as text
//! - [`DebugSession::members_of_struct`]: member layout of a variable's type
//! - [`DebugSession::member_table`]: the same layout as a printable table
//! - [`DebugSession::function_address`]: entry address of a function
//!
//! Queries have no side effects on the target. Every value query reads
//! memory again; nothing is cached between calls.
//!
//! ## Example
//!
//! ```rust,ignore
//! let (units, profile) = load_debug_info(&elf_bytes)?;
//! let session = DebugSession::new(&units, profile, memory, symbols);
//! println!("{}", session.value_of_symbol("sensor.config.gain")?);
//! ```

use tracing::debug;

use crate::config::SessionConfig;
use crate::dwarf::{format_member_table, ChainLink, CompilationUnit, EntryIndex, MemberDescriptor, MemberEnumerator};
use crate::error::{SymviewError, SymviewResult};
use crate::memory::MemoryReader;
use crate::render::ValueRenderer;
use crate::symbols::{SymbolKind, SymbolProvider};
use crate::types::{Address, TargetProfile};

/// Inspection context for one loaded object file and one target
pub struct DebugSession<'a, M, S>
{
    index: EntryIndex<'a>,
    memory: M,
    symbols: S,
    config: SessionConfig,
}

impl<'a, M, S> DebugSession<'a, M, S>
where
    M: MemoryReader,
    S: SymbolProvider,
{
    /// Build the entry index over `units` and start a session with default settings
    pub fn new(units: &'a [CompilationUnit], profile: TargetProfile, memory: M, symbols: S) -> Self
    {
        Self {
            index: EntryIndex::build(units, profile),
            memory,
            symbols,
            config: SessionConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: SessionConfig) -> Self
    {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SessionConfig
    {
        &self.config
    }

    pub fn index(&self) -> &EntryIndex<'a>
    {
        &self.index
    }

    pub fn profile(&self) -> TargetProfile
    {
        self.index.profile()
    }

    pub fn memory(&self) -> &M
    {
        &self.memory
    }

    /// Live value of a variable, rendered as text
    ///
    /// `name` is a symbol name, optionally followed by a dotted member path
    /// (`sensor.config.gain`). Structures render on one line as
    /// `{ a = 'A', b = 10 }`; everything else renders as a single value.
    ///
    /// ## Errors
    ///
    /// - `SymbolNotFound` / `EntryNotFound` when the symbol cannot be located
    /// - `MemberNotFound` when a path segment names no member
    /// - `TypeNotFound` when the symbol's type chain is broken
    /// - `MemoryRead` / `ShortRead` when the target bytes cannot be read
    pub fn value_of_symbol(&self, name: &str) -> SymviewResult<String>
    {
        let (address, descriptor) = self.resolve_path(name)?;
        let renderer = self.renderer();
        if is_plain_struct(&descriptor) {
            renderer.render_struct(address + descriptor.offset, &descriptor.children)
        } else {
            renderer.render(address, &descriptor)
        }
    }

    /// Like [`Self::value_of_symbol`], with structures spread over several lines
    ///
    /// ## Errors
    ///
    /// Same as [`Self::value_of_symbol`].
    pub fn value_of_symbol_pretty(&self, name: &str) -> SymviewResult<String>
    {
        let (address, descriptor) = self.resolve_path(name)?;
        let renderer = self.renderer();
        if is_plain_struct(&descriptor) {
            renderer.render_struct_pretty(address + descriptor.offset, &descriptor.children)
        } else {
            renderer.render(address, &descriptor)
        }
    }

    /// Member layout of the structure a variable resolves to
    ///
    /// Empty when the variable is not a structure.
    ///
    /// ## Errors
    ///
    /// `SymbolNotFound`, `EntryNotFound` or `TypeNotFound`.
    pub fn members_of_struct(&self, name: &str) -> SymviewResult<Vec<MemberDescriptor>>
    {
        let (link, _) = self.lookup(name)?;
        self.enumerator().members_of(link, self.config.member_depth)
    }

    /// [`Self::members_of_struct`] formatted as a table
    ///
    /// ## Errors
    ///
    /// Same as [`Self::members_of_struct`].
    pub fn member_table(&self, name: &str) -> SymviewResult<String>
    {
        Ok(format_member_table(&self.members_of_struct(name)?))
    }

    /// Entry address of a function symbol
    ///
    /// `None` when the name is unknown or names something other than a
    /// function.
    pub fn function_address(&self, name: &str) -> Option<Address>
    {
        self.symbols
            .raw_symbol(name)
            .filter(|symbol| symbol.kind == SymbolKind::Function)
            .map(|symbol| symbol.address)
    }

    /// Debug entry of a variable, located through the symbol table
    fn lookup(&self, name: &str) -> SymviewResult<(ChainLink<'a>, Address)>
    {
        let symbol = self
            .symbols
            .raw_symbol(name)
            .ok_or_else(|| SymviewError::SymbolNotFound(name.to_string()))?;

        let link = self
            .index
            .find_by_name_and_address(&symbol.name, symbol.address)
            .ok_or_else(|| SymviewError::EntryNotFound {
                name: symbol.name.clone(),
                address: symbol.address,
            })?;

        debug!(name, address = %symbol.address, unit = %link.unit, "resolved symbol");
        Ok((link, symbol.address))
    }

    /// Walk a dotted path down to the addressed member
    ///
    /// Returns the address of the member's parent and the member's
    /// descriptor, ready for [`ValueRenderer::render`].
    fn resolve_path(&self, name: &str) -> SymviewResult<(Address, MemberDescriptor)>
    {
        let mut segments = name.split('.');
        let symbol = segments.next().unwrap_or_default();
        let path: Vec<&str> = segments.collect();
        if symbol.is_empty() || path.iter().any(|segment| segment.is_empty()) {
            return Err(SymviewError::InvalidArgument(format!("malformed symbol path: {name:?}")));
        }

        let (link, address) = self.lookup(symbol)?;
        let depth = self.config.member_depth + path.len();
        let mut descriptor = self.enumerator().describe(link, depth)?;
        let mut base = address;
        let mut walked = symbol.to_string();

        for segment in path {
            let parent_address = base + descriptor.offset;
            let Some(child) = descriptor.children.into_iter().find(|child| child.name == segment) else {
                return Err(SymviewError::MemberNotFound {
                    path: walked,
                    member: segment.to_string(),
                });
            };
            base = parent_address;
            descriptor = child;
            walked.push('.');
            walked.push_str(segment);
        }

        Ok((base, descriptor))
    }

    fn enumerator(&self) -> MemberEnumerator<'_, 'a>
    {
        MemberEnumerator::new(&self.index).with_type_depth(self.config.type_chain_depth)
    }

    fn renderer(&self) -> ValueRenderer<'_, M>
    {
        ValueRenderer::new(&self.memory, self.index.profile())
            .with_view(self.config.memory_view)
            .with_expand_nested(self.config.expand_nested)
    }
}

/// A single structure value (not behind a pointer, not an array)
fn is_plain_struct(descriptor: &MemberDescriptor) -> bool
{
    descriptor.is_struct && !descriptor.is_pointer && !descriptor.is_array && !descriptor.children.is_empty()
}
