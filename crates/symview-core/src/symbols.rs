//! # Symbol Table
//!
//! Name to address lookup, used to find where a variable lives before its
//! debug entry is resolved. The debug info alone cannot answer this for
//! every symbol (relocated sections, linker-placed data), so the linker's
//! symbol table is the source of truth for addresses.

use std::collections::HashMap;

use object::{Object, ObjectSymbol};
use tracing::debug;

use crate::types::Address;

/// Coarse classification of a linker symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind
{
    /// Executable code
    Function,
    /// Data object (variable)
    Data,
    /// Anything else (sections, files, labels)
    Other,
}

/// One entry of the symbol table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSymbol
{
    pub name: String,
    pub address: Address,
    pub byte_length: u64,
    pub kind: SymbolKind,
}

impl RawSymbol
{
    pub fn new(name: impl Into<String>, address: Address, byte_length: u64, kind: SymbolKind) -> Self
    {
        Self {
            name: name.into(),
            address,
            byte_length,
            kind,
        }
    }
}

/// Source of symbol addresses
pub trait SymbolProvider
{
    /// Symbol with exactly this name, if the table has one
    fn raw_symbol(&self, name: &str) -> Option<RawSymbol>;
}

impl<T: SymbolProvider + ?Sized> SymbolProvider for &T
{
    fn raw_symbol(&self, name: &str) -> Option<RawSymbol>
    {
        (**self).raw_symbol(name)
    }
}

/// Name-keyed symbol table
///
/// ## Example
///
/// ```rust
/// use symview_core::symbols::{RawSymbol, SymbolKind, SymbolProvider, SymbolTable};
/// use symview_core::types::Address;
///
/// let mut table = SymbolTable::new();
/// table.insert(RawSymbol::new("ticks", Address::new(0xa000_0010), 4, SymbolKind::Data));
/// assert_eq!(table.raw_symbol("ticks").map(|sym| sym.address), Some(Address::new(0xa000_0010)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SymbolTable
{
    symbols: HashMap<String, RawSymbol>,
}

impl SymbolTable
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Add a symbol; the first symbol inserted under a name is kept
    pub fn insert(&mut self, symbol: RawSymbol)
    {
        self.symbols.entry(symbol.name.clone()).or_insert(symbol);
    }

    /// Read the symbol table of a parsed object file
    ///
    /// Undefined symbols and symbols without names are skipped. When a name
    /// occurs more than once (static variables of different files) the
    /// first definition is kept.
    pub fn from_object<'data>(file: &object::File<'data>) -> Self
    {
        let mut table = Self::new();
        for symbol in file.symbols() {
            if symbol.is_undefined() {
                continue;
            }
            let Ok(name) = symbol.name() else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            let kind = match symbol.kind() {
                object::SymbolKind::Text => SymbolKind::Function,
                object::SymbolKind::Data => SymbolKind::Data,
                _ => SymbolKind::Other,
            };
            table.insert(RawSymbol::new(name, Address::new(symbol.address()), symbol.size(), kind));
        }
        debug!(symbols = table.len(), "loaded symbol table");
        table
    }

    pub fn len(&self) -> usize
    {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.symbols.is_empty()
    }
}

impl SymbolProvider for SymbolTable
{
    fn raw_symbol(&self, name: &str) -> Option<RawSymbol>
    {
        self.symbols.get(name).cloned()
    }
}

impl FromIterator<RawSymbol> for SymbolTable
{
    fn from_iter<I: IntoIterator<Item = RawSymbol>>(iter: I) -> Self
    {
        let mut table = Self::new();
        for symbol in iter {
            table.insert(symbol);
        }
        table
    }
}
