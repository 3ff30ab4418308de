//! Debug-info graph: entries and compilation units.
//!
//! The graph is produced once per loaded object file (see
//! [`crate::loader`]) and is read-only afterwards. Tags and attribute ids
//! are the `gimli` constants so entries read like the DWARF they came from.

use std::fmt;
use std::path::{Path, PathBuf};

use gimli::constants::{
    DW_AT_byte_size, DW_AT_encoding, DW_AT_name, DW_AT_type, DW_TAG_class_type, DW_TAG_structure_type,
    DW_TAG_union_type,
};
use gimli::{DwAt, DwAte, DwTag};
use smallvec::SmallVec;

/// Value of a single debug entry attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue
{
    /// Unsigned constant, reference or encoding
    Unsigned(u64),
    /// Signed constant
    Signed(i64),
    /// Raw block or location expression bytes
    Block(Vec<u8>),
    /// String value (names, paths)
    String(String),
}

impl AttrValue
{
    /// The value as an unsigned integer, if it is a non-negative constant
    #[must_use]
    pub fn as_unsigned(&self) -> Option<u64>
    {
        match *self {
            AttrValue::Unsigned(value) => Some(value),
            AttrValue::Signed(value) => u64::try_from(value).ok(),
            _ => None,
        }
    }

    /// The value as a signed integer
    #[must_use]
    pub fn as_signed(&self) -> Option<i64>
    {
        match *self {
            AttrValue::Unsigned(value) => i64::try_from(value).ok(),
            AttrValue::Signed(value) => Some(value),
            _ => None,
        }
    }

    /// The value as expression bytes
    #[must_use]
    pub fn as_block(&self) -> Option<&[u8]>
    {
        match self {
            AttrValue::Block(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// The value as a string
    #[must_use]
    pub fn as_str(&self) -> Option<&str>
    {
        match self {
            AttrValue::String(text) => Some(text),
            _ => None,
        }
    }
}

impl From<u64> for AttrValue
{
    fn from(value: u64) -> Self
    {
        AttrValue::Unsigned(value)
    }
}

impl From<i64> for AttrValue
{
    fn from(value: i64) -> Self
    {
        AttrValue::Signed(value)
    }
}

impl From<DwAte> for AttrValue
{
    fn from(value: DwAte) -> Self
    {
        AttrValue::Unsigned(u64::from(value.0))
    }
}

impl From<&str> for AttrValue
{
    fn from(value: &str) -> Self
    {
        AttrValue::String(value.to_string())
    }
}

impl From<String> for AttrValue
{
    fn from(value: String) -> Self
    {
        AttrValue::String(value)
    }
}

impl From<Vec<u8>> for AttrValue
{
    fn from(value: Vec<u8>) -> Self
    {
        AttrValue::Block(value)
    }
}

impl From<&[u8]> for AttrValue
{
    fn from(value: &[u8]) -> Self
    {
        AttrValue::Block(value.to_vec())
    }
}

/// One node of the debug-info graph
///
/// An entry has a tag (structure, member, variable, base type, ...), a set
/// of attributes and an ordered list of children. `global_ref` identifies
/// the entry across all units: it is the owning unit's base offset plus
/// the entry's offset inside the unit, which is exactly what a type
/// reference resolves to.
///
/// ## Example
///
/// ```rust
/// use gimli::constants::{DW_AT_byte_size, DW_AT_name, DW_TAG_base_type};
/// use symview_core::dwarf::DebugEntry;
///
/// let int = DebugEntry::new(0x20, DW_TAG_base_type)
///     .with_attr(DW_AT_name, "int")
///     .with_attr(DW_AT_byte_size, 4u64);
/// assert_eq!(int.name(), Some("int"));
/// assert_eq!(int.byte_size(), Some(4));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugEntry
{
    global_ref: u64,
    tag: DwTag,
    attributes: SmallVec<[(DwAt, AttrValue); 6]>,
    children: Vec<DebugEntry>,
}

impl DebugEntry
{
    /// Create an entry with no attributes and no children
    pub fn new(global_ref: u64, tag: DwTag) -> Self
    {
        Self {
            global_ref,
            tag,
            attributes: SmallVec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: set an attribute, replacing any previous value
    #[must_use]
    pub fn with_attr(mut self, id: DwAt, value: impl Into<AttrValue>) -> Self
    {
        self.set_attr(id, value.into());
        self
    }

    /// Builder: append a child entry
    #[must_use]
    pub fn with_child(mut self, child: DebugEntry) -> Self
    {
        self.children.push(child);
        self
    }

    /// Set an attribute, replacing any previous value
    pub fn set_attr(&mut self, id: DwAt, value: AttrValue)
    {
        if let Some(slot) = self.attributes.iter_mut().find(|(at, _)| *at == id) {
            slot.1 = value;
        } else {
            self.attributes.push((id, value));
        }
    }

    /// Append a child entry
    pub fn push_child(&mut self, child: DebugEntry)
    {
        self.children.push(child);
    }

    /// Identifier used to resolve type references across units
    pub fn global_ref(&self) -> u64
    {
        self.global_ref
    }

    /// Entry kind
    pub fn tag(&self) -> DwTag
    {
        self.tag
    }

    /// Raw attribute value, if present
    pub fn attr(&self, id: DwAt) -> Option<&AttrValue>
    {
        self.attributes.iter().find(|(at, _)| *at == id).map(|(_, value)| value)
    }

    /// Attribute as an unsigned constant
    pub fn attr_unsigned(&self, id: DwAt) -> Option<u64>
    {
        self.attr(id).and_then(AttrValue::as_unsigned)
    }

    /// All attributes in insertion order
    pub fn attributes(&self) -> impl Iterator<Item = (DwAt, &AttrValue)>
    {
        self.attributes.iter().map(|(id, value)| (*id, value))
    }

    /// Ordered child entries
    pub fn children(&self) -> &[DebugEntry]
    {
        &self.children
    }

    pub fn has_children(&self) -> bool
    {
        !self.children.is_empty()
    }

    /// Member list of an aggregate (structure, class or union)
    ///
    /// Empty for every other kind. The list may end with a null entry;
    /// consumers stop at the first one.
    pub fn members(&self) -> &[DebugEntry]
    {
        if self.is_aggregate() {
            &self.children
        } else {
            &[]
        }
    }

    pub fn name(&self) -> Option<&str>
    {
        self.attr(DW_AT_name).and_then(AttrValue::as_str)
    }

    /// Unit-relative offset of the referenced type, if any
    pub fn type_ref(&self) -> Option<u64>
    {
        self.attr_unsigned(DW_AT_type)
    }

    pub fn byte_size(&self) -> Option<u64>
    {
        self.attr_unsigned(DW_AT_byte_size)
    }

    pub fn encoding(&self) -> Option<DwAte>
    {
        self.attr_unsigned(DW_AT_encoding)
            .and_then(|value| u8::try_from(value).ok())
            .map(DwAte)
    }

    pub fn is_structure(&self) -> bool
    {
        self.tag == DW_TAG_structure_type || self.tag == DW_TAG_class_type
    }

    pub fn is_union(&self) -> bool
    {
        self.tag == DW_TAG_union_type
    }

    fn is_aggregate(&self) -> bool
    {
        self.is_structure() || self.is_union()
    }
}

/// Debug-info scope of one source file
///
/// Owns its entries. Type references inside the unit are relative to
/// `base_offset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit
{
    source_path: PathBuf,
    base_offset: u64,
    entries: Vec<DebugEntry>,
}

impl CompilationUnit
{
    pub fn new(source_path: impl Into<PathBuf>, base_offset: u64, entries: Vec<DebugEntry>) -> Self
    {
        Self {
            source_path: source_path.into(),
            base_offset,
            entries,
        }
    }

    /// Top-level entries of the unit
    pub fn entries(&self) -> &[DebugEntry]
    {
        &self.entries
    }

    /// Offset added to unit-relative type references
    pub fn base_offset(&self) -> u64
    {
        self.base_offset
    }

    pub fn source_file_absolute_path(&self) -> &Path
    {
        &self.source_path
    }
}

impl fmt::Display for CompilationUnit
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{} @ 0x{:x}", self.source_path.display(), self.base_offset)
    }
}
