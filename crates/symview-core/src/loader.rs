//! # Debug Info Loader
//!
//! Turns the DWARF sections of an object file into the owned
//! [`CompilationUnit`] graph the index works on.
//!
//! ## What is kept
//!
//! Only the attributes the resolver and the member enumerator read are
//! converted; everything else is dropped while walking the tree:
//!
//! | Attribute                  | Stored as                                 |
//! |----------------------------|-------------------------------------------|
//! | `DW_AT_name`               | string                                    |
//! | `DW_AT_type`               | unit-relative offset                      |
//! | `DW_AT_byte_size`          | unsigned                                  |
//! | `DW_AT_encoding`           | unsigned (`DW_ATE_*`)                     |
//! | `DW_AT_bit_offset`/`size`  | unsigned                                  |
//! | `DW_AT_data_bit_offset`    | unsigned                                  |
//! | `DW_AT_data_member_location` | expression bytes or constant            |
//! | `DW_AT_location`           | expression bytes                          |
//! | `DW_AT_upper_bound`/`lower_bound`/`count` | constant                   |
//!
//! A global reference is the entry's offset in `.debug_info`, so a
//! `DW_AT_type` value plus the unit's base offset finds the referenced
//! entry in the index.

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

use gimli::constants::{
    DW_AT_bit_offset, DW_AT_bit_size, DW_AT_byte_size, DW_AT_comp_dir, DW_AT_count, DW_AT_data_bit_offset,
    DW_AT_data_member_location, DW_AT_encoding, DW_AT_location, DW_AT_lower_bound, DW_AT_name, DW_AT_type,
    DW_AT_upper_bound,
};
use gimli::{
    AttributeValue, DebuggingInformationEntry, DwAt, Dwarf, EndianArcSlice, EntriesTreeNode, Reader, RunTimeEndian,
    SectionId, Unit,
};
use object::{Object, ObjectSection};
use tracing::{debug, trace, warn};

use crate::dwarf::{AttrValue, CompilationUnit, DebugEntry};
use crate::error::SymviewResult;
use crate::types::TargetProfile;

type OwnedReader = EndianArcSlice<RunTimeEndian>;
type OwnedDwarf = Dwarf<OwnedReader>;

/// Attributes copied as constants
const CONSTANT_ATTRIBUTES: [DwAt; 7] = [
    DW_AT_byte_size,
    DW_AT_bit_offset,
    DW_AT_bit_size,
    DW_AT_data_bit_offset,
    DW_AT_upper_bound,
    DW_AT_lower_bound,
    DW_AT_count,
];

/// Attributes copied as expression bytes (or a constant, for old producers)
const EXPRESSION_ATTRIBUTES: [DwAt; 2] = [DW_AT_data_member_location, DW_AT_location];

/// Parse an object file and convert its debug info
///
/// Returns the compilation units in `.debug_info` order together with the
/// target profile (pointer width and byte order) of the file.
///
/// ## Errors
///
/// - `Object` when the bytes are not a supported object file
/// - `Dwarf` when the debug sections cannot be parsed
pub fn load_debug_info(bytes: &[u8]) -> SymviewResult<(Vec<CompilationUnit>, TargetProfile)>
{
    let file = object::File::parse(bytes)?;
    let profile = TargetProfile::from_object(&file);
    let units = load_units(&file, profile)?;
    Ok((units, profile))
}

/// Convert the debug info of an already parsed object file
///
/// ## Errors
///
/// `Dwarf` when the debug sections cannot be parsed.
pub fn load_units<'data>(file: &object::File<'data>, profile: TargetProfile) -> SymviewResult<Vec<CompilationUnit>>
{
    let dwarf = load_dwarf(file, profile)?;
    let mut units = Vec::new();
    let mut headers = dwarf.units();
    while let Some(header) = headers.next()? {
        let Some(base_offset) = header.offset().as_debug_info_offset() else {
            continue;
        };
        let base_offset = base_offset.0 as u64;
        let unit = dwarf.unit(header)?;
        units.push(convert_unit(&dwarf, &unit, base_offset)?);
    }

    debug!(units = units.len(), %profile, "debug info loaded");
    Ok(units)
}

fn load_dwarf<'data>(file: &object::File<'data>, profile: TargetProfile) -> SymviewResult<OwnedDwarf>
{
    let endian = profile.endian();
    let dwarf = Dwarf::load(|id: SectionId| -> SymviewResult<OwnedReader> {
        let data: Arc<[u8]> = match file.section_by_name(id.name()) {
            Some(section) => match section.uncompressed_data()? {
                Cow::Borrowed(bytes) => Arc::from(bytes),
                Cow::Owned(vec) => vec.into(),
            },
            None => Arc::from(Vec::new()),
        };
        Ok(EndianArcSlice::new(data, endian))
    })?;
    Ok(dwarf)
}

fn convert_unit(dwarf: &OwnedDwarf, unit: &Unit<OwnedReader>, base_offset: u64) -> SymviewResult<CompilationUnit>
{
    let mut tree = unit.entries_tree(None)?;
    let root = tree.root()?;

    let source_path = unit_source_path(dwarf, unit, root.entry())?;
    trace!(path = %source_path.display(), base_offset, "converting compilation unit");

    let mut entries = Vec::new();
    let mut children = root.children();
    while let Some(child) = children.next()? {
        entries.push(convert_node(dwarf, unit, child)?);
    }

    Ok(CompilationUnit::new(source_path, base_offset, entries))
}

fn convert_node(
    dwarf: &OwnedDwarf,
    unit: &Unit<OwnedReader>,
    node: EntriesTreeNode<'_, '_, '_, OwnedReader>,
) -> SymviewResult<DebugEntry>
{
    let mut entry = convert_entry(dwarf, unit, node.entry())?;

    let mut children = node.children();
    while let Some(child) = children.next()? {
        entry.push_child(convert_node(dwarf, unit, child)?);
    }
    Ok(entry)
}

fn convert_entry(
    dwarf: &OwnedDwarf,
    unit: &Unit<OwnedReader>,
    die: &DebuggingInformationEntry<'_, '_, OwnedReader>,
) -> SymviewResult<DebugEntry>
{
    let global_ref = die
        .offset()
        .to_debug_info_offset(&unit.header)
        .map_or(0, |offset| offset.0 as u64);
    let mut entry = DebugEntry::new(global_ref, die.tag());

    if let Some(name) = string_attr(dwarf, unit, die, DW_AT_name)? {
        entry.set_attr(DW_AT_name, AttrValue::String(name));
    }

    if let Some(attr) = die.attr(DW_AT_type)? {
        match type_offset(attr.value(), unit) {
            Some(offset) => entry.set_attr(DW_AT_type, AttrValue::Unsigned(offset)),
            None => warn!(global_ref, form = ?attr.value(), "unsupported type reference form"),
        }
    }

    if let Some(attr) = die.attr(DW_AT_encoding)? {
        if let AttributeValue::Encoding(encoding) = attr.value() {
            entry.set_attr(DW_AT_encoding, AttrValue::from(encoding));
        }
    }

    for id in CONSTANT_ATTRIBUTES {
        let Some(attr) = die.attr(id)? else {
            continue;
        };
        if let Some(value) = attr.udata_value() {
            entry.set_attr(id, AttrValue::Unsigned(value));
        } else if let Some(value) = attr.sdata_value() {
            entry.set_attr(id, AttrValue::Signed(value));
        }
    }

    for id in EXPRESSION_ATTRIBUTES {
        let Some(attr) = die.attr(id)? else {
            continue;
        };
        let value = match attr.value() {
            AttributeValue::Exprloc(expression) => Some(AttrValue::Block(expression.0.to_slice()?.into_owned())),
            AttributeValue::Block(block) => Some(AttrValue::Block(block.to_slice()?.into_owned())),
            other => other.udata_value().map(AttrValue::Unsigned),
        };
        // location lists (variables that move between registers) carry no static address
        if let Some(value) = value {
            entry.set_attr(id, value);
        }
    }

    Ok(entry)
}

/// Unit-relative offset of a type reference
///
/// References into another unit are rebased onto this unit so that
/// `base_offset + offset` still lands on the referenced entry. A target in
/// an earlier unit wraps below zero; the resolver adds with wrapping, so
/// the sum is exact again.
fn type_offset(value: AttributeValue<OwnedReader>, unit: &Unit<OwnedReader>) -> Option<u64>
{
    match value {
        AttributeValue::UnitRef(offset) => Some(offset.0 as u64),
        AttributeValue::DebugInfoRef(offset) => {
            let base = unit.header.offset().as_debug_info_offset()?.0;
            Some(rebase_reference(offset.0 as u64, base as u64))
        }
        _ => None,
    }
}

fn rebase_reference(target: u64, unit_base: u64) -> u64
{
    target.wrapping_sub(unit_base)
}

fn string_attr(
    dwarf: &OwnedDwarf,
    unit: &Unit<OwnedReader>,
    die: &DebuggingInformationEntry<'_, '_, OwnedReader>,
    id: DwAt,
) -> SymviewResult<Option<String>>
{
    let Some(attr) = die.attr(id)? else {
        return Ok(None);
    };
    let text = dwarf.attr_string(unit, attr.value())?;
    Ok(Some(text.to_string_lossy()?.into_owned()))
}

fn unit_source_path(
    dwarf: &OwnedDwarf,
    unit: &Unit<OwnedReader>,
    root: &DebuggingInformationEntry<'_, '_, OwnedReader>,
) -> SymviewResult<PathBuf>
{
    let name = string_attr(dwarf, unit, root, DW_AT_name)?.unwrap_or_default();
    let path = match string_attr(dwarf, unit, root, DW_AT_comp_dir)? {
        Some(dir) => PathBuf::from(dir).join(name),
        None => PathBuf::from(name),
    };
    Ok(path)
}
