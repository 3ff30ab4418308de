//! Structure member enumeration.
//!
//! Turns an entry that resolves to a structure into one [`MemberDescriptor`]
//! per member: where the member lives inside its parent, how wide it is,
//! how it is encoded, and whether it is an array, a pointer or a bitfield.
//! Nested structures are expanded recursively up to a depth limit.
//!
//! Descriptors are computed on demand and never cached. Callers that need
//! the same layout repeatedly should keep the returned vector.

use std::fmt::Write as _;

use gimli::constants::{
    DW_AT_bit_offset, DW_AT_bit_size, DW_AT_count, DW_AT_data_bit_offset, DW_AT_data_member_location,
    DW_AT_lower_bound, DW_AT_upper_bound, DW_OP_plus_uconst, DW_TAG_array_type, DW_TAG_member, DW_TAG_null, DW_TAG_pointer_type,
    DW_TAG_subrange_type,
};
use gimli::{DwAte, EndianSlice, Endianity, LittleEndian, Reader};
use tracing::{debug, warn};

use super::index::{ChainLink, EntryIndex};
use super::resolver::{TypeChain, DEFAULT_TYPE_CHAIN_DEPTH};
use super::{AttrValue, DebugEntry};
use crate::error::SymviewResult;
use crate::types::TargetProfile;

/// Default nesting limit for member expansion
pub const DEFAULT_MEMBER_DEPTH: usize = 3;

/// Layout of one structure member (or of a whole symbol)
///
/// `is_array` and `is_pointer` may each combine with `is_struct` or
/// `is_union` (an array of structures, a pointer to a union).
/// `is_bitfield` is independent of all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberDescriptor
{
    /// Member name; empty for anonymous members
    pub name: String,
    /// Name of the primitive type the member resolves to, if it has one
    pub type_name: Option<String>,
    /// Byte offset inside the parent
    pub offset: u64,
    /// Byte size of the primitive type (the element size for arrays)
    pub size: u64,
    /// Base type encoding of the primitive type
    pub encoding: Option<DwAte>,
    /// Whether the primitive type has child entries
    pub has_children: bool,
    pub is_struct: bool,
    pub is_union: bool,
    pub is_array: bool,
    /// Total element count (product of every dimension)
    pub array_length: u64,
    pub is_pointer: bool,
    /// Byte size of the pointer itself
    pub pointer_size: u64,
    pub is_bitfield: bool,
    pub bit_offset: u64,
    pub bit_count: u64,
    /// Nested members; only populated while depth remains
    pub children: Vec<MemberDescriptor>,
}

impl MemberDescriptor
{
    /// Name used when the descriptor is printed as a pointer target
    ///
    /// A pointer with no pointee type is `void *`.
    pub fn pointee_name(&self) -> &str
    {
        self.type_name.as_deref().unwrap_or("void")
    }

    /// Look up a direct child by name
    pub fn child(&self, name: &str) -> Option<&MemberDescriptor>
    {
        self.children.iter().find(|child| child.name == name)
    }
}

/// Computes member descriptors from the entry index
///
/// ## Example
///
/// ```rust,ignore
/// let enumerator = MemberEnumerator::new(&index);
/// let symbol = index.find_by_name_and_address("sensor", address).unwrap();
/// for member in enumerator.members_of(symbol, DEFAULT_MEMBER_DEPTH)? {
///     println!("{} @ +{}", member.name, member.offset);
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MemberEnumerator<'i, 'a>
{
    index: &'i EntryIndex<'a>,
    type_depth: usize,
}

impl<'i, 'a> MemberEnumerator<'i, 'a>
{
    pub fn new(index: &'i EntryIndex<'a>) -> Self
    {
        Self {
            index,
            type_depth: DEFAULT_TYPE_CHAIN_DEPTH,
        }
    }

    /// Override the type-reference depth cap used for every chain
    #[must_use]
    pub fn with_type_depth(mut self, type_depth: usize) -> Self
    {
        self.type_depth = type_depth;
        self
    }

    /// Descriptors for every member of the structure `link` resolves to
    ///
    /// Returns an empty list when the resolved type has no members. The
    /// member list ends at the first null entry. A member whose type cannot
    /// be resolved is left out; the remaining members are still reported.
    ///
    /// ## Errors
    ///
    /// `TypeNotFound` when the type chain of `link` itself is broken.
    pub fn members_of(&self, link: ChainLink<'a>, max_depth: usize) -> SymviewResult<Vec<MemberDescriptor>>
    {
        let chain = self.index.type_chain(link, self.type_depth)?;
        let aggregate = chain.primitive();

        let mut members = Vec::new();
        for member in aggregate.entry.members() {
            if member.tag() == DW_TAG_null {
                break;
            }
            if member.tag() != DW_TAG_member {
                continue;
            }
            match self.describe(ChainLink::new(member, aggregate.unit), max_depth) {
                Ok(descriptor) => members.push(descriptor),
                Err(err) => {
                    warn!(
                        member = member.name().unwrap_or("<anonymous>"),
                        parent = aggregate.entry.name().unwrap_or("<anonymous>"),
                        error = %err,
                        "skipping member with unresolvable type"
                    );
                }
            }
        }

        debug!(
            parent = aggregate.entry.name().unwrap_or("<anonymous>"),
            count = members.len(),
            max_depth,
            "enumerated members"
        );
        Ok(members)
    }

    /// Descriptor for a single entry (a member or a whole symbol)
    ///
    /// ## Errors
    ///
    /// `TypeNotFound` when the entry's type chain is broken.
    pub fn describe(&self, link: ChainLink<'a>, max_depth: usize) -> SymviewResult<MemberDescriptor>
    {
        let chain = self.index.type_chain(link, self.type_depth)?;
        let base = chain.primitive();

        let children = if max_depth > 0 && base.entry.has_children() && base.entry.is_structure() {
            self.members_of(base, max_depth - 1)?
        } else {
            Vec::new()
        };

        let size = base.entry.byte_size().unwrap_or(0);
        let mut offset = member_offset(link.entry);
        let (mut is_bitfield, mut bit_offset, bit_count) = bitfield_from_chain(&chain);
        if let Some(layout) = data_bit_layout(link.entry, size, self.index.profile()) {
            offset = offset.saturating_add(layout.byte_offset);
            bit_offset = layout.bit_offset;
            is_bitfield = true;
        }
        let (is_array, array_length) = array_from_chain(&chain);
        let (is_pointer, pointer_size) = pointer_from_chain(&chain, u64::from(self.index.profile().pointer_width()));

        Ok(MemberDescriptor {
            name: link.entry.name().unwrap_or_default().to_string(),
            type_name: pointee_type_name(base.entry),
            offset,
            size,
            encoding: base.entry.encoding(),
            has_children: base.entry.has_children(),
            is_struct: base.entry.is_structure(),
            is_union: base.entry.is_union(),
            is_array,
            array_length,
            is_pointer,
            pointer_size,
            is_bitfield,
            bit_offset,
            bit_count,
            children,
        })
    }
}

fn pointee_type_name(primitive: &DebugEntry) -> Option<String>
{
    // A pointer that is itself the primitive points at nothing typed.
    if primitive.tag() == DW_TAG_pointer_type {
        return None;
    }
    primitive.name().map(str::to_string)
}

/// Byte offset of a member inside its parent
///
/// DWARF 2 producers emit `DW_OP_plus_uconst <offset>` as an expression
/// block; later producers emit a plain constant. A member that is not a
/// bitfield may instead be placed by `DW_AT_data_bit_offset`. Absent means
/// offset zero (union members).
pub(crate) fn member_offset(entry: &DebugEntry) -> u64
{
    match entry.attr(DW_AT_data_member_location) {
        None if entry.attr(DW_AT_bit_size).is_none() => {
            entry.attr_unsigned(DW_AT_data_bit_offset).map_or(0, |bits| bits / 8)
        }
        None => 0,
        Some(AttrValue::Block(expression)) => decode_offset_expression(entry, expression),
        Some(value) => value.as_unsigned().unwrap_or(0),
    }
}

fn decode_offset_expression(entry: &DebugEntry, expression: &[u8]) -> u64
{
    let Some(&operand) = expression.get(1) else {
        warn!(
            member = entry.name().unwrap_or("<anonymous>"),
            expression = ?expression,
            "member offset expression is too short"
        );
        return 0;
    };

    if expression[0] == DW_OP_plus_uconst.0 {
        let mut reader = EndianSlice::new(&expression[1..], LittleEndian);
        if let Ok(offset) = reader.read_uleb128() {
            return offset;
        }
    }
    u64::from(operand)
}

/// Bitfield metadata from the link just above the primitive
///
/// Producers attach `DW_AT_bit_offset`/`DW_AT_bit_size` to the member entry
/// itself, which sits directly above the primitive for the common
/// `member -> base type` chain. When typedefs sit in between, that link
/// carries nothing and the member entry (the origin) is consulted instead.
pub(crate) fn bitfield_from_chain(chain: &TypeChain<'_>) -> (bool, u64, u64)
{
    if chain.len() <= 1 {
        return (false, 0, 0);
    }

    let read = |entry: &DebugEntry| (entry.attr_unsigned(DW_AT_bit_offset), entry.attr_unsigned(DW_AT_bit_size));
    let (mut offset, mut count) = read(chain.links()[1].entry);
    if offset.is_none() && count.is_none() && chain.len() > 2 {
        (offset, count) = read(chain.origin().entry);
    }

    let offset = offset.unwrap_or(0);
    let count = count.unwrap_or(0);
    (offset != 0 || count != 0, offset, count)
}

/// Storage position of a bitfield given by `DW_AT_data_bit_offset`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DataBitLayout
{
    /// Bytes to add to the member offset to reach the storage unit
    pub byte_offset: u64,
    /// `DW_AT_bit_offset`-style position, counted from the storage MSB
    pub bit_offset: u64,
}

/// Convert a DWARF 4 `DW_AT_data_bit_offset` bitfield to storage terms
///
/// The attribute counts bits from the start of the containing object, so
/// it may point past the first storage unit of the member's type. Whole
/// units move into the byte offset; the rest becomes an MSB-relative bit
/// position, which on a big-endian target is the remainder itself.
/// Entries that also carry `DW_AT_bit_offset` keep the older form.
pub(crate) fn data_bit_layout(entry: &DebugEntry, storage_size: u64, profile: TargetProfile) -> Option<DataBitLayout>
{
    if entry.attr(DW_AT_bit_offset).is_some() {
        return None;
    }
    let data_bit_offset = entry.attr_unsigned(DW_AT_data_bit_offset)?;
    let bit_count = entry.attr_unsigned(DW_AT_bit_size)?;

    let storage_bits = storage_size.checked_mul(8).filter(|bits| *bits > 0)?;
    let within = data_bit_offset % storage_bits;
    if bit_count > storage_bits - within {
        warn!(
            member = entry.name().unwrap_or("<anonymous>"),
            data_bit_offset,
            bit_count,
            storage_size,
            "bitfield straddles its storage unit"
        );
        return None;
    }

    let bit_offset = if profile.endian().is_big_endian() {
        within
    } else {
        storage_bits - within - bit_count
    };
    Some(DataBitLayout {
        byte_offset: data_bit_offset / storage_bits * storage_size,
        bit_offset,
    })
}

/// Array flag and total element count
///
/// When the chain holds several array links, the one closest to the
/// origin wins.
pub(crate) fn array_from_chain(chain: &TypeChain<'_>) -> (bool, u64)
{
    chain
        .iter()
        .filter(|link| link.entry.tag() == DW_TAG_array_type)
        .last()
        .map_or((false, 0), |link| (true, array_length(link.entry)))
}

/// Element count of an array entry
///
/// Each `DW_TAG_subrange_type` child is one dimension. A dimension uses
/// `DW_AT_count` when present, otherwise `upper - lower + 1` with the lower
/// bound defaulting to zero, otherwise zero. A count that does not fit in
/// 64 bits is malformed and reads as zero.
pub fn array_length(entry: &DebugEntry) -> u64
{
    let mut dimensions = entry
        .children()
        .iter()
        .filter(|child| child.tag() == DW_TAG_subrange_type)
        .peekable();
    if dimensions.peek().is_none() {
        return 0;
    }
    let length = dimensions.try_fold(1u64, |total, subrange| total.checked_mul(subrange_length(subrange)));
    length.unwrap_or_else(|| {
        warn!(array = entry.global_ref(), "array element count overflows, treating as empty");
        0
    })
}

fn subrange_length(subrange: &DebugEntry) -> u64
{
    if let Some(count) = subrange.attr_unsigned(DW_AT_count) {
        return count;
    }
    let Some(upper) = subrange.attr(DW_AT_upper_bound).and_then(AttrValue::as_signed) else {
        return 0;
    };
    let lower = subrange
        .attr(DW_AT_lower_bound)
        .and_then(AttrValue::as_signed)
        .unwrap_or(0);
    let length = upper
        .checked_sub(lower)
        .and_then(|span| span.checked_add(1))
        .and_then(|length| u64::try_from(length).ok());
    length.unwrap_or_else(|| {
        warn!(subrange = subrange.global_ref(), upper, lower, "unusable subrange bounds");
        0
    })
}

/// Pointer flag and pointer width
///
/// A pointer entry without `DW_AT_byte_size` uses the target word size.
pub(crate) fn pointer_from_chain(chain: &TypeChain<'_>, default_width: u64) -> (bool, u64)
{
    chain
        .iter()
        .filter(|link| link.entry.tag() == DW_TAG_pointer_type)
        .last()
        .map_or((false, 0), |link| (true, link.entry.byte_size().unwrap_or(default_width)))
}

/// Printable layout table
///
/// One row per member with offset, size, array length, bit range and
/// whether the member has nested members. Nested members follow their
/// parent, indented by four columns under a header of their own.
///
/// ```text
/// NAME                 OFF.   SIZE   ARRAY  BITS   CHLD
/// mode                 0x0000 0x0001 N/A    N/A    false
/// samples              0x0004 0x0002 8      N/A    false
/// ```
pub fn format_member_table(members: &[MemberDescriptor]) -> String
{
    let mut out = String::new();
    write_member_table(&mut out, members, 0);
    out
}

fn write_member_table(out: &mut String, members: &[MemberDescriptor], indent: usize)
{
    let header = format!(
        "{:indent$}{:<20} {:<6} {:<6} {:<6} {:<6} {:<6}",
        "", "NAME", "OFF.", "SIZE", "ARRAY", "BITS", "CHLD"
    );
    let _ = writeln!(out, "{}", header.trim_end());

    for member in members {
        let name: String = member.name.chars().take(20).collect();
        let array = if member.is_array {
            member.array_length.to_string()
        } else {
            "N/A".to_string()
        };
        let bits = if member.is_bitfield {
            format!("{:02}-{:02}", member.bit_offset, member.bit_offset.saturating_add(member.bit_count))
        } else {
            "N/A".to_string()
        };
        let row = format!(
            "{:indent$}{name:<20} 0x{:04X} 0x{:04X} {array:<6} {bits:<6} {}",
            "", member.offset, member.size, member.has_children
        );
        let _ = writeln!(out, "{}", row.trim_end());

        if member.has_children && !member.children.is_empty() {
            write_member_table(out, &member.children, indent + 4);
        }
    }
}

#[cfg(test)]
mod tests
{
    use gimli::constants::DW_TAG_base_type;

    use super::*;

    #[test]
    fn test_offset_from_plus_uconst_block()
    {
        let member = DebugEntry::new(0x10, DW_TAG_member).with_attr(DW_AT_data_member_location, vec![0x23u8, 0x04]);
        assert_eq!(member_offset(&member), 4);
    }

    #[test]
    fn test_offset_wide_uleb()
    {
        let member =
            DebugEntry::new(0x10, DW_TAG_member).with_attr(DW_AT_data_member_location, vec![0x23u8, 0x80, 0x02]);
        assert_eq!(member_offset(&member), 256);
    }

    #[test]
    fn test_offset_short_expression_is_zero()
    {
        let member = DebugEntry::new(0x10, DW_TAG_member).with_attr(DW_AT_data_member_location, vec![0x23u8]);
        assert_eq!(member_offset(&member), 0);
    }

    #[test]
    fn test_offset_constant_form()
    {
        let member = DebugEntry::new(0x10, DW_TAG_member).with_attr(DW_AT_data_member_location, 12u64);
        assert_eq!(member_offset(&member), 12);

        let union_member = DebugEntry::new(0x18, DW_TAG_member);
        assert_eq!(member_offset(&union_member), 0);
    }

    #[test]
    fn test_array_length_rules()
    {
        let bounded = DebugEntry::new(0x30, DW_TAG_array_type)
            .with_child(DebugEntry::new(0x38, DW_TAG_subrange_type).with_attr(DW_AT_upper_bound, 9u64));
        assert_eq!(array_length(&bounded), 10);

        let counted = DebugEntry::new(0x30, DW_TAG_array_type).with_child(
            DebugEntry::new(0x38, DW_TAG_subrange_type)
                .with_attr(DW_AT_count, 5u64)
                .with_attr(DW_AT_upper_bound, 99u64),
        );
        assert_eq!(array_length(&counted), 5);

        let shifted = DebugEntry::new(0x30, DW_TAG_array_type).with_child(
            DebugEntry::new(0x38, DW_TAG_subrange_type)
                .with_attr(DW_AT_lower_bound, 1u64)
                .with_attr(DW_AT_upper_bound, 4u64),
        );
        assert_eq!(array_length(&shifted), 4);

        let unbounded =
            DebugEntry::new(0x30, DW_TAG_array_type).with_child(DebugEntry::new(0x38, DW_TAG_subrange_type));
        assert_eq!(array_length(&unbounded), 0);

        let not_an_array = DebugEntry::new(0x30, DW_TAG_base_type);
        assert_eq!(array_length(&not_an_array), 0);
    }

    #[test]
    fn test_array_length_two_dimensions()
    {
        let matrix = DebugEntry::new(0x30, DW_TAG_array_type)
            .with_child(DebugEntry::new(0x38, DW_TAG_subrange_type).with_attr(DW_AT_upper_bound, 2u64))
            .with_child(DebugEntry::new(0x3c, DW_TAG_subrange_type).with_attr(DW_AT_count, 4u64));
        assert_eq!(array_length(&matrix), 12);
    }

    #[test]
    fn test_array_length_extreme_bounds()
    {
        let huge = DebugEntry::new(0x30, DW_TAG_array_type)
            .with_child(DebugEntry::new(0x38, DW_TAG_subrange_type).with_attr(DW_AT_upper_bound, i64::MAX));
        assert_eq!(array_length(&huge), 0);

        let inverted = DebugEntry::new(0x30, DW_TAG_array_type).with_child(
            DebugEntry::new(0x38, DW_TAG_subrange_type)
                .with_attr(DW_AT_lower_bound, i64::MAX)
                .with_attr(DW_AT_upper_bound, i64::MIN),
        );
        assert_eq!(array_length(&inverted), 0);

        let product = DebugEntry::new(0x30, DW_TAG_array_type)
            .with_child(DebugEntry::new(0x38, DW_TAG_subrange_type).with_attr(DW_AT_count, u64::MAX / 2))
            .with_child(DebugEntry::new(0x3c, DW_TAG_subrange_type).with_attr(DW_AT_count, 4u64));
        assert_eq!(array_length(&product), 0);
    }

    #[test]
    fn test_data_bit_offset_little_endian()
    {
        let level = DebugEntry::new(0x40, DW_TAG_member)
            .with_attr(DW_AT_bit_size, 5u64)
            .with_attr(DW_AT_data_bit_offset, 3u64);
        assert_eq!(
            data_bit_layout(&level, 4, TargetProfile::PIC32),
            Some(DataBitLayout {
                byte_offset: 0,
                bit_offset: 24
            })
        );

        // second storage unit of an unsigned int
        let high = DebugEntry::new(0x48, DW_TAG_member)
            .with_attr(DW_AT_bit_size, 4u64)
            .with_attr(DW_AT_data_bit_offset, 36u64);
        assert_eq!(
            data_bit_layout(&high, 4, TargetProfile::PIC32),
            Some(DataBitLayout {
                byte_offset: 4,
                bit_offset: 24
            })
        );
    }

    #[test]
    fn test_data_bit_offset_big_endian()
    {
        let profile = TargetProfile::new(4, gimli::RunTimeEndian::Big);
        let level = DebugEntry::new(0x40, DW_TAG_member)
            .with_attr(DW_AT_bit_size, 5u64)
            .with_attr(DW_AT_data_bit_offset, 3u64);
        assert_eq!(
            data_bit_layout(&level, 4, profile),
            Some(DataBitLayout {
                byte_offset: 0,
                bit_offset: 3
            })
        );
    }

    #[test]
    fn test_data_bit_offset_ignored_or_rejected()
    {
        let legacy = DebugEntry::new(0x40, DW_TAG_member)
            .with_attr(DW_AT_bit_size, 5u64)
            .with_attr(DW_AT_bit_offset, 24u64)
            .with_attr(DW_AT_data_bit_offset, 3u64);
        assert_eq!(data_bit_layout(&legacy, 4, TargetProfile::PIC32), None);

        let straddling = DebugEntry::new(0x48, DW_TAG_member)
            .with_attr(DW_AT_bit_size, 6u64)
            .with_attr(DW_AT_data_bit_offset, 30u64);
        assert_eq!(data_bit_layout(&straddling, 4, TargetProfile::PIC32), None);

        let no_storage = DebugEntry::new(0x50, DW_TAG_member)
            .with_attr(DW_AT_bit_size, 3u64)
            .with_attr(DW_AT_data_bit_offset, 0u64);
        assert_eq!(data_bit_layout(&no_storage, 0, TargetProfile::PIC32), None);
    }

    #[test]
    fn test_offset_from_data_bit_offset()
    {
        let plain = DebugEntry::new(0x40, DW_TAG_member).with_attr(DW_AT_data_bit_offset, 64u64);
        assert_eq!(member_offset(&plain), 8);

        let bitfield = DebugEntry::new(0x48, DW_TAG_member)
            .with_attr(DW_AT_bit_size, 3u64)
            .with_attr(DW_AT_data_bit_offset, 64u64);
        assert_eq!(member_offset(&bitfield), 0);
    }

    #[test]
    fn test_member_table_layout()
    {
        let members = vec![
            MemberDescriptor {
                name: "mode".to_string(),
                offset: 0,
                size: 1,
                ..MemberDescriptor::default()
            },
            MemberDescriptor {
                name: "flags".to_string(),
                offset: 4,
                size: 4,
                is_bitfield: true,
                bit_offset: 5,
                bit_count: 3,
                ..MemberDescriptor::default()
            },
            MemberDescriptor {
                name: "samples".to_string(),
                offset: 8,
                size: 2,
                is_array: true,
                array_length: 8,
                ..MemberDescriptor::default()
            },
        ];

        let table = format_member_table(&members);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "NAME                 OFF.   SIZE   ARRAY  BITS   CHLD");
        assert_eq!(lines[1], "mode                 0x0000 0x0001 N/A    N/A    false");
        assert_eq!(lines[2], "flags                0x0004 0x0004 N/A    05-08  false");
        assert_eq!(lines[3], "samples              0x0008 0x0002 8      N/A    false");
    }
}
