//! Type-chain resolution.
//!
//! A symbol's declared type is usually reached through several levels of
//! indirection: a variable refers to a typedef, the typedef to a struct or
//! to another typedef, a pointer to its pointee, and so on. The resolver
//! follows `DW_AT_type` references one level at a time until it reaches an
//! entry with no further reference (the "primitive") and returns the whole
//! path.
//!
//! ```text
//! typedef struct point_t { ... } point;   point origin;
//!   chain = [point_t, point, origin]
//!
//! typedef unsigned long ULONG;            ULONG ticks;
//!   chain = [unsigned long, ULONG, ticks]
//! ```
//!
//! Resolution depth is capped. A self-referential or otherwise cyclic type
//! graph stops at the cap instead of looping; the chain then ends at
//! whatever level was reached.

use gimli::constants::{DW_AT_location, DW_OP_addr};
use smallvec::SmallVec;
use tracing::{trace, warn};

use super::index::{ChainLink, EntryIndex};
use super::DebugEntry;
use crate::error::{SymviewError, SymviewResult};
use crate::types::{Address, TargetProfile};

/// Default cap on type-reference hops
pub const DEFAULT_TYPE_CHAIN_DEPTH: usize = 15;

/// Ordered resolution path from the primitive type up to the original entry
///
/// Never empty: `links()[0]` is the most primitive type that was reached
/// and the last link is the entry the chain was built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeChain<'a>
{
    links: SmallVec<[ChainLink<'a>; 4]>,
}

impl<'a> TypeChain<'a>
{
    /// Most primitive type reached
    pub fn primitive(&self) -> ChainLink<'a>
    {
        self.links[0]
    }

    /// Entry the chain was built for
    pub fn origin(&self) -> ChainLink<'a>
    {
        self.links[self.links.len() - 1]
    }

    pub fn links(&self) -> &[ChainLink<'a>]
    {
        &self.links
    }

    pub fn len(&self) -> usize
    {
        self.links.len()
    }

    /// Always false; present for API symmetry with `len`
    pub fn is_empty(&self) -> bool
    {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ChainLink<'a>> + '_
    {
        self.links.iter().copied()
    }
}

impl<'a> EntryIndex<'a>
{
    /// Resolve one level of `DW_AT_type`
    ///
    /// An entry without a type reference is already primitive and is
    /// returned unchanged. Otherwise the unit base offset is added to the
    /// reference and the result looked up in the index.
    ///
    /// ## Errors
    ///
    /// `TypeNotFound` when the referenced entry is not indexed.
    pub fn resolve_type(&self, link: ChainLink<'a>) -> SymviewResult<ChainLink<'a>>
    {
        let Some(type_ref) = link.entry.type_ref() else {
            return Ok(link);
        };
        let global_ref = link.unit.base_offset().wrapping_add(type_ref);
        self.find_by_global_ref(global_ref)
            .ok_or(SymviewError::TypeNotFound(global_ref))
    }

    /// Full type chain of an entry, following at most `max_depth` references
    ///
    /// A chain of `d <= max_depth` references resolves in exactly `d` steps
    /// and has `d + 1` links.
    ///
    /// ## Errors
    ///
    /// `TypeNotFound` when any level of the chain references a missing entry.
    pub fn type_chain(&self, link: ChainLink<'a>, max_depth: usize) -> SymviewResult<TypeChain<'a>>
    {
        let mut links: SmallVec<[ChainLink<'a>; 4]> = SmallVec::new();
        links.push(link);

        let mut current = link;
        let mut remaining = max_depth;
        while current.entry.type_ref().is_some() {
            if remaining == 0 {
                trace!(
                    name = link.entry.name().unwrap_or("<anonymous>"),
                    max_depth,
                    "type chain depth limit reached"
                );
                break;
            }
            current = self.resolve_type(current)?;
            links.push(current);
            remaining -= 1;
        }

        links.reverse();
        Ok(TypeChain { links })
    }
}

/// Static address an entry is declared at, or zero
///
/// Only a location expression that starts with `DW_OP_addr` describes a
/// static address; the address word that follows is decoded with the
/// target profile. Any other expression (a register or stack location,
/// for instance) yields zero with a diagnostic.
pub fn declaration_address(entry: &DebugEntry, profile: &TargetProfile) -> Address
{
    let Some(location) = entry.attr(DW_AT_location) else {
        return Address::ZERO;
    };
    let Some(expression) = location.as_block() else {
        // Location list offsets describe non-static storage.
        trace!(name = entry.name().unwrap_or("<anonymous>"), "entry location is a list, not an address");
        return Address::ZERO;
    };

    match expression.split_first() {
        Some((&opcode, operand)) if opcode == DW_OP_addr.0 => match profile.decode_address(operand) {
            Some(address) => Address::new(address),
            None => {
                warn!(
                    name = entry.name().unwrap_or("<anonymous>"),
                    len = expression.len(),
                    "address location expression is truncated"
                );
                Address::ZERO
            }
        },
        _ => {
            warn!(
                name = entry.name().unwrap_or("<anonymous>"),
                expression = ?expression,
                "entry address is malformed"
            );
            Address::ZERO
        }
    }
}

