//! Flattened, queryable view of every debug entry.

use std::collections::HashMap;

use tracing::debug;

use super::resolver::declaration_address;
use super::{CompilationUnit, DebugEntry};
use crate::types::{Address, TargetProfile};

/// An entry paired with the unit that declares it
///
/// The unit is needed to turn the entry's unit-relative type reference
/// into a global one.
#[derive(Debug, Clone, Copy)]
pub struct ChainLink<'a>
{
    pub entry: &'a DebugEntry,
    pub unit: &'a CompilationUnit,
}

impl<'a> ChainLink<'a>
{
    pub fn new(entry: &'a DebugEntry, unit: &'a CompilationUnit) -> Self
    {
        Self { entry, unit }
    }
}

impl PartialEq for ChainLink<'_>
{
    fn eq(&self, other: &Self) -> bool
    {
        std::ptr::eq(self.entry, other.entry) && std::ptr::eq(self.unit, other.unit)
    }
}

impl Eq for ChainLink<'_> {}

/// Index over all compilation units of a loaded object file
///
/// Holds every top-level entry of every unit plus exactly one level of
/// their children. Deeper entries are not indexed: a type declared three
/// levels down cannot be the target of a type reference lookup.
///
/// Ordering is stable: all top-level entries (unit by unit) come first,
/// then all first-level children. Queries that can match several entries
/// return the earliest one.
#[derive(Debug)]
pub struct EntryIndex<'a>
{
    profile: TargetProfile,
    links: Vec<ChainLink<'a>>,
    by_name: HashMap<&'a str, Vec<usize>>,
    by_ref: HashMap<u64, usize>,
}

impl<'a> EntryIndex<'a>
{
    /// Build the index; the units must outlive it
    pub fn build(units: &'a [CompilationUnit], profile: TargetProfile) -> Self
    {
        let top_level = units
            .iter()
            .flat_map(|unit| unit.entries().iter().map(move |entry| ChainLink::new(entry, unit)));
        let first_children = units.iter().flat_map(|unit| {
            unit.entries()
                .iter()
                .flat_map(move |entry| entry.children().iter().map(move |child| ChainLink::new(child, unit)))
        });
        let links: Vec<ChainLink<'a>> = top_level.chain(first_children).collect();

        let mut by_name: HashMap<&'a str, Vec<usize>> = HashMap::new();
        let mut by_ref = HashMap::with_capacity(links.len());
        for (position, link) in links.iter().enumerate() {
            if let Some(name) = link.entry.name() {
                by_name.entry(name).or_default().push(position);
            }
            by_ref.entry(link.entry.global_ref()).or_insert(position);
        }

        debug!(units = units.len(), entries = links.len(), "built debug entry index");

        Self {
            profile,
            links,
            by_name,
            by_ref,
        }
    }

    /// Target profile used to decode declaration addresses
    pub fn profile(&self) -> TargetProfile
    {
        self.profile
    }

    pub fn len(&self) -> usize
    {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.links.is_empty()
    }

    /// All indexed entries in index order
    pub fn iter(&self) -> impl Iterator<Item = ChainLink<'a>> + '_
    {
        self.links.iter().copied()
    }

    /// First entry with this exact name declared at this address
    ///
    /// Same-named entries (static locals of different functions) are told
    /// apart only by address.
    pub fn find_by_name_and_address(&self, name: &str, address: Address) -> Option<ChainLink<'a>>
    {
        self.by_name
            .get(name)?
            .iter()
            .map(|&position| self.links[position])
            .find(|link| declaration_address(link.entry, &self.profile) == address)
    }

    /// Entry whose global reference id equals `global_ref`
    pub fn find_by_global_ref(&self, global_ref: u64) -> Option<ChainLink<'a>>
    {
        self.by_ref.get(&global_ref).map(|&position| self.links[position])
    }
}
