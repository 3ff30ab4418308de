//! Tests for the entry index

mod common;

use common::{fixture_unit, PAIR, PAIR_T, UCHAR};
use gimli::constants::{DW_AT_location, DW_AT_name, DW_TAG_member, DW_TAG_structure_type, DW_TAG_variable};
use symview_core::dwarf::{CompilationUnit, DebugEntry, EntryIndex};
use symview_core::types::{Address, TargetProfile};

#[test]
fn test_find_by_name_and_address()
{
    let units = vec![fixture_unit()];
    let index = EntryIndex::build(&units, TargetProfile::PIC32);

    let link = index.find_by_name_and_address("pair", Address::new(0x1000)).unwrap();
    assert_eq!(link.entry.global_ref(), PAIR);
    assert_eq!(link.unit.base_offset(), 0x100);
}

#[test]
fn test_address_mismatch_is_none()
{
    let units = vec![fixture_unit()];
    let index = EntryIndex::build(&units, TargetProfile::PIC32);

    assert!(index.find_by_name_and_address("pair", Address::new(0x1004)).is_none());
    assert!(index.find_by_name_and_address("nothing", Address::new(0x1000)).is_none());
}

#[test]
fn test_find_by_global_ref()
{
    let units = vec![fixture_unit()];
    let index = EntryIndex::build(&units, TargetProfile::PIC32);

    assert_eq!(index.find_by_global_ref(UCHAR).unwrap().entry.name(), Some("unsigned char"));
    assert_eq!(index.find_by_global_ref(PAIR_T).unwrap().entry.name(), Some("pair_t"));
    assert!(index.find_by_global_ref(0xdead).is_none());
}

#[test]
fn test_indexes_one_level_of_children()
{
    let grandchild = DebugEntry::new(0x30, DW_TAG_member).with_attr(DW_AT_name, "deep");
    let child = DebugEntry::new(0x20, DW_TAG_structure_type)
        .with_attr(DW_AT_name, "nested")
        .with_child(grandchild);
    let top = DebugEntry::new(0x10, DW_TAG_structure_type)
        .with_attr(DW_AT_name, "outer")
        .with_child(child);
    let units = vec![CompilationUnit::new("a.c", 0, vec![top])];
    let index = EntryIndex::build(&units, TargetProfile::PIC32);

    assert_eq!(index.len(), 2);
    assert!(index.find_by_global_ref(0x10).is_some());
    assert!(index.find_by_global_ref(0x20).is_some());
    assert!(index.find_by_global_ref(0x30).is_none());
}

#[test]
fn test_top_level_entries_come_first()
{
    let first = CompilationUnit::new(
        "a.c",
        0,
        vec![DebugEntry::new(0x10, DW_TAG_structure_type).with_child(DebugEntry::new(0x18, DW_TAG_member))],
    );
    let second = CompilationUnit::new("b.c", 0x40, vec![DebugEntry::new(0x50, DW_TAG_structure_type)]);
    let units = vec![first, second];
    let index = EntryIndex::build(&units, TargetProfile::PIC32);

    let order: Vec<u64> = index.iter().map(|link| link.entry.global_ref()).collect();
    assert_eq!(order, vec![0x10, 0x50, 0x18]);
}

#[test]
fn test_same_name_told_apart_by_address()
{
    let static_in = |global_ref: u64, address: u32| {
        DebugEntry::new(global_ref, DW_TAG_variable)
            .with_attr(DW_AT_name, "counter")
            .with_attr(DW_AT_location, common::addr_expr(address))
    };
    let units = vec![
        CompilationUnit::new("a.c", 0, vec![static_in(0x10, 0xa000_0000)]),
        CompilationUnit::new("b.c", 0x40, vec![static_in(0x50, 0xa000_0004)]),
    ];
    let index = EntryIndex::build(&units, TargetProfile::PIC32);

    let link = index.find_by_name_and_address("counter", Address::new(0xa000_0004)).unwrap();
    assert_eq!(link.entry.global_ref(), 0x50);
    assert_eq!(link.unit.source_file_absolute_path().to_str(), Some("b.c"));
}
