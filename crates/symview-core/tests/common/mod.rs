//! Synthetic debug info, memory and symbols shared by the integration tests
//!
//! One compilation unit based at `0x100` describing:
//!
//! ```c
//! struct pair_t  { unsigned char a; unsigned int b; };          // pair    @ 0x1000
//! int *ptr;                                                      // ptr     @ 0x3000
//! unsigned int samples[4];                                       // samples @ 0x4000
//! u24 odd;           /* 3-byte base type */                      // odd     @ 0x5000
//! struct outer_t { struct pair_t inner; int gain; };            // sensor  @ 0x6000
//! struct flags_t { unsigned int mode : 3; unsigned int level : 5; }; // flags @ 0x7000
//! ```

#![allow(dead_code)]

use gimli::constants::{
    DW_AT_bit_offset, DW_AT_bit_size, DW_AT_byte_size, DW_AT_data_member_location, DW_AT_encoding, DW_AT_location,
    DW_AT_name, DW_AT_type, DW_AT_upper_bound, DW_ATE_signed, DW_ATE_unsigned, DW_ATE_unsigned_char, DW_TAG_array_type,
    DW_TAG_base_type, DW_TAG_member, DW_TAG_pointer_type, DW_TAG_structure_type, DW_TAG_subrange_type,
    DW_TAG_variable,
};
use symview_core::dwarf::{CompilationUnit, DebugEntry};
use symview_core::memory::MemoryImage;
use symview_core::symbols::{RawSymbol, SymbolKind, SymbolTable};
use symview_core::types::Address;

pub const UNIT_BASE: u64 = 0x100;

pub const UCHAR: u64 = 0x10b;
pub const UINT: u64 = 0x113;
pub const INT: u64 = 0x11b;
pub const INT_PTR: u64 = 0x123;
pub const PAIR_T: u64 = 0x12b;
pub const PAIR: u64 = 0x150;
pub const PTR: u64 = 0x160;
pub const UINT_ARRAY: u64 = 0x170;
pub const SAMPLES: u64 = 0x180;
pub const U24: u64 = 0x188;
pub const ODD: u64 = 0x190;
pub const OUTER_T: u64 = 0x1a0;
pub const SENSOR: u64 = 0x1c0;
pub const FLAGS_T: u64 = 0x1d0;
pub const FLAGS: u64 = 0x1e8;

pub const MAIN_ADDRESS: u64 = 0x9d00_1000;

/// `DW_OP_addr` expression for a 32-bit little-endian address
pub fn addr_expr(address: u32) -> Vec<u8>
{
    let mut expression = vec![0x03];
    expression.extend_from_slice(&address.to_le_bytes());
    expression
}

/// `DW_OP_plus_uconst` member offset expression
pub fn offset_expr(offset: u8) -> Vec<u8>
{
    vec![0x23, offset]
}

/// Unit-relative form of a global reference in the fixture unit
pub fn type_ref(global_ref: u64) -> u64
{
    global_ref - UNIT_BASE
}

pub fn base_type(global_ref: u64, name: &str, size: u64, encoding: gimli::DwAte) -> DebugEntry
{
    DebugEntry::new(global_ref, DW_TAG_base_type)
        .with_attr(DW_AT_name, name)
        .with_attr(DW_AT_byte_size, size)
        .with_attr(DW_AT_encoding, encoding)
}

pub fn member(global_ref: u64, name: &str, ty: u64, offset: u8) -> DebugEntry
{
    DebugEntry::new(global_ref, DW_TAG_member)
        .with_attr(DW_AT_name, name)
        .with_attr(DW_AT_type, type_ref(ty))
        .with_attr(DW_AT_data_member_location, offset_expr(offset))
}

pub fn variable(global_ref: u64, name: &str, ty: u64, address: u32) -> DebugEntry
{
    DebugEntry::new(global_ref, DW_TAG_variable)
        .with_attr(DW_AT_name, name)
        .with_attr(DW_AT_type, type_ref(ty))
        .with_attr(DW_AT_location, addr_expr(address))
}

pub fn fixture_unit() -> CompilationUnit
{
    let entries = vec![
        base_type(UCHAR, "unsigned char", 1, DW_ATE_unsigned_char),
        base_type(UINT, "unsigned int", 4, DW_ATE_unsigned),
        base_type(INT, "int", 4, DW_ATE_signed),
        DebugEntry::new(INT_PTR, DW_TAG_pointer_type)
            .with_attr(DW_AT_byte_size, 4u64)
            .with_attr(DW_AT_type, type_ref(INT)),
        DebugEntry::new(PAIR_T, DW_TAG_structure_type)
            .with_attr(DW_AT_name, "pair_t")
            .with_attr(DW_AT_byte_size, 8u64)
            .with_child(member(0x133, "a", UCHAR, 0))
            .with_child(member(0x13b, "b", UINT, 4)),
        variable(PAIR, "pair", PAIR_T, 0x1000),
        variable(PTR, "ptr", INT_PTR, 0x3000),
        DebugEntry::new(UINT_ARRAY, DW_TAG_array_type)
            .with_attr(DW_AT_type, type_ref(UINT))
            .with_child(DebugEntry::new(0x178, DW_TAG_subrange_type).with_attr(DW_AT_upper_bound, 3u64)),
        variable(SAMPLES, "samples", UINT_ARRAY, 0x4000),
        base_type(U24, "u24", 3, DW_ATE_unsigned),
        variable(ODD, "odd", U24, 0x5000),
        DebugEntry::new(OUTER_T, DW_TAG_structure_type)
            .with_attr(DW_AT_name, "outer_t")
            .with_attr(DW_AT_byte_size, 12u64)
            .with_child(member(0x1a8, "inner", PAIR_T, 0))
            .with_child(member(0x1b0, "gain", INT, 8)),
        variable(SENSOR, "sensor", OUTER_T, 0x6000),
        DebugEntry::new(FLAGS_T, DW_TAG_structure_type)
            .with_attr(DW_AT_name, "flags_t")
            .with_attr(DW_AT_byte_size, 4u64)
            .with_child(
                member(0x1d8, "mode", UINT, 0)
                    .with_attr(DW_AT_bit_size, 3u64)
                    .with_attr(DW_AT_bit_offset, 29u64),
            )
            .with_child(
                member(0x1e0, "level", UINT, 0)
                    .with_attr(DW_AT_bit_size, 5u64)
                    .with_attr(DW_AT_bit_offset, 24u64),
            ),
        variable(FLAGS, "flags", FLAGS_T, 0x7000),
    ];
    CompilationUnit::new("/work/fw/sensor.c", UNIT_BASE, entries)
}

pub fn fixture_memory() -> MemoryImage
{
    MemoryImage::new()
        .with_segment(0x1000, vec![0x41, 0x00, 0x00, 0x00, 0x0a, 0x00, 0x00, 0x00])
        .with_segment(0x3000, vec![0x00, 0x20, 0x00, 0x00])
        .with_segment(0x4000, vec![1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 4, 0, 0, 0])
        .with_segment(0x5000, vec![1, 2, 3])
        .with_segment(0x6000, vec![0x42, 0, 0, 0, 7, 0, 0, 0, 0xfd, 0xff, 0xff, 0xff])
        // mode = 5 in bits 0..3, level = 9 in bits 3..8
        .with_segment(0x7000, vec![0x4d, 0x00, 0x00, 0x00])
}

pub fn fixture_symbols() -> SymbolTable
{
    [
        RawSymbol::new("pair", Address::new(0x1000), 8, SymbolKind::Data),
        RawSymbol::new("ptr", Address::new(0x3000), 4, SymbolKind::Data),
        RawSymbol::new("samples", Address::new(0x4000), 16, SymbolKind::Data),
        RawSymbol::new("odd", Address::new(0x5000), 3, SymbolKind::Data),
        RawSymbol::new("sensor", Address::new(0x6000), 12, SymbolKind::Data),
        RawSymbol::new("flags", Address::new(0x7000), 4, SymbolKind::Data),
        RawSymbol::new("ghost", Address::new(0x8000), 4, SymbolKind::Data),
        RawSymbol::new("main", Address::new(MAIN_ADDRESS), 64, SymbolKind::Function),
    ]
    .into_iter()
    .collect()
}
