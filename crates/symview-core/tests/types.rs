//! Tests for address and target profile types

use gimli::RunTimeEndian;
use symview_core::types::{Address, MemoryView, TargetProfile};

#[test]
fn test_address_from_u64()
{
    let address = Address::from(0x1000);
    assert_eq!(address.value(), 0x1000);
}

#[test]
fn test_address_to_u64()
{
    let value: u64 = Address::new(0xa000_0010).into();
    assert_eq!(value, 0xa000_0010);
}

#[test]
fn test_address_display()
{
    assert_eq!(Address::new(0x1000).to_string(), "0x00001000");
    assert_eq!(format!("{:x}", Address::new(0xbeef)), "beef");
}

#[test]
fn test_address_parse()
{
    assert_eq!(Address::parse("0x2000"), Some(Address::new(0x2000)));
    assert_eq!(Address::parse("4096"), Some(Address::new(4096)));
    assert_eq!(Address::parse("zz"), None);
}

#[test]
fn test_address_offsets()
{
    assert_eq!(Address::new(0x1000) + 4, Address::new(0x1004));
    assert_eq!(Address::new(u64::MAX).checked_add(1), None);
}

#[test]
fn test_default_profile_is_pic32()
{
    let profile = TargetProfile::default();
    assert_eq!(profile, TargetProfile::PIC32);
    assert_eq!(profile.pointer_width(), 4);
    assert_eq!(profile.endian(), RunTimeEndian::Little);
}

#[test]
fn test_profile_decoding()
{
    let big = TargetProfile::new(2, RunTimeEndian::Big);
    assert_eq!(big.decode_unsigned(&[0x12, 0x34]), Some(0x1234));
    assert_eq!(big.decode_address(&[0x12, 0x34, 0x56]), Some(0x1234));
    assert_eq!(big.decode_address(&[0x12]), None);
}

#[test]
fn test_virtual_view_is_default()
{
    assert_eq!(MemoryView::default(), MemoryView::Virtual);
}
