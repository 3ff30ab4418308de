//! Target architecture profile.
//!
//! Address words and scalar values are decoded according to a profile
//! instead of a hard-coded layout, so the same resolver serves several
//! target families.

use std::fmt;

use gimli::{Endianity, RunTimeEndian};

/// Word size and byte order of the debugged target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetProfile
{
    pointer_width: u8,
    endian: RunTimeEndian,
}

impl TargetProfile
{
    /// 32-bit little-endian microcontroller (PIC32 / MIPS32 family)
    pub const PIC32: Self = TargetProfile {
        pointer_width: 4,
        endian: RunTimeEndian::Little,
    };

    /// Create a profile from a pointer width in bytes and a byte order
    ///
    /// Widths other than 1, 2, 4 or 8 are accepted but addresses of such a
    /// target decode as zero.
    pub const fn new(pointer_width: u8, endian: RunTimeEndian) -> Self
    {
        TargetProfile { pointer_width, endian }
    }

    /// Derive the profile from a parsed object file
    pub fn from_object<'data>(file: &object::File<'data>) -> Self
    {
        use object::Object;

        let endian = if file.is_little_endian() {
            RunTimeEndian::Little
        } else {
            RunTimeEndian::Big
        };
        let pointer_width = if file.is_64() { 8 } else { 4 };
        TargetProfile { pointer_width, endian }
    }

    /// Size of a target pointer in bytes
    #[must_use]
    pub const fn pointer_width(&self) -> u8
    {
        self.pointer_width
    }

    /// Byte order of target memory
    #[must_use]
    pub const fn endian(&self) -> RunTimeEndian
    {
        self.endian
    }

    /// Decode an unsigned word of 1, 2, 4 or 8 bytes
    ///
    /// Returns `None` for any other length.
    ///
    /// ```rust
    /// use symview_core::types::TargetProfile;
    ///
    /// let profile = TargetProfile::PIC32;
    /// assert_eq!(profile.decode_unsigned(&[0x34, 0x12]), Some(0x1234));
    /// assert_eq!(profile.decode_unsigned(&[1, 2, 3]), None);
    /// ```
    #[must_use]
    pub fn decode_unsigned(&self, bytes: &[u8]) -> Option<u64>
    {
        match bytes.len() {
            1 => Some(u64::from(bytes[0])),
            2 => Some(u64::from(self.endian.read_u16(bytes))),
            4 => Some(u64::from(self.endian.read_u32(bytes))),
            8 => Some(self.endian.read_u64(bytes)),
            _ => None,
        }
    }

    /// Decode a target address from the start of `bytes`
    ///
    /// Reads exactly `pointer_width` bytes; returns `None` when fewer are
    /// available or the width is not decodable.
    #[must_use]
    pub fn decode_address(&self, bytes: &[u8]) -> Option<u64>
    {
        let width = usize::from(self.pointer_width);
        bytes.get(..width).and_then(|word| self.decode_unsigned(word))
    }
}

impl Default for TargetProfile
{
    fn default() -> Self
    {
        TargetProfile::PIC32
    }
}

impl fmt::Display for TargetProfile
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let order = if self.endian.is_little_endian() { "little" } else { "big" };
        write!(f, "{}-bit {order}-endian", u32::from(self.pointer_width) * 8)
    }
}

/// Which view of target memory a read goes through
///
/// The virtual view is the address space as the running program sees it,
/// so bank-switched or paged addresses resolve the way the code resolves
/// them. The physical view is raw memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MemoryView
{
    /// Raw physical memory
    Physical,
    /// Program-visible address space (used for all value reads)
    #[default]
    Virtual,
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_decode_big_endian_word()
    {
        let profile = TargetProfile::new(4, RunTimeEndian::Big);
        assert_eq!(profile.decode_unsigned(&[0x12, 0x34, 0x56, 0x78]), Some(0x1234_5678));
        assert_eq!(profile.decode_address(&[0, 0, 0x20, 0]), Some(0x2000));
    }

    #[test]
    fn test_decode_address_too_short()
    {
        assert_eq!(TargetProfile::PIC32.decode_address(&[0x00, 0x10]), None);
    }

    #[test]
    fn test_profile_display()
    {
        assert_eq!(TargetProfile::PIC32.to_string(), "32-bit little-endian");
    }
}
