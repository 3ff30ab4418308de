//! # Value Renderer
//!
//! Reads the bytes behind a [`MemberDescriptor`] and formats them the way
//! the C type reads:
//!
//! | Type                  | Rendering                 |
//! |-----------------------|---------------------------|
//! | pointer               | `(int*) 0x2000`           |
//! | `unsigned char`       | `'A'`                     |
//! | signed integer        | `-3`                      |
//! | `float` / `double`    | `1.5`                     |
//! | anything else         | unsigned decimal          |
//! | array                 | `[1, 2, 3]`               |
//! | structure / union     | `{...}`                   |
//!
//! Rendering holds no state between calls: every call reads memory again.

use gimli::constants::{DW_ATE_float, DW_ATE_signed, DW_ATE_signed_char, DW_ATE_unsigned_char};
use tracing::{trace, warn};

use crate::dwarf::MemberDescriptor;
use crate::error::{SymviewError, SymviewResult};
use crate::memory::MemoryReader;
use crate::types::{Address, MemoryView, TargetProfile};

/// Text shown for structure and union values that are not expanded
pub const AGGREGATE_PLACEHOLDER: &str = "{...}";

/// Formats live values from target memory
pub struct ValueRenderer<'m, M: ?Sized>
{
    memory: &'m M,
    profile: TargetProfile,
    view: MemoryView,
    expand_nested: bool,
}

impl<'m, M> ValueRenderer<'m, M>
where
    M: MemoryReader + ?Sized,
{
    /// Renderer reading through the virtual view, nested values collapsed
    pub fn new(memory: &'m M, profile: TargetProfile) -> Self
    {
        Self {
            memory,
            profile,
            view: MemoryView::Virtual,
            expand_nested: false,
        }
    }

    #[must_use]
    pub fn with_view(mut self, view: MemoryView) -> Self
    {
        self.view = view;
        self
    }

    /// Render nested structure values from their computed members
    ///
    /// Off by default: nested structures and unions print as `{...}`.
    /// Unions always print as `{...}` because their active member is
    /// unknown.
    #[must_use]
    pub fn with_expand_nested(mut self, expand: bool) -> Self
    {
        self.expand_nested = expand;
        self
    }

    /// Render one member of a parent located at `base`
    ///
    /// For a whole symbol, pass the symbol's address and its own
    /// descriptor (offset zero).
    ///
    /// ## Errors
    ///
    /// `MemoryRead` or `ShortRead` when the bytes cannot be fetched.
    pub fn render(&self, base: Address, member: &MemberDescriptor) -> SymviewResult<String>
    {
        let address = base + member.offset;

        if !member.is_pointer && (member.is_struct || member.is_union) {
            return self.render_aggregate(address, member);
        }

        let word = if member.is_pointer { member.pointer_size } else { member.size };
        if word == 0 {
            warn!(member = %member.name, "type has no byte size, nothing to read");
            return Ok(String::new());
        }
        let read_length = total_size(word, member)?;

        let bytes = self.read(address, read_length)?;
        let (width, words) = self.split_words(&bytes, word);
        let formatted: Vec<String> = words
            .into_iter()
            .map(|raw| self.format_word(member, raw, width))
            .collect();

        if member.is_array {
            Ok(format!("[{}]", formatted.join(", ")))
        } else {
            Ok(formatted.join(", "))
        }
    }

    /// Render every member of a structure located at `base` on one line
    ///
    /// ```text
    /// { mode = 'A', count = 10 }
    /// ```
    ///
    /// ## Errors
    ///
    /// The first memory error of any member.
    pub fn render_struct(&self, base: Address, members: &[MemberDescriptor]) -> SymviewResult<String>
    {
        if members.is_empty() {
            return Ok("{}".to_string());
        }
        let fields = members
            .iter()
            .map(|member| Ok(format!("{} = {}", member.name, self.render(base, member)?)))
            .collect::<SymviewResult<Vec<_>>>()?;
        Ok(format!("{{ {} }}", fields.join(", ")))
    }

    /// Render every member of a structure, one member per line
    ///
    /// ```text
    /// {
    ///     mode = 'A',
    ///     count = 10,
    /// }
    /// ```
    ///
    /// ## Errors
    ///
    /// The first memory error of any member.
    pub fn render_struct_pretty(&self, base: Address, members: &[MemberDescriptor]) -> SymviewResult<String>
    {
        let mut out = String::from("{\n");
        for member in members {
            out.push_str(&format!("    {} = {},\n", member.name, self.render(base, member)?));
        }
        out.push('}');
        Ok(out)
    }

    fn render_aggregate(&self, address: Address, member: &MemberDescriptor) -> SymviewResult<String>
    {
        if !self.expand_nested || member.is_union || member.children.is_empty() {
            return Ok(AGGREGATE_PLACEHOLDER.to_string());
        }
        if !member.is_array {
            return self.render_struct(address, &member.children);
        }

        total_size(member.size, member)?;
        let mut elements = Vec::new();
        for index in 0..member.array_length {
            elements.push(self.render_struct(address + index * member.size, &member.children)?);
        }
        Ok(format!("[{}]", elements.join(", ")))
    }

    fn read(&self, address: Address, length: u64) -> SymviewResult<Vec<u8>>
    {
        let length = usize::try_from(length)
            .map_err(|_| SymviewError::InvalidArgument(format!("read of {length} bytes at {address} is too large")))?;
        if length == 0 {
            return Ok(Vec::new());
        }

        trace!(%address, length, view = ?self.view, "reading value bytes");
        let bytes = self.memory.read(address, length, self.view)?;
        if bytes.len() != length {
            return Err(SymviewError::ShortRead {
                address,
                expected: length,
                actual: bytes.len(),
            });
        }
        Ok(bytes)
    }

    /// Split `bytes` into words of `word` bytes
    ///
    /// Falls back to single bytes when the word size is not 1, 2, 4 or 8,
    /// or does not divide the buffer evenly.
    fn split_words(&self, bytes: &[u8], word: u64) -> (u64, Vec<u64>)
    {
        let mut width = usize::try_from(word).unwrap_or(0);
        if !matches!(width, 1 | 2 | 4 | 8) || bytes.len() % width != 0 {
            if !bytes.is_empty() {
                warn!(word, len = bytes.len(), "unsupported word size, decoding bytes individually");
            }
            width = 1;
        }

        let words = bytes
            .chunks_exact(width)
            .filter_map(|chunk| self.profile.decode_unsigned(chunk))
            .collect();
        (width as u64, words)
    }

    fn format_word(&self, member: &MemberDescriptor, raw: u64, width: u64) -> String
    {
        if member.is_pointer {
            return format!("({}*) 0x{raw:x}", member.pointee_name());
        }

        let bitfield = if member.is_bitfield && !member.is_array && width == member.size {
            extract_bitfield(raw, width, member)
        } else {
            None
        };
        let (raw, bits) = match bitfield {
            Some(value) => (value, member.bit_count),
            None => (raw, width * 8),
        };

        match member.encoding {
            Some(encoding) if encoding == DW_ATE_unsigned_char => format_char(raw),
            Some(encoding) if encoding == DW_ATE_signed || encoding == DW_ATE_signed_char => {
                sign_extend(raw, bits).to_string()
            }
            Some(encoding) if encoding == DW_ATE_float && bitfield.is_none() && (width == 4 || width == 8) => {
                if width == 4 {
                    f32::from_bits(raw as u32).to_string()
                } else {
                    f64::from_bits(raw).to_string()
                }
            }
            _ => raw.to_string(),
        }
    }
}

fn element_count(member: &MemberDescriptor) -> u64
{
    if member.is_array {
        member.array_length
    } else {
        1
    }
}

/// Bytes covered by `member`: one word per element
fn total_size(word: u64, member: &MemberDescriptor) -> SymviewResult<u64>
{
    word.checked_mul(element_count(member)).ok_or_else(|| {
        SymviewError::InvalidArgument(format!(
            "{} elements of {word} bytes in `{}` overflow the address space",
            member.array_length, member.name
        ))
    })
}

/// Bits of a bitfield member inside its storage word
///
/// `DW_AT_bit_offset` counts from the most significant bit of the storage
/// unit; on a little-endian word that is `storage_bits - offset - count`
/// bits above bit zero.
fn extract_bitfield(storage: u64, width: u64, member: &MemberDescriptor) -> Option<u64>
{
    let storage_bits = width * 8;
    let count = member.bit_count;
    if count == 0 || count >= 64 || member.bit_offset.checked_add(count).is_none_or(|end| end > storage_bits) {
        return None;
    }
    let shift = storage_bits - member.bit_offset - count;
    Some((storage >> shift) & ((1u64 << count) - 1))
}

fn sign_extend(raw: u64, bits: u64) -> i64
{
    if bits == 0 || bits >= 64 {
        return raw as i64;
    }
    let unused = 64 - bits;
    ((raw << unused) as i64) >> unused
}

fn format_char(raw: u64) -> String
{
    match u8::try_from(raw) {
        Ok(byte) if byte.is_ascii_graphic() || byte == b' ' => format!("'{}'", char::from(byte)),
        Ok(byte) => format!("'{}'", char::from(byte).escape_default()),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_sign_extend_widths()
    {
        assert_eq!(sign_extend(0xff, 8), -1);
        assert_eq!(sign_extend(0x7f, 8), 127);
        assert_eq!(sign_extend(0xfffe, 16), -2);
        assert_eq!(sign_extend(0xffff_fffd, 32), -3);
        assert_eq!(sign_extend(0b101, 3), -3);
    }

    #[test]
    fn test_format_char_escapes()
    {
        assert_eq!(format_char(0x41), "'A'");
        assert_eq!(format_char(0x20), "' '");
        assert_eq!(format_char(0x0a), "'\\n'");
        assert_eq!(format_char(0x300), "768");
    }

    #[test]
    fn test_extract_bitfield_msb_numbering()
    {
        let member = MemberDescriptor {
            size: 4,
            is_bitfield: true,
            bit_offset: 29,
            bit_count: 3,
            ..MemberDescriptor::default()
        };
        // bits 0..3 of the word
        assert_eq!(extract_bitfield(0b110, 4, &member), Some(0b110));

        let high = MemberDescriptor {
            bit_offset: 0,
            ..member
        };
        assert_eq!(extract_bitfield(0xa000_0000, 4, &high), Some(0b101));

        let oversized = MemberDescriptor {
            bit_offset: 30,
            ..high
        };
        assert_eq!(extract_bitfield(0, 4, &oversized), None);
    }
}
