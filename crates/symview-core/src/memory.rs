//! # Memory Reader
//!
//! Target memory access as seen by the resolver and renderer.
//!
//! The connection to the target (a debug probe, a simulator, a dump file)
//! is a collaborator behind [`MemoryReader`]. Readers own any locking and
//! timeout policy for their transport; this crate never retries.

use std::collections::BTreeMap;

use object::{Object, ObjectSection, SectionKind};
use tracing::{debug, trace};

use crate::error::{SymviewError, SymviewResult};
use crate::types::{Address, MemoryView};

/// Source of raw target bytes
///
/// ## Contract
///
/// `read` returns exactly `length` bytes or an error. It never returns a
/// partially filled buffer. Callers still verify the length and report a
/// violation as [`SymviewError::ShortRead`].
pub trait MemoryReader
{
    /// Read `length` bytes starting at `address` through the given view
    ///
    /// ## Errors
    ///
    /// `MemoryRead` when the range cannot be read (target unreachable,
    /// unmapped address).
    fn read(&self, address: Address, length: usize, view: MemoryView) -> SymviewResult<Vec<u8>>;
}

impl<T: MemoryReader + ?Sized> MemoryReader for &T
{
    fn read(&self, address: Address, length: usize, view: MemoryView) -> SymviewResult<Vec<u8>>
    {
        (**self).read(address, length, view)
    }
}

impl<T: MemoryReader + ?Sized> MemoryReader for Box<T>
{
    fn read(&self, address: Address, length: usize, view: MemoryView) -> SymviewResult<Vec<u8>>
    {
        (**self).read(address, length, view)
    }
}

/// In-memory snapshot of target memory
///
/// A set of byte segments keyed by base address. A read must fall entirely
/// inside one segment. Both views see the same bytes: a snapshot is taken
/// after address translation.
///
/// ## Example
///
/// ```rust
/// use symview_core::memory::{MemoryImage, MemoryReader};
/// use symview_core::types::{Address, MemoryView};
///
/// let image = MemoryImage::new().with_segment(0x1000, vec![0x41, 0x00, 0x00, 0x00]);
/// let bytes = image.read(Address::new(0x1000), 1, MemoryView::Virtual)?;
/// assert_eq!(bytes, vec![0x41]);
/// assert!(image.read(Address::new(0x2000), 1, MemoryView::Virtual).is_err());
/// # Ok::<(), symview_core::error::SymviewError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryImage
{
    segments: BTreeMap<u64, Vec<u8>>,
}

impl MemoryImage
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Builder: add a segment at `base`
    #[must_use]
    pub fn with_segment(mut self, base: u64, bytes: Vec<u8>) -> Self
    {
        self.insert(base, bytes);
        self
    }

    /// Add a segment at `base`, replacing a segment with the same base
    pub fn insert(&mut self, base: u64, bytes: Vec<u8>)
    {
        trace!(base = format_args!("0x{base:x}"), len = bytes.len(), "adding memory segment");
        self.segments.insert(base, bytes);
    }

    /// Initial memory contents described by an object file
    ///
    /// Every allocated section contributes a segment: initialised data as
    /// stored in the file, zero-initialised data as zeros. This is the
    /// state of RAM right after start-up code ran, which is useful when no
    /// live target is attached.
    ///
    /// ## Errors
    ///
    /// `Object` when section data cannot be read.
    pub fn from_object<'data>(file: &object::File<'data>) -> SymviewResult<Self>
    {
        let mut image = Self::new();
        for section in file.sections() {
            let address = section.address();
            if address == 0 || section.size() == 0 {
                continue;
            }
            let bytes = match section.kind() {
                SectionKind::UninitializedData | SectionKind::UninitializedTls => {
                    let size = usize::try_from(section.size())
                        .map_err(|_| SymviewError::InvalidArgument(format!("section at 0x{address:x} is too large")))?;
                    vec![0; size]
                }
                SectionKind::Debug | SectionKind::DebugString | SectionKind::Metadata | SectionKind::Note => continue,
                _ => section.data()?.to_vec(),
            };
            image.insert(address, bytes);
        }
        debug!(segments = image.segments.len(), "memory image built from object file");
        Ok(image)
    }

    pub fn segment_count(&self) -> usize
    {
        self.segments.len()
    }
}

impl MemoryReader for MemoryImage
{
    fn read(&self, address: Address, length: usize, _view: MemoryView) -> SymviewResult<Vec<u8>>
    {
        let failed = || SymviewError::MemoryRead { address, length };

        let (&base, bytes) = self.segments.range(..=address.value()).next_back().ok_or_else(failed)?;
        let start = usize::try_from(address.value() - base).map_err(|_| failed())?;
        let end = start.checked_add(length).ok_or_else(failed)?;
        bytes.get(start..end).map(<[u8]>::to_vec).ok_or_else(failed)
    }
}
