//! Target memory address type.

use std::fmt;
use std::ops::Add;

/// Strongly typed target address
///
/// This wrapper around `u64` keeps addresses apart from sizes, offsets and
/// decoded values, which are all plain integers in this crate. Target
/// addresses on the supported families fit in 32 bits, but the wider type
/// leaves room for larger profiles.
///
/// ## Example
///
/// ```rust
/// use symview_core::types::Address;
///
/// let base = Address::from(0xa000_0200);
/// assert_eq!((base + 4).value(), 0xa000_0204);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u64);

impl Address
{
    /// The null address (0x0)
    ///
    /// Debug entries without a static location are reported at this address.
    pub const ZERO: Self = Address(0);

    /// Create a new address from a `u64` value
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Get the raw `u64` value of this address
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Add an offset to this address, checking for overflow
    ///
    /// ```rust
    /// use symview_core::types::Address;
    ///
    /// assert_eq!(Address::new(0x1000).checked_add(0x10), Some(Address::new(0x1010)));
    /// assert_eq!(Address::new(u64::MAX).checked_add(1), None);
    /// ```
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }

    /// Parse an address from user text
    ///
    /// Accepts `0x`-prefixed hexadecimal or plain decimal.
    ///
    /// ```rust
    /// use symview_core::types::Address;
    ///
    /// assert_eq!(Address::parse("0x1000"), Some(Address::new(0x1000)));
    /// assert_eq!(Address::parse("4096"), Some(Address::new(4096)));
    /// assert_eq!(Address::parse("zz"), None);
    /// ```
    pub fn parse(text: &str) -> Option<Self>
    {
        let text = text.trim();
        let value = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16).ok()?,
            None => text.parse().ok()?,
        };
        Some(Address(value))
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:08x}", self.0)
    }
}

impl fmt::LowerHex for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl Add<u64> for Address
{
    type Output = Address;

    fn add(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_add(rhs))
    }
}
