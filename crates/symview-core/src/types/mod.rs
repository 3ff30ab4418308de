//! # Types
//!
//! Target-agnostic types used throughout symbol inspection.
//!
//! These types keep the resolver and renderer independent of the target
//! family: addresses are strongly typed, and word size and byte order come
//! from a [`TargetProfile`] instead of being assumed.

pub mod address;
pub mod target;

// Re-export all public types
pub use address::Address;
pub use target::{MemoryView, TargetProfile};
