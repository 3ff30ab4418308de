//! # Session Configuration
//!
//! Tunables for one inspection session. Defaults match what the resolver
//! needs for typical embedded C code; environment variables override them
//! for ad-hoc runs:
//!
//! - `SYMVIEW_TYPE_DEPTH`: cap on type-reference hops (default 15)
//! - `SYMVIEW_MEMBER_DEPTH`: nesting limit for member expansion (default 3)
//! - `SYMVIEW_EXPAND_NESTED`: render nested structure values (`true`/`false`)

use std::env;
use std::str::FromStr;

use tracing::warn;

use crate::dwarf::{DEFAULT_MEMBER_DEPTH, DEFAULT_TYPE_CHAIN_DEPTH};
use crate::types::MemoryView;

/// Settings shared by every query of a [`crate::DebugSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig
{
    /// Cap on type-reference hops per chain
    pub type_chain_depth: usize,
    /// Nesting limit for member expansion
    pub member_depth: usize,
    /// Render nested structure values instead of `{...}`
    pub expand_nested: bool,
    /// Memory view used for value reads
    pub memory_view: MemoryView,
}

impl Default for SessionConfig
{
    fn default() -> Self
    {
        Self {
            type_chain_depth: DEFAULT_TYPE_CHAIN_DEPTH,
            member_depth: DEFAULT_MEMBER_DEPTH,
            expand_nested: false,
            memory_view: MemoryView::Virtual,
        }
    }
}

impl SessionConfig
{
    /// Defaults overlaid with `SYMVIEW_*` environment variables
    ///
    /// Values that do not parse are ignored with a warning.
    pub fn from_env() -> Self
    {
        let mut config = Self::default();
        if let Some(depth) = env_value("SYMVIEW_TYPE_DEPTH") {
            config.type_chain_depth = depth;
        }
        if let Some(depth) = env_value("SYMVIEW_MEMBER_DEPTH") {
            config.member_depth = depth;
        }
        if let Some(expand) = env_value("SYMVIEW_EXPAND_NESTED") {
            config.expand_nested = expand;
        }
        config
    }

    #[must_use]
    pub fn with_type_chain_depth(mut self, depth: usize) -> Self
    {
        self.type_chain_depth = depth;
        self
    }

    #[must_use]
    pub fn with_member_depth(mut self, depth: usize) -> Self
    {
        self.member_depth = depth;
        self
    }

    #[must_use]
    pub fn with_expand_nested(mut self, expand: bool) -> Self
    {
        self.expand_nested = expand;
        self
    }

    #[must_use]
    pub fn with_memory_view(mut self, view: MemoryView) -> Self
    {
        self.memory_view = view;
        self
    }
}

fn env_value<T: FromStr>(key: &str) -> Option<T>
{
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable configuration value");
            None
        }
    }
}
