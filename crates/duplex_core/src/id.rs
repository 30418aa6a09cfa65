//! Component identity shared by both threads.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Next id handed out. Starts at 1 so that 0 never names a component.
static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identifier joining a framework-side component to its render-side proxy.
///
/// Ids are allocated from a process-wide counter and never reused, even after
/// the component that owned one is gone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    /// Allocates the next unused id.
    #[must_use]
    pub fn allocate() -> Self {
        Self(NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wraps a raw value. Only for lookups of ids that were allocated elsewhere.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
