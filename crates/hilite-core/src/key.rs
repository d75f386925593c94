//! Keys, handler identities and the events that carry them.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Bound satisfied by every type usable as a row identifier.
///
/// Keys are compared with `Ord`, which also fixes the iteration order of every
/// key set handed out by this crate: events and snapshots iterate in ascending
/// key order, not in the order the keys were highlighted.
pub trait HighlightKey: Ord + Clone + fmt::Debug + Send + Sync + 'static {}

impl<T> HighlightKey for T where T: Ord + Clone + fmt::Debug + Send + Sync + 'static {}

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`HighlightHandler`](crate::HighlightHandler).
///
/// Ids are never reused, so they can be compared across handlers of different
/// key types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandlerId(u64);

impl HandlerId {
    pub(crate) fn next() -> Self {
        Self(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric value of this id.
    #[inline]
    pub fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An immutable notification about keys whose state changed.
///
/// `keys` is never empty: handlers only emit an event when at least one key
/// actually changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent<K> {
    source: HandlerId,
    keys: BTreeSet<K>,
}

impl<K: Ord> KeyEvent<K> {
    pub(crate) fn new(source: HandlerId, keys: BTreeSet<K>) -> Self {
        debug_assert!(!keys.is_empty(), "key events never carry an empty set");
        Self { source, keys }
    }

    /// The handler that produced this event.
    #[inline]
    pub fn source(&self) -> HandlerId {
        self.source
    }

    /// The keys affected by this event.
    #[inline]
    pub fn keys(&self) -> &BTreeSet<K> {
        &self.keys
    }

    /// Number of affected keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always `false` for events produced by a handler.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Consume the event, returning its keys.
    pub fn into_keys(self) -> BTreeSet<K> {
        self.keys
    }
}
