//! Logging facilities for Hilite.
//!
//! Hilite uses the `tracing` crate for instrumentation. Mutations open a
//! `trace` span, no-op mutations log at `trace`, and listener or mapper
//! failures log at `warn`. To see logs, install a subscriber in your
//! application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("hilite_core=trace")
//!         .init();
//! }
//! ```

use std::collections::BTreeSet;
use std::fmt;

/// Span names used throughout Hilite for tracing.
pub mod span_names {
    /// Highlight mutation span.
    pub const HIGHLIGHT: &str = "hilite::highlight";
    /// Unhighlight mutation span.
    pub const UNHIGHLIGHT: &str = "hilite::unhighlight";
    /// Reset span.
    pub const RESET: &str = "hilite::reset";
}

/// Target names for log filtering.
pub mod targets {
    /// Crate-wide target.
    pub const CORE: &str = "hilite_core";
    /// Handler mutations and fan-out.
    pub const HANDLER: &str = "hilite_core::handler";
    /// Translator forwarding.
    pub const TRANSLATOR: &str = "hilite_core::translator";
    /// Cascade depth guard.
    pub const CASCADE: &str = "hilite_core::cascade";
}

/// Default number of keys [`KeySummary`] prints before eliding the rest.
pub const DEFAULT_SUMMARY_LIMIT: usize = 8;

/// Display adapter that prints at most `limit` keys of a key set.
///
/// Key sets can hold millions of row ids, so log lines go through this
/// instead of formatting the whole set.
///
/// ```
/// use std::collections::BTreeSet;
/// use hilite_core::logging::KeySummary;
///
/// let keys = BTreeSet::from([4, 3, 2, 1]);
/// assert_eq!(KeySummary::with_limit(&keys, 2).to_string(), "[1, 2, … +2 more]");
/// ```
pub struct KeySummary<'a, K> {
    keys: &'a BTreeSet<K>,
    limit: usize,
}

impl<'a, K> KeySummary<'a, K> {
    /// Summarize a set using [`DEFAULT_SUMMARY_LIMIT`].
    pub fn new(keys: &'a BTreeSet<K>) -> Self {
        Self::with_limit(keys, DEFAULT_SUMMARY_LIMIT)
    }

    /// Summarize a set, printing at most `limit` keys.
    pub fn with_limit(keys: &'a BTreeSet<K>, limit: usize) -> Self {
        Self { keys, limit }
    }
}

impl<K: fmt::Debug> fmt::Display for KeySummary<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, key) in self.keys.iter().take(self.limit).enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key:?}")?;
        }
        let total = self.keys.len();
        if total > self.limit {
            if self.limit > 0 {
                f.write_str(", ")?;
            }
            write!(f, "… +{} more", total - self.limit)?;
        }
        f.write_str("]")
    }
}
