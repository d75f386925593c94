//! Depth tracking for synchronous highlight cascades.
//!
//! Every mutating handler call counts as one level of the cascade on the
//! current thread for as long as it is updating its set and notifying
//! listeners. Translators chain handlers synchronously, so the depth grows by
//! one per hop. Handlers configured with
//! [`HandlerConfig::max_cascade_depth`](crate::HandlerConfig::max_cascade_depth)
//! refuse to join a cascade that is already that deep.

use std::cell::Cell;
use std::marker::PhantomData;

use crate::error::{HiliteError, Result};
use crate::logging::targets;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// The number of handler mutations currently in progress on this thread.
pub fn cascade_depth() -> usize {
    DEPTH.with(Cell::get)
}

/// One level of the cascade. Dropping it leaves the level.
pub(crate) struct CascadeGuard {
    // Tied to the thread whose counter it incremented.
    _not_send: PhantomData<*const ()>,
}

impl CascadeGuard {
    pub(crate) fn enter(limit: Option<usize>) -> Result<Self> {
        let depth = cascade_depth();
        if let Some(max_depth) = limit {
            if depth >= max_depth {
                tracing::warn!(
                    target: targets::CASCADE,
                    depth,
                    max_depth,
                    "highlight cascade too deep, refusing mutation"
                );
                return Err(HiliteError::CascadeDepthExceeded { max_depth });
            }
        }
        DEPTH.with(|d| d.set(depth + 1));
        Ok(Self {
            _not_send: PhantomData,
        })
    }
}

impl Drop for CascadeGuard {
    fn drop(&mut self) {
        DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}
