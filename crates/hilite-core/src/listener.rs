//! The listener capability implemented by everything interested in highlight
//! changes.

use slotmap::new_key_type;

use crate::error::Result;
use crate::key::{HandlerId, KeyEvent};

new_key_type! {
    /// Identifies one listener registration on a [`HighlightHandler`](crate::HighlightHandler).
    ///
    /// Returned by [`HighlightHandler::add_listener`](crate::HighlightHandler::add_listener)
    /// and accepted by
    /// [`HighlightHandler::remove_listener_id`](crate::HighlightHandler::remove_listener_id).
    pub struct ListenerId;
}

/// Receives highlight notifications from a handler.
///
/// Callbacks run synchronously on the thread that mutated the handler, in
/// registration order. A listener may call back into the handler that notified
/// it, but the handler's set already reflects the change when the callback
/// runs.
///
/// Every method defaults to doing nothing, so a listener only overrides the
/// notifications it cares about.
///
/// # Errors
///
/// A returned error does not stop the handler from notifying its remaining
/// listeners. The first error is handed back to whoever called the mutating
/// operation.
pub trait HighlightListener<K>: Send + Sync {
    /// Invoked after some keys became highlighted.
    fn on_highlight(&self, event: &KeyEvent<K>) -> Result<()> {
        let _ = event;
        Ok(())
    }

    /// Invoked after some keys stopped being highlighted.
    fn on_unhighlight(&self, event: &KeyEvent<K>) -> Result<()> {
        let _ = event;
        Ok(())
    }

    /// Invoked after the handler identified by `source` cleared every key.
    fn on_reset(&self, source: HandlerId) -> Result<()> {
        let _ = source;
        Ok(())
    }
}
