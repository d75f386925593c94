//! The highlight handler: one domain's highlighted keys and their listeners.
//!
//! # Consistency
//!
//! Each mutating call updates the key set and notifies every listener inside a
//! single per-handler critical section, so a listener never sees the updates
//! of two concurrent calls interleaved. The critical section is re-entrant:
//! a listener may call back into the handler that is notifying it from the
//! same thread. Queries only take a read lock on the key set and may run while
//! listeners are being notified.
//!
//! # Hazards
//!
//! Translators call into their targets while holding the source's critical
//! section. Two linked handlers mutated from two different threads at the
//! same time can therefore deadlock, and a cyclic wiring recurses without
//! bound unless a handler sets
//! [`HandlerConfig::max_cascade_depth`](crate::HandlerConfig::max_cascade_depth).

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::{ReentrantMutex, RwLock};
use slotmap::SlotMap;

use crate::cascade::CascadeGuard;
use crate::config::{HandlerBuilder, HandlerConfig};
use crate::error::{HiliteError, Result};
use crate::key::{HandlerId, HighlightKey, KeyEvent};
use crate::listener::{HighlightListener, ListenerId};
use crate::logging::{span_names, targets, KeySummary};

type SharedListener<K> = Arc<dyn HighlightListener<K>>;

/// Registered listeners plus the snapshot used for fan-out.
struct ListenerTable<K> {
    entries: SlotMap<ListenerId, SharedListener<K>>,
    /// Registration order.
    order: Vec<ListenerId>,
    /// Rebuilt on every change; fan-out iterates this, never the live table.
    snapshot: Arc<[SharedListener<K>]>,
}

impl<K> ListenerTable<K> {
    fn new() -> Self {
        Self {
            entries: SlotMap::with_key(),
            order: Vec::new(),
            snapshot: Arc::from(Vec::new()),
        }
    }

    fn find(&self, listener: &SharedListener<K>) -> Option<ListenerId> {
        let addr = Arc::as_ptr(listener) as *const ();
        self.order
            .iter()
            .copied()
            .find(|id| Arc::as_ptr(&self.entries[*id]) as *const () == addr)
    }

    fn rebuild_snapshot(&mut self) {
        self.snapshot = self
            .order
            .iter()
            .map(|id| self.entries[*id].clone())
            .collect();
    }
}

/// Tracks which keys of one domain are highlighted and notifies listeners
/// about every actual change.
///
/// Handlers are shared as `Arc<HighlightHandler<K>>` between the component
/// that owns the domain, its listeners and any
/// [`HighlightTranslator`](crate::HighlightTranslator)s linking it to other
/// domains.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use hilite_core::HighlightHandler;
///
/// let handler = Arc::new(HighlightHandler::<u32>::new());
/// handler.highlight([1, 2, 3]).unwrap();
/// handler.unhighlight([2]).unwrap();
///
/// assert!(handler.is_highlighted(&[1, 3]));
/// assert!(!handler.contains(&2));
///
/// handler.reset_all().unwrap();
/// assert!(handler.is_empty());
/// ```
pub struct HighlightHandler<K> {
    id: HandlerId,
    config: HandlerConfig,
    /// Held across update and notify. Translators also hold it while swapping
    /// their mapper.
    pub(crate) dispatch: ReentrantMutex<()>,
    keys: RwLock<BTreeSet<K>>,
    listeners: RwLock<ListenerTable<K>>,
}

impl<K: HighlightKey> Default for HighlightHandler<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: HighlightKey> HighlightHandler<K> {
    /// Create an empty handler with no listeners and the default configuration.
    pub fn new() -> Self {
        Self::from_valid_config(HandlerConfig::default())
    }

    /// Create an empty handler with a custom configuration.
    pub fn with_config(config: HandlerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    /// Start building a handler.
    pub fn builder() -> HandlerBuilder {
        HandlerBuilder::new()
    }

    fn from_valid_config(config: HandlerConfig) -> Self {
        Self {
            id: HandlerId::next(),
            config,
            dispatch: ReentrantMutex::new(()),
            keys: RwLock::new(BTreeSet::new()),
            listeners: RwLock::new(ListenerTable::new()),
        }
    }

    /// This handler's identity, as carried by the events it emits.
    #[inline]
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// The configured name, if any.
    pub fn name(&self) -> Option<&str> {
        self.config.name.as_deref()
    }

    /// The configuration this handler was created with.
    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Listener management
    // -------------------------------------------------------------------------

    /// Append a listener to the notification list.
    ///
    /// Registering the same `Arc` again is a no-op that returns the id of the
    /// existing registration. The new listener is not told about keys that are
    /// already highlighted.
    pub fn add_listener(&self, listener: Arc<dyn HighlightListener<K>>) -> ListenerId {
        let _dispatch = self.dispatch.lock();
        let mut table = self.listeners.write();
        if let Some(id) = table.find(&listener) {
            return id;
        }
        let id = table.entries.insert(listener);
        table.order.push(id);
        table.rebuild_snapshot();
        tracing::trace!(
            target: targets::HANDLER,
            handler = %self.id,
            listeners = table.order.len(),
            "listener added"
        );
        id
    }

    /// Remove a listener by the `Arc` it was registered with.
    ///
    /// Returns `true` if it was registered.
    pub fn remove_listener(&self, listener: &Arc<dyn HighlightListener<K>>) -> bool {
        let _dispatch = self.dispatch.lock();
        let id = self.listeners.read().find(listener);
        match id {
            Some(id) => self.remove_listener_id(id),
            None => false,
        }
    }

    /// Remove a listener by its registration id.
    ///
    /// Returns `true` if the id was registered.
    pub fn remove_listener_id(&self, id: ListenerId) -> bool {
        let _dispatch = self.dispatch.lock();
        // Dropped after the table lock is released.
        let removed = {
            let mut table = self.listeners.write();
            let removed = table.entries.remove(id);
            if removed.is_some() {
                table.order.retain(|other| *other != id);
                table.rebuild_snapshot();
                tracing::trace!(
                    target: targets::HANDLER,
                    handler = %self.id,
                    listeners = table.order.len(),
                    "listener removed"
                );
            }
            removed
        };
        removed.is_some()
    }

    /// Remove every listener.
    pub fn remove_all_listeners(&self) {
        let _dispatch = self.dispatch.lock();
        let removed = std::mem::replace(&mut *self.listeners.write(), ListenerTable::new());
        drop(removed);
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().order.len()
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Returns `true` if every given key is highlighted.
    ///
    /// An empty input is trivially highlighted.
    pub fn is_highlighted<'a, I>(&self, ids: I) -> bool
    where
        I: IntoIterator<Item = &'a K>,
    {
        // Drained before locking: the iterator may itself query this handler.
        let ids: Vec<&K> = ids.into_iter().collect();
        let keys = self.keys.read();
        ids.into_iter().all(|id| keys.contains(id))
    }

    /// Returns `true` if `id` is highlighted.
    pub fn contains(&self, id: &K) -> bool {
        self.keys.read().contains(id)
    }

    /// A snapshot of the highlighted keys.
    ///
    /// The returned set is a copy; later changes to the handler do not show up
    /// in it and changing it does not affect the handler.
    pub fn highlighted_keys(&self) -> BTreeSet<K> {
        self.keys.read().clone()
    }

    /// Number of highlighted keys.
    pub fn highlighted_count(&self) -> usize {
        self.keys.read().len()
    }

    /// Returns `true` if nothing is highlighted.
    pub fn is_empty(&self) -> bool {
        self.keys.read().is_empty()
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Highlight the given keys.
    ///
    /// Listeners receive one event containing exactly the keys that were not
    /// highlighted before. If every key already was, nothing is emitted.
    ///
    /// # Errors
    ///
    /// Returns [`HiliteError::CascadeDepthExceeded`] without touching the set if
    /// the cascade guard trips, or the first error reported by a listener. The
    /// set has been updated and every listener notified in the latter case.
    pub fn highlight<I>(&self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = K>,
    {
        let _span =
            tracing::trace_span!(target: targets::HANDLER, span_names::HIGHLIGHT, handler = %self.id)
                .entered();
        let _cascade = CascadeGuard::enter(self.config.max_cascade_depth)?;
        let _dispatch = self.dispatch.lock();

        let ids: Vec<K> = ids.into_iter().collect();
        let changed: BTreeSet<K> = {
            let mut keys = self.keys.write();
            ids.into_iter().filter(|id| keys.insert(id.clone())).collect()
        };
        if changed.is_empty() {
            tracing::trace!(target: targets::HANDLER, "all keys already highlighted");
            return Ok(());
        }

        tracing::trace!(
            target: targets::HANDLER,
            count = changed.len(),
            keys = %KeySummary::new(&changed),
            "keys highlighted"
        );
        let event = KeyEvent::new(self.id, changed);
        self.fire(|listener| listener.on_highlight(&event))
    }

    /// Unhighlight the given keys.
    ///
    /// Listeners receive one event containing exactly the keys that were
    /// highlighted before. If none were, nothing is emitted.
    ///
    /// # Errors
    ///
    /// Same as [`highlight`](Self::highlight).
    pub fn unhighlight<I>(&self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = K>,
    {
        let _span = tracing::trace_span!(
            target: targets::HANDLER,
            span_names::UNHIGHLIGHT,
            handler = %self.id
        )
        .entered();
        let _cascade = CascadeGuard::enter(self.config.max_cascade_depth)?;
        let _dispatch = self.dispatch.lock();

        let ids: Vec<K> = ids.into_iter().collect();
        let changed: BTreeSet<K> = {
            let mut keys = self.keys.write();
            ids.into_iter().filter(|id| keys.remove(id)).collect()
        };
        if changed.is_empty() {
            tracing::trace!(target: targets::HANDLER, "no keys were highlighted");
            return Ok(());
        }

        tracing::trace!(
            target: targets::HANDLER,
            count = changed.len(),
            keys = %KeySummary::new(&changed),
            "keys unhighlighted"
        );
        let event = KeyEvent::new(self.id, changed);
        self.fire(|listener| listener.on_unhighlight(&event))
    }

    /// Unhighlight every key.
    ///
    /// Listeners receive a reset notification if at least one key was
    /// highlighted; an already empty handler emits nothing.
    ///
    /// # Errors
    ///
    /// Same as [`highlight`](Self::highlight).
    pub fn reset_all(&self) -> Result<()> {
        let _span =
            tracing::trace_span!(target: targets::HANDLER, span_names::RESET, handler = %self.id)
                .entered();
        let _cascade = CascadeGuard::enter(self.config.max_cascade_depth)?;
        let _dispatch = self.dispatch.lock();

        let cleared = {
            let mut keys = self.keys.write();
            let cleared = keys.len();
            keys.clear();
            cleared
        };
        if cleared == 0 {
            tracing::trace!(target: targets::HANDLER, "nothing highlighted, reset skipped");
            return Ok(());
        }

        tracing::trace!(target: targets::HANDLER, cleared, "highlight reset");
        let source = self.id;
        self.fire(|listener| listener.on_reset(source))
    }

    /// Invoke `notify` on every listener in the current snapshot.
    ///
    /// Every listener is called even if an earlier one fails; the first
    /// failure is returned and the rest are logged.
    fn fire<F>(&self, notify: F) -> Result<()>
    where
        F: Fn(&dyn HighlightListener<K>) -> Result<()>,
    {
        let snapshot = self.listeners.read().snapshot.clone();
        let mut first_error: Option<HiliteError> = None;

        for listener in snapshot.iter() {
            if let Err(err) = notify(listener.as_ref()) {
                tracing::warn!(
                    target: targets::HANDLER,
                    handler = %self.id,
                    error = %err,
                    "highlight listener failed"
                );
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<K: HighlightKey> fmt::Debug for HighlightHandler<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HighlightHandler")
            .field("id", &self.id)
            .field("name", &self.config.name)
            .field("highlighted", &self.highlighted_count())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

static_assertions::assert_impl_all!(HighlightHandler<u64>: Send, Sync);
static_assertions::assert_impl_all!(HighlightHandler<String>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Seen {
        Highlight(Vec<u32>),
        Unhighlight(Vec<u32>),
        Reset,
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Seen>>,
    }

    impl Recorder {
        fn take(&self) -> Vec<Seen> {
            std::mem::take(&mut *self.seen.lock())
        }
    }

    impl HighlightListener<u32> for Recorder {
        fn on_highlight(&self, event: &KeyEvent<u32>) -> Result<()> {
            let keys = event.keys().iter().copied().collect();
            self.seen.lock().push(Seen::Highlight(keys));
            Ok(())
        }

        fn on_unhighlight(&self, event: &KeyEvent<u32>) -> Result<()> {
            let keys = event.keys().iter().copied().collect();
            self.seen.lock().push(Seen::Unhighlight(keys));
            Ok(())
        }

        fn on_reset(&self, _source: HandlerId) -> Result<()> {
            self.seen.lock().push(Seen::Reset);
            Ok(())
        }
    }

    fn recorded(handler: &HighlightHandler<u32>) -> Arc<Recorder> {
        let recorder = Arc::new(Recorder::default());
        handler.add_listener(recorder.clone());
        recorder
    }

    #[test]
    fn test_highlight_is_idempotent() {
        let handler = HighlightHandler::<u32>::new();
        let recorder = recorded(&handler);

        handler.highlight([1, 2]).unwrap();
        handler.highlight([1, 2]).unwrap();

        assert_eq!(recorder.take(), vec![Seen::Highlight(vec![1, 2])]);
        assert!(handler.is_highlighted(&[1, 2]));
    }

    #[test]
    fn test_unhighlight_is_idempotent() {
        let handler = HighlightHandler::<u32>::new();
        handler.highlight([5]).unwrap();
        let recorder = recorded(&handler);

        handler.unhighlight([5]).unwrap();
        handler.unhighlight([5]).unwrap();
        handler.unhighlight([6]).unwrap();

        assert_eq!(recorder.take(), vec![Seen::Unhighlight(vec![5])]);
        assert!(handler.is_empty());
    }

    #[test]
    fn test_empty_input_is_silent() {
        let handler = HighlightHandler::<u32>::new();
        let recorder = recorded(&handler);

        handler.highlight(Vec::new()).unwrap();
        handler.unhighlight(Vec::new()).unwrap();

        assert!(recorder.take().is_empty());
    }

    #[test]
    fn test_event_carries_only_changed_keys() {
        let handler = HighlightHandler::<u32>::new();
        handler.highlight([1, 2]).unwrap();
        let recorder = recorded(&handler);

        handler.highlight([1, 2, 3]).unwrap();
        handler.unhighlight([2, 3, 4]).unwrap();

        assert_eq!(
            recorder.take(),
            vec![Seen::Highlight(vec![3]), Seen::Unhighlight(vec![2, 3])]
        );
        assert_eq!(handler.highlighted_keys(), BTreeSet::from([1]));
    }

    #[test]
    fn test_reset_fires_once_per_change() {
        let handler = HighlightHandler::<u32>::new();
        let recorder = recorded(&handler);

        handler.reset_all().unwrap();
        assert!(recorder.take().is_empty());

        handler.highlight([1, 2]).unwrap();
        handler.reset_all().unwrap();
        handler.reset_all().unwrap();

        assert_eq!(
            recorder.take(),
            vec![Seen::Highlight(vec![1, 2]), Seen::Reset]
        );
        assert!(handler.highlighted_keys().is_empty());
    }

    #[test]
    fn test_is_highlighted_requires_every_key() {
        let handler = HighlightHandler::<u32>::new();
        handler.highlight([1, 2]).unwrap();

        assert!(handler.is_highlighted(&[1]));
        assert!(handler.is_highlighted(&[1, 2]));
        assert!(!handler.is_highlighted(&[1, 3]));
        assert!(handler.is_highlighted(&[]));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let handler = HighlightHandler::<u32>::new();
        handler.highlight([1]).unwrap();

        let mut snapshot = handler.highlighted_keys();
        snapshot.insert(99);
        handler.highlight([2]).unwrap();

        assert_eq!(handler.highlighted_keys(), BTreeSet::from([1, 2]));
        assert_eq!(snapshot, BTreeSet::from([1, 99]));
    }

    #[test]
    fn test_duplicate_listener_registered_once() {
        let handler = HighlightHandler::<u32>::new();
        let recorder = Arc::new(Recorder::default());
        let shared: Arc<dyn HighlightListener<u32>> = recorder.clone();

        let first = handler.add_listener(shared.clone());
        let second = handler.add_listener(shared.clone());
        assert_eq!(first, second);
        assert_eq!(handler.listener_count(), 1);

        handler.highlight([1]).unwrap();
        assert_eq!(recorder.take().len(), 1);

        assert!(handler.remove_listener(&shared));
        assert!(!handler.remove_listener(&shared));
        handler.highlight([2]).unwrap();
        handler.reset_all().unwrap();
        assert!(recorder.take().is_empty());
    }

    #[test]
    fn test_remove_listener_by_id() {
        let handler = HighlightHandler::<u32>::new();
        let recorder = Arc::new(Recorder::default());
        let id = handler.add_listener(recorder.clone());

        assert!(handler.remove_listener_id(id));
        assert!(!handler.remove_listener_id(id));
        handler.highlight([1]).unwrap();
        assert!(recorder.take().is_empty());
    }

    #[test]
    fn test_remove_all_listeners() {
        let handler = HighlightHandler::<u32>::new();
        let a = recorded(&handler);
        let b = recorded(&handler);
        assert_eq!(handler.listener_count(), 2);

        handler.remove_all_listeners();
        handler.highlight([1]).unwrap();

        assert_eq!(handler.listener_count(), 0);
        assert!(a.take().is_empty());
        assert!(b.take().is_empty());
    }

    #[test]
    fn test_notification_follows_registration_order() {
        struct Tagged {
            tag: &'static str,
            log: Arc<Mutex<Vec<&'static str>>>,
        }

        impl HighlightListener<u32> for Tagged {
            fn on_highlight(&self, _event: &KeyEvent<u32>) -> Result<()> {
                self.log.lock().push(self.tag);
                Ok(())
            }
        }

        let handler = HighlightHandler::<u32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            handler.add_listener(Arc::new(Tagged {
                tag,
                log: log.clone(),
            }));
        }

        handler.highlight([1]).unwrap();
        assert_eq!(*log.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_failing_listener_does_not_stop_fan_out() {
        struct Failing;

        impl HighlightListener<u32> for Failing {
            fn on_highlight(&self, _event: &KeyEvent<u32>) -> Result<()> {
                Err(HiliteError::listener("failing", "view disposed"))
            }
        }

        let handler = HighlightHandler::<u32>::new();
        handler.add_listener(Arc::new(Failing));
        let recorder = recorded(&handler);

        let result = handler.highlight([1]);

        assert_eq!(
            result,
            Err(HiliteError::listener("failing", "view disposed"))
        );
        assert_eq!(recorder.take(), vec![Seen::Highlight(vec![1])]);
        assert!(handler.contains(&1));
    }

    #[test]
    fn test_listener_added_during_callback_misses_current_event() {
        struct Spawner {
            handler: Arc<HighlightHandler<u32>>,
            late: Arc<Recorder>,
        }

        impl HighlightListener<u32> for Spawner {
            fn on_highlight(&self, _event: &KeyEvent<u32>) -> Result<()> {
                self.handler.add_listener(self.late.clone());
                Ok(())
            }
        }

        let handler = Arc::new(HighlightHandler::<u32>::new());
        let late = Arc::new(Recorder::default());
        handler.add_listener(Arc::new(Spawner {
            handler: handler.clone(),
            late: late.clone(),
        }));

        handler.highlight([1]).unwrap();
        assert!(late.take().is_empty());

        handler.highlight([2]).unwrap();
        assert_eq!(late.take(), vec![Seen::Highlight(vec![2])]);

        // Break the Arc cycle between handler and spawner.
        handler.remove_all_listeners();
    }

    #[test]
    fn test_listener_removed_during_callback_still_sees_current_event() {
        struct Remover {
            handler: Arc<HighlightHandler<u32>>,
            victim: Mutex<Option<ListenerId>>,
        }

        impl HighlightListener<u32> for Remover {
            fn on_highlight(&self, _event: &KeyEvent<u32>) -> Result<()> {
                if let Some(id) = self.victim.lock().take() {
                    assert!(self.handler.remove_listener_id(id));
                }
                Ok(())
            }
        }

        let handler = Arc::new(HighlightHandler::<u32>::new());
        let remover = Arc::new(Remover {
            handler: handler.clone(),
            victim: Mutex::new(None),
        });
        handler.add_listener(remover.clone());
        let later = recorded(&handler);
        let later_id = handler.add_listener(later.clone());
        *remover.victim.lock() = Some(later_id);

        handler.highlight([1]).unwrap();
        assert_eq!(later.take(), vec![Seen::Highlight(vec![1])]);
        assert_eq!(handler.listener_count(), 1);

        handler.highlight([2]).unwrap();
        assert!(later.take().is_empty());

        handler.remove_all_listeners();
    }

    #[test]
    fn test_lazy_input_may_query_the_handler() {
        let handler = HighlightHandler::<u32>::new();
        handler.highlight([1]).unwrap();
        let recorder = recorded(&handler);

        handler
            .highlight((0..4).filter(|k| !handler.contains(k)))
            .unwrap();
        handler
            .unhighlight((0..4).filter(|k| handler.contains(k) && k % 2 == 0))
            .unwrap();

        assert_eq!(
            recorder.take(),
            vec![Seen::Highlight(vec![0, 2, 3]), Seen::Unhighlight(vec![0, 2])]
        );
        assert!(handler.is_highlighted([1, 3].iter().filter(|k| handler.contains(k))));
        assert_eq!(handler.highlighted_keys(), BTreeSet::from([1, 3]));
    }

    #[test]
    fn test_event_keys_are_in_key_order() {
        let handler = HighlightHandler::<u32>::new();
        let recorder = recorded(&handler);

        handler.highlight([30, 10, 20]).unwrap();

        assert_eq!(recorder.take(), vec![Seen::Highlight(vec![10, 20, 30])]);
        assert_eq!(
            handler.highlighted_keys().into_iter().collect::<Vec<_>>(),
            vec![10, 20, 30]
        );
    }

    #[test]
    fn test_reentrant_query_sees_updated_set() {
        struct Checker {
            handler: Arc<HighlightHandler<u32>>,
            observed: Mutex<Option<bool>>,
        }

        impl HighlightListener<u32> for Checker {
            fn on_highlight(&self, event: &KeyEvent<u32>) -> Result<()> {
                *self.observed.lock() = Some(self.handler.is_highlighted(event.keys()));
                Ok(())
            }
        }

        let handler = Arc::new(HighlightHandler::<u32>::new());
        let checker = Arc::new(Checker {
            handler: handler.clone(),
            observed: Mutex::new(None),
        });
        handler.add_listener(checker.clone());

        handler.highlight([4, 5]).unwrap();
        assert_eq!(*checker.observed.lock(), Some(true));

        handler.remove_all_listeners();
    }

    #[test]
    fn test_event_source_is_handler_id() {
        struct SourceCheck {
            seen: Mutex<Vec<HandlerId>>,
        }

        impl HighlightListener<u32> for SourceCheck {
            fn on_highlight(&self, event: &KeyEvent<u32>) -> Result<()> {
                self.seen.lock().push(event.source());
                Ok(())
            }

            fn on_reset(&self, source: HandlerId) -> Result<()> {
                self.seen.lock().push(source);
                Ok(())
            }
        }

        let handler = HighlightHandler::<u32>::new();
        let check = Arc::new(SourceCheck {
            seen: Mutex::new(Vec::new()),
        });
        handler.add_listener(check.clone());

        handler.highlight([1]).unwrap();
        handler.reset_all().unwrap();

        assert_eq!(*check.seen.lock(), vec![handler.id(), handler.id()]);
    }

    #[test]
    fn test_concurrent_highlights_emit_each_key_once() {
        let handler = Arc::new(HighlightHandler::<u32>::new());
        let recorder = recorded(&handler);

        let mut handles = vec![];
        for t in 0..8u32 {
            let handler = handler.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..50u32 {
                    // Overlapping ranges: every key is offered by two threads.
                    handler.highlight([(t / 2) * 50 + i]).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let mut emitted: Vec<u32> = recorder
            .take()
            .into_iter()
            .flat_map(|seen| match seen {
                Seen::Highlight(keys) => keys,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        emitted.sort_unstable();

        assert_eq!(emitted, (0..200).collect::<Vec<_>>());
        assert_eq!(handler.highlighted_count(), 200);
    }
}
