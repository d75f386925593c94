//! Translation of highlight events between two key domains.
//!
//! A [`HighlightTranslator`] listens to one source handler of coarse keys
//! (clusters, groups, bins) and re-issues every change on its target handlers
//! of fine keys (the rows in those clusters), using a [`KeyMapper`].
//!
//! Only resets travel the other way: a target clearing all of its keys
//! resets the source too, which in turn resets every other target. Individual
//! highlight changes on a target are never mapped back, because a mapper has
//! no inverse.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use hilite_core::{HighlightHandler, HighlightTranslator, StaticKeyMapper};
//!
//! let clusters = Arc::new(HighlightHandler::<u32>::new());
//! let rows = Arc::new(HighlightHandler::<&'static str>::new());
//!
//! let members: StaticKeyMapper<u32, &'static str> =
//!     [(0, vec!["row-1", "row-3"]), (1, vec!["row-2"])].into_iter().collect();
//!
//! let translator = HighlightTranslator::with_mapper(clusters.clone(), members);
//! translator.add_target(rows.clone()).unwrap();
//!
//! clusters.highlight([0]).unwrap();
//! assert!(rows.is_highlighted(&["row-1", "row-3"]));
//!
//! // Clearing the rows clears the clusters as well.
//! rows.reset_all().unwrap();
//! assert!(clusters.is_empty());
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::error::{HiliteError, Result};
use crate::handler::HighlightHandler;
use crate::key::{HandlerId, HighlightKey, KeyEvent};
use crate::listener::{HighlightListener, ListenerId};
use crate::logging::{targets, KeySummary};
use crate::mapper::KeyMapper;

type SharedMapper<C, F> = Arc<dyn KeyMapper<C, F>>;

/// A target handler and the reset link installed on it.
struct Target<F> {
    handler: Arc<HighlightHandler<F>>,
    reset_link: ListenerId,
}

/// State shared between the translator and the listener it registers on the
/// source.
struct Shared<C, F> {
    source: Arc<HighlightHandler<C>>,
    mapper: RwLock<Option<SharedMapper<C, F>>>,
    targets: RwLock<Vec<Target<F>>>,
}

/// Which operation a translated event is replayed as.
#[derive(Clone, Copy, Debug)]
enum Direction {
    Highlight,
    Unhighlight,
}

impl<C: HighlightKey, F: HighlightKey> Shared<C, F> {
    fn target_handlers(&self) -> Vec<Arc<HighlightHandler<F>>> {
        self.targets
            .read()
            .iter()
            .map(|target| target.handler.clone())
            .collect()
    }

    /// Map an incoming event and replay it on every target.
    #[tracing::instrument(skip_all, target = "hilite_core::translator", level = "trace")]
    fn forward(&self, event: &KeyEvent<C>, direction: Direction) -> Result<()> {
        let Some(mapper) = self.mapper.read().clone() else {
            return Ok(());
        };
        let handlers = self.target_handlers();
        if handlers.is_empty() {
            return Ok(());
        }

        // Map every key before touching any target.
        let mut mapped = BTreeSet::new();
        for key in event.keys() {
            match mapper.keys(key) {
                Ok(Some(fine)) => mapped.extend(fine),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(
                        target: targets::TRANSLATOR,
                        source = %self.source.id(),
                        key = ?key,
                        error = %err,
                        "key mapper failed, event not translated"
                    );
                    return Err(err.into());
                }
            }
        }
        if mapped.is_empty() {
            tracing::trace!(
                target: targets::TRANSLATOR,
                keys = %KeySummary::new(event.keys()),
                "no key has a mapping"
            );
            return Ok(());
        }

        tracing::trace!(
            target: targets::TRANSLATOR,
            ?direction,
            targets = handlers.len(),
            keys = %KeySummary::new(&mapped),
            "forwarding translated keys"
        );
        let mut first_error = None;
        for handler in &handlers {
            let result = match direction {
                Direction::Highlight => handler.highlight(mapped.iter().cloned()),
                Direction::Unhighlight => handler.unhighlight(mapped.iter().cloned()),
            };
            if let Err(err) = result {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn reset_targets(&self) -> Result<()> {
        let mut first_error = None;
        for handler in self.target_handlers() {
            if let Err(err) = handler.reset_all() {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// The listener a translator registers on its source.
///
/// Holds the shared state weakly so the source never keeps a dropped
/// translator alive.
struct SourceLink<C, F> {
    shared: Weak<Shared<C, F>>,
}

impl<C: HighlightKey, F: HighlightKey> HighlightListener<C> for SourceLink<C, F> {
    fn on_highlight(&self, event: &KeyEvent<C>) -> Result<()> {
        match self.shared.upgrade() {
            Some(shared) => shared.forward(event, Direction::Highlight),
            None => Ok(()),
        }
    }

    fn on_unhighlight(&self, event: &KeyEvent<C>) -> Result<()> {
        match self.shared.upgrade() {
            Some(shared) => shared.forward(event, Direction::Unhighlight),
            None => Ok(()),
        }
    }

    fn on_reset(&self, _source: HandlerId) -> Result<()> {
        match self.shared.upgrade() {
            Some(shared) => shared.reset_targets(),
            None => Ok(()),
        }
    }
}

/// Installed on every target: ignores key changes and turns a reset of the
/// target into a reset of the source.
struct ResetLink<C> {
    source: Weak<HighlightHandler<C>>,
}

impl<C: HighlightKey, F> HighlightListener<F> for ResetLink<C> {
    fn on_reset(&self, _source: HandlerId) -> Result<()> {
        match self.source.upgrade() {
            Some(source) => source.reset_all(),
            None => Ok(()),
        }
    }
}

/// Forwards highlight changes from one source handler to any number of target
/// handlers through a [`KeyMapper`].
///
/// The translator registers itself on the source when created and stays
/// registered until it is dropped. Without a mapper, or without targets,
/// highlight and unhighlight events are ignored; resets of the source always
/// reach every target.
///
/// # Cycles
///
/// Forwarding is synchronous. A wiring in which a translator's targets lead
/// back to its own source recurses for as long as each hop changes something,
/// unless one of the handlers involved sets
/// [`HandlerConfig::max_cascade_depth`](crate::HandlerConfig::max_cascade_depth).
pub struct HighlightTranslator<C: HighlightKey, F: HighlightKey> {
    shared: Arc<Shared<C, F>>,
    source_link_id: ListenerId,
}

impl<C: HighlightKey, F: HighlightKey> HighlightTranslator<C, F> {
    /// Create a translator without a mapper and register it on `source`.
    pub fn new(source: Arc<HighlightHandler<C>>) -> Self {
        let shared = Arc::new(Shared {
            source,
            mapper: RwLock::new(None),
            targets: RwLock::new(Vec::new()),
        });
        let link = Arc::new(SourceLink {
            shared: Arc::downgrade(&shared),
        });
        let source_link_id = shared.source.add_listener(link);
        tracing::debug!(
            target: targets::CORE,
            source = %shared.source.id(),
            "translator attached"
        );
        Self {
            shared,
            source_link_id,
        }
    }

    /// Create a translator with an initial mapper and register it on `source`.
    ///
    /// The source is not reset.
    pub fn with_mapper<M>(source: Arc<HighlightHandler<C>>, mapper: M) -> Self
    where
        M: KeyMapper<C, F> + 'static,
    {
        let translator = Self::new(source);
        *translator.shared.mapper.write() = Some(Arc::new(mapper));
        translator
    }

    /// The handler events are translated from.
    pub fn source(&self) -> &Arc<HighlightHandler<C>> {
        &self.shared.source
    }

    /// Replace the mapper.
    ///
    /// The source is reset first, so every target and every other listener of
    /// the source sees a reset before keys are translated with the new
    /// mapping.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while resetting. The mapper is replaced
    /// regardless, since the source is already empty at that point.
    pub fn set_mapper<M>(&self, mapper: M) -> Result<()>
    where
        M: KeyMapper<C, F> + 'static,
    {
        self.replace_mapper(Some(Arc::new(mapper)))
    }

    /// Remove the mapper, resetting the source first.
    ///
    /// # Errors
    ///
    /// Same as [`set_mapper`](Self::set_mapper).
    pub fn clear_mapper(&self) -> Result<()> {
        self.replace_mapper(None)
    }

    fn replace_mapper(&self, mapper: Option<SharedMapper<C, F>>) -> Result<()> {
        // No source mutation may slip in between the reset and the swap.
        let reset = {
            let _dispatch = self.shared.source.dispatch.lock();
            let reset = self.shared.source.reset_all();
            *self.shared.mapper.write() = mapper;
            reset
        };
        tracing::debug!(
            target: targets::TRANSLATOR,
            source = %self.shared.source.id(),
            has_mapper = self.has_mapper(),
            "translator mapper replaced"
        );
        reset
    }

    /// Returns `true` if a mapper is installed.
    pub fn has_mapper(&self) -> bool {
        self.shared.mapper.read().is_some()
    }

    /// Add a target handler.
    ///
    /// Also installs a reset link on the target: resetting the target resets
    /// the source. Returns `false` if the handler already was a target.
    ///
    /// # Errors
    ///
    /// Returns [`HiliteError::SelfTarget`] if `handler` is this translator's
    /// source.
    pub fn add_target(&self, handler: Arc<HighlightHandler<F>>) -> Result<bool> {
        if handler.id() == self.shared.source.id() {
            return Err(HiliteError::SelfTarget(handler.id()));
        }

        let is_target =
            |targets: &[Target<F>]| targets.iter().any(|t| t.handler.id() == handler.id());
        if is_target(self.shared.targets.read().as_slice()) {
            return Ok(false);
        }

        // Registered without holding the targets lock: a reset running on the
        // target may need it.
        let reset_link = handler.add_listener(Arc::new(ResetLink {
            source: Arc::downgrade(&self.shared.source),
        }));
        let mut targets = self.shared.targets.write();
        if is_target(targets.as_slice()) {
            drop(targets);
            handler.remove_listener_id(reset_link);
            return Ok(false);
        }
        tracing::debug!(
            target: targets::TRANSLATOR,
            source = %self.shared.source.id(),
            target_handler = %handler.id(),
            "translation target added"
        );
        targets.push(Target {
            handler,
            reset_link,
        });
        Ok(true)
    }

    /// Remove a target handler and its reset link.
    ///
    /// Returns `true` if it was a target.
    pub fn remove_target(&self, handler: &HighlightHandler<F>) -> bool {
        let removed = {
            let mut targets = self.shared.targets.write();
            let position = targets.iter().position(|t| t.handler.id() == handler.id());
            position.map(|index| targets.remove(index))
        };
        match removed {
            Some(target) => {
                target.detach();
                true
            }
            None => false,
        }
    }

    /// Remove every target handler and their reset links.
    pub fn remove_all_targets(&self) {
        let removed = std::mem::take(&mut *self.shared.targets.write());
        for target in removed {
            target.detach();
        }
    }

    /// The current target handlers.
    pub fn targets(&self) -> Vec<Arc<HighlightHandler<F>>> {
        self.shared.target_handlers()
    }

    /// Number of target handlers.
    pub fn target_count(&self) -> usize {
        self.shared.targets.read().len()
    }
}

impl<F: HighlightKey> Target<F> {
    fn detach(self) {
        self.handler.remove_listener_id(self.reset_link);
        tracing::debug!(
            target: targets::TRANSLATOR,
            target_handler = %self.handler.id(),
            "translation target removed"
        );
    }
}

impl<C: HighlightKey, F: HighlightKey> Drop for HighlightTranslator<C, F> {
    fn drop(&mut self) {
        self.remove_all_targets();
        self.shared.source.remove_listener_id(self.source_link_id);
        tracing::debug!(
            target: targets::CORE,
            source = %self.shared.source.id(),
            "translator detached"
        );
    }
}

impl<C: HighlightKey, F: HighlightKey> fmt::Debug for HighlightTranslator<C, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let targets: Vec<HandlerId> = self
            .shared
            .targets
            .read()
            .iter()
            .map(|t| t.handler.id())
            .collect();
        f.debug_struct("HighlightTranslator")
            .field("source", &self.shared.source.id())
            .field("targets", &targets)
            .field("has_mapper", &self.has_mapper())
            .finish()
    }
}

static_assertions::assert_impl_all!(HighlightTranslator<u32, String>: Send, Sync);
