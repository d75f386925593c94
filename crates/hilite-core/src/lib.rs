//! Core highlight synchronization for Hilite.
//!
//! This crate keeps track of which rows are highlighted in a data view and
//! keeps several views in sync:
//!
//! - **Handlers**: one [`HighlightHandler`] per key domain, owning the set of
//!   highlighted keys and notifying listeners about every actual change
//! - **Listeners**: anything implementing [`HighlightListener`] can register
//!   on a handler to be told about highlights, unhighlights and resets
//! - **Translators**: a [`HighlightTranslator`] links a coarse domain
//!   (clusters) to fine domains (rows) through a [`KeyMapper`], and lets a
//!   reset anywhere in the link clear every linked domain
//!
//! Everything runs synchronously on the calling thread. There is no event
//! loop and no background work.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use hilite_core::{
//!     HandlerId, HighlightHandler, HighlightListener, HighlightTranslator, KeyEvent, Result,
//!     StaticKeyMapper,
//! };
//!
//! struct Table;
//!
//! impl HighlightListener<String> for Table {
//!     fn on_highlight(&self, event: &KeyEvent<String>) -> Result<()> {
//!         println!("repaint {} rows", event.len());
//!         Ok(())
//!     }
//!
//!     fn on_reset(&self, _source: HandlerId) -> Result<()> {
//!         println!("repaint everything");
//!         Ok(())
//!     }
//! }
//!
//! let clusters = Arc::new(HighlightHandler::<u32>::new());
//! let rows = Arc::new(HighlightHandler::<String>::new());
//! rows.add_listener(Arc::new(Table));
//!
//! let mut members = StaticKeyMapper::new();
//! members.insert(7, ["Row0".to_string(), "Row5".to_string()]);
//!
//! let translator = HighlightTranslator::with_mapper(clusters.clone(), members);
//! translator.add_target(rows.clone())?;
//!
//! clusters.highlight([7])?;
//! assert_eq!(rows.highlighted_count(), 2);
//! # Ok::<(), hilite_core::HiliteError>(())
//! ```

mod cascade;
mod config;
mod error;
mod handler;
mod key;
mod listener;
pub mod logging;
mod mapper;
mod translator;

pub use cascade::cascade_depth;
pub use config::{HandlerBuilder, HandlerConfig};
pub use error::{HiliteError, Result};
pub use handler::HighlightHandler;
pub use key::{HandlerId, HighlightKey, KeyEvent};
pub use listener::{HighlightListener, ListenerId};
pub use mapper::{mapper_fn, FnKeyMapper, KeyMapper, MapperError, StaticKeyMapper};
pub use translator::HighlightTranslator;
