//! Key mappers: the coarse-to-fine relation a translator forwards through.
//!
//! A [`KeyMapper`] answers "which fine-domain keys belong to this coarse
//! key?", for example "which rows belong to this cluster?". No answer and an
//! empty answer mean the same thing: the key is not translated.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::key::HighlightKey;

/// Failure reported by a [`KeyMapper`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct MapperError {
    message: String,
}

impl MapperError {
    /// Create a mapper error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Maps one coarse-domain key to the fine-domain keys it stands for.
///
/// Implementations must be pure queries. Returning `Ok(None)` or an empty set
/// drops the key from the translation.
pub trait KeyMapper<C, F>: Send + Sync {
    /// The fine-domain keys for `key`.
    fn keys(&self, key: &C) -> Result<Option<BTreeSet<F>>, MapperError>;
}

/// A [`KeyMapper`] backed by a lookup table.
///
/// # Example
///
/// ```
/// use std::collections::BTreeSet;
/// use hilite_core::{KeyMapper, StaticKeyMapper};
///
/// let mut clusters = StaticKeyMapper::new();
/// clusters.insert("cluster-0", ["row-1", "row-4"]);
/// clusters.insert("cluster-1", ["row-2"]);
///
/// assert_eq!(
///     clusters.keys(&"cluster-0").unwrap(),
///     Some(BTreeSet::from(["row-1", "row-4"]))
/// );
/// assert_eq!(clusters.keys(&"cluster-9").unwrap(), None);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct StaticKeyMapper<C, F> {
    table: BTreeMap<C, BTreeSet<F>>,
}

impl<C: HighlightKey, F: HighlightKey> Default for StaticKeyMapper<C, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: HighlightKey, F: HighlightKey> StaticKeyMapper<C, F> {
    /// Create an empty mapper.
    pub fn new() -> Self {
        Self {
            table: BTreeMap::new(),
        }
    }

    /// Add fine-domain keys to the mapping of `coarse`.
    pub fn insert<I>(&mut self, coarse: C, fine: I)
    where
        I: IntoIterator<Item = F>,
    {
        self.table.entry(coarse).or_default().extend(fine);
    }

    /// Remove the mapping of `coarse`, returning its fine-domain keys.
    pub fn remove(&mut self, coarse: &C) -> Option<BTreeSet<F>> {
        self.table.remove(coarse)
    }

    /// The fine-domain keys currently mapped from `coarse`.
    pub fn get(&self, coarse: &C) -> Option<&BTreeSet<F>> {
        self.table.get(coarse)
    }

    /// Number of coarse keys with a mapping.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if no coarse key has a mapping.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Iterate over every coarse key and its fine-domain keys.
    pub fn iter(&self) -> impl Iterator<Item = (&C, &BTreeSet<F>)> {
        self.table.iter()
    }

    /// The reverse relation: every fine key mapped to the coarse keys that
    /// contain it.
    ///
    /// Useful for linking two domains in both directions with two translators.
    pub fn inverse(&self) -> StaticKeyMapper<F, C> {
        let mut inverse = StaticKeyMapper::new();
        for (coarse, fine) in &self.table {
            for key in fine {
                inverse.insert(key.clone(), [coarse.clone()]);
            }
        }
        inverse
    }
}

impl<C: HighlightKey, F: HighlightKey> KeyMapper<C, F> for StaticKeyMapper<C, F> {
    fn keys(&self, key: &C) -> Result<Option<BTreeSet<F>>, MapperError> {
        Ok(self.table.get(key).cloned())
    }
}

impl<C: HighlightKey, F: HighlightKey, I> FromIterator<(C, I)> for StaticKeyMapper<C, F>
where
    I: IntoIterator<Item = F>,
{
    fn from_iter<T: IntoIterator<Item = (C, I)>>(iter: T) -> Self {
        let mut mapper = Self::new();
        mapper.extend(iter);
        mapper
    }
}

impl<C: HighlightKey, F: HighlightKey, I> Extend<(C, I)> for StaticKeyMapper<C, F>
where
    I: IntoIterator<Item = F>,
{
    fn extend<T: IntoIterator<Item = (C, I)>>(&mut self, iter: T) {
        for (coarse, fine) in iter {
            self.insert(coarse, fine);
        }
    }
}

impl<C: fmt::Debug, F: fmt::Debug> fmt::Debug for StaticKeyMapper<C, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.table.iter()).finish()
    }
}

/// A [`KeyMapper`] computed by a closure. Created with [`mapper_fn`].
pub struct FnKeyMapper<M> {
    map: M,
}

/// Wrap a closure as a [`KeyMapper`].
///
/// ```
/// use std::collections::BTreeSet;
/// use hilite_core::{mapper_fn, KeyMapper};
///
/// // Every bucket holds ten consecutive rows.
/// let buckets = mapper_fn(|bucket: &u32| Ok(Some((bucket * 10..bucket * 10 + 10).collect())));
/// let rows: BTreeSet<u32> = buckets.keys(&2).unwrap().unwrap();
/// assert_eq!(rows.first(), Some(&20));
/// assert_eq!(rows.len(), 10);
/// ```
pub fn mapper_fn<C, F, M>(map: M) -> FnKeyMapper<M>
where
    M: Fn(&C) -> Result<Option<BTreeSet<F>>, MapperError> + Send + Sync,
{
    FnKeyMapper { map }
}

impl<C, F, M> KeyMapper<C, F> for FnKeyMapper<M>
where
    M: Fn(&C) -> Result<Option<BTreeSet<F>>, MapperError> + Send + Sync,
{
    fn keys(&self, key: &C) -> Result<Option<BTreeSet<F>>, MapperError> {
        (self.map)(key)
    }
}

impl<M> fmt::Debug for FnKeyMapper<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnKeyMapper").finish_non_exhaustive()
    }
}
