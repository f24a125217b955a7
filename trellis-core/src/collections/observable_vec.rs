//! ObservableVec
//!
//! An ordered, index-addressable container that reports every mutation to an
//! observer: either a model's [`Notifier`](crate::object::Notifier) together
//! with the property name the sequence is exposed under, or a bare callback.
//!
//! Each mutating call notifies exactly once after the data has changed, no
//! matter how many elements it touched. Derived sequences (`slice`, `map`,
//! `filter`) are plain `Vec`s with no observer.
//!
//! # Locking
//!
//! The items sit behind a `parking_lot::RwLock`, so a model can own a
//! sequence directly and mutate it through `&self`. The write guard is
//! released before the observer fires: a handler or effect reacting to the
//! change may read the sequence again. Do not mutate while holding the guard
//! returned by [`ObservableVec::read`].

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};

use crate::error::{Error, Result};
use crate::object::{Change, Notify};

/// Where an [`ObservableVec`] sends its notifications.
#[derive(Clone, Default)]
pub enum SequenceObserver {
    /// Mutations are not reported.
    #[default]
    None,
    /// Notify `owner` that `property` changed.
    Owner {
        owner: Arc<dyn Notify>,
        property: String,
    },
    /// Call this function.
    Callback(Arc<dyn Fn() + Send + Sync>),
}

impl SequenceObserver {
    pub fn owner(owner: impl Notify + 'static, property: impl Into<String>) -> Self {
        SequenceObserver::Owner {
            owner: Arc::new(owner),
            property: property.into(),
        }
    }

    pub fn callback<F>(callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        SequenceObserver::Callback(Arc::new(callback))
    }

    fn fire(&self) {
        match self {
            SequenceObserver::None => {}
            SequenceObserver::Owner { owner, property } => {
                owner.notify(Change::property(property.as_str()))
            }
            SequenceObserver::Callback(callback) => callback(),
        }
    }
}

impl fmt::Debug for SequenceObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceObserver::None => f.write_str("None"),
            SequenceObserver::Owner { property, .. } => {
                f.debug_struct("Owner").field("property", property).finish()
            }
            SequenceObserver::Callback(_) => f.write_str("Callback"),
        }
    }
}


/// A lock-protected `Vec` that notifies its observer once per mutation.
pub struct ObservableVec<T> {
    items: RwLock<Vec<T>>,
    observer: RwLock<SequenceObserver>,
}

fn clamp_range(len: usize, start: usize, end: Option<usize>) -> (usize, usize) {
    let start = start.min(len);
    let end = end.unwrap_or(len).clamp(start, len);
    (start, end)
}

impl<T> ObservableVec<T> {
    /// An empty sequence with no observer.
    pub fn new() -> Self {
        Self::from_items(SequenceObserver::None, Vec::new())
    }

    /// An empty sequence reporting to `owner` under `property`.
    pub fn with_owner(owner: impl Notify + 'static, property: impl Into<String>) -> Self {
        Self::from_items(SequenceObserver::owner(owner, property), Vec::new())
    }

    /// An empty sequence reporting to `callback`.
    pub fn with_callback<F>(callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::from_items(SequenceObserver::callback(callback), Vec::new())
    }

    /// A sequence holding `items`. Construction does not notify.
    pub fn from_items(observer: SequenceObserver, items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: RwLock::new(items.into_iter().collect()),
            observer: RwLock::new(observer),
        }
    }

    /// Replace the observer. Rebinding itself does not notify.
    pub fn set_notify_handler(&self, observer: SequenceObserver) {
        *self.observer.write() = observer;
    }

    pub fn observer(&self) -> SequenceObserver {
        self.observer.read().clone()
    }

    /// Report a change made outside the mutating methods.
    pub fn notify(&self) {
        // Cloned out so the observer may rebind this sequence.
        let observer = self.observer.read().clone();
        observer.fire();
    }

    /// Run `f` under the write lock, then notify with the lock released.
    fn mutate<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> R {
        let result = f(&mut self.items.write());
        self.notify();
        result
    }

    /// Like `mutate`, but only notifies when `f` reports a change.
    fn mutate_if<R>(&self, f: impl FnOnce(&mut Vec<T>) -> Option<R>) -> Option<R> {
        let result = f(&mut self.items.write());
        if result.is_some() {
            self.notify();
        }
        result
    }

    /// Shared access to the items.
    pub fn read(&self) -> MappedRwLockReadGuard<'_, [T]> {
        RwLockReadGuard::map(self.items.read(), Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Append one item. Returns the new length.
    pub fn push(&self, item: T) -> usize {
        self.mutate(|items| {
            items.push(item);
            items.len()
        })
    }

    /// Alias of [`push`](Self::push).
    pub fn add(&self, item: T) -> usize {
        self.push(item)
    }

    /// Append many items with a single notification. Returns the new length.
    pub fn push_all(&self, new_items: impl IntoIterator<Item = T>) -> usize {
        self.mutate(|items| {
            items.extend(new_items);
            items.len()
        })
    }

    /// Remove the last item.
    pub fn pop(&self) -> Option<T> {
        self.mutate(Vec::pop)
    }

    /// Remove the first item.
    pub fn shift(&self) -> Option<T> {
        self.mutate(|items| (!items.is_empty()).then(|| items.remove(0)))
    }

    /// Prepend items, keeping their order. Returns the new length.
    pub fn unshift(&self, new_items: impl IntoIterator<Item = T>) -> usize {
        self.mutate(|items| {
            items.splice(0..0, new_items);
            items.len()
        })
    }

    /// Insert at `index`, clamped to the length. Returns the new length.
    pub fn insert(&self, index: usize, item: T) -> usize {
        self.mutate(|items| {
            items.insert(index.min(items.len()), item);
            items.len()
        })
    }

    /// Remove the item at `index`. Out of range returns `None` silently.
    pub fn remove_at(&self, index: usize) -> Option<T> {
        self.mutate_if(|items| (index < items.len()).then(|| items.remove(index)))
    }

    /// Remove the first item equal to `item`. Returns whether one was found.
    pub fn remove(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.mutate_if(|items| {
            let index = items.iter().position(|candidate| candidate == item)?;
            Some(items.remove(index))
        })
        .is_some()
    }

    /// Remove everything. Clearing an empty sequence does not notify.
    pub fn clear(&self) {
        self.mutate_if(|items| (!items.is_empty()).then(|| items.clear()));
    }

    /// Overwrite the item at `index`, returning the previous one.
    pub fn set_item(&self, index: usize, item: T) -> Result<T> {
        let mut len = 0;
        self.mutate_if(|items| {
            len = items.len();
            items
                .get_mut(index)
                .map(|slot| std::mem::replace(slot, item))
        })
        .ok_or(Error::IndexOutOfBounds { index, len })
    }

    /// Remove `delete_count` items at `start` and insert `items` there.
    ///
    /// Both bounds are clamped. Returns the removed items.
    pub fn splice(
        &self,
        start: usize,
        delete_count: usize,
        new_items: impl IntoIterator<Item = T>,
    ) -> Vec<T> {
        self.mutate(|items| {
            let end = Some(start.saturating_add(delete_count));
            let (start, end) = clamp_range(items.len(), start, end);
            items.splice(start..end, new_items).collect()
        })
    }

    pub fn sort(&self)
    where
        T: Ord,
    {
        self.mutate(|items| items.sort());
    }

    /// Stable sort with a comparator.
    pub fn sort_by<F>(&self, compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.mutate(|items| items.sort_by(compare));
    }

    pub fn reverse(&self) {
        self.mutate(|items| items.reverse());
    }

    /// Copy `start..end` over the items beginning at `target`.
    ///
    /// The copied run is truncated at the end of the sequence; the length
    /// never changes.
    pub fn copy_within(&self, target: usize, start: usize, end: Option<usize>)
    where
        T: Clone,
    {
        self.mutate(|items| {
            let len = items.len();
            let (start, end) = clamp_range(len, start, end);
            let target = target.min(len);
            let count = (end - start).min(len - target);

            let run: Vec<T> = items[start..start + count].to_vec();
            for (slot, item) in items[target..target + count].iter_mut().zip(run) {
                *slot = item;
            }
        });
    }

    /// Overwrite `start..end` with clones of `value`.
    pub fn fill(&self, value: T, start: usize, end: Option<usize>)
    where
        T: Clone,
    {
        self.mutate(|items| {
            let (start, end) = clamp_range(items.len(), start, end);
            items[start..end].fill(value);
        });
    }

    /// Clone of the item at `index`.
    pub fn get(&self, index: usize) -> Option<T>
    where
        T: Clone,
    {
        self.items.read().get(index).cloned()
    }

    /// Position of the first item equal to `item`.
    pub fn index_of(&self, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.items
            .read()
            .iter()
            .position(|candidate| candidate == item)
    }

    /// A plain copy of `start..end`, clamped.
    pub fn slice(&self, start: usize, end: Option<usize>) -> Vec<T>
    where
        T: Clone,
    {
        let items = self.items.read();
        let (start, end) = clamp_range(items.len(), start, end);
        items[start..end].to_vec()
    }

    pub fn map<U, F>(&self, f: F) -> Vec<U>
    where
        F: FnMut(&T) -> U,
    {
        self.items.read().iter().map(f).collect()
    }

    pub fn filter<F>(&self, mut predicate: F) -> Vec<T>
    where
        T: Clone,
        F: FnMut(&T) -> bool,
    {
        self.items
            .read()
            .iter()
            .filter(|item| predicate(item))
            .cloned()
            .collect()
    }

    /// A plain copy of every item.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.items.read().clone()
    }

    /// Take the items, dropping the observer.
    pub fn into_vec(self) -> Vec<T> {
        self.items.into_inner()
    }
}

impl<T> Default for ObservableVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableVec")
            .field("items", &*self.items.read())
            .field("observer", &*self.observer.read())
            .finish()
    }
}
