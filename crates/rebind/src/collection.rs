#![forbid(unsafe_code)]

//! An observable sequence with freeze-batched change notifications.
//!
//! [`ObservableVec`] is a mutable ordered sequence that announces every
//! structural mutation through a [`ListChange`] event. For bulk loads, the
//! notification stream can be *frozen*: mutations still take effect
//! immediately, but instead of one event per mutation the listeners receive
//! at most one trailing [`ListChange::Reset`] when the freeze is released.
//!
//! Freezing nests: `freeze()` increments a depth counter and `unfreeze()`
//! decrements it; events flow again only at depth zero. Unfreezing past zero
//! is a programmer error reported synchronously at the offending call.
//!
//! ```
//! use rebind::collection::ObservableVec;
//! # use std::cell::Cell;
//! # use std::rc::Rc;
//!
//! let list: ObservableVec<i32> = ObservableVec::new();
//! let events = Rc::new(Cell::new(0));
//! let seen = Rc::clone(&events);
//! let _sub = list.subscribe(move |_change| seen.set(seen.get() + 1));
//!
//! list.freeze();
//! for i in 0..100 {
//!     list.push(i);
//! }
//! list.unfreeze().unwrap();
//!
//! assert_eq!(list.len(), 100);
//! assert_eq!(events.get(), 1, "one coalesced Reset for the whole load");
//! ```
//!
//! # Invariants
//!
//! 1. The underlying data mutation always takes effect; freezing gates only
//!    the *notification*.
//! 2. At depth zero every mutation emits immediately, one event per
//!    mutation, no coalescing.
//! 3. `changed_while_frozen()` is true iff a mutation occurred during the
//!    current freeze epoch and no flush has happened since. **Every**
//!    `freeze()` call starts a new epoch — including nested ones. A mutation
//!    observed at depth 1 followed by a nested freeze/unfreeze pair is
//!    therefore forgotten by the time the outer freeze releases. This
//!    mirrors the long-standing behavior of the freeze protocol this type
//!    is modeled on; callers that nest freezes around mutations should
//!    prefer one [`frozen`](ObservableVec::frozen) scope around the whole
//!    bulk operation.
//! 4. The depth counter changes by exactly ±1 per freeze/unfreeze call and
//!    never goes negative: the unbalanced call fails, leaving depth at zero.
//! 5. The coalesced flush is a single `Reset` carrying no per-mutation
//!    detail.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::event::{Listeners, Subscription};

/// One structural mutation of an [`ObservableVec`].
///
/// `Reset` doubles as the coalesced-flush kind: it announces that the
/// sequence changed to an unknown extent and consumers should re-read it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListChange {
    /// An element was inserted at `index`.
    Insert {
        /// Position of the new element.
        index: usize,
    },
    /// The element at `index` was removed.
    Remove {
        /// Position the element was removed from.
        index: usize,
    },
    /// The element at `index` was replaced.
    Replace {
        /// Position of the replaced element.
        index: usize,
    },
    /// An element moved between positions.
    Move {
        /// Original position.
        from: usize,
        /// New position.
        to: usize,
    },
    /// The sequence changed to an unknown extent (cleared, or a coalesced
    /// batch of suppressed mutations).
    Reset,
}

/// Error from [`ObservableVec::unfreeze`] when notifications are not frozen.
///
/// Raised at exactly the call that would push the freeze depth below zero.
/// This is a programmer error — freezes and unfreezes must pair — and is
/// never retried or swallowed internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnfreezeError;

impl std::fmt::Display for UnfreezeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot unfreeze collection notifications: they are not frozen")
    }
}

impl std::error::Error for UnfreezeError {}

struct VecCore<T> {
    items: RefCell<Vec<T>>,
    freeze_depth: Cell<usize>,
    changed_while_frozen: Cell<bool>,
    auto_flush: bool,
    listeners: Listeners<ListChange>,
}

/// A mutable ordered sequence with gated change notifications.
///
/// Cloning yields another handle to the same sequence (single-threaded
/// shared ownership); all operations take `&self`. Duplicates and
/// absent-value elements (`Option` payloads) are ordinary values.
pub struct ObservableVec<T> {
    core: Rc<VecCore<T>>,
}

impl<T> Clone for ObservableVec<T> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
        }
    }
}

impl<T: 'static> Default for ObservableVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> ObservableVec<T> {
    /// An empty sequence that flushes automatically on unfreeze.
    #[must_use]
    pub fn new() -> Self {
        Self::from_vec_with_auto_flush(Vec::new(), true)
    }

    /// An empty sequence with the given flush policy.
    ///
    /// With `auto_flush` off, releasing the last freeze never emits; the
    /// caller observes [`changed_while_frozen`](Self::changed_while_frozen)
    /// and reacts itself.
    #[must_use]
    pub fn with_auto_flush(auto_flush: bool) -> Self {
        Self::from_vec_with_auto_flush(Vec::new(), auto_flush)
    }

    /// A sequence seeded with `items` (no events for the seed).
    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self::from_vec_with_auto_flush(items, true)
    }

    /// A seeded sequence with the given flush policy.
    #[must_use]
    pub fn from_vec_with_auto_flush(items: Vec<T>, auto_flush: bool) -> Self {
        Self {
            core: Rc::new(VecCore {
                items: RefCell::new(items),
                freeze_depth: Cell::new(0),
                changed_while_frozen: Cell::new(false),
                auto_flush,
                listeners: Listeners::new(),
            }),
        }
    }

    /// Register a change listener.
    pub fn subscribe(&self, callback: impl Fn(&ListChange) + 'static) -> Subscription {
        self.core.listeners.subscribe(callback)
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.core.items.borrow().len()
    }

    /// Whether the sequence is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.core.items.borrow().is_empty()
    }

    /// Run `f` over the current elements.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.core.items.borrow())
    }

    // ── Mutations ───────────────────────────────────────────────────
    //
    // Every mutation takes effect first, then funnels through `record`,
    // the single gated emission point.

    /// Append an element.
    pub fn push(&self, value: T) {
        let index = {
            let mut items = self.core.items.borrow_mut();
            items.push(value);
            items.len() - 1
        };
        self.record(ListChange::Insert { index });
    }

    /// Insert an element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`, as `Vec::insert` does.
    pub fn insert(&self, index: usize, value: T) {
        self.core.items.borrow_mut().insert(index, value);
        self.record(ListChange::Insert { index });
    }

    /// Remove and return the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`, as `Vec::remove` does.
    pub fn remove(&self, index: usize) -> T {
        let removed = self.core.items.borrow_mut().remove(index);
        self.record(ListChange::Remove { index });
        removed
    }

    /// Remove and return the last element, if any.
    pub fn pop(&self) -> Option<T> {
        let popped = {
            let mut items = self.core.items.borrow_mut();
            let value = items.pop()?;
            (value, items.len())
        };
        let (value, index) = popped;
        self.record(ListChange::Remove { index });
        Some(value)
    }

    /// Replace the element at `index`, returning the old one.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn set(&self, index: usize, value: T) -> T {
        let old = std::mem::replace(&mut self.core.items.borrow_mut()[index], value);
        self.record(ListChange::Replace { index });
        old
    }

    /// Move the element at `from` to position `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn move_item(&self, from: usize, to: usize) {
        {
            let mut items = self.core.items.borrow_mut();
            let value = items.remove(from);
            items.insert(to, value);
        }
        self.record(ListChange::Move { from, to });
    }

    /// Remove every element.
    ///
    /// Emits `Reset` (or marks the frozen epoch dirty) even when the
    /// sequence was already empty.
    pub fn clear(&self) {
        self.core.items.borrow_mut().clear();
        self.record(ListChange::Reset);
    }

    /// Append every element of `iter`, one `Insert` per element.
    ///
    /// Typically wrapped in a [`frozen`](Self::frozen) scope so a bulk load
    /// coalesces into a single `Reset`.
    pub fn extend(&self, iter: impl IntoIterator<Item = T>) {
        for value in iter {
            self.push(value);
        }
    }

    // ── Freeze protocol ─────────────────────────────────────────────

    /// Suppress change notifications until a matching [`unfreeze`].
    ///
    /// Calls nest; notifications resume when every freeze has been
    /// released. Every call starts a clean "changed while frozen" epoch
    /// (see the module invariants for the nested-freeze consequence).
    ///
    /// [`unfreeze`]: Self::unfreeze
    pub fn freeze(&self) {
        self.core.freeze_depth.set(self.core.freeze_depth.get() + 1);
        self.core.changed_while_frozen.set(false);
    }

    /// Release one freeze.
    ///
    /// On the release of the last freeze, if the sequence changed while
    /// frozen: with auto-flush on, emits a single coalesced
    /// [`ListChange::Reset`] and clears the dirty flag; with auto-flush
    /// off, leaves the flag set for the caller and emits nothing.
    ///
    /// # Errors
    ///
    /// [`UnfreezeError`] if notifications are not frozen — raised at exactly
    /// the unbalanced call, with the depth left at zero.
    pub fn unfreeze(&self) -> Result<(), UnfreezeError> {
        let depth = self.core.freeze_depth.get();
        if depth == 0 {
            #[cfg(feature = "tracing")]
            tracing::warn!("unbalanced unfreeze");
            return Err(UnfreezeError);
        }
        self.core.freeze_depth.set(depth - 1);
        if depth == 1 && self.core.auto_flush && self.core.changed_while_frozen.get() {
            #[cfg(feature = "tracing")]
            tracing::trace!("coalesced flush");
            self.core.listeners.emit(&ListChange::Reset);
            self.core.changed_while_frozen.set(false);
        }
        Ok(())
    }

    /// Freeze for the duration of a scope.
    ///
    /// The returned guard releases its freeze on drop, so freeze/unfreeze
    /// pairing holds on every exit path:
    ///
    /// ```
    /// # use rebind::collection::ObservableVec;
    /// let list: ObservableVec<u8> = ObservableVec::new();
    /// {
    ///     let _scope = list.frozen();
    ///     list.push(1);
    ///     list.push(2);
    /// } // single coalesced Reset here
    /// assert!(!list.is_frozen());
    /// ```
    #[must_use]
    pub fn frozen(&self) -> FreezeGuard<T> {
        self.freeze();
        FreezeGuard { list: self.clone() }
    }

    /// Whether notifications are currently suppressed.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.core.freeze_depth.get() > 0
    }

    /// Current freeze nesting depth (zero when not frozen).
    #[must_use]
    pub fn freeze_depth(&self) -> usize {
        self.core.freeze_depth.get()
    }

    /// Whether a mutation occurred during the current freeze epoch without
    /// a flush since. Meaningful to callers with auto-flush off.
    #[must_use]
    pub fn changed_while_frozen(&self) -> bool {
        self.core.changed_while_frozen.get()
    }

    /// The flush policy fixed at construction.
    #[must_use]
    pub fn auto_flush(&self) -> bool {
        self.core.auto_flush
    }

    /// The single gated emission point every mutation funnels through.
    fn record(&self, change: ListChange) {
        if self.core.freeze_depth.get() > 0 {
            self.core.changed_while_frozen.set(true);
            return;
        }
        self.core.listeners.emit(&change);
    }
}

impl<T: Clone + 'static> ObservableVec<T> {
    /// Clone of the element at `index`, if in range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.core.items.borrow().get(index).cloned()
    }

    /// Clone of the whole sequence.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.core.items.borrow().clone()
    }
}

impl<T: 'static> From<Vec<T>> for ObservableVec<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

impl<T: 'static> FromIterator<T> for ObservableVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ObservableVec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableVec")
            .field("items", &self.core.items.borrow())
            .field("freeze_depth", &self.core.freeze_depth.get())
            .field("changed_while_frozen", &self.core.changed_while_frozen.get())
            .finish()
    }
}

/// RAII scope holding one freeze on an [`ObservableVec`].
///
/// Created by [`ObservableVec::frozen`]; releases its freeze on drop.
pub struct FreezeGuard<T: 'static> {
    list: ObservableVec<T>,
}

impl<T: 'static> Drop for FreezeGuard<T> {
    fn drop(&mut self) {
        // Balanced by construction. A manual unfreeze() sneaked inside the
        // scope is the caller's imbalance; the guard does not panic in drop
        // over it.
        let _ = self.list.unfreeze();
    }
}

impl<T: 'static> std::fmt::Debug for FreezeGuard<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FreezeGuard")
            .field("depth", &self.list.freeze_depth())
            .finish()
    }
}
