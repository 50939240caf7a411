//! Recycling pool for card views.

use slotmap::SlotMap;
use tracing::trace;

use crate::error::PoolError;

slotmap::new_key_type! {
    /// Handle of a view owned by a [`ViewPool`].
    pub struct HandleId;
}

/// Lifecycle hooks a view must expose to live in a [`ViewPool`].
pub trait PoolableView {
    /// Model value the view is bound to.
    type Key;

    /// Whether the view currently represents, or last represented, `key`.
    fn matches(&self, key: &Self::Key) -> bool;

    /// Called before the view leaves the idle set. `is_new` is set for freshly created views.
    fn prepare_leave(&mut self, key: &Self::Key, is_new: bool);

    /// Bind the view to `key`.
    fn bind(&mut self, key: &Self::Key);

    /// Called before the view returns to the idle set.
    fn prepare_enter(&mut self);

    /// Drop the binding established by [`Self::bind`].
    fn unbind(&mut self);
}

#[derive(Debug)]
struct Slot<V> {
    view: V,
    in_use: bool,
}

/// Pool of reusable views.
///
/// There is no fixed capacity: views are created when no idle view is
/// available and trimmed with [`ViewPool::trim_idle`] when the visible set
/// shrinks.
#[derive(Debug)]
pub struct ViewPool<V> {
    slots: SlotMap<HandleId, Slot<V>>,
    idle: Vec<HandleId>,
}

impl<V> Default for ViewPool<V> {
    fn default() -> Self {
        Self {
            slots: SlotMap::with_key(),
            idle: Vec::new(),
        }
    }
}

impl<V: PoolableView> ViewPool<V> {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a view bound to `key`.
    ///
    /// An in-use view already bound to `key` is returned untouched. Otherwise an
    /// idle view that matches `key` is preferred, then the most recently released
    /// idle view, and only then is `create` invoked.
    pub fn acquire<F>(&mut self, key: &V::Key, create: F) -> HandleId
    where
        F: FnOnce() -> V,
    {
        if let Some(id) = self.find_in_use(key) {
            return id;
        }

        let preferred = self
            .idle
            .iter()
            .rposition(|id| self.slots.get(*id).is_some_and(|slot| slot.view.matches(key)));
        let reused = match preferred {
            Some(pos) => Some(self.idle.remove(pos)),
            None => self.idle.pop(),
        };

        let (id, is_new) = match reused {
            Some(id) => (id, false),
            None => {
                let id = self.slots.insert(Slot {
                    view: create(),
                    in_use: false,
                });
                trace!(total = self.slots.len(), "view pool grew");
                (id, true)
            }
        };

        if let Some(slot) = self.slots.get_mut(id) {
            slot.view.prepare_leave(key, is_new);
            slot.view.bind(key);
            slot.in_use = true;
        }
        id
    }

    /// Return an in-use view to the idle set.
    ///
    /// # Errors
    /// [`PoolError::UnknownHandle`] for handles this pool does not own and
    /// [`PoolError::NotInUse`] for views that are already idle.
    pub fn release(&mut self, id: HandleId) -> Result<(), PoolError> {
        let slot = self.slots.get_mut(id).ok_or(PoolError::UnknownHandle(id))?;
        if !slot.in_use {
            return Err(PoolError::NotInUse(id));
        }
        slot.view.prepare_enter();
        slot.view.unbind();
        slot.in_use = false;
        self.idle.push(id);
        Ok(())
    }

    /// Drop idle views beyond `keep`, oldest first. Returns how many were dropped.
    pub fn trim_idle(&mut self, keep: usize) -> usize {
        if self.idle.len() <= keep {
            return 0;
        }
        let excess = self.idle.len() - keep;
        for id in self.idle.drain(..excess) {
            self.slots.remove(id);
        }
        trace!(dropped = excess, total = self.slots.len(), "view pool trimmed");
        excess
    }

    /// Borrow a view.
    #[must_use]
    pub fn get(&self, id: HandleId) -> Option<&V> {
        self.slots.get(id).map(|slot| &slot.view)
    }

    /// Mutably borrow a view.
    pub fn get_mut(&mut self, id: HandleId) -> Option<&mut V> {
        self.slots.get_mut(id).map(|slot| &mut slot.view)
    }

    /// Whether `id` refers to an in-use view.
    #[must_use]
    pub fn is_in_use(&self, id: HandleId) -> bool {
        self.slots.get(id).is_some_and(|slot| slot.in_use)
    }

    /// In-use view bound to `key`, if any.
    #[must_use]
    pub fn find_in_use(&self, key: &V::Key) -> Option<HandleId> {
        self.slots
            .iter()
            .find(|(_, slot)| slot.in_use && slot.view.matches(key))
            .map(|(id, _)| id)
    }

    /// Iterate over in-use views.
    pub fn in_use(&self) -> impl Iterator<Item = (HandleId, &V)> + '_ {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.in_use)
            .map(|(id, slot)| (id, &slot.view))
    }

    /// Number of idle views.
    #[must_use]
    pub fn idle_len(&self) -> usize {
        self.idle.len()
    }

    /// Number of in-use views.
    #[must_use]
    pub fn in_use_len(&self) -> usize {
        self.slots.len() - self.idle.len()
    }
}
