//! Dense slot allocation for task ids.
//!
//! Maps the persistence layer's sparse `i64` ids onto `0..n` so the graph
//! passes can use plain vectors for their per-call state.

use rustc_hash::FxHashMap;

use crate::models::TaskKey;

/// Dense slot index for a task within one computation.
pub type Slot = u32;

/// Bidirectional mapping between task ids and dense slots.
#[derive(Debug, Clone)]
pub struct TaskIdInterner {
    to_slot: FxHashMap<TaskKey, Slot>,
    from_slot: Vec<TaskKey>,
}

impl TaskIdInterner {
    /// Create a new interner with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            to_slot: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            from_slot: Vec::with_capacity(capacity),
        }
    }

    /// Intern an id, returning its slot. Slots are handed out in first-seen order.
    pub fn intern(&mut self, id: TaskKey) -> Slot {
        if let Some(&slot) = self.to_slot.get(&id) {
            return slot;
        }
        let slot = self.from_slot.len() as Slot;
        self.from_slot.push(id);
        self.to_slot.insert(id, slot);
        slot
    }

    #[inline]
    pub fn get(&self, id: TaskKey) -> Option<Slot> {
        self.to_slot.get(&id).copied()
    }

    /// Task id stored in a slot.
    ///
    /// Panics if the slot was not produced by this interner.
    #[inline]
    pub fn resolve(&self, slot: Slot) -> TaskKey {
        self.from_slot[slot as usize]
    }

    /// All interned ids in slot order.
    pub fn ids(&self) -> &[TaskKey] {
        &self.from_slot
    }

    pub fn len(&self) -> usize {
        self.from_slot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.from_slot.is_empty()
    }
}

impl Default for TaskIdInterner {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}
