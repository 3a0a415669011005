//! Wait list — bounded set of blocked task ids
//!
//! Order is irrelevant: the only extraction is by priority. One list per
//! semaphore; any other blocking primitive can reuse it.
//!
//! Author: Moroya Sakamoto

use crate::task::{Tcb, TaskId, MAX_TASKS};

/// Fixed-capacity, slot-based set of task ids
#[derive(Debug, Clone, Copy)]
pub struct WaitList {
    slots: [Option<TaskId>; MAX_TASKS],
}

impl WaitList {
    /// Create an empty list
    pub const fn new() -> Self {
        Self { slots: [None; MAX_TASKS] }
    }

    /// Insert `id` into a free slot
    ///
    /// Returns false if the list is full. Inserting a member again is a no-op.
    pub fn add(&mut self, id: TaskId) -> bool {
        if self.contains(id) {
            return true;
        }
        match self.slots.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(id);
                true
            }
            None => false,
        }
    }

    /// Remove `id`, returns whether it was a member
    pub fn remove(&mut self, id: TaskId) -> bool {
        let mut found = false;
        for slot in self.slots.iter_mut().filter(|slot| **slot == Some(id)) {
            *slot = None;
            found = true;
        }
        found
    }

    /// Is `id` in the list?
    pub fn contains(&self, id: TaskId) -> bool {
        self.slots.contains(&Some(id))
    }

    /// No waiters?
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Number of waiters
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Iterate over the members, slot order
    pub fn iter(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.slots.iter().flatten().copied()
    }

    /// Remove and return the highest-priority member
    ///
    /// Priorities come from `tasks`; ties go to the lowest task id.
    /// Members without a task record are skipped.
    pub fn take_highest(&mut self, tasks: &[Tcb]) -> Option<TaskId> {
        let best = self
            .iter()
            .filter_map(|id| tasks.get(id.index()).map(|t| (t.priority, id)))
            .min()?;
        self.remove(best.1);
        Some(best.1)
    }
}

impl Default for WaitList {
    fn default() -> Self {
        Self::new()
    }
}
