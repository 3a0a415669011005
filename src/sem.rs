//! Counting semaphore with direct hand-off
//!
//! `signal` with queued waiters readies one of them instead of bumping the
//! counter, so value > 0 and a non-empty wait list never coexist.
//!
//! Author: Moroya Sakamoto

use core::fmt;

use crate::list::WaitList;
use crate::task::{TaskId, Tcb};

/// Maximum semaphores per kernel
pub const MAX_SEMAPHORES: usize = 8;

/// Semaphore handle, issued by `Kernel::create_semaphore`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SemaphoreId(u8);

impl SemaphoreId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index as u8)
    }

    /// Storage slot
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SemaphoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sem#{}", self.0)
    }
}

/// Result of `Semaphore::signal`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// No waiter, counter incremented
    Incremented,
    /// No waiter and the counter is already at its maximum
    Saturated,
    /// Unit handed to this waiter
    HandedOff(TaskId),
}

/// Counting semaphore — value plus owned wait list
#[derive(Debug, Clone, Copy)]
pub struct Semaphore {
    value: u8,
    waiting: WaitList,
}

impl Semaphore {
    /// Create with `value` initial units
    pub const fn new(value: u8) -> Self {
        Self {
            value,
            waiting: WaitList::new(),
        }
    }

    /// Current count
    pub fn value(&self) -> u8 {
        self.value
    }

    /// Blocked tasks
    pub fn waiting(&self) -> &WaitList {
        &self.waiting
    }

    /// Take a unit if one is available, else queue `id`
    ///
    /// Returns true on the fast path. The caller moves a queued task to
    /// `Pending`.
    pub(crate) fn wait(&mut self, id: TaskId) -> bool {
        if self.value > 0 {
            self.value -= 1;
            return true;
        }
        // A task waits on at most one thing, so a MAX_TASKS list never fills
        let _ = self.waiting.add(id);
        false
    }

    /// Release a unit
    ///
    /// The caller moves a handed-off task to `Ready`.
    pub(crate) fn signal(&mut self, tasks: &[Tcb]) -> Release {
        if let Some(id) = self.waiting.take_highest(tasks) {
            return Release::HandedOff(id);
        }
        match self.value.checked_add(1) {
            Some(v) => {
                self.value = v;
                Release::Incremented
            }
            None => Release::Saturated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskPriority, MAX_TASKS};

    fn table() -> [Tcb; MAX_TASKS] {
        let mut out = [Tcb::new(TaskId::new(0), TaskPriority::NORMAL); MAX_TASKS];
        for (i, tcb) in out.iter_mut().enumerate() {
            *tcb = Tcb::new(TaskId::new(i), TaskPriority(MAX_TASKS as u8 - i as u8));
        }
        out
    }

    #[test]
    fn test_fast_path() {
        let mut sem = Semaphore::new(2);
        assert!(sem.wait(TaskId::new(0)));
        assert!(sem.wait(TaskId::new(1)));
        assert_eq!(sem.value(), 0);
        assert!(!sem.wait(TaskId::new(2)));
        assert!(sem.waiting().contains(TaskId::new(2)));
    }

    #[test]
    fn test_signal_hands_off_without_increment() {
        let tasks = table();
        let mut sem = Semaphore::new(0);
        sem.wait(TaskId::new(0));
        sem.wait(TaskId::new(3));

        // Task 3 has the better priority in this table
        assert_eq!(sem.signal(&tasks), Release::HandedOff(TaskId::new(3)));
        assert_eq!(sem.value(), 0);
        assert_eq!(sem.signal(&tasks), Release::HandedOff(TaskId::new(0)));
        assert_eq!(sem.value(), 0);
        assert_eq!(sem.signal(&tasks), Release::Incremented);
        assert_eq!(sem.value(), 1);
    }

    #[test]
    fn test_signal_saturates() {
        let tasks = table();
        let mut sem = Semaphore::new(u8::MAX);
        assert_eq!(sem.signal(&tasks), Release::Saturated);
        assert_eq!(sem.value(), u8::MAX);
    }
}
