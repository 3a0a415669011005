//! Kernel error taxonomy
//!
//! Only object creation and foreign ids can fail. Everything else a task
//! runs into is a state transition: it stays blocked until woken.
//!
//! Author: Moroya Sakamoto

use core::fmt;

use crate::sem::SemaphoreId;
use crate::task::TaskId;

/// Kernel result alias
pub type Result<T> = core::result::Result<T, KernelError>;

/// Errors surfaced by the kernel API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum KernelError {
    /// Task registry is full
    CapacityExceeded,
    /// Every bit of the event mask is already allocated
    EventDomainExhausted,
    /// Semaphore storage is full
    AllocationFailure,
    /// Task id not issued by this kernel
    UnknownTask(TaskId),
    /// Semaphore id not issued by this kernel
    UnknownSemaphore(SemaphoreId),
    /// The kernel is already driven by a scheduler
    SchedulerClaimed,
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded => f.write_str("task registry capacity exceeded"),
            Self::EventDomainExhausted => f.write_str("event domain exhausted"),
            Self::AllocationFailure => f.write_str("semaphore storage exhausted"),
            Self::UnknownTask(id) => write!(f, "unknown task {id}"),
            Self::UnknownSemaphore(id) => write!(f, "unknown semaphore {id}"),
            Self::SchedulerClaimed => f.write_str("kernel already has a scheduler"),
        }
    }
}
