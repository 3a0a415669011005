//! Task context — the suspension operations
//!
//! A continuation receives a `Context` on every dispatch. Each suspension
//! operation records its wait in the kernel and hands back the `Step` the
//! continuation must return. Semaphore operations have a non-blocking fast
//! path and can be refused, so they return `Result<Option<Step>>` where
//! `Ok(None)` means "keep going".
//!
//! Author: Moroya Sakamoto

use crate::error::{KernelError, Result};
use crate::event::EventId;
use crate::kernel::Kernel;
use crate::sem::SemaphoreId;
use crate::task::{BlockReason, Step, TaskId, Ticks, WaitMode};

/// Handle passed to a running continuation
pub struct Context<'k> {
    kernel: &'k Kernel,
    id: TaskId,
}

impl<'k> Context<'k> {
    pub(crate) fn new(kernel: &'k Kernel, id: TaskId) -> Self {
        Self { kernel, id }
    }

    /// Identifier of the running task
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Kernel this task runs on
    pub fn kernel(&self) -> &'k Kernel {
        self.kernel
    }

    /// Ticks since start
    pub fn now(&self) -> u32 {
        self.kernel.now()
    }

    /// Suspend for `ticks` ticks
    ///
    /// `wait_ticks(0)` is a plain yield.
    pub fn wait_ticks(&self, ticks: Ticks) -> Step {
        match self.kernel.wait_ticks(self.id, ticks) {
            Ok(true) => Step::Blocked(BlockReason::Time),
            Ok(false) => Step::Continuing,
            Err(e) => self.refused(e),
        }
    }

    /// Suspend until `ev` is signaled
    pub fn wait_event(&self, ev: EventId) -> Step {
        self.wait_events(WaitMode::Any, &[ev])
    }

    /// Suspend until any or all of `events` are signaled
    pub fn wait_events(&self, mode: WaitMode, events: &[EventId]) -> Step {
        match self.kernel.wait_events(self.id, mode, events) {
            Ok(true) => Step::Blocked(BlockReason::Event),
            Ok(false) => Step::Continuing,
            Err(e) => self.refused(e),
        }
    }

    /// Signal `ev` and yield
    pub fn signal_event(&self, ev: EventId) -> Step {
        self.kernel.signal_event_from(ev, self.id);
        Step::Continuing
    }

    /// Acquire a unit of `sem`
    ///
    /// `Ok(None)` when acquired on the fast path. `Ok(Some(step))` when the
    /// task is now `Pending`: hand the step back, the task owns the unit
    /// when it next resumes. `Err` when this kernel never issued `sem`; no
    /// unit is held.
    pub fn wait_semaphore(&self, sem: SemaphoreId) -> Result<Option<Step>> {
        let acquired = self.kernel.semaphore_wait(sem, self.id)?;
        if acquired {
            return Ok(None);
        }
        Ok(Some(Step::Blocked(BlockReason::Semaphore)))
    }

    /// Release a unit of `sem`
    ///
    /// Yields (`Ok(Some)`) only when the unit was handed to a waiter.
    pub fn signal_semaphore(&self, sem: SemaphoreId) -> Result<Option<Step>> {
        let woken = self.kernel.semaphore_signal(sem)?;
        Ok(woken.map(|_| Step::Continuing))
    }

    fn refused(&self, e: KernelError) -> Step {
        log::error!("{}: {}", self.id, e);
        Step::Continuing
    }
}
