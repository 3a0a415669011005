//! Priority scheduler — cooperative dispatch of continuations
//!
//! Strict fixed priority, first registered wins ties, no preemption.
//! Each pass selects the best ready task under a critical section, then
//! invokes its continuation with the critical section released so the
//! tick and event ISRs stay live while task code runs.
//!
//! Author: Moroya Sakamoto

use crate::context::Context;
use crate::error::{KernelError, Result};
use crate::kernel::{Kernel, KernelStats};
use crate::platform::Platform;
use crate::task::{Continuation, Step, TaskId, TaskPriority, MAX_TASKS};

/// Cooperative scheduler
///
/// Owns the continuations; the kernel owns their control blocks. Slot `i`
/// holds the body of `TaskId` `i`. A kernel accepts exactly one scheduler,
/// so every registered task has its body here.
pub struct Scheduler<'k, 'a> {
    kernel: &'k Kernel,
    bodies: [Option<&'a mut dyn Continuation>; MAX_TASKS],
}

impl<'k, 'a> Scheduler<'k, 'a> {
    /// Create the scheduler driving `kernel`
    ///
    /// Fails with `SchedulerClaimed` if `kernel` already has one.
    pub fn new(kernel: &'k Kernel) -> Result<Self> {
        kernel.claim()?;
        Ok(Self {
            kernel,
            bodies: core::array::from_fn(|_| None),
        })
    }

    /// Kernel this scheduler drives
    pub fn kernel(&self) -> &'k Kernel {
        self.kernel
    }

    /// Register `body` as a ready task
    ///
    /// Fails with `CapacityExceeded` once `MAX_TASKS` tasks exist.
    pub fn spawn(&mut self, body: &'a mut dyn Continuation, priority: TaskPriority) -> Result<TaskId> {
        let id = self.kernel.register(priority)?;
        let slot = self
            .bodies
            .get_mut(id.index())
            .ok_or(KernelError::CapacityExceeded)?;
        *slot = Some(body);
        Ok(id)
    }

    /// Run the highest-priority ready task until it suspends
    ///
    /// Returns the task that ran, None when nothing was ready.
    pub fn schedule_once(&mut self) -> Option<TaskId> {
        let id = self.kernel.dispatch()?;
        log::trace!("dispatch {}", id);

        let step = match self.bodies.get_mut(id.index()).and_then(Option::as_mut) {
            Some(body) => {
                let mut cx = Context::new(self.kernel, id);
                body.resume(&mut cx)
            }
            None => {
                log::error!("{} has no continuation", id);
                Step::Done
            }
        };

        if step == Step::Done {
            log::trace!("{} ran to completion", id);
        }
        self.kernel.finish(id, step);
        Some(id)
    }

    /// Run `passes` scheduler passes (hosted simulation)
    pub fn run_for(&mut self, passes: usize) -> KernelStats {
        for _ in 0..passes {
            self.schedule_once();
        }
        self.kernel.stats()
    }

    /// Start the tick source and schedule forever
    pub fn run_forever<P: Platform>(&mut self, platform: &mut P) -> ! {
        self.kernel.init();
        platform.start_tick();
        log::debug!("scheduler started with {} tasks", self.kernel.task_count());
        loop {
            if self.schedule_once().is_none() {
                platform.idle();
            }
        }
    }
}
