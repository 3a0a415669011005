//! Kernel — shared scheduling state
//!
//! Holds the task registry, semaphores, event domain, running marker and
//! uptime in one context object. Every access goes through a critical
//! section, so the tick ISR and ISR-side event signaling can share the
//! kernel with the scheduler loop through a `static`.
//!
//! ```text
//! timer ISR ──► Kernel::tick ─────────┐
//! other ISR ──► Kernel::signal_event ─┤  critical_section::with
//! Scheduler ──► dispatch / finish ────┤  ──► KernelState
//! Context   ──► waits / signals ──────┘
//! ```
//!
//! Author: Moroya Sakamoto

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Vec;

use crate::error::{KernelError, Result};
use crate::event::{self, EventDomain, EventId};
use crate::sem::{Release, Semaphore, SemaphoreId, MAX_SEMAPHORES};
use crate::task::{Step, TaskId, TaskPriority, TaskState, Tcb, Ticks, WaitMode, MAX_TASKS};
use crate::timer::SysTimer;

/// Everything the critical section protects
struct KernelState {
    tasks: Vec<Tcb, MAX_TASKS>,
    semaphores: Vec<Semaphore, MAX_SEMAPHORES>,
    events: EventDomain,
    /// A scheduler owns the continuations
    claimed: bool,
    /// Task whose continuation is executing
    running: Option<TaskId>,
    /// Last dispatched task, for context switch counting
    last_dispatched: Option<TaskId>,
    timer: SysTimer,
    dispatches: u64,
    context_switches: u64,
    idle_passes: u64,
}

impl KernelState {
    const fn new() -> Self {
        Self {
            tasks: Vec::new(),
            semaphores: Vec::new(),
            events: EventDomain::new(),
            claimed: false,
            running: None,
            last_dispatched: None,
            timer: SysTimer::new(),
            dispatches: 0,
            context_switches: 0,
            idle_passes: 0,
        }
    }

    fn task(&self, id: TaskId) -> Result<&Tcb> {
        self.tasks.get(id.index()).ok_or(KernelError::UnknownTask(id))
    }

    fn task_mut(&mut self, id: TaskId) -> Result<&mut Tcb> {
        self.tasks.get_mut(id.index()).ok_or(KernelError::UnknownTask(id))
    }

    /// Highest-priority ready task, lowest id on ties
    fn highest_priority_ready(&self) -> Option<TaskId> {
        let mut best: Option<&Tcb> = None;
        for tcb in self.tasks.iter().filter(|t| t.is_ready()) {
            // Strict comparison keeps the first registered on ties
            if best.map_or(true, |b| tcb.priority < b.priority) {
                best = Some(tcb);
            }
        }
        best.map(|t| t.id)
    }

    fn signal_event(&mut self, ev: EventId) {
        let bits = ev.mask();
        for tcb in self.tasks.iter_mut() {
            if tcb.clear_events(bits) {
                log::trace!("{} woken by {}", tcb.id, ev);
            }
        }
    }
}

/// Cooperative kernel context
///
/// Memory footprint is fixed at compile time:
/// `MAX_TASKS` control blocks, `MAX_SEMAPHORES` semaphores and one
/// signaler slot per event.
pub struct Kernel {
    state: Mutex<RefCell<KernelState>>,
}

impl Kernel {
    /// Create an empty kernel, usable as a `static`
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(KernelState::new())),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut KernelState) -> R) -> R {
        critical_section::with(|cs| f(&mut *self.state.borrow_ref_mut(cs)))
    }

    /// Reset the running marker. Idempotent.
    pub fn init(&self) {
        self.with(|st| st.running = None);
    }

    // ------------------------------------------------------------------
    // Registry and dispatch
    // ------------------------------------------------------------------

    /// Bind the single scheduler allowed to drive this kernel
    pub(crate) fn claim(&self) -> Result<()> {
        self.with(|st| {
            if st.claimed {
                return Err(KernelError::SchedulerClaimed);
            }
            st.claimed = true;
            Ok(())
        })
    }

    /// Append a ready task record
    pub(crate) fn register(&self, priority: TaskPriority) -> Result<TaskId> {
        let id = self.with(|st| -> Result<TaskId> {
            let id = TaskId::new(st.tasks.len());
            st.tasks
                .push(Tcb::new(id, priority))
                .map_err(|_| KernelError::CapacityExceeded)?;
            Ok(id)
        })?;
        log::debug!("registered {} at priority {}", id, priority.0);
        Ok(id)
    }

    /// Select the next task and mark it running
    ///
    /// Returns None when no task is ready.
    pub(crate) fn dispatch(&self) -> Option<TaskId> {
        self.with(|st| {
            let Some(id) = st.highest_priority_ready() else {
                st.idle_passes += 1;
                return None;
            };
            if st.last_dispatched != Some(id) {
                st.context_switches += 1;
                st.last_dispatched = Some(id);
            }
            st.dispatches += 1;
            st.running = Some(id);
            if let Some(tcb) = st.tasks.get_mut(id.index()) {
                tcb.state = TaskState::Running;
                tcb.activations = tcb.activations.wrapping_add(1);
            }
            Some(id)
        })
    }

    /// Close the running phase of `id` after its continuation returned
    pub(crate) fn finish(&self, id: TaskId, step: Step) {
        self.with(|st| {
            st.running = None;
            if let Some(tcb) = st.tasks.get_mut(id.index()) {
                if tcb.state == TaskState::Running {
                    if let Step::Blocked(reason) = step {
                        log::warn!("{} reported {:?} block without waiting", id, reason);
                    }
                    tcb.state = TaskState::Ready;
                }
            }
        });
    }

    /// Advance time by one tick and wake expired timed waits
    ///
    /// Called from the timer ISR at a fixed period.
    pub fn tick(&self) {
        self.with(|st| {
            st.timer.advance();
            for tcb in st.tasks.iter_mut() {
                if tcb.tick() {
                    log::trace!("{} timer expired", tcb.id);
                }
            }
        });
    }

    // ------------------------------------------------------------------
    // Timed waits
    // ------------------------------------------------------------------

    /// Put `id` into a timed wait of `ticks` ticks
    ///
    /// Returns whether the task is now blocked; zero ticks does not block.
    pub fn wait_ticks(&self, id: TaskId, ticks: Ticks) -> Result<bool> {
        self.with(|st| -> Result<bool> {
            let tcb = st.task_mut(id)?;
            tcb.wait_time(ticks);
            Ok(tcb.state == TaskState::WaitingTime)
        })
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Allocate the next event bit
    pub fn create_event(&self) -> Result<EventId> {
        let ev = self
            .with(|st| st.events.allocate())
            .ok_or(KernelError::EventDomainExhausted)?;
        log::debug!("created {}", ev);
        Ok(ev)
    }

    /// Wait for a single event
    pub fn wait_event(&self, id: TaskId, ev: EventId) -> Result<()> {
        self.wait_events(id, WaitMode::Any, &[ev]).map(|_| ())
    }

    /// Wait for several events, `mode` decides any/all
    ///
    /// Returns whether the task is now blocked; an empty set does not block.
    pub fn wait_events(&self, id: TaskId, mode: WaitMode, events: &[EventId]) -> Result<bool> {
        let mask = event::mask_of(events);
        self.with(|st| -> Result<bool> {
            let tcb = st.task_mut(id)?;
            tcb.wait_events(mask, mode);
            Ok(tcb.state == TaskState::WaitingEvent)
        })
    }

    /// Signal `ev`: clear its bit in every waiter and ready the satisfied ones
    ///
    /// Safe from interrupt context; never suspends anything.
    pub fn signal_event(&self, ev: EventId) {
        self.with(|st| st.signal_event(ev));
    }

    /// Signal `ev` on behalf of task `by`
    pub(crate) fn signal_event_from(&self, ev: EventId, by: TaskId) {
        self.with(|st| {
            st.signal_event(ev);
            st.events.set_signaler(ev, by);
        });
    }

    /// Task that last signaled `ev` from task context
    pub fn event_signaler(&self, ev: EventId) -> Option<TaskId> {
        self.with(|st| st.events.signaler(ev))
    }

    // ------------------------------------------------------------------
    // Semaphores
    // ------------------------------------------------------------------

    /// Create a semaphore holding `value` units
    pub fn create_semaphore(&self, value: u8) -> Result<SemaphoreId> {
        let sem = self.with(|st| -> Result<SemaphoreId> {
            let sem = SemaphoreId::new(st.semaphores.len());
            st.semaphores
                .push(Semaphore::new(value))
                .map_err(|_| KernelError::AllocationFailure)?;
            Ok(sem)
        })?;
        log::debug!("created {} with value {}", sem, value);
        Ok(sem)
    }

    /// Acquire a unit for `id`, or block it as `Pending`
    ///
    /// Returns true when the unit was taken without blocking.
    pub fn semaphore_wait(&self, sem: SemaphoreId, id: TaskId) -> Result<bool> {
        self.with(|st| -> Result<bool> {
            let KernelState { tasks, semaphores, .. } = st;
            let semaphore = semaphores
                .get_mut(sem.index())
                .ok_or(KernelError::UnknownSemaphore(sem))?;
            let tcb = tasks.get_mut(id.index()).ok_or(KernelError::UnknownTask(id))?;
            if semaphore.wait(id) {
                return Ok(true);
            }
            tcb.state = TaskState::Pending;
            Ok(false)
        })
    }

    /// Release a unit; hands it to the best waiter if there is one
    ///
    /// Returns the task that was readied. The count saturates at `u8::MAX`.
    pub fn semaphore_signal(&self, sem: SemaphoreId) -> Result<Option<TaskId>> {
        let release = self.with(|st| -> Result<Release> {
            let KernelState { tasks, semaphores, .. } = st;
            let semaphore = semaphores
                .get_mut(sem.index())
                .ok_or(KernelError::UnknownSemaphore(sem))?;
            let release = semaphore.signal(tasks);
            if let Release::HandedOff(id) = release {
                if let Some(tcb) = tasks.get_mut(id.index()) {
                    tcb.state = TaskState::Ready;
                }
            }
            Ok(release)
        })?;
        match release {
            Release::HandedOff(id) => {
                log::trace!("{} handed to {}", sem, id);
                Ok(Some(id))
            }
            Release::Saturated => {
                log::warn!("{} count saturated", sem);
                Ok(None)
            }
            Release::Incremented => Ok(None),
        }
    }

    /// Current count of `sem`
    pub fn semaphore_value(&self, sem: SemaphoreId) -> Result<u8> {
        self.with(|st| {
            st.semaphores
                .get(sem.index())
                .map(Semaphore::value)
                .ok_or(KernelError::UnknownSemaphore(sem))
        })
    }

    /// Number of tasks blocked on `sem`
    pub fn semaphore_waiters(&self, sem: SemaphoreId) -> Result<usize> {
        self.with(|st| {
            st.semaphores
                .get(sem.index())
                .map(|s| s.waiting().len())
                .ok_or(KernelError::UnknownSemaphore(sem))
        })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Task whose continuation is executing
    pub fn current_task(&self) -> Option<TaskId> {
        self.with(|st| st.running)
    }

    /// Scheduling state of `id`
    pub fn task_state(&self, id: TaskId) -> Result<TaskState> {
        self.with(|st| st.task(id).map(|t| t.state))
    }

    /// Priority of `id`
    pub fn priority(&self, id: TaskId) -> Result<TaskPriority> {
        self.with(|st| st.task(id).map(|t| t.priority))
    }

    /// Times `id` was dispatched
    pub fn activations(&self, id: TaskId) -> Result<u32> {
        self.with(|st| st.task(id).map(|t| t.activations))
    }

    /// Number of registered tasks
    pub fn task_count(&self) -> usize {
        self.with(|st| st.tasks.len())
    }

    /// Ticks since start
    pub fn now(&self) -> u32 {
        self.with(|st| st.timer.now())
    }

    /// Execution statistics snapshot
    pub fn stats(&self) -> KernelStats {
        self.with(|st| KernelStats {
            ticks: st.timer.now(),
            tick_overflows: st.timer.overflows(),
            dispatches: st.dispatches,
            context_switches: st.context_switches,
            idle_passes: st.idle_passes,
            tasks: st.tasks.len(),
            events: st.events.allocated(),
        })
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

/// Kernel execution statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelStats {
    /// Ticks since start (wraps)
    pub ticks: u32,
    /// Times `ticks` wrapped back to zero
    pub tick_overflows: u32,
    /// Continuation invocations
    pub dispatches: u64,
    /// Dispatches of a different task than the previous one
    pub context_switches: u64,
    /// Scheduler passes that found no ready task
    pub idle_passes: u64,
    /// Registered tasks
    pub tasks: usize,
    /// Allocated events
    pub events: usize,
}
