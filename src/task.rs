//! Task definition — static, no-alloc task control blocks
//!
//! A task is a continuation (resumable body) plus the scheduling record
//! the kernel keeps for it. The body suspends only at kernel waits and
//! resumes exactly where it left off on the next dispatch.
//!
//! Author: Moroya Sakamoto

use core::fmt;

use crate::context::Context;
use crate::event::EventMask;

/// Maximum tasks the kernel can manage
pub const MAX_TASKS: usize = 6;

/// Tick count type for timed waits
pub type Ticks = u16;

/// Task identifier — dense, assigned in registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u8);

impl TaskId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index as u8)
    }

    /// Registry slot of this task
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task#{}", self.0)
    }
}

/// Task priority (lower number = higher priority)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TaskPriority(pub u8);

impl TaskPriority {
    /// Highest priority
    pub const CRITICAL: TaskPriority = TaskPriority(0);
    /// High priority
    pub const HIGH: TaskPriority = TaskPriority(1);
    /// Normal priority
    pub const NORMAL: TaskPriority = TaskPriority(2);
    /// Low priority
    pub const LOW: TaskPriority = TaskPriority(3);
    /// Background
    pub const IDLE: TaskPriority = TaskPriority(255);
}

/// Task scheduling state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Eligible for dispatch
    Ready,
    /// Continuation is executing right now
    Running,
    /// Waiting for `ticks_remaining` ticks
    WaitingTime,
    /// Waiting on the bits in `event_mask`
    WaitingEvent,
    /// Blocked on a semaphore
    Pending,
}

/// How a multi-event wait is satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    /// Ready on the first signaled event
    Any,
    /// Ready once every awaited event was signaled
    All,
}

/// Why a continuation suspended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// Timed wait
    Time,
    /// Event wait, single or multiple
    Event,
    /// Semaphore wait, slow path
    Semaphore,
}

/// Outcome of one continuation invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a suspension step must be returned to the scheduler"]
pub enum Step {
    /// Suspended at a wait; the kernel already recorded the wait state
    Blocked(BlockReason),
    /// Yielded while still runnable
    Continuing,
    /// Body ran to its end; next invocation starts from the top
    Done,
}

/// Resumable task body
///
/// Implementations keep their resumption point in their own state (usually
/// an enum), match on it in `resume`, run up to the next suspension and
/// store the following point before returning the `Step` the suspension
/// operation produced.
///
/// ```ignore
/// enum Blink { Toggle, Wait }
///
/// impl Continuation for Led {
///     fn resume(&mut self, cx: &mut Context<'_>) -> Step {
///         match self.at {
///             Blink::Toggle => {
///                 self.pin.toggle();
///                 self.at = Blink::Wait;
///                 cx.wait_ticks(200)
///             }
///             Blink::Wait => {
///                 self.at = Blink::Toggle;
///                 Step::Done
///             }
///         }
///     }
/// }
/// ```
pub trait Continuation {
    /// Run from the saved resumption point to the next suspension
    fn resume(&mut self, cx: &mut Context<'_>) -> Step;
}

impl<F> Continuation for F
where
    F: FnMut(&mut Context<'_>) -> Step,
{
    fn resume(&mut self, cx: &mut Context<'_>) -> Step {
        self(cx)
    }
}

/// Task control block — scheduling record, no continuation
#[derive(Debug, Clone, Copy)]
pub struct Tcb {
    /// Task identifier
    pub id: TaskId,
    /// Priority (lower = higher priority)
    pub priority: TaskPriority,
    /// Current state
    pub state: TaskState,
    /// Ticks left, meaningful in `WaitingTime`
    pub ticks_remaining: Ticks,
    /// Awaited events, meaningful in `WaitingEvent`
    pub event_mask: EventMask,
    /// Any/all satisfaction of `event_mask`
    pub wait_mode: WaitMode,
    /// Number of dispatches
    pub activations: u32,
}

impl Tcb {
    /// Create a ready task record
    pub const fn new(id: TaskId, priority: TaskPriority) -> Self {
        Self {
            id,
            priority,
            state: TaskState::Ready,
            ticks_remaining: 0,
            event_mask: 0,
            wait_mode: WaitMode::Any,
            activations: 0,
        }
    }

    /// Is this task eligible for dispatch?
    pub fn is_ready(&self) -> bool {
        self.state == TaskState::Ready
    }

    /// Suspend for `ticks` ticks. Zero ticks leaves the task runnable.
    pub(crate) fn wait_time(&mut self, ticks: Ticks) {
        if ticks == 0 {
            return;
        }
        self.ticks_remaining = ticks;
        self.state = TaskState::WaitingTime;
    }

    /// Suspend on `mask`. An empty mask leaves the task runnable.
    pub(crate) fn wait_events(&mut self, mask: EventMask, mode: WaitMode) {
        if mask == 0 {
            return;
        }
        self.event_mask = mask;
        self.wait_mode = mode;
        self.state = TaskState::WaitingEvent;
    }

    /// One tick elapsed. Returns true when the wait expired on this tick.
    pub(crate) fn tick(&mut self) -> bool {
        if self.state != TaskState::WaitingTime {
            return false;
        }
        self.ticks_remaining = self.ticks_remaining.saturating_sub(1);
        if self.ticks_remaining == 0 {
            self.state = TaskState::Ready;
            return true;
        }
        false
    }

    /// Clear `bits` from the awaited events. Returns true when this woke the task.
    pub(crate) fn clear_events(&mut self, bits: EventMask) -> bool {
        if self.event_mask & bits == 0 {
            return false;
        }
        self.event_mask &= !bits;
        if self.wait_mode == WaitMode::Any || self.event_mask == 0 {
            self.event_mask = 0;
            if self.state == TaskState::WaitingEvent {
                self.state = TaskState::Ready;
                return true;
            }
        }
        false
    }
}
