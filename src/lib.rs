//! coop-rtos — cooperative priority kernel
//!
//! Run to the next wait, then hand control back.
//!
//! Minimal kernel for small microcontrollers:
//! - Static task registry (no heap, no allocation)
//! - Stackless tasks: each body is a resumable state machine
//! - Fixed-priority dispatch, first registered wins ties
//! - Tick-driven timed waits
//! - Event flags with any/all waits, hand-off counting semaphores
//! - Interrupt safety through the `critical-section` crate
//!
//! ```text
//! Scheduler::run_forever
//!   └─► loop
//!         ├─► Kernel::dispatch        ← best Ready task, marked Running
//!         ├─► Continuation::resume    ← runs to its next wait
//!         └─► Kernel::finish          ← back to Ready unless it waits
//! timer ISR ──► Kernel::tick           ← timed waits expire
//! ```
//!
//! Author: Moroya Sakamoto

#![no_std]

pub mod error;
pub mod task;
pub mod list;
pub mod event;
pub mod sem;
pub mod timer;
pub mod kernel;
pub mod context;
pub mod scheduler;
pub mod platform;

pub use error::{KernelError, Result};
pub use task::{BlockReason, Continuation, Step, TaskId, TaskPriority, TaskState, Ticks, WaitMode};
pub use list::WaitList;
pub use event::{EventId, EventMask, MAX_EVENTS};
pub use sem::{SemaphoreId, MAX_SEMAPHORES};
pub use timer::SysTimer;
pub use kernel::{Kernel, KernelStats};
pub use context::Context;
pub use scheduler::Scheduler;
pub use platform::Platform;
