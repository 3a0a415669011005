//! Platform collaborator
//!
//! The board supplies the periodic interrupt that calls `Kernel::tick`
//! and registers its interrupt-mask implementation with
//! `critical_section::set_impl!`. This trait covers the rest.
//!
//! Author: Moroya Sakamoto

/// Hooks the scheduler loop needs from the board
pub trait Platform {
    /// Start the tick source and enable interrupts
    fn start_tick(&mut self);

    /// Nothing was ready on the last scheduler pass
    fn idle(&mut self) {}
}
