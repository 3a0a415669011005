//! System timer — kernel uptime in ticks
//!
//! The hardware timer itself is the platform's business: its ISR calls
//! `Kernel::tick`, which advances this counter before sweeping timed waits.
//!
//! Author: Moroya Sakamoto

/// Tick counter
///
/// Size: 8 bytes
#[derive(Debug, Clone, Copy)]
pub struct SysTimer {
    /// Ticks since start (wraps)
    ticks: u32,
    /// Overflow count
    overflows: u32,
}

impl SysTimer {
    /// Timer at tick zero
    pub const fn new() -> Self {
        Self {
            ticks: 0,
            overflows: 0,
        }
    }

    /// Advance by one tick
    pub fn advance(&mut self) {
        let (new, wrapped) = self.ticks.overflowing_add(1);
        if wrapped {
            self.overflows = self.overflows.wrapping_add(1);
        }
        self.ticks = new;
    }

    /// Ticks since start
    pub fn now(&self) -> u32 {
        self.ticks
    }

    /// Number of times `now` wrapped back to zero
    pub fn overflows(&self) -> u32 {
        self.overflows
    }

    #[cfg(test)]
    pub(crate) const fn starting_at(ticks: u32) -> Self {
        Self { ticks, overflows: 0 }
    }
}

impl Default for SysTimer {
    fn default() -> Self {
        Self::new()
    }
}
