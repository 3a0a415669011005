//! Event flags — one bit per event
//!
//! Events carry no queue. Waiting tasks keep the awaited bits in their own
//! control block; signaling clears the bit in every waiter.
//!
//! Author: Moroya Sakamoto

use core::fmt;

use crate::task::TaskId;

/// Bitmask over the event domain
pub type EventMask = u8;

/// Maximum events per kernel (bit width of `EventMask`)
pub const MAX_EVENTS: usize = EventMask::BITS as usize;

/// Event identifier — a single bit position in `EventMask`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId(u8);

impl EventId {
    pub(crate) const fn new(bit: usize) -> Self {
        Self(bit as u8)
    }

    /// Bit position
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Single-bit mask
    pub const fn mask(self) -> EventMask {
        1 << self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event#{}", self.0)
    }
}

/// Union of the events' bits
pub fn mask_of(events: &[EventId]) -> EventMask {
    events.iter().fold(0, |mask, ev| mask | ev.mask())
}

/// Per-kernel event allocation and signaling diagnostics
#[derive(Debug, Clone, Copy)]
pub(crate) struct EventDomain {
    allocated: usize,
    signalers: [Option<TaskId>; MAX_EVENTS],
}

impl EventDomain {
    pub(crate) const fn new() -> Self {
        Self {
            allocated: 0,
            signalers: [None; MAX_EVENTS],
        }
    }

    /// Next unused bit, None when exhausted
    pub(crate) fn allocate(&mut self) -> Option<EventId> {
        if self.allocated >= MAX_EVENTS {
            return None;
        }
        let ev = EventId::new(self.allocated);
        self.allocated += 1;
        Some(ev)
    }

    pub(crate) fn allocated(&self) -> usize {
        self.allocated
    }

    pub(crate) fn set_signaler(&mut self, ev: EventId, id: TaskId) {
        if let Some(slot) = self.signalers.get_mut(ev.index()) {
            *slot = Some(id);
        }
    }

    pub(crate) fn signaler(&self, ev: EventId) -> Option<TaskId> {
        self.signalers.get(ev.index()).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_sequential_bits() {
        let mut domain = EventDomain::new();
        let a = domain.allocate().unwrap();
        let b = domain.allocate().unwrap();
        assert_eq!(a.mask(), 0b01);
        assert_eq!(b.mask(), 0b10);
        assert_eq!(domain.allocated(), 2);
    }

    #[test]
    fn test_domain_exhausted() {
        let mut domain = EventDomain::new();
        for _ in 0..MAX_EVENTS {
            assert!(domain.allocate().is_some());
        }
        assert!(domain.allocate().is_none());
    }

    #[test]
    fn test_mask_of() {
        let evs = [EventId::new(0), EventId::new(3), EventId::new(7)];
        assert_eq!(mask_of(&evs), 0b1000_1001);
        assert_eq!(mask_of(&[]), 0);
    }
}
