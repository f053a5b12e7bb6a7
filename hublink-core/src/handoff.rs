//! Newest-wins frame handoff between the receive and refresh contexts
//!
//! A lock-free triple buffer. Three equally sized slots rotate between three
//! owners:
//!
//! ```text
//!   producer ──publish──► middle ──take_if_new──► consumer
//!   (back slot)          (shared)                (front slot)
//! ```
//!
//! `publish` swaps the back slot into the middle and marks it fresh.
//! `take_if_new` swaps the front slot into the middle only when the middle is
//! fresh. Each slot is owned by exactly one side at a time, so the producer
//! can never write into a frame the consumer is still reading. Unconsumed
//! frames are overwritten by newer ones; there is no queue.

#![allow(unsafe_code)]

use core::cell::UnsafeCell;

use portable_atomic::{AtomicU8, Ordering};

/// Low bits of the shared word: index of the middle slot
const INDEX_MASK: u8 = 0b011;

/// Set when the middle slot holds a frame the consumer has not taken
const FRESH: u8 = 0b100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HandoffError {
    /// Slots differ in length
    SlotSizeMismatch,
    /// Slots must hold at least one byte
    EmptySlot,
}

/// Three frame slots plus the shared middle index
pub struct FrameHandoff<'a> {
    slots: [UnsafeCell<&'a mut [u8]>; 3],
    middle: AtomicU8,
    slot_len: usize,
}

// SAFETY: the slots are only reached through `FrameProducer` and
// `FrameConsumer`, and at most one pair exists per `&mut` borrow of the
// handoff. The producer only touches the slot index it holds in `back`, the
// consumer only the one in `front`, and the third index lives in `middle`.
// Indices change hands exclusively through atomic swaps on `middle`, with
// acquire-release ordering so slot contents are visible to the new owner.
unsafe impl Sync for FrameHandoff<'_> {}

impl<'a> FrameHandoff<'a> {
    /// Build a handoff over three equally sized slots
    pub fn new(slots: [&'a mut [u8]; 3]) -> Result<Self, HandoffError> {
        let len = slots[0].len();
        if len == 0 {
            return Err(HandoffError::EmptySlot);
        }
        if slots.iter().any(|s| s.len() != len) {
            return Err(HandoffError::SlotSizeMismatch);
        }
        let [a, b, c] = slots;
        Ok(Self {
            slots: [UnsafeCell::new(a), UnsafeCell::new(b), UnsafeCell::new(c)],
            middle: AtomicU8::new(1),
            slot_len: len,
        })
    }

    /// Length of every slot
    pub fn slot_len(&self) -> usize {
        self.slot_len
    }

    /// Create the producer and consumer ends
    ///
    /// Any frame published through a previous pair and not yet taken is
    /// dropped.
    pub fn split(&mut self) -> (FrameProducer<'_, 'a>, FrameConsumer<'_, 'a>) {
        *self.middle.get_mut() = 1;
        let handoff = &*self;
        (
            FrameProducer { handoff, back: 0 },
            FrameConsumer { handoff, front: 2 },
        )
    }

    /// # Safety
    ///
    /// The caller must own slot `index`, and no other reference into that
    /// slot may be live.
    #[allow(clippy::mut_from_ref)]
    unsafe fn slot_mut(&self, index: u8) -> &mut [u8] {
        &mut **self.slots[usize::from(index)].get()
    }

    /// # Safety
    ///
    /// The caller must own slot `index`.
    unsafe fn slot(&self, index: u8) -> &[u8] {
        &**self.slots[usize::from(index)].get()
    }
}

/// Receive-side end of a [`FrameHandoff`]
pub struct FrameProducer<'h, 'a> {
    handoff: &'h FrameHandoff<'a>,
    back: u8,
}

impl FrameProducer<'_, '_> {
    /// Slot to decode the next frame into
    ///
    /// Its contents are whatever frame last occupied it.
    pub fn back_mut(&mut self) -> &mut [u8] {
        // SAFETY: `back` is owned by this producer until `publish` gives it
        // away, and the returned borrow ends before `publish` can be called.
        unsafe { self.handoff.slot_mut(self.back) }
    }

    /// Make the back slot the newest frame
    ///
    /// Replaces any published frame the consumer has not taken yet.
    pub fn publish(&mut self) {
        let previous = self
            .handoff
            .middle
            .swap(self.back | FRESH, Ordering::AcqRel);
        self.back = previous & INDEX_MASK;
    }
}

/// Refresh-side end of a [`FrameHandoff`]
pub struct FrameConsumer<'h, 'a> {
    handoff: &'h FrameHandoff<'a>,
    front: u8,
}

impl FrameConsumer<'_, '_> {
    /// Whether a frame has been published since the last take
    pub fn has_new(&self) -> bool {
        self.handoff.middle.load(Ordering::Acquire) & FRESH != 0
    }

    /// Take the newest published frame, exactly once per publish
    pub fn take_if_new(&mut self) -> Option<&[u8]> {
        if !self.has_new() {
            return None;
        }
        let previous = self.handoff.middle.swap(self.front, Ordering::AcqRel);
        self.front = previous & INDEX_MASK;
        Some(self.current())
    }

    /// Most recently taken frame
    ///
    /// Before the first take this is the initial contents of a slot.
    pub fn current(&self) -> &[u8] {
        // SAFETY: `front` is owned by this consumer; the producer never
        // writes into it until it has been swapped back into the middle,
        // which needs `&mut self`.
        unsafe { self.handoff.slot(self.front) }
    }
}
